//! Unit tests for CLI argument parsing

use navcore::cli::args::{Command, parse_args};

fn argv(parts: &[&str]) -> Vec<String> {
    std::iter::once("navcore")
        .chain(parts.iter().copied())
        .map(String::from)
        .collect()
}

#[test]
fn parses_a_minimal_list_command() {
    let cli = parse_args(&argv(&["list", "/tmp"])).unwrap();
    match cli.command {
        Command::List(args) => {
            assert_eq!(args.paths, vec!["/tmp"]);
            assert!(!args.trash);
            assert_eq!(args.sort, "name");
            assert!(!args.desc);
            assert!(!args.json);
        }
        other => panic!("Expected list, got {other:?}"),
    }
}

#[test]
fn list_accepts_multiple_paths_and_options() {
    let cli = parse_args(&argv(&[
        "list", "/a", "/b", "--trash", "--sort", "size", "--desc", "--filter", "txt", "--json",
    ]))
    .unwrap();
    match cli.command {
        Command::List(args) => {
            assert_eq!(args.paths, vec!["/a", "/b"]);
            assert!(args.trash);
            assert_eq!(args.sort, "size");
            assert!(args.desc);
            assert_eq!(args.filter.as_deref(), Some("txt"));
            assert!(args.json);
        }
        other => panic!("Expected list, got {other:?}"),
    }
}

#[test]
fn list_requires_a_path() {
    let err = parse_args(&argv(&["list"])).unwrap_err();
    assert!(err.contains("PATH"));
}

#[test]
fn transfer_splits_sources_and_destination() {
    let cli = parse_args(&argv(&[
        "copy",
        "a.txt",
        "photos",
        "/mnt/backup",
        "--on-conflict",
        "overwrite",
    ]))
    .unwrap();
    match cli.command {
        Command::Copy(args) => {
            assert_eq!(args.sources, vec!["a.txt", "photos"]);
            assert_eq!(args.destination, "/mnt/backup");
            assert_eq!(args.on_conflict.as_deref(), Some("overwrite"));
        }
        other => panic!("Expected copy, got {other:?}"),
    }
}

#[test]
fn transfer_requires_source_and_destination() {
    let err = parse_args(&argv(&["move", "only-one"])).unwrap_err();
    assert!(err.contains("SOURCE"));
}

#[test]
fn watch_parses_duration() {
    let cli = parse_args(&argv(&["watch", "/tmp", "--duration", "30"])).unwrap();
    match cli.command {
        Command::Watch(args) => {
            assert_eq!(args.path, "/tmp");
            assert_eq!(args.duration_secs, Some(30));
        }
        other => panic!("Expected watch, got {other:?}"),
    }
}

#[test]
fn watch_rejects_a_zero_duration() {
    assert!(parse_args(&argv(&["watch", "/tmp", "--duration", "0"])).is_err());
}

#[test]
fn unknown_command_and_options_are_rejected() {
    assert!(parse_args(&argv(&["frobnicate"])).is_err());
    assert!(parse_args(&argv(&["list", "/tmp", "--bogus"])).is_err());
    assert!(parse_args(&argv(&[])).is_err());
}
