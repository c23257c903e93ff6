//! File manager core CLI (navcore) - Main binary entry point

use navcore::cli::args::{Command, ListArgs, TransferArgs, WatchArgs, parse_args};
use navcore::cli::output::{format_json, format_text};
use navcore::io::settings::ViewSettings;
use navcore::services::format::format_size;
use navcore::{
    ChangeCallback, ChangeFeed, CopyAct, CopyJob, DirectorySnapshot, FsEventKind, Resolution,
    SortKey, SortSpec, SortedView,
};
use std::path::PathBuf;
use std::process;
use std::str::FromStr;
use std::time::Duration;

fn main() {
    // Initialize logger (controlled by RUST_LOG environment variable)
    // Example: RUST_LOG=debug navcore list /path
    env_logger::init();

    let args: Vec<String> = std::env::args().collect();

    if args.len() < 2 {
        print_help();
        return;
    }

    match args[1].as_str() {
        "--help" | "-h" => {
            print_help();
            return;
        }
        "--version" | "-v" => {
            print_version();
            return;
        }
        _ => {}
    }

    // Parse arguments
    let cli_args = match parse_args(&args) {
        Ok(a) => a,
        Err(e) => {
            eprintln!("Error: {e}");
            eprintln!("Use --help for usage information");
            process::exit(2);
        }
    };

    // Execute command
    let exit_code = match &cli_args.command {
        Command::List(list_args) => handle_list(list_args),
        Command::Copy(transfer_args) => handle_transfer(CopyAct::Copy, transfer_args),
        Command::Move(transfer_args) => handle_transfer(CopyAct::Move, transfer_args),
        Command::Watch(watch_args) => handle_watch(watch_args),
    };

    process::exit(exit_code);
}

fn handle_list(args: &ListArgs) -> i32 {
    let settings = args
        .settings
        .as_deref()
        .map_or_else(ViewSettings::default, |path| {
            ViewSettings::load(std::path::Path::new(path))
        });

    let key = match SortKey::from_str(&args.sort) {
        Ok(key) => key,
        Err(err) => {
            eprintln!("Error: {err}. Use name|ext|size|modified");
            return 2;
        }
    };
    let spec = SortSpec {
        key,
        ascending: !args.desc,
        folders_first: settings.sort_folders_first && !args.no_folders_first,
    };

    let paths: Vec<PathBuf> = args.paths.iter().map(PathBuf::from).collect();
    let mut snapshot = DirectorySnapshot::new();
    let notices = snapshot.list(&paths, args.trash);

    let mut view = SortedView::new(spec);
    if let Some(filter) = args.filter.as_deref() {
        view.set_filter(filter, args.case_sensitive || settings.filter_case_sensitive);
    }

    let rows = view.row_count(&snapshot);
    let mut entries = Vec::with_capacity(rows);
    for row in 0..rows {
        if let Some(entry) = view.entry_at(&snapshot, row) {
            entries.push(entry);
        }
    }

    if args.json {
        println!("{}", format_json(&entries, &snapshot.stats(), &notices));
    } else {
        format_text(&entries, &snapshot.stats(), &notices);
    }

    // A source that failed to list is a partial result
    if notices.is_empty() { 0 } else { 3 }
}

fn handle_transfer(act: CopyAct, args: &TransferArgs) -> i32 {
    let resolution = match args.on_conflict.as_deref() {
        None => Resolution::Skip,
        Some(label) => match Resolution::from_label(label) {
            Some(r) => r,
            None => {
                eprintln!("Invalid conflict policy: {label}. Use overwrite|merge|skip");
                return 2;
            }
        },
    };

    let sources: Vec<PathBuf> = args.sources.iter().map(PathBuf::from).collect();
    let destination = PathBuf::from(&args.destination);

    let quiet = args.quiet;
    let mut job = CopyJob::new(act, sources, destination).with_conflict_resolver(
        move |kind, path| {
            if !quiet {
                eprintln!("Conflict ({kind:?}): {} -> {resolution:?}", path.display());
            }
            resolution
        },
    );
    if !quiet {
        job = job.with_progress(|progress| {
            if let Some(percent) = progress.percent() {
                eprint!(
                    "\r{} / {} ({percent:.0}%)",
                    format_size(progress.bytes_copied),
                    format_size(progress.bytes_total)
                );
            }
        });
    }

    match job.run() {
        Ok(()) => {
            if !quiet {
                eprintln!();
                eprintln!("Done: {} copied", format_size(job.progress().bytes_copied));
            }
            0
        }
        Err(e) => {
            if !quiet {
                eprintln!();
            }
            eprintln!("Error: {e}");
            match e {
                navcore::Error::InvalidInput(_)
                | navcore::Error::SameFile { .. }
                | navcore::Error::DestinationInSource { .. } => 2,
                navcore::Error::PartialFailure { errors } => {
                    for error in &errors {
                        eprintln!("  {} -> {}: {}", error.src, error.dst, error.message);
                    }
                    3
                }
                _ => 4,
            }
        }
    }
}

fn handle_watch(args: &WatchArgs) -> i32 {
    let feed = match ChangeFeed::new() {
        Ok(f) => f,
        Err(e) => {
            eprintln!("Error: {e}");
            return 4;
        }
    };

    let json = args.json;
    let callback = ChangeCallback::new(move |event, watched| {
        let kind = match event.kind {
            FsEventKind::Created => "created",
            FsEventKind::Modified => "modified",
            FsEventKind::Deleted => "deleted",
            FsEventKind::Moved => "moved",
        };
        if json {
            let line = serde_json::json!({
                "kind": kind,
                "path": event.src_path,
                "dest": event.dest_path,
                "watched": watched,
            });
            println!("{line}");
        } else if let Some(dest) = &event.dest_path {
            println!("{kind}: {} -> {}", event.src_path.display(), dest.display());
        } else {
            println!("{kind}: {}", event.src_path.display());
        }
    });

    let path = PathBuf::from(&args.path);
    if !path.exists() {
        eprintln!("Error: {} does not exist", path.display());
        return 2;
    }
    feed.add_path(&path, &callback);
    if feed.watched_paths() == 0 {
        eprintln!("Error: could not watch {}", path.display());
        return 4;
    }
    feed.start();
    eprintln!("Watching: {} (Ctrl-C to stop)", path.display());

    match args.duration_secs {
        Some(secs) => std::thread::sleep(Duration::from_secs(secs)),
        None => loop {
            std::thread::sleep(Duration::from_secs(60));
        },
    }
    feed.stop();
    0
}

fn print_help() {
    println!("File manager core CLI (navcore) - List, transfer, and watch directories");
    println!();
    println!("USAGE:");
    println!("    navcore list <PATH>... [OPTIONS]");
    println!("    navcore copy <SOURCE>... <DEST> [OPTIONS]");
    println!("    navcore move <SOURCE>... <DEST> [OPTIONS]");
    println!("    navcore watch <PATH> [OPTIONS]");
    println!();
    println!("COMMANDS:");
    println!("    list      Read one or more directories and print a sorted listing");
    println!("    copy      Copy files and directory trees into a destination");
    println!("    move      Move files and directory trees, renaming when possible");
    println!("    watch     Print filesystem change events for a directory");
    println!();
    println!("GLOBAL OPTIONS:");
    println!("    -h, --help                 Show this help message");
    println!("    -v, --version              Show version information");
    println!();
    println!("LIST OPTIONS:");
    println!("    --trash                   Treat each PATH as an XDG trash folder");
    println!("    --sort <KEY>              Sort by name|ext|size|modified (default: name)");
    println!("    --desc                    Sort descending");
    println!("    --no-folders-first        Do not group directories before files");
    println!("    --filter <TEXT>           Only show names containing TEXT");
    println!("    --case-sensitive          Make --filter case sensitive");
    println!("    --settings <FILE>         Load view settings from a JSON file");
    println!("    --json                    Emit machine-readable output");
    println!();
    println!("COPY/MOVE OPTIONS:");
    println!("    --on-conflict <POLICY>    overwrite|merge|skip for existing targets");
    println!("                              (default: skip)");
    println!("    --quiet                   Suppress progress output");
    println!();
    println!("WATCH OPTIONS:");
    println!("    --duration <S>            Stop after S seconds (default: run until killed)");
    println!("    --json                    Emit one JSON object per event");
    println!();
    println!("EXAMPLES:");
    println!("    navcore list ~/Downloads --sort size --desc");
    println!("    navcore list ~/.local/share/Trash --trash");
    println!("    navcore copy a.txt photos/ /mnt/backup --on-conflict overwrite");
    println!("    navcore watch /tmp --duration 30 --json");
}

fn print_version() {
    const VERSION: &str = env!("CARGO_PKG_VERSION");
    const GIT_HASH: &str = env!("GIT_HASH");
    const GIT_DATE: &str = env!("GIT_DATE");
    const BUILD_TARGET: &str = env!("BUILD_TARGET");

    println!("navcore {VERSION}");
    println!("Commit: {GIT_HASH} ({GIT_DATE})");
    println!("Target: {BUILD_TARGET}");

    #[cfg(debug_assertions)]
    println!("Build: debug");
    #[cfg(not(debug_assertions))]
    println!("Build: release");
}
