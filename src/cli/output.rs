//! Output formatting for CLI

use crate::models::{Entry, Notice, PathStats};
use crate::services::format::format_size;
use chrono::{DateTime, Local};

/// Format a listing as a human-readable table.
pub fn format_text(entries: &[&Entry], stats: &PathStats, notices: &[Notice]) {
    println!("{:<40} {:>10} {:>7} {:<16}", "Name", "Size", "Ext", "Modified");
    println!("{}", "-".repeat(76));

    for entry in entries {
        let name = if entry.is_directory {
            format!("{}/", entry.name)
        } else {
            entry.name.clone()
        };
        let size = if entry.is_directory {
            "-".to_string()
        } else {
            format_size(entry.size_bytes)
        };
        let ext = entry.extension.as_deref().unwrap_or("-");
        let modified: DateTime<Local> = entry.modified_at.into();
        println!(
            "{:<40} {:>10} {:>7} {:<16}",
            name,
            size,
            ext,
            modified.format("%Y-%m-%d %H:%M")
        );
    }

    println!();
    println!(
        "{} file(s), {} folder(s), {} total",
        stats.file_count,
        stats.dir_count,
        format_size(stats.total_bytes)
    );

    if !notices.is_empty() {
        println!();
        for notice in notices {
            eprintln!("{}: {}", notice.topic, notice.message);
        }
    }
}

/// Format a listing as JSON
#[must_use]
pub fn format_json(entries: &[&Entry], stats: &PathStats, notices: &[Notice]) -> String {
    let output = serde_json::json!({
        "entries": entries,
        "stats": {
            "file_count": stats.file_count,
            "dir_count": stats.dir_count,
            "total_bytes": stats.total_bytes,
        },
        "notices": if notices.is_empty() {
            serde_json::Value::Null
        } else {
            serde_json::json!(notices)
        }
    });

    serde_json::to_string_pretty(&output).unwrap_or_else(|_| "{}".to_string())
}
