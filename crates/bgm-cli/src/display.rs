//! Display utilities for CLI output

use colored::*;

use bgm_core::{TabGroup, TabGroupColor};
use bgm_snss::{LogSummary, Opcode, SessionLog};
use bgm_storage::{
    BackupEntry, BookmarkFolder, BookmarkNode, ClosedRemoteGroups, CreateGroupReport, ParkReport,
    Profile,
};

/// Payload bytes shown per record in `inspect --records`
const PAYLOAD_PREVIEW: usize = 16;

/// Print success message
pub fn print_success(msg: &str) {
    println!("{} {}", "✓".green().bold(), msg);
}

/// Print error message
pub fn print_error(msg: &str) {
    eprintln!("{} {}", "✗".red().bold(), msg);
}

/// Print info message
pub fn print_info(msg: &str) {
    println!("{} {}", "ℹ".blue(), msg);
}

/// Group color rendered in (roughly) its own color
pub fn colored_name(color: TabGroupColor) -> ColoredString {
    let name = color.as_str();
    match color {
        TabGroupColor::Grey => name.bright_black(),
        TabGroupColor::Blue => name.blue(),
        TabGroupColor::Red => name.red(),
        TabGroupColor::Yellow => name.yellow(),
        TabGroupColor::Green => name.green(),
        TabGroupColor::Pink => name.bright_magenta(),
        TabGroupColor::Purple => name.magenta(),
        TabGroupColor::Cyan => name.cyan(),
        TabGroupColor::Orange => name.truecolor(255, 165, 0),
    }
}

pub fn print_profile_list(profiles: &[Profile]) {
    if profiles.is_empty() {
        println!("{}", "No profiles found".dimmed());
        return;
    }

    println!("{}", format!("Profiles ({}):", profiles.len()).bold());
    for profile in profiles {
        println!(
            "  {} {}",
            profile.name.yellow(),
            format!("({})", profile.directory).dimmed()
        );
    }
}

/// Print a list of groups
pub fn print_group_list(groups: &[TabGroup]) {
    if groups.is_empty() {
        println!("{}", "No tab groups found".dimmed());
        return;
    }

    println!("{}", format!("Tab groups ({}):", groups.len()).bold());
    for (i, group) in groups.iter().enumerate() {
        let junk = if group.is_phone_sync_junk() {
            " [phone sync]".red().to_string()
        } else {
            String::new()
        };
        println!(
            "  {} {} {} - {} tabs{}",
            format!("[{}]", i + 1).cyan(),
            group.name.yellow(),
            format!("({})", colored_name(group.color)).dimmed(),
            group.tabs.len(),
            junk
        );
    }
}

/// Print one group with its tabs
pub fn print_group(group: &TabGroup) {
    println!("{}", "═".repeat(50).cyan());
    println!("{}: {}", "Group".bold(), group.name.cyan().bold());
    println!("{}: {}", "Color".dimmed(), colored_name(group.color));
    println!("{}: {}", "Token".dimmed(), group.token);
    println!("{}: {}", "Tabs".dimmed(), group.tabs.len());
    println!("{}", "═".repeat(50).cyan());

    for (i, tab) in group.tabs.iter().enumerate() {
        println!("  {} {}", format!("[{}]", i + 1).cyan(), tab.title.yellow());
        println!("      {}", tab.url.dimmed());
    }
}

pub fn print_create_report(report: &CreateGroupReport) {
    if report.dry_run {
        print_info(&format!(
            "Dry run: would append {} bytes to {}",
            report.appended_bytes,
            report.session_file.display()
        ));
    } else {
        print_success(&format!(
            "Created group '{}' with {} tabs ({} bytes appended)",
            report.group_name, report.tab_count, report.appended_bytes
        ));
    }
    println!("{}: {}", "Token".dimmed(), report.token);
    if let Some(path) = &report.backup_path {
        println!("{}: {}", "Backup".dimmed(), path.display());
    }
}

/// Print a log summary, optionally followed by every record
pub fn print_log_summary(summary: &LogSummary, log: Option<&SessionLog>) {
    println!("{}: {}", "Version".bold(), summary.version);
    println!("{}: {}", "Records".bold(), summary.records);
    if summary.undecoded > 0 {
        println!("{}: {}", "Undecodable".yellow(), summary.undecoded);
    }
    if summary.unknown > 0 {
        println!("{}: {}", "Unknown opcodes".yellow(), summary.unknown);
    }
    if let Some(offset) = summary.truncated_at {
        println!("{}: torn record at byte {}", "Truncated".red(), offset);
    }

    println!("{}", "By opcode:".bold());
    for (opcode, count) in &summary.by_opcode {
        println!("  {:>3} {:<28} {}", opcode, opcode_name(*opcode).dimmed(), count);
    }

    if let Some(log) = log {
        println!("{}", "Records:".bold());
        for (i, entry) in log.entries.iter().enumerate() {
            let payload = entry.record.payload();
            let preview = &payload[..payload.len().min(PAYLOAD_PREVIEW)];
            let status = match &entry.command {
                Some(cmd) if cmd.is_unknown() => "unknown".yellow(),
                Some(_) => "ok".green(),
                None => "short".red(),
            };
            println!(
                "  {:>5} {:>3} {:<28} {:<7} {}{}",
                i,
                entry.record.opcode(),
                opcode_name(entry.record.opcode()),
                status,
                hex::encode(preview).dimmed(),
                if payload.len() > PAYLOAD_PREVIEW { "…" } else { "" }
            );
        }
    }
}

fn opcode_name(opcode: u8) -> &'static str {
    Opcode::from_u8(opcode).map_or("unknown", |op| op.name())
}

/// Print a list of backups
pub fn print_backup_list(backups: &[BackupEntry]) {
    if backups.is_empty() {
        println!("{}", "No backups yet".dimmed());
        return;
    }

    println!("{}", format!("Backups ({}):", backups.len()).bold());
    for backup in backups {
        println!(
            "  {} {} {}",
            backup.created_at.format("%Y-%m-%d %H:%M:%S").to_string().cyan(),
            backup.kinds().yellow(),
            backup.path.display().to_string().dimmed()
        );
    }
}

/// Top-level folders of the bookmarks bar with their URL counts
pub fn print_bookmark_bar(bar: &BookmarkFolder) {
    let folders: Vec<&BookmarkFolder> = bar.folders().collect();
    if folders.is_empty() {
        println!("{}", "No bookmark folders".dimmed());
    } else {
        println!("{}", format!("Folders ({}):", folders.len()).bold());
        for folder in folders {
            println!(
                "  {} {}",
                folder.name.yellow(),
                format!("({} bookmarks)", folder.flatten().len()).dimmed()
            );
        }
    }

    let loose = bar.urls().count();
    if loose > 0 {
        println!("  {}", format!("{loose} bookmark(s) at root").dimmed());
    }
}

/// A folder and everything below it
pub fn print_bookmark_tree(folder: &BookmarkFolder) {
    println!("{}", folder.name.cyan().bold());
    print_tree_children(folder, 1);
}

fn print_tree_children(folder: &BookmarkFolder, depth: usize) {
    let indent = "  ".repeat(depth);
    for child in &folder.children {
        match child {
            BookmarkNode::Folder(sub) => {
                println!("{indent}{}/", sub.name.yellow());
                print_tree_children(sub, depth + 1);
            }
            BookmarkNode::Url(bookmark) => {
                println!("{indent}{} {}", bookmark.name, bookmark.url.dimmed());
            }
        }
    }
}

/// Print what parking did (or would do)
pub fn print_park_reports(reports: &[ParkReport]) {
    for report in reports {
        let line = format!(
            "'{}' -> {} ({} bookmarks)",
            report.group_name, report.folder_path, report.bookmark_count
        );
        if report.dry_run {
            print_info(&format!("Dry run: would park {line}"));
        } else {
            print_success(&format!("Parked {line}"));
        }
    }
    if let Some(path) = reports.first().and_then(|r| r.backup_path.as_ref()) {
        println!("{}: {}", "Backup".dimmed(), path.display());
    }
}

/// Closed remote groups; ids are listed only with `detailed`
pub fn print_closed_remote(groups: &ClosedRemoteGroups, detailed: bool) {
    if groups.is_empty() {
        println!("{}", "No closed remote groups".dimmed());
        return;
    }

    println!(
        "{}",
        format!(
            "Closed remote groups ({} from {} device(s)):",
            groups.total_count(),
            groups.by_sync_cache.len()
        )
        .bold()
    );
    for cache in &groups.by_sync_cache {
        println!(
            "  {} {}",
            cache.cache_guid.yellow(),
            format!("({} groups)", cache.group_ids.len()).dimmed()
        );
        if detailed {
            for id in &cache.group_ids {
                println!("    {}", id.dimmed());
            }
        }
    }
}
