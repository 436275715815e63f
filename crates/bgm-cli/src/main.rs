//! bgm - browser tab-group manager
//!
//! Reads and extends the tab groups stored in the browser's session log.
//!
//! ## Usage
//!
//! ```bash
//! # List profiles and their groups
//! bgm profiles
//! bgm groups -p Work
//!
//! # Show the tabs of one group
//! bgm show "Reading list"
//!
//! # Create a group from URLs (browser must be closed)
//! bgm create "Research" -c blue -t "https://example.com|Example" -t https://rust-lang.org
//!
//! # Park a group into bookmarks, then bring it back
//! bgm park "Research"
//! bgm unpark "Parked Groups/Research" -c blue
//!
//! # Park every phone-sync "3 tabs" group
//! bgm groups cleanup --confirm
//!
//! # Summarise a session log
//! bgm inspect ~/.config/BraveSoftware/Brave-Browser/Default/Sessions/Session_13350000000000000
//! ```

mod display;

use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand};
use tracing::debug;

use bgm_core::{SystemIdSource, TabGroupColor, TabInput};
use bgm_logging::{BgmSubscriberBuilder, LogConfig};
use bgm_storage::{
    BackupManager, BgmConfig, CreateGroupOptions, ParkOptions, Profile, list_profiles,
    read_bookmarks, read_closed_remote_groups, read_tab_groups, resolve_profile,
};

use display::*;

/// bgm - browser tab-group manager
#[derive(Parser)]
#[command(name = "bgm")]
#[command(about = "Inspect and create browser tab groups")]
#[command(version)]
struct Cli {
    /// Increase log verbosity (-v info, -vv debug)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List browser profiles
    Profiles,
    /// List and manage tab groups
    Groups {
        /// Profile name or directory
        #[arg(short, long, global = true)]
        profile: Option<String>,
        /// Only show phone-synced junk groups ("3 tabs")
        #[arg(long)]
        junk: bool,
        /// Also list closed remote groups per device
        #[arg(long)]
        all: bool,
        #[command(subcommand)]
        action: Option<GroupsAction>,
    },
    /// Show the tabs of a group
    Show {
        /// Group name (case-insensitive)
        name: String,
        /// Profile name or directory
        #[arg(short, long)]
        profile: Option<String>,
    },
    /// Create a new tab group
    Create {
        /// Group name
        name: String,
        /// Group color
        #[arg(short, long, default_value = "grey")]
        color: TabGroupColor,
        /// Tab as URL or URL|TITLE (repeatable)
        #[arg(short = 't', long = "tab", value_parser = parse_tab, required = true)]
        tabs: Vec<TabInput>,
        /// Profile name or directory
        #[arg(short, long)]
        profile: Option<String>,
        /// Encode only, write nothing
        #[arg(long)]
        dry_run: bool,
        /// Skip the backup of the session log
        #[arg(long)]
        no_backup: bool,
    },
    /// Copy a group's tabs into a bookmark folder
    Park {
        /// Group name (case-insensitive)
        name: String,
        /// Destination folder on the bookmarks bar
        #[arg(long = "to", value_name = "FOLDER")]
        destination: Option<String>,
        /// Profile name or directory
        #[arg(short, long)]
        profile: Option<String>,
        /// Show what would be written
        #[arg(long)]
        dry_run: bool,
        /// Skip the backup of the bookmarks file
        #[arg(long)]
        no_backup: bool,
    },
    /// Open a bookmark folder as a new tab group
    Unpark {
        /// Folder path under the bookmarks bar, e.g. "Parked Groups/Research"
        path: String,
        /// Group color
        #[arg(short, long, default_value = "grey")]
        color: TabGroupColor,
        /// Profile name or directory
        #[arg(short, long)]
        profile: Option<String>,
        /// Encode only, write nothing
        #[arg(long)]
        dry_run: bool,
        /// Skip the backup of the session log
        #[arg(long)]
        no_backup: bool,
    },
    /// List bookmark folders
    Bookmarks {
        /// Profile name or directory
        #[arg(short, long, global = true)]
        profile: Option<String>,
        #[command(subcommand)]
        action: Option<BookmarksAction>,
    },
    /// Summarise a session log file
    Inspect {
        /// Path to a Session_/Tabs_ file
        file: PathBuf,
        /// List every record
        #[arg(long)]
        records: bool,
    },
    /// List backups
    Backups,
}

#[derive(Subcommand)]
enum GroupsAction {
    /// Park phone-synced junk groups into "Phone Sync Junk"
    Cleanup {
        /// Actually park them; without this only the list is shown
        #[arg(long)]
        confirm: bool,
    },
    /// Closed remote groups synced from other devices
    Remote {
        /// Forget all closed remote group ids (browser must be closed)
        #[arg(long)]
        clear: bool,
        /// Skip the backup of the preferences file
        #[arg(long)]
        no_backup: bool,
    },
}

#[derive(Subcommand)]
enum BookmarksAction {
    /// Show a folder and everything below it
    Show {
        /// Folder path under the bookmarks bar
        path: String,
    },
}

fn main() {
    let cli = Cli::parse();

    // Config comes first so it can route logs to a file
    let config = match BgmConfig::load() {
        Ok(config) => config,
        Err(e) => {
            print_error(&format!("loading configuration: {e}"));
            std::process::exit(1);
        }
    };

    let mut logging = BgmSubscriberBuilder::new().with_config(LogConfig::cli(cli.verbose));
    if let Some(file) = &config.log_file {
        logging = logging.with_file_output(file.clone());
    }
    let _guard = logging.init();
    debug!(?config, "Loaded configuration");

    if let Err(e) = run(cli, &config) {
        print_error(&format!("{e:#}"));
        std::process::exit(1);
    }
}

fn run(cli: Cli, config: &BgmConfig) -> Result<()> {
    match cli.command {
        Commands::Profiles => cmd_profiles(config),
        Commands::Groups {
            profile,
            junk,
            all,
            action,
        } => match action {
            None => cmd_groups(config, profile.as_deref(), junk, all),
            Some(GroupsAction::Cleanup { confirm }) => {
                cmd_cleanup(config, profile.as_deref(), confirm)
            }
            Some(GroupsAction::Remote { clear, no_backup }) => {
                cmd_remote(config, profile.as_deref(), clear, !no_backup)
            }
        },
        Commands::Show { name, profile } => cmd_show(config, &name, profile.as_deref()),
        Commands::Create {
            name,
            color,
            tabs,
            profile,
            dry_run,
            no_backup,
        } => cmd_create(
            config,
            &name,
            color,
            &tabs,
            profile.as_deref(),
            CreateGroupOptions {
                dry_run,
                backup: !no_backup,
                require_browser_closed: true,
            },
        ),
        Commands::Park {
            name,
            destination,
            profile,
            dry_run,
            no_backup,
        } => cmd_park(
            config,
            &name,
            profile.as_deref(),
            &ParkOptions {
                destination,
                dry_run,
                backup: !no_backup,
                require_browser_closed: true,
            },
        ),
        Commands::Unpark {
            path,
            color,
            profile,
            dry_run,
            no_backup,
        } => cmd_unpark(
            config,
            &path,
            color,
            profile.as_deref(),
            CreateGroupOptions {
                dry_run,
                backup: !no_backup,
                require_browser_closed: true,
            },
        ),
        Commands::Bookmarks { profile, action } => match action {
            None => cmd_bookmarks(config, profile.as_deref()),
            Some(BookmarksAction::Show { path }) => {
                cmd_bookmarks_show(config, profile.as_deref(), &path)
            }
        },
        Commands::Inspect { file, records } => cmd_inspect(&file, records),
        Commands::Backups => cmd_backups(config),
    }
}

fn cmd_profiles(config: &BgmConfig) -> Result<()> {
    let data_dir = config.browser_data_dir()?;
    let profiles = list_profiles(&data_dir)?;
    print_profile_list(&profiles);
    Ok(())
}

fn cmd_groups(config: &BgmConfig, profile: Option<&str>, junk: bool, all: bool) -> Result<()> {
    let profile = select_profile(config, profile)?;
    if bgm_storage::is_browser_running() {
        print_info("The browser is running; showing the last saved session");
    }
    let mut groups = read_tab_groups(&profile.path)?;
    if junk {
        groups.retain(|g| g.is_phone_sync_junk());
    }

    print_info(&format!("Profile: {}", profile.name));
    print_group_list(&groups);

    let remote = read_closed_remote_groups(&profile.path)?;
    if all {
        print_closed_remote(&remote, false);
        print_info(&format!(
            "Total: {} active, {} closed remote",
            groups.len(),
            remote.total_count()
        ));
    } else if !remote.is_empty() {
        print_info(&format!(
            "{} closed remote group(s); use --all for details",
            remote.total_count()
        ));
    }
    if junk && !groups.is_empty() {
        print_info("To park these: bgm groups cleanup --confirm");
    }
    Ok(())
}

fn cmd_cleanup(config: &BgmConfig, profile: Option<&str>, confirm: bool) -> Result<()> {
    let profile = select_profile(config, profile)?;
    let junk = bgm_storage::junk_groups(&profile.path)?;
    if junk.is_empty() {
        print_info("No junk groups found");
        return Ok(());
    }

    print_group_list(&junk);
    if !confirm {
        print_info(&format!(
            "Run with --confirm to park them into '{}'",
            bgm_storage::JUNK_PARKED_FOLDER
        ));
        return Ok(());
    }

    let backups = BackupManager::new(config.backup_dir()?);
    let reports = bgm_storage::cleanup_junk_groups(&profile.path, &backups, &ParkOptions::default())
        .with_context(|| format!("parking junk groups in profile '{}'", profile.name))?;
    print_park_reports(&reports);
    print_info("The groups stay open until you close their tabs in the browser");
    Ok(())
}

fn cmd_remote(config: &BgmConfig, profile: Option<&str>, clear: bool, backup: bool) -> Result<()> {
    let profile = select_profile(config, profile)?;
    if !clear {
        print_closed_remote(&read_closed_remote_groups(&profile.path)?, true);
        return Ok(());
    }

    let backups = BackupManager::new(config.backup_dir()?);
    let report = bgm_storage::clear_closed_remote_groups(&profile.path, &backups, backup, true)?;
    if report.cleared == 0 {
        print_info("No closed remote groups to clear");
        return Ok(());
    }
    print_success(&format!("Cleared {} closed remote group id(s)", report.cleared));
    if let Some(path) = &report.backup_path {
        println!("Backup: {}", path.display());
    }
    print_info("Groups still open on other devices may sync back");
    Ok(())
}

fn cmd_park(
    config: &BgmConfig,
    name: &str,
    profile: Option<&str>,
    options: &ParkOptions,
) -> Result<()> {
    let profile = select_profile(config, profile)?;
    let backups = BackupManager::new(config.backup_dir()?);
    let report = bgm_storage::park_tab_group(&profile.path, &backups, name, options)
        .with_context(|| format!("parking group '{name}' in profile '{}'", profile.name))?;
    print_park_reports(std::slice::from_ref(&report));
    Ok(())
}

fn cmd_unpark(
    config: &BgmConfig,
    path: &str,
    color: TabGroupColor,
    profile: Option<&str>,
    options: CreateGroupOptions,
) -> Result<()> {
    let profile = select_profile(config, profile)?;
    let backups = BackupManager::new(config.backup_dir()?);
    let mut ids = SystemIdSource::new();
    let report =
        bgm_storage::unpark_bookmark_folder(&profile.path, &backups, path, color, &mut ids, options)
            .with_context(|| format!("unparking '{path}' in profile '{}'", profile.name))?;

    print_create_report(&report);
    if !report.dry_run {
        print_info("Start the browser to see the new group");
    }
    Ok(())
}

fn cmd_bookmarks(config: &BgmConfig, profile: Option<&str>) -> Result<()> {
    let profile = select_profile(config, profile)?;
    let bookmarks = read_bookmarks(&profile.path)?;
    print_info(&format!("Profile: {}", profile.name));
    print_bookmark_bar(&bookmarks.roots.bookmark_bar);
    Ok(())
}

fn cmd_bookmarks_show(config: &BgmConfig, profile: Option<&str>, path: &str) -> Result<()> {
    let profile = select_profile(config, profile)?;
    let bookmarks = read_bookmarks(&profile.path)?;
    match bookmarks.roots.bookmark_bar.find_folder(path) {
        Some(folder) => {
            print_bookmark_tree(folder);
            Ok(())
        }
        None => bail!("no bookmark folder '{path}' in profile '{}'", profile.name),
    }
}

fn cmd_show(config: &BgmConfig, name: &str, profile: Option<&str>) -> Result<()> {
    let profile = select_profile(config, profile)?;
    match bgm_storage::find_tab_group(&profile.path, name)? {
        Some(group) => {
            print_group(&group);
            Ok(())
        }
        None => bail!("no tab group named '{name}' in profile '{}'", profile.name),
    }
}

fn cmd_create(
    config: &BgmConfig,
    name: &str,
    color: TabGroupColor,
    tabs: &[TabInput],
    profile: Option<&str>,
    options: CreateGroupOptions,
) -> Result<()> {
    let profile = select_profile(config, profile)?;
    let backups = BackupManager::new(config.backup_dir()?);
    let mut ids = SystemIdSource::new();

    let report = bgm_storage::create_tab_group(
        &profile.path,
        &backups,
        name,
        color,
        tabs,
        &mut ids,
        options,
    )
    .with_context(|| format!("creating group '{name}' in profile '{}'", profile.name))?;

    print_create_report(&report);
    if !report.dry_run {
        print_info("Start the browser to see the new group");
    }
    Ok(())
}

fn cmd_inspect(file: &Path, records: bool) -> Result<()> {
    let log = bgm_storage::read_session_log(file)
        .with_context(|| format!("reading {}", file.display()))?;
    print_log_summary(&log.summary(), records.then_some(&log));
    Ok(())
}

fn cmd_backups(config: &BgmConfig) -> Result<()> {
    let backups = BackupManager::new(config.backup_dir()?);
    print_backup_list(&backups.list_backups()?);
    Ok(())
}

/// Profile from `-p`, else the configured default, else the first listed
fn select_profile(config: &BgmConfig, requested: Option<&str>) -> Result<Profile> {
    let data_dir = config.browser_data_dir()?;
    let profiles = list_profiles(&data_dir)?;

    match requested.or(config.default_profile.as_deref()) {
        Some(input) => resolve_profile(&profiles, input)
            .cloned()
            .with_context(|| format!("no profile named '{input}'")),
        None => profiles
            .into_iter()
            .next()
            .context("the browser has no profiles"),
    }
}

/// Parse `URL` or `URL|TITLE`; a missing title falls back to the URL
fn parse_tab(arg: &str) -> Result<TabInput, String> {
    let (url, title) = match arg.split_once('|') {
        Some((url, title)) => (url.trim(), title.trim()),
        None => (arg.trim(), ""),
    };
    if url.is_empty() {
        return Err(format!("tab '{arg}' has no URL"));
    }
    let title = if title.is_empty() { url } else { title };
    Ok(TabInput::new(url, title))
}
