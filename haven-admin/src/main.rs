use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::NaiveDate;
use clap::{Args, Parser, Subcommand};
use serde::Serialize;

use haven_core::commands::{ensure_initialized, haven_root};
use haven_core::services::{FontSize, JournalPatch, Ledger, PreferencesPatch, Role, Theme};
use haven_core::Haven;

#[derive(Parser)]
#[command(
    name = "haven-admin",
    about = "Inspect and maintain a local Haven data root"
)]
struct Cli {
    /// Data root (defaults to $HAVEN_ROOT or .haven)
    #[arg(long, global = true)]
    root: Option<PathBuf>,
    #[command(subcommand)]
    cmd: Cmd,
}

#[derive(Subcommand)]
enum Cmd {
    /// Create the data root layout and default config
    Init,
    #[command(subcommand)]
    Mood(MoodCmd),
    #[command(subcommand)]
    Journal(JournalCmd),
    #[command(subcommand)]
    Chat(ChatCmd),
    #[command(subcommand)]
    Prefs(PrefsCmd),
    /// Seven-day digest of mood and journal activity
    Report {
        /// How many common tags to list (defaults to report.top_tags)
        #[arg(long)]
        top: Option<usize>,
    },
    /// Write a snapshot of every stored key
    Backup {
        #[arg(long)]
        out: Option<PathBuf>,
    },
    /// Replace all stored data with a snapshot
    Restore { file: PathBuf },
    /// Save or show the current session summary
    Summary {
        text: Option<String>,
        #[arg(long, conflicts_with = "text")]
        clear: bool,
    },
}

#[derive(Subcommand)]
enum MoodCmd {
    /// Record a mood between 1 and 5
    Add {
        value: u8,
        #[arg(long)]
        note: Option<String>,
    },
    /// Thirty-day insights
    Insights,
    /// Per-day averages
    Daily {
        #[arg(long, default_value_t = 7)]
        days: u32,
    },
    Export(ExportArgs),
    Import { file: PathBuf },
    Clear,
}

#[derive(Subcommand)]
enum JournalCmd {
    Add {
        content: String,
        #[arg(long)]
        mood: u8,
        #[arg(long = "tag")]
        tags: Vec<String>,
    },
    Update {
        id: String,
        #[arg(long)]
        content: Option<String>,
        #[arg(long)]
        mood: Option<u8>,
        /// Replaces every tag when given at least once
        #[arg(long = "tag")]
        tags: Vec<String>,
    },
    Delete { id: String },
    /// Case-insensitive search over content and tags
    Search { query: String },
    /// Entries carrying exactly this tag
    Tag { tag: String },
    /// Entries written on a given day (YYYY-MM-DD)
    On { date: NaiveDate },
    /// Average journal mood per day
    Trends,
    Export(ExportArgs),
    Import { file: PathBuf },
    Clear,
}

#[derive(Subcommand)]
enum ChatCmd {
    Add {
        /// user | assistant | system
        role: Role,
        content: String,
    },
    Search { query: String },
    /// Messages sent on a given day (YYYY-MM-DD)
    On { date: NaiveDate },
    Export(ExportArgs),
    Import { file: PathBuf },
    Clear,
}

#[derive(Subcommand)]
enum PrefsCmd {
    Show,
    Set(PrefsSet),
    Export(ExportArgs),
    Import { file: PathBuf },
    Reset,
}

#[derive(Args)]
struct PrefsSet {
    /// light | dark
    #[arg(long)]
    theme: Option<Theme>,
    /// small | medium | large
    #[arg(long)]
    font_size: Option<FontSize>,
    #[arg(long)]
    notifications: Option<bool>,
    #[arg(long)]
    voice_enabled: Option<bool>,
    #[arg(long)]
    auto_save: Option<bool>,
    #[arg(long)]
    language: Option<String>,
}

#[derive(Args)]
struct ExportArgs {
    /// Write to this file instead of stdout
    #[arg(long)]
    out: Option<PathBuf>,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_env("HAVEN_LOG")
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let root = cli.root.unwrap_or_else(haven_root);
    run(&root, cli.cmd)
}

fn run(root: &Path, cmd: Cmd) -> Result<()> {
    if let Cmd::Init = cmd {
        return init(root);
    }

    let (mut haven, cfg) = Haven::open_root(root)?;
    tracing::debug!(root = %root.display(), backend = cfg.storage.backend.as_str(), "opened");

    match cmd {
        Cmd::Init => init(root),
        Cmd::Mood(cmd) => match cmd {
            MoodCmd::Add { value, note } => print_json(&haven.record_mood(value, note)?),
            MoodCmd::Insights => print_json(&haven.mood_insights()),
            MoodCmd::Daily { days } => print_json(&haven.daily_moods(days)),
            MoodCmd::Export(args) => emit(&haven.mood().export()?, args.out.as_deref()),
            MoodCmd::Import { file } => {
                let n = haven.import_mood(&read(&file)?)?;
                println!("imported {n} mood entries");
                Ok(())
            }
            MoodCmd::Clear => {
                haven.clear_mood()?;
                println!("mood history cleared");
                Ok(())
            }
        },
        Cmd::Journal(cmd) => match cmd {
            JournalCmd::Add {
                content,
                mood,
                tags,
            } => print_json(&haven.add_journal_entry(&content, mood, tags)?),
            JournalCmd::Update {
                id,
                content,
                mood,
                tags,
            } => {
                let patch = JournalPatch {
                    content,
                    mood,
                    tags: (!tags.is_empty()).then_some(tags),
                    ..Default::default()
                };
                anyhow::ensure!(haven.update_journal_entry(&id, patch)?, "no journal entry {id}");
                print_json(&haven.journal().get_by_id(&id))
            }
            JournalCmd::Delete { id } => {
                anyhow::ensure!(haven.delete_journal_entry(&id)?, "no journal entry {id}");
                println!("deleted {id}");
                Ok(())
            }
            JournalCmd::Search { query } => print_json(&haven.journal().search(&query)),
            JournalCmd::Tag { tag } => print_json(&haven.journal().by_tag(&tag)),
            JournalCmd::On { date } => print_json(&haven.journal().by_date(date)),
            JournalCmd::Trends => print_json(&haven.journal().mood_trends()),
            JournalCmd::Export(args) => emit(&haven.journal().export()?, args.out.as_deref()),
            JournalCmd::Import { file } => {
                let n = haven.import_journal(&read(&file)?)?;
                println!("imported {n} journal entries");
                Ok(())
            }
            JournalCmd::Clear => {
                haven.clear_journal()?;
                println!("journal cleared");
                Ok(())
            }
        },
        Cmd::Chat(cmd) => match cmd {
            ChatCmd::Add { role, content } => print_json(&haven.add_chat_message(role, &content)?),
            ChatCmd::Search { query } => print_json(&haven.chat().search(&query)),
            ChatCmd::On { date } => print_json(&haven.chat_on(date)),
            ChatCmd::Export(args) => emit(&haven.chat().export()?, args.out.as_deref()),
            ChatCmd::Import { file } => {
                let n = haven.import_chat(&read(&file)?)?;
                println!("imported {n} chat messages");
                Ok(())
            }
            ChatCmd::Clear => {
                haven.clear_chat_history()?;
                println!("chat history cleared");
                Ok(())
            }
        },
        Cmd::Prefs(cmd) => match cmd {
            PrefsCmd::Show => print_json(haven.preferences()),
            PrefsCmd::Set(set) => print_json(haven.update_preferences(set.into())?),
            PrefsCmd::Export(args) => emit(&haven.preferences().export()?, args.out.as_deref()),
            PrefsCmd::Import { file } => print_json(haven.import_preferences(&read(&file)?)?),
            PrefsCmd::Reset => print_json(haven.reset_preferences()?),
        },
        Cmd::Report { top } => {
            print_json(&haven.weekly_report(top.unwrap_or(cfg.report.top_tags)))
        }
        Cmd::Backup { out } => emit(&haven.backup()?, out.as_deref()),
        Cmd::Restore { file } => {
            let n = haven.restore(&read(&file)?)?;
            println!("restored {n} keys");
            Ok(())
        }
        Cmd::Summary { text, clear } => {
            if clear {
                haven.clear_session_summary()?;
                println!("session summary cleared");
            } else if let Some(text) = text {
                haven.set_session_summary(&text)?;
                println!("session summary saved");
            } else {
                match haven.session_summary()? {
                    Some(s) => println!("{s}"),
                    None => println!("(no session summary)"),
                }
            }
            Ok(())
        }
    }
}

fn init(root: &Path) -> Result<()> {
    let report = ensure_initialized(root)?;
    println!("haven root: {}", report.root.display());
    for c in &report.created {
        println!("  created  {c}");
    }
    for e in &report.existed {
        println!("  exists   {e}");
    }
    Ok(())
}

impl From<PrefsSet> for PreferencesPatch {
    fn from(set: PrefsSet) -> Self {
        PreferencesPatch {
            theme: set.theme,
            font_size: set.font_size,
            notifications: set.notifications,
            voice_enabled: set.voice_enabled,
            auto_save: set.auto_save,
            language: set.language,
        }
    }
}

fn print_json<T: Serialize + ?Sized>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn emit(text: &str, out: Option<&Path>) -> Result<()> {
    match out {
        Some(path) => {
            fs::write(path, text).with_context(|| format!("writing {}", path.display()))?;
            println!("wrote {}", path.display());
        }
        None => println!("{text}"),
    }
    Ok(())
}

fn read(path: &Path) -> Result<String> {
    fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn nested_subcommands_parse() {
        let cli = Cli::try_parse_from([
            "haven-admin",
            "--root",
            "/tmp/h",
            "journal",
            "add",
            "long day",
            "--mood",
            "3",
            "--tag",
            "work",
            "--tag",
            "sleep",
        ])
        .unwrap();
        assert_eq!(cli.root.as_deref(), Some(Path::new("/tmp/h")));
        match cli.cmd {
            Cmd::Journal(JournalCmd::Add { content, mood, tags }) => {
                assert_eq!(content, "long day");
                assert_eq!(mood, 3);
                assert_eq!(tags, vec!["work", "sleep"]);
            }
            _ => panic!("wrong subcommand"),
        }
    }

    #[test]
    fn chat_role_is_validated() {
        assert!(Cli::try_parse_from(["haven-admin", "chat", "add", "assistant", "hi"]).is_ok());
        assert!(Cli::try_parse_from(["haven-admin", "chat", "add", "bot", "hi"]).is_err());
    }

    #[test]
    fn summary_text_and_clear_conflict() {
        assert!(Cli::try_parse_from(["haven-admin", "summary", "x", "--clear"]).is_err());
    }

    #[test]
    fn prefs_set_fills_only_the_given_fields() {
        let cli = Cli::try_parse_from([
            "haven-admin",
            "prefs",
            "set",
            "--font-size",
            "large",
            "--auto-save",
            "false",
        ])
        .unwrap();
        let Cmd::Prefs(PrefsCmd::Set(set)) = cli.cmd else {
            panic!("wrong subcommand");
        };
        let patch = PreferencesPatch::from(set);
        assert_eq!(patch.font_size, Some(FontSize::Large));
        assert_eq!(patch.auto_save, Some(false));
        assert!(patch.theme.is_none());
    }

    #[test]
    fn prefs_set_rejects_unknown_theme() {
        assert!(Cli::try_parse_from(["haven-admin", "prefs", "set", "--theme", "dark"]).is_ok());
        assert!(Cli::try_parse_from(["haven-admin", "prefs", "set", "--theme", "sepia"]).is_err());
    }
}
