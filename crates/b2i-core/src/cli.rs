use std::ffi::OsString;
use std::io::IsTerminal;
use std::path::PathBuf;

use anyhow::anyhow;
use b2i_shared::model::{ColumnId, Priority};
use clap::{ArgAction, Args, Parser, Subcommand};
use tracing::debug;
use tracing_subscriber::EnvFilter;

#[derive(Debug, Clone)]
pub struct PreprocessedArgs {
    pub cleaned_args: Vec<OsString>,
    pub rc_overrides: Vec<(String, String)>,
}

#[derive(Debug, Clone)]
pub struct KeyVal {
    pub key: String,
    pub value: String,
}

impl std::str::FromStr for KeyVal {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (k, v) = s
            .split_once('=')
            .ok_or_else(|| anyhow!("expected KEY=VALUE, got: {s}"))?;
        Ok(Self {
            key: k.trim().to_string(),
            value: v.trim().to_string(),
        })
    }
}

#[derive(Parser, Debug, Clone)]
#[command(
    name = "b2i",
    version,
    about = "B2I: goals, a task board, the Friday shutdown and weekly check-ins",
    disable_help_subcommand = true
)]
pub struct GlobalCli {
    #[arg(short = 'v', long = "verbose", action = ArgAction::Count, global = true)]
    pub verbose: u8,

    #[arg(short = 'q', long = "quiet", action = ArgAction::Count, global = true)]
    pub quiet: u8,

    #[arg(
        long = "rc",
        value_parser = clap::builder::ValueParser::new(|s: &str| s.parse::<KeyVal>()),
        action = ArgAction::Append,
        global = true
    )]
    pub rc_overrides: Vec<KeyVal>,

    #[arg(long = "config", global = true)]
    pub config: Option<PathBuf>,

    #[arg(long = "data", global = true)]
    pub data: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Sign in with a magic link, inspect or end the session
    Auth {
        #[command(subcommand)]
        action: AuthCommand,
    },
    /// Top-level goals
    Goals {
        #[command(subcommand)]
        action: Option<GoalsCommand>,
    },
    /// The three-column task board
    Board {
        #[command(subcommand)]
        action: Option<BoardCommand>,
    },
    /// The Friday shutdown checklist
    Checklist {
        #[command(subcommand)]
        action: Option<ChecklistCommand>,
    },
    /// Weekly check-in
    Checkin {
        #[command(subcommand)]
        action: Option<CheckinCommand>,
    },
    /// Monthly review
    Review {
        #[command(subcommand)]
        action: Option<ReviewCommand>,
    },
    /// Which reflection is due today
    Today,
    /// Streak, averages and notes across recent weeks
    Metrics {
        #[arg(long)]
        weeks: Option<usize>,
    },
    /// The motivational footer
    Footer {
        #[command(subcommand)]
        action: Option<FooterCommand>,
    },
}

#[derive(Subcommand, Debug, Clone)]
pub enum AuthCommand {
    /// Email a sign-in link
    Login { email: String },
    /// Sign in with the code from the email
    Verify { email: String, code: String },
    /// Sign in from the URL the magic link redirected to
    Callback { url: String },
    Logout,
    Status,
}

#[derive(Subcommand, Debug, Clone)]
pub enum GoalsCommand {
    List,
    Add {
        #[arg(required = true, num_args = 1..)]
        title: Vec<String>,
    },
    Toggle {
        id: String,
    },
    Rename {
        id: String,
        #[arg(required = true, num_args = 1..)]
        title: Vec<String>,
    },
    Rm {
        id: String,
    },
}

#[derive(Subcommand, Debug, Clone)]
pub enum BoardCommand {
    Show,
    Add {
        #[arg(required = true, num_args = 1..)]
        title: Vec<String>,
        #[arg(long, default_value = "todo")]
        column: ColumnId,
        #[arg(long)]
        due: Option<String>,
        #[arg(long)]
        priority: Option<Priority>,
    },
    Edit(EditCardArgs),
    Move {
        id: String,
        column: ColumnId,
        #[arg(long)]
        index: Option<usize>,
    },
    Archive {
        id: String,
    },
    Restore {
        id: String,
    },
    /// List archived cards
    Archived,
    Rm {
        id: String,
    },
}

#[derive(Args, Debug, Clone)]
pub struct EditCardArgs {
    pub id: String,
    #[arg(long)]
    pub title: Option<String>,
    /// An empty string clears the description
    #[arg(long)]
    pub description: Option<String>,
    #[arg(long, conflicts_with = "clear_priority")]
    pub priority: Option<Priority>,
    #[arg(long, conflicts_with = "clear_due")]
    pub due: Option<String>,
    #[arg(long)]
    pub clear_due: bool,
    #[arg(long)]
    pub clear_priority: bool,
}

#[derive(Subcommand, Debug, Clone)]
pub enum ChecklistCommand {
    Show,
    /// Toggle an item
    Check {
        id: String,
    },
    Add {
        #[arg(required = true, num_args = 1..)]
        label: Vec<String>,
    },
    Rm {
        id: String,
    },
    /// Uncheck every item
    Reset,
    /// Move the item at one index to another
    Move {
        from: usize,
        to: usize,
    },
}

#[derive(Subcommand, Debug, Clone)]
pub enum CheckinCommand {
    Show {
        #[arg(long)]
        week: Option<String>,
    },
    Save(SaveCheckinArgs),
}

#[derive(Args, Debug, Clone)]
pub struct SaveCheckinArgs {
    #[arg(long, value_parser = clap::value_parser!(u8).range(1..=5))]
    pub body: Option<u8>,
    #[arg(long, value_parser = clap::value_parser!(u8).range(1..=5))]
    pub mind: Option<u8>,
    #[arg(long, value_parser = clap::value_parser!(u8).range(1..=5))]
    pub work: Option<u8>,
    #[arg(long, value_parser = clap::value_parser!(u8).range(1..=5))]
    pub energy: Option<u8>,
    #[arg(long)]
    pub equanimity: Option<String>,
    #[arg(long)]
    pub flag: Option<String>,
    #[arg(long)]
    pub week: Option<String>,
}

#[derive(Subcommand, Debug, Clone)]
pub enum ReviewCommand {
    Show {
        #[arg(long)]
        month: Option<String>,
    },
    Save(SaveReviewArgs),
}

#[derive(Args, Debug, Clone)]
pub struct SaveReviewArgs {
    #[arg(long)]
    pub trends: Option<String>,
    #[arg(long)]
    pub keystone: Option<String>,
    #[arg(long = "next-why")]
    pub next_why: Option<String>,
    #[arg(long)]
    pub adjust: Option<String>,
    #[arg(long)]
    pub month: Option<String>,
}

#[derive(Subcommand, Debug, Clone)]
pub enum FooterCommand {
    Show,
    Set {
        #[arg(required = true, num_args = 1..)]
        message: Vec<String>,
    },
}

pub fn init_tracing(verbose: u8, quiet: u8) -> anyhow::Result<()> {
    let default_level = if quiet >= 2 {
        "error"
    } else if quiet == 1 {
        "warn"
    } else if verbose >= 3 {
        "trace"
    } else if verbose == 2 {
        "debug"
    } else if verbose == 1 {
        "info"
    } else {
        "warn"
    };

    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(default_level))
        .map_err(|e| anyhow!("invalid RUST_LOG / log filter: {e}"))?;

    let init_result = tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .with_target(true)
        .with_level(true)
        .with_thread_ids(true)
        .with_ansi(std::io::stderr().is_terminal())
        .try_init();

    if let Err(err) = init_result {
        debug!(error = %err, "tracing subscriber already set, continuing");
    }

    Ok(())
}

/// Pulls positional `rc.KEY=VALUE` (or `rc.KEY:VALUE`) overrides out of the
/// argument list before clap sees it.
#[tracing::instrument(skip_all)]
pub fn preprocess_args(raw: &[OsString]) -> anyhow::Result<PreprocessedArgs> {
    let mut cleaned = Vec::with_capacity(raw.len());
    let mut overrides: Vec<(String, String)> = Vec::new();

    let mut iter = raw.iter().cloned();
    if let Some(bin) = iter.next() {
        cleaned.push(bin);
    }

    for arg in iter {
        let s = arg.to_string_lossy();
        if let Some(rest) = s.strip_prefix("rc.") {
            let parsed = if let Some((k, v)) = rest.split_once('=') {
                Some((format!("rc.{k}"), v.to_string()))
            } else {
                rest.split_once(':')
                    .map(|(k, v)| (format!("rc.{k}"), v.to_string()))
            };

            if let Some((k, v)) = parsed {
                debug!(key = %k, value = %v, "captured positional rc override");
                overrides.push((k, v));
                continue;
            }
        }

        cleaned.push(arg);
    }

    Ok(PreprocessedArgs {
        cleaned_args: cleaned,
        rc_overrides: overrides,
    })
}

/// Joins the words of a free-text argument.
pub fn join_words(words: &[String]) -> String {
    words.join(" ")
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    fn args(raw: &[&str]) -> Vec<OsString> {
        raw.iter().map(OsString::from).collect()
    }

    #[test]
    fn positional_rc_overrides_are_extracted() {
        let pre = preprocess_args(&args(&["b2i", "rc.color=off", "goals", "rc.time.zone:UTC"]))
            .expect("preprocess");
        assert_eq!(pre.cleaned_args, args(&["b2i", "goals"]));
        assert_eq!(
            pre.rc_overrides,
            vec![
                ("rc.color".to_string(), "off".to_string()),
                ("rc.time.zone".to_string(), "UTC".to_string()),
            ]
        );
    }

    #[test]
    fn board_add_parses_column_and_priority() {
        let cli = GlobalCli::parse_from(args(&[
            "b2i",
            "board",
            "add",
            "Ship",
            "release",
            "--column",
            "in-progress",
            "--priority",
            "high",
        ]));
        match cli.command {
            Some(Command::Board {
                action:
                    Some(BoardCommand::Add {
                        title,
                        column,
                        priority,
                        due,
                    }),
            }) => {
                assert_eq!(join_words(&title), "Ship release");
                assert_eq!(column, ColumnId::InProgress);
                assert_eq!(priority, Some(Priority::High));
                assert_eq!(due, None);
            }
            other => panic!("unexpected parse: {other:?}"),
        }
    }

    #[test]
    fn scores_out_of_range_are_rejected() {
        let parsed = GlobalCli::try_parse_from(args(&["b2i", "checkin", "save", "--body", "6"]));
        assert!(parsed.is_err());
    }

    #[test]
    fn global_flags_work_after_the_subcommand() {
        let cli = GlobalCli::parse_from(args(&["b2i", "goals", "list", "-vv", "--rc", "color=off"]));
        assert_eq!(cli.verbose, 2);
        assert_eq!(cli.rc_overrides.len(), 1);
        assert_eq!(cli.rc_overrides[0].key, "color");
    }
}
