//! CLI - Command Line Interface for streamtv
//!
//! Running without a subcommand opens the interactive player. Subcommands
//! expose the pieces of the player for scripting; output is JSON when
//! requested or when stdout is not a terminal.
//!
//! # Examples
//!
//! ```bash
//! # Resolve playable links for a movie
//! streamtv resolve 603 --json
//!
//! # Resolve an episode with a provider and server preferences
//! streamtv resolve 1399 --tv -s 1 -e 3 --provider alpha --server fast --server backup
//!
//! # Convert SubRip captions to WebVTT
//! streamtv convert subs.srt > subs.vtt
//!
//! # Open the player on an item, starting at 12 minutes
//! streamtv play 603 --title "The Matrix" --start 12:00
//! ```

use clap::{Args, Parser, Subcommand};
use serde::{Deserialize, Serialize};
use std::io::IsTerminal;
use std::path::PathBuf;

use crate::models::{EpisodeRef, Item, MediaType, ResolveRequest};

// =============================================================================
// Exit Codes
// =============================================================================

/// Exit codes for CLI operations (semantic for scripting)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(i32)]
pub enum ExitCode {
    Success = 0,
    Error = 1,
    InvalidArgs = 2,
    NetworkError = 3,
    /// Resolver returned no playable link
    NoStreams = 5,
    /// Captions could not be converted
    CaptionFailed = 6,
}

impl From<ExitCode> for i32 {
    fn from(code: ExitCode) -> i32 {
        code as i32
    }
}

impl From<ExitCode> for std::process::ExitCode {
    fn from(code: ExitCode) -> std::process::ExitCode {
        std::process::ExitCode::from(code as u8)
    }
}

// =============================================================================
// Main CLI Structure
// =============================================================================

/// streamtv - remote-control media player for the terminal
///
/// Run without arguments to launch the interactive player.
#[derive(Parser, Debug)]
#[command(
    name = "streamtv",
    version,
    author = "Gorka & Hermes",
    about = "Remote-control media player for the terminal",
    long_about = "Arrow keys move focus, Enter activates, Escape closes panels.\n\
                  Press Enter three times quickly to arm the pointer cursor.\n\n\
                  Run without arguments to launch the player.\n\
                  Use subcommands for automation and scripting.",
    after_help = "EXAMPLES:\n\
                  streamtv                            Launch the player\n\
                  streamtv resolve 603 --json         Resolve stream links\n\
                  streamtv convert subs.srt           Convert captions to WebVTT\n\
                  streamtv play 603 --start 12:00     Play from 12 minutes"
)]
pub struct Cli {
    /// Output format as JSON (default for non-TTY)
    #[arg(long, short = 'j', global = true)]
    pub json: bool,

    /// Suppress non-essential output
    #[arg(long, short = 'q', global = true)]
    pub quiet: bool,

    /// Path to config file
    #[arg(long, short = 'c', global = true)]
    pub config: Option<PathBuf>,

    /// Subcommand to run (omit for the interactive player)
    #[command(subcommand)]
    pub command: Option<Command>,
}

impl Cli {
    pub fn should_json(&self) -> bool {
        self.json || !std::io::stdout().is_terminal()
    }
}

// =============================================================================
// Subcommands
// =============================================================================

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Resolve playable links and captions for an item
    #[command(visible_alias = "r")]
    Resolve(ResolveCmd),

    /// Convert a SubRip caption file to WebVTT
    #[command(visible_alias = "cv")]
    Convert(ConvertCmd),

    /// Open the player on an item
    #[command(visible_alias = "p")]
    Play(PlayCmd),
}

/// Identifies what to resolve
#[derive(Args, Debug, Clone)]
pub struct ItemArgs {
    /// Catalog id of the movie or show
    #[arg(required = true)]
    pub id: String,

    /// Treat the id as a TV show
    #[arg(long)]
    pub tv: bool,

    /// Season number (TV only)
    #[arg(long, short = 's', requires = "tv")]
    pub season: Option<u16>,

    /// Episode number (TV only)
    #[arg(long, short = 'e', requires = "season")]
    pub episode: Option<u16>,

    /// Preferred provider
    #[arg(long, short = 'p')]
    pub provider: Option<String>,

    /// Server preference, highest first (repeatable)
    #[arg(long = "server")]
    pub servers: Vec<String>,
}

impl ItemArgs {
    pub fn media_type(&self) -> MediaType {
        if self.tv {
            MediaType::Tv
        } else {
            MediaType::Movie
        }
    }

    pub fn episode_ref(&self) -> Option<EpisodeRef> {
        match (self.season, self.episode) {
            (Some(season), Some(episode)) => Some(EpisodeRef { season, episode }),
            _ => None,
        }
    }

    /// Build a resolver request, falling back to configured preferences
    pub fn request(&self, provider: Option<String>, servers: &[String]) -> ResolveRequest {
        ResolveRequest {
            item_id: self.id.clone(),
            media_type: self.media_type(),
            episode: self.episode_ref(),
            provider: self.provider.clone().or(provider),
            server_preferences: if self.servers.is_empty() {
                servers.to_vec()
            } else {
                self.servers.clone()
            },
        }
    }
}

/// Resolve playable links
#[derive(Args, Debug)]
pub struct ResolveCmd {
    #[command(flatten)]
    pub item: ItemArgs,
}

/// Convert captions
#[derive(Args, Debug)]
pub struct ConvertCmd {
    /// SubRip file to convert (`-` reads stdin)
    #[arg(required = true)]
    pub input: PathBuf,

    /// Write the result here instead of stdout
    #[arg(long, short = 'o')]
    pub output: Option<PathBuf>,
}

/// Open the player
#[derive(Args, Debug)]
pub struct PlayCmd {
    #[command(flatten)]
    pub item: ItemArgs,

    /// Title shown in the overlay
    #[arg(long, short = 't')]
    pub title: Option<String>,

    /// Artwork URL used for the backdrop tint
    #[arg(long)]
    pub artwork: Option<String>,

    /// Start position: seconds, MM:SS or HH:MM:SS
    #[arg(long, default_value = "0")]
    pub start: String,
}

impl PlayCmd {
    pub fn start_seconds(&self) -> Option<f64> {
        parse_position(&self.start)
    }

    pub fn to_item(&self) -> Item {
        let title = self.title.clone().unwrap_or_else(|| self.item.id.clone());
        let mut item = Item::new(self.item.id.clone(), self.item.media_type(), title);
        item.artwork_url = self.artwork.clone();
        item
    }
}

/// Parse seconds, MM:SS or HH:MM:SS
pub fn parse_position(s: &str) -> Option<f64> {
    let s = s.trim();
    if let Ok(secs) = s.parse::<f64>() {
        return (secs >= 0.0).then_some(secs);
    }
    let parts: Vec<&str> = s.split(':').collect();
    let secs = match parts.len() {
        2 => {
            let mins: u64 = parts[0].parse().ok()?;
            let secs: u64 = parts[1].parse().ok()?;
            mins * 60 + secs
        }
        3 => {
            let hours: u64 = parts[0].parse().ok()?;
            let mins: u64 = parts[1].parse().ok()?;
            let secs: u64 = parts[2].parse().ok()?;
            hours * 3600 + mins * 60 + secs
        }
        _ => return None,
    };
    Some(secs as f64)
}

// =============================================================================
// JSON Output Types
// =============================================================================

/// Generic JSON output wrapper with status
#[derive(Debug, Serialize, Deserialize)]
pub struct JsonOutput<T: Serialize> {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(skip_serializing_if = "is_zero")]
    pub exit_code: i32,
}

fn is_zero(n: &i32) -> bool {
    *n == 0
}

impl<T: Serialize> JsonOutput<T> {
    pub fn success(data: T) -> Self {
        Self {
            data: Some(data),
            error: None,
            exit_code: 0,
        }
    }

    pub fn error_msg(msg: impl Into<String>, code: ExitCode) -> JsonOutput<()> {
        JsonOutput::<()> {
            data: None,
            error: Some(msg.into()),
            exit_code: code.into(),
        }
    }
}

// =============================================================================
// Output Helpers
// =============================================================================

/// Output handler for consistent formatting
pub struct Output {
    pub json: bool,
    pub quiet: bool,
}

impl Output {
    pub fn new(cli: &Cli) -> Self {
        Self {
            json: cli.should_json(),
            quiet: cli.quiet,
        }
    }

    /// Print success data
    pub fn print<T: Serialize>(&self, data: T) -> anyhow::Result<()> {
        if self.json {
            let output = JsonOutput::success(data);
            println!("{}", serde_json::to_string_pretty(&output)?);
        } else {
            println!("{}", serde_json::to_string_pretty(&data)?);
        }
        Ok(())
    }

    /// Print error and return exit code
    pub fn error(&self, msg: impl Into<String>, code: ExitCode) -> ExitCode {
        let msg = msg.into();
        if self.json {
            let output = JsonOutput::<()>::error_msg(&msg, code);
            if let Ok(json) = serde_json::to_string_pretty(&output) {
                eprintln!("{}", json);
            }
        } else if !self.quiet {
            eprintln!("Error: {}", msg);
        }
        code
    }

    /// Print info message (suppressed in quiet and JSON modes)
    pub fn info(&self, msg: impl std::fmt::Display) {
        if !self.quiet && !self.json {
            eprintln!("{}", msg);
        }
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn verify_cli() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_no_args_is_player_mode() {
        let cli = Cli::parse_from::<_, &str>(["streamtv"]);
        assert!(cli.command.is_none());
    }

    #[test]
    fn test_resolve_episode() {
        let cli = Cli::parse_from([
            "streamtv", "resolve", "1399", "--tv", "-s", "1", "-e", "3", "--server", "fast",
            "--server", "backup",
        ]);
        let Some(Command::Resolve(cmd)) = cli.command else {
            panic!("expected resolve");
        };
        let request = cmd.item.request(Some("alpha".into()), &["ignored".into()]);
        assert_eq!(request.media_type, MediaType::Tv);
        assert_eq!(request.episode, Some(EpisodeRef { season: 1, episode: 3 }));
        assert_eq!(request.provider.as_deref(), Some("alpha"));
        assert_eq!(request.server_preferences, vec!["fast", "backup"]);
    }

    #[test]
    fn test_season_requires_tv() {
        assert!(Cli::try_parse_from(["streamtv", "resolve", "603", "-s", "1"]).is_err());
    }

    #[test]
    fn test_config_servers_used_when_none_given() {
        let cli = Cli::parse_from(["streamtv", "resolve", "603"]);
        let Some(Command::Resolve(cmd)) = cli.command else {
            panic!("expected resolve");
        };
        let request = cmd.item.request(None, &["main".into()]);
        assert_eq!(request.server_preferences, vec!["main"]);
        assert_eq!(request.media_type, MediaType::Movie);
        assert!(request.episode.is_none());
    }

    #[test]
    fn test_play_start_position() {
        let cli = Cli::parse_from(["streamtv", "play", "603", "--start", "1:02:03", "-t", "Matrix"]);
        let Some(Command::Play(cmd)) = cli.command else {
            panic!("expected play");
        };
        assert_eq!(cmd.start_seconds(), Some(3723.0));
        assert_eq!(cmd.to_item().title, "Matrix");
    }

    #[test]
    fn test_parse_position() {
        assert_eq!(parse_position("90"), Some(90.0));
        assert_eq!(parse_position("12:30"), Some(750.0));
        assert_eq!(parse_position("-4"), None);
        assert_eq!(parse_position("abc"), None);
    }

    #[test]
    fn test_exit_codes() {
        assert_eq!(i32::from(ExitCode::Success), 0);
        assert_eq!(i32::from(ExitCode::NoStreams), 5);
        assert_eq!(i32::from(ExitCode::CaptionFailed), 6);
    }
}
