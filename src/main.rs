//! battlelog - replay a captured server message stream
//!
//! Reads one JSON message per line and prints the reconstructed battle log.

use anyhow::{Context, Result};
use battlelog::{
    game::{BattleLog, OutputFormat, OutputMode, Reconstructor},
    settings::Settings,
    BattleLogError, MatchFeed,
};
use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;
use tokio::io::{AsyncBufReadExt, AsyncRead, BufReader};
use tracing_subscriber::EnvFilter;

/// Output format for log lines
#[derive(Debug, Clone, Copy, ValueEnum)]
enum FormatArg {
    /// Human-readable text
    Text,
    /// One JSON object per entry
    Json,
}

impl From<FormatArg> for OutputFormat {
    fn from(arg: FormatArg) -> Self {
        match arg {
            FormatArg::Text => OutputFormat::Text,
            FormatArg::Json => OutputFormat::Json,
        }
    }
}

/// Diagnostic verbosity (custom parser supporting both names and numbers)
#[derive(Debug, Clone, Copy)]
struct VerbosityArg(&'static str);

impl std::str::FromStr for VerbosityArg {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "silent" | "0" => Ok(VerbosityArg("off")),
            "minimal" | "1" => Ok(VerbosityArg("warn")),
            "normal" | "2" => Ok(VerbosityArg("info")),
            "verbose" | "3" => Ok(VerbosityArg("debug")),
            "raw" | "4" => Ok(VerbosityArg("trace")),
            _ => Err(format!(
                "invalid verbosity level '{s}' (expected: silent/0, minimal/1, normal/2, verbose/3, raw/4)"
            )),
        }
    }
}

#[derive(Parser)]
#[command(name = "battlelog")]
#[command(about = "Battle log reconstruction from game server messages", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Replay a message capture (one JSON object per line)
    Replay {
        /// Capture file, or "-" for stdin
        #[arg(value_name = "FILE", default_value = "-")]
        input: PathBuf,

        /// Output format for log lines
        #[arg(long, value_enum, default_value = "text")]
        format: FormatArg,

        /// Diagnostic verbosity (0=silent, 1=minimal, 2=normal, 3=verbose, 4=raw)
        #[arg(long, default_value = "minimal", short = 'v')]
        verbosity: VerbosityArg,

        /// Settings file (JSON array of flags or object of flag: bool)
        #[arg(long, value_name = "SETTINGS_FILE")]
        settings: Option<PathBuf>,

        /// Enable a settings flag (repeatable)
        #[arg(long = "set", value_name = "FLAG")]
        flags: Vec<String>,

        /// Print only the last N log lines once the stream ends
        #[arg(long, value_name = "N")]
        log_tail: Option<usize>,

        /// Print the match banner before the log
        #[arg(long)]
        banner: bool,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Replay {
            input,
            format,
            verbosity,
            settings,
            flags,
            log_tail,
            banner,
        } => {
            init_tracing(verbosity);
            let mut settings = match settings {
                Some(path) => Settings::load(&path)
                    .with_context(|| format!("loading settings from {}", path.display()))?,
                None => Settings::new(),
            };
            for flag in flags {
                settings.set(flag);
            }
            run_replay(input, format.into(), settings, log_tail, banner).await?
        }
    }

    Ok(())
}

fn init_tracing(verbosity: VerbosityArg) {
    // RUST_LOG wins over --verbosity
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(verbosity.0));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

async fn run_replay(
    input: PathBuf,
    format: OutputFormat,
    settings: Settings,
    log_tail: Option<usize>,
    banner: bool,
) -> Result<()> {
    // Lines are buffered when they have to be printed after the fact
    let mode = if log_tail.is_some() || banner {
        OutputMode::Memory
    } else {
        OutputMode::Stdout
    };
    let reconstructor = Reconstructor::new(BattleLog::with_output(mode, format));
    let mut feed = MatchFeed::with_reconstructor(settings, reconstructor);

    if input.as_os_str() == "-" {
        replay_lines(&mut feed, tokio::io::stdin()).await?;
    } else {
        let file = tokio::fs::File::open(&input)
            .await
            .with_context(|| format!("opening capture {}", input.display()))?;
        replay_lines(&mut feed, file).await?;
    }

    if banner {
        if let Some(banner) = feed.reconstructor().banner() {
            let game_type = banner.game_type.as_deref().unwrap_or("MATCH");
            println!("=== {game_type} ===");
            println!("  {}: {}", banner.you.name, banner.you.summary());
            println!("  {}: {}", banner.enemy.name, banner.enemy.summary());
            println!();
        }
    }

    let mut log = feed.reconstructor().log_mut();
    match log_tail {
        Some(n) => log.flush_tail(n)?,
        None => log.flush_buffer()?,
    }
    Ok(())
}

async fn replay_lines<R>(feed: &mut MatchFeed, reader: R) -> Result<()>
where
    R: AsyncRead + Unpin,
{
    let mut lines = BufReader::new(reader).lines();
    let mut line_no = 0usize;
    while let Some(line) = lines.next_line().await? {
        line_no += 1;
        if line.trim().is_empty() {
            continue;
        }
        match feed.deliver_raw(&line) {
            Ok(delivery) if delivery.verdict.is_canceled() => {
                for notice in feed.take_notices() {
                    tracing::info!(title = %notice.title, text = %notice.text, "notice");
                }
            }
            Ok(_) => {}
            // A bad message is reported and skipped; the stream goes on
            Err(err @ BattleLogError::IoError(_)) => return Err(err.into()),
            Err(err) => tracing::error!(line = line_no, "{err}"),
        }
    }
    Ok(())
}
