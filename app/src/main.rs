//! lyric-edit
//!
//! Command-line shell over the lyric timing engine: replays edit scripts
//! on a line, reports playback progress and checks timing invariants.

mod script;

use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand};
use log::info;
use lyric_timing::config::{get_config_path, load_config, save_config};
use lyric_timing::playback::{LineProgress, ManualClock, ManualScheduler};
use lyric_timing::{EditorConfig, EditorSession, LyricLine, load_line};
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Parser)]
#[command(name = "lyric-edit")]
#[command(about = "Edit word timings of time-coded lyric lines")]
#[command(version)]
struct Cli {
    /// Log at debug level unless RUST_LOG says otherwise
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Replay an edit script on a line and print the result
    Apply {
        /// Line JSON file
        line: PathBuf,

        /// Script JSON file (array of commands)
        #[arg(short, long)]
        script: PathBuf,

        /// Write the edited line here instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Timeline widget width in pixels, used by drag and click commands
        #[arg(long, default_value = "816")]
        width: f64,
    },

    /// Show the active token and its highlight progress at a time
    Progress {
        /// Line JSON file
        line: PathBuf,

        /// Playback time in seconds
        #[arg(long)]
        at: f64,
    },

    /// List timing invariant violations
    Check {
        /// Line JSON file
        line: PathBuf,
    },

    /// Print the effective configuration
    Config {
        /// Write the defaults to the config file
        #[arg(long)]
        init: bool,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match cli.command {
        Commands::Apply {
            line,
            script,
            output,
            width,
        } => apply(&line, &script, output.as_deref(), width),
        Commands::Progress { line, at } => progress(&line, at),
        Commands::Check { line } => check(&line),
        Commands::Config { init } => config(init),
    }
}

fn init_logging(verbose: bool) {
    let default_level = if verbose { "debug" } else { "warn" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_level))
        .init();
}

fn read_line(path: &Path) -> Result<LyricLine> {
    let json = fs::read_to_string(path)
        .with_context(|| format!("Failed to read line {}", path.display()))?;
    load_line(&json).with_context(|| format!("Invalid line {}", path.display()))
}

fn apply(line_path: &Path, script_path: &Path, output: Option<&Path>, width: f64) -> Result<()> {
    let line = read_line(line_path)?;
    let commands = script::load_script(script_path)?;
    let mut session = EditorSession::new(line, load_config(), width);

    let changed = script::run_script(&mut session, &commands);
    info!("{} of {} commands changed the line", changed, commands.len());

    let saved = session.save();
    let json = saved.save().context("Failed to serialize line")?;
    match output {
        Some(path) => {
            fs::write(path, json)
                .with_context(|| format!("Failed to write {}", path.display()))?;
            println!("Wrote {}", path.display());
        }
        None => println!("{}", json),
    }
    Ok(())
}

fn progress(line_path: &Path, at: f64) -> Result<()> {
    let line = read_line(line_path)?;
    let config = load_config();
    let clock = ManualClock::at(at);
    let mut scheduler = ManualScheduler::new();
    let mut tracker = LineProgress::new(&config);

    match tracker.update(&line, &clock, 0.0, &mut scheduler) {
        Some((index, frame)) => {
            let token = &line.tokens[index];
            println!(
                "token {} '{}' [{:.3}, {:.3}): {:.1}%",
                index,
                token.surface,
                token.start_time,
                token.end_time,
                frame.width_percent()
            );
        }
        None => println!("no active token at {:.3}s", at),
    }
    tracker.unmount(&mut scheduler);
    Ok(())
}

fn check(line_path: &Path) -> Result<()> {
    let line = read_line(line_path)?;
    let config = load_config();
    let violations = line.check_invariants(config.min_duration);
    if violations.is_empty() {
        println!("ok: {} tokens", line.tokens.len());
        return Ok(());
    }
    for violation in &violations {
        println!("{}", violation);
    }
    bail!("{} violation(s) in {}", violations.len(), line_path.display())
}

fn config(init: bool) -> Result<()> {
    let config = if init {
        let config = EditorConfig::default();
        let path = save_config(&config).context("Failed to write config")?;
        println!("# written to {}", path.display());
        config
    } else {
        if let Some(path) = get_config_path() {
            println!("# {}", path.display());
        }
        load_config()
    };
    print!("{}", config.to_toml_string()?);
    Ok(())
}
