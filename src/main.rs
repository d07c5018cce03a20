use std::env;
use std::process;

use chrono::Utc;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use devlog::{Commands, DevlogError, Paths, RealFs};

#[derive(Parser, Debug)]
#[command(name = "devlog", author, version, about = "Log what you set out to do and what you got done, per project")]
struct Args {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Start a session with what you intend to work on
    Start {
        #[arg(help = "Intention message", trailing_var_arg = true, allow_hyphen_values = true)]
        message: Vec<String>,
    },
    /// Stop the active session with what you accomplished
    Stop {
        #[arg(help = "Outcome message", trailing_var_arg = true, allow_hyphen_values = true)]
        message: Vec<String>,
    },
    /// Show the active session for this directory
    Status,
    /// Create default global and project settings
    Init,
    /// Read a setting, or write it to the project settings
    Config {
        #[arg(help = "Setting key")]
        key: String,
        #[arg(help = "New value (true/false/null/number/JSON/string)", allow_hyphen_values = true)]
        value: Option<String>,
    },
}

fn main() {
    init_logging();
    let args = Args::parse();

    if let Err(e) = run(args) {
        report(&e);
        process::exit(1);
    }
}

fn init_logging() {
    let debug_enabled = env::var("DEVLOG_DEBUG")
        .map(|value| matches!(value.as_str(), "1" | "true" | "TRUE" | "yes" | "YES"))
        .unwrap_or(false);
    let filter = if debug_enabled {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn run(args: Args) -> Result<(), DevlogError> {
    let paths = Paths::resolve()?;
    let fs = RealFs;
    let commands = Commands::new(&fs, &paths);
    let now = Utc::now();

    let output = match args.command {
        Command::Start { message } => commands.start(&message.join(" "), now)?,
        Command::Stop { message } => commands.stop(&message.join(" "), now)?,
        Command::Status => commands.status(now)?,
        Command::Init => commands.init()?,
        Command::Config { key, value } => commands.config(&key, value.as_deref())?,
    };

    println!("{}", output);
    Ok(())
}

fn report(err: &DevlogError) {
    tracing::debug!(error = ?err, fatal = err.is_fatal(), "command failed");
    match err {
        DevlogError::SettingsUnreadable { .. } => eprintln!("{}", err),
        _ => eprintln!("Error: {}", err),
    }
}
