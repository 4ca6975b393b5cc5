use clap::{Parser, ValueEnum};
use rsnap::backup::backup_config::{BackupConfig, Settings, TransferSettings};
use rsnap::backup::orchestrator::BackupOrchestrator;
use rsnap::backup::result_error::error::Error;
use rsnap::backup::result_error::result::Result;
use rsnap::backup::result_error::AddMsg;
use rsnap::backup::snapshot::Snapshot;
use rsnap::backup::snapshot_name::Clock;
use std::path::PathBuf;
use std::process::exit;
use tracing::{error, info};
use validator::Validate;

/// Incremental rsync snapshots, hard-linked against the previous complete one
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    /// Path (or remote spec) handed to the transfer program unmodified
    source: String,

    /// Snapshot root, must be an existing directory
    root: PathBuf,

    /// Optional YAML settings file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Clock used to name the new snapshot [default: utc]
    #[arg(long, value_enum)]
    clock: Option<ClockArg>,

    /// Transfer program to run [default: rsync]
    #[arg(long)]
    transfer_program: Option<PathBuf>,

    /// Options forwarded verbatim to the transfer program, given after `--`
    /// as in `rsnap SOURCE ROOT -- -aH --delete` [default: -a -v]
    #[arg(last = true)]
    transfer_options: Vec<String>,
}

#[derive(ValueEnum, Clone, Copy, Debug)]
enum ClockArg {
    Utc,
    Local,
}

impl From<ClockArg> for Clock {
    fn from(value: ClockArg) -> Self {
        match value {
            ClockArg::Utc => Clock::Utc,
            ClockArg::Local => Clock::Local,
        }
    }
}

fn run(args: Args) -> Result<Snapshot> {
    let file_settings = args
        .config
        .as_ref()
        .map(Settings::load)
        .transpose()?
        .unwrap_or_default();

    let transfer_options = (!args.transfer_options.is_empty()).then_some(args.transfer_options);
    let cli_transfer = TransferSettings::builder()
        .maybe_program(args.transfer_program)
        .maybe_options(transfer_options)
        .build();
    let cli_settings = Settings::builder()
        .transfer(cli_transfer)
        .maybe_clock(args.clock.map(Clock::from))
        .build();

    let root = std::path::absolute(&args.root)
        .map_err(Error::from)
        .add_msg(format!("Resolving root {:?} failed", args.root))?;

    let config = BackupConfig::from_settings(args.source, root, cli_settings.or(file_settings));
    config
        .validate()
        .map_err(Error::from)
        .add_msg("Config validation failed")?;

    BackupOrchestrator::from_config(config).backup()
}

fn main() {
    tracing_subscriber::fmt::init();
    let args = Args::parse();

    match run(args) {
        Ok(snapshot) => info!("Backup complete: {:?}", snapshot.path()),
        Err(e) => {
            error!(kind = %e.kind(), "{e}");
            exit(1);
        }
    }
}
