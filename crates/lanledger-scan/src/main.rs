//! CLI entry point for the lanledger-scan device inventory.

use std::path::PathBuf;
use std::time::Duration;

use clap::{Parser, ValueEnum};
use tracing_subscriber::{fmt, EnvFilter};

use lanledger_scan::config::{load_scan_config, ScanConfig, ScanTarget};
use lanledger_scan::scanner::NmapScanner;
use lanledger_scan::scheduler::{import_report_file, run_single_pass, PassReport, PassScheduler};
use lanledger_store::DeviceStore;

#[derive(Parser)]
#[command(name = "lanledger-scan")]
#[command(about = "Track LAN devices by hardware address from nmap ping sweeps")]
struct Cli {
    /// Target to sweep (CIDR notation, e.g., 192.168.1.0/24).
    #[arg(short, long)]
    target: Option<String>,

    /// Inventory database path (overrides scan.db_path).
    #[arg(long)]
    db: Option<String>,

    /// Run a single pass and exit.
    #[arg(long)]
    once: bool,

    /// Run as daemon, one pass per scan.interval_secs.
    #[arg(long)]
    daemon: bool,

    /// Reconcile a saved nmap report instead of scanning.
    #[arg(long, value_name = "PATH")]
    from_file: Option<PathBuf>,

    /// Print the inventory as JSON and exit.
    #[arg(long)]
    list: bool,

    /// Config file prefix (default: lanledger).
    #[arg(short, long, default_value = "lanledger")]
    config: String,

    /// Log output format.
    #[arg(long, value_enum, default_value_t = LogFormat::Json)]
    log_format: LogFormat,
}

#[derive(Clone, Copy, ValueEnum)]
enum LogFormat {
    Json,
    Text,
}

/// What this invocation does.
#[derive(Debug, PartialEq, Eq)]
enum Mode {
    List,
    Import(PathBuf),
    Once,
    Daemon,
}

impl Cli {
    fn mode(&self) -> anyhow::Result<Mode> {
        if self.list {
            Ok(Mode::List)
        } else if let Some(path) = &self.from_file {
            Ok(Mode::Import(path.clone()))
        } else if self.once {
            Ok(Mode::Once)
        } else if self.daemon {
            Ok(Mode::Daemon)
        } else {
            anyhow::bail!("Specify --once, --daemon, --from-file <PATH> or --list")
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let mode = cli.mode()?;

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    match cli.log_format {
        LogFormat::Json => fmt().with_env_filter(filter).json().init(),
        LogFormat::Text => fmt().with_env_filter(filter).init(),
    }

    let config = resolve_config(&cli)?;

    match mode {
        Mode::List => {
            let store = DeviceStore::open_read_only(&config.db_path)?;
            let devices = store.list()?;
            println!("{}", serde_json::to_string_pretty(&devices)?);
        }
        Mode::Import(path) => {
            let pass = import_report_file(&path, &config).await?;
            log_pass(&pass);
        }
        Mode::Once => {
            let (scanner, target) = prepare_scanner(&config).await?;
            let pass = run_single_pass(&scanner, &config, &target).await?;
            log_pass(&pass);
        }
        Mode::Daemon => {
            let (scanner, target) = prepare_scanner(&config).await?;
            let sched = PassScheduler::new(config, scanner, target);
            sched.run().await?;
        }
    }

    Ok(())
}

async fn prepare_scanner(config: &ScanConfig) -> anyhow::Result<(NmapScanner, ScanTarget)> {
    let target: ScanTarget = config.target.parse()?;
    let scanner = NmapScanner::new(&config.nmap_path, Duration::from_secs(config.timeout_secs));

    // Verify nmap installation.
    let version = scanner.verify_installation().await?;
    tracing::info!(
        nmap_version = %version.lines().next().unwrap_or("").trim(),
        "Nmap verified"
    );
    Ok((scanner, target))
}

fn resolve_config(cli: &Cli) -> anyhow::Result<ScanConfig> {
    let mut config = load_scan_config(&cli.config)?;

    if let Some(target) = &cli.target {
        config.target = target.clone();
    }
    if let Some(db) = &cli.db {
        config.db_path = db.clone();
    }
    config.validate()?;

    tracing::debug!(
        target = %config.target,
        db_path = %config.db_path,
        nmap_path = %config.nmap_path,
        "Configuration resolved"
    );
    Ok(config)
}

fn log_pass(pass: &PassReport) {
    tracing::info!(
        pass_id = %pass.pass_id,
        target = %pass.target,
        devices = pass.stats.devices_seen(),
        created = pass.stats.created,
        updated = pass.stats.updated,
        duration_ms = pass.duration.as_millis() as u64,
        "Database updated"
    );
}
