use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use anyhow::Context;
use clap::Parser;
use crabbooth::health::{format_report, HealthSampler};
use crabbooth::BoothConfig;

/// Periodic system health report: CPU temperature and usage, memory, disk.
#[derive(Debug, Parser)]
#[command(name = "health-monitor", version)]
struct Args {
    /// Configuration file (TOML); only the [health] section is used
    #[arg(short, long, default_value_os_t = BoothConfig::default_path())]
    config: PathBuf,

    /// Seconds between reports
    #[arg(short, long)]
    interval: Option<u64>,
}

fn main() -> anyhow::Result<()> {
    crabbooth::init_logging("crabbooth=info");
    let args = Args::parse();

    let mut config = BoothConfig::load_from_file(&args.config)
        .with_context(|| format!("loading {}", args.config.display()))?;
    if let Some(secs) = args.interval {
        config.health.interval_secs = secs;
    }
    config.validate().map_err(anyhow::Error::msg)?;
    let health = config.health;

    let running = Arc::new(AtomicBool::new(true));
    {
        let running = running.clone();
        ctrlc::set_handler(move || running.store(false, Ordering::SeqCst))
            .context("installing interrupt handler")?;
    }

    println!("Starting Pi Health Monitor");
    println!("Press Ctrl + C to stop");

    let interval = Duration::from_secs(health.interval_secs);
    let mut sampler = HealthSampler::new(&health);
    while running.load(Ordering::SeqCst) {
        let snapshot = sampler.sample();
        let now = chrono::Local::now().time();
        println!("\n{}", format_report(&snapshot, now, &health));

        // Sleep in short slices so Ctrl-C is noticed promptly
        let started = Instant::now();
        while running.load(Ordering::SeqCst) && started.elapsed() < interval {
            std::thread::sleep(Duration::from_millis(100));
        }
    }

    println!("Health monitor stopped");
    Ok(())
}
