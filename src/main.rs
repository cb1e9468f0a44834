use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use crabbooth::session::{banner, CaptureSession, SessionSettings};
use crabbooth::{BoothConfig, BoothError, NokhwaCamera, TerminalPreview};

/// Camera photo booth with a live terminal preview.
#[derive(Debug, Parser)]
#[command(name = "crabbooth", version)]
struct Args {
    /// Configuration file (TOML)
    #[arg(short, long, default_value_os_t = BoothConfig::default_path())]
    config: PathBuf,

    /// Directory photos are written to
    #[arg(short, long)]
    output_dir: Option<PathBuf>,

    /// Camera index
    #[arg(long)]
    camera: Option<u32>,

    /// Print the effective configuration and exit
    #[arg(long)]
    print_config: bool,
}

fn main() -> ExitCode {
    crabbooth::init_logging("crabbooth=warn");

    let (code, message) = exit_status(&run(Args::parse()));
    if let Some(message) = message {
        eprintln!("{}", message);
    }
    ExitCode::from(code)
}

/// Process exit code and stderr message for the outcome of [`run`].
fn exit_status(result: &anyhow::Result<()>) -> (u8, Option<String>) {
    match result {
        Ok(()) => (0, None),
        Err(e) => {
            let message = match e.downcast_ref::<BoothError>() {
                Some(BoothError::DeviceUnavailable(cause)) => {
                    format!("Could not open camera: {}", cause)
                }
                _ => format!("Error: {:#}", e),
            };
            (1, Some(message))
        }
    }
}

fn run(args: Args) -> anyhow::Result<()> {
    let mut config = BoothConfig::load_from_file(&args.config)
        .with_context(|| format!("loading {}", args.config.display()))?;
    if let Some(dir) = args.output_dir {
        config.storage.output_directory = dir.to_string_lossy().into_owned();
    }
    if let Some(index) = args.camera {
        config.camera.index = index;
    }
    config.validate().map_err(anyhow::Error::msg)?;

    if args.print_config {
        print!("{}", config.to_toml()?);
        return Ok(());
    }

    let interrupt = Arc::new(AtomicBool::new(false));
    {
        let interrupt = interrupt.clone();
        ctrlc::set_handler(move || interrupt.store(true, Ordering::SeqCst))
            .context("installing interrupt handler")?;
    }

    let format = config.camera.capture_format();
    let session = CaptureSession::open(
        || NokhwaCamera::open(config.camera.index, &format),
        SessionSettings::from_config(&config),
    )?;
    if session.directory_created() {
        println!("Created {} directory", session.output_directory().display());
    }

    println!();
    for line in banner() {
        line.emit();
    }

    // Dropping the session on this error path releases the camera
    let mut preview = TerminalPreview::open()?;
    let summary = session.run(&mut preview, &interrupt);
    drop(preview);

    println!();
    summary.print();
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clean_run_exits_zero() {
        assert_eq!(exit_status(&Ok(())), (0, None));
    }

    #[test]
    fn test_missing_camera_exits_non_zero() {
        let result: anyhow::Result<()> =
            Err(BoothError::DeviceUnavailable("no camera at index 0".to_string()).into());
        assert_eq!(
            exit_status(&result),
            (1, Some("Could not open camera: no camera at index 0".to_string()))
        );
    }

    #[test]
    fn test_other_errors_exit_non_zero() {
        let result: anyhow::Result<()> = Err(anyhow::anyhow!("bad config"));
        let (code, message) = exit_status(&result);
        assert_eq!(code, 1);
        assert_eq!(message.as_deref(), Some("Error: bad config"));
    }
}
