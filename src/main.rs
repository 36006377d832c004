use anyhow::Context;
use clap::Parser;
use log_analyzer::{assets, Config, Error, Outcome};
use shadow_rs::shadow;
use std::{
    fs::OpenOptions,
    path::{Path, PathBuf},
    process::ExitCode,
    sync::{
        atomic::{AtomicBool, Ordering},
        Arc, Mutex,
    },
};
use tracing_subscriber::EnvFilter;

shadow!(build);

const EXIT_INTERRUPTED: u8 = 130;

#[derive(Parser, Debug)]
#[command(version = build::CLAP_LONG_VERSION, about)]
struct Cli {
    /// TOML file overriding REPORT_SIZE, REPORT_DIR, LOG_DIR, THRESHOLD_ERROR_PARS_PERCENT,
    /// REPORT_TEMPLATE and LOG_FILE
    #[clap(long, env = "LOG_ANALYZER_CONFIG")]
    config: Option<PathBuf>,
}

fn env_filter() -> EnvFilter {
    EnvFilter::new(format!(
        "info,{}",
        std::env::var("RUST_LOG").unwrap_or_default()
    ))
}

fn init_logging(log_file: Option<&Path>) -> anyhow::Result<()> {
    let enable_color = std::env::var("NO_COLOR").is_err();
    let builder = tracing_subscriber::fmt().with_env_filter(env_filter());
    match log_file {
        Some(path) => {
            let file = OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)
                .with_context(|| format!("cannot open log file {}", path.display()))?;
            builder.with_ansi(false).with_writer(Mutex::new(file)).init();
        }
        None => builder
            .with_ansi(enable_color)
            .with_writer(std::io::stderr)
            .init(),
    }
    Ok(())
}

fn load_config(args: &Cli) -> log_analyzer::Result<Config> {
    match &args.config {
        Some(path) => Config::load(path),
        None => Ok(Config::default()),
    }
}

fn main() -> ExitCode {
    let args = Cli::parse();

    let config = match load_config(&args) {
        Ok(config) => config,
        Err(e) => {
            let _ = init_logging(None);
            tracing::error!("{}", e);
            return ExitCode::FAILURE;
        }
    };
    if let Err(e) = init_logging(config.log_file.as_deref()) {
        eprintln!("{:#}", e);
        return ExitCode::FAILURE;
    }
    tracing::debug!("{:?}", args);
    tracing::debug!("{:?}", config);

    let interrupted = Arc::new(AtomicBool::new(false));
    {
        let interrupted = interrupted.clone();
        if let Err(e) = ctrlc::set_handler(move || interrupted.store(true, Ordering::Relaxed)) {
            tracing::warn!("Cannot install interrupt handler: {}", e);
        }
    }

    let asset_dir = assets::asset_dir();
    match log_analyzer::run(&config, asset_dir.as_deref(), &interrupted) {
        Ok(Outcome::NoLogs) => {
            tracing::info!("Nothing to process");
            ExitCode::SUCCESS
        }
        Ok(Outcome::AlreadyProcessed(_)) | Ok(Outcome::Generated { .. }) => ExitCode::SUCCESS,
        Err(Error::Interrupted) => {
            tracing::warn!("Interrupted, no report published");
            ExitCode::from(EXIT_INTERRUPTED)
        }
        Err(e) => {
            tracing::error!("{}", e);
            ExitCode::FAILURE
        }
    }
}
