use std::{
    path::{Path, PathBuf},
    sync::atomic::{AtomicBool, Ordering},
    time::Instant,
};

use crate::{
    aggregate::{aggregate_lines, Aggregation},
    assets::copy_static_assets,
    config::Config,
    error::{Error, Result},
    logfile::{find_latest_log, LogFile},
    parser::UiShortParser,
    report::ReportWriter,
    stats::{self, UrlStats},
};

#[derive(Debug, PartialEq)]
pub enum Outcome {
    /// The log directory holds no matching log
    NoLogs,
    /// A report for the latest log is already there
    AlreadyProcessed(PathBuf),
    Generated { path: PathBuf, rows: usize },
}

/// Find the log to process
pub fn stage1(config: &Config) -> Result<Option<LogFile>> {
    let log = find_latest_log(&config.log_dir)?;
    match &log {
        Some(log) => {
            let size = std::fs::metadata(&log.path).map(|m| m.len()).unwrap_or(0);
            tracing::info!(
                "Selected log {} (date {}, {})",
                log.path.display(),
                log.date,
                humansize::format_size(size, humansize::BINARY)
            );
        }
        None => tracing::info!("No log found in {}", config.log_dir.display()),
    }
    Ok(log)
}

/// Analyse the nginx log and group request times by URL
pub fn stage2(config: &Config, log: &LogFile, interrupted: &AtomicBool) -> Result<Aggregation> {
    let reader = log.open()?;
    let parser = UiShortParser::default();
    let aggregation = aggregate_lines(reader, &log.path, &parser, interrupted)?;

    let tally = aggregation.tally;
    tracing::info!(
        "Parsed {} of {} lines, {} distinct URLs",
        tally.parsed,
        tally.total,
        aggregation.buckets.len()
    );
    if tally.exceeds(config.threshold_error_pars_percent) {
        tracing::warn!(
            "{:.2}% of lines could not be parsed (threshold {}%), log format may have changed",
            tally.failure_ratio() * 100.0,
            config.threshold_error_pars_percent
        );
    }
    Ok(aggregation)
}

/// Get ranked per-URL statistics
pub fn stage3(config: &Config, aggregation: &Aggregation) -> Vec<UrlStats> {
    stats::compute(&aggregation.buckets, config.report_size)
}

/// Render and publish the report
pub fn stage4(
    writer: &ReportWriter,
    log: &LogFile,
    stats: &[UrlStats],
    interrupted: &AtomicBool,
) -> Result<PathBuf> {
    if interrupted.load(Ordering::Relaxed) {
        return Err(Error::Interrupted);
    }
    writer.write(&log.report_name(), stats)
}

/// Run the whole pipeline once.
///
/// `asset_dir` is where companion static files are copied from after a report
/// is generated.
pub fn run(config: &Config, asset_dir: Option<&Path>, interrupted: &AtomicBool) -> Result<Outcome> {
    let start = Instant::now();

    let Some(log) = stage1(config)? else {
        return Ok(Outcome::NoLogs);
    };

    let writer = ReportWriter::new(&config.report_dir, &config.report_template);
    let report_name = log.report_name();
    if writer.exists(&report_name) {
        let path = writer.report_path(&report_name);
        tracing::info!("Report {} already exists, nothing to do", path.display());
        return Ok(Outcome::AlreadyProcessed(path));
    }

    let aggregation = stage2(config, &log, interrupted)?;
    let stats = stage3(config, &aggregation);
    let path = stage4(&writer, &log, &stats, interrupted)?;

    tracing::info!(
        "Report {} written with {} rows in {}",
        path.display(),
        stats.len(),
        humantime::format_duration(start.elapsed())
    );

    if let Some(asset_dir) = asset_dir {
        copy_static_assets(asset_dir, &config.report_dir);
    }

    Ok(Outcome::Generated {
        path,
        rows: stats.len(),
    })
}
