use std::{
    fs::File,
    io::{BufReader, Read},
    path::{Path, PathBuf},
};

use chrono::NaiveDate;
use flate2::read::MultiGzDecoder;
use once_cell::sync::Lazy;
use regex::Regex;

use crate::error::{Error, Result};

static LOG_NAME_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^nginx-access-ui\.log-(?P<date>\d{8})(?P<ext>\.gz|\.log)?$")
        .expect("log name pattern is valid")
});

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFileType {
    Plain,
    Gzip,
}

/// The log chosen for this run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogFile {
    pub path: PathBuf,
    pub date: NaiveDate,
    pub file_type: LogFileType,
}

impl LogFile {
    /// Open the log for line reading, decompressing gzip transparently
    pub fn open(&self) -> Result<BufReader<Box<dyn Read>>> {
        let file = File::open(&self.path).map_err(|e| Error::io(&self.path, e))?;
        let reader: Box<dyn Read> = match self.file_type {
            LogFileType::Plain => Box::new(file),
            LogFileType::Gzip => Box::new(MultiGzDecoder::new(file)),
        };
        Ok(BufReader::new(reader))
    }

    /// `report-YYYY.MM.DD.html`, named after the log date
    pub fn report_name(&self) -> String {
        format!("report-{}.html", self.date.format("%Y.%m.%d"))
    }
}

fn deduce_log_file_type(ext: Option<&str>) -> LogFileType {
    match ext {
        Some(".gz") => LogFileType::Gzip,
        _ => LogFileType::Plain,
    }
}

/// Match a file name against the `nginx-access-ui.log-YYYYMMDD[.gz|.log]` convention.
///
/// Returns `None` for foreign names and for stamps that are not calendar dates.
fn parse_log_name(filename: &str) -> Option<(NaiveDate, LogFileType)> {
    let caps = LOG_NAME_RE.captures(filename)?;
    let stamp = &caps["date"];
    match NaiveDate::parse_from_str(stamp, "%Y%m%d") {
        Ok(date) => {
            let ext = caps.name("ext").map(|m| m.as_str());
            Some((date, deduce_log_file_type(ext)))
        }
        Err(e) => {
            tracing::warn!("Skipping {}: invalid date stamp {} ({})", filename, stamp, e);
            None
        }
    }
}

/// Find the log with the latest date embedded in its file name.
///
/// Modification times are ignored. When two files carry the same date the
/// lexicographically smallest name wins. `Ok(None)` means the directory holds
/// no matching log.
pub fn find_latest_log(log_dir: &Path) -> Result<Option<LogFile>> {
    if !log_dir.is_dir() {
        return Err(Error::LogDirMissing(log_dir.to_path_buf()));
    }

    let mut latest: Option<(LogFile, String)> = None;
    for entry in walkdir::WalkDir::new(log_dir)
        .min_depth(1)
        .max_depth(1)
        .follow_links(true)
    {
        let entry = entry.map_err(|e| {
            let path = e.path().unwrap_or(log_dir).to_path_buf();
            Error::io(path, e.into())
        })?;
        if !entry.file_type().is_file() {
            continue;
        }
        let Some(filename) = entry.file_name().to_str() else {
            continue;
        };
        let Some((date, file_type)) = parse_log_name(filename) else {
            continue;
        };
        let newer = match &latest {
            None => true,
            Some((current, current_name)) => {
                date > current.date || (date == current.date && filename < current_name.as_str())
            }
        };
        if newer {
            latest = Some((
                LogFile {
                    path: entry.path().to_path_buf(),
                    date,
                    file_type,
                },
                filename.to_string(),
            ));
        }
    }

    Ok(latest.map(|(log, _)| log))
}
