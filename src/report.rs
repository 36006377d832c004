use std::{
    collections::HashMap,
    io::Write,
    path::{Path, PathBuf},
};

use crate::{
    error::{Error, Result},
    stats::UrlStats,
    template::safe_substitute,
};

pub const TABLE_PLACEHOLDER: &str = "table_json";

pub struct ReportWriter {
    report_dir: PathBuf,
    template: PathBuf,
}

impl ReportWriter {
    pub fn new(report_dir: impl Into<PathBuf>, template: impl Into<PathBuf>) -> Self {
        Self {
            report_dir: report_dir.into(),
            template: template.into(),
        }
    }

    pub fn report_path(&self, report_name: &str) -> PathBuf {
        self.report_dir.join(report_name)
    }

    pub fn exists(&self, report_name: &str) -> bool {
        self.report_path(report_name).exists()
    }

    /// Render `stats` into the template and publish it as `report_name`.
    ///
    /// The content goes to a temporary file in the report directory first and
    /// is renamed into place, so the final name never holds a partial report.
    pub fn write(&self, report_name: &str, stats: &[UrlStats]) -> Result<PathBuf> {
        let template = std::fs::read_to_string(&self.template).map_err(|e| Error::Template {
            path: self.template.clone(),
            source: e,
        })?;
        let content = render(&template, stats)?;

        std::fs::create_dir_all(&self.report_dir).map_err(|e| Error::io(&self.report_dir, e))?;
        let target = self.report_path(report_name);
        publish(&self.report_dir, &target, content.as_bytes())?;
        Ok(target)
    }
}

/// Serialize the table as a JSON literal that is safe inside `<script>`
pub fn table_json(stats: &[UrlStats]) -> Result<String> {
    let json = serde_json::to_string(stats)?;
    Ok(json.replace("</", "<\\/"))
}

pub fn render(template: &str, stats: &[UrlStats]) -> Result<String> {
    let mapping = HashMap::from([(TABLE_PLACEHOLDER, table_json(stats)?)]);
    Ok(safe_substitute(template, &mapping).into_owned())
}

fn publish(dir: &Path, target: &Path, content: &[u8]) -> Result<()> {
    // Dropping the guard on an error path removes the temporary file
    let mut tmp = tempfile::Builder::new()
        .prefix(".report-")
        .suffix(".tmp")
        .tempfile_in(dir)
        .map_err(|e| Error::io(dir, e))?;
    tmp.write_all(content)
        .and_then(|_| tmp.as_file().sync_all())
        .map_err(|e| Error::io(tmp.path(), e))?;
    tmp.persist(target)
        .map_err(|e| Error::io(target, e.error))?;
    Ok(())
}
