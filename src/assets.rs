use std::path::{Path, PathBuf};

/// Client-side files the report page loads from its own directory
pub const STATIC_ASSETS: &[&str] = &["jquery.tablesorter.min.js"];

/// Directory of the running executable, where companion assets are shipped
pub fn asset_dir() -> Option<PathBuf> {
    std::env::current_exe()
        .ok()
        .and_then(|exe| exe.parent().map(Path::to_path_buf))
}

/// Copy each asset from `source_dir` into `report_dir` unless it is already there.
///
/// Failures are logged and never fail the run. Returns the number of copied files.
pub fn copy_static_assets(source_dir: &Path, report_dir: &Path) -> usize {
    let mut copied = 0;
    for name in STATIC_ASSETS {
        let source = source_dir.join(name);
        let target = report_dir.join(name);
        if target.exists() {
            continue;
        }
        if !source.is_file() {
            tracing::debug!("Static asset {} not found, skipped", source.display());
            continue;
        }
        match std::fs::copy(&source, &target) {
            Ok(_) => {
                tracing::info!("Copied {} to {}", name, report_dir.display());
                copied += 1;
            }
            Err(e) => tracing::warn!("Failed to copy {}: {}", source.display(), e),
        }
    }
    copied
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_log::test;

    #[test]
    fn test_copy_once() {
        let src = tempfile::tempdir().unwrap();
        let dst = tempfile::tempdir().unwrap();
        std::fs::write(src.path().join("jquery.tablesorter.min.js"), b"/* v1 */").unwrap();

        assert_eq!(copy_static_assets(src.path(), dst.path()), 1);
        std::fs::write(src.path().join("jquery.tablesorter.min.js"), b"/* v2 */").unwrap();
        assert_eq!(copy_static_assets(src.path(), dst.path()), 0);
        assert_eq!(
            std::fs::read(dst.path().join("jquery.tablesorter.min.js")).unwrap(),
            b"/* v1 */"
        );
    }

    #[test]
    fn test_missing_source() {
        let src = tempfile::tempdir().unwrap();
        let dst = tempfile::tempdir().unwrap();
        assert_eq!(copy_static_assets(src.path(), dst.path()), 0);
        assert!(!dst.path().join("jquery.tablesorter.min.js").exists());
    }
}
