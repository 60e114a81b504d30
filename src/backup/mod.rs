/**
 * Backup Engine
 *
 * Before a document is overwritten, its current contents can be copied
 * aside into a timestamped snapshot. This module owns that entire flow:
 * the age gate that prevents snapshot storms on rapid saves, the snapshot
 * naming rule, optional gzip compression, and the retention sweep that
 * caps how many snapshots accumulate per document.
 *
 * # Snapshot Naming
 *
 * `<base>-<YYYYMMDD_HHMMSS><ext>[.gz]`, where `<base><ext>` is the
 * destination base path split at its last extension. The timestamp format
 * is fixed-width, so lexically sorting snapshot filenames is the same as
 * sorting them chronologically; retention relies on this.
 *
 * # Age Gate
 *
 * With a minimum age configured, a snapshot attempt for a source path that
 * had one within the interval is skipped. The attempt timestamp is
 * recorded *before* the snapshot is written, on every call that passes the
 * existence and gate checks - so an attempt whose write then fails still
 * consumes the window, and a skipped attempt does not refresh it. Callers
 * that need stronger guarantees must not rely on the gate resetting on
 * success only.
 *
 * # Failure Semantics
 *
 * Any failure in the write path (destination dir, source open, snapshot
 * create, compression, copy) is a `BackupError`; the caller is expected to
 * abort the triggering write so a document is never overwritten without
 * its snapshot. Retention deletion failures, by contrast, are logged and
 * swallowed - rotation is best-effort and never blocks a save.
 */

use std::collections::HashMap;
use std::fs::File;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use chrono::{DateTime, Local, TimeDelta};
use flate2::write::GzEncoder;
use flate2::Compression;
use thiserror::Error;

/// Errors surfaced from the snapshot write path
#[derive(Debug, Error)]
pub enum BackupError {
    /// Creating the snapshot directory failed
    #[error("create backup dir {path}: {source}")]
    CreateDir {
        path: String,
        #[source]
        source: io::Error,
    },

    /// Opening the live document for reading failed
    #[error("open {path} for backup: {source}")]
    OpenSource {
        path: String,
        #[source]
        source: io::Error,
    },

    /// Creating the snapshot file failed
    #[error("create backup file {path}: {source}")]
    CreateSnapshot {
        path: String,
        #[source]
        source: io::Error,
    },

    /// Copying or compressing the contents failed
    #[error("write backup file {path}: {source}")]
    Copy {
        path: String,
        #[source]
        source: io::Error,
    },

    /// The blocking task running the snapshot was cancelled
    #[error("backup task interrupted")]
    Interrupted,
}

/// Operator-facing backup knobs, post-validation.
#[derive(Debug, Clone)]
pub struct BackupSettings {
    /// Directory name for snapshots, under the tenant root.
    pub dir_name: String,
    /// Retained snapshots per document base name.
    pub max_files: usize,
    /// Minimum seconds between snapshots of one source; 0 disables gating.
    pub min_age_secs: i64,
    /// gzip snapshots at maximum compression.
    pub compress: bool,
}

/// Snapshot engine: age-gate cache plus the write and retention paths.
///
/// One manager serves all tenants. The attempt cache is keyed by absolute
/// source path and guarded by its own mutex - per-tenant serialization
/// already prevents same-path races, but the cache itself is process-wide.
pub struct BackupManager {
    settings: BackupSettings,
    cache: Mutex<HashMap<PathBuf, DateTime<Local>>>,
}

impl BackupManager {
    pub fn new(settings: BackupSettings) -> Self {
        Self {
            settings,
            cache: Mutex::new(HashMap::new()),
        }
    }

    /// Directory name snapshots live under, relative to a tenant root.
    pub fn dir_name(&self) -> &str {
        &self.settings.dir_name
    }

    /// Snapshot `source` under `dest_base`, honoring the age gate, then
    /// enforce retention. Runs on the blocking thread pool.
    ///
    /// # Returns
    ///
    /// - `Ok(Some(path))` - snapshot written at `path`
    /// - `Ok(None)` - skipped: source missing, or the age gate held
    ///
    /// # Errors
    ///
    /// Any write-path failure. The caller must abort the write that
    /// triggered the snapshot.
    pub async fn snapshot(
        self: Arc<Self>,
        source: PathBuf,
        dest_base: PathBuf,
    ) -> Result<Option<PathBuf>, BackupError> {
        tokio::task::spawn_blocking(move || self.snapshot_blocking(&source, &dest_base))
            .await
            .map_err(|_| BackupError::Interrupted)?
    }

    /// Synchronous snapshot path; see [`Self::snapshot`].
    pub fn snapshot_blocking(
        &self,
        source: &Path,
        dest_base: &Path,
    ) -> Result<Option<PathBuf>, BackupError> {
        // First write of a new document: nothing to preserve.
        if !source.exists() {
            return Ok(None);
        }

        let now = Local::now();

        if self.settings.min_age_secs > 0 {
            let mut cache = self.cache.lock().unwrap();
            if let Some(prev) = cache.get(source) {
                if now.signed_duration_since(*prev)
                    < TimeDelta::seconds(self.settings.min_age_secs)
                {
                    return Ok(None);
                }
            }
            // Recorded before the write: a failed attempt still consumes
            // the gate window.
            cache.insert(source.to_path_buf(), now);
        }

        let snapshot = snapshot_path(dest_base, self.settings.compress, &now);

        if let Some(dir) = snapshot.parent() {
            if !dir.exists() {
                create_dir_all_0700(dir).map_err(|source| BackupError::CreateDir {
                    path: dir.display().to_string(),
                    source,
                })?;
            }
        }

        tracing::info!(
            source = %source.display(),
            snapshot = %snapshot.display(),
            "backup"
        );

        let mut live = File::open(source).map_err(|err| BackupError::OpenSource {
            path: source.display().to_string(),
            source: err,
        })?;
        let out = File::create(&snapshot).map_err(|err| BackupError::CreateSnapshot {
            path: snapshot.display().to_string(),
            source: err,
        })?;

        let copy_err = |err| BackupError::Copy {
            path: snapshot.display().to_string(),
            source: err,
        };
        if self.settings.compress {
            let mut encoder = GzEncoder::new(out, Compression::best());
            io::copy(&mut live, &mut encoder).map_err(copy_err)?;
            encoder.finish().map_err(copy_err)?;
        } else {
            let mut out = out;
            io::copy(&mut live, &mut out).map_err(copy_err)?;
        }

        self.enforce_retention(dest_base);

        Ok(Some(snapshot))
    }

    /// Delete the oldest snapshots of `dest_base` beyond the retention
    /// cap. Best-effort: failures are logged and never propagated.
    fn enforce_retention(&self, dest_base: &Path) {
        let (base, ext) = split_base(dest_base);
        let pattern = format!(
            "{}-*_*{}*",
            glob::Pattern::escape(&base.display().to_string()),
            glob::Pattern::escape(&ext),
        );

        let entries = match glob::glob(&pattern) {
            Ok(entries) => entries,
            Err(err) => {
                tracing::warn!(%err, pattern, "delete old backups failed");
                return;
            }
        };

        let mut files: Vec<PathBuf> = entries.filter_map(Result::ok).collect();
        if files.len() <= self.settings.max_files {
            return;
        }

        // Lexical order is chronological order per the naming rule.
        files.sort();
        let excess = files.len() - self.settings.max_files;
        for old in &files[..excess] {
            tracing::info!(path = %old.display(), "delete old backup");
            if let Err(err) = std::fs::remove_file(old) {
                tracing::warn!(path = %old.display(), %err, "delete old backup failed");
            }
        }
    }

    /// Shift a cached attempt timestamp into the past (tests only).
    #[cfg(test)]
    fn backdate(&self, source: &Path, by_secs: i64) {
        let mut cache = self.cache.lock().unwrap();
        if let Some(ts) = cache.get_mut(source) {
            *ts -= TimeDelta::seconds(by_secs);
        }
    }
}

/// Compute the snapshot path for `dest_base` at time `at` per the naming
/// rule: `<base>-<YYYYMMDD_HHMMSS><ext>`, plus `.gz` when compressing.
pub fn snapshot_path(dest_base: &Path, compress: bool, at: &DateTime<Local>) -> PathBuf {
    let (base, ext) = split_base(dest_base);
    let mut name = format!("{}-{}{}", base.display(), at.format("%Y%m%d_%H%M%S"), ext);
    if compress {
        name.push_str(".gz");
    }
    PathBuf::from(name)
}

/// Split a path at the final `.` of its file name: everything before it
/// and the extension with its dot, or empty when the name has no dot. A
/// leading dot counts, so a dotfile splits into an empty base.
fn split_base(dest_base: &Path) -> (PathBuf, String) {
    let name = dest_base
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    match name.rfind('.') {
        Some(dot) => (
            dest_base.with_file_name(&name[..dot]),
            name[dot..].to_string(),
        ),
        None => (dest_base.to_path_buf(), String::new()),
    }
}

#[cfg(unix)]
fn create_dir_all_0700(path: &Path) -> io::Result<()> {
    use std::os::unix::fs::DirBuilderExt;
    std::fs::DirBuilder::new()
        .recursive(true)
        .mode(0o700)
        .create(path)
}

#[cfg(not(unix))]
fn create_dir_all_0700(path: &Path) -> io::Result<()> {
    std::fs::create_dir_all(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use chrono::TimeZone;
    use flate2::read::GzDecoder;
    use std::io::Read;
    use tempfile::TempDir;

    fn manager(min_age_secs: i64, max_files: usize, compress: bool) -> Arc<BackupManager> {
        Arc::new(BackupManager::new(BackupSettings {
            dir_name: "backups".to_string(),
            max_files,
            min_age_secs,
            compress,
        }))
    }

    fn snapshot_names(dir: &Path) -> Vec<String> {
        let mut names: Vec<String> = std::fs::read_dir(dir)
            .map(|entries| {
                entries
                    .filter_map(Result::ok)
                    .map(|e| e.file_name().to_string_lossy().into_owned())
                    .collect()
            })
            .unwrap_or_default();
        names.sort();
        names
    }

    #[test]
    fn test_missing_source_is_skipped() {
        let dir = TempDir::new().unwrap();
        let manager = manager(60, 10, false);

        let result = manager
            .snapshot_blocking(
                &dir.path().join("absent.html"),
                &dir.path().join("backups/absent.html"),
            )
            .unwrap();

        assert_eq!(result, None);
        assert!(!dir.path().join("backups").exists());
    }

    #[test]
    fn test_snapshot_preserves_contents_and_naming() {
        let dir = TempDir::new().unwrap();
        let source = dir.path().join("wiki.html");
        std::fs::write(&source, b"version one").unwrap();

        let manager = manager(60, 10, false);
        let written = manager
            .snapshot_blocking(&source, &dir.path().join("backups/wiki.html"))
            .unwrap()
            .expect("snapshot should be written");

        assert_eq!(written.parent(), Some(dir.path().join("backups").as_path()));
        let name = written.file_name().unwrap().to_string_lossy();
        assert!(name.starts_with("wiki-"), "unexpected name {name}");
        assert!(name.ends_with(".html"), "unexpected name {name}");
        // wiki-YYYYMMDD_HHMMSS.html
        assert_eq!(name.len(), "wiki-20240101_120000.html".len());
        assert_eq!(std::fs::read(&written).unwrap(), b"version one");
    }

    #[cfg(unix)]
    #[test]
    fn test_snapshot_dir_is_private() {
        use std::os::unix::fs::PermissionsExt;

        let dir = TempDir::new().unwrap();
        let source = dir.path().join("wiki.html");
        std::fs::write(&source, b"v1").unwrap();

        let manager = manager(0, 10, false);
        manager
            .snapshot_blocking(&source, &dir.path().join("backups/wiki.html"))
            .unwrap();

        let mode = std::fs::metadata(dir.path().join("backups"))
            .unwrap()
            .permissions()
            .mode();
        assert_eq!(mode & 0o777, 0o700);
    }

    #[test]
    fn test_age_gate_skips_then_reopens() {
        let dir = TempDir::new().unwrap();
        let source = dir.path().join("wiki.html");
        std::fs::write(&source, b"v1").unwrap();
        let dest_base = dir.path().join("backups/wiki.html");

        let manager = manager(3600, 10, false);
        assert!(manager
            .snapshot_blocking(&source, &dest_base)
            .unwrap()
            .is_some());

        // Within the window: skipped, and still only one file.
        assert_eq!(manager.snapshot_blocking(&source, &dest_base).unwrap(), None);
        assert_eq!(snapshot_names(&dir.path().join("backups")).len(), 1);

        // Outside the window the gate reopens.
        manager.backdate(&source, 7200);
        assert!(manager
            .snapshot_blocking(&source, &dest_base)
            .unwrap()
            .is_some());
    }

    #[test]
    fn test_gate_disabled_never_skips() {
        let dir = TempDir::new().unwrap();
        let source = dir.path().join("wiki.html");
        std::fs::write(&source, b"v1").unwrap();
        let dest_base = dir.path().join("backups/wiki.html");

        let manager = manager(0, 10, false);
        for _ in 0..3 {
            assert!(manager
                .snapshot_blocking(&source, &dest_base)
                .unwrap()
                .is_some());
        }
    }

    #[test]
    fn test_gate_window_consumed_by_failed_write() {
        let dir = TempDir::new().unwrap();
        let source = dir.path().join("wiki.html");
        std::fs::write(&source, b"v1").unwrap();

        // A plain file where the snapshot directory should go makes the
        // write fail after the gate bookkeeping has happened.
        let blocker = dir.path().join("blocked");
        std::fs::write(&blocker, b"").unwrap();
        let manager = manager(3600, 10, false);
        let err = manager
            .snapshot_blocking(&source, &blocker.join("wiki.html"))
            .unwrap_err();
        assert_matches!(err, BackupError::CreateSnapshot { .. });

        // The failed attempt consumed the window: a retry against a good
        // destination is gate-skipped.
        let good = dir.path().join("backups/wiki.html");
        assert_eq!(manager.snapshot_blocking(&source, &good).unwrap(), None);

        manager.backdate(&source, 7200);
        assert!(manager.snapshot_blocking(&source, &good).unwrap().is_some());
    }

    #[test]
    fn test_compressed_snapshot_roundtrips() {
        let dir = TempDir::new().unwrap();
        let source = dir.path().join("wiki.html");
        std::fs::write(&source, b"compress me").unwrap();

        let manager = manager(0, 10, true);
        let written = manager
            .snapshot_blocking(&source, &dir.path().join("backups/wiki.html"))
            .unwrap()
            .expect("snapshot should be written");

        assert!(written.to_string_lossy().ends_with(".html.gz"));

        let mut decoder = GzDecoder::new(File::open(&written).unwrap());
        let mut contents = Vec::new();
        decoder.read_to_end(&mut contents).unwrap();
        assert_eq!(contents, b"compress me");
    }

    #[test]
    fn test_retention_deletes_oldest_beyond_cap() {
        let dir = TempDir::new().unwrap();
        let source = dir.path().join("wiki.html");
        std::fs::write(&source, b"v1").unwrap();

        let backups = dir.path().join("backups");
        std::fs::create_dir(&backups).unwrap();
        for ts in ["20230101_000001", "20230101_000002", "20230101_000003"] {
            std::fs::write(backups.join(format!("wiki-{ts}.html")), b"old").unwrap();
        }
        // Bystanders that must survive the sweep.
        std::fs::write(backups.join("other-20230101_000001.html"), b"x").unwrap();
        std::fs::write(backups.join("wiki.html"), b"x").unwrap();

        let manager = manager(0, 2, false);
        manager
            .snapshot_blocking(&source, &backups.join("wiki.html"))
            .unwrap()
            .expect("snapshot should be written");

        let names = snapshot_names(&backups);
        // 3 old + 1 new = 4 matched the pattern; the cap of 2 keeps the
        // newest old one and the fresh snapshot.
        assert!(!names.contains(&"wiki-20230101_000001.html".to_string()));
        assert!(!names.contains(&"wiki-20230101_000002.html".to_string()));
        assert!(names.contains(&"wiki-20230101_000003.html".to_string()));
        assert!(names.contains(&"other-20230101_000001.html".to_string()));
        assert!(names.contains(&"wiki.html".to_string()));
        let matching = names.iter().filter(|n| n.starts_with("wiki-")).count();
        assert_eq!(matching, 2);
    }

    #[test]
    fn test_snapshot_names_sort_chronologically() {
        let base = Path::new("/b/wiki.html");
        let older = Local.with_ymd_and_hms(2023, 12, 31, 23, 59, 59).unwrap();
        let newer = Local.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();

        let a = snapshot_path(base, false, &older);
        let b = snapshot_path(base, false, &newer);
        assert!(a < b, "{} should sort before {}", a.display(), b.display());
    }

    #[test]
    fn test_snapshot_path_shapes() {
        let at = Local.with_ymd_and_hms(2024, 6, 1, 10, 20, 30).unwrap();
        assert_eq!(
            snapshot_path(Path::new("/b/wiki.html"), false, &at),
            PathBuf::from("/b/wiki-20240601_102030.html")
        );
        assert_eq!(
            snapshot_path(Path::new("/b/wiki.html"), true, &at),
            PathBuf::from("/b/wiki-20240601_102030.html.gz")
        );
        assert_eq!(
            snapshot_path(Path::new("/b/nested/deep.html"), false, &at),
            PathBuf::from("/b/nested/deep-20240601_102030.html")
        );
    }

    #[test]
    fn test_dotfile_name_splits_into_extension_only() {
        // `.html` is all extension, so the timestamp carries the whole base.
        let at = Local.with_ymd_and_hms(2024, 6, 1, 10, 20, 30).unwrap();
        assert_eq!(
            snapshot_path(Path::new("/b/.html"), false, &at),
            PathBuf::from("/b/-20240601_102030.html")
        );
        assert_eq!(
            snapshot_path(Path::new("/b/plain"), false, &at),
            PathBuf::from("/b/plain-20240601_102030")
        );
    }

    #[tokio::test]
    async fn test_async_snapshot_wrapper() {
        let dir = TempDir::new().unwrap();
        let source = dir.path().join("wiki.html");
        std::fs::write(&source, b"v1").unwrap();

        let manager = manager(0, 10, false);
        let written = manager
            .snapshot(source, dir.path().join("backups/wiki.html"))
            .await
            .unwrap();
        assert!(written.is_some());
    }
}
