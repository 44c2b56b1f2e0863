//! Persisting the submitted value

use std::fs::OpenOptions;
use std::io::Write;
use std::path::Path;

use anyhow::{Context, Result};
use tokio::runtime::{Handle, RuntimeFlavor};

/// [`write_value`] from inside a model update.
///
/// On a multi-threaded runtime the write runs under `block_in_place` so the
/// worker's other tasks move elsewhere. Anywhere else it writes directly.
pub fn save(path: &Path, value: &str) -> Result<()> {
    match Handle::try_current() {
        Ok(handle) if handle.runtime_flavor() == RuntimeFlavor::MultiThread => {
            tokio::task::block_in_place(|| write_value(path, value))
        }
        _ => write_value(path, value),
    }
}

/// Overwrite `path` with exactly `value`.
///
/// New files are created `0644`.
pub fn write_value(path: &Path, value: &str) -> Result<()> {
    let mut options = OpenOptions::new();
    options.write(true).create(true).truncate(true);

    #[cfg(unix)]
    {
        use std::os::unix::fs::OpenOptionsExt;
        options.mode(0o644);
    }

    let mut file = options
        .open(path)
        .with_context(|| format!("failed to open {}", path.display()))?;
    file.write_all(value.as_bytes())
        .with_context(|| format!("failed to write {}", path.display()))?;

    tracing::info!(path = %path.display(), bytes = value.len(), "value written");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_overwrites_previous_value() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("output.log");

        write_value(&path, "a much longer first value").unwrap();
        write_value(&path, "bob").unwrap();

        assert_eq!(std::fs::read_to_string(&path).unwrap(), "bob");
    }

    #[cfg(unix)]
    #[test]
    fn test_file_mode() {
        use std::os::unix::fs::PermissionsExt;

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("output.log");
        write_value(&path, "x").unwrap();

        // umask may only clear bits, never add them
        let mode = std::fs::metadata(&path).unwrap().permissions().mode() & 0o777;
        assert_eq!(mode & !0o644, 0);
        assert_ne!(mode & 0o600, 0);
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_save_on_worker_thread() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("output.log");

        save(&path, "Ada").unwrap();
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "Ada");
    }

    #[tokio::test]
    async fn test_save_on_current_thread_runtime() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("output.log");

        save(&path, "Ada").unwrap();
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "Ada");
    }

    #[test]
    fn test_missing_directory_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nope").join("output.log");
        assert!(write_value(&path, "x").is_err());
    }
}
