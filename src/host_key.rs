//! Server host key management

use std::path::Path;

use anyhow::{Context, Result};
use russh::keys::ssh_key::LineEnding;
use russh::keys::{Algorithm, PrivateKey};
use tracing::info;

/// Generate a fresh ed25519 host key
pub fn generate() -> Result<PrivateKey> {
    PrivateKey::random(&mut rand::thread_rng(), Algorithm::Ed25519).context("failed to generate key")
}

/// Load the host key at `path`, creating it (and its `.pub`) if missing
pub fn load_or_generate(path: &Path) -> Result<PrivateKey> {
    if path.exists() {
        info!(path = %path.display(), "loading host key");
        let pem = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read host key {}", path.display()))?;
        return russh::keys::decode_secret_key(&pem, None)
            .with_context(|| format!("failed to decode host key {}", path.display()));
    }

    info!(path = %path.display(), "generating new host key");
    let key = generate()?;

    if let Some(dir) = path.parent().filter(|d| !d.as_os_str().is_empty()) {
        create_private_dir(dir)?;
    }

    let private = key.to_openssh(LineEnding::LF)?;
    write_private(path, private.as_bytes())?;

    let public = key.public_key().to_openssh()?;
    let mut pub_path = path.as_os_str().to_owned();
    pub_path.push(".pub");
    std::fs::write(&pub_path, format!("{}\n", public))
        .with_context(|| format!("failed to write {}", Path::new(&pub_path).display()))?;

    Ok(key)
}

fn create_private_dir(dir: &Path) -> Result<()> {
    let mut builder = std::fs::DirBuilder::new();
    builder.recursive(true);
    #[cfg(unix)]
    {
        use std::os::unix::fs::DirBuilderExt;
        builder.mode(0o700);
    }
    builder
        .create(dir)
        .with_context(|| format!("failed to create {}", dir.display()))
}

fn write_private(path: &Path, data: &[u8]) -> Result<()> {
    use std::io::Write;

    let mut options = std::fs::OpenOptions::new();
    options.write(true).create_new(true);
    #[cfg(unix)]
    {
        use std::os::unix::fs::OpenOptionsExt;
        options.mode(0o600);
    }
    let mut file = options
        .open(path)
        .with_context(|| format!("failed to create host key {}", path.display()))?;
    file.write_all(data)
        .with_context(|| format!("failed to write host key {}", path.display()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generate_then_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(".ssh").join("id_ed25519");

        let created = load_or_generate(&path).unwrap();
        assert!(path.exists());
        assert!(dir.path().join(".ssh").join("id_ed25519.pub").exists());

        let loaded = load_or_generate(&path).unwrap();
        assert_eq!(
            created.public_key().to_openssh().unwrap(),
            loaded.public_key().to_openssh().unwrap()
        );
    }

    #[cfg(unix)]
    #[test]
    fn test_private_key_mode() {
        use std::os::unix::fs::PermissionsExt;

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("host_key");
        load_or_generate(&path).unwrap();

        let mode = std::fs::metadata(&path).unwrap().permissions().mode() & 0o777;
        assert_eq!(mode, 0o600);
    }

    #[test]
    fn test_garbage_key_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("host_key");
        std::fs::write(&path, "not a key").unwrap();
        assert!(load_or_generate(&path).is_err());
    }
}
