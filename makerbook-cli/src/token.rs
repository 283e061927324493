use anyhow::{Context, Result};
use std::fs::{self, File, OpenOptions};
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};

const DEFAULT_FILE_NAME: &str = ".makerbook_token";

/// Bearer token persisted between CLI runs. Readable by the owner only.
pub struct TokenFile {
    path: PathBuf,
}

impl TokenFile {
    /// Uses `path`, or `~/.makerbook_token` when none is given.
    pub fn locate(path: Option<PathBuf>) -> Result<Self> {
        let path = match path {
            Some(path) => path,
            None => dirs::home_dir()
                .context("Failed to get home directory")?
                .join(DEFAULT_FILE_NAME),
        };
        Ok(Self { path })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn store(&self, token: &str) -> Result<()> {
        let mut file = open_private(&self.path)
            .with_context(|| format!("Failed to open token file {:?}", self.path))?;
        file.write_all(token.as_bytes())
            .with_context(|| format!("Failed to save token to {:?}", self.path))?;

        tracing::debug!(path = ?self.path, "Token saved");
        Ok(())
    }

    /// The saved token, or `None` if nothing usable is on disk.
    pub fn read(&self) -> Result<Option<String>> {
        let raw = match fs::read_to_string(&self.path) {
            Ok(raw) => raw,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e).context("Failed to read token file"),
        };
        let token = raw.trim();
        Ok((!token.is_empty()).then(|| token.to_string()))
    }

    /// Deletes the file. Returns whether there was one.
    pub fn remove(&self) -> Result<bool> {
        match fs::remove_file(&self.path) {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(false),
            Err(e) => Err(e)
                .with_context(|| format!("Failed to remove token file {:?}", self.path)),
        }
    }
}

#[cfg(unix)]
fn open_private(path: &Path) -> std::io::Result<File> {
    use std::os::unix::fs::{OpenOptionsExt, PermissionsExt};

    let file = OpenOptions::new()
        .write(true)
        .create(true)
        .truncate(true)
        .mode(0o600)
        .open(path)?;
    // `mode` only applies on creation; tighten a file left by an older version.
    file.set_permissions(fs::Permissions::from_mode(0o600))?;
    Ok(file)
}

#[cfg(not(unix))]
fn open_private(path: &Path) -> std::io::Result<File> {
    OpenOptions::new()
        .write(true)
        .create(true)
        .truncate(true)
        .open(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn stored_token_reads_back_trimmed() {
        let dir = TempDir::new().unwrap();
        let file = TokenFile::locate(Some(dir.path().join("token"))).unwrap();

        file.store("abc123\n").unwrap();
        assert_eq!(file.read().unwrap().as_deref(), Some("abc123"));

        file.store("shorter").unwrap();
        assert_eq!(file.read().unwrap().as_deref(), Some("shorter"));
    }

    #[cfg(unix)]
    #[test]
    fn token_file_is_owner_only_even_if_it_existed() {
        use std::os::unix::fs::PermissionsExt;

        let dir = TempDir::new().unwrap();
        let path = dir.path().join("token");
        fs::write(&path, "old").unwrap();
        fs::set_permissions(&path, fs::Permissions::from_mode(0o644)).unwrap();

        TokenFile::locate(Some(path.clone())).unwrap().store("new").unwrap();

        let mode = fs::metadata(&path).unwrap().permissions().mode();
        assert_eq!(mode & 0o777, 0o600);
    }

    #[test]
    fn missing_or_removed_token_is_none() {
        let dir = TempDir::new().unwrap();
        let file = TokenFile::locate(Some(dir.path().join("token"))).unwrap();
        assert!(file.read().unwrap().is_none());

        file.store("abc").unwrap();
        assert!(file.remove().unwrap());
        assert!(file.read().unwrap().is_none());
        assert!(!file.remove().unwrap());
    }
}
