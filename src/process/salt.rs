use std::{fmt, fs, path::Path};
use tracing::info;

use crate::error::{EtlError, Result};

/// File looked up when the configured salt path is a directory.
pub const SALT_FILE_NAME: &str = "salt.txt";

/// Secret appended to every value before hashing. One per run, never rotated.
#[derive(Clone, PartialEq, Eq)]
pub struct Salt(String);

impl Salt {
    pub fn new(secret: impl Into<String>) -> Result<Self> {
        let secret = secret.into();
        if secret.is_empty() {
            return Err(EtlError::Salt("salt is empty".into()));
        }
        Ok(Self(secret))
    }

    /// Read the salt from `path`, or from `path/salt.txt` when `path` is a
    /// directory. Content is taken verbatim, trailing newline included.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let file = if path.is_dir() {
            path.join(SALT_FILE_NAME)
        } else {
            path.to_path_buf()
        };
        let secret = fs::read_to_string(&file)
            .map_err(|e| EtlError::Salt(format!("reading {}: {}", file.display(), e)))?;
        info!(path = %file.display(), "loaded salt");
        Self::new(secret)
    }

    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for Salt {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Salt(***)")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn loads_from_file_or_directory() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join(SALT_FILE_NAME), "pepper\n").unwrap();

        let from_dir = Salt::load(dir.path()).unwrap();
        let from_file = Salt::load(dir.path().join(SALT_FILE_NAME)).unwrap();
        assert_eq!(from_dir, from_file);
        assert_eq!(from_dir.expose(), "pepper\n");
    }

    #[test]
    fn empty_or_missing_salt_is_rejected() {
        let dir = tempdir().unwrap();
        assert!(matches!(Salt::load(dir.path()), Err(EtlError::Salt(_))));

        fs::write(dir.path().join(SALT_FILE_NAME), "").unwrap();
        assert!(matches!(Salt::load(dir.path()), Err(EtlError::Salt(_))));
    }

    #[test]
    fn debug_does_not_leak() {
        let salt = Salt::new("hunter2").unwrap();
        assert!(!format!("{:?}", salt).contains("hunter2"));
    }
}
