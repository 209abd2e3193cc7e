//! OS directory resolution for the viewer's config, cache and log files.

use std::io;
use std::path::{Path, PathBuf};

/// Errors that can occur during platform operations.
#[derive(Debug, thiserror::Error)]
pub enum PlatformError {
    #[error("could not determine OS configuration directory")]
    NoConfigDir,
    #[error("platform I/O error: {0}")]
    Io(#[from] io::Error),
}

/// Application directory name under each OS base directory.
pub const APP_NAME: &str = "orrery";

/// OS-specific directory paths for the viewer.
///
/// Follows OS conventions (XDG on Linux, Known Folders on Windows, Library on macOS).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlatformDirs {
    /// Holds `config.ron`.
    pub config_dir: PathBuf,
    pub cache_dir: PathBuf,
    /// JSON log written in debug builds.
    pub log_dir: PathBuf,
}

impl PlatformDirs {
    /// Resolve platform-specific directories without creating them on disk.
    ///
    /// # Errors
    ///
    /// Returns [`PlatformError::NoConfigDir`] if the OS does not expose a
    /// configuration directory.
    pub fn resolve() -> Result<Self, PlatformError> {
        let config_dir = dirs::config_dir()
            .ok_or(PlatformError::NoConfigDir)?
            .join(APP_NAME);

        let cache_dir = dirs::cache_dir()
            .map(|base| base.join(APP_NAME))
            .unwrap_or_else(|| config_dir.join("cache"));

        Ok(Self {
            log_dir: config_dir.join("logs"),
            cache_dir,
            config_dir,
        })
    }

    /// Directories for an explicit config location, e.g. from `--config`.
    /// Cache and logs live beside the config file.
    pub fn with_config_dir(config_dir: &Path) -> Self {
        Self {
            config_dir: config_dir.to_path_buf(),
            cache_dir: config_dir.join("cache"),
            log_dir: config_dir.join("logs"),
        }
    }

    /// Create all directories on disk.
    ///
    /// # Errors
    ///
    /// Returns [`PlatformError::Io`] if any directory cannot be created.
    pub fn create_dirs(&self) -> Result<(), PlatformError> {
        std::fs::create_dir_all(&self.config_dir)?;
        std::fs::create_dir_all(&self.cache_dir)?;
        std::fs::create_dir_all(&self.log_dir)?;
        Ok(())
    }

    /// Resolve `override_dir` if given, the OS locations otherwise, and create them.
    pub fn resolve_and_create(override_dir: Option<&Path>) -> Result<Self, PlatformError> {
        let dirs = match override_dir {
            Some(dir) => Self::with_config_dir(dir),
            None => Self::resolve()?,
        };
        dirs.create_dirs()?;
        Ok(dirs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_platform_dirs_resolve() {
        // Headless CI images may lack a home directory.
        let Ok(dirs) = PlatformDirs::resolve() else {
            return;
        };
        assert!(dirs.config_dir.is_absolute(), "config_dir is not absolute");
        assert!(dirs.cache_dir.is_absolute(), "cache_dir is not absolute");
        assert!(dirs.config_dir.ends_with(APP_NAME));
        assert!(dirs.log_dir.starts_with(&dirs.config_dir));
    }

    #[test]
    fn test_override_keeps_everything_together() {
        let root = Path::new("some").join("where");
        let dirs = PlatformDirs::with_config_dir(&root);
        assert_eq!(dirs.config_dir, root);
        assert_eq!(dirs.log_dir, root.join("logs"));
        assert_eq!(dirs.cache_dir, root.join("cache"));
    }

    #[test]
    fn test_directory_creation() {
        let tmp = tempfile::tempdir().unwrap();
        let root = tmp.path().join(APP_NAME);

        let dirs = PlatformDirs::resolve_and_create(Some(&root)).unwrap();

        assert!(dirs.config_dir.is_dir(), "config_dir was not created");
        assert!(dirs.cache_dir.is_dir(), "cache_dir was not created");
        assert!(dirs.log_dir.is_dir(), "log_dir was not created");
    }

    #[test]
    fn test_creation_fails_under_a_file() {
        let tmp = tempfile::tempdir().unwrap();
        let blocker = tmp.path().join("not-a-dir");
        std::fs::write(&blocker, b"x").unwrap();

        let result = PlatformDirs::with_config_dir(&blocker.join("orrery")).create_dirs();
        assert!(matches!(result, Err(PlatformError::Io(_))));
    }
}
