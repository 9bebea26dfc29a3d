//! Platform-specific configuration paths.
//!
//! - Linux: `~/.config/sonoscan/config.toml`
//! - macOS: `~/Library/Application Support/sonoscan/config.toml`
//! - Windows: `%APPDATA%\sonoscan\config.toml`

use std::path::{Path, PathBuf};

use crate::error::{ConfigError, Result};

/// Application name used for directory paths.
const APP_NAME: &str = "sonoscan";

/// File name of the user configuration.
pub const CONFIG_FILE: &str = "config.toml";

/// The user configuration directory.
///
/// Falls back to the working directory when the platform directory cannot
/// be determined.
pub fn user_config_dir() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(APP_NAME)
}

/// The user configuration file.
pub fn config_path() -> PathBuf {
    user_config_dir().join(CONFIG_FILE)
}

/// Create the user configuration directory if missing.
pub fn ensure_user_config_dir() -> Result<PathBuf> {
    let dir = user_config_dir();
    ensure_dir(&dir)?;
    Ok(dir)
}

/// Create `dir` and its parents if missing.
pub fn ensure_dir(dir: &Path) -> Result<()> {
    if !dir.exists() {
        std::fs::create_dir_all(dir).map_err(|e| ConfigError::create_dir(dir, e))?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn config_path_ends_with_app_and_file() {
        let path = config_path();
        assert!(path.ends_with("sonoscan/config.toml"), "got: {path:?}");
    }

    #[test]
    fn ensure_dir_creates_nested() {
        let temp = tempfile::TempDir::new().unwrap();
        let nested = temp.path().join("a").join("b");
        ensure_dir(&nested).unwrap();
        assert!(nested.is_dir());
        // second call is a no-op
        ensure_dir(&nested).unwrap();
    }
}
