//! Configuration loading and root folder resolution

use crate::{Error, Result};
use std::path::{Path, PathBuf};

/// Default number of sentences per inference sub-batch. A request may
/// override this for itself only; the shared default is never mutated.
pub const DEFAULT_BATCH_SIZE: usize = 30;

/// Filename of the shared database inside the root folder.
pub const DATABASE_FILENAME: &str = "emotag.db";

/// Filename the fetched lexicon artifact is stored under.
pub const LEXICON_FILENAME: &str = "emotion-lexicon.json";

/// Root folder resolution priority order:
/// 1. Command-line argument (highest priority)
/// 2. Environment variable
/// 3. TOML config file
/// 4. OS-dependent compiled default (fallback)
pub fn resolve_root_folder(cli_arg: Option<&str>, env_var_name: &str) -> Result<PathBuf> {
    // Priority 1: Command-line argument
    if let Some(path) = cli_arg {
        return Ok(PathBuf::from(path));
    }

    // Priority 2: Environment variable
    if let Ok(path) = std::env::var(env_var_name) {
        if !path.is_empty() {
            return Ok(PathBuf::from(path));
        }
    }

    // Priority 3: TOML config file
    if let Ok(config_path) = locate_config_file() {
        if let Ok(toml_content) = std::fs::read_to_string(&config_path) {
            if let Ok(config) = toml::from_str::<toml::Value>(&toml_content) {
                if let Some(root_folder) = config.get("root_folder").and_then(|v| v.as_str()) {
                    return Ok(PathBuf::from(root_folder));
                }
            }
        }
    }

    // Priority 4: OS-dependent compiled default
    Ok(default_root_folder())
}

/// Get default configuration file path for the platform
fn locate_config_file() -> Result<PathBuf> {
    let user_config = dirs::config_dir().map(|d| d.join("emotag").join("config.toml"));

    if let Some(path) = user_config {
        if path.exists() {
            return Ok(path);
        }
    }

    if cfg!(target_os = "linux") {
        let system_config = PathBuf::from("/etc/emotag/config.toml");
        if system_config.exists() {
            return Ok(system_config);
        }
    }

    Err(Error::Config("No config file found".to_string()))
}

/// Get OS-dependent default root folder path
fn default_root_folder() -> PathBuf {
    dirs::data_local_dir()
        .map(|d| d.join("emotag"))
        .unwrap_or_else(|| PathBuf::from("./emotag_data"))
}

/// Ensure the root folder exists and return the database path within it.
pub fn prepare_root_folder(root_folder: &Path) -> Result<PathBuf> {
    std::fs::create_dir_all(root_folder)?;
    Ok(root_folder.join(DATABASE_FILENAME))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cli_argument_wins_over_everything() {
        let resolved =
            resolve_root_folder(Some("/tmp/emotag-cli"), "EMOTAG_TEST_UNSET_VAR").unwrap();
        assert_eq!(resolved, PathBuf::from("/tmp/emotag-cli"));
    }

    #[test]
    fn env_var_used_when_no_cli_argument() {
        std::env::set_var("EMOTAG_TEST_ROOT_A", "/tmp/emotag-env");
        let resolved = resolve_root_folder(None, "EMOTAG_TEST_ROOT_A").unwrap();
        assert_eq!(resolved, PathBuf::from("/tmp/emotag-env"));
        std::env::remove_var("EMOTAG_TEST_ROOT_A");
    }

    #[test]
    fn falls_back_to_compiled_default() {
        let resolved = resolve_root_folder(None, "EMOTAG_TEST_UNSET_VAR").unwrap();
        assert!(resolved.ends_with("emotag") || resolved.ends_with("emotag_data"));
    }

    #[test]
    fn prepare_creates_directory_and_returns_db_path() {
        let dir = std::env::temp_dir().join(format!("emotag-cfg-{}", std::process::id()));
        let _ = std::fs::remove_dir_all(&dir);

        let db_path = prepare_root_folder(&dir).unwrap();
        assert!(dir.exists());
        assert!(db_path.ends_with(DATABASE_FILENAME));

        let _ = std::fs::remove_dir_all(&dir);
    }
}
