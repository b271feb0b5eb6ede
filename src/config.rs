//! Environment-driven settings.
//!
//! | variable                            | default                        |
//! |-------------------------------------|--------------------------------|
//! | `MEDIAID_ARTIFACT_DIR`              | `artifacts`                    |
//! | `MEDIAID_ADVISORY_PATH`             | built-in advisory table        |
//! | `MEDIAID_DB_PATH`                   | `mediaid.db`                   |
//! | `MEDIAID_TOP_K`                     | `3`                            |
//! | `MEDIAID_REQUIRE_SIGNED_ARTIFACTS`  | `true` in release builds       |
//! | `MEDIAID_ARTIFACT_PUBKEY_B64`       | none                           |
//! | `MEDIAID_ARTIFACT_PUBKEY_B64_FILE`  | none                           |
//! | `MEDIAID_LOG_MODE`                  | `auto`                         |
//! | `MEDIAID_LOG_FILE`                  | `mediaid.log` (file mode)      |

use std::path::{Path, PathBuf};

use ed25519_dalek::VerifyingKey;

use crate::adapters::artifacts::{load_advisory_table, verifying_key_from_b64};
use crate::adapters::FsArtifactSource;
use crate::application::DEFAULT_TOP_K;
use crate::domain::AdvisoryTable;
use crate::MediaidError;

pub const ARTIFACT_DIR_ENV: &str = "MEDIAID_ARTIFACT_DIR";
pub const ADVISORY_PATH_ENV: &str = "MEDIAID_ADVISORY_PATH";
pub const DB_PATH_ENV: &str = "MEDIAID_DB_PATH";
pub const TOP_K_ENV: &str = "MEDIAID_TOP_K";
pub const REQUIRE_SIGNED_ENV: &str = "MEDIAID_REQUIRE_SIGNED_ARTIFACTS";
pub const PUBKEY_ENV: &str = "MEDIAID_ARTIFACT_PUBKEY_B64";
pub const PUBKEY_FILE_ENV: &str = "MEDIAID_ARTIFACT_PUBKEY_B64_FILE";
pub const LOG_MODE_ENV: &str = "MEDIAID_LOG_MODE";
pub const LOG_FILE_ENV: &str = "MEDIAID_LOG_FILE";

const DEFAULT_LOG_FILE: &str = "mediaid.log";

/// Where log output goes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogMode {
    File,
    Stdout,
    /// A file when `MEDIAID_LOG_FILE` is set, stderr otherwise. Stdout is
    /// left to command output.
    Auto,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    pub artifact_dir: PathBuf,
    pub advisory_path: Option<PathBuf>,
    pub db_path: PathBuf,
    pub top_k: usize,
    pub require_signed_artifacts: bool,
    /// Base64 Ed25519 verifying key for the artifact manifest
    pub artifact_pubkey_b64: Option<String>,
    pub log_mode: LogMode,
    pub log_file: Option<PathBuf>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            artifact_dir: PathBuf::from("artifacts"),
            advisory_path: None,
            db_path: PathBuf::from("mediaid.db"),
            top_k: DEFAULT_TOP_K,
            require_signed_artifacts: !cfg!(debug_assertions),
            artifact_pubkey_b64: None,
            log_mode: LogMode::Auto,
            log_file: None,
        }
    }
}

fn parse_bool(name: &str, value: &str) -> Result<bool, MediaidError> {
    match value.trim() {
        "1" | "true" | "TRUE" | "yes" | "YES" => Ok(true),
        "0" | "false" | "FALSE" | "no" | "NO" => Ok(false),
        other => Err(MediaidError::Validation(format!(
            "{name} must be true or false, got {other:?}"
        ))),
    }
}

impl Settings {
    /// Read settings from the process environment.
    ///
    /// # Errors
    /// Returns `Validation` for malformed values, `Io` if the public key
    /// file cannot be read.
    pub fn from_env() -> Result<Self, MediaidError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Read settings through `lookup`, which maps a variable name to its value.
    ///
    /// # Errors
    /// See [`Self::from_env`].
    pub fn from_lookup<F>(lookup: F) -> Result<Self, MediaidError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());
        let mut settings = Self::default();

        if let Some(dir) = var(ARTIFACT_DIR_ENV) {
            settings.artifact_dir = PathBuf::from(dir.trim());
        }
        settings.advisory_path = var(ADVISORY_PATH_ENV).map(|p| PathBuf::from(p.trim()));
        if let Some(path) = var(DB_PATH_ENV) {
            settings.db_path = PathBuf::from(path.trim());
        }

        if let Some(k) = var(TOP_K_ENV) {
            settings.top_k = match k.trim().parse::<usize>() {
                Ok(k) if k >= 1 => k,
                _ => {
                    return Err(MediaidError::Validation(format!(
                        "{TOP_K_ENV} must be a positive integer, got {k:?}"
                    )))
                }
            };
        }

        if let Some(v) = var(REQUIRE_SIGNED_ENV) {
            settings.require_signed_artifacts = parse_bool(REQUIRE_SIGNED_ENV, &v)?;
        }

        settings.artifact_pubkey_b64 = match (var(PUBKEY_ENV), var(PUBKEY_FILE_ENV)) {
            (Some(b64), _) => Some(b64.trim().to_string()),
            (None, Some(path)) => Some(std::fs::read_to_string(path.trim())?.trim().to_string()),
            (None, None) => None,
        };

        if let Some(mode) = var(LOG_MODE_ENV) {
            settings.log_mode = match mode.trim() {
                "file" => LogMode::File,
                "stdout" => LogMode::Stdout,
                "auto" => LogMode::Auto,
                other => {
                    return Err(MediaidError::Validation(format!(
                        "{LOG_MODE_ENV} must be file, stdout or auto, got {other:?}"
                    )))
                }
            };
        }
        settings.log_file = var(LOG_FILE_ENV).map(|p| PathBuf::from(p.trim()));

        Ok(settings)
    }

    /// Log file to use, if logging goes to a file.
    #[must_use]
    pub fn log_path(&self) -> Option<&Path> {
        match (self.log_mode, &self.log_file) {
            (LogMode::Stdout, _) | (LogMode::Auto, None) => None,
            (LogMode::File, None) => Some(Path::new(DEFAULT_LOG_FILE)),
            (LogMode::File | LogMode::Auto, Some(path)) => Some(path),
        }
    }

    /// Parsed artifact verifying key.
    ///
    /// # Errors
    /// Returns `Validation` if the configured key is malformed.
    pub fn verifying_key(&self) -> Result<Option<VerifyingKey>, MediaidError> {
        self.artifact_pubkey_b64
            .as_deref()
            .map(verifying_key_from_b64)
            .transpose()
            .map_err(|e| MediaidError::Validation(format!("{PUBKEY_ENV}: {e}")))
    }

    /// Artifact source configured with the signature policy.
    ///
    /// # Errors
    /// See [`Self::verifying_key`].
    pub fn artifact_source(&self) -> Result<FsArtifactSource, MediaidError> {
        Ok(FsArtifactSource::new(&self.artifact_dir)
            .with_signature(self.verifying_key()?, self.require_signed_artifacts))
    }

    /// Advisory table from `advisory_path`, or the built-in table.
    ///
    /// # Errors
    /// Returns error if the configured file is missing or malformed.
    pub fn advisory_table(&self) -> Result<AdvisoryTable, MediaidError> {
        match &self.advisory_path {
            Some(path) => Ok(load_advisory_table(path)?),
            None => Ok(AdvisoryTable::builtin()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn settings(vars: &[(&str, &str)]) -> Result<Settings, MediaidError> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        Settings::from_lookup(|name| map.get(name).cloned())
    }

    #[test]
    fn test_defaults() {
        let s = settings(&[]).expect("Should parse");
        assert_eq!(s.artifact_dir, PathBuf::from("artifacts"));
        assert_eq!(s.db_path, PathBuf::from("mediaid.db"));
        assert_eq!(s.top_k, 3);
        assert_eq!(s.log_mode, LogMode::Auto);
        assert!(s.advisory_path.is_none());
        assert!(s.log_path().is_none());
        assert_eq!(s.require_signed_artifacts, !cfg!(debug_assertions));
    }

    #[test]
    fn test_overrides() {
        let s = settings(&[
            (ARTIFACT_DIR_ENV, "/srv/model"),
            (TOP_K_ENV, "5"),
            (REQUIRE_SIGNED_ENV, "yes"),
            (LOG_MODE_ENV, "file"),
        ])
        .expect("Should parse");
        assert_eq!(s.artifact_dir, PathBuf::from("/srv/model"));
        assert_eq!(s.top_k, 5);
        assert!(s.require_signed_artifacts);
        assert_eq!(s.log_path(), Some(Path::new("mediaid.log")));
    }

    #[test]
    fn test_invalid_values() {
        for vars in [
            [(TOP_K_ENV, "0")],
            [(TOP_K_ENV, "three")],
            [(REQUIRE_SIGNED_ENV, "maybe")],
            [(LOG_MODE_ENV, "syslog")],
        ] {
            let err = settings(&vars).expect_err("Should reject");
            assert!(matches!(err, MediaidError::Validation(_)));
        }
    }

    #[test]
    fn test_pubkey_from_file() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("pub.b64");
        std::fs::write(&path, "  not-a-key \n").expect("write key");

        let s = settings(&[(PUBKEY_FILE_ENV, path.to_str().expect("utf8 path"))])
            .expect("Should parse");
        assert_eq!(s.artifact_pubkey_b64.as_deref(), Some("not-a-key"));
        assert!(matches!(s.verifying_key(), Err(MediaidError::Validation(_))));
    }

    #[test]
    fn test_builtin_advisory_by_default() {
        let table = settings(&[]).expect("Should parse").advisory_table().expect("table");
        assert_eq!(table, AdvisoryTable::builtin());
    }
}
