use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::domain::register::ImportMode;

/// Configuration for compiling a register.
///
/// This struct holds settings that control how imports combine with an
/// existing register and where exports are written.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "Versions", into = "Versions")]
pub struct Config {
    /// Whether an import merges into the register or replaces it.
    import_mode: ImportMode,

    /// Prefix of exported file names.
    ///
    /// Exports are named `{prefix}_{YYYY-MM-DD}.csv`.
    export_prefix: String,

    /// Directory exports are written to.
    ///
    /// If unset, exports are written next to the register file, or to the
    /// working directory in an interactive session.
    export_dir: Option<PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            import_mode: ImportMode::default(),
            export_prefix: default_export_prefix(),
            export_dir: None,
        }
    }
}

impl Config {
    /// Reads the configuration from a TOML file.
    ///
    /// Settings missing from the file take their defaults.
    ///
    /// # Errors
    ///
    /// Returns a message if the file cannot be read or is not a valid
    /// configuration.
    pub fn load(path: &Path) -> Result<Self, String> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| format!("Failed to read config file: {e}"))?;
        toml::from_str(&content).map_err(|e| format!("Failed to parse config file: {e}"))
    }

    /// Writes the configuration as TOML.
    ///
    /// # Errors
    ///
    /// Returns a message if serialization or the write fails.
    pub fn save(&self, path: &Path) -> Result<(), String> {
        let content =
            toml::to_string_pretty(self).map_err(|e| format!("Failed to serialize config: {e}"))?;
        std::fs::write(path, content).map_err(|e| format!("Failed to write config file: {e}"))
    }

    /// Whether an import merges into the register or replaces it.
    #[must_use]
    pub const fn import_mode(&self) -> ImportMode {
        self.import_mode
    }

    /// Sets the import mode.
    pub const fn set_import_mode(&mut self, mode: ImportMode) {
        self.import_mode = mode;
    }

    /// Prefix of exported file names.
    #[must_use]
    pub fn export_prefix(&self) -> &str {
        &self.export_prefix
    }

    /// Sets the prefix of exported file names.
    pub fn set_export_prefix(&mut self, prefix: String) {
        self.export_prefix = prefix;
    }

    /// Directory exports are written to, if configured.
    #[must_use]
    pub fn export_dir(&self) -> Option<&Path> {
        self.export_dir.as_deref()
    }

    /// Sets the directory exports are written to.
    pub fn set_export_dir(&mut self, dir: Option<PathBuf>) {
        self.export_dir = dir;
    }
}

fn default_export_prefix() -> String {
    "IAR_Export".to_string()
}

/// On-disk layouts of the configuration, keyed by `_version`.
///
/// Older layouts keep deserializing after a new one is added.
#[derive(Debug, Serialize, Deserialize)]
#[serde(tag = "_version")]
enum Versions {
    #[serde(rename = "1")]
    V1 {
        #[serde(default)]
        import_mode: ImportMode,

        #[serde(default = "default_export_prefix")]
        export_prefix: String,

        #[serde(default, skip_serializing_if = "Option::is_none")]
        export_dir: Option<PathBuf>,
    },
}

impl From<Versions> for Config {
    fn from(versions: Versions) -> Self {
        match versions {
            Versions::V1 {
                import_mode,
                export_prefix,
                export_dir,
            } => Self {
                import_mode,
                export_prefix,
                export_dir,
            },
        }
    }
}

impl From<Config> for Versions {
    fn from(config: Config) -> Self {
        Self::V1 {
            import_mode: config.import_mode,
            export_prefix: config.export_prefix,
            export_dir: config.export_dir,
        }
    }
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use super::*;

    #[test]
    fn load_reads_valid_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(
            b"_version = \"1\"\nimport_mode = \"replace\"\nexport_prefix = \"Register\"\n\
              export_dir = \"exports\"\n",
        )
        .unwrap();

        let config = Config::load(file.path()).unwrap();

        assert_eq!(config.import_mode(), ImportMode::Replace);
        assert_eq!(config.export_prefix(), "Register");
        assert_eq!(config.export_dir(), Some(Path::new("exports")));
    }

    #[test]
    fn load_missing_file_returns_error() {
        let tmp = tempfile::tempdir().unwrap();
        let missing = tmp.path().join("missing.toml");

        let error = Config::load(&missing).unwrap_err();
        assert!(error.starts_with("Failed to read config file:"));
    }

    #[test]
    fn load_invalid_toml_returns_error() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(b"_version = \"1\"\nimport_mode = \"shuffle\"\n")
            .unwrap();

        let error = Config::load(file.path()).unwrap_err();
        assert!(error.starts_with("Failed to parse config file:"));
    }

    #[test]
    fn version_only_file_is_default() {
        let expected = Config::default();
        let actual: Config = toml::from_str(r#"_version = "1""#).unwrap();
        assert_eq!(actual, expected);
    }

    #[test]
    fn save_then_load_preserves_settings() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("iar.toml");

        let mut config = Config::default();
        config.set_import_mode(ImportMode::Replace);
        config.set_export_prefix("Register".to_string());
        config.set_export_dir(Some(PathBuf::from("out")));
        config.save(&path).unwrap();

        assert_eq!(Config::load(&path).unwrap(), config);
    }
}
