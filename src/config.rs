use std::path::{Path, PathBuf};

use facet::Facet;

use crate::error::ProviderError;
use crate::paths;

#[derive(Debug, Clone, Default, Facet)]
#[facet(default)]
pub struct Config {
    #[facet(default)]
    pub virtualbox: VirtualBoxConfig,
    #[facet(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Facet)]
#[facet(default)]
pub struct VirtualBoxConfig {
    #[facet(default = "VBoxManage")]
    pub executable: String,
    #[facet(default)]
    pub base_folder: String,
    #[facet(default)]
    pub guest_os: String,
    #[facet(default = true)]
    pub register: bool,
    #[facet(default = true)]
    pub delete_files: bool,
}

impl Default for VirtualBoxConfig {
    fn default() -> Self {
        Self {
            executable: "VBoxManage".into(),
            base_folder: String::new(),
            guest_os: String::new(),
            register: true,
            delete_files: true,
        }
    }
}

#[derive(Debug, Clone, Default, Facet)]
#[facet(default)]
pub struct LoggingConfig {
    #[facet(default)]
    pub file: String,
}

impl Config {
    /// Folder new VMs are created in — falls back to VirtualBox's own default.
    pub fn base_folder(&self) -> PathBuf {
        if self.virtualbox.base_folder.is_empty() {
            paths::default_base_folder()
        } else {
            PathBuf::from(&self.virtualbox.base_folder)
        }
    }

    pub fn log_file(&self) -> Option<&Path> {
        if self.logging.file.is_empty() {
            None
        } else {
            Some(Path::new(&self.logging.file))
        }
    }
}

fn validate_config(config: &Config) -> Result<(), ProviderError> {
    if config.virtualbox.executable.trim().is_empty() {
        return Err(ProviderError::Validation {
            message: "virtualbox.executable must not be empty".into(),
        });
    }
    Ok(())
}

pub fn parse_config(contents: &str, origin: &Path) -> Result<Config, ProviderError> {
    let config: Config = facet_toml::from_str(contents).map_err(|e| ProviderError::ConfigParse {
        path: origin.display().to_string(),
        message: e.to_string(),
    })?;
    validate_config(&config)?;
    Ok(config)
}

/// Load the provider config.
///
/// An explicitly given path must exist. Without one, the default location is
/// tried and a missing file yields the built-in defaults.
pub fn load_config(path: Option<&Path>) -> Result<Config, ProviderError> {
    let (path, explicit) = match path {
        Some(p) => (p.to_path_buf(), true),
        None => (paths::default_config_path(), false),
    };

    let contents = match std::fs::read_to_string(&path) {
        Ok(c) => c,
        Err(e) if !explicit && e.kind() == std::io::ErrorKind::NotFound => {
            tracing::debug!(path = %path.display(), "no config file, using defaults");
            return Ok(Config::default());
        }
        Err(source) => {
            return Err(ProviderError::ConfigLoad {
                path: path.display().to_string(),
                source,
            });
        }
    };

    parse_config(&contents, &path)
}
