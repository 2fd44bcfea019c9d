use serde::Deserialize;
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::settings::SideInputs;

/// Where artifacts are written and where optional side inputs are read.
///
/// Every field has a default matching the container layout, so a YAML file
/// only needs the paths it changes.
#[derive(Debug, Deserialize, Clone, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct GeneratorConfig {
    /// Directory for the service configs, gunicorn config and settings module.
    #[serde(default = "default_conf_dir")]
    pub conf_dir: PathBuf,

    #[serde(default = "default_nginx_conf")]
    pub nginx_conf: PathBuf,

    #[serde(default = "default_roles_file")]
    pub roles_file: PathBuf,

    #[serde(default = "default_settings_overrides")]
    pub settings_overrides: PathBuf,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            conf_dir: default_conf_dir(),
            nginx_conf: default_nginx_conf(),
            roles_file: default_roles_file(),
            settings_overrides: default_settings_overrides(),
        }
    }
}

fn default_conf_dir() -> PathBuf {
    PathBuf::from("/opt/seafile/conf")
}

fn default_nginx_conf() -> PathBuf {
    PathBuf::from("/shared/nginx/conf/seafile.nginx.conf")
}

fn default_roles_file() -> PathBuf {
    PathBuf::from("/tmp/seafile_roles.json")
}

fn default_settings_overrides() -> PathBuf {
    PathBuf::from("/tmp/seahub_settings_overrides.py")
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),
    #[error("Failed to parse YAML: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

impl GeneratorConfig {
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_yaml(&content)
    }

    pub fn from_yaml(content: &str) -> Result<Self, ConfigError> {
        Ok(serde_yaml::from_str(content)?)
    }

    pub fn conf_path(&self, file_name: &str) -> PathBuf {
        self.conf_dir.join(file_name)
    }

    pub fn side_inputs(&self) -> SideInputs {
        SideInputs {
            roles: Some(self.roles_file.clone()),
            overrides: Some(self.settings_overrides.clone()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_yaml_keeps_defaults() {
        let config = GeneratorConfig::from_yaml("conf_dir: /data/conf\n").unwrap();
        assert_eq!(config.conf_dir, PathBuf::from("/data/conf"));
        assert_eq!(config.nginx_conf, default_nginx_conf());
        assert_eq!(
            config.conf_path("seafile.conf"),
            PathBuf::from("/data/conf/seafile.conf")
        );
    }

    #[test]
    fn test_unknown_field_is_rejected() {
        assert!(matches!(
            GeneratorConfig::from_yaml("conf_directory: /x\n"),
            Err(ConfigError::Yaml(_))
        ));
    }

    #[test]
    fn test_load_missing_file() {
        let result = GeneratorConfig::load(Path::new("/nonexistent/seafgen.yaml"));
        assert!(matches!(result, Err(ConfigError::Io(_))));
    }
}
