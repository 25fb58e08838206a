use std::{collections::HashMap, path::PathBuf};

use config::{Config, ConfigError, Environment};
use serde::Deserialize;

pub struct SrcfetchConfig {
    pub staging_dir: Option<PathBuf>,
}

impl SrcfetchConfig {
    pub fn load() -> anyhow::Result<Self> {
        let raw_config = RawConfig::load(None)?;

        Ok(Self {
            staging_dir: raw_config.staging.dir,
        })
    }
}

#[derive(Default, Debug, Deserialize, PartialEq, Eq)]
struct RawConfig {
    #[serde(default)]
    staging: StagingConfig,
}

#[derive(Default, Debug, Deserialize, PartialEq, Eq)]
struct StagingConfig {
    dir: Option<PathBuf>,
}

impl RawConfig {
    fn load(env: Option<HashMap<String, String>>) -> Result<Self, ConfigError> {
        Config::builder()
            .add_source(
                Environment::with_prefix("SRCFETCH")
                    .separator("_")
                    .source(env),
            )
            .build()?
            .try_deserialize()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use pretty_assertions::assert_eq;

    #[test]
    fn load_empty() {
        let env = HashMap::from([]);
        let config = RawConfig::load(Some(env)).unwrap();
        assert_eq!(
            config,
            RawConfig {
                staging: StagingConfig { dir: None }
            }
        )
    }

    #[test]
    fn load_environment() {
        let env = HashMap::from([(
            "SRCFETCH_STAGING_DIR".to_owned(),
            "/staging".to_owned(),
        )]);
        let config = RawConfig::load(Some(env)).unwrap();
        assert_eq!(
            config,
            RawConfig {
                staging: StagingConfig {
                    dir: Some("/staging".into())
                }
            }
        )
    }
}
