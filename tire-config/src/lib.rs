// Copyright (C) 2024 Quickwit, Inc.
//
// Quickwit is offered under the AGPL v3.0 and as commercial software.
// For commercial licensing, contact us at hello@quickwit.io.
//
// AGPL:
// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU Affero General Public License as
// published by the Free Software Foundation, either version 3 of the
// License, or (at your option) any later version.
//
// This program is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE. See the
// GNU Affero General Public License for more details.
//
// You should have received a copy of the GNU Affero General Public License
// along with this program. If not, see <http://www.gnu.org/licenses/>.

mod client_config;
mod serde_utils;

use std::path::Path;
use std::str::FromStr;

use anyhow::{bail, Context};
use json_comments::StripComments;
use serde::de::DeserializeOwned;

pub use crate::client_config::{
    ClientConfig, DEFAULT_BULK_MAX_BATCH_DOCS, DEFAULT_URL, TIRE_CONFIG_ENV_KEY, TIRE_URL_ENV_KEY,
};
pub use crate::serde_utils::HumanDuration;

#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum ConfigFormat {
    Json,
    Toml,
    Yaml,
}

impl ConfigFormat {
    pub fn as_str(&self) -> &'static str {
        match self {
            ConfigFormat::Json => "json",
            ConfigFormat::Toml => "toml",
            ConfigFormat::Yaml => "yaml",
        }
    }

    pub fn sniff_from_path(path: &Path) -> anyhow::Result<ConfigFormat> {
        let extension_str: &str = path
            .extension()
            .and_then(|extension| extension.to_str())
            .with_context(|| {
                format!(
                    "failed to read config file `{}`: file extension is missing. Supported file \
                     formats and extensions are JSON (.json), TOML (.toml), and YAML (.yaml or \
                     .yml)",
                    path.display()
                )
            })?;
        ConfigFormat::from_str(extension_str).with_context(|| {
            format!(
                "failed to identify configuration file format `{}`",
                path.display()
            )
        })
    }

    pub fn parse<T>(&self, payload: &[u8]) -> anyhow::Result<T>
    where T: DeserializeOwned {
        match self {
            ConfigFormat::Json => serde_json::from_reader(StripComments::new(payload))
                .context("failed to read JSON file"),
            ConfigFormat::Toml => {
                let payload_str = std::str::from_utf8(payload)
                    .context("configuration file contains invalid UTF-8 characters")?;
                toml::from_str(payload_str).context("failed to read TOML file")
            }
            ConfigFormat::Yaml => {
                serde_yaml::from_slice(payload).context("failed to read YAML file")
            }
        }
    }
}

impl FromStr for ConfigFormat {
    type Err = anyhow::Error;

    fn from_str(ext: &str) -> anyhow::Result<Self> {
        match ext {
            "json" => Ok(Self::Json),
            "toml" => Ok(Self::Toml),
            "yaml" | "yml" => Ok(Self::Yaml),
            _ => bail!(
                "file extension `.{ext}` is not supported. Supported file formats and extensions \
                 are JSON (.json), TOML (.toml), and YAML (.yaml or .yml)",
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use super::*;

    #[test]
    fn test_config_format_sniff_from_path() {
        assert_eq!(
            ConfigFormat::sniff_from_path(&PathBuf::from("tire.json")).unwrap(),
            ConfigFormat::Json
        );
        assert_eq!(
            ConfigFormat::sniff_from_path(&PathBuf::from("conf/tire.yml")).unwrap(),
            ConfigFormat::Yaml
        );
        assert_eq!(
            ConfigFormat::sniff_from_path(&PathBuf::from("tire.toml")).unwrap(),
            ConfigFormat::Toml
        );
        let error = ConfigFormat::sniff_from_path(&PathBuf::from("tire")).unwrap_err();
        assert!(error.to_string().contains("file extension is missing"));
        let error = ConfigFormat::sniff_from_path(&PathBuf::from("tire.ini")).unwrap_err();
        assert!(format!("{error:#}").contains("`.ini` is not supported"));
    }

    #[test]
    fn test_config_format_parse_json_with_comments() {
        let payload = br#"{
            // Local node.
            "url": "http://localhost:9200"
        }"#;
        let value: serde_json::Value = ConfigFormat::Json.parse(payload).unwrap();
        assert_eq!(value["url"], "http://localhost:9200");
        assert_eq!(ConfigFormat::Json.as_str(), "json");
    }
}
