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

use std::collections::HashMap;
use std::path::Path;

use anyhow::{bail, Context};
use bytesize::ByteSize;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};
use url::Url;

use crate::{ConfigFormat, HumanDuration};

pub const DEFAULT_URL: &str = "http://localhost:9200";
pub const DEFAULT_BULK_MAX_BATCH_DOCS: usize = 1_000;

pub const TIRE_URL_ENV_KEY: &str = "TIRE_URL";
pub const TIRE_CONFIG_ENV_KEY: &str = "TIRE_CONFIG";

fn default_url() -> String {
    DEFAULT_URL.to_string()
}

fn default_bulk_max_batch_bytes() -> ByteSize {
    ByteSize::mib(10)
}

fn default_bulk_max_batch_docs() -> usize {
    DEFAULT_BULK_MAX_BATCH_DOCS
}

/// Settings of the search client.
///
/// ```yaml
/// url: http://localhost:9200
/// timeout: 10s
/// connect_timeout: 5s
/// search_timeout: 1m
/// bulk_timeout: none
/// bulk_max_batch_bytes: 5MiB
/// bulk_max_batch_docs: 500
/// ```
///
/// Unset timeouts fall back to the client defaults.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ClientConfig {
    #[serde(default = "default_url")]
    pub url: String,
    #[serde(default)]
    pub timeout: Option<HumanDuration>,
    #[serde(default)]
    pub connect_timeout: Option<HumanDuration>,
    #[serde(default)]
    pub search_timeout: Option<HumanDuration>,
    #[serde(default)]
    pub bulk_timeout: Option<HumanDuration>,
    #[serde(default = "default_bulk_max_batch_bytes")]
    pub bulk_max_batch_bytes: ByteSize,
    #[serde(default = "default_bulk_max_batch_docs")]
    pub bulk_max_batch_docs: usize,
}

impl Default for ClientConfig {
    fn default() -> Self {
        ClientConfig {
            url: default_url(),
            timeout: None,
            connect_timeout: None,
            search_timeout: None,
            bulk_timeout: None,
            bulk_max_batch_bytes: default_bulk_max_batch_bytes(),
            bulk_max_batch_docs: default_bulk_max_batch_docs(),
        }
    }
}

impl ClientConfig {
    /// Loads the config file at `config_path` if any, then applies the environment overrides.
    pub fn load(config_path_opt: Option<&Path>) -> anyhow::Result<ClientConfig> {
        let env_vars: HashMap<String, String> = std::env::vars().collect();
        Self::load_with_env(config_path_opt, &env_vars)
    }

    /// Same as [`ClientConfig::load`], reading the overrides from `env_vars`.
    pub fn load_with_env(
        config_path_opt: Option<&Path>,
        env_vars: &HashMap<String, String>,
    ) -> anyhow::Result<ClientConfig> {
        let mut client_config = if let Some(config_path) = config_path_opt {
            let payload = std::fs::read(config_path).with_context(|| {
                format!("failed to read config file `{}`", config_path.display())
            })?;
            let config_format = ConfigFormat::sniff_from_path(config_path)?;
            let client_config = Self::from_payload(config_format, &payload).with_context(|| {
                format!("failed to parse config file `{}`", config_path.display())
            })?;
            info!(config_path=%config_path.display(), "loaded client config");
            client_config
        } else {
            ClientConfig::default()
        };
        client_config.apply_env_overrides(env_vars);
        client_config.validate()?;
        Ok(client_config)
    }

    pub fn from_payload(config_format: ConfigFormat, payload: &[u8]) -> anyhow::Result<Self> {
        let client_config: ClientConfig = config_format.parse(payload)?;
        client_config.validate()?;
        Ok(client_config)
    }

    pub fn apply_env_overrides(&mut self, env_vars: &HashMap<String, String>) {
        if let Some(url) = env_vars.get(TIRE_URL_ENV_KEY) {
            debug!(url=%url, "overriding url with `{TIRE_URL_ENV_KEY}`");
            self.url = url.clone();
        }
    }

    pub fn validate(&self) -> anyhow::Result<()> {
        let url =
            Url::parse(&self.url).with_context(|| format!("url `{}` is invalid", self.url))?;
        if !matches!(url.scheme(), "http" | "https") {
            bail!(
                "url `{}` is invalid: scheme `{}` is not supported, expected `http` or `https`",
                self.url,
                url.scheme()
            );
        }
        if url.host_str().map_or(true, str::is_empty) {
            bail!("url `{}` is invalid: host is missing", self.url);
        }
        if self.bulk_max_batch_bytes.as_u64() == 0 {
            bail!("`bulk_max_batch_bytes` must be strictly positive");
        }
        if self.bulk_max_batch_docs == 0 {
            bail!("`bulk_max_batch_docs` must be strictly positive");
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::io::Write;
    use std::time::Duration;

    use super::*;

    fn write_config_file(extension: &str, content: &str) -> tempfile::NamedTempFile {
        let mut config_file = tempfile::Builder::new()
            .suffix(&format!(".{extension}"))
            .tempfile()
            .unwrap();
        config_file.write_all(content.as_bytes()).unwrap();
        config_file.flush().unwrap();
        config_file
    }

    #[test]
    fn test_client_config_defaults() {
        let client_config = ClientConfig::from_payload(ConfigFormat::Json, b"{}").unwrap();
        assert_eq!(client_config, ClientConfig::default());
        assert_eq!(client_config.url, "http://localhost:9200");
        assert_eq!(client_config.bulk_max_batch_bytes, ByteSize::mib(10));
        assert_eq!(client_config.bulk_max_batch_docs, 1_000);
        assert!(client_config.timeout.is_none());
    }

    #[test]
    fn test_client_config_from_yaml() {
        let payload = r#"
url: https://search.example.com:9243
timeout: 10s
connect_timeout: 2s
search_timeout: 1m 30s
bulk_timeout: none
bulk_max_batch_bytes: 5 MiB
bulk_max_batch_docs: 500
"#;
        let client_config =
            ClientConfig::from_payload(ConfigFormat::Yaml, payload.as_bytes()).unwrap();
        assert_eq!(client_config.url, "https://search.example.com:9243");
        assert_eq!(
            client_config.timeout.unwrap().duration_opt(),
            Some(Duration::from_secs(10))
        );
        assert_eq!(
            client_config.search_timeout.unwrap().duration_opt(),
            Some(Duration::from_secs(90))
        );
        assert!(client_config.bulk_timeout.unwrap().duration_opt().is_none());
        assert_eq!(client_config.bulk_max_batch_bytes, ByteSize::mib(5));
        assert_eq!(client_config.bulk_max_batch_docs, 500);
    }

    #[test]
    fn test_client_config_from_toml() {
        let payload = r#"
url = "http://127.0.0.1:9200"
search_timeout = "30s"
bulk_max_batch_bytes = "1 MiB"
"#;
        let client_config =
            ClientConfig::from_payload(ConfigFormat::Toml, payload.as_bytes()).unwrap();
        assert_eq!(client_config.url, "http://127.0.0.1:9200");
        assert_eq!(client_config.bulk_max_batch_bytes, ByteSize::mib(1));
    }

    #[test]
    fn test_client_config_rejects_unknown_fields() {
        let error =
            ClientConfig::from_payload(ConfigFormat::Json, br#"{"endpoint": "http://localhost"}"#)
                .unwrap_err();
        assert!(format!("{error:#}").contains("unknown field `endpoint`"));
    }

    #[test]
    fn test_client_config_rejects_invalid_url() {
        for url in [
            "localhost:9200",
            "ftp://localhost",
            "mailto:admin@localhost",
            "http://",
            "http://:9200",
            "http://bad host:99999",
            "http://localhost:99999",
            "http://[::1:9200",
        ] {
            let client_config = ClientConfig {
                url: url.to_string(),
                ..Default::default()
            };
            assert!(client_config.validate().is_err(), "`{url}` should be rejected");
        }
        let client_config = ClientConfig {
            url: "http://bad host:99999".to_string(),
            ..Default::default()
        };
        let error = client_config.validate().unwrap_err();
        assert!(format!("{error:#}").contains("url `http://bad host:99999` is invalid"));

        let client_config = ClientConfig {
            url: "ftp://localhost".to_string(),
            ..Default::default()
        };
        let error = client_config.validate().unwrap_err();
        assert!(error.to_string().contains("scheme `ftp` is not supported"));
    }

    #[test]
    fn test_client_config_accepts_valid_urls() {
        for url in [
            "http://localhost:9200",
            "HTTPS://search.example.com",
            "http://127.0.0.1:9200/prefix/",
            "http://[::1]:9200",
        ] {
            let client_config = ClientConfig {
                url: url.to_string(),
                ..Default::default()
            };
            assert!(client_config.validate().is_ok(), "`{url}` should be accepted");
        }
    }

    #[test]
    fn test_client_config_env_overrides() {
        let mut client_config = ClientConfig::default();
        let env_vars = HashMap::from([(
            TIRE_URL_ENV_KEY.to_string(),
            "http://search.internal:9200".to_string(),
        )]);
        client_config.apply_env_overrides(&env_vars);
        assert_eq!(client_config.url, "http://search.internal:9200");
        client_config.apply_env_overrides(&HashMap::new());
        assert_eq!(client_config.url, "http://search.internal:9200");
    }

    #[test]
    fn test_client_config_load_file() {
        let config_file = write_config_file(
            "json",
            r#"{
                // Staging cluster.
                "url": "http://staging:9200",
                "timeout": "3s"
            }"#,
        );
        let client_config =
            ClientConfig::load_with_env(Some(config_file.path()), &HashMap::new()).unwrap();
        assert_eq!(client_config.url, "http://staging:9200");
        assert_eq!(
            client_config.timeout.unwrap().duration_opt(),
            Some(Duration::from_secs(3))
        );

        let env_vars = HashMap::from([(
            TIRE_URL_ENV_KEY.to_string(),
            "http://production:9200".to_string(),
        )]);
        let client_config =
            ClientConfig::load_with_env(Some(config_file.path()), &env_vars).unwrap();
        assert_eq!(client_config.url, "http://production:9200");
        assert_eq!(
            client_config.timeout.unwrap().duration_opt(),
            Some(Duration::from_secs(3))
        );

        let env_vars = HashMap::from([(TIRE_URL_ENV_KEY.to_string(), "not a url".to_string())]);
        ClientConfig::load_with_env(Some(config_file.path()), &env_vars).unwrap_err();
    }

    #[test]
    fn test_client_config_load_without_file() {
        let client_config = ClientConfig::load_with_env(None, &HashMap::new()).unwrap();
        assert_eq!(client_config, ClientConfig::default());
    }

    #[test]
    fn test_client_config_load_invalid_file() {
        let config_file = write_config_file("toml", "url = ");
        let error = ClientConfig::load(Some(config_file.path())).unwrap_err();
        assert!(format!("{error:#}").contains("failed to parse config file"));

        let config_file = write_config_file("yaml", "timeout: 10");
        let error = ClientConfig::load(Some(config_file.path())).unwrap_err();
        assert!(format!("{error:#}").contains("failed to read YAML file"));
    }
}
