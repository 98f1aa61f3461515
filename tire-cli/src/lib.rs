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

use std::path::PathBuf;
use std::str::FromStr;

use anyhow::Context;
use clap::{arg, Arg, ArgAction, ArgMatches};
use reqwest::Url;
use tire_config::{ClientConfig, HumanDuration, TIRE_CONFIG_ENV_KEY, TIRE_URL_ENV_KEY};
use tire_rest_client::{BulkOptions, Timeout, TireClient, TireClientBuilder};
use tracing::debug;

pub mod cli;
pub mod index;
pub mod logger;
pub mod search;

pub const TIRE_LOG_FORMAT_ENV_KEY: &str = "TIRE_LOG_FORMAT";

/// Arguments shared by every command talking to the search engine.
pub fn client_args() -> Vec<Arg> {
    vec![
        arg!(--"endpoint" <TIRE_URL> "Search engine endpoint, e.g. `http://localhost:9200`.")
            .env(TIRE_URL_ENV_KEY)
            .required(false)
            .global(true)
            .display_order(1),
        Arg::new("config")
            .long("config")
            .help("Client config file location (JSON, TOML or YAML).")
            .env(TIRE_CONFIG_ENV_KEY)
            .required(false)
            .global(true)
            .display_order(2),
        Arg::new("timeout")
            .long("timeout")
            .help("Duration of the timeout, e.g. `10s` or `none`.")
            .required(false)
            .global(true)
            .display_order(3),
        Arg::new("connect-timeout")
            .long("connect-timeout")
            .help("Duration of the connect timeout, e.g. `5s` or `none`.")
            .required(false)
            .global(true)
            .display_order(4),
    ]
}

pub fn no_color_arg() -> Arg {
    // Following https://no-color.org/
    Arg::new("no-color")
        .long("no-color")
        .help(
            "Disable ANSI terminal codes (colors, etc...) being injected into the logging and \
             command output",
        )
        .env("NO_COLOR")
        .value_parser(clap::builder::FalseyValueParser::new())
        .global(true)
        .action(ArgAction::SetTrue)
}

#[derive(Debug, Default, Clone, Eq, PartialEq)]
pub struct ClientArgs {
    /// Overrides the url of the config file.
    pub endpoint: Option<Url>,
    pub config_path: Option<PathBuf>,
    pub connect_timeout: Option<Timeout>,
    pub timeout: Option<Timeout>,
}

impl ClientArgs {
    pub fn parse(matches: &mut ArgMatches) -> anyhow::Result<Self> {
        let endpoint = matches
            .remove_one::<String>("endpoint")
            .map(|endpoint_str| Url::from_str(&endpoint_str))
            .transpose()
            .context("failed to parse endpoint")?;
        let config_path = matches.remove_one::<String>("config").map(PathBuf::from);
        let connect_timeout = matches
            .remove_one::<String>("connect-timeout")
            .map(|duration| parse_duration_or_none(&duration))
            .transpose()?;
        let timeout = matches
            .remove_one::<String>("timeout")
            .map(|duration| parse_duration_or_none(&duration))
            .transpose()?;
        Ok(Self {
            endpoint,
            config_path,
            connect_timeout,
            timeout,
        })
    }

    pub fn load_config(&self) -> anyhow::Result<ClientConfig> {
        ClientConfig::load(self.config_path.as_deref())
    }

    /// Builds a client from `client_config`. Command line arguments take precedence over the
    /// config file.
    pub fn client(&self, client_config: &ClientConfig) -> anyhow::Result<TireClient> {
        let endpoint = if let Some(endpoint) = &self.endpoint {
            endpoint.clone()
        } else {
            Url::parse(&client_config.url)
                .with_context(|| format!("failed to parse url `{}`", client_config.url))?
        };
        debug!(endpoint=%endpoint, "building client");
        let mut builder = TireClientBuilder::new(endpoint);
        if let Some(timeout) = &client_config.connect_timeout {
            builder = builder.connect_timeout(to_timeout(timeout));
        }
        if let Some(timeout) = &client_config.timeout {
            builder = builder.timeout(to_timeout(timeout));
        }
        if let Some(timeout) = &client_config.search_timeout {
            builder = builder.search_timeout(to_timeout(timeout));
        }
        if let Some(timeout) = &client_config.bulk_timeout {
            builder = builder.bulk_timeout(to_timeout(timeout));
        }
        if let Some(connect_timeout) = self.connect_timeout {
            builder = builder.connect_timeout(connect_timeout);
        }
        if let Some(timeout) = self.timeout {
            builder = builder.timeout(timeout).search_timeout(timeout);
        }
        let client = builder.build()?;
        Ok(client)
    }
}

pub fn bulk_options(client_config: &ClientConfig, doc_type_opt: Option<String>) -> BulkOptions {
    let mut bulk_options = BulkOptions {
        max_batch_num_bytes: client_config.bulk_max_batch_bytes.as_u64() as usize,
        max_batch_num_docs: client_config.bulk_max_batch_docs,
        ..Default::default()
    };
    if let Some(doc_type) = doc_type_opt {
        bulk_options.default_doc_type = doc_type;
    }
    bulk_options
}

fn to_timeout(human_duration: &HumanDuration) -> Timeout {
    human_duration
        .duration_opt()
        .map(Timeout::new)
        .unwrap_or(Timeout::none())
}

/// Parses durations such as `1s`, `2m` or `1h 30m`. `none` disables the timeout.
pub fn parse_duration_or_none(duration_str: &str) -> anyhow::Result<Timeout> {
    let human_duration = HumanDuration::from_str(duration_str)
        .with_context(|| format!("invalid duration `{duration_str}`, expected e.g. `10s` or `none`"))?;
    Ok(to_timeout(&human_duration))
}
