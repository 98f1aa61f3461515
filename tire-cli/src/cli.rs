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

use anyhow::{bail, Context};
use clap::{ArgMatches, Command};
use tracing::Level;

use crate::index::{build_index_command, IndexCliCommand};
use crate::search::{
    build_count_command, build_search_command, count_cli, search_cli, CountArgs, SearchArgs,
};
use crate::{client_args, no_color_arg};

pub fn build_cli() -> Command {
    Command::new("tire")
        .about("Command line client for Elasticsearch. Manages indexes, imports and searches documents.")
        .version(env!("CARGO_PKG_VERSION"))
        .arg(no_color_arg())
        .args(client_args())
        .subcommand(build_index_command().display_order(1))
        .subcommand(build_search_command().display_order(2))
        .subcommand(build_count_command().display_order(3))
        .arg_required_else_help(true)
        .disable_help_subcommand(true)
        .subcommand_required(true)
}

#[derive(Debug, PartialEq)]
pub enum CliCommand {
    Index(IndexCliCommand),
    Search(SearchArgs),
    Count(CountArgs),
}

impl CliCommand {
    pub fn default_log_level(&self) -> Level {
        match self {
            CliCommand::Index(subcommand) => subcommand.default_log_level(),
            CliCommand::Search(_) => Level::ERROR,
            CliCommand::Count(_) => Level::ERROR,
        }
    }

    pub fn parse_cli_args(mut matches: ArgMatches) -> anyhow::Result<Self> {
        let (subcommand, submatches) = matches
            .remove_subcommand()
            .context("failed to parse command")?;
        match subcommand.as_str() {
            "index" => IndexCliCommand::parse_cli_args(submatches).map(CliCommand::Index),
            "search" => SearchArgs::parse(submatches).map(CliCommand::Search),
            "count" => CountArgs::parse(submatches).map(CliCommand::Count),
            _ => bail!("unknown command `{subcommand}`"),
        }
    }

    pub async fn execute(self) -> anyhow::Result<()> {
        match self {
            CliCommand::Index(subcommand) => subcommand.execute().await,
            CliCommand::Search(args) => search_cli(args).await,
            CliCommand::Count(args) => count_cli(args).await,
        }
    }
}
