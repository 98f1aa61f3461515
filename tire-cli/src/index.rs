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

use std::path::{Path, PathBuf};

use anyhow::{bail, Context};
use clap::{arg, ArgMatches, Command};
use colored::Colorize;
use serde_json::Value as JsonValue;
use tire_config::ConfigFormat;
use tracing::{debug, Level};

use crate::{bulk_options, ClientArgs};

pub fn build_index_command() -> Command {
    Command::new("index")
        .about("Manages indexes: creates, deletes, refreshes, imports documents...")
        .subcommand(
            Command::new("create")
                .display_order(1)
                .about("Creates an index, with optional settings and mappings.")
                .args(&[
                    arg!(--index <INDEX> "Name of the index.")
                        .display_order(1),
                    arg!(--mapping <MAPPING_FILE> "Location of the settings and mappings file (JSON, TOML or YAML).")
                        .required(false),
                ])
            )
        .subcommand(
            Command::new("delete")
                .display_order(2)
                .alias("del")
                .about("Deletes an index.")
                .long_about("Deletes an index and all its documents. This operation is destructive and cannot be undone, proceed with caution.")
                .args(&[
                    arg!(--index <INDEX> "Name of the target index.")
                        .display_order(1),
                ])
            )
        .subcommand(
            Command::new("refresh")
                .display_order(3)
                .about("Makes the documents indexed so far visible to searches.")
                .args(&[
                    arg!(--index <INDEX> "Name of the target index.")
                        .display_order(1),
                ])
            )
        .subcommand(
            Command::new("exists")
                .display_order(4)
                .about("Checks whether an index exists.")
                .args(&[
                    arg!(--index <INDEX> "Name of the target index.")
                        .display_order(1),
                ])
            )
        .subcommand(
            Command::new("import")
                .display_order(5)
                .about("Imports NDJSON documents with the bulk API.")
                .long_about("Reads NDJSON documents from a file and indexes them in batches. The document id is read from `_id` or `id`, its type from `_type` or `type`.")
                .args(&[
                    arg!(--index <INDEX> "Name of the target index.")
                        .display_order(1),
                    arg!(--"input-path" <INPUT_PATH> "Location of the NDJSON file.")
                        .display_order(2),
                    arg!(--"doc-type" <DOC_TYPE> "Type of the documents carrying none. Defaults to `document`.")
                        .required(false),
                ])
            )
        .arg_required_else_help(true)
}

#[derive(Debug, Eq, PartialEq)]
pub struct CreateIndexArgs {
    pub client_args: ClientArgs,
    pub index: String,
    pub mapping_path: Option<PathBuf>,
}

#[derive(Debug, Eq, PartialEq)]
pub struct IndexArgs {
    pub client_args: ClientArgs,
    pub index: String,
}

#[derive(Debug, Eq, PartialEq)]
pub struct ImportDocsArgs {
    pub client_args: ClientArgs,
    pub index: String,
    pub input_path: PathBuf,
    pub doc_type: Option<String>,
}

#[derive(Debug, Eq, PartialEq)]
pub enum IndexCliCommand {
    Create(CreateIndexArgs),
    Delete(IndexArgs),
    Refresh(IndexArgs),
    Exists(IndexArgs),
    Import(ImportDocsArgs),
}

impl IndexCliCommand {
    pub fn default_log_level(&self) -> Level {
        match self {
            Self::Exists(_) => Level::ERROR,
            _ => Level::INFO,
        }
    }

    pub fn parse_cli_args(mut matches: ArgMatches) -> anyhow::Result<Self> {
        let (subcommand, submatches) = matches
            .remove_subcommand()
            .context("failed to parse index subcommand")?;
        match subcommand.as_str() {
            "create" => Self::parse_create_args(submatches),
            "delete" => Self::parse_index_args(submatches).map(Self::Delete),
            "refresh" => Self::parse_index_args(submatches).map(Self::Refresh),
            "exists" => Self::parse_index_args(submatches).map(Self::Exists),
            "import" => Self::parse_import_args(submatches),
            _ => bail!("unknown index subcommand `{subcommand}`"),
        }
    }

    fn parse_create_args(mut matches: ArgMatches) -> anyhow::Result<Self> {
        let client_args = ClientArgs::parse(&mut matches)?;
        let index = matches
            .remove_one::<String>("index")
            .expect("`index` should be a required arg.");
        let mapping_path = matches.remove_one::<String>("mapping").map(PathBuf::from);
        Ok(Self::Create(CreateIndexArgs {
            client_args,
            index,
            mapping_path,
        }))
    }

    fn parse_index_args(mut matches: ArgMatches) -> anyhow::Result<IndexArgs> {
        let client_args = ClientArgs::parse(&mut matches)?;
        let index = matches
            .remove_one::<String>("index")
            .expect("`index` should be a required arg.");
        Ok(IndexArgs { client_args, index })
    }

    fn parse_import_args(mut matches: ArgMatches) -> anyhow::Result<Self> {
        let client_args = ClientArgs::parse(&mut matches)?;
        let index = matches
            .remove_one::<String>("index")
            .expect("`index` should be a required arg.");
        let input_path = matches
            .remove_one::<String>("input-path")
            .map(PathBuf::from)
            .expect("`input-path` should be a required arg.");
        let doc_type = matches.remove_one::<String>("doc-type");
        Ok(Self::Import(ImportDocsArgs {
            client_args,
            index,
            input_path,
            doc_type,
        }))
    }

    pub async fn execute(self) -> anyhow::Result<()> {
        match self {
            Self::Create(args) => create_index_cli(args).await,
            Self::Delete(args) => delete_index_cli(args).await,
            Self::Refresh(args) => refresh_index_cli(args).await,
            Self::Exists(args) => exists_index_cli(args).await,
            Self::Import(args) => import_docs_cli(args).await,
        }
    }
}

fn load_mapping(mapping_path: &Path) -> anyhow::Result<JsonValue> {
    let payload = std::fs::read(mapping_path).with_context(|| {
        format!("failed to read mapping file `{}`", mapping_path.display())
    })?;
    let config_format = ConfigFormat::sniff_from_path(mapping_path)?;
    config_format.parse(&payload)
}

pub async fn create_index_cli(args: CreateIndexArgs) -> anyhow::Result<()> {
    debug!(args=?args, "create-index");
    println!("❯ Creating index...");
    let settings_opt = args.mapping_path.as_deref().map(load_mapping).transpose()?;
    let client_config = args.client_args.load_config()?;
    let tire_client = args.client_args.client(&client_config)?;
    tire_client
        .indexes()
        .create(&args.index, settings_opt.as_ref())
        .await?;
    println!("{} Index `{}` successfully created.", "✔".green(), args.index);
    Ok(())
}

pub async fn delete_index_cli(args: IndexArgs) -> anyhow::Result<()> {
    debug!(args=?args, "delete-index");
    println!("❯ Deleting index...");
    let client_config = args.client_args.load_config()?;
    let tire_client = args.client_args.client(&client_config)?;
    tire_client.indexes().delete(&args.index).await?;
    println!("{} Index `{}` successfully deleted.", "✔".green(), args.index);
    Ok(())
}

pub async fn refresh_index_cli(args: IndexArgs) -> anyhow::Result<()> {
    debug!(args=?args, "refresh-index");
    let client_config = args.client_args.load_config()?;
    let tire_client = args.client_args.client(&client_config)?;
    tire_client.indexes().refresh(&args.index).await?;
    println!("{} Index `{}` refreshed.", "✔".green(), args.index);
    Ok(())
}

pub async fn exists_index_cli(args: IndexArgs) -> anyhow::Result<()> {
    debug!(args=?args, "exists-index");
    let client_config = args.client_args.load_config()?;
    let tire_client = args.client_args.client(&client_config)?;
    if tire_client.indexes().exists(&args.index).await? {
        println!("{} Index `{}` exists.", "✔".green(), args.index);
    } else {
        println!("{} Index `{}` does not exist.", "✘".red(), args.index);
    }
    Ok(())
}

pub async fn import_docs_cli(args: ImportDocsArgs) -> anyhow::Result<()> {
    debug!(args=?args, "import-docs");
    println!("❯ Importing documents...");
    let client_config = args.client_args.load_config()?;
    let tire_client = args.client_args.client(&client_config)?;
    let bulk_options = bulk_options(&client_config, args.doc_type);
    let report = tire_client
        .documents(&args.index)
        .bulk_import_file(&args.input_path, bulk_options)
        .await?;
    println!(
        "{} {} documents indexed in {} batches.",
        "✔".green(),
        report.num_docs_indexed(),
        report.num_batches
    );
    if report.num_docs_failed > 0 {
        println!(
            "{} {} documents rejected by the search engine.",
            "✘".red(),
            report.num_docs_failed
        );
    }
    if report.num_docs_skipped > 0 {
        println!(
            "{} {} documents skipped because they exceed the batch size limit.",
            "✘".red(),
            report.num_docs_skipped
        );
    }
    Ok(())
}
