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

use anyhow::Context;
use colored::Colorize;
use tire_cli::cli::{build_cli, CliCommand};
use tire_cli::logger::setup_logging;
use tracing::error;

fn main() -> anyhow::Result<()> {
    let rt = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .thread_name("main_runtime_thread")
        .build()
        .context("failed to start main Tokio runtime")?;
    rt.block_on(main_impl())
}

async fn main_impl() -> anyhow::Result<()> {
    let matches = build_cli().get_matches();
    let ansi_colors = !matches.get_flag("no-color");
    if !ansi_colors {
        colored::control::set_override(false);
    }

    let command = match CliCommand::parse_cli_args(matches) {
        Ok(command) => command,
        Err(error) => {
            eprintln!("failed to parse command line arguments: {error:?}");
            std::process::exit(1);
        }
    };

    setup_logging(command.default_log_level(), ansi_colors)?;

    let return_code: i32 = if let Err(command_error) = command.execute().await {
        error!(error=%command_error, "command failed");
        eprintln!("{} command failed: {:?}\n", "✘".red(), command_error);
        1
    } else {
        0
    };
    std::process::exit(return_code)
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;
    use std::time::Duration;

    use reqwest::Url;
    use tire_cli::cli::{build_cli, CliCommand};
    use tire_cli::index::{CreateIndexArgs, ImportDocsArgs, IndexArgs, IndexCliCommand};
    use tire_cli::search::{CountArgs, FacetArg, SearchArgs};
    use tire_cli::ClientArgs;
    use tire_query::{SortClause, SortOrder};
    use tire_rest_client::Timeout;
    use tracing::Level;

    #[test]
    fn test_parse_create_args() -> anyhow::Result<()> {
        let app = build_cli().no_binary_name(true);
        let _ = app.try_get_matches_from(["index", "create"]).unwrap_err();

        let app = build_cli().no_binary_name(true);
        let matches = app.try_get_matches_from([
            "index",
            "create",
            "--index",
            "articles",
            "--mapping",
            "mapping.yaml",
        ])?;
        let command = CliCommand::parse_cli_args(matches)?;
        let expected_cmd = CliCommand::Index(IndexCliCommand::Create(CreateIndexArgs {
            client_args: ClientArgs::default(),
            index: "articles".to_string(),
            mapping_path: Some(PathBuf::from("mapping.yaml")),
        }));
        assert_eq!(command, expected_cmd);
        assert_eq!(command.default_log_level(), Level::INFO);
        Ok(())
    }

    #[test]
    fn test_parse_delete_args() -> anyhow::Result<()> {
        let app = build_cli().no_binary_name(true);
        let matches = app.try_get_matches_from([
            "index",
            "del",
            "--index",
            "articles",
            "--endpoint",
            "http://search.internal:9200",
            "--timeout",
            "30s",
        ])?;
        let command = CliCommand::parse_cli_args(matches)?;
        let expected_cmd = CliCommand::Index(IndexCliCommand::Delete(IndexArgs {
            client_args: ClientArgs {
                endpoint: Some(Url::parse("http://search.internal:9200")?),
                timeout: Some(Timeout::new(Duration::from_secs(30))),
                ..Default::default()
            },
            index: "articles".to_string(),
        }));
        assert_eq!(command, expected_cmd);
        Ok(())
    }

    #[test]
    fn test_parse_exists_args() -> anyhow::Result<()> {
        let app = build_cli().no_binary_name(true);
        let matches = app.try_get_matches_from([
            "index",
            "exists",
            "--index",
            "articles",
            "--timeout",
            "none",
        ])?;
        let command = CliCommand::parse_cli_args(matches)?;
        let expected_cmd = CliCommand::Index(IndexCliCommand::Exists(IndexArgs {
            client_args: ClientArgs {
                timeout: Some(Timeout::none()),
                ..Default::default()
            },
            index: "articles".to_string(),
        }));
        assert_eq!(command, expected_cmd);
        assert_eq!(command.default_log_level(), Level::ERROR);
        Ok(())
    }

    #[test]
    fn test_parse_import_args() -> anyhow::Result<()> {
        let app = build_cli().no_binary_name(true);
        let matches = app.try_get_matches_from([
            "index",
            "import",
            "--index",
            "articles",
            "--input-path",
            "/data/articles.ndjson",
            "--doc-type",
            "article",
        ])?;
        let command = CliCommand::parse_cli_args(matches)?;
        let expected_cmd = CliCommand::Index(IndexCliCommand::Import(ImportDocsArgs {
            client_args: ClientArgs::default(),
            index: "articles".to_string(),
            input_path: PathBuf::from("/data/articles.ndjson"),
            doc_type: Some("article".to_string()),
        }));
        assert_eq!(command, expected_cmd);
        Ok(())
    }

    #[test]
    fn test_parse_search_args() -> anyhow::Result<()> {
        let app = build_cli().no_binary_name(true);
        let _ = app
            .try_get_matches_from(["search", "--query", "rust"])
            .unwrap_err();

        let app = build_cli().no_binary_name(true);
        let matches = app.try_get_matches_from([
            "search",
            "--index",
            "articles,comments",
            "--index",
            "notes",
            "--query",
            "title:T*",
            "--term",
            "author=karel",
            "--filter-terms",
            "tags=ruby,python",
            "--facet",
            "all_tags=tags:global",
            "--sort",
            "title:desc",
            "--sort",
            "_score",
            "--highlight",
            "title",
            "--highlight-tag",
            "<b>",
            "--size",
            "10",
            "--from",
            "20",
            "--curl",
        ])?;
        let command = CliCommand::parse_cli_args(matches)?;
        let expected_cmd = CliCommand::Search(SearchArgs {
            client_args: ClientArgs::default(),
            indices: vec![
                "articles".to_string(),
                "comments".to_string(),
                "notes".to_string(),
            ],
            query: Some("title:T*".to_string()),
            terms: vec![("author".to_string(), "karel".to_string())],
            filter_terms: vec![(
                "tags".to_string(),
                vec!["ruby".to_string(), "python".to_string()],
            )],
            facets: vec![FacetArg {
                name: "all_tags".to_string(),
                field: "tags".to_string(),
                global: true,
            }],
            sort: vec![
                SortClause::new("title", SortOrder::Desc),
                SortClause::new("_score", SortOrder::Asc),
            ],
            highlight_fields: vec!["title".to_string()],
            highlight_tag: Some("<b>".to_string()),
            size: Some(10),
            from: Some(20),
            curl: true,
        });
        assert_eq!(command, expected_cmd);
        assert_eq!(command.default_log_level(), Level::ERROR);
        Ok(())
    }

    #[test]
    fn test_parse_search_args_rejects_invalid_sort() -> anyhow::Result<()> {
        let app = build_cli().no_binary_name(true);
        let matches = app.try_get_matches_from([
            "search",
            "--index",
            "articles",
            "--sort",
            "title:sideways",
        ])?;
        let error = CliCommand::parse_cli_args(matches).unwrap_err();
        assert!(error.to_string().contains("unknown sort order"));
        Ok(())
    }

    #[test]
    fn test_parse_count_args() -> anyhow::Result<()> {
        let app = build_cli().no_binary_name(true);
        let matches = app.try_get_matches_from([
            "count",
            "--index",
            "articles",
            "--connect-timeout",
            "2s",
        ])?;
        let command = CliCommand::parse_cli_args(matches)?;
        let expected_cmd = CliCommand::Count(CountArgs {
            client_args: ClientArgs {
                connect_timeout: Some(Timeout::from_secs(2)),
                ..Default::default()
            },
            indices: vec!["articles".to_string()],
            query: None,
        });
        assert_eq!(command, expected_cmd);
        Ok(())
    }
}
