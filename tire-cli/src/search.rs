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

use std::str::FromStr;

use anyhow::{bail, Context};
use clap::{arg, ArgAction, ArgMatches, Command};
use itertools::Itertools;
use serde_json::{json, Map as JsonMap, Value as JsonValue};
use tire_query::{
    FacetDefinition, FilterClause, Highlight, HighlightOptions, QueryClause, ResultSet,
    SearchRequest, SearchResult, SortClause, SortOrder,
};
use tracing::debug;

use crate::ClientArgs;

pub fn build_search_command() -> Command {
    Command::new("search")
        .about("Searches one or several indexes.")
        .long_about("Builds a search request from the arguments and prints the hits, the total and the facets. With `--curl`, prints the equivalent curl command instead of running the search.")
        .args(&[
            arg!(--index <INDEX> "Name of the target index. Repeat the flag or separate names with commas to search several indexes.")
                .action(ArgAction::Append)
                .value_delimiter(',')
                .display_order(1),
            arg!(--query <QUERY> "Query in the Lucene query string syntax, e.g. `title:T*`.")
                .required(false)
                .display_order(2),
            arg!(--term <FIELD_VALUE> "Exact term query, e.g. `tags=rust`. Several term queries must all match.")
                .required(false)
                .action(ArgAction::Append),
            arg!(--"filter-terms" <FIELD_VALUES> "Terms filter, e.g. `tags=rust,python`. Filters are ANDed.")
                .required(false)
                .action(ArgAction::Append),
            arg!(--facet <FACET> "Terms facet, e.g. `tags=tags` or `all_tags=tags:global`.")
                .required(false)
                .action(ArgAction::Append),
            arg!(--sort <SORT> "Sort criterion, e.g. `title` or `published_on:desc`.")
                .required(false)
                .action(ArgAction::Append),
            arg!(--highlight <FIELD> "Field to highlight.")
                .required(false)
                .action(ArgAction::Append),
            arg!(--"highlight-tag" <TAG> "Tag wrapping highlighted fragments. Defaults to `<b>`.")
                .required(false),
            arg!(--size <SIZE> "Maximum number of hits returned.")
                .required(false)
                .value_parser(clap::value_parser!(u64)),
            arg!(--from <FROM> "Offset of the first hit returned.")
                .required(false)
                .value_parser(clap::value_parser!(u64)),
            arg!(--curl "Prints the curl command reproducing the search without running it.")
                .required(false),
        ])
}

pub fn build_count_command() -> Command {
    Command::new("count")
        .about("Counts the documents matching a query.")
        .args(&[
            arg!(--index <INDEX> "Name of the target index. Repeat the flag or separate names with commas to count over several indexes.")
                .action(ArgAction::Append)
                .value_delimiter(',')
                .display_order(1),
            arg!(--query <QUERY> "Query in the Lucene query string syntax. Counts all the documents when omitted.")
                .required(false)
                .display_order(2),
        ])
}

/// Terms facet requested on the command line as `name=field[:global]`.
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct FacetArg {
    pub name: String,
    pub field: String,
    pub global: bool,
}

impl FromStr for FacetArg {
    type Err = anyhow::Error;

    fn from_str(facet_str: &str) -> anyhow::Result<Self> {
        let (name, field_spec) = split_key_value(facet_str)
            .with_context(|| format!("invalid facet `{facet_str}`, expected `name=field[:global]`"))?;
        let (field, global) = match field_spec.split_once(':') {
            Some((field, "global")) => (field, true),
            Some((_, scope)) => bail!("unknown facet scope `{scope}`, expected `global`"),
            None => (field_spec, false),
        };
        if field.is_empty() {
            bail!("facet `{name}` has no field");
        }
        Ok(FacetArg {
            name: name.to_string(),
            field: field.to_string(),
            global,
        })
    }
}

fn split_key_value(key_value: &str) -> anyhow::Result<(&str, &str)> {
    let Some((key, value)) = key_value.split_once('=') else {
        bail!("missing `=` in `{key_value}`");
    };
    let key = key.trim();
    if key.is_empty() {
        bail!("empty field name in `{key_value}`");
    }
    Ok((key, value.trim()))
}

fn parse_term(term_str: &str) -> anyhow::Result<(String, String)> {
    let (field, value) = split_key_value(term_str)
        .with_context(|| format!("invalid term `{term_str}`, expected `field=value`"))?;
    Ok((field.to_string(), value.to_string()))
}

fn parse_filter_terms(filter_str: &str) -> anyhow::Result<(String, Vec<String>)> {
    let (field, values) = split_key_value(filter_str).with_context(|| {
        format!("invalid terms filter `{filter_str}`, expected `field=value1,value2`")
    })?;
    let values: Vec<String> = values
        .split(',')
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .map(str::to_string)
        .collect();
    if values.is_empty() {
        bail!("terms filter on `{field}` has no values");
    }
    Ok((field.to_string(), values))
}

fn parse_sort(sort_str: &str) -> anyhow::Result<SortClause> {
    let (field, order) = match sort_str.rsplit_once(':') {
        Some((field, order_str)) => {
            let order = SortOrder::from_str(order_str).map_err(anyhow::Error::msg)?;
            (field, order)
        }
        None => (sort_str, SortOrder::default()),
    };
    if field.is_empty() {
        bail!("invalid sort `{sort_str}`, expected `field[:asc|desc]`");
    }
    Ok(SortClause::new(field, order))
}

#[derive(Debug, Default, Eq, PartialEq)]
pub struct SearchArgs {
    pub client_args: ClientArgs,
    pub indices: Vec<String>,
    pub query: Option<String>,
    pub terms: Vec<(String, String)>,
    pub filter_terms: Vec<(String, Vec<String>)>,
    pub facets: Vec<FacetArg>,
    pub sort: Vec<SortClause>,
    pub highlight_fields: Vec<String>,
    pub highlight_tag: Option<String>,
    pub size: Option<u64>,
    pub from: Option<u64>,
    pub curl: bool,
}

#[derive(Debug, Default, Eq, PartialEq)]
pub struct CountArgs {
    pub client_args: ClientArgs,
    pub indices: Vec<String>,
    pub query: Option<String>,
}

fn remove_all(matches: &mut ArgMatches, id: &str) -> Vec<String> {
    matches
        .remove_many::<String>(id)
        .map(|values| values.collect())
        .unwrap_or_default()
}

fn parse_indices(matches: &mut ArgMatches) -> Vec<String> {
    remove_all(matches, "index")
        .into_iter()
        .map(|index| index.trim().to_string())
        .filter(|index| !index.is_empty())
        .collect()
}

impl SearchArgs {
    pub fn parse(mut matches: ArgMatches) -> anyhow::Result<Self> {
        let client_args = ClientArgs::parse(&mut matches)?;
        let indices = parse_indices(&mut matches);
        let query = matches.remove_one::<String>("query");
        let terms = remove_all(&mut matches, "term")
            .iter()
            .map(|term_str| parse_term(term_str))
            .collect::<anyhow::Result<_>>()?;
        let filter_terms = remove_all(&mut matches, "filter-terms")
            .iter()
            .map(|filter_str| parse_filter_terms(filter_str))
            .collect::<anyhow::Result<_>>()?;
        let facets = remove_all(&mut matches, "facet")
            .iter()
            .map(|facet_str| FacetArg::from_str(facet_str))
            .collect::<anyhow::Result<_>>()?;
        let sort = remove_all(&mut matches, "sort")
            .iter()
            .map(|sort_str| parse_sort(sort_str))
            .collect::<anyhow::Result<_>>()?;
        let highlight_fields = remove_all(&mut matches, "highlight");
        let highlight_tag = matches.remove_one::<String>("highlight-tag");
        let size = matches.remove_one::<u64>("size");
        let from = matches.remove_one::<u64>("from");
        let curl = matches.get_flag("curl");
        Ok(SearchArgs {
            client_args,
            indices,
            query,
            terms,
            filter_terms,
            facets,
            sort,
            highlight_fields,
            highlight_tag,
            size,
            from,
            curl,
        })
    }
}

impl CountArgs {
    pub fn parse(mut matches: ArgMatches) -> anyhow::Result<Self> {
        let client_args = ClientArgs::parse(&mut matches)?;
        let indices = parse_indices(&mut matches);
        let query = matches.remove_one::<String>("query");
        Ok(CountArgs {
            client_args,
            indices,
            query,
        })
    }
}

/// Combines the query string and the term queries. A single clause is used as is, several are
/// wrapped in a `bool` query where they all must match.
fn build_query(
    query_string_opt: Option<&str>,
    terms: &[(String, String)],
) -> Option<QueryClause> {
    let mut clauses: Vec<QueryClause> = Vec::new();
    if let Some(query_string) = query_string_opt {
        clauses.push(QueryClause::string(query_string).into());
    }
    for (field, value) in terms {
        clauses.push(QueryClause::term(field, value.as_str()).into());
    }
    if clauses.len() <= 1 {
        return clauses.pop();
    }
    let bool_query = clauses
        .into_iter()
        .fold(QueryClause::boolean(), |bool_query, clause| bool_query.must(clause));
    Some(bool_query.into())
}

pub fn build_search_request(args: &SearchArgs) -> anyhow::Result<SearchRequest> {
    let mut builder = SearchRequest::builder();
    if let Some(query) = build_query(args.query.as_deref(), &args.terms) {
        builder.query(query)?;
    }
    for (field, values) in &args.filter_terms {
        builder.filter(FilterClause::terms(field, values.iter().map(String::as_str)));
    }
    for facet in &args.facets {
        builder.facet(
            &facet.name,
            FacetDefinition::terms(&facet.field).global(facet.global),
        )?;
    }
    for sort_clause in &args.sort {
        builder.sort_by(&sort_clause.field, sort_clause.order);
    }
    if !args.highlight_fields.is_empty() {
        let mut highlight = Highlight::new(args.highlight_fields.iter());
        if let Some(tag) = &args.highlight_tag {
            highlight = highlight.options(HighlightOptions::default().tag(tag));
        }
        builder.highlight(highlight);
    }
    if let Some(size) = args.size {
        builder.size(size);
    }
    if let Some(from) = args.from {
        builder.from(from);
    }
    Ok(builder.build())
}

fn hit_json(search_result: &SearchResult) -> JsonValue {
    let mut hit = json!({
        "_id": search_result.id(),
        "_score": search_result.score(),
        "attributes": search_result.attributes(),
    });
    if let Some(highlights) = search_result.highlights() {
        hit["highlight"] = json!(highlights);
    }
    hit
}

pub fn result_set_json(result_set: &ResultSet) -> JsonValue {
    let hits: Vec<JsonValue> = result_set.iter().map(hit_json).collect();
    let facets: JsonMap<String, JsonValue> = result_set
        .facets()
        .iter()
        .map(|(name, facet)| (name.clone(), facet.payload().clone()))
        .collect();
    json!({
        "total": result_set.total(),
        "took": result_set.took(),
        "max_score": result_set.max_score(),
        "hits": hits,
        "facets": facets,
    })
}

pub async fn search(args: &SearchArgs) -> anyhow::Result<ResultSet> {
    let search_request = build_search_request(args)?;
    let client_config = args.client_args.load_config()?;
    let tire_client = args.client_args.client(&client_config)?;
    let result_set = tire_client.search(&args.indices[..], &search_request).await?;
    Ok(result_set)
}

pub async fn search_cli(args: SearchArgs) -> anyhow::Result<()> {
    debug!(args=?args, "search");
    if args.curl {
        let search_request = build_search_request(&args)?;
        let client_config = args.client_args.load_config()?;
        let tire_client = args.client_args.client(&client_config)?;
        println!("{}", tire_client.search_curl(&args.indices[..], &search_request)?);
        return Ok(());
    }
    let result_set = search(&args).await?;
    debug!(
        indices=%args.indices.iter().join(","),
        num_hits=result_set.len(),
        "search done"
    );
    let result_set_json = serde_json::to_string_pretty(&result_set_json(&result_set))?;
    println!("{result_set_json}");
    Ok(())
}

pub async fn count_cli(args: CountArgs) -> anyhow::Result<()> {
    debug!(args=?args, "count");
    let query_opt = args
        .query
        .as_deref()
        .map(|query_string| QueryClause::from(QueryClause::string(query_string)));
    let client_config = args.client_args.load_config()?;
    let tire_client = args.client_args.client(&client_config)?;
    let count = tire_client.count(&args.indices[..], query_opt.as_ref()).await?;
    println!("{count}");
    Ok(())
}
