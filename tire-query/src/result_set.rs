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

use std::collections::BTreeMap;

use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::{Map as JsonMap, Value as JsonValue};
use tracing::{debug, warn};

use crate::{JsonLiteral, MalformedResponse, SearchRequest};

/// Attributes synthesized from the hit metadata, next to the document fields.
const HIT_METADATA_KEYS: [&str; 5] = ["_score", "_id", "_type", "_index", "_version"];

/// One matched document.
#[derive(Debug, Clone, PartialEq)]
pub struct SearchResult {
    attributes: JsonMap<String, JsonValue>,
    score: Option<f64>,
    highlight: Option<BTreeMap<String, Vec<String>>>,
    sort_values: Option<Vec<JsonValue>>,
}

impl SearchResult {
    /// Builds a result out of a hit (or a fetched document) of the shape
    /// `{"_id": .., "_score": .., "_source": {..}, "fields": {..}, "highlight": {..}}`.
    ///
    /// The attributes are the `_source` object, overlaid with the stored `fields` and the hit
    /// metadata. The `highlight` mapping is only read when `with_highlight` is true.
    pub fn from_hit(hit: JsonValue, with_highlight: bool) -> Result<Self, MalformedResponse> {
        Self::parse_hit(hit, with_highlight)
            .map_err(|reason| MalformedResponse::InvalidDocument { reason })
    }

    fn parse_hit(hit: JsonValue, with_highlight: bool) -> Result<Self, String> {
        let JsonValue::Object(mut hit_obj) = hit else {
            return Err("expected a JSON object".to_string());
        };
        let mut attributes = match hit_obj.remove("_source") {
            Some(JsonValue::Object(source)) => source,
            Some(JsonValue::Null) | None => JsonMap::new(),
            Some(_) => return Err("`_source` is not a JSON object".to_string()),
        };
        match hit_obj.remove("fields") {
            Some(JsonValue::Object(fields)) => attributes.extend(fields),
            Some(JsonValue::Null) | None => {}
            Some(_) => return Err("`fields` is not a JSON object".to_string()),
        }
        let score = match hit_obj.get("_score") {
            Some(JsonValue::Number(score)) => score.as_f64(),
            Some(JsonValue::Null) | None => None,
            Some(_) => return Err("`_score` is not a number".to_string()),
        };
        for key in HIT_METADATA_KEYS {
            if let Some(value) = hit_obj.get(key) {
                if !value.is_null() {
                    attributes.insert(key.to_string(), value.clone());
                }
            }
        }
        let highlight = if with_highlight {
            parse_highlight(hit_obj.remove("highlight"))?
        } else {
            None
        };
        let sort_values = match hit_obj.remove("sort") {
            Some(JsonValue::Array(sort_values)) => Some(sort_values),
            _ => None,
        };
        Ok(SearchResult {
            attributes,
            score,
            highlight,
            sort_values,
        })
    }

    pub fn id(&self) -> Option<&str> {
        self.attributes.get("_id").and_then(JsonValue::as_str)
    }

    pub fn index(&self) -> Option<&str> {
        self.attributes.get("_index").and_then(JsonValue::as_str)
    }

    pub fn doc_type(&self) -> Option<&str> {
        self.attributes.get("_type").and_then(JsonValue::as_str)
    }

    /// Relevance score. Absent when hits are sorted on a field other than `_score`.
    pub fn score(&self) -> Option<f64> {
        self.score
    }

    pub fn get(&self, attribute: &str) -> Option<&JsonValue> {
        self.attributes.get(attribute)
    }

    pub fn attributes(&self) -> &JsonMap<String, JsonValue> {
        &self.attributes
    }

    /// Highlighted fragments of `field`, if the engine returned some for this hit.
    pub fn highlight(&self, field: &str) -> Option<&[String]> {
        self.highlight
            .as_ref()?
            .get(field)
            .map(|fragments| fragments.as_slice())
    }

    pub fn highlights(&self) -> Option<&BTreeMap<String, Vec<String>>> {
        self.highlight.as_ref()
    }

    pub fn sort_values(&self) -> Option<&[JsonValue]> {
        self.sort_values.as_deref()
    }

    /// Deserializes the attributes into `T`. Unknown attributes, such as the hit metadata, are
    /// ignored unless `T` denies them.
    pub fn deserialize<T: DeserializeOwned>(&self) -> serde_json::Result<T> {
        serde_json::from_value(JsonValue::Object(self.attributes.clone()))
    }
}

fn parse_highlight(
    highlight_opt: Option<JsonValue>,
) -> Result<Option<BTreeMap<String, Vec<String>>>, String> {
    let highlight_obj = match highlight_opt {
        Some(JsonValue::Object(highlight_obj)) => highlight_obj,
        Some(JsonValue::Null) | None => return Ok(None),
        Some(_) => return Err("`highlight` is not a JSON object".to_string()),
    };
    let mut highlight = BTreeMap::new();
    for (field, fragments) in highlight_obj {
        let fragments: Vec<String> = serde_json::from_value(fragments)
            .map_err(|error| format!("highlight of `{field}` is not a list of strings: {error}"))?;
        highlight.insert(field, fragments);
    }
    Ok(Some(highlight))
}

#[derive(Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct TermCount {
    pub term: JsonLiteral,
    pub count: u64,
}

#[derive(Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct DateCount {
    /// Milliseconds since epoch.
    pub time: i64,
    pub count: u64,
}

/// Aggregation payload of a facet, as returned by the engine.
///
/// Counts are read as is, never recomputed.
#[derive(Debug, Clone, PartialEq)]
pub struct FacetResult {
    name: String,
    payload: JsonValue,
}

impl FacetResult {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn payload(&self) -> &JsonValue {
        &self.payload
    }

    /// `terms`, `date_histogram`...
    pub fn facet_type(&self) -> Option<&str> {
        self.payload.get("_type").and_then(JsonValue::as_str)
    }

    pub fn total(&self) -> Option<u64> {
        self.payload.get("total").and_then(JsonValue::as_u64)
    }

    pub fn missing(&self) -> Option<u64> {
        self.payload.get("missing").and_then(JsonValue::as_u64)
    }

    pub fn other(&self) -> Option<u64> {
        self.payload.get("other").and_then(JsonValue::as_u64)
    }

    /// `[{"term": "ruby", "count": 2}, ..]` entries of a terms facet.
    pub fn terms(&self) -> Result<Vec<TermCount>, MalformedResponse> {
        self.read_list("terms")
    }

    /// `[{"time": 1317427200000, "count": 2}, ..]` entries of a date histogram facet.
    pub fn entries(&self) -> Result<Vec<DateCount>, MalformedResponse> {
        self.read_list("entries")
    }

    fn read_list<T: DeserializeOwned>(&self, key: &str) -> Result<Vec<T>, MalformedResponse> {
        let list = self
            .payload
            .get(key)
            .ok_or_else(|| MalformedResponse::InvalidFacet {
                name: self.name.clone(),
                reason: format!("missing `{key}`"),
            })?;
        Vec::<T>::deserialize(list).map_err(|error| MalformedResponse::InvalidFacet {
            name: self.name.clone(),
            reason: error.to_string(),
        })
    }
}

/// Materialized search response.
#[derive(Debug, Clone, PartialEq)]
pub struct ResultSet {
    results: Vec<SearchResult>,
    total: u64,
    took: Option<u64>,
    max_score: Option<f64>,
    facets: BTreeMap<String, FacetResult>,
}

impl ResultSet {
    /// Materializes the response of `request`.
    ///
    /// Fails if the `hits` section is absent or if `hits.hits` is not a list. A response with no
    /// hits yields an empty result set.
    pub fn from_response(
        response: JsonValue,
        request: &SearchRequest,
    ) -> Result<ResultSet, MalformedResponse> {
        let JsonValue::Object(mut response_obj) = response else {
            return Err(MalformedResponse::MissingHits);
        };
        let JsonValue::Object(mut hits_obj) = response_obj
            .remove("hits")
            .ok_or(MalformedResponse::MissingHits)?
        else {
            return Err(MalformedResponse::MissingHits);
        };
        let Some(JsonValue::Array(hits)) = hits_obj.remove("hits") else {
            return Err(MalformedResponse::HitsNotAList);
        };
        let with_highlight = request.highlight().is_some();
        let results = hits
            .into_iter()
            .enumerate()
            .map(|(position, hit)| {
                SearchResult::parse_hit(hit, with_highlight)
                    .map_err(|reason| MalformedResponse::InvalidHit { position, reason })
            })
            .collect::<Result<Vec<SearchResult>, MalformedResponse>>()?;
        let total = parse_total(hits_obj.get("total")).unwrap_or(results.len() as u64);
        let max_score = hits_obj.get("max_score").and_then(JsonValue::as_f64);
        let took = response_obj.get("took").and_then(JsonValue::as_u64);

        let mut facets = BTreeMap::new();
        if let Some(JsonValue::Object(facets_obj)) = response_obj.remove("facets") {
            for (name, payload) in facets_obj {
                if !request.facets().contains(&name) {
                    warn!(facet=%name, "response contains a facet that was not requested");
                }
                facets.insert(name.clone(), FacetResult { name, payload });
            }
        }
        debug!(
            num_hits = results.len(),
            total,
            num_facets = facets.len(),
            "materialized search response"
        );
        Ok(ResultSet {
            results,
            total,
            took,
            max_score,
            facets,
        })
    }

    /// Number of materialized results.
    pub fn count(&self) -> usize {
        self.results.len()
    }

    pub fn len(&self) -> usize {
        self.results.len()
    }

    pub fn is_empty(&self) -> bool {
        self.results.is_empty()
    }

    /// Total number of documents matching the query, which can exceed [`ResultSet::count`] when
    /// the results are paginated.
    pub fn total(&self) -> u64 {
        self.total
    }

    pub fn took(&self) -> Option<u64> {
        self.took
    }

    pub fn max_score(&self) -> Option<f64> {
        self.max_score
    }

    pub fn results(&self) -> &[SearchResult] {
        &self.results
    }

    pub fn get(&self, position: usize) -> Option<&SearchResult> {
        self.results.get(position)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, SearchResult> {
        self.results.iter()
    }

    pub fn facets(&self) -> &BTreeMap<String, FacetResult> {
        &self.facets
    }

    pub fn facet(&self, name: &str) -> Option<&FacetResult> {
        self.facets.get(name)
    }
}

fn parse_total(total_opt: Option<&JsonValue>) -> Option<u64> {
    match total_opt? {
        JsonValue::Number(total) => total.as_u64(),
        JsonValue::Object(total_obj) => total_obj.get("value").and_then(JsonValue::as_u64),
        _ => None,
    }
}

impl IntoIterator for ResultSet {
    type Item = SearchResult;
    type IntoIter = std::vec::IntoIter<SearchResult>;

    fn into_iter(self) -> Self::IntoIter {
        self.results.into_iter()
    }
}

impl<'a> IntoIterator for &'a ResultSet {
    type Item = &'a SearchResult;
    type IntoIter = std::slice::Iter<'a, SearchResult>;

    fn into_iter(self) -> Self::IntoIter {
        self.results.iter()
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::{FacetDefinition, Highlight, QueryClause};

    fn highlight_request() -> SearchRequest {
        let mut builder = SearchRequest::builder();
        builder
            .query(QueryClause::string("title:T*"))
            .unwrap()
            .facet("tags", FacetDefinition::terms("tags"))
            .unwrap()
            .highlight(Highlight::new(["title"]));
        builder.build()
    }

    fn articles_response() -> JsonValue {
        json!({
            "took": 3,
            "timed_out": false,
            "_shards": {"total": 5, "successful": 5, "failed": 0},
            "hits": {
                "total": 2,
                "max_score": 1.0,
                "hits": [
                    {
                        "_index": "articles",
                        "_type": "article",
                        "_id": "2",
                        "_score": 1.0,
                        "_source": {"title": "Two", "tags": ["ruby", "python"]},
                        "highlight": {"title": ["<b>Two</b>"]}
                    },
                    {
                        "_index": "articles",
                        "_type": "article",
                        "_id": "3",
                        "_score": 0.5,
                        "_source": {"title": "Three", "tags": ["java"]}
                    }
                ]
            },
            "facets": {
                "tags": {
                    "_type": "terms",
                    "missing": 0,
                    "total": 3,
                    "other": 0,
                    "terms": [
                        {"term": "ruby", "count": 1},
                        {"term": "python", "count": 1},
                        {"term": "java", "count": 1}
                    ]
                }
            }
        })
    }

    #[test]
    fn test_result_set_preserves_hit_order() {
        let result_set = ResultSet::from_response(articles_response(), &highlight_request()).unwrap();
        assert_eq!(result_set.count(), 2);
        assert_eq!(result_set.total(), 2);
        assert_eq!(result_set.took(), Some(3));
        assert_eq!(result_set.max_score(), Some(1.0));
        let ids: Vec<&str> = result_set.iter().map(|result| result.id().unwrap()).collect();
        assert_eq!(ids, ["2", "3"]);
        let titles: Vec<&str> = result_set
            .iter()
            .map(|result| result.get("title").unwrap().as_str().unwrap())
            .collect();
        assert_eq!(titles, ["Two", "Three"]);
    }

    #[test]
    fn test_result_attributes_include_score_and_metadata() {
        let result_set = ResultSet::from_response(articles_response(), &highlight_request()).unwrap();
        let first = result_set.get(0).unwrap();
        assert_eq!(first.score(), Some(1.0));
        assert_eq!(first.get("_score"), Some(&json!(1.0)));
        assert_eq!(first.index(), Some("articles"));
        assert_eq!(first.doc_type(), Some("article"));
        assert_eq!(first.get("tags"), Some(&json!(["ruby", "python"])));
    }

    #[test]
    fn test_highlight_only_on_hits_that_have_one() {
        let result_set = ResultSet::from_response(articles_response(), &highlight_request()).unwrap();
        assert_eq!(
            result_set.get(0).unwrap().highlight("title").unwrap(),
            &["<b>Two</b>".to_string()]
        );
        assert!(result_set.get(0).unwrap().highlight("body").is_none());
        assert!(result_set.get(1).unwrap().highlight("title").is_none());
    }

    #[test]
    fn test_highlight_ignored_when_not_requested() {
        let search_request = SearchRequest::builder().build();
        let result_set = ResultSet::from_response(articles_response(), &search_request).unwrap();
        assert!(result_set.get(0).unwrap().highlights().is_none());
    }

    #[test]
    fn test_facets_are_copied_verbatim() {
        let response = articles_response();
        let expected_payload = response["facets"]["tags"].clone();
        let result_set = ResultSet::from_response(response, &highlight_request()).unwrap();
        assert_eq!(result_set.facets().len(), 1);
        let tags_facet = result_set.facet("tags").unwrap();
        assert_eq!(tags_facet.payload(), &expected_payload);
        assert_eq!(tags_facet.facet_type(), Some("terms"));
        assert_eq!(tags_facet.total(), Some(3));
        let terms = tags_facet.terms().unwrap();
        assert_eq!(
            terms[0],
            TermCount {
                term: JsonLiteral::from("ruby"),
                count: 1
            }
        );
        assert_eq!(terms.len(), 3);
        assert!(matches!(
            tags_facet.entries(),
            Err(MalformedResponse::InvalidFacet { .. })
        ));
    }

    #[test]
    fn test_date_histogram_entries() {
        let response = json!({
            "hits": {"total": 0, "hits": []},
            "facets": {
                "timeline": {
                    "_type": "date_histogram",
                    "entries": [
                        {"time": 1317427200000i64, "count": 2},
                        {"time": 1320105600000i64, "count": 1}
                    ]
                }
            }
        });
        let mut builder = SearchRequest::builder();
        builder
            .facet(
                "timeline",
                FacetDefinition::date_histogram("published_on", "month"),
            )
            .unwrap();
        let result_set = ResultSet::from_response(response, &builder.build()).unwrap();
        let entries = result_set.facet("timeline").unwrap().entries().unwrap();
        assert_eq!(
            entries,
            [
                DateCount {
                    time: 1317427200000,
                    count: 2
                },
                DateCount {
                    time: 1320105600000,
                    count: 1
                }
            ]
        );
    }

    #[test]
    fn test_missing_hits_is_malformed() {
        let search_request = SearchRequest::builder().build();
        let error = ResultSet::from_response(json!({"took": 1}), &search_request).unwrap_err();
        assert_eq!(error, MalformedResponse::MissingHits);
        let error = ResultSet::from_response(json!([]), &search_request).unwrap_err();
        assert_eq!(error, MalformedResponse::MissingHits);
    }

    #[test]
    fn test_hits_not_a_list_is_malformed() {
        let search_request = SearchRequest::builder().build();
        let error =
            ResultSet::from_response(json!({"hits": {"total": 1, "hits": {}}}), &search_request)
                .unwrap_err();
        assert_eq!(error, MalformedResponse::HitsNotAList);
        let error = ResultSet::from_response(json!({"hits": {"total": 1}}), &search_request)
            .unwrap_err();
        assert_eq!(error, MalformedResponse::HitsNotAList);
    }

    #[test]
    fn test_invalid_hit_reports_its_position() {
        let search_request = SearchRequest::builder().build();
        let response = json!({"hits": {"hits": [{"_id": "1"}, "not-a-hit"]}});
        let error = ResultSet::from_response(response, &search_request).unwrap_err();
        assert!(matches!(error, MalformedResponse::InvalidHit { position: 1, .. }));
    }

    #[test]
    fn test_from_hit_returns_a_typed_error() {
        let document = json!({"_id": "1", "_source": {"title": "One"}});
        let result = SearchResult::from_hit(document, false).unwrap();
        assert_eq!(result.id(), Some("1"));
        assert_eq!(result.get("title"), Some(&json!("One")));

        let error = SearchResult::from_hit(json!(["not", "a", "document"]), false).unwrap_err();
        assert_eq!(
            error,
            MalformedResponse::InvalidDocument {
                reason: "expected a JSON object".to_string()
            }
        );
        let error = SearchResult::from_hit(json!({"_id": "1", "_source": 3}), false).unwrap_err();
        assert!(matches!(error, MalformedResponse::InvalidDocument { .. }));
        assert_eq!(
            error.to_string(),
            "document is invalid: `_source` is not a JSON object"
        );
    }

    #[test]
    fn test_zero_hits_is_an_empty_result_set() {
        let search_request = SearchRequest::builder().build();
        let response = json!({"took": 1, "hits": {"total": 0, "max_score": null, "hits": []}});
        let result_set = ResultSet::from_response(response, &search_request).unwrap();
        assert!(result_set.is_empty());
        assert_eq!(result_set.total(), 0);
        assert!(result_set.max_score().is_none());
        assert!(result_set.facets().is_empty());
    }

    #[test]
    fn test_total_as_object_and_stored_fields() {
        let search_request = SearchRequest::builder().build();
        let response = json!({
            "hits": {
                "total": {"value": 42, "relation": "eq"},
                "hits": [{"_id": "1", "fields": {"title": ["One"]}, "sort": ["One"]}]
            }
        });
        let result_set = ResultSet::from_response(response, &search_request).unwrap();
        assert_eq!(result_set.total(), 42);
        let result = result_set.into_iter().next().unwrap();
        assert_eq!(result.get("title"), Some(&json!(["One"])));
        assert_eq!(result.sort_values().unwrap(), &[json!("One")]);
        assert!(result.score().is_none());
    }

    #[test]
    fn test_deserialize_result_attributes() {
        #[derive(Deserialize)]
        struct Article {
            title: String,
            tags: Vec<String>,
        }
        let result_set = ResultSet::from_response(articles_response(), &highlight_request()).unwrap();
        let article: Article = result_set.get(0).unwrap().deserialize().unwrap();
        assert_eq!(article.title, "Two");
        assert_eq!(article.tags, ["ruby", "python"]);
    }
}
