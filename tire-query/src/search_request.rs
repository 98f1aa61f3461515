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

use serde::ser::SerializeMap;
use serde::{Serialize, Serializer};
use tracing::debug;

use crate::filter::serialize_filters;
use crate::{
    ConfigurationError, FacetDefinition, FilterClause, Highlight, QueryClause, SortClause,
    SortOrder,
};

/// What to do when a query clause is set on a builder that already has one.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub enum QueryOverride {
    /// The last query clause replaces the previous one.
    #[default]
    LastWriteWins,
    /// Setting a second query clause fails with [`ConfigurationError::QueryAlreadySet`].
    Reject,
}

/// Facet definitions of a request, keyed by their unique name, in registration order.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct Facets(Vec<(String, FacetDefinition)>);

impl Facets {
    pub fn get(&self, name: &str) -> Option<&FacetDefinition> {
        self.0
            .iter()
            .find(|(facet_name, _)| facet_name == name)
            .map(|(_, definition)| definition)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(|(name, _)| name.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &FacetDefinition)> {
        self.0
            .iter()
            .map(|(name, definition)| (name.as_str(), definition))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl Serialize for Facets {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.0.len()))?;
        for (name, definition) in &self.0 {
            map.serialize_entry(name, definition)?;
        }
        map.end()
    }
}

/// A composite search request, ready to be sent to the engine.
///
/// It is produced by [`SearchRequestBuilder::build`] and cannot be modified afterwards.
#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct SearchRequest {
    query: QueryClause,
    #[serde(rename = "filter")]
    #[serde(skip_serializing_if = "Vec::is_empty")]
    #[serde(serialize_with = "serialize_filters")]
    filters: Vec<FilterClause>,
    #[serde(skip_serializing_if = "Facets::is_empty")]
    facets: Facets,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    sort: Vec<SortClause>,
    #[serde(skip_serializing_if = "Option::is_none")]
    highlight: Option<Highlight>,
    #[serde(skip_serializing_if = "Option::is_none")]
    from: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    size: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    fields: Option<Vec<String>>,
}

impl SearchRequest {
    pub fn builder() -> SearchRequestBuilder {
        SearchRequestBuilder::default()
    }

    /// Query clause of the request. A request built without a query matches all documents.
    pub fn query(&self) -> &QueryClause {
        &self.query
    }

    pub fn filters(&self) -> &[FilterClause] {
        &self.filters
    }

    pub fn facets(&self) -> &Facets {
        &self.facets
    }

    pub fn sort(&self) -> &[SortClause] {
        &self.sort
    }

    pub fn highlight(&self) -> Option<&Highlight> {
        self.highlight.as_ref()
    }

    pub fn from(&self) -> Option<u64> {
        self.from
    }

    pub fn size(&self) -> Option<u64> {
        self.size
    }

    pub fn fields(&self) -> Option<&[String]> {
        self.fields.as_deref()
    }

    /// Renders the request document on a single line.
    pub fn to_json(&self) -> String {
        serde_json::to_string(self).expect("search request serialization should never fail")
    }

    pub fn to_json_value(&self) -> serde_json::Value {
        serde_json::to_value(self).expect("search request serialization should never fail")
    }
}

/// Accumulates the clauses of one search request.
///
/// A builder is scoped to a single search: [`SearchRequestBuilder::build`] does not reset it, so
/// reusing it for another search carries its clauses over.
///
/// ```
/// use tire_query::{FacetDefinition, FilterClause, Highlight, QueryClause, SearchRequest, SortOrder};
///
/// let mut builder = SearchRequest::builder();
/// builder
///     .query(QueryClause::string("title:T*"))?
///     .filter(FilterClause::terms("tags", ["ruby", "python"]))
///     .facet("global-tags", FacetDefinition::terms("tags").global(true))?
///     .facet("current-tags", FacetDefinition::terms("tags"))?
///     .sort_by("title", SortOrder::Desc)
///     .highlight(Highlight::new(["title"]));
/// let search_request = builder.build();
/// assert_eq!(search_request.facets().len(), 2);
/// # Ok::<(), tire_query::ConfigurationError>(())
/// ```
#[derive(Debug, Default, Clone)]
pub struct SearchRequestBuilder {
    query_override: QueryOverride,
    query: Option<QueryClause>,
    filters: Vec<FilterClause>,
    facets: Facets,
    sort: Vec<SortClause>,
    highlight: Option<Highlight>,
    from: Option<u64>,
    size: Option<u64>,
    fields: Option<Vec<String>>,
}

impl SearchRequestBuilder {
    pub fn new() -> Self {
        SearchRequestBuilder::default()
    }

    pub fn with_query_override(query_override: QueryOverride) -> Self {
        SearchRequestBuilder {
            query_override,
            ..Default::default()
        }
    }

    /// Sets the query clause. See [`QueryOverride`] for what happens if one is already set.
    pub fn query(
        &mut self,
        query: impl Into<QueryClause>,
    ) -> Result<&mut Self, ConfigurationError> {
        if self.query.is_some() {
            match self.query_override {
                QueryOverride::LastWriteWins => {
                    debug!("replacing previously set query clause");
                }
                QueryOverride::Reject => return Err(ConfigurationError::QueryAlreadySet),
            }
        }
        self.query = Some(query.into());
        Ok(self)
    }

    /// Appends a filter. Filters are ANDed in the order they are added.
    pub fn filter(&mut self, filter: impl Into<FilterClause>) -> &mut Self {
        self.filters.push(filter.into());
        self
    }

    /// Registers a facet. Facet names are unique within a request.
    pub fn facet(
        &mut self,
        name: impl Into<String>,
        definition: impl Into<FacetDefinition>,
    ) -> Result<&mut Self, ConfigurationError> {
        let name = name.into();
        if self.facets.contains(&name) {
            return Err(ConfigurationError::DuplicateFacet { name });
        }
        self.facets.0.push((name, definition.into()));
        Ok(self)
    }

    /// Appends an ascending sort clause on `field`.
    pub fn sort(&mut self, field: impl Into<String>) -> &mut Self {
        self.sort_by(field, SortOrder::default())
    }

    pub fn sort_by(&mut self, field: impl Into<String>, order: SortOrder) -> &mut Self {
        self.sort.push(SortClause::new(field, order));
        self
    }

    pub fn highlight(&mut self, highlight: Highlight) -> &mut Self {
        self.highlight = Some(highlight);
        self
    }

    pub fn from(&mut self, from: u64) -> &mut Self {
        self.from = Some(from);
        self
    }

    pub fn size(&mut self, size: u64) -> &mut Self {
        self.size = Some(size);
        self
    }

    /// Restricts the stored fields returned with each hit.
    pub fn fields<I, S>(&mut self, fields: I) -> &mut Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.fields = Some(fields.into_iter().map(Into::into).collect());
        self
    }

    pub fn build(&self) -> SearchRequest {
        SearchRequest {
            query: self.query.clone().unwrap_or_default(),
            filters: self.filters.clone(),
            facets: self.facets.clone(),
            sort: self.sort.clone(),
            highlight: self.highlight.clone(),
            from: self.from,
            size: self.size,
            fields: self.fields.clone(),
        }
    }
}
