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

/// Tag wrapping highlighted fragments when none is configured.
pub const DEFAULT_HIGHLIGHT_TAG: &str = "<b>";

/// Options applying either to every highlighted field or to a single one.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct HighlightOptions {
    pub tag: Option<String>,
    pub fragment_size: Option<u32>,
    pub number_of_fragments: Option<u32>,
}

impl HighlightOptions {
    /// Opening tag wrapping each fragment, e.g. `<strong class="highlight">`. The closing tag is
    /// derived from it.
    pub fn tag(mut self, tag: impl Into<String>) -> Self {
        self.tag = Some(tag.into());
        self
    }

    pub fn fragment_size(mut self, fragment_size: u32) -> Self {
        self.fragment_size = Some(fragment_size);
        self
    }

    pub fn number_of_fragments(mut self, number_of_fragments: u32) -> Self {
        self.number_of_fragments = Some(number_of_fragments);
        self
    }

    /// Returns these options with the unset ones taken from `base`.
    fn or(&self, base: &HighlightOptions) -> HighlightOptions {
        HighlightOptions {
            tag: self.tag.clone().or_else(|| base.tag.clone()),
            fragment_size: self.fragment_size.or(base.fragment_size),
            number_of_fragments: self.number_of_fragments.or(base.number_of_fragments),
        }
    }

    fn serialize_entries<M: SerializeMap>(&self, map: &mut M) -> Result<(), M::Error> {
        if let Some(tag) = &self.tag {
            map.serialize_entry("pre_tags", &[tag])?;
            map.serialize_entry("post_tags", &[closing_tag(tag)])?;
        }
        if let Some(fragment_size) = self.fragment_size {
            map.serialize_entry("fragment_size", &fragment_size)?;
        }
        if let Some(number_of_fragments) = self.number_of_fragments {
            map.serialize_entry("number_of_fragments", &number_of_fragments)?;
        }
        Ok(())
    }
}

impl Serialize for HighlightOptions {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(None)?;
        self.serialize_entries(&mut map)?;
        map.end()
    }
}

/// `<strong class="highlight">` is closed by `</strong>`. A tag which is not an HTML element is
/// used on both sides of the fragment.
fn closing_tag(opening_tag: &str) -> String {
    let Some(element) = opening_tag.strip_prefix('<') else {
        return opening_tag.to_string();
    };
    let element_name: String = element
        .chars()
        .take_while(|character| character.is_ascii_alphanumeric())
        .collect();
    if element_name.is_empty() {
        return opening_tag.to_string();
    }
    format!("</{element_name}>")
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct HighlightField {
    name: String,
    options: HighlightOptions,
}

/// Fields to highlight, in order, with their options.
///
/// ```json
/// {
///   "fields": {"title": {}, "body": {"number_of_fragments": 0}},
///   "pre_tags": ["<b>"],
///   "post_tags": ["</b>"]
/// }
/// ```
///
/// Field options are serialized within the field entry, where the engine gives them precedence
/// over the global ones.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Highlight {
    fields: Vec<HighlightField>,
    options: HighlightOptions,
}

impl Highlight {
    pub fn new<I, S>(fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut highlight = Highlight {
            fields: Vec::new(),
            options: HighlightOptions::default(),
        };
        for field in fields {
            highlight = highlight.field(field);
        }
        highlight
    }

    /// Adds a field. Adding a field twice keeps its first position and its options.
    pub fn field(self, field: impl Into<String>) -> Self {
        let name = field.into();
        if self.contains_field(&name) {
            return self;
        }
        self.field_options(name, HighlightOptions::default())
    }

    /// Adds a field, or replaces its options if it is already present.
    pub fn field_options(mut self, field: impl Into<String>, options: HighlightOptions) -> Self {
        let name = field.into();
        if let Some(highlight_field) = self
            .fields
            .iter_mut()
            .find(|highlight_field| highlight_field.name == name)
        {
            highlight_field.options = options;
        } else {
            self.fields.push(HighlightField { name, options });
        }
        self
    }

    /// Sets the options applying to every field.
    pub fn options(mut self, options: HighlightOptions) -> Self {
        self.options = options;
        self
    }

    pub fn fields(&self) -> impl Iterator<Item = &str> {
        self.fields
            .iter()
            .map(|highlight_field| highlight_field.name.as_str())
    }

    pub fn contains_field(&self, field: &str) -> bool {
        self.fields().any(|name| name == field)
    }

    /// Global tag, or the default one.
    pub fn tag(&self) -> &str {
        self.options.tag.as_deref().unwrap_or(DEFAULT_HIGHLIGHT_TAG)
    }

    /// Options in effect for `field`: its own options override the global ones.
    pub fn effective_options(&self, field: &str) -> Option<HighlightOptions> {
        let highlight_field = self
            .fields
            .iter()
            .find(|highlight_field| highlight_field.name == field)?;
        let mut options = highlight_field.options.or(&self.options);
        options.tag.get_or_insert_with(|| DEFAULT_HIGHLIGHT_TAG.to_string());
        Some(options)
    }
}

struct HighlightFieldsForSerialization<'a>(&'a [HighlightField]);

impl Serialize for HighlightFieldsForSerialization<'_> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.0.len()))?;
        for highlight_field in self.0 {
            map.serialize_entry(&highlight_field.name, &highlight_field.options)?;
        }
        map.end()
    }
}

impl Serialize for Highlight {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(None)?;
        map.serialize_entry("fields", &HighlightFieldsForSerialization(&self.fields))?;
        let mut global_options = self.options.clone();
        global_options
            .tag
            .get_or_insert_with(|| DEFAULT_HIGHLIGHT_TAG.to_string());
        global_options.serialize_entries(&mut map)?;
        map.end()
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn test_closing_tag() {
        assert_eq!(closing_tag("<em>"), "</em>");
        assert_eq!(closing_tag(r#"<strong class="highlight">"#), "</strong>");
        assert_eq!(closing_tag("**"), "**");
        assert_eq!(closing_tag("<>"), "<>");
    }

    #[test]
    fn test_highlight_default_tag() {
        let highlight = Highlight::new(["title", "body"]);
        assert_eq!(
            serde_json::to_value(&highlight).unwrap(),
            json!({
                "fields": {"title": {}, "body": {}},
                "pre_tags": ["<b>"],
                "post_tags": ["</b>"]
            })
        );
    }

    #[test]
    fn test_highlight_custom_tag_and_field_options() {
        let highlight = Highlight::new(["title"])
            .field_options("body", HighlightOptions::default().number_of_fragments(0))
            .options(HighlightOptions::default().tag(r#"<strong class="highlight">"#));
        assert_eq!(
            serde_json::to_value(&highlight).unwrap(),
            json!({
                "fields": {"title": {}, "body": {"number_of_fragments": 0}},
                "pre_tags": [r#"<strong class="highlight">"#],
                "post_tags": ["</strong>"]
            })
        );
    }

    #[test]
    fn test_highlight_field_options_override_global_options() {
        let highlight = Highlight::new(["title"])
            .field_options(
                "body",
                HighlightOptions::default().tag("<b>").fragment_size(50),
            )
            .options(
                HighlightOptions::default()
                    .tag("<i>")
                    .fragment_size(100)
                    .number_of_fragments(3),
            );
        let body_options = highlight.effective_options("body").unwrap();
        assert_eq!(body_options.tag.as_deref(), Some("<b>"));
        assert_eq!(body_options.fragment_size, Some(50));
        assert_eq!(body_options.number_of_fragments, Some(3));

        let title_options = highlight.effective_options("title").unwrap();
        assert_eq!(title_options.tag.as_deref(), Some("<i>"));
        assert_eq!(title_options.fragment_size, Some(100));

        assert!(highlight.effective_options("summary").is_none());
    }

    #[test]
    fn test_highlight_field_keeps_existing_options() {
        let highlight = Highlight::new(["title"])
            .field_options("body", HighlightOptions::default().fragment_size(50))
            .field("body");
        assert_eq!(
            highlight.effective_options("body").unwrap().fragment_size,
            Some(50)
        );
        assert_eq!(
            serde_json::to_value(&highlight).unwrap(),
            json!({
                "fields": {"title": {}, "body": {"fragment_size": 50}},
                "pre_tags": ["<b>"],
                "post_tags": ["</b>"]
            })
        );
        let fields: Vec<&str> = highlight.fields().collect();
        assert_eq!(fields, ["title", "body"]);
    }

    #[test]
    fn test_highlight_field_order_and_uniqueness() {
        let highlight = Highlight::new(["title", "body"])
            .field("title")
            .field("summary");
        let fields: Vec<&str> = highlight.fields().collect();
        assert_eq!(fields, ["title", "body", "summary"]);
        assert!(highlight.contains_field("summary"));
        assert_eq!(highlight.effective_options("body").unwrap().tag.as_deref(), Some("<b>"));
    }
}
