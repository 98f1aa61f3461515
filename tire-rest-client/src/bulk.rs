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

use std::mem;

use bytes::Bytes;
use serde_json::{json, Map as JsonMap, Value as JsonValue};
use tracing::warn;

/// A `_bulk` payload ready to be sent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct BulkBatch {
    pub payload: Bytes,
    pub num_docs: usize,
}

/// Accumulates NDJSON bulk entries into batches bounded both in bytes and in documents.
pub(crate) struct BulkBatcher {
    buffer: Vec<u8>,
    num_docs: usize,
    num_entries: usize,
    num_skipped: usize,
    max_batch_num_bytes: usize,
    max_batch_num_docs: usize,
}

impl BulkBatcher {
    pub fn new(max_batch_num_bytes: usize, max_batch_num_docs: usize) -> Self {
        Self {
            buffer: Vec::new(),
            num_docs: 0,
            num_entries: 0,
            num_skipped: 0,
            max_batch_num_bytes,
            max_batch_num_docs: max_batch_num_docs.max(1),
        }
    }

    /// Appends the entry of one document, and returns the previous batch if this entry does
    /// not fit in it.
    pub fn push(&mut self, entry: &[u8]) -> Option<BulkBatch> {
        self.num_entries += 1;
        if entry.len() > self.max_batch_num_bytes {
            warn!(
                "Skipping document {}, which exceeds the maximum allowed content length ({} vs. \
                 {} bytes).",
                self.num_entries,
                entry.len(),
                self.max_batch_num_bytes
            );
            self.num_skipped += 1;
            return None;
        }
        let full_batch_opt = if self.buffer.len() + entry.len() > self.max_batch_num_bytes
            || self.num_docs >= self.max_batch_num_docs
        {
            self.flush()
        } else {
            None
        };
        self.buffer.extend_from_slice(entry);
        self.num_docs += 1;
        full_batch_opt
    }

    /// Returns the pending batch, if any.
    pub fn flush(&mut self) -> Option<BulkBatch> {
        if self.num_docs == 0 {
            return None;
        }
        let payload = Bytes::from(mem::take(&mut self.buffer));
        let num_docs = mem::take(&mut self.num_docs);
        Some(BulkBatch { payload, num_docs })
    }

    pub fn num_skipped(&self) -> usize {
        self.num_skipped
    }
}

/// Encodes a document as a `_bulk` index entry: an action line followed by a source line.
///
/// The id is read from `_id`, or else from `id`. The type is read from `_type`, or else from
/// `type`, and defaults to `default_doc_type`. `_id` and `_type` are stripped from the source.
pub(crate) fn encode_bulk_entry(
    index: &str,
    default_doc_type: &str,
    document: JsonValue,
) -> serde_json::Result<Vec<u8>> {
    let mut source = match document {
        JsonValue::Object(source) => source,
        other => {
            let mut source = JsonMap::new();
            source.insert("value".to_string(), other);
            source
        }
    };
    let id_opt = source
        .remove("_id")
        .or_else(|| source.get("id").cloned())
        .and_then(literal_to_string);
    let doc_type = source
        .remove("_type")
        .or_else(|| source.get("type").cloned())
        .and_then(literal_to_string)
        .unwrap_or_else(|| default_doc_type.to_string());

    let mut action_params = JsonMap::new();
    action_params.insert("_index".to_string(), JsonValue::from(index));
    action_params.insert("_type".to_string(), JsonValue::from(doc_type));
    if let Some(id) = id_opt {
        action_params.insert("_id".to_string(), JsonValue::from(id));
    }
    let action = json!({ "index": action_params });

    let mut entry = serde_json::to_vec(&action)?;
    entry.push(b'\n');
    serde_json::to_writer(&mut entry, &source)?;
    entry.push(b'\n');
    Ok(entry)
}

fn literal_to_string(value: JsonValue) -> Option<String> {
    match value {
        JsonValue::String(text) => Some(text),
        JsonValue::Number(number) => Some(number.to_string()),
        _ => None,
    }
}

/// Number of items reported as failed in a `_bulk` response.
pub(crate) fn count_bulk_failures(index: &str, response: &JsonValue) -> usize {
    let Some(items) = response.get("items").and_then(JsonValue::as_array) else {
        return 0;
    };
    let mut num_failures = 0;
    for item in items {
        let Some(item_result) = item.as_object().and_then(|item| item.values().next()) else {
            continue;
        };
        let failed = item_result.get("error").is_some()
            || item_result
                .get("status")
                .and_then(JsonValue::as_u64)
                .map(|status| status >= 300)
                .unwrap_or(false);
        if failed {
            num_failures += 1;
            warn!(
                index=%index,
                id=%item_result.get("_id").unwrap_or(&JsonValue::Null),
                error=%item_result.get("error").unwrap_or(&JsonValue::Null),
                "failed to index document"
            );
        }
    }
    num_failures
}

#[cfg(test)]
mod tests {
    use proptest::prelude::*;

    use super::*;

    fn drain(batcher: &mut BulkBatcher, entries: &[&[u8]]) -> Vec<BulkBatch> {
        let mut batches: Vec<BulkBatch> = entries
            .iter()
            .filter_map(|entry| batcher.push(entry))
            .collect();
        batches.extend(batcher.flush());
        batches
    }

    #[test]
    fn test_bulk_batcher_empty() {
        let mut batcher = BulkBatcher::new(10, 10);
        assert!(batcher.flush().is_none());
        assert!(batcher.flush().is_none());
    }

    #[test]
    fn test_bulk_batcher_byte_limit() {
        let mut batcher = BulkBatcher::new(10, 100);
        let batches = drain(&mut batcher, &[b"foo\n", b"bar\n", b"qux\n"]);
        assert_eq!(batches.len(), 2);
        assert_eq!(&batches[0].payload[..], b"foo\nbar\n");
        assert_eq!(batches[0].num_docs, 2);
        assert_eq!(&batches[1].payload[..], b"qux\n");
        assert_eq!(batches[1].num_docs, 1);
    }

    #[test]
    fn test_bulk_batcher_exact_fit() {
        let mut batcher = BulkBatcher::new(10, 100);
        let batches = drain(&mut batcher, &[b"fooo\n", b"baar\n", b"qux\n"]);
        assert_eq!(&batches[0].payload[..], b"fooo\nbaar\n");
        assert_eq!(&batches[1].payload[..], b"qux\n");
    }

    #[test]
    fn test_bulk_batcher_doc_limit() {
        let mut batcher = BulkBatcher::new(1_000, 2);
        let batches = drain(&mut batcher, &[b"a\n", b"b\n", b"c\n", b"d\n", b"e\n"]);
        let num_docs: Vec<usize> = batches.iter().map(|batch| batch.num_docs).collect();
        assert_eq!(num_docs, [2, 2, 1]);
    }

    #[test]
    fn test_bulk_batcher_skips_oversized_entry() {
        let mut batcher = BulkBatcher::new(10, 100);
        let batches = drain(&mut batcher, &[b"foo\n", b"foobarquxbaz\n", b"bar\n"]);
        assert_eq!(batches.len(), 1);
        assert_eq!(&batches[0].payload[..], b"foo\nbar\n");
        assert_eq!(batcher.num_skipped(), 1);
    }

    fn parse_entry(entry: Vec<u8>) -> Vec<JsonValue> {
        let entry_str = String::from_utf8(entry).unwrap();
        assert!(entry_str.ends_with('\n'));
        entry_str
            .lines()
            .map(|line| serde_json::from_str(line).unwrap())
            .collect()
    }

    #[test]
    fn test_encode_bulk_entry() {
        let document = json!({"id": 1, "type": "article", "title": "One"});
        let entry = encode_bulk_entry("articles", "document", document).unwrap();
        assert_eq!(
            parse_entry(entry),
            [
                json!({"index": {"_index": "articles", "_type": "article", "_id": "1"}}),
                json!({"id": 1, "type": "article", "title": "One"}),
            ]
        );
    }

    #[test]
    fn test_encode_bulk_entry_metadata_fields() {
        let document = json!({"_id": "abc", "_type": "note", "id": 7, "title": "Two"});
        let entry = encode_bulk_entry("articles", "document", document).unwrap();
        assert_eq!(
            parse_entry(entry),
            [
                json!({"index": {"_index": "articles", "_type": "note", "_id": "abc"}}),
                json!({"id": 7, "title": "Two"}),
            ]
        );
    }

    #[test]
    fn test_encode_bulk_entry_without_id() {
        let entry = encode_bulk_entry("articles", "document", json!({"title": "Three"})).unwrap();
        assert_eq!(
            parse_entry(entry)[0],
            json!({"index": {"_index": "articles", "_type": "document"}})
        );
    }

    #[test]
    fn test_count_bulk_failures() {
        let response = json!({
            "took": 3,
            "items": [
                {"index": {"_index": "articles", "_id": "1", "ok": true}},
                {"index": {"_index": "articles", "_id": "2", "error": "MapperParsingException[failed]"}},
                {"index": {"_index": "articles", "_id": "3", "status": 409}},
                {"create": {"_index": "articles", "_id": "4", "status": 201}}
            ]
        });
        assert_eq!(count_bulk_failures("articles", &response), 2);
        assert_eq!(count_bulk_failures("articles", &json!({})), 0);
    }

    proptest! {
        #[test]
        fn test_bulk_batches_never_exceed_limits(
            entry_lens in proptest::collection::vec(1usize..64, 0..64),
            max_batch_num_bytes in 16usize..128,
            max_batch_num_docs in 1usize..8,
        ) {
            let entries: Vec<Vec<u8>> = entry_lens
                .iter()
                .map(|len| {
                    let mut entry = vec![b'x'; len - 1];
                    entry.push(b'\n');
                    entry
                })
                .collect();
            let mut batcher = BulkBatcher::new(max_batch_num_bytes, max_batch_num_docs);
            let mut batches = Vec::new();
            for entry in &entries {
                batches.extend(batcher.push(entry));
            }
            batches.extend(batcher.flush());
            let num_kept = entries.iter().filter(|entry| entry.len() <= max_batch_num_bytes).count();
            prop_assert_eq!(batcher.num_skipped(), entries.len() - num_kept);
            prop_assert_eq!(batches.iter().map(|batch| batch.num_docs).sum::<usize>(), num_kept);
            for batch in &batches {
                prop_assert!(batch.payload.len() <= max_batch_num_bytes);
                prop_assert!(batch.num_docs <= max_batch_num_docs);
                prop_assert!(batch.num_docs > 0);
            }
        }
    }
}
