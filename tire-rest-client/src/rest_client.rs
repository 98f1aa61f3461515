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

use std::path::Path;
use std::sync::Arc;

use bytes::Bytes;
use itertools::Itertools;
use percent_encoding::{utf8_percent_encode, AsciiSet, CONTROLS};
use reqwest::{Method, StatusCode, Url};
use serde_json::{json, Value as JsonValue};
use tire_query::{MalformedResponse, QueryClause, ResultSet, SearchRequest, SearchResult};
use tokio::fs::File;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::{debug, info};

use crate::bulk::{count_bulk_failures, encode_bulk_entry, BulkBatch, BulkBatcher};
use crate::curl::to_curl;
use crate::error::Error;
use crate::models::{BulkImportReport, BulkOptions, Timeout};
use crate::transport::{HttpTransport, Transport, TransportExt};

pub const DEFAULT_BASE_URL: &str = "http://localhost:9200";
pub const DEFAULT_CLIENT_CONNECT_TIMEOUT: Timeout = Timeout::from_secs(5);
pub const DEFAULT_CLIENT_TIMEOUT: Timeout = Timeout::from_secs(10);
pub const DEFAULT_CLIENT_SEARCH_TIMEOUT: Timeout = Timeout::from_mins(1);
pub const DEFAULT_CLIENT_BULK_TIMEOUT: Timeout = Timeout::from_mins(1);

/// Characters escaped in a single path segment.
const PATH_SEGMENT_ENCODE_SET: &AsciiSet = &CONTROLS
    .add(b' ')
    .add(b'"')
    .add(b'#')
    .add(b'%')
    .add(b'/')
    .add(b':')
    .add(b'<')
    .add(b'>')
    .add(b'?')
    .add(b'`')
    .add(b'{')
    .add(b'}');

pub struct TireClientBuilder {
    /// Base url for the client
    base_url: Url,
    /// Connection timeout.
    connect_timeout: Timeout,
    /// Timeout for most operations except search and bulk.
    timeout: Timeout,
    /// Timeout for search and count operations.
    search_timeout: Timeout,
    /// Timeout for each bulk request.
    bulk_timeout: Timeout,
}

impl TireClientBuilder {
    pub fn new(endpoint: Url) -> Self {
        TireClientBuilder {
            base_url: endpoint,
            connect_timeout: DEFAULT_CLIENT_CONNECT_TIMEOUT,
            timeout: DEFAULT_CLIENT_TIMEOUT,
            search_timeout: DEFAULT_CLIENT_SEARCH_TIMEOUT,
            bulk_timeout: DEFAULT_CLIENT_BULK_TIMEOUT,
        }
    }

    pub fn connect_timeout(mut self, timeout: Timeout) -> Self {
        self.connect_timeout = timeout;
        self
    }

    pub fn timeout(mut self, timeout: Timeout) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn search_timeout(mut self, timeout: Timeout) -> Self {
        self.search_timeout = timeout;
        self
    }

    pub fn bulk_timeout(mut self, timeout: Timeout) -> Self {
        self.bulk_timeout = timeout;
        self
    }

    pub fn build(self) -> Result<TireClient, Error> {
        let transport = HttpTransport::new(self.base_url, self.connect_timeout)?;
        Ok(TireClient {
            transport: Arc::new(transport),
            timeout: self.timeout,
            search_timeout: self.search_timeout,
            bulk_timeout: self.bulk_timeout,
        })
    }
}

/// Root client for top level APIs.
#[derive(Clone)]
pub struct TireClient {
    transport: Arc<dyn Transport>,
    /// Timeout for all operations except search and bulk.
    timeout: Timeout,
    /// Timeout for search and count operations.
    search_timeout: Timeout,
    /// Timeout for each bulk request.
    bulk_timeout: Timeout,
}

impl TireClient {
    /// Creates a client over an arbitrary transport, with the default timeouts.
    pub fn new(transport: impl Transport) -> Self {
        TireClient {
            transport: Arc::new(transport),
            timeout: DEFAULT_CLIENT_TIMEOUT,
            search_timeout: DEFAULT_CLIENT_SEARCH_TIMEOUT,
            bulk_timeout: DEFAULT_CLIENT_BULK_TIMEOUT,
        }
    }

    pub fn base_url(&self) -> Url {
        self.transport.base_url()
    }

    /// Runs `search_request` against `indices`, or against all indices when empty.
    pub async fn search(
        &self,
        indices: &[impl AsRef<str>],
        search_request: &SearchRequest,
    ) -> Result<ResultSet, Error> {
        let path = indices_path(indices, "_search");
        debug!(path=%path, "search");
        let body = Bytes::from(search_request.to_json());
        let response = self
            .transport
            .execute(Method::POST, &path, Some(body), self.search_timeout)
            .await?;
        let result_set = ResultSet::from_response(response, search_request)?;
        Ok(result_set)
    }

    /// Counts the documents of `indices` matching `query_opt`, or all of them.
    pub async fn count(
        &self,
        indices: &[impl AsRef<str>],
        query_opt: Option<&QueryClause>,
    ) -> Result<u64, Error> {
        let path = indices_path(indices, "_count");
        let body_opt = query_opt
            .map(|query| serde_json::to_vec(&json!({ "query": query })))
            .transpose()?
            .map(Bytes::from);
        let response = self
            .transport
            .execute(Method::POST, &path, body_opt, self.search_timeout)
            .await?;
        let count = response
            .get("count")
            .and_then(JsonValue::as_u64)
            .ok_or(MalformedResponse::MissingCount)?;
        Ok(count)
    }

    /// Renders the `curl` command equivalent to [`TireClient::search`].
    pub fn search_curl(
        &self,
        indices: &[impl AsRef<str>],
        search_request: &SearchRequest,
    ) -> Result<String, Error> {
        let url = self.transport.url(&indices_path(indices, "_search"))?;
        let body = search_request.to_json();
        Ok(to_curl(&Method::POST, &url, Some(body.as_bytes())))
    }

    pub fn indexes(&self) -> IndexClient {
        IndexClient::new(&*self.transport, self.timeout)
    }

    pub fn documents<'a>(&'a self, index: &'a str) -> DocumentClient<'a> {
        DocumentClient::new(&*self.transport, self.timeout, self.bulk_timeout, index)
    }
}

fn indices_path(indices: &[impl AsRef<str>], endpoint: &str) -> String {
    if indices.is_empty() {
        return endpoint.to_string();
    }
    let indices_str = indices.iter().map(|index| index.as_ref()).join(",");
    format!("{indices_str}/{endpoint}")
}

/// Builds `index/doc_type[/id]` with each segment percent-encoded.
fn document_path(index: &str, doc_type: &str, id_opt: Option<&str>) -> String {
    let mut path = format!(
        "{}/{}",
        utf8_percent_encode(index, PATH_SEGMENT_ENCODE_SET),
        utf8_percent_encode(doc_type, PATH_SEGMENT_ENCODE_SET)
    );
    if let Some(id) = id_opt {
        path.push('/');
        path.extend(utf8_percent_encode(id, PATH_SEGMENT_ENCODE_SET));
    }
    path
}

/// Client for indexes APIs.
pub struct IndexClient<'a> {
    transport: &'a dyn Transport,
    timeout: Timeout,
}

impl<'a> IndexClient<'a> {
    fn new(transport: &'a dyn Transport, timeout: Timeout) -> Self {
        Self { transport, timeout }
    }

    /// Creates `index`, with optional settings and mappings.
    pub async fn create(
        &self,
        index: &str,
        settings_opt: Option<&JsonValue>,
    ) -> Result<JsonValue, Error> {
        let body_opt = settings_opt
            .map(serde_json::to_vec)
            .transpose()?
            .map(Bytes::from);
        let response = self
            .transport
            .execute(Method::PUT, index, body_opt, self.timeout)
            .await?;
        info!(index=%index, "created index");
        Ok(response)
    }

    pub async fn delete(&self, index: &str) -> Result<(), Error> {
        self.transport
            .send(Method::DELETE, index, None, self.timeout)
            .await?
            .check()?;
        info!(index=%index, "deleted index");
        Ok(())
    }

    pub async fn exists(&self, index: &str) -> Result<bool, Error> {
        let response = self
            .transport
            .send(Method::HEAD, index, None, self.timeout)
            .await?;
        if response.status_code == StatusCode::NOT_FOUND {
            return Ok(false);
        }
        response.check()?;
        Ok(true)
    }

    /// Makes the documents indexed so far visible to searches.
    pub async fn refresh(&self, index: &str) -> Result<(), Error> {
        let path = format!("{index}/_refresh");
        self.transport
            .send(Method::POST, &path, None, self.timeout)
            .await?
            .check()?;
        Ok(())
    }

    pub async fn mapping(&self, index: &str) -> Result<JsonValue, Error> {
        let path = format!("{index}/_mapping");
        self.transport
            .execute(Method::GET, &path, None, self.timeout)
            .await
    }
}

/// Client for the documents of one index.
pub struct DocumentClient<'a> {
    transport: &'a dyn Transport,
    timeout: Timeout,
    bulk_timeout: Timeout,
    index: &'a str,
}

impl<'a> DocumentClient<'a> {
    fn new(
        transport: &'a dyn Transport,
        timeout: Timeout,
        bulk_timeout: Timeout,
        index: &'a str,
    ) -> Self {
        Self {
            transport,
            timeout,
            bulk_timeout,
            index,
        }
    }

    /// Stores `document` under `id`, or under an id generated by the engine.
    ///
    /// Returns the engine acknowledgement, which carries the document `_id`.
    pub async fn store(
        &self,
        doc_type: &str,
        id_opt: Option<&str>,
        document: &JsonValue,
    ) -> Result<JsonValue, Error> {
        let body = Bytes::from(serde_json::to_vec(document)?);
        let method = if id_opt.is_some() {
            Method::PUT
        } else {
            Method::POST
        };
        let path = document_path(self.index, doc_type, id_opt);
        self.transport
            .execute(method, &path, Some(body), self.timeout)
            .await
    }

    /// Fetches a document. Returns `None` if it does not exist.
    pub async fn retrieve(&self, doc_type: &str, id: &str) -> Result<Option<SearchResult>, Error> {
        let path = document_path(self.index, doc_type, Some(id));
        let response = self
            .transport
            .send(Method::GET, &path, None, self.timeout)
            .await?;
        if response.status_code == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        let document = response.into_json()?;
        let found = document
            .get("found")
            .or_else(|| document.get("exists"))
            .and_then(JsonValue::as_bool)
            .unwrap_or(true);
        if !found {
            return Ok(None);
        }
        let search_result = SearchResult::from_hit(document, false)?;
        Ok(Some(search_result))
    }

    pub async fn remove(&self, doc_type: &str, id: &str) -> Result<(), Error> {
        let path = document_path(self.index, doc_type, Some(id));
        self.transport
            .send(Method::DELETE, &path, None, self.timeout)
            .await?
            .check()?;
        Ok(())
    }

    /// Indexes `documents` through the `_bulk` endpoint.
    ///
    /// Documents are sent in batches bounded by `options`. Items rejected by the engine are
    /// counted in the report, not retried.
    pub async fn bulk_import(
        &self,
        documents: impl IntoIterator<Item = JsonValue>,
        options: BulkOptions,
    ) -> Result<BulkImportReport, Error> {
        let mut bulk_importer = BulkImporter::new(self, options);
        for document in documents {
            bulk_importer.push(document).await?;
        }
        bulk_importer.finish().await
    }

    /// Indexes the documents of a NDJSON file, one document per line. Blank lines are ignored.
    pub async fn bulk_import_file(
        &self,
        filepath: &Path,
        options: BulkOptions,
    ) -> Result<BulkImportReport, Error> {
        let file = File::open(filepath).await?;
        let mut lines = BufReader::new(file).lines();
        let mut bulk_importer = BulkImporter::new(self, options);
        while let Some(line) = lines.next_line().await? {
            if line.trim().is_empty() {
                continue;
            }
            let document: JsonValue = serde_json::from_str(&line)?;
            bulk_importer.push(document).await?;
        }
        bulk_importer.finish().await
    }

    async fn send_bulk_batch(&self, bulk_batch: BulkBatch) -> Result<usize, Error> {
        let path = format!("{}/_bulk", self.index);
        let num_bytes = bulk_batch.payload.len();
        let response = self
            .transport
            .execute(
                Method::POST,
                &path,
                Some(bulk_batch.payload),
                self.bulk_timeout,
            )
            .await?;
        let num_failures = count_bulk_failures(self.index, &response);
        debug!(
            index=%self.index,
            num_docs=bulk_batch.num_docs,
            num_bytes,
            num_failures,
            "sent bulk batch"
        );
        Ok(num_failures)
    }
}

struct BulkImporter<'a, 'b> {
    document_client: &'b DocumentClient<'a>,
    batcher: BulkBatcher,
    default_doc_type: String,
    report: BulkImportReport,
}

impl<'a, 'b> BulkImporter<'a, 'b> {
    fn new(document_client: &'b DocumentClient<'a>, options: BulkOptions) -> Self {
        Self {
            document_client,
            batcher: BulkBatcher::new(options.max_batch_num_bytes, options.max_batch_num_docs),
            default_doc_type: options.default_doc_type,
            report: BulkImportReport::default(),
        }
    }

    async fn push(&mut self, document: JsonValue) -> Result<(), Error> {
        let entry = encode_bulk_entry(
            self.document_client.index,
            &self.default_doc_type,
            document,
        )?;
        if let Some(bulk_batch) = self.batcher.push(&entry) {
            self.send(bulk_batch).await?;
        }
        Ok(())
    }

    async fn send(&mut self, bulk_batch: BulkBatch) -> Result<(), Error> {
        let num_docs = bulk_batch.num_docs;
        let num_failures = self.document_client.send_bulk_batch(bulk_batch).await?;
        self.report.num_batches += 1;
        self.report.num_docs_sent += num_docs;
        self.report.num_docs_failed += num_failures;
        Ok(())
    }

    async fn finish(mut self) -> Result<BulkImportReport, Error> {
        if let Some(bulk_batch) = self.batcher.flush() {
            self.send(bulk_batch).await?;
        }
        self.report.num_docs_skipped = self.batcher.num_skipped();
        info!(
            index=%self.document_client.index,
            num_batches=self.report.num_batches,
            num_docs_indexed=self.report.num_docs_indexed(),
            num_docs_failed=self.report.num_docs_failed,
            num_docs_skipped=self.report.num_docs_skipped,
            "bulk import done"
        );
        Ok(self.report)
    }
}
