use crate::search::documents::ImageDocument;
use crate::search::error::SearchError;
use log::debug;
use reqwest::{Client, Method, RequestBuilder, StatusCode};
use serde::Deserialize;

const IMAGE_INDEX: &str = "images";

/// Thin client for the Elasticsearch HTTP API: index bootstrap and bulk
/// document writes. Search queries are served elsewhere; this client only
/// covers what the reindex pipeline needs.
#[derive(Clone)]
pub struct SearchService {
    http: Client,
    base_url: String,
    index_name: String,
}

/// Outcome of one bulk write. A bulk call can partially fail: the engine
/// accepts some documents and rejects others, so the report carries both
/// the accepted count and the per-document rejections.
#[derive(Debug, Default)]
pub struct BulkReport {
    pub indexed: usize,
    pub failures: Vec<BulkFailure>,
}

#[derive(Debug, Clone)]
pub struct BulkFailure {
    pub identifier: String,
    pub status: u16,
    pub reason: String,
}

impl SearchService {
    pub fn new(base_url: impl Into<String>) -> Self {
        let http = Client::builder()
            .build()
            .expect("failed to construct reqwest client");

        Self {
            http,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            index_name: IMAGE_INDEX.to_string(),
        }
    }

    pub fn index_name(&self) -> &str {
        &self.index_name
    }

    fn url_for(&self, path: &str) -> String {
        if path.starts_with('/') {
            format!("{}{}", self.base_url, path)
        } else {
            format!("{}/{}", self.base_url, path)
        }
    }

    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        self.http.request(method, self.url_for(path))
    }

    async fn index_exists(&self) -> Result<bool, SearchError> {
        let response = self
            .request(Method::GET, &self.index_name)
            .send()
            .await
            .map_err(SearchError::ElasticHttp)?;

        match response.status() {
            status if status.is_success() => Ok(true),
            StatusCode::NOT_FOUND => Ok(false),
            other => {
                let body = response
                    .text()
                    .await
                    .unwrap_or_else(|_| "failed to read error body".to_string());
                Err(SearchError::elastic_status(other, body))
            }
        }
    }

    /// Declares the image index with its field mappings. Safe to call on
    /// every run: an index that already exists is left untouched.
    pub async fn ensure_image_index(&self) -> Result<(), SearchError> {
        if self.index_exists().await? {
            debug!("index {} already exists", self.index_name);
            return Ok(());
        }

        let response = self
            .request(Method::PUT, &self.index_name)
            .json(&image_index_mappings())
            .send()
            .await
            .map_err(SearchError::ElasticHttp)?;

        let status = response.status();
        if status.is_success() {
            return Ok(());
        }

        let body = response
            .text()
            .await
            .unwrap_or_else(|_| "failed to read error body".to_string());

        // Lost a creation race with another writer.
        if status == StatusCode::BAD_REQUEST && body.contains("resource_already_exists_exception") {
            return Ok(());
        }

        Err(SearchError::elastic_status(status, body))
    }

    /// Submits one bulk write with the given documents, keyed by their
    /// identifiers. A transport failure or non-success HTTP status is an
    /// error; per-document rejections are returned in the report instead.
    pub async fn bulk_index(&self, documents: &[ImageDocument]) -> Result<BulkReport, SearchError> {
        if documents.is_empty() {
            return Ok(BulkReport::default());
        }

        debug!(
            "bulk_index: submitting {} documents to {}",
            documents.len(),
            self.index_name
        );

        let body = encode_bulk_body(documents)?;
        let response = self
            .request(Method::POST, &format!("{}/_bulk", self.index_name))
            .header("Content-Type", "application/x-ndjson")
            .body(body)
            .send()
            .await
            .map_err(SearchError::ElasticHttp)?;

        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "failed to read error body".to_string());
            return Err(SearchError::elastic_status(status, body));
        }

        let parsed: BulkResponse = response.json().await.map_err(SearchError::ElasticHttp)?;
        Ok(build_report(parsed))
    }
}

/// Encodes the newline-delimited bulk payload: one action line naming the
/// document identity, followed by the document source, per document.
fn encode_bulk_body(documents: &[ImageDocument]) -> Result<String, SearchError> {
    let mut body = String::new();

    for document in documents {
        let action = serde_json::json!({ "index": { "_id": document.identifier } });
        body.push_str(&serde_json::to_string(&action).map_err(SearchError::Encode)?);
        body.push('\n');
        body.push_str(&serde_json::to_string(document).map_err(SearchError::Encode)?);
        body.push('\n');
    }

    Ok(body)
}

fn build_report(response: BulkResponse) -> BulkReport {
    let mut report = BulkReport::default();

    for item in response.items {
        match item.index.error {
            Some(error) => report.failures.push(BulkFailure {
                identifier: item.index.id.unwrap_or_default(),
                status: item.index.status,
                reason: error
                    .reason
                    .unwrap_or_else(|| format!("rejected with type '{}'", error.kind)),
            }),
            None => report.indexed += 1,
        }
    }

    report
}

fn image_index_mappings() -> serde_json::Value {
    serde_json::json!({
        "mappings": {
            "properties": {
                "identifier": { "type": "text" },
                "title": { "type": "text" },
                "creator": { "type": "text" },
                "creator_url": { "type": "text" },
                "url": { "type": "text" },
                "provider": { "type": "text" },
                "source": { "type": "text" },
                "license": { "type": "text" },
                "foreign_landing_url": { "type": "text" },
                "tags": { "type": "text" },
                "created_at": { "type": "date" }
            }
        }
    })
}

#[derive(Deserialize)]
struct BulkResponse {
    items: Vec<BulkItem>,
}

#[derive(Deserialize)]
struct BulkItem {
    index: BulkItemStatus,
}

#[derive(Deserialize)]
struct BulkItemStatus {
    #[serde(rename = "_id")]
    id: Option<String>,
    status: u16,
    error: Option<BulkItemError>,
}

#[derive(Deserialize)]
struct BulkItemError {
    #[serde(rename = "type")]
    kind: String,
    reason: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn document(identifier: &str) -> ImageDocument {
        ImageDocument {
            identifier: identifier.to_string(),
            title: Some("title".to_string()),
            creator: None,
            creator_url: None,
            url: None,
            provider: None,
            source: None,
            license: None,
            foreign_landing_url: None,
            tags: Vec::new(),
            created_at: None,
        }
    }

    #[test]
    fn bulk_body_pairs_action_and_source_lines() {
        let documents = vec![document("img-1"), document("img-2")];
        let body = encode_bulk_body(&documents).unwrap();

        assert!(body.ends_with('\n'));

        let lines: Vec<&str> = body.lines().collect();
        assert_eq!(lines.len(), 4);

        let first_action: serde_json::Value = serde_json::from_str(lines[0]).unwrap();
        assert_eq!(first_action["index"]["_id"], "img-1");

        let second_source: serde_json::Value = serde_json::from_str(lines[3]).unwrap();
        assert_eq!(second_source["identifier"], "img-2");
    }

    #[test]
    fn report_splits_accepted_and_rejected_items() {
        let raw = serde_json::json!({
            "took": 12,
            "errors": true,
            "items": [
                { "index": { "_id": "img-1", "status": 201 } },
                { "index": {
                    "_id": "img-2",
                    "status": 400,
                    "error": { "type": "mapper_parsing_exception", "reason": "failed to parse field [created_at]" }
                } },
                { "index": { "_id": "img-3", "status": 200 } }
            ]
        });

        let response: BulkResponse = serde_json::from_value(raw).unwrap();
        let report = build_report(response);

        assert_eq!(report.indexed, 2);
        assert_eq!(report.failures.len(), 1);
        assert_eq!(report.failures[0].identifier, "img-2");
        assert_eq!(report.failures[0].status, 400);
        assert!(report.failures[0].reason.contains("created_at"));
    }

    #[test]
    fn report_describes_reasonless_rejections_by_type() {
        let raw = serde_json::json!({
            "errors": true,
            "items": [
                { "index": { "_id": "img-9", "status": 409, "error": { "type": "version_conflict_engine_exception" } } }
            ]
        });

        let response: BulkResponse = serde_json::from_value(raw).unwrap();
        let report = build_report(response);

        assert_eq!(report.indexed, 0);
        assert!(
            report.failures[0]
                .reason
                .contains("version_conflict_engine_exception")
        );
    }
}
