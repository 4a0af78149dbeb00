//! Client for the Rentman REST API.
//!
//! All calls are blocking and strictly sequential. Hosts that need a
//! responsive foreground run them on a worker (see `app::tasks`).

use super::envelope::{extract_items, into_records};
use super::error::{CoreError, CoreResult};
use super::{ProjectId, Record, SerialId};
use reqwest::blocking::Client;
use reqwest::header::CONTENT_TYPE;
use serde_json::Value;
use std::fmt;
use std::sync::OnceLock;
use std::time::Duration;

pub const DEFAULT_BASE_URL: &str = "https://api.rentman.net";
pub const DEFAULT_PAGE_LIMIT: usize = 100;
/// Serial-number ids sent per `/serialnumbers` request.
pub const BATCH_SIZE: usize = 100;

const ERROR_BODY_EXCERPT: usize = 500;

/// Status code and body of one HTTP exchange.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawResponse {
    pub status: u16,
    pub body: String,
}

impl RawResponse {
    pub fn new(status: u16, body: impl Into<String>) -> Self {
        Self {
            status,
            body: body.into(),
        }
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// Issues GET requests. Abstracted so the pagination and batching logic can
/// be exercised without a network.
pub trait Transport: Send + Sync {
    fn get(&self, url: &str, query: &[(&str, String)]) -> CoreResult<RawResponse>;
}

/// Bearer token for the API. Never blank.
#[derive(Clone)]
pub struct ApiToken(String);

impl ApiToken {
    pub fn new(raw: impl Into<String>) -> CoreResult<Self> {
        let raw = raw.into();
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Err(CoreError::MissingToken);
        }
        Ok(Self(trimmed.to_string()))
    }

    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for ApiToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("ApiToken(***)")
    }
}

/// The production transport, backed by `reqwest`'s blocking client.
///
/// The client is built on the first request, so a transport can be created
/// inside an async runtime and handed to a blocking worker.
pub struct HttpTransport {
    client: OnceLock<Client>,
    token: ApiToken,
}

impl HttpTransport {
    pub fn new(token: ApiToken) -> Self {
        Self {
            client: OnceLock::new(),
            token,
        }
    }

    fn client(&self) -> CoreResult<&Client> {
        if let Some(client) = self.client.get() {
            return Ok(client);
        }
        // No request timeout: a slow API blocks until it answers or fails.
        let client = Client::builder()
            .timeout(None::<Duration>)
            .build()
            .map_err(CoreError::ClientSetup)?;
        Ok(self.client.get_or_init(|| client))
    }
}

impl Transport for HttpTransport {
    fn get(&self, url: &str, query: &[(&str, String)]) -> CoreResult<RawResponse> {
        let http_err = |source: reqwest::Error| CoreError::Http {
            url: url.to_string(),
            source,
        };
        let response = self
            .client()?
            .get(url)
            .bearer_auth(self.token.expose())
            .header(CONTENT_TYPE, "application/json")
            .query(query)
            .send()
            .map_err(http_err)?;
        let status = response.status().as_u16();
        let body = response.text().map_err(http_err)?;
        Ok(RawResponse { status, body })
    }
}

pub struct RentmanClient<T: Transport = HttpTransport> {
    transport: T,
    base_url: String,
    page_limit: usize,
}

impl RentmanClient<HttpTransport> {
    /// Builds a client talking to the real API.
    pub fn with_token(token: ApiToken) -> Self {
        Self::new(HttpTransport::new(token))
    }
}

impl<T: Transport> RentmanClient<T> {
    pub fn new(transport: T) -> Self {
        Self {
            transport,
            base_url: DEFAULT_BASE_URL.to_string(),
            page_limit: DEFAULT_PAGE_LIMIT,
        }
    }

    pub fn base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    pub fn page_limit(mut self, limit: usize) -> Self {
        self.page_limit = limit.max(1);
        self
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// All equipment planned on `project`, across every page.
    pub fn fetch_equipment(&self, project: ProjectId) -> CoreResult<Vec<Record>> {
        let url = format!("{}/projects/{}/projectequipment", self.base_url, project);
        self.fetch_all_pages(&url, self.page_limit)
    }

    /// Serial-number records for `ids`, fetched [`BATCH_SIZE`] ids at a time.
    ///
    /// A batch answered with 404 contributes nothing. Any other failure
    /// aborts the whole call.
    pub fn fetch_serial_details(&self, ids: &[SerialId]) -> CoreResult<Vec<Record>> {
        if ids.is_empty() {
            tracing::info!("No serial-number ids to fetch.");
            return Ok(Vec::new());
        }

        let url = format!("{}/serialnumbers", self.base_url);
        let total_batches = ids.len().div_ceil(BATCH_SIZE);
        let mut details = Vec::new();

        for (index, batch) in ids.chunks(BATCH_SIZE).enumerate() {
            let batch_num = index + 1;
            tracing::info!(
                "Fetching serial-number batch {}/{} ({} ids)",
                batch_num,
                total_batches,
                batch.len()
            );

            let query = [("id", batch.join(","))];
            let response = self.transport.get(&url, &query)?;
            if response.status == 404 {
                tracing::warn!("Batch {} returned 404, skipping.", batch_num);
                continue;
            }
            let body = decode(&url, ensure_success(&url, response)?)?;
            details.extend(into_records(extract_items(&body)));
        }

        tracing::info!("Fetched details for {} serial numbers.", details.len());
        Ok(details)
    }

    /// Follows `limit`/`offset` paging until an empty or short page.
    ///
    /// A final page of exactly `limit` items costs one more request that
    /// comes back empty.
    pub fn fetch_all_pages(&self, url: &str, limit: usize) -> CoreResult<Vec<Record>> {
        let limit = limit.max(1);
        let mut all_items = Vec::new();
        let mut offset = 0usize;

        loop {
            let query = [("limit", limit.to_string()), ("offset", offset.to_string())];
            tracing::info!("GET {}  limit={} offset={}", url, limit, offset);
            let response = self.transport.get(url, &query)?;
            let body = decode(url, ensure_success(url, response)?)?;

            let items = extract_items(&body);
            if items.is_empty() {
                break;
            }
            let page_len = items.len();
            all_items.extend(into_records(items));
            if page_len < limit {
                break;
            }
            offset += limit;
        }

        tracing::info!("Finished paging {} - {} items total.", url, all_items.len());
        Ok(all_items)
    }
}

fn ensure_success(url: &str, response: RawResponse) -> CoreResult<RawResponse> {
    if response.is_success() {
        return Ok(response);
    }
    let excerpt: String = response.body.chars().take(ERROR_BODY_EXCERPT).collect();
    tracing::error!("HTTP {} from {} - {}", response.status, url, excerpt);
    Err(CoreError::Status {
        status: response.status,
        url: url.to_string(),
        body: excerpt,
    })
}

fn decode(url: &str, response: RawResponse) -> CoreResult<Value> {
    serde_json::from_str(&response.body).map_err(|source| CoreError::Decode {
        url: url.to_string(),
        source,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::test_helpers::ScriptedTransport;
    use serde_json::json;
    use tracing_test::traced_test;

    fn page(count: usize, start: usize) -> String {
        let items: Vec<Value> = (start..start + count).map(|i| json!({"id": i})).collect();
        json!({"data": items}).to_string()
    }

    fn offset_of(query: &[(String, String)]) -> usize {
        query
            .iter()
            .find(|(k, _)| k == "offset")
            .and_then(|(_, v)| v.parse().ok())
            .unwrap()
    }

    #[test]
    fn test_token_must_not_be_blank() {
        assert!(matches!(ApiToken::new("  "), Err(CoreError::MissingToken)));
        let token = ApiToken::new(" secret ").unwrap();
        assert_eq!(token.expose(), "secret");
        assert_eq!(format!("{:?}", token), "ApiToken(***)");
    }

    #[test]
    fn test_pagination_stops_after_short_page() {
        let sizes = [100usize, 100, 37];
        let transport = ScriptedTransport::new(move |_, query| {
            let index = offset_of(query) / 100;
            let count = sizes.get(index).copied().unwrap_or(0);
            RawResponse::new(200, page(count, index * 100))
        });
        let client = RentmanClient::new(transport);

        let items = client
            .fetch_all_pages("https://api.test/projects/1/projectequipment", 100)
            .unwrap();

        assert_eq!(items.len(), 237);
        let offsets: Vec<usize> = client
            .transport()
            .requests()
            .iter()
            .map(|r| offset_of(&r.query))
            .collect();
        assert_eq!(offsets, vec![0, 100, 200]);
    }

    #[test]
    fn test_full_final_page_costs_one_empty_round_trip() {
        let sizes = [100usize, 100, 37];
        let transport = ScriptedTransport::new(move |_, query| {
            let index = offset_of(query) / 100;
            let count = if index < 2 { sizes[index] } else { 0 };
            RawResponse::new(200, page(count, index * 100))
        });
        let client = RentmanClient::new(transport);

        let items = client.fetch_all_pages("https://api.test/x", 100).unwrap();

        assert_eq!(items.len(), 200);
        assert_eq!(client.transport().requests().len(), 3);
    }

    #[test]
    fn test_pagination_over_bare_lists() {
        let transport = ScriptedTransport::new(|_, query| {
            let body = if offset_of(query) == 0 {
                json!([{"id": 1}, {"id": 2}])
            } else {
                json!([])
            };
            RawResponse::new(200, body.to_string())
        });
        let client = RentmanClient::new(transport);
        let items = client.fetch_all_pages("https://api.test/x", 2).unwrap();
        assert_eq!(items.len(), 2);
        assert_eq!(client.transport().requests().len(), 2);
    }

    #[test]
    fn test_pagination_error_discards_accumulated_pages() {
        let transport = ScriptedTransport::new(|_, query| {
            if offset_of(query) == 0 {
                RawResponse::new(200, page(10, 0))
            } else {
                RawResponse::new(500, "upstream exploded")
            }
        });
        let client = RentmanClient::new(transport);
        let err = client.fetch_all_pages("https://api.test/x", 10).unwrap_err();
        assert!(matches!(err, CoreError::Status { status: 500, .. }));
    }

    #[test]
    fn test_equipment_url_and_limit() {
        let transport = ScriptedTransport::new(|_, _| RawResponse::new(200, "[]"));
        let client = RentmanClient::new(transport)
            .base_url("https://api.test/")
            .page_limit(25);

        let items = client.fetch_equipment(ProjectId::new(791)).unwrap();

        assert!(items.is_empty());
        let requests = client.transport().requests();
        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0].url, "https://api.test/projects/791/projectequipment");
        assert!(requests[0]
            .query
            .contains(&("limit".to_string(), "25".to_string())));
    }

    #[test]
    fn test_batches_of_one_hundred() {
        let transport = ScriptedTransport::new(|_, query| {
            let ids: Vec<Value> = query[0]
                .1
                .split(',')
                .map(|id| json!({"id": id}))
                .collect();
            RawResponse::new(200, json!({"serialnumbers": ids}).to_string())
        });
        let client = RentmanClient::new(transport);
        let ids: Vec<SerialId> = (0..250).map(|i| i.to_string()).collect();

        let details = client.fetch_serial_details(&ids).unwrap();

        assert_eq!(details.len(), 250);
        let sizes: Vec<usize> = client
            .transport()
            .requests()
            .iter()
            .map(|r| {
                assert_eq!(r.url, "https://api.rentman.net/serialnumbers");
                assert_eq!(r.query[0].0, "id");
                r.query[0].1.split(',').count()
            })
            .collect();
        assert_eq!(sizes, vec![100, 100, 50]);
    }

    #[test]
    #[traced_test]
    fn test_not_found_batch_is_skipped() {
        let transport = ScriptedTransport::new(|_, query| {
            if query[0].1.starts_with("100,") {
                RawResponse::new(404, "not found")
            } else {
                let ids: Vec<Value> = query[0].1.split(',').map(|id| json!({"id": id})).collect();
                RawResponse::new(200, Value::Array(ids).to_string())
            }
        });
        let client = RentmanClient::new(transport);
        let ids: Vec<SerialId> = (0..250).map(|i| i.to_string()).collect();

        let details = client.fetch_serial_details(&ids).unwrap();

        assert_eq!(details.len(), 150);
        assert_eq!(client.transport().requests().len(), 3);
        assert!(logs_contain("Batch 2 returned 404, skipping."));
    }

    #[test]
    fn test_server_error_on_batch_aborts() {
        let transport = ScriptedTransport::new(|_, query| {
            if query[0].1.starts_with("100,") {
                RawResponse::new(502, "bad gateway")
            } else {
                RawResponse::new(200, "[]")
            }
        });
        let client = RentmanClient::new(transport);
        let ids: Vec<SerialId> = (0..250).map(|i| i.to_string()).collect();

        let err = client.fetch_serial_details(&ids).unwrap_err();

        assert!(matches!(err, CoreError::Status { status: 502, .. }));
        assert_eq!(client.transport().requests().len(), 2);
    }

    #[test]
    fn test_empty_id_list_makes_no_requests() {
        let transport = ScriptedTransport::new(|_, _| panic!("no request expected"));
        let client = RentmanClient::new(transport);
        assert!(client.fetch_serial_details(&[]).unwrap().is_empty());
        assert!(client.transport().requests().is_empty());
    }

    #[test]
    fn test_invalid_json_is_a_decode_error() {
        let transport = ScriptedTransport::new(|_, _| RawResponse::new(200, "<html>"));
        let client = RentmanClient::new(transport);
        let err = client.fetch_equipment(ProjectId::new(1)).unwrap_err();
        assert!(matches!(err, CoreError::Decode { .. }));
    }

    #[test]
    fn test_error_body_is_truncated() {
        let long = "x".repeat(2000);
        let transport = ScriptedTransport::new(move |_, _| RawResponse::new(401, long.clone()));
        let client = RentmanClient::new(transport);
        match client.fetch_equipment(ProjectId::new(1)) {
            Err(CoreError::Status { status, body, .. }) => {
                assert_eq!(status, 401);
                assert_eq!(body.len(), ERROR_BODY_EXCERPT);
            }
            other => panic!("expected status error, got {:?}", other.map(|v| v.len())),
        }
    }
}
