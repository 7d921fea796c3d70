use std::net::Ipv4Addr;

use log::debug;
use reqwest::{Client, Response, StatusCode};
use serde::de::{DeserializeOwned, IgnoredAny};
use serde::{Deserialize, Serialize};

use super::{ApiError, CloudflareAPI};

const RECORD_TYPE: &str = "A";

/// An existing DNS record, as listed by the API.
#[derive(Deserialize, Debug, Clone, PartialEq, Eq)]
pub(crate) struct DnsRecord {
    pub(crate) id: String,
    #[serde(rename = "type")]
    pub(crate) record_type: String,
    pub(crate) name: String,
    pub(crate) content: String,
    /// 1 means "automatic"
    #[serde(default = "automatic_ttl")]
    pub(crate) ttl: u32,
    #[serde(default)]
    pub(crate) proxied: Option<bool>,
}

fn automatic_ttl() -> u32 {
    1
}

#[derive(Debug, PartialEq, Eq)]
pub(crate) enum RecordLookup {
    Found(DnsRecord),
    NotFound,
    /// More than one record matched; carries how many.
    Ambiguous(usize),
}

#[derive(Serialize, Debug)]
struct UpdatePayload<'r> {
    #[serde(rename = "type")]
    record_type: &'r str,
    name: &'r str,
    content: String,
    ttl: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    proxied: Option<bool>,
}

#[derive(Deserialize, Debug)]
struct Message {
    message: String,
}

#[derive(Deserialize, Debug)]
struct ResultInfo {
    total_count: usize,
}

/// The wrapper every Cloudflare v4 response comes in.
#[derive(Deserialize, Debug)]
struct Envelope<T> {
    #[serde(default)]
    success: bool,
    #[serde(default)]
    errors: Vec<Message>,
    result: Option<T>,
    result_info: Option<ResultInfo>,
}

impl<T> Envelope<T> {
    fn first_error(&self) -> Option<String> {
        self.errors.first().map(|error| error.message.clone())
    }
}

async fn read_envelope<T: DeserializeOwned>(response: Response) -> Result<Envelope<T>, ApiError> {
    let status = response.status();
    let body = response.text().await?;
    let envelope: Envelope<T> = match serde_json::from_str(&body) {
        Ok(envelope) => envelope,
        Err(_) => return Err(ApiError::Malformed(body)),
    };

    if !status.is_success() {
        let message = match envelope.first_error() {
            Some(message) => message,
            None => return Err(ApiError::Malformed(body)),
        };
        if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
            return Err(ApiError::Unauthorized { status, message });
        }
        return Err(ApiError::Status { status, message });
    }

    if !envelope.success {
        return match envelope.first_error() {
            Some(message) => Err(ApiError::Rejected(message)),
            None => Err(ApiError::Malformed(body)),
        };
    }

    Ok(envelope)
}

pub(crate) async fn find_record(
    client: &Client,
    api: &CloudflareAPI<'_>,
    domain: &str,
) -> Result<RecordLookup, ApiError> {
    let url = api.records_url()?;
    debug!("Listing {} records for {} at {}", RECORD_TYPE, domain, url);
    let response = client
        .get(url)
        .query(&[("type", RECORD_TYPE), ("name", domain)])
        .send()
        .await?;
    let envelope: Envelope<Vec<DnsRecord>> = read_envelope(response).await?;

    let records = envelope
        .result
        .ok_or_else(|| ApiError::Malformed("response has no result".to_string()))?;
    let total = envelope
        .result_info
        .map(|info| info.total_count)
        .unwrap_or(0)
        .max(records.len());

    Ok(match total {
        0 => RecordLookup::NotFound,
        1 => match records.into_iter().next() {
            Some(record) if record.record_type == RECORD_TYPE => RecordLookup::Found(record),
            Some(record) => {
                return Err(ApiError::Malformed(format!(
                    "asked for {} records but got a {} record",
                    RECORD_TYPE, record.record_type
                )))
            }
            None => {
                return Err(ApiError::Malformed(
                    "record count is 1 but no record was returned".to_string(),
                ))
            }
        },
        count => RecordLookup::Ambiguous(count),
    })
}

/// Points `record` at `ip`. Everything except the content is sent back as it was.
pub(crate) async fn update_record(
    client: &Client,
    api: &CloudflareAPI<'_>,
    record: &DnsRecord,
    ip: Ipv4Addr,
) -> Result<(), ApiError> {
    let url = api.record_url(&record.id)?;
    let payload = UpdatePayload {
        record_type: RECORD_TYPE,
        name: &record.name,
        content: ip.to_string(),
        ttl: record.ttl,
        proxied: record.proxied,
    };
    debug!("Updating record {} at {}", record.id, url);
    let response = client.put(url).json(&payload).send().await?;
    read_envelope::<IgnoredAny>(response).await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use std::net::Ipv4Addr;

    use httpmock::MockServer;
    use reqwest::{Client, StatusCode};
    use serde_json::json;

    use super::{find_record, update_record, DnsRecord, RecordLookup};
    use crate::cloudflare::{ApiError, CloudflareAPI};

    const RECORD_ID: &str = "EDKaYKD5s5Hvuhk4mGDHd4Ovi9pdM4NMTwoF7t85";

    fn record(content: &str) -> serde_json::Value {
        json!({
            "id": RECORD_ID,
            "type": "A",
            "name": "example.com",
            "content": content,
            "ttl": 300,
            "proxied": false,
        })
    }

    async fn lookup(server: &MockServer) -> Result<RecordLookup, ApiError> {
        let base_url = server.base_url();
        let api = CloudflareAPI {
            base_url: &base_url,
            zone_id: "Z1",
        };
        find_record(&Client::new(), &api, "example.com").await
    }

    #[tokio::test]
    async fn single_record() {
        let server = MockServer::start_async().await;
        let mock = server
            .mock_async(|when, then| {
                when.method("GET")
                    .path("/zones/Z1/dns_records")
                    .query_param("type", "A")
                    .query_param("name", "example.com");
                then.status(200).json_body(json!({
                    "success": true,
                    "errors": [],
                    "result": [record("192.168.0.255")],
                    "result_info": {"total_count": 1},
                }));
            })
            .await;

        let found = lookup(&server).await.expect("Lookup failed");
        mock.assert_async().await;
        assert_eq!(
            found,
            RecordLookup::Found(DnsRecord {
                id: RECORD_ID.to_string(),
                record_type: "A".to_string(),
                name: "example.com".to_string(),
                content: "192.168.0.255".to_string(),
                ttl: 300,
                proxied: Some(false),
            })
        );
    }

    #[tokio::test]
    async fn no_records() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method("GET").path("/zones/Z1/dns_records");
                then.status(200).json_body(json!({
                    "success": true,
                    "errors": [],
                    "result": [],
                    "result_info": {"total_count": 0},
                }));
            })
            .await;

        assert_eq!(lookup(&server).await.expect("Lookup failed"), RecordLookup::NotFound);
    }

    #[tokio::test]
    async fn multiple_records() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method("GET").path("/zones/Z1/dns_records");
                then.status(200).json_body(json!({
                    "success": true,
                    "errors": [],
                    "result": [record("192.168.0.1"), record("192.168.0.2")],
                    "result_info": {"total_count": 2},
                }));
            })
            .await;

        assert_eq!(lookup(&server).await.expect("Lookup failed"), RecordLookup::Ambiguous(2));
    }

    #[tokio::test]
    async fn paged_count_counts() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method("GET").path("/zones/Z1/dns_records");
                then.status(200).json_body(json!({
                    "success": true,
                    "errors": [],
                    "result": [record("192.168.0.1")],
                    "result_info": {"total_count": 3},
                }));
            })
            .await;

        assert_eq!(lookup(&server).await.expect("Lookup failed"), RecordLookup::Ambiguous(3));
    }

    #[tokio::test]
    async fn invalid_payload() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method("GET").path("/zones/Z1/dns_records");
                then.status(200).body("abc");
            })
            .await;

        let err = lookup(&server).await.unwrap_err();
        assert_eq!(err.to_string(), "Cloudflare API response was malformed: abc");
    }

    #[tokio::test]
    async fn operation_failure_with_valid_payload() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method("GET").path("/zones/Z1/dns_records");
                then.status(200)
                    .body(r#"{"success":false,"errors":[{"message":"Bad request"}]}"#);
            })
            .await;

        let err = lookup(&server).await.unwrap_err();
        assert_eq!(err.to_string(), "Operation failed: Bad request");
    }

    #[tokio::test]
    async fn request_failure_with_error_payload() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method("GET").path("/zones/Z1/dns_records");
                then.status(400)
                    .body(r#"{"success":false,"errors":[{"code":1004,"message":"Bad request"}]}"#);
            })
            .await;

        let err = lookup(&server).await.unwrap_err();
        assert!(matches!(
            err,
            ApiError::Status { status, ref message }
                if status == StatusCode::BAD_REQUEST && message == "Bad request"
        ));
    }

    #[tokio::test]
    async fn request_failure_without_error_payload() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method("GET").path("/zones/Z1/dns_records");
                then.status(400).body("{}");
            })
            .await;

        let err = lookup(&server).await.unwrap_err();
        assert_eq!(err.to_string(), "Cloudflare API response was malformed: {}");
    }

    #[tokio::test]
    async fn unusable_record_id() {
        let server = MockServer::start_async().await;
        let mock = server
            .mock_async(|when, then| {
                when.method("PUT");
                then.status(200).body(r#"{"success":true,"errors":[]}"#);
            })
            .await;

        let base_url = server.base_url();
        let api = CloudflareAPI {
            base_url: &base_url,
            zone_id: "Z1",
        };
        let existing = DnsRecord {
            id: "..".to_string(),
            record_type: "A".to_string(),
            name: "example.com".to_string(),
            content: "203.0.113.5".to_string(),
            ttl: 1,
            proxied: None,
        };
        let err = update_record(&Client::new(), &api, &existing, Ipv4Addr::new(203, 0, 113, 7))
            .await
            .unwrap_err();
        assert!(matches!(err, ApiError::InvalidUrl(_)));
        assert_eq!(mock.hits_async().await, 0);
    }

    #[tokio::test]
    async fn bad_token() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method("GET").path("/zones/Z1/dns_records");
                then.status(403).body(
                    r#"{"success":false,"errors":[{"code":9109,"message":"Invalid access token"}]}"#,
                );
            })
            .await;

        let err = lookup(&server).await.unwrap_err();
        assert!(matches!(
            err,
            ApiError::Unauthorized { status, .. } if status == StatusCode::FORBIDDEN
        ));
    }

    #[tokio::test]
    async fn update_keeps_everything_but_content() {
        let server = MockServer::start_async().await;
        let mock = server
            .mock_async(|when, then| {
                when.method("PUT")
                    .path(format!("/zones/Z1/dns_records/{RECORD_ID}"))
                    .json_body(json!({
                        "type": "A",
                        "name": "example.com",
                        "content": "203.0.113.7",
                        "ttl": 300,
                        "proxied": true,
                    }));
                then.status(200).json_body(json!({
                    "success": true,
                    "errors": [],
                    "result": record("203.0.113.7"),
                }));
            })
            .await;

        let base_url = server.base_url();
        let api = CloudflareAPI {
            base_url: &base_url,
            zone_id: "Z1",
        };
        let existing = DnsRecord {
            id: RECORD_ID.to_string(),
            record_type: "A".to_string(),
            name: "example.com".to_string(),
            content: "203.0.113.5".to_string(),
            ttl: 300,
            proxied: Some(true),
        };
        update_record(&Client::new(), &api, &existing, Ipv4Addr::new(203, 0, 113, 7))
            .await
            .expect("Update failed");
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn update_rejected() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method("PUT").path(format!("/zones/Z1/dns_records/{RECORD_ID}"));
                then.status(200)
                    .body(r#"{"success":false,"errors":[{"message":"Record is locked"}]}"#);
            })
            .await;

        let base_url = server.base_url();
        let api = CloudflareAPI {
            base_url: &base_url,
            zone_id: "Z1",
        };
        let existing = DnsRecord {
            id: RECORD_ID.to_string(),
            record_type: "A".to_string(),
            name: "example.com".to_string(),
            content: "203.0.113.5".to_string(),
            ttl: 1,
            proxied: None,
        };
        let err = update_record(&Client::new(), &api, &existing, Ipv4Addr::new(203, 0, 113, 7))
            .await
            .unwrap_err();
        assert!(matches!(err, ApiError::Rejected(ref message) if message == "Record is locked"));
    }
}
