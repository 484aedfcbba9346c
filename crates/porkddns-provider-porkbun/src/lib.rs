// # Porkbun DNS Provider
//
// This crate provides the Porkbun registrar implementation of `DnsProvider`.
//
// ## Calls
//
// Every call is a POST with a JSON body carrying both credentials:
//
// - Ping: POST `/ping`
// - List DNS Records: POST `/dns/retrieve/:domain`
// - Edit DNS Record: POST `/dns/edit/:domain/:record_id`
//
// ## Error Handling
//
// - The response body is decoded regardless of the HTTP status code; the
//   registrar reports failures through the `status` field
// - A body that is not valid JSON is retried up to the configured bound
// - Valid JSON without a string `status` is a failed status, never retried
// - Transport failures are returned immediately
// - Error messages never quote the response body
//
// ## Security
//
// - Credentials only ever appear in request bodies, never in URLs
// - The Debug implementation does not expose them
//
// ## API Reference
//
// - Porkbun API v3: https://porkbun.com/api/json/v3/documentation

use async_trait::async_trait;
use porkddns_core::config::RegistrarConfig;
use porkddns_core::retry::{RetryPolicy, retry_with_policy};
use porkddns_core::traits::{ApiStatus, DnsProvider, DnsRecord, RecordUpdate};
use porkddns_core::{Error, Result};
use serde::Serialize;
use serde_json::Value;

/// TTL sent with every record edit
const RECORD_TTL: &str = "300";

/// Porkbun DNS provider
///
/// Stateless apart from the HTTP client: each trait call is one logical
/// request (plus decode retries).
pub struct PorkbunProvider {
    /// Porkbun API key
    /// ⚠️ NEVER log this value
    api_key: String,

    /// Porkbun secret API key
    /// ⚠️ NEVER log this value
    secret_api_key: String,

    /// API base URL without trailing slash
    base_url: String,

    /// HTTP client for API requests
    client: reqwest::Client,

    /// Bound on retries of undecodable responses
    decode_retry: RetryPolicy,
}

// Custom Debug implementation that hides the credentials
impl std::fmt::Debug for PorkbunProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PorkbunProvider")
            .field("api_key", &"<REDACTED>")
            .field("secret_api_key", &"<REDACTED>")
            .field("base_url", &self.base_url)
            .field("decode_retry", &self.decode_retry)
            .finish()
    }
}

/// Credential fields shared by every request body
#[derive(Debug, Clone, Copy, Serialize)]
struct Credentials<'a> {
    apikey: &'a str,
    secretapikey: &'a str,
}

#[derive(Serialize)]
struct RetrieveRequest<'a> {
    #[serde(flatten)]
    credentials: Credentials<'a>,
    start: &'a str,
    #[serde(rename = "includeLabels")]
    include_labels: &'a str,
}

#[derive(Serialize)]
struct EditRequest<'a> {
    #[serde(flatten)]
    credentials: Credentials<'a>,
    name: &'a str,
    #[serde(rename = "type")]
    record_type: &'a str,
    content: &'a str,
    ttl: &'a str,
}

/// Status carried by any registrar reply
///
/// Anything other than a string `status` field, including non-object
/// bodies, reads as a failure.
fn status_of(reply: &Value) -> ApiStatus {
    let field = |name: &str| reply.get(name).and_then(Value::as_str).map(str::to_string);
    ApiStatus::from_fields(field("status"), field("message"))
}

impl PorkbunProvider {
    /// Create a new Porkbun provider
    ///
    /// # Parameters
    ///
    /// - `config`: Credentials, endpoint, timeout and decode retry settings
    ///
    /// # Returns
    ///
    /// - `Err(Error::Config)` if a credential is empty or the HTTP client
    ///   cannot be built
    pub fn from_config(config: &RegistrarConfig) -> Result<Self> {
        if config.api_key.is_empty() || config.secret_api_key.is_empty() {
            return Err(Error::config("Porkbun API key and secret API key are required"));
        }

        let client = reqwest::Client::builder()
            .timeout(config.timeout())
            .build()
            .map_err(|e| Error::config(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            api_key: config.api_key.clone(),
            secret_api_key: config.secret_api_key.clone(),
            base_url: config.base_url.trim_end_matches('/').to_string(),
            client,
            decode_retry: config.decode_retry_policy(),
        })
    }

    fn credentials(&self) -> Credentials<'_> {
        Credentials {
            apikey: &self.api_key,
            secretapikey: &self.secret_api_key,
        }
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path)
    }

    /// POST `body` to `path`, retrying while the response does not decode
    async fn call<B>(&self, operation: &str, path: &str, body: &B) -> Result<Value>
    where
        B: Serialize + Sync,
    {
        let url = self.endpoint(path);
        let url = url.as_str();

        retry_with_policy(operation, &self.decode_retry, Error::is_decode, move || {
            self.post_json(url, body)
        })
        .await
    }

    /// One POST; the body is parsed whatever the HTTP status
    async fn post_json<B>(&self, url: &str, body: &B) -> Result<Value>
    where
        B: Serialize + Sync,
    {
        let response = self
            .client
            .post(url)
            .json(body)
            .send()
            .await
            .map_err(|e| classify(url, e))?;

        let status = response.status();
        let text = response.text().await.map_err(|e| classify(url, e))?;
        tracing::debug!("POST {} -> HTTP {}", url, status);

        // The body may echo request fields, so only the parser position is kept
        serde_json::from_str(&text).map_err(|e| {
            Error::decode(format!(
                "{} (HTTP {}) returned a body that is not valid JSON ({})",
                url, status, e
            ))
        })
    }
}

/// Split transport errors into connection failures and the rest
fn classify(url: &str, e: reqwest::Error) -> Error {
    if e.is_connect() || e.is_timeout() {
        Error::connection(format!("Could not reach {}: {}", url, e))
    } else {
        Error::http(format!("Request to {} failed: {}", url, e))
    }
}

#[async_trait]
impl DnsProvider for PorkbunProvider {
    async fn ping(&self) -> Result<ApiStatus> {
        let reply = self.call("ping", "ping", &self.credentials()).await?;
        Ok(status_of(&reply))
    }

    async fn list_records(&self, domain: &str) -> Result<Vec<DnsRecord>> {
        let request = RetrieveRequest {
            credentials: self.credentials(),
            start: "1",
            include_labels: "yes",
        };

        let mut reply = self
            .call(
                "record listing",
                &format!("dns/retrieve/{}", domain),
                &request,
            )
            .await?;

        let status = status_of(&reply);
        if !status.is_success() {
            return Err(Error::dns_provider(format!(
                "Porkbun refused to list records for {}: {}",
                domain, status
            )));
        }

        let records: Vec<DnsRecord> = match reply.get_mut("records").map(Value::take) {
            None | Some(Value::Null) => Vec::new(),
            Some(records) => serde_json::from_value(records).map_err(|e| {
                Error::dns_provider(format!(
                    "Porkbun listed records for {} in an unexpected shape: {}",
                    domain, e
                ))
            })?,
        };

        tracing::debug!("Porkbun listed {} record(s) for {}", records.len(), domain);
        Ok(records)
    }

    async fn update_record(&self, domain: &str, update: &RecordUpdate) -> Result<ApiStatus> {
        let request = EditRequest {
            credentials: self.credentials(),
            name: &update.name,
            record_type: &update.record_type,
            content: &update.content,
            ttl: RECORD_TTL,
        };

        let reply = self
            .call(
                "record update",
                &format!("dns/edit/{}/{}", domain, update.record_id),
                &request,
            )
            .await?;

        Ok(status_of(&reply))
    }

    fn provider_name(&self) -> &'static str {
        "porkbun"
    }
}
