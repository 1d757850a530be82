use super::models::Entry;
use super::resource::Resource;
use crate::reconciler::{Page, PageSource};
use futures::StreamExt;
use reqwest::redirect::Policy;
use secrecy::{ExposeSecret, SecretString};
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use url::Url;

const MAX_RETRIES: u32 = 3;
const MAX_RESPONSE_SIZE: usize = 10 * 1024 * 1024; // 10MB
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);
const DEFAULT_BACKOFF: Duration = Duration::from_secs(1);

/// Errors from talking to the API.
///
/// All of them are transient from the list's point of view: the feed reports
/// them and keeps its load-more trigger for a retry.
#[derive(Debug, Error)]
pub enum FetchError {
    /// Network-level error (DNS, connection, TLS, etc.)
    #[error("Request failed: {0}")]
    Network(#[from] reqwest::Error),
    /// HTTP response with non-2xx status code
    #[error("HTTP error: status {0}")]
    HttpStatus(u16),
    #[error("Request timed out")]
    Timeout,
    /// Server returned 429 Too Many Requests after max retries
    #[error("Rate limited after {0} retries")]
    RateLimited(u32),
    #[error("Response too large")]
    ResponseTooLarge,
    /// Body was not the JSON we expected
    #[error("Invalid response body: {0}")]
    Decode(#[from] serde_json::Error),
    #[error("Invalid API URL: {0}")]
    InvalidUrl(#[from] url::ParseError),
}

/// Which slice of a listing to request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PageQuery {
    /// `last` items before `before`.
    Older { before: Option<String>, last: usize },
    /// `first` items after `after`.
    Newer { after: Option<String>, first: usize },
}

impl PageQuery {
    pub fn older(cursor: Option<&str>, count: usize) -> Self {
        PageQuery::Older {
            before: cursor.map(str::to_owned),
            last: count,
        }
    }

    pub fn newer(cursor: Option<&str>, count: usize) -> Self {
        PageQuery::Newer {
            after: cursor.map(str::to_owned),
            first: count,
        }
    }

    fn pairs(&self) -> Vec<(&'static str, String)> {
        let (count_key, count, cursor_key, cursor) = match self {
            PageQuery::Older { before, last } => ("last", *last, "before", before),
            PageQuery::Newer { after, first } => ("first", *first, "after", after),
        };
        let mut pairs = vec![(count_key, count.to_string())];
        if let Some(cursor) = cursor {
            pairs.push((cursor_key, cursor.clone()));
        }
        pairs
    }
}

/// Limit redirects to 3 hops and refuse loops.
fn create_redirect_policy() -> Policy {
    Policy::custom(|attempt| {
        if attempt.previous().len() >= 3 {
            return attempt.error("Too many redirects (max 3)");
        }
        let url = attempt.url();
        if attempt.previous().iter().any(|prev| prev == url) {
            return attempt.error("Redirect loop detected");
        }
        attempt.follow()
    })
}

/// HTTP client for the social API.
///
/// Cheap to clone: the connection pool and token are shared.
#[derive(Clone)]
pub struct ApiClient {
    http: reqwest::Client,
    base: Url,
    token: Option<Arc<SecretString>>,
    backoff: Duration,
}

impl std::fmt::Debug for ApiClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApiClient")
            .field("base", &self.base.as_str())
            .field("token", &self.token.as_ref().map(|_| "[REDACTED]"))
            .finish()
    }
}

impl ApiClient {
    pub fn new(base_url: &str, token: Option<SecretString>) -> Result<Self, FetchError> {
        let mut base = Url::parse(base_url)?;
        // Url::join drops the last segment unless the base ends with '/'.
        if !base.path().ends_with('/') {
            let path = format!("{}/", base.path());
            base.set_path(&path);
        }

        // No client-wide timeout: live streams stay open indefinitely, so
        // each request wraps `send` in its own timeout instead.
        let http = reqwest::Client::builder()
            .redirect(create_redirect_policy())
            .pool_max_idle_per_host(4)
            .pool_idle_timeout(Duration::from_secs(30))
            .tcp_keepalive(Duration::from_secs(60))
            .build()?;

        Ok(Self {
            http,
            base,
            token: token.map(Arc::new),
            backoff: DEFAULT_BACKOFF,
        })
    }

    /// Base delay between retries; doubles on each attempt.
    pub fn with_backoff(mut self, backoff: Duration) -> Self {
        self.backoff = backoff;
        self
    }

    pub fn base_url(&self) -> &Url {
        &self.base
    }

    /// Build `<base>/api/<resource path>?<filter>&<query>`.
    pub fn endpoint(&self, resource: &Resource, query: Option<&PageQuery>) -> Result<Url, FetchError> {
        let mut url = self.base.join("api/")?;
        {
            let mut segments = url
                .path_segments_mut()
                .map_err(|_| url::ParseError::RelativeUrlWithCannotBeABaseBase)?;
            segments.pop_if_empty();
            segments.extend(resource.segments());
        }
        {
            let mut pairs = url.query_pairs_mut();
            if let Some((key, value)) = resource.filter() {
                pairs.append_pair(key, value);
            }
            if let Some(query) = query {
                for (key, value) in query.pairs() {
                    pairs.append_pair(key, &value);
                }
            }
        }
        // Don't leave a dangling '?' behind.
        if url.query() == Some("") {
            url.set_query(None);
        }
        Ok(url)
    }

    pub(crate) fn get(&self, url: Url) -> reqwest::RequestBuilder {
        let request = self.http.get(url);
        match &self.token {
            Some(token) => request.bearer_auth(token.expose_secret()),
            None => request,
        }
    }

    /// Fetch one page of `resource`.
    pub async fn fetch_page(
        &self,
        resource: &Resource,
        query: PageQuery,
    ) -> Result<Page<Entry>, FetchError> {
        let url = self.endpoint(resource, Some(&query))?;
        tracing::debug!(url = %url, "Fetching page");
        let bytes = self.get_with_retry(url).await?;
        let page = resource.kind().decode_page(&bytes)?;
        tracing::debug!(
            items = page.items.len(),
            end_cursor = ?page.end_cursor,
            "Fetched page"
        );
        Ok(page)
    }

    /// GET with retries on 429 and 5xx, exponential backoff.
    async fn get_with_retry(&self, url: Url) -> Result<Vec<u8>, FetchError> {
        let mut retry_count = 0;

        loop {
            let response = tokio::time::timeout(REQUEST_TIMEOUT, self.get(url.clone()).send())
                .await
                .map_err(|_| FetchError::Timeout)?
                .map_err(FetchError::Network)?;

            let status = response.status();
            let retryable =
                status == reqwest::StatusCode::TOO_MANY_REQUESTS || status.is_server_error();

            if retryable {
                if retry_count >= MAX_RETRIES {
                    return Err(if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
                        FetchError::RateLimited(MAX_RETRIES)
                    } else {
                        FetchError::HttpStatus(status.as_u16())
                    });
                }

                let delay = self.backoff * 2u32.pow(retry_count);
                tracing::warn!(
                    url = %url,
                    status = %status,
                    retry = retry_count,
                    delay_ms = delay.as_millis() as u64,
                    "Retryable API error, backing off"
                );
                tokio::time::sleep(delay).await;
                retry_count += 1;
                continue;
            }

            // 4xx fails immediately
            if !status.is_success() {
                return Err(FetchError::HttpStatus(status.as_u16()));
            }

            return read_limited_bytes(response, MAX_RESPONSE_SIZE).await;
        }
    }

    /// Open a text/event-stream connection for `resource`.
    pub(crate) async fn open_stream(
        &self,
        resource: &Resource,
        last_event_id: Option<&str>,
    ) -> Result<reqwest::Response, FetchError> {
        let url = self.endpoint(resource, None)?;
        let mut request = self
            .get(url)
            .header(reqwest::header::ACCEPT, "text/event-stream")
            .header(reqwest::header::CACHE_CONTROL, "no-cache");
        if let Some(id) = last_event_id {
            request = request.header("Last-Event-ID", id);
        }

        let response = tokio::time::timeout(REQUEST_TIMEOUT, request.send())
            .await
            .map_err(|_| FetchError::Timeout)?
            .map_err(FetchError::Network)?;

        if !response.status().is_success() {
            return Err(FetchError::HttpStatus(response.status().as_u16()));
        }
        Ok(response)
    }

    /// Bind this client to one resource so a feed can page through it.
    pub fn source(&self, resource: Resource) -> ResourceSource {
        ResourceSource {
            client: self.clone(),
            resource,
        }
    }
}

async fn read_limited_bytes(
    response: reqwest::Response,
    limit: usize,
) -> Result<Vec<u8>, FetchError> {
    if let Some(len) = response.content_length() {
        if len as usize > limit {
            return Err(FetchError::ResponseTooLarge);
        }
    }

    let mut bytes = Vec::new();
    let mut stream = response.bytes_stream();
    while let Some(chunk) = stream.next().await {
        let chunk = chunk.map_err(FetchError::Network)?;
        if bytes.len().saturating_add(chunk.len()) > limit {
            return Err(FetchError::ResponseTooLarge);
        }
        bytes.extend_from_slice(&chunk);
    }
    Ok(bytes)
}

/// One resource of one API, as a paginated source of entries.
#[derive(Debug, Clone)]
pub struct ResourceSource {
    client: ApiClient,
    resource: Resource,
}

impl ResourceSource {
    pub fn resource(&self) -> &Resource {
        &self.resource
    }

    pub fn client(&self) -> &ApiClient {
        &self.client
    }
}

impl PageSource<Entry> for ResourceSource {
    type Error = FetchError;

    async fn fetch_page(
        &self,
        cursor: Option<&str>,
        count: usize,
    ) -> Result<Page<Entry>, FetchError> {
        self.client
            .fetch_page(&self.resource, PageQuery::older(cursor, count))
            .await
    }
}
