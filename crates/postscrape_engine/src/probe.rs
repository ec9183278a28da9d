use std::time::Duration;

use futures_util::StreamExt;
use postscrape_core::ProbeResult;
use postscrape_logging::{scrape_debug, short_url};
use reqwest::header::{
    HeaderMap, HeaderName, HeaderValue, CONTENT_LENGTH, CONTENT_RANGE, CONTENT_TYPE,
};

use crate::{Cookies, ProbeError, ProbeResponse, RequestHeaders};

const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64)";

/// Observed browser headers that must not be replayed on probe requests.
const NON_FORWARDABLE_HEADERS: [&str; 7] = [
    "host",
    "range",
    "cookie",
    "connection",
    "content-length",
    "accept-encoding",
    "upgrade-insecure-requests",
];

#[derive(Debug, Clone)]
pub struct ProbeSettings {
    pub user_agent: String,
    pub connect_timeout: Duration,
    /// HEAD used by the ranker to read a candidate's size.
    pub size_probe_timeout: Duration,
    /// Ranged GET used by the ranker to validate a candidate.
    pub validation_timeout: Duration,
    /// Both requests of [`probe`].
    pub probe_timeout: Duration,
    pub redirect_limit: usize,
    /// Upper bound of the `Range: bytes=0-N` request.
    pub range_bytes: u64,
    /// A candidate validates when more bytes than this are fetched or declared.
    pub min_validated_bytes: u64,
}

impl Default for ProbeSettings {
    fn default() -> Self {
        Self {
            user_agent: DEFAULT_USER_AGENT.to_string(),
            connect_timeout: Duration::from_secs(5),
            size_probe_timeout: Duration::from_secs(5),
            validation_timeout: Duration::from_secs(8),
            probe_timeout: Duration::from_secs(8),
            redirect_limit: 10,
            range_bytes: 200_000,
            min_validated_bytes: 16_000,
        }
    }
}

/// Network boundary used to check candidate URLs.
#[async_trait::async_trait]
pub trait ProbeClient: Send + Sync {
    /// Existence-only request.
    async fn head(
        &self,
        url: &str,
        headers: &RequestHeaders,
        timeout: Duration,
    ) -> Result<ProbeResponse, ProbeError>;

    /// `GET` with `Range: bytes=0-{range_bytes}`. Reads at most that many bytes
    /// of the body even when the server ignores the range.
    async fn get_range(
        &self,
        url: &str,
        headers: &RequestHeaders,
        range_bytes: u64,
        timeout: Duration,
    ) -> Result<ProbeResponse, ProbeError>;
}

#[derive(Debug, Clone)]
pub struct ReqwestProbeClient {
    client: reqwest::Client,
}

impl ReqwestProbeClient {
    pub fn new(settings: &ProbeSettings) -> Result<Self, ProbeError> {
        let client = reqwest::Client::builder()
            .connect_timeout(settings.connect_timeout)
            .redirect(reqwest::redirect::Policy::limited(settings.redirect_limit))
            .build()
            .map_err(|err| ProbeError::Network(err.to_string()))?;
        Ok(Self { client })
    }
}

#[async_trait::async_trait]
impl ProbeClient for ReqwestProbeClient {
    async fn head(
        &self,
        url: &str,
        headers: &RequestHeaders,
        timeout: Duration,
    ) -> Result<ProbeResponse, ProbeError> {
        let parsed =
            reqwest::Url::parse(url).map_err(|err| ProbeError::InvalidUrl(err.to_string()))?;
        let response = self
            .client
            .head(parsed)
            .headers(to_header_map(headers))
            .timeout(timeout)
            .send()
            .await
            .map_err(map_reqwest_error)?;

        Ok(describe(response.status().as_u16(), response.headers(), 0))
    }

    async fn get_range(
        &self,
        url: &str,
        headers: &RequestHeaders,
        range_bytes: u64,
        timeout: Duration,
    ) -> Result<ProbeResponse, ProbeError> {
        let parsed =
            reqwest::Url::parse(url).map_err(|err| ProbeError::InvalidUrl(err.to_string()))?;
        let mut header_map = to_header_map(headers);
        if let Ok(value) = HeaderValue::from_str(&format!("bytes=0-{range_bytes}")) {
            header_map.insert(reqwest::header::RANGE, value);
        }

        let response = self
            .client
            .get(parsed)
            .headers(header_map)
            .timeout(timeout)
            .send()
            .await
            .map_err(map_reqwest_error)?;

        let status = response.status().as_u16();
        let response_headers = response.headers().clone();

        // Inclusive range: 0..=range_bytes.
        let cap = range_bytes.saturating_add(1);
        let mut body_len = 0u64;
        let mut stream = response.bytes_stream();
        while let Some(chunk) = stream.next().await {
            let chunk = chunk.map_err(map_reqwest_error)?;
            body_len = body_len.saturating_add(chunk.len() as u64);
            if body_len >= cap {
                body_len = cap;
                break;
            }
        }

        Ok(describe(status, &response_headers, body_len))
    }
}

/// Checks that a candidate URL exists and reports its type and size.
///
/// Sends a HEAD first; when that does not answer 200 or 206, falls back to a
/// ranged GET. Status, content type and content length come from whichever
/// attempt produced the last response. When both attempts fail the last error
/// is kept. Never fails: every problem ends up in [`ProbeResult::error`].
pub async fn probe(
    client: &dyn ProbeClient,
    settings: &ProbeSettings,
    url: &str,
    referer: Option<&str>,
    cookies: &Cookies,
    extra_headers: Option<&RequestHeaders>,
) -> ProbeResult {
    let headers = request_headers(settings, referer, cookies, extra_headers);
    let mut result = ProbeResult {
        used_referer: referer.map(str::to_string),
        ..ProbeResult::default()
    };

    match client.head(url, &headers, settings.probe_timeout).await {
        Ok(response) => {
            record(&mut result, &response);
            if response.is_success() {
                result.ok = true;
                return result;
            }
        }
        Err(err) => {
            scrape_debug!("probe HEAD failed for {}: {}", short_url(url), err);
            result.error = Some(err.to_string());
        }
    }

    match client
        .get_range(url, &headers, settings.range_bytes, settings.probe_timeout)
        .await
    {
        Ok(response) => {
            record(&mut result, &response);
            result.ok = response.is_success();
            result.error = None;
        }
        Err(err) => {
            scrape_debug!("probe GET failed for {}: {}", short_url(url), err);
            result.error = Some(err.to_string());
        }
    }

    result
}

/// Builds the header set for a probe request.
///
/// Observed browser headers override the defaults, except those listed in
/// [`NON_FORWARDABLE_HEADERS`] and HTTP/2 pseudo-headers. The cookie header is
/// always built from `cookies`.
pub fn request_headers(
    settings: &ProbeSettings,
    referer: Option<&str>,
    cookies: &Cookies,
    extra_headers: Option<&RequestHeaders>,
) -> RequestHeaders {
    let mut headers = RequestHeaders::new();
    headers.insert("user-agent".to_string(), settings.user_agent.clone());
    if let Some(referer) = referer {
        headers.insert("referer".to_string(), referer.to_string());
    }

    for (name, value) in extra_headers.into_iter().flatten() {
        let name = name.to_ascii_lowercase();
        if name.starts_with(':') || NON_FORWARDABLE_HEADERS.contains(&name.as_str()) {
            continue;
        }
        headers.insert(name, value.clone());
    }

    if !cookies.is_empty() {
        headers.insert("cookie".to_string(), cookie_header(cookies));
    }
    headers
}

pub fn cookie_header(cookies: &Cookies) -> String {
    cookies
        .iter()
        .map(|(name, value)| format!("{name}={value}"))
        .collect::<Vec<_>>()
        .join("; ")
}

fn record(result: &mut ProbeResult, response: &ProbeResponse) {
    result.status = Some(response.status);
    result.content_type = response.content_type.clone();
    result.content_length = response.content_length;
}

fn to_header_map(headers: &RequestHeaders) -> HeaderMap {
    let mut map = HeaderMap::with_capacity(headers.len());
    for (name, value) in headers {
        let (Ok(name), Ok(value)) = (
            HeaderName::from_bytes(name.as_bytes()),
            HeaderValue::from_str(value),
        ) else {
            scrape_debug!("dropping unrepresentable header {}", name);
            continue;
        };
        map.insert(name, value);
    }
    map
}

fn describe(status: u16, headers: &HeaderMap, body_len: u64) -> ProbeResponse {
    let text = |name: HeaderName| {
        headers
            .get(name)
            .and_then(|value| value.to_str().ok())
            .map(|value| value.trim().to_string())
    };

    ProbeResponse {
        status,
        content_type: text(CONTENT_TYPE),
        content_length: text(CONTENT_LENGTH).and_then(|value| value.parse().ok()),
        total_length: text(CONTENT_RANGE).as_deref().and_then(parse_range_total),
        body_len,
    }
}

/// `bytes 0-199999/7340032` -> `7340032`. Unknown totals (`*`) yield `None`.
fn parse_range_total(content_range: &str) -> Option<u64> {
    content_range.rsplit('/').next()?.trim().parse().ok()
}

fn map_reqwest_error(err: reqwest::Error) -> ProbeError {
    if err.is_timeout() {
        return ProbeError::Timeout(err.to_string());
    }
    ProbeError::Network(err.to_string())
}
