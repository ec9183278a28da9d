use url::Url;

/// Base of the mobile rendering; relative playback links resolve against it.
pub const MOBILE_BASE_URL: &str = "https://m.facebook.com";

/// Query parameters that mark a URL as one segment of a larger media file.
pub const BYTE_RANGE_PARAMS: [&str; 2] = ["bytestart", "byteend"];

const VIDEO_MARKERS: [&str; 3] = [".mp4", ".m3u8", crate::FAST_STREAM_FRAGMENT];

/// A post URL together with its mobile rendering. Built once, never mutated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScrapeTarget {
    pub url: String,
    pub mobile_url: String,
}

impl ScrapeTarget {
    pub fn new(url: impl Into<String>) -> Self {
        let url = url.into();
        let mobile_url = to_mobile_url(&url);
        Self { url, mobile_url }
    }
}

/// Canonicalizes a post URL to the mobile rendering domain.
///
/// Adds `https://` when no scheme is present, lower-cases the host, drops a
/// leading `www.` and prefixes `m.` unless the host already has it. Path,
/// query and fragment are kept. Idempotent.
pub fn to_mobile_url(url: &str) -> String {
    let url = url.trim();
    let with_scheme = if has_web_scheme(url) {
        url.to_string()
    } else {
        format!("https://{url}")
    };

    let Ok(mut parsed) = Url::parse(&with_scheme) else {
        return with_scheme;
    };
    let Some(host) = parsed.host_str().map(str::to_ascii_lowercase) else {
        return with_scheme;
    };

    let host = host.strip_prefix("www.").unwrap_or(&host);
    let mobile_host = if host.starts_with("m.") {
        host.to_string()
    } else {
        format!("m.{host}")
    };

    if parsed.set_host(Some(&mobile_host)).is_err() {
        return with_scheme;
    }
    parsed.into()
}

fn has_web_scheme(url: &str) -> bool {
    Url::parse(url).is_ok_and(|parsed| matches!(parsed.scheme(), "http" | "https"))
}

/// Removes `bytestart` / `byteend` query parameters from a media URL.
///
/// The remaining pairs keep their relative order. URLs without byte-range
/// parameters, and anything that fails to parse, come back unchanged.
pub fn strip_byte_range_params(url: &str) -> String {
    let Ok(mut parsed) = Url::parse(url) else {
        return url.to_string();
    };
    if parsed.query().is_none() {
        return url.to_string();
    }

    let mut removed = false;
    let kept: Vec<(String, String)> = parsed
        .query_pairs()
        .filter(|(key, _)| {
            let key: &str = key.as_ref();
            let byte_range = BYTE_RANGE_PARAMS.contains(&key);
            removed |= byte_range;
            !byte_range
        })
        .map(|(key, value)| (key.into_owned(), value.into_owned()))
        .collect();

    if !removed {
        return url.to_string();
    }

    if kept.is_empty() {
        parsed.set_query(None);
    } else {
        parsed.query_pairs_mut().clear().extend_pairs(kept.iter());
    }
    parsed.into()
}

/// `blob:` URLs reference in-page memory and cannot be fetched on their own.
pub fn is_blob_url(url: &str) -> bool {
    url.trim_start().starts_with("blob:")
}

/// True when the URL has the shape of a playable media resource.
pub fn looks_like_video(url: &str) -> bool {
    let low = url.to_ascii_lowercase();
    VIDEO_MARKERS.iter().any(|marker| low.contains(marker))
}
