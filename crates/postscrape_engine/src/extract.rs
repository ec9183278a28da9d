use std::sync::LazyLock;

use postscrape_core::MOBILE_BASE_URL;
use postscrape_logging::{scrape_debug, short_url};
use regex::Regex;
use scraper::{ElementRef, Html, Selector};

/// Field names under which the page embeds playable URLs in its JSON blobs,
/// in the order they are tried.
const PLAYABLE_URL_FIELDS: [&str; 8] = [
    "playable_url",
    "playable_url_quality_hd",
    "playable_url_quality_sd",
    "hd_src",
    "sd_src",
    "sd_src_no_ratelimit",
    "hd_src_no_ratelimit",
    "fallback_playable_url",
];

static PLAYABLE_URL_PATTERNS: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    let mut patterns: Vec<Regex> = PLAYABLE_URL_FIELDS
        .iter()
        .filter_map(|field| Regex::new(&format!(r#""{field}":"(https:[^"]+)""#)).ok())
        .collect();
    // Doubly escaped `src` inside a JSON string that itself holds JSON.
    patterns.extend(Regex::new(r#"src\\":"(https://video[^"]+)"#).ok());
    patterns
});

static CDN_URL_PATTERN: LazyLock<Option<Regex>> =
    LazyLock::new(|| Regex::new(r#"https://[a-z0-9.\-]*fbcdn\.net[^"'>\s]+"#).ok());

static UNICODE_ESCAPE: LazyLock<Option<Regex>> =
    LazyLock::new(|| Regex::new(r"\\u([0-9a-fA-F]{4})").ok());

/// A rendered page: the parsed tree plus the markup it came from.
///
/// Not `Send`; build it, query it and drop it without awaiting in between.
pub struct PageDocument {
    html: Html,
    markup: String,
}

impl PageDocument {
    pub fn parse(markup: impl Into<String>) -> Self {
        let markup = markup.into();
        Self {
            html: Html::parse_document(&markup),
            markup,
        }
    }

    pub fn html(&self) -> &Html {
        &self.html
    }

    pub fn markup(&self) -> &str {
        &self.markup
    }

    fn first(&self, selector: &str) -> Option<ElementRef<'_>> {
        let selector = Selector::parse(selector).ok()?;
        self.html.select(&selector).next()
    }
}

/// One way of spotting the video URL on a rendered page.
pub trait VideoUrlStrategy: Send + Sync {
    fn name(&self) -> &'static str;
    fn find(&self, doc: &PageDocument) -> Option<String>;
}

/// `<meta property="og:video">` or `og:video:url`.
#[derive(Debug, Default)]
pub struct MetaTagStrategy;

impl VideoUrlStrategy for MetaTagStrategy {
    fn name(&self) -> &'static str {
        "meta-tag"
    }

    fn find(&self, doc: &PageDocument) -> Option<String> {
        [r#"meta[property="og:video"]"#, r#"meta[property="og:video:url"]"#]
            .into_iter()
            .filter_map(|selector| doc.first(selector))
            .find_map(|meta| non_empty_attr(meta, "content"))
    }
}

/// The first `<video>` element's `src` / `data-src`, or its first `<source>`.
#[derive(Debug, Default)]
pub struct VideoElementStrategy;

impl VideoUrlStrategy for VideoElementStrategy {
    fn name(&self) -> &'static str {
        "video-element"
    }

    fn find(&self, doc: &PageDocument) -> Option<String> {
        let video = doc.first("video")?;
        if let Some(src) = non_empty_attr(video, "src").or_else(|| non_empty_attr(video, "data-src"))
        {
            return Some(src);
        }
        let source = Selector::parse("source").ok()?;
        video
            .select(&source)
            .next()
            .and_then(|source| non_empty_attr(source, "src"))
    }
}

/// Playable-URL fields embedded as JSON in the raw markup.
#[derive(Debug, Default)]
pub struct EmbeddedJsonStrategy;

impl VideoUrlStrategy for EmbeddedJsonStrategy {
    fn name(&self) -> &'static str {
        "embedded-json"
    }

    fn find(&self, doc: &PageDocument) -> Option<String> {
        PLAYABLE_URL_PATTERNS
            .iter()
            .find_map(|pattern| pattern.captures(doc.markup()))
            .and_then(|captures| captures.get(1))
            .map(|m| unescape_json_url(m.as_str().trim_end_matches('\\')))
    }
}

/// Anchors that point at a playback page.
#[derive(Debug, Default)]
pub struct PlaybackAnchorStrategy;

impl VideoUrlStrategy for PlaybackAnchorStrategy {
    fn name(&self) -> &'static str {
        "playback-anchor"
    }

    fn find(&self, doc: &PageDocument) -> Option<String> {
        let anchors = Selector::parse("a[href]").ok()?;
        doc.html()
            .select(&anchors)
            .filter_map(|a| a.value().attr("href"))
            .map(str::trim)
            .find(|href| {
                href.contains("video.php") || (href.contains("play") && href.contains("fbcdn"))
            })
            .map(|href| {
                if href.starts_with('/') {
                    format!("{MOBILE_BASE_URL}{href}")
                } else {
                    href.to_string()
                }
            })
    }
}

/// Any media CDN URL anywhere in the markup.
#[derive(Debug, Default)]
pub struct CdnScanStrategy;

impl VideoUrlStrategy for CdnScanStrategy {
    fn name(&self) -> &'static str {
        "cdn-scan"
    }

    fn find(&self, doc: &PageDocument) -> Option<String> {
        CDN_URL_PATTERN
            .as_ref()?
            .find(doc.markup())
            .map(|m| m.as_str().to_string())
    }
}

/// The strategies in priority order, cheapest and most specific first.
pub fn default_strategies() -> Vec<Box<dyn VideoUrlStrategy>> {
    vec![
        Box::new(MetaTagStrategy),
        Box::new(VideoElementStrategy),
        Box::new(EmbeddedJsonStrategy),
        Box::new(PlaybackAnchorStrategy),
        Box::new(CdnScanStrategy),
    ]
}

/// Runs `strategies` in order and returns the first URL found.
pub fn extract_with(strategies: &[Box<dyn VideoUrlStrategy>], doc: &PageDocument) -> Option<String> {
    strategies.iter().find_map(|strategy| {
        let found = strategy.find(doc)?;
        scrape_debug!("{} found {}", strategy.name(), short_url(&found));
        Some(found)
    })
}

/// Single-shortcut search over the default strategies.
pub fn extract_video_url(doc: &PageDocument) -> Option<String> {
    extract_with(&default_strategies(), doc)
}

/// Undoes the escaping JSON applies inside string values: `\uXXXX` and `\/`,
/// including the doubled form of the latter.
pub fn unescape_json_url(raw: &str) -> String {
    let decoded = match UNICODE_ESCAPE.as_ref() {
        Some(pattern) => pattern
            .replace_all(raw, |caps: &regex::Captures<'_>| {
                u32::from_str_radix(&caps[1], 16)
                    .ok()
                    .and_then(char::from_u32)
                    .map(String::from)
                    .unwrap_or_else(|| caps[0].to_string())
            })
            .into_owned(),
        None => raw.to_string(),
    };
    decoded.replace("\\\\/", "/").replace("\\/", "/")
}

fn non_empty_attr(element: ElementRef<'_>, name: &str) -> Option<String> {
    element
        .value()
        .attr(name)
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .map(str::to_string)
}
