use std::time::Duration;

use postscrape_core::{ParsedPostRef, PostContent};
use scraper::{Html, Selector};

use crate::browser::BrowserSession;
use crate::signals::SCROLL_SCRIPT;
use crate::BrowserError;

/// Post text is cut to this many characters.
pub const MAX_POST_TEXT_CHARS: usize = 500;

const MIN_BLOCK_TEXT_CHARS: usize = 20;
const MIN_LINE_TEXT_CHARS: usize = 30;

/// Image URLs served from the content CDN that are chrome, not post media.
const IMAGE_NOISE_MARKERS: [&str; 4] = ["emoji", "static", "safe_image", "rsrc.php"];

#[derive(Debug, Clone)]
pub struct PostSettings {
    pub render_settle: Duration,
    pub scroll_settle: Duration,
}

impl Default for PostSettings {
    fn default() -> Self {
        Self {
            render_settle: Duration::from_secs(3),
            scroll_settle: Duration::from_secs(2),
        }
    }
}

/// Loads a post's mobile rendering and returns its markup after scrolling to
/// the bottom once.
pub async fn load_post_markup(
    session: &dyn BrowserSession,
    mobile_url: &str,
    settings: &PostSettings,
) -> Result<String, BrowserError> {
    session.navigate(mobile_url).await?;
    tokio::time::sleep(settings.render_settle).await;
    if let Err(err) = session.execute_script(SCROLL_SCRIPT).await {
        postscrape_logging::scrape_debug!("scroll failed: {}", err);
    }
    tokio::time::sleep(settings.scroll_settle).await;
    session.current_document().await
}

/// Pulls post text and image URLs out of rendered markup.
pub fn extract_post_content(markup: &str, parsed: &ParsedPostRef) -> PostContent {
    let html = Html::parse_document(markup);
    let images = post_images(&html);
    let text = truncate_chars(&post_text(&html), MAX_POST_TEXT_CHARS);
    PostContent {
        text,
        total_images: images.len(),
        images,
        page_name: parsed.page_name.clone(),
        post_id: parsed.post_id.clone(),
    }
}

fn post_images(html: &Html) -> Vec<String> {
    let mut images: Vec<String> = Vec::new();
    let Ok(img) = Selector::parse("img") else {
        return images;
    };

    let sources = html
        .select(&img)
        .filter_map(|element| element.value().attr("src"))
        .filter(|src| !IMAGE_NOISE_MARKERS.iter().any(|marker| src.contains(marker)));
    let lazy_sources = html
        .select(&img)
        .filter_map(|element| element.value().attr("data-src"));

    for src in sources.chain(lazy_sources) {
        if src.contains("scontent") && !images.iter().any(|known| known == src) {
            images.push(src.to_string());
        }
    }
    images
}

/// Longest `data-ft` block with enough text, else the first long line of the
/// page text.
fn post_text(html: &Html) -> String {
    let mut best = String::new();
    if let Ok(blocks) = Selector::parse("div[data-ft]") {
        for block in html.select(&blocks) {
            let text: String = block.text().map(str::trim).collect();
            let len = text.chars().count();
            if len > MIN_BLOCK_TEXT_CHARS && len > best.chars().count() {
                best = text;
            }
        }
    }
    if !best.is_empty() {
        return best;
    }

    let page_text: String = html.root_element().text().collect();
    page_text
        .lines()
        .map(str::trim)
        .find(|line| line.chars().count() > MIN_LINE_TEXT_CHARS)
        .map(str::to_string)
        .unwrap_or_default()
}

fn truncate_chars(text: &str, max: usize) -> String {
    text.chars().take(max).collect()
}
