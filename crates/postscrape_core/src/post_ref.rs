use serde::{Deserialize, Serialize};
use url::Url;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UrlType {
    Post,
    Photo,
    #[default]
    Unknown,
}

/// Page and post identifiers read from the path of a post URL.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ParsedPostRef {
    pub page_name: Option<String>,
    pub post_id: Option<String>,
    pub url_type: UrlType,
}

/// Recognizes `/{page}/posts/{id}` and `/{page}/photos/{album}/{id}`.
///
/// The first matching shape, scanning the path left to right, wins. Anything
/// else yields an empty [`ParsedPostRef`] with [`UrlType::Unknown`].
pub fn parse_post_url(url: &str) -> ParsedPostRef {
    let parsed = Url::parse(url).or_else(|_| Url::parse(&format!("https://{url}")));
    let Ok(parsed) = parsed else {
        return ParsedPostRef::default();
    };

    let segments: Vec<&str> = parsed
        .path_segments()
        .map(|segments| segments.collect())
        .unwrap_or_default();

    for (idx, segment) in segments.iter().enumerate().skip(1) {
        let page = segments[idx - 1];
        if page.is_empty() {
            continue;
        }
        match *segment {
            "posts" => {
                if let Some(id) = segments.get(idx + 1).filter(|id| !id.is_empty()) {
                    return ParsedPostRef {
                        page_name: Some(page.to_string()),
                        post_id: Some(id.to_string()),
                        url_type: UrlType::Post,
                    };
                }
            }
            "photos" => {
                let album = segments.get(idx + 1).filter(|album| !album.is_empty());
                let id = segments.get(idx + 2).filter(|id| !id.is_empty());
                if let (Some(_), Some(id)) = (album, id) {
                    return ParsedPostRef {
                        page_name: Some(page.to_string()),
                        post_id: Some(id.to_string()),
                        url_type: UrlType::Photo,
                    };
                }
            }
            _ => {}
        }
    }

    ParsedPostRef::default()
}
