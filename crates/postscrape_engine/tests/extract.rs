use std::collections::BTreeMap;

use postscrape_core::{CandidateSet, ParsedPostRef, SignalOutcome, UrlType};
use postscrape_engine::{
    extract_post_content, extract_video_url, gather_network_log, gather_resource_timing,
    string_entries, unescape_json_url, NetworkEvent, PageDocument, MAX_POST_TEXT_CHARS,
};
use pretty_assertions::assert_eq;

fn find(markup: &str) -> Option<String> {
    extract_video_url(&PageDocument::parse(markup))
}

#[test]
fn meta_tag_is_found() {
    let markup = r#"<html><head>
        <meta property="og:video:url" content="https://video.xx.fbcdn.net/v/second.mp4">
        </head><body></body></html>"#;
    assert_eq!(
        find(markup).as_deref(),
        Some("https://video.xx.fbcdn.net/v/second.mp4")
    );
}

#[test]
fn video_element_sources_are_tried_in_order() {
    let with_data_src = r#"<video data-src="https://x.fbcdn.net/lazy.mp4"></video>"#;
    assert_eq!(
        find(with_data_src).as_deref(),
        Some("https://x.fbcdn.net/lazy.mp4")
    );

    let with_source = r#"<video><source src="https://x.fbcdn.net/nested.mp4"></video>"#;
    assert_eq!(
        find(with_source).as_deref(),
        Some("https://x.fbcdn.net/nested.mp4")
    );
}

#[test]
fn meta_tag_takes_priority_over_later_strategies() {
    let markup = r#"<html><head>
        <meta property="og:video" content="https://a.fbcdn.net/meta.mp4">
        </head><body>
        <video src="https://a.fbcdn.net/element.mp4"></video>
        <script>{"playable_url":"https:\/\/a.fbcdn.net\/json.mp4"}</script>
        </body></html>"#;
    assert_eq!(find(markup).as_deref(), Some("https://a.fbcdn.net/meta.mp4"));
}

#[test]
fn embedded_json_is_unescaped() {
    let markup = r#"<script>{"sd_src":"https:\/\/video.xx.fbcdn.net\/v\/t42\/clip.mp4?efg=%3D"}</script>"#;
    assert_eq!(
        find(markup).as_deref(),
        Some("https://video.xx.fbcdn.net/v/t42/clip.mp4?efg=%3D")
    );
}

#[test]
fn embedded_json_prefers_earlier_fields() {
    let markup = r#"<script>{"hd_src":"https://a.fbcdn.net/hd.mp4","playable_url_quality_hd":"https://a.fbcdn.net/q.mp4"}</script>"#;
    assert_eq!(find(markup).as_deref(), Some("https://a.fbcdn.net/q.mp4"));
}

#[test]
fn escaped_src_inside_json_string() {
    let markup = r#"<script>var s = '{"src\":"https://video.xx.fbcdn.net/v/esc.mp4\"}';</script>"#;
    assert_eq!(
        find(markup).as_deref(),
        Some("https://video.xx.fbcdn.net/v/esc.mp4")
    );
}

#[test]
fn relative_playback_anchor_resolves_against_mobile_host() {
    let markup = r#"<body><a href="/PageX">page</a><a href="/video.php?v=987">watch</a></body>"#;
    assert_eq!(
        find(markup).as_deref(),
        Some("https://m.facebook.com/video.php?v=987")
    );
}

#[test]
fn cdn_scan_is_the_last_resort() {
    let markup = r#"<body><div data-x='https://scontent.xx.fbcdn.net/v/pic.jpg?x=1'></div></body>"#;
    assert_eq!(
        find(markup).as_deref(),
        Some("https://scontent.xx.fbcdn.net/v/pic.jpg?x=1")
    );
}

#[test]
fn nothing_found_on_plain_page() {
    assert_eq!(find("<html><body><p>No media here</p></body></html>"), None);
}

#[test]
fn unescape_handles_percent_escapes_and_plain_urls() {
    assert_eq!(
        unescape_json_url(r"https:\/\/a.fbcdn.net\/v.mp4?oh=\u00253D"),
        "https://a.fbcdn.net/v.mp4?oh=%3D"
    );
    assert_eq!(
        unescape_json_url("https://a.fbcdn.net/v.mp4"),
        "https://a.fbcdn.net/v.mp4"
    );
}

#[test]
fn resource_timing_keeps_video_entries_and_stripped_forms() {
    let entries = vec![
        "https://static.xx.fbcdn.net/rsrc.php/app.js".to_string(),
        "blob:https://m.facebook.com/abc".to_string(),
        "https://video.fsci1-1.fna.fbcdn.net/o1/v/seg?bytestart=0&byteend=999".to_string(),
    ];
    let mut candidates = CandidateSet::new();
    let outcome = gather_resource_timing(&entries, &mut candidates);

    assert_eq!(outcome, SignalOutcome::Found(2));
    assert_eq!(
        candidates.urls(),
        vec![
            "https://video.fsci1-1.fna.fbcdn.net/o1/v/seg?bytestart=0&byteend=999".to_string(),
            "https://video.fsci1-1.fna.fbcdn.net/o1/v/seg".to_string(),
        ]
    );
}

#[test]
fn resource_timing_without_video_is_empty() {
    let mut candidates = CandidateSet::new();
    let outcome = gather_resource_timing(&["https://m.facebook.com/".to_string()], &mut candidates);
    assert_eq!(outcome, SignalOutcome::Empty);
    assert!(candidates.is_empty());
}

#[test]
fn network_log_attaches_request_headers() {
    let headers: BTreeMap<String, String> = [("origin".to_string(), "https://m.facebook.com".to_string())]
        .into_iter()
        .collect();
    let events = vec![
        NetworkEvent::request("https://v.fbcdn.net/clip.mp4?bytestart=0", headers.clone()),
        NetworkEvent::response("https://v.fbcdn.net/clip.mp4?bytestart=0"),
        NetworkEvent::request("blob:https://m.facebook.com/xyz", BTreeMap::new()),
        NetworkEvent::response("https://m.facebook.com/ajax/bz"),
    ];
    let mut candidates = CandidateSet::new();
    let outcome = gather_network_log(&events, &mut candidates);

    assert_eq!(outcome, SignalOutcome::Found(2));
    let raw = candidates
        .get("https://v.fbcdn.net/clip.mp4?bytestart=0")
        .expect("raw candidate");
    assert_eq!(raw.observed_headers.as_ref(), Some(&headers));
    let stripped = candidates
        .get("https://v.fbcdn.net/clip.mp4")
        .expect("stripped candidate");
    assert_eq!(stripped.observed_headers.as_ref(), Some(&headers));
}

#[test]
fn script_values_are_read_as_strings() {
    let value = serde_json::json!(["https://a/1.mp4", 3, null, "https://a/2.mp4"]);
    assert_eq!(
        string_entries(&value),
        vec!["https://a/1.mp4".to_string(), "https://a/2.mp4".to_string()]
    );
    assert!(string_entries(&serde_json::Value::Null).is_empty());
}

#[test]
fn post_content_collects_images_and_longest_text_block() {
    let markup = r#"<html><body>
        <div data-ft="1">short</div>
        <div data-ft="2">This is the actual post body with enough words in it.</div>
        <img src="https://scontent.xx.fbcdn.net/v/photo1.jpg">
        <img src="https://scontent.xx.fbcdn.net/emoji/smile.png">
        <img src="https://static.xx.fbcdn.net/rsrc.php/icon.png">
        <img src="https://scontent.xx.fbcdn.net/v/photo1.jpg">
        <img data-src="https://scontent.xx.fbcdn.net/v/photo2.jpg">
        </body></html>"#;
    let parsed = ParsedPostRef {
        page_name: Some("PageX".to_string()),
        post_id: Some("123".to_string()),
        url_type: UrlType::Post,
    };

    let post = extract_post_content(markup, &parsed);

    assert_eq!(
        post.text,
        "This is the actual post body with enough words in it."
    );
    assert_eq!(
        post.images,
        vec![
            "https://scontent.xx.fbcdn.net/v/photo1.jpg".to_string(),
            "https://scontent.xx.fbcdn.net/v/photo2.jpg".to_string(),
        ]
    );
    assert_eq!(post.total_images, 2);
    assert_eq!(post.page_name.as_deref(), Some("PageX"));
    assert_eq!(post.post_id.as_deref(), Some("123"));
}

#[test]
fn post_text_falls_back_to_first_long_line_and_is_truncated() {
    let long_line = "word ".repeat(200);
    let markup = format!("<html><body><p>tiny</p>\n<p>{long_line}</p></body></html>");
    let post = extract_post_content(&markup, &ParsedPostRef::default());

    assert_eq!(post.text.chars().count(), MAX_POST_TEXT_CHARS);
    assert!(post.text.starts_with("word word"));
    assert!(post.images.is_empty());
}
