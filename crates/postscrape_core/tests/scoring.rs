use postscrape_core::{
    heuristic_score, order_by_score, size_bonus, CandidateScore, CandidateSet, VideoCandidate,
};
use pretty_assertions::assert_eq;

fn scored(url: &str) -> CandidateScore {
    CandidateScore {
        candidate: VideoCandidate::new(url),
        score: heuristic_score(url),
    }
}

#[test]
fn media_extension_beats_same_domain_page() {
    let mp4 = heuristic_score("https://x.fbcdn.net/v/clip.mp4");
    let page = heuristic_score("https://x.fbcdn.net/v/clip.php");
    assert!(mp4 > page, "{mp4} <= {page}");
}

#[test]
fn byte_range_markers_cost_at_least_forty_points() {
    let pairs = [
        (
            "https://x.fbcdn.net/v.mp4?bytestart=0&byteend=100",
            "https://x.fbcdn.net/v.mp4",
        ),
        (
            "https://video.fsci1-1.fna.fbcdn.net/o1/v.mp4?_nc_ht=video&bytestart=10",
            "https://video.fsci1-1.fna.fbcdn.net/o1/v.mp4?_nc_ht=video",
        ),
        ("https://cdn.example.com/seg?byteend=9", "https://cdn.example.com/seg"),
    ];
    for (ranged, whole) in pairs {
        assert!(
            heuristic_score(whole) - heuristic_score(ranged) >= 40.0,
            "{ranged} vs {whole}"
        );
    }
}

#[test]
fn score_table_values() {
    assert_eq!(heuristic_score("https://example.com/page"), 0.0);
    assert_eq!(heuristic_score("https://example.com/a.M3U8"), 100.0);
    assert_eq!(
        heuristic_score("https://video.fsci2-1.fna.fbcdn.net/v.mp4?_nc_ht=video.fsci2-1"),
        200.0
    );
}

#[test]
fn size_bonus_is_capped() {
    assert_eq!(size_bonus(0), 0.0);
    assert_eq!(size_bonus(2 * 1024 * 1024), 2.0);
    assert_eq!(size_bonus(500 * 1024 * 1024), 50.0);
}

#[test]
fn ordering_prefers_unranged_url_in_scenario() {
    let ordered = order_by_score(vec![
        scored("https://x.fbcdn.net/v.mp4?bytestart=0&byteend=100"),
        scored("https://x.fbcdn.net/v.mp4"),
    ]);
    assert_eq!(ordered[0].candidate.url, "https://x.fbcdn.net/v.mp4");
}

#[test]
fn ties_break_on_url_length() {
    let ordered = order_by_score(vec![
        scored("https://a.example.com/x.mp4"),
        scored("https://a.example.com/longer.mp4"),
    ]);
    assert_eq!(ordered[0].candidate.url, "https://a.example.com/longer.mp4");
}

#[test]
fn candidate_set_deduplicates_and_adds_stripped_form() {
    let mut set = CandidateSet::new();
    assert_eq!(
        set.insert_with_stripped("https://x.fbcdn.net/v.mp4?bytestart=0&byteend=100"),
        2
    );
    assert_eq!(set.insert_with_stripped("https://x.fbcdn.net/v.mp4"), 0);
    assert_eq!(
        set.urls(),
        vec![
            "https://x.fbcdn.net/v.mp4?bytestart=0&byteend=100".to_string(),
            "https://x.fbcdn.net/v.mp4".to_string(),
        ]
    );
}

#[test]
fn candidate_set_rejects_blob_urls() {
    let mut set = CandidateSet::new();
    assert_eq!(set.insert_with_stripped("blob:https://m.facebook.com/1234"), 0);
    assert!(!set.insert("blob:https://m.facebook.com/1234"));
    assert!(set.is_empty());
}

#[test]
fn headers_attach_to_existing_candidates_only() {
    let mut set = CandidateSet::new();
    set.insert("https://x.fbcdn.net/v.mp4");
    let headers = [("Referer".to_string(), "https://m.facebook.com/".to_string())]
        .into_iter()
        .collect();
    set.attach_headers("https://x.fbcdn.net/v.mp4", headers);
    set.attach_headers("https://other.example/v.mp4", Default::default());

    let candidate = set.get("https://x.fbcdn.net/v.mp4").unwrap();
    assert_eq!(
        candidate
            .observed_headers
            .as_ref()
            .and_then(|h| h.get("Referer"))
            .map(String::as_str),
        Some("https://m.facebook.com/")
    );
    assert_eq!(set.len(), 1);
}
