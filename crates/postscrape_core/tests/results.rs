use postscrape_core::{
    ProbeResult, Resolution, ScrapeResult, ScrapeTarget, SignalOutcome, SignalReport, SignalSource,
};
use pretty_assertions::assert_eq;
use serde_json::json;

#[test]
fn not_found_serializes_null_video_url() {
    let target = ScrapeTarget::new("https://www.facebook.com/PageX/posts/123");
    let result = ScrapeResult::not_found(&target);
    assert!(!result.success);
    assert_eq!(result.resolution, Resolution::NotFound);

    let value = serde_json::to_value(&result).unwrap();
    assert_eq!(value["video_url"], json!(null));
    assert_eq!(value["mobile_url"], json!("https://m.facebook.com/PageX/posts/123"));
    assert_eq!(value["resolution"], json!("not_found"));
    assert!(value.get("signals").is_none());
}

#[test]
fn unvalidated_winner_still_counts_as_success() {
    let target = ScrapeTarget::new("https://www.facebook.com/PageX/posts/1");
    let probe = ProbeResult {
        ok: false,
        status: Some(403),
        ..ProbeResult::default()
    };
    let result = ScrapeResult::resolved(
        &target,
        "https://x.fbcdn.net/v.mp4".into(),
        false,
        Some(probe),
        None,
    )
    .with_signals(vec![SignalReport::new(
        SignalSource::NetworkLog,
        SignalOutcome::Found(2),
    )]);

    assert!(result.success);
    assert!(result.resolution.is_success());
    assert_eq!(result.resolution, Resolution::Unvalidated);
    assert!(result.tried(SignalSource::NetworkLog));
    assert!(!result.tried(SignalSource::ResourceTiming));
}
