use postscrape_core::CandidateSet;
use postscrape_engine::{rank, rank_detailed, Cookies, ProbeSettings, ReqwestProbeClient};
use pretty_assertions::assert_eq;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn client() -> (ReqwestProbeClient, ProbeSettings) {
    let settings = ProbeSettings::default();
    let client = ReqwestProbeClient::new(&settings).expect("client builds");
    (client, settings)
}

async fn serve(server: &MockServer, route: &str, status: u16, body_len: usize) {
    Mock::given(method("GET"))
        .and(path(route))
        .respond_with(ResponseTemplate::new(status).set_body_bytes(vec![0u8; body_len]))
        .mount(server)
        .await;
}

#[tokio::test]
async fn media_url_wins_over_plain_page() {
    let server = MockServer::start().await;
    serve(&server, "/v/clip.mp4", 206, 20_000).await;
    serve(&server, "/v/watch", 200, 20_000).await;

    let page = format!("{}/v/watch", server.uri());
    let mp4 = format!("{}/v/clip.mp4", server.uri());
    let mut candidates = CandidateSet::new();
    candidates.insert(&page);
    candidates.insert(&mp4);

    let (client, settings) = client();
    let outcome = rank_detailed(&client, &settings, &candidates, None, &Cookies::new()).await;

    assert_eq!(outcome.best.as_deref(), Some(mp4.as_str()));
    assert!(outcome.validated);
    assert_eq!(outcome.scores.len(), 2);
    assert_eq!(outcome.scores[0].candidate.url, mp4);
}

#[tokio::test]
async fn small_bodies_fall_back_to_top_score_unvalidated() {
    let server = MockServer::start().await;
    serve(&server, "/a.mp4", 200, 100).await;
    serve(&server, "/b", 200, 100).await;

    let mp4 = format!("{}/a.mp4", server.uri());
    let other = format!("{}/b", server.uri());
    let mut candidates = CandidateSet::new();
    candidates.insert(&other);
    candidates.insert(&mp4);

    let (client, settings) = client();
    let outcome = rank_detailed(&client, &settings, &candidates, None, &Cookies::new()).await;

    assert_eq!(outcome.best.as_deref(), Some(mp4.as_str()));
    assert!(!outcome.validated);
}

#[tokio::test]
async fn failing_candidate_is_skipped() {
    let server = MockServer::start().await;
    serve(&server, "/stream", 200, 20_000).await;

    let dead = "http://127.0.0.1:1/clip.mp4".to_string();
    let alive = format!("{}/stream", server.uri());
    let mut candidates = CandidateSet::new();
    candidates.insert(&dead);
    candidates.insert(&alive);

    let (client, settings) = client();
    let best = rank(&client, &settings, &candidates, None, &Cookies::new()).await;

    assert_eq!(best, Some(alive));
}

#[tokio::test]
async fn empty_set_has_no_winner() {
    let (client, settings) = client();
    let outcome =
        rank_detailed(&client, &settings, &CandidateSet::new(), None, &Cookies::new()).await;

    assert_eq!(outcome.best, None);
    assert!(!outcome.validated);
    assert!(outcome.scores.is_empty());
}
