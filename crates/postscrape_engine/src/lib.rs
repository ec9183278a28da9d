//! Postscrape engine: browser driving, candidate gathering, probing and the
//! video resolution pipeline.
mod browser;
mod extract;
mod post;
mod probe;
mod rank;
mod resolve;
mod service;
mod session;
mod signals;
mod types;

pub use browser::{
    BrowserSession, BrowserSettings, ChromiumSession, ChromiumSessionFactory, SessionFactory,
};
pub use extract::{
    default_strategies, extract_video_url, extract_with, unescape_json_url, CdnScanStrategy,
    EmbeddedJsonStrategy, MetaTagStrategy, PageDocument, PlaybackAnchorStrategy,
    VideoElementStrategy, VideoUrlStrategy,
};
pub use post::{extract_post_content, load_post_markup, PostSettings, MAX_POST_TEXT_CHARS};
pub use probe::{
    cookie_header, probe, request_headers, ProbeClient, ProbeSettings, ReqwestProbeClient,
};
pub use rank::{rank, rank_detailed, RankOutcome};
pub use resolve::{ResolverSettings, VideoResolver};
pub use service::{ScrapeService, ServiceSettings};
pub use session::SessionManager;
pub use signals::{
    gather_network_log, gather_resource_timing, string_entries, PLAY_SCRIPT,
    RESOURCE_TIMING_SCRIPT, SCROLL_SCRIPT,
};
pub use types::{
    BrowserError, Cookies, NetworkEvent, NetworkEventKind, ProbeError, ProbeResponse,
    RequestHeaders, ResolveError,
};
