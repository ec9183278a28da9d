use postscrape_core::{looks_like_video, CandidateSet, SignalOutcome};
use postscrape_logging::{scrape_trace, short_url};

use crate::{NetworkEvent, NetworkEventKind};

/// Starts muted playback of the first `<video>` element. Autoplay policies
/// may refuse; the rejection is swallowed.
pub const PLAY_SCRIPT: &str = r#"(() => {
  const v = document.querySelector('video');
  if (!v) { return false; }
  try {
    v.muted = true;
    const p = v.play();
    if (p && p.catch) { p.catch(() => {}); }
    return true;
  } catch (e) {
    return false;
  }
})()"#;

/// Names of every resource the page has fetched so far.
pub const RESOURCE_TIMING_SCRIPT: &str = r#"(() => {
  const perf = window.performance;
  if (!perf) { return []; }
  const entries = perf.getEntriesByType ? perf.getEntriesByType('resource') : perf.getEntries();
  return entries.map(e => e.name);
})()"#;

/// Scrolls the post into view so lazily loaded images get real sources.
pub const SCROLL_SCRIPT: &str = "window.scrollTo(0, document.body ? document.body.scrollHeight : 0)";

/// Adds the video-looking resource-timing entries to `candidates`.
pub fn gather_resource_timing(entries: &[String], candidates: &mut CandidateSet) -> SignalOutcome {
    let mut added = 0;
    for entry in entries.iter().filter(|entry| looks_like_video(entry)) {
        added += candidates.insert_with_stripped(entry);
    }
    outcome(added)
}

/// Adds the video-looking URLs of a drained network log to `candidates`.
///
/// Request events carry the headers the browser sent; they are attached to
/// the URL (and its stripped form) so probes can replay them.
pub fn gather_network_log(events: &[NetworkEvent], candidates: &mut CandidateSet) -> SignalOutcome {
    let mut added = 0;
    for event in events.iter().filter(|event| looks_like_video(&event.url)) {
        let inserted = candidates.insert_with_stripped(&event.url);
        if inserted > 0 {
            scrape_trace!("network log: {}", short_url(&event.url));
        }
        added += inserted;

        if event.kind == NetworkEventKind::Request {
            if let Some(headers) = &event.headers {
                candidates.attach_headers(event.url.trim(), headers.clone());
                let stripped = postscrape_core::strip_byte_range_params(event.url.trim());
                candidates.attach_headers(&stripped, headers.clone());
            }
        }
    }
    outcome(added)
}

/// Reads the string entries of a script result, ignoring anything else.
pub fn string_entries(value: &serde_json::Value) -> Vec<String> {
    value
        .as_array()
        .map(|items| {
            items
                .iter()
                .filter_map(|item| item.as_str().map(str::to_string))
                .collect()
        })
        .unwrap_or_default()
}

fn outcome(added: usize) -> SignalOutcome {
    if added == 0 {
        SignalOutcome::Empty
    } else {
        SignalOutcome::Found(added)
    }
}
