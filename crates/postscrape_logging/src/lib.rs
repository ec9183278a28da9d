#![deny(missing_docs)]
//! Shared logging utilities for the postscrape workspace.
//!
//! This crate provides the `scrape_*` logging macros used across the codebase,
//! a helper that keeps media URLs readable in log lines, and a minimal test
//! initializer for the global logger.

/// Longest URL rendered verbatim by [`short_url`].
pub const MAX_LOGGED_URL_LEN: usize = 96;

/// Logs a trace-level message using the global logging facade.
#[macro_export]
macro_rules! scrape_trace {
    ($($arg:tt)*) => {{
        log::trace!($($arg)*);
    }};
}

/// Logs a debug-level message using the global logging facade.
#[macro_export]
macro_rules! scrape_debug {
    ($($arg:tt)*) => {{
        log::debug!($($arg)*);
    }};
}

/// Logs an info-level message using the global logging facade.
#[macro_export]
macro_rules! scrape_info {
    ($($arg:tt)*) => {{
        log::info!($($arg)*);
    }};
}

/// Logs a warn-level message using the global logging facade.
#[macro_export]
macro_rules! scrape_warn {
    ($($arg:tt)*) => {{
        log::warn!($($arg)*);
    }};
}

/// Logs an error-level message using the global logging facade.
#[macro_export]
macro_rules! scrape_error {
    ($($arg:tt)*) => {{
        log::error!($($arg)*);
    }};
}

/// Shortens a URL for log output.
///
/// CDN URLs carry long signed query strings (`oh=`, `oe=`, `_nc_*`) that drown
/// the interesting part of a log line. The query is replaced by `?…` and the
/// remainder is cut at [`MAX_LOGGED_URL_LEN`] characters.
pub fn short_url(url: &str) -> String {
    let (base, had_query) = match url.split_once('?') {
        Some((base, _)) => (base, true),
        None => (url, false),
    };

    let mut out: String = base.chars().take(MAX_LOGGED_URL_LEN).collect();
    if base.chars().count() > MAX_LOGGED_URL_LEN {
        out.push('…');
    }
    if had_query {
        out.push_str("?…");
    }
    out
}

/// Initializes a simple terminal logger for use in tests.
///
/// This safely no-ops if another logger has already been initialized.
pub fn initialize_for_tests() {
    use simplelog::{ColorChoice, CombinedLogger, Config, TermLogger, TerminalMode};

    // Use debug level in debug builds, info in release builds.
    let level = if cfg!(debug_assertions) {
        log::LevelFilter::Debug
    } else {
        log::LevelFilter::Info
    };

    // Ignore the error if a logger was already set by another test.
    let _ = CombinedLogger::init(vec![TermLogger::new(
        level,
        Config::default(),
        TerminalMode::Mixed,
        ColorChoice::Auto,
    )]);
}
