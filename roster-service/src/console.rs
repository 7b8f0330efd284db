//! Console setup: structured logging plus a one-line startup banner.
//!
//! Scaled down from the fuller colourised event-formatting layer this
//! stack sometimes uses elsewhere; the roster service's log volume doesn't
//! justify it, so this sticks to `tracing_subscriber`'s default formatter
//! with an `EnvFilter`.

use owo_colors::OwoColorize;
use tracing_subscriber::EnvFilter;

pub fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();
}

pub fn print_banner(addr: &std::net::SocketAddr) {
    println!(
        "{} {}",
        "roster-service".bold().green(),
        env!("CARGO_PKG_VERSION").dimmed()
    );
    println!("listening on {}", addr.to_string().cyan());
}
