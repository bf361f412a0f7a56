//! RQB Core - Render Queue Batcher
//!
//! Runs batches of composition renders through a host application's
//! render queue without disturbing what the user already queued there.
//! Batches render either inside the host or through a command-line worker
//! fed a saved project snapshot.

pub mod config;
pub mod logging;
pub mod models;
pub mod project;
pub mod queue;
pub mod scheduler;
pub mod worker;

/// Returns the crate version.
pub fn version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn version_returns_value() {
        assert!(!version().is_empty());
    }
}
