//! Logging for tests: one subscriber per test binary, level from `RUST_LOG`.

use std::env;
use std::sync::Once;

use tracing::debug;
use tracing_subscriber::{
    fmt::{self, format::FmtSpan},
    prelude::*,
    EnvFilter,
};

static INIT: Once = Once::new();

/// Safe to call from every test; only the first call installs the subscriber.
pub fn init_test_setup() {
    INIT.call_once(|| {
        let filter = env::var("RUST_LOG")
            .map(EnvFilter::new)
            .unwrap_or_else(|_| EnvFilter::new("rsfam=debug"));

        let layer = fmt::layer()
            .with_test_writer()
            .with_target(true)
            .with_span_events(FmtSpan::CLOSE)
            .with_filter(filter);

        if tracing::dispatcher::has_been_set() {
            return;
        }
        match tracing_subscriber::registry().with(layer).try_init() {
            Ok(()) => debug!("test logging ready"),
            Err(e) => eprintln!("test logging not installed: {}", e),
        }
    });
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn given_repeated_calls_when_init_then_installs_once() {
        init_test_setup();
        init_test_setup();
        assert!(tracing::dispatcher::has_been_set());
    }
}
