//! Skips mock-endpoint tests on hosts where loopback sockets are unavailable.

use std::net::TcpListener;
use std::panic::Location;

use wiremock::MockServer;

/// Set to `1`/`true` to turn a missing loopback socket into a test failure.
const STRICT_ENV: &str = "S3_SSEC_GET_STRICT_SOCKETS";

fn strict_sockets() -> bool {
    std::env::var(STRICT_ENV)
        .map(|value| matches!(value.trim().to_ascii_lowercase().as_str(), "1" | "true"))
        .unwrap_or(false)
}

fn loopback_available() -> bool {
    TcpListener::bind(("127.0.0.1", 0)).is_ok()
}

/// Starts a mock S3 endpoint, or returns `None` when the sandbox forbids
/// binding a loopback port.
#[track_caller]
pub fn mock_s3_or_skip() -> impl std::future::Future<Output = Option<MockServer>> {
    let caller = Location::caller();
    let available = loopback_available();
    if !available {
        assert!(
            !strict_sockets(),
            "{}:{}: no loopback socket for the mock S3 endpoint ({STRICT_ENV} is set)",
            caller.file(),
            caller.line()
        );
        eprintln!(
            "{}:{}: no loopback socket, skipping mock S3 test",
            caller.file(),
            caller.line()
        );
    }
    async move {
        if available {
            Some(MockServer::start().await)
        } else {
            None
        }
    }
}
