//! Shared helpers for the aldev integration tests: config builders, a
//! recording deployer, log setup and a bounded await.

pub mod builders;
pub mod fake_deployer;

use std::future::Future;
use std::sync::Once;
use std::time::Duration;

use tracing_subscriber::{fmt, EnvFilter};

/// Upper bound for any single await in a test.
///
/// Most tests run on paused time, where this is virtual time: it has to
/// cover the longest grace period plus the settle timeout used in the
/// generation tests.
pub const TEST_TIMEOUT: Duration = Duration::from_secs(10);

static TRACING: Once = Once::new();

/// Install the test subscriber once per test binary.
///
/// Output goes through the test writer, so it only shows for failing tests.
/// `ALDEV_LOG` takes a full filter (e.g. `aldev=trace`); the default keeps
/// aldev at debug and everything else at warn.
pub fn init_tracing() {
    TRACING.call_once(|| {
        let filter = EnvFilter::try_from_env("ALDEV_LOG")
            .unwrap_or_else(|_| EnvFilter::new("warn,aldev=debug"));

        fmt()
            .with_env_filter(filter)
            .with_test_writer()
            .with_target(false)
            .init();
    });
}

/// Await `f`, failing the test if it takes longer than [`TEST_TIMEOUT`].
pub async fn with_timeout<F, T>(f: F) -> T
where
    F: Future<Output = T>,
{
    match tokio::time::timeout(TEST_TIMEOUT, f).await {
        Ok(value) => value,
        Err(_) => panic!("test step did not finish within {TEST_TIMEOUT:?}"),
    }
}
