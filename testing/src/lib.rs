//! # Tasklist Testing
//!
//! Testing utilities and helpers for the tasklist pipeline.
//!
//! This crate provides:
//! - Mock implementations of Environment traits (`FixedClock`, `MockHttpClient`)
//! - A Given-When-Then builder for reducers
//! - Assertion helpers for effects
//! - Tracing setup for tests
//!
//! ## Example
//!
//! ```ignore
//! use tasklist_testing::{test_clock, MockHttpClient};
//! use tasklist_runtime::Store;
//!
//! #[tokio::test]
//! async fn test_load() {
//!     let http = MockHttpClient::new();
//!     http.respond_json(HttpMethod::Get, "/todos", 200, json!([]));
//!     let store = Store::new(TodoState::default(), TodoReducer, test_environment(http));
//!
//!     let mut handle = store.send(TodoAction::ObtainTodoList(Lifecycle::Request(()))).await?;
//!     handle.wait().await;
//!
//!     assert!(!store.state(|s| s.loading).await);
//! }
//! ```

use chrono::{DateTime, Utc};
use tasklist_core::environment::Clock;

/// Stubbed HTTP client
pub mod http_mock;


/// Mock implementations for testing.
pub mod mocks {
    use super::{Clock, DateTime, Utc};

    pub use crate::http_mock::{Gate, MockHttpClient};

    /// Fixed clock for deterministic tests
    ///
    /// Always returns the same time, making tests reproducible.
    ///
    /// # Example
    ///
    /// ```
    /// use tasklist_testing::mocks::FixedClock;
    /// use tasklist_core::environment::Clock;
    /// use chrono::Utc;
    ///
    /// let clock = FixedClock::new(Utc::now());
    /// let time1 = clock.now();
    /// let time2 = clock.now();
    /// assert_eq!(time1, time2); // Always the same!
    /// ```
    #[derive(Debug, Clone)]
    pub struct FixedClock {
        time: DateTime<Utc>,
    }

    impl FixedClock {
        /// Create a new fixed clock with the given time
        #[must_use]
        pub const fn new(time: DateTime<Utc>) -> Self {
            Self { time }
        }
    }

    impl Clock for FixedClock {
        fn now(&self) -> DateTime<Utc> {
            self.time
        }
    }

    /// Create a default fixed clock for tests (2025-01-01 00:00:00 UTC)
    ///
    /// # Panics
    ///
    /// This function will panic if the hardcoded timestamp fails to parse,
    /// which should never happen in practice.
    #[must_use]
    #[allow(clippy::expect_used)]
    pub fn test_clock() -> FixedClock {
        FixedClock::new(
            DateTime::parse_from_rfc3339("2025-01-01T00:00:00Z")
                .expect("hardcoded timestamp should always parse")
                .with_timezone(&Utc),
        )
    }
}

/// Test helpers and utilities.
pub mod helpers {
    use tracing_subscriber::EnvFilter;

    /// Install a test-writer tracing subscriber, once per process.
    ///
    /// Honors `RUST_LOG`, defaulting to `warn`. Output is captured by the
    /// test harness and shown for failing tests only.
    pub fn init_tracing() {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(
                EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
            )
            .with_test_writer()
            .try_init();
    }
}

// Re-export commonly used items
pub use mocks::{test_clock, FixedClock, Gate, MockHttpClient};
pub use reducer_test::{assertions, ReducerTest};
