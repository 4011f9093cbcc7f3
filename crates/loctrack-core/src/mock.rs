//! Mock collaborators for testing.
//!
//! [`MockPositionProvider`] and [`MockResolver`] implement the collaborator
//! traits so the sampling loop can be driven without network access.
//!
//! # Features
//!
//! - **Scripted responses**: queue fresh-fix outcomes consumed in order
//! - **Failure injection**: failures, cancellations, empty results
//! - **Latency simulation**: delay fresh fixes to exercise timeouts and cancellation
//! - **Call counters**: assert how often each path was taken

use std::collections::VecDeque;
use std::sync::Mutex;
use std::sync::atomic::{AtomicU32, AtomicU64, Ordering};
use std::time::Duration;

use async_trait::async_trait;

use loctrack_types::Fix;

use crate::error::{Error, Result};
use crate::fix::FixRequest;
use crate::traits::{AddressResolver, PositionProvider};

/// Outcome of a mocked fresh-fix request.
#[derive(Debug, Clone, PartialEq)]
pub enum MockResponse {
    /// Return this fix.
    Fix(Fix),
    /// Finish without a position.
    Empty,
    /// Fail with this message.
    Fail(String),
    /// Report cancellation.
    Cancelled,
}

/// A mock positioning provider.
///
/// Scripted responses pushed with [`push_fresh`](Self::push_fresh) are used
/// first; after that every request gets the default response.
///
/// # Example
///
/// ```
/// use loctrack_core::mock::{MockPositionProvider, MockResponse};
/// use loctrack_core::{FixRequest, acquire_fix};
/// use loctrack_types::Fix;
///
/// #[tokio::main]
/// async fn main() {
///     let provider = MockPositionProvider::new()
///         .with_fresh(MockResponse::Fail("no signal".into()))
///         .with_last_known(Some(Fix::new(1.0, 2.0).unwrap()));
///
///     let fix = acquire_fix(&provider, &FixRequest::default()).await;
///     assert!(fix.is_some());
/// }
/// ```
#[derive(Debug)]
pub struct MockPositionProvider {
    default_response: Mutex<MockResponse>,
    scripted: Mutex<VecDeque<MockResponse>>,
    last_known: Mutex<std::result::Result<Option<Fix>, String>>,
    /// Simulated fresh-fix latency in milliseconds (0 = no delay).
    latency_ms: AtomicU64,
    fresh_count: AtomicU32,
    last_known_count: AtomicU32,
}

impl Default for MockPositionProvider {
    fn default() -> Self {
        Self::new()
    }
}

impl MockPositionProvider {
    /// Provider that has no position at all.
    pub fn new() -> Self {
        Self {
            default_response: Mutex::new(MockResponse::Empty),
            scripted: Mutex::new(VecDeque::new()),
            last_known: Mutex::new(Ok(None)),
            latency_ms: AtomicU64::new(0),
            fresh_count: AtomicU32::new(0),
            last_known_count: AtomicU32::new(0),
        }
    }

    /// Provider that always answers with the given coordinates.
    pub fn at(latitude: f64, longitude: f64) -> Result<Self> {
        let fix = Fix::new(latitude, longitude)?;
        Ok(Self::new().with_fresh(MockResponse::Fix(fix)))
    }

    /// Set the default fresh-fix response.
    #[must_use]
    pub fn with_fresh(self, response: MockResponse) -> Self {
        self.set_fresh(response);
        self
    }

    /// Set the last-known fix.
    #[must_use]
    pub fn with_last_known(self, fix: Option<Fix>) -> Self {
        self.set_last_known(fix);
        self
    }

    /// Make the last-known lookup fail.
    #[must_use]
    pub fn with_last_known_error(self, message: &str) -> Self {
        *lock(&self.last_known) = Err(message.to_string());
        self
    }

    /// Delay every fresh-fix request.
    #[must_use]
    pub fn with_latency(self, latency: Duration) -> Self {
        self.latency_ms
            .store(latency.as_millis() as u64, Ordering::Relaxed);
        self
    }

    /// Change the default fresh-fix response.
    pub fn set_fresh(&self, response: MockResponse) {
        *lock(&self.default_response) = response;
    }

    /// Change the last-known fix.
    pub fn set_last_known(&self, fix: Option<Fix>) {
        *lock(&self.last_known) = Ok(fix);
    }

    /// Queue a one-off fresh-fix response.
    pub fn push_fresh(&self, response: MockResponse) {
        lock(&self.scripted).push_back(response);
    }

    /// Number of fresh-fix requests made.
    pub fn fresh_count(&self) -> u32 {
        self.fresh_count.load(Ordering::Relaxed)
    }

    /// Number of last-known lookups made.
    pub fn last_known_count(&self) -> u32 {
        self.last_known_count.load(Ordering::Relaxed)
    }

    fn next_response(&self) -> MockResponse {
        if let Some(response) = lock(&self.scripted).pop_front() {
            return response;
        }
        lock(&self.default_response).clone()
    }
}

#[async_trait]
impl PositionProvider for MockPositionProvider {
    async fn request_fix(&self, _request: &FixRequest) -> Result<Option<Fix>> {
        self.fresh_count.fetch_add(1, Ordering::Relaxed);

        let latency = self.latency_ms.load(Ordering::Relaxed);
        if latency > 0 {
            tokio::time::sleep(Duration::from_millis(latency)).await;
        }

        match self.next_response() {
            MockResponse::Fix(fix) => Ok(Some(fix)),
            MockResponse::Empty => Ok(None),
            MockResponse::Fail(message) => Err(Error::FixFailed(message)),
            MockResponse::Cancelled => Err(Error::Cancelled),
        }
    }

    async fn last_known_fix(&self) -> Result<Option<Fix>> {
        self.last_known_count.fetch_add(1, Ordering::Relaxed);
        lock(&self.last_known)
            .clone()
            .map_err(Error::FixFailed)
    }
}

/// A mock reverse geocoder.
#[derive(Debug)]
pub struct MockResolver {
    response: Mutex<std::result::Result<Vec<String>, String>>,
    /// Simulated latency in milliseconds (0 = no delay).
    latency_ms: AtomicU64,
    calls: AtomicU32,
}

impl MockResolver {
    /// Resolver answering with the given lines.
    pub fn with_lines<I, S>(lines: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            response: Mutex::new(Ok(lines.into_iter().map(Into::into).collect())),
            latency_ms: AtomicU64::new(0),
            calls: AtomicU32::new(0),
        }
    }

    /// Resolver that always fails.
    pub fn failing(message: &str) -> Self {
        Self {
            response: Mutex::new(Err(message.to_string())),
            latency_ms: AtomicU64::new(0),
            calls: AtomicU32::new(0),
        }
    }

    /// Delay every lookup.
    #[must_use]
    pub fn with_latency(self, latency: Duration) -> Self {
        self.latency_ms
            .store(latency.as_millis() as u64, Ordering::Relaxed);
        self
    }

    /// Replace the configured answer.
    pub fn set_lines<I, S>(&self, lines: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        *lock(&self.response) = Ok(lines.into_iter().map(Into::into).collect());
    }

    /// Number of lookups made.
    pub fn call_count(&self) -> u32 {
        self.calls.load(Ordering::Relaxed)
    }
}

#[async_trait]
impl AddressResolver for MockResolver {
    async fn resolve(&self, _latitude: f64, _longitude: f64) -> Result<Vec<String>> {
        self.calls.fetch_add(1, Ordering::Relaxed);

        let latency = self.latency_ms.load(Ordering::Relaxed);
        if latency > 0 {
            tokio::time::sleep(Duration::from_millis(latency)).await;
        }

        lock(&self.response).clone().map_err(Error::Geocode)
    }
}

// A poisoned mock only happens after a panicking test thread; keep going.
fn lock<T>(mutex: &Mutex<T>) -> std::sync::MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|e| e.into_inner())
}
