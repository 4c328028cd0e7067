use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

#[derive(Debug, Clone)]
pub struct ContentRetryCondition {
    pub pattern: String,
    pub is_regex: bool,
}

#[derive(Debug, Clone)]
pub enum RetryCondition {
    StatusCode(u16),
    /// Inclusive range, e.g. `500..=599`.
    StatusRange(u16, u16),
    Content(ContentRetryCondition),
}

#[derive(Debug, Clone, Copy)]
pub enum BackoffPolicy {
    Constant,
    Linear,
    Exponential { factor: f32 },
}

#[derive(Debug, Clone, Eq, PartialEq, Hash)]
pub enum RetryCategory {
    RateLimit,      // 429, rate limiting messages
    ServerError,    // 500-599
    Timeout,        // 408, gateway timeouts
    BotDetection,   // captchas, "are you a robot" pages
    Custom(String),
}

#[derive(Debug, Clone)]
pub struct CategoryConfig {
    pub max_retries: usize,
    pub initial_delay: Duration,
    pub max_delay: Duration,
    pub backoff_policy: BackoffPolicy,
    pub conditions: Vec<RetryCondition>,
}

#[derive(Debug, Clone)]
pub struct RetryState {
    pub counts: HashMap<RetryCategory, usize>,
    pub total_retries: usize,
}

/// Retry rules plus the per-URL attempt counters they have consumed.
///
/// Clones share counters, so a config handed to many fetch tasks still
/// enforces `max_retries` per URL across all of them.
#[derive(Debug, Clone)]
pub struct RetryConfig {
    pub categories: HashMap<RetryCategory, CategoryConfig>,
    pub(crate) retry_states: Arc<RwLock<HashMap<String, RetryState>>>,
}
