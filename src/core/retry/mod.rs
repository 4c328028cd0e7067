mod retry;
mod types;

pub use types::{
    BackoffPolicy, CategoryConfig, ContentRetryCondition, RetryCategory, RetryCondition,
    RetryConfig, RetryState,
};
