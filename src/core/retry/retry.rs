use super::types::*;
use parking_lot::RwLock;
use regex::Regex;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use url::Url;

impl Default for CategoryConfig {
    fn default() -> Self {
        Self {
            max_retries: 3,
            initial_delay: Duration::from_secs(1),
            max_delay: Duration::from_secs(60),
            backoff_policy: BackoffPolicy::Exponential { factor: 2.0 },
            conditions: Vec::new(),
        }
    }
}

impl Default for RetryState {
    fn default() -> Self {
        Self::new()
    }
}

impl RetryState {
    pub fn new() -> Self {
        Self {
            counts: HashMap::new(),
            total_retries: 0,
        }
    }
}

impl RetryCondition {
    pub fn matches(&self, status: u16, content: &str) -> bool {
        match self {
            RetryCondition::StatusCode(code) => *code == status,
            RetryCondition::StatusRange(low, high) => (*low..=*high).contains(&status),
            RetryCondition::Content(condition) => condition.matches(content),
        }
    }
}

impl ContentRetryCondition {
    fn matches(&self, content: &str) -> bool {
        if self.is_regex {
            Regex::new(&self.pattern)
                .map(|re| re.is_match(content))
                .unwrap_or(false)
        } else {
            content
                .to_lowercase()
                .contains(&self.pattern.to_lowercase())
        }
    }
}

impl RetryConfig {
    /// Retries transient failures twice with exponential backoff: 429,
    /// 5xx gateway errors and 408.
    pub fn standard() -> Self {
        let mut config = Self::default();
        config.categories.insert(
            RetryCategory::RateLimit,
            CategoryConfig {
                max_retries: 2,
                conditions: vec![RetryCondition::StatusCode(429)],
                ..Default::default()
            },
        );
        config.categories.insert(
            RetryCategory::ServerError,
            CategoryConfig {
                max_retries: 2,
                conditions: vec![
                    RetryCondition::StatusCode(500),
                    RetryCondition::StatusRange(502, 504),
                    RetryCondition::StatusCode(522),
                    RetryCondition::StatusCode(524),
                ],
                ..Default::default()
            },
        );
        config.categories.insert(
            RetryCategory::Timeout,
            CategoryConfig {
                max_retries: 2,
                conditions: vec![RetryCondition::StatusCode(408)],
                ..Default::default()
            },
        );
        config
    }

    pub fn should_retry(
        &self,
        url: &Url,
        status: u16,
        content: &str,
    ) -> Option<(RetryCategory, Duration)> {
        let url_str = url.to_string();
        let mut states = self.retry_states.write();
        let state = states.entry(url_str).or_default();

        for (category, config) in &self.categories {
            let current_retries = state.counts.get(category).copied().unwrap_or(0);
            if current_retries >= config.max_retries {
                continue;
            }

            if config
                .conditions
                .iter()
                .any(|condition| condition.matches(status, content))
            {
                state.counts.insert(category.clone(), current_retries + 1);
                state.total_retries += 1;
                let delay = config.calculate_delay(current_retries);
                return Some((category.clone(), delay));
            }
        }
        None
    }

    pub fn get_retry_state(&self, url: &Url) -> RetryState {
        self.retry_states
            .read()
            .get(&url.to_string())
            .cloned()
            .unwrap_or_else(RetryState::new)
    }

    /// Removes and returns the counters for `url`, so a later fetch of the
    /// same URL starts with a full retry budget.
    pub fn take_retry_state(&self, url: &Url) -> RetryState {
        self.retry_states
            .write()
            .remove(url.as_str())
            .unwrap_or_else(RetryState::new)
    }
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            categories: Default::default(),
            retry_states: Arc::new(RwLock::new(HashMap::new())),
        }
    }
}

impl CategoryConfig {
    pub fn calculate_delay(&self, attempt: usize) -> Duration {
        if attempt == 0 {
            return self.initial_delay;
        }

        let delay = match self.backoff_policy {
            BackoffPolicy::Constant => self.initial_delay,
            BackoffPolicy::Linear => self.initial_delay.mul_f32(attempt as f32),
            BackoffPolicy::Exponential { factor } => {
                self.initial_delay.mul_f32(factor.powi(attempt as i32))
            }
        };

        std::cmp::min(delay, self.max_delay)
    }
}
