use std::time::Duration;

use crate::cli::Args;
use crate::notice::DEFAULT_NOTICE_DURATION;
use crate::transport::RateLimitPolicy;

pub const DEFAULT_USER_ID: &str = "user-123";
pub const ASSISTANT_NAME: &str = "Asistente IA – Gemini";

#[derive(Clone, Debug)]
pub struct WidgetConfig {
    pub user_id: String,
    pub notice_duration: Duration,
    pub rate_limit: RateLimitPolicy,
}

impl Default for WidgetConfig {
    fn default() -> Self {
        Self {
            user_id: DEFAULT_USER_ID.to_string(),
            notice_duration: DEFAULT_NOTICE_DURATION,
            rate_limit: RateLimitPolicy::default(),
        }
    }
}

impl WidgetConfig {
    pub fn from_args(args: &Args) -> Self {
        Self {
            user_id: args.user_id.clone(),
            notice_duration: Duration::from_millis(args.notice_ms),
            rate_limit: RateLimitPolicy::new(
                args.rate_limit_status.clone(),
                args.rate_limit_markers.clone()
            ),
        }
    }
}

/// `None` when the timeout is disabled.
pub fn http_timeout(args: &Args) -> Option<Duration> {
    (args.http_timeout_secs > 0).then(|| Duration::from_secs(args.http_timeout_secs))
}
