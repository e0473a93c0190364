use std::fmt;
use std::sync::Arc;

use super::TransportError;

type Predicate = Arc<dyn Fn(&TransportError) -> bool + Send + Sync>;

/// Decides whether a failed send means "the service is saturated" rather
/// than a generic failure.
#[derive(Clone)]
pub struct RateLimitPolicy {
    statuses: Vec<u16>,
    markers: Vec<String>,
    predicate: Option<Predicate>,
}

impl RateLimitPolicy {
    pub fn new(statuses: Vec<u16>, markers: Vec<String>) -> Self {
        Self {
            statuses,
            markers: markers
                .into_iter()
                .map(|m| m.trim().to_lowercase())
                .filter(|m| !m.is_empty())
                .collect(),
            predicate: None,
        }
    }

    /// Replaces status and marker matching with an arbitrary check.
    pub fn with_predicate<F>(predicate: F) -> Self
        where F: Fn(&TransportError) -> bool + Send + Sync + 'static
    {
        Self {
            statuses: Vec::new(),
            markers: Vec::new(),
            predicate: Some(Arc::new(predicate)),
        }
    }

    pub fn is_rate_limited(&self, err: &TransportError) -> bool {
        if let Some(predicate) = &self.predicate {
            return predicate(err);
        }
        if let Some(status) = err.status() {
            if self.statuses.contains(&status) {
                return true;
            }
        }
        let text = err.to_string().to_lowercase();
        self.markers.iter().any(|m| text.contains(m.as_str()))
    }
}

impl Default for RateLimitPolicy {
    fn default() -> Self {
        Self::new(vec![429], vec!["resource_exhausted".to_string(), "429".to_string()])
    }
}

impl fmt::Debug for RateLimitPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RateLimitPolicy")
            .field("statuses", &self.statuses)
            .field("markers", &self.markers)
            .field("custom", &self.predicate.is_some())
            .finish()
    }
}
