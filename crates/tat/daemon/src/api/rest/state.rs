//! Application state for API handlers

use std::sync::Arc;
use tat_engine::TimelineService;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub service: Arc<TimelineService>,

    /// Daemon version
    pub version: String,

    /// Daemon start time
    pub started_at: chrono::DateTime<chrono::Utc>,
}

impl AppState {
    pub fn new(service: Arc<TimelineService>) -> Self {
        Self {
            started_at: service.now(),
            service,
            version: env!("CARGO_PKG_VERSION").to_string(),
        }
    }

    /// Get uptime as a human-readable string
    pub fn uptime(&self) -> String {
        let secs = (self.service.now() - self.started_at).num_seconds().max(0);

        if secs < 60 {
            format!("{}s", secs)
        } else if secs < 3600 {
            format!("{}m {}s", secs / 60, secs % 60)
        } else if secs < 86400 {
            format!("{}h {}m", secs / 3600, (secs % 3600) / 60)
        } else {
            format!("{}d {}h", secs / 86400, (secs % 86400) / 3600)
        }
    }
}
