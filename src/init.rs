use std::error::Error;
use std::time::Duration;

use crate::stream::progress::ProgressSettings;

// ============================================================================
// Configuration
// ============================================================================

/// Demo binary configuration.
#[derive(Debug, Clone)]
pub struct Config {
    pub host: String,
    pub port: u16,
}

impl Config {
    pub fn from_env() -> Result<Self, Box<dyn Error>> {
        Ok(Self {
            host: std::env::var("HOST").unwrap_or_else(|_| "127.0.0.1".to_string()),
            port: std::env::var("PORT")
                .unwrap_or_else(|_| "3000".to_string())
                .parse()?,
        })
    }
}

/// Orchestrator configuration.
///
/// The animation floor and the percent-bar scheme vary per deployment, so
/// both are knobs here rather than constants.
#[derive(Debug, Clone)]
pub struct StreamConfig {
    /// Origin of the search service.
    pub base_url: String,
    /// Path of the SSE endpoint under `base_url`.
    pub endpoint_path: String,
    /// Floor on the perceived in-flight duration.
    pub minimum_animation: Duration,
    pub progress: ProgressSettings,
}

impl StreamConfig {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            endpoint_path: "/search/stream".to_string(),
            minimum_animation: Duration::from_millis(6000),
            progress: ProgressSettings::default(),
        }
    }

    pub fn from_env() -> Result<Self, Box<dyn Error>> {
        let base_url =
            std::env::var("TRIP_BASE_URL").unwrap_or_else(|_| "http://127.0.0.1:3000".to_string());
        let mut config = Self::new(base_url);

        if let Ok(path) = std::env::var("TRIP_ENDPOINT_PATH") {
            config.endpoint_path = path;
        }
        if let Ok(ms) = std::env::var("TRIP_MIN_ANIMATION_MS") {
            config.minimum_animation = Duration::from_millis(ms.parse()?);
        }
        if let Ok(step) = std::env::var("TRIP_PROGRESS_INCREMENT") {
            config.progress.increment = step.parse()?;
        }
        if let Ok(cap) = std::env::var("TRIP_PROGRESS_CAP") {
            config.progress.cap = cap.parse::<u8>()?.min(100);
        }

        Ok(config)
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stream_config_defaults() {
        let config = StreamConfig::new("http://localhost:3000");
        assert_eq!(config.endpoint_path, "/search/stream");
        assert_eq!(config.minimum_animation, Duration::from_millis(6000));
        assert_eq!(config.progress.increment, 20);
        assert_eq!(config.progress.cap, 100);
    }
}
