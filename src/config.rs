//! Game configuration.
//!
//! Values are checked once, when a [`crate::Game`] is built, so the
//! simulation never has to deal with impossible geometry. Configs can be
//! written as TOML; missing keys fall back to the defaults.
//!
//! ```toml
//! pipe_distance = 260.0
//! pipe_gap = 180.0
//! speed_increase_rate = 0.1
//! ```

use crate::pipe::{PIPE_MARGIN, PIPE_WIDTH};
use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("screen must be positive and finite, got {width}x{height}")]
    InvalidScreen { width: f64, height: f64 },

    #[error("tick rate must be at least 1")]
    ZeroTickRate,

    #[error("pipe distance {distance} must exceed the pipe width {min}")]
    PipeDistanceTooShort { distance: f64, min: f64 },

    #[error("pipe gap must be positive, got {0}")]
    PipeGapNotPositive(f64),

    #[error("pipe gap {gap} does not fit the screen (max {max})")]
    PipeGapTooLarge { gap: f64, max: f64 },

    #[error("speed increase rate must be finite and non-negative, got {0}")]
    InvalidSpeedIncrease(f64),

    #[error("base speed must be finite and positive, got {0}")]
    InvalidBaseSpeed(f64),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Parse error: {0}")]
    Parse(#[from] toml::de::Error),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GameConfig {
    pub screen_width: f64,
    pub screen_height: f64,
    /// Simulated ticks per second. Drives the speed ramp and render pacing.
    pub tick_rate: u32,
    /// Horizontal spacing that triggers the next spawn.
    pub pipe_distance: f64,
    pub pipe_gap: f64,
    /// Scroll speed gained per simulated second. 0 keeps speed constant.
    pub speed_increase_rate: f64,
    /// Scroll speed at the start of an episode, in units per tick.
    pub base_speed: f64,
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            screen_width: 400.0,
            screen_height: 600.0,
            tick_rate: 60,
            pipe_distance: 300.0,
            pipe_gap: 200.0,
            speed_increase_rate: 0.0,
            base_speed: 3.0,
        }
    }
}

impl GameConfig {
    /// Largest gap that still leaves both columns `PIPE_MARGIN` tall.
    pub fn max_pipe_gap(&self) -> f64 {
        self.screen_height - 2.0 * PIPE_MARGIN
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let screen_ok = |v: f64| v.is_finite() && v > 0.0;
        if !screen_ok(self.screen_width) || !screen_ok(self.screen_height) {
            return Err(ConfigError::InvalidScreen {
                width: self.screen_width,
                height: self.screen_height,
            });
        }
        if self.tick_rate == 0 {
            return Err(ConfigError::ZeroTickRate);
        }
        if !(self.pipe_distance > PIPE_WIDTH) {
            return Err(ConfigError::PipeDistanceTooShort {
                distance: self.pipe_distance,
                min: PIPE_WIDTH,
            });
        }
        if !(self.pipe_gap > 0.0) {
            return Err(ConfigError::PipeGapNotPositive(self.pipe_gap));
        }
        if self.pipe_gap > self.max_pipe_gap() {
            return Err(ConfigError::PipeGapTooLarge {
                gap: self.pipe_gap,
                max: self.max_pipe_gap(),
            });
        }
        if !self.speed_increase_rate.is_finite() || self.speed_increase_rate < 0.0 {
            return Err(ConfigError::InvalidSpeedIncrease(self.speed_increase_rate));
        }
        if !self.base_speed.is_finite() || self.base_speed <= 0.0 {
            return Err(ConfigError::InvalidBaseSpeed(self.base_speed));
        }
        Ok(())
    }

    pub fn from_toml_str(s: &str) -> Result<Self, ConfigError> {
        let config: GameConfig = toml::from_str(s)?;
        config.validate()?;
        Ok(config)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)?;
        let config = Self::from_toml_str(&text)?;
        log::info!("Loaded game config from {:?}", path);
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_valid() {
        let config = GameConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.tick_rate, 60);
        assert_eq!(config.pipe_distance, 300.0);
        assert_eq!(config.pipe_gap, 200.0);
        assert_eq!(config.speed_increase_rate, 0.0);
    }

    #[test]
    fn test_gap_too_large_rejected() {
        let config = GameConfig {
            pipe_gap: 401.0,
            ..GameConfig::default()
        };
        assert!(matches!(
            config.validate(),
            Err(ConfigError::PipeGapTooLarge { .. })
        ));
    }

    #[test]
    fn test_largest_fitting_gap_accepted() {
        let config = GameConfig {
            pipe_gap: 400.0,
            ..GameConfig::default()
        };
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_gap_must_be_positive() {
        for gap in [0.0, -10.0, f64::NAN] {
            let config = GameConfig {
                pipe_gap: gap,
                ..GameConfig::default()
            };
            assert!(matches!(
                config.validate(),
                Err(ConfigError::PipeGapNotPositive(_))
            ));
        }
    }

    #[test]
    fn test_pipe_distance_must_exceed_width() {
        let config = GameConfig {
            pipe_distance: PIPE_WIDTH,
            ..GameConfig::default()
        };
        assert!(matches!(
            config.validate(),
            Err(ConfigError::PipeDistanceTooShort { .. })
        ));
    }

    #[test]
    fn test_negative_speed_increase_rejected() {
        let config = GameConfig {
            speed_increase_rate: -0.1,
            ..GameConfig::default()
        };
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvalidSpeedIncrease(_))
        ));
    }

    #[test]
    fn test_zero_tick_rate_rejected() {
        let config = GameConfig {
            tick_rate: 0,
            ..GameConfig::default()
        };
        assert!(matches!(config.validate(), Err(ConfigError::ZeroTickRate)));
    }

    #[test]
    fn test_bad_base_speed_rejected() {
        let config = GameConfig {
            base_speed: 0.0,
            ..GameConfig::default()
        };
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvalidBaseSpeed(_))
        ));
    }

    #[test]
    fn test_bad_screen_rejected() {
        let config = GameConfig {
            screen_width: f64::INFINITY,
            ..GameConfig::default()
        };
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvalidScreen { .. })
        ));
    }

    #[test]
    fn test_partial_toml_uses_defaults() {
        let config = GameConfig::from_toml_str("pipe_gap = 150.0\nspeed_increase_rate = 0.5\n")
            .expect("valid config");
        assert_eq!(config.pipe_gap, 150.0);
        assert_eq!(config.speed_increase_rate, 0.5);
        assert_eq!(config.pipe_distance, 300.0);
        assert_eq!(config.screen_height, 600.0);
    }

    #[test]
    fn test_toml_validation_applies() {
        let err = GameConfig::from_toml_str("pipe_gap = 500.0").unwrap_err();
        assert!(matches!(err, ConfigError::PipeGapTooLarge { .. }));
    }

    #[test]
    fn test_malformed_toml_is_parse_error() {
        let err = GameConfig::from_toml_str("pipe_gap = \"wide\"").unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    fn test_load_missing_file_is_io_error() {
        let err = GameConfig::load("/nonexistent/flappy.toml").unwrap_err();
        assert!(matches!(err, ConfigError::Io(_)));
    }
}
