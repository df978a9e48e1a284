//! Configuration loading for the FR5 robot

use crate::{Fr5Error, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::str::FromStr;

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Config {
    pub robot: RobotConfig,
    pub gripper: Option<GripperConfig>,
    pub movement: Option<MovementConfig>,
    pub polling: Option<PollingConfig>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RobotConfig {
    pub host: String,
    pub log_level: Option<String>,
    pub singularity_avoidance: Option<bool>,
}

/// Gripper accessory selection and position tolerance.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct GripperConfig {
    pub company: Option<i32>,
    pub device: Option<i32>,
    pub tolerance: Option<u8>,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct MovementConfig {
    pub tool: Option<i32>,
    pub frame: Option<i32>,
    pub joint_speed: Option<f64>,
    pub cartesian_speed: Option<f64>,
}

/// Delays and bounds for the poll loops around vendor calls.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct PollingConfig {
    pub settle_ms: Option<u64>,
    pub interval_ms: Option<u64>,
    pub max_attempts: Option<u32>,
    pub gripper_timeout_ms: Option<u32>,
}

/// Console verbosity accepted by the controller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DebugLevel {
    Info,
    Error,
}

impl FromStr for DebugLevel {
    type Err = Fr5Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "info" => Ok(DebugLevel::Info),
            "error" => Ok(DebugLevel::Error),
            other => Err(Fr5Error::Config(format!(
                "unknown debug level '{}' (expected 'info' or 'error')",
                other
            ))),
        }
    }
}

impl DebugLevel {
    /// Maximum level for the tracing subscriber.
    pub fn tracing_level(self) -> tracing::Level {
        match self {
            DebugLevel::Info => tracing::Level::INFO,
            DebugLevel::Error => tracing::Level::ERROR,
        }
    }
}

impl Config {
    pub fn load(path: &str) -> Result<Self> {
        let contents = fs::read_to_string(path)
            .map_err(|e| Fr5Error::Config(format!("Failed to read {}: {}", path, e)))?;

        let config: Config = serde_yaml::from_str(&contents)?;
        Ok(config)
    }

    /// Get gripper configuration with defaults
    pub fn gripper(&self) -> GripperConfig {
        self.gripper.clone().unwrap_or_default()
    }

    /// Get movement configuration with defaults
    pub fn movement(&self) -> MovementConfig {
        self.movement.clone().unwrap_or_default()
    }

    /// Get polling configuration with defaults
    pub fn polling(&self) -> PollingConfig {
        self.polling.clone().unwrap_or_default()
    }
}

impl RobotConfig {
    /// Get console verbosity with default fallback
    pub fn log_level(&self) -> String {
        self.log_level.clone().unwrap_or_else(|| "info".to_string())
    }

    /// Whether moves are wrapped in the vendor anti-singularity toggle
    pub fn singularity_avoidance(&self) -> bool {
        self.singularity_avoidance.unwrap_or(true)
    }
}

impl GripperConfig {
    /// Gripper vendor id with default fallback (4 = Dahuan)
    pub fn company(&self) -> i32 {
        self.company.unwrap_or(4)
    }

    /// Gripper device id with default fallback
    pub fn device(&self) -> i32 {
        self.device.unwrap_or(0)
    }

    /// Position tolerance band in percent units
    pub fn tolerance(&self) -> u8 {
        self.tolerance.unwrap_or(1)
    }
}

impl MovementConfig {
    /// Tool coordinate id with default fallback
    pub fn tool(&self) -> i32 {
        self.tool.unwrap_or(1)
    }

    /// Workpiece frame id with default fallback
    pub fn frame(&self) -> i32 {
        self.frame.unwrap_or(0)
    }

    /// Default joint-space speed, percent of rated
    pub fn joint_speed(&self) -> f64 {
        self.joint_speed.unwrap_or(30.0)
    }

    /// Default task-space speed, percent of rated
    pub fn cartesian_speed(&self) -> f64 {
        self.cartesian_speed.unwrap_or(30.0)
    }
}

impl PollingConfig {
    /// Settle delay after setup and query calls
    pub fn settle_ms(&self) -> u64 {
        self.settle_ms.unwrap_or(1000)
    }

    /// Delay between gripper position polls
    pub fn interval_ms(&self) -> u64 {
        self.interval_ms.unwrap_or(1000)
    }

    /// Poll attempts before a gripper move is declared stuck
    pub fn max_attempts(&self) -> u32 {
        self.max_attempts.unwrap_or(30)
    }

    /// Per-call timeout handed to the vendor gripper move
    pub fn gripper_timeout_ms(&self) -> u32 {
        self.gripper_timeout_ms.unwrap_or(30_000)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn minimal_config_falls_back_to_defaults() {
        let config: Config = serde_yaml::from_str("robot:\n  host: 192.168.58.2\n").unwrap();

        assert_eq!(config.robot.host, "192.168.58.2");
        assert_eq!(config.robot.log_level(), "info");
        assert!(config.robot.singularity_avoidance());
        assert_eq!(config.gripper().company(), 4);
        assert_eq!(config.gripper().tolerance(), 1);
        assert_eq!(config.movement().tool(), 1);
        assert_eq!(config.movement().joint_speed(), 30.0);
        assert_eq!(config.polling().settle_ms(), 1000);
        assert_eq!(config.polling().max_attempts(), 30);
        assert_eq!(config.polling().gripper_timeout_ms(), 30_000);
    }

    #[test]
    fn explicit_fields_override_defaults() {
        let yaml = "\
robot:
  host: 10.0.0.5
  log_level: error
  singularity_avoidance: false
polling:
  settle_ms: 0
  max_attempts: 5
";
        let config: Config = serde_yaml::from_str(yaml).unwrap();

        assert_eq!(config.robot.log_level(), "error");
        assert!(!config.robot.singularity_avoidance());
        assert_eq!(config.polling().settle_ms(), 0);
        assert_eq!(config.polling().max_attempts(), 5);
        // Omitted field inside a present section still defaults.
        assert_eq!(config.polling().interval_ms(), 1000);
    }

    #[test]
    fn debug_level_parses_known_values_only() {
        assert_eq!("info".parse::<DebugLevel>().unwrap(), DebugLevel::Info);
        assert_eq!("error".parse::<DebugLevel>().unwrap(), DebugLevel::Error);
        assert!(matches!(
            "debug".parse::<DebugLevel>(),
            Err(Fr5Error::Config(_))
        ));
    }
}
