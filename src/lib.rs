//! FR5 robot arm control library
//!
//! Thin control layer over the FAIRINO FR5 controller's RPC call surface:
//! session setup, gripper initialization, blocking joint and cartesian
//! motion, and an error-code gate shared by every vendor call. Motion
//! planning, kinematics and singularity avoidance stay inside the vendor
//! firmware; this crate only issues calls into it.
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use fr5ctl::{Config, GripperParams, RobotController};
//!
//! #[tokio::main]
//! async fn main() -> fr5ctl::Result<()> {
//!     let config = Config::load("config/default_config.yaml")?;
//!     let mut robot = RobotController::connect(config)?;
//!     robot.initialize().await?;
//!
//!     let home = [0.0, -99.668, 117.473, -108.615, -91.726, 74.256];
//!     robot.move_joint(&home, 100, 30.0, GripperParams::default()).await?;
//!
//!     robot.shutdown().await?;
//!     Ok(())
//! }
//! ```
//!
//! # Architecture
//!
//! - **RobotController**: session ownership, setup sequence, motion and
//!   gripper operations, shared error gate
//! - **Fr5Rpc / RpcClient**: the vendor call surface and its TCP session
//! - **Config**: YAML configuration with per-section defaults

pub mod config;
pub mod controller;
pub mod error;
pub mod rpc;

// High-level exports for easy usage
pub use config::{Config, DebugLevel};
pub use controller::{ControllerState, GripperParams, RobotController};
pub use error::{Fr5Error, Result};
pub use rpc::{CartesianPose, Fr5Rpc, JointPose, RpcClient};

// Core component exports for advanced usage
pub use config::{GripperConfig, MovementConfig, PollingConfig, RobotConfig};
pub use error::MOTION_FAULT_CODE;
pub use rpc::{
    GripperAction, GripperCommand, GripperReading, SingularityMode, FR_RPC_PORT,
};
