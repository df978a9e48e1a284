//! Robot Controller for the FR5 Arm
//!
//! Provides high-level robot control including the gripper initialization
//! sequence, blocking motion commands, and the error-code gate shared by
//! every vendor call.

use crate::{
    config::{Config, DebugLevel},
    error::{Fr5Error, Result},
    rpc::{
        CartesianPose, Fr5Rpc, GripperAction, GripperCommand, JointPose, RpcClient,
        SingularityMode,
    },
};
use std::time::Duration;
use tracing::{error, info, warn};

/// Gripper accessory slot on the controller.
const GRIPPER_INDEX: i32 = 1;

/// Controller session states
#[derive(Debug, Clone, PartialEq)]
pub enum ControllerState {
    /// Session open, setup sequence not yet run
    Connected,
    /// Setup sequence completed, robot accepts commands
    Ready,
    /// Session closed by shutdown
    Closed,
}

/// Per-move gripper parameters, percent of device range.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GripperParams {
    pub speed: u8,
    pub force: u8,
}

impl Default for GripperParams {
    fn default() -> Self {
        Self {
            speed: 100,
            force: 50,
        }
    }
}

/// Which vendor motion command a move resolves to.
enum MotionKind {
    Joint,
    Cartesian,
    Linear,
}

/// Robot controller that owns one RPC session to one FR5 arm.
///
/// All operations are sequential and blocking: each issues one vendor
/// call, gates on its error code, and only then proceeds.
pub struct RobotController<R: Fr5Rpc = RpcClient> {
    config: Config,
    rpc: R,
    state: ControllerState,
}

impl RobotController<RpcClient> {
    /// Open an RPC session to the controller at the configured address.
    pub fn connect(config: Config) -> Result<Self> {
        info!("Connecting to FR5 controller at {}", config.robot.host);
        let rpc = RpcClient::connect(&config.robot.host)?;
        Ok(Self::with_rpc(rpc, config))
    }
}

impl<R: Fr5Rpc> RobotController<R> {
    /// Build a controller over an already-open session.
    pub fn with_rpc(rpc: R, config: Config) -> Self {
        Self {
            config,
            rpc,
            state: ControllerState::Connected,
        }
    }

    /// Run the complete setup sequence
    ///
    /// 1. Validate the configured console verbosity
    /// 2. Select, read back, reset and activate the gripper accessory
    /// 3. Clear any pre-existing controller fault state
    ///
    /// Aborts on the first failing call; no later setup call is issued.
    pub async fn initialize(&mut self) -> Result<()> {
        let level: DebugLevel = self.config.robot.log_level().parse()?;
        info!(
            "Initializing FR5 controller (host {}, log level {:?})",
            self.config.robot.host, level
        );

        self.setup_gripper().await?;
        self.clear_faults()?;

        self.state = ControllerState::Ready;
        info!("Robot initialization complete");
        Ok(())
    }

    /// Select and activate the gripper accessory, settling after each step.
    async fn setup_gripper(&mut self) -> Result<()> {
        let gripper = self.config.gripper();

        let code = self
            .rpc
            .set_gripper_config(gripper.company(), gripper.device())?;
        self.gate("SetGripperConfig", code)?;
        self.settle().await;

        let (code, company, device) = self.rpc.gripper_config()?;
        self.gate("GetGripperConfig", code)?;
        info!("Gripper configured: company {}, device {}", company, device);
        self.settle().await;

        let code = self.rpc.act_gripper(GRIPPER_INDEX, GripperAction::Reset)?;
        self.gate("ActGripper(reset)", code)?;
        self.settle().await;

        let code = self.rpc.act_gripper(GRIPPER_INDEX, GripperAction::Activate)?;
        self.gate("ActGripper(activate)", code)?;
        self.settle().await;

        Ok(())
    }

    /// Shared error gate: every vendor call funnels its code through here.
    fn gate(&self, op: &str, code: i32) -> Result<()> {
        if code == 0 {
            info!("{}: OK", op);
            Ok(())
        } else {
            let fault = Fr5Error::from_code(code);
            error!("{}: {}", op, fault);
            Err(fault)
        }
    }

    /// Blocking joint-space move, then a gripper move to `gripper_pos`.
    ///
    /// Speed is percent of rated joint speed. When singularity avoidance
    /// is enabled in config, the vendor toggle wraps the whole operation.
    pub async fn move_joint(
        &mut self,
        target: &JointPose,
        gripper_pos: u8,
        speed: f64,
        gripper: GripperParams,
    ) -> Result<()> {
        self.run_motion(MotionKind::Joint, target, gripper_pos, speed, gripper)
            .await?;
        info!("Joint target reached");
        Ok(())
    }

    /// Blocking point-to-point cartesian move, then a gripper move.
    pub async fn move_cartesian(
        &mut self,
        target: &CartesianPose,
        gripper_pos: u8,
        speed: f64,
        gripper: GripperParams,
    ) -> Result<()> {
        self.run_motion(MotionKind::Cartesian, target, gripper_pos, speed, gripper)
            .await?;
        info!("Cartesian target reached");
        Ok(())
    }

    /// Blocking straight-line move in task space, then a gripper move.
    pub async fn move_linear(
        &mut self,
        target: &CartesianPose,
        gripper_pos: u8,
        speed: f64,
        gripper: GripperParams,
    ) -> Result<()> {
        self.run_motion(MotionKind::Linear, target, gripper_pos, speed, gripper)
            .await?;
        info!("Linear target reached");
        Ok(())
    }

    /// Common shape of the three motion commands: arm the anti-singularity
    /// toggle, issue the primary move, chain the gripper move on success,
    /// disarm the toggle. Any nonzero code aborts the whole operation.
    async fn run_motion(
        &mut self,
        kind: MotionKind,
        target: &[f64; 6],
        gripper_pos: u8,
        speed: f64,
        gripper: GripperParams,
    ) -> Result<()> {
        let movement = self.config.movement();
        let guarded = self.config.robot.singularity_avoidance();

        let (mode, label) = match kind {
            MotionKind::Joint => (SingularityMode::Joint, "MoveJ"),
            MotionKind::Cartesian => (SingularityMode::EndEffector, "MoveCart"),
            MotionKind::Linear => (SingularityMode::EndEffector, "MoveL"),
        };

        if guarded {
            let code = self.rpc.set_singularity_avoidance(mode, true)?;
            self.gate("SingularAvoid(on)", code)?;
        }

        let code = match kind {
            MotionKind::Joint => self.rpc.move_joint(target, movement.tool(), movement.frame(), speed)?,
            MotionKind::Cartesian => {
                self.rpc
                    .move_cartesian(target, movement.tool(), movement.frame(), speed)?
            }
            MotionKind::Linear => {
                self.rpc
                    .move_linear(target, movement.tool(), movement.frame(), speed)?
            }
        };
        self.gate(label, code)?;

        self.move_gripper(gripper_pos, gripper.speed, gripper.force)
            .await?;

        if guarded {
            let code = self.rpc.set_singularity_avoidance(mode, false)?;
            self.gate("SingularAvoid(off)", code)?;
        }

        Ok(())
    }

    /// Drive the gripper to `target` percent and poll until the read-back
    /// position is inside the configured tolerance band.
    ///
    /// Returns immediately when the gripper already reads inside the band.
    /// Gives up with [`Fr5Error::GripperTimeout`] once the configured
    /// attempt count is exhausted.
    pub async fn move_gripper(&mut self, target: u8, speed: u8, force: u8) -> Result<()> {
        let tolerance = self.config.gripper().tolerance();
        let polling = self.config.polling();

        let mut position = self.gripper_position()?;
        let mut attempts: u32 = 0;

        while position.abs_diff(target) > tolerance {
            if attempts >= polling.max_attempts() {
                return Err(Fr5Error::GripperTimeout {
                    target,
                    last: position,
                    attempts,
                });
            }

            let command = GripperCommand {
                position: target,
                speed,
                force,
            };
            let code = self
                .rpc
                .move_gripper(GRIPPER_INDEX, command, polling.gripper_timeout_ms())?;
            self.gate("MoveGripper", code)?;

            self.sleep_ms(polling.interval_ms()).await;
            position = self.gripper_position()?;
            attempts += 1;
        }

        info!("Gripper position reached ({}%)", position);
        Ok(())
    }

    /// Query the current gripper position.
    pub fn gripper_position(&mut self) -> Result<u8> {
        let (code, reading) = self.rpc.gripper_state(GRIPPER_INDEX)?;
        self.gate("GetGripperCurPosition", code)?;
        if reading.fault != 0 {
            warn!("Gripper reports device fault {}", reading.fault);
        }
        Ok(reading.position)
    }

    /// Query the current joint angles in degrees.
    pub async fn joint_positions(&mut self) -> Result<JointPose> {
        let (code, pose) = self.rpc.joint_positions()?;
        self.gate("GetActualJointPosDegree", code)?;
        self.settle().await;
        Ok(pose)
    }

    /// Query the current end-effector pose in the task frame.
    pub async fn cartesian_pose(&mut self) -> Result<CartesianPose> {
        let (code, pose) = self.rpc.cartesian_pose()?;
        self.gate("GetActualTCPPose", code)?;
        self.settle().await;
        Ok(pose)
    }

    /// Global speed override on the controller, percent of rated.
    pub fn set_speed(&mut self, percent: u8) -> Result<()> {
        let code = self.rpc.set_speed(percent)?;
        self.gate("SetSpeed", code)
    }

    /// Clear any pending controller fault state.
    pub fn clear_faults(&mut self) -> Result<()> {
        let code = self.rpc.reset_all_errors()?;
        self.gate("ResetAllError", code)
    }

    /// Close the RPC session explicitly.
    pub async fn shutdown(&mut self) -> Result<()> {
        info!("Closing controller session");
        let code = self.rpc.close()?;
        self.gate("CloseRPC", code)?;
        self.state = ControllerState::Closed;
        Ok(())
    }

    /// Get the current controller state
    pub fn state(&self) -> &ControllerState {
        &self.state
    }

    /// Check if the setup sequence has completed
    pub fn is_ready(&self) -> bool {
        matches!(self.state, ControllerState::Ready)
    }

    /// Get the controller configuration
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Fixed delay after setup and query calls; vendor polling cadence.
    async fn settle(&self) {
        self.sleep_ms(self.config.polling().settle_ms()).await;
    }

    async fn sleep_ms(&self, ms: u64) {
        if ms > 0 {
            tokio::time::sleep(Duration::from_millis(ms)).await;
        }
    }
}

impl<R: Fr5Rpc> Drop for RobotController<R> {
    fn drop(&mut self) {
        // Best effort close so an early error does not leak the session.
        if self.state != ControllerState::Closed {
            let _ = self.rpc.close();
        }
    }
}
