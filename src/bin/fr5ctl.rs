//! FR5 Controller CLI
//!
//! Runs demonstration move cycles and one-shot commands against an FR5
//! arm: joint swings, a cartesian square, pose queries and gripper moves.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use fr5ctl::{CartesianPose, Config, DebugLevel, GripperParams, JointPose, RobotController};
use serde::Serialize;
use tracing::{error, info};

/// Demonstration joint targets: home and a 90 degree base swing.
const JOINT_HOME: JointPose = [0.0, -99.668, 117.473, -108.615, -91.726, 74.256];
const JOINT_SWUNG: JointPose = [90.0, -99.668, 117.473, -108.615, -91.726, 74.256];

/// First corner of the demonstration square in the task frame.
const CART_BASE: CartesianPose = [-310.646, 167.840, 237.210, 179.631, 0.0, 45.730];

/// Side length of the demonstration square, mm.
const SQUARE_MM: f64 = 200.0;

#[derive(Parser)]
#[command(name = "fr5ctl")]
#[command(about = "FR5 robot controller - demo move cycles and one-shot commands")]
#[command(version)]
struct Args {
    /// Path to the configuration file
    #[arg(short, long)]
    config: Option<String>,

    /// Override the controller address from the config file
    #[arg(long)]
    host: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Swing between two joint targets, actuating the gripper at each end
    JointCycle {
        /// Number of cycles to run
        #[arg(short = 'n', long, default_value = "10")]
        cycles: u32,

        /// Joint speed, percent of rated (default from config)
        #[arg(long)]
        speed: Option<f64>,
    },
    /// Trace a square in task space, actuating the gripper at each corner
    CartCycle {
        /// Number of cycles to run
        #[arg(short = 'n', long, default_value = "100")]
        cycles: u32,

        /// End-effector speed, percent of rated (default from config)
        #[arg(long)]
        speed: Option<f64>,
    },
    /// Print the current joint angles and end-effector pose as JSON
    Pose,
    /// Drive the gripper to a position and wait for it to settle
    Gripper {
        /// Target position, percent of range
        position: u8,

        /// Closing speed, percent of rated
        #[arg(long, default_value = "100")]
        speed: u8,

        /// Grip force, percent of rated
        #[arg(long, default_value = "50")]
        force: u8,
    },
}

impl Args {
    fn config_path(&self) -> String {
        self.config
            .clone()
            .or_else(|| std::env::var("FR5CTL_CONFIG").ok())
            .unwrap_or_else(|| "config/default_config.yaml".to_string())
    }
}

#[derive(Serialize)]
struct PoseReport {
    timestamp: String,
    joint_degrees: JointPose,
    tcp_pose: CartesianPose,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    let config_path = args.config_path();

    let mut config = Config::load(&config_path)
        .with_context(|| format!("Failed to load config from {}", config_path))?;
    if let Some(host) = &args.host {
        config.robot.host = host.clone();
    }
    let host = config.robot.host.clone();

    let level: DebugLevel = config
        .robot
        .log_level()
        .parse()
        .context("Invalid log level in configuration")?;
    tracing_subscriber::fmt()
        .with_target(false)
        .with_level(true)
        .with_max_level(level.tracing_level())
        .with_writer(std::io::stderr)
        .init();

    info!("FR5 Controller (Rust)");
    info!("Using config: {}", config_path);

    let mut controller =
        RobotController::connect(config).context("Failed to connect to FR5 controller")?;

    if let Err(e) = controller.initialize().await {
        error!("Robot initialization failed: {}", e);
        error!("Make sure:");
        error!("   - The controller is powered and reachable at {}", host);
        error!("   - The gripper accessory is mounted and wired");
        return Err(e).context("Robot initialization failed");
    }
    info!("Robot ready for commands");

    let result = run(&mut controller, &args.command).await;

    controller.shutdown().await.context("Failed during shutdown")?;
    info!("Shutdown complete");

    result
}

async fn run(controller: &mut RobotController, command: &Commands) -> Result<()> {
    match command {
        Commands::JointCycle { cycles, speed } => run_joint_cycle(controller, *cycles, *speed).await,
        Commands::CartCycle { cycles, speed } => run_cart_cycle(controller, *cycles, *speed).await,
        Commands::Pose => run_pose(controller).await,
        Commands::Gripper {
            position,
            speed,
            force,
        } => run_gripper(controller, *position, *speed, *force).await,
    }
}

async fn run_joint_cycle(
    controller: &mut RobotController,
    cycles: u32,
    speed: Option<f64>,
) -> Result<()> {
    let speed = speed.unwrap_or_else(|| controller.config().movement().joint_speed());
    info!("Running {} joint cycles at {}% speed", cycles, speed);

    for cycle in 0..cycles {
        info!("Cycle {}/{}", cycle + 1, cycles);
        controller
            .move_joint(&JOINT_HOME, 100, speed, GripperParams::default())
            .await?;
        controller
            .move_joint(&JOINT_SWUNG, 0, speed, GripperParams::default())
            .await?;
    }
    Ok(())
}

async fn run_cart_cycle(
    controller: &mut RobotController,
    cycles: u32,
    speed: Option<f64>,
) -> Result<()> {
    let speed = speed.unwrap_or_else(|| controller.config().movement().cartesian_speed());
    let [c1, c2, c3, c4] = square_corners();
    info!("Running {} cartesian square cycles at {}% speed", cycles, speed);

    for cycle in 0..cycles {
        info!("Cycle {}/{}", cycle + 1, cycles);
        controller
            .move_cartesian(&c1, 100, speed, GripperParams::default())
            .await?;
        controller
            .move_cartesian(&c2, 0, speed, GripperParams::default())
            .await?;
        controller
            .move_cartesian(&c3, 100, speed, GripperParams::default())
            .await?;
        controller
            .move_cartesian(&c4, 0, speed, GripperParams::default())
            .await?;
        controller
            .move_cartesian(&c1, 100, speed, GripperParams::default())
            .await?;
    }
    Ok(())
}

/// Corners of the demonstration square: diagonal in x/y, then straight
/// down in z, back under the start.
fn square_corners() -> [CartesianPose; 4] {
    let diagonal = SQUARE_MM / std::f64::consts::SQRT_2;

    let mut c2 = CART_BASE;
    c2[0] += diagonal;
    c2[1] += diagonal;

    let mut c3 = c2;
    c3[2] -= SQUARE_MM;

    let mut c4 = CART_BASE;
    c4[2] -= SQUARE_MM;

    [CART_BASE, c2, c3, c4]
}

async fn run_pose(controller: &mut RobotController) -> Result<()> {
    let joint_degrees = controller.joint_positions().await?;
    let tcp_pose = controller.cartesian_pose().await?;

    let report = PoseReport {
        timestamp: chrono::Utc::now().to_rfc3339(),
        joint_degrees,
        tcp_pose,
    };
    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(())
}

async fn run_gripper(
    controller: &mut RobotController,
    position: u8,
    speed: u8,
    force: u8,
) -> Result<()> {
    controller.move_gripper(position, speed, force).await?;

    let settled = controller.gripper_position()?;
    info!("Gripper settled at {}%", settled);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn square_corners_close_the_loop() {
        let [c1, c2, c3, c4] = square_corners();

        // Diagonal legs keep the commanded side length.
        let dx = c2[0] - c1[0];
        let dy = c2[1] - c1[1];
        assert!((dx.hypot(dy) - SQUARE_MM).abs() < 1e-9);

        // Vertical legs drop straight down.
        assert_eq!(c3[2], c2[2] - SQUARE_MM);
        assert_eq!(c4[2], c1[2] - SQUARE_MM);

        // Orientation never changes across the square.
        for corner in [c2, c3, c4] {
            assert_eq!(&corner[3..], &c1[3..]);
        }
    }
}
