//! FR5 Controller RPC Session
//!
//! Line-oriented command client for the FR5 controller's RPC port.
//! Each call writes one `Name(arg,...)` command line and reads back one
//! comma-separated reply line whose first field is the vendor error code
//! (0 = success). The `Fr5Rpc` trait abstracts the call surface so the
//! controller can be driven against a scripted session in tests.

use crate::error::{Fr5Error, Result};
use regex::Regex;
use std::io::{Read, Write};
use std::net::TcpStream;
use std::time::Duration;
use tracing::debug;

/// RPC port owned by the controller firmware.
pub const FR_RPC_PORT: u16 = 20003;

/// Socket read timeout. Must outlast the longest blocking vendor call
/// (a gripper move may hold the line for its 30 s internal timeout).
const READ_TIMEOUT: Duration = Duration::from_secs(60);

/// Reply line: leading error code, optional comma-separated payload.
const REPLY_PATTERN: &str = r"^(-?\d+)(?:,(.*))?$";

/// Joint angles in degrees, one per axis.
pub type JointPose = [f64; 6];

/// End-effector pose in the task frame: x/y/z in mm, rx/ry/rz in degrees.
pub type CartesianPose = [f64; 6];

/// Gripper actuation target, every field a percentage of device range.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GripperCommand {
    pub position: u8,
    pub speed: u8,
    pub force: u8,
}

/// Result of a gripper position query.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct GripperReading {
    pub fault: i32,
    pub position: u8,
}

/// Motion space the anti-singularity handling is armed for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SingularityMode {
    Joint,
    EndEffector,
}

impl SingularityMode {
    fn wire_value(self) -> i32 {
        match self {
            SingularityMode::Joint => 0,
            SingularityMode::EndEffector => 1,
        }
    }
}

/// Gripper activation actions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GripperAction {
    Reset,
    Activate,
}

impl GripperAction {
    fn wire_value(self) -> i32 {
        match self {
            GripperAction::Reset => 0,
            GripperAction::Activate => 1,
        }
    }
}

/// Call surface of the vendor controller.
///
/// Every call returns the controller's integer error code ahead of any
/// data; `Err` is reserved for transport failures (socket errors,
/// malformed replies). Payload fields are only meaningful when the code
/// is 0.
pub trait Fr5Rpc {
    fn set_gripper_config(&mut self, company: i32, device: i32) -> Result<i32>;
    fn gripper_config(&mut self) -> Result<(i32, i32, i32)>;
    fn act_gripper(&mut self, index: i32, action: GripperAction) -> Result<i32>;
    fn move_gripper(&mut self, index: i32, command: GripperCommand, timeout_ms: u32)
        -> Result<i32>;
    fn gripper_state(&mut self, index: i32) -> Result<(i32, GripperReading)>;
    fn move_joint(&mut self, target: &JointPose, tool: i32, frame: i32, speed: f64)
        -> Result<i32>;
    fn move_cartesian(&mut self, target: &CartesianPose, tool: i32, frame: i32, speed: f64)
        -> Result<i32>;
    fn move_linear(&mut self, target: &CartesianPose, tool: i32, frame: i32, speed: f64)
        -> Result<i32>;
    fn joint_positions(&mut self) -> Result<(i32, JointPose)>;
    fn cartesian_pose(&mut self) -> Result<(i32, CartesianPose)>;
    fn set_singularity_avoidance(&mut self, mode: SingularityMode, enable: bool) -> Result<i32>;
    fn set_speed(&mut self, percent: u8) -> Result<i32>;
    fn reset_all_errors(&mut self) -> Result<i32>;
    fn close(&mut self) -> Result<i32>;
}

/// TCP-backed session to a controller.
pub struct RpcClient {
    socket: TcpStream,
    reply_pattern: Regex,
}

impl RpcClient {
    /// Open a session to the controller at `host`.
    pub fn connect(host: &str) -> Result<Self> {
        let socket = TcpStream::connect((host, FR_RPC_PORT))?;

        // Bound reads so an unresponsive controller cannot hang us forever.
        socket.set_read_timeout(Some(READ_TIMEOUT))?;

        let reply_pattern = Regex::new(REPLY_PATTERN)
            .map_err(|e| Fr5Error::Protocol(format!("reply pattern: {}", e)))?;

        Ok(Self {
            socket,
            reply_pattern,
        })
    }

    /// Send one command line and parse the reply into code and payload.
    fn call(&mut self, command: &str) -> Result<(i32, Vec<String>)> {
        debug!("rpc call: {}", command);

        let line = format!("{}\n", command);
        self.socket.write_all(line.as_bytes())?;

        let reply = self.read_line()?;
        parse_reply(&self.reply_pattern, &reply)
    }

    /// Read one reply line from the socket
    ///
    /// Reads bytes until a newline character is encountered.
    /// Returns the line as a UTF-8 string without the newline.
    fn read_line(&mut self) -> Result<String> {
        let mut collected = Vec::new();
        let mut buffer = [0u8; 1];

        loop {
            match self.socket.read_exact(&mut buffer) {
                Ok(_) => {
                    if buffer[0] != b'\n' {
                        collected.push(buffer[0]);
                    } else {
                        break;
                    }
                }
                Err(e)
                    if matches!(
                        e.kind(),
                        std::io::ErrorKind::TimedOut | std::io::ErrorKind::WouldBlock
                    ) =>
                {
                    return Err(Fr5Error::Protocol(
                        "controller reply timeout; robot may be halted or unreachable".to_string(),
                    ));
                }
                Err(e) => return Err(e.into()),
            }
        }

        String::from_utf8(collected)
            .map_err(|_| Fr5Error::Protocol("invalid UTF-8 in controller reply".to_string()))
    }
}

/// Split a controller reply line into the leading error code and any
/// payload fields.
fn parse_reply(pattern: &Regex, line: &str) -> Result<(i32, Vec<String>)> {
    let caps = pattern
        .captures(line.trim())
        .ok_or_else(|| Fr5Error::Protocol(format!("malformed reply: {:?}", line)))?;

    let code = caps[1]
        .parse::<i32>()
        .map_err(|_| Fr5Error::Protocol(format!("error code out of range: {:?}", line)))?;

    let fields = caps
        .get(2)
        .map(|m| m.as_str().split(',').map(str::to_string).collect())
        .unwrap_or_default();

    Ok((code, fields))
}

fn parse_f64(fields: &[String], index: usize, line_kind: &str) -> Result<f64> {
    fields
        .get(index)
        .and_then(|f| f.trim().parse::<f64>().ok())
        .ok_or_else(|| Fr5Error::Protocol(format!("bad {} field {}", line_kind, index)))
}

fn parse_i32(fields: &[String], index: usize, line_kind: &str) -> Result<i32> {
    fields
        .get(index)
        .and_then(|f| f.trim().parse::<i32>().ok())
        .ok_or_else(|| Fr5Error::Protocol(format!("bad {} field {}", line_kind, index)))
}

fn parse_pose(fields: &[String], line_kind: &str) -> Result<[f64; 6]> {
    let mut pose = [0.0; 6];
    for (index, value) in pose.iter_mut().enumerate() {
        *value = parse_f64(fields, index, line_kind)?;
    }
    Ok(pose)
}

fn format_pose(pose: &[f64; 6]) -> String {
    pose.iter()
        .map(|v| format!("{:.3}", v))
        .collect::<Vec<_>>()
        .join(",")
}

impl Fr5Rpc for RpcClient {
    fn set_gripper_config(&mut self, company: i32, device: i32) -> Result<i32> {
        let (code, _) = self.call(&format!("SetGripperConfig({},{})", company, device))?;
        Ok(code)
    }

    fn gripper_config(&mut self) -> Result<(i32, i32, i32)> {
        let (code, fields) = self.call("GetGripperConfig()")?;
        if code != 0 {
            return Ok((code, 0, 0));
        }
        let company = parse_i32(&fields, 0, "gripper config")?;
        let device = parse_i32(&fields, 1, "gripper config")?;
        Ok((code, company, device))
    }

    fn act_gripper(&mut self, index: i32, action: GripperAction) -> Result<i32> {
        let (code, _) = self.call(&format!("ActGripper({},{})", index, action.wire_value()))?;
        Ok(code)
    }

    fn move_gripper(
        &mut self,
        index: i32,
        command: GripperCommand,
        timeout_ms: u32,
    ) -> Result<i32> {
        // Trailing zeros: non-blocking call, parallel-jaw type, no rotation.
        let (code, _) = self.call(&format!(
            "MoveGripper({},{},{},{},{},0,0,0,0,0)",
            index, command.position, command.speed, command.force, timeout_ms
        ))?;
        Ok(code)
    }

    fn gripper_state(&mut self, index: i32) -> Result<(i32, GripperReading)> {
        let (code, fields) = self.call(&format!("GetGripperCurPosition({})", index))?;
        if code != 0 {
            return Ok((code, GripperReading::default()));
        }
        let fault = parse_i32(&fields, 0, "gripper state")?;
        let position = parse_i32(&fields, 1, "gripper state")?;
        let position = u8::try_from(position)
            .map_err(|_| Fr5Error::Protocol(format!("gripper position out of range: {}", position)))?;
        Ok((code, GripperReading { fault, position }))
    }

    fn move_joint(&mut self, target: &JointPose, tool: i32, frame: i32, speed: f64) -> Result<i32> {
        let (code, _) = self.call(&format!(
            "MoveJ({},{},{},{:.3})",
            format_pose(target),
            tool,
            frame,
            speed
        ))?;
        Ok(code)
    }

    fn move_cartesian(
        &mut self,
        target: &CartesianPose,
        tool: i32,
        frame: i32,
        speed: f64,
    ) -> Result<i32> {
        let (code, _) = self.call(&format!(
            "MoveCart({},{},{},{:.3})",
            format_pose(target),
            tool,
            frame,
            speed
        ))?;
        Ok(code)
    }

    fn move_linear(
        &mut self,
        target: &CartesianPose,
        tool: i32,
        frame: i32,
        speed: f64,
    ) -> Result<i32> {
        let (code, _) = self.call(&format!(
            "MoveL({},{},{},{:.3})",
            format_pose(target),
            tool,
            frame,
            speed
        ))?;
        Ok(code)
    }

    fn joint_positions(&mut self) -> Result<(i32, JointPose)> {
        let (code, fields) = self.call("GetActualJointPosDegree()")?;
        if code != 0 {
            return Ok((code, [0.0; 6]));
        }
        Ok((code, parse_pose(&fields, "joint position")?))
    }

    fn cartesian_pose(&mut self) -> Result<(i32, CartesianPose)> {
        let (code, fields) = self.call("GetActualTCPPose()")?;
        if code != 0 {
            return Ok((code, [0.0; 6]));
        }
        Ok((code, parse_pose(&fields, "tcp pose")?))
    }

    fn set_singularity_avoidance(&mut self, mode: SingularityMode, enable: bool) -> Result<i32> {
        let (code, _) = self.call(&format!(
            "SingularAvoid({},{})",
            mode.wire_value(),
            i32::from(enable)
        ))?;
        Ok(code)
    }

    fn set_speed(&mut self, percent: u8) -> Result<i32> {
        let (code, _) = self.call(&format!("SetSpeed({})", percent))?;
        Ok(code)
    }

    fn reset_all_errors(&mut self) -> Result<i32> {
        let (code, _) = self.call("ResetAllError()")?;
        Ok(code)
    }

    fn close(&mut self) -> Result<i32> {
        let (code, _) = self.call("CloseRPC()")?;
        Ok(code)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pattern() -> Regex {
        Regex::new(REPLY_PATTERN).unwrap()
    }

    #[test]
    fn parses_code_only_reply() {
        let (code, fields) = parse_reply(&pattern(), "0").unwrap();
        assert_eq!(code, 0);
        assert!(fields.is_empty());
    }

    #[test]
    fn parses_negative_code() {
        let (code, _) = parse_reply(&pattern(), "-4").unwrap();
        assert_eq!(code, -4);
    }

    #[test]
    fn parses_code_with_payload() {
        let (code, fields) = parse_reply(&pattern(), "0,0,35").unwrap();
        assert_eq!(code, 0);
        assert_eq!(fields, vec!["0", "35"]);
    }

    #[test]
    fn parses_pose_payload() {
        let (code, fields) =
            parse_reply(&pattern(), "0,-310.646,167.840,237.210,179.631,-0.000,45.730").unwrap();
        assert_eq!(code, 0);
        let pose = parse_pose(&fields, "tcp pose").unwrap();
        assert_eq!(pose[0], -310.646);
        assert_eq!(pose[5], 45.730);
    }

    #[test]
    fn rejects_malformed_reply() {
        assert!(matches!(
            parse_reply(&pattern(), "robot says no"),
            Err(Fr5Error::Protocol(_))
        ));
    }

    #[test]
    fn rejects_short_pose_payload() {
        let (_, fields) = parse_reply(&pattern(), "0,1.0,2.0").unwrap();
        assert!(matches!(
            parse_pose(&fields, "joint position"),
            Err(Fr5Error::Protocol(_))
        ));
    }

    #[test]
    fn pose_formatting_is_stable() {
        let pose = [0.0, -99.6675, 117.473, -108.615, -91.726, 74.2558];
        assert_eq!(
            format_pose(&pose),
            "0.000,-99.668,117.473,-108.615,-91.726,74.256"
        );
    }
}
