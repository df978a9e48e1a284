//! Error types for FR5 controller operations

use thiserror::Error;

pub type Result<T> = std::result::Result<T, Fr5Error>;

/// Controller code reported when a motion command is refused because the
/// robot is holding a fault. The fault must be cleared before retrying.
pub const MOTION_FAULT_CODE: i32 = 112;

#[derive(Error, Debug)]
pub enum Fr5Error {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Motion fault (code {code}): clear the controller fault before retrying")]
    Motion { code: i32 },

    #[error("Communication error (code {code}): reboot the controller")]
    Comm { code: i32 },

    #[error("Gripper did not reach {target}% after {attempts} polls (last read {last}%)")]
    GripperTimeout { target: u8, last: u8, attempts: u32 },

    #[error("Protocol error: {0}")]
    Protocol(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("YAML parsing error: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

impl Fr5Error {
    /// Classify a nonzero vendor error code.
    ///
    /// The controller distinguishes exactly one code (a pending motion
    /// fault); everything else is treated as a communication failure.
    pub fn from_code(code: i32) -> Self {
        if code == MOTION_FAULT_CODE {
            Fr5Error::Motion { code }
        } else {
            Fr5Error::Comm { code }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn motion_fault_code_is_recognized() {
        assert!(matches!(
            Fr5Error::from_code(MOTION_FAULT_CODE),
            Fr5Error::Motion { code: MOTION_FAULT_CODE }
        ));
    }

    #[test]
    fn other_codes_classify_as_communication_errors() {
        for code in [-1, 1, 14, 108] {
            assert!(matches!(Fr5Error::from_code(code), Fr5Error::Comm { code: c } if c == code));
        }
    }
}
