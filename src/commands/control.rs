//! Runtime control commands: arm, disarm and live adjustments.
//!
//! The CLI turns `raillamp arm 2`, `raillamp set brightness 80` and friends into
//! a [`ControlCommand`], hands it to the running daemon and returns. The daemon
//! applies it on its next tick.

use anyhow::Result;
use serde::{Deserialize, Serialize};

use crate::io::instance;
use crate::light::Rgb;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "command", rename_all = "snake_case")]
pub enum ControlCommand {
    /// Enable the light for a number of hours regardless of the window.
    Arm { hours: u32 },
    /// Enable the light until local midnight.
    ArmTonight,
    Disarm,
    SetMaxBrightness { value: u8 },
    SetColor { color: Rgb },
    SetMotionTimeout { seconds: u64 },
}

impl ControlCommand {
    pub fn describe(&self) -> String {
        match self {
            ControlCommand::Arm { hours } => format!("arm for {hours}h"),
            ControlCommand::ArmTonight => "arm until midnight".to_string(),
            ControlCommand::Disarm => "disarm".to_string(),
            ControlCommand::SetMaxBrightness { value } => format!("set brightness {value}"),
            ControlCommand::SetColor { color } => format!("set colour {color}"),
            ControlCommand::SetMotionTimeout { seconds } => format!("set timeout {seconds}s"),
        }
    }
}

/// Deliver a command to the running daemon.
pub fn handle_control_command(command: ControlCommand, debug_enabled: bool) -> Result<()> {
    log_version!();

    let pid = instance::get_running_instance_pid()?;
    instance::send_command(pid, &command)?;

    if debug_enabled {
        log_pipe!();
        log_debug!("SIGUSR1 sent to process {}", pid);
    }

    log_block_start!("Sent '{}' to raillamp (PID: {})", command.describe(), pid);
    log_indented!("Run 'raillamp status' to see the result");
    log_end!();
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_commands_serialize_with_tag() {
        let json = serde_json::to_value(ControlCommand::Arm { hours: 2 }).unwrap();
        assert_eq!(json, serde_json::json!({"command": "arm", "hours": 2}));

        let json = serde_json::to_value(ControlCommand::SetColor {
            color: Rgb::new(1, 2, 3),
        })
        .unwrap();
        assert_eq!(
            json,
            serde_json::json!({"command": "set_color", "color": [1, 2, 3]})
        );
    }

    #[test]
    fn test_commands_parse_back() {
        let command: ControlCommand =
            serde_json::from_str(r#"{"command": "arm_tonight"}"#).unwrap();
        assert_eq!(command, ControlCommand::ArmTonight);

        let command: ControlCommand =
            serde_json::from_str(r#"{"command": "set_motion_timeout", "seconds": 90}"#).unwrap();
        assert_eq!(command, ControlCommand::SetMotionTimeout { seconds: 90 });

        assert!(serde_json::from_str::<ControlCommand>(r#"{"command": "explode"}"#).is_err());
    }
}
