//! Finding and talking to the running raillamp daemon.
//!
//! Commands travel as JSON in `/tmp/raillamp-cmd-<pid>.json`, followed by a
//! `SIGUSR1` to the daemon, which reads and removes the file.

use anyhow::{Context, Result};
use std::path::{Path, PathBuf};

use crate::commands::ControlCommand;
use crate::io::lock;

/// Contents of the lock file.
#[derive(Debug, Clone, PartialEq)]
pub struct InstanceInfo {
    pub pid: u32,
    /// Custom config directory of the running daemon, if any.
    pub config_dir: Option<PathBuf>,
}

impl InstanceInfo {
    /// Parse lock file contents: the PID, then an optional config directory line.
    pub fn from_lock_contents(contents: &str) -> Result<Self> {
        let mut lines = contents.lines();

        let pid = lines
            .next()
            .context("Lock file is empty")?
            .trim()
            .parse::<u32>()
            .context("Invalid PID format in lock file")?;

        let config_dir = lines
            .next()
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .map(PathBuf::from);

        if lines.any(|line| !line.trim().is_empty()) {
            anyhow::bail!("Invalid lock file format (expected 1-2 lines)");
        }

        Ok(InstanceInfo { pid, config_dir })
    }

    pub fn to_lock_contents(&self) -> String {
        match self.config_dir {
            Some(ref dir) => format!("{}\n{}\n", self.pid, dir.display()),
            None => format!("{}\n\n", self.pid),
        }
    }
}

/// The running daemon, if its lock file names a live process.
pub fn get_running_instance() -> Result<Option<InstanceInfo>> {
    let lock_content = match std::fs::read_to_string(lock::get_main_lock_path()) {
        Ok(content) => content,
        Err(_) => return Ok(None),
    };

    let info = InstanceInfo::from_lock_contents(&lock_content)?;
    if is_instance_running(info.pid) {
        Ok(Some(info))
    } else {
        Ok(None)
    }
}

pub fn get_running_instance_pid() -> Result<u32> {
    get_running_instance()?
        .map(|info| info.pid)
        .ok_or_else(|| anyhow::anyhow!("No raillamp instance running"))
}

pub fn is_instance_running(pid: u32) -> bool {
    Path::new(&format!("/proc/{pid}")).exists()
}

pub fn command_file_path(pid: u32) -> PathBuf {
    PathBuf::from(format!("/tmp/raillamp-cmd-{pid}.json"))
}

/// Write the command file for `pid` and signal the daemon.
pub fn send_command(pid: u32, command: &ControlCommand) -> Result<()> {
    use nix::sys::signal::{Signal, kill};
    use nix::unistd::Pid;

    write_command(&command_file_path(pid), command)?;

    kill(Pid::from_raw(pid as i32), Signal::SIGUSR1)
        .map_err(|e| anyhow::anyhow!("Failed to signal raillamp (PID: {}): {}", pid, e))
}

fn write_command(path: &Path, command: &ControlCommand) -> Result<()> {
    let json = serde_json::to_string(command).context("Failed to serialize command")?;
    std::fs::write(path, json).context("Failed to write command file")
}

/// Read and remove the pending command for `pid`, if there is one.
pub fn take_command(pid: u32) -> Result<Option<ControlCommand>> {
    read_command(&command_file_path(pid))
}

fn read_command(path: &Path) -> Result<Option<ControlCommand>> {
    let content = match std::fs::read_to_string(path) {
        Ok(content) => content,
        Err(_) => return Ok(None),
    };
    let _ = std::fs::remove_file(path);

    serde_json::from_str(&content)
        .map(Some)
        .context("Malformed command file")
}
