//! Motion presence: raw sensor inputs reduced to one boolean.
//!
//! Any number of inputs can be configured (the stair fixture this was written
//! for has one sensor at each end). Motion is present while any input reads
//! high. A failing input counts as low so one broken sensor never pins the
//! light on.

use anyhow::{Context, Result};
use std::path::PathBuf;

/// A single digital presence sensor.
pub trait MotionInput {
    fn is_high(&mut self) -> Result<bool>;

    /// Short label used in log lines.
    fn label(&self) -> String;
}

/// Reads a sysfs-style GPIO value file (`/sys/class/gpio/gpioN/value`), where
/// `1` means high.
pub struct FileMotionInput {
    path: PathBuf,
}

impl FileMotionInput {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }
}

impl MotionInput for FileMotionInput {
    fn is_high(&mut self) -> Result<bool> {
        let raw = std::fs::read_to_string(&self.path)
            .with_context(|| format!("Failed to read {}", self.path.display()))?;
        Ok(raw.trim() == "1")
    }

    fn label(&self) -> String {
        self.path.display().to_string()
    }
}

pub struct MotionDebouncer {
    inputs: Vec<Box<dyn MotionInput>>,
    present: bool,
    /// Per-input failure flag so a broken sensor warns once, not every tick.
    failing: Vec<bool>,
}

impl MotionDebouncer {
    pub fn new(inputs: Vec<Box<dyn MotionInput>>) -> Self {
        let failing = vec![false; inputs.len()];
        Self {
            inputs,
            present: false,
            failing,
        }
    }

    /// Sample every input and return the combined presence.
    pub fn poll(&mut self) -> bool {
        let mut any_high = false;

        for (index, input) in self.inputs.iter_mut().enumerate() {
            match input.is_high() {
                Ok(high) => {
                    if self.failing[index] {
                        log_info!("Motion input {} recovered", input.label());
                        self.failing[index] = false;
                    }
                    any_high |= high;
                }
                Err(e) => {
                    if !self.failing[index] {
                        log_warning!("Motion input {} unreadable: {}", input.label(), e);
                        self.failing[index] = true;
                    }
                }
            }
        }

        if any_high != self.present {
            if any_high {
                log_decorated!("Motion detected");
            } else {
                log_decorated!("Motion cleared");
            }
            self.present = any_high;
        }

        self.present
    }

    /// Presence as of the last poll.
    pub fn is_present(&self) -> bool {
        self.present
    }

    pub fn input_count(&self) -> usize {
        self.inputs.len()
    }
}
