//! Light output: colour model, the output collaborator and its adapters.
//!
//! The fade state machine lives in [`fade`]. Everything here is about getting a
//! `(brightness, colour)` pair out of the process.

pub mod fade;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs::OpenOptions;
use std::io::Write;
use std::path::PathBuf;

pub use fade::{FadeController, FadeEvent, FadePhase};

/// Target colour, one byte per channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "[u8; 3]", into = "[u8; 3]")]
pub struct Rgb {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Rgb {
    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    /// Scale the colour by `brightness / 255`, as the strip driver would.
    pub fn scaled(&self, brightness: u8) -> Rgb {
        let scale = |channel: u8| ((channel as u16 * brightness as u16) / 255) as u8;
        Rgb::new(scale(self.r), scale(self.g), scale(self.b))
    }
}

impl From<[u8; 3]> for Rgb {
    fn from(value: [u8; 3]) -> Self {
        Rgb::new(value[0], value[1], value[2])
    }
}

impl From<Rgb> for [u8; 3] {
    fn from(value: Rgb) -> Self {
        [value.r, value.g, value.b]
    }
}

impl std::fmt::Display for Rgb {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "({}, {}, {})", self.r, self.g, self.b)
    }
}

/// The physical fixture driver.
///
/// Called whenever brightness or colour changes. Implementations must not
/// block for longer than a fraction of a tick.
pub trait LightOutput {
    fn show(&mut self, brightness: u8, color: Rgb) -> Result<()>;
}

/// Writes `brightness r g b` lines to a file or FIFO consumed by a strip driver.
pub struct FileLight {
    path: PathBuf,
    file: Option<std::fs::File>,
}

impl FileLight {
    pub fn new(path: PathBuf) -> Self {
        Self { path, file: None }
    }

    fn file(&mut self) -> Result<&mut std::fs::File> {
        if self.file.is_none() {
            let file = OpenOptions::new()
                .create(true)
                .append(true)
                .open(&self.path)
                .with_context(|| format!("Failed to open light output {}", self.path.display()))?;
            self.file = Some(file);
        }

        self.file
            .as_mut()
            .ok_or_else(|| anyhow::anyhow!("Light output not open"))
    }
}

impl LightOutput for FileLight {
    fn show(&mut self, brightness: u8, color: Rgb) -> Result<()> {
        let line = format!("{} {} {} {}\n", brightness, color.r, color.g, color.b);
        let result = self.file()?.write_all(line.as_bytes());

        if result.is_err() {
            // Reader went away (FIFO closed); reopen on the next frame.
            self.file = None;
        }

        result.with_context(|| format!("Failed to write to {}", self.path.display()))
    }
}

/// Output used when no fixture is configured. Frames are only visible in the
/// debug log.
pub struct NullLight {
    debug_enabled: bool,
}

impl NullLight {
    pub fn new(debug_enabled: bool) -> Self {
        Self { debug_enabled }
    }
}

impl LightOutput for NullLight {
    fn show(&mut self, brightness: u8, color: Rgb) -> Result<()> {
        if self.debug_enabled {
            log_debug!("Light frame: brightness {} color {}", brightness, color);
        }
        Ok(())
    }
}
