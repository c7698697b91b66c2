//! Brightness fade state machine.
//!
//! Exactly one [`FadePhase`] holds at a time. Brightness moves by a fixed step,
//! at most once per step interval of monotonic uptime, and is always clamped to
//! `[0, max_brightness]`. Nothing here sleeps: [`FadeController::tick`] is
//! called every loop iteration and decides for itself whether a step is due.

use std::time::Duration;

use super::Rgb;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FadePhase {
    Off,
    FadingIn,
    SteadyOn,
    FadingOut,
}

impl FadePhase {
    pub fn as_str(&self) -> &'static str {
        match self {
            FadePhase::Off => "off",
            FadePhase::FadingIn => "fading_in",
            FadePhase::SteadyOn => "on",
            FadePhase::FadingOut => "fading_out",
        }
    }
}

/// Completion of a fade, reported once by the tick that reaches the bound.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FadeEvent {
    FadeInComplete,
    FadeOutComplete,
}

impl FadeEvent {
    pub fn event_name(&self) -> &'static str {
        match self {
            FadeEvent::FadeInComplete => "fade_in_complete",
            FadeEvent::FadeOutComplete => "fade_out_complete",
        }
    }
}

#[derive(Debug)]
pub struct FadeController {
    phase: FadePhase,
    brightness: u8,
    max_brightness: u8,
    step: u8,
    step_interval: Duration,
    color: Rgb,
    /// Uptime of the last step; `None` makes the next tick step immediately.
    last_step: Option<Duration>,
    frame_dirty: bool,
}

impl FadeController {
    pub fn new(max_brightness: u8, step: u8, step_interval: Duration, color: Rgb) -> Self {
        Self {
            phase: FadePhase::Off,
            brightness: 0,
            max_brightness,
            step: step.max(1),
            step_interval,
            color,
            last_step: None,
            frame_dirty: false,
        }
    }

    /// Begin brightening. Returns `false` when a fade-in was already running.
    pub fn start_fade_in(&mut self) -> bool {
        if self.phase == FadePhase::FadingIn {
            return false;
        }
        self.phase = FadePhase::FadingIn;
        self.last_step = None;
        true
    }

    /// Begin dimming. Returns `false` when already fading out or off.
    pub fn start_fade_out(&mut self) -> bool {
        if matches!(self.phase, FadePhase::FadingOut | FadePhase::Off) {
            return false;
        }
        self.phase = FadePhase::FadingOut;
        self.last_step = None;
        true
    }

    /// Advance the active fade by one step if the step interval has elapsed.
    pub fn tick(&mut self, uptime: Duration) -> Option<FadeEvent> {
        if !self.is_transitioning() {
            return None;
        }

        if let Some(last) = self.last_step
            && uptime.saturating_sub(last) < self.step_interval
        {
            return None;
        }
        self.last_step = Some(uptime);

        match self.phase {
            FadePhase::FadingIn => {
                let next = self
                    .brightness
                    .saturating_add(self.step)
                    .min(self.max_brightness);
                self.set_brightness(next);

                if self.brightness >= self.max_brightness {
                    self.phase = FadePhase::SteadyOn;
                    self.last_step = None;
                    return Some(FadeEvent::FadeInComplete);
                }
                None
            }
            FadePhase::FadingOut => {
                let next = self.brightness.saturating_sub(self.step);
                self.set_brightness(next);

                if self.brightness == 0 {
                    self.phase = FadePhase::Off;
                    self.last_step = None;
                    return Some(FadeEvent::FadeOutComplete);
                }
                None
            }
            FadePhase::Off | FadePhase::SteadyOn => None,
        }
    }

    /// Change the brightness ceiling. A lit light never exceeds it, and a
    /// steady light jumps to it.
    pub fn set_max_brightness(&mut self, max_brightness: u8) {
        self.max_brightness = max_brightness;

        if self.brightness > max_brightness {
            self.set_brightness(max_brightness);
        }
        if self.phase == FadePhase::SteadyOn {
            self.set_brightness(max_brightness);
        }
    }

    pub fn set_color(&mut self, color: Rgb) {
        if self.color != color {
            self.color = color;
            if self.brightness > 0 {
                self.frame_dirty = true;
            }
        }
    }

    /// Drop straight to off, used on shutdown.
    pub fn force_off(&mut self) {
        self.phase = FadePhase::Off;
        self.last_step = None;
        self.set_brightness(0);
    }

    /// The frame to push to the output, if it changed since the last call.
    pub fn take_frame(&mut self) -> Option<(u8, Rgb)> {
        if self.frame_dirty {
            self.frame_dirty = false;
            Some((self.brightness, self.color))
        } else {
            None
        }
    }

    fn set_brightness(&mut self, value: u8) {
        if self.brightness != value {
            self.brightness = value;
            self.frame_dirty = true;
        }
    }

    pub fn is_on(&self) -> bool {
        self.phase != FadePhase::Off
    }

    pub fn is_transitioning(&self) -> bool {
        matches!(self.phase, FadePhase::FadingIn | FadePhase::FadingOut)
    }

    pub fn phase(&self) -> FadePhase {
        self.phase
    }

    pub fn brightness(&self) -> u8 {
        self.brightness
    }

    pub fn max_brightness(&self) -> u8 {
        self.max_brightness
    }

    pub fn color(&self) -> Rgb {
        self.color
    }
}
