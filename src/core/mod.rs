//! Daemon main loop.
//!
//! `Core` drives the [`Controller`] at a fixed cadence, hands it control
//! commands arriving through signals, publishes the status file, and cleans up
//! on shutdown. All lighting decisions live in the controller.

pub mod controller;

pub use controller::{Collaborators, Controller};

use anyhow::Result;
use std::{
    path::PathBuf,
    sync::atomic::Ordering,
    sync::mpsc::RecvTimeoutError,
    time::{Duration, Instant},
};

use crate::{
    config,
    io::lock::LockFile,
    io::signals::{SignalMessage, SignalState},
    status,
};

/// Everything the main loop needs, bundled to keep `Core::new` readable.
pub struct CoreParams {
    pub controller: Controller,
    pub signal_state: SignalState,
    pub lock: Option<LockFile>,
    pub tick_interval: Duration,
    pub status_interval: Duration,
    pub status_path: PathBuf,
    pub debug_enabled: bool,
}

pub struct Core {
    controller: Controller,
    signal_state: SignalState,
    lock: Option<LockFile>,
    tick_interval: Duration,
    status_interval: Duration,
    status_path: PathBuf,
    debug_enabled: bool,
    status_failing: bool,
}

impl Core {
    pub fn new(params: CoreParams) -> Self {
        Self {
            controller: params.controller,
            signal_state: params.signal_state,
            lock: params.lock,
            tick_interval: params.tick_interval,
            status_interval: params.status_interval,
            status_path: params.status_path,
            debug_enabled: params.debug_enabled,
            status_failing: false,
        }
    }

    /// Run until a shutdown signal arrives, then switch the light off and
    /// release the instance lock.
    pub fn execute(mut self) -> Result<()> {
        if let Some(custom_dir) = config::get_custom_config_dir() {
            log_block_start!("Base directory: {}", config::private_path(&custom_dir));
        }

        self.controller.start();
        log_block_start!("Watching for motion");

        self.main_loop();

        log_block_start!("Shutting down raillamp...");
        self.controller.shutdown();
        status::remove_status(&self.status_path);

        if let Some(lock) = self.lock.take() {
            lock.release(self.debug_enabled);
        }

        log_end!();
        Ok(())
    }

    fn main_loop(&mut self) {
        let mut last_status: Option<Instant> = None;

        'main_loop: while self.signal_state.running.load(Ordering::SeqCst) {
            let tick_start = Instant::now();

            self.controller.tick();

            if last_status.is_none_or(|at| at.elapsed() >= self.status_interval) {
                self.publish_status();
                last_status = Some(Instant::now());
            }

            // Sleep out the rest of the tick, waking early for signals.
            loop {
                let remaining = self.tick_interval.saturating_sub(tick_start.elapsed());
                if remaining.is_zero() {
                    break;
                }

                match self.signal_state.signal_receiver.recv_timeout(remaining) {
                    Ok(SignalMessage::Command(command)) => {
                        let description = command.describe();
                        match self.controller.apply(command) {
                            Ok(()) => {
                                if self.debug_enabled {
                                    log_debug!("Applied '{}'", description);
                                }
                                self.publish_status();
                            }
                            Err(e) => {
                                log_pipe!();
                                log_warning!("Could not apply '{}': {}", description, e);
                            }
                        }
                    }
                    Ok(SignalMessage::Shutdown) => break 'main_loop,
                    Err(RecvTimeoutError::Timeout) => break,
                    Err(RecvTimeoutError::Disconnected) => {
                        log_pipe!();
                        log_warning!("Signal handler stopped, shutting down");
                        break 'main_loop;
                    }
                }
            }
        }
    }

    fn publish_status(&mut self) {
        let snapshot = self.controller.status();
        match status::write_status(&self.status_path, &snapshot) {
            Ok(()) => {
                if self.status_failing {
                    log_pipe!();
                    log_info!("Status file writable again");
                    self.status_failing = false;
                }
            }
            Err(e) => {
                if !self.status_failing {
                    log_pipe!();
                    log_warning!("Failed to write status file: {:#}", e);
                    self.status_failing = true;
                }
            }
        }
    }
}
