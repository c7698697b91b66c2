//! Signal handling for the daemon.
//!
//! A dedicated thread listens with `signal-hook` and forwards what it receives
//! to the control loop over a channel:
//! - `SIGUSR1`: a control command is waiting in the command file.
//! - `SIGINT`, `SIGTERM`, `SIGHUP`: shut down.

use anyhow::{Context, Result};
use signal_hook::{
    consts::signal::{SIGHUP, SIGINT, SIGTERM, SIGUSR1},
    iterator::Signals,
};
use std::{
    sync::Arc,
    sync::atomic::{AtomicBool, Ordering},
    sync::mpsc::{self, Receiver},
    thread,
};

use crate::commands::ControlCommand;
use crate::io::instance;

#[derive(Debug, Clone, PartialEq)]
pub enum SignalMessage {
    /// A control command delivered with SIGUSR1.
    Command(ControlCommand),
    /// SIGTERM, SIGINT or SIGHUP.
    Shutdown,
}

/// Signal handling state owned by the control loop.
pub struct SignalState {
    /// Cleared once a shutdown signal has been received.
    pub running: Arc<AtomicBool>,
    pub signal_receiver: Receiver<SignalMessage>,
}

pub fn setup_signal_handler(debug_enabled: bool) -> Result<SignalState> {
    let running = Arc::new(AtomicBool::new(true));
    let (signal_sender, signal_receiver) = mpsc::channel::<SignalMessage>();

    let mut signals = Signals::new([SIGINT, SIGTERM, SIGHUP, SIGUSR1])
        .context("failed to register signal handlers")?;

    let running_clone = running.clone();

    thread::Builder::new()
        .name("raillamp-signals".to_string())
        .spawn(move || {
            let pid = std::process::id();

            for sig in signals.forever() {
                match sig {
                    SIGUSR1 => match instance::take_command(pid) {
                        Ok(Some(command)) => {
                            log_pipe!();
                            log_info!("Received control command: {}", command.describe());
                            if signal_sender.send(SignalMessage::Command(command)).is_err() {
                                break;
                            }
                        }
                        Ok(None) => {
                            if debug_enabled {
                                log_debug!("SIGUSR1 without a pending command, ignoring");
                            }
                        }
                        Err(e) => {
                            log_pipe!();
                            log_warning!("Ignoring control command: {:#}", e);
                        }
                    },
                    _ => {
                        let user_message = match sig {
                            SIGINT => "Received interrupt signal, initiating graceful shutdown...",
                            SIGTERM => "Received termination request, initiating graceful shutdown...",
                            _ => "Received hangup signal, initiating graceful shutdown...",
                        };
                        log_pipe!();
                        log_info!("{}", user_message);

                        running_clone.store(false, Ordering::SeqCst);
                        if signal_sender.send(SignalMessage::Shutdown).is_err() {
                            break;
                        }
                    }
                }
            }
        })
        .context("failed to spawn signal handler thread")?;

    Ok(SignalState {
        running,
        signal_receiver,
    })
}
