//! Daemon lifecycle: resource acquisition, collaborator wiring and hand-off to
//! the main loop.
//!
//! `Raillamp::new(debug_enabled).run()` is the normal startup. Tests and
//! foreground experiments can skip the instance lock with `without_lock()`.

use anyhow::{Context, Result};
use std::path::PathBuf;

use crate::{
    config::Config,
    core::{Collaborators, Controller, Core, CoreParams},
    io::{lock, signals::setup_signal_handler},
    light::{FileLight, LightOutput, NullLight},
    motion::{FileMotionInput, MotionDebouncer, MotionInput},
    network::SysfsNetwork,
    status,
    telemetry::{MqttStatusLink, StatusLink},
    time_source::RealTimeSource,
    transport::http::HttpTransport,
};

pub struct Raillamp {
    debug_enabled: bool,
    create_lock: bool,
    show_headers: bool,
}

impl Raillamp {
    pub fn new(debug_enabled: bool) -> Self {
        Self {
            debug_enabled,
            create_lock: true,
            show_headers: true,
        }
    }

    /// Skip the single-instance lock.
    pub fn without_lock(mut self) -> Self {
        self.create_lock = false;
        self
    }

    pub fn without_headers(mut self) -> Self {
        self.show_headers = false;
        self
    }

    /// Load configuration, wire the hardware and run until shutdown.
    pub fn run(self) -> Result<()> {
        if self.show_headers {
            log_version!();
        }

        let signal_state = setup_signal_handler(self.debug_enabled)?;

        let config = Config::load()?;
        config.log_config();

        let lock = if self.create_lock {
            Some(lock::acquire_lock()?)
        } else {
            None
        };

        let collaborators = self.collaborators(&config)?;
        let controller = Controller::new(&config, collaborators, self.debug_enabled)?;

        let core = Core::new(CoreParams {
            controller,
            signal_state,
            lock,
            tick_interval: config.tick_interval(),
            status_interval: config.status_interval(),
            status_path: status::status_path(),
            debug_enabled: self.debug_enabled,
        });

        core.execute()
    }

    fn collaborators(&self, config: &Config) -> Result<Collaborators> {
        let inputs: Vec<Box<dyn MotionInput>> = config
            .motion_inputs
            .iter()
            .flatten()
            .map(|path| Box::new(FileMotionInput::new(PathBuf::from(path))) as Box<dyn MotionInput>)
            .collect();
        if inputs.is_empty() {
            log_pipe!();
            log_warning!("No motion inputs configured; the light will never switch on");
        }

        let light: Box<dyn LightOutput> = match config.light_output {
            Some(ref path) => Box::new(FileLight::new(PathBuf::from(path))),
            None => {
                log_pipe!();
                log_warning!("No light_output configured, frames are only logged in debug mode");
                Box::new(NullLight::new(self.debug_enabled))
            }
        };

        let transport = HttpTransport::new(self.debug_enabled)
            .context("Failed to build the HTTP client")?;

        let status_link = match config.mqtt_settings() {
            Some(settings) => Some(Box::new(
                MqttStatusLink::connect(&settings, self.debug_enabled)
                    .context("Failed to start the MQTT client")?,
            ) as Box<dyn StatusLink>),
            None => None,
        };

        Ok(Collaborators {
            clock: Box::new(RealTimeSource::new()),
            motion: MotionDebouncer::new(inputs),
            light,
            network: Box::new(SysfsNetwork::new()),
            transport: Box::new(transport),
            status_link,
        })
    }
}
