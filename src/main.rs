//! raillamp entry point: parse the command line and dispatch.

use anyhow::Result;

use raillamp::args::{self, CliAction, ParsedArgs};
use raillamp::commands;
use raillamp::config;
use raillamp::constants::EXIT_FAILURE;
use raillamp::logger::Log;
use raillamp::{Raillamp, log_error_exit};

fn main() {
    if let Err(e) = run() {
        log_error_exit!("{}", e);
        for cause in e.chain().skip(1) {
            eprintln!("  caused by: {cause}");
        }
        std::process::exit(EXIT_FAILURE);
    }
}

fn run() -> Result<()> {
    let parsed_args = ParsedArgs::from_env();

    match parsed_args.action {
        CliAction::ShowVersion => {
            args::display_version_info();
            Ok(())
        }
        CliAction::ShowHelp => {
            args::display_help();
            Ok(())
        }
        CliAction::ShowHelpDueToError => {
            args::display_help();
            std::process::exit(EXIT_FAILURE);
        }
        CliAction::Help { command } => {
            commands::help::run_help_command(command.as_deref());
            Ok(())
        }
        CliAction::Status { json } => commands::status::handle_status_command(json),
        CliAction::Control {
            command,
            debug_enabled,
            config_dir,
        } => {
            if let Some(dir) = config_dir {
                config::set_config_dir(Some(dir))?;
            }
            commands::handle_control_command(command, debug_enabled)
        }
        CliAction::Run {
            debug_enabled,
            config_dir,
            log_file,
        } => {
            if let Some(dir) = config_dir {
                config::set_config_dir(Some(dir))?;
            }
            // Held until the daemon returns so every line reaches the file.
            let _log_guard = match log_file {
                Some(path) => Some(Log::start_file_logging(path)?),
                None => None,
            };
            Raillamp::new(debug_enabled).run()
        }
    }
}
