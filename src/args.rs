//! Command-line argument parsing.
//!
//! Without a command, raillamp runs the daemon. The remaining commands talk to
//! an already running daemon:
//!
//! ```text
//! raillamp [OPTIONS]
//! raillamp arm <hours> | arm tonight
//! raillamp disarm
//! raillamp set brightness <0-255> | set color <r> <g> <b> | set timeout <seconds>
//! raillamp status [--json]
//! raillamp help [COMMAND]
//! ```

use crate::commands::ControlCommand;
use crate::light::Rgb;

/// What the process should do, as decided by the command line.
#[derive(Debug, PartialEq)]
pub enum CliAction {
    /// Run the daemon.
    Run {
        debug_enabled: bool,
        config_dir: Option<String>,
        log_file: Option<String>,
    },
    /// Send a control command to the running daemon.
    Control {
        command: ControlCommand,
        debug_enabled: bool,
        config_dir: Option<String>,
    },
    /// Show the running daemon's status.
    Status { json: bool },
    /// Detailed help for one command, or the command list.
    Help { command: Option<String> },
    ShowHelp,
    ShowVersion,
    /// Show help due to invalid arguments and exit with failure.
    ShowHelpDueToError,
}

/// Result of parsing command-line arguments.
pub struct ParsedArgs {
    pub action: CliAction,
}

impl ParsedArgs {
    /// Parse the full argument list, program name included.
    ///
    /// Options may appear anywhere. `--help` and `--version` win over
    /// everything else.
    pub fn parse<I, S>(args: I) -> ParsedArgs
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let args_vec: Vec<String> = args
            .into_iter()
            .skip(1)
            .map(|s| s.as_ref().to_string())
            .collect();

        let mut debug_enabled = false;
        let mut display_help = false;
        let mut display_version = false;
        let mut json = false;
        let mut config_dir: Option<String> = None;
        let mut log_file: Option<String> = None;
        let mut positional: Vec<&str> = Vec::new();

        let mut iter = args_vec.iter();
        while let Some(arg) = iter.next() {
            match arg.as_str() {
                "--debug" | "-d" => debug_enabled = true,
                "--help" | "-h" => display_help = true,
                "--version" | "-V" | "-v" => display_version = true,
                "--json" | "-j" => json = true,
                "--config" | "-c" => match iter.next() {
                    Some(dir) => config_dir = Some(dir.clone()),
                    None => {
                        log_warning!("Missing directory for {}", arg);
                        return Self::error();
                    }
                },
                "--log" | "-l" => match iter.next() {
                    Some(path) => log_file = Some(path.clone()),
                    None => {
                        log_warning!("Missing file for {}", arg);
                        return Self::error();
                    }
                },
                flag if flag.starts_with('-') && flag.parse::<i64>().is_err() => {
                    log_warning!("Unknown argument: {}", flag);
                    return Self::error();
                }
                value => positional.push(value),
            }
        }

        if display_version {
            return ParsedArgs {
                action: CliAction::ShowVersion,
            };
        }
        if display_help {
            return ParsedArgs {
                action: CliAction::ShowHelp,
            };
        }

        let Some((&command, rest)) = positional.split_first() else {
            return ParsedArgs {
                action: CliAction::Run {
                    debug_enabled,
                    config_dir,
                    log_file,
                },
            };
        };

        let action = match command {
            "help" => {
                if rest.len() > 1 {
                    log_warning!("Usage: raillamp help [COMMAND]");
                    return Self::error();
                }
                CliAction::Help {
                    command: rest.first().map(|s| s.to_string()),
                }
            }
            "status" => {
                if !rest.is_empty() {
                    log_warning!("'status' takes no arguments");
                    return Self::error();
                }
                CliAction::Status { json }
            }
            "arm" | "disarm" | "set" => match parse_control_command(command, rest) {
                Ok(command) => CliAction::Control {
                    command,
                    debug_enabled,
                    config_dir,
                },
                Err(message) => {
                    log_warning!("{}", message);
                    return Self::error();
                }
            },
            unknown => {
                log_warning!("Unknown command: {}", unknown);
                return Self::error();
            }
        };

        ParsedArgs { action }
    }

    pub fn from_env() -> ParsedArgs {
        Self::parse(std::env::args())
    }

    fn error() -> ParsedArgs {
        ParsedArgs {
            action: CliAction::ShowHelpDueToError,
        }
    }
}

fn parse_control_command(command: &str, rest: &[&str]) -> Result<ControlCommand, String> {
    match (command, rest) {
        ("arm", ["tonight"]) => Ok(ControlCommand::ArmTonight),
        ("arm", [hours]) => hours
            .parse::<u32>()
            .map(|hours| ControlCommand::Arm { hours })
            .map_err(|_| format!("Invalid hours '{hours}'. Usage: raillamp arm <hours>|tonight")),
        ("arm", _) => Err("Usage: raillamp arm <hours>|tonight".to_string()),

        ("disarm", []) => Ok(ControlCommand::Disarm),
        ("disarm", _) => Err("'disarm' takes no arguments".to_string()),

        ("set", ["brightness", value]) => value
            .parse::<u8>()
            .map(|value| ControlCommand::SetMaxBrightness { value })
            .map_err(|_| format!("Brightness must be 0-255, got '{value}'")),
        ("set", ["color" | "colour", value]) => parse_color(value)
            .map(|color| ControlCommand::SetColor { color })
            .ok_or_else(|| format!("Invalid color '{value}'. Use r,g,b or #rrggbb")),
        ("set", ["color" | "colour", r, g, b]) => parse_color(&format!("{r},{g},{b}"))
            .map(|color| ControlCommand::SetColor { color })
            .ok_or_else(|| format!("Invalid color '{r} {g} {b}'. Channels are 0-255")),
        ("set", ["timeout", value]) => value
            .parse::<u64>()
            .map(|seconds| ControlCommand::SetMotionTimeout { seconds })
            .map_err(|_| format!("Timeout must be a number of seconds, got '{value}'")),
        ("set", [field, _]) => Err(format!(
            "Unknown setting '{field}'. Expected brightness, color or timeout"
        )),
        _ => Err("Usage: raillamp set <brightness|color|timeout> <value>".to_string()),
    }
}

/// Parse `r,g,b` or `#rrggbb`.
pub fn parse_color(value: &str) -> Option<Rgb> {
    if let Some(hex) = value.strip_prefix('#') {
        if hex.len() != 6 || !hex.is_ascii() {
            return None;
        }
        let channel = |i: usize| u8::from_str_radix(&hex[i..i + 2], 16).ok();
        return Some(Rgb::new(channel(0)?, channel(2)?, channel(4)?));
    }

    let parts: Vec<u8> = value
        .split(',')
        .map(|part| part.trim().parse::<u8>())
        .collect::<Result<_, _>>()
        .ok()?;
    match parts.as_slice() {
        [r, g, b] => Some(Rgb::new(*r, *g, *b)),
        _ => None,
    }
}

pub fn display_version_info() {
    log_version!();
    log_pipe!();
    println!("┗ {}", env!("CARGO_PKG_DESCRIPTION"));
}

pub fn display_help() {
    log_version!();
    log_block_start!(env!("CARGO_PKG_DESCRIPTION"));
    log_block_start!("Usage:");
    log_indented!("raillamp [OPTIONS] [COMMAND]");
    log_block_start!("Options:");
    log_indented!("-c, --config <dir>     Use custom configuration directory");
    log_indented!("-d, --debug            Enable detailed debug output");
    log_indented!("-h, --help             Print help information");
    log_indented!("-j, --json             JSON output (status)");
    log_indented!("-l, --log <file>       Write the daemon log to a file");
    log_indented!("-V, --version          Print version information");
    log_block_start!("Commands:");
    log_indented!("arm <hours>|tonight    Enable the light outside its window");
    log_indented!("disarm                 Cancel an active arm");
    log_indented!("set <field> <value>    Adjust brightness, color or timeout live");
    log_indented!("status                 Show what the running daemon is doing");
    log_indented!("help [COMMAND]         Show detailed help for a command");
    log_end!();
}
