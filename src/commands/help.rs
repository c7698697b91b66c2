//! `raillamp help [COMMAND]`.

/// Run the help command: detailed help for `command`, or the command list.
pub fn run_help_command(command: Option<&str>) {
    match command {
        None => display_general_help(),
        Some("arm") => display_arm_help(),
        Some("disarm") => display_disarm_help(),
        Some("set") => display_set_help(),
        Some("status") => display_status_help(),
        Some("help") => display_general_help(),
        Some(unknown) => {
            log_warning!("Unknown command: {}", unknown);
            display_general_help();
        }
    }
}

fn display_general_help() {
    log_version!();
    log_block_start!("Available Commands:");
    log_indented!("arm <hours>|tonight    Enable the light outside its window");
    log_indented!("disarm                 Cancel an active arm");
    log_indented!("set <field> <value>    Adjust the running lamp");
    log_indented!("status                 Show what the running daemon is doing");
    log_indented!("help [COMMAND]         Show detailed help for a command");
    log_pipe!();
    log_info!("Use 'raillamp help <command>' to see detailed help for a specific command.");
    log_indented!("Use 'raillamp --help' to see all options and general usage.");
    log_end!();
}

fn display_arm_help() {
    log_version!();
    log_block_start!("arm - Enable the light regardless of the schedule");
    log_block_start!("Usage: raillamp arm <hours>|tonight");
    log_block_start!("Arguments:");
    log_indented!("hours    Arm for this many hours (clamped to 1-24)");
    log_indented!("tonight  Arm until local midnight");
    log_block_start!("Notes:");
    log_indented!("Arming needs a synchronised clock. Arming again replaces the");
    log_indented!("previous expiry.");
    log_block_start!("Examples:");
    log_indented!("raillamp arm 2");
    log_indented!("raillamp arm tonight");
    log_end!();
}

fn display_disarm_help() {
    log_version!();
    log_block_start!("disarm - Cancel an active arm");
    log_block_start!("Usage: raillamp disarm");
    log_indented!("The light follows its schedule window again.");
    log_end!();
}

fn display_set_help() {
    log_version!();
    log_block_start!("set - Adjust the running lamp without restarting it");
    log_block_start!("Usage: raillamp set <field> <value>");
    log_block_start!("Fields:");
    log_indented!("brightness <0-255>     Maximum brightness");
    log_indented!("color <r> <g> <b>      Light colour (or r,g,b or #rrggbb)");
    log_indented!("timeout <seconds>      Motion timeout (clamped to 1-300)");
    log_block_start!("Notes:");
    log_indented!("Changes last until the daemon restarts. Edit raillamp.toml to");
    log_indented!("make them permanent.");
    log_block_start!("Examples:");
    log_indented!("raillamp set brightness 80");
    log_indented!("raillamp set color 255,120,40");
    log_end!();
}

fn display_status_help() {
    log_version!();
    log_block_start!("status - Show what the running daemon is doing");
    log_block_start!("Usage: raillamp status [--json]");
    log_block_start!("Options:");
    log_indented!("-j, --json  Print the raw status snapshot");
    log_end!();
}
