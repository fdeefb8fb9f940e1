//! Debug logging utilities
//!
//! Respects the global `--log` flag. When it is off, every call here is a
//! single atomic load.

use crate::extensions::runner::ToolCommand;
use std::sync::OnceLock;

static DEBUG_ENABLED: OnceLock<bool> = OnceLock::new();

/// Initialize debug mode from the command-line flag
pub fn init_debug(enabled: bool) {
    let _ = DEBUG_ENABLED.set(enabled);
}

/// Check if debug mode is enabled
pub fn is_debug_enabled() -> bool {
    DEBUG_ENABLED.get().copied().unwrap_or(false)
}

/// Log an external command line and where it runs
pub fn debug_command(command: &ToolCommand) {
    if !is_debug_enabled() {
        return;
    }
    match &command.cwd {
        Some(dir) => eprintln!("[DEBUG] ({}) $ {command}", dir.display()),
        None => eprintln!("[DEBUG] $ {command}"),
    }
}

/// Macro for convenient debug logging
///
/// Usage: `debug!("configuring {}", name)`
#[macro_export]
macro_rules! debug {
    ($($arg:tt)*) => {
        if $crate::debug::is_debug_enabled() {
            eprintln!("[DEBUG] {}", format_args!($($arg)*));
        }
    };
}
