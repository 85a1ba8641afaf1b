//! Entry point for the `tova` command-line tool.
//!
//! The binary is a thin wrapper around [`tova_cli::run_cli`]; all command
//! logic lives in the library crate for testability.
//!
//! # Exit Codes
//!
//! - `0` - Success
//! - `1` - Error (message printed to stderr)

fn main() {
    if let Err(e) = tova_cli::run_cli() {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}
