//! Library surface for the `tova` binary: argument parsing and command
//! dispatch (`cli`) plus the `tova.toml` project manifest (`manifest`).

pub mod cli;
pub mod manifest;

pub use cli::run_cli;
