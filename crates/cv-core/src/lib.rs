//! Campaign validation command-line front end.
//!
//! The binary in `main.rs` parses arguments and renders errors; the work
//! itself lives in [`commands`] so it can be exercised without a process.

pub mod commands;
pub mod exit_codes;
pub mod logging;
