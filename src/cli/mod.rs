//! Command-line front end: argument parsing and command handlers.
mod app;
mod main;

pub use app::*;
pub use main::*;
