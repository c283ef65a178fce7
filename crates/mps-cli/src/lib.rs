//! Command-line front end for the media plan editor.

pub mod cli;
pub mod commands;
pub mod config;
pub mod logging;
pub mod render;
pub mod session;
