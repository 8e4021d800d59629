//! `ew` command line: auth cache maintenance, TOTP codes, environment setup.

pub mod cli;
pub mod commands;
pub mod error;
pub mod logging;
pub mod output;
