//! Scaffold - building blocks for small command-line programs
//!
//! Provides buffered leveled logging with console and file output, layered
//! configuration (defaults, template file, command line), an argument
//! tokenizer, interactive prompts and a few file, date and module helpers.

pub mod app;
pub mod config;
pub mod date;
pub mod files;
pub mod interact;
pub mod logging;
pub mod modules;

#[cfg(test)]
mod testing;
