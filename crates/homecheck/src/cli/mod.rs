//! # CLI Behavior
//!
//! One client of the homecheck library. Only this layer knows about
//! terminal I/O, exit codes and output formatting.
//!
//! ## Defaults
//!
//! - `homecheck templates` lists active templates.
//! - `homecheck inspections` lists inspections, most recently touched first.
//! - `homecheck sync` shows the queue; `homecheck sync run` drains it.
//!
//! ## Data Directory
//!
//! `--data-dir` wins, then `HOMECHECK_DATA_DIR`, then the platform data dir.
//! A `homecheck.toml` inside it can override the photo and seeding settings.
//!
//! ## Module Structure
//!
//! - `setup`: argument parsing via clap
//! - `commands`: logging setup and dispatch to the API
//! - `render`: output formatting
//! - `styles`: terminal styles

mod commands;
mod render;
pub mod setup;
mod styles;

pub use commands::run;
