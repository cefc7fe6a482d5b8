//! # Homecheck CLI
//!
//! The binary is thin: argument parsing, dispatch and rendering live in
//! `src/cli/`, and this file only invokes [`cli::run`] and maps the outcome
//! to an exit code. Everything it calls into goes through
//! `homecheckapp::api::HomecheckApi`, so the CLI never touches the store,
//! repositories or queue directly.
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │  CLI Layer (crates/homecheck/src/cli/)                      │
//! │  - clap argument parsing (setup.rs)                         │
//! │  - Logging + dispatch (commands.rs)                         │
//! │  - Terminal rendering (render.rs, styles.rs)                │
//! └─────────────────────────────────────────────────────────────┘
//!                              │
//!                              ▼
//! ┌─────────────────────────────────────────────────────────────┐
//! │  API Layer (crates/homecheckapp/src/api.rs)                 │
//! │  - Returns structured `CmdResult` values                    │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! Commands that report an error-level message exit with status 1, the same
//! as a hard failure.

mod cli;

fn main() {
    match cli::run() {
        Ok(true) => {}
        Ok(false) => std::process::exit(1),
        Err(e) => {
            eprintln!("Error: {:#}", e);
            std::process::exit(1);
        }
    }
}
