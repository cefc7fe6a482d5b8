//! # Dispatch
//!
//! Parses arguments, sets up logging, opens the store and routes each
//! subcommand to one [`HomecheckApi`] call. Library errors become `anyhow`
//! errors here; error-level messages in a [`CmdResult`] only affect the exit
//! code.

use anyhow::{Context, Result};
use clap::Parser;
use homecheckapp::api::HomecheckApi;
use homecheckapp::commands::CmdResult;
use homecheckapp::model::NewInspection;
use homecheckapp::store::fs_backend::FsBackend;
use homecheckapp::sync::remote::StubRemote;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use super::render;
use super::setup::{Cli, Commands, InspectionCommands, SyncCommands, TemplateCommands};

/// Log filter variable, e.g. `HOMECHECK_LOG=homecheckapp=debug`.
pub const LOG_ENV: &str = "HOMECHECK_LOG";

/// Returns whether the command finished without error-level messages.
pub fn run() -> Result<bool> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let api = HomecheckApi::open(cli.data_dir.clone()).context("could not open the homecheck store")?;
    let result = dispatch(&api, cli.command)?;

    if cli.json {
        print!("{}", render::render_json(&result)?);
    } else {
        print!("{}", render::render_result(&result));
    }
    Ok(!result.has_errors())
}

fn init_tracing(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new("warn"))
    };
    tracing_subscriber::registry()
        .with(filter)
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(false),
        )
        .init();
}

fn dispatch(api: &HomecheckApi<FsBackend>, command: Commands) -> Result<CmdResult> {
    let result = match command {
        Commands::Init => api.init()?,
        Commands::Templates { action } => {
            match action.unwrap_or(TemplateCommands::List { all: false }) {
                TemplateCommands::List { all } => api.list_templates(None, all)?,
                TemplateCommands::Search { query } => api.list_templates(Some(&query), false)?,
                TemplateCommands::Duplicate { id, name } => api.duplicate_template(&id, name)?,
                TemplateCommands::Delete { id, purge } => api.delete_template(&id, purge)?,
            }
        }
        Commands::Inspections { action } => match action.unwrap_or(InspectionCommands::List {
            status: None,
            limit: None,
        }) {
            InspectionCommands::List { status, limit } => {
                api.list_inspections(status.map(Into::into), limit)?
            }
            InspectionCommands::Start {
                template_id,
                address,
                unit,
                tenant,
                inspector,
            } => {
                let inspector_name = match inspector {
                    Some(name) => name,
                    None => api.settings()?.inspector_name.unwrap_or_default(),
                };
                let details = NewInspection {
                    address,
                    unit,
                    tenant_name: tenant,
                    inspector_name,
                };
                api.start_inspection(&template_id, details)?
            }
            InspectionCommands::Complete { id } => api.complete_inspection(&id)?,
            InspectionCommands::Reopen { id } => api.reopen_inspection(&id)?,
            InspectionCommands::Delete { id } => api.delete_inspection(&id)?,
        },
        Commands::Export { path } => api.export(path)?,
        Commands::Import { path } => api.import(&path)?,
        Commands::Sync { action } => match action.unwrap_or(SyncCommands::Status) {
            SyncCommands::Run => {
                let runtime = tokio::runtime::Builder::new_current_thread()
                    .enable_time()
                    .build()
                    .context("could not start the sync runtime")?;
                runtime.block_on(api.sync_run(StubRemote::new()))?
            }
            SyncCommands::Status => api.sync_status()?,
            SyncCommands::Retry => api.sync_retry()?,
            SyncCommands::Clear => api.sync_clear()?,
        },
    };
    Ok(result)
}
