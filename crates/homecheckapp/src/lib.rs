//! # Homecheck Architecture
//!
//! Homecheck is the offline-first core of a property-inspection app: checklist
//! templates, inspections created from them, photos, and a durable queue that
//! carries every local change to a remote once one is reachable. It is a
//! UI-agnostic library; the `homecheck` CLI is just one client.
//!
//! ## Layers
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │  Client (CLI, desktop shell, ...)                           │
//! │  - Parses input, renders output, owns the terminal          │
//! └─────────────────────────────────────────────────────────────┘
//!                              │
//!                              ▼
//! ┌─────────────────────────────────────────────────────────────┐
//! │  API (api.rs) + Commands (commands/)                        │
//! │  - Facade and structured CmdResult returns                  │
//! └─────────────────────────────────────────────────────────────┘
//!                              │
//!                              ▼
//! ┌─────────────────────────────────────────────────────────────┐
//! │  Repositories (repo/)                                       │
//! │  - Domain rules; every write also enqueues a sync entry     │
//! └─────────────────────────────────────────────────────────────┘
//!                 │                            │
//!                 ▼                            ▼
//! ┌───────────────────────────┐  ┌──────────────────────────────┐
//! │  Local Store (store/)     │◄─│  Sync (sync/)                │
//! │  - Typed records, indexes │  │  - Coalescing queue, drains  │
//! └───────────────────────────┘  └──────────────────────────────┘
//! ```
//!
//! ## Data Flow
//!
//! A user action calls a repository method. The repository writes the record to
//! the local store (the source of truth) and then adds a coalesced entry to the
//! sync queue. When connectivity is available, the sync processor drains the
//! queue against a [`RemoteEffect`](sync::remote::RemoteEffect).
//!
//! ## Execution Model
//!
//! Store, queue and repository calls are synchronous and take `&self`; a
//! read-modify-write never yields halfway. The only suspension points are the
//! remote call during a drain and geolocation. Nothing here is `Send`: the
//! store lives on one thread, the way a UI thread owns it.
//!
//! ## Module Overview
//!
//! - [`api`]: facade for clients
//! - [`commands`]: command functions returning [`commands::CmdResult`]
//! - [`repo`]: template, inspection and photo repositories
//! - [`store`]: the local store and its backends
//! - [`sync`]: sync queue, processor and remote capability
//! - [`model`]: records and their invariants
//! - [`media`]: photo compression and thumbnails
//! - [`geo`]: geolocation capability
//! - [`config`]: layered configuration
//! - [`error`]: error type

pub mod api;
pub mod commands;
pub mod config;
pub mod error;
pub mod geo;
pub mod media;
pub mod model;
pub mod repo;
pub mod store;
pub mod sync;

#[cfg(any(test, feature = "test_utils"))]
pub mod test_utils;
