//! Boot Dashboard - batch query client for a build/boot report dashboard
//!
//! This library provides the request aggregation layer behind the dashboard
//! pages:
//! - Query descriptors for the backend's collections
//! - A dispatcher choosing a direct request or one batch POST
//! - A demultiplexer routing batched results to their display targets
//! - Join-all over independent attempts with a uniform degraded fallback
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────┐
//! │                    Page flows                        │
//! │     boot job  │  job summary  │  boot detail         │
//! └────────────────────┬────────────────────────────────┘
//!                      │ Attempt (descriptors, handlers, fallback)
//! ┌────────────────────▼────────────────────────────────┐
//! │                   Dispatcher                         │
//! │   single GET  │  batch POST  │  demux  │  join-all  │
//! └────────────────────┬────────────────────────────────┘
//!                      │
//! ┌────────────────────▼────────────────────────────────┐
//! │                 Backend API                          │
//! │      /{collection}[/{id}]   │   /batch              │
//! └─────────────────────────────────────────────────────┘
//! ```

pub mod board;
pub mod config;
pub mod demux;
pub mod dispatch;
pub mod error;
pub mod join;
pub mod pages;
pub mod query;

pub use board::{Board, Cell, Degraded, Tone};
pub use config::{BackendConfig, PageContext};
pub use demux::{DemuxReport, Handlers, demux};
pub use dispatch::{
    Attempt, DispatchMode, DispatchOutcome, Dispatcher, EntryFailure, HttpTransport,
    OperationResult, Settlement, Transport,
};
pub use error::{Error, Result};
pub use join::{settle_all, when_all};
pub use query::{Method, ParamValue, QueryDescriptor};
