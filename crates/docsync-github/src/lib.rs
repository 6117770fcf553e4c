//! docsync GitHub collaborator
//!
//! - [`GithubFetcher`]: file content at a revision via the contents API
//! - [`RepositoryAddress`]: owner/name parsing for HTTPS and SSH forms
//! - Push webhook planning and dispatch into the orchestrator

#![warn(unreachable_pub)]

pub mod address;
pub mod error;
pub mod fetcher;
pub mod webhook;

pub use address::RepositoryAddress;
pub use error::GithubError;
pub use fetcher::{GithubConfig, GithubFetcher, TOKEN_ENV};
pub use webhook::{
    dispatch_push, handle_delivery, plan_file_syncs, DeliveryResponse, DispatchSummary, FileSync,
    PushCommit, PushEvent, PushRepository, WebhookEvent,
};
