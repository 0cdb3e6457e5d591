//! `reqwest` client for the billing back-office REST API.
//!
//! [`ApiClient`] implements the engine's backend traits, so a screen only ever
//! sees [`engine::ListSource`], [`engine::FileBackend`], [`engine::MutationSink`]
//! and [`engine::ReferenceSource`]. Every failure is classified into a
//! [`ClientError`] first and then into [`engine::RemoteError`].
pub use api::ApiClient;
pub use error::{ClientError, Result};
pub use list::RemoteList;

mod api;
mod error;
mod files;
mod list;
mod mutations;
mod references;
