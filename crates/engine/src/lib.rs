//! Headless core of the billing back-office.
//!
//! The engine knows nothing about HTTP or terminals. Backends are reached
//! through small object-safe traits ([`ListSource`], [`FileBackend`],
//! [`MutationSink`], [`ReferenceSource`]) that the `client` crate implements
//! and tests replace with in-memory doubles.
pub use cache::{ReferenceCache, ReferenceSource};
pub use controller::{ListController, ListSource};
pub use error::{ListError, RemoteError};
pub use forms::{
    EditSource, EntityForm, FormError, FormInputs, FormMode, FormState, MutationSink, Submission,
    ValidationIssues,
};
pub use page::Page;
pub use poller::Poller;
pub use query::{FilterManifest, FilterValue, Query};
pub use resources::ListResource;
pub use status::LoadStatus;
pub use upload::{FileBackend, UploadError, UploadFile, UploadOrchestrator, UploadState};

pub mod cache;
pub mod controller;
pub mod error;
pub mod forms;
pub mod page;
pub mod poller;
pub mod query;
pub mod resources;
pub mod status;
pub mod upload;
