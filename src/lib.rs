//! Fetch and cache the OpenNeuro ds000228 fMRI dataset.
//!
//! [`app::App::fetch`] downloads the participant table plus one functional
//! image and one confound matrix per subject, skipping files already cached,
//! and returns their local paths.

pub mod app;
pub mod config;
pub mod domain;
pub mod error;
pub mod fetcher;
pub mod output;
pub mod phenotypic;
pub mod store;

pub use app::{App, Ds000228, FetchReport, fetch_ds000228};
pub use config::FetchConfig;
pub use error::FetchError;
