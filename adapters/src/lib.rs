//! # Adapters
//!
//! Connectors implementing [`tn_core::traits::RemoteObjectStore`].

pub mod github;

pub use github::GithubContentStore;
