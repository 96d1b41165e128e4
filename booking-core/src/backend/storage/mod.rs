//! # Storage Module
//!
//! Client-side access to the remote booking backend.
//!
//! The domain layer only sees the collaborator traits in [`traits`]. Two
//! implementations exist:
//!
//! - **memory**: a seeded in-process backend used by tests and offline development
//! - **rest**: the HTTP client for the real backend (feature `rest-client`)
//!
//! Both return raw wire rows from the `shared` crate; mapping happens in the
//! io layer.

pub mod memory;
#[cfg(feature = "rest-client")]
pub mod rest;
pub mod traits;

pub use memory::InMemoryConnection;
#[cfg(feature = "rest-client")]
pub use rest::RestConnection;
pub use traits::*;
