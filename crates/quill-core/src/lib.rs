//! # Quill Core
//!
//! The domain layer of the Quill blog backend.
//! Entities, validation rules, ports and the application services live here;
//! every store, mailer and object store is reached through a trait.

pub mod domain;
pub mod email;
pub mod error;
pub mod ports;
pub mod services;

pub use error::{DomainError, RepoError};
