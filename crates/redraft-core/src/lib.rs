//! # redraft-core
//!
//! Core types, traits, and abstractions for the redraft assistant.
//!
//! This crate provides the foundational data structures and trait definitions
//! that the other redraft crates depend on: the shared error type, default
//! constants, the structured-logging schema, the chat/retrieval data model,
//! and the collaborator traits (generation, embedding, turn log, document
//! store) that concrete backends implement.

pub mod defaults;
pub mod error;
pub mod logging;
pub mod models;
pub mod traits;

// Re-export commonly used types at crate root
pub use error::{Error, Result};
pub use models::*;
pub use traits::*;
