//! Use-case services.
//!
//! # Responsibility
//! - Orchestrate repository calls and rendering into front-end level APIs.
//! - Keep dispatch code decoupled from storage details.

pub mod map_service;
pub mod preference_service;
