//! Core use-case services.
//!
//! # Responsibility
//! - Orchestrate repository reads, unification and rendering into
//!   use-case level APIs.
//! - Keep the CLI and other callers decoupled from storage details.

pub mod motion_service;

pub use motion_service::{MotionTextService, ServiceError, ServiceResult};
