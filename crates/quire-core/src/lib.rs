//! # Quire Core
//!
//! The domain layer of Quire: posts, their publication state, and who may
//! read or change them. No infrastructure dependencies.

pub mod domain;
pub mod error;
pub mod ports;
pub mod services;

pub use error::DomainError;
