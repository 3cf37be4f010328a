//! Shared utilities for Pantry.
//!
//! This crate provides cross-cutting concerns used by all other Pantry crates:
//! the unified error type and small filesystem helpers.

pub mod errors;
pub mod fs;
