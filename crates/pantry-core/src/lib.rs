//! Core data types for Pantry.
//!
//! This crate defines what the resolver works on: versions and constraints,
//! sources and their locations, cached artifacts and their metadata,
//! manifests, lockfiles, resolver configuration, and the store interfaces the
//! resolver queries.
//!
//! This crate performs no network I/O.

pub mod artifact;
pub mod config;
pub mod constraint;
pub mod lockfile;
pub mod manifest;
pub mod source;
pub mod store;
