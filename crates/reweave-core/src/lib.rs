//! Core data model for the reweave project parser.
//!
//! Defines the resource and source-file types flowing through the parsing
//! pipeline, provenance markers, the per-invocation execution context, the
//! build-metadata cache, and the parser configuration.

pub mod cache;
pub mod config;
pub mod context;
pub mod error;
pub mod events;
pub mod marker;
pub mod resource;
pub mod source;
