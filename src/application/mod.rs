//! Application layer - use-case handlers over the domain core.
//!
//! Each handler takes a command, drives the domain, and returns a plain
//! result the HTTP layer can map to a response.

pub mod handlers;
