//! Companion Core - Chat dispatch and multi-provider AI routing engine
//!
//! This crate implements the conversational core of a personal assistant:
//! pattern-based intent dispatch ahead of free-form AI calls, and a
//! multi-provider routing layer with health tracking and fallback chains.

pub mod adapters;
pub mod application;
pub mod config;
pub mod domain;
pub mod ports;
