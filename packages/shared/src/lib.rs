//! Shared utilities for the Stationhub real-time messaging client.
//!
//! This crate carries the pieces every binary and test needs: logging
//! setup and a clock abstraction for deterministic timestamps in tests.

pub mod logger;
pub mod time;
