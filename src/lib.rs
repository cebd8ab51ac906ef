//! Polymarket Event Pipeline — Library Root
//!
//! Re-exports all modules for the `producer` and `consumer` binaries
//! and for integration tests.

pub mod adapters;
pub mod config;
pub mod domain;
pub mod error;
pub mod ports;
pub mod usecases;
