//! Market Data Source Adapter — Gamma API client.

mod client;
mod parse;

pub use client::GammaClient;
