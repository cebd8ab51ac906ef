//! Ports Layer - Hexagonal Architecture Boundaries
//!
//! Defines the interfaces (traits) that the usecases layer requires from
//! the outside world. Adapters implement these traits; the domain layer
//! and usecases layer depend only on the traits here, never on concrete
//! adapter types.
//!
//! Port categories:
//! - `subscription_store`: active-set reads and ref-count mutation
//! - `market_data`: bulk and single-market price snapshot fetches
//! - `event_log`: partitioned publish/consume of `PolymarketEvent`
//! - `archive`: dual-document persistence of consumed events

pub mod archive;
pub mod event_log;
pub mod market_data;
pub mod subscription_store;
