//! Use Cases Layer - Application Business Logic
//!
//! Orchestrates domain logic with port interfaces to implement the
//! pipeline's two workflows. Each use case is a self-contained
//! business operation driven entirely through port traits, so it can
//! be exercised in tests against mock adapters.
//!
//! Use cases:
//! - `ProducerOrchestrator`: poll loop — subscriptions, snapshots,
//!   conviction detection, publish
//! - `Projector`: consume loop — decode, dual upsert into the archive

pub mod producer_orchestrator;
pub mod projector;

pub use producer_orchestrator::ProducerOrchestrator;
pub use projector::Projector;
