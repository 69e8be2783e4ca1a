//! Group Saga Coordinator
//!
//! Creates or deletes a group across a set of independent HTTP nodes with
//! best-effort atomicity: every node ends in the target state, or every node
//! that was changed is reverted. When a revert itself fails the saga ends in
//! [`SagaState::Error`] and the operator has to reconcile by hand.
//!
//! # Quick Start
//!
//! ```rust,ignore
//! let nodes = load_nodes("nodes.json")?;
//! let mut saga = GroupSaga::new("create_group", nodes, "group_1", &SagaConfig::from_env())?;
//!
//! match saga.run().await {
//!     SagaState::Done => println!("created everywhere"),
//!     SagaState::RolledBack => println!("reverted, nothing changed"),
//!     _ => println!("{:?}", saga.report()),
//! }
//! ```

#![warn(missing_docs)]

// === Core Types ===
mod context;
mod errors;
mod state;

// === Node Calls ===
mod action;
mod client;
mod retry;

// === Coordination ===
mod fanout;
mod saga;

// === Configuration ===
mod config;
mod nodes;

// === Observability ===
mod observer;
mod stats;

// === Re-exports ===

// Types
pub use context::{GroupName, Node, SagaContext, SagaId};
pub use state::{NodeActionState, Phase, SagaFailure, SagaState};

// Errors
pub use errors::{NodeError, SagaError};

// Node calls
pub use action::{ActionKind, NodeAction};
pub use client::{GroupPayload, NodeClient, NodeResponse, Operation};
pub use retry::RetryPolicy;

// Coordination
pub use saga::{GroupSaga, SagaReport};

// Configuration
pub use config::SagaConfig;
pub use nodes::{load_nodes, parse_nodes, NodeListError};

// Observability
pub use observer::{NoOpObserver, SagaObserver, TracingObserver};
pub use stats::{SagaStats, SagaStatsSnapshot};
