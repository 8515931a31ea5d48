//! structree: a mutable, id-addressed tree store.
//!
//! A [`TreeEngine`](domain::TreeEngine) holds one rooted tree built from a
//! nested JSON literal. Nodes get stable integer ids in depth-first pre-order
//! and are fetched, inserted, updated and removed by id.

pub mod application;
pub mod cli;
pub mod config;
pub mod domain;
pub mod exitcode;
pub mod util;

pub use domain::{DomainError, DomainResult, EngineOptions, IdPolicy, Node, NodeId, TreeEngine};
