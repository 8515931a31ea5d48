//! Domain layer: the tree engine and its node model
//!
//! This layer is independent of external concerns (no I/O, no CLI, no config loading).

pub mod engine;
pub mod error;
pub mod ids;
pub mod literal;
pub mod node;
pub mod traversal;

pub use engine::{EngineOptions, TreeEngine, DEFAULT_MAX_DEPTH};
pub use error::{DomainError, DomainResult};
pub use ids::{Checkpoint, IdAllocator, IdPolicy};
pub use literal::NodeLiteral;
pub use node::{Node, NodeId, DEFAULT_TYPE};
pub use traversal::{breadth_first, breadth_first_mut, depth_first, level_of, Branching, PreOrder};
