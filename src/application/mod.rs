//! Application layer: operation scripts and input loading
//!
//! This layer drives the domain engine from untyped input and owns file I/O.

pub mod error;
pub mod error_ext;
pub mod loader;
pub mod script;

pub use error::{ApplicationError, ApplicationResult};
pub use error_ext::PathContextExt;
pub use loader::{load_literal, load_script};
pub use script::{Command, Outcome, ScriptRunner};
