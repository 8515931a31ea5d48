//! Operation scripts: engine operations as JSON commands.
//!
//! Every argument is optional on the wire. A command that lacks a required
//! argument fails with `MissingArgument` before the engine is touched.
//!
//! ```text
//! {"op": "build", "structure": {"children": [{}, {}]}}
//! {"op": "update", "id": 1, "data": {"type": "span"}}
//! {"op": "get", "id": 1}
//! ```

use serde::{Deserialize, Serialize, Serializer};
use serde_json::Value;
use tracing::{debug, instrument};

use crate::application::{ApplicationError, ApplicationResult};
use crate::domain::{DomainError, Node, NodeId, TreeEngine};

/// One engine operation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum Command {
    Build {
        #[serde(default)]
        structure: Option<Value>,
    },
    Add {
        #[serde(default)]
        data: Option<Value>,
        #[serde(default)]
        parent: Option<NodeId>,
    },
    Get {
        #[serde(default)]
        id: Option<NodeId>,
    },
    Update {
        #[serde(default)]
        id: Option<NodeId>,
        #[serde(default)]
        data: Option<Value>,
    },
    Remove {
        #[serde(default)]
        id: Option<NodeId>,
    },
    Structure,
    Destroy,
}

impl Command {
    pub fn name(&self) -> &'static str {
        match self {
            Command::Build { .. } => "build",
            Command::Add { .. } => "add",
            Command::Get { .. } => "get",
            Command::Update { .. } => "update",
            Command::Remove { .. } => "remove",
            Command::Structure => "structure",
            Command::Destroy => "destroy",
        }
    }
}

/// Result of one command.
///
/// Serializes to the node itself, `false` for a lookup miss, and `null` for an
/// empty structure or a destroy.
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome {
    Node(Node),
    Found(Option<Node>),
    Structure(Option<Node>),
    Destroyed,
}

impl Outcome {
    pub fn node(&self) -> Option<&Node> {
        match self {
            Outcome::Node(node) => Some(node),
            Outcome::Found(node) | Outcome::Structure(node) => node.as_ref(),
            Outcome::Destroyed => None,
        }
    }
}

impl Serialize for Outcome {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Outcome::Node(node) => node.serialize(serializer),
            Outcome::Found(Some(node)) => node.serialize(serializer),
            Outcome::Found(None) => serializer.serialize_bool(false),
            Outcome::Structure(Some(node)) => node.serialize(serializer),
            Outcome::Structure(None) | Outcome::Destroyed => serializer.serialize_none(),
        }
    }
}

/// Applies commands to an engine it owns.
#[derive(Debug, Default)]
pub struct ScriptRunner {
    engine: TreeEngine,
}

impl ScriptRunner {
    pub fn new(engine: TreeEngine) -> Self {
        Self { engine }
    }

    pub fn engine(&self) -> &TreeEngine {
        &self.engine
    }

    pub fn into_engine(self) -> TreeEngine {
        self.engine
    }

    #[instrument(level = "debug", skip_all, fields(op = command.name()))]
    pub fn apply(&mut self, command: Command) -> ApplicationResult<Outcome> {
        let engine = &mut self.engine;
        let outcome = match command {
            Command::Build { structure } => {
                let structure = structure.ok_or(DomainError::missing("build", "a structure"))?;
                Outcome::Node(engine.build(structure)?.clone())
            }
            Command::Add { data, parent } => {
                let data = data.ok_or(DomainError::missing("add", "node data"))?;
                Outcome::Node(engine.add(data, parent)?)
            }
            Command::Get { id } => {
                let id = id.ok_or(DomainError::missing("get", "an id"))?;
                Outcome::Found(engine.get(id).cloned())
            }
            Command::Update { id, data } => {
                let id = id.ok_or(DomainError::missing("update", "an id"))?;
                let data = data.ok_or(DomainError::missing("update", "node data"))?;
                Outcome::Node(engine.update(id, data)?.clone())
            }
            Command::Remove { id } => {
                let id = id.ok_or(DomainError::missing("remove", "an id"))?;
                Outcome::Node(engine.remove(id)?)
            }
            Command::Structure => Outcome::Structure(engine.structure().cloned()),
            Command::Destroy => {
                engine.destroy();
                Outcome::Destroyed
            }
        };
        Ok(outcome)
    }

    /// Run a JSON-lines script, handing each outcome to `emit` as it is produced.
    ///
    /// Blank lines and lines starting with `//` are skipped. Errors carry the
    /// 1-based line number. Returns the number of commands applied.
    pub fn run_each<F>(&mut self, script: &str, mut emit: F) -> ApplicationResult<usize>
    where
        F: FnMut(&Outcome) -> ApplicationResult<()>,
    {
        let mut applied = 0;
        for (idx, line) in script.lines().enumerate() {
            let trimmed = line.trim();
            if trimmed.is_empty() || trimmed.starts_with("//") {
                continue;
            }
            let at_line = |source: ApplicationError| ApplicationError::Script {
                line: idx + 1,
                source: Box::new(source),
            };

            let command: Command = serde_json::from_str(trimmed)
                .map_err(|e| at_line(ApplicationError::Json(e)))?;
            debug!(line = idx + 1, op = command.name(), "applying");
            let outcome = self.apply(command).map_err(at_line)?;
            emit(&outcome).map_err(at_line)?;
            applied += 1;
        }
        Ok(applied)
    }

    /// Run a JSON-lines script and collect all outcomes.
    pub fn run(&mut self, script: &str) -> ApplicationResult<Vec<Outcome>> {
        let mut outcomes = Vec::new();
        self.run_each(script, |outcome| {
            outcomes.push(outcome.clone());
            Ok(())
        })?;
        Ok(outcomes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_command_wire_format() {
        let command: Command = serde_json::from_value(json!({"op": "add", "data": {}, "parent": 0})).unwrap();
        assert_eq!(
            command,
            Command::Add {
                data: Some(json!({})),
                parent: Some(NodeId(0))
            }
        );

        let command: Command = serde_json::from_value(json!({"op": "get"})).unwrap();
        assert_eq!(command, Command::Get { id: None });
    }

    #[test]
    fn test_outcome_serialization() {
        assert_eq!(serde_json::to_value(Outcome::Found(None)).unwrap(), json!(false));
        assert_eq!(serde_json::to_value(Outcome::Structure(None)).unwrap(), json!(null));
        assert_eq!(serde_json::to_value(Outcome::Destroyed).unwrap(), json!(null));

        let node = Node::new(NodeId(2), Some(NodeId(0)));
        assert_eq!(
            serde_json::to_value(Outcome::Found(Some(node))).unwrap()["id"],
            json!(2)
        );
    }

    #[test]
    fn test_missing_argument_leaves_engine_untouched() {
        let mut runner = ScriptRunner::default();
        runner
            .apply(Command::Build {
                structure: Some(json!({"children": [{}]})),
            })
            .unwrap();

        let err = runner
            .apply(Command::Update {
                id: Some(NodeId(1)),
                data: None,
            })
            .unwrap_err();

        assert!(matches!(
            err,
            ApplicationError::Domain(DomainError::MissingArgument {
                operation: "update",
                ..
            })
        ));
        assert_eq!(runner.engine().get(NodeId(1)).unwrap().kind, "div");
    }
}
