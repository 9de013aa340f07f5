use std::{fmt};

use serde::{Deserialize, Serialize};

use super::model::{Map, Name, Set, Value};

/// The bindings of the dynamic, root scope of an evaluator session.
///
/// Variables and constants hold live [`Value`]s. Functions and types are only
/// names. Child scopes are modules that were loaded earlier.
#[derive(Debug, Clone, Default)]
pub struct Scope {
    pub variables: Map<Value>,
    pub constants: Map<Value>,
    pub functions: Set,
    pub types: Set,
    pub children: Map<StaticScope>,
}

impl Scope {
    pub fn new() -> Self { Self::default() }

    pub fn define_variable(&mut self, name: &str, value: Value) {
        self.variables.insert(name.into(), value);
    }

    pub fn define_constant(&mut self, name: &str, value: Value) {
        self.constants.insert(name.into(), value);
    }
}

// ----------------------------------------------------------------------------

/// The public names declared by an external module.
///
/// The values are never materialised: the rebuilt program refers to each
/// name as `name.symbol`, so that it is the same storage as before.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StaticScope {
    /// The name used to qualify the module's symbols.
    pub name: Name,

    /// The path the module was imported from.
    pub path: String,

    /// The source files that declare the names, sorted.
    pub files: Vec<String>,

    pub variables: Set,
    pub constants: Set,
    pub functions: Set,
    pub types: Set,
}

impl Default for StaticScope {
    fn default() -> Self {
        Self {
            name: "".into(),
            path: String::new(),
            files: Vec::new(),
            variables: Set::new(),
            constants: Set::new(),
            functions: Set::new(),
            types: Set::new(),
        }
    }
}

impl StaticScope {
    pub fn new(name: &str, path: &str) -> Self {
        Self {name: name.into(), path: path.into(), ..Self::default()}
    }

    /// Returns `symbol` qualified by the module name.
    pub fn qualify(&self, symbol: &str) -> String { format!("{}.{}", self.name, symbol) }

    /// Describes where `self` came from, for error messages.
    pub fn candidate(&self) -> Candidate {
        Candidate {label: self.path.clone(), files: self.files.clone()}
    }
}

/// One of several conflicting sources for the same module name.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub struct Candidate {
    /// A path or module name.
    pub label: String,

    /// The files involved, sorted.
    pub files: Vec<String>,
}

impl fmt::Display for Candidate {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{} ({})", self.label, self.files.join(", "))
    }
}
