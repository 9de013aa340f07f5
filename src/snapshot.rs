//! Writes a whole evaluator environment as source text.
//!
//! The output is a sequence of statements, intended for the body of `main`:
//! first the auxiliary declarations made by the literal encoder, then a
//! single composite literal which rebuilds the environment:
//!
//! ```text
//! ptr0 := []*int{&[]int{5}[0]}[0]
//! root := &eval.SimpleEnv{
//!     Vars: map[string]reflect.Value{
//!         "a": reflect.ValueOf(&[]*int{ptr0}[0]),
//!     },
//!     Consts: map[string]reflect.Value{},
//!     Funcs: map[string]reflect.Value{},
//!     Types: map[string]reflect.Type{},
//!     Pkgs: map[string]eval.Env{
//!         "fmt": &eval.SimpleEnv{ .. },
//!     },
//! }
//! ```

use std::{fmt, io};
use std::fmt::{Write as _};

use serde::{Deserialize};
use thiserror::Error;
use tracing::{debug};

use super::model::{Map, Name, Value};
use super::alias::{AliasTable};
use super::literal::{address, encode, quote, EncodeError};
use super::scope::{Candidate, Scope, StaticScope};

/// Fatal errors of a snapshot pass. No [`Document`] is produced.
#[derive(Error, Debug)]
pub enum WriteError {
    #[error("module name `{name}` is provided by both {first} and {second}")]
    DuplicateModule {name: String, first: Candidate, second: Candidate},

    #[error("failed to write snapshot: {0}")]
    Sink(#[from] io::Error),
}

/// A binding that was left out of a [`Document`].
#[derive(Debug, Clone, PartialEq)]
pub enum Warning {
    Variable(Name, EncodeError),
    Constant(Name, EncodeError),

    /// Functions defined in a session cannot be carried across a rebuild.
    Function(Name),

    /// Types defined in a session cannot be carried across a rebuild.
    Type(Name),
}

impl Warning {
    /// The name of the binding that was left out.
    pub fn name(&self) -> &Name {
        match self {
            Self::Variable(name, _) | Self::Constant(name, _) => name,
            Self::Function(name) | Self::Type(name) => name,
        }
    }
}

impl fmt::Display for Warning {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Self::Variable(name, e) => write!(f, "variable {} dropped: {}", name, e),
            Self::Constant(name, e) => write!(f, "constant {} dropped: {}", name, e),
            Self::Function(name) => write!(f, "function {} dropped: functions cannot be carried over", name),
            Self::Type(name) => write!(f, "type {} dropped: types cannot be carried over", name),
        }
    }
}

// ----------------------------------------------------------------------------

/// The names used by the generated environment literal.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct Layout {
    /// The concrete environment type.
    pub env_type: String,

    /// The interface type of child environments.
    pub env_interface: String,

    /// The variable that holds the rebuilt environment.
    pub root: String,
}

impl Default for Layout {
    fn default() -> Self {
        Self {
            env_type: "eval.SimpleEnv".into(),
            env_interface: "eval.Env".into(),
            root: "root".into(),
        }
    }
}

/// The source text of a snapshot, in pieces.
#[derive(Debug, Clone)]
pub struct Document {
    /// Declarations `name := literal`, in the order they must appear.
    pub auxiliaries: Vec<(Name, String)>,

    /// Modules that the literals refer to, beyond those in `modules`.
    pub imports: Vec<&'static str>,

    /// For each variable, an expression for a pointer to fresh storage
    /// holding its value.
    pub variables: Vec<(Name, String)>,

    /// For each constant, an expression for its value.
    pub constants: Vec<(Name, String)>,

    /// Child environments, sorted by name.
    pub modules: Vec<StaticScope>,

    pub layout: Layout,
}

impl Document {
    /// Writes `self` to `w`.
    pub fn write_to(&self, w: &mut impl io::Write) -> io::Result<()> {
        write!(w, "{}", self)
    }
}

/// Writes `field: map[string]value_type{...},` at indentation `depth`.
fn write_map(
    f: &mut impl fmt::Write,
    depth: usize,
    field: &str,
    value_type: &str,
    entries: impl IntoIterator<Item=(String, String)>,
) -> fmt::Result {
    let tabs = "\t".repeat(depth);
    write!(f, "{}{}: map[string]{}{{", tabs, field, value_type)?;
    let mut is_empty = true;
    for (key, value) in entries {
        write!(f, "\n{}\t{}: {},", tabs, quote(&key), value)?;
        is_empty = false;
    }
    if !is_empty { write!(f, "\n{}", tabs)?; }
    writeln!(f, "}},")
}

/// Writes the literal for a child environment at indentation `depth`.
fn write_module(f: &mut impl fmt::Write, depth: usize, env_type: &str, module: &StaticScope)
-> fmt::Result {
    let tabs = "\t".repeat(depth);
    writeln!(f, "{}{}: &{}{{", tabs, quote(&module.name), env_type)?;
    write_map(f, depth + 1, "Vars", "reflect.Value", module.variables.iter().map(
        |v| (v.to_string(), format!("reflect.ValueOf(&{})", module.qualify(v)))
    ))?;
    write_map(f, depth + 1, "Consts", "reflect.Value", module.constants.iter().map(
        |c| (c.to_string(), format!("reflect.ValueOf({})", module.qualify(c)))
    ))?;
    write_map(f, depth + 1, "Funcs", "reflect.Value", module.functions.iter().map(
        |g| (g.to_string(), format!("reflect.ValueOf({})", module.qualify(g)))
    ))?;
    write_map(f, depth + 1, "Types", "reflect.Type", module.types.iter().map(
        |t| (t.to_string(), format!("reflect.TypeOf(new({})).Elem()", module.qualify(t)))
    ))?;
    writeln!(f, "{}}},", tabs)
}

impl fmt::Display for Document {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let layout = &self.layout;
        for (name, literal) in &self.auxiliaries {
            writeln!(f, "\t{} := {}", name, literal)?;
        }
        writeln!(f, "\t{} := &{}{{", layout.root, layout.env_type)?;
        write_map(f, 2, "Vars", "reflect.Value", self.variables.iter().map(
            |(name, pointer)| (name.to_string(), format!("reflect.ValueOf({})", pointer))
        ))?;
        write_map(f, 2, "Consts", "reflect.Value", self.constants.iter().map(
            |(name, literal)| (name.to_string(), format!("reflect.ValueOf({})", literal))
        ))?;
        write_map(f, 2, "Funcs", "reflect.Value", std::iter::empty())?;
        write_map(f, 2, "Types", "reflect.Type", std::iter::empty())?;
        // Child environments are nested one level deeper than `write_map` puts entries.
        let mut pkgs = String::new();
        for module in &self.modules {
            write_module(&mut pkgs, 3, &layout.env_type, module)?;
        }
        if pkgs.is_empty() {
            writeln!(f, "\t\tPkgs: map[string]{}{{}},", layout.env_interface)?;
        } else {
            write!(f, "\t\tPkgs: map[string]{}{{\n{}\t\t}},\n", layout.env_interface, pkgs)?;
        }
        writeln!(f, "\t}}")
    }
}

// ----------------------------------------------------------------------------

/// A [`Document`] and the bindings that had to be left out of it.
#[derive(Debug, Clone)]
pub struct Snapshot {
    pub document: Document,
    pub warnings: Vec<Warning>,
}

/// Combines the modules already in `root` with the newly imported `statics`,
/// which take precedence.
///
/// Fails if two different `statics` have the same name.
fn modules(root: &Scope, statics: &[StaticScope]) -> Result<Vec<StaticScope>, WriteError> {
    let mut requested: Vec<&StaticScope> = statics.iter().collect();
    requested.sort_by(|a, b| (&a.name, &a.path).cmp(&(&b.name, &b.path)));
    requested.dedup_by(|a, b| a.name == b.name && a.path == b.path);
    for pair in requested.windows(2) {
        if pair[0].name == pair[1].name {
            return Err(WriteError::DuplicateModule {
                name: pair[0].name.to_string(),
                first: pair[0].candidate(),
                second: pair[1].candidate(),
            });
        }
    }
    let mut ret: Map<StaticScope> = Map::new();
    for (name, child) in &root.children {
        ret.insert(name.clone(), StaticScope {name: name.clone(), ..child.clone()});
    }
    for module in requested {
        ret.insert(module.name.clone(), module.clone());
    }
    Ok(ret.into_values().collect())
}

/// Converts `root` and `statics` into a [`Document`].
///
/// `table` may be pre-seeded with the identities of storage owned by loaded
/// modules. Bindings that cannot be encoded are reported as [`Warning`]s.
pub fn snapshot(root: &Scope, statics: &[StaticScope], mut table: AliasTable, layout: &Layout)
-> Result<Snapshot, WriteError> {
    let modules = modules(root, statics)?;
    let mut warnings = Vec::new();
    let mut variables = Vec::new();
    for (name, value) in &root.variables {
        match encode(value, &mut table) {
            Ok(literal) => variables.push((name.clone(), address(value, &literal))),
            Err(e) => {
                debug!(%name, error = %e, "dropping variable");
                warnings.push(Warning::Variable(name.clone(), e));
            },
        }
    }
    let mut constants = Vec::new();
    for (name, value) in &root.constants {
        match encode(value, &mut table) {
            Ok(literal) => constants.push((name.clone(), literal)),
            Err(e) => {
                debug!(%name, error = %e, "dropping constant");
                warnings.push(Warning::Constant(name.clone(), e));
            },
        }
    }
    warnings.extend(root.functions.iter().cloned().map(Warning::Function));
    warnings.extend(root.types.iter().cloned().map(Warning::Type));
    let (auxiliaries, imports) = table.into_parts();
    let document = Document {auxiliaries, imports, variables, constants, modules, layout: layout.clone()};
    Ok(Snapshot {document, warnings})
}

/// Writes a snapshot of `root` and `statics` to `w`.
///
/// Returns the bindings that had to be left out. If writing fails, the
/// output must be discarded.
pub fn write_env(
    w: &mut impl io::Write,
    root: &Scope,
    statics: &[StaticScope],
    table: AliasTable,
    layout: &Layout,
) -> Result<Vec<Warning>, WriteError> {
    let Snapshot {document, warnings} = snapshot(root, statics, table, layout)?;
    document.write_to(w)?;
    Ok(warnings)
}

// ----------------------------------------------------------------------------
