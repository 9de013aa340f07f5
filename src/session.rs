//! Loads a description of live evaluator state from JSON.
//!
//! A session file looks like this:
//!
//! ```json
//! {
//!     "cells": {
//!         "x": {"type": "int", "value": 5},
//!         "out": {"type": {"named": {"module": "os", "name": "File", "underlying": "int"}},
//!                 "external": "os.Stdout"}
//!     },
//!     "variables": {
//!         "a": {"type": {"pointer": "int"}, "value": {"cell": "x"}},
//!         "s": {"type": {"slice": "int"}, "value": null}
//!     },
//!     "constants": {"c": {"type": "string", "value": "hi"}},
//!     "functions": ["double"],
//!     "types": ["Celsius"],
//!     "modules": {"fmt": {"path": "fmt", "functions": ["Println"]}}
//! }
//! ```
//!
//! A `null` or missing value is the zero value of its type. Pointers refer
//! to `cells` by key. A cell marked `external` belongs to a loaded module,
//! and its name pre-seeds the [`AliasTable`].

use std::{fs, io};
use std::collections::{BTreeMap};
use std::path::{Path};

use serde::{Deserialize};
use serde_json::{Value as Json};
use thiserror::Error;
use tracing::{debug};

use super::model::{Cell, Data, Identity, Map, Name, Type, Value};
use super::alias::{AliasTable};
use super::scope::{Scope, StaticScope};

/// Reasons why a session cannot be loaded.
#[derive(Error, Debug)]
pub enum SessionError {
    #[error(transparent)]
    Io(#[from] io::Error),

    #[error("bad session file: {0}")]
    Json(#[from] serde_json::Error),

    #[error("{at}: expected {expected}")]
    Shape {at: String, expected: &'static str},

    #[error("{at}: no cell called `{cell}`")]
    UnknownCell {at: String, cell: String},

    #[error("{at}: cell `{cell}` holds `{found}`, not `{expected}`")]
    CellType {at: String, cell: String, expected: String, found: String},
}

#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
struct TypedJson {
    #[serde(rename = "type")]
    type_: Type,

    #[serde(default)]
    value: Json,
}

#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
struct CellJson {
    #[serde(rename = "type")]
    type_: Type,

    #[serde(default)]
    value: Json,

    #[serde(default)]
    external: Option<String>,
}

#[derive(Deserialize, Default)]
#[serde(default, deny_unknown_fields)]
struct SessionJson {
    cells: BTreeMap<String, CellJson>,
    variables: BTreeMap<String, TypedJson>,
    constants: BTreeMap<String, TypedJson>,
    functions: Vec<String>,
    types: Vec<String>,
    modules: BTreeMap<String, StaticScope>,
}

// ----------------------------------------------------------------------------

fn shape<T>(at: &str, expected: &'static str) -> Result<T, SessionError> {
    Err(SessionError::Shape {at: at.into(), expected})
}

fn float(json: &Json, at: &str) -> Result<f64, SessionError> {
    if let Some(x) = json.as_f64() { return Ok(x); }
    match json.as_str() {
        Some("NaN") => Ok(f64::NAN),
        Some("Inf") | Some("+Inf") => Ok(f64::INFINITY),
        Some("-Inf") => Ok(f64::NEG_INFINITY),
        Some("-0") => Ok(-0.0),
        _ => shape(at, "a number, \"NaN\", \"+Inf\", \"-Inf\" or \"-0\""),
    }
}

/// Reads an integer of a fixed-size kind `I`, stored in `W`.
fn sized<W, I>(found: Option<W>, at: &str) -> Result<W, SessionError>
where
    W: Copy,
    I: TryFrom<W>,
{
    match found {
        None => shape(at, "an integer"),
        Some(x) if I::try_from(x).is_err() => shape(at, "an integer in range for its type"),
        Some(x) => Ok(x),
    }
}

fn array<'j>(json: &'j Json, at: &str) -> Result<&'j Vec<Json>, SessionError> {
    json.as_array().map_or_else(|| shape(at, "an array"), Ok)
}

/// Decodes values that may point into `cells`.
struct Decoder<'a> {
    cells: &'a Map<Cell>,
}

impl<'a> Decoder<'a> {
    fn all(&self, json: &[Json], elem: &Type, at: &str) -> Result<Vec<Value>, SessionError> {
        json.iter().enumerate().map(|(i, j)| self.value(j, elem, &format!("{}[{}]", at, i))).collect()
    }

    fn cell(&self, json: &Json, elem: &Type, at: &str) -> Result<Cell, SessionError> {
        let Some(key) = json.get("cell").and_then(Json::as_str) else {
            return shape(at, "null or {\"cell\": key}");
        };
        let cell = self.cells.get(key).ok_or_else(
            || SessionError::UnknownCell {at: at.into(), cell: key.into()}
        )?;
        let found = cell.borrow().type_.clone();
        if found != *elem {
            return Err(SessionError::CellType {
                at: at.into(),
                cell: key.into(),
                expected: elem.to_string(),
                found: found.to_string(),
            });
        }
        Ok(cell.clone())
    }

    /// Decodes `json` as a value of type `type_`.
    fn value(&self, json: &Json, type_: &Type, at: &str) -> Result<Value, SessionError> {
        if json.is_null() { return Ok(Value::zero(type_)); }
        let data = match type_.underlying() {
            Type::Bool => Data::Bool(json.as_bool().map_or_else(|| shape(at, "a boolean"), Ok)?),
            Type::Int | Type::Int64 => Data::Int(sized::<_, i64>(json.as_i64(), at)?),
            Type::Int8 => Data::Int(sized::<_, i8>(json.as_i64(), at)?),
            Type::Int16 => Data::Int(sized::<_, i16>(json.as_i64(), at)?),
            Type::Int32 => Data::Int(sized::<_, i32>(json.as_i64(), at)?),
            Type::Uint | Type::Uint64 | Type::Uintptr => Data::Uint(sized::<_, u64>(json.as_u64(), at)?),
            Type::Uint8 => Data::Uint(sized::<_, u8>(json.as_u64(), at)?),
            Type::Uint16 => Data::Uint(sized::<_, u16>(json.as_u64(), at)?),
            Type::Uint32 => Data::Uint(sized::<_, u32>(json.as_u64(), at)?),
            Type::Float32 | Type::Float64 => Data::Float(float(json, at)?),
            Type::Complex64 | Type::Complex128 => {
                match array(json, at)?.as_slice() {
                    [re, im] => Data::Complex(float(re, at)?, float(im, at)?),
                    _ => return shape(at, "[real, imaginary]"),
                }
            },
            Type::String => Data::Str(json.as_str().map_or_else(|| shape(at, "a string"), Ok)?.into()),
            Type::Array {elem, ..} => Data::Array(self.all(array(json, at)?, elem, at)?.into()),
            Type::Slice(elem) => Data::Slice(Some(self.all(array(json, at)?, elem, at)?.into())),
            Type::Map {key, value} => {
                let mut pairs = Vec::new();
                for (i, pair) in array(json, at)?.iter().enumerate() {
                    let at = format!("{}[{}]", at, i);
                    match array(pair, &at)?.as_slice() {
                        [k, v] => pairs.push((self.value(k, key, &at)?, self.value(v, value, &at)?)),
                        _ => return shape(&at, "[key, value]"),
                    }
                }
                Data::Map(Some(pairs.into()))
            },
            Type::Struct(fields) => {
                let json = array(json, at)?;
                if json.len() != fields.len() { return shape(at, "one value per field"); }
                let mut values = Vec::with_capacity(fields.len());
                for (j, field) in json.iter().zip(fields) {
                    values.push(self.value(j, &field.type_, &format!("{}.{}", at, field.name))?);
                }
                Data::Struct(values.into())
            },
            Type::Pointer(elem) => Data::Pointer(Some(self.cell(json, elem, at)?)),
            Type::Interface => {
                let inner: TypedJson = serde_json::from_value(json.clone())?;
                Data::Interface(Some(Box::new(self.value(&inner.value, &inner.type_, at)?)))
            },
            Type::Func | Type::Chan(_) | Type::UnsafePointer => Data::Opaque,
            Type::Named {..} => unreachable!("`underlying()` strips names"),
        };
        Ok(Value::new(type_.clone(), data))
    }
}

// ----------------------------------------------------------------------------

/// A root [`Scope`], with the storage it refers to.
#[derive(Debug)]
pub struct Session {
    pub scope: Scope,

    /// Storage owned by loaded modules, and what to call it.
    pub seeds: Vec<(Identity, Name)>,

    /// All shared storage. Keeps `seeds` meaningful.
    pub cells: Map<Cell>,
}

impl Session {
    /// Parses a session from JSON text.
    pub fn parse(text: &str) -> Result<Self, SessionError> {
        let json: SessionJson = serde_json::from_str(text)?;
        // Allocate all cells first, so that they can refer to each other.
        let cells: Map<Cell> = json.cells.iter()
            .map(|(key, cell)| (key.as_str().into(), Value::zero(&cell.type_).into_cell()))
            .collect();
        let decoder = Decoder {cells: &cells};
        let mut seeds = Vec::new();
        for (key, cell) in &json.cells {
            let value = decoder.value(&cell.value, &cell.type_, &format!("cells.{}", key))?;
            let storage = &cells[key.as_str()];
            *storage.borrow_mut() = value;
            if let Some(external) = &cell.external {
                seeds.push((Identity::of(storage), external.as_str().into()));
            }
        }
        let mut scope = Scope::new();
        for (name, v) in &json.variables {
            let value = decoder.value(&v.value, &v.type_, &format!("variables.{}", name))?;
            scope.define_variable(name, value);
        }
        for (name, c) in &json.constants {
            let value = decoder.value(&c.value, &c.type_, &format!("constants.{}", name))?;
            scope.define_constant(name, value);
        }
        scope.functions.extend(json.functions.iter().map(|f| f.as_str().into()));
        scope.types.extend(json.types.iter().map(|t| t.as_str().into()));
        for (name, mut module) in json.modules {
            // A standard module is imported by its name.
            if module.path.is_empty() { module.path = name.clone(); }
            let name: Name = name.into();
            scope.children.insert(name.clone(), StaticScope {name, ..module});
        }
        debug!(cells = cells.len(), seeds = seeds.len(), "loaded session");
        Ok(Self {scope, seeds, cells})
    }

    /// Reads a session file.
    pub fn load(path: &Path) -> Result<Self, SessionError> {
        Self::parse(&fs::read_to_string(path)?)
    }

    /// Returns an [`AliasTable`] that knows the external storage.
    pub fn alias_table(&self) -> AliasTable {
        let mut ret = AliasTable::new();
        for (id, name) in &self.seeds { ret.seed(*id, name.clone()); }
        ret
    }
}

// ----------------------------------------------------------------------------
