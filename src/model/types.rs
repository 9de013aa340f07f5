use std::{fmt};

use serde::{Deserialize, Serialize};

use super::{Name, is_exported};

/// The kind of a [`Type`], ignoring any name it has been given.
#[derive(Debug, Copy, Clone, Hash, PartialEq, Eq)]
pub enum Kind {
    Bool,
    Int, Int8, Int16, Int32, Int64,
    Uint, Uint8, Uint16, Uint32, Uint64, Uintptr,
    Float32, Float64,
    Complex64, Complex128,
    String,
    Array,
    Slice,
    Map,
    Struct,
    Pointer,
    Interface,
    Func,
    Chan,
    UnsafePointer,
}

impl Kind {
    /// The spelling of `self` in source code, or in error messages for the
    /// kinds that have no single spelling.
    pub fn name(self) -> &'static str {
        match self {
            Self::Bool => "bool",
            Self::Int => "int",
            Self::Int8 => "int8",
            Self::Int16 => "int16",
            Self::Int32 => "int32",
            Self::Int64 => "int64",
            Self::Uint => "uint",
            Self::Uint8 => "uint8",
            Self::Uint16 => "uint16",
            Self::Uint32 => "uint32",
            Self::Uint64 => "uint64",
            Self::Uintptr => "uintptr",
            Self::Float32 => "float32",
            Self::Float64 => "float64",
            Self::Complex64 => "complex64",
            Self::Complex128 => "complex128",
            Self::String => "string",
            Self::Array => "array",
            Self::Slice => "slice",
            Self::Map => "map",
            Self::Struct => "struct",
            Self::Pointer => "ptr",
            Self::Interface => "interface",
            Self::Func => "func",
            Self::Chan => "chan",
            Self::UnsafePointer => "unsafe.Pointer",
        }
    }
}

impl fmt::Display for Kind {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result { f.write_str(self.name()) }
}

// ----------------------------------------------------------------------------

/// A field of a [`Type::Struct`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Field {
    pub name: Name,

    #[serde(rename = "type")]
    pub type_: Type,
}

impl Field {
    pub fn new(name: &str, type_: Type) -> Self { Self {name: name.into(), type_} }

    /// Returns `true` if the field can be named outside its module.
    pub fn is_exported(&self) -> bool { is_exported(&self.name) }
}

/// The static type of a [`Value`](super::Value).
///
/// `Display` writes the type the way it is spelled in source code.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Type {
    Bool,
    Int, Int8, Int16, Int32, Int64,
    Uint, Uint8, Uint16, Uint32, Uint64, Uintptr,
    Float32, Float64,
    Complex64, Complex128,
    String,

    /// A fixed-length sequence.
    Array { len: usize, elem: Box<Type> },

    /// A variable-length sequence.
    Slice(Box<Type>),

    Map { key: Box<Type>, value: Box<Type> },

    /// A record with ordered, named fields.
    Struct(Vec<Field>),

    Pointer(Box<Type>),

    /// The empty interface, which can hold a value of any type.
    Interface,

    Func,

    Chan(Box<Type>),

    UnsafePointer,

    /// A declared type. `module` is `None` for predeclared names.
    Named {
        #[serde(default)]
        module: Option<Name>,
        name: Name,
        underlying: Box<Type>,
    },
}

impl Type {
    pub fn array(len: usize, elem: Type) -> Self { Self::Array {len, elem: Box::new(elem)} }
    pub fn slice(elem: Type) -> Self { Self::Slice(Box::new(elem)) }
    pub fn map(key: Type, value: Type) -> Self { Self::Map {key: Box::new(key), value: Box::new(value)} }
    pub fn pointer(elem: Type) -> Self { Self::Pointer(Box::new(elem)) }

    /// Declare a type called `module.name`.
    pub fn named(module: &str, name: &str, underlying: Type) -> Self {
        Self::Named {module: Some(module.into()), name: name.into(), underlying: Box::new(underlying)}
    }

    /// Strips all `Named` wrappers.
    pub fn underlying(&self) -> &Type {
        let mut t = self;
        while let Self::Named {underlying, ..} = t { t = underlying; }
        t
    }

    pub fn kind(&self) -> Kind {
        match self.underlying() {
            Self::Bool => Kind::Bool,
            Self::Int => Kind::Int,
            Self::Int8 => Kind::Int8,
            Self::Int16 => Kind::Int16,
            Self::Int32 => Kind::Int32,
            Self::Int64 => Kind::Int64,
            Self::Uint => Kind::Uint,
            Self::Uint8 => Kind::Uint8,
            Self::Uint16 => Kind::Uint16,
            Self::Uint32 => Kind::Uint32,
            Self::Uint64 => Kind::Uint64,
            Self::Uintptr => Kind::Uintptr,
            Self::Float32 => Kind::Float32,
            Self::Float64 => Kind::Float64,
            Self::Complex64 => Kind::Complex64,
            Self::Complex128 => Kind::Complex128,
            Self::String => Kind::String,
            Self::Array {..} => Kind::Array,
            Self::Slice(_) => Kind::Slice,
            Self::Map {..} => Kind::Map,
            Self::Struct(_) => Kind::Struct,
            Self::Pointer(_) => Kind::Pointer,
            Self::Interface => Kind::Interface,
            Self::Func => Kind::Func,
            Self::Chan(_) => Kind::Chan,
            Self::UnsafePointer => Kind::UnsafePointer,
            Self::Named {..} => unreachable!("`underlying()` strips names"),
        }
    }
}

impl fmt::Display for Type {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Self::Array {len, elem} => write!(f, "[{}]{}", len, elem),
            Self::Slice(elem) => write!(f, "[]{}", elem),
            Self::Map {key, value} => write!(f, "map[{}]{}", key, value),
            Self::Struct(fields) => {
                if fields.is_empty() { return f.write_str("struct {}"); }
                f.write_str("struct {")?;
                let mut sep = " ";
                for field in fields {
                    write!(f, "{}{} {}", sep, field.name, field.type_)?;
                    sep = "; ";
                }
                f.write_str(" }")
            },
            Self::Pointer(elem) => write!(f, "*{}", elem),
            Self::Interface => f.write_str("interface {}"),
            Self::Func => f.write_str("func()"),
            Self::Chan(elem) => write!(f, "chan {}", elem),
            Self::Named {module: Some(module), name, ..} => write!(f, "{}.{}", module, name),
            Self::Named {module: None, name, ..} => f.write_str(name),
            _ => f.write_str(self.kind().name()),
        }
    }
}

// ----------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn spelling() {
        let point = Type::named("geo", "Point", Type::Struct(vec![
            Field::new("X", Type::Float64),
            Field::new("Y", Type::Float64),
        ]));
        assert_eq!(point.to_string(), "geo.Point");
        assert_eq!(point.kind(), Kind::Struct);
        assert_eq!(Type::array(3, Type::Int).to_string(), "[3]int");
        assert_eq!(Type::slice(Type::pointer(point)).to_string(), "[]*geo.Point");
        assert_eq!(Type::map(Type::String, Type::Interface).to_string(), "map[string]interface {}");
        assert_eq!(
            Type::Struct(vec![Field::new("A", Type::Int), Field::new("B", Type::String)]).to_string(),
            "struct { A int; B string }",
        );
        assert_eq!(Type::Struct(vec![]).to_string(), "struct {}");
        assert_eq!(Type::Chan(Box::new(Type::Bool)).to_string(), "chan bool");
    }

    #[test]
    fn deserialize() {
        let t: Type = serde_json::from_str(r#"{"map": {"key": "string", "value": {"pointer": "uint8"}}}"#).unwrap();
        assert_eq!(t, Type::map(Type::String, Type::pointer(Type::Uint8)));
        let t: Type = serde_json::from_str(r#"{"named": {"module": "os", "name": "File", "underlying": {"struct": []}}}"#).unwrap();
        assert_eq!(t.to_string(), "os.File");
    }
}
