//! Converts run-time [`Value`]s into source text that recreates them.
//!
//! Every expression produced here is either a composite literal or
//! addressable, so that it can be the operand of `&`. Scalars are therefore
//! written as `[]T{v}[0]`, which also fixes their type.
//!
//! Pointers cannot be written inline: every pointer to the same storage must
//! still share storage after the rebuild, and the storage may belong to an
//! already-loaded module. Each pointer target is therefore declared once, as
//! an auxiliary variable recorded in an [`AliasTable`], and referred to by
//! name.

use std::cell::{Ref};

use thiserror::Error;
use tracing::{trace};

use super::model::{Data, Identity, Kind, Name, Type, Value};
use super::alias::{AliasTable};

mod numeral;
pub use numeral::{quote};

/// Reasons why a [`Value`] cannot be written as source text.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum EncodeError {
    #[error("{0} values cannot be represented as source")]
    Unrepresentable(Kind),

    #[error("struct {type_} has private field '{field}'")]
    PrivateField {type_: String, field: Name},

    #[error("pointer to {0} leads back to itself")]
    AliasCycle(Identity),

    #[error("array {type_} has {found} elements, not {expected}")]
    ArrayLength {type_: String, expected: usize, found: usize},

    #[error("struct {type_} has {found} field values, not {expected}")]
    FieldCount {type_: String, expected: usize, found: usize},
}

/// Returns an expression which evaluates to `value`.
///
/// Declarations for any pointer targets are added to `table`. If `value`
/// cannot be represented, `table` is left as it was.
pub fn encode(value: &Value, table: &mut AliasTable) -> Result<String, EncodeError> {
    let checkpoint = table.checkpoint();
    let ret = sprint(value, table);
    if ret.is_err() { table.rollback(checkpoint); }
    ret
}

/// Wraps `untyped` so that it has type `t` and is addressable.
fn typed(t: &Type, untyped: &str) -> String { format!("[]{}{{{}}}[0]", t, untyped) }

/// The zero value of `t`, for the kinds whose zero value is nil.
fn nil(t: &Type) -> String { format!("*new({})", t) }

/// Returns an expression for a pointer to fresh storage holding `value`,
/// given `literal`, its encoding.
///
/// A pointer encodes to a shared name, whose address must not be taken:
/// two places holding the same pointer are still two places.
pub fn address(value: &Value, literal: &str) -> String {
    if let Data::Pointer(Some(_)) = value.data {
        format!("&{}", typed(&value.type_, literal))
    } else {
        format!("&{}", literal)
    }
}

/// Spells a composite literal of type `t` from already-spelled `elements`.
fn composite(t: &Type, elements: impl IntoIterator<Item=String>) -> String {
    let elements: Vec<String> = elements.into_iter().collect();
    format!("{}{{{}}}", t, elements.join(", "))
}

/// Spells each of `values`.
fn sprint_all(values: &[Value], table: &mut AliasTable) -> Result<Vec<String>, EncodeError> {
    values.iter().map(|v| sprint(v, table)).collect()
}

fn sprint(value: &Value, table: &mut AliasTable) -> Result<String, EncodeError> {
    let t = &value.type_;
    let untyped = match &value.data {
        Data::Bool(b) => b.to_string(),
        Data::Int(i) => i.to_string(),
        Data::Uint(u) => u.to_string(),
        Data::Float(x) => numeral::float(*x, t, table),
        Data::Complex(re, im) => numeral::complex(*re, *im, t, table),
        Data::Str(s) => quote(s),
        Data::Array(elements) => {
            let expected = match t.underlying() {
                Type::Array {len, ..} => *len,
                _ => elements.len(),
            };
            if elements.len() != expected {
                return Err(EncodeError::ArrayLength {type_: t.to_string(), expected, found: elements.len()});
            }
            return Ok(composite(t, sprint_all(elements, table)?));
        },
        Data::Slice(None) | Data::Map(None) | Data::Pointer(None) | Data::Interface(None) => {
            return Ok(nil(t));
        },
        Data::Slice(Some(elements)) => {
            return Ok(composite(t, sprint_all(elements, table)?));
        },
        Data::Map(Some(pairs)) => {
            let mut pairs: Vec<&(Value, Value)> = pairs.iter().collect();
            pairs.sort_by(|(k1, _), (k2, _)| k1.key_order(k2));
            let mut entries = Vec::with_capacity(pairs.len());
            for (k, v) in pairs {
                let k = sprint(k, table)?;
                let v = sprint(v, table)?;
                entries.push(format!("{}: {}", k, v));
            }
            return Ok(composite(t, entries));
        },
        Data::Struct(values) => {
            let Type::Struct(fields) = t.underlying() else {
                return Err(EncodeError::Unrepresentable(t.kind()));
            };
            if let Some(field) = fields.iter().find(|field| !field.is_exported()) {
                return Err(EncodeError::PrivateField {type_: t.to_string(), field: field.name.clone()});
            }
            if values.len() != fields.len() {
                return Err(EncodeError::FieldCount {type_: t.to_string(), expected: fields.len(), found: values.len()});
            }
            let mut entries = Vec::with_capacity(fields.len());
            for (field, v) in fields.iter().zip(values.iter()) {
                entries.push(format!("{}: {}", field.name, sprint(v, table)?));
            }
            return Ok(composite(t, entries));
        },
        Data::Pointer(Some(cell)) => {
            let id = Identity::of(cell);
            if let Some(name) = table.lookup(id) { return Ok(name.to_string()); }
            let name = table.mint(id)?;
            let pointee: Ref<Value> = cell.borrow();
            let literal = sprint(&pointee, table)?;
            trace!(%name, %literal, "declared pointer target");
            table.record(id, name.clone(), typed(t, &address(&pointee, &literal)));
            return Ok(name.to_string());
        },
        Data::Interface(Some(held)) => sprint(held, table)?,
        Data::Opaque => return Err(EncodeError::Unrepresentable(t.kind())),
    };
    Ok(typed(t, &untyped))
}

// ----------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Field};

    fn point() -> Type {
        Type::named("geo", "Point", Type::Struct(vec![
            Field::new("X", Type::Int),
            Field::new("Y", Type::Int),
        ]))
    }

    #[test]
    fn scalars() {
        let mut table = AliasTable::new();
        assert_eq!(encode(&Value::bool(true), &mut table).unwrap(), "[]bool{true}[0]");
        assert_eq!(encode(&Value::int(-7), &mut table).unwrap(), "[]int{-7}[0]");
        let byte = Value::new(Type::Uint8, Data::Uint(255));
        assert_eq!(encode(&byte, &mut table).unwrap(), "[]uint8{255}[0]");
        let big = Value::new(Type::Uint64, Data::Uint(u64::MAX));
        assert_eq!(encode(&big, &mut table).unwrap(), "[]uint64{18446744073709551615}[0]");
        let min = Value::new(Type::Int64, Data::Int(i64::MIN));
        assert_eq!(encode(&min, &mut table).unwrap(), "[]int64{-9223372036854775808}[0]");
        assert_eq!(encode(&Value::float(1.4), &mut table).unwrap(), "[]float64{1.4}[0]");
        let c = Value::new(Type::Complex128, Data::Complex(2.0, 0.0));
        assert_eq!(encode(&c, &mut table).unwrap(), "[]complex128{(2.0+0.0i)}[0]");
        assert_eq!(encode(&Value::string("abc"), &mut table).unwrap(), "[]string{\"abc\"}[0]");
        assert!(table.auxiliaries().is_empty());
    }

    #[test]
    fn composites() {
        let mut table = AliasTable::new();
        let array = Value::new(Type::array(2, Type::Int), Data::Array(vec![Value::int(1), Value::int(2)].into()));
        assert_eq!(encode(&array, &mut table).unwrap(), "[2]int{[]int{1}[0], []int{2}[0]}");
        let p = Value::structure(point(), vec![Value::int(1), Value::int(2)]);
        assert_eq!(encode(&p, &mut table).unwrap(), "geo.Point{X: []int{1}[0], Y: []int{2}[0]}");
        let m = Value::map(Type::String, Type::Int, vec![
            (Value::string("b"), Value::int(2)),
            (Value::string("a"), Value::int(1)),
        ]);
        assert_eq!(
            encode(&m, &mut table).unwrap(),
            "map[string]int{[]string{\"a\"}[0]: []int{1}[0], []string{\"b\"}[0]: []int{2}[0]}",
        );
    }

    #[test]
    fn nil_distinctions() {
        let mut table = AliasTable::new();
        let nil_slice = Value::zero(&Type::slice(Type::Int));
        let empty_slice = Value::slice(Type::Int, vec![]);
        let nil_map = Value::zero(&Type::map(Type::String, Type::Int));
        let empty_map = Value::map(Type::String, Type::Int, vec![]);
        let nil_slice = encode(&nil_slice, &mut table).unwrap();
        let empty_slice = encode(&empty_slice, &mut table).unwrap();
        let nil_map = encode(&nil_map, &mut table).unwrap();
        let empty_map = encode(&empty_map, &mut table).unwrap();
        assert_eq!(nil_slice, "*new([]int)");
        assert_eq!(empty_slice, "[]int{}");
        assert_eq!(nil_map, "*new(map[string]int)");
        assert_eq!(empty_map, "map[string]int{}");
        assert_eq!(encode(&Value::zero(&Type::Interface), &mut table).unwrap(), "*new(interface {})");
        assert_eq!(encode(&Value::zero(&Type::pointer(Type::Int)), &mut table).unwrap(), "*new(*int)");
    }

    #[test]
    fn array_length() {
        let mut table = AliasTable::new();
        let short = Value::new(Type::array(3, Type::Int), Data::Array(vec![Value::int(1)].into()));
        assert_eq!(
            encode(&short, &mut table),
            Err(EncodeError::ArrayLength {type_: "[3]int".into(), expected: 3, found: 1}),
        );
    }

    #[test]
    fn private_field() {
        let t = Type::named("geo", "secret", Type::Struct(vec![
            Field::new("Public", Type::Int),
            Field::new("hidden", Type::Int),
        ]));
        let v = Value::structure(t, vec![Value::int(1), Value::int(2)]);
        let mut table = AliasTable::new();
        assert_eq!(
            encode(&v, &mut table),
            Err(EncodeError::PrivateField {type_: "geo.secret".into(), field: "hidden".into()}),
        );
    }

    #[test]
    fn field_count() {
        let short = Value::structure(point(), vec![Value::int(1)]);
        let mut table = AliasTable::new();
        assert_eq!(
            encode(&short, &mut table),
            Err(EncodeError::FieldCount {type_: "geo.Point".into(), expected: 2, found: 1}),
        );
        let long = Value::structure(point(), vec![Value::int(1), Value::int(2), Value::int(3)]);
        assert_eq!(
            encode(&long, &mut table),
            Err(EncodeError::FieldCount {type_: "geo.Point".into(), expected: 2, found: 3}),
        );
    }

    #[test]
    fn unrepresentable() {
        let mut table = AliasTable::new();
        let f = Value::zero(&Type::Func);
        assert_eq!(encode(&f, &mut table), Err(EncodeError::Unrepresentable(Kind::Func)));
        let c = Value::zero(&Type::Chan(Box::new(Type::Int))).boxed();
        assert_eq!(encode(&c, &mut table), Err(EncodeError::Unrepresentable(Kind::Chan)));
    }

    #[test]
    fn shared_pointer() {
        let x = Value::int(5).into_cell();
        let a = Value::pointer_to(&x);
        let b = a.clone();
        let mut table = AliasTable::new();
        assert_eq!(encode(&a, &mut table).unwrap(), "ptr0");
        assert_eq!(encode(&b, &mut table).unwrap(), "ptr0");
        assert_eq!(table.auxiliaries(), &[(Name::from("ptr0"), "[]*int{&[]int{5}[0]}[0]".to_string())]);
    }

    #[test]
    fn slice_of_shared_pointers() {
        let s = Value::structure(point(), vec![Value::int(1), Value::int(2)]).into_cell();
        let p = Value::pointer_to(&s);
        let v = Value::slice(Type::pointer(point()), vec![p.clone(), p.clone(), p]);
        let mut table = AliasTable::new();
        assert_eq!(encode(&v, &mut table).unwrap(), "[]*geo.Point{ptr0, ptr0, ptr0}");
        assert_eq!(table.auxiliaries().len(), 1);
        assert_eq!(table.auxiliaries()[0].1, "[]*geo.Point{&geo.Point{X: []int{1}[0], Y: []int{2}[0]}}[0]");
    }

    #[test]
    fn nested_pointers() {
        let x = Value::int(1).into_cell();
        let p = Value::pointer_to(&x).into_cell();
        let pp = Value::pointer_to(&p);
        let mut table = AliasTable::new();
        assert_eq!(encode(&pp, &mut table).unwrap(), "ptr0");
        // The inner target is completed, and so declared, first.
        let names: Vec<&str> = table.auxiliaries().iter().map(|(name, _)| &**name).collect();
        assert_eq!(names, ["ptr1", "ptr0"]);
        assert_eq!(table.auxiliaries()[1].1, "[]**int{&[]*int{ptr1}[0]}[0]");
    }

    #[test]
    fn distinct_cells_holding_one_pointer() {
        let x = Value::int(1).into_cell();
        let p = Value::pointer_to(&x).into_cell();
        let q = Value::pointer_to(&x).into_cell();
        let (pp, pq) = (Value::pointer_to(&p), Value::pointer_to(&q));
        let mut table = AliasTable::new();
        assert_eq!(encode(&pp, &mut table).unwrap(), "ptr0");
        assert_eq!(encode(&pq, &mut table).unwrap(), "ptr2");
        assert_eq!(table.auxiliaries(), &[
            (Name::from("ptr1"), "[]*int{&[]int{1}[0]}[0]".to_string()),
            (Name::from("ptr0"), "[]**int{&[]*int{ptr1}[0]}[0]".to_string()),
            (Name::from("ptr2"), "[]**int{&[]*int{ptr1}[0]}[0]".to_string()),
        ]);
        assert!(table.auxiliaries().iter().all(|(_, decl)| !decl.contains("&ptr")));
    }

    #[test]
    fn fresh_storage() {
        let x = Value::int(1).into_cell();
        assert_eq!(super::address(&Value::int(1), "[]int{1}[0]"), "&[]int{1}[0]");
        assert_eq!(super::address(&Value::pointer_to(&x), "ptr0"), "&[]*int{ptr0}[0]");
        let nil = Value::zero(&Type::pointer(Type::Int));
        assert_eq!(super::address(&nil, "*new(*int)"), "&*new(*int)");
    }

    #[test]
    fn seeded_pointer() {
        let stdout = Value::zero(&Type::named("os", "File", Type::Struct(vec![]))).into_cell();
        let mut table = AliasTable::new();
        table.seed(Identity::of(&stdout), "os.Stdout");
        let p = Value::pointer_to(&stdout);
        assert_eq!(encode(&p, &mut table).unwrap(), "os.Stdout");
        assert_eq!(encode(&p.clone().boxed(), &mut table).unwrap(), "[]interface {}{os.Stdout}[0]");
        assert!(table.auxiliaries().is_empty());
    }

    #[test]
    fn seeded_pointer_in_cell() {
        let file = Type::named("os", "File", Type::Struct(vec![]));
        let stdout = Value::zero(&file).into_cell();
        let mut table = AliasTable::new();
        table.seed(Identity::of(&stdout), "os.Stdout");
        let holder = Value::pointer_to(&stdout).into_cell();
        assert_eq!(encode(&Value::pointer_to(&holder), &mut table).unwrap(), "ptr0");
        assert_eq!(table.auxiliaries(), &[
            (Name::from("ptr0"), "[]**os.File{&[]*os.File{os.Stdout}[0]}[0]".to_string()),
        ]);
    }

    #[test]
    fn interface_and_pointer_share() {
        let y = Value::int(3).into_cell();
        let p = Value::pointer_to(&y);
        let i = p.clone().boxed();

        let mut table = AliasTable::new();
        assert_eq!(encode(&i, &mut table).unwrap(), "[]interface {}{ptr0}[0]");
        assert_eq!(encode(&p, &mut table).unwrap(), "ptr0");

        let mut table = AliasTable::new();
        assert_eq!(encode(&p, &mut table).unwrap(), "ptr0");
        assert_eq!(encode(&i, &mut table).unwrap(), "[]interface {}{ptr0}[0]");
        assert_eq!(table.auxiliaries().len(), 1);
    }

    #[test]
    fn alias_cycle() {
        let node = Type::named("main", "Node", Type::Interface);
        let cell = Value::zero(&node).into_cell();
        let looped = Value::pointer_to(&cell);
        cell.borrow_mut().data = Data::Interface(Some(Box::new(looped.clone())));
        let mut table = AliasTable::new();
        assert!(matches!(encode(&looped, &mut table), Err(EncodeError::AliasCycle(_))));
        // Nothing is left half-declared.
        assert!(table.auxiliaries().is_empty());
        assert_eq!(table.lookup(Identity::of(&cell)), None);
        assert!(!table.is_pending(Identity::of(&cell)));
    }

    #[test]
    fn failure_rolls_back() {
        let x = Value::int(1).into_cell();
        let f = Value::zero(&Type::Func);
        let t = Type::Struct(vec![Field::new("P", Type::pointer(Type::Int)), Field::new("F", Type::Func)]);
        let v = Value::structure(t, vec![Value::pointer_to(&x), f]);
        let mut table = AliasTable::new();
        assert!(encode(&v, &mut table).is_err());
        assert!(table.auxiliaries().is_empty());
        assert_eq!(encode(&Value::pointer_to(&x), &mut table).unwrap(), "ptr0");
    }

    #[test]
    fn pointer_map_keys() {
        let a = Value::string("a").into_cell();
        let b = Value::string("b").into_cell();
        let m = Value::map(Type::pointer(Type::String), Type::Bool, vec![
            (Value::pointer_to(&b), Value::bool(false)),
            (Value::pointer_to(&a), Value::bool(true)),
        ]);
        let mut table = AliasTable::new();
        assert_eq!(
            encode(&m, &mut table).unwrap(),
            "map[*string]bool{ptr0: []bool{true}[0], ptr1: []bool{false}[0]}",
        );
        assert_eq!(table.auxiliaries()[0].1, "[]*string{&[]string{\"a\"}[0]}[0]");
    }
}
