use std::{fmt};
use std::rc::{Rc};
use std::cell::{RefCell};
use std::cmp::{Ordering};

use super::{Cell, Identity, Type};

/// How deep [`Value::key_order()`] follows pointers before giving up.
const KEY_ORDER_DEPTH: usize = 16;

/// The run-time representation of a [`Value`], without its type.
#[derive(Clone)]
pub enum Data {
    Bool(bool),

    /// Any signed integer kind.
    Int(i64),

    /// Any unsigned integer kind, including `uintptr`.
    Uint(u64),

    /// Either floating-point kind.
    Float(f64),

    /// Either complex kind, as `(real, imaginary)`.
    Complex(f64, f64),

    Str(Rc<str>),

    Array(Rc<[Value]>),

    /// `None` represents a nil slice, which is not the same as an empty one.
    Slice(Option<Rc<[Value]>>),

    /// `None` represents a nil map. The pairs are in no particular order.
    Map(Option<Rc<[(Value, Value)]>>),

    /// One `Value` per field of the `Struct` type, in declaration order.
    Struct(Rc<[Value]>),

    /// `None` represents a nil pointer.
    Pointer(Option<Cell>),

    /// `None` represents a nil interface. Otherwise the held `Value` carries
    /// its own dynamic type.
    Interface(Option<Box<Value>>),

    /// A function, channel or other live handle. Has no literal form.
    Opaque,
}

/// A typed run-time value, as found in an evaluator's scope.
#[derive(Clone)]
pub struct Value {
    pub type_: Type,
    pub data: Data,
}

impl Value {
    pub fn new(type_: Type, data: Data) -> Self { Self {type_, data} }

    pub fn bool(b: bool) -> Self { Self::new(Type::Bool, Data::Bool(b)) }
    pub fn int(i: i64) -> Self { Self::new(Type::Int, Data::Int(i)) }
    pub fn float(x: f64) -> Self { Self::new(Type::Float64, Data::Float(x)) }
    pub fn string(s: &str) -> Self { Self::new(Type::String, Data::Str(s.into())) }

    /// Constructs a non-nil slice of `elem`s.
    pub fn slice(elem: Type, values: Vec<Value>) -> Self {
        Self::new(Type::slice(elem), Data::Slice(Some(values.into())))
    }

    /// Constructs a non-nil map.
    pub fn map(key: Type, value: Type, pairs: Vec<(Value, Value)>) -> Self {
        Self::new(Type::map(key, value), Data::Map(Some(pairs.into())))
    }

    /// Constructs a `Struct` value with type `type_`.
    pub fn structure(type_: Type, fields: Vec<Value>) -> Self {
        Self::new(type_, Data::Struct(fields.into()))
    }

    /// Moves `self` into a fresh [`Cell`].
    pub fn into_cell(self) -> Cell { Rc::new(RefCell::new(self)) }

    /// Constructs a pointer to `cell`, typed by the current contents of `cell`.
    pub fn pointer_to(cell: &Cell) -> Self {
        let type_ = Type::pointer(cell.borrow().type_.clone());
        Self::new(type_, Data::Pointer(Some(cell.clone())))
    }

    /// Wraps `self` in an empty interface.
    pub fn boxed(self) -> Self {
        Self::new(Type::Interface, Data::Interface(Some(Box::new(self))))
    }

    /// The zero value of `type_`: `false`, `0`, `""`, nil, or a composite of
    /// zero values.
    pub fn zero(type_: &Type) -> Self {
        let data = match type_.underlying() {
            Type::Bool => Data::Bool(false),
            Type::Int | Type::Int8 | Type::Int16 | Type::Int32 | Type::Int64 => Data::Int(0),
            Type::Uint | Type::Uint8 | Type::Uint16 | Type::Uint32 | Type::Uint64 | Type::Uintptr => Data::Uint(0),
            Type::Float32 | Type::Float64 => Data::Float(0.0),
            Type::Complex64 | Type::Complex128 => Data::Complex(0.0, 0.0),
            Type::String => Data::Str("".into()),
            Type::Array {len, elem} => {
                Data::Array((0..*len).map(|_| Self::zero(elem)).collect())
            },
            Type::Slice(_) => Data::Slice(None),
            Type::Map {..} => Data::Map(None),
            Type::Struct(fields) => {
                Data::Struct(fields.iter().map(|field| Self::zero(&field.type_)).collect())
            },
            Type::Pointer(_) => Data::Pointer(None),
            Type::Interface => Data::Interface(None),
            Type::Func | Type::Chan(_) | Type::UnsafePointer => Data::Opaque,
            Type::Named {..} => unreachable!("`underlying()` strips names"),
        };
        Self::new(type_.clone(), data)
    }

    /// A total order used to enumerate map keys reproducibly.
    ///
    /// Values of different representations are ordered by representation.
    /// Floats use their total order. Pointers compare by what they point to,
    /// up to a fixed depth, after which they compare equal.
    pub fn key_order(&self, other: &Value) -> Ordering {
        order(self, other, KEY_ORDER_DEPTH)
    }
}

/// Ranks the representations for [`Value::key_order()`].
fn rank(data: &Data) -> u8 {
    match data {
        Data::Interface(None) => 0,
        Data::Bool(_) => 1,
        Data::Int(_) => 2,
        Data::Uint(_) => 3,
        Data::Float(_) => 4,
        Data::Complex(..) => 5,
        Data::Str(_) => 6,
        Data::Array(_) | Data::Struct(_) => 7,
        Data::Slice(_) => 8,
        Data::Map(_) => 9,
        Data::Pointer(_) => 10,
        Data::Opaque => 11,
        Data::Interface(Some(_)) => unreachable!("held values are unwrapped first"),
    }
}

fn order(a: &Value, b: &Value, depth: usize) -> Ordering {
    if let Data::Interface(Some(a)) = &a.data { return order(a, b, depth); }
    if let Data::Interface(Some(b)) = &b.data { return order(a, b, depth); }
    match (&a.data, &b.data) {
        (Data::Bool(x), Data::Bool(y)) => x.cmp(y),
        (Data::Int(x), Data::Int(y)) => x.cmp(y),
        (Data::Uint(x), Data::Uint(y)) => x.cmp(y),
        (Data::Float(x), Data::Float(y)) => x.total_cmp(y),
        (Data::Complex(xr, xi), Data::Complex(yr, yi)) => xr.total_cmp(yr).then(xi.total_cmp(yi)),
        (Data::Str(x), Data::Str(y)) => x.cmp(y),
        (Data::Array(xs), Data::Array(ys)) | (Data::Struct(xs), Data::Struct(ys)) => {
            order_all(xs, ys, depth)
        },
        (Data::Slice(xs), Data::Slice(ys)) => match (xs, ys) {
            (Some(xs), Some(ys)) => order_all(xs, ys, depth),
            _ => xs.is_some().cmp(&ys.is_some()),
        },
        (Data::Pointer(x), Data::Pointer(y)) => match (x, y) {
            (Some(x), Some(y)) => {
                if depth == 0 || Rc::ptr_eq(x, y) { return Ordering::Equal; }
                order(&x.borrow(), &y.borrow(), depth - 1)
            },
            _ => x.is_some().cmp(&y.is_some()),
        },
        (x, y) => rank(x).cmp(&rank(y)),
    }
}

fn order_all(xs: &[Value], ys: &[Value], depth: usize) -> Ordering {
    for (x, y) in xs.iter().zip(ys.iter()) {
        match order(x, y, depth) {
            Ordering::Equal => {},
            ret => return ret,
        }
    }
    xs.len().cmp(&ys.len())
}

// ----------------------------------------------------------------------------

impl fmt::Debug for Value {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}(", self.type_)?;
        match &self.data {
            Data::Bool(b) => write!(f, "{}", b)?,
            Data::Int(i) => write!(f, "{}", i)?,
            Data::Uint(u) => write!(f, "{}", u)?,
            Data::Float(x) => write!(f, "{:?}", x)?,
            Data::Complex(re, im) => write!(f, "{:?}{:+?}i", re, im)?,
            Data::Str(s) => write!(f, "{:?}", s)?,
            Data::Array(values) | Data::Struct(values) => write!(f, "{:?}", values)?,
            Data::Slice(values) => write!(f, "{:?}", values)?,
            Data::Map(pairs) => write!(f, "{:?}", pairs)?,
            // Do not follow pointers, which might be cyclic.
            Data::Pointer(Some(cell)) => write!(f, "&{}", Identity::of(cell))?,
            Data::Pointer(None) | Data::Interface(None) => f.write_str("nil")?,
            Data::Interface(Some(value)) => write!(f, "{:?}", value)?,
            Data::Opaque => f.write_str("..")?,
        }
        f.write_str(")")
    }
}

// ----------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use super::super::{Field};

    #[test]
    fn zero() {
        let t = Type::Struct(vec![
            Field::new("N", Type::Int),
            Field::new("L", Type::slice(Type::Int)),
            Field::new("A", Type::array(2, Type::String)),
        ]);
        let Data::Struct(fields) = Value::zero(&t).data else { panic!("Not a struct"); };
        assert!(matches!(fields[0].data, Data::Int(0)));
        assert!(matches!(fields[1].data, Data::Slice(None)));
        let Data::Array(elems) = &fields[2].data else { panic!("Not an array"); };
        assert_eq!(elems.len(), 2);
    }

    #[test]
    fn key_order() {
        assert_eq!(Value::int(-3).key_order(&Value::int(2)), Ordering::Less);
        assert_eq!(Value::string("b").key_order(&Value::string("a")), Ordering::Greater);
        assert_eq!(Value::float(f64::NAN).key_order(&Value::float(1.0)), Ordering::Greater);
        // Interfaces compare by what they hold.
        assert_eq!(Value::int(1).boxed().key_order(&Value::int(1)), Ordering::Equal);
        assert_eq!(Value::bool(true).boxed().key_order(&Value::string("")), Ordering::Less);
        // Pointers compare by their targets.
        let one = Value::int(1).into_cell();
        let two = Value::int(2).into_cell();
        assert_eq!(Value::pointer_to(&two).key_order(&Value::pointer_to(&one)), Ordering::Greater);
    }

    #[test]
    fn key_order_cycle() {
        let t = Type::named("main", "Node", Type::pointer(Type::Interface));
        let cell = Value::zero(&t).into_cell();
        let looped = Value::new(Type::pointer(t.clone()), Data::Pointer(Some(cell.clone())));
        cell.borrow_mut().data = Data::Pointer(Some(cell.clone()));
        let other = Value::zero(&t).into_cell();
        other.borrow_mut().data = Data::Pointer(Some(other.clone()));
        let also_looped = Value::new(Type::pointer(t), Data::Pointer(Some(other)));
        assert_eq!(looped.key_order(&also_looped), Ordering::Equal);
    }
}
