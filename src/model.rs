use std::{fmt};
use std::rc::{Rc};
use std::cell::{RefCell};

/// Represents a name bound in a [`Scope`](crate::Scope).
pub type Name = Rc<str>;

/// Represents a map from `Name` to `T`.
///
/// Ordered, so that everything generated from a scope is reproducible.
pub type Map<T> = std::collections::BTreeMap<Name, T>;

/// Represents a set of `Name`s.
pub type Set = std::collections::BTreeSet<Name>;

/// Returns `true` if `name` is visible outside the module that declares it.
///
/// A name is exported if it begins with an upper-case letter.
pub fn is_exported(name: &str) -> bool {
    name.chars().next().map_or(false, char::is_uppercase)
}

// ----------------------------------------------------------------------------

/// A piece of storage that can be shared by several [`Value`]s.
///
/// [`Data::Pointer`] refers to a `Cell`. A `Cell` may (indirectly) contain a
/// pointer to itself.
pub type Cell = Rc<RefCell<Value>>;

/// Identifies a [`Cell`] by its address.
///
/// Two pointers with equal `Identity`s refer to the same storage, and must
/// still do so after the snapshot is rebuilt.
#[derive(Debug, Copy, Clone, Hash, PartialEq, Eq, PartialOrd, Ord)]
pub struct Identity(usize);

impl Identity {
    /// Returns the `Identity` of `cell`. Only meaningful while `cell` is alive.
    pub fn of(cell: &Cell) -> Self { Self(Rc::as_ptr(cell) as *const () as usize) }
}

impl fmt::Display for Identity {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{:#x}", self.0)
    }
}

// ----------------------------------------------------------------------------

mod types;
pub use types::{Kind, Type, Field};

mod repr;
pub use repr::{Value, Data};
