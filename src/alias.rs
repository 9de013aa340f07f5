//! Bookkeeping for storage shared by more than one reference.

use std::collections::{HashMap};

use tracing::{debug};

use super::model::{Identity, Name};
use super::literal::{EncodeError};

/// The state of an [`Identity`] in an [`AliasTable`].
#[derive(Debug, Clone)]
enum Entry {
    /// A name has been minted, but the pointee is still being encoded.
    Pending(Name),

    /// The name is defined, or is owned by something outside the snapshot.
    Bound(Name),
}

/// Records the state of an [`AliasTable`], so that it can be restored.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct Checkpoint {
    journal: usize,
    auxiliaries: usize,
    imports: usize,
    counter: usize,
}

/// Maps each [`Identity`] to the one name that refers to its storage.
///
/// Also collects the auxiliary declarations that define those names, in the
/// order they were completed, and any modules that the generated literals
/// refer to. Used for one snapshot pass, then discarded.
#[derive(Debug, Default)]
pub struct AliasTable {
    /// The name of each known `Identity`.
    identities: HashMap<Identity, Entry>,

    /// The keys of `identities`, in the order they were added.
    journal: Vec<Identity>,

    /// Top-level declarations `name := literal`, in completion order.
    auxiliaries: Vec<(Name, String)>,

    /// Modules referred to by the generated text, each once.
    imports: Vec<&'static str>,

    /// Used to mint fresh names.
    counter: usize,
}

impl AliasTable {
    pub fn new() -> Self { Self::default() }

    /// Pre-register `id`, whose storage is owned by an already-loaded module
    /// and is spelled `name`. References to `id` will encode to `name`.
    pub fn seed(&mut self, id: Identity, name: impl Into<Name>) {
        if self.identities.insert(id, Entry::Bound(name.into())).is_none() {
            self.journal.push(id);
        }
    }

    /// Returns the name bound to `id`, if any.
    pub fn lookup(&self, id: Identity) -> Option<&Name> {
        match self.identities.get(&id) {
            Some(Entry::Bound(name)) => Some(name),
            _ => None,
        }
    }

    /// Returns `true` if a name has been minted for `id` but not yet recorded.
    pub fn is_pending(&self, id: Identity) -> bool {
        matches!(self.identities.get(&id), Some(Entry::Pending(_)))
    }

    /// Reserves a fresh name for `id` and marks it pending.
    ///
    /// Fails if `id` is already known: if the caller has already looked it
    /// up, that means its storage is still being encoded, i.e. it contains a
    /// reference to itself.
    pub fn mint(&mut self, id: Identity) -> Result<Name, EncodeError> {
        if self.identities.contains_key(&id) { return Err(EncodeError::AliasCycle(id)); }
        let name: Name = format!("ptr{}", self.counter).into();
        self.counter += 1;
        debug!(%id, %name, "minted alias");
        self.identities.insert(id, Entry::Pending(name.clone()));
        self.journal.push(id);
        Ok(name)
    }

    /// Binds `name` to `id` and appends the declaration `name := literal`.
    pub fn record(&mut self, id: Identity, name: Name, literal: String) {
        if self.identities.insert(id, Entry::Bound(name.clone())).is_none() {
            self.journal.push(id);
        }
        self.auxiliaries.push((name, literal));
    }

    /// Notes that the generated text refers to `module`.
    pub fn require(&mut self, module: &'static str) {
        if !self.imports.contains(&module) { self.imports.push(module); }
    }

    pub fn checkpoint(&self) -> Checkpoint {
        Checkpoint {
            journal: self.journal.len(),
            auxiliaries: self.auxiliaries.len(),
            imports: self.imports.len(),
            counter: self.counter,
        }
    }

    /// Forgets everything added since `checkpoint`.
    pub fn rollback(&mut self, checkpoint: Checkpoint) {
        for id in self.journal.drain(checkpoint.journal..) {
            self.identities.remove(&id);
        }
        self.auxiliaries.truncate(checkpoint.auxiliaries);
        self.imports.truncate(checkpoint.imports);
        self.counter = checkpoint.counter;
    }

    /// The auxiliary declarations, in the order they must be emitted.
    pub fn auxiliaries(&self) -> &[(Name, String)] { &self.auxiliaries }

    pub fn imports(&self) -> &[&'static str] { &self.imports }

    /// Returns the auxiliary declarations and the imports.
    pub fn into_parts(self) -> (Vec<(Name, String)>, Vec<&'static str>) {
        (self.auxiliaries, self.imports)
    }
}

// ----------------------------------------------------------------------------
