pub mod model;
pub use model::{Name, Map, Set, Cell, Identity, Kind, Type, Field, Value, Data};

mod alias;
pub use alias::{AliasTable, Checkpoint};

pub mod literal;
pub use literal::{encode, quote, EncodeError};

mod scope;
pub use scope::{Scope, StaticScope, Candidate};

mod snapshot;
pub use snapshot::{snapshot, write_env, Document, Layout, Snapshot, Warning, WriteError};

pub mod importer;
pub use importer::{import_dir, ImportError};

mod quine;
pub use quine::{clean_import, find_import, import, quine, write_program, QuineError, ResolvedImport};

mod session;
pub use session::{Session, SessionError};

mod config;
pub use config::{Config, ConfigError};

// ----------------------------------------------------------------------------
