//! Lists the exported names of a module from its source directory.

use std::{fs, io};
use std::collections::{BTreeMap};
use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::{debug};

use super::model::{is_exported, Name, Set};
use super::scope::{Candidate, StaticScope};

mod scan;
pub use scan::{scan, Declarations};

/// Reasons why a module cannot be imported.
#[derive(Error, Debug)]
pub enum ImportError {
    #[error("import path `{0}` is empty, not ASCII, or has a blank segment")]
    BadPath(String),

    #[error("import path `{0}` is absolute")]
    Absolute(String),

    #[error("cannot find `{path}` in any of {tried:?}")]
    NotFound {path: String, tried: Vec<PathBuf>},

    #[error("no source files in {0}")]
    NoSource(PathBuf),

    #[error("found modules {first} and {second} in {dir}")]
    MultipleModules {dir: PathBuf, first: Candidate, second: Candidate},

    #[error(transparent)]
    Io(#[from] io::Error),
}

/// Returns `true` if `path` names a source file that belongs to the module.
fn is_source(path: &Path, extension: &str) -> bool {
    let Some(stem) = path.file_stem().and_then(|s| s.to_str()) else { return false };
    path.is_file()
        && path.extension().map_or(false, |e| e == extension)
        && !stem.ends_with("_test")
}

fn add_exported(set: &mut Set, names: Vec<Name>) {
    set.extend(names.into_iter().filter(|n| is_exported(n)));
}

/// Scans the source files in `dir` and collects the names they export.
///
/// Files whose names end in `_test` are ignored. All the remaining files must
/// agree on the module name. The returned `StaticScope` has `path` set to
/// `dir`; callers that know the import path should overwrite it.
pub fn import_dir(dir: &Path, extension: &str) -> Result<StaticScope, ImportError> {
    let mut paths = Vec::new();
    for entry in fs::read_dir(dir)? {
        let path = entry?.path();
        if is_source(&path, extension) { paths.push(path); }
    }
    paths.sort();
    // Group the files by module name.
    let mut modules: BTreeMap<String, Vec<(String, Declarations)>> = BTreeMap::new();
    for path in paths {
        let source = fs::read_to_string(&path)?;
        let declarations = scan(&source);
        let file = path.file_name().map_or(String::new(), |f| f.to_string_lossy().into_owned());
        debug!(%file, module = ?declarations.module, "scanned");
        let module = declarations.module.clone().unwrap_or_default();
        modules.entry(module).or_default().push((file, declarations));
    }
    let mut modules = modules.into_iter();
    let Some((name, files)) = modules.next() else {
        return Err(ImportError::NoSource(dir.into()));
    };
    if let Some((other, other_files)) = modules.next() {
        return Err(ImportError::MultipleModules {
            dir: dir.into(),
            first: Candidate {label: name, files: vec![files[0].0.clone()]},
            second: Candidate {label: other, files: vec![other_files[0].0.clone()]},
        });
    }
    let mut ret = StaticScope::new(&name, &dir.to_string_lossy());
    for (file, declarations) in files {
        add_exported(&mut ret.variables, declarations.variables);
        add_exported(&mut ret.constants, declarations.constants);
        add_exported(&mut ret.functions, declarations.functions);
        add_exported(&mut ret.types, declarations.types);
        ret.files.push(file);
    }
    Ok(ret)
}

// ----------------------------------------------------------------------------
