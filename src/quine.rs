//! Assembles a complete program which rebuilds an environment and hands it to
//! the evaluator's entry point.

use std::{io};
use std::path::{PathBuf};

use thiserror::Error;
use tracing::{debug};

use super::alias::{AliasTable};
use super::config::{Config};
use super::importer::{import_dir, ImportError};
use super::scope::{Scope, StaticScope};
use super::snapshot::{snapshot, Snapshot, Warning, WriteError};

/// Normalises an import path.
///
/// The path must be non-empty ASCII and must not be absolute. Empty segments
/// are dropped and the remaining segments trimmed, but a segment that is
/// nothing but whitespace is an error.
pub fn clean_import(path: &str) -> Result<String, ImportError> {
    if path.is_empty() || !path.is_ascii() { return Err(ImportError::BadPath(path.into())); }
    if path.starts_with('/') { return Err(ImportError::Absolute(path.into())); }
    let mut segments = Vec::new();
    for segment in path.split('/') {
        if segment.is_empty() { continue; }
        let segment = segment.trim_matches([' ', '\n', '\t']);
        if segment.is_empty() { return Err(ImportError::BadPath(path.into())); }
        segments.push(segment);
    }
    if segments.is_empty() { return Err(ImportError::BadPath(path.into())); }
    Ok(segments.join("/"))
}

/// An import path and the directory it refers to.
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedImport {
    /// The cleaned import path.
    pub path: String,

    /// The module's source directory.
    pub dir: PathBuf,
}

/// Cleans `path` and looks for it under each of `roots` in turn.
pub fn find_import(path: &str, roots: &[PathBuf]) -> Result<ResolvedImport, ImportError> {
    let path = clean_import(path)?;
    for root in roots {
        let dir = root.join(&path);
        if dir.is_dir() {
            debug!(%path, dir = %dir.display(), "resolved import");
            return Ok(ResolvedImport {path, dir});
        }
    }
    Err(ImportError::NotFound {path, tried: roots.to_vec()})
}

/// Resolves `path` and lists the names its module exports.
pub fn import(path: &str, config: &Config) -> Result<StaticScope, ImportError> {
    let ResolvedImport {path, dir} = find_import(path, &config.search_roots)?;
    let mut ret = import_dir(&dir, &config.source_extension)?;
    ret.path = path;
    Ok(ret)
}

// ----------------------------------------------------------------------------

/// Returns the last segment of an import path.
fn base_name(path: &str) -> &str { path.rsplit('/').next().unwrap_or(path) }

/// Writes the import block for `snapshot`.
///
/// Every module of the environment is imported first, renamed if its name
/// differs from its path. Then come `required` and the imports the literal
/// encoder asked for. Each path appears once.
fn write_imports(w: &mut impl io::Write, snapshot: &Snapshot, required: &[String])
-> io::Result<()> {
    let document = &snapshot.document;
    let mut seen: Vec<&str> = Vec::new();
    writeln!(w, "import (")?;
    for module in &document.modules {
        if seen.contains(&&*module.path) { continue; }
        seen.push(&module.path);
        if base_name(&module.path) == &*module.name {
            writeln!(w, "\t\"{}\"", module.path)?;
        } else {
            writeln!(w, "\t{} \"{}\"", module.name, module.path)?;
        }
    }
    let others = required.iter().map(String::as_str).chain(document.imports.iter().map(|s| &**s));
    for path in others {
        if seen.contains(&path) { continue; }
        seen.push(path);
        writeln!(w, "\t\"{}\"", path)?;
    }
    writeln!(w, ")")
}

/// Writes a program which rebuilds `root`, with `statics` loaded, and passes
/// it to `config.entry`.
///
/// Returns the bindings that had to be left out.
pub fn write_program(
    w: &mut impl io::Write,
    root: &Scope,
    statics: &[StaticScope],
    table: AliasTable,
    config: &Config,
) -> Result<Vec<Warning>, WriteError> {
    let snapshot = snapshot(root, statics, table, &config.layout)?;
    writeln!(w, "package main")?;
    writeln!(w)?;
    write_imports(w, &snapshot, &config.required_imports)?;
    writeln!(w)?;
    writeln!(w, "func main() {{")?;
    snapshot.document.write_to(w)?;
    writeln!(w, "\t{}({})", config.entry, config.layout.root)?;
    writeln!(w, "}}")?;
    Ok(snapshot.warnings)
}

/// Reasons why a program cannot be assembled.
#[derive(Error, Debug)]
pub enum QuineError {
    #[error(transparent)]
    Import(#[from] ImportError),

    #[error(transparent)]
    Write(#[from] WriteError),
}

/// Imports the modules at `paths` and writes a program which rebuilds `root`
/// with them loaded.
pub fn quine<P: AsRef<str>>(
    w: &mut impl io::Write,
    root: &Scope,
    paths: &[P],
    table: AliasTable,
    config: &Config,
) -> Result<Vec<Warning>, QuineError> {
    let statics = paths.iter()
        .map(|path| import(path.as_ref(), config))
        .collect::<Result<Vec<_>, _>>()?;
    Ok(write_program(w, root, &statics, table, config)?)
}

// ----------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use std::fs;

    use super::*;
    use crate::model::{Value};

    #[test]
    fn cleaning() {
        assert_eq!(clean_import("fmt").unwrap(), "fmt");
        assert_eq!(clean_import("github.com//0xfaded/ eval /").unwrap(), "github.com/0xfaded/eval");
        assert!(matches!(clean_import(""), Err(ImportError::BadPath(_))));
        assert!(matches!(clean_import("caf\u{e9}"), Err(ImportError::BadPath(_))));
        assert!(matches!(clean_import("/usr/lib"), Err(ImportError::Absolute(_))));
        assert!(matches!(clean_import("a/ \t/b"), Err(ImportError::BadPath(_))));
        assert!(matches!(clean_import("//"), Err(ImportError::Absolute(_))));
    }

    #[test]
    fn resolution() {
        let first = tempfile::tempdir().unwrap();
        let second = tempfile::tempdir().unwrap();
        fs::create_dir_all(second.path().join("a/b")).unwrap();
        let roots = vec![first.path().to_owned(), second.path().to_owned()];
        let found = find_import("a//b", &roots).unwrap();
        assert_eq!(found.path, "a/b");
        assert_eq!(found.dir, second.path().join("a/b"));
        match find_import("a/c", &roots) {
            Err(ImportError::NotFound {path, tried}) => {
                assert_eq!(path, "a/c");
                assert_eq!(tried, roots);
            },
            other => panic!("{:?}", other),
        }
    }

    #[test]
    fn program() {
        let lib = tempfile::tempdir().unwrap();
        let dir = lib.path().join("github.com/me/shapes");
        fs::create_dir_all(&dir).unwrap();
        fs::write(dir.join("shapes.go"), "package geometry\n\nfunc Area() int { return 0 }\n").unwrap();
        let config = Config {search_roots: vec![lib.path().to_owned()], ..Config::default()};
        let mut root = Scope::new();
        root.define_variable("x", Value::float(f64::NAN));
        let mut out = Vec::new();
        let warnings = quine(&mut out, &root, &["github.com/me/shapes/"], AliasTable::new(), &config).unwrap();
        assert!(warnings.is_empty());
        let text = String::from_utf8(out).unwrap();
        assert!(text.starts_with("\
package main

import (
\tgeometry \"github.com/me/shapes\"
\t\"reflect\"
\t\"github.com/0xfaded/eval\"
\t\"github.com/0xfaded/gack\"
\t\"math\"
)

func main() {
\troot := &eval.SimpleEnv{
"));
        assert!(text.contains("\t\t\t\"x\": reflect.ValueOf(&[]float64{float64(math.NaN())}[0]),\n"));
        assert!(text.contains("\t\t\t\"geometry\": &eval.SimpleEnv{\n"));
        assert!(text.contains("reflect.ValueOf(geometry.Area)"));
        assert!(text.ends_with("\t}\n\tgack.Repl(root)\n}\n"));
    }

    #[test]
    fn missing_import() {
        let config = Config::default();
        let result = quine(&mut Vec::new(), &Scope::new(), &["nowhere"], AliasTable::new(), &config);
        assert!(matches!(result, Err(QuineError::Import(ImportError::NotFound {..}))));
    }
}
