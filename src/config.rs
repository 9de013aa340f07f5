use std::{fs, io};
use std::path::{Path, PathBuf};

use serde::{Deserialize};
use thiserror::Error;

use super::snapshot::{Layout};

/// Reasons why the configuration cannot be loaded.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("cannot read {path}: {source}")]
    Io {path: PathBuf, source: io::Error},

    #[error("bad configuration in {path}: {source}")]
    Parse {path: PathBuf, source: toml::de::Error},
}

/// Settings for rebuilding an environment.
///
/// Every field has a default, so a configuration file need only mention
/// what differs.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    /// The directories in which to look for imported modules, in order.
    pub search_roots: Vec<PathBuf>,

    /// The extension of module source files, without the dot.
    pub source_extension: String,

    /// Imports that every rebuilt program needs.
    pub required_imports: Vec<String>,

    /// The function that the rebuilt program calls with the environment.
    pub entry: String,

    /// The names used in the environment literal.
    pub layout: Layout,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            search_roots: Vec::new(),
            source_extension: "go".into(),
            required_imports: vec![
                "reflect".into(),
                "github.com/0xfaded/eval".into(),
                "github.com/0xfaded/gack".into(),
            ],
            entry: "gack.Repl".into(),
            layout: Layout::default(),
        }
    }
}

impl Config {
    /// Parses a configuration from TOML text.
    pub fn parse(text: &str) -> Result<Self, toml::de::Error> { toml::from_str(text) }

    /// Reads the configuration file at `path`.
    ///
    /// A missing file is not an error: it gives the default configuration.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = match fs::read_to_string(path) {
            Ok(text) => text,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(Self::default()),
            Err(source) => return Err(ConfigError::Io {path: path.into(), source}),
        };
        Self::parse(&text).map_err(|source| ConfigError::Parse {path: path.into(), source})
    }
}

// ----------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial() {
        let config = Config::parse(r#"
search_roots = ["/usr/lib/go/src", "/home/me/go/src"]
entry = "repl.Run"

[layout]
root = "env"
"#).unwrap();
        assert_eq!(config.search_roots.len(), 2);
        assert_eq!(config.entry, "repl.Run");
        assert_eq!(config.source_extension, "go");
        assert_eq!(config.required_imports.len(), 3);
        assert_eq!(config.layout.root, "env");
        assert_eq!(config.layout.env_type, Layout::default().env_type);
    }

    #[test]
    fn unknown_field() {
        assert!(Config::parse("entry_point = \"x\"\n").is_err());
    }

    #[test]
    fn load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("envquine.toml");
        assert_eq!(Config::load(&path).unwrap(), Config::default());
        fs::write(&path, "source_extension = \"gox\"\n").unwrap();
        assert_eq!(Config::load(&path).unwrap().source_extension, "gox");
        fs::write(&path, "source_extension = 3\n").unwrap();
        assert!(matches!(Config::load(&path), Err(ConfigError::Parse {..})));
    }
}
