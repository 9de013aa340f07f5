use std::{fs, io};
use std::io::{Write};
use std::path::{PathBuf};

use anyhow::{Context, Result};
use ansi_term::Colour::{Blue, Yellow};
use clap::{Parser, Subcommand};
use tracing::{warn};

use envquine::{import_dir, quine, write_env, Config, Session, Warning};

#[derive(Parser)]
#[command(name = "envquine")]
#[command(about = "Writes source code that rebuilds an evaluator environment")]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Configuration file
    #[arg(long, global = true, default_value = "envquine.toml")]
    config: PathBuf,

    /// Extra directory in which to look for imports (may be repeated)
    #[arg(long, global = true)]
    root: Vec<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// List the names exported by the module in a directory
    Names {
        /// Module source directory
        dir: PathBuf,
    },

    /// Rebuild the environment described by a session file
    Snapshot {
        /// Session file (JSON)
        session: PathBuf,

        /// Module to load into the environment (may be repeated)
        #[arg(short, long)]
        import: Vec<String>,

        /// Output file (default: standard output)
        #[arg(short, long)]
        out: Option<PathBuf>,

        /// Write a whole program, not just the environment
        #[arg(long)]
        program: bool,
    },
}

// ----------------------------------------------------------------------------

fn names(dir: PathBuf, config: &Config) -> Result<()> {
    let module = import_dir(&dir, &config.source_extension)
        .with_context(|| format!("cannot import {}", dir.display()))?;
    let mut out = io::stdout().lock();
    writeln!(out, "{} {}", Blue.paint("module"), module.name)?;
    for (heading, names) in [
        ("var", &module.variables),
        ("const", &module.constants),
        ("func", &module.functions),
        ("type", &module.types),
    ] {
        for name in names { writeln!(out, "{} {}", heading, name)?; }
    }
    Ok(())
}

fn report(warnings: &[Warning]) {
    for w in warnings {
        warn!(name = %w.name(), "left out of snapshot");
        eprintln!("{}", Yellow.paint(format!("warning: {}", w)));
    }
}

fn snapshot(
    path: PathBuf,
    imports: &[String],
    out: Option<PathBuf>,
    program: bool,
    config: &Config,
) -> Result<()> {
    let session = Session::load(&path)
        .with_context(|| format!("cannot load {}", path.display()))?;
    let table = session.alias_table();
    let mut text = Vec::new();
    let warnings = if program {
        quine(&mut text, &session.scope, imports, table, config)?
    } else {
        let statics = imports.iter()
            .map(|i| envquine::import(i, config))
            .collect::<Result<Vec<_>, _>>()?;
        write_env(&mut text, &session.scope, &statics, table, &config.layout)?
    };
    report(&warnings);
    match out {
        Some(out) => fs::write(&out, text).with_context(|| format!("cannot write {}", out.display()))?,
        None => io::stdout().lock().write_all(&text)?,
    }
    Ok(())
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::WARN.into()),
        )
        .with_writer(io::stderr)
        .init();
    let cli = Cli::parse();
    let mut config = Config::load(&cli.config)?;
    config.search_roots.extend(cli.root);
    match cli.command {
        Commands::Names {dir} => names(dir, &config),
        Commands::Snapshot {session, import, out, program} => {
            snapshot(session, &import, out, program, &config)
        },
    }
}
