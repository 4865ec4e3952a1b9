//! Command line argument parsing for the Zena compiler.
//!
//! This module defines the CLI interface using `clap`. `zenac` collapses
//! down to the two operations spec §6.2 actually defines: `check`
//! (load + type-check, report diagnostics) and `build` (additionally
//! emit a `.wasm` binary). There is no `run`/`test`/watch mode — those
//! are explicit Non-goals.

use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};

#[derive(Parser)]
#[command(name = "zenac", author, version, about = "Zena compiler CLI (zenac)")]
pub(crate) struct Cli {
    #[command(subcommand)]
    pub(crate) command: Command,
}

#[derive(Subcommand)]
pub(crate) enum Command {
    /// Load and type-check an entry module, printing every diagnostic.
    ///
    /// Exits 0 if nothing severity-error was reported, 1 otherwise.
    Check {
        /// Path to the entry source file.
        path: PathBuf,
    },
    /// Compile an entry module to a WASM-GC binary.
    ///
    /// Diagnostics are printed the same way `check` prints them; a
    /// severity-error diagnostic aborts before codegen runs.
    Build {
        /// Path to the entry source file.
        path: PathBuf,

        /// Runtime the produced binary targets.
        #[arg(long, value_enum, default_value = "host")]
        target: TargetArg,

        /// Keep names/locations useful for a debugger in the emitted module.
        #[arg(long)]
        debug: bool,

        /// Strip unreachable top-level functions, classes, and methods.
        #[arg(long)]
        dce: bool,

        /// Output path for the `.wasm` binary. Defaults to
        /// `out/<source-stem>.wasm` relative to the current directory.
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

#[derive(Clone, Copy, ValueEnum)]
pub(crate) enum TargetArg {
    Host,
    Wasi,
}

impl From<TargetArg> for zena_module_graph::Target {
    fn from(value: TargetArg) -> Self {
        match value {
            TargetArg::Host => zena_module_graph::Target::Host,
            TargetArg::Wasi => zena_module_graph::Target::Wasi,
        }
    }
}
