#![warn(clippy::pedantic)]

//! # Zena Compiler CLI
//!
//! Command line interface for the Zena toolchain, wired directly onto
//! `zena_compiler`'s `check`/`build` entry points (spec §6.2).
//!
//! ## Exit codes
//! * 0 – success, no severity-error diagnostic.
//! * 1 – usage / IO failure, or a severity-error diagnostic was reported.
//!
//! ## Examples
//! ```bash
//! zenac check examples/hello.zena
//! zenac build examples/hello.zena --dce -o out/hello.wasm
//! ```

mod parser;

use std::{fs, path::Path, process};

use clap::Parser as _;
use parser::{Cli, Command};
use zena_compiler::{CompileOptions, CompileOutcome, FsHost};

fn main() {
    let cli = Cli::parse();
    match cli.command {
        Command::Check { path } => run_check(&path),
        Command::Build { path, target, debug, dce, output } => {
            run_build(&path, target.into(), debug, dce, output.as_deref());
        }
    }
}

fn run_check(path: &Path) {
    if !path.exists() {
        eprintln!("Error: path not found");
        process::exit(1);
    }
    let entry = path.to_string_lossy().into_owned();
    let host = FsHost::new(zena_module_graph::Target::Host);
    let options = CompileOptions::default();

    let diagnostics = match zena_compiler::check(&entry, &host, &options) {
        Ok(diagnostics) => diagnostics,
        Err(err) => {
            eprintln!("Error: {err:#}");
            process::exit(1);
        }
    };

    let mut has_error = false;
    for diagnostic in &diagnostics {
        eprintln!("{diagnostic}");
        has_error |= diagnostic.is_error();
    }
    if has_error {
        process::exit(1);
    }
    println!("Checked: {}", path.display());
}

fn run_build(path: &Path, target: zena_module_graph::Target, debug: bool, dce: bool, output: Option<&Path>) {
    if !path.exists() {
        eprintln!("Error: path not found");
        process::exit(1);
    }
    let entry = path.to_string_lossy().into_owned();
    let host = FsHost::new(target);
    let options = CompileOptions { target, debug, dce };

    let outcome = match zena_compiler::build(&entry, &host, &options) {
        Ok(outcome) => outcome,
        Err(err) => {
            eprintln!("Error: {err:#}");
            process::exit(1);
        }
    };

    match outcome {
        CompileOutcome::Diagnostics(diagnostics) => {
            for diagnostic in &diagnostics {
                eprintln!("{diagnostic}");
            }
            process::exit(1);
        }
        CompileOutcome::Success(bytes) => {
            let out_path = output.map_or_else(|| default_output_path(path), Path::to_path_buf);
            if let Some(parent) = out_path.parent() {
                if let Err(err) = fs::create_dir_all(parent) {
                    eprintln!("Failed to create output directory: {err}");
                    process::exit(1);
                }
            }
            if let Err(err) = fs::write(&out_path, &bytes) {
                eprintln!("Failed to write WASM file: {err}");
                process::exit(1);
            }
            println!("WASM generated at: {}", out_path.display());
        }
    }
}

fn default_output_path(source: &Path) -> std::path::PathBuf {
    let stem = source.file_stem().unwrap_or_else(|| std::ffi::OsStr::new("module"));
    Path::new("out").join(stem).with_extension("wasm")
}
