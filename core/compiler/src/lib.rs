#![warn(clippy::pedantic)]
//! Whole-program pipeline (spec §4.6) — component C6.
//!
//! Ties the rest of the workspace together into the three entry points
//! spec §6.2 actually defines:
//!
//! - [`check`] — load and check, return every diagnostic.
//! - [`build`] — load, check, and (if nothing severity-error was
//!   raised) generate a `.wasm` binary.
//! - [`compile`] — `build`'s convenience form for a single in-memory
//!   module, used by callers that have source text rather than a
//!   filesystem entry point.
//!
//! Diagnostics are data (spec §6.4): a failed type-check is reported
//! through [`CompileOutcome::Diagnostics`], never through `Err`. `Err`
//! is reserved for the internal-bug tier — a checked program codegen
//! cannot lay out, which should never happen for output the checker
//! accepted — propagated with [`anyhow::Context`] exactly as every
//! downstream crate's own `thiserror` enum is.

pub mod host;
pub mod options;

pub use host::FsHost;
pub use options::CompileOptions;

use anyhow::Context;
use zena_ast::Diagnostic;
use zena_module_graph::{Host, MemoryHost, ModuleGraph};

/// The result of a successful pipeline run that reached codegen: either
/// an emitted binary, or every diagnostic collected along the way
/// (spec §4.6's "if any severity-error, stop and return diagnostics").
pub enum CompileOutcome {
    Success(Vec<u8>),
    Diagnostics(Vec<Diagnostic>),
}

impl CompileOutcome {
    #[must_use]
    pub fn into_result(self) -> Result<Vec<u8>, Vec<Diagnostic>> {
        match self {
            CompileOutcome::Success(bytes) => Ok(bytes),
            CompileOutcome::Diagnostics(diagnostics) => Err(diagnostics),
        }
    }
}

/// Loads and checks `entry`, returning every diagnostic raised by the
/// loader or the checker. Never runs codegen.
pub fn check(entry: &str, host: &dyn Host, _options: &CompileOptions) -> anyhow::Result<Vec<Diagnostic>> {
    let graph = load_graph(entry, host);
    let mut diagnostics: Vec<Diagnostic> = graph.diagnostics().cloned().collect();
    let (_sem, _environments, checker_diagnostics) = zena_checker::check(&graph);
    diagnostics.extend(checker_diagnostics);
    Ok(diagnostics)
}

/// Loads, checks, and (absent a severity-error diagnostic) generates a
/// `.wasm` binary for `entry` (spec §4.6).
pub fn build(entry: &str, host: &dyn Host, options: &CompileOptions) -> anyhow::Result<CompileOutcome> {
    let graph = load_graph(entry, host);
    let mut diagnostics: Vec<Diagnostic> = graph.diagnostics().cloned().collect();
    if graph.has_errors() {
        return Ok(CompileOutcome::Diagnostics(diagnostics));
    }

    let (sem, environments, checker_diagnostics) = zena_checker::check(&graph);
    diagnostics.extend(checker_diagnostics);
    if diagnostics.iter().any(Diagnostic::is_error) {
        return Ok(CompileOutcome::Diagnostics(diagnostics));
    }

    let gen_options = zena_codegen::GenerateOptions {
        dce: options.dce,
        debug: options.debug,
    };
    let bytes = zena_codegen::generate(&graph, &sem, &environments, &gen_options)
        .context("code generation failed for a checker-accepted program")?;
    Ok(CompileOutcome::Success(bytes))
}

/// `build`'s convenience form (spec §6.2): compiles a single in-memory
/// module with no other files on disk, for callers (tests, embedders)
/// that have source text rather than a filesystem entry point.
pub fn compile(source: &str, options: &CompileOptions) -> anyhow::Result<CompileOutcome> {
    const ENTRY_PATH: &str = "entry.zena";
    let mut host = MemoryHost::new(options.target).with_file(ENTRY_PATH, source);
    // `FsHost`'s bundled prelude sources, re-registered onto the
    // in-memory host so `compile`'s single-module convenience still
    // sees the same prelude a filesystem build does.
    let fs_host = FsHost::new(options.target);
    for name in host::prelude_names() {
        let specifier = format!("zena:{name}");
        if let Ok(source) = fs_host.load(&specifier) {
            host.register_virtual_file(specifier, source);
        }
    }
    build(ENTRY_PATH, &host, options)
}

fn load_graph(entry: &str, host: &dyn Host) -> ModuleGraph {
    ModuleGraph::load(entry, host, &host::prelude_names(), zena_parser::parse_module)
}
