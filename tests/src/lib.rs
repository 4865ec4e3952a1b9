//! End-to-end tests for the Zena toolchain: compile literal source
//! strings through `zena_compiler` and, where a scenario calls for it,
//! execute the emitted binary under `wasmtime`. Per-crate unit tests
//! (parser, checker, codegen) live beside the code they cover; this
//! crate only carries whole-pipeline scenarios (spec §8).

mod e2e;
mod generics;
mod utils;
