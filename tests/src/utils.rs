//! Shared helpers for end-to-end scenarios: compile a literal source
//! string through the real pipeline, then actually run the result.

use wasmtime::{Config, Engine, Instance, Module, Store};
use zena_compiler::{CompileOptions, CompileOutcome};

pub(crate) fn compile(source: &str, options: &CompileOptions) -> Vec<u8> {
    match zena_compiler::compile(source, options).expect("pipeline bug, not a diagnostic") {
        CompileOutcome::Success(bytes) => bytes,
        CompileOutcome::Diagnostics(diagnostics) => {
            panic!("expected a clean compile, got diagnostics: {diagnostics:?}");
        }
    }
}

pub(crate) fn instantiate(wasm: &[u8]) -> (Store<()>, Instance) {
    let mut config = Config::new();
    config.wasm_gc(true);
    config.wasm_function_references(true);
    let engine = Engine::new(&config).expect("engine with GC support");
    let module = Module::new(&engine, wasm).expect("emitted module is valid WASM");
    let mut store = Store::new(&engine, ());
    let instance = Instance::new(&mut store, &module, &[]).expect("no imports to satisfy");
    (store, instance)
}

pub(crate) fn run_main_i32(wasm: &[u8]) -> i32 {
    let (mut store, instance) = instantiate(wasm);
    let main = instance
        .get_typed_func::<(), i32>(&mut store, "main")
        .expect("exported `main` returning i32");
    main.call(&mut store, ()).expect("`main` traps")
}
