use zena_module_graph::Target;

/// Knobs for one `check`/`build`/`compile` call (spec §4.6 step 5,
/// `{target, debug, dce}`). Built directly from `clap` flags by
/// `zenac`; there is no file-based configuration layer.
#[derive(Clone, Copy, Debug)]
pub struct CompileOptions {
    pub target: Target,
    pub debug: bool,
    pub dce: bool,
}

impl Default for CompileOptions {
    fn default() -> Self {
        Self {
            target: Target::Host,
            debug: false,
            dce: false,
        }
    }
}
