//! The `Host` seam (spec §4.3/§6.1) — everything the graph needs from
//! the outside world, injected so tests can run without touching disk.

use thiserror::Error;

/// Which runtime the produced binary targets. Only `zena:console`
/// resolution depends on this (spec §4.3's option table); everything
/// else about loading is target-independent.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Target {
    Host,
    Wasi,
}

#[derive(Debug, Error)]
pub enum HostError {
    #[error("cannot resolve specifier '{specifier}' from '{referrer}'")]
    ResolutionFailed {
        specifier: String,
        referrer: String,
    },
    #[error("file not found: {path}")]
    NotFound { path: String },
}

/// External collaborator the spec deliberately leaves unspecified
/// (§1): the graph only ever resolves and loads through this trait, so
/// an implementer can back it with a real filesystem, a test fixture
/// set, or a bundler's virtual file system.
pub trait Host {
    /// Maps a user-written specifier to a canonical path. `./` and
    /// `../` are resolved relative to `referrer`; `zena:<name>` selects
    /// a stdlib module (and `referrer` must itself be stdlib if `name`
    /// is internal-only — enforced by the implementation, not here).
    fn resolve(&self, specifier: &str, referrer: Option<&str>) -> Result<String, HostError>;

    /// Returns the source text stored at a canonical path.
    fn load(&self, path: &str) -> Result<String, HostError>;

    /// Injects an in-memory module, as test runners do to hand the
    /// graph a generated wrapper without writing it to disk.
    fn register_virtual_file(&mut self, path: impl Into<String>, source: impl Into<String>);

    fn target(&self) -> Target;
}
