//! [`FsHost`] — the default [`Host`] `zenac` wires in: `./`/`../`
//! specifiers resolve relative to the referrer's directory against the
//! OS filesystem, `zena:<name>` resolves against a small bundled
//! prelude/stdlib set (spec §4.3's "a small set of stdlib modules… is
//! implicitly loaded"), and anything else is treated as an already-
//! canonical path.

use std::path::Path;

use rustc_hash::FxHashMap;
use zena_module_graph::{Host, HostError, Target};

/// `(zena:<name>, source)` pairs bundled into every [`FsHost`], mirroring
/// the fixed prelude list spec.md names. Kept deliberately minimal:
/// these exist so the prelude loads and type-checks, not as a complete
/// standard library.
const PRELUDE_SOURCES: &[(&str, &str)] = &[
    ("string", include_str!("prelude/string.zena")),
    ("array", include_str!("prelude/array.zena")),
    ("option", include_str!("prelude/option.zena")),
    ("range", include_str!("prelude/range.zena")),
    ("console", include_str!("prelude/console.zena")),
];

/// The fixed prelude module names, in load order, for
/// [`zena_module_graph::ModuleGraph::load`]'s `prelude` argument.
#[must_use]
pub fn prelude_names() -> Vec<&'static str> {
    PRELUDE_SOURCES.iter().map(|(name, _)| *name).collect()
}

pub struct FsHost {
    target: Target,
    virtual_files: FxHashMap<String, String>,
}

impl FsHost {
    #[must_use]
    pub fn new(target: Target) -> Self {
        let mut virtual_files = FxHashMap::default();
        for (name, source) in PRELUDE_SOURCES {
            virtual_files.insert(format!("zena:{name}"), (*source).to_string());
        }
        Self { target, virtual_files }
    }
}

impl Host for FsHost {
    fn resolve(&self, specifier: &str, referrer: Option<&str>) -> Result<String, HostError> {
        if specifier.starts_with("zena:") {
            return if self.virtual_files.contains_key(specifier) {
                Ok(specifier.to_string())
            } else {
                Err(HostError::ResolutionFailed {
                    specifier: specifier.to_string(),
                    referrer: referrer.unwrap_or("<entry>").to_string(),
                })
            };
        }
        if specifier.starts_with("./") || specifier.starts_with("../") {
            let base = referrer.map(Path::new).and_then(Path::parent).unwrap_or_else(|| Path::new(""));
            return Ok(base.join(specifier).to_string_lossy().into_owned());
        }
        Ok(specifier.to_string())
    }

    fn load(&self, path: &str) -> Result<String, HostError> {
        if let Some(source) = self.virtual_files.get(path) {
            return Ok(source.clone());
        }
        std::fs::read_to_string(path).map_err(|_| HostError::NotFound { path: path.to_string() })
    }

    fn register_virtual_file(&mut self, path: impl Into<String>, source: impl Into<String>) {
        self.virtual_files.insert(path.into(), source.into());
    }

    fn target(&self) -> Target {
        self.target
    }
}
