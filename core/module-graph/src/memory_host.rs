//! An in-memory [`Host`] — used by this crate's own tests and by the
//! end-to-end test harness (which generates wrapper modules on the
//! fly rather than writing them to disk).

use rustc_hash::FxHashMap;

use crate::host::{Host, HostError, Target};

pub struct MemoryHost {
    files: FxHashMap<String, String>,
    target: Target,
}

impl MemoryHost {
    #[must_use]
    pub fn new(target: Target) -> Self {
        Self {
            files: FxHashMap::default(),
            target,
        }
    }

    pub fn with_file(mut self, path: impl Into<String>, source: impl Into<String>) -> Self {
        self.files.insert(path.into(), source.into());
        self
    }
}

impl Host for MemoryHost {
    fn resolve(&self, specifier: &str, referrer: Option<&str>) -> Result<String, HostError> {
        if let Some(name) = specifier.strip_prefix("zena:") {
            return Ok(format!("zena:{name}"));
        }
        if let Some(rest) = specifier.strip_prefix("./").or_else(|| specifier.strip_prefix("../")) {
            let _ = rest;
            let base = referrer.and_then(|r| r.rsplit_once('/')).map_or("", |(dir, _)| dir);
            let joined = if base.is_empty() {
                specifier.trim_start_matches("./").to_string()
            } else {
                format!("{base}/{}", specifier.trim_start_matches("./"))
            };
            if self.files.contains_key(&joined) {
                return Ok(joined);
            }
            return Err(HostError::ResolutionFailed {
                specifier: specifier.to_string(),
                referrer: referrer.unwrap_or("<entry>").to_string(),
            });
        }
        if self.files.contains_key(specifier) {
            return Ok(specifier.to_string());
        }
        Err(HostError::ResolutionFailed {
            specifier: specifier.to_string(),
            referrer: referrer.unwrap_or("<entry>").to_string(),
        })
    }

    fn load(&self, path: &str) -> Result<String, HostError> {
        self.files
            .get(path)
            .cloned()
            .ok_or_else(|| HostError::NotFound {
                path: path.to_string(),
            })
    }

    fn register_virtual_file(&mut self, path: impl Into<String>, source: impl Into<String>) {
        self.files.insert(path.into(), source.into());
    }

    fn target(&self) -> Target {
        self.target
    }
}
