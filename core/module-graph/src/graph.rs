//! [`ModuleGraph`]: depth-first loader and import/re-export resolver
//! (spec §4.3).

use std::collections::VecDeque;

use rustc_hash::FxHashMap;
use zena_ast::module::{ExportKey, Module};
use zena_ast::nodes::{ImportBindings, Program};
use zena_ast::{Diagnostic, DiagnosticCode, ModuleId};

use crate::host::Host;

/// One entry in the work queue: the specifier as written, the module
/// that wrote it (`None` for the entry point and prelude roots), and
/// whether this edge came from the fixed prelude list.
struct PendingImport {
    specifier: String,
    referrer: Option<String>,
}

pub struct ModuleGraph {
    modules: FxHashMap<ModuleId, Module>,
    path_to_id: FxHashMap<String, ModuleId>,
    /// Discovery order: prelude roots first, then entry-reachable
    /// modules in depth-first order — the order the checker's Phase A
    /// iterates in (spec §4.4 "cycles broken arbitrarily" by visiting
    /// in this fixed order).
    order: Vec<ModuleId>,
    next_id: u32,
}

impl ModuleGraph {
    fn empty() -> Self {
        Self {
            modules: FxHashMap::default(),
            path_to_id: FxHashMap::default(),
            order: Vec::new(),
            next_id: 0,
        }
    }

    fn reserve_id(&mut self) -> ModuleId {
        let id = ModuleId(self.next_id);
        self.next_id += 1;
        id
    }

    /// Loads every module transitively reachable from `entry`, plus the
    /// fixed `prelude` list (stdlib specifiers without the `zena:`
    /// prefix — it's added here). `parse` turns source text into a
    /// [`Program`] plus any syntax diagnostics; `zena-module-graph`
    /// itself has no opinion on grammar (spec §1's external-parser
    /// boundary).
    #[must_use]
    pub fn load<P>(entry: &str, host: &dyn Host, prelude: &[&str], mut parse: P) -> Self
    where
        P: FnMut(&str, &str) -> (Program, Vec<Diagnostic>),
    {
        let mut graph = Self::empty();
        let mut queue: VecDeque<PendingImport> = VecDeque::new();
        for name in prelude {
            queue.push_back(PendingImport {
                specifier: format!("zena:{name}"),
                referrer: None,
            });
        }
        queue.push_back(PendingImport {
            specifier: entry.to_string(),
            referrer: None,
        });

        while let Some(PendingImport { specifier, referrer }) = queue.pop_front() {
            let canonical = match host.resolve(&specifier, referrer.as_deref()) {
                Ok(path) => path,
                Err(_) => {
                    if let Some(referrer_path) = &referrer {
                        graph.diagnose(
                            referrer_path,
                            DiagnosticCode::UnresolvedImport,
                            format!("cannot resolve specifier '{specifier}'"),
                        );
                    }
                    continue;
                }
            };

            if let Some(&_existing) = graph.path_to_id.get(&canonical) {
                // Already registered: either a diamond import or a
                // cycle. The edge itself is recorded, the body is
                // never parsed twice.
                if let Some(referrer_path) = &referrer {
                    graph.record_import(referrer_path, &specifier, &canonical);
                }
                continue;
            }

            let id = graph.reserve_id();
            graph.path_to_id.insert(canonical.clone(), id);
            graph.order.push(id);

            let source = match host.load(&canonical) {
                Ok(text) => text,
                Err(_) => {
                    graph.path_to_id.remove(&canonical);
                    graph.order.pop();
                    if let Some(referrer_path) = &referrer {
                        graph.diagnose(
                            referrer_path,
                            DiagnosticCode::UnresolvedImport,
                            format!("file not found: {canonical}"),
                        );
                    }
                    continue;
                }
            };

            let (ast, diagnostics) = parse(&canonical, &source);
            let is_stdlib = canonical.starts_with("zena:");
            let exports = local_exports(&ast);

            for import in &ast.imports {
                queue.push_back(PendingImport {
                    specifier: import.specifier.clone(),
                    referrer: Some(canonical.clone()),
                });
            }
            let reexported_from: Vec<String> = ast
                .re_exports
                .iter()
                .map(|r| r.specifier.clone())
                .collect();
            for specifier in &reexported_from {
                queue.push_back(PendingImport {
                    specifier: specifier.clone(),
                    referrer: Some(canonical.clone()),
                });
            }

            let module = Module {
                id,
                path: canonical.clone(),
                source,
                ast,
                imports: FxHashMap::default(),
                exports,
                reexported_from,
                diagnostics,
                is_stdlib,
            };
            graph.modules.insert(id, module);

            if let Some(referrer_path) = &referrer {
                graph.record_import(referrer_path, &specifier, &canonical);
            }
        }

        graph.check_reexport_collisions();
        graph.check_named_imports();
        graph
    }

    fn record_import(&mut self, referrer_path: &str, specifier: &str, resolved: &str) {
        let Some(&referrer_id) = self.path_to_id.get(referrer_path) else {
            return;
        };
        if let Some(module) = self.modules.get_mut(&referrer_id) {
            module
                .imports
                .insert(specifier.to_string(), resolved.to_string());
        }
    }

    fn diagnose(&mut self, path: &str, code: DiagnosticCode, message: impl Into<String>) {
        let Some(&id) = self.path_to_id.get(path) else {
            return;
        };
        if let Some(module) = self.modules.get_mut(&id) {
            module
                .diagnostics
                .push(Diagnostic::error_without_location(code, message.into()));
        }
    }

    #[must_use]
    pub fn module(&self, id: ModuleId) -> Option<&Module> {
        self.modules.get(&id)
    }

    #[must_use]
    pub fn module_by_path(&self, path: &str) -> Option<&Module> {
        self.path_to_id.get(path).and_then(|id| self.modules.get(id))
    }

    #[must_use]
    pub fn id_for_path(&self, path: &str) -> Option<ModuleId> {
        self.path_to_id.get(path).copied()
    }

    /// Discovery order: prelude roots first, then a depth-first walk
    /// from the entry. The checker's Phase A iterates modules in this
    /// order.
    #[must_use]
    pub fn order(&self) -> &[ModuleId] {
        &self.order
    }

    #[must_use]
    pub fn has_errors(&self) -> bool {
        self.modules.values().any(Module::has_errors)
    }

    pub fn diagnostics(&self) -> impl Iterator<Item = &Diagnostic> {
        self.order
            .iter()
            .filter_map(|id| self.modules.get(id))
            .flat_map(|m| m.diagnostics.iter())
    }

    /// Resolves a kind-qualified export, following `export * from`
    /// chains when `module` does not provide `key` itself. Returns the
    /// module that actually owns the declaration and its index in that
    /// module's `ast.decls`.
    #[must_use]
    pub fn resolve_export(&self, module: ModuleId, key: &ExportKey) -> Option<(ModuleId, usize)> {
        self.resolve_export_inner(module, key, &mut Vec::new())
    }

    fn resolve_export_inner(
        &self,
        module: ModuleId,
        key: &ExportKey,
        visiting: &mut Vec<ModuleId>,
    ) -> Option<(ModuleId, usize)> {
        if visiting.contains(&module) {
            // A re-export cycle with no module providing `key` locally;
            // no amount of further walking will find it.
            return None;
        }
        visiting.push(module);
        let m = self.modules.get(&module)?;
        if let Some(&idx) = m.exports.get(key) {
            return Some((module, idx));
        }
        for specifier in &m.reexported_from {
            if let Some(target_path) = m.imports.get(specifier) {
                if let Some(&target_id) = self.path_to_id.get(target_path) {
                    if let Some(found) = self.resolve_export_inner(target_id, key, visiting) {
                        return Some(found);
                    }
                }
            }
        }
        None
    }

    /// `export * from` collisions: two distinct re-export targets
    /// supplying the same kind-qualified name, neither shadowed by a
    /// local declaration (spec §4.3).
    fn check_reexport_collisions(&mut self) {
        let mut new_diagnostics: Vec<(ModuleId, Diagnostic)> = Vec::new();
        for &mid in &self.order {
            let Some(m) = self.modules.get(&mid) else {
                continue;
            };
            if m.reexported_from.len() < 2 {
                continue;
            }
            let mut seen: FxHashMap<ExportKey, String> = FxHashMap::default();
            for specifier in &m.reexported_from {
                let Some(target_path) = m.imports.get(specifier) else {
                    continue;
                };
                let Some(&target_id) = self.path_to_id.get(target_path) else {
                    continue;
                };
                let Some(target) = self.modules.get(&target_id) else {
                    continue;
                };
                for key in target.exports.keys() {
                    if m.exports.contains_key(key) {
                        continue;
                    }
                    if let Some(prev) = seen.get(key) {
                        if prev != specifier {
                            new_diagnostics.push((
                                mid,
                                Diagnostic::error_without_location(
                                    DiagnosticCode::NameConflict,
                                    format!(
                                        "re-exported name '{}' is ambiguous between '{prev}' and '{specifier}'",
                                        key.name
                                    ),
                                ),
                            ));
                        }
                    } else {
                        seen.insert(key.clone(), specifier.clone());
                    }
                }
            }
        }
        for (mid, diagnostic) in new_diagnostics {
            if let Some(m) = self.modules.get_mut(&mid) {
                m.diagnostics.push(diagnostic);
            }
        }
    }

    /// "Module X does not export Y" (spec §4.3 failure semantics,
    /// third bullet) for named imports that don't resolve.
    fn check_named_imports(&mut self) {
        let mut new_diagnostics: Vec<(ModuleId, Diagnostic)> = Vec::new();
        for &mid in &self.order {
            let Some(m) = self.modules.get(&mid) else {
                continue;
            };
            for import in &m.ast.imports {
                let ImportBindings::Named(names) = &import.bindings else {
                    continue;
                };
                let Some(target_path) = m.imports.get(&import.specifier) else {
                    continue;
                };
                let Some(target_id) = self.path_to_id.get(target_path).copied() else {
                    continue;
                };
                for name in names {
                    let key = ExportKey {
                        kind: name.kind,
                        name: name.name.clone(),
                    };
                    if self.resolve_export(target_id, &key).is_none() {
                        new_diagnostics.push((
                            mid,
                            Diagnostic::error(
                                DiagnosticCode::UnresolvedImport,
                                format!(
                                    "module '{}' does not export '{}'",
                                    import.specifier, name.name
                                ),
                                import.location.clone(),
                            ),
                        ));
                    }
                }
            }
        }
        for (mid, diagnostic) in new_diagnostics {
            if let Some(m) = self.modules.get_mut(&mid) {
                m.diagnostics.push(diagnostic);
            }
        }
    }
}

/// Exports a module provides from its *own* declarations (re-exports
/// are resolved separately through [`ModuleGraph::resolve_export`]).
/// Classes export both their type and their constructor value; every
/// other public declaration exports only the kind it naturally is.
/// Duplicate public names within one module are a Checker-level
/// `DuplicateDeclaration` diagnostic, not a loader concern, so the
/// later declaration simply wins here.
fn local_exports(ast: &Program) -> FxHashMap<ExportKey, usize> {
    use zena_ast::nodes::Decl;

    let mut exports = FxHashMap::default();
    for (idx, decl) in ast.decls.iter().enumerate() {
        if decl.visibility() != zena_ast::nodes::Visibility::Public {
            continue;
        }
        match decl {
            Decl::Let(_) => {
                exports.insert(ExportKey::value(decl.name()), idx);
            }
            Decl::Class(_) => {
                exports.insert(ExportKey::ty(decl.name()), idx);
                exports.insert(ExportKey::value(decl.name()), idx);
            }
            Decl::Interface(_) | Decl::Mixin(_) | Decl::Enum(_) | Decl::TypeAlias(_) => {
                exports.insert(ExportKey::ty(decl.name()), idx);
            }
        }
    }
    exports
}

#[cfg(test)]
mod tests {
    use zena_ast::location::Location;
    use zena_ast::nodes::{
        Decl, ExportKind as NodeExportKind, Expr, ImportBindings, ImportDirective, ImportedName,
        LetDecl, ReExportDirective, Visibility,
    };
    use zena_ast::NodeId;

    use super::*;
    use crate::host::Target;
    use crate::memory_host::MemoryHost;

    fn empty_program() -> Program {
        Program {
            id: NodeId(1),
            location: Location::synthetic(),
            imports: Vec::new(),
            re_exports: Vec::new(),
            decls: Vec::new(),
        }
    }

    fn public_let(name: &str) -> Decl {
        Decl::Let(LetDecl {
            id: NodeId(2),
            location: Location::synthetic(),
            visibility: Visibility::Public,
            name: name.to_string(),
            is_mut: false,
            ty: None,
            value: Expr::NullLiteral(NodeId(3), Location::synthetic()),
        })
    }

    fn import(specifier: &str, names: &[&str]) -> ImportDirective {
        ImportDirective {
            id: NodeId(4),
            location: Location::synthetic(),
            specifier: specifier.to_string(),
            bindings: ImportBindings::Named(
                names
                    .iter()
                    .map(|n| ImportedName {
                        name: (*n).to_string(),
                        alias: None,
                        kind: NodeExportKind::Value,
                    })
                    .collect(),
            ),
        }
    }

    fn reexport(specifier: &str) -> ReExportDirective {
        ReExportDirective {
            id: NodeId(5),
            location: Location::synthetic(),
            specifier: specifier.to_string(),
        }
    }

    #[test]
    fn loads_prelude_roots_before_the_entry_point() {
        let host = MemoryHost::new(Target::Host).with_file("main.zena", "");
        let graph = ModuleGraph::load("main.zena", &host, &["string"], |_, _| {
            (empty_program(), Vec::new())
        });
        assert_eq!(graph.order().len(), 2);
        assert_eq!(graph.module(graph.order()[0]).unwrap().path, "zena:string");
        assert_eq!(graph.module(graph.order()[1]).unwrap().path, "main.zena");
    }

    #[test]
    fn tolerates_import_cycles() {
        let host = MemoryHost::new(Target::Host)
            .with_file("a.zena", "")
            .with_file("b.zena", "");
        let graph = ModuleGraph::load("a.zena", &host, &[], |path, _| {
            let mut program = empty_program();
            if path == "a.zena" {
                program.imports.push(import("./b.zena", &[]));
            } else {
                program.imports.push(import("./a.zena", &[]));
            }
            (program, Vec::new())
        });
        assert!(graph.module_by_path("a.zena").is_some());
        assert!(graph.module_by_path("b.zena").is_some());
        assert!(!graph.has_errors());
    }

    #[test]
    fn reports_an_unresolved_specifier_on_the_importing_module() {
        let host = MemoryHost::new(Target::Host).with_file("main.zena", "");
        let graph = ModuleGraph::load("main.zena", &host, &[], |path, _| {
            let mut program = empty_program();
            if path == "main.zena" {
                program.imports.push(import("./missing.zena", &[]));
            }
            (program, Vec::new())
        });
        assert!(graph.has_errors());
        let diag = graph.diagnostics().next().unwrap();
        assert_eq!(diag.code, DiagnosticCode::UnresolvedImport);
    }

    #[test]
    fn resolves_named_export_through_a_wildcard_reexport() {
        let host = MemoryHost::new(Target::Host)
            .with_file("main.zena", "")
            .with_file("b.zena", "")
            .with_file("c.zena", "");
        let graph = ModuleGraph::load("main.zena", &host, &[], |path, _| {
            let mut program = empty_program();
            match path {
                "main.zena" => program.imports.push(import("./b.zena", &["answer"])),
                "b.zena" => program.re_exports.push(reexport("./c.zena")),
                "c.zena" => program.decls.push(public_let("answer")),
                _ => {}
            }
            (program, Vec::new())
        });
        assert!(!graph.has_errors(), "{:?}", graph.diagnostics().collect::<Vec<_>>());
        let b_id = graph.id_for_path("b.zena").unwrap();
        let resolved = graph.resolve_export(b_id, &ExportKey::value("answer"));
        assert_eq!(resolved, Some((graph.id_for_path("c.zena").unwrap(), 0)));
    }

    #[test]
    fn missing_named_export_is_diagnosed() {
        let host = MemoryHost::new(Target::Host)
            .with_file("main.zena", "")
            .with_file("lib.zena", "");
        let graph = ModuleGraph::load("main.zena", &host, &[], |path, _| {
            let mut program = empty_program();
            if path == "main.zena" {
                program.imports.push(import("./lib.zena", &["nope"]));
            }
            (program, Vec::new())
        });
        assert!(graph.has_errors());
    }

    #[test]
    fn ambiguous_reexports_are_diagnosed() {
        let host = MemoryHost::new(Target::Host)
            .with_file("main.zena", "")
            .with_file("left.zena", "")
            .with_file("right.zena", "");
        let graph = ModuleGraph::load("main.zena", &host, &[], |path, _| {
            let mut program = empty_program();
            match path {
                "main.zena" => {
                    program.re_exports.push(reexport("./left.zena"));
                    program.re_exports.push(reexport("./right.zena"));
                }
                "left.zena" | "right.zena" => program.decls.push(public_let("x")),
                _ => {}
            }
            (program, Vec::new())
        });
        assert!(graph
            .diagnostics()
            .any(|d| d.code == DiagnosticCode::NameConflict));
    }
}
