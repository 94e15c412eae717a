//! Module resolution: locates `.shdl` files named by `use` imports on a
//! search path, parses them transitively, and detects import cycles
//! (specification §4.3 phase 1).

#![warn(missing_docs)]

use shdl_ast::{lex, parse_module, ComponentDef, Module};
use shdl_diagnostics::{Diagnostic, DiagnosticCode, DiagnosticSink, Stage};
use shdl_source::{SourceDb, Span};
use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};

/// All modules reachable from an entry file, keyed by module name.
pub struct ResolvedProgram {
    /// Every parsed module, including the entry module, keyed by name.
    pub modules: HashMap<String, Module>,
    /// The entry module's name.
    pub entry: String,
}

impl ResolvedProgram {
    /// Looks up a component definition by the (module, component) pair named
    /// by an import, or directly in the entry module.
    pub fn find_component(&self, module: &str, name: &str) -> Option<&ComponentDef> {
        self.modules.get(module)?.find_component(name)
    }

    /// Builds the flat symbol environment reachable from the entry module:
    /// every component defined in the entry module, plus every component
    /// pulled in transitively via `use` imports.
    ///
    /// Per specification §4.3 phase 1, this environment is what the
    /// flattener resolves instance type names against.
    pub fn symbol_environment(&self) -> HashMap<String, &ComponentDef> {
        let mut env = HashMap::new();
        let entry_module = &self.modules[&self.entry];
        for comp in &entry_module.components {
            env.insert(comp.name.clone(), comp);
        }
        let mut visited = HashSet::new();
        let mut queue: Vec<&str> = vec![self.entry.as_str()];
        while let Some(module_name) = queue.pop() {
            if !visited.insert(module_name.to_string()) {
                continue;
            }
            let Some(module) = self.modules.get(module_name) else {
                continue;
            };
            for import in &module.imports {
                if let Some(imported) = self.modules.get(&import.module) {
                    for name in &import.names {
                        if let Some(comp) = imported.find_component(name) {
                            env.insert(name.clone(), comp);
                        }
                    }
                    queue.push(import.module.as_str());
                }
            }
        }
        env
    }
}

/// Resolves an entry `.shdl` file and every module it transitively imports
/// via `use`, searching `search_path` (in order) for each imported module's
/// file.
///
/// Parse errors and import errors (missing file, import cycle, unknown
/// imported component) are reported to `sink`. Returns `None` only if the
/// entry file itself cannot be read from disk.
pub fn resolve(
    entry_path: &Path,
    search_path: &[PathBuf],
    source_db: &mut SourceDb,
    sink: &DiagnosticSink,
) -> Option<ResolvedProgram> {
    let entry_name = module_name_from_path(entry_path);
    let mut modules = HashMap::new();
    let mut loading = HashSet::new();

    load_module(
        &entry_name,
        entry_path,
        search_path,
        source_db,
        sink,
        &mut modules,
        &mut loading,
        Span::DUMMY,
    )?;

    Some(ResolvedProgram {
        modules,
        entry: entry_name,
    })
}

#[allow(clippy::too_many_arguments)]
fn load_module(
    name: &str,
    path: &Path,
    search_path: &[PathBuf],
    source_db: &mut SourceDb,
    sink: &DiagnosticSink,
    modules: &mut HashMap<String, Module>,
    loading: &mut HashSet<String>,
    import_span: Span,
) -> Option<()> {
    if modules.contains_key(name) {
        return Some(());
    }
    if !loading.insert(name.to_string()) {
        sink.emit(Diagnostic::error(
            DiagnosticCode::error(Stage::Import, 2),
            format!("import cycle detected at module '{name}'"),
            import_span,
        ));
        return Some(());
    }

    let file_id = match source_db.find_by_path(path) {
        Some(id) => id,
        None => match source_db.load_file(path) {
            Ok(id) => id,
            Err(_) => {
                sink.emit(Diagnostic::error(
                    DiagnosticCode::error(Stage::Import, 1),
                    format!("cannot find module '{name}' ({})", path.display()),
                    import_span,
                ));
                loading.remove(name);
                return None;
            }
        },
    };

    let source = source_db.get_file(file_id).content.clone();
    let tokens = lex(&source, file_id, sink);
    let module = parse_module(&source, file_id, name, tokens, sink);

    for import in &module.imports {
        if modules.contains_key(&import.module) || loading.contains(&import.module) {
            if loading.contains(&import.module) {
                sink.emit(Diagnostic::error(
                    DiagnosticCode::error(Stage::Import, 2),
                    format!("import cycle detected at module '{}'", import.module),
                    import.span,
                ));
            }
            continue;
        }
        match find_on_search_path(&import.module, search_path) {
            Some(import_path) => {
                load_module(
                    &import.module,
                    &import_path,
                    search_path,
                    source_db,
                    sink,
                    modules,
                    loading,
                    import.span,
                );
            }
            None => {
                sink.emit(Diagnostic::error(
                    DiagnosticCode::error(Stage::Import, 1),
                    format!("cannot find module '{}' on search path", import.module),
                    import.span,
                ));
            }
        }
    }

    // Validate every imported name actually exists in the resolved module.
    for import in &module.imports {
        if let Some(imported_module) = modules.get(&import.module) {
            for used_name in &import.names {
                if imported_module.find_component(used_name).is_none() {
                    sink.emit(Diagnostic::error(
                        DiagnosticCode::error(Stage::Import, 3),
                        format!(
                            "module '{}' has no component named '{used_name}'",
                            import.module
                        ),
                        import.span,
                    ));
                }
            }
        }
    }

    loading.remove(name);
    modules.insert(name.to_string(), module);
    Some(())
}

fn find_on_search_path(module_name: &str, search_path: &[PathBuf]) -> Option<PathBuf> {
    for dir in search_path {
        let candidate = dir.join(format!("{module_name}.shdl"));
        if candidate.is_file() {
            return Some(candidate);
        }
    }
    None
}

fn module_name_from_path(path: &Path) -> String {
    path.file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "module".to_string())
}
