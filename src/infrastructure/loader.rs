//! # Plugin Loader
//!
//! Scans a directory for loadable plugin artifacts, validates each one
//! against the contract in `minibot-api`, initializes it and merges its
//! commands into the shared registry. One bad artifact never aborts the
//! scan; only a missing plugin directory is fatal.

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use libloading::Library;
use minibot_api::{API_VERSION, BotContext, CommandMap, DECLARATION_SYMBOL, PluginDeclaration, PluginModule};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum LoadError {
    #[error("plugin directory {0:?} does not exist")]
    MissingDir(PathBuf),
    #[error("failed to read plugin directory {path:?}: {source}")]
    ReadDir {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("failed to open {path:?}: {source}")]
    Open {
        path: PathBuf,
        source: libloading::Error,
    },
    #[error("{path:?} does not export symbol `MINIBOT_DECLARATION`")]
    MissingSymbol { path: PathBuf },
    #[error("{path:?} was built against api {found}, host expects {expected}")]
    ApiMismatch {
        path: PathBuf,
        found: String,
        expected: String,
    },
    #[error("plugin {name} initialization failed: {source}")]
    Init {
        name: String,
        source: anyhow::Error,
    },
}

/// A successfully loaded and initialized plugin. The module handle is
/// retained for the process lifetime so registry entries stay valid; no
/// further calls are made on it after the merge.
pub struct LoadedPlugin {
    pub name: String,
    pub module: Box<dyn PluginModule>,
}

/// Result of the load phase.
pub struct Loaded {
    pub commands: CommandMap,
    pub plugins: Vec<LoadedPlugin>,
}

impl std::fmt::Debug for Loaded {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Loaded")
            .field("commands", &self.commands.keys().collect::<Vec<_>>())
            .field(
                "plugins",
                &self.plugins.iter().map(|p| &p.name).collect::<Vec<_>>(),
            )
            .finish()
    }
}

/// Where plugin modules come from. The production strategy is OS dynamic
/// libraries; tests substitute an in-process source. A subprocess source
/// would slot in here if crash isolation is ever needed.
pub trait PluginSource: Send + Sync {
    /// Whether a directory entry looks like a loadable artifact.
    fn candidate(&self, path: &Path) -> bool;

    /// Load one artifact and check it against the contract.
    fn load(&self, path: &Path) -> Result<LoadedPlugin, LoadError>;
}

/// Loads plugin cdylibs through the OS dynamic linker.
pub struct DynamicLibrarySource;

impl PluginSource for DynamicLibrarySource {
    fn candidate(&self, path: &Path) -> bool {
        path.extension().and_then(|ext| ext.to_str()) == Some(std::env::consts::DLL_EXTENSION)
    }

    fn load(&self, path: &Path) -> Result<LoadedPlugin, LoadError> {
        // Loading foreign code is inherently unsafe; the declaration symbol
        // and the api version check are the contract gate in front of it.
        let library = unsafe { Library::new(path) }.map_err(|source| LoadError::Open {
            path: path.to_path_buf(),
            source,
        })?;
        let declaration = unsafe {
            library
                .get::<*const PluginDeclaration>(DECLARATION_SYMBOL)
                .map_err(|_| LoadError::MissingSymbol {
                    path: path.to_path_buf(),
                })?
                .read()
        };
        if declaration.api_version != API_VERSION {
            return Err(LoadError::ApiMismatch {
                path: path.to_path_buf(),
                found: declaration.api_version.to_string(),
                expected: API_VERSION.to_string(),
            });
        }
        let module = (declaration.register)();
        // The registry will hold function pointers into the mapped object,
        // so the library must stay loaded for the life of the process.
        std::mem::forget(library);
        Ok(LoadedPlugin {
            name: plugin_name(path),
            module,
        })
    }
}

/// Artifact file stem with any platform `lib` prefix removed.
fn plugin_name(path: &Path) -> String {
    let stem = path
        .file_stem()
        .and_then(|stem| stem.to_str())
        .unwrap_or_default();
    stem.strip_prefix("lib").unwrap_or(stem).to_string()
}

pub struct PluginLoader {
    source: Box<dyn PluginSource>,
    disabled: HashSet<String>,
}

impl PluginLoader {
    pub fn new(source: Box<dyn PluginSource>, disabled: &[String]) -> Self {
        Self {
            source,
            disabled: disabled.iter().cloned().collect(),
        }
    }

    /// Load every artifact in `dir` and merge their commands.
    ///
    /// Candidates are visited in file-name order, so when two plugins
    /// export the same command name the one later in that order wins. A
    /// failing artifact (open failure, missing symbol, contract mismatch,
    /// init failure) is logged and skipped.
    pub fn load_dir(&self, dir: &Path, ctx: &BotContext) -> Result<Loaded, LoadError> {
        if !dir.is_dir() {
            return Err(LoadError::MissingDir(dir.to_path_buf()));
        }
        let mut candidates: Vec<PathBuf> = std::fs::read_dir(dir)
            .map_err(|source| LoadError::ReadDir {
                path: dir.to_path_buf(),
                source,
            })?
            .filter_map(|entry| entry.ok())
            .map(|entry| entry.path())
            .filter(|path| path.is_file() && self.source.candidate(path))
            .collect();
        candidates.sort();

        let mut loaded = Loaded {
            commands: CommandMap::new(),
            plugins: Vec::new(),
        };
        for path in candidates {
            let name = plugin_name(&path);
            if self.disabled.contains(&name) {
                tracing::info!(plugin = %name, "plugin disabled, skipping");
                continue;
            }
            match self.load_one(&path, ctx) {
                Ok(plugin) => {
                    merge_commands(&mut loaded.commands, &plugin);
                    loaded.plugins.push(plugin);
                }
                Err(err) => {
                    tracing::error!(artifact = %path.display(), %err, "skipping plugin");
                }
            }
        }
        Ok(loaded)
    }

    fn load_one(&self, path: &Path, ctx: &BotContext) -> Result<LoadedPlugin, LoadError> {
        let plugin = self.source.load(path)?;
        plugin.module.init(ctx).map_err(|source| LoadError::Init {
            name: plugin.name.clone(),
            source,
        })?;
        Ok(plugin)
    }
}

/// Merge one plugin's registry fragment into the shared map.
/// Invariant: every key equals `command.name()`; entries violating it are
/// dropped. Name collisions resolve last-write-wins.
fn merge_commands(commands: &mut CommandMap, plugin: &LoadedPlugin) {
    for (name, command) in plugin.module.registry() {
        if name != command.name() {
            tracing::warn!(
                plugin = %plugin.name,
                key = %name,
                command = %command.name(),
                "registry key does not match command name, dropping entry"
            );
            continue;
        }
        if commands.insert(name.clone(), command).is_some() {
            tracing::warn!(plugin = %plugin.name, command = %name, "command redefined, later plugin wins");
        }
    }
    tracing::info!(plugin = %plugin.name, "plugin loaded");
}
