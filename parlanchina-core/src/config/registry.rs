//! Tool-server registry backed by `mcp.json`.
//!
//! The parsed document is held as an immutable snapshot and only rebuilt
//! when the file's modification time changes.

use super::server::{ServerConfig, ServerSummary, parse_servers};
use serde_json::Value;
use std::collections::BTreeMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, RwLock};
use std::time::SystemTime;
use tracing::{debug, warn};

/// One parse of the configuration document.
#[derive(Debug, Clone, Default)]
pub struct RegistrySnapshot {
    servers: BTreeMap<String, ServerConfig>,
    disabled_reason: Option<String>,
}

impl RegistrySnapshot {
    fn disabled(reason: impl Into<String>) -> Self {
        Self {
            servers: BTreeMap::new(),
            disabled_reason: Some(reason.into()),
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.disabled_reason.is_none() && !self.servers.is_empty()
    }

    pub fn disabled_reason(&self) -> Option<&str> {
        self.disabled_reason.as_deref()
    }

    pub fn server(&self, name: &str) -> Option<&ServerConfig> {
        self.servers.get(name)
    }

    pub fn servers(&self) -> impl Iterator<Item = &ServerConfig> {
        self.servers.values()
    }

    pub fn server_names(&self) -> Vec<String> {
        self.servers.keys().cloned().collect()
    }
}

struct CacheEntry {
    mtime: Option<SystemTime>,
    snapshot: Arc<RegistrySnapshot>,
}

pub struct McpRegistry {
    path: PathBuf,
    cache: RwLock<Option<CacheEntry>>,
    parse_count: AtomicUsize,
}

impl McpRegistry {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            cache: RwLock::new(None),
            parse_count: AtomicUsize::new(0),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Current snapshot, re-parsing the file only when its mtime changed.
    pub fn snapshot(&self) -> Arc<RegistrySnapshot> {
        let mtime = fs::metadata(&self.path)
            .and_then(|meta| meta.modified())
            .ok();

        {
            let cache = self.cache.read().unwrap_or_else(|e| e.into_inner());
            if let Some(entry) = cache.as_ref() {
                if entry.mtime == mtime {
                    return entry.snapshot.clone();
                }
            }
        }

        let snapshot = Arc::new(self.load());
        self.parse_count.fetch_add(1, Ordering::SeqCst);
        if let Some(reason) = snapshot.disabled_reason() {
            warn!(reason, "MCP configuration issue");
        } else {
            debug!(
                path = %self.path.display(),
                servers = snapshot.servers.len(),
                "MCP configuration loaded"
            );
        }

        let mut cache = self.cache.write().unwrap_or_else(|e| e.into_inner());
        *cache = Some(CacheEntry {
            mtime,
            snapshot: snapshot.clone(),
        });
        snapshot
    }

    fn load(&self) -> RegistrySnapshot {
        let content = match fs::read_to_string(&self.path) {
            Ok(content) => content,
            Err(err) if err.kind() == io::ErrorKind::NotFound => {
                return RegistrySnapshot::disabled(format!(
                    "mcp.json not found at {}",
                    self.path.display()
                ));
            }
            Err(err) => {
                return RegistrySnapshot::disabled(format!(
                    "mcp.json could not be read: {err}; MCP disabled"
                ));
            }
        };

        let document: Value = match serde_json::from_str(&content) {
            Ok(document) => document,
            Err(err) => {
                warn!(path = %self.path.display(), %err, "Failed to decode mcp.json");
                return RegistrySnapshot::disabled("mcp.json is not valid JSON; MCP disabled");
            }
        };

        match parse_servers(&document) {
            Ok(servers) if servers.is_empty() => {
                RegistrySnapshot::disabled("No valid MCP servers configured")
            }
            Ok(servers) => RegistrySnapshot {
                servers,
                disabled_reason: None,
            },
            Err(reason) => RegistrySnapshot::disabled(reason),
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.snapshot().is_enabled()
    }

    pub fn disabled_reason(&self) -> Option<String> {
        self.snapshot().disabled_reason().map(str::to_string)
    }

    pub fn server(&self, name: &str) -> Option<ServerConfig> {
        self.snapshot().server(name).cloned()
    }

    pub fn list_servers(&self) -> Vec<ServerSummary> {
        self.snapshot().servers().map(ServerConfig::summary).collect()
    }

    /// Number of times the document has been parsed.
    pub fn parse_count(&self) -> usize {
        self.parse_count.load(Ordering::SeqCst)
    }
}
