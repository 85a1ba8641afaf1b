//! # tova_registry
//!
//! The block plugin registry: a process-wide, write-once table that
//! associates source-level block keywords/identifiers (`server`,
//! `browser`, `shared`, `cli`, `data`, `test`, `bench`, `security`,
//! `deploy`) with the scope kind their body analyzes under. The parser and
//! analyzer both consult this table for top-level dispatch rather than
//! hard-coding the block list inline.

use tova_lexer::TokenKind;

/// The scope kind a block's body is analyzed under (spec §3's `Scope.kind`
/// set, minus `module`/`function`/`block` which are not block-plugin-driven).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlockKind {
    Server,
    Browser,
    Shared,
    Test,
    Bench,
    Cli,
    Data,
    Security,
    Deploy,
}

impl BlockKind {
    pub fn as_str(self) -> &'static str {
        match self {
            BlockKind::Server => "server",
            BlockKind::Browser => "browser",
            BlockKind::Shared => "shared",
            BlockKind::Test => "test",
            BlockKind::Bench => "bench",
            BlockKind::Cli => "cli",
            BlockKind::Data => "data",
            BlockKind::Security => "security",
            BlockKind::Deploy => "deploy",
        }
    }

    /// `true` for blocks that may be declared multiple times under distinct
    /// names and registered as RPC peers (spec §4.2: "multiple named
    /// `server` blocks with distinct names are legal").
    pub fn supports_peers(self) -> bool {
        matches!(self, BlockKind::Server)
    }
}

/// How the parser recognizes a block's opening at the top level.
#[derive(Debug, Clone, Copy)]
pub enum BlockTrigger {
    /// Triggered by a specific reserved-word token (`server`, `browser`, ...).
    Keyword(TokenKind),
    /// Triggered when a plain identifier with this text is followed by an
    /// optional string name and `{` (`cli`, `data`, `security`, `deploy`).
    Identifier(&'static str),
}

/// One registered block plugin.
#[derive(Debug, Clone, Copy)]
pub struct BlockPlugin {
    pub name: &'static str,
    pub trigger: BlockTrigger,
    pub kind: BlockKind,
}

/// An error raised when registering a plugin whose name is already taken.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DuplicatePluginError(pub String);

impl std::fmt::Display for DuplicatePluginError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "block plugin '{}' is already registered", self.0)
    }
}

impl std::error::Error for DuplicatePluginError {}

/// The block plugin table. Built once per process via [`BlockRegistry::standard`]
/// and treated as read-only afterward; [`BlockRegistry::register`] exists for
/// embedding hosts that add custom block kinds, and rejects a name collision.
#[derive(Debug, Clone, Default)]
pub struct BlockRegistry {
    plugins: Vec<BlockPlugin>,
}

impl BlockRegistry {
    pub fn new() -> Self {
        Self { plugins: Vec::new() }
    }

    /// The registry pre-populated with the nine block kinds named in spec §1/§2.
    pub fn standard() -> Self {
        let mut registry = Self::new();
        for plugin in [
            BlockPlugin { name: "server", trigger: BlockTrigger::Keyword(TokenKind::Server), kind: BlockKind::Server },
            BlockPlugin { name: "browser", trigger: BlockTrigger::Keyword(TokenKind::Browser), kind: BlockKind::Browser },
            BlockPlugin { name: "shared", trigger: BlockTrigger::Keyword(TokenKind::Shared), kind: BlockKind::Shared },
            BlockPlugin { name: "test", trigger: BlockTrigger::Keyword(TokenKind::Test), kind: BlockKind::Test },
            BlockPlugin { name: "bench", trigger: BlockTrigger::Keyword(TokenKind::Bench), kind: BlockKind::Bench },
            BlockPlugin { name: "cli", trigger: BlockTrigger::Identifier("cli"), kind: BlockKind::Cli },
            BlockPlugin { name: "data", trigger: BlockTrigger::Identifier("data"), kind: BlockKind::Data },
            BlockPlugin { name: "security", trigger: BlockTrigger::Identifier("security"), kind: BlockKind::Security },
            BlockPlugin { name: "deploy", trigger: BlockTrigger::Identifier("deploy"), kind: BlockKind::Deploy },
        ] {
            registry.register(plugin).expect("standard plugin names are distinct");
        }
        registry
    }

    /// Registers a plugin. Errors if a plugin with the same name already exists.
    pub fn register(&mut self, plugin: BlockPlugin) -> Result<(), DuplicatePluginError> {
        if self.plugins.iter().any(|p| p.name == plugin.name) {
            return Err(DuplicatePluginError(plugin.name.to_string()));
        }
        self.plugins.push(plugin);
        Ok(())
    }

    /// Looks up a keyword-strategy plugin by the token kind that opens it.
    pub fn lookup_keyword(&self, kind: TokenKind) -> Option<&BlockPlugin> {
        self.plugins.iter().find(|p| matches!(p.trigger, BlockTrigger::Keyword(k) if k == kind))
    }

    /// Looks up an identifier-strategy plugin by its trigger text.
    pub fn lookup_identifier(&self, text: &str) -> Option<&BlockPlugin> {
        self.plugins.iter().find(|p| matches!(p.trigger, BlockTrigger::Identifier(s) if s == text))
    }

    pub fn plugins(&self) -> &[BlockPlugin] {
        &self.plugins
    }
}

/// Tracks named server (and other peer-capable) blocks declared in one
/// compilation, so the analyzer can resolve `peer.fn(...)` inter-server RPC
/// calls (spec §4.3).
#[derive(Debug, Clone, Default)]
pub struct PeerTable {
    peers: std::collections::HashMap<String, BlockKind>,
}

impl PeerTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, name: String, kind: BlockKind) {
        self.peers.insert(name, kind);
    }

    pub fn get(&self, name: &str) -> Option<BlockKind> {
        self.peers.get(name).copied()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.peers.contains_key(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn standard_registry_resolves_all_nine_block_kinds() {
        let registry = BlockRegistry::standard();
        assert_eq!(registry.lookup_keyword(TokenKind::Server).unwrap().kind, BlockKind::Server);
        assert_eq!(registry.lookup_keyword(TokenKind::Browser).unwrap().kind, BlockKind::Browser);
        assert_eq!(registry.lookup_keyword(TokenKind::Shared).unwrap().kind, BlockKind::Shared);
        assert_eq!(registry.lookup_keyword(TokenKind::Test).unwrap().kind, BlockKind::Test);
        assert_eq!(registry.lookup_keyword(TokenKind::Bench).unwrap().kind, BlockKind::Bench);
        assert_eq!(registry.lookup_identifier("cli").unwrap().kind, BlockKind::Cli);
        assert_eq!(registry.lookup_identifier("data").unwrap().kind, BlockKind::Data);
        assert_eq!(registry.lookup_identifier("security").unwrap().kind, BlockKind::Security);
        assert_eq!(registry.lookup_identifier("deploy").unwrap().kind, BlockKind::Deploy);
    }

    #[test]
    fn registering_duplicate_name_is_an_error() {
        let mut registry = BlockRegistry::standard();
        let err = registry
            .register(BlockPlugin { name: "server", trigger: BlockTrigger::Keyword(TokenKind::Server), kind: BlockKind::Server })
            .unwrap_err();
        assert_eq!(err.0, "server");
    }

    #[test]
    fn unrecognized_identifier_is_not_a_block() {
        let registry = BlockRegistry::standard();
        assert!(registry.lookup_identifier("notablock").is_none());
    }

    #[test]
    fn only_server_blocks_support_peers() {
        assert!(BlockKind::Server.supports_peers());
        assert!(!BlockKind::Browser.supports_peers());
    }

    #[test]
    fn peer_table_tracks_named_blocks() {
        let mut table = PeerTable::new();
        table.register("api".to_string(), BlockKind::Server);
        assert!(table.contains("api"));
        assert_eq!(table.get("api"), Some(BlockKind::Server));
        assert_eq!(table.get("missing"), None);
    }
}
