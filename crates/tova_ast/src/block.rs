//! Top-level blocks and the `Program` root.
//!
//! A Tova file is either **module mode** (only top-level `pub`
//! declarations, no blocks) or **application mode** (one or more of the
//! blocks below). The block registry (`tova_registry`) is what the parser
//! consults to recognize these; this module just defines their AST shape.

use tova_base::{Location, Symbol};

use crate::decl::Decl;
use crate::stmt::Stmt;

/// A block body: a sequence of declarations and statements, as they
/// appeared in source order.
#[derive(Debug, Clone)]
pub struct BlockBody<'a> {
    pub items: &'a [Stmt<'a>],
    pub location: Location,
}

/// `server ["name"] { ... }`.
#[derive(Debug, Clone)]
pub struct ServerBlock<'a> {
    pub name: Option<Symbol>,
    pub body: BlockBody<'a>,
    pub location: Location,
}

/// `browser { ... }`.
#[derive(Debug, Clone)]
pub struct BrowserBlock<'a> {
    pub name: Option<Symbol>,
    pub body: BlockBody<'a>,
    pub location: Location,
}

/// `shared { ... }`: emitted once, prefixed into every other target.
#[derive(Debug, Clone)]
pub struct SharedBlock<'a> {
    pub name: Option<Symbol>,
    pub body: BlockBody<'a>,
    pub location: Location,
}

/// `test ["name"] { ... }`.
#[derive(Debug, Clone)]
pub struct TestBlock<'a> {
    pub name: Option<Symbol>,
    pub body: BlockBody<'a>,
    pub location: Location,
}

/// `bench ["name"] { ... }`.
#[derive(Debug, Clone)]
pub struct BenchBlock<'a> {
    pub name: Option<Symbol>,
    pub body: BlockBody<'a>,
    pub location: Location,
}

/// `cli ["name"] { ... }`: identifier-strategy block declaring CLI commands.
#[derive(Debug, Clone)]
pub struct CliBlock<'a> {
    pub name: Option<Symbol>,
    pub body: BlockBody<'a>,
    pub location: Location,
}

/// `data ["name"] { ... }`: identifier-strategy block for table-pipeline
/// declarations (column expressions operate inside this block's functions).
#[derive(Debug, Clone)]
pub struct DataBlock<'a> {
    pub name: Option<Symbol>,
    pub body: BlockBody<'a>,
    pub location: Location,
}

/// `security ["name"] { ... }`: identifier-strategy block; `env("NAME")`
/// calls inside it feed the deployment inferencer's required-secrets set.
#[derive(Debug, Clone)]
pub struct SecurityBlock<'a> {
    pub name: Option<Symbol>,
    pub body: BlockBody<'a>,
    pub location: Location,
}

/// `deploy ["name"] { ... }`: identifier-strategy block overriding inferred
/// deployment manifest defaults.
#[derive(Debug, Clone)]
pub struct DeployBlock<'a> {
    pub name: Option<Symbol>,
    pub body: BlockBody<'a>,
    pub location: Location,
}

/// Any top-level block.
#[derive(Debug, Clone)]
pub enum Block<'a> {
    Server(ServerBlock<'a>),
    Browser(BrowserBlock<'a>),
    Shared(SharedBlock<'a>),
    Test(TestBlock<'a>),
    Bench(BenchBlock<'a>),
    Cli(CliBlock<'a>),
    Data(DataBlock<'a>),
    Security(SecurityBlock<'a>),
    Deploy(DeployBlock<'a>),
}

impl<'a> Block<'a> {
    pub fn location(&self) -> Location {
        match self {
            Block::Server(b) => b.location,
            Block::Browser(b) => b.location,
            Block::Shared(b) => b.location,
            Block::Test(b) => b.location,
            Block::Bench(b) => b.location,
            Block::Cli(b) => b.location,
            Block::Data(b) => b.location,
            Block::Security(b) => b.location,
            Block::Deploy(b) => b.location,
        }
    }

    pub fn name(&self) -> Option<Symbol> {
        match self {
            Block::Server(b) => b.name,
            Block::Browser(b) => b.name,
            Block::Shared(b) => b.name,
            Block::Test(b) => b.name,
            Block::Bench(b) => b.name,
            Block::Cli(b) => b.name,
            Block::Data(b) => b.name,
            Block::Security(b) => b.name,
            Block::Deploy(b) => b.name,
        }
    }

    pub fn body(&self) -> &BlockBody<'a> {
        match self {
            Block::Server(b) => &b.body,
            Block::Browser(b) => &b.body,
            Block::Shared(b) => &b.body,
            Block::Test(b) => &b.body,
            Block::Bench(b) => &b.body,
            Block::Cli(b) => &b.body,
            Block::Data(b) => &b.body,
            Block::Security(b) => &b.body,
            Block::Deploy(b) => &b.body,
        }
    }

    /// The keyword/identifier tag the block registry dispatched on, used by
    /// diagnostics and the deployment inferencer's "block kinds present" set.
    pub fn kind_name(&self) -> &'static str {
        match self {
            Block::Server(_) => "server",
            Block::Browser(_) => "browser",
            Block::Shared(_) => "shared",
            Block::Test(_) => "test",
            Block::Bench(_) => "bench",
            Block::Cli(_) => "cli",
            Block::Data(_) => "data",
            Block::Security(_) => "security",
            Block::Deploy(_) => "deploy",
        }
    }
}

/// A top-level item: either a block or a bare declaration (module mode).
#[derive(Debug, Clone)]
pub enum TopLevelItem<'a> {
    Block(Block<'a>),
    Decl(Decl<'a>),
}

/// The root AST node for one compiled file.
#[derive(Debug, Clone)]
pub struct Program<'a> {
    pub file: Symbol,
    pub items: &'a [TopLevelItem<'a>],
    pub location: Location,
}

impl<'a> Program<'a> {
    /// `true` when the file has no blocks at all — compiles in module mode,
    /// where `pub` top-level items become exports of the shared output.
    pub fn is_module_mode(&self) -> bool {
        !self.items.iter().any(|item| matches!(item, TopLevelItem::Block(_)))
    }

    pub fn blocks(&self) -> impl Iterator<Item = &Block<'a>> {
        self.items.iter().filter_map(|item| match item {
            TopLevelItem::Block(b) => Some(b),
            TopLevelItem::Decl(_) => None,
        })
    }
}
