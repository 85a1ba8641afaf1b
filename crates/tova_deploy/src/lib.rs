//! Deployment manifest inference (spec §4.5): one AST walk producing host/
//! instance/health-check defaults, the declared database set, the runtime
//! components a `deploy` step needs to provision, and the capability flags
//! and required secrets the rest of the program implies.
//!
//! This crate never shells out to a provisioner — spec's Non-goals name
//! "the deployment provisioner (shell/systemd/Caddy generators)" as an
//! external collaborator. It only produces the data those generators would
//! consume.

use std::collections::{BTreeMap, BTreeSet};

use serde::Serialize;
use tova_ast::{Block, Decl, Expr, Literal, Program, Stmt, TopLevelItem};
use tova_base::{Interner, Symbol};

/// One declared (or inferred) database: engine name plus its raw config
/// entries, kept as strings since the manifest is a reporting artifact,
/// not something re-fed through the type system.
#[derive(Debug, Clone, Serialize, PartialEq, Eq, PartialOrd, Ord)]
pub struct DatabaseSpec {
    pub engine: String,
    pub config: BTreeMap<String, String>,
}

/// Capability flags a `deploy` provisioner would branch on.
#[derive(Debug, Clone, Default, Serialize, PartialEq, Eq)]
pub struct Capabilities {
    pub has_websocket: bool,
    pub has_sse: bool,
    pub has_browser: bool,
}

/// The inferred (and possibly `deploy`-block-overridden) deployment
/// manifest, spec §4.5.
#[derive(Debug, Clone, Serialize)]
pub struct DeploymentManifest {
    pub project_name: String,
    pub host: String,
    pub domain: Option<String>,
    pub instances: u32,
    pub memory_limit_mb: u32,
    pub health_check_path: String,
    pub health_check_interval_s: u32,
    pub health_check_timeout_s: u32,
    pub restart_policy: String,
    pub retained_releases: u32,
    pub env: BTreeMap<String, String>,
    pub databases: Vec<DatabaseSpec>,
    pub required_components: BTreeSet<String>,
    pub capabilities: Capabilities,
    pub required_secrets: BTreeSet<String>,
    pub block_kinds: BTreeSet<String>,
}

impl Default for DeploymentManifest {
    /// The inferred-defaults baseline a bare program (no `deploy` block)
    /// gets before any block presence or override is applied.
    fn default() -> Self {
        Self {
            project_name: "tova-app".to_string(),
            host: "0.0.0.0".to_string(),
            domain: None,
            instances: 1,
            memory_limit_mb: 512,
            health_check_path: "/health".to_string(),
            health_check_interval_s: 30,
            health_check_timeout_s: 5,
            restart_policy: "on-failure".to_string(),
            retained_releases: 3,
            env: BTreeMap::new(),
            databases: Vec::new(),
            required_components: BTreeSet::new(),
            capabilities: Capabilities::default(),
            required_secrets: BTreeSet::new(),
            block_kinds: BTreeSet::new(),
        }
    }
}

/// Walks `program` once and produces its deployment manifest. `project_name`
/// comes from the caller (the manifest file `tova_cli` reads), since nothing
/// in the AST itself names the project.
pub fn infer_manifest(program: &Program<'_>, project_name: &str, interner: &Interner) -> DeploymentManifest {
    let mut manifest = DeploymentManifest { project_name: project_name.to_string(), ..Default::default() };

    if program.is_module_mode() {
        return manifest;
    }

    for block in program.blocks() {
        manifest.block_kinds.insert(block.kind_name().to_string());
        match block {
            Block::Server(_) => {
                manifest.required_components.insert("bun".to_string());
            }
            Block::Browser(_) => {
                manifest.capabilities.has_browser = true;
                manifest.required_components.insert("caddy".to_string());
            }
            Block::Security(_) => {
                manifest.required_components.insert("ufw".to_string());
            }
            _ => {}
        }
    }

    let decls = top_level_decls(program);
    for decl in &decls {
        match decl {
            Decl::Websocket(_) => manifest.capabilities.has_websocket = true,
            Decl::Sse(_) => manifest.capabilities.has_sse = true,
            Decl::Db(db) => {
                let config = config_map(db.config, interner);
                let engine = config.get("engine").cloned().unwrap_or_else(|| "postgres".to_string());
                merge_database(&mut manifest.databases, DatabaseSpec { engine, config });
            }
            _ => {}
        }
    }

    for block in program.blocks() {
        if let Block::Security(_) = block {
            for stmt in block.body().items.iter() {
                collect_env_calls(stmt, interner, &mut manifest.required_secrets);
            }
        }
    }

    for block in program.blocks() {
        if let Block::Deploy(_) = block {
            apply_deploy_overrides(&mut manifest, block.body().items, interner);
        }
    }

    manifest
}

fn top_level_decls<'a>(program: &'a Program<'a>) -> Vec<&'a Decl<'a>> {
    let mut out: Vec<&Decl<'_>> = program
        .items
        .iter()
        .filter_map(|item| match item {
            TopLevelItem::Decl(d) => Some(d),
            TopLevelItem::Block(_) => None,
        })
        .collect();
    for block in program.blocks() {
        for stmt in block.body().items.iter() {
            if let Stmt::Decl { decl, .. } = stmt {
                out.push(decl);
            }
        }
    }
    out
}

fn config_map(config: &[(Symbol, Expr<'_>)], interner: &Interner) -> BTreeMap<String, String> {
    config
        .iter()
        .map(|(key, value)| (interner.resolve(*key).to_string(), literal_text(value, interner)))
        .collect()
}

/// Renders a literal expression to plain text for the manifest; a
/// non-literal config value (a computed expression) renders as its source
/// identifier name, the best a reporting artifact can do without
/// evaluating the program.
fn literal_text(expr: &Expr<'_>, interner: &Interner) -> String {
    match expr {
        Expr::Literal { value: Literal::String(sym), .. } => interner.resolve(*sym).to_string(),
        Expr::Literal { value: Literal::Number(sym), .. } => interner.resolve(*sym).to_string(),
        Expr::Literal { value: Literal::Bool(b), .. } => b.to_string(),
        Expr::Literal { value: Literal::Nil, .. } => "nil".to_string(),
        Expr::Identifier { name, .. } => interner.resolve(*name).to_string(),
        _ => String::new(),
    }
}

fn merge_database(databases: &mut Vec<DatabaseSpec>, spec: DatabaseSpec) {
    match databases.iter_mut().find(|d| d.engine == spec.engine) {
        Some(existing) => existing.config.extend(spec.config),
        None => databases.push(spec),
    }
}

/// Finds every `env("NAME")` call reachable from `stmt`, the syntactic
/// trigger spec names for the deployment inferencer's required-secrets set.
fn collect_env_calls(stmt: &Stmt<'_>, interner: &Interner, out: &mut BTreeSet<String>) {
    match stmt {
        Stmt::Decl { .. } => {}
        Stmt::Let { value, .. } => {
            if let Some(v) = value {
                collect_env_calls_expr(v, interner, out);
            }
        }
        Stmt::LetDestructure { value, .. } => collect_env_calls_expr(value, interner, out),
        Stmt::Assign { target, value, .. } | Stmt::CompoundAssign { target, value, .. } => {
            collect_env_calls_expr(target, interner, out);
            collect_env_calls_expr(value, interner, out);
        }
        Stmt::Expr { expr, .. } => collect_env_calls_expr(expr, interner, out),
        Stmt::Block { block, .. } => block.statements.iter().for_each(|s| collect_env_calls(s, interner, out)),
        Stmt::Return { value, .. } => {
            if let Some(v) = value {
                collect_env_calls_expr(v, interner, out);
            }
        }
        Stmt::If { condition, then_branch, else_branch, .. } => {
            collect_env_calls_expr(condition, interner, out);
            then_branch.statements.iter().for_each(|s| collect_env_calls(s, interner, out));
            if let Some(b) = else_branch {
                b.statements.iter().for_each(|s| collect_env_calls(s, interner, out));
            }
        }
        Stmt::For { stmt, .. } => {
            collect_env_calls_expr(stmt.iterable, interner, out);
            stmt.body.statements.iter().for_each(|s| collect_env_calls(s, interner, out));
            if let Some(b) = &stmt.else_branch {
                b.statements.iter().for_each(|s| collect_env_calls(s, interner, out));
            }
        }
        Stmt::While { condition, body, .. } => {
            collect_env_calls_expr(condition, interner, out);
            body.statements.iter().for_each(|s| collect_env_calls(s, interner, out));
        }
        Stmt::Loop { body, .. } => body.statements.iter().for_each(|s| collect_env_calls(s, interner, out)),
        Stmt::Match { subject, arms, .. } => {
            collect_env_calls_expr(subject, interner, out);
            for arm in arms.iter() {
                arm.body.statements.iter().for_each(|s| collect_env_calls(s, interner, out));
            }
        }
        Stmt::Break { .. } | Stmt::Continue { .. } => {}
        Stmt::Guard { condition, else_branch, .. } => {
            collect_env_calls_expr(condition, interner, out);
            else_branch.statements.iter().for_each(|s| collect_env_calls(s, interner, out));
        }
        Stmt::With { resource, body, .. } => {
            collect_env_calls_expr(resource, interner, out);
            body.statements.iter().for_each(|s| collect_env_calls(s, interner, out));
        }
        Stmt::Defer { body, .. } => body.statements.iter().for_each(|s| collect_env_calls(s, interner, out)),
        Stmt::TryCatch { try_block, catch_block, finally_block, .. } => {
            try_block.statements.iter().for_each(|s| collect_env_calls(s, interner, out));
            catch_block.statements.iter().for_each(|s| collect_env_calls(s, interner, out));
            if let Some(b) = finally_block {
                b.statements.iter().for_each(|s| collect_env_calls(s, interner, out));
            }
        }
    }
}

fn collect_env_calls_expr(expr: &Expr<'_>, interner: &Interner, out: &mut BTreeSet<String>) {
    if let Expr::Call { callee, args, .. } = expr {
        if let Expr::Identifier { name, .. } = callee {
            if interner.resolve(*name) == "env" {
                if let Some(arg) = args.first() {
                    if let Expr::Literal { value: Literal::String(sym), .. } = arg.value {
                        out.insert(interner.resolve(sym).to_string());
                    }
                }
            }
        }
    }
    for child in expr_children(expr) {
        collect_env_calls_expr(child, interner, out);
    }
}

/// The direct expression children of `expr`, used only to keep walking for
/// nested `env(...)` calls; exhaustive over every variant so a newly added
/// expression shape fails to compile here rather than silently skipping it.
fn expr_children<'a>(expr: &'a Expr<'a>) -> Vec<&'a Expr<'a>> {
    match expr {
        Expr::Literal { .. } | Expr::Identifier { .. } | Expr::Column { .. } => vec![],
        Expr::Binary { left, right, .. } => vec![left, right],
        Expr::Unary { operand, .. } => vec![operand],
        Expr::ChainedComparison { operands, .. } => operands.iter().collect(),
        Expr::Call { callee, args, .. } => {
            let mut v = vec![*callee];
            v.extend(args.iter().map(|a| a.value));
            v
        }
        Expr::Member { object, .. } | Expr::OptionalMember { object, .. } => vec![object],
        Expr::Index { object, index, .. } => vec![object, index],
        Expr::Slice { object, low, high, step, .. } => {
            let mut v = vec![*object];
            v.extend(low.iter().chain(high.iter()).chain(step.iter()).copied());
            v
        }
        Expr::Pipe { left, target, .. } => vec![left, target],
        Expr::Lambda { body, .. } => vec![body],
        Expr::Match { subject, arms, .. } => {
            let mut v = vec![*subject];
            v.extend(arms.iter().map(|a| a.body));
            v
        }
        Expr::Spread { inner, .. } | Expr::Await { inner, .. } | Expr::Propagate { inner, .. } => vec![inner],
        Expr::Yield { inner, .. } => inner.iter().copied().collect(),
        Expr::If { condition, then_branch, else_branch, .. } => {
            let mut v = vec![*condition, *then_branch];
            v.extend(else_branch.iter().copied());
            v
        }
        Expr::Is { subject, .. } => vec![subject],
        Expr::Membership { value, iterable, .. } => vec![value, iterable],
        Expr::CompoundAssign { target, value, .. } => vec![target, value],
        Expr::ListComprehension { comprehension, .. } | Expr::DictComprehension { comprehension, .. } => vec![comprehension.element],
        Expr::Range { low, high, .. } => vec![low, high],
        Expr::Tuple { elements, .. } | Expr::Array { elements, .. } => elements.iter().collect(),
        Expr::Dict { entries, .. } => entries.iter().flat_map(|(k, v)| [k, v]).collect(),
        Expr::Jsx { .. } => vec![],
        Expr::As { inner, .. } => vec![inner],
    }
}

/// Applies a `deploy { key = value; ... }` block's plain assignments over
/// the inferred defaults; databases declared via nested `db` decls merge
/// with the inferred set (spec: "deduplicated by engine").
fn apply_deploy_overrides(manifest: &mut DeploymentManifest, items: &[Stmt<'_>], interner: &Interner) {
    for stmt in items.iter() {
        match stmt {
            Stmt::Assign { target, value, .. } => {
                if let Expr::Identifier { name, .. } = target {
                    apply_override_field(manifest, interner.resolve(*name), value, interner);
                }
            }
            Stmt::Decl { decl: Decl::Db(db), .. } => {
                let config = config_map(db.config, interner);
                let engine = config.get("engine").cloned().unwrap_or_else(|| "postgres".to_string());
                merge_database(&mut manifest.databases, DatabaseSpec { engine, config });
            }
            _ => {}
        }
    }
}

fn apply_override_field(manifest: &mut DeploymentManifest, field: &str, value: &Expr<'_>, interner: &Interner) {
    let text = literal_text(value, interner);
    match field {
        "host" => manifest.host = text,
        "domain" => manifest.domain = Some(text),
        "instances" => {
            if let Ok(n) = text.parse() {
                manifest.instances = n;
            }
        }
        "memory_limit_mb" => {
            if let Ok(n) = text.parse() {
                manifest.memory_limit_mb = n;
            }
        }
        "health_check_path" => manifest.health_check_path = text,
        "health_check_interval_s" => {
            if let Ok(n) = text.parse() {
                manifest.health_check_interval_s = n;
            }
        }
        "health_check_timeout_s" => {
            if let Ok(n) = text.parse() {
                manifest.health_check_timeout_s = n;
            }
        }
        "restart_policy" => manifest.restart_policy = text,
        "retained_releases" => {
            if let Ok(n) = text.parse() {
                manifest.retained_releases = n;
            }
        }
        _ => {
            manifest.env.insert(field.to_string(), text);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tova_ast::Arenas;
    use tova_base::Location;

    fn loc(interner: &mut Interner) -> Location {
        let file = interner.intern("test.tova");
        Location::new(1, 1, file)
    }

    #[test]
    fn module_mode_program_gets_bare_defaults() {
        let mut interner = Interner::new();
        let arenas = Arenas::new();
        let program = Program { file: interner.intern("x"), items: arenas.items.alloc_slice(std::iter::empty()), location: loc(&mut interner) };
        let manifest = infer_manifest(&program, "demo", &interner);
        assert_eq!(manifest.instances, 1);
        assert!(manifest.block_kinds.is_empty());
        assert!(!manifest.capabilities.has_browser);
    }

    #[test]
    fn default_manifest_has_expected_health_check() {
        let manifest = DeploymentManifest::default();
        assert_eq!(manifest.health_check_path, "/health");
        assert_eq!(manifest.restart_policy, "on-failure");
    }

    #[test]
    fn merge_database_dedupes_by_engine() {
        let mut dbs = Vec::new();
        merge_database(&mut dbs, DatabaseSpec { engine: "postgres".into(), config: BTreeMap::from([("host".into(), "a".into())]) });
        merge_database(&mut dbs, DatabaseSpec { engine: "postgres".into(), config: BTreeMap::from([("port".into(), "5432".into())]) });
        assert_eq!(dbs.len(), 1);
        assert_eq!(dbs[0].config.len(), 2);
    }
}
