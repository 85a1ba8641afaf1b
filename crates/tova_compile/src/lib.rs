//! The `compile()` entry point: wires lexer, parser, analyzer, codegen,
//! and deployment inference into the single call spec §6 names as the
//! compiler's outbound surface.
//!
//! Everything arena/interner/`Program`-shaped lives and dies inside
//! [`compile`] — callers only ever see owned `String`s, formatted
//! diagnostics, and the deployment manifest, matching spec §5's "one
//! compilation consumes one source file and produces its outputs in
//! sequence" (no AST reference outlives the call).

use serde::Serialize;

use tova_ast::Arenas;
use tova_base::{DiagnosticBag, Interner, Severity};
use tova_registry::BlockRegistry;

/// `--strict`/`--tolerant`, spec §6's flags recognized by the core path.
#[derive(Debug, Clone, Default)]
pub struct CompileOptions {
    pub strict: bool,
    pub tolerant: bool,
    /// Project name fed into the deployment manifest; the AST itself
    /// never names the project.
    pub project_name: String,
}

/// One formatted diagnostic line plus its severity, for hosts that want to
/// filter/count without re-parsing `format!`'d text.
#[derive(Debug, Clone, Serialize)]
pub struct CompiledDiagnostic {
    pub severity: String,
    pub message: String,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct Diagnostics {
    pub errors: Vec<CompiledDiagnostic>,
    pub warnings: Vec<CompiledDiagnostic>,
}

/// The compiler's outbound object (spec §6): up to four emitted JS
/// artifacts keyed by target, the `isModule` flag, diagnostics, and the
/// inferred deployment manifest. `source_mappings` is carried as an empty
/// placeholder — spec lists it in the outbound shape but never defines its
/// contents, and no collaborator in scope here consumes it.
#[derive(Debug, Clone, Serialize)]
pub struct CompileOutput {
    pub shared: String,
    pub server: String,
    pub browser: String,
    pub test: String,
    pub bench: String,
    pub is_module: bool,
    pub source_mappings: Vec<String>,
    pub diagnostics: Diagnostics,
    pub deploy_manifest: Option<tova_deploy::DeploymentManifest>,
}

/// Compiles one Tova source file to its JS targets, diagnostics, and
/// deployment manifest.
///
/// A lexer failure is fatal (per `tova_lexer`'s own doc comment) and
/// short-circuits with every other field empty/default. A non-tolerant
/// parse or analysis failure stops before codegen, returning whatever
/// diagnostics were collected up to that point.
pub fn compile(source: &str, filename: &str, options: &CompileOptions) -> CompileOutput {
    let mut interner = Interner::new();
    let file = interner.intern(filename);
    let arenas = Arenas::new();
    let registry = BlockRegistry::standard();

    let mut diagnostics = DiagnosticBag::new();

    let tokens = match tova_lexer::tokenize(source, &mut interner) {
        Ok(tokens) => tokens,
        Err(err) => {
            return empty_output(Diagnostics { errors: vec![CompiledDiagnostic { severity: "error".to_string(), message: err.to_string() }], warnings: vec![] });
        }
    };

    let outcome = match tova_parser::parse_program(&tokens, file, &arenas, &mut interner, &registry, options.tolerant) {
        Ok(outcome) => outcome,
        Err(failure) => {
            return empty_output(render_diagnostics(failure.diagnostics, &interner));
        }
    };
    diagnostics.extend(outcome.diagnostics);

    let analysis_options = tova_semantic::AnalysisOptions { tolerant: options.tolerant, strict: options.strict };
    let analysis = tova_semantic::analyze(&outcome.program, &mut interner, analysis_options);
    let had_fatal_error = !options.tolerant && analysis.diagnostics.has_errors();
    diagnostics.extend(analysis.diagnostics);

    if had_fatal_error {
        return empty_output(render_diagnostics(diagnostics, &interner));
    }

    let compiled = tova_codegen::compile_program(&outcome.program, &interner);
    let deploy_manifest = tova_deploy::infer_manifest(&outcome.program, &options.project_name, &interner);

    CompileOutput {
        shared: compiled.shared.unwrap_or_default(),
        server: compiled.server.unwrap_or_default(),
        browser: compiled.browser.unwrap_or_default(),
        test: compiled.test.unwrap_or_default(),
        bench: compiled.bench.unwrap_or_default(),
        is_module: outcome.program.is_module_mode(),
        source_mappings: Vec::new(),
        diagnostics: render_diagnostics(diagnostics, &interner),
        deploy_manifest: Some(deploy_manifest),
    }
}

fn empty_output(diagnostics: Diagnostics) -> CompileOutput {
    CompileOutput {
        shared: String::new(),
        server: String::new(),
        browser: String::new(),
        test: String::new(),
        bench: String::new(),
        is_module: false,
        source_mappings: Vec::new(),
        diagnostics,
        deploy_manifest: None,
    }
}

fn render_diagnostics(bag: DiagnosticBag, interner: &Interner) -> Diagnostics {
    Diagnostics {
        errors: bag.errors.iter().map(|d| CompiledDiagnostic { severity: Severity::Error.to_string(), message: d.format(interner) }).collect(),
        warnings: bag.warnings.iter().map(|d| CompiledDiagnostic { severity: Severity::Warning.to_string(), message: d.format(interner) }).collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn opts() -> CompileOptions {
        CompileOptions { strict: false, tolerant: false, project_name: "demo".to_string() }
    }

    #[test]
    fn module_mode_source_emits_shared_only() {
        let source = "pub fn add(a, b) {\n  return a + b\n}\n";
        let output = compile(source, "main.tova", &opts());
        assert!(output.is_module);
        assert!(output.shared.contains("function add"));
        assert!(output.server.is_empty());
        assert!(output.diagnostics.errors.is_empty());
    }

    #[test]
    fn lex_failure_returns_fatal_diagnostic() {
        let source = "\"unterminated";
        let output = compile(source, "main.tova", &opts());
        assert!(!output.diagnostics.errors.is_empty());
        assert_eq!(output.shared, "");
    }

    #[test]
    fn undefined_identifier_is_reported_as_error() {
        let source = "pub fn f() {\n  return undeclared_name\n}\n";
        let output = compile(source, "main.tova", &opts());
        assert!(!output.diagnostics.errors.is_empty());
    }

    #[test]
    fn server_block_emits_rpc_surface_and_manifest() {
        let source = "server {\n  fn ping() {\n    return 1\n  }\n}\n";
        let output = compile(source, "main.tova", &opts());
        assert!(!output.is_module);
        assert!(output.server.contains("/rpc/ping"));
        let manifest = output.deploy_manifest.expect("manifest present on successful compile");
        assert!(manifest.block_kinds.contains("server"));
        assert!(manifest.required_components.contains("bun"));
    }
}
