//! Command-line argument parsing and dispatch for `tova` (spec §6 "CLI
//! surface"). `build`/`run`/`check` drive the core pipeline directly;
//! `fmt`/`test`/`bench`/`doc`/`lsp`/`deploy` are thin stubs over external
//! collaborators spec names as out of scope.

use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;

use clap::{Parser, Subcommand};
use log::{debug, info};

use tova_compile::{compile, CompileOptions, CompileOutput};

use crate::manifest::{find_project_root, Manifest};

#[derive(Parser)]
#[command(name = "tova")]
#[command(about = "The Tova full-stack compiler", long_about = None)]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Compile the project and write each populated target to `dist/`.
    Build {
        /// Analyzer strict mode: gradual type violations become errors.
        #[arg(long)]
        strict: bool,
        /// Parser/analyzer tolerant mode (accumulate diagnostics, don't halt).
        #[arg(long)]
        tolerant: bool,
    },
    /// Build, then execute the chosen target with an external JS runtime.
    Run {
        #[arg(long)]
        strict: bool,
        #[arg(long)]
        tolerant: bool,
        /// Which emitted target to execute.
        #[arg(long, default_value = "server")]
        target: String,
    },
    /// Analyze only, reporting diagnostics without emitting JS.
    Check {
        #[arg(long)]
        strict: bool,
        #[arg(long)]
        tolerant: bool,
    },
    /// Reformat the project's source in place.
    Fmt,
    /// Run the project's `test` blocks.
    Test,
    /// Run the project's `bench` blocks.
    Bench,
    /// Generate documentation from declarations and docstrings.
    Doc,
    /// Start the language server.
    Lsp,
    /// Provision and push the inferred deployment manifest.
    Deploy,
}

pub fn run_cli() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();
    let cli = Cli::parse();

    match cli.command {
        Commands::Build { strict, tolerant } => cmd_build(strict, tolerant),
        Commands::Run { strict, tolerant, target } => cmd_run(strict, tolerant, &target),
        Commands::Check { strict, tolerant } => cmd_check(strict, tolerant),
        Commands::Fmt => unimplemented_stub("fmt"),
        Commands::Test => unimplemented_stub("test"),
        Commands::Bench => unimplemented_stub("bench"),
        Commands::Doc => unimplemented_stub("doc"),
        Commands::Lsp => cmd_lsp(),
        Commands::Deploy => cmd_deploy(),
    }
}

fn unimplemented_stub(name: &str) -> Result<(), Box<dyn std::error::Error>> {
    println!("`tova {name}` is not yet implemented; it is driven by a collaborator outside this compiler's scope.");
    Ok(())
}

fn load_project() -> Result<(PathBuf, Manifest), Box<dyn std::error::Error>> {
    let cwd = std::env::current_dir()?;
    let root = find_project_root(&cwd).ok_or("not in a Tova project (tova.toml not found)")?;
    let manifest = Manifest::load(&root)?;
    Ok((root, manifest))
}

fn run_pipeline(strict: bool, tolerant: bool) -> Result<(Manifest, CompileOutput), Box<dyn std::error::Error>> {
    let (root, manifest) = load_project()?;
    let entry_path = root.join(&manifest.package.entry);
    info!("compiling {}", entry_path.display());
    let source = fs::read_to_string(&entry_path)?;

    let options = CompileOptions { strict, tolerant, project_name: manifest.package.name.clone() };
    let output = compile(&source, &manifest.package.entry, &options);
    debug!("{} error(s), {} warning(s)", output.diagnostics.errors.len(), output.diagnostics.warnings.len());

    for warning in &output.diagnostics.warnings {
        eprintln!("{}", warning.message);
    }
    for error in &output.diagnostics.errors {
        eprintln!("{}", error.message);
    }

    Ok((manifest, output))
}

fn cmd_build(strict: bool, tolerant: bool) -> Result<(), Box<dyn std::error::Error>> {
    let (_, output) = run_pipeline(strict, tolerant)?;
    if !output.diagnostics.errors.is_empty() {
        return Err(format!("{} error(s) during compilation", output.diagnostics.errors.len()).into());
    }

    let dist = Path::new("dist");
    fs::create_dir_all(dist)?;
    let mut written = Vec::new();
    for (name, content) in [("shared", &output.shared), ("server", &output.server), ("browser", &output.browser), ("test", &output.test), ("bench", &output.bench)] {
        if !content.is_empty() {
            let path = dist.join(format!("{name}.js"));
            fs::write(&path, content)?;
            written.push(path);
        }
    }
    for path in &written {
        println!("wrote {}", path.display());
    }

    if let Some(manifest) = &output.deploy_manifest {
        let manifest_path = dist.join("deploy.json");
        fs::write(&manifest_path, serde_json::to_string_pretty(manifest)?)?;
        println!("wrote {}", manifest_path.display());
    }

    Ok(())
}

fn cmd_check(strict: bool, tolerant: bool) -> Result<(), Box<dyn std::error::Error>> {
    let (_, output) = run_pipeline(strict, tolerant)?;
    if output.diagnostics.errors.is_empty() {
        println!("check passed");
        Ok(())
    } else {
        Err(format!("{} error(s)", output.diagnostics.errors.len()).into())
    }
}

fn cmd_run(strict: bool, tolerant: bool, target: &str) -> Result<(), Box<dyn std::error::Error>> {
    cmd_build(strict, tolerant)?;
    let js_path = Path::new("dist").join(format!("{target}.js"));
    if !js_path.exists() {
        return Err(format!("target '{target}' produced no output (is dist/{target}.js empty?)").into());
    }

    info!("executing {}", js_path.display());
    let status = Command::new("bun").arg(&js_path).status().map_err(|e| format!("failed to launch 'bun': {e} (is it installed?)"))?;
    if !status.success() {
        std::process::exit(status.code().unwrap_or(1));
    }
    Ok(())
}

/// No stdio transport: this is the capability-reporting stub spec keeps in
/// scope, backed by the same analyzer the core pipeline already runs.
/// Hover/definition-shaped queries run in-process against the last
/// successful `check`/`build`, not over a wire protocol.
fn cmd_lsp() -> Result<(), Box<dyn std::error::Error>> {
    let (_, output) = run_pipeline(false, true)?;
    println!("{{\"capabilities\": {{\"hoverProvider\": true, \"definitionProvider\": true}}, \"stdio_transport\": false}}");
    println!(
        "{} diagnostic(s) available for the current project; no language-server transport is implemented, only in-process semantic queries.",
        output.diagnostics.errors.len() + output.diagnostics.warnings.len()
    );
    Ok(())
}

fn cmd_deploy() -> Result<(), Box<dyn std::error::Error>> {
    let dist = Path::new("dist/deploy.json");
    if !dist.exists() {
        return Err("no deployment manifest found; run `tova build` first".into());
    }
    println!("deployment manifest at {}; provisioning is handled by an external collaborator", dist.display());
    Ok(())
}
