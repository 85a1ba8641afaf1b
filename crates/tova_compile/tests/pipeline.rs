use tova_compile::{compile, CompileOptions};

fn opts() -> CompileOptions {
    CompileOptions { strict: false, tolerant: false, project_name: "demo".to_string() }
}

#[test]
fn shared_module_compiles_to_plain_functions() {
    let source = "pub fn greet(name) {\n  return \"hi \" + name\n}\n";
    let output = compile(source, "main.tova", &opts());
    assert!(output.is_module);
    assert!(output.diagnostics.errors.is_empty());
    assert!(output.shared.contains("function greet"));
    assert!(output.server.is_empty());
    assert!(output.browser.is_empty());
}

#[test]
fn server_and_browser_blocks_emit_separate_targets() {
    let source = "\
shared {\n\
  pub fn double(x) {\n\
    return x * 2\n\
  }\n\
}\n\
server {\n\
  fn handleDouble(req) {\n\
    return double(1)\n\
  }\n\
  route GET \"/double\" => handleDouble\n\
}\n\
browser {\n\
  fn onClick() {\n\
    return double(2)\n\
  }\n\
}\n";
    let output = compile(source, "main.tova", &opts());
    assert!(!output.is_module);
    assert!(output.diagnostics.errors.is_empty(), "unexpected errors: {:?}", output.diagnostics.errors);
    assert!(output.shared.contains("function double"));
    assert!(output.server.contains("function double"), "server buffer should inline shared decls");
    assert!(output.server.contains("/double"));
    assert!(output.browser.contains("function double"));
    assert!(output.browser.contains("onClick"));
}

#[test]
fn websocket_and_db_blocks_surface_in_deployment_manifest() {
    let source = "\
server {\n\
  db orders {\n\
    engine: \"postgres\"\n\
  }\n\
  websocket \"/live\" {\n\
  }\n\
}\n\
security {\n\
  let token = env(\"API_TOKEN\")\n\
}\n";
    let output = compile(source, "main.tova", &opts());
    assert!(output.diagnostics.errors.is_empty(), "unexpected errors: {:?}", output.diagnostics.errors);
    let manifest = output.deploy_manifest.expect("manifest present on successful compile");
    assert!(manifest.capabilities.has_websocket);
    assert_eq!(manifest.databases.len(), 1);
    assert_eq!(manifest.databases[0].engine, "postgres");
    assert!(manifest.required_secrets.contains("API_TOKEN"));
    assert!(manifest.required_components.contains("bun"));
    assert!(manifest.required_components.contains("ufw"));
}

#[test]
fn tolerant_mode_collects_errors_instead_of_halting() {
    let source = "pub fn f() {\n  return undeclared_one + undeclared_two\n}\n";
    let options = CompileOptions { tolerant: true, ..opts() };
    let output = compile(source, "main.tova", &options);
    assert!(output.diagnostics.errors.len() >= 1);
}

#[test]
fn scalar_replacement_collapses_ok_err_branch_into_two_locals() {
    let source = "\
fn f(x) {\n\
  r = if x > 0 {\n\
    Ok(x)\n\
  } else {\n\
    Err(\"bad\")\n\
  }\n\
  if r.isOk() {\n\
    r.unwrap()\n\
  } else {\n\
    -1\n\
  }\n\
}\n";
    let output = compile(source, "main.tova", &opts());
    assert!(output.diagnostics.errors.is_empty(), "unexpected errors: {:?}", output.diagnostics.errors);
    assert!(!output.shared.contains("Ok("), "scalar replacement should avoid constructing Ok at all");
    assert!(!output.shared.contains("Err("), "scalar replacement should avoid constructing Err at all");
    assert!(output.shared.contains("r__ok"));
    assert!(output.shared.contains("r__v"));
}

#[test]
fn component_style_block_scopes_selectors_and_injects_css() {
    let source = "\
browser {\n\
  component Card(label) {\n\
    style {\n\
      .card:hover { color: red }\n\
      @keyframes spin { from { } to { } }\n\
      :global(body) { margin: 0 }\n\
    }\n\
    return <div class=\"card\">Hello</div>\n\
  }\n\
}\n";
    let output = compile(source, "main.tova", &opts());
    assert!(output.diagnostics.errors.is_empty(), "unexpected errors: {:?}", output.diagnostics.errors);
    assert!(output.browser.contains(".card[data-tova-"), "hover selector should gain the scope attribute");
    assert!(output.browser.contains(":hover"));
    assert!(output.browser.contains("from { } to { }") || output.browser.contains("from {  } to {  }"), "keyframes inner selectors stay unscoped");
    assert!(output.browser.contains("body { margin: 0 }"), ":global(body) is unwrapped and left unscoped");
    assert!(output.browser.contains("tova_inject_css("));
    assert!(output.browser.contains("tova_scope_root("));
}

#[test]
fn strict_mode_rejects_what_gradual_mode_only_warns_about() {
    let source = "pub fn f() -> Int {\n  return 3.5\n}\n";
    let gradual = compile(source, "main.tova", &opts());
    assert!(gradual.diagnostics.errors.is_empty(), "gradual mode should only warn about an implicit Float -> Int narrowing");
    assert!(!gradual.diagnostics.warnings.is_empty());

    let strict_options = CompileOptions { strict: true, ..opts() };
    let strict = compile(source, "main.tova", &strict_options);
    assert!(!strict.diagnostics.errors.is_empty(), "strict mode should reject the same narrowing as an error");
}
