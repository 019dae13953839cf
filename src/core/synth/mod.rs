//! Synthesis engine: one driver for three stack strategies.
//!
//! The engine owns the sequence (scaffold, place model blocks, synthesize a
//! contract-driven entrypoint, finalize) and the endpoint plan, so the
//! single-entrypoint and schema-driven endpoint synthesis invariants are
//! enforced once rather than per stack.

pub mod express;
pub mod flask;
pub mod spring;

use crate::core::contract::{looks_like_contract_block, resolve_contract, derive_resource_schema};
use crate::core::extractor::extract_blocks;
use crate::core::frontend::{
    pick_front_files, postprocess_front_files, regenerate_resource_ui, wants_checklist, FrontFiles,
};
use crate::core::resource::infer_resource;
use crate::core::sanitize::{lang_ext, looks_like_java, sanitize_generic_filename};
use crate::core::archive::build_archive;
use crate::domain::model::{
    CodeBlock, Contract, HttpMethod, ProjectFiles, StackPreset,
};
use crate::domain::ports::{EntrypointState, StackStrategy, SynthContext};
use crate::utils::error::Result;

/// Inputs for a full scaffolded project targeting one stack.
#[derive(Debug, Clone)]
pub struct StructuredRequest {
    pub task: String,
    pub language: String,
    pub front: String,
    pub back: String,
    pub qa: String,
    pub preset: StackPreset,
    pub project_name: String,
    pub group_id: String,
    pub contract: Option<Contract>,
}

pub fn strategy_for(preset: StackPreset) -> Box<dyn StackStrategy> {
    match preset {
        StackPreset::Flask => Box::new(flask::FlaskStrategy),
        StackPreset::Express => Box::new(express::ExpressStrategy),
        StackPreset::Spring => Box::new(spring::SpringStrategy),
    }
}

/// Full scaffolded project for one chosen stack.
pub fn synthesize_structured_archive(req: &StructuredRequest) -> Result<Vec<u8>> {
    let strategy = strategy_for(req.preset);
    let front_blocks = extract_blocks(&req.front);
    let back_blocks = extract_blocks(&req.back);

    let resource = infer_resource(
        &req.task,
        Some(&req.front),
        Some(&req.back),
        Some(&req.qa),
    );
    let contract = resolve_contract(
        req.contract.clone(),
        &back_blocks,
        &req.back,
        &resource,
    );
    let schema = derive_resource_schema(&contract, &resource);

    let ctx = SynthContext {
        task: req.task.clone(),
        language: req.language.clone(),
        project_name: req.project_name.clone(),
        group_id: req.group_id.clone(),
        resource,
        schema,
        contract,
        port: strategy.default_port(),
    };

    tracing::debug!(
        "Synthesizing structured project: preset={} resource={} endpoints={}",
        req.preset,
        ctx.resource,
        ctx.contract.endpoints.len()
    );

    let mut files = ProjectFiles::new();

    files.insert(
        "README.md".to_string(),
        structured_readme(req, &ctx, &strategy.run_notes(&ctx)),
    );
    files.insert(
        "docs/api_contract.json".to_string(),
        contract_json(&ctx.contract),
    );

    // Frontend: schema-driven regeneration when the contract carries the
    // full CRUD surface for the resource, postprocessed passthrough
    // otherwise.
    let front_files = if covers_all_resource_verbs(&ctx) {
        let checklist = wants_checklist(&ctx.schema, &ctx.task);
        regenerate_resource_ui(&ctx.resource, &ctx.schema, checklist, &ctx.base_url(), ctx.port)
    } else {
        postprocess_front_files(&pick_front_files(&front_blocks), &ctx.base_url(), ctx.port)
    };
    write_front_files(&front_files, &mut files);
    if !req.front.is_empty() {
        files.insert("frontend/FRONT_RAW.md".to_string(), req.front.clone());
    }

    // Backend.
    if !req.back.is_empty() {
        files.insert("backend/README.md".to_string(), req.back.clone());
    }
    strategy.scaffold(&ctx, &mut files);
    let mut state = EntrypointState::default();
    for (index, block) in back_blocks.iter().enumerate() {
        if looks_like_contract_block(block) {
            continue;
        }
        strategy.place_block(&ctx, &mut state, index + 1, block, &mut files);
    }
    strategy.emit_entrypoint(&ctx, &mut state, &req.back, &back_blocks, &mut files);
    strategy.finalize(&ctx, &state, &mut files);

    place_qa_blocks(&req.qa, &mut files);

    build_archive(&files)
}

/// Passthrough-style packaging without a named preset: stacks are detected
/// from the blocks and the requested language, and every detected stack is
/// scaffolded.
pub fn synthesize_flat_archive(
    task: &str,
    language: &str,
    front: &str,
    back: &str,
    qa: &str,
) -> Result<Vec<u8>> {
    let front_blocks = extract_blocks(front);
    let back_blocks = extract_blocks(back);

    let resource = infer_resource(task, Some(front), Some(back), Some(qa));
    let contract = resolve_contract(None, &back_blocks, back, &resource);
    let schema = derive_resource_schema(&contract, &resource);

    let presets = detect_presets(language, &back_blocks);
    let port = presets
        .first()
        .map(|p| p.default_port())
        .unwrap_or(StackPreset::Flask.default_port());

    let ctx = SynthContext {
        task: task.to_string(),
        language: language.to_string(),
        project_name: "project".to_string(),
        group_id: "com.example".to_string(),
        resource,
        schema,
        contract,
        port,
    };

    tracing::debug!(
        "Synthesizing flat project: detected={:?} resource={}",
        presets.iter().map(|p| p.as_str()).collect::<Vec<_>>(),
        ctx.resource
    );

    let mut files = ProjectFiles::new();
    files.insert(
        "docs/api_contract.json".to_string(),
        contract_json(&ctx.contract),
    );

    let front_files = postprocess_front_files(&pick_front_files(&front_blocks), &ctx.base_url(), ctx.port);
    write_front_files(&front_files, &mut files);
    if !front.is_empty() {
        files.insert("frontend/FRONT_RAW.md".to_string(), front.to_string());
    }

    let strategies: Vec<Box<dyn StackStrategy>> =
        presets.iter().map(|p| strategy_for(*p)).collect();

    let mut run_notes = String::new();
    if !back.is_empty() {
        files.insert("backend/README.md".to_string(), back.to_string());

        let mut state = EntrypointState::default();
        for strategy in &strategies {
            strategy.scaffold(&ctx, &mut files);
        }
        for (index, block) in back_blocks.iter().enumerate() {
            if looks_like_contract_block(block) {
                continue;
            }
            match owning_strategy(&strategies, block) {
                Some(strategy) => {
                    strategy.place_block(&ctx, &mut state, index + 1, block, &mut files)
                }
                None => place_block_generic(index + 1, block, &mut files),
            }
        }
        for strategy in &strategies {
            strategy.emit_entrypoint(&ctx, &mut state, back, &back_blocks, &mut files);
            strategy.finalize(&ctx, &state, &mut files);
            run_notes.push_str(&strategy.run_notes(&ctx));
        }
    }

    files.insert("README.md".to_string(), flat_readme(task, language, &ctx, &run_notes));

    place_qa_blocks(qa, &mut files);

    build_archive(&files)
}

/// Routes a block to the detected stack that owns its language family.
fn owning_strategy<'a>(
    strategies: &'a [Box<dyn StackStrategy>],
    block: &CodeBlock,
) -> Option<&'a dyn StackStrategy> {
    let lang = block.language_lower();
    let preset = if lang == "java" || looks_like_java(&block.content) {
        StackPreset::Spring
    } else if matches!(lang.as_str(), "python" | "py")
        || block.content.to_ascii_lowercase().contains("flask")
    {
        StackPreset::Flask
    } else if matches!(lang.as_str(), "javascript" | "js" | "typescript" | "ts")
        || block.content.to_ascii_lowercase().contains("express")
    {
        StackPreset::Express
    } else {
        return strategies.first().map(|s| s.as_ref());
    };
    strategies
        .iter()
        .find(|s| s.preset() == preset)
        .or_else(|| strategies.first())
        .map(|s| s.as_ref())
}

/// Generic placement when no stack was detected at all.
fn place_block_generic(index: usize, block: &CodeBlock, files: &mut ProjectFiles) {
    let lang = block.language_lower();
    let name = sanitize_generic_filename(
        &lang,
        block.filename.as_deref(),
        &format!("server_part_{}", index),
    );
    let dir = if matches!(lang.as_str(), "bash" | "sh") {
        "backend/scripts"
    } else {
        "backend"
    };
    files.insert(format!("{}/{}", dir, name), block.content.clone());
}

fn detect_presets(language: &str, blocks: &[CodeBlock]) -> Vec<StackPreset> {
    let lang = language.to_ascii_lowercase();
    let mut presets = Vec::new();

    let has_flask = blocks.iter().any(|b| {
        matches!(b.language_lower().as_str(), "python" | "py")
            || b.content.contains("Flask(")
            || b.content.contains("from flask")
    }) || lang == "python";
    if has_flask {
        presets.push(StackPreset::Flask);
    }

    let has_express = blocks.iter().any(|b| {
        matches!(
            b.language_lower().as_str(),
            "javascript" | "js" | "typescript" | "ts"
        ) || b.content.to_ascii_lowercase().contains("express")
    }) || matches!(lang.as_str(), "javascript" | "js" | "node" | "typescript" | "ts");
    if has_express {
        presets.push(StackPreset::Express);
    }

    let has_spring = blocks
        .iter()
        .any(|b| b.language_lower() == "java" || looks_like_java(&b.content))
        || lang == "java";
    if has_spring {
        presets.push(StackPreset::Spring);
    }

    presets
}

fn write_front_files(front: &FrontFiles, files: &mut ProjectFiles) {
    if let Some(content) = &front.index_html {
        files.insert("frontend/index.html".to_string(), content.clone());
    }
    if let Some(content) = &front.styles_css {
        files.insert("frontend/styles.css".to_string(), content.clone());
    }
    if let Some(content) = &front.script_js {
        files.insert("frontend/script.js".to_string(), content.clone());
    }
}

fn place_qa_blocks(qa: &str, files: &mut ProjectFiles) {
    if qa.is_empty() {
        return;
    }
    files.insert("qa/README.md".to_string(), qa.to_string());
    for (i, block) in extract_blocks(qa).iter().enumerate() {
        let index = i + 1;
        let lang = block.language_lower();
        let name = if matches!(lang.as_str(), "javascript" | "js") {
            match block.filename.as_deref() {
                Some(f) => basename(f),
                None if block.content.to_ascii_lowercase().contains("login") => {
                    "login.test.js".to_string()
                }
                None => format!("test_{}.js", index),
            }
        } else {
            match block.filename.as_deref() {
                Some(f) => basename(f),
                None => format!("tests_example_{}.{}", index, lang_ext(&lang)),
            }
        };
        files.insert(format!("qa/{}", name), block.content.clone());
    }
}

fn basename(path: &str) -> String {
    path.replace('\\', "/")
        .rsplit('/')
        .next()
        .unwrap_or(path)
        .to_string()
}

fn contract_json(contract: &Contract) -> String {
    // Struct-ordered keys, so the output is stable across runs.
    let mut text = serde_json::to_string_pretty(contract).unwrap_or_else(|_| "{}".to_string());
    text.push('\n');
    text
}

fn structured_readme(req: &StructuredRequest, ctx: &SynthContext, run_notes: &str) -> String {
    format!(
        "# {name}\n\nPreset: {preset}\nTask: {task}\nLanguage: {language}\n\nThis project was generated automatically with a standard layout.\nThe raw agent drafts are kept in frontend/FRONT_RAW.md and backend/README.md.\n\nHow to run:\n{run_notes}2) Frontend\n   - python -m http.server 5500\n   - Open http://127.0.0.1:5500/frontend/index.html\n\nThe frontend resolves `API_BASE` with a fallback of `http://127.0.0.1:{port}{base}`.\nOverride it via `window.API_BASE` or by appending `?api=http://127.0.0.1:{port}{base}` to the URL.\n\nQuick checks:\n- GET http://127.0.0.1:{port}/health\n- GET http://127.0.0.1:{port}{base}/{resource}\n- POST http://127.0.0.1:{port}{base}/{resource}\n\nThe machine-readable API contract is at docs/api_contract.json.\n",
        name = req.project_name,
        preset = req.preset,
        task = req.task,
        language = req.language,
        run_notes = run_notes,
        port = ctx.port,
        base = ctx.base_url(),
        resource = ctx.resource,
    )
}

fn flat_readme(task: &str, language: &str, ctx: &SynthContext, run_notes: &str) -> String {
    let run_section = if run_notes.is_empty() {
        String::new()
    } else {
        format!("\nHow to run:\n{}", run_notes)
    };
    format!(
        "# Generated Project\n\nTask: {task}\nLanguage: {language}\n\nThis archive contains the artifacts produced by the agents:\n- frontend: UI (HTML/CSS/JS)\n- backend: implementation/routes produced by the backend agent\n- qa: test cases and suggestions\n{run_section}\nFrontend:\n- python -m http.server 5500\n- Open http://127.0.0.1:5500/frontend/index.html\n\nThe frontend resolves `API_BASE` with a fallback of `http://127.0.0.1:{port}{base}`.\nThe machine-readable API contract is at docs/api_contract.json.\n",
        task = task,
        language = language,
        run_section = run_section,
        port = ctx.port,
        base = ctx.base_url(),
    )
}

/// How a planned endpoint relates to the inferred resource.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum ResourceRoute {
    Collection,
    Item,
}

#[derive(Debug, Clone)]
pub(crate) struct PlannedEndpoint {
    pub method: HttpMethod,
    pub path: String,
    pub route: Option<ResourceRoute>,
}

/// Classifies `path` against the resource's collection/item shape, with or
/// without the base prefix.
pub(crate) fn classify_resource_path(path: &str, base: &str, resource: &str) -> Option<ResourceRoute> {
    let mut rel = path;
    if base != "/" {
        if let Some(stripped) = rel.strip_prefix(base) {
            rel = stripped;
        }
    }
    let mut segments = rel.split('/').filter(|s| !s.is_empty());
    match (segments.next(), segments.next(), segments.next()) {
        (Some(first), None, _) if first == resource => Some(ResourceRoute::Collection),
        (Some(first), Some(param), None) if first == resource && is_param_segment(param) => {
            Some(ResourceRoute::Item)
        }
        _ => None,
    }
}

fn is_param_segment(segment: &str) -> bool {
    segment.starts_with(':') || segment.starts_with('{') || segment.starts_with('<')
}

/// The endpoint plan every strategy emits handlers from: declared endpoints
/// first (deduplicated, base-prefixed), then the four conventional CRUD
/// routes when the contract declared none of them, so the generated project
/// is runnable standalone.
pub(crate) fn plan_endpoints(ctx: &SynthContext) -> Vec<PlannedEndpoint> {
    let base = ctx.base_url();
    let mut planned: Vec<PlannedEndpoint> = Vec::new();
    let mut seen: Vec<(HttpMethod, String)> = Vec::new();

    for endpoint in &ctx.contract.endpoints {
        let mut path = if endpoint.path.starts_with('/') {
            endpoint.path.clone()
        } else {
            format!("/{}", endpoint.path)
        };
        if base != "/" && !path.starts_with(&base) {
            path = format!("{}{}", base, if path == "/" { "" } else { path.as_str() });
        }
        let key = (endpoint.method, path.clone());
        if seen.contains(&key) {
            continue;
        }
        seen.push(key);
        let route = classify_resource_path(&path, &base, &ctx.resource);
        planned.push(PlannedEndpoint {
            method: endpoint.method,
            path,
            route,
        });
    }

    if !planned.iter().any(|p| p.route.is_some()) {
        let prefix = if base == "/" { String::new() } else { base.clone() };
        let collection = format!("{}/{}", prefix, ctx.resource);
        let item = format!("{}/{}/:id", prefix, ctx.resource);
        for (method, path, route) in [
            (HttpMethod::Get, collection.clone(), ResourceRoute::Collection),
            (HttpMethod::Post, collection, ResourceRoute::Collection),
            (HttpMethod::Put, item.clone(), ResourceRoute::Item),
            (HttpMethod::Delete, item, ResourceRoute::Item),
        ] {
            if !seen.contains(&(method, path.clone())) {
                seen.push((method, path.clone()));
                planned.push(PlannedEndpoint {
                    method,
                    path,
                    route: Some(route),
                });
            }
        }
    }

    planned
}

/// True when the contract declares all four conventional verbs for the
/// resource, which is the trigger for schema-driven frontend regeneration.
fn covers_all_resource_verbs(ctx: &SynthContext) -> bool {
    let base = ctx.base_url();
    let declared: Vec<(HttpMethod, ResourceRoute)> = ctx
        .contract
        .endpoints
        .iter()
        .filter_map(|e| {
            classify_resource_path(&e.path, &base, &ctx.resource).map(|r| (e.method, r))
        })
        .collect();
    declared.contains(&(HttpMethod::Get, ResourceRoute::Collection))
        && declared.contains(&(HttpMethod::Post, ResourceRoute::Collection))
        && declared.contains(&(HttpMethod::Put, ResourceRoute::Item))
        && declared.contains(&(HttpMethod::Delete, ResourceRoute::Item))
}

/// Converts route-parameter segments to the Flask `<converter:name>` style.
pub(crate) fn flask_path(path: &str) -> String {
    convert_params(path, |name| format!("<{}>", name))
}

/// Converts route-parameter segments to the Express `:name` style.
pub(crate) fn express_path(path: &str) -> String {
    convert_params(path, |name| format!(":{}", name))
}

/// Converts route-parameter segments to the Spring `{name}` style.
pub(crate) fn spring_path(path: &str) -> String {
    convert_params(path, |name| format!("{{{}}}", name))
}

fn convert_params(path: &str, render: impl Fn(&str) -> String) -> String {
    path.split('/')
        .map(|segment| {
            let name = if let Some(rest) = segment.strip_prefix(':') {
                rest
            } else if segment.starts_with('{') && segment.ends_with('}') {
                segment.trim_start_matches('{').trim_end_matches('}')
            } else if segment.starts_with('<') && segment.ends_with('>') {
                segment
                    .trim_start_matches('<')
                    .trim_end_matches('>')
                    .rsplit(':')
                    .next()
                    .unwrap_or(segment)
            } else {
                return segment.to_string();
            };
            render(name)
        })
        .collect::<Vec<_>>()
        .join("/")
}

/// Handler-name slug for a path relative to the base URL.
pub(crate) fn path_slug(path: &str, base: &str) -> String {
    let rel = if base != "/" {
        path.strip_prefix(base).unwrap_or(path)
    } else {
        path
    };
    let slug: String = rel
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() { c.to_ascii_lowercase() } else { '_' })
        .collect();
    let slug = slug.trim_matches('_').to_string();
    let mut collapsed = String::new();
    let mut last_underscore = false;
    for c in slug.chars() {
        if c == '_' {
            if !last_underscore {
                collapsed.push(c);
            }
            last_underscore = true;
        } else {
            collapsed.push(c);
            last_underscore = false;
        }
    }
    if collapsed.is_empty() {
        "root".to_string()
    } else {
        collapsed
    }
}
