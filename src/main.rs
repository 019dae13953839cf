use anyhow::Context;
use clap::Parser;
use draftpack::config::{PackArgs, PackSettings, PackTomlConfig};
use draftpack::utils::logger;
use draftpack::{
    check_frontend_against_contract, extract_blocks, infer_resource, resolve_contract,
    synthesize_flat_archive, synthesize_structured_archive, StructuredRequest,
};
use std::collections::BTreeMap;
use std::path::Path;

fn main() -> anyhow::Result<()> {
    let args = PackArgs::parse();

    logger::init_cli_logger(args.verbose);
    tracing::info!("Starting draftpack");
    if args.verbose {
        tracing::debug!("CLI args: {:?}", args);
    }

    let file_config = match &args.config {
        Some(path) => Some(PackTomlConfig::from_file(path).context("loading --config file")?),
        None => None,
    };

    let settings = match args.resolve(file_config) {
        Ok(settings) => settings,
        Err(e) => {
            tracing::error!("Configuration validation failed: {}", e);
            eprintln!("❌ {}", e);
            std::process::exit(1);
        }
    };

    report_frontend_drift(&settings);

    let bytes = match settings.preset {
        Some(preset) => {
            tracing::info!("Synthesizing structured archive: preset={}", preset);
            synthesize_structured_archive(&StructuredRequest {
                task: settings.task.clone(),
                language: settings.language.clone(),
                front: settings.front.clone(),
                back: settings.back.clone(),
                qa: settings.qa.clone(),
                preset,
                project_name: settings.project_name.clone(),
                group_id: settings.group_id.clone(),
                contract: settings.contract.clone(),
            })
        }
        None => {
            tracing::info!("Synthesizing flat archive");
            synthesize_flat_archive(
                &settings.task,
                &settings.language,
                &settings.front,
                &settings.back,
                &settings.qa,
            )
        }
    };

    match bytes {
        Ok(bytes) => {
            let output_path = write_archive(&settings, &bytes)?;
            tracing::info!("Archive written to {}", output_path);
            println!("✅ Project packaged successfully!");
            println!("📁 Archive saved to: {}", output_path);
        }
        Err(e) => {
            tracing::error!("Synthesis failed: {}", e);
            eprintln!("❌ {}", e);
            std::process::exit(1);
        }
    }

    Ok(())
}

/// Advisory only: uncovered frontend calls are reported, never fatal.
fn report_frontend_drift(settings: &PackSettings) {
    if settings.front.is_empty() {
        return;
    }
    let back_blocks = extract_blocks(&settings.back);
    let resource = infer_resource(
        &settings.task,
        Some(&settings.front),
        Some(&settings.back),
        Some(&settings.qa),
    );
    let contract = resolve_contract(
        settings.contract.clone(),
        &back_blocks,
        &settings.back,
        &resource,
    );

    let mut front_files: BTreeMap<String, String> = BTreeMap::new();
    for (i, block) in extract_blocks(&settings.front).iter().enumerate() {
        if matches!(
            block.language_lower().as_str(),
            "javascript" | "js" | "typescript" | "ts"
        ) {
            let name = block
                .filename
                .clone()
                .unwrap_or_else(|| format!("script_{}.js", i + 1));
            front_files.insert(name, block.content.clone());
        }
    }

    let report = check_frontend_against_contract(&front_files, &contract);
    match report.message() {
        Some(message) => tracing::warn!("{}", message),
        None => tracing::debug!("Frontend fetch usage is covered by the contract"),
    }
}

fn write_archive(settings: &PackSettings, bytes: &[u8]) -> anyhow::Result<String> {
    std::fs::create_dir_all(&settings.output_dir)
        .with_context(|| format!("creating output directory {}", settings.output_dir))?;
    let path = Path::new(&settings.output_dir).join(format!("{}.zip", settings.project_name));
    std::fs::write(&path, bytes).with_context(|| format!("writing {}", path.display()))?;
    Ok(path.display().to_string())
}
