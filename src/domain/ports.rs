use crate::domain::model::{
    CodeBlock, Contract, ProjectFiles, ResourceSchema, StackPreset,
};
use std::collections::BTreeSet;

/// Everything a stack strategy needs to know about the current synthesis
/// call. Value data, owned by one invocation.
#[derive(Debug, Clone)]
pub struct SynthContext {
    pub task: String,
    pub language: String,
    pub project_name: String,
    pub group_id: String,
    pub resource: String,
    pub schema: ResourceSchema,
    pub contract: Contract,
    pub port: u16,
}

impl SynthContext {
    pub fn base_url(&self) -> String {
        self.contract.normalized_base()
    }
}

/// Mutable bookkeeping shared between block placement and the fallback
/// emission steps. Tracks the single-entrypoint invariant: the first
/// model-provided bootstrap wins, later ones are stripped.
#[derive(Debug, Default)]
pub struct EntrypointState {
    pub bootstrap_written: bool,
    pub controller_seen: bool,
    pub pom_written: bool,
    pub saw_java: bool,
    pub java_packages: BTreeSet<String>,
}

/// One backend stack the synthesizer can scaffold. The engine drives the
/// same sequence for every stack (scaffold, place model blocks, synthesize
/// a contract-driven entrypoint if the model supplied none, finalize), so
/// the single-entrypoint and schema-driven endpoint synthesis invariants
/// live in one place.
pub trait StackStrategy {
    fn preset(&self) -> StackPreset;

    fn default_port(&self) -> u16 {
        self.preset().default_port()
    }

    /// Always-present scaffolding: dependency manifest, CORS, health check.
    fn scaffold(&self, ctx: &SynthContext, files: &mut ProjectFiles);

    /// Route one model-provided block into the tree, sanitized. `index` is
    /// the 1-based position of the block, used for fallback filenames.
    fn place_block(
        &self,
        ctx: &SynthContext,
        state: &mut EntrypointState,
        index: usize,
        block: &CodeBlock,
        files: &mut ProjectFiles,
    );

    /// Synthesize the HTTP entrypoint from the contract when no model block
    /// already supplies it.
    fn emit_entrypoint(
        &self,
        ctx: &SynthContext,
        state: &mut EntrypointState,
        back_text: &str,
        blocks: &[CodeBlock],
        files: &mut ProjectFiles,
    );

    /// Repair anything the model left incomplete (missing bootstrap,
    /// missing build manifest).
    fn finalize(&self, ctx: &SynthContext, state: &EntrypointState, files: &mut ProjectFiles);

    /// README section describing how to run this stack.
    fn run_notes(&self, ctx: &SynthContext) -> String;
}
