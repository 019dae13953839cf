pub mod config;
pub mod core;
pub mod domain;
pub mod utils;

pub use core::contract::{
    infer_contract_from_text, load_contract_from_blocks, resolve_contract, validate_contract,
};
pub use core::crosscheck::check_frontend_against_contract;
pub use core::extractor::extract_blocks;
pub use core::resource::infer_resource;
pub use core::synth::{synthesize_flat_archive, synthesize_structured_archive, StructuredRequest};
pub use domain::model::{
    CodeBlock, Contract, CrossCheckReport, Endpoint, FetchCall, Field, FieldType, HttpMethod,
    ProjectFiles, ResourceSchema, StackPreset,
};
pub use utils::error::{PackError, Result};
