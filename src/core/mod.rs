pub mod archive;
pub mod contract;
pub mod crosscheck;
pub mod extractor;
pub mod frontend;
pub mod resource;
pub mod sanitize;
pub mod synth;

pub use crate::domain::model::{
    CodeBlock, Contract, CrossCheckReport, Endpoint, FetchCall, Field, FieldType, HttpMethod,
    ProjectFiles, ResourceSchema, StackPreset,
};
pub use crate::domain::ports::{EntrypointState, StackStrategy, SynthContext};
pub use crate::utils::error::Result;
