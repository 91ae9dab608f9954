mod extractor;
mod filter;
mod normalizer;
mod parser;
mod pipeline;
mod selector;

pub use extractor::{CandidateBatch, CandidateExtractor, CandidateName};
pub use filter::{FilterOutcome, RoleFilter};
pub use normalizer::{NameNormalizer, NormalizedName};
pub use parser::ParsedDocument;
pub use pipeline::{
    DocumentOutput, DocumentReport, DocumentStatus, ExtractionPipeline, ExtractionResult, Stage,
};
pub use selector::{compile_optional, CompiledSelector, SelectorError, SelectorResult};
