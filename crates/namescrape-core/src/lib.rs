#![allow(clippy::missing_errors_doc)]
#![allow(clippy::module_name_repetitions)]

pub mod classify;
pub mod error;
pub mod ingest;
pub mod network;
pub mod rules;
pub mod source;

pub use classify::{
    classify_names, ClassificationCache, ClassifyError, ClassifyResult, Gender, GenderClassifier,
    GenderizeClassifier,
};
pub use error::{Error, Result};
pub use ingest::{
    CandidateBatch, CandidateName, DocumentReport, DocumentStatus, ExtractionPipeline,
    ExtractionResult, NameNormalizer, NormalizedName, ParsedDocument, RoleFilter, Stage,
};
pub use network::{DocumentAccessor, FetchConfig, FetchError, FetchResult, HttpAccessor};
pub use rules::{ExtractionRule, NodeSelector, RuleRegistry, StructuralMode, TextPart};
pub use source::{EntityRole, Source};
