use serde::Serialize;
use std::collections::BTreeMap;
use tracing::{debug, info, warn};

use super::extractor::{CandidateBatch, CandidateExtractor};
use super::filter::RoleFilter;
use super::normalizer::{NameNormalizer, NormalizedName};
use super::parser::ParsedDocument;
use super::selector::SelectorResult;
use crate::network::{DocumentAccessor, FetchResult, HttpAccessor};
use crate::rules::RuleRegistry;
use crate::source::{EntityRole, Source};
use crate::Result;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    Idle,
    FetchingDocument,
    Selecting,
    Extracting,
    Filtering,
    Normalizing,
    Aggregating,
    Done,
}

impl Stage {
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::FetchingDocument => "fetching_document",
            Self::Selecting => "selecting",
            Self::Extracting => "extracting",
            Self::Filtering => "filtering",
            Self::Normalizing => "normalizing",
            Self::Aggregating => "aggregating",
            Self::Done => "done",
        }
    }
}

impl std::fmt::Display for Stage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum DocumentStatus {
    Processed {
        candidates: usize,
        excluded: usize,
        names: usize,
        failed_open: bool,
    },
    Failed {
        stage: Stage,
        error: String,
    },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DocumentReport {
    pub source: String,
    pub url: String,
    #[serde(flatten)]
    pub status: DocumentStatus,
}

impl DocumentReport {
    pub fn is_failure(&self) -> bool {
        matches!(self.status, DocumentStatus::Failed { .. })
    }
}

#[derive(Debug, Clone, Default)]
pub struct DocumentOutput {
    pub names: Vec<NormalizedName>,
    pub candidates: usize,
    pub excluded: usize,
    pub failed_open: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct ExtractionResult {
    pub role: EntityRole,
    pub names: BTreeMap<String, Vec<NormalizedName>>,
    pub documents: Vec<DocumentReport>,
}

impl ExtractionResult {
    #[must_use]
    pub fn new(role: EntityRole) -> Self {
        Self {
            role,
            names: BTreeMap::new(),
            documents: Vec::new(),
        }
    }

    pub fn pairs(&self) -> impl Iterator<Item = (&str, &NormalizedName)> {
        self.names
            .iter()
            .flat_map(|(source, names)| names.iter().map(move |n| (source.as_str(), n)))
    }

    pub fn names_for(&self, source: &str) -> &[NormalizedName] {
        self.names.get(source).map_or(&[], Vec::as_slice)
    }

    pub fn total_names(&self) -> usize {
        self.names.values().map(Vec::len).sum()
    }

    pub fn failed_documents(&self) -> impl Iterator<Item = &DocumentReport> {
        self.documents.iter().filter(|d| d.is_failure())
    }

    /// `(succeeded, attempted)` document counts for one source.
    pub fn document_counts(&self, source: &str) -> (usize, usize) {
        let attempted: Vec<_> = self.documents.iter().filter(|d| d.source == source).collect();
        let succeeded = attempted.iter().filter(|d| !d.is_failure()).count();
        (succeeded, attempted.len())
    }

    pub fn merge(&mut self, other: Self) {
        for (source, names) in other.names {
            self.names.entry(source).or_default().extend(names);
        }
        self.documents.extend(other.documents);
    }

    fn append(&mut self, source: &str, names: Vec<NormalizedName>) {
        self.names.entry(source.to_string()).or_default().extend(names);
    }
}

pub struct ExtractionPipeline {
    registry: RuleRegistry,
    accessor: Box<dyn DocumentAccessor>,
}

impl ExtractionPipeline {
    #[must_use]
    pub fn new(registry: RuleRegistry, accessor: Box<dyn DocumentAccessor>) -> Self {
        Self { registry, accessor }
    }

    pub fn from_registry(registry: RuleRegistry) -> FetchResult<Self> {
        let accessor = HttpAccessor::new(registry.fetch.clone())?;
        Ok(Self::new(registry, Box::new(accessor)))
    }

    pub fn registry(&self) -> &RuleRegistry {
        &self.registry
    }

    pub async fn run_named(&self, role: &str) -> Result<ExtractionResult> {
        let role: EntityRole = role.parse()?;
        Ok(self.run(role).await)
    }

    pub async fn run(&self, role: EntityRole) -> ExtractionResult {
        let mut result = ExtractionResult::new(role);
        debug!(stage = %Stage::Idle, %role, "starting run");

        for source in self.registry.sources_for(role) {
            self.visit_source(source, &mut result).await;
        }

        info!(
            stage = %Stage::Done,
            %role,
            names = result.total_names(),
            failed = result.failed_documents().count(),
            "run complete"
        );
        result
    }

    pub async fn extract_source(&self, id: &str, role: EntityRole) -> Result<ExtractionResult> {
        let source = self.registry.source(id, role)?;
        let mut result = ExtractionResult::new(role);
        self.visit_source(source, &mut result).await;
        Ok(result)
    }

    async fn visit_source(&self, source: Source<'_>, result: &mut ExtractionResult) {
        // Pages without names still get an entry.
        result.names.entry(source.id.to_string()).or_default();

        for url in source.documents {
            debug!(stage = %Stage::FetchingDocument, source = source.id, %url);

            let markup = match self.accessor.fetch(url).await {
                Ok(markup) => markup,
                Err(e) => {
                    warn!(source = source.id, %url, error = %e, "fetch failed, skipping document");
                    result.documents.push(DocumentReport {
                        source: source.id.to_string(),
                        url: url.clone(),
                        status: DocumentStatus::Failed {
                            stage: Stage::FetchingDocument,
                            error: e.to_string(),
                        },
                    });
                    continue;
                }
            };

            let status = match self.process_document(&source, url, &markup) {
                Ok(output) => {
                    debug!(
                        stage = %Stage::Aggregating,
                        source = source.id,
                        %url,
                        names = output.names.len()
                    );
                    let status = DocumentStatus::Processed {
                        candidates: output.candidates,
                        excluded: output.excluded,
                        names: output.names.len(),
                        failed_open: output.failed_open,
                    };
                    result.append(source.id, output.names);
                    status
                }
                Err(e) => {
                    warn!(source = source.id, %url, error = %e, "rule could not be applied");
                    DocumentStatus::Failed {
                        stage: Stage::Selecting,
                        error: e.to_string(),
                    }
                }
            };

            result.documents.push(DocumentReport {
                source: source.id.to_string(),
                url: url.clone(),
                status,
            });
        }
    }

    pub fn process_document(
        &self,
        source: &Source<'_>,
        url: &str,
        markup: &str,
    ) -> SelectorResult<DocumentOutput> {
        let document = ParsedDocument::parse(url, markup);

        debug!(
            stage = %Stage::Selecting,
            source = source.id,
            mode = %source.rule.structural_mode,
            title = ?document.title(),
        );
        let batches = CandidateExtractor::new(source.rule, source.id).extract(&document)?;
        debug!(
            stage = %Stage::Extracting,
            source = source.id,
            batches = batches.len(),
            candidates = batches.iter().map(CandidateBatch::len).sum::<usize>(),
        );

        let filter = RoleFilter::new(self.registry.lexicon(source.role, source.rule));
        let normalizer = NameNormalizer::for_rule(source.rule, &self.registry.credential_suffixes);

        let mut output = DocumentOutput::default();
        for batch in batches {
            output.candidates += batch.len();

            debug!(stage = %Stage::Filtering, source = source.id, candidates = batch.len());
            let outcome = filter.apply(batch);
            output.excluded += outcome.excluded;
            output.failed_open |= outcome.failed_open;

            debug!(stage = %Stage::Normalizing, source = source.id, kept = outcome.kept.len());
            output.names.extend(normalizer.normalize_all(&outcome.kept));
        }

        Ok(output)
    }
}
