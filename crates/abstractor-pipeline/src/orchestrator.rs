//! Two-backend extraction orchestration

use crate::config::PipelineConfig;
use crate::error::PipelineError;
use crate::parser::parse_record;
use crate::types::{CallStrategy, ExtractionMetadata, ExtractionRequest, ExtractionResult};
use abstractor_chunking::{estimate_tokens, OverlapChunker};
use abstractor_domain::{
    compute_confidence, merge_records, BackendFailure, ExtractionBackend, ExtractionSchema,
    SchemaRegistry,
};
use serde_json::{Map, Value};
use std::time::Instant;
use tracing::{debug, info, warn};
use uuid::Uuid;

/// What one backend attempt produced
struct BackendOutcome {
    data: Value,
    backend_name: String,
    strategy: CallStrategy,
    chunk_failures: usize,
    parse_fallback: bool,
}

/// Why one backend attempt failed
struct RunFailure {
    quota: bool,
    message: String,
}

impl RunFailure {
    fn from_error<E: BackendFailure>(error: E) -> Self {
        Self {
            quota: error.is_quota(),
            message: error.to_string(),
        }
    }
}

/// Orchestrates structured extraction across two interchangeable backends.
///
/// The primary backend is tried first; documents exceeding its single-call
/// token limit are split and extracted chunk by chunk, with the partial
/// records merged in chunk order. On a non-quota failure the entire run is
/// retried on the secondary backend. Quota errors surface immediately since
/// retrying elsewhere would not resolve them.
///
/// No timeouts are imposed here; callers own the overall deadline.
pub struct ExtractionPipeline<P, S> {
    primary: P,
    secondary: S,
    registry: SchemaRegistry,
    chunker: OverlapChunker,
    config: PipelineConfig,
}

impl<P, S> ExtractionPipeline<P, S>
where
    P: ExtractionBackend,
    S: ExtractionBackend,
{
    /// Create a pipeline with the built-in schema registry
    pub fn new(primary: P, secondary: S, config: PipelineConfig) -> Self {
        let chunker = OverlapChunker::new(config.chunker.clone());
        Self {
            primary,
            secondary,
            registry: SchemaRegistry::builtin(),
            chunker,
            config,
        }
    }

    /// Replace the schema registry
    pub fn with_registry(mut self, registry: SchemaRegistry) -> Self {
        self.registry = registry;
        self
    }

    /// Extract structured data from a document.
    ///
    /// Input validation happens before any backend call, so rejected
    /// requests never consume quota.
    pub async fn extract(
        &self,
        request: ExtractionRequest,
    ) -> Result<ExtractionResult, PipelineError> {
        let schema = self
            .registry
            .get(&request.schema_id)
            .ok_or_else(|| PipelineError::UnknownSchema(request.schema_id.clone()))?;

        let text = request.text.trim();
        if text.is_empty() {
            return Err(PipelineError::EmptyDocument);
        }
        if text.len() < self.config.min_document_len {
            return Err(PipelineError::InputTooShort(
                text.len(),
                self.config.min_document_len,
            ));
        }

        let start_time = Instant::now();
        info!(
            schema = %request.schema_id,
            chars = text.len(),
            "starting extraction"
        );

        let primary_failure = match self.run_backend(&self.primary, schema, text).await {
            Ok(outcome) => {
                return Ok(finish(outcome, schema, &request.schema_id, start_time));
            }
            Err(failure) if failure.quota => {
                return Err(PipelineError::QuotaExhausted(failure.message));
            }
            Err(failure) => failure,
        };

        warn!(
            error = %primary_failure.message,
            "primary backend failed, retrying on secondary"
        );

        match self.run_backend(&self.secondary, schema, text).await {
            Ok(outcome) => Ok(finish(outcome, schema, &request.schema_id, start_time)),
            Err(failure) if failure.quota => Err(PipelineError::QuotaExhausted(failure.message)),
            Err(failure) => Err(PipelineError::AllBackendsFailed {
                primary: primary_failure.message,
                secondary: failure.message,
            }),
        }
    }

    /// Run the full size-check/dispatch/merge/parse flow on one backend
    async fn run_backend<B: ExtractionBackend>(
        &self,
        backend: &B,
        schema: &ExtractionSchema,
        text: &str,
    ) -> Result<BackendOutcome, RunFailure> {
        let prompt_tokens = estimate_tokens(&schema.build_prompt(text));
        if prompt_tokens <= backend.single_call_token_limit() {
            self.run_single(backend, schema, text).await
        } else {
            self.run_chunked(backend, schema, text).await
        }
    }

    async fn run_single<B: ExtractionBackend>(
        &self,
        backend: &B,
        schema: &ExtractionSchema,
        text: &str,
    ) -> Result<BackendOutcome, RunFailure> {
        debug!(backend = backend.name(), "single-call extraction");

        let prompt = schema.build_prompt(text);
        let raw = backend
            .extract(&prompt)
            .await
            .map_err(RunFailure::from_error)?;

        match parse_record(&raw) {
            Ok(data) => Ok(BackendOutcome {
                data,
                backend_name: backend.name().to_string(),
                strategy: CallStrategy::Single,
                chunk_failures: 0,
                parse_fallback: false,
            }),
            Err(e) => {
                warn!(
                    backend = backend.name(),
                    error = %e,
                    "output unparseable, substituting schema default record"
                );
                Ok(BackendOutcome {
                    data: schema.default_record(),
                    backend_name: backend.name().to_string(),
                    strategy: CallStrategy::Single,
                    chunk_failures: 0,
                    parse_fallback: true,
                })
            }
        }
    }

    async fn run_chunked<B: ExtractionBackend>(
        &self,
        backend: &B,
        schema: &ExtractionSchema,
        text: &str,
    ) -> Result<BackendOutcome, RunFailure> {
        let pieces = self
            .chunker
            .chunk(text, backend.chunk_size_chars(), self.config.chunk_overlap);

        info!(
            backend = backend.name(),
            chunks = pieces.len(),
            "chunked extraction"
        );

        // Records accumulate in chunk index order; the merge's latest-wins
        // rule depends on that ordering, not on call completion order.
        let mut records: Vec<Value> = Vec::with_capacity(pieces.len());
        let mut call_successes = 0usize;
        let mut failures = 0usize;

        for (idx, piece) in pieces.iter().enumerate() {
            let prompt = schema.build_prompt(piece);
            match backend.extract(&prompt).await {
                Ok(raw) => {
                    call_successes += 1;
                    match parse_record(&raw) {
                        Ok(record) => records.push(record),
                        Err(e) => {
                            warn!(chunk = idx, error = %e, "chunk output unparseable");
                            failures += 1;
                            records.push(Value::Object(Map::new()));
                        }
                    }
                }
                Err(e) if e.is_quota() => {
                    // Quota mid-run stops everything; sibling chunks would
                    // hit the same wall.
                    return Err(RunFailure::from_error(e));
                }
                Err(e) => {
                    warn!(chunk = idx, error = %e, "chunk call failed");
                    failures += 1;
                    records.push(Value::Object(Map::new()));
                }
            }
        }

        if call_successes == 0 {
            return Err(RunFailure {
                quota: false,
                message: format!("all {} chunk calls failed", pieces.len()),
            });
        }

        Ok(BackendOutcome {
            data: merge_records(&records),
            backend_name: backend.name().to_string(),
            strategy: CallStrategy::Chunked {
                chunks: pieces.len(),
            },
            chunk_failures: failures,
            parse_fallback: false,
        })
    }
}

/// Attach confidence and metadata to a backend outcome
fn finish(
    outcome: BackendOutcome,
    schema: &ExtractionSchema,
    schema_id: &str,
    start_time: Instant,
) -> ExtractionResult {
    let confidence = compute_confidence(&outcome.data, schema);

    let backend_used = if outcome.parse_fallback {
        format!("{}+parse-fallback", outcome.backend_name)
    } else {
        outcome.backend_name
    };

    let metadata = ExtractionMetadata {
        request_id: Uuid::now_v7().to_string(),
        schema_id: schema_id.to_string(),
        strategy: outcome.strategy,
        chunk_failures: outcome.chunk_failures,
        elapsed_ms: start_time.elapsed().as_millis() as u64,
    };

    info!(
        backend = %backend_used,
        confidence,
        chunk_failures = metadata.chunk_failures,
        "extraction complete"
    );

    ExtractionResult {
        data: outcome.data,
        confidence,
        backend_used,
        metadata,
    }
}
