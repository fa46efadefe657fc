use std::fmt;

use tracing::{debug, info, info_span, warn};

use crate::config::EnrichmentParams;
use crate::data_model::{
    BatchNotification, BatchResult, EnrichedRecipe, RawRecord, ValidationDiagnostic,
};
use crate::error::{PipelineError, Result};
use crate::pipeline::dead_letter::DeadLetterSink;
use crate::pipeline::enrichment::enrich;
use crate::pipeline::extractor::extract;
use crate::pipeline::readers::BatchSource;
use crate::pipeline::validator::{build_id_index, validate};
use crate::pipeline::writers::PartitionStore;
use crate::utils::amqp::Notifier;
use crate::utils::prometheus_metrics::*;

/// Lifecycle of one batch. Validating/Extracting/Enriching are per-record
/// stages inside the loop; Rejecting is the per-record failure path and
/// never aborts the batch. Failed is terminal and means nothing was
/// committed: the caller retries the whole batch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BatchState {
    Fetching,
    Validating,
    Extracting,
    Enriching,
    Rejecting,
    Writing,
    Reporting,
    Done,
    Failed,
}

impl fmt::Display for BatchState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", self)
    }
}

/// Drives one batch through fetch, per-record processing, partitioned write,
/// dead-letter routing and reporting.
///
/// The batch is the atomicity boundary. All side effects (partition
/// artifacts, dead-letter artifact, notification) happen after the
/// per-record loop, so a batch abandoned before Writing leaves no trace, and
/// a failed write commits nothing.
pub struct BatchOrchestrator<W: PartitionStore> {
    params: EnrichmentParams,
    store: W,
}

impl<W: PartitionStore> BatchOrchestrator<W> {
    pub fn new(params: EnrichmentParams, store: W) -> Result<Self> {
        params.validate()?;
        Ok(BatchOrchestrator { params, store })
    }

    pub async fn run_batch(
        &self,
        batch_id: &str,
        source: &dyn BatchSource,
        dead_letter: &mut dyn DeadLetterSink,
        notifier: Option<&dyn Notifier>,
    ) -> Result<BatchResult> {
        let span = info_span!("batch", batch_id = %batch_id);
        let _enter = span.enter();
        let timer = BATCH_PROCESSING_DURATION_SECONDS.start_timer();

        let outcome = self
            .drive(batch_id, source, dead_letter, notifier)
            .await;

        timer.observe_duration();
        match &outcome {
            Ok(result) => {
                BATCHES_COMPLETED_TOTAL.inc();
                info!(
                    state = %BatchState::Done,
                    total = result.total,
                    succeeded = result.succeeded,
                    failed = result.failed,
                    partitions = result.output_partitions.len(),
                    "Batch completed"
                );
            }
            Err(e) => {
                BATCHES_FAILED_TOTAL.inc();
                warn!(state = %BatchState::Failed, error = %e, retryable = e.is_retryable(), "Batch failed");
            }
        }
        outcome
    }

    async fn drive(
        &self,
        batch_id: &str,
        source: &dyn BatchSource,
        dead_letter: &mut dyn DeadLetterSink,
        notifier: Option<&dyn Notifier>,
    ) -> Result<BatchResult> {
        debug!(state = %BatchState::Fetching, source = %source.source_ref(), "Fetching raw batch");
        let raw_records = source.fetch()?;
        let total = raw_records.len() as u64;

        let (accepted, rejected) = self.process_records(batch_id, &raw_records)?;

        debug!(state = %BatchState::Writing, records = accepted.len(), "Writing partitions");
        let output_partitions = self.store.write_batch(batch_id, &accepted)?;

        // Dead letters are published only after the write stage committed,
        // so an abandoned or write-failed batch has no observable effects.
        dead_letter.put(batch_id, &rejected)?;

        debug!(state = %BatchState::Reporting, "Building batch result");
        let result = BatchResult {
            batch_id: batch_id.to_string(),
            total,
            succeeded: accepted.len() as u64,
            failed: rejected.len() as u64,
            failure_diagnostics: rejected,
            output_partitions,
        };

        if let Some(notifier) = notifier {
            notifier
                .notify(&BatchNotification::from_result(&result))
                .await?;
        }

        Ok(result)
    }

    /// The per-record loop. A single-threaded pre-pass builds the
    /// recipe-id index (the only cross-record state); after that every
    /// record is independent, and accepted records accumulate in input
    /// order. Rejections are collected, never thrown.
    fn process_records(
        &self,
        batch_id: &str,
        raw_records: &[RawRecord],
    ) -> Result<(Vec<EnrichedRecipe>, Vec<ValidationDiagnostic>)> {
        let id_index = build_id_index(raw_records);

        let mut accepted: Vec<EnrichedRecipe> = Vec::with_capacity(raw_records.len());
        let mut rejected: Vec<ValidationDiagnostic> = Vec::new();

        for (i, raw) in raw_records.iter().enumerate() {
            // Record references are 1-based: "<batch>#3" is the third record.
            let record_ref = format!("{}#{}", batch_id, i + 1);
            let record_span = info_span!("record", record_ref = %record_ref);
            let _enter = record_span.enter();

            debug!(state = %BatchState::Validating, "Validating record");
            if let Err(diagnostic) = validate(raw, &record_ref, i, &id_index) {
                debug!(state = %BatchState::Rejecting, reason = %diagnostic.reason, "Record rejected");
                RECORDS_REJECTED_TOTAL.inc();
                rejected.push(diagnostic);
                continue;
            }

            debug!(state = %BatchState::Extracting, "Extracting canonical record");
            let canonical = extract(raw, &record_ref)?;

            // Should-never-happen guard: enrichment must only ever see
            // structurally valid input. A violation is an orchestrator bug
            // and aborts the batch instead of corrupting output.
            if canonical.ingredients.is_empty() || canonical.directions.is_empty() {
                return Err(PipelineError::InvariantViolation {
                    record_ref,
                    detail: "Enrichment received a canonical recipe with empty ingredients or directions".to_string(),
                });
            }

            debug!(state = %BatchState::Enriching, "Enriching record");
            let enriched = enrich(canonical, &self.params);
            RECORDS_ACCEPTED_TOTAL.inc();
            accepted.push(enriched);
        }

        Ok((accepted, rejected))
    }
}
