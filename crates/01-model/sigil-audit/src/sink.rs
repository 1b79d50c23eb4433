use crate::records::{AuditEntry, ExecutionRecord, ReinforcementReport, RejectionRecord};
use log::{debug, trace, warn};
use parking_lot::Mutex;
use std::io::Write;
use std::sync::Arc;

/// Receives every record the engine produces.
pub trait AuditSink: Send {
    fn record_execution(&mut self, record: &ExecutionRecord);
    fn record_rejection(&mut self, record: &RejectionRecord);
    fn record_reinforcement(&mut self, report: &ReinforcementReport);
}

impl<S: AuditSink + ?Sized> AuditSink for Box<S> {
    fn record_execution(&mut self, record: &ExecutionRecord) {
        (**self).record_execution(record);
    }

    fn record_rejection(&mut self, record: &RejectionRecord) {
        (**self).record_rejection(record);
    }

    fn record_reinforcement(&mut self, report: &ReinforcementReport) {
        (**self).record_reinforcement(report);
    }
}

/// Discards everything. Hosts must opt into it explicitly.
#[derive(Clone, Copy, Debug, Default)]
pub struct NullAudit;

impl AuditSink for NullAudit {
    fn record_execution(&mut self, _record: &ExecutionRecord) {}
    fn record_rejection(&mut self, _record: &RejectionRecord) {}
    fn record_reinforcement(&mut self, _report: &ReinforcementReport) {}
}

/// Forwards records to the `log` facade.
#[derive(Clone, Copy, Debug, Default)]
pub struct LogAudit;

impl AuditSink for LogAudit {
    fn record_execution(&mut self, record: &ExecutionRecord) {
        debug!(
            "audit::execution sigil={} category={} tick={} scup={:.3} entropy_delta={:+.4}",
            record.sigil_id,
            record.category,
            record.tick,
            record.coherence_score,
            record.entropy_delta,
        );
    }

    fn record_rejection(&mut self, record: &RejectionRecord) {
        if record.retry {
            trace!(
                "audit::rejection sigil={} tick={} kind={} reason={}",
                record.sigil_id,
                record.tick,
                record.kind,
                record.reason,
            );
        } else {
            warn!(
                "audit::rejection sigil={} tick={} kind={} reason={}",
                record.sigil_id,
                record.tick,
                record.kind,
                record.reason,
            );
        }
    }

    fn record_reinforcement(&mut self, report: &ReinforcementReport) {
        debug!(
            "audit::reinforcement tick={} reinforced={} skipped={} dual={} activation={} emotional={} saturation={:.3} ttl={}",
            report.tick,
            report.reinforced.len(),
            report.skipped.len(),
            report.per_trigger.dual,
            report.per_trigger.activation,
            report.per_trigger.emotional,
            report.total_saturation,
            report.total_ttl,
        );
    }
}

/// In-process sink backed by a shared, cloneable buffer.
#[derive(Clone, Debug, Default)]
pub struct MemoryAudit(pub Arc<Mutex<Vec<AuditEntry>>>);

impl MemoryAudit {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_entries<R>(&self, f: impl FnOnce(&[AuditEntry]) -> R) -> R {
        let guard = self.0.lock();
        f(&guard)
    }

    pub fn entries(&self) -> Vec<AuditEntry> {
        self.0.lock().clone()
    }

    pub fn executions(&self) -> Vec<ExecutionRecord> {
        self.with_entries(|entries| {
            entries
                .iter()
                .filter_map(|entry| match entry {
                    AuditEntry::Execution(record) => Some(record.clone()),
                    _ => None,
                })
                .collect()
        })
    }

    pub fn rejections(&self) -> Vec<RejectionRecord> {
        self.with_entries(|entries| {
            entries
                .iter()
                .filter_map(|entry| match entry {
                    AuditEntry::Rejection(record) => Some(record.clone()),
                    _ => None,
                })
                .collect()
        })
    }

    pub fn reinforcements(&self) -> Vec<ReinforcementReport> {
        self.with_entries(|entries| {
            entries
                .iter()
                .filter_map(|entry| match entry {
                    AuditEntry::Reinforcement(report) => Some(report.clone()),
                    _ => None,
                })
                .collect()
        })
    }

    pub fn len(&self) -> usize {
        self.0.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.lock().is_empty()
    }

    pub fn clear(&self) {
        self.0.lock().clear();
    }

    fn push(&self, entry: AuditEntry) {
        self.0.lock().push(entry);
    }
}

impl AuditSink for MemoryAudit {
    fn record_execution(&mut self, record: &ExecutionRecord) {
        self.push(AuditEntry::Execution(record.clone()));
    }

    fn record_rejection(&mut self, record: &RejectionRecord) {
        self.push(AuditEntry::Rejection(record.clone()));
    }

    fn record_reinforcement(&mut self, report: &ReinforcementReport) {
        self.push(AuditEntry::Reinforcement(report.clone()));
    }
}

/// Writes each record as one NDJSON line.
///
/// Serialisation or write failures never reach the dispatcher; they are
/// logged and counted in [`NdjsonAudit::failures`].
#[derive(Debug)]
pub struct NdjsonAudit<W> {
    writer: W,
    written: u64,
    failures: u64,
}

impl<W: Write + Send> NdjsonAudit<W> {
    pub fn new(writer: W) -> Self {
        Self {
            writer,
            written: 0,
            failures: 0,
        }
    }

    pub fn written(&self) -> u64 {
        self.written
    }

    pub fn failures(&self) -> u64 {
        self.failures
    }

    pub fn into_inner(self) -> W {
        self.writer
    }

    fn write_entry(&mut self, entry: AuditEntry) {
        let result = entry
            .to_ndjson_line()
            .map_err(std::io::Error::from)
            .and_then(|line| self.writer.write_all(line.as_bytes()));
        match result {
            Ok(()) => self.written += 1,
            Err(err) => {
                self.failures += 1;
                warn!("audit::ndjson write failed: {err}");
            }
        }
    }
}

impl<W: Write + Send> AuditSink for NdjsonAudit<W> {
    fn record_execution(&mut self, record: &ExecutionRecord) {
        self.write_entry(AuditEntry::Execution(record.clone()));
    }

    fn record_rejection(&mut self, record: &RejectionRecord) {
        self.write_entry(AuditEntry::Rejection(record.clone()));
    }

    fn record_reinforcement(&mut self, report: &ReinforcementReport) {
        self.write_entry(AuditEntry::Reinforcement(report.clone()));
    }
}
