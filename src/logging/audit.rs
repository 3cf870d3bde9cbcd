// Audit helpers that emit structured facts across Drawbridge stages.
//
// Side-effects:
// - Emits JSON facts via `FactsEmitter` for `execute`, the guard's
//   mount/unmount steps, and the batch stages (`batch.submit`,
//   `batch.item`, `batch.resolution`, `batch.result`).
// - Ensures a minimal envelope on every fact: `schema_version`, `ts`,
//   `op_id`, `path`.

use serde_json::{json, Value};
use time::format_description::well_known::Rfc3339;
use time::OffsetDateTime;

use crate::logging::FactsEmitter;

pub(crate) const SCHEMA_VERSION: i64 = 1;

const SUBSYSTEM: &str = "drawbridge";

/// Current timestamp in RFC3339, falling back to the epoch on formatter
/// failure.
pub(crate) fn now_iso() -> String {
    OffsetDateTime::now_utc()
        .format(&Rfc3339)
        .unwrap_or_else(|_| "1970-01-01T00:00:00Z".to_string())
}

pub(crate) struct AuditCtx<'a> {
    pub facts: &'a dyn FactsEmitter,
    /// Identifier of the operation or batch the facts belong to.
    pub op_id: String,
    pub ts: String,
}

impl<'a> AuditCtx<'a> {
    pub(crate) fn new(facts: &'a dyn FactsEmitter, op_id: String, ts: String) -> Self {
        Self { facts, op_id, ts }
    }
}

/// Stage a fact row belongs to; determines the event name.
#[derive(Clone, Copy, Debug)]
pub enum Stage {
    Execute,
    GuardMount,
    GuardUnmount,
    BatchSubmit,
    BatchItem,
    BatchResolution,
    BatchResult,
}

impl Stage {
    fn as_event(self) -> &'static str {
        match self {
            Stage::Execute => "execute",
            Stage::GuardMount => "guard.mount",
            Stage::GuardUnmount => "guard.unmount",
            Stage::BatchSubmit => "batch.submit",
            Stage::BatchItem => "batch.item",
            Stage::BatchResolution => "batch.resolution",
            Stage::BatchResult => "batch.result",
        }
    }
}

/// Severity attached to an emitted fact.
#[derive(Clone, Copy, Debug)]
pub enum Decision {
    Success,
    Failure,
    Warn,
}

impl Decision {
    fn as_str(self) -> &'static str {
        match self {
            Decision::Success => "success",
            Decision::Failure => "failure",
            Decision::Warn => "warn",
        }
    }
}

/// Builder facade over audit emission with a centralized envelope.
pub struct StageLogger<'a> {
    ctx: &'a AuditCtx<'a>,
}

impl<'a> StageLogger<'a> {
    pub(crate) fn new(ctx: &'a AuditCtx<'a>) -> Self {
        Self { ctx }
    }

    pub fn execute(&'a self) -> EventBuilder<'a> {
        EventBuilder::new(self.ctx, Stage::Execute)
    }
    pub fn guard_mount(&'a self) -> EventBuilder<'a> {
        EventBuilder::new(self.ctx, Stage::GuardMount)
    }
    pub fn guard_unmount(&'a self) -> EventBuilder<'a> {
        EventBuilder::new(self.ctx, Stage::GuardUnmount)
    }
    pub fn batch_submit(&'a self) -> EventBuilder<'a> {
        EventBuilder::new(self.ctx, Stage::BatchSubmit)
    }
    pub fn batch_item(&'a self) -> EventBuilder<'a> {
        EventBuilder::new(self.ctx, Stage::BatchItem)
    }
    pub fn batch_resolution(&'a self) -> EventBuilder<'a> {
        EventBuilder::new(self.ctx, Stage::BatchResolution)
    }
    pub fn batch_result(&'a self) -> EventBuilder<'a> {
        EventBuilder::new(self.ctx, Stage::BatchResult)
    }
}

pub struct EventBuilder<'a> {
    ctx: &'a AuditCtx<'a>,
    stage: Stage,
    fields: serde_json::Map<String, Value>,
}

impl<'a> EventBuilder<'a> {
    fn new(ctx: &'a AuditCtx<'a>, stage: Stage) -> Self {
        let mut fields = serde_json::Map::new();
        fields.insert("stage".to_string(), json!(stage.as_event()));
        Self { ctx, stage, fields }
    }

    /// Attach the unit's kind label.
    pub fn unit(mut self, kind: &str) -> Self {
        self.fields.insert("unit".into(), json!(kind));
        self
    }

    pub fn path(mut self, path: impl Into<String>) -> Self {
        self.fields.insert("path".into(), json!(path.into()));
        self
    }

    /// Attach the stable error identifier and its exit code.
    pub fn error_id(mut self, id: crate::api::errors::ErrorId) -> Self {
        self.fields
            .insert("error_id".into(), json!(crate::api::errors::id_str(id)));
        self.fields.insert(
            "exit_code".into(),
            json!(crate::api::errors::exit_code_for(id)),
        );
        self
    }

    pub fn field(mut self, key: &str, value: Value) -> Self {
        self.fields.insert(key.to_string(), value);
        self
    }

    pub fn merge(mut self, extra: Value) -> Self {
        if let Some(obj) = extra.as_object() {
            for (k, v) in obj.iter() {
                self.fields.insert(k.clone(), v.clone());
            }
        }
        self
    }

    pub fn emit(self, decision: Decision) {
        let mut fields = Value::Object(self.fields);
        if let Some(obj) = fields.as_object_mut() {
            obj.entry("decision").or_insert(json!(decision.as_str()));
            obj.entry("schema_version").or_insert(json!(SCHEMA_VERSION));
            obj.entry("ts").or_insert(json!(self.ctx.ts));
            obj.entry("op_id").or_insert(json!(self.ctx.op_id));
            obj.entry("path").or_insert(json!(""));
        }
        self.ctx
            .facts
            .emit(SUBSYSTEM, self.stage.as_event(), decision.as_str(), fields);
    }

    pub fn emit_success(self) {
        self.emit(Decision::Success);
    }
    pub fn emit_failure(self) {
        self.emit(Decision::Failure);
    }
    pub fn emit_warn(self) {
        self.emit(Decision::Warn);
    }
}
