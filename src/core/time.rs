//! Run identity and the JSON result envelope.

use chrono::{SecondsFormat, Utc};
use serde_json::{Map, Value as JsonValue};
use std::path::Path;
use ulid::Ulid;

pub const ENVELOPE_VERSION: &str = "1.1.0";

/// Current UTC time, RFC 3339 at second precision (e.g. `2024-02-29T10:00:00Z`).
pub fn now_rfc3339() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true)
}

/// Sortable id for one invocation; also attached to every log line of a run.
pub fn new_run_id() -> String {
    Ulid::new().to_string()
}

/// Header of a JSON command result.
#[derive(Debug, Clone, Copy)]
pub struct Envelope<'a> {
    pub cmd: &'a str,
    pub status: &'a str,
    pub run_id: &'a str,
    /// Config file the invocation loaded, if any.
    pub config: Option<&'a Path>,
}

impl Envelope<'_> {
    /// `{envelope_version, ts, run_id, cmd, status, config, ...extra}`.
    ///
    /// Header keys win over same-named keys in `extra`; a non-object `extra`
    /// lands under `result`.
    pub fn wrap(&self, extra: JsonValue) -> JsonValue {
        let mut body = Map::new();
        body.insert("envelope_version".into(), ENVELOPE_VERSION.into());
        body.insert("ts".into(), now_rfc3339().into());
        body.insert("run_id".into(), self.run_id.into());
        body.insert("cmd".into(), self.cmd.into());
        body.insert("status".into(), self.status.into());
        body.insert(
            "config".into(),
            self.config
                .map(|p| JsonValue::from(p.display().to_string()))
                .unwrap_or(JsonValue::Null),
        );
        match extra {
            JsonValue::Object(fields) => {
                for (k, v) in fields {
                    body.entry(k).or_insert(v);
                }
            }
            JsonValue::Null => {}
            other => {
                body.insert("result".into(), other);
            }
        }
        JsonValue::Object(body)
    }
}
