//! Job records, logical job status and response representations.

use std::collections::BTreeMap;

/// Media type of plain text bodies.
pub const TEXT_PLAIN: &str = "text/plain";
/// Media type of structured (JSON) bodies.
pub const APPLICATION_JSON: &str = "application/json";

/// Registry row for one job. Rows are never removed; `deleted` only goes false -> true.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JobRecord {
    pub id: String,
    pub process: String,
    pub deleted: bool,
}

/// Logical state of a job as derived by its handler.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum JobStatus {
    Queued,
    Running,
    Completed,
    Error,
}

impl JobStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            JobStatus::Queued => "queued",
            JobStatus::Running => "running",
            JobStatus::Completed => "completed",
            JobStatus::Error => "error",
        }
    }

    /// Whether captured output streams can be served in this state.
    pub fn has_output(self) -> bool {
        !matches!(self, JobStatus::Queued | JobStatus::Error)
    }
}

impl std::fmt::Display for JobStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A negotiated response body together with its media type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Representation {
    pub media_type: String,
    pub body: Vec<u8>,
}

impl Representation {
    pub fn new(media_type: impl Into<String>, body: impl Into<Vec<u8>>) -> Self {
        Self {
            media_type: media_type.into(),
            body: body.into(),
        }
    }

    pub fn text(body: impl Into<String>) -> Self {
        Self::new(TEXT_PLAIN, body.into().into_bytes())
    }

    /// JSON body followed by a newline.
    pub fn json(value: &serde_json::Value) -> Self {
        let mut body = value.to_string();
        body.push('\n');
        Self::new(APPLICATION_JSON, body.into_bytes())
    }
}

/// Ordered `key: value` summary rendered as text/plain lines or a JSON object.
#[derive(Debug, Clone, Default)]
pub struct Summary {
    fields: Vec<(String, serde_json::Value)>,
}

impl Summary {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn field(mut self, key: &str, value: impl Into<serde_json::Value>) -> Self {
        self.fields.push((key.to_string(), value.into()));
        self
    }

    /// Render as the given media type; anything other than JSON is rendered as text.
    pub fn render(&self, media_type: &str) -> Representation {
        if media_type == APPLICATION_JSON {
            let map: serde_json::Map<String, serde_json::Value> =
                self.fields.iter().cloned().collect();
            return Representation::json(&serde_json::Value::Object(map));
        }
        let mut out = String::new();
        for (key, value) in &self.fields {
            match value {
                serde_json::Value::String(s) => out.push_str(&format!("{}: {}\n", key, s)),
                serde_json::Value::Null => out.push_str(&format!("{}: None\n", key)),
                other => out.push_str(&format!("{}: {}\n", key, other)),
            }
        }
        Representation::text(out)
    }
}

/// Listing of configured processes, keyed by `/label`.
#[derive(Debug, Clone, Default)]
pub struct ProcessListing(pub BTreeMap<String, String>);

impl ProcessListing {
    pub fn render(&self, media_type: &str) -> Representation {
        if media_type == APPLICATION_JSON {
            let map: serde_json::Map<String, serde_json::Value> = self
                .0
                .iter()
                .map(|(k, v)| (k.clone(), serde_json::Value::String(v.clone())))
                .collect();
            return Representation::json(&serde_json::Value::Object(map));
        }
        let mut out = String::from("Available:\n");
        for (path, description) in &self.0 {
            out.push_str(&format!("    {}: {}\n", path, description));
        }
        Representation::text(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_renders_lowercase() {
        assert_eq!(JobStatus::Completed.to_string(), "completed");
        assert!(JobStatus::Running.has_output());
        assert!(!JobStatus::Queued.has_output());
        assert!(!JobStatus::Error.has_output());
    }

    #[test]
    fn summary_renders_text_in_field_order() {
        let summary = Summary::new()
            .field("job_id", 42)
            .field("job_status", "running");
        let text = summary.render(TEXT_PLAIN);
        assert_eq!(text.media_type, TEXT_PLAIN);
        assert_eq!(text.body, b"job_id: 42\njob_status: running\n");

        let json = summary.render(APPLICATION_JSON);
        let v: serde_json::Value = serde_json::from_slice(&json.body).unwrap();
        assert_eq!(v["job_id"], 42);
        assert_eq!(v["job_status"], "running");
    }

    #[test]
    fn listing_text_is_indented() {
        let mut listing = ProcessListing::default();
        listing.0.insert("/wc".to_string(), "word count (wc)".to_string());
        let rep = listing.render(TEXT_PLAIN);
        assert_eq!(rep.body, b"Available:\n    /wc: word count (wc)\n");
    }
}
