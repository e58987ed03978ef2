//! Build report events and the sinks that render them.
//!
//! With `--message-format json` every event is written as one JSON object per
//! line, tagged by a `reason` field:
//!
//! - `caption`: a phase or step started
//! - `message`: a leveled message
//! - `call-finished`: a tool call completed
//! - `build-finished`: the whole build completed
//!
//! New fields may be added, but existing fields should not be removed or renamed.

use std::io::Write;
use std::sync::Mutex;
use std::time::Duration;

use serde::{Serialize, Serializer};

/// Severity of a message event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Level {
    Debug,
    Info,
    Warning,
    Error,
}

/// Record of one tool execution.
#[derive(Debug, Clone, Serialize)]
pub struct CallResult {
    pub tool: String,
    pub args: Vec<String>,
    /// Name or id of the worker thread that ran the call.
    pub thread: String,
    #[serde(rename = "duration_ms", serialize_with = "as_millis")]
    pub duration: Duration,
    pub code: i32,
    pub output: String,
    pub errors: String,
}

impl CallResult {
    pub fn is_successful(&self) -> bool {
        self.code == 0
    }

    /// Command line for display.
    pub fn command(&self) -> String {
        std::iter::once(self.tool.as_str())
            .chain(self.args.iter().map(String::as_str))
            .collect::<Vec<_>>()
            .join(" ")
    }

    /// Command and exit code, followed by the trimmed error and standard
    /// output of the call.
    pub fn report(&self) -> String {
        let mut report = format!("`{}` failed with exit code {}", self.command(), self.code);
        for stream in [&self.errors, &self.output] {
            let stream = stream.trim();
            if !stream.is_empty() {
                report.push('\n');
                report.push_str(stream);
            }
        }
        report
    }
}

fn as_millis<S: Serializer>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_u64(duration.as_millis() as u64)
}

/// An event emitted during a build.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "reason", rename_all = "kebab-case")]
pub enum Event {
    Caption { text: String },
    Message { level: Level, text: String },
    CallFinished(CallResult),
    BuildFinished { success: bool, duration_ms: u64, calls: usize },
}

impl Event {
    pub fn caption(text: impl Into<String>) -> Self {
        Event::Caption { text: text.into() }
    }

    pub fn message(level: Level, text: impl Into<String>) -> Self {
        Event::Message {
            level,
            text: text.into(),
        }
    }

    pub fn finished(success: bool, duration: Duration, calls: usize) -> Self {
        Event::BuildFinished {
            success,
            duration_ms: duration.as_millis() as u64,
            calls,
        }
    }

    /// Serialize this event to a JSON string.
    pub fn to_json(&self) -> String {
        serde_json::to_string(self).unwrap_or_default()
    }
}

/// Receives the event stream of a build.
pub trait EventSink: Send + Sync {
    fn accept(&self, event: &Event);
}

/// Forwards events to `tracing`.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingSink;

impl EventSink for TracingSink {
    fn accept(&self, event: &Event) {
        match event {
            Event::Caption { text } => tracing::info!("{}", text),
            Event::Message { level, text } => match level {
                Level::Debug => tracing::debug!("{}", text),
                Level::Info => tracing::info!("{}", text),
                Level::Warning => tracing::warn!("{}", text),
                Level::Error => tracing::error!("{}", text),
            },
            Event::CallFinished(result) if result.is_successful() => {
                tracing::debug!(
                    "{} finished in {} ms on {}",
                    result.command(),
                    result.duration.as_millis(),
                    result.thread
                );
            }
            Event::CallFinished(result) => tracing::warn!("{}", result.report()),
            Event::BuildFinished {
                success,
                duration_ms,
                calls,
            } => {
                let status = if *success { "finished" } else { "failed" };
                tracing::info!(
                    "build {} after {} call(s) in {:.2}s",
                    status,
                    calls,
                    *duration_ms as f64 / 1000.0
                );
            }
        }
    }
}

/// Writes one JSON object per event.
pub struct JsonSink<W: Write + Send> {
    out: Mutex<W>,
}

impl<W: Write + Send> JsonSink<W> {
    pub fn new(out: W) -> Self {
        JsonSink {
            out: Mutex::new(out),
        }
    }

    pub fn into_inner(self) -> W {
        match self.out.into_inner() {
            Ok(out) => out,
            Err(poisoned) => poisoned.into_inner(),
        }
    }
}

impl<W: Write + Send> EventSink for JsonSink<W> {
    fn accept(&self, event: &Event) {
        if let Ok(mut out) = self.out.lock() {
            let _ = writeln!(out, "{}", event.to_json());
        }
    }
}

/// Keeps every event in memory.
#[derive(Debug, Default)]
pub struct RecordingSink {
    events: Mutex<Vec<Event>>,
}

impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<Event> {
        self.events.lock().map(|e| e.clone()).unwrap_or_default()
    }

    pub fn captions(&self) -> Vec<String> {
        self.events()
            .into_iter()
            .filter_map(|e| match e {
                Event::Caption { text } => Some(text),
                _ => None,
            })
            .collect()
    }
}

impl EventSink for RecordingSink {
    fn accept(&self, event: &Event) {
        if let Ok(mut events) = self.events.lock() {
            events.push(event.clone());
        }
    }
}
