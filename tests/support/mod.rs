#![allow(dead_code)]

use anyhow::Result;
use async_trait::async_trait;
use nuget_cli::reporter::Reporter;
use nuget_client::{
    log::{LogEvent, RestoreLogger},
    LockFileLibrary, RestoreEngine, RestoreError, RestoreOutcome, RestoreRequest,
    UnresolvedRequest,
};
use serde_json::json;
use std::{
    fs,
    path::Path,
    sync::{
        atomic::{AtomicUsize, Ordering},
        Mutex,
    },
};

/// A reporter call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Call {
    Verbose(String),
    Output(String),
    Warn(String),
    Error(String),
}

/// A reporter that records every call it receives.
#[derive(Default)]
pub struct RecordingReporter {
    calls: Mutex<Vec<Call>>,
}

impl RecordingReporter {
    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    pub fn warnings(&self) -> Vec<String> {
        self.calls()
            .into_iter()
            .filter_map(|c| match c {
                Call::Warn(text) => Some(text),
                _ => None,
            })
            .collect()
    }

    pub fn errors(&self) -> Vec<String> {
        self.calls()
            .into_iter()
            .filter_map(|c| match c {
                Call::Error(text) => Some(text),
                _ => None,
            })
            .collect()
    }

    pub fn outputs(&self) -> Vec<String> {
        self.calls()
            .into_iter()
            .filter_map(|c| match c {
                Call::Output(text) => Some(text),
                _ => None,
            })
            .collect()
    }

    fn push(&self, call: Call) {
        self.calls.lock().unwrap().push(call);
    }
}

impl Reporter for RecordingReporter {
    fn verbose(&self, text: &str) {
        self.push(Call::Verbose(text.to_string()));
    }

    fn output(&self, text: &str) {
        self.push(Call::Output(text.to_string()));
    }

    fn warn(&self, text: &str) {
        self.push(Call::Warn(text.to_string()));
    }

    fn error(&self, text: &str) {
        self.push(Call::Error(text.to_string()));
    }
}

/// A restore engine returning canned outcomes.
pub struct StubEngine {
    result: Box<dyn Fn() -> Result<Vec<RestoreOutcome>, RestoreError> + Send + Sync>,
    events: Vec<LogEvent>,
    calls: AtomicUsize,
    requests: Mutex<Vec<RestoreRequest>>,
}

impl StubEngine {
    pub fn new(outcomes: Vec<RestoreOutcome>) -> Self {
        Self {
            result: Box::new(move || Ok(outcomes.clone())),
            events: Vec::new(),
            calls: AtomicUsize::new(0),
            requests: Mutex::new(Vec::new()),
        }
    }

    pub fn failing(error: impl Fn() -> RestoreError + Send + Sync + 'static) -> Self {
        Self {
            result: Box::new(move || Err(error())),
            events: Vec::new(),
            calls: AtomicUsize::new(0),
            requests: Mutex::new(Vec::new()),
        }
    }

    /// Logs the given events on every restore before returning.
    pub fn with_events(mut self, events: Vec<LogEvent>) -> Self {
        self.events = events;
        self
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn requests(&self) -> Vec<RestoreRequest> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl RestoreEngine for StubEngine {
    async fn restore(
        &self,
        request: &RestoreRequest,
        logger: &dyn RestoreLogger,
    ) -> Result<Vec<RestoreOutcome>, RestoreError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.requests.lock().unwrap().push(request.clone());
        for event in &self.events {
            logger.log(event.clone());
        }
        (self.result)()
    }
}

pub fn library(name: &str, version: &str, files: &[&str]) -> LockFileLibrary {
    LockFileLibrary {
        name: name.to_string(),
        version: version.parse().unwrap(),
        path: format!("{}/{}", name.to_lowercase(), version.to_lowercase()),
        files: files.iter().map(|f| f.to_string()).collect(),
    }
}

pub fn succeeded(libraries: Vec<LockFileLibrary>) -> RestoreOutcome {
    RestoreOutcome {
        success: true,
        libraries,
        unresolved: Vec::new(),
    }
}

pub fn failed(unresolved: &[(&str, &str)]) -> RestoreOutcome {
    RestoreOutcome {
        success: false,
        libraries: Vec::new(),
        unresolved: unresolved
            .iter()
            .map(|(name, range)| UnresolvedRequest {
                name: name.to_string(),
                range: range.parse().unwrap(),
            })
            .collect(),
    }
}

/// Writes a package without dependencies into a feed directory.
pub fn publish(feed: &Path, id: &str, versions: &[&str], file: &str) -> Result<()> {
    let id_dir = feed.join(id.to_lowercase());
    fs::create_dir_all(&id_dir)?;
    fs::write(
        id_dir.join("index.json"),
        json!({ "versions": versions }).to_string(),
    )?;

    for version in versions {
        let version_dir = id_dir.join(version.to_lowercase());
        fs::create_dir_all(version_dir.join("lib"))?;
        fs::write(version_dir.join("lib").join(file), format!("{id} {version}"))?;
        fs::write(
            version_dir.join(format!("{}.json", id.to_lowercase())),
            json!({
                "id": id,
                "version": version,
                "files": [{ "path": format!("lib/{file}") }],
            })
            .to_string(),
        )?;
    }

    Ok(())
}
