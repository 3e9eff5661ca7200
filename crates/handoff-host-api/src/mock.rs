//! Mock process launcher for testing

use async_trait::async_trait;
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, Mutex};

use crate::{ExitStatus, HostError, HostResult, LaunchReceipt, LaunchSpec, ProcessLauncher};

/// Scripted result of a mock run
#[derive(Debug, Clone, Default)]
pub struct MockResponse {
    /// `None` simulates a process killed by a signal
    pub exit_code: Option<i32>,
    /// Lines printed on stdout
    pub stdout: Vec<String>,
}

impl MockResponse {
    pub fn exit(code: i32) -> Self {
        Self {
            exit_code: Some(code),
            stdout: Vec::new(),
        }
    }

    pub fn killed() -> Self {
        Self {
            exit_code: None,
            stdout: Vec::new(),
        }
    }

    pub fn with_line(mut self, line: impl Into<String>) -> Self {
        self.stdout.push(line.into());
        self
    }
}

/// Mock launcher for unit/integration testing.
///
/// Responses and failures are keyed by [`LaunchSpec::label`]: the verb for
/// updater calls, the program name otherwise. Unscripted runs exit with 0.
pub struct MockLauncher {
    next_pid: AtomicU32,
    requests: Arc<Mutex<Vec<LaunchSpec>>>,
    responses: Arc<Mutex<HashMap<String, MockResponse>>>,
    failures: Arc<Mutex<HashSet<String>>>,

    /// Whether a terminal emulator is available for interactive launches
    pub terminal_available: Arc<Mutex<bool>>,
}

impl MockLauncher {
    pub fn new() -> Self {
        Self {
            next_pid: AtomicU32::new(1000),
            requests: Arc::new(Mutex::new(Vec::new())),
            responses: Arc::new(Mutex::new(HashMap::new())),
            failures: Arc::new(Mutex::new(HashSet::new())),
            terminal_available: Arc::new(Mutex::new(true)),
        }
    }

    /// Script the result for a label
    pub fn respond(&self, label: impl Into<String>, response: MockResponse) {
        self.responses.lock().unwrap().insert(label.into(), response);
    }

    /// Make launches with this label fail to spawn
    pub fn fail(&self, label: impl Into<String>) {
        self.failures.lock().unwrap().insert(label.into());
    }

    pub fn set_terminal_available(&self, available: bool) {
        *self.terminal_available.lock().unwrap() = available;
    }

    /// Every launch requested so far, in order
    pub fn requests(&self) -> Vec<LaunchSpec> {
        self.requests.lock().unwrap().clone()
    }

    /// Requests with the given label
    pub fn requests_for(&self, label: &str) -> Vec<LaunchSpec> {
        self.requests()
            .into_iter()
            .filter(|spec| spec.label() == label)
            .collect()
    }

    fn record(&self, spec: &LaunchSpec) -> HostResult<()> {
        self.requests.lock().unwrap().push(spec.clone());

        let label = spec.label();
        if self.failures.lock().unwrap().contains(&label) {
            return Err(HostError::NotRunnable {
                program: spec.executable.display().to_string(),
                source: std::io::Error::new(std::io::ErrorKind::NotFound, "mock spawn failure"),
            });
        }
        Ok(())
    }
}

impl Default for MockLauncher {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ProcessLauncher for MockLauncher {
    async fn run(
        &self,
        spec: &LaunchSpec,
        on_line: &mut (dyn for<'a> FnMut(&'a str) + Send),
    ) -> HostResult<ExitStatus> {
        self.record(spec)?;

        let response = self
            .responses
            .lock()
            .unwrap()
            .get(&spec.label())
            .cloned()
            .unwrap_or_else(|| MockResponse::exit(0));

        if spec.redirect_output {
            for line in &response.stdout {
                on_line(line);
            }
        }

        Ok(match response.exit_code {
            Some(code) => ExitStatus::with_code(code),
            None => ExitStatus::signaled(9),
        })
    }

    async fn spawn_detached(&self, spec: &LaunchSpec) -> HostResult<Option<LaunchReceipt>> {
        self.record(spec)?;

        if spec.interactive_terminal && !*self.terminal_available.lock().unwrap() {
            return Ok(None);
        }

        let pid = self.next_pid.fetch_add(1, Ordering::SeqCst);
        Ok(Some(LaunchReceipt { pid }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use handoff_api::Verb;

    #[tokio::test]
    async fn scripted_run_streams_lines() {
        let launcher = MockLauncher::new();
        launcher.respond(
            "check",
            MockResponse::exit(1).with_line("FUTO Updater v3").with_line("done"),
        );

        let spec = LaunchSpec::updater("/x/updater", Verb::Check).capture_output();
        let mut lines = Vec::new();
        let status = launcher
            .run(&spec, &mut |line: &str| lines.push(line.to_string()))
            .await
            .unwrap();

        assert_eq!(status.code, Some(1));
        assert_eq!(lines, vec!["FUTO Updater v3", "done"]);
        assert_eq!(launcher.requests_for("check").len(), 1);
    }

    #[tokio::test]
    async fn uncaptured_run_prints_nothing() {
        let launcher = MockLauncher::new();
        launcher.respond("version", MockResponse::exit(5).with_line("ignored"));

        let spec = LaunchSpec::updater("/x/updater", Verb::Version);
        let mut count = 0;
        let status = launcher.run(&spec, &mut |_: &str| count += 1).await.unwrap();

        assert_eq!(status.code, Some(5));
        assert_eq!(count, 0);
    }

    #[tokio::test]
    async fn spawn_failure() {
        let launcher = MockLauncher::new();
        launcher.fail("update");

        let spec = LaunchSpec::updater("/x/updater", Verb::Update);
        let result = launcher.spawn_detached(&spec).await;
        assert!(matches!(result, Err(HostError::NotRunnable { .. })));
    }

    #[tokio::test]
    async fn no_terminal_starts_nothing() {
        let launcher = MockLauncher::new();
        launcher.set_terminal_available(false);

        let spec = LaunchSpec::updater("/x/updater", Verb::Update).in_terminal();
        assert!(launcher.spawn_detached(&spec).await.unwrap().is_none());

        let plain = LaunchSpec::updater("/x/updater", Verb::Reboot).through_shell();
        assert!(launcher.spawn_detached(&plain).await.unwrap().is_some());
    }
}
