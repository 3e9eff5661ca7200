//! Update orchestrator state machine
//!
//! Drives the application's side of the update protocol: ask the updater
//! whether an update exists, then hand control to it. `update` and
//! `reboot_test` end in [`OrchestratorState::HandedOff`] and the caller is
//! expected to exit; `update_self` blocks until the updater finishes and
//! returns control.

use handoff_api::{HandoffOutcome, OrchestratorState, UpdateCheck, Verb};
use handoff_host_api::{
    ExitStatus, HandoffLaunch, LaunchSpec, PlatformResolver, ProcessLauncher, quote_argument,
};
use handoff_util::ProcessIds;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

use crate::{
    OrchestratorError, OrchestratorResult, RemoteClient, StartupContext, VersionNegotiator,
};

/// Tunables for the orchestrator
#[derive(Debug, Clone)]
pub struct OrchestratorOptions {
    /// Pause after a self-update before touching the updater binary
    pub settle_interval: Duration,
}

impl Default for OrchestratorOptions {
    fn default() -> Self {
        Self {
            settle_interval: Duration::from_secs(5),
        }
    }
}

/// The update orchestrator.
///
/// Actions take `&mut self`, so only one runs at a time.
pub struct Orchestrator {
    resolver: PlatformResolver,
    launcher: Arc<dyn ProcessLauncher>,
    negotiator: VersionNegotiator,
    startup: StartupContext,
    options: OrchestratorOptions,
    state: OrchestratorState,
}

impl Orchestrator {
    pub fn new(
        resolver: PlatformResolver,
        launcher: Arc<dyn ProcessLauncher>,
        remote: RemoteClient,
        startup: StartupContext,
        options: OrchestratorOptions,
    ) -> Self {
        let negotiator = VersionNegotiator::new(resolver.clone(), launcher.clone(), remote);

        Self {
            resolver,
            launcher,
            negotiator,
            startup,
            options,
            state: OrchestratorState::Idle,
        }
    }

    pub fn state(&self) -> OrchestratorState {
        self.state
    }

    pub fn negotiator(&self) -> &VersionNegotiator {
        &self.negotiator
    }

    pub fn resolver(&self) -> &PlatformResolver {
        &self.resolver
    }

    pub fn startup(&self) -> &StartupContext {
        &self.startup
    }

    fn transition(&mut self, next: OrchestratorState) -> OrchestratorResult<()> {
        if self.state.is_terminal() {
            return Err(OrchestratorError::AlreadyHandedOff);
        }
        if !self.state.can_transition_to(next) {
            return Err(OrchestratorError::InvalidTransition {
                from: self.state,
                to: next,
            });
        }

        debug!(from = %self.state, to = %next, "State transition");
        self.state = next;
        Ok(())
    }

    /// Return to a settled state after an operation that did not complete
    fn settle_back(&mut self, previous: OrchestratorState) {
        debug!(from = %self.state, to = %previous, "Operation abandoned");
        self.state = previous;
    }

    /// Start an operation: the updater must exist and no handoff may have
    /// happened yet. Yields the updater path and the state to return to.
    fn begin(
        &mut self,
        operation: OrchestratorState,
    ) -> OrchestratorResult<(PathBuf, OrchestratorState)> {
        if self.state.is_terminal() {
            return Err(OrchestratorError::AlreadyHandedOff);
        }

        let updater = self
            .resolver
            .updater_path()
            .ok_or(OrchestratorError::UpdaterNotFound)?;

        let previous = self.state;
        self.transition(operation)?;
        Ok((updater, previous))
    }

    /// `-process_ids <csv> -executable "<self>"`
    fn handoff_arguments(&self, pids: &ProcessIds) -> Vec<String> {
        vec![
            "-process_ids".to_string(),
            pids.to_csv(),
            "-executable".to_string(),
            quote_argument(&self.resolver.self_executable_path()),
        ]
    }

    /// Ask the updater whether an update is available
    pub async fn check(&mut self) -> OrchestratorResult<UpdateCheck> {
        if self.state.is_terminal() {
            return Err(OrchestratorError::AlreadyHandedOff);
        }

        let previous = self.state;
        self.transition(OrchestratorState::CheckingAvailability)?;

        match self.negotiator.check_for_update().await {
            Ok(check) => {
                let next = if check.update_available() {
                    OrchestratorState::UpdateAvailable
                } else {
                    OrchestratorState::UpToDate
                };
                self.transition(next)?;
                Ok(check)
            }
            Err(e) => {
                self.settle_back(previous);
                Err(e)
            }
        }
    }

    /// Hand control to the updater to install an update.
    ///
    /// The updater waits for `pids` to exit, replaces the application and
    /// relaunches it. On Linux this happens in a visible terminal; if none
    /// can be found nothing is started and [`HandoffOutcome::NoTerminal`] is
    /// returned.
    pub async fn update(&mut self, pids: &ProcessIds) -> OrchestratorResult<HandoffOutcome> {
        let (updater, previous) = self.begin(OrchestratorState::Updating)?;

        let spec = LaunchSpec::updater(&updater, Verb::Update)
            .args(self.handoff_arguments(pids))
            .through_shell();
        let spec = match self.resolver.launch_policy().handoff {
            HandoffLaunch::VisibleTerminal => spec.in_terminal(),
            HandoffLaunch::Shell => spec,
        };

        info!(pids = %pids, updater = %updater.display(), "Handing off to updater");
        self.hand_off(&spec, Verb::Update, previous).await
    }

    /// Relaunch the application through the updater without updating.
    ///
    /// Startup arguments are forwarded base64-encoded when present.
    pub async fn reboot_test(&mut self, pids: &ProcessIds) -> OrchestratorResult<HandoffOutcome> {
        let (updater, previous) = self.begin(OrchestratorState::TestingReboot)?;

        let mut spec = LaunchSpec::updater(&updater, Verb::Reboot)
            .args(self.handoff_arguments(pids))
            .through_shell();
        if let Some(encoded) = self.startup.encoded() {
            spec = spec.arg("-executable_args").arg(encoded);
        }

        info!(pids = %pids, updater = %updater.display(), "Testing reboot through updater");
        self.hand_off(&spec, Verb::Reboot, previous).await
    }

    async fn hand_off(
        &mut self,
        spec: &LaunchSpec,
        verb: Verb,
        previous: OrchestratorState,
    ) -> OrchestratorResult<HandoffOutcome> {
        match self.launcher.spawn_detached(spec).await {
            Ok(Some(receipt)) => {
                self.transition(OrchestratorState::HandedOff { verb })?;
                info!(pid = receipt.pid, verb = %verb, "Updater started, application should exit");
                Ok(HandoffOutcome::HandedOff { pid: receipt.pid })
            }
            Ok(None) => {
                warn!(verb = %verb, "No terminal available, updater was not started");
                self.settle_back(previous);
                Ok(HandoffOutcome::NoTerminal)
            }
            Err(e) => {
                self.settle_back(previous);
                Err(e.into())
            }
        }
    }

    /// Let the updater upgrade itself, then wait for it to settle.
    ///
    /// On Linux the updater's permissions are repaired afterwards since the
    /// replaced binary may have lost its execute bit. That step never fails
    /// the operation.
    pub async fn update_self(&mut self) -> OrchestratorResult<ExitStatus> {
        let (updater, previous) = self.begin(OrchestratorState::SelfUpdating)?;

        let spec = LaunchSpec::updater(&updater, Verb::UpdateSelf);
        info!(updater = %updater.display(), "Updating updater");
        let status = match self.launcher.run(&spec, &mut |_: &str| {}).await {
            Ok(status) => status,
            Err(e) => {
                self.settle_back(previous);
                return Err(e.into());
            }
        };
        info!(code = ?status.code, signal = ?status.signal, "Updater self-update finished");

        if !self.options.settle_interval.is_zero() {
            debug!(interval = ?self.options.settle_interval, "Waiting for updater to settle");
            tokio::time::sleep(self.options.settle_interval).await;
        }

        if self.resolver.launch_policy().repair_permissions {
            self.repair_permissions(&updater).await;
        }

        self.transition(OrchestratorState::Idle)?;
        Ok(status)
    }

    /// `chmod -R u=rwx <updater>`, best effort
    async fn repair_permissions(&self, updater: &Path) -> bool {
        let spec = LaunchSpec::program("chmod")
            .args(["-R", "u=rwx"])
            .arg(updater.display().to_string())
            .capture_output();

        let result = self
            .launcher
            .run(&spec, &mut |line: &str| debug!(output = line, "chmod"))
            .await;

        match result {
            Ok(status) if status.is_success() => {
                info!(updater = %updater.display(), "Updater permissions repaired");
                true
            }
            Ok(status) => {
                warn!(code = ?status.code, "Failed to repair updater permissions");
                false
            }
            Err(e) => {
                warn!(error = %e, "Failed to repair updater permissions");
                false
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use handoff_api::ProductIdentity;
    use handoff_host_api::{MockLauncher, MockResponse, Platform, PlatformKind, platform_for};

    struct Fixture {
        dir: tempfile::TempDir,
        launcher: Arc<MockLauncher>,
    }

    impl Fixture {
        fn new() -> Self {
            Self {
                dir: tempfile::tempdir().unwrap(),
                launcher: Arc::new(MockLauncher::new()),
            }
        }

        fn with_updater(kind: PlatformKind) -> Self {
            let fixture = Self::new();
            let name = platform_for(kind).updater_file_name(&product());
            std::fs::write(fixture.dir.path().join(name), "").unwrap();
            fixture
        }

        fn orchestrator(&self, kind: PlatformKind, startup: &str) -> Orchestrator {
            let resolver = PlatformResolver::new(platform_for(kind), product(), self.dir.path());
            let launcher: Arc<dyn ProcessLauncher> = self.launcher.clone();
            Orchestrator::new(
                resolver,
                launcher,
                RemoteClient::new(),
                StartupContext::new(startup),
                OrchestratorOptions {
                    settle_interval: Duration::ZERO,
                },
            )
        }
    }

    fn product() -> ProductIdentity {
        ProductIdentity::new("Grayjay", 10, "FUTO.Updater.Client", "Grayjay")
    }

    fn pids() -> ProcessIds {
        ProcessIds::new(vec![1234, 5678])
    }

    #[tokio::test]
    async fn starts_idle() {
        let fixture = Fixture::new();
        let orchestrator = fixture.orchestrator(PlatformKind::Linux, "");
        assert_eq!(orchestrator.state(), OrchestratorState::Idle);
    }

    #[tokio::test]
    async fn every_action_requires_updater() {
        let fixture = Fixture::new();
        let mut orchestrator = fixture.orchestrator(PlatformKind::Linux, "");

        assert!(matches!(
            orchestrator.check().await,
            Err(OrchestratorError::UpdaterNotFound)
        ));
        assert!(matches!(
            orchestrator.update(&pids()).await,
            Err(OrchestratorError::UpdaterNotFound)
        ));
        assert!(matches!(
            orchestrator.update_self().await,
            Err(OrchestratorError::UpdaterNotFound)
        ));
        assert!(matches!(
            orchestrator.reboot_test(&pids()).await,
            Err(OrchestratorError::UpdaterNotFound)
        ));

        assert!(fixture.launcher.requests().is_empty());
        assert_eq!(orchestrator.state(), OrchestratorState::Idle);
    }

    #[tokio::test]
    async fn check_settles_on_result() {
        let fixture = Fixture::with_updater(PlatformKind::Linux);
        let mut orchestrator = fixture.orchestrator(PlatformKind::Linux, "");

        fixture.launcher.respond("check", MockResponse::exit(1));
        assert!(orchestrator.check().await.unwrap().update_available());
        assert_eq!(orchestrator.state(), OrchestratorState::UpdateAvailable);

        fixture.launcher.respond("check", MockResponse::exit(2));
        assert!(!orchestrator.check().await.unwrap().update_available());
        assert_eq!(orchestrator.state(), OrchestratorState::UpToDate);
    }

    #[tokio::test]
    async fn failed_check_returns_to_previous_state() {
        let fixture = Fixture::with_updater(PlatformKind::Linux);
        let mut orchestrator = fixture.orchestrator(PlatformKind::Linux, "");

        fixture.launcher.respond("check", MockResponse::exit(1));
        orchestrator.check().await.unwrap();

        fixture.launcher.fail("check");
        let err = orchestrator.check().await.unwrap_err();
        assert!(err.is_updater_missing());
        assert_eq!(orchestrator.state(), OrchestratorState::UpdateAvailable);
    }

    #[tokio::test]
    async fn linux_update_opens_terminal() {
        let fixture = Fixture::with_updater(PlatformKind::Linux);
        let mut orchestrator = fixture.orchestrator(PlatformKind::Linux, "");

        let outcome = orchestrator.update(&pids()).await.unwrap();
        assert_eq!(outcome, HandoffOutcome::HandedOff { pid: 1000 });
        assert_eq!(
            orchestrator.state(),
            OrchestratorState::HandedOff { verb: Verb::Update }
        );

        let requests = fixture.launcher.requests_for("update");
        assert_eq!(requests.len(), 1);
        let spec = &requests[0];
        assert!(spec.interactive_terminal);
        assert!(!spec.redirect_output);
        assert_eq!(
            spec.argv(),
            vec![
                "update",
                "-process_ids",
                "1234,5678",
                "-executable",
                "\"Grayjay\""
            ]
        );
    }

    #[tokio::test]
    async fn windows_update_goes_through_shell() {
        let fixture = Fixture::with_updater(PlatformKind::Windows);
        let mut orchestrator = fixture.orchestrator(PlatformKind::Windows, "");

        orchestrator.update(&pids()).await.unwrap();

        let spec = &fixture.launcher.requests_for("update")[0];
        assert!(spec.use_shell);
        assert!(!spec.interactive_terminal);
        assert!(spec.executable.ends_with("FUTO.Updater.Client.exe"));
        assert_eq!(spec.arguments[3], "\"Grayjay.exe\"");
    }

    #[tokio::test]
    async fn macos_update_relaunches_bundle() {
        let fixture = Fixture::with_updater(PlatformKind::MacOs);
        let mut orchestrator = fixture.orchestrator(PlatformKind::MacOs, "");

        orchestrator.update(&pids()).await.unwrap();

        let spec = &fixture.launcher.requests_for("update")[0];
        assert!(spec.use_shell);
        assert_eq!(spec.arguments[3], "\"Grayjay.app\"");
    }

    #[tokio::test]
    async fn no_terminal_starts_nothing_and_settles() {
        let fixture = Fixture::with_updater(PlatformKind::Linux);
        fixture.launcher.set_terminal_available(false);
        let mut orchestrator = fixture.orchestrator(PlatformKind::Linux, "");

        let outcome = orchestrator.update(&pids()).await.unwrap();
        assert_eq!(outcome, HandoffOutcome::NoTerminal);
        assert_eq!(orchestrator.state(), OrchestratorState::Idle);
    }

    #[tokio::test]
    async fn handed_off_is_terminal() {
        let fixture = Fixture::with_updater(PlatformKind::Linux);
        let mut orchestrator = fixture.orchestrator(PlatformKind::Linux, "");

        orchestrator.update(&pids()).await.unwrap();

        assert!(matches!(
            orchestrator.check().await,
            Err(OrchestratorError::AlreadyHandedOff)
        ));
        assert!(matches!(
            orchestrator.update(&pids()).await,
            Err(OrchestratorError::AlreadyHandedOff)
        ));
        assert!(matches!(
            orchestrator.update_self().await,
            Err(OrchestratorError::AlreadyHandedOff)
        ));
        assert!(matches!(
            orchestrator.reboot_test(&pids()).await,
            Err(OrchestratorError::AlreadyHandedOff)
        ));
        assert_eq!(fixture.launcher.requests().len(), 1);
    }

    #[tokio::test]
    async fn spawn_failure_settles_back() {
        let fixture = Fixture::with_updater(PlatformKind::Windows);
        fixture.launcher.fail("update");
        let mut orchestrator = fixture.orchestrator(PlatformKind::Windows, "");

        let err = orchestrator.update(&pids()).await.unwrap_err();
        assert!(err.is_updater_missing());
        assert_eq!(orchestrator.state(), OrchestratorState::Idle);
    }

    #[tokio::test]
    async fn reboot_forwards_startup_args() {
        let fixture = Fixture::with_updater(PlatformKind::Linux);
        let mut orchestrator = fixture.orchestrator(PlatformKind::Linux, "-x");

        let outcome = orchestrator.reboot_test(&ProcessIds::new(vec![42])).await.unwrap();
        assert!(outcome.handed_off());
        assert_eq!(
            orchestrator.state(),
            OrchestratorState::HandedOff { verb: Verb::Reboot }
        );

        let spec = &fixture.launcher.requests_for("reboot")[0];
        assert!(spec.use_shell);
        assert!(!spec.interactive_terminal);
        assert_eq!(
            spec.argv(),
            vec![
                "reboot",
                "-process_ids",
                "42",
                "-executable",
                "\"Grayjay\"",
                "-executable_args",
                "BASE64:LXg="
            ]
        );
    }

    #[tokio::test]
    async fn reboot_without_startup_args() {
        let fixture = Fixture::with_updater(PlatformKind::Linux);
        let mut orchestrator = fixture.orchestrator(PlatformKind::Linux, "   ");

        orchestrator.reboot_test(&pids()).await.unwrap();

        let spec = &fixture.launcher.requests_for("reboot")[0];
        assert!(!spec.arguments.iter().any(|a| a == "-executable_args"));
    }

    #[tokio::test]
    async fn linux_self_update_repairs_permissions() {
        let fixture = Fixture::with_updater(PlatformKind::Linux);
        fixture.launcher.respond("updateself", MockResponse::exit(0));
        let mut orchestrator = fixture.orchestrator(PlatformKind::Linux, "");

        let status = orchestrator.update_self().await.unwrap();
        assert!(status.is_success());
        assert_eq!(orchestrator.state(), OrchestratorState::Idle);

        let requests = fixture.launcher.requests();
        assert_eq!(requests.len(), 2);
        assert_eq!(requests[0].label(), "updateself");
        assert!(!requests[0].redirect_output);
        assert!(!requests[0].use_shell);

        assert_eq!(requests[1].label(), "chmod");
        assert_eq!(requests[1].arguments[..2], ["-R", "u=rwx"]);
        assert!(requests[1].arguments[2].ends_with("FUTO.Updater.Client"));
    }

    #[tokio::test]
    async fn failed_permission_repair_is_swallowed() {
        let fixture = Fixture::with_updater(PlatformKind::Linux);
        fixture.launcher.fail("chmod");
        let mut orchestrator = fixture.orchestrator(PlatformKind::Linux, "");

        assert!(orchestrator.update_self().await.is_ok());

        fixture.launcher.respond("chmod", MockResponse::exit(1));
        assert!(orchestrator.update_self().await.is_ok());
        assert_eq!(orchestrator.state(), OrchestratorState::Idle);
    }

    #[tokio::test]
    async fn windows_self_update_skips_permission_repair() {
        let fixture = Fixture::with_updater(PlatformKind::Windows);
        let mut orchestrator = fixture.orchestrator(PlatformKind::Windows, "");

        orchestrator.update_self().await.unwrap();

        let labels: Vec<_> = fixture.launcher.requests().iter().map(|s| s.label()).collect();
        assert_eq!(labels, vec!["updateself"]);
    }

    #[tokio::test]
    async fn update_still_possible_after_self_update() {
        let fixture = Fixture::with_updater(PlatformKind::Windows);
        let mut orchestrator = fixture.orchestrator(PlatformKind::Windows, "");

        fixture.launcher.respond("check", MockResponse::exit(1));
        orchestrator.check().await.unwrap();
        orchestrator.update_self().await.unwrap();
        assert!(orchestrator.update(&pids()).await.unwrap().handed_off());
    }

    #[tokio::test]
    async fn self_update_spawn_failure_is_fatal() {
        let fixture = Fixture::with_updater(PlatformKind::Linux);
        fixture.launcher.fail("updateself");
        let mut orchestrator = fixture.orchestrator(PlatformKind::Linux, "");

        let err = orchestrator.update_self().await.unwrap_err();
        assert!(err.is_updater_missing());
        assert_eq!(orchestrator.state(), OrchestratorState::Idle);
        assert!(fixture.launcher.requests_for("chmod").is_empty());
    }
}
