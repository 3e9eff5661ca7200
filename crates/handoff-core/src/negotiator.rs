//! Version negotiation with the updater binary and the update server
//!
//! Every query here degrades to a default instead of failing: an absent
//! updater reads as version 1, an unreachable server as "no target". Only
//! `check_for_update` raises, because it has a hard precondition on the
//! updater being present.

use handoff_api::{
    Changelog, OLDEST_UPDATER_VERSION, UpdateAvailability, UpdateCheck, Verb, VersionProbe,
};
use handoff_config::{ConfigStore, UpdaterConfig};
use handoff_host_api::{LaunchSpec, PlatformResolver, ProcessLauncher};
use regex::Regex;
use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::remote::{
    RemoteClient, changelog_url, updater_download_url, updater_version_url, version_last_url,
};
use crate::{OrchestratorError, OrchestratorResult};

/// Pattern matching the updater's banner line, capturing its version
pub fn banner_pattern(banner: &str) -> Result<Regex, regex::Error> {
    Regex::new(&format!(r"{} Updater v([0-9]+)", regex::escape(banner)))
}

/// Answers version questions for one installation
pub struct VersionNegotiator {
    resolver: PlatformResolver,
    launcher: Arc<dyn ProcessLauncher>,
    config: ConfigStore,
    remote: RemoteClient,
    banner: Option<Regex>,
}

impl VersionNegotiator {
    pub fn new(
        resolver: PlatformResolver,
        launcher: Arc<dyn ProcessLauncher>,
        remote: RemoteClient,
    ) -> Self {
        let config = ConfigStore::new(resolver.base_dir());
        let banner = match banner_pattern(&resolver.product().banner) {
            Ok(re) => Some(re),
            Err(e) => {
                warn!(error = %e, "Cannot build updater banner pattern, versions will not be reported");
                None
            }
        };

        Self {
            resolver,
            launcher,
            config,
            remote,
            banner,
        }
    }

    pub fn resolver(&self) -> &PlatformResolver {
        &self.resolver
    }

    /// Current contents of `UpdaterConfig.json`, re-read on every call
    pub fn updater_config(&self) -> Option<UpdaterConfig> {
        self.config.load()
    }

    /// Ask the installed updater for its version.
    ///
    /// Legacy applications ship an updater that cannot answer, so it is not
    /// invoked for them.
    pub async fn probe_updater_version(&self) -> VersionProbe {
        let Some(updater) = self.resolver.updater_path() else {
            debug!("No updater present, assuming oldest version");
            return VersionProbe::not_found();
        };

        if self.resolver.product().is_legacy() {
            debug!(
                app_version = self.resolver.product().app_version,
                "Legacy application, not asking updater for its version"
            );
            return VersionProbe::not_found();
        }

        let spec = LaunchSpec::updater(&updater, Verb::Version).capture_output();
        match self.launcher.run(&spec, &mut |_: &str| {}).await {
            Ok(status) => {
                let probe = VersionProbe::from_exit_code(status.code);
                debug!(version = probe.version, code = ?status.code, "Updater reported version");
                probe
            }
            Err(e) => {
                warn!(error = %e, "Failed to query updater version");
                VersionProbe::not_found()
            }
        }
    }

    /// Installed updater version, at least 1
    pub async fn installed_updater_version(&self) -> u32 {
        self.probe_updater_version().await.version
    }

    /// Application version the server offers; `None` when there is no
    /// usable update source.
    pub async fn target_version(&self) -> Option<u32> {
        let config = self.updater_config()?;
        let Some(server) = config.valid_server() else {
            warn!("Updater config has no valid server");
            return None;
        };

        if let Some(pinned) = config.pinned_version() {
            info!(version = pinned, "Using pinned target version");
            return Some(pinned);
        }

        let url = version_last_url(server);
        match self.remote.get_integer(&url).await {
            Ok(version) => match u32::try_from(version) {
                Ok(version) => Some(version),
                Err(_) => {
                    warn!(version = version, url = %url, "Server reported a negative version");
                    None
                }
            },
            Err(e) => {
                warn!(error = %e, url = %url, "Failed to fetch last version");
                None
            }
        }
    }

    /// Updater version required by an application release as the server
    /// reports it, zero and negative values included. 1 on any failure.
    pub async fn target_updater_version(&self, server: &str, app_version: u32, dist: &str) -> i64 {
        let url = updater_version_url(server, app_version, dist);
        match self.remote.get_integer(&url).await {
            Ok(version) => version,
            Err(e) => {
                warn!(error = %e, url = %url, "Failed to fetch updater version");
                i64::from(OLDEST_UPDATER_VERSION)
            }
        }
    }

    /// Release notes for the target version
    pub async fn target_changelog(&self) -> Option<Changelog> {
        let config = self.updater_config()?;
        let server = config.valid_server()?.to_string();

        let version = self.target_version().await.filter(|v| *v > 0)?;
        let platform = self.resolver.platform_dist();
        let url = changelog_url(&server, version, &platform);

        match self.remote.get_text(&url).await {
            Ok(text) => Some(Changelog {
                version,
                server,
                platform,
                text,
            }),
            Err(e) => {
                warn!(error = %e, url = %url, "Failed to fetch changelog");
                None
            }
        }
    }

    /// Download location of the updater for a release, when this platform
    /// ships one.
    pub fn updater_url(&self, server: &str, app_version: u32) -> Option<String> {
        let name = self.resolver.updater_download_name()?;
        Some(updater_download_url(
            server,
            app_version,
            &self.resolver.platform_dist(),
            &name,
        ))
    }

    /// Version from one line of updater output, if it is the banner line
    pub fn parse_banner_line(&self, line: &str) -> Option<u32> {
        self.banner
            .as_ref()?
            .captures(line)?
            .get(1)?
            .as_str()
            .parse()
            .ok()
    }

    /// Run the updater's `check` verb.
    ///
    /// Exit code 1 means an update is available and 2 means up to date. Any
    /// other code is reported as no update.
    pub async fn check_for_update(&self) -> OrchestratorResult<UpdateCheck> {
        let updater = self
            .resolver
            .updater_path()
            .ok_or(OrchestratorError::UpdaterNotFound)?;

        let spec = LaunchSpec::updater(&updater, Verb::Check).capture_output();
        let mut updater_version = None;
        let status = self
            .launcher
            .run(&spec, &mut |line: &str| {
                if let Some(version) = self.parse_banner_line(line) {
                    updater_version = Some(version);
                }
            })
            .await?;

        let availability = UpdateAvailability::from_exit_code(status.code);
        if let UpdateAvailability::Unrecognized { exit_code } = availability {
            warn!(
                exit_code = ?exit_code,
                signal = ?status.signal,
                "Updater check exited with an unrecognized code, treating as no update"
            );
        }

        info!(
            available = availability.is_available(),
            updater_version = ?updater_version,
            "Update check finished"
        );

        Ok(UpdateCheck {
            availability,
            updater_version,
        })
    }
}
