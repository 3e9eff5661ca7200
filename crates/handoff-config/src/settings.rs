//! Validated settings

use crate::schema::{RawHandoff, RawProduct, RawSettings};
use handoff_api::ProductIdentity;
use std::path::PathBuf;
use std::time::Duration;

/// Default settling interval after a self-update
pub const DEFAULT_SETTLE_INTERVAL: Duration = Duration::from_secs(5);

/// Validated settings ready for use by the orchestrator
#[derive(Debug, Clone)]
pub struct Settings {
    pub product: ProductIdentity,

    /// Pause after the updater upgrades itself, letting file locks release
    pub settle_interval: Duration,

    /// Directory to resolve the updater and its config in; `None` means the
    /// current directory
    pub working_dir: Option<PathBuf>,
}

impl Settings {
    /// Convert from raw settings (after validation)
    pub fn from_raw(raw: RawSettings) -> Self {
        let RawHandoff {
            settle_seconds,
            working_dir,
        } = raw.handoff;

        Self {
            product: convert_product(raw.product),
            settle_interval: settle_seconds
                .map(Duration::from_secs)
                .unwrap_or(DEFAULT_SETTLE_INTERVAL),
            working_dir,
        }
    }
}

fn convert_product(raw: RawProduct) -> ProductIdentity {
    ProductIdentity {
        app_name: raw.app_name,
        app_version: raw.app_version,
        updater_name: raw.updater_name,
        banner: raw.banner,
        bundle_name: raw.bundle_name,
        platform_dist: raw.platform_dist,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn explicit_handoff_section() {
        let raw: RawSettings = toml::from_str(
            r#"
            [product]
            app_name = "App"
            app_version = 9
            updater_name = "App.Updater"
            banner = "App"
            bundle_name = "App.Desktop"
            platform_dist = "linux-arm64"

            [handoff]
            settle_seconds = 0
            working_dir = "/opt/app"
            "#,
        )
        .unwrap();

        let settings = Settings::from_raw(raw);
        assert_eq!(settings.settle_interval, Duration::ZERO);
        assert_eq!(settings.working_dir, Some(PathBuf::from("/opt/app")));
        assert_eq!(settings.product.bundle_name.as_deref(), Some("App.Desktop"));
        assert_eq!(settings.product.platform_dist.as_deref(), Some("linux-arm64"));
    }
}
