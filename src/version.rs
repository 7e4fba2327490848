//! Build version reported to dashboards and by `--version`.

use crate::types::VersionInfo;

const RELEASE: &str = env!("FRONTDESK_RELEASE");
const GIT_HASH: &str = env!("FRONTDESK_GIT_HASH");

/// Version info for the settings push.
///
/// Release builds report only the package version; development builds also
/// carry the short git hash (or `unknown` outside a checkout).
pub fn version_info() -> VersionInfo {
    let build = match (RELEASE, GIT_HASH) {
        ("true", _) => None,
        (_, "") => Some("unknown".to_string()),
        (_, hash) => Some(hash.to_string()),
    };
    VersionInfo {
        installed_version: env!("CARGO_PKG_VERSION").to_string(),
        build,
    }
}

/// `0.4.0` on release builds, `0.4.0-dev@abc1234` otherwise.
pub fn version_string() -> String {
    let info = version_info();
    match info.build {
        Some(build) => format!("{}-dev@{build}", info.installed_version),
        None => info.installed_version,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn installed_version_is_package_version() {
        assert_eq!(version_info().installed_version, env!("CARGO_PKG_VERSION"));
    }

    #[test]
    fn version_string_starts_with_package_version() {
        assert!(version_string().starts_with(env!("CARGO_PKG_VERSION")));
    }
}
