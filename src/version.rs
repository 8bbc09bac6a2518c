//! Build information.

use std::time::SystemTime;

use serde::Serialize;

/// Version, commit and build date of the running binary.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Version {
    /// Release version.
    pub version: String,
    /// Commit the binary was built from.
    pub commit: String,
    /// Build date in RFC 3339.
    pub date: String,
}

impl Version {
    /// Version information baked in at compile time.
    ///
    /// `SORA_EXPORTER_COMMIT` and `SORA_EXPORTER_BUILD_DATE` are read from the
    /// build environment. Missing values fall back to `HEAD` and the current
    /// time respectively.
    pub fn current() -> Self {
        Self::new(
            option_env!("CARGO_PKG_VERSION"),
            option_env!("SORA_EXPORTER_COMMIT"),
            option_env!("SORA_EXPORTER_BUILD_DATE"),
        )
    }

    fn new(version: Option<&str>, commit: Option<&str>, date: Option<&str>) -> Self {
        let or = |value: Option<&str>, default: &str| match value {
            Some(v) if !v.is_empty() => v.to_string(),
            _ => default.to_string(),
        };

        Version {
            version: or(version, "devel"),
            commit: or(commit, "HEAD"),
            date: match date {
                Some(d) if !d.is_empty() => d.to_string(),
                _ => humantime::format_rfc3339_seconds(SystemTime::now()).to_string(),
            },
        }
    }

    /// JSON representation printed by `--version`.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}
