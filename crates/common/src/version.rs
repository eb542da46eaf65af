use std::fmt;

use serde::Serialize;

/// Compile-time information about this build, populated by `build.rs`.
#[derive(Debug, Clone, Serialize)]
pub struct BuildInfo {
    pub crate_version: &'static str,
    pub version: &'static str,
    pub build_profile: &'static str,
    pub build_timestamp: &'static str,
    pub rust_version: &'static str,
    pub target: &'static str,
    /// Version of the `age` crate this build links against
    pub age_version: &'static str,
}

pub fn build_info() -> BuildInfo {
    BuildInfo {
        crate_version: env!("CARGO_PKG_VERSION"),
        version: env!("REPO_VERSION"),
        build_profile: env!("BUILD_PROFILE"),
        build_timestamp: env!("BUILD_TIMESTAMP"),
        rust_version: env!("RUST_VERSION"),
        target: env!("BUILD_TARGET"),
        age_version: env!("AGE_VERSION"),
    }
}

impl fmt::Display for BuildInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "agebox {} ({})\nprofile: {}\nbuilt: {}\nrustc: {}\ntarget: {}\nage: {}",
            self.crate_version,
            self.version,
            self.build_profile,
            self.build_timestamp,
            self.rust_version,
            self.target,
            self.age_version
        )
    }
}
