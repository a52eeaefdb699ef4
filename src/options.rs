//! Resolved build options for one run.

use anyhow::bail;
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

/// Identifier prefix used when neither the flag nor the config sets one.
pub const DEFAULT_IDENTIFIER_PREFIX: &str = "org.homebrew";

/// `pkgbuild --ownership` values.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OwnershipMode {
    Recommended,
    Preserve,
    PreserveOther,
}

impl OwnershipMode {
    pub const ALL: [OwnershipMode; 3] = [
        OwnershipMode::Recommended,
        OwnershipMode::Preserve,
        OwnershipMode::PreserveOther,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            OwnershipMode::Recommended => "recommended",
            OwnershipMode::Preserve => "preserve",
            OwnershipMode::PreserveOther => "preserve-other",
        }
    }
}

impl fmt::Display for OwnershipMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for OwnershipMode {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "recommended" => Ok(OwnershipMode::Recommended),
            "preserve" => Ok(OwnershipMode::Preserve),
            "preserve-other" => Ok(OwnershipMode::PreserveOther),
            other => bail!(
                "custom ownership '{}' is not valid; expected one of {}",
                other,
                OwnershipMode::ALL.map(OwnershipMode::as_str).join(", ")
            ),
        }
    }
}

/// Parse an ownership value, degrading an invalid one to a warning.
pub fn parse_ownership(raw: &str) -> Option<OwnershipMode> {
    match raw.parse() {
        Ok(mode) => Some(mode),
        Err(err) => {
            crate::report::warn(format!("{}; ignoring it", err));
            None
        }
    }
}

/// Trim whitespace and trailing dots; an empty prefix counts as unset.
pub fn normalize_identifier_prefix(raw: &str) -> Option<String> {
    let prefix = raw.trim().trim_end_matches('.');
    if prefix.is_empty() {
        None
    } else {
        Some(prefix.to_string())
    }
}

/// Everything the pipeline needs to know about this run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildOptions {
    /// Formula to package.
    pub package: String,
    pub identifier_prefix: String,
    /// Used verbatim as the package version when set.
    pub version_override: Option<String>,
    pub ownership: Option<OwnershipMode>,
    pub install_location: Option<PathBuf>,
    pub preinstall_script: Option<PathBuf>,
    pub postinstall_script: Option<PathBuf>,
    /// Directory holding `preinstall` and/or `postinstall`.
    pub scripts_dir: Option<PathBuf>,
    pub with_deps: bool,
    pub without_kegs: bool,
    pub without_opt: bool,
    /// Accepted for compatibility; has no effect.
    pub skip_cask_deps: bool,
    /// Print extra information and keep temporary directories.
    pub debug: bool,
}

impl BuildOptions {
    /// Options with every flag off and the default identifier prefix.
    pub fn new(package: impl Into<String>) -> Self {
        Self {
            package: package.into(),
            identifier_prefix: DEFAULT_IDENTIFIER_PREFIX.to_string(),
            version_override: None,
            ownership: None,
            install_location: None,
            preinstall_script: None,
            postinstall_script: None,
            scripts_dir: None,
            with_deps: false,
            without_kegs: false,
            without_opt: false,
            skip_cask_deps: false,
            debug: false,
        }
    }

    /// Whether the keg is mirrored under `Cellar/`.
    pub fn stage_keg(&self) -> bool {
        !self.without_kegs
    }

    /// Whether `opt/<name>` is staged. Suppressing kegs suppresses this too.
    pub fn stage_opt(&self) -> bool {
        !self.without_kegs && !self.without_opt
    }
}
