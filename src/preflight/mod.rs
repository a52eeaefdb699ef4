//! Preflight checks for package builds.
//!
//! Validates that the host has the tools the pipeline shells out to, so a
//! missing `pkgbuild` is reported before anything is staged.
//!
//! # Example
//!
//! ```rust
//! use brew_caskage::preflight::{command_exists, check_required_tools};
//!
//! if !command_exists("pkgbuild") {
//!     println!("pkgbuild is only available on macOS");
//! }
//!
//! let tools = &[("rsync", "brew install rsync")];
//! if let Err(e) = check_required_tools(tools) {
//!     eprintln!("{}", e);
//! }
//! ```

use anyhow::{bail, Result};

/// Check if a command exists on `PATH`.
pub fn command_exists(cmd: &str) -> bool {
    which::which(cmd).is_ok()
}

/// Host tools used to build a package.
///
/// Each tuple is (command_name, how to get it).
pub const REQUIRED_TOOLS: &[(&str, &str)] = &[
    ("brew", "https://brew.sh"),
    ("rsync", "brew install rsync"),
    ("pkgbuild", "Xcode Command Line Tools: xcode-select --install"),
];

/// Check that specific tools are available.
///
/// Fails listing every missing tool, not just the first.
pub fn check_required_tools(tools: &[(&str, &str)]) -> Result<()> {
    let missing: Vec<_> = tools
        .iter()
        .filter(|(tool, _)| !command_exists(tool))
        .collect();

    if !missing.is_empty() {
        let msg = missing
            .iter()
            .map(|(t, hint)| format!("  {} ({})", t, hint))
            .collect::<Vec<_>>()
            .join("\n");
        bail!("Missing required host tools:\n{}", msg);
    }

    Ok(())
}

/// Check every tool in [`REQUIRED_TOOLS`].
pub fn check_host_tools() -> Result<()> {
    check_required_tools(REQUIRED_TOOLS)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_command_exists() {
        assert!(command_exists("sh"));
        assert!(!command_exists("definitely_not_a_real_command_12345"));
    }

    #[test]
    fn test_check_required_tools_success() {
        let tools = &[("sh", "base system"), ("cat", "coreutils")];
        assert!(check_required_tools(tools).is_ok());
    }

    #[test]
    fn test_check_required_tools_lists_all_missing() {
        let tools = &[
            ("nonexistent_command_xyz", "fake-package"),
            ("sh", "base system"),
            ("nonexistent_command_abc", "other-package"),
        ];
        let err = check_required_tools(tools).unwrap_err().to_string();
        assert!(err.contains("nonexistent_command_xyz (fake-package)"));
        assert!(err.contains("nonexistent_command_abc (other-package)"));
        assert!(!err.contains("base system"));
    }
}
