//! `pkgbuild` argument assembly and invocation.

use anyhow::{Context, Result};
use std::ffi::OsString;
use std::fs;
use std::path::{Path, PathBuf};

use crate::options::{BuildOptions, OwnershipMode};
use crate::process::CommandRunner;
use crate::resolver::PackageSpec;

/// Resolved `pkgbuild` parameters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PkgbuildArgs {
    pub root: PathBuf,
    pub identifier: String,
    pub version: String,
    pub scripts: Option<PathBuf>,
    pub ownership: Option<OwnershipMode>,
    pub install_location: Option<PathBuf>,
    pub output: PathBuf,
}

impl PkgbuildArgs {
    /// Compute the parameters for one package.
    ///
    /// The version is `--pkgvers` verbatim when given, otherwise the
    /// formula's version with a `_<revision>` suffix for non-zero revisions.
    pub fn assemble(
        spec: &PackageSpec,
        options: &BuildOptions,
        root: &Path,
        scripts: Option<&Path>,
        output_dir: &Path,
    ) -> Self {
        let version = options
            .version_override
            .clone()
            .unwrap_or_else(|| spec.pkg_version());

        Self {
            root: root.to_path_buf(),
            identifier: format!("{}.{}", options.identifier_prefix, spec.name),
            output: output_dir.join(package_filename(&spec.name, &version)),
            version,
            scripts: scripts.map(Path::to_path_buf),
            ownership: options.ownership,
            install_location: options.install_location.clone(),
        }
    }

    /// Command-line arguments, in the order `pkgbuild` receives them.
    pub fn to_args(&self) -> Vec<OsString> {
        let mut args: Vec<OsString> = vec![
            "--quiet".into(),
            "--root".into(),
            self.root.clone().into(),
            "--identifier".into(),
            self.identifier.clone().into(),
            "--version".into(),
            self.version.clone().into(),
        ];
        if let Some(scripts) = &self.scripts {
            args.push("--scripts".into());
            args.push(scripts.clone().into());
        }
        if let Some(ownership) = self.ownership {
            args.push("--ownership".into());
            args.push(ownership.as_str().into());
        }
        if let Some(location) = &self.install_location {
            args.push("--install-location".into());
            args.push(location.clone().into());
        }
        args.push(self.output.clone().into());
        args
    }
}

/// `<name>-<version>.pkg`
pub fn package_filename(name: &str, version: &str) -> String {
    format!("{}-{}.pkg", name, version)
}

/// Run `pkgbuild`. On failure no output file is left behind.
pub fn build_package(args: &PkgbuildArgs, runner: &dyn CommandRunner) -> Result<PathBuf> {
    if let Err(err) = runner.run("pkgbuild", &args.to_args()) {
        if args.output.exists() {
            if let Err(remove_err) = fs::remove_file(&args.output) {
                crate::report::warn(format!(
                    "could not remove partial package '{}': {}",
                    args.output.display(),
                    remove_err
                ));
            }
        }
        return Err(err).with_context(|| format!("building '{}'", args.output.display()));
    }
    Ok(args.output.clone())
}
