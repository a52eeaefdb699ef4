//! Staging tree construction.
//!
//! The package root is a fresh temp directory; inside it the staging root
//! mirrors the Homebrew prefix, so `pkgbuild --root <package root>` installs
//! every file at its real location:
//!
//! ```text
//! <package root>/usr/local/
//!     bin/ lib/ etc/ ...            merged from every staged keg
//!     Cellar/<name>/<pkg_version>/  keg mirror
//!     opt/<name>                    opt link
//!     Library/LaunchDaemons/        service plists
//! ```

use anyhow::{Context, Result};
use std::ffi::OsString;
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;
use walkdir::WalkDir;

use crate::options::BuildOptions;
use crate::process::CommandRunner;
use crate::report;
use crate::resolver::PackageSpec;

/// Keg subdirectories merged into the staging root, in copy order.
pub const STAGED_SUBDIRS: &[&str] = &["etc", "bin", "sbin", "include", "share", "lib", "Frameworks"];

/// A temp directory removed on drop unless it was created to be preserved.
pub struct ScratchDir {
    dir: Option<TempDir>,
    path: PathBuf,
    preserve: bool,
}

impl ScratchDir {
    /// Create a uniquely named directory under `parent` (or the OS temp dir).
    pub fn create(parent: Option<&Path>, prefix: &str, preserve: bool) -> Result<Self> {
        let mut builder = tempfile::Builder::new();
        builder.prefix(prefix);
        let dir = match parent {
            Some(parent) => builder.tempdir_in(parent),
            None => builder.tempdir(),
        }
        .with_context(|| format!("creating temporary directory '{}*'", prefix))?;

        Ok(Self {
            path: dir.path().to_path_buf(),
            dir: Some(dir),
            preserve,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for ScratchDir {
    fn drop(&mut self) {
        if !self.preserve {
            return;
        }
        if let Some(dir) = self.dir.take() {
            let kept = dir.keep();
            report::info(format!("Keeping temporary directory {}", kept.display()));
        }
    }
}

/// The staging tree for one run.
pub struct StagingTree {
    scratch: ScratchDir,
    prefix: PathBuf,
    root: PathBuf,
}

impl StagingTree {
    /// Create the package root and the prefix-shaped staging root inside it.
    pub fn create(temp_parent: Option<&Path>, prefix: &Path, preserve: bool) -> Result<Self> {
        let scratch = ScratchDir::create(temp_parent, "brew-caskage.", preserve)?;
        let relative = prefix.strip_prefix("/").unwrap_or(prefix);
        let root = scratch.path().join(relative);
        fs::create_dir_all(&root)
            .with_context(|| format!("creating staging root '{}'", root.display()))?;

        Ok(Self {
            scratch,
            prefix: prefix.to_path_buf(),
            root,
        })
    }

    /// Directory handed to `pkgbuild --root`.
    pub fn package_root(&self) -> &Path {
        self.scratch.path()
    }

    /// `<package root>/<prefix>`.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Copy one installed package into the tree.
    ///
    /// Missing keg subdirectories, keg or opt link are skipped. Files
    /// already staged are never overwritten, so the target package wins
    /// over dependencies staged after it.
    pub fn stage_package(
        &self,
        spec: &PackageSpec,
        options: &BuildOptions,
        runner: &dyn CommandRunner,
    ) -> Result<()> {
        for subdir in STAGED_SUBDIRS {
            let source = spec.keg.join(subdir);
            if !source.is_dir() {
                report::debug(options.debug, format!("{}: no {}/, skipping", spec.name, subdir));
                continue;
            }
            rsync_into(runner, &source, &self.root)?;
        }

        if options.stage_keg() {
            self.stage_keg(spec, options.debug, runner)?;
        }
        if options.stage_opt() {
            self.stage_opt(spec, options.debug, runner)?;
        }

        if let Some(daemon) = &spec.launch_daemon {
            let dir = self.root.join("Library/LaunchDaemons");
            fs::create_dir_all(&dir)
                .with_context(|| format!("creating '{}'", dir.display()))?;
            let plist = dir.join(format!("{}.plist", daemon.label));
            fs::write(&plist, &daemon.content)
                .with_context(|| format!("writing launch daemon '{}'", plist.display()))?;
            runner.set_mode(&plist, 0o644)?;
        }

        Ok(())
    }

    fn stage_keg(&self, spec: &PackageSpec, debug: bool, runner: &dyn CommandRunner) -> Result<()> {
        if !spec.keg.is_dir() {
            report::debug(debug, format!("{}: keg {} missing, skipping", spec.name, spec.keg.display()));
            return Ok(());
        }
        let dest = self.root.join("Cellar").join(&spec.name);
        fs::create_dir_all(&dest).with_context(|| format!("creating '{}'", dest.display()))?;
        rsync_into(runner, &spec.keg, &dest)
    }

    fn stage_opt(&self, spec: &PackageSpec, debug: bool, runner: &dyn CommandRunner) -> Result<()> {
        let opt = self.prefix.join("opt").join(&spec.name);
        if fs::symlink_metadata(&opt).is_err() {
            report::debug(debug, format!("{}: {} missing, skipping", spec.name, opt.display()));
            return Ok(());
        }
        let dest = self.root.join("opt");
        fs::create_dir_all(&dest).with_context(|| format!("creating '{}'", dest.display()))?;
        rsync_into(runner, &opt, &dest)
    }

    /// Staged files and links, relative to the package root, sorted.
    pub fn manifest(&self) -> Result<Vec<PathBuf>> {
        let mut entries = Vec::new();
        for entry in WalkDir::new(self.package_root()) {
            let entry = entry.context("walking staging tree")?;
            if entry.file_type().is_dir() {
                continue;
            }
            if let Ok(relative) = entry.path().strip_prefix(self.package_root()) {
                entries.push(relative.to_path_buf());
            }
        }
        entries.sort();
        Ok(entries)
    }
}

/// `rsync -a --ignore-existing <source> <dest_dir>/`
fn rsync_into(runner: &dyn CommandRunner, source: &Path, dest_dir: &Path) -> Result<()> {
    let args: Vec<OsString> = vec![
        "-a".into(),
        "--ignore-existing".into(),
        source.as_os_str().to_os_string(),
        format!("{}/", dest_dir.display()).into(),
    ];
    runner.run("rsync", &args).with_context(|| {
        format!(
            "copying '{}' into '{}'",
            source.display(),
            dest_dir.display()
        )
    })
}
