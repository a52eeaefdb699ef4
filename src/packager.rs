//! The packaging pipeline: resolve, stage, attach scripts, build.

use anyhow::{bail, Result};
use std::path::PathBuf;

use crate::config::Settings;
use crate::options::BuildOptions;
use crate::pkgbuild::{build_package, PkgbuildArgs};
use crate::process::CommandRunner;
use crate::report;
use crate::resolver::PackageQuery;
use crate::scripts::attach_scripts;
use crate::staging::StagingTree;

/// One packaging run.
pub struct Packager<'a> {
    pub query: &'a dyn PackageQuery,
    pub runner: &'a dyn CommandRunner,
    pub options: &'a BuildOptions,
    pub settings: &'a Settings,
    /// Where the `.pkg` is written.
    pub output_dir: PathBuf,
}

impl Packager<'_> {
    /// Build the package and return its path.
    ///
    /// Nothing is created on disk when the target is not installed. Temp
    /// directories are removed on every exit path unless `--debug` is set.
    pub fn run(&self) -> Result<PathBuf> {
        let options = self.options;
        let Some(spec) = self.query.resolve(&options.package)? else {
            bail!("{} is not installed", options.package);
        };
        if options.skip_cask_deps {
            report::debug(options.debug, "--skip-cask-deps has no effect for formulae");
        }

        let temp_parent = self.settings.temp_dir.as_deref();
        let tree = StagingTree::create(temp_parent, self.query.prefix(), options.debug)?;
        report::debug(
            options.debug,
            format!("staging root: {}", tree.root().display()),
        );

        report::info(format!("Staging {} {}", spec.name, spec.pkg_version()));
        tree.stage_package(&spec, options, self.runner)?;

        if options.with_deps {
            for dep in self.query.recursive_dependencies(&spec.name)? {
                match self.query.resolve(&dep)? {
                    Some(dep_spec) => {
                        report::info(format!(
                            "Staging dependency {} {}",
                            dep_spec.name,
                            dep_spec.pkg_version()
                        ));
                        tree.stage_package(&dep_spec, options, self.runner)?;
                    }
                    None => report::debug(
                        options.debug,
                        format!("dependency {} is not installed, skipping", dep),
                    ),
                }
            }
        }

        if options.debug {
            for path in tree.manifest()? {
                report::debug(true, format!("staged {}", path.display()));
            }
        }

        let scripts = attach_scripts(options, temp_parent, self.runner)?;
        if let Some(scripts) = &scripts {
            report::info(format!(
                "Attaching {} from {}",
                scripts.scripts().join(" and "),
                scripts.dir().display()
            ));
        }

        let args = PkgbuildArgs::assemble(
            &spec,
            options,
            tree.package_root(),
            scripts.as_ref().map(|s| s.dir()),
            &self.output_dir,
        );
        report::info(format!("Building {} ({})", args.identifier, args.version));
        let output = build_package(&args, self.runner)?;
        report::info(format!("Built {}", output.display()));

        Ok(output)
    }
}
