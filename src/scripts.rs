//! Installer scripts handed to `pkgbuild --scripts`.

use anyhow::{bail, Result};
use std::path::{Path, PathBuf};

use crate::options::BuildOptions;
use crate::process::CommandRunner;
use crate::report;
use crate::staging::ScratchDir;

pub const PREINSTALL: &str = "preinstall";
pub const POSTINSTALL: &str = "postinstall";

const SCRIPT_MODE: u32 = 0o755;

/// A directory holding `preinstall` and/or `postinstall`.
pub struct ScriptsBundle {
    dir: PathBuf,
    scripts: Vec<&'static str>,
    _scratch: Option<ScratchDir>,
}

impl ScriptsBundle {
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Script names present, in `preinstall`, `postinstall` order.
    pub fn scripts(&self) -> &[&'static str] {
        &self.scripts
    }
}

/// Prepare the scripts directory, if any scripts were requested.
///
/// A `--scripts` directory is used in place: its scripts are made
/// executable. Individual `--preinstall-script`/`--postinstall-script`
/// files are copied into a fresh temp directory; when both forms are given
/// that directory is used and also receives any bundle script that was not
/// supplied individually.
pub fn attach_scripts(
    options: &BuildOptions,
    temp_parent: Option<&Path>,
    runner: &dyn CommandRunner,
) -> Result<Option<ScriptsBundle>> {
    let mut bundle = None;
    if let Some(dir) = &options.scripts_dir {
        let mut found = Vec::new();
        for name in [PREINSTALL, POSTINSTALL] {
            let script = dir.join(name);
            if script.is_file() {
                runner.set_mode(&script, SCRIPT_MODE)?;
                found.push(name);
            }
        }
        if found.is_empty() {
            report::warn(format!(
                "no {} or {} script found in '{}'",
                PREINSTALL,
                POSTINSTALL,
                dir.display()
            ));
        } else {
            bundle = Some(ScriptsBundle {
                dir: dir.clone(),
                scripts: found,
                _scratch: None,
            });
        }
    }

    let discrete: Vec<(&'static str, &Path)> = [
        (PREINSTALL, options.preinstall_script.as_deref()),
        (POSTINSTALL, options.postinstall_script.as_deref()),
    ]
    .into_iter()
    .filter_map(|(name, path)| path.map(|path| (name, path)))
    .collect();

    if discrete.is_empty() {
        return Ok(bundle);
    }

    let scratch = ScratchDir::create(temp_parent, "brew-caskage-scripts.", options.debug)?;
    let mut scripts = Vec::new();
    for name in [PREINSTALL, POSTINSTALL] {
        let source = match discrete.iter().find(|(n, _)| *n == name) {
            Some((_, path)) => {
                if !path.is_file() {
                    bail!("{} script '{}' does not exist", name, path.display());
                }
                path.to_path_buf()
            }
            None => match &bundle {
                Some(bundle) if bundle.scripts.contains(&name) => bundle.dir.join(name),
                _ => continue,
            },
        };
        let dest = scratch.path().join(name);
        runner.copy_file(&source, &dest)?;
        runner.set_mode(&dest, SCRIPT_MODE)?;
        scripts.push(name);
    }

    Ok(Some(ScriptsBundle {
        dir: scratch.path().to_path_buf(),
        scripts,
        _scratch: Some(scratch),
    }))
}
