//! Installed-formula lookup.
//!
//! The pipeline only consumes [`PackageSpec`] values; where they come from
//! is behind [`PackageQuery`]. [`BrewQuery`] answers from the local
//! Homebrew installation by shelling out to `brew`.

use anyhow::{Context, Result};
use serde::Deserialize;
use std::collections::{HashSet, VecDeque};
use std::fs;
use std::path::{Path, PathBuf};

use crate::process::{args, CommandRunner};

/// A launchd property list shipped by a formula.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LaunchDaemon {
    /// launchd label, also the file stem (`homebrew.mxcl.<name>`).
    pub label: String,
    /// Literal plist content, written out unchanged.
    pub content: String,
}

/// An installed formula.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PackageSpec {
    pub name: String,
    pub version: String,
    pub revision: u32,
    /// Versioned install directory (`<cellar>/<name>/<pkg_version>`).
    pub keg: PathBuf,
    /// Declared direct dependencies.
    pub dependencies: Vec<String>,
    pub launch_daemon: Option<LaunchDaemon>,
}

impl PackageSpec {
    /// `version`, or `version_revision` when the revision is non-zero.
    pub fn pkg_version(&self) -> String {
        if self.revision == 0 {
            self.version.clone()
        } else {
            format!("{}_{}", self.version, self.revision)
        }
    }
}

/// Split a Homebrew package version (`1.0_3`) into version and revision.
pub fn split_pkg_version(pkg_version: &str) -> (String, u32) {
    if let Some((version, revision)) = pkg_version.rsplit_once('_') {
        if !version.is_empty() && !revision.is_empty() {
            if let Ok(revision) = revision.parse::<u32>() {
                return (version.to_string(), revision);
            }
        }
    }
    (pkg_version.to_string(), 0)
}

/// launchd label Homebrew uses for a formula's service.
pub fn launch_daemon_label(name: &str) -> String {
    format!("homebrew.mxcl.{}", name)
}

/// Read-only view of the host package manager.
pub trait PackageQuery {
    /// Install prefix the staging tree mirrors (e.g. `/usr/local`).
    fn prefix(&self) -> &Path;

    /// Keg store (e.g. `/usr/local/Cellar`).
    fn cellar(&self) -> &Path;

    /// Look up an installed formula. `Ok(None)` means not installed.
    fn resolve(&self, name: &str) -> Result<Option<PackageSpec>>;

    /// All transitive dependencies of `name`, first-seen order, no repeats.
    fn recursive_dependencies(&self, name: &str) -> Result<Vec<String>> {
        let mut seen = HashSet::from([name.to_string()]);
        let mut ordered = Vec::new();
        let mut queue = VecDeque::from([name.to_string()]);

        while let Some(current) = queue.pop_front() {
            let Some(spec) = self.resolve(&current)? else {
                continue;
            };
            for dep in spec.dependencies {
                if seen.insert(dep.clone()) {
                    ordered.push(dep.clone());
                    queue.push_back(dep);
                }
            }
        }

        Ok(ordered)
    }
}

#[derive(Debug, Deserialize)]
struct BrewInfoJson {
    #[serde(default)]
    formulae: Vec<FormulaJson>,
}

#[derive(Debug, Deserialize)]
struct FormulaJson {
    name: String,
    #[serde(default)]
    dependencies: Vec<String>,
    #[serde(default)]
    installed: Vec<InstalledJson>,
    linked_keg: Option<String>,
}

#[derive(Debug, Deserialize)]
struct InstalledJson {
    version: String,
}

/// [`PackageQuery`] backed by the `brew` command.
pub struct BrewQuery<'a> {
    runner: &'a dyn CommandRunner,
    prefix: PathBuf,
    cellar: PathBuf,
}

impl<'a> BrewQuery<'a> {
    /// Ask `brew` for its prefix and cellar.
    pub fn new(runner: &'a dyn CommandRunner) -> Result<Self> {
        let prefix = brew_path(runner, "--prefix")?;
        let cellar = brew_path(runner, "--cellar")?;
        Ok(Self {
            runner,
            prefix,
            cellar,
        })
    }

    fn spec_from_json(&self, formula: FormulaJson) -> Option<PackageSpec> {
        let pkg_version = match formula.linked_keg {
            Some(linked) => linked,
            None => formula.installed.last()?.version.clone(),
        };
        let (version, revision) = split_pkg_version(&pkg_version);
        let keg = self.cellar.join(&formula.name).join(&pkg_version);

        let label = launch_daemon_label(&formula.name);
        let plist = keg.join(format!("{}.plist", label));
        let launch_daemon = fs::read_to_string(&plist)
            .ok()
            .map(|content| LaunchDaemon { label, content });

        Some(PackageSpec {
            name: formula.name,
            version,
            revision,
            keg,
            dependencies: formula.dependencies,
            launch_daemon,
        })
    }
}

fn brew_path(runner: &dyn CommandRunner, flag: &str) -> Result<PathBuf> {
    let out = runner
        .output("brew", &args([flag]))
        .with_context(|| format!("querying brew {}", flag))?;
    Ok(PathBuf::from(out.trim()))
}

impl PackageQuery for BrewQuery<'_> {
    fn prefix(&self) -> &Path {
        &self.prefix
    }

    fn cellar(&self) -> &Path {
        &self.cellar
    }

    fn resolve(&self, name: &str) -> Result<Option<PackageSpec>> {
        let out = self
            .runner
            .output("brew", &args(["info", "--json=v2", name]))
            .with_context(|| format!("querying formula '{}'", name))?;
        let info: BrewInfoJson = serde_json::from_str(&out)
            .with_context(|| format!("parsing brew info for '{}'", name))?;

        Ok(info
            .formulae
            .into_iter()
            .next()
            .and_then(|formula| self.spec_from_json(formula)))
    }

    fn recursive_dependencies(&self, name: &str) -> Result<Vec<String>> {
        let out = self
            .runner
            .output("brew", &args(["deps", name]))
            .with_context(|| format!("listing dependencies of '{}'", name))?;
        Ok(out
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .map(str::to_string)
            .collect())
    }
}


#[cfg(test)]
mod tests {
    use super::fake::FakeQuery;
    use super::*;
    use crate::process::fake::RecordingRunner;
    use tempfile::TempDir;

    const FOO_INFO: &str = r#"{
        "formulae": [{
            "name": "foo",
            "full_name": "foo",
            "versions": {"stable": "2.1"},
            "revision": 1,
            "dependencies": ["libbar", "libbaz"],
            "installed": [{"version": "2.0"}, {"version": "2.1_1"}],
            "linked_keg": null
        }],
        "casks": []
    }"#;

    fn brew_runner(cellar: &Path) -> RecordingRunner {
        RecordingRunner::default()
            .with_output("brew --prefix", "/usr/local\n")
            .with_output("brew --cellar", &format!("{}\n", cellar.display()))
    }

    #[test]
    fn pkg_version_splits_numeric_revision() {
        assert_eq!(split_pkg_version("2.1"), ("2.1".to_string(), 0));
        assert_eq!(split_pkg_version("1.0_3"), ("1.0".to_string(), 3));
        assert_eq!(split_pkg_version("1.0_rc1"), ("1.0_rc1".to_string(), 0));
        assert_eq!(split_pkg_version("_3"), ("_3".to_string(), 0));
    }

    #[test]
    fn pkg_version_appends_nonzero_revision() {
        let temp = TempDir::new().unwrap();
        let query = FakeQuery::new(temp.path())
            .install("foo", "2.1", &[])
            .install("bar", "1.0_3", &[]);

        assert_eq!(query.resolve("foo").unwrap().unwrap().pkg_version(), "2.1");
        assert_eq!(query.resolve("bar").unwrap().unwrap().pkg_version(), "1.0_3");
    }

    #[test]
    fn brew_query_parses_info() {
        let temp = TempDir::new().unwrap();
        let cellar = temp.path().join("Cellar");
        let keg = cellar.join("foo/2.1_1");
        fs::create_dir_all(&keg).unwrap();
        fs::write(keg.join("homebrew.mxcl.foo.plist"), "<plist/>\n").unwrap();

        let runner = brew_runner(&cellar).with_output("brew info --json=v2 foo", FOO_INFO);
        let query = BrewQuery::new(&runner).unwrap();
        assert_eq!(query.prefix(), Path::new("/usr/local"));

        let spec = query.resolve("foo").unwrap().unwrap();
        assert_eq!(spec.name, "foo");
        assert_eq!(spec.version, "2.1");
        assert_eq!(spec.revision, 1);
        assert_eq!(spec.keg, keg);
        assert_eq!(spec.dependencies, vec!["libbar", "libbaz"]);
        assert_eq!(
            spec.launch_daemon,
            Some(LaunchDaemon {
                label: "homebrew.mxcl.foo".into(),
                content: "<plist/>\n".into(),
            })
        );
    }

    #[test]
    fn brew_query_prefers_linked_keg() {
        let temp = TempDir::new().unwrap();
        let info = FOO_INFO.replace("\"linked_keg\": null", "\"linked_keg\": \"2.0\"");
        let runner = brew_runner(temp.path()).with_output("brew info --json=v2 foo", &info);
        let query = BrewQuery::new(&runner).unwrap();

        let spec = query.resolve("foo").unwrap().unwrap();
        assert_eq!(spec.pkg_version(), "2.0");
        assert_eq!(spec.launch_daemon, None);
    }

    #[test]
    fn brew_query_not_installed() {
        let temp = TempDir::new().unwrap();
        let info = r#"{"formulae": [{"name": "foo", "installed": [], "linked_keg": null}], "casks": []}"#;
        let runner = brew_runner(temp.path()).with_output("brew info --json=v2 foo", info);
        let query = BrewQuery::new(&runner).unwrap();

        assert_eq!(query.resolve("foo").unwrap(), None);
    }

    #[test]
    fn brew_query_lists_deps() {
        let temp = TempDir::new().unwrap();
        let runner = brew_runner(temp.path()).with_output("brew deps foo", "libbar\n\nlibbaz\n");
        let query = BrewQuery::new(&runner).unwrap();

        assert_eq!(
            query.recursive_dependencies("foo").unwrap(),
            vec!["libbar", "libbaz"]
        );
    }

    #[test]
    fn default_recursive_walk_dedupes_and_skips_missing() {
        let temp = TempDir::new().unwrap();
        let query = FakeQuery::new(temp.path())
            .install("app", "1.0", &["liba", "libb"])
            .install("liba", "1.0", &["libc", "ghost"])
            .install("libb", "1.0", &["libc"])
            .install("libc", "1.0", &[]);

        assert_eq!(
            query.recursive_dependencies("app").unwrap(),
            vec!["liba", "libb", "libc", "ghost"]
        );
    }
}
