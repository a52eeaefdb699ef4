use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{Context, Result};
use brew_caskage::config::default_config_path;
use brew_caskage::options::{
    normalize_identifier_prefix, parse_ownership, DEFAULT_IDENTIFIER_PREFIX,
};
use brew_caskage::{load_settings, preflight, report};
use brew_caskage::{BrewQuery, BuildOptions, Packager, Settings, SystemRunner};
use clap::Parser;

/// Build a macOS installer package from an installed formula.
///
/// The formula must already be installed; `brew caskage` does not install
/// it for you. Setting `--identifier-prefix` is strongly recommended to
/// follow installer package naming conventions.
#[derive(Parser, Debug)]
#[command(name = "brew caskage", version)]
struct Cli {
    /// Formula to package
    package: String,

    /// Prefix for the package identifier [default: org.homebrew]
    #[arg(long, value_name = "PREFIX")]
    identifier_prefix: Option<String>,

    /// Skip the cask's dependencies in the build (no effect for formulae)
    #[arg(long)]
    skip_cask_deps: bool,

    /// Custom install location for the package
    #[arg(long, value_name = "PATH")]
    install_location: Option<PathBuf>,

    /// Ownership of installed files: recommended, preserve or preserve-other
    #[arg(long, value_name = "MODE")]
    custom_ownership: Option<String>,

    /// Custom preinstall script file
    #[arg(long, value_name = "FILE")]
    preinstall_script: Option<PathBuf>,

    /// Custom postinstall script file
    #[arg(long, value_name = "FILE")]
    postinstall_script: Option<PathBuf>,

    /// Folder containing preinstall and/or postinstall scripts
    #[arg(long, value_name = "DIR")]
    scripts: Option<PathBuf>,

    /// Version string of the resulting .pkg
    #[arg(long, value_name = "VERSION")]
    pkgvers: Option<String>,

    /// Include installed recursive dependencies
    #[arg(long, overrides_with = "without_deps")]
    with_deps: bool,

    /// Package the formula alone (default)
    #[arg(long, overrides_with = "with_deps")]
    without_deps: bool,

    /// Do not mirror kegs under Cellar/ (implies --without-opt)
    #[arg(long)]
    without_kegs: bool,

    /// Do not stage the opt/<formula> link
    #[arg(long)]
    without_opt: bool,

    /// Print extra debug information and keep temporary directories
    #[arg(short, long)]
    debug: bool,
}

impl Cli {
    fn into_options(self, settings: &Settings) -> BuildOptions {
        let identifier_prefix = self
            .identifier_prefix
            .as_deref()
            .and_then(normalize_identifier_prefix)
            .or_else(|| settings.identifier_prefix.clone())
            .unwrap_or_else(|| DEFAULT_IDENTIFIER_PREFIX.to_string());
        let ownership = match self.custom_ownership {
            Some(raw) => parse_ownership(&raw),
            None => settings.ownership,
        };

        BuildOptions {
            package: self.package,
            identifier_prefix,
            version_override: self.pkgvers,
            ownership,
            install_location: self.install_location,
            preinstall_script: self.preinstall_script,
            postinstall_script: self.postinstall_script,
            scripts_dir: self.scripts,
            with_deps: self.with_deps && !self.without_deps,
            without_kegs: self.without_kegs,
            without_opt: self.without_opt,
            skip_cask_deps: self.skip_cask_deps,
            debug: self.debug,
        }
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            report::error(&err);
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> Result<()> {
    let config_path = default_config_path();
    let settings = load_settings(config_path.as_deref())?;
    let options = cli.into_options(&settings);
    report::debug(options.debug, format!("{:?}", options));

    preflight::check_host_tools()?;

    let runner = SystemRunner::new(options.debug);
    let query = BrewQuery::new(&runner)?;
    let output_dir = std::env::current_dir().context("resolving current directory")?;

    Packager {
        query: &query,
        runner: &runner,
        options: &options,
        settings: &settings,
        output_dir,
    }
    .run()?;

    Ok(())
}
