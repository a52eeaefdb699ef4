//! Build macOS installer packages from installed Homebrew formulae.
//!
//! `brew caskage <formula>` copies an installed formula (and optionally its
//! dependencies) into a temporary tree shaped like the Homebrew prefix,
//! attaches optional installer scripts, and runs `pkgbuild` on the result.
//!
//! # Architecture
//!
//! ```text
//! BuildOptions ──► Packager::run
//!                     │
//!                     ├── PackageQuery    resolve formula, list deps (brew)
//!                     ├── StagingTree     rsync kegs into <tmp>/<prefix>
//!                     ├── attach_scripts  preinstall / postinstall
//!                     └── PkgbuildArgs    assemble + run pkgbuild
//!
//! every host command goes through CommandRunner
//! ```
//!
//! # Example
//!
//! ```rust,ignore
//! use brew_caskage::{BrewQuery, BuildOptions, Packager, Settings, SystemRunner};
//!
//! let runner = SystemRunner::new(false);
//! let query = BrewQuery::new(&runner)?;
//! let options = BuildOptions::new("wget");
//! let settings = Settings::default();
//! let pkg = Packager {
//!     query: &query,
//!     runner: &runner,
//!     options: &options,
//!     settings: &settings,
//!     output_dir: std::env::current_dir()?,
//! }
//! .run()?;
//! ```

pub mod config;
pub mod options;
pub mod packager;
pub mod pkgbuild;
pub mod preflight;
pub mod process;
pub mod report;
pub mod resolver;
pub mod scripts;
pub mod staging;

pub use config::{load_settings, Settings};
pub use options::{BuildOptions, OwnershipMode};
pub use packager::Packager;
pub use process::{CommandRunner, SystemRunner};
pub use resolver::{BrewQuery, PackageQuery, PackageSpec};
