//! Host command execution.
//!
//! Every external tool (`brew`, `rsync`, `pkgbuild`) and every permission
//! change goes through a [`CommandRunner`], so the pipeline can be driven
//! against a recording fake in tests.

use anyhow::{bail, Context, Result};
use std::ffi::{OsStr, OsString};
use std::fs;
use std::os::unix::fs::PermissionsExt;
use std::path::Path;
use std::process::Command;

/// Executes host commands and the few filesystem mutations the pipeline
/// does not perform on its own staging tree.
pub trait CommandRunner {
    /// Run a command to completion. Non-zero exit is an error.
    fn run(&self, program: &str, args: &[OsString]) -> Result<()>;

    /// Run a command and return its stdout. Non-zero exit is an error.
    fn output(&self, program: &str, args: &[OsString]) -> Result<String>;

    /// Copy a single file.
    fn copy_file(&self, from: &Path, to: &Path) -> Result<()>;

    /// Set the permission bits of `path`.
    fn set_mode(&self, path: &Path, mode: u32) -> Result<()>;
}

/// Build an argument vector from anything path- or string-like.
pub fn args<I, S>(items: I) -> Vec<OsString>
where
    I: IntoIterator<Item = S>,
    S: AsRef<OsStr>,
{
    items.into_iter().map(|s| s.as_ref().to_os_string()).collect()
}

/// Runs commands on the host with `std::process::Command`.
#[derive(Debug, Default, Clone)]
pub struct SystemRunner {
    echo: bool,
}

impl SystemRunner {
    /// When `echo` is set every command line is printed before it runs.
    pub fn new(echo: bool) -> Self {
        Self { echo }
    }

    fn execute(&self, program: &str, args: &[OsString]) -> Result<String> {
        crate::report::debug(self.echo, command_line(program, args));

        let output = Command::new(program)
            .args(args)
            .output()
            .with_context(|| format!("running {}", program))?;

        if output.status.success() {
            return Ok(String::from_utf8_lossy(&output.stdout).into_owned());
        }

        let stdout = String::from_utf8_lossy(&output.stdout);
        let stderr = String::from_utf8_lossy(&output.stderr);
        bail!(
            "{} failed ({}): {}\n{}",
            program,
            output.status,
            stdout.trim(),
            stderr.trim()
        )
    }
}

impl CommandRunner for SystemRunner {
    fn run(&self, program: &str, args: &[OsString]) -> Result<()> {
        self.execute(program, args).map(|_| ())
    }

    fn output(&self, program: &str, args: &[OsString]) -> Result<String> {
        self.execute(program, args)
    }

    fn copy_file(&self, from: &Path, to: &Path) -> Result<()> {
        fs::copy(from, to).with_context(|| {
            format!("copying '{}' to '{}'", from.display(), to.display())
        })?;
        Ok(())
    }

    fn set_mode(&self, path: &Path, mode: u32) -> Result<()> {
        fs::set_permissions(path, fs::Permissions::from_mode(mode))
            .with_context(|| format!("setting permissions {:o} on '{}'", mode, path.display()))
    }
}

/// Render a command line for display.
pub fn command_line(program: &str, args: &[OsString]) -> String {
    let mut line = program.to_string();
    for arg in args {
        line.push(' ');
        line.push_str(&arg.to_string_lossy());
    }
    line
}

#[cfg(test)]
pub(crate) mod fake {
    use super::*;
    use std::cell::RefCell;
    use std::collections::HashMap;
    use std::path::PathBuf;

    /// One recorded call.
    #[derive(Debug, Clone, PartialEq, Eq)]
    pub(crate) enum Call {
        Run(String),
        Output(String),
        Copy(PathBuf, PathBuf),
        Mode(PathBuf, u32),
    }

    /// Records every call instead of touching the host.
    ///
    /// `copy_file` and `set_mode` are also applied for real so scripts
    /// tests can inspect the result inside a temp dir.
    #[derive(Default)]
    pub(crate) struct RecordingRunner {
        pub(crate) calls: RefCell<Vec<Call>>,
        pub(crate) outputs: HashMap<String, String>,
        pub(crate) fail_program: Option<String>,
    }

    impl RecordingRunner {
        pub(crate) fn with_output(mut self, command: &str, stdout: &str) -> Self {
            self.outputs.insert(command.to_string(), stdout.to_string());
            self
        }

        pub(crate) fn failing(mut self, program: &str) -> Self {
            self.fail_program = Some(program.to_string());
            self
        }

        pub(crate) fn runs(&self) -> Vec<String> {
            self.calls
                .borrow()
                .iter()
                .filter_map(|call| match call {
                    Call::Run(line) => Some(line.clone()),
                    _ => None,
                })
                .collect()
        }

        pub(crate) fn modes(&self) -> Vec<(PathBuf, u32)> {
            self.calls
                .borrow()
                .iter()
                .filter_map(|call| match call {
                    Call::Mode(path, mode) => Some((path.clone(), *mode)),
                    _ => None,
                })
                .collect()
        }

        fn check(&self, program: &str) -> Result<()> {
            if self.fail_program.as_deref() == Some(program) {
                bail!("{} failed (exit status: 1): \nsimulated failure", program);
            }
            Ok(())
        }
    }

    impl CommandRunner for RecordingRunner {
        fn run(&self, program: &str, args: &[OsString]) -> Result<()> {
            self.calls
                .borrow_mut()
                .push(Call::Run(command_line(program, args)));
            self.check(program)
        }

        fn output(&self, program: &str, args: &[OsString]) -> Result<String> {
            let line = command_line(program, args);
            self.calls.borrow_mut().push(Call::Output(line.clone()));
            self.check(program)?;
            self.outputs
                .get(&line)
                .cloned()
                .ok_or_else(|| anyhow::anyhow!("no canned output for '{}'", line))
        }

        fn copy_file(&self, from: &Path, to: &Path) -> Result<()> {
            self.calls
                .borrow_mut()
                .push(Call::Copy(from.to_path_buf(), to.to_path_buf()));
            fs::copy(from, to)?;
            Ok(())
        }

        fn set_mode(&self, path: &Path, mode: u32) -> Result<()> {
            self.calls
                .borrow_mut()
                .push(Call::Mode(path.to_path_buf(), mode));
            fs::set_permissions(path, fs::Permissions::from_mode(mode))?;
            Ok(())
        }
    }
}
