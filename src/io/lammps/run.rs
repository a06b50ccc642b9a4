/* ************************************************************************ **
** This file is part of atomkit, and is licensed under EITHER the MIT       **
** license or the Apache 2.0 license, at your option.                       **
**                                                                          **
**     http://www.apache.org/licenses/LICENSE-2.0                           **
**     http://opensource.org/licenses/MIT                                   **
**                                                                          **
** Be aware that not all of atomkit is provided under this permissive       **
** license, and that the project as a whole is licensed under the GPL 3.0.  **
** ************************************************************************ */

use crate::{FailResult, Log, LammpsError};

use std::path::{Path, PathBuf};
use std::process::{Command, Output};

/// The log file LAMMPS writes when not told otherwise.
pub const DEFAULT_LOGFILE: &str = "log.lammps";

/// A LAMMPS invocation: `[mpi...] lammps... [-log LOGFILE] -in SCRIPT`.
///
/// With a restart script configured, a run that finds an existing log file
/// assumes a previous attempt was interrupted.  The old log is renamed out of
/// the way (`log.lammps` becomes `log-N.lammps` for the next free `N`) and
/// the restart script is used instead of the main one.  The returned [`Log`]
/// contains the output of every attempt, oldest first.
#[derive(Debug, Clone)]
pub struct Run {
    lammps: Vec<String>,
    mpi: Vec<String>,
    script: PathBuf,
    restart_script: Option<PathBuf>,
    logfile: PathBuf,
    working_dir: Option<PathBuf>,
}

impl Run {
    /// `lammps` is the executable and any arguments that precede `-in`, split on spaces.
    pub fn new(lammps: &str, script: impl AsRef<Path>) -> Self {
        Run {
            lammps: split_words(lammps),
            mpi: vec![],
            script: script.as_ref().to_owned(),
            restart_script: None,
            logfile: PathBuf::from(DEFAULT_LOGFILE),
            working_dir: None,
        }
    }

    /// A launcher such as `mpiexec -n 4`, split on spaces.
    pub fn mpi(mut self, command: &str) -> Self
    { self.mpi = split_words(command); self }

    pub fn restart_script(mut self, path: impl AsRef<Path>) -> Self
    { self.restart_script = Some(path.as_ref().to_owned()); self }

    pub fn logfile(mut self, path: impl AsRef<Path>) -> Self
    { self.logfile = path.as_ref().to_owned(); self }

    /// Run from this directory.  Relative paths are interpreted relative to it.
    pub fn working_dir(mut self, path: impl AsRef<Path>) -> Self
    { self.working_dir = Some(path.as_ref().to_owned()); self }

    /// The full command line, for the given script.
    pub fn command_line(&self, script: &Path) -> Vec<String> {
        let mut out = vec![];
        out.extend(self.mpi.iter().cloned());
        out.extend(self.lammps.iter().cloned());
        if self.logfile != Path::new(DEFAULT_LOGFILE) {
            out.push("-log".to_string());
            out.push(self.logfile.display().to_string());
        }
        out.push("-in".to_string());
        out.push(script.display().to_string());
        out
    }

    pub fn run(&self) -> FailResult<Log> {
        let logfile = self.resolve(&self.logfile);

        let (script, num_old_logs) = match &self.restart_script {
            Some(restart) if logfile.exists() => {
                let num = max_old_log_id(&logfile)? + 1;
                let renamed = numbered_log(&logfile, num);
                info!("Found an existing log; moving it to '{}' and restarting", renamed.display());
                std::fs::rename(&logfile, &renamed)?;
                (restart.clone(), num)
            },
            _ => (self.script.clone(), 0),
        };

        let args = self.command_line(&script);
        let (program, rest) = match args.split_first() {
            Some(split) => split,
            None => bail!("empty LAMMPS command"),
        };
        let mut command = Command::new(program);
        command.args(rest);
        if let Some(dir) = &self.working_dir {
            command.current_dir(dir);
        }

        trace!("Calling LAMMPS: {:?}", args);
        check_output(command.output()?)?;

        let mut log = Log::new();
        for id in 1..=num_old_logs {
            log.read_path(numbered_log(&logfile, id))?;
        }
        log.read_path(&logfile)?;
        Ok(log)
    }

    fn resolve(&self, path: &Path) -> PathBuf {
        match &self.working_dir {
            Some(dir) => dir.join(path),
            None => path.to_owned(),
        }
    }
}

fn split_words(s: &str) -> Vec<String>
{ s.split_whitespace().map(|s| s.to_string()).collect() }

fn check_output(output: Output) -> Result<(), LammpsError> {
    if output.status.success() { Ok(()) }
    else {
        let backtrace = failure::Backtrace::new();
        let status = output.status.code();
        let output = String::from_utf8_lossy(&output.stdout).into_owned();
        Err(LammpsError { backtrace, status, output })
    }
}

// "dir/log.lammps" -> "dir/log-3.lammps"
fn numbered_log(logfile: &Path, id: u32) -> PathBuf {
    let stem = logfile.file_stem().map(|s| s.to_string_lossy().into_owned()).unwrap_or_default();
    let name = match logfile.extension() {
        Some(ext) => format!("{}-{}.{}", stem, id, ext.to_string_lossy()),
        None => format!("{}-{}", stem, id),
    };
    logfile.with_file_name(name)
}

/// The largest `N` among existing `log-N.lammps` files, or zero.
fn max_old_log_id(logfile: &Path) -> FailResult<u32> {
    let stem = logfile.file_stem().map(|s| s.to_string_lossy().into_owned()).unwrap_or_default();
    let ext = logfile.extension().map(|s| s.to_string_lossy().into_owned());
    let dir = match logfile.parent() {
        Some(dir) if dir != Path::new("") => dir.to_owned(),
        _ => PathBuf::from("."),
    };

    let prefix = format!("{}-", stem);
    let mut max = 0;
    for entry in std::fs::read_dir(&dir)? {
        let path = entry?.path();
        if path.extension().map(|s| s.to_string_lossy().into_owned()) != ext {
            continue;
        }
        let file_stem = match path.file_stem() {
            Some(s) => s.to_string_lossy().into_owned(),
            None => continue,
        };
        if let Some(id) = file_stem.strip_prefix(&prefix[..]).and_then(|s| s.parse::<u32>().ok()) {
            max = max.max(id);
        }
    }
    Ok(max)
}
