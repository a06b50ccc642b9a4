use crate::FailResult;

use std::fmt;
use std::path::{Path, PathBuf};
use log::{Level, LevelFilter};

// Targets that get more detail than third-party crates.
const OUR_CRATES: &[&str] = &[
    "atomkit_tasks",
    "atomkit_defect",
    "atomkit_structure",
    "atomkit_lammps_io",
];

/// Builder-style setup for logging
#[derive(Debug, Clone, Default)]
pub struct GlobalLogger {
    path: Option<PathBuf>,
    verbosity: Verbosity,
}

impl GlobalLogger {
    /// NOTE: Relative paths will not be resolved until apply() is called.
    pub fn path<P: AsRef<Path>>(&mut self, path: P) -> &mut Self
    { self.path = Some(path.as_ref().to_owned()); self }

    /// Any integer will be accepted; the level will be truncated
    /// to the most extreme value supported.
    pub fn verbosity(&mut self, level: i32) -> &mut Self
    {
        self.verbosity = match level {
            i32::MIN..=-1 => Verbosity::Quiet,
            0 => Verbosity::Default,
            _ => Verbosity::Loud,
        };
        self
    }

    fn our_level(&self) -> LevelFilter {
        match self.verbosity {
            Verbosity::Quiet => LevelFilter::Warn,
            Verbosity::Default => LevelFilter::Debug,
            Verbosity::Loud => LevelFilter::Trace,
        }
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord)]
enum Verbosity { Quiet, Default, Loud }

impl Default for Verbosity {
    fn default() -> Self { Verbosity::Default }
}

impl GlobalLogger {
    /// Install the logger.  Fails if a logger has already been installed.
    ///
    /// Output goes to stderr, so that stdout is free for results.
    pub fn apply(&mut self) -> FailResult<()>
    {
        use std::time::Instant;

        let start = Instant::now();
        let mut fern = fern::Dispatch::new();
        fern = fern.format(move |out, message, record| {
                let t = start.elapsed();
                out.finish(format_args!("[{:>4}.{:03}s][{}][{}] {}",
                    t.as_secs(),
                    t.subsec_millis(),
                    record.target(),
                    ColorizedLevel(record.level()),
                    message))
            })
            .level(LevelFilter::Info);

        let our_level = self.our_level();
        for &target in OUR_CRATES {
            fern = fern.level_for(target, our_level);
        }
        fern = fern.chain(std::io::stderr());

        if let Some(path) = self.path.as_ref() {
            fern = fern.chain(fern::log_file(path)?);
        }

        fern.apply()?;
        Ok(())
    }
}

#[derive(Debug, Copy, Clone)]
pub struct ColorizedLevel(pub Level);
impl fmt::Display for ColorizedLevel {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let style = match self.0 {
            Level::Error => ansi_term::Colour::Red.bold(),
            Level::Warn  => ansi_term::Colour::Red.normal(),
            Level::Info  => ansi_term::Colour::Cyan.bold(),
            Level::Debug => ansi_term::Colour::Yellow.dimmed(),
            Level::Trace => ansi_term::Colour::Cyan.normal(),
        };
        write!(f, "{}", style.paint(format!("{:<5}", self.0)))
    }
}

#[cfg(test)]
#[deny(unused)]
mod tests {
    use super::*;

    #[test]
    fn verbosity_levels() {
        let mut logger = GlobalLogger::default();
        assert_eq!(logger.our_level(), LevelFilter::Debug);
        assert_eq!(logger.verbosity(3).our_level(), LevelFilter::Trace);
        assert_eq!(logger.verbosity(-1).our_level(), LevelFilter::Warn);
        assert_eq!(logger.verbosity(0).our_level(), LevelFilter::Debug);
    }

    #[test]
    fn colorized_level_keeps_name() {
        let text = ColorizedLevel(Level::Warn).to_string();
        assert!(text.contains("WARN"));
    }
}
