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

//! Parsing LAMMPS log files (or screen output).
//!
//! Each `run` or `minimize` in a log produces one [`Simulation`].  Its thermo
//! table is found between the memory usage line printed before the run and
//! the `Loop time of` line printed after it; a log that ends mid-run still
//! yields the rows printed so far.

use crate::FailResult;

use std::io::prelude::*;
use std::path::Path;
use std::str::FromStr;

use chrono::NaiveDate;

const THERMO_START: &[&str] = &[
    "Memory usage per processor =",
    "Per MPI rank memory allocation (min/avg/max) =",
];
const THERMO_END: &[&str] = &["Loop time of"];

const PERFORMANCE_START: &[&str] = &["MPI task timing breakdown"];
const PERFORMANCE_START_OLD: &[&str] = &["Pair  time (%)"];
const PERFORMANCE_END: &[&str] = &["Nlocal:"];

const STEP: &str = "Step";

/// A table of thermo output, one row per printed timestep.
#[derive(Debug, Clone, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Thermo {
    columns: Vec<String>,
    rows: Vec<Vec<f64>>,
}

impl Thermo {
    /// # Panics
    /// Panics if a row has the wrong length.
    pub fn new(columns: Vec<String>, rows: Vec<Vec<f64>>) -> Self {
        for row in &rows {
            assert_eq!(row.len(), columns.len(), "thermo row has the wrong number of columns");
        }
        Thermo { columns, rows }
    }

    pub fn columns(&self) -> &[String]
    { &self.columns }

    pub fn rows(&self) -> &[Vec<f64>]
    { &self.rows }

    pub fn len(&self) -> usize
    { self.rows.len() }

    pub fn is_empty(&self) -> bool
    { self.rows.is_empty() }

    pub fn column_index(&self, name: &str) -> Option<usize>
    { self.columns.iter().position(|c| c == name) }

    /// All values of one thermo keyword.
    pub fn column(&self, name: &str) -> Option<Vec<f64>> {
        let index = self.column_index(name)?;
        Some(self.rows.iter().map(|row| row[index]).collect())
    }

    fn steps(&self) -> FailResult<Vec<f64>> {
        match self.column(STEP) {
            Some(steps) => Ok(steps),
            None => bail!("thermo output has no '{}' column (columns: {:?})", STEP, self.columns),
        }
    }

    /// Append the rows of `other` for which `keep` returns true.
    ///
    /// Columns missing from either table are filled with NaN.
    fn extend_filtered(&mut self, other: &Thermo, mut keep: impl FnMut(usize) -> bool) {
        for column in &other.columns {
            if self.column_index(column).is_none() {
                self.columns.push(column.clone());
                for row in &mut self.rows {
                    row.push(std::f64::NAN);
                }
            }
        }

        let mapping: Vec<_> = self.columns.iter().map(|c| other.column_index(c)).collect();
        for (index, row) in other.rows.iter().enumerate() {
            if keep(index) {
                self.rows.push(mapping.iter().map(|&i| i.map_or(std::f64::NAN, |i| row[i])).collect());
            }
        }
    }

    fn retain_rows(&mut self, mut keep: impl FnMut(usize) -> bool) {
        let rows = std::mem::replace(&mut self.rows, vec![]);
        self.rows = {
            rows.into_iter().enumerate()
                .filter(|&(index, _)| keep(index))
                .map(|(_, row)| row)
                .collect()
        };
    }
}

/// The timing breakdown printed after a run.
///
/// Rows are keyed by section (`Pair`, `Neigh`, `Comm`...).  Blank cells are read as zero.
#[derive(Debug, Clone, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Performance {
    columns: Vec<String>,
    sections: Vec<String>,
    values: Vec<Vec<f64>>,
}

impl Performance {
    pub fn columns(&self) -> &[String]
    { &self.columns }

    pub fn sections(&self) -> &[String]
    { &self.sections }

    pub fn get(&self, section: &str, column: &str) -> Option<f64> {
        let row = self.sections.iter().position(|s| s == section)?;
        let col = self.columns.iter().position(|c| c == column)?;
        Some(self.values[row][col])
    }
}

/// Output of a single `run` or `minimize`.
#[derive(Debug, Clone, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Simulation {
    pub thermo: Option<Thermo>,
    pub performance: Option<Performance>,
}

/// How [`Log::flatten`] resolves timesteps that appear in more than one simulation.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "kebab-case"))]
pub enum FlattenStyle {
    /// Keep the values from the earliest simulation.
    First,
    /// Keep the values from the latest simulation.
    Last,
    /// Keep every row, duplicates included.
    All,
}

impl Default for FlattenStyle {
    fn default() -> Self { FlattenStyle::Last }
}

impl FromStr for FlattenStyle {
    type Err = failure::Error;

    fn from_str(s: &str) -> FailResult<Self> {
        match s {
            "first" => Ok(FlattenStyle::First),
            "last" => Ok(FlattenStyle::Last),
            "all" => Ok(FlattenStyle::All),
            _ => bail!("unsupported flatten style: {:?} (expected first, last, or all)", s),
        }
    }
}

/// The parsed contents of one or more LAMMPS logs.
#[derive(Debug, Clone, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Log {
    version: Option<String>,
    date: Option<NaiveDate>,
    simulations: Vec<Simulation>,
}

impl Log {
    pub fn new() -> Self
    { Self::default() }

    pub fn from_reader(r: impl BufRead) -> FailResult<Self> {
        let mut log = Log::new();
        log.read(r)?;
        Ok(log)
    }

    pub fn from_path(path: impl AsRef<Path>) -> FailResult<Self> {
        let mut log = Log::new();
        log.read_path(path)?;
        Ok(log)
    }

    /// The version string, e.g. `"3 Mar 2020"`.
    pub fn version(&self) -> Option<&str>
    { self.version.as_ref().map(|s| &s[..]) }

    /// The release date encoded in the version string.
    pub fn date(&self) -> Option<NaiveDate>
    { self.date }

    pub fn simulations(&self) -> &[Simulation]
    { &self.simulations }

    /// Forget everything read so far.
    pub fn clear(&mut self)
    { *self = Log::new(); }

    pub fn read_path(&mut self, path: impl AsRef<Path>) -> FailResult<()> {
        let path = path.as_ref();
        let file = match std::fs::File::open(path) {
            Ok(file) => file,
            Err(e) => bail!("could not open log '{}': {}", path.display(), e),
        };
        trace!("Reading LAMMPS log '{}'", path.display());
        self.read(std::io::BufReader::new(file))
    }

    /// Parse log content, appending its simulations to those already read.
    pub fn read(&mut self, r: impl BufRead) -> FailResult<()> {
        // blank lines are ignored entirely, including for line numbering
        let lines = {
            r.lines()
                .filter(|line| line.as_ref().map_or(true, |s| !s.trim().is_empty()))
                .collect::<Result<Vec<_>, _>>()?
        };
        let contains_any = |line: &str, triggers: &[&str]| triggers.iter().any(|t| line.contains(t));

        let mut thermo_headers = vec![];
        let mut thermo_footers = vec![];
        let mut performance_headers = vec![];
        let mut performance_footers = vec![];
        let mut old_performance = false;

        for (i, line) in lines.iter().enumerate() {
            if self.version.is_none() && line.starts_with("LAMMPS (") {
                self.read_version(line);
            }

            if contains_any(line, THERMO_START) {
                thermo_headers.push(i + 1);
            } else if contains_any(line, THERMO_END) {
                thermo_footers.push(i.saturating_sub(1));
            }

            if contains_any(line, PERFORMANCE_START) {
                performance_headers.push(i + 1);
            }
            if contains_any(line, PERFORMANCE_START_OLD) {
                performance_headers.push(i);
                old_performance = true;
            } else if contains_any(line, PERFORMANCE_END) {
                performance_footers.push(i.saturating_sub(1));
            }
        }
        // incomplete logs end in the middle of a thermo table
        thermo_footers.push(lines.len());

        let first_new = self.simulations.len();
        for (&header, &footer) in thermo_headers.iter().zip(&thermo_footers) {
            let thermo = read_thermo(&lines, header, footer);
            self.simulations.push(Simulation { thermo: Some(thermo), performance: None });
        }

        for (k, (&header, &footer)) in performance_headers.iter().zip(&performance_footers).enumerate() {
            let performance = match old_performance {
                false => read_performance(&lines, header, footer)?,
                true => read_performance_old(&lines, header, footer)?,
            };
            match self.simulations.get_mut(first_new + k) {
                Some(sim) => sim.performance = Some(performance),
                None => warn!("LAMMPS log has a timing breakdown with no matching thermo output"),
            }
        }
        Ok(())
    }

    fn read_version(&mut self, line: &str) {
        let version = line.trim().trim_start_matches("LAMMPS (").trim_end_matches(')');

        // e.g. "29 Oct 2020 - Update 2"
        let date_part = version.split('-').next().unwrap_or("").trim();
        self.date = match NaiveDate::parse_from_str(date_part, "%d %b %Y") {
            Ok(date) => Some(date),
            Err(_) => {
                warn!("Could not read a date from LAMMPS version {:?}", version);
                None
            },
        };
        self.version = Some(version.to_string());
    }

    /// Combine all simulations into one, ordered by timestep.
    ///
    /// Every simulation that has thermo output must include `Step`.
    pub fn flatten(&self, style: FlattenStyle) -> FailResult<Simulation> {
        let mut thermos = self.simulations.iter().filter_map(|sim| sim.thermo.as_ref());
        let mut merged = match thermos.next() {
            Some(thermo) => thermo.clone(),
            None => bail!("cannot flatten a log with no thermo output"),
        };
        if !merged.is_empty() {
            merged.steps()?;
        }

        for thermo in thermos {
            if thermo.is_empty() {
                continue;
            }
            let steps = thermo.steps()?;
            let merged_steps = match merged.is_empty() {
                true => vec![],
                false => merged.steps()?,
            };

            match style {
                FlattenStyle::First => {
                    let max = merged_steps.iter().cloned().fold(std::f64::NEG_INFINITY, f64::max);
                    merged.extend_filtered(thermo, |i| steps[i] > max);
                },
                FlattenStyle::Last => {
                    let min = steps.iter().cloned().fold(std::f64::INFINITY, f64::min);
                    merged.retain_rows(|i| merged_steps[i] < min);
                    merged.extend_filtered(thermo, |_| true);
                },
                FlattenStyle::All => merged.extend_filtered(thermo, |_| true),
            }
        }
        Ok(Simulation { thermo: Some(merged), performance: None })
    }
}

fn read_thermo(lines: &[String], header: usize, footer: usize) -> Thermo {
    let mut thermo = Thermo::default();
    let header_line = match lines.get(header) {
        Some(line) => line,
        None => return thermo,
    };
    thermo.columns = header_line.split_whitespace().map(|s| s.to_string()).collect();

    let end = footer.min(lines.len().saturating_sub(1));
    for line in lines.iter().take(end + 1).skip(header + 1) {
        let row: Option<Vec<f64>> = line.split_whitespace().map(|s| s.parse().ok()).collect();
        match row {
            Some(row) if row.len() == thermo.columns.len() => thermo.rows.push(row),
            // warnings can be printed in the middle of a run
            _ => debug!("Skipping non-thermo line in LAMMPS log: {:?}", line),
        }
    }
    thermo
}

//   Section |  min time  |  avg time  |  max time  |%varavg| %total
//   ---------------------------------------------------------------
//   Pair    | 0.0012     | 0.0012     | 0.0012     |   0.0 | 87.50
fn read_performance(lines: &[String], header: usize, footer: usize) -> FailResult<Performance> {
    let mut out = Performance::default();
    let header_line = match lines.get(header) {
        Some(line) => line,
        None => bail!("LAMMPS log ends inside a timing breakdown"),
    };
    // the first column is the section name
    out.columns = header_line.split('|').skip(1).map(|s| s.trim().to_string()).collect();

    // skip the header and the dashed rule below it
    for line in lines.iter().take(footer + 1).skip(header + 2) {
        let mut cells = line.split('|').map(str::trim);
        let section = cells.next().unwrap_or("").to_string();
        let values = {
            cells.map(|cell| match cell {
                "" => Ok(0.0),
                s => s.parse::<f64>().map_err(|_| format_err!("bad timing value {:?} in line {:?}", s, line)),
            }).collect::<FailResult<Vec<_>>>()?
        };
        ensure!(
            values.len() == out.columns.len(),
            "wrong number of columns in timing line {:?}", line,
        );
        out.sections.push(section);
        out.values.push(values);
    }
    Ok(out)
}

//   Pair  time (%) = 0.4 (80.0)
fn read_performance_old(lines: &[String], header: usize, footer: usize) -> FailResult<Performance> {
    let mut out = Performance::default();
    out.columns = vec!["avg. Time".to_string(), "%".to_string()];

    for line in lines.iter().take(footer + 1).skip(header) {
        let parsed = (|| {
            let mut halves = line.splitn(2, '=');
            let section = halves.next()?.split_whitespace().next()?;
            let value = halves.next()?;
            let open = value.find('(')?;
            let close = value.find(')')?;
            let time = value[..open].trim().parse::<f64>().ok()?;
            let percent = value[open + 1..close].trim().parse::<f64>().ok()?;
            Some((section.to_string(), vec![time, percent]))
        })();
        match parsed {
            Some((section, values)) => {
                out.sections.push(section);
                out.values.push(values);
            },
            None => bail!("bad timing line in LAMMPS log: {:?}", line),
        }
    }
    Ok(out)
}

#[cfg(test)]
#[deny(unused)]
mod tests {
    use super::*;

    const MODERN: &str = "\
LAMMPS (3 Mar 2020)
units metal

Per MPI rank memory allocation (min/avg/max) = 3.06 | 3.06 | 3.06 Mbytes
Step Temp PotEng Press
       0            0   -1791.6762   -9024.2087
      10            0   -1795.0317   -1422.4201
Loop time of 0.00137115 on 1 procs for 10 steps with 500 atoms

MPI task timing breakdown:
Section |  min time  |  avg time  |  max time  |%varavg| %total
---------------------------------------------------------------
Pair    | 0.0012     | 0.0012     | 0.0012     |   0.0 | 87.50
Neigh   | 0          | 0          | 0          |   0.0 |  0.00
Other   |            | 0.0001     |            |       |  7.29

Nlocal:    500 ave 500 max 500 min
Histogram: 1 0 0 0 0 0 0 0 0 0
Per MPI rank memory allocation (min/avg/max) = 3.06 | 3.06 | 3.06 Mbytes
Step Temp PotEng Press
      10            0   -1795.0400   -1422.4201
      20            0   -1795.2000   -1000.0
WARNING: Something odd happened (src/foo.cpp:12)
      30            0   -1795.3000   -900.0
";

    const OLD: &str = "\
LAMMPS (1 Feb 2014)
Memory usage per processor = 2.1 Mbytes
Step Temp
       0          300
     100        290.5
Loop time of 0.5 on 1 procs for 100 steps with 32 atoms

Pair  time (%) = 0.4 (80.0)
Neigh time (%) = 0.05 (10)
Comm  time (%) = 0.01 (2)
Outpt time (%) = 0 (0)
Other time (%) = 0.04 (8)

Nlocal:    32 ave 32 max 32 min
";

    #[test]
    fn modern_log() {
        let log = Log::from_reader(MODERN.as_bytes()).unwrap();
        assert_eq!(log.version(), Some("3 Mar 2020"));
        assert_eq!(log.date(), Some(NaiveDate::from_ymd(2020, 3, 3)));
        assert_eq!(log.simulations().len(), 2);

        let first = &log.simulations()[0];
        let thermo = first.thermo.as_ref().unwrap();
        assert_eq!(thermo.columns(), &["Step", "Temp", "PotEng", "Press"]);
        assert_eq!(thermo.column("PotEng").unwrap(), vec![-1791.6762, -1795.0317]);

        let performance = first.performance.as_ref().unwrap();
        assert_eq!(performance.sections(), &["Pair", "Neigh", "Other"]);
        assert_eq!(performance.columns()[4], "%total");
        assert_eq!(performance.get("Pair", "%total"), Some(87.5));
        assert_eq!(performance.get("Other", "min time"), Some(0.0));
        assert_eq!(performance.get("Other", "avg time"), Some(0.0001));

        // the second run never finished; the warning is not a row
        let second = &log.simulations()[1];
        assert_eq!(second.thermo.as_ref().unwrap().column("Step").unwrap(), vec![10.0, 20.0, 30.0]);
        assert!(second.performance.is_none());
    }

    #[test]
    fn old_log() {
        let log = Log::from_reader(OLD.as_bytes()).unwrap();
        assert_eq!(log.date(), Some(NaiveDate::from_ymd(2014, 2, 1)));

        let sim = &log.simulations()[0];
        assert_eq!(sim.thermo.as_ref().unwrap().rows(), &[vec![0.0, 300.0], vec![100.0, 290.5]]);

        let performance = sim.performance.as_ref().unwrap();
        assert_eq!(performance.sections(), &["Pair", "Neigh", "Comm", "Outpt", "Other"]);
        assert_eq!(performance.get("Pair", "avg. Time"), Some(0.4));
        assert_eq!(performance.get("Neigh", "%"), Some(10.0));
    }

    #[test]
    fn appended_reads() {
        let mut log = Log::from_reader(OLD.as_bytes()).unwrap();
        log.read(MODERN.as_bytes()).unwrap();
        // the first version seen wins
        assert_eq!(log.version(), Some("1 Feb 2014"));
        assert_eq!(log.simulations().len(), 3);
        // timings attach to the simulations from the same read
        assert!(log.simulations()[0].performance.is_some());
        assert_eq!(log.simulations()[1].performance.as_ref().unwrap().get("Pair", "%total"), Some(87.5));
        assert!(log.simulations()[2].performance.is_none());

        log.clear();
        assert!(log.simulations().is_empty());
        assert!(log.version().is_none());
    }

    #[test]
    fn flatten() {
        let log = Log::from_reader(MODERN.as_bytes()).unwrap();

        let last = log.flatten(FlattenStyle::Last).unwrap().thermo.unwrap();
        assert_eq!(last.column("Step").unwrap(), vec![0.0, 10.0, 20.0, 30.0]);
        assert_eq!(last.column("PotEng").unwrap()[1], -1795.0400);

        let first = log.flatten(FlattenStyle::First).unwrap().thermo.unwrap();
        assert_eq!(first.column("Step").unwrap(), vec![0.0, 10.0, 20.0, 30.0]);
        assert_eq!(first.column("PotEng").unwrap()[1], -1795.0317);

        let all = log.flatten(FlattenStyle::All).unwrap().thermo.unwrap();
        assert_eq!(all.column("Step").unwrap(), vec![0.0, 10.0, 10.0, 20.0, 30.0]);

        assert!(Log::new().flatten(FlattenStyle::Last).is_err());
        assert_eq!("first".parse::<FlattenStyle>().unwrap(), FlattenStyle::First);
        assert!("middle".parse::<FlattenStyle>().is_err());
    }

    #[test]
    fn flatten_mismatched_columns() {
        let mut log = Log::new();
        log.simulations.push(Simulation {
            thermo: Some(Thermo::new(vec!["Step".into(), "Temp".into()], vec![vec![0.0, 1.0]])),
            performance: None,
        });
        log.simulations.push(Simulation {
            thermo: Some(Thermo::new(vec!["Step".into(), "Press".into()], vec![vec![5.0, 2.0]])),
            performance: None,
        });
        let thermo = log.flatten(FlattenStyle::All).unwrap().thermo.unwrap();
        assert_eq!(thermo.columns(), &["Step", "Temp", "Press"]);
        assert_eq!(thermo.rows()[0][..2], [0.0, 1.0]);
        assert!(thermo.rows()[0][2].is_nan());
        assert!(thermo.rows()[1][1].is_nan());
        assert_eq!(thermo.rows()[1][2], 2.0);

        log.simulations.push(Simulation {
            thermo: Some(Thermo::new(vec!["Temp".into()], vec![vec![3.0]])),
            performance: None,
        });
        assert!(log.flatten(FlattenStyle::All).is_err());
    }
}
