use crate::FailResult;
use crate::cmd;
use crate::config::{self, YamlRead};
use crate::logging::GlobalLogger;

use atomkit_lammps_io::{Log, FlattenStyle};

use std::ffi::OsStr;
use std::fs::File;
use std::io::{BufReader, Write};
use std::path::Path;

fn wrap_result_main<F>(main: F)
where F: FnOnce() -> FailResult<()>,
{
    main().unwrap_or_else(|e| {
        for cause in e.iter_chain() {
            error!("{}", cause);
        }

        if std::env::var_os("RUST_BACKTRACE") == Some(OsStr::new("1").to_owned()) {
            error!("{}", e.backtrace());
        } else {
            error!("\
                (If you found the above error message to be particularly lacking in \
                detail, try again with RUST_BACKTRACE=1)\
            ");
        }
        std::process::exit(1);
    });
}

// Arguments shared by every binary.
fn common_args<'a, 'b>(app: clap::App<'a, 'b>) -> clap::App<'a, 'b> {
    app.version(crate_version!())
        .args(&[
            clap::Arg::with_name("verbose")
                .short("v").long("verbose").multiple(true)
                .help("log more detail (may be given more than once)"),
            clap::Arg::with_name("quiet")
                .short("q").long("quiet")
                .conflicts_with("verbose")
                .help("only log warnings and errors"),
            clap::Arg::with_name("log")
                .long("log").takes_value(true).value_name("LOGFILE")
                .help("also write the log to this file"),
            clap::Arg::with_name("output")
                .short("o").long("output").takes_value(true).value_name("JSON")
                .help("write results here instead of stdout"),
        ])
}

fn config_app<'a, 'b>(name: &'a str, about: &'a str) -> clap::App<'a, 'b> {
    common_args(clap::App::new(name).about(about))
        .arg(clap::Arg::with_name("config")
            .required(true).value_name("CONFIG")
            .help("config yaml"))
}

fn init_logger(m: &clap::ArgMatches) -> FailResult<()> {
    let verbosity = match m.is_present("quiet") {
        true => -1,
        false => m.occurrences_of("verbose") as i32,
    };
    let mut logger = GlobalLogger::default();
    logger.verbosity(verbosity);
    if let Some(path) = m.value_of("log") {
        logger.path(path);
    }
    logger.apply()
}

fn read_config<T: YamlRead>(path: &str) -> FailResult<T> {
    let file = File::open(path).map_err(|e| format_err!("could not open '{}': {}", path, e))?;
    Ok(T::from_reader(BufReader::new(file))?)
}

fn write_results<T: serde::Serialize>(m: &clap::ArgMatches, value: &T) -> FailResult<()> {
    match m.value_of("output") {
        Some(path) => {
            let file = File::create(Path::new(path))?;
            serde_json::to_writer_pretty(file, value)?;
            info!("Wrote results to '{}'", path);
        },
        None => {
            let stdout = std::io::stdout();
            let mut stdout = stdout.lock();
            serde_json::to_writer_pretty(&mut stdout, value)?;
            writeln!(stdout)?;
        },
    }
    Ok(())
}

fn run_config<T, R, F>(name: &str, about: &str, run: F)
where
    T: YamlRead,
    R: serde::Serialize,
    F: FnOnce(&T) -> FailResult<R>,
{
    let matches = config_app(name, about).get_matches();
    wrap_result_main(|| {
        init_logger(&matches)?;
        let path = matches.value_of("config").unwrap_or_default();
        let settings = read_config::<T>(path)?;
        let results = run(&settings)?;
        write_results(&matches, &results)
    });
}

// -------------------------------------------------------------------------------------

// %% CRATES: binary: atomkit-surface %%
pub fn surface() {
    run_config::<config::Surface, _, _>(
        "atomkit-surface",
        "Orient a unit cell for a free surface, and build a slab.",
        cmd::run_surface,
    );
}

// %% CRATES: binary: atomkit-dislocation %%
pub fn dislocation() {
    run_config::<config::Dislocation, _, _>(
        "atomkit-dislocation",
        "Orient a unit cell so that a dislocation line and slip plane lie along cell axes.",
        cmd::run_dislocation,
    );
}

// %% CRATES: binary: atomkit-ddisp %%
pub fn ddisp() {
    run_config::<config::Ddisp, _, _>(
        "atomkit-ddisp",
        "Differential displacement arrows between a base and a defect structure.",
        cmd::run_ddisp,
    );
}

// %% CRATES: binary: atomkit-lammps-run %%
pub fn lammps_run() {
    run_config::<config::LammpsRun, _, _>(
        "atomkit-lammps-run",
        "Run LAMMPS, restarting if an earlier log is found, and collect thermo output.",
        cmd::run_lammps,
    );
}

// %% CRATES: binary: atomkit-lammps-log %%
pub fn lammps_log() {
    let matches = common_args(clap::App::new("atomkit-lammps-log"))
        .about("Parse one or more LAMMPS log files, in order.")
        .args(&[
            clap::Arg::with_name("logs")
                .required(true).multiple(true).value_name("LOG")
                .help("log files, oldest first"),
            clap::Arg::with_name("flatten")
                .long("flatten").takes_value(true)
                .possible_values(&["first", "last", "all"])
                .help("combine all simulations into one"),
        ])
        .get_matches();

    wrap_result_main(|| {
        init_logger(&matches)?;

        let mut log = Log::new();
        for path in matches.values_of("logs").into_iter().flatten() {
            log.read_path(path)?;
        }
        info!("Read {} simulations", log.simulations().len());

        match matches.value_of("flatten") {
            Some(style) => {
                let style: FlattenStyle = style.parse()?;
                write_results(&matches, &log.flatten(style)?)
            },
            None => write_results(&matches, &log),
        }
    });
}
