//! A headless runner for the wisp core. It loads a ROM, steps the console until it stops (or a
//! limit is hit), and keeps battery-backed cartridge RAM in a save file next to the ROM.

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::Parser;
use serde::Deserialize;
use tracing::{debug, error, info, warn};
use tracing_subscriber::EnvFilter;
use wisp::{Gameboy, CYCLES_PER_FRAME};

/// The config file that is read when `--config` is not given, if it exists.
const DEFAULT_CONFIG: &str = "imp.toml";

#[derive(Debug, Parser)]
#[command(version, about)]
struct Args {
    /// The path to the ROM to run.
    rom: PathBuf,
    /// A TOML file with default settings. Flags given here take precedence.
    #[arg(long)]
    config: Option<PathBuf>,
    /// Stop after this many instructions.
    #[arg(long)]
    max_steps: Option<u64>,
    /// Stop after this many frames worth of cycles.
    #[arg(long)]
    frames: Option<u64>,
    /// Print each instruction before it is executed.
    #[arg(long)]
    trace: bool,
    /// The log filter, e.g. `info` or `wisp=debug`.
    #[arg(long)]
    log_level: Option<String>,
    /// Where battery-backed RAM is kept. Defaults to the ROM path with a `.sav` extension.
    #[arg(long)]
    save: Option<PathBuf>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
struct Config {
    max_steps: Option<u64>,
    frames: Option<u64>,
    trace: bool,
    log_level: Option<String>,
    save: Option<PathBuf>,
}

impl Config {
    /// Reads the config file. A missing default config is not an error, but a missing explicit
    /// one is.
    fn read(path: Option<&Path>) -> Result<Self, ImpError> {
        let (path, required) = match path {
            Some(path) => (path, true),
            None => (Path::new(DEFAULT_CONFIG), false),
        };
        match std::fs::read_to_string(path) {
            Ok(contents) => Ok(toml::from_str(&contents)?),
            Err(err) if !required && err.kind() == std::io::ErrorKind::NotFound => {
                Ok(Self::default())
            }
            Err(err) => Err(ImpError::Io(path.to_owned(), err)),
        }
    }

    /// Lays the command line flags over the file's settings.
    fn merge(self, args: &Args) -> Self {
        Self {
            max_steps: args.max_steps.or(self.max_steps),
            frames: args.frames.or(self.frames),
            trace: args.trace || self.trace,
            log_level: args.log_level.clone().or(self.log_level),
            save: args.save.clone().or(self.save),
        }
    }
}

#[derive(Debug, derive_more::Display, derive_more::Error, derive_more::From)]
enum ImpError {
    #[display("could not access '{}': {_1}", _0.display())]
    #[from(ignore)]
    Io(PathBuf, #[error(source)] std::io::Error),
    #[display("invalid config: {_0}")]
    Config(toml::de::Error),
    #[display("invalid log filter: {_0}")]
    Filter(tracing_subscriber::filter::ParseError),
    #[display("emulation failed: {_0}")]
    Emulation(wisp::Error),
}

fn main() -> ExitCode {
    let args = Args::parse();
    match run(args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("imp: {err}");
            ExitCode::FAILURE
        }
    }
}

fn run(args: Args) -> Result<(), ImpError> {
    let config = Config::read(args.config.as_deref())?.merge(&args);
    let filter = match &config.log_level {
        Some(level) => EnvFilter::try_new(level)?,
        None => EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
    };
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let rom = std::fs::read(&args.rom).map_err(|err| ImpError::Io(args.rom.clone(), err))?;
    let mut gb = Gameboy::load_cartridge(rom)?;
    let save_path = config
        .save
        .clone()
        .unwrap_or_else(|| args.rom.with_extension("sav"));
    load_save(&mut gb, &save_path)?;

    let outcome = drive(&mut gb, &config);
    if let Err(err) = &outcome {
        error!("Stopping early: {err}");
    }
    write_save(&gb, &save_path)?;
    println!("{}", gb.cpu());
    outcome.map_err(Into::into)
}

/// Steps the console until it stops or one of the configured limits is reached.
fn drive(gb: &mut Gameboy, config: &Config) -> wisp::Result<()> {
    let mut steps = 0u64;
    let mut frames = 0u64;
    let mut elapsed = 0u32;
    while !gb.is_stopped() {
        if config.max_steps.is_some_and(|max| steps >= max)
            || config.frames.is_some_and(|max| frames >= max)
        {
            break;
        }
        if config.trace && !gb.is_halted() {
            println!("{}", gb.next_op()?);
        }
        let cycles = gb.step()? as u32;
        gb.tick_peripherals(cycles);
        steps += 1;
        elapsed += cycles;
        if elapsed >= CYCLES_PER_FRAME {
            elapsed -= CYCLES_PER_FRAME;
            frames += 1;
        }
    }
    info!("Ran {steps} steps over {frames} frames");
    Ok(())
}

fn load_save(gb: &mut Gameboy, path: &Path) -> Result<(), ImpError> {
    let Some(cart) = gb.mem_mut().cartridge_mut() else {
        return Ok(());
    };
    if !cart.has_battery() {
        return Ok(());
    }
    match std::fs::read(path) {
        Ok(data) => {
            info!("Loading save from {}", path.display());
            cart.load_ram(&data);
            Ok(())
        }
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
            debug!("No save found at {}", path.display());
            Ok(())
        }
        Err(err) => Err(ImpError::Io(path.to_owned(), err)),
    }
}

fn write_save(gb: &Gameboy, path: &Path) -> Result<(), ImpError> {
    match gb.mem().cartridge() {
        Some(cart) if cart.has_battery() => {
            let ram = cart.ram();
            if ram.is_empty() {
                warn!("Cartridge has a battery but no RAM, nothing to save");
                return Ok(());
            }
            info!("Writing save to {}", path.display());
            std::fs::write(path, ram).map_err(|err| ImpError::Io(path.to_owned(), err))
        }
        _ => Ok(()),
    }
}
