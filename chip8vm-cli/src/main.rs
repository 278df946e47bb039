//! Entrypoint for CLI
mod error;

use std::{env, fs, time::Instant};

use chip8vm::{prelude::*, IMPL_VERSION};
use log::{error, info, warn};

use self::error::{AppError, AppResult};

static USAGE: &str = r#"
usage: chip8vm CMD FILE [CONFIG]

commands:
    run     Run the target ROM file headless, then print the display
    dis     Disassemble the target ROM into readable assembly

config (YAML, all fields optional):
    clock_frequency: 500   # instructions per second, unthrottled if absent
    timer_frequency: 60    # delay and sound timer rate
    seed: 1234             # random number generator seed
    max_cycles: 10000      # stop after this many instructions

examples:
    chip8vm run maze.rom
    chip8vm run breakout.rom conf.yaml
    chip8vm dis breakout.rom
"#;

/// Cycle limit for headless runs when the config doesn't set one.
const DEFAULT_MAX_CYCLES: u64 = 10_000;

fn run_rom(filepath: &str, config: Option<&str>) -> AppResult<()> {
    let conf = load_config(config)?;
    let rom = fs::read(filepath)?;

    let mut vm = Chip8Vm::new(conf.clone());
    vm.load_rom(&rom)?;
    info!("loaded {filepath} ({} bytes)", rom.len());

    // Headless, so no key is ever pressed.
    let mut keypad = Keypad::new();
    let mut clock = conf.clock_frequency.map(Clock::from_hz);
    let mut timer = Clock::from_hz(conf.timer_frequency);
    let max_cycles = conf.max_cycles.unwrap_or(DEFAULT_MAX_CYCLES);

    let start = Instant::now();
    let mut cycles = 0;
    let mut frames = 0;
    let mut result = Ok(());

    while cycles < max_cycles {
        if let Some(clock) = clock.as_mut() {
            clock.wait();
        }
        if timer.tick() {
            vm.tick_timers();
        }

        cycles += 1;
        match vm.step(&mut keypad) {
            Ok(Flow::KeyWait) => {
                warn!("program is waiting for a key, stopping headless run");
                break;
            }
            Ok(_) => {}
            Err(err) => {
                result = Err(err);
                break;
            }
        }

        if keypad.take_redraw() {
            frames += 1;
        }
    }

    let elapsed = start.elapsed();
    info!(
        "ran {cycles} cycles, {frames} draws in {}ms",
        elapsed.as_nanos() as f64 / 1_000_000.0
    );

    println!("{}", vm.dump_display()?);
    print!("{}", vm.dump_registers()?);

    result?;

    Ok(())
}

fn run_disassembler(filepath: &str) -> AppResult<()> {
    let rom = fs::read(filepath)?;
    let listing = Disassembler::new(&rom).disassemble_all()?;
    print!("{listing}");
    Ok(())
}

fn load_config(filepath: Option<&str>) -> AppResult<Chip8Conf> {
    match filepath {
        Some(filepath) => {
            let file = fs::File::open(filepath)?;
            Ok(serde_yaml::from_reader(file)?)
        }
        None => Ok(Chip8Conf::default()),
    }
}

fn main() {
    if let Err(err) = simple_logger::SimpleLogger::new()
        .with_level(log::LevelFilter::Info)
        .env()
        .init()
        .map_err(AppError::from)
    {
        eprintln!("{err}");
    }

    let result = match parse_args() {
        Some(Cmd::Run { filepath, config }) => run_rom(&filepath, config.as_deref()),
        Some(Cmd::Dis { filepath }) => run_disassembler(&filepath),
        None => {
            print_usage();
            // FreeBSD EX_USAGE (64)
            std::process::exit(64)
        }
    };

    if let Err(err) = result {
        error!("{err}");
        std::process::exit(1);
    }
}

fn parse_args() -> Option<Cmd> {
    let mut args = env::args().skip(1);
    match args.next() {
        Some(cmd) => {
            // don't format me T.T
            match cmd.as_str() {
                "run" => Some(Cmd::Run {
                    filepath: args.next()?,
                    config: args.next(),
                }),
                "dis" => Some(Cmd::Dis {
                    filepath: args.next()?,
                }),
                _ => None,
            }
        }
        None => None,
    }
}

fn print_usage() {
    println!("Chip8 VM v{IMPL_VERSION}");
    println!("{USAGE}");
}

enum Cmd {
    /// Run file
    Run {
        filepath: String,
        config: Option<String>,
    },
    /// Disassemble
    Dis { filepath: String },
}
