// Copyright (C) 2024 Ethan Uppal. All rights reserved.

mod logger;

use std::{
    io::{self, Write},
    path::PathBuf,
    process::ExitCode,
};

use anyhow::Context;
use clap::{ArgAction, Parser};
use log::LevelFilter;
use ls8::{
    loader::{self, LoadError},
    program::decode_program,
    vm::{HaltReason, VM},
};

/// Exit status for faults raised while the program runs.
const RUNTIME_FAULT: u8 = 4;

#[derive(Parser, Debug)]
#[command(name = "ls8")]
#[command(about = "Runs an LS-8 program", long_about = None)]
struct Args {
    /// Program file with one binary byte per line
    program: PathBuf,

    /// Dump machine state before every instruction
    #[arg(long, action = ArgAction::SetTrue)]
    trace: bool,

    /// Give up after this many instructions
    #[arg(long)]
    max_steps: Option<u64>,

    /// Print the disassembled program instead of running it
    #[arg(long, action = ArgAction::SetTrue)]
    disassemble: bool,

    /// Increase log verbosity (repeatable)
    #[arg(short, long, action = ArgAction::Count)]
    verbose: u8,
}

impl Args {
    fn log_level(&self) -> LevelFilter {
        if self.trace {
            return LevelFilter::Trace;
        }
        match self.verbose {
            0 => LevelFilter::Warn,
            1 => LevelFilter::Info,
            _ => LevelFilter::Debug,
        }
    }
}

fn main() -> ExitCode {
    let args = match Args::try_parse() {
        Ok(args) => args,
        Err(error) => {
            let _ = error.print();
            return if error.use_stderr() {
                ExitCode::from(1)
            } else {
                ExitCode::SUCCESS
            };
        }
    };

    if let Err(error) = logger::init(args.log_level()) {
        eprintln!("failed to install logger: {}", error);
    }

    match run(&args) {
        Ok(code) => code,
        Err(error) => {
            log::error!("{:#}", error);
            let code = error
                .downcast_ref::<LoadError>()
                .map(LoadError::exit_code)
                .unwrap_or(RUNTIME_FAULT);
            ExitCode::from(code)
        }
    }
}

fn run(args: &Args) -> anyhow::Result<ExitCode> {
    let image = loader::load_file(&args.program)?;

    if args.disassemble {
        let listing = decode_program(&image).map_err(|(address, error)| {
            anyhow::anyhow!("{} at address {:#04x}", error, address)
        })?;
        let mut stdout = io::stdout().lock();
        for (address, op) in listing {
            writeln!(stdout, "{:02X}: {}", address, op)?;
        }
        return Ok(ExitCode::SUCCESS);
    }

    let mut vm = VM::default();
    vm.load(&image)?;
    let reason = match args.max_steps {
        Some(max_steps) => vm.run_for(max_steps),
        None => vm.run(),
    }
    .with_context(|| format!("while running {}", args.program.display()))?;
    log::info!("halted after {} steps", vm.steps());

    if let HaltReason::Arithmetic(error) = reason {
        log::error!("{} at address {:#04x}", error, vm.pc());
    }
    Ok(ExitCode::SUCCESS)
}
