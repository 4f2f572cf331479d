//! DroneASM command-line driver.
//!
//! Assembles a `.dasm` source file and runs it on the simulated drone.
//!
//! # Usage
//! ```text
//! droneasm [OPTIONS] <program.dasm>
//! ```
//!
//! # Options
//! - `--check`: assemble only, report diagnostics, do not run
//! - `--path`: print the simulated flight path after the run
//!
//! Exit status is 0 on a clean halt, 1 on an assembly or runtime failure,
//! and 2 on bad command-line usage.

use std::env;
use std::process;

use droneasm::assembler::assemble_file;
use droneasm::hardware::{fmt_number, SimulatedDrone, StdoutDisplay};
use droneasm::vm::Vm;
use droneasm::{error, info};

const USAGE: &str = "\
Usage: droneasm [OPTIONS] <program.dasm>

Assembles and runs a DroneASM program on the simulated drone.

Options:
  -c, --check   Assemble only; do not run
  -p, --path    Print the flight path after the run
  -h, --help    Show this help";

fn main() {
    let mut check_only = false;
    let mut show_path = false;
    let mut input: Option<String> = None;

    for arg in env::args().skip(1) {
        match arg.as_str() {
            "-c" | "--check" => check_only = true,
            "-p" | "--path" => show_path = true,
            "-h" | "--help" => {
                println!("{USAGE}");
                return;
            }
            _ if arg.starts_with('-') => {
                error!("unknown option `{arg}`");
                eprintln!("{USAGE}");
                process::exit(2);
            }
            _ => {
                if input.is_some() {
                    error!("expected exactly one program file");
                    eprintln!("{USAGE}");
                    process::exit(2);
                }
                input = Some(arg);
            }
        }
    }

    let Some(input) = input else {
        eprintln!("{USAGE}");
        process::exit(2);
    };

    // The assembler logs its own diagnostic on failure.
    let Ok(program) = assemble_file(&input) else {
        process::exit(1);
    };
    info!("assembled {input}: {} instruction(s)", program.len());
    if check_only {
        return;
    }

    let mut vm = Vm::new(program);
    let mut drone = SimulatedDrone::new();
    let mut display = StdoutDisplay;
    if let Err(err) = vm.run(&mut drone, &mut display) {
        error!("{err}");
        process::exit(1);
    }
    info!("program halted");

    if show_path {
        for [x, y, z] in drone.path() {
            println!("{} {} {}", fmt_number(*x), fmt_number(*y), fmt_number(*z));
        }
    }
}
