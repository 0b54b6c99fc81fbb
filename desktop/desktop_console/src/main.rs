/*
 *  Copyright (C) 2025  Markus Elias Gerber
 *
 *  This program is free software: you can redistribute it and/or modify
 *  it under the terms of the GNU General Public License as published by
 *  the Free Software Foundation, either version 3 of the License, or
 *  (at your option) any later version.
 *
 *  This program is distributed in the hope that it will be useful,
 *  but WITHOUT ANY WARRANTY; without even the implied warranty of
 *  MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
 *  GNU General Public License for more details.
 *
 *  You should have received a copy of the GNU General Public License
 *  along with this program.  If not, see <https://www.gnu.org/licenses/>.
 */

use std::{env, io::stdout, process::exit, thread, time::Duration};

use env_logger::{Builder, Env};
use kernel_sim::{Kernel, KernelError};
use log::{error, info};

const DEFAULT_CONFIG_PATH: &str = "config.txt";
const DEFAULT_RUN_MS: u64 = 1000;

struct Options {
    config_path: String,
    run_ms: u64,
    json: bool,
}

fn parse_options() -> Result<Options, String> {
    let mut options = Options {
        config_path: DEFAULT_CONFIG_PATH.to_string(),
        run_ms: DEFAULT_RUN_MS,
        json: false,
    };

    let mut positional = 0;
    for arg in env::args().skip(1) {
        if arg == "--json" {
            options.json = true;
            continue;
        }

        match positional {
            0 => options.config_path = arg,
            1 => {
                options.run_ms = arg
                    .parse()
                    .map_err(|_| format!("invalid run time `{}`", arg))?
            }
            _ => return Err(format!("unexpected argument `{}`", arg)),
        }
        positional += 1;
    }

    Ok(options)
}

fn run(options: &Options) -> Result<(), KernelError> {
    let mut kernel = Kernel::new();
    kernel.initialize_from_file(&options.config_path)?;

    kernel.start_generation()?;
    info!("Running for {} ms", options.run_ms);
    thread::sleep(Duration::from_millis(options.run_ms));
    kernel.stop_generation()?;

    let utilization = kernel.utilization()?;
    let listing = kernel.list_processes()?;
    let memory = kernel.memory_report()?;
    let vm_stats = kernel.vm_stats()?;
    let tick = kernel.tick()?;
    kernel.shutdown();

    if options.json {
        let report = serde_json::json!({
            "tick": tick,
            "utilization": utilization,
            "processes": listing,
            "memory": memory,
            "vm_stats": vm_stats,
        });

        if let Err(err) = serde_json::to_writer_pretty(stdout(), &report) {
            error!("Could not write report: {}", err);
        }
        println!();
    } else {
        println!("{}\n", utilization);
        println!("{}", listing);
        println!("{}", memory);
        println!("{}", vm_stats);
    }

    Ok(())
}

fn main() {
    Builder::from_env(Env::default().default_filter_or("warn"))
        .format_module_path(false)
        .init();

    let options = match parse_options() {
        Ok(options) => options,
        Err(err) => {
            eprintln!("{}", err);
            eprintln!("usage: desktop_console [config-path] [run-ms] [--json]");
            exit(2);
        }
    };

    if let Err(err) = run(&options) {
        eprintln!("error: {}", err);
        exit(1);
    }
}
