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

use std::{
    thread,
    time::{Duration, Instant},
};

use super::{get_test_config, get_test_state, init_test_logging};
use crate::{ConfigError, Kernel, KernelError, SchedulingPolicy, Simulator};

const TIMEOUT: Duration = Duration::from_secs(10);

/// Polls `condition` until it holds or the timeout is reached
fn wait_for<F: FnMut() -> bool>(mut condition: F) -> bool {
    let start = Instant::now();
    while start.elapsed() < TIMEOUT {
        if condition() {
            return true;
        }
        thread::sleep(Duration::from_millis(1));
    }
    false
}

#[test]
fn test_kernel_not_initialized() {
    let kernel = Kernel::new();
    assert!(!kernel.is_initialized());

    assert!(matches!(
        kernel.create_process("p1", None, None),
        Err(KernelError::NotInitialized)
    ));
    assert!(matches!(kernel.list_processes(), Err(KernelError::NotInitialized)));
    assert!(matches!(kernel.utilization(), Err(KernelError::NotInitialized)));
    assert!(matches!(kernel.memory_report(), Err(KernelError::NotInitialized)));
    assert!(matches!(kernel.vm_stats(), Err(KernelError::NotInitialized)));
    assert!(matches!(kernel.start_generation(), Err(KernelError::NotInitialized)));
    assert!(matches!(kernel.stop_generation(), Err(KernelError::NotInitialized)));
    assert!(matches!(kernel.process("p1"), Err(KernelError::NotInitialized)));
    assert!(matches!(kernel.tick(), Err(KernelError::NotInitialized)));
}

#[test]
fn test_kernel_rejects_invalid_config() {
    let mut kernel = Kernel::new();
    let mut config = get_test_config(1, SchedulingPolicy::RoundRobin, 0, 64, 64);
    config.quantum_length = 0;

    assert!(matches!(
        kernel.initialize(config),
        Err(KernelError::Config(ConfigError::Invalid(_)))
    ));
    assert!(!kernel.is_initialized());
}

#[test]
fn test_kernel_runs_processes() {
    init_test_logging();

    let mut kernel = Kernel::new();
    let mut config = get_test_config(2, SchedulingPolicy::RoundRobin, 2, 64, 64);
    config.tick_interval_ms = 1;
    kernel.initialize(config).unwrap();

    kernel.create_process("a", Some(8), Some(5)).unwrap();
    kernel.create_process("b", Some(8), Some(7)).unwrap();
    assert!(matches!(
        kernel.create_process("a", None, None),
        Err(KernelError::DuplicateProcessName(_))
    ));

    assert!(wait_for(|| kernel.list_processes().unwrap().finished.len() == 2));
    assert!(kernel.tick().unwrap() >= 7);

    let listing = kernel.list_processes().unwrap();
    assert!(listing.running.is_empty());
    assert!(listing.finished.iter().all(|process| process.is_finished()));
    assert_eq!(kernel.memory_report().unwrap().used, 0);

    kernel.shutdown();
    assert!(!kernel.is_initialized());
    assert!(matches!(kernel.vm_stats(), Err(KernelError::NotInitialized)));
}

#[test]
fn test_kernel_generates_processes() {
    let mut kernel = Kernel::new();
    let mut config = get_test_config(2, SchedulingPolicy::Fcfs, 1, 64, 16);
    config.tick_interval_ms = 1;
    config.generation_interval_ticks = 1;
    config.min_instructions = 1;
    config.max_instructions = 3;
    config.min_process_memory = 4;
    config.max_process_memory = 16;
    kernel.initialize(config).unwrap();

    assert!(kernel.start_generation().unwrap());
    assert!(wait_for(|| kernel.list_processes().unwrap().finished.len() >= 5));
    assert!(kernel.stop_generation().unwrap());

    assert!(kernel.process("p1").unwrap().is_some());
    assert!(kernel.vm_stats().unwrap().active_ticks > 0);
}

#[test]
fn test_simulator_threads() {
    let mut config = get_test_config(3, SchedulingPolicy::RoundRobin, 3, 64, 16);
    config.tick_interval_ms = 0;

    let mut state = get_test_state(config);
    for i in 0..6 {
        state
            .create_process(&format!("p{}", i), Some(8), Some(20 + i))
            .unwrap();
    }

    let mut simulator = Simulator::start(state).unwrap();
    assert!(simulator.is_running());
    assert!(wait_for(|| simulator.state().list_processes().finished.len() == 6));

    simulator.shutdown();
    assert!(!simulator.is_running());

    // shutting down twice is fine
    simulator.shutdown();

    let tick = simulator.tick();
    thread::sleep(Duration::from_millis(5));
    assert_eq!(simulator.tick(), tick);

    let state = simulator.state();
    state.check_integrity();
    for process in state.list_processes().finished.iter() {
        assert_eq!(process.program_counter, process.instruction_count);
    }
}
