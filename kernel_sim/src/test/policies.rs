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

use std::collections::HashMap;

use super::{get_test_config, get_test_state, run_until_done};
use crate::{SchedulerState, SchedulingPolicy};

#[test]
fn test_round_robin_fairness() {
    const QUANTUM: u32 = 2;
    const ROUNDS: u64 = 2;
    const PROCESSES: u64 = 3;

    let mut state = get_test_state(get_test_config(
        1,
        SchedulingPolicy::RoundRobin,
        QUANTUM,
        64,
        64,
    ));
    for i in 0..PROCESSES {
        state
            .create_process(&format!("p{}", i), Some(8), Some(QUANTUM as u64 * ROUNDS))
            .unwrap();
    }

    let last_tick = run_until_done(&mut state, 100);
    assert_eq!(last_tick, PROCESSES * ROUNDS * QUANTUM as u64);

    let listing = state.list_processes();
    assert_eq!(listing.finished.len(), PROCESSES as usize);
    for process in listing.finished.iter() {
        assert_eq!(process.dispatch_count as u64, ROUNDS);
    }

    // processes take turns, so they finish in creation order
    let finish_ticks: Vec<_> = listing
        .finished
        .iter()
        .map(|process| process.finished_at_tick.unwrap())
        .collect();
    assert_eq!(finish_ticks, vec![8, 10, 12]);
}

#[test]
fn test_fcfs_runs_without_preemption() {
    let mut state = get_test_state(get_test_config(1, SchedulingPolicy::Fcfs, 1, 64, 64));
    state.create_process("a", Some(8), Some(5)).unwrap();
    state.create_process("b", Some(8), Some(5)).unwrap();

    for tick in 1..=5 {
        state.step();
        let a = state.process("a").unwrap();
        assert_eq!(a.program_counter, tick);
        assert_eq!(a.dispatch_count, 1);
        assert_eq!(state.process("b").unwrap().program_counter, 0);
    }

    let last_tick = run_until_done(&mut state, 100);
    assert_eq!(last_tick, 10);

    let b = state.process("b").unwrap();
    assert_eq!(b.finished_at_tick, Some(10));
    assert_eq!(b.dispatch_count, 1);
}

#[test]
fn test_execution_delay_throttles_cores() {
    let mut config = get_test_config(1, SchedulingPolicy::Fcfs, 1, 64, 64);
    config.execution_delay_ticks = 2;

    let mut state = get_test_state(config);
    state.create_process("a", Some(8), Some(3)).unwrap();

    let mut executed_at = Vec::new();
    let mut last_pc = 0;
    while !state.process("a").unwrap().is_finished() {
        let tick = state.step();
        let pc = state.process("a").unwrap().program_counter;
        if pc != last_pc {
            executed_at.push(tick);
            last_pc = pc;
        }
        assert!(tick < 100);
    }

    assert_eq!(executed_at, vec![1, 4, 7]);
}

#[test]
fn test_batched_advance_executes_whole_quantum() {
    let mut config = get_test_config(1, SchedulingPolicy::RoundRobin, 3, 64, 64);
    config.batched_advance = true;

    let mut state = get_test_state(config);
    state.create_process("a", Some(8), Some(7)).unwrap();

    state.step();
    assert_eq!(state.process("a").unwrap().program_counter, 3);
    state.step();
    assert_eq!(state.process("a").unwrap().program_counter, 6);
    state.step();

    let a = state.process("a").unwrap();
    assert!(a.is_finished());
    assert_eq!(a.finished_at_tick, Some(3));
    assert_eq!(a.dispatch_count, 3);
}

#[test]
fn test_batched_advance_is_ignored_by_fcfs() {
    let mut config = get_test_config(1, SchedulingPolicy::Fcfs, 3, 64, 64);
    config.batched_advance = true;

    let mut state = get_test_state(config);
    state.create_process("a", Some(8), Some(7)).unwrap();

    state.step();
    assert_eq!(state.process("a").unwrap().program_counter, 1);
}

/// Runs a random workload and checks the invariants after every tick
fn run_random_workload(state: &mut SchedulerState, ticks: u64) {
    let mut last_pc: HashMap<String, u64> = HashMap::new();
    assert!(state.start_generation());

    for _ in 0..ticks {
        state.step();
        state.check_integrity();

        let listing = state.list_processes();
        for process in listing
            .running
            .iter()
            .chain(listing.waiting.iter())
            .chain(listing.finished.iter())
        {
            let prev = last_pc.insert(process.name.clone(), process.program_counter);
            assert!(prev.unwrap_or(0) <= process.program_counter);
        }
    }

    state.stop_generation();
    run_until_done(state, ticks * 100);
}

#[test]
fn test_random_workload_flat() {
    let mut config = get_test_config(4, SchedulingPolicy::RoundRobin, 5, 1024, 1024);
    config.generation_interval_ticks = 3;
    config.min_instructions = 5;
    config.max_instructions = 40;
    config.min_process_memory = 64;
    config.max_process_memory = 512;

    let mut state = SchedulerState::new(config).unwrap();
    run_random_workload(&mut state, 300);

    let stats = state.vm_stats();
    assert_eq!(stats.total_ticks, stats.idle_ticks + stats.active_ticks);
    assert_eq!(state.memory_report().used, 0);
}

#[test]
fn test_random_workload_paged() {
    let mut config = get_test_config(2, SchedulingPolicy::RoundRobin, 4, 256, 16);
    config.generation_interval_ticks = 2;
    config.min_instructions = 5;
    config.max_instructions = 30;
    config.min_process_memory = 16;
    config.max_process_memory = 128;

    let mut state = SchedulerState::new(config).unwrap();
    run_random_workload(&mut state, 300);

    let stats = state.vm_stats();
    assert!(stats.paged_in_count > 0);
    assert_eq!(state.memory_report().used, 0);
}

#[test]
fn test_random_workload_fcfs_delay() {
    let mut config = get_test_config(3, SchedulingPolicy::Fcfs, 1, 512, 32);
    config.generation_interval_ticks = 4;
    config.execution_delay_ticks = 1;
    config.min_instructions = 3;
    config.max_instructions = 12;
    config.min_process_memory = 32;
    config.max_process_memory = 256;

    let mut state = SchedulerState::new(config).unwrap();
    run_random_workload(&mut state, 200);
    assert_eq!(state.memory_report().used, 0);
}
