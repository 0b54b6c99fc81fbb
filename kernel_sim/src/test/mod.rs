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

use crate::{
    modules::{backing_store::LedgerBackingStore, generator::test::FixedProcessGenerator},
    ProcessSpec, SchedulerState, SchedulingPolicy, SimConfig,
};

mod kernel;
mod policies;

/// Enables log output for a test, e.g. with `RUST_LOG=trace`
pub(crate) fn init_test_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

pub(crate) fn get_test_config(
    num_cores: usize,
    policy: SchedulingPolicy,
    quantum_length: u32,
    total_memory: usize,
    frame_size: usize,
) -> SimConfig {
    SimConfig {
        num_cores,
        policy,
        quantum_length,
        generation_interval_ticks: 0,
        min_instructions: 10,
        max_instructions: 10,
        execution_delay_ticks: 0,
        total_memory,
        frame_size,
        min_process_memory: frame_size.min(4),
        max_process_memory: frame_size.min(4),
        tick_interval_ms: 0,
        batched_advance: false,
        seed: Some(0),
    }
}

/// Creates a scheduler whose generated processes all have 10 instructions and 4 bytes
pub(crate) fn get_test_state(config: SimConfig) -> SchedulerState<LedgerBackingStore> {
    init_test_logging();

    SchedulerState::with_modules(
        config,
        LedgerBackingStore::new(),
        Box::new(FixedProcessGenerator(ProcessSpec {
            instruction_count: 10,
            memory_size: 4,
        })),
    )
    .unwrap()
}

/// Steps until no process is left to execute and returns the last tick
pub(crate) fn run_until_done(state: &mut SchedulerState, max_ticks: u64) -> u64 {
    loop {
        let tick = state.step();
        state.check_integrity();

        let listing = state.list_processes();
        if listing.running.is_empty() && listing.waiting.is_empty() {
            return tick;
        }

        assert!(tick < max_ticks, "processes did not finish after {} ticks", max_ticks);
    }
}
