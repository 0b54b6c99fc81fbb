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

use log::trace;

use super::{fill_core, DispatchArguments, DispatchOutcome};
use crate::modules::{backing_store::BackingStoreModule, memory::MemoryModule};

pub(super) fn dispatch<B: BackingStoreModule>(
    quantum: u32,
    mut args: DispatchArguments<'_, B>,
) -> DispatchOutcome {
    let mut outcome = DispatchOutcome::default();

    for core in 0..args.cores.len() {
        if !args.cores[core].is_idle() {
            continue;
        }

        // quantum expired: move the resident back to the tail of the queue
        if let Some(process) = args.cores[core].take() {
            debug_assert!(!process.is_finished());
            trace!("Preempt pid {} on core {}", process.pid, core);

            args.memory.deactivate(process.pid);
            args.ready_queue.push_back(process);
            outcome.preempted += 1;
        }

        fill_core(core, quantum, &mut args, &mut outcome);
    }

    outcome
}
