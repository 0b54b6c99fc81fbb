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

mod fcfs;
mod round_robin;

use log::{debug, trace};

use super::{
    backing_store::BackingStoreModule,
    memory::{Admission, MemoryManager, MemoryModule},
};
use crate::{CoreSlot, ReadyQueue, SchedulingPolicy, SimConfig};

/// Everything a dispatch pass is allowed to touch
pub(crate) struct DispatchArguments<'a, B: BackingStoreModule> {
    pub(crate) ready_queue: &'a mut ReadyQueue,
    pub(crate) cores: &'a mut [CoreSlot],
    pub(crate) memory: &'a mut MemoryManager,
    pub(crate) store: &'a mut B,
}

/// What happened during one dispatch pass
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct DispatchOutcome {
    /// Processes that were put onto a core
    pub assigned: usize,

    /// Processes that could not be made resident and went back into the queue
    pub deferred: usize,

    /// Residents that used up their quantum and went back into the queue
    pub preempted: usize,
}

/// Decides which ready process runs on which core
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dispatcher {
    Fcfs,
    RoundRobin { quantum: u32 },
}

impl Dispatcher {
    pub fn new(config: &SimConfig) -> Self {
        match config.policy {
            SchedulingPolicy::Fcfs => Self::Fcfs,
            SchedulingPolicy::RoundRobin => Self::RoundRobin {
                quantum: config.quantum_length,
            },
        }
    }

    #[inline]
    pub fn is_preemptive(&self) -> bool {
        matches!(self, Self::RoundRobin { .. })
    }

    /// Fills all idle cores from the ready queue.
    ///
    /// Called once per tick.
    pub(crate) fn dispatch<B: BackingStoreModule>(
        &self,
        args: DispatchArguments<'_, B>,
    ) -> DispatchOutcome {
        match self {
            Self::Fcfs => fcfs::dispatch(args),
            Self::RoundRobin { quantum } => round_robin::dispatch(*quantum, args),
        }
    }
}

/// Pops the head of the ready queue and tries to put it onto `core`.
///
/// If the process cannot be made resident, it is pushed back to the tail of
/// the queue and the core stays idle.
fn fill_core<B: BackingStoreModule>(
    core: usize,
    quantum: u32,
    args: &mut DispatchArguments<'_, B>,
    outcome: &mut DispatchOutcome,
) {
    let Some(mut process) = args.ready_queue.pop_front() else {
        return;
    };

    match args.memory.admit(&process, args.store) {
        Admission::Admitted => {
            debug!("Dispatch pid {} onto core {}", process.pid, core);

            process.assigned_core = Some(core);
            process.dispatch_count += 1;
            args.cores[core].assign(process, quantum);
            outcome.assigned += 1;
        }
        Admission::Deferred => {
            trace!("Deferred pid {}: not enough memory", process.pid);

            args.ready_queue.push_back(process);
            outcome.deferred += 1;
        }
    }
}
