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

use crate::Process;

/// State of one simulated core.
///
/// `remaining_quantum == 0` means that the slot is idle or that its resident
/// used up its quantum and waits for the dispatcher to preempt it.
#[derive(Debug, Default)]
pub struct CoreSlot {
    pub(crate) resident: Option<Process>,
    pub(crate) remaining_quantum: u32,

    /// Execution slots this core consumed so far, used to throttle execution
    pub(crate) executed_slots: u64,
}

impl CoreSlot {
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    pub fn resident(&self) -> Option<&Process> {
        self.resident.as_ref()
    }

    #[inline]
    pub fn remaining_quantum(&self) -> u32 {
        self.remaining_quantum
    }

    /// Returns `true` if the dispatcher may put a (new) process onto this core
    #[inline]
    pub fn is_idle(&self) -> bool {
        self.remaining_quantum == 0
    }

    /// Returns `true` if the resident will be executed on the next execution slot
    #[inline]
    pub fn is_running(&self) -> bool {
        self.resident.is_some() && self.remaining_quantum > 0
    }

    pub(crate) fn assign(&mut self, process: Process, quantum: u32) {
        debug_assert!(self.resident.is_none(), "core slot is still occupied");
        debug_assert!(quantum > 0);

        self.resident = Some(process);
        self.remaining_quantum = quantum;
    }

    /// Removes the resident from this slot
    pub(crate) fn take(&mut self) -> Option<Process> {
        self.remaining_quantum = 0;
        self.resident.take()
    }
}
