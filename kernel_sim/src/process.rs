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

use std::time::SystemTime;

#[cfg(feature = "serde")]
use serde::Serialize;

pub type Pid = u32;

/// Size and length of a process that should be created
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProcessSpec {
    pub instruction_count: u64,
    pub memory_size: usize,
}

/// A synthetic process.
///
/// A process record is owned by exactly one container at a time: the ready queue,
/// a core slot or the finished registry. It is never dropped once created.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize))]
pub struct Process {
    pub pid: Pid,
    pub name: String,

    /// Instructions executed so far.
    ///
    /// Following is always true: `program_counter <= instruction_count`
    pub program_counter: u64,
    pub instruction_count: u64,

    /// Memory demand in bytes
    pub memory_size: usize,

    /// Frames needed in paged mode, `0` in flat mode
    pub page_count: usize,

    pub created_at: SystemTime,
    pub arrival_tick: u64,

    /// Core that executed this process most recently
    pub assigned_core: Option<usize>,
    pub finished_at_tick: Option<u64>,

    /// How often this process was put onto a core
    pub dispatch_count: u32,
}

impl Process {
    pub(crate) fn new(
        pid: Pid,
        name: String,
        spec: ProcessSpec,
        page_count: usize,
        arrival_tick: u64,
    ) -> Self {
        debug_assert!(spec.instruction_count > 0);
        debug_assert!(spec.memory_size > 0);

        Self {
            pid,
            name,
            program_counter: 0,
            instruction_count: spec.instruction_count,
            memory_size: spec.memory_size,
            page_count,
            created_at: SystemTime::now(),
            arrival_tick,
            assigned_core: None,
            finished_at_tick: None,
            dispatch_count: 0,
        }
    }

    #[inline]
    pub fn is_finished(&self) -> bool {
        self.program_counter == self.instruction_count
    }

    #[inline]
    pub fn remaining_instructions(&self) -> u64 {
        self.instruction_count - self.program_counter
    }

    /// Executes up to `units` instructions and returns how many were executed
    pub(crate) fn advance(&mut self, units: u64) -> u64 {
        let executed = units.min(self.remaining_instructions());
        self.program_counter += executed;

        debug_assert!(self.program_counter <= self.instruction_count);
        executed
    }
}
