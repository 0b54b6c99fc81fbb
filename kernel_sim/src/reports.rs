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

use std::fmt::{self, Display, Formatter};

#[cfg(feature = "serde")]
use serde::Serialize;

use crate::{Pid, Process};

const SEPARATOR: &str = "--------------------------------------";

/// Snapshot of all processes
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize))]
pub struct ProcessListing {
    /// Processes that are currently resident on a core, ordered by core
    pub running: Vec<Process>,

    /// Processes that wait in the ready queue, in queue order
    pub waiting: Vec<Process>,

    /// Processes that finished, ordered by pid
    pub finished: Vec<Process>,
}

#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize))]
pub struct Utilization {
    pub cores_used: usize,
    pub cores_available: usize,
    pub percent: f64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize))]
pub struct ProcessMemory {
    pub pid: Pid,
    pub name: String,
    pub bytes: usize,
}

#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize))]
pub struct MemoryReport {
    pub used: usize,
    pub total: usize,
    pub percent: f64,

    /// Memory owned per process (resident or not), ordered by pid
    pub per_process: Vec<ProcessMemory>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize))]
pub struct VmStats {
    /// Core ticks without a resident process
    pub idle_ticks: u64,

    /// Core ticks with a resident process
    pub active_ticks: u64,
    pub total_ticks: u64,
    pub paged_in_count: u64,
    pub paged_out_count: u64,
}

fn write_process_line(f: &mut Formatter<'_>, process: &Process) -> fmt::Result {
    let stamp = match process.finished_at_tick {
        Some(tick) => tick,
        None => process.arrival_tick,
    };

    write!(f, "{}\t(tick {})\t", process.name, stamp)?;
    match process.assigned_core {
        Some(core) => write!(f, "Core: {}", core)?,
        None => write!(f, "Core: -")?,
    }
    writeln!(
        f,
        "\t\t{} / {}",
        process.program_counter, process.instruction_count
    )
}

impl Display for Utilization {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        writeln!(f, "CPU utilization: {:.2}%", self.percent)?;
        writeln!(f, "Cores used: {}", self.cores_used)?;
        write!(f, "Cores available: {}", self.cores_available)
    }
}

impl Display for ProcessListing {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        writeln!(f, "{}", SEPARATOR)?;

        writeln!(f, "Running processes: ")?;
        for process in self.running.iter() {
            write_process_line(f, process)?;
        }

        if !self.waiting.is_empty() {
            writeln!(f, "\nWaiting processes: {}", self.waiting.len())?;
        }

        writeln!(f, "\nFinished processes: ")?;
        for process in self.finished.iter() {
            write_process_line(f, process)?;
        }

        writeln!(f, "\n{}", SEPARATOR)
    }
}

impl Display for MemoryReport {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        writeln!(f, "Memory usage: {} / {}", self.used, self.total)?;
        writeln!(f, "Memory utilization: {:.2}%", self.percent)?;
        writeln!(f, "{}", SEPARATOR)?;

        writeln!(f, "Processes and memory usage: ")?;
        for entry in self.per_process.iter() {
            writeln!(f, "{}\t{}", entry.name, entry.bytes)?;
        }

        writeln!(f, "{}", SEPARATOR)
    }
}

impl Display for VmStats {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        writeln!(f, "Idle cpu ticks: {}", self.idle_ticks)?;
        writeln!(f, "Active cpu ticks: {}", self.active_ticks)?;
        writeln!(f, "Total cpu ticks: {}", self.total_ticks)?;
        writeln!(f, "Num paged in: {}", self.paged_in_count)?;
        write!(f, "Num paged out: {}", self.paged_out_count)
    }
}
