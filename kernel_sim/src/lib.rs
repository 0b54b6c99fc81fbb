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

mod clock;
mod core_slot;
mod engine;
mod error;
mod kernel;
mod process;
mod ready_queue;
mod reports;
mod scheduler_state;
mod sim_config;
mod util;

#[cfg(test)]
mod test;

pub mod modules;

pub use clock::Clock;
pub use core_slot::CoreSlot;
pub use engine::Simulator;
pub use error::{ConfigError, KernelError};
pub use kernel::Kernel;
pub use process::{Pid, Process, ProcessSpec};
pub use ready_queue::ReadyQueue;
pub use reports::{MemoryReport, ProcessListing, ProcessMemory, Utilization, VmStats};
pub use scheduler_state::SchedulerState;
pub use sim_config::{MemoryMode, SchedulingPolicy, SimConfig, MAX_EXECUTION_DELAY_TICKS};
