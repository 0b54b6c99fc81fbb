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

use std::path::Path;

use log::info;

use crate::{
    KernelError, MemoryReport, Process, ProcessListing, SchedulerState, SimConfig, Simulator,
    Utilization, VmStats,
};

/// Operations offered to a console or command line.
///
/// Every operation returns [`KernelError::NotInitialized`] until
/// [`Kernel::initialize`] succeeded.
#[derive(Default)]
pub struct Kernel {
    simulator: Option<Simulator>,
}

impl Kernel {
    pub fn new() -> Self {
        Self { simulator: None }
    }

    /// Starts a new simulation. A running simulation is stopped first.
    pub fn initialize(&mut self, config: SimConfig) -> Result<(), KernelError> {
        let state = SchedulerState::new(config)?;
        self.shutdown();

        self.simulator = Some(Simulator::start(state)?);
        info!("Kernel initialized");
        Ok(())
    }

    pub fn initialize_from_file<P: AsRef<Path>>(&mut self, path: P) -> Result<(), KernelError> {
        let config = SimConfig::load(path)?;
        self.initialize(config)
    }

    #[inline]
    pub fn is_initialized(&self) -> bool {
        self.simulator.is_some()
    }

    fn simulator(&self) -> Result<&Simulator, KernelError> {
        self.simulator.as_ref().ok_or(KernelError::NotInitialized)
    }

    pub fn create_process(
        &self,
        name: &str,
        memory_size: Option<usize>,
        instruction_count: Option<u64>,
    ) -> Result<Process, KernelError> {
        self.simulator()?
            .state()
            .create_process(name, memory_size, instruction_count)
    }

    pub fn process(&self, name: &str) -> Result<Option<Process>, KernelError> {
        Ok(self.simulator()?.state().process(name))
    }

    pub fn list_processes(&self) -> Result<ProcessListing, KernelError> {
        Ok(self.simulator()?.state().list_processes())
    }

    pub fn utilization(&self) -> Result<Utilization, KernelError> {
        Ok(self.simulator()?.state().utilization())
    }

    pub fn memory_report(&self) -> Result<MemoryReport, KernelError> {
        Ok(self.simulator()?.state().memory_report())
    }

    pub fn vm_stats(&self) -> Result<VmStats, KernelError> {
        Ok(self.simulator()?.state().vm_stats())
    }

    pub fn start_generation(&self) -> Result<bool, KernelError> {
        Ok(self.simulator()?.state().start_generation())
    }

    pub fn stop_generation(&self) -> Result<bool, KernelError> {
        Ok(self.simulator()?.state().stop_generation())
    }

    pub fn ready_queue_len(&self) -> Result<usize, KernelError> {
        Ok(self.simulator()?.state().ready_queue_len())
    }

    pub fn tick(&self) -> Result<u64, KernelError> {
        Ok(self.simulator()?.tick())
    }

    /// Stops the simulation threads, the kernel is uninitialized afterwards
    pub fn shutdown(&mut self) {
        if let Some(mut simulator) = self.simulator.take() {
            simulator.shutdown();
        }
    }
}
