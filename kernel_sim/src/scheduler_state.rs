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
    collections::{BTreeMap, HashMap},
    sync::Arc,
};

use log::{debug, info, trace, warn};

use crate::{
    modules::{
        backing_store::{BackingStoreModule, LedgerBackingStore},
        dispatch::{DispatchArguments, DispatchOutcome, Dispatcher},
        generator::{ProcessGenerator, RandomProcessGenerator},
        memory::{MemoryManager, MemoryModule},
    },
    util::{ceil_div, percent},
    Clock, ConfigError, CoreSlot, KernelError, MemoryReport, Pid, Process, ProcessListing,
    ProcessMemory, ProcessSpec, ReadyQueue, SimConfig, Utilization, VmStats,
};

/// All mutable state of a simulation.
///
/// Every process is owned by exactly one of `ready_queue`, `cores` or `finished`.
/// In the threaded [`Simulator`](crate::Simulator) this lives behind a single
/// mutex, so every method here is one critical section.
pub struct SchedulerState<B: BackingStoreModule = LedgerBackingStore> {
    config: SimConfig,
    clock: Arc<Clock>,
    dispatcher: Dispatcher,

    ready_queue: ReadyQueue,
    cores: Vec<CoreSlot>,
    finished: BTreeMap<Pid, Process>,

    /// Name of every process ever created, indexed by pid
    pid_names: Vec<String>,
    names: HashMap<String, Pid>,

    generator: Box<dyn ProcessGenerator + Send>,
    generating: bool,

    /// Suffix of the last generated `p<n>` name
    name_counter: u64,

    memory: MemoryManager,
    backing_store: B,

    idle_ticks: u64,
    active_ticks: u64,
}

impl SchedulerState<LedgerBackingStore> {
    /// Creates a new simulation with an in-memory backing store and random process generation
    pub fn new(config: SimConfig) -> Result<Self, ConfigError> {
        let generator = Box::new(RandomProcessGenerator::new(&config));
        Self::with_modules(config, LedgerBackingStore::new(), generator)
    }
}

impl<B: BackingStoreModule> SchedulerState<B> {
    pub fn with_modules(
        config: SimConfig,
        backing_store: B,
        generator: Box<dyn ProcessGenerator + Send>,
    ) -> Result<Self, ConfigError> {
        config.validate()?;

        info!(
            "Initialize scheduler: {} cores, {:?}, memory mode {:?}",
            config.num_cores,
            config.policy,
            config.memory_mode()
        );

        Ok(Self {
            dispatcher: Dispatcher::new(&config),
            clock: Arc::new(Clock::new()),
            ready_queue: ReadyQueue::new(),
            cores: (0..config.num_cores).map(|_| CoreSlot::new()).collect(),
            finished: BTreeMap::new(),
            pid_names: Vec::new(),
            names: HashMap::new(),
            generator,
            generating: false,
            name_counter: 0,
            memory: MemoryManager::new(&config),
            backing_store,
            idle_ticks: 0,
            active_ticks: 0,
            config,
        })
    }

    #[inline]
    pub fn config(&self) -> &SimConfig {
        &self.config
    }

    #[inline]
    pub fn clock(&self) -> &Arc<Clock> {
        &self.clock
    }

    #[inline]
    pub fn tick(&self) -> u64 {
        self.clock.now()
    }

    #[inline]
    pub fn cores(&self) -> &[CoreSlot] {
        &self.cores
    }

    #[inline]
    pub fn memory(&self) -> &MemoryManager {
        &self.memory
    }

    #[inline]
    pub fn backing_store(&self) -> &B {
        &self.backing_store
    }

    #[inline]
    pub fn ready_queue_len(&self) -> usize {
        self.ready_queue.len()
    }

    #[inline]
    pub fn is_generating(&self) -> bool {
        self.generating
    }

    /// Advances the clock by one tick and fills idle cores.
    ///
    /// Returns the new tick, which is then handed to every core.
    pub fn dispatch_tick(&mut self) -> u64 {
        let tick = self.clock.advance();
        self.memory.age();

        let outcome = self.dispatcher.dispatch(DispatchArguments {
            ready_queue: &mut self.ready_queue,
            cores: &mut self.cores,
            memory: &mut self.memory,
            store: &mut self.backing_store,
        });

        if outcome != DispatchOutcome::default() {
            trace!("Tick {}: {:?}", tick, outcome);
        }

        let interval = self.config.generation_interval_ticks;
        if self.generating && interval != 0 && tick % interval == 0 {
            self.generate_process();
        }

        tick
    }

    /// Executes one slot of `core` if it is not behind its throttle for `tick`
    pub fn execute_core(&mut self, core: usize, tick: u64) {
        let preemptive = self.dispatcher.is_preemptive();
        let batched = self.config.batched_advance;
        let expected = ceil_div(tick, self.config.execution_delay_ticks.saturating_add(1));

        let Some(slot) = self.cores.get_mut(core) else {
            debug_assert!(false, "core {} does not exist", core);
            return;
        };

        if slot.resident.is_some() {
            self.active_ticks += 1;
        } else {
            self.idle_ticks += 1;
        }

        if slot.executed_slots >= expected {
            return;
        }
        slot.executed_slots += 1;

        if !slot.is_running() {
            return;
        }

        let Some(process) = slot.resident.as_mut() else {
            return;
        };

        let units = if preemptive && batched {
            (slot.remaining_quantum as u64).min(process.remaining_instructions())
        } else {
            1
        };

        let executed = process.advance(units);
        if preemptive {
            slot.remaining_quantum = slot.remaining_quantum.saturating_sub(executed as u32);
        }

        if !process.is_finished() {
            return;
        }

        if let Some(mut process) = slot.take() {
            self.memory.release(process.pid, &mut self.backing_store);
            process.finished_at_tick = Some(tick);

            debug!(
                "Process {} (pid {}) finished on core {} at tick {}",
                process.name, process.pid, core, tick
            );
            self.finished.insert(process.pid, process);
        }
    }

    /// Runs one full tick on the calling thread: dispatch, then every core in order
    pub fn step(&mut self) -> u64 {
        let tick = self.dispatch_tick();
        for core in 0..self.cores.len() {
            self.execute_core(core, tick);
        }
        tick
    }

    /// Creates a new process and appends it to the ready queue.
    ///
    /// Missing sizes are taken from the process generator.
    pub fn create_process(
        &mut self,
        name: &str,
        memory_size: Option<usize>,
        instruction_count: Option<u64>,
    ) -> Result<Process, KernelError> {
        if self.names.contains_key(name) {
            return Err(KernelError::DuplicateProcessName(name.to_string()));
        }

        let spec = match (memory_size, instruction_count) {
            (Some(memory_size), Some(instruction_count)) => ProcessSpec {
                instruction_count,
                memory_size,
            },
            _ => {
                let generated = self.generator.next_spec(&self.config);
                ProcessSpec {
                    instruction_count: instruction_count.unwrap_or(generated.instruction_count),
                    memory_size: memory_size.unwrap_or(generated.memory_size),
                }
            }
        };

        if spec.instruction_count == 0 {
            return Err(KernelError::InvalidProcessSpec {
                name: name.to_string(),
                reason: "instruction count has to be greater than 0",
            });
        }
        if spec.memory_size == 0 {
            return Err(KernelError::InvalidProcessSpec {
                name: name.to_string(),
                reason: "memory size has to be greater than 0",
            });
        }
        if !self.memory.can_hold(spec.memory_size) {
            return Err(KernelError::ProcessTooLarge {
                name: name.to_string(),
                memory_size: spec.memory_size,
                capacity: self.memory.total_size(),
            });
        }

        let pid = self.pid_names.len() as Pid;
        let page_count = self.memory.page_count_for(spec.memory_size);
        let process = Process::new(pid, name.to_string(), spec, page_count, self.clock.now());

        self.pid_names.push(process.name.clone());
        self.names.insert(process.name.clone(), pid);
        self.ready_queue.push_back(process.clone());

        debug!(
            "Created process {} (pid {}): {} instructions, {} bytes",
            process.name, pid, process.instruction_count, process.memory_size
        );
        Ok(process)
    }

    fn generate_process(&mut self) {
        let name = loop {
            self.name_counter += 1;
            let name = format!("p{}", self.name_counter);
            if !self.names.contains_key(&name) {
                break name;
            }
        };

        if let Err(err) = self.create_process(&name, None, None) {
            warn!("Could not generate process {}: {}", name, err);
        }
    }

    /// Enables batch generation, returns `false` if it was already enabled
    pub fn start_generation(&mut self) -> bool {
        if self.generating {
            return false;
        }

        info!("Start process generation");
        self.generating = true;
        true
    }

    /// Disables batch generation, returns `false` if it was already disabled
    pub fn stop_generation(&mut self) -> bool {
        if !self.generating {
            return false;
        }

        info!("Stop process generation");
        self.generating = false;
        true
    }

    /// Looks up a process by name wherever it currently is
    pub fn process(&self, name: &str) -> Option<Process> {
        let pid = *self.names.get(name)?;

        if let Some(process) = self.finished.get(&pid) {
            return Some(process.clone());
        }

        self.cores
            .iter()
            .filter_map(CoreSlot::resident)
            .chain(self.ready_queue.iter())
            .find(|process| process.pid == pid)
            .cloned()
    }

    pub fn list_processes(&self) -> ProcessListing {
        ProcessListing {
            running: self
                .cores
                .iter()
                .filter_map(CoreSlot::resident)
                .cloned()
                .collect(),
            waiting: self.ready_queue.iter().cloned().collect(),
            finished: self.finished.values().cloned().collect(),
        }
    }

    pub fn utilization(&self) -> Utilization {
        let cores_used = self
            .cores
            .iter()
            .filter(|slot| slot.resident().is_some())
            .count();

        Utilization {
            cores_used,
            cores_available: self.cores.len() - cores_used,
            percent: percent(cores_used, self.cores.len()),
        }
    }

    pub fn memory_report(&self) -> MemoryReport {
        let used = self.memory.used_size();
        let total = self.memory.total_size();

        let per_process = self
            .memory
            .usage_by_process()
            .into_iter()
            .map(|(pid, bytes)| ProcessMemory {
                pid,
                name: self
                    .pid_names
                    .get(pid as usize)
                    .cloned()
                    .unwrap_or_default(),
                bytes,
            })
            .collect();

        MemoryReport {
            used,
            total,
            percent: percent(used, total),
            per_process,
        }
    }

    pub fn vm_stats(&self) -> VmStats {
        let paging = self.memory.paging_stats();

        VmStats {
            idle_ticks: self.idle_ticks,
            active_ticks: self.active_ticks,
            total_ticks: self.idle_ticks + self.active_ticks,
            paged_in_count: paging.paged_in,
            paged_out_count: paging.paged_out,
        }
    }

    /// Checks that every process lives in exactly one place and that the memory module is consistent
    pub fn check_integrity(&self) {
        let mut seen = vec![false; self.pid_names.len()];
        let residents = self.cores.iter().filter_map(CoreSlot::resident);

        for process in residents
            .chain(self.ready_queue.iter())
            .chain(self.finished.values())
        {
            let entry = &mut seen[process.pid as usize];
            assert!(!*entry, "pid {} is stored twice", process.pid);
            *entry = true;

            assert!(process.program_counter <= process.instruction_count);
        }

        assert!(seen.iter().all(|seen| *seen), "a process got lost");

        for process in self.finished.values() {
            assert!(process.is_finished());
        }

        self.memory.check_integrity();
    }
}
