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
    sync::{
        atomic::{AtomicBool, Ordering},
        mpsc::{sync_channel, Receiver, SyncSender},
        Arc,
    },
    thread::{self, JoinHandle},
    time::Duration,
};

use log::{debug, info, warn};
use parking_lot::{Mutex, MutexGuard};
use static_assertions::assert_impl_all;

use crate::{
    modules::backing_store::{BackingStoreModule, LedgerBackingStore},
    Clock, KernelError, SchedulerState,
};

assert_impl_all!(SchedulerState: Send);
assert_impl_all!(Simulator: Send, Sync);

/// Runs a [`SchedulerState`] on real threads.
///
/// One driver thread advances the clock and dispatches, then hands the new
/// tick to one execution thread per core. Each of these steps locks the
/// whole state once.
pub struct Simulator<B: BackingStoreModule + Send + 'static = LedgerBackingStore> {
    state: Arc<Mutex<SchedulerState<B>>>,
    clock: Arc<Clock>,
    running: Arc<AtomicBool>,
    driver: Option<JoinHandle<()>>,
    cores: Vec<JoinHandle<()>>,
}

impl<B: BackingStoreModule + Send + 'static> Simulator<B> {
    /// Spawns the driver and all core threads
    pub fn start(state: SchedulerState<B>) -> Result<Self, KernelError> {
        let clock = state.clock().clone();
        let num_cores = state.config().num_cores;
        let tick_interval = Duration::from_millis(state.config().tick_interval_ms);

        let state = Arc::new(Mutex::new(state));
        let running = Arc::new(AtomicBool::new(true));

        let mut senders = Vec::with_capacity(num_cores);
        let mut cores = Vec::with_capacity(num_cores);
        for core in 0..num_cores {
            let (sender, receiver) = sync_channel::<u64>(1);
            senders.push(sender);

            let state = state.clone();
            let spawned = thread::Builder::new()
                .name(format!("core-{}", core))
                .spawn(move || run_core(core, receiver, state));

            match spawned {
                Ok(handle) => cores.push(handle),
                Err(err) => {
                    warn!("Could not spawn core {}: {}", core, err);
                    drop(senders);
                    join_cores(cores);
                    return Err(err.into());
                }
            }
        }

        let spawned = {
            let state = state.clone();
            let running = running.clone();
            thread::Builder::new()
                .name("clock-driver".to_string())
                .spawn(move || run_driver(tick_interval, senders, running, state))
        };

        // the senders were moved into the failed closure, so the cores are stopping
        let driver = match spawned {
            Ok(driver) => driver,
            Err(err) => {
                warn!("Could not spawn clock driver: {}", err);
                join_cores(cores);
                return Err(err.into());
            }
        };

        info!("Started simulator with {} cores", num_cores);

        Ok(Self {
            state,
            clock,
            running,
            driver: Some(driver),
            cores,
        })
    }

    /// Locks the simulation state.
    ///
    /// No tick is executed while the guard is alive.
    #[inline]
    pub fn state(&self) -> MutexGuard<'_, SchedulerState<B>> {
        self.state.lock()
    }

    /// Current tick, without taking the lock
    #[inline]
    pub fn tick(&self) -> u64 {
        self.clock.now()
    }

    #[inline]
    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::Acquire)
    }

    /// Stops all threads and waits for them to finish.
    ///
    /// The state stays readable afterwards.
    pub fn shutdown(&mut self) {
        self.running.store(false, Ordering::Release);

        let Some(driver) = self.driver.take() else {
            return;
        };

        if driver.join().is_err() {
            warn!("Clock driver panicked");
        }

        join_cores(self.cores.drain(..));

        info!("Stopped simulator at tick {}", self.clock.now());
    }
}

impl<B: BackingStoreModule + Send + 'static> Drop for Simulator<B> {
    fn drop(&mut self) {
        self.shutdown();
    }
}

/// Waits for core threads whose tick senders are already dropped
fn join_cores<I: IntoIterator<Item = JoinHandle<()>>>(cores: I) {
    for (core, handle) in cores.into_iter().enumerate() {
        if handle.join().is_err() {
            warn!("Core {} panicked", core);
        }
    }
}

fn run_driver<B: BackingStoreModule>(
    tick_interval: Duration,
    senders: Vec<SyncSender<u64>>,
    running: Arc<AtomicBool>,
    state: Arc<Mutex<SchedulerState<B>>>,
) {
    debug!("Clock driver started");

    while running.load(Ordering::Acquire) {
        if !tick_interval.is_zero() {
            thread::sleep(tick_interval);
        }

        let tick = state.lock().dispatch_tick();

        for sender in senders.iter() {
            if sender.send(tick).is_err() {
                warn!("Core thread stopped unexpectedly, stopping clock driver");
                return;
            }
        }
    }

    // dropping the senders stops the core threads
    debug!("Clock driver stopped");
}

fn run_core<B: BackingStoreModule>(
    core: usize,
    receiver: Receiver<u64>,
    state: Arc<Mutex<SchedulerState<B>>>,
) {
    debug!("Core {} started", core);

    for tick in receiver {
        state.lock().execute_core(core, tick);
    }

    debug!("Core {} stopped", core);
}

#[cfg(test)]
mod test {
    use std::{
        sync::{mpsc::sync_channel, Arc},
        thread,
    };

    use parking_lot::Mutex;

    use super::{join_cores, run_core};
    use crate::{
        test::{get_test_config, get_test_state},
        SchedulingPolicy,
    };

    #[test]
    fn test_cores_stop_once_senders_are_dropped() {
        let config = get_test_config(2, SchedulingPolicy::Fcfs, 1, 64, 16);
        let state = Arc::new(Mutex::new(get_test_state(config)));
        state.lock().create_process("a", Some(8), Some(5)).unwrap();
        let tick = state.lock().dispatch_tick();

        let mut senders = Vec::new();
        let mut cores = Vec::new();
        for core in 0..2 {
            let (sender, receiver) = sync_channel::<u64>(1);
            sender.send(tick).unwrap();
            senders.push(sender);

            let state = state.clone();
            cores.push(thread::spawn(move || run_core(core, receiver, state)));
        }

        drop(senders);
        join_cores(cores);

        // the pending tick is executed before the cores stop
        assert_eq!(Arc::strong_count(&state), 1);
        let state = state.lock();
        assert_eq!(state.process("a").unwrap().program_counter, 1);
        state.check_integrity();
    }
}
