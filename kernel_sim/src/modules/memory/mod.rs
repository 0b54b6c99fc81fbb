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

mod flat;
mod paged;

pub use flat::{FlatAllocatorModule, FreeBlock, TakenBlock};
pub use paged::{Frame, PagedAllocatorModule};

use super::backing_store::BackingStoreModule;
use crate::{MemoryMode, Pid, Process, SimConfig};

/// Result of a residency request.
///
/// `Deferred` is the normal backpressure signal: the caller puts the process
/// back into the ready queue and tries again on a later tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Admission {
    Admitted,
    Deferred,
}

/// Counters for data moved between memory and the backing store
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct PagingStats {
    /// Frames (or blocks in flat mode) that were loaded into memory
    pub paged_in: u64,

    /// Frames (or blocks in flat mode) that were evicted to the backing store
    pub paged_out: u64,
}

pub trait MemoryModule {
    /// Makes `process` resident and marks its memory as used by a core.
    ///
    /// Other processes that are not bound to a core may be evicted to the backing store to make space.
    fn admit<B: BackingStoreModule>(&mut self, process: &Process, store: &mut B) -> Admission;

    /// Frees all memory of `pid` (the process finished)
    fn release<B: BackingStoreModule>(&mut self, pid: Pid, store: &mut B);

    /// Keeps the memory of `pid`, but allows other processes to evict it (the process was preempted)
    fn deactivate(&mut self, pid: Pid);

    /// Called once per tick
    fn age(&mut self) {}

    /// Returns the page count needed for `memory_size` bytes (`0` if this module does not use pages)
    fn page_count_for(&self, memory_size: usize) -> usize;

    /// Returns `true` if a process with `memory_size` bytes can ever become resident
    fn can_hold(&self, memory_size: usize) -> bool;

    fn total_size(&self) -> usize;

    fn used_size(&self) -> usize;

    /// Bytes currently owned per process, sorted by pid
    fn usage_by_process(&self) -> Vec<(Pid, usize)>;

    fn paging_stats(&self) -> PagingStats;

    /// Checks the internal invariants of this module and panics if one is violated
    fn check_integrity(&self);
}

/// The memory module selected for a simulation
#[derive(Debug)]
pub enum MemoryManager {
    Flat(FlatAllocatorModule),
    Paged(PagedAllocatorModule),
}

impl MemoryManager {
    pub fn new(config: &SimConfig) -> Self {
        match config.memory_mode() {
            MemoryMode::Flat => Self::Flat(FlatAllocatorModule::new(config.total_memory)),
            MemoryMode::Paged { total_frames } => {
                Self::Paged(PagedAllocatorModule::new(total_frames, config.frame_size))
            }
        }
    }
}

macro_rules! delegate {
    ($self:ident, $inner:ident => $call:expr) => {
        match $self {
            MemoryManager::Flat($inner) => $call,
            MemoryManager::Paged($inner) => $call,
        }
    };
}

impl MemoryModule for MemoryManager {
    fn admit<B: BackingStoreModule>(&mut self, process: &Process, store: &mut B) -> Admission {
        delegate!(self, inner => inner.admit(process, store))
    }

    fn release<B: BackingStoreModule>(&mut self, pid: Pid, store: &mut B) {
        delegate!(self, inner => inner.release(pid, store))
    }

    fn deactivate(&mut self, pid: Pid) {
        delegate!(self, inner => inner.deactivate(pid))
    }

    fn age(&mut self) {
        delegate!(self, inner => inner.age())
    }

    fn page_count_for(&self, memory_size: usize) -> usize {
        delegate!(self, inner => inner.page_count_for(memory_size))
    }

    fn can_hold(&self, memory_size: usize) -> bool {
        delegate!(self, inner => inner.can_hold(memory_size))
    }

    fn total_size(&self) -> usize {
        delegate!(self, inner => inner.total_size())
    }

    fn used_size(&self) -> usize {
        delegate!(self, inner => inner.used_size())
    }

    fn usage_by_process(&self) -> Vec<(Pid, usize)> {
        delegate!(self, inner => inner.usage_by_process())
    }

    fn paging_stats(&self) -> PagingStats {
        delegate!(self, inner => inner.paging_stats())
    }

    fn check_integrity(&self) {
        delegate!(self, inner => inner.check_integrity())
    }
}

#[cfg(test)]
pub(crate) mod test {
    use crate::{Pid, Process, ProcessSpec};

    /// Creates a process record for memory tests
    pub(crate) fn test_process(pid: Pid, memory_size: usize, page_count: usize) -> Process {
        Process::new(
            pid,
            format!("p{}", pid),
            ProcessSpec {
                instruction_count: 10,
                memory_size,
            },
            page_count,
            0,
        )
    }

    #[test]
    fn test_memory_manager_mode_selection() {
        use super::{MemoryManager, MemoryModule};
        use crate::SimConfig;

        let mut config = SimConfig::default();
        config.total_memory = 1024;
        config.frame_size = 1024;
        let manager = MemoryManager::new(&config);
        assert!(matches!(manager, MemoryManager::Flat(_)));
        assert_eq!(manager.total_size(), 1024);
        assert_eq!(manager.page_count_for(100), 0);

        config.frame_size = 64;
        let manager = MemoryManager::new(&config);
        assert!(matches!(manager, MemoryManager::Paged(_)));
        assert_eq!(manager.total_size(), 1024);
        assert_eq!(manager.page_count_for(100), 2);
        assert!(manager.can_hold(1024));
        assert!(!manager.can_hold(1025));
    }
}
