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

use log::{debug, trace, warn};

use super::{Admission, MemoryModule, PagingStats};
use crate::{modules::backing_store::BackingStoreModule, Pid, Process};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FreeBlock {
    pub start: usize,
    pub size: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TakenBlock {
    pub start: usize,
    pub size: usize,
    pub owner: Pid,

    /// Owner is currently executed by a core, so this block must not be evicted
    pub active: bool,
}

impl FreeBlock {
    /// Last address of this block (inclusive)
    #[inline]
    pub fn end(&self) -> usize {
        self.start + self.size - 1
    }
}

impl TakenBlock {
    /// Last address of this block (inclusive)
    #[inline]
    pub fn end(&self) -> usize {
        self.start + self.size - 1
    }
}

/// Contiguous allocator for flat memory mode.
///
/// Allocates first fit from a free list which is sorted by address and
/// never contains two adjacent blocks. Under pressure the oldest taken
/// block which is not in use by a core is evicted.
#[derive(Debug)]
pub struct FlatAllocatorModule {
    total_size: usize,

    /// Sorted by `start`, adjacent blocks are merged
    free_list: Vec<FreeBlock>,

    /// Sorted by allocation time, oldest first
    taken_list: Vec<TakenBlock>,

    stats: PagingStats,
}

impl FlatAllocatorModule {
    pub fn new(total_size: usize) -> Self {
        assert!(total_size > 0, "memory has to be at least one byte big");

        Self {
            total_size,
            free_list: vec![FreeBlock {
                start: 0,
                size: total_size,
            }],
            taken_list: Vec::new(),
            stats: PagingStats::default(),
        }
    }

    pub fn free_blocks(&self) -> &[FreeBlock] {
        &self.free_list
    }

    pub fn taken_blocks(&self) -> &[TakenBlock] {
        &self.taken_list
    }

    /// Returns the block owned by `pid`
    pub fn block_of(&self, pid: Pid) -> Option<&TakenBlock> {
        self.taken_list.iter().find(|block| block.owner == pid)
    }

    /// Allocates `size` bytes for `pid` in the first free block that is big enough.
    ///
    /// Returns the start address of the new block.
    pub(crate) fn allocate(&mut self, pid: Pid, size: usize) -> Option<usize> {
        let index = self.free_list.iter().position(|block| block.size >= size)?;
        let block = self.free_list.remove(index);

        if block.size > size {
            // remainder stays free
            self.free_list.push(FreeBlock {
                start: block.start + size,
                size: block.size - size,
            });
            self.merge_free_list();
        }

        self.taken_list.push(TakenBlock {
            start: block.start,
            size,
            owner: pid,
            active: false,
        });

        trace!(
            "Allocated [{}, {}] for pid {}",
            block.start,
            block.start + size - 1,
            pid
        );
        Some(block.start)
    }

    /// Removes the taken block at `index` and gives its range back to the free list
    fn free_taken(&mut self, index: usize) -> TakenBlock {
        let block = self.taken_list.remove(index);
        self.free_list.push(FreeBlock {
            start: block.start,
            size: block.size,
        });
        self.merge_free_list();

        block
    }

    /// Sorts the free list and merges adjacent blocks
    fn merge_free_list(&mut self) {
        self.free_list.sort_unstable_by_key(|block| block.start);

        let mut merged: Vec<FreeBlock> = Vec::with_capacity(self.free_list.len());
        for block in self.free_list.drain(..) {
            match merged.last_mut() {
                Some(prev) if prev.start + prev.size == block.start => prev.size += block.size,
                _ => merged.push(block),
            }
        }

        self.free_list = merged;
    }

    /// Evicts the oldest block that is not in use by a core.
    ///
    /// Returns `false` if there is no such block.
    fn evict_oldest_inactive<B: BackingStoreModule>(&mut self, store: &mut B) -> bool {
        let Some(index) = self.taken_list.iter().position(|block| !block.active) else {
            return false;
        };

        let block = self.free_taken(index);
        store.store(Some(block.owner));
        self.stats.paged_out += 1;

        debug!(
            "Evicted [{}, {}] of pid {} to the backing store",
            block.start,
            block.end(),
            block.owner
        );
        true
    }
}

impl MemoryModule for FlatAllocatorModule {
    fn admit<B: BackingStoreModule>(&mut self, process: &Process, store: &mut B) -> Admission {
        if let Some(block) = self
            .taken_list
            .iter_mut()
            .find(|block| block.owner == process.pid)
        {
            // still resident from last time
            block.active = true;
            return Admission::Admitted;
        }

        if !self.can_hold(process.memory_size) {
            warn!(
                "Process {} needs {} bytes, memory only has {} bytes",
                process.pid, process.memory_size, self.total_size
            );
            return Admission::Deferred;
        }

        store.retrieve(process.pid);

        loop {
            if self.allocate(process.pid, process.memory_size).is_some() {
                if let Some(block) = self.taken_list.last_mut() {
                    block.active = true;
                }
                self.stats.paged_in += 1;

                self.check_integrity();
                return Admission::Admitted;
            }

            if !self.evict_oldest_inactive(store) {
                debug!(
                    "Could not make {} bytes resident for pid {}",
                    process.memory_size, process.pid
                );

                self.check_integrity();
                return Admission::Deferred;
            }
        }
    }

    fn release<B: BackingStoreModule>(&mut self, pid: Pid, store: &mut B) {
        if let Some(index) = self.taken_list.iter().position(|block| block.owner == pid) {
            let block = self.free_taken(index);
            trace!("Released [{}, {}] of pid {}", block.start, block.end(), pid);
        }

        store.clear(pid);
        self.check_integrity();
    }

    fn deactivate(&mut self, pid: Pid) {
        if let Some(block) = self.taken_list.iter_mut().find(|block| block.owner == pid) {
            block.active = false;
        }
    }

    fn page_count_for(&self, _memory_size: usize) -> usize {
        0
    }

    fn can_hold(&self, memory_size: usize) -> bool {
        memory_size <= self.total_size
    }

    fn total_size(&self) -> usize {
        self.total_size
    }

    fn used_size(&self) -> usize {
        self.taken_list.iter().map(|block| block.size).sum()
    }

    fn usage_by_process(&self) -> Vec<(Pid, usize)> {
        let mut usage: Vec<(Pid, usize)> = self
            .taken_list
            .iter()
            .map(|block| (block.owner, block.size))
            .collect();
        usage.sort_unstable_by_key(|(pid, _)| *pid);
        usage
    }

    fn paging_stats(&self) -> PagingStats {
        self.stats
    }

    #[cfg(debug_assertions)]
    fn check_integrity(&self) {
        let free: usize = self.free_list.iter().map(|block| block.size).sum();
        assert_eq!(
            free + self.used_size(),
            self.total_size,
            "free and taken blocks have to cover the whole memory"
        );

        for pair in self.free_list.windows(2) {
            assert!(
                pair[0].start + pair[0].size < pair[1].start,
                "free list has to be sorted and merged: {:?}",
                pair
            );
        }

        let mut ranges: Vec<(usize, usize)> = self
            .free_list
            .iter()
            .map(|block| (block.start, block.size))
            .chain(self.taken_list.iter().map(|block| (block.start, block.size)))
            .collect();
        ranges.sort_unstable();
        for pair in ranges.windows(2) {
            assert!(
                pair[0].0 + pair[0].1 <= pair[1].0,
                "blocks should not overlap: {:?}",
                pair
            );
        }

        for (i, block) in self.taken_list.iter().enumerate() {
            assert!(
                self.taken_list[i + 1..]
                    .iter()
                    .all(|other| other.owner != block.owner),
                "pid {} owns more than one block",
                block.owner
            );
        }
    }

    #[cfg(not(debug_assertions))]
    #[inline]
    fn check_integrity(&self) {
        // check nothing
    }
}
