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

use std::collections::BTreeMap;

use log::{debug, trace, warn};

use super::{Admission, MemoryModule, PagingStats};
use crate::{modules::backing_store::BackingStoreModule, Pid, Process};

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct Frame {
    pub owner: Option<Pid>,

    /// Ticks since this frame was bound to its owner
    pub age: u64,

    pub in_use_by_core: bool,
}

impl Frame {
    #[inline]
    pub fn is_free(&self) -> bool {
        self.owner.is_none()
    }
}

/// Frame table for paged memory mode.
///
/// Frames age once per tick while they are owned. If no frame is free, the
/// oldest frame that is not in use by a core is evicted. The age is *not*
/// reset when the owner executes, so this evicts the frame that was loaded
/// first rather than the least recently used one.
#[derive(Debug)]
pub struct PagedAllocatorModule {
    frame_size: usize,
    frames: Vec<Frame>,

    /// Page count of every process that owns at least one frame
    demand: BTreeMap<Pid, usize>,

    stats: PagingStats,
}

impl PagedAllocatorModule {
    pub fn new(total_frames: usize, frame_size: usize) -> Self {
        assert!(total_frames > 0, "at least one frame is required");
        assert!(frame_size > 0, "frame size has to be greater than 0");

        Self {
            frame_size,
            frames: vec![Frame::default(); total_frames],
            demand: BTreeMap::new(),
            stats: PagingStats::default(),
        }
    }

    pub fn frames(&self) -> &[Frame] {
        &self.frames
    }

    pub fn frame_size(&self) -> usize {
        self.frame_size
    }

    /// Indices of all frames owned by `pid`
    pub fn frames_of(&self, pid: Pid) -> Vec<usize> {
        self.frames
            .iter()
            .enumerate()
            .filter(|(_, frame)| frame.owner == Some(pid))
            .map(|(i, _)| i)
            .collect()
    }

    fn owned_count(&self, pid: Pid) -> usize {
        self.frames
            .iter()
            .filter(|frame| frame.owner == Some(pid))
            .count()
    }

    fn set_in_use(&mut self, pid: Pid, in_use: bool) {
        for frame in self.frames.iter_mut().filter(|frame| frame.owner == Some(pid)) {
            frame.in_use_by_core = in_use;
        }
    }

    /// Finds the frame that should be evicted to make space for `requester`.
    ///
    /// This is the oldest frame that is not in use by a core and not owned by
    /// `requester`. Ties are broken by the lowest frame index.
    pub(crate) fn find_victim(&self, requester: Pid) -> Option<usize> {
        let mut victim: Option<usize> = None;

        for (i, frame) in self.frames.iter().enumerate() {
            if frame.is_free() || frame.in_use_by_core || frame.owner == Some(requester) {
                continue;
            }

            match victim {
                Some(v) if self.frames[v].age >= frame.age => {}
                _ => victim = Some(i),
            }
        }

        victim
    }

    fn evict<B: BackingStoreModule>(&mut self, index: usize, store: &mut B) {
        let frame = core::mem::take(&mut self.frames[index]);
        store.store(frame.owner);
        self.stats.paged_out += 1;

        if let Some(owner) = frame.owner {
            if self.owned_count(owner) == 0 {
                self.demand.remove(&owner);
            }
        }

        debug!(
            "Evicted frame {} (age {}) of pid {:?} to the backing store",
            index, frame.age, frame.owner
        );
    }
}

impl MemoryModule for PagedAllocatorModule {
    fn admit<B: BackingStoreModule>(&mut self, process: &Process, store: &mut B) -> Admission {
        let pid = process.pid;
        let needed = process.page_count;
        let mut owned = self.owned_count(pid);
        debug_assert!(owned <= needed, "pid {} owns too many frames", pid);

        if owned == needed {
            self.set_in_use(pid, true);
            return Admission::Admitted;
        }

        if !self.can_hold(process.memory_size) {
            warn!(
                "Process {} needs {} frames, memory only has {} frames",
                pid,
                needed,
                self.frames.len()
            );
            return Admission::Deferred;
        }

        store.clear(pid);

        while owned < needed {
            if let Some(index) = self.frames.iter().position(Frame::is_free) {
                self.demand.insert(pid, needed);
                self.frames[index] = Frame {
                    owner: Some(pid),
                    age: 0,
                    in_use_by_core: false,
                };
                self.stats.paged_in += 1;
                owned += 1;

                trace!("Bound frame {} to pid {}", index, pid);
                continue;
            }

            match self.find_victim(pid) {
                Some(index) => self.evict(index, store),
                None => {
                    debug!(
                        "Could not make pid {} resident: {} of {} frames bound",
                        pid, owned, needed
                    );

                    self.check_integrity();
                    return Admission::Deferred;
                }
            }
        }

        self.set_in_use(pid, true);
        self.check_integrity();
        Admission::Admitted
    }

    fn release<B: BackingStoreModule>(&mut self, pid: Pid, store: &mut B) {
        for frame in self.frames.iter_mut().filter(|frame| frame.owner == Some(pid)) {
            *frame = Frame::default();
        }
        self.demand.remove(&pid);
        store.clear(pid);

        trace!("Released all frames of pid {}", pid);
        self.check_integrity();
    }

    fn deactivate(&mut self, pid: Pid) {
        self.set_in_use(pid, false);
    }

    fn age(&mut self) {
        for frame in self.frames.iter_mut().filter(|frame| !frame.is_free()) {
            frame.age += 1;
        }
    }

    fn page_count_for(&self, memory_size: usize) -> usize {
        memory_size.div_ceil(self.frame_size)
    }

    fn can_hold(&self, memory_size: usize) -> bool {
        self.page_count_for(memory_size) <= self.frames.len()
    }

    fn total_size(&self) -> usize {
        self.frames.len() * self.frame_size
    }

    fn used_size(&self) -> usize {
        self.frames.iter().filter(|frame| !frame.is_free()).count() * self.frame_size
    }

    fn usage_by_process(&self) -> Vec<(Pid, usize)> {
        let mut usage: BTreeMap<Pid, usize> = BTreeMap::new();
        for owner in self.frames.iter().filter_map(|frame| frame.owner) {
            *usage.entry(owner).or_insert(0) += self.frame_size;
        }

        usage.into_iter().collect()
    }

    fn paging_stats(&self) -> PagingStats {
        self.stats
    }

    #[cfg(debug_assertions)]
    fn check_integrity(&self) {
        let mut owned: BTreeMap<Pid, (usize, usize)> = BTreeMap::new();
        for frame in self.frames.iter() {
            match frame.owner {
                Some(pid) => {
                    let entry = owned.entry(pid).or_insert((0, 0));
                    entry.0 += 1;
                    if frame.in_use_by_core {
                        entry.1 += 1;
                    }
                }
                None => {
                    assert_eq!(frame.age, 0, "free frame should not age");
                    assert!(!frame.in_use_by_core, "free frame cannot be in use");
                }
            }
        }

        for (pid, (count, in_use)) in owned {
            let demand = self
                .demand
                .get(&pid)
                .copied()
                .unwrap_or_else(|| panic!("pid {} owns frames without demand", pid));

            assert!(count <= demand, "pid {} owns {} of {} frames", pid, count, demand);
            if in_use > 0 {
                assert_eq!(in_use, count, "pid {} is only partially in use", pid);
                assert_eq!(count, demand, "pid {} is in use without all frames", pid);
            }
        }
    }

    #[cfg(not(debug_assertions))]
    #[inline]
    fn check_integrity(&self) {
        // check nothing
    }
}
