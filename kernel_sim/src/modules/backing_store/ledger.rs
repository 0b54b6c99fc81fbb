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

use log::trace;

use super::BackingStoreModule;
use crate::Pid;

/// In memory ledger that counts outstanding evictions per process
#[derive(Debug, Default)]
pub struct LedgerBackingStore {
    /// Only pids with at least one outstanding marker are stored
    entries: BTreeMap<Pid, usize>,
}

impl LedgerBackingStore {
    pub fn new() -> Self {
        Self {
            entries: BTreeMap::new(),
        }
    }
}

impl BackingStoreModule for LedgerBackingStore {
    fn store(&mut self, pid: Option<Pid>) {
        let Some(pid) = pid else {
            return;
        };

        trace!("Backing store: swap out pid {}", pid);
        *self.entries.entry(pid).or_insert(0) += 1;
    }

    fn retrieve(&mut self, pid: Pid) {
        if let Some(count) = self.entries.get_mut(&pid) {
            trace!("Backing store: swap in pid {}", pid);

            *count -= 1;
            if *count == 0 {
                self.entries.remove(&pid);
            }
        }
    }

    fn clear(&mut self, pid: Pid) {
        self.entries.remove(&pid);
    }

    fn outstanding(&self, pid: Pid) -> usize {
        self.entries.get(&pid).copied().unwrap_or(0)
    }

    fn swapped_out(&self) -> Vec<Pid> {
        self.entries.keys().copied().collect()
    }
}
