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

mod ledger;

pub use ledger::LedgerBackingStore;

use crate::Pid;

/// Ledger of processes whose memory was evicted and not loaded again yet.
///
/// The ledger does not carry any payload: the state of a process is
/// reconstructed from its [`Process`](crate::Process) record, which is never discarded.
pub trait BackingStoreModule {
    /// Appends an outstanding eviction marker for `pid`.
    ///
    /// Does nothing if `pid` is `None` (e.g. evicting a frame without owner).
    fn store(&mut self, pid: Option<Pid>);

    /// Removes the most recent outstanding marker for `pid`, if there is one.
    fn retrieve(&mut self, pid: Pid);

    /// Removes all outstanding markers for `pid`
    fn clear(&mut self, pid: Pid);

    /// How many markers are outstanding for `pid`
    fn outstanding(&self, pid: Pid) -> usize;

    /// Returns `true` if `pid` currently has evicted state outstanding
    fn is_swapped_out(&self, pid: Pid) -> bool {
        self.outstanding(pid) > 0
    }

    /// All processes that currently have evicted state outstanding, sorted by pid
    fn swapped_out(&self) -> Vec<Pid>;
}

#[cfg(test)]
pub(crate) mod test {
    use super::BackingStoreModule;

    /// store and retrieve behave like a per process stack of markers
    pub(super) fn test_backing_store_ledger<B: BackingStoreModule>(mut store: B) {
        assert!(!store.is_swapped_out(1));
        assert!(store.swapped_out().is_empty());

        store.store(Some(1));
        store.store(Some(1));
        store.store(Some(3));
        assert_eq!(store.outstanding(1), 2);
        assert_eq!(store.outstanding(3), 1);
        assert_eq!(store.swapped_out(), vec![1, 3]);

        store.retrieve(1);
        assert_eq!(store.outstanding(1), 1);
        assert!(store.is_swapped_out(1));

        store.retrieve(1);
        assert!(!store.is_swapped_out(1));

        // retrieving without marker is a no-op
        store.retrieve(1);
        store.retrieve(7);
        assert_eq!(store.outstanding(1), 0);
        assert_eq!(store.swapped_out(), vec![3]);

        store.store(Some(3));
        store.clear(3);
        assert_eq!(store.outstanding(3), 0);
        assert!(store.swapped_out().is_empty());
    }

    /// storing without an owner must not change anything
    pub(super) fn test_backing_store_none<B: BackingStoreModule>(mut store: B) {
        store.store(None);
        assert!(store.swapped_out().is_empty());
    }
}
