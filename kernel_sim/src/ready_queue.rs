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

use std::collections::VecDeque;

use crate::Process;

/// FIFO of processes waiting for a core
#[derive(Debug, Default)]
pub struct ReadyQueue {
    inner: VecDeque<Process>,
}

impl ReadyQueue {
    pub fn new() -> Self {
        Self {
            inner: VecDeque::new(),
        }
    }

    #[inline]
    pub fn push_back(&mut self, process: Process) {
        debug_assert!(!process.is_finished(), "finished process cannot be queued");
        self.inner.push_back(process);
    }

    #[inline]
    pub fn pop_front(&mut self) -> Option<Process> {
        self.inner.pop_front()
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.inner.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Process> {
        self.inner.iter()
    }
}
