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

use super::{fill_core, DispatchArguments, DispatchOutcome};
use crate::modules::backing_store::BackingStoreModule;

/// A resident keeps its core until it finished, so the quantum never runs out
const FCFS_QUANTUM: u32 = 1;

pub(super) fn dispatch<B: BackingStoreModule>(
    mut args: DispatchArguments<'_, B>,
) -> DispatchOutcome {
    let mut outcome = DispatchOutcome::default();

    for core in 0..args.cores.len() {
        if args.ready_queue.is_empty() {
            break;
        }

        if !args.cores[core].is_idle() {
            continue;
        }

        debug_assert!(args.cores[core].resident().is_none());
        fill_core(core, FCFS_QUANTUM, &mut args, &mut outcome);
    }

    outcome
}
