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

use std::time::{SystemTime, UNIX_EPOCH};

use rand::{rngs::SmallRng, Rng, SeedableRng};

use crate::{ProcessSpec, SimConfig};

/// Produces the size and length of new synthetic processes
pub trait ProcessGenerator {
    fn next_spec(&mut self, config: &SimConfig) -> ProcessSpec;
}

/// Draws process specifications uniformly from the configured ranges.
///
/// The memory size is always a power of two: the exponent is drawn uniformly
/// between the exponents of `min_process_memory` and `max_process_memory`.
pub struct RandomProcessGenerator {
    rand: SmallRng,
}

impl RandomProcessGenerator {
    pub fn seeded(seed: u64) -> Self {
        Self {
            rand: SmallRng::seed_from_u64(seed),
        }
    }

    /// Uses `config.seed` if set, otherwise the current time
    pub fn new(config: &SimConfig) -> Self {
        let seed = config.seed.unwrap_or_else(|| {
            SystemTime::now()
                .duration_since(UNIX_EPOCH)
                .map(|duration| duration.as_nanos() as u64)
                .unwrap_or_default()
        });

        Self::seeded(seed)
    }
}

impl ProcessGenerator for RandomProcessGenerator {
    fn next_spec(&mut self, config: &SimConfig) -> ProcessSpec {
        let instruction_count = self
            .rand
            .gen_range(config.min_instructions..=config.max_instructions);

        let min_exp = config.min_process_memory.trailing_zeros();
        let max_exp = config.max_process_memory.trailing_zeros();
        let memory_size = 1usize << self.rand.gen_range(min_exp..=max_exp);

        ProcessSpec {
            instruction_count,
            memory_size,
        }
    }
}
