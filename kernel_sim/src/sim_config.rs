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

use std::{collections::HashMap, fs, path::Path, str::FromStr};

use log::debug;

#[cfg(feature = "serde")]
use serde::Serialize;

use crate::ConfigError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize))]
pub enum SchedulingPolicy {
    /// First come first served, no preemption
    Fcfs,

    /// Preemption after `quantum_length` executed instructions
    RoundRobin,
}

/// Which memory allocator is used, derived from [`SimConfig::memory_mode`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize))]
pub enum MemoryMode {
    /// One contiguous arena of `total_memory` bytes
    Flat,

    /// `total_frames` frames with `frame_size` bytes each
    Paged { total_frames: usize },
}

#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize))]
pub struct SimConfig {
    pub num_cores: usize,
    pub policy: SchedulingPolicy,
    pub quantum_length: u32,

    /// Generate a process every `generation_interval_ticks` ticks while
    /// generation is enabled. `0` disables generation completely.
    pub generation_interval_ticks: u64,

    pub min_instructions: u64,
    pub max_instructions: u64,

    /// Ticks a core waits between two executed instructions
    pub execution_delay_ticks: u64,

    pub total_memory: usize,
    pub frame_size: usize,
    pub min_process_memory: usize,
    pub max_process_memory: usize,

    /// Real time between two ticks, `0` runs as fast as possible
    pub tick_interval_ms: u64,

    /// Round robin only: execute the whole quantum in one step
    pub batched_advance: bool,

    /// Seed of the process generator, random if not set
    pub seed: Option<u64>,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            num_cores: 4,
            policy: SchedulingPolicy::RoundRobin,
            quantum_length: 5,
            generation_interval_ticks: 1,
            min_instructions: 1000,
            max_instructions: 2000,
            execution_delay_ticks: 0,
            total_memory: 16384,
            frame_size: 16,
            min_process_memory: 4096,
            max_process_memory: 4096,
            tick_interval_ms: 10,
            batched_advance: false,
            seed: None,
        }
    }
}

impl SimConfig {
    /// Loads and validates a configuration file
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path.as_ref())?;
        let config: SimConfig = content.parse()?;

        debug!("Loaded configuration from {}", path.as_ref().display());
        Ok(config)
    }

    #[inline]
    pub fn memory_mode(&self) -> MemoryMode {
        if self.frame_size == self.total_memory {
            MemoryMode::Flat
        } else {
            MemoryMode::Paged {
                total_frames: self.total_memory / self.frame_size,
            }
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        fn invalid(reason: &str) -> Result<(), ConfigError> {
            Err(ConfigError::Invalid(reason.to_string()))
        }

        if self.num_cores == 0 {
            return invalid("at least one core is required");
        }
        if self.policy == SchedulingPolicy::RoundRobin && self.quantum_length == 0 {
            return invalid("quantum length has to be at least 1 for round robin");
        }
        if self.min_instructions == 0 || self.min_instructions > self.max_instructions {
            return invalid("instruction range has to satisfy 1 <= min <= max");
        }
        if self.total_memory == 0 || self.frame_size == 0 {
            return invalid("memory and frame size have to be greater than 0");
        }
        if self.frame_size > self.total_memory || self.total_memory % self.frame_size != 0 {
            return invalid("total memory has to be a multiple of the frame size");
        }
        if !self.min_process_memory.is_power_of_two() || !self.max_process_memory.is_power_of_two()
        {
            return invalid("process memory bounds have to be powers of two");
        }
        if self.min_process_memory > self.max_process_memory {
            return invalid("minimum process memory exceeds maximum process memory");
        }
        if self.max_process_memory > self.total_memory {
            return invalid("maximum process memory exceeds total memory");
        }
        if self.execution_delay_ticks > MAX_EXECUTION_DELAY_TICKS {
            return invalid("execution delay is too large");
        }

        Ok(())
    }
}

/// Largest accepted `delay-per-exec`
pub const MAX_EXECUTION_DELAY_TICKS: u64 = u32::MAX as u64;

const KEY_NUM_CPU: &str = "num-cpu";
const KEY_SCHEDULER: &str = "scheduler";
const KEY_QUANTUM: &str = "quantum-cycles";
const KEY_BATCH_FREQ: &str = "batch-process-freq";
const KEY_MIN_INS: &str = "min-ins";
const KEY_MAX_INS: &str = "max-ins";
const KEY_DELAY: &str = "delay-per-exec";
const KEY_TOTAL_MEM: &str = "max-overall-mem";
const KEY_FRAME_SIZE: &str = "mem-per-frame";
const KEY_MIN_MEM: &str = "min-mem-per-proc";
const KEY_MAX_MEM: &str = "max-mem-per-proc";
const KEY_TICK_INTERVAL: &str = "tick-interval-ms";
const KEY_BATCHED: &str = "batched-advance";
const KEY_SEED: &str = "seed";

const KNOWN_KEYS: [&str; 14] = [
    KEY_NUM_CPU,
    KEY_SCHEDULER,
    KEY_QUANTUM,
    KEY_BATCH_FREQ,
    KEY_MIN_INS,
    KEY_MAX_INS,
    KEY_DELAY,
    KEY_TOTAL_MEM,
    KEY_FRAME_SIZE,
    KEY_MIN_MEM,
    KEY_MAX_MEM,
    KEY_TICK_INTERVAL,
    KEY_BATCHED,
    KEY_SEED,
];

/// Raw `key value` pairs of a configuration file
struct ConfigEntries {
    entries: HashMap<String, String>,
}

impl ConfigEntries {
    fn parse(content: &str) -> Result<Self, ConfigError> {
        let mut entries = HashMap::new();

        for line in content.lines() {
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }

            let (key, value) = match line.split_once(char::is_whitespace) {
                Some((key, value)) => (key, value.trim()),
                None => (line, ""),
            };

            if !KNOWN_KEYS.contains(&key) {
                return Err(ConfigError::UnknownKey(key.to_string()));
            }

            // values may be quoted, e.g. `scheduler "rr"`
            let value = value.trim_matches('"');
            entries.insert(key.to_string(), value.to_string());
        }

        Ok(Self { entries })
    }

    fn optional<T: FromStr>(&self, key: &'static str) -> Result<Option<T>, ConfigError> {
        match self.entries.get(key) {
            None => Ok(None),
            Some(value) => value
                .parse()
                .map(Some)
                .map_err(|_| ConfigError::InvalidValue {
                    key: key.to_string(),
                    value: value.clone(),
                }),
        }
    }

    fn required<T: FromStr>(&self, key: &'static str) -> Result<T, ConfigError> {
        self.optional(key)?.ok_or(ConfigError::MissingKey(key))
    }

    fn policy(&self) -> Result<SchedulingPolicy, ConfigError> {
        let value: String = self.required(KEY_SCHEDULER)?;
        match value.as_str() {
            "fcfs" => Ok(SchedulingPolicy::Fcfs),
            "rr" | "round_robin" => Ok(SchedulingPolicy::RoundRobin),
            _ => Err(ConfigError::InvalidValue {
                key: KEY_SCHEDULER.to_string(),
                value,
            }),
        }
    }
}

impl FromStr for SimConfig {
    type Err = ConfigError;

    /// Parses the `key value` format of `config.txt` and validates the result
    fn from_str(content: &str) -> Result<Self, Self::Err> {
        let entries = ConfigEntries::parse(content)?;
        let defaults = SimConfig::default();

        let config = SimConfig {
            num_cores: entries.required(KEY_NUM_CPU)?,
            policy: entries.policy()?,
            quantum_length: entries.required(KEY_QUANTUM)?,
            generation_interval_ticks: entries.required(KEY_BATCH_FREQ)?,
            min_instructions: entries.required(KEY_MIN_INS)?,
            max_instructions: entries.required(KEY_MAX_INS)?,
            execution_delay_ticks: entries.required(KEY_DELAY)?,
            total_memory: entries.required(KEY_TOTAL_MEM)?,
            frame_size: entries.required(KEY_FRAME_SIZE)?,
            min_process_memory: entries.required(KEY_MIN_MEM)?,
            max_process_memory: entries.required(KEY_MAX_MEM)?,
            tick_interval_ms: entries
                .optional(KEY_TICK_INTERVAL)?
                .unwrap_or(defaults.tick_interval_ms),
            batched_advance: entries
                .optional(KEY_BATCHED)?
                .unwrap_or(defaults.batched_advance),
            seed: entries.optional(KEY_SEED)?,
        };

        config.validate()?;
        Ok(config)
    }
}

#[cfg(test)]
mod test {
    use super::{MemoryMode, SchedulingPolicy, SimConfig, MAX_EXECUTION_DELAY_TICKS};
    use crate::ConfigError;

    const SAMPLE_CONFIG: &str = r#"
num-cpu 4
scheduler "rr"
quantum-cycles 5
batch-process-freq 1
min-ins 1000
max-ins 2000
delay-per-exec 0
max-overall-mem 16384
mem-per-frame 16
min-mem-per-proc 4096
max-mem-per-proc 4096
"#;

    #[test]
    fn test_parse_sample_config() {
        let config: SimConfig = SAMPLE_CONFIG.parse().unwrap();

        assert_eq!(config.num_cores, 4);
        assert_eq!(config.policy, SchedulingPolicy::RoundRobin);
        assert_eq!(config.quantum_length, 5);
        assert_eq!(config.generation_interval_ticks, 1);
        assert_eq!(config.min_instructions, 1000);
        assert_eq!(config.max_instructions, 2000);
        assert_eq!(config.total_memory, 16384);
        assert_eq!(config.memory_mode(), MemoryMode::Paged { total_frames: 1024 });
        assert_eq!(config.seed, None);
        assert!(!config.batched_advance);
    }

    #[test]
    fn test_flat_mode_selection() {
        let content = SAMPLE_CONFIG
            .replace("mem-per-frame 16", "mem-per-frame 16384")
            .replace("scheduler \"rr\"", "scheduler fcfs");
        let config: SimConfig = content.parse().unwrap();

        assert_eq!(config.policy, SchedulingPolicy::Fcfs);
        assert_eq!(config.memory_mode(), MemoryMode::Flat);
    }

    #[test]
    fn test_optional_keys() {
        let content = format!("{}\n# comment\ntick-interval-ms 0\nbatched-advance true\nseed 42\n", SAMPLE_CONFIG);
        let config: SimConfig = content.parse().unwrap();

        assert_eq!(config.tick_interval_ms, 0);
        assert!(config.batched_advance);
        assert_eq!(config.seed, Some(42));
    }

    #[test]
    fn test_missing_key() {
        let content = SAMPLE_CONFIG.replace("num-cpu 4", "");
        let res = content.parse::<SimConfig>();
        assert!(matches!(res, Err(ConfigError::MissingKey("num-cpu"))));
    }

    #[test]
    fn test_invalid_values() {
        let content = SAMPLE_CONFIG.replace("num-cpu 4", "num-cpu four");
        assert!(matches!(
            content.parse::<SimConfig>(),
            Err(ConfigError::InvalidValue { key, .. }) if key == "num-cpu"
        ));

        let content = SAMPLE_CONFIG.replace("\"rr\"", "\"lottery\"");
        assert!(matches!(
            content.parse::<SimConfig>(),
            Err(ConfigError::InvalidValue { key, .. }) if key == "scheduler"
        ));

        let content = format!("{}\ncolor green\n", SAMPLE_CONFIG);
        assert!(matches!(
            content.parse::<SimConfig>(),
            Err(ConfigError::UnknownKey(key)) if key == "color"
        ));
    }

    #[test]
    fn test_validation() {
        assert!(SimConfig::default().validate().is_ok());

        let mut config = SimConfig::default();
        config.num_cores = 0;
        assert!(matches!(config.validate(), Err(ConfigError::Invalid(_))));

        let mut config = SimConfig::default();
        config.min_process_memory = 100;
        assert!(matches!(config.validate(), Err(ConfigError::Invalid(_))));

        let mut config = SimConfig::default();
        config.min_instructions = 10;
        config.max_instructions = 5;
        assert!(matches!(config.validate(), Err(ConfigError::Invalid(_))));

        let mut config = SimConfig::default();
        config.frame_size = 3000;
        assert!(matches!(config.validate(), Err(ConfigError::Invalid(_))));

        let mut config = SimConfig::default();
        config.policy = SchedulingPolicy::Fcfs;
        config.quantum_length = 0;
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_process_memory_has_to_fit() {
        let mut config = SimConfig::default();
        config.max_process_memory = config.total_memory;
        assert!(config.validate().is_ok());

        config.max_process_memory = config.total_memory * 2;
        assert!(matches!(config.validate(), Err(ConfigError::Invalid(_))));

        let content = SAMPLE_CONFIG.replace("max-mem-per-proc 4096", "max-mem-per-proc 32768");
        assert!(matches!(
            content.parse::<SimConfig>(),
            Err(ConfigError::Invalid(_))
        ));
    }

    #[test]
    fn test_execution_delay_bounds() {
        let mut config = SimConfig::default();
        config.execution_delay_ticks = MAX_EXECUTION_DELAY_TICKS;
        assert!(config.validate().is_ok());

        for delay in [MAX_EXECUTION_DELAY_TICKS + 1, u64::MAX - 1, u64::MAX] {
            config.execution_delay_ticks = delay;
            assert!(matches!(config.validate(), Err(ConfigError::Invalid(_))));
        }

        let content = SAMPLE_CONFIG.replace(
            "delay-per-exec 0",
            &format!("delay-per-exec {}", u64::MAX),
        );
        assert!(matches!(
            content.parse::<SimConfig>(),
            Err(ConfigError::Invalid(_))
        ));
    }

    #[test]
    fn test_load_missing_file() {
        let res = SimConfig::load("/tmp/kernel_sim_this_config_does_not_exist.txt");
        assert!(matches!(res, Err(ConfigError::Io(_))));
    }
}
