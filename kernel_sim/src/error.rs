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

/// Errors while loading or validating a [`SimConfig`](crate::SimConfig).
///
/// The simulator is never started with a configuration that produced one of these.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("could not read configuration file: {0}")]
    Io(#[from] std::io::Error),

    #[error("missing configuration key `{0}`")]
    MissingKey(&'static str),

    #[error("invalid value `{value}` for configuration key `{key}`")]
    InvalidValue { key: String, value: String },

    #[error("unknown configuration key `{0}`")]
    UnknownKey(String),

    #[error("invalid configuration: {0}")]
    Invalid(String),
}

/// Errors returned by the operations of a [`Kernel`](crate::Kernel).
///
/// Failing to admit a process into memory is not an error: it is reported as
/// [`Admission::Deferred`](crate::modules::memory::Admission::Deferred) and
/// the process simply waits for a later tick.
#[derive(Debug, thiserror::Error)]
pub enum KernelError {
    #[error("kernel is not initialized")]
    NotInitialized,

    #[error("process `{0}` already exists")]
    DuplicateProcessName(String),

    #[error("process `{name}` needs {memory_size} bytes but only {capacity} bytes exist")]
    ProcessTooLarge {
        name: String,
        memory_size: usize,
        capacity: usize,
    },

    #[error("invalid process `{name}`: {reason}")]
    InvalidProcessSpec { name: String, reason: &'static str },

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("could not start simulator thread: {0}")]
    ThreadSpawn(#[from] std::io::Error),
}
