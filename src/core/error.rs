// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 itsakeyfut
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

/// Emulator error types
use thiserror::Error;

/// Result type for emulator operations
pub type Result<T> = std::result::Result<T, EmulatorError>;

/// Main error type for the emulator
#[derive(Error, Debug)]
pub enum EmulatorError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Parse error: {0}")]
    Parse(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("CD drive error: {0}")]
    Cdd(#[from] CddError),

    #[error("Save state error: {0}")]
    SaveState(String),

    #[error("Incompatible save state version: {got} (expected {expected})")]
    SaveStateVersion { expected: u32, got: u32 },
}

/// CD drive error types
///
/// The drive protocol itself never fails; these only come out of disc
/// insertion and TOC sheet handling.
#[derive(Error, Debug)]
pub enum CddError {
    #[error("No disc inserted")]
    NoDisc,

    #[error("Disc has no tracks")]
    NoTracks,

    #[error("Invalid timecode: '{0}'")]
    InvalidTimecode(String),

    #[error("Disc load error: {0}")]
    DiscLoadError(String),

    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),
}
