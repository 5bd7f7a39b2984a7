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

//! Drive save states
//!
//! Captures the complete drive state (transport session, pending response,
//! host registers and the inserted disc's TOC) so emulation can be paused
//! and resumed later.
//!
//! The disc image itself is owned by the frontend and is not saved; it has
//! to be loaded again before a restored drive reads sectors.
//!
//! Save states are serialized using bincode for efficient binary encoding.
//!
//! # Example
//!
//! ```
//! use mcdrive::core::cdd::DriveController;
//!
//! let drive = DriveController::new();
//! let snapshot = drive.snapshot("boot");
//! let bytes = snapshot.to_bytes().unwrap();
//!
//! let mut restored = DriveController::new();
//! restored.restore(&mcdrive::core::save_state::DriveSnapshot::from_bytes(&bytes).unwrap());
//! assert_eq!(restored.cur_lba(), drive.cur_lba());
//! ```

use std::fs::File;
use std::io::{Read, Write};
use std::path::Path;

use bincode::{config, Decode, Encode};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::cdd::{DriveController, HostRegisters, SessionState, StatusBlock, Toc};
use super::error::{EmulatorError, Result};

/// Current save state format version
pub const SNAPSHOT_VERSION: u32 = 1;

/// Save state metadata
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Encode, Decode)]
pub struct SnapshotMetadata {
    /// Timestamp when the snapshot was taken
    #[bincode(with_serde)]
    pub timestamp: DateTime<Utc>,

    /// Free-form label supplied by the caller
    pub label: String,
}

/// Complete drive state
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Encode, Decode)]
pub struct DriveSnapshot {
    /// Version number for compatibility checking
    pub version: u32,

    pub metadata: SnapshotMetadata,

    #[bincode(with_serde)]
    pub session: SessionState,

    /// Response waiting to be exported
    #[bincode(with_serde)]
    pub response: StatusBlock,

    #[bincode(with_serde)]
    pub registers: HostRegisters,

    #[bincode(with_serde)]
    pub toc: Toc,

    pub disc_present: bool,
}

impl DriveSnapshot {
    /// Encode with bincode
    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        bincode::encode_to_vec(self, config::standard())
            .map_err(|e| EmulatorError::SaveState(e.to_string()))
    }

    /// Decode with bincode and check the format version
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        let (snapshot, _): (DriveSnapshot, usize) =
            bincode::decode_from_slice(bytes, config::standard())
                .map_err(|e| EmulatorError::SaveState(e.to_string()))?;

        if snapshot.version != SNAPSHOT_VERSION {
            return Err(EmulatorError::SaveStateVersion {
                expected: SNAPSHOT_VERSION,
                got: snapshot.version,
            });
        }

        Ok(snapshot)
    }

    /// Save to file
    ///
    /// # Example
    ///
    /// ```no_run
    /// # use mcdrive::core::cdd::DriveController;
    /// let drive = DriveController::new();
    /// drive.snapshot("quick").save_to_file("drive.state").unwrap();
    /// ```
    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let encoded = self.to_bytes()?;
        let mut file = File::create(path)?;
        file.write_all(&encoded)?;
        Ok(())
    }

    /// Load from file
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let mut file = File::open(path)?;
        let mut buffer = Vec::new();
        file.read_to_end(&mut buffer)?;
        Self::from_bytes(&buffer)
    }
}

impl DriveController {
    /// Capture the current drive state
    pub fn snapshot(&self, label: &str) -> DriveSnapshot {
        DriveSnapshot {
            version: SNAPSHOT_VERSION,
            metadata: SnapshotMetadata {
                timestamp: Utc::now(),
                label: label.to_string(),
            },
            session: self.session.clone(),
            response: self.response,
            registers: self.registers.clone(),
            toc: self.toc.clone(),
            disc_present: self.disc_present,
        }
    }

    /// Restore a previously captured state
    ///
    /// Configuration is not part of a snapshot and is left as is.
    pub fn restore(&mut self, snapshot: &DriveSnapshot) {
        self.session = snapshot.session.clone();
        self.response = snapshot.response;
        self.registers = snapshot.registers.clone();
        self.toc = snapshot.toc.clone();
        self.disc_present = snapshot.disc_present;

        log::info!(
            "Restored drive snapshot '{}' from {}",
            snapshot.metadata.label,
            snapshot.metadata.timestamp
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::cdd::{CommandBlock, DriveStatus, Msf};
    use crate::core::loader::SheetDisc;
    use tempfile::tempdir;

    fn playing_drive() -> DriveController {
        let mut drive = DriveController::new();
        drive.toc = Toc::new(vec![Msf::new(0, 2, 0), Msf::new(2, 0, 0)], Msf::new(8, 0, 0));
        drive.disc_present = true;
        drive.session.status = DriveStatus::Ready;

        let mut disc = SheetDisc::new();
        drive.submit_command(CommandBlock::new(0x3, [0, 0, 3, 0, 0, 0, 0, 0]), &mut disc);
        drive
    }

    #[test]
    fn test_snapshot_round_trip() {
        let drive = playing_drive();
        let snapshot = drive.snapshot("stage 2");

        let bytes = snapshot.to_bytes().unwrap();
        let decoded = DriveSnapshot::from_bytes(&bytes).unwrap();
        assert_eq!(decoded, snapshot);
        assert_eq!(decoded.metadata.label, "stage 2");
    }

    #[test]
    fn test_restore_resumes_playback_state() {
        let drive = playing_drive();
        let snapshot = drive.snapshot("resume");

        let mut restored = DriveController::new();
        restored.restore(&snapshot);

        assert_eq!(restored.status(), DriveStatus::Playing);
        assert_eq!(restored.cur_lba(), drive.cur_lba());
        assert_eq!(restored.cur_track(), 2);
        assert!(restored.is_reading());
        assert!(restored.response_pending());
        assert!(restored.has_disc());
        assert_eq!(restored.toc(), drive.toc());
    }

    #[test]
    fn test_version_mismatch() {
        let mut snapshot = DriveController::new().snapshot("old");
        snapshot.version = SNAPSHOT_VERSION + 1;
        let bytes = snapshot.to_bytes().unwrap();

        let result = DriveSnapshot::from_bytes(&bytes);
        assert!(matches!(
            result,
            Err(EmulatorError::SaveStateVersion { got, .. }) if got == SNAPSHOT_VERSION + 1
        ));
    }

    #[test]
    fn test_truncated_data() {
        let bytes = playing_drive().snapshot("cut").to_bytes().unwrap();
        let result = DriveSnapshot::from_bytes(&bytes[..bytes.len() / 2]);
        assert!(matches!(result, Err(EmulatorError::SaveState(_))));
    }

    #[test]
    fn test_file_round_trip() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("drive.state");

        let snapshot = playing_drive().snapshot("file");
        snapshot.save_to_file(&path).unwrap();

        let loaded = DriveSnapshot::load_from_file(&path).unwrap();
        assert_eq!(loaded, snapshot);
    }
}
