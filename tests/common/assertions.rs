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

//! Custom assertions for drive testing

use mcdrive::core::cdd::{checksum, DriveController, DriveStatus};

/// Assert the exported status block carries `expected` and a valid checksum
#[allow(dead_code)]
pub fn assert_status_block(drive: &DriveController, expected: [u8; 9]) {
    let actual = drive.registers().status_bytes();
    assert_eq!(
        &actual[..9],
        &expected,
        "Status block mismatch: expected {:X?}, got {:X?}",
        expected,
        &actual[..9]
    );
    assert_eq!(
        actual[9],
        checksum(&actual[..9]),
        "Status checksum mismatch in {:X?}",
        actual
    );
}

/// Assert the first two bytes of the exported status block
#[allow(dead_code)]
pub fn assert_status_word(drive: &DriveController, expected: u16) {
    let bytes = drive.registers().status_bytes();
    let actual = u16::from_be_bytes([bytes[0], bytes[1]]);
    assert_eq!(
        actual, expected,
        "Status word mismatch: expected 0x{:04X}, got 0x{:04X}",
        expected, actual
    );
}

/// Assert drive status and position
#[allow(dead_code)]
pub fn assert_transport(drive: &DriveController, status: DriveStatus, lba: i32) {
    assert_eq!(drive.status(), status, "Drive status mismatch");
    assert_eq!(drive.cur_lba(), lba, "LBA mismatch");
}
