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

//! Host-visible register surface
//!
//! The drive talks to the sub-CPU through a small block of gate-array
//! registers. The ones this core touches are:
//!
//! ```text
//! 0x33      Interrupt mask (IEN1-IEN6)
//! 0x34-0x35 CDD fader
//! 0x36      CDC flags (bit 0: data track present)
//! 0x37      CDD control (DTS, DRS, HOCK)
//! 0x38-0x41 CDD status block   (drive -> host, 10 bytes)
//! 0x42-0x4B CDD command block  (host -> drive, 10 bytes)
//! ```
//!
//! Both blocks carry one BCD digit per byte and end with a 4-bit checksum.
//!
//! # Status block layout
//!
//! ```text
//! Byte 0-1: Status word (big-endian)
//! Byte 2-3: Minute digits
//! Byte 4-5: Second digits
//! Byte 6-7: Frame digits
//! Byte 8:   Ext
//! Byte 9:   Checksum (~sum(bytes 0-8) & 0xF)
//! ```

use bitflags::bitflags;
use serde::{Deserialize, Serialize};

use super::timecode::Msf;

/// Size of each CDD register block in bytes
pub const BLOCK_SIZE: usize = 10;

/// Checksum byte left in the status block after reset
pub const RESET_CHECKSUM: u8 = 0x0F;

bitflags! {
    /// Sub-CPU interrupt mask register (0x33)
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
    pub struct InterruptMask: u8 {
        const IEN1 = 1 << 1;
        const IEN2 = 1 << 2;
        const IEN3 = 1 << 3;
        /// CDD status ready
        const IEN4 = 1 << 4;
        const IEN5 = 1 << 5;
        const IEN6 = 1 << 6;
    }
}

impl InterruptMask {
    /// Enable bit for interrupt `level` (1-6)
    pub fn for_level(level: u8) -> Self {
        match level {
            1..=6 => Self::from_bits_retain(1 << level),
            _ => Self::empty(),
        }
    }
}

bitflags! {
    /// CDC flags register (0x36)
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
    pub struct CdcFlags: u8 {
        /// Current stream is data (set) or audio (clear)
        const DATA = 1 << 0;
    }
}

bitflags! {
    /// CDD control register (0x37)
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
    pub struct CddControl: u8 {
        const DTS = 1 << 0;
        const DRS = 1 << 1;
        /// Host clock: the host has a command ready
        const HOCK = 1 << 2;
    }
}

/// Convert a decimal value to a single BCD byte (`23` -> `0x23`)
///
/// Values above 99 saturate to `0x99`.
#[inline]
pub fn to_bcd_byte(value: u8) -> u8 {
    if value > 99 {
        return 0x99;
    }
    ((value / 10) << 4) | (value % 10)
}

/// Convert a BCD byte to decimal (`0x23` -> `23`)
#[inline]
pub fn from_bcd_byte(bcd: u8) -> u8 {
    (bcd >> 4) * 10 + (bcd & 0x0F)
}

/// Convert a decimal value to a BCD word, one digit per byte (`23` -> `0x0203`)
///
/// Values above 99 saturate to `0x0909`.
#[inline]
pub fn to_bcd_word(value: u8) -> u16 {
    if value > 99 {
        return 0x0909;
    }
    (((value / 10) as u16) << 8) | (value % 10) as u16
}

/// Convert a BCD word with one digit per byte back to decimal
///
/// Only the low nibble of each byte is significant.
#[inline]
pub fn from_bcd_word(word: u16) -> u8 {
    let [tens, units] = word.to_be_bytes();
    (tens & 0x0F) * 10 + (units & 0x0F)
}

/// 4-bit block checksum: ones' complement of the byte sum, low nibble
#[inline]
pub fn checksum(bytes: &[u8]) -> u8 {
    let sum = bytes.iter().fold(0u32, |acc, &b| acc + b as u32);
    (!sum & 0x0F) as u8
}

/// Host command block (registers 0x42-0x4B)
///
/// Byte 0 holds the opcode, bytes 1-8 one parameter digit each and byte 9
/// the host checksum. Every accessor masks to the low nibble, so garbage in
/// the high bits is ignored rather than rejected.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommandBlock {
    bytes: [u8; BLOCK_SIZE],
}

impl CommandBlock {
    /// Build a command block with a valid checksum
    ///
    /// # Example
    ///
    /// ```
    /// use mcdrive::core::cdd::CommandBlock;
    ///
    /// // Play from 00:02:00
    /// let block = CommandBlock::new(0x3, [0, 0, 0, 0, 2, 0, 0, 0]);
    /// assert_eq!(block.opcode(), 0x3);
    /// assert_eq!(block.msf().second, 2);
    /// ```
    pub fn new(opcode: u8, params: [u8; 8]) -> Self {
        let mut bytes = [0u8; BLOCK_SIZE];
        bytes[0] = opcode & 0x0F;
        for (dst, src) in bytes[1..9].iter_mut().zip(params) {
            *dst = src & 0x0F;
        }
        bytes[9] = checksum(&bytes[..9]);
        Self { bytes }
    }

    /// Wrap raw register bytes as written by the host
    pub fn from_bytes(bytes: [u8; BLOCK_SIZE]) -> Self {
        Self { bytes }
    }

    /// Raw register bytes
    pub fn bytes(&self) -> [u8; BLOCK_SIZE] {
        self.bytes
    }

    /// Command opcode nibble
    pub fn opcode(&self) -> u8 {
        self.digit(0)
    }

    /// Parameter digit at byte `index`
    pub fn digit(&self, index: usize) -> u8 {
        self.bytes.get(index).map_or(0, |b| b & 0x0F)
    }

    /// Two consecutive digits as a decimal number (tens at `index`)
    ///
    /// Digits above 9 are not rejected; `0xF, 0xF` decodes as 165.
    pub fn digit_pair(&self, index: usize) -> u8 {
        self.digit(index) * 10 + self.digit(index + 1)
    }

    /// Sub-opcode digit used by the TOC query command
    pub fn sub_opcode(&self) -> u8 {
        self.digit(3)
    }

    /// Requested timecode for Play/Seek (bytes 2-7)
    pub fn msf(&self) -> Msf {
        Msf::new(self.digit_pair(2), self.digit_pair(4), self.digit_pair(6))
    }

    /// Requested track for the track start query (bytes 4-5)
    pub fn track_number(&self) -> u8 {
        self.digit_pair(4)
    }

    /// Checksum byte as written by the host
    pub fn checksum(&self) -> u8 {
        self.bytes[9] & 0x0F
    }

    /// True when the host checksum matches the first nine bytes
    pub fn has_valid_checksum(&self) -> bool {
        self.checksum() == checksum(&self.bytes[..9])
    }
}

/// Drive response under construction
///
/// Each timecode field is a BCD word with one digit per byte, exactly as it
/// appears on the wire once exported.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusBlock {
    /// Status word: drive status in the high byte, report type in the low byte
    pub status: u16,
    pub minute: u16,
    pub second: u16,
    pub frame: u16,
    pub ext: u8,
}

impl StatusBlock {
    /// Zero the timecode and Ext fields, leaving the status word alone
    pub fn clear_timecode(&mut self) {
        self.minute = 0;
        self.second = 0;
        self.frame = 0;
        self.ext = 0;
    }

    /// Store `msf` as three BCD words
    pub fn set_timecode(&mut self, msf: Msf) {
        self.minute = to_bcd_word(msf.minute);
        self.second = to_bcd_word(msf.second);
        self.frame = to_bcd_word(msf.frame);
    }

    /// Serialise to the 10-byte wire format with checksum
    ///
    /// # Example
    ///
    /// ```
    /// use mcdrive::core::cdd::StatusBlock;
    ///
    /// let block = StatusBlock { status: 0x0102, minute: 0x0102, second: 0x0304, frame: 0x0506, ext: 0 };
    /// let bytes = block.to_bytes();
    /// assert_eq!(&bytes[..9], &[0x01, 0x02, 0x01, 0x02, 0x03, 0x04, 0x05, 0x06, 0x00]);
    /// assert_eq!(bytes[9], 0x7);
    /// ```
    pub fn to_bytes(&self) -> [u8; BLOCK_SIZE] {
        let mut bytes = [0u8; BLOCK_SIZE];
        bytes[0..2].copy_from_slice(&self.status.to_be_bytes());
        bytes[2..4].copy_from_slice(&self.minute.to_be_bytes());
        bytes[4..6].copy_from_slice(&self.second.to_be_bytes());
        bytes[6..8].copy_from_slice(&self.frame.to_be_bytes());
        bytes[8] = self.ext;
        bytes[9] = checksum(&bytes[..9]);
        bytes
    }
}

/// Gate-array registers shared with the host
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HostRegisters {
    /// Interrupt mask (0x33)
    pub(super) interrupt_mask: InterruptMask,
    /// CDD fader (0x34-0x35)
    pub(super) fader: u16,
    /// CDC flags (0x36)
    pub(super) cdc_flags: CdcFlags,
    /// CDD control (0x37)
    pub(super) cdd_control: CddControl,
    /// Exported status block (0x38-0x41)
    pub(super) status: [u8; BLOCK_SIZE],
    /// Host command block (0x42-0x4B)
    pub(super) command: CommandBlock,
}

impl HostRegisters {
    /// Power-on register state
    pub fn new() -> Self {
        let mut status = [0u8; BLOCK_SIZE];
        status[9] = RESET_CHECKSUM;
        Self {
            interrupt_mask: InterruptMask::empty(),
            fader: 0,
            cdc_flags: CdcFlags::empty(),
            cdd_control: CddControl::empty(),
            status,
            command: CommandBlock::default(),
        }
    }

    /// Clear everything a CDD reset touches
    ///
    /// The interrupt mask belongs to the host and survives.
    pub fn reset(&mut self) {
        let interrupt_mask = self.interrupt_mask;
        *self = Self::new();
        self.interrupt_mask = interrupt_mask;
    }

    /// Host write of the command block
    pub fn write_command(&mut self, bytes: [u8; BLOCK_SIZE]) {
        self.command = CommandBlock::from_bytes(bytes);
    }

    /// Current command block
    pub fn command(&self) -> &CommandBlock {
        &self.command
    }

    /// Host read of the status block
    pub fn status_bytes(&self) -> [u8; BLOCK_SIZE] {
        self.status
    }

    /// Interrupt mask as last written by the host
    pub fn interrupt_mask(&self) -> InterruptMask {
        self.interrupt_mask
    }

    /// Host write of the interrupt mask
    pub fn set_interrupt_mask(&mut self, mask: InterruptMask) {
        self.interrupt_mask = mask;
    }

    /// CD-DA fader volume
    pub fn fader(&self) -> u16 {
        self.fader
    }

    /// Host write of the fader volume
    pub fn set_fader(&mut self, value: u16) {
        self.fader = value;
    }

    /// CDC flags seen by the host
    pub fn cdc_flags(&self) -> CdcFlags {
        self.cdc_flags
    }

    /// CDD control bits
    pub fn cdd_control(&self) -> CddControl {
        self.cdd_control
    }

    /// Host write of the CDD control bits
    pub fn set_cdd_control(&mut self, value: CddControl) {
        self.cdd_control = value;
    }

    /// Set or clear the host-visible data-track bit
    pub(super) fn set_data_flag(&mut self, data: bool) {
        self.cdc_flags.set(CdcFlags::DATA, data);
    }

    /// Write an exported status image
    ///
    /// Also drops the control bits above DTS/DRS, which acknowledges the
    /// host's command clock.
    pub(super) fn store_status(&mut self, bytes: [u8; BLOCK_SIZE]) {
        self.status = bytes;
        self.cdd_control &= CddControl::DTS | CddControl::DRS;
    }
}

impl Default for HostRegisters {
    fn default() -> Self {
        Self::new()
    }
}
