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

//! Mega-CD drive emulation core library
//!
//! This library emulates the CD drive (CDD) and CD controller (CDC) as the
//! sub-CPU sees them: a command block in, a checksummed status block out,
//! with the transport state machine, seek timing and sector feeding in
//! between.
//!
//! # Example
//!
//! ```
//! use mcdrive::core::cdd::{CommandBlock, DriveController, DriveStatus};
//! use mcdrive::core::loader::SheetDisc;
//!
//! let mut disc = SheetDisc::new();
//! let mut drive = DriveController::new();
//! drive.reset();
//!
//! // No disc: transport commands report NoDisc
//! drive.submit_command(CommandBlock::new(0x3, [0; 8]), &mut disc);
//! drive.tick(&mut disc);
//! assert_eq!(drive.status(), DriveStatus::NoDisc);
//! ```

pub mod core;
