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

use super::super::*;
use super::helpers::*;

fn query(drive: &mut DriveController, hooks: &mut RecordingHooks, sub: u8, track: u8) -> StatusBlock {
    send(drive, hooks, 0x2, toc_params(sub, track));
    assert!(drive.response_pending());
    *drive.response()
}

#[test]
fn test_decode_toc_queries() {
    let decode = |sub: u8, track: u8| CddCommand::decode(&CommandBlock::new(0x2, toc_params(sub, track)));

    assert_eq!(decode(0, 0), CddCommand::ReadToc(TocQuery::AbsolutePosition));
    assert_eq!(decode(1, 0), CddCommand::ReadToc(TocQuery::RelativePosition));
    assert_eq!(decode(2, 0), CddCommand::ReadToc(TocQuery::CurrentTrack));
    assert_eq!(decode(3, 0), CddCommand::ReadToc(TocQuery::DiscLength));
    assert_eq!(decode(4, 0), CddCommand::ReadToc(TocQuery::FirstLastTrack));
    assert_eq!(decode(5, 12), CddCommand::ReadToc(TocQuery::TrackStart(12)));
    assert_eq!(decode(9, 0), CddCommand::ReadToc(TocQuery::Invalid(9)));
}

#[test]
fn test_absolute_position() {
    let (mut drive, mut hooks) = drive_with_disc();
    seek(&mut drive, &mut hooks, 3, 1, 5);

    let response = query(&mut drive, &mut hooks, 0, 0);

    assert_eq!(response.status, 0x0400);
    assert_eq!(response.minute, 0x0003);
    assert_eq!(response.second, 0x0001);
    assert_eq!(response.frame, 0x0005);
    assert_eq!(response.ext, 0);
}

#[test]
fn test_relative_position() {
    let (mut drive, mut hooks) = drive_with_disc();
    seek(&mut drive, &mut hooks, 3, 1, 5);

    let response = query(&mut drive, &mut hooks, 1, 0);

    // 80 sectors into track 2
    assert_eq!(response.status, 0x0401);
    assert_eq!(response.minute, 0x0000);
    assert_eq!(response.second, 0x0001);
    assert_eq!(response.frame, 0x0005);
}

#[test]
fn test_relative_position_in_pregap() {
    let (mut drive, mut hooks) = drive_with_disc();
    drive.session.status = DriveStatus::Ready;

    let response = query(&mut drive, &mut hooks, 1, 0);

    // Before track 1 the elapsed time is negative and collapses to zero
    assert_eq!((response.minute, response.second, response.frame), (0, 0, 0));
}

#[test]
fn test_current_track() {
    let (mut drive, mut hooks) = drive_with_disc();
    seek(&mut drive, &mut hooks, 6, 30, 0);
    drive.session.cur_track = 0;

    let response = query(&mut drive, &mut hooks, 2, 0);

    assert_eq!(response.status, 0x0402);
    assert_eq!(response.minute, 0x0003);
    assert_eq!(drive.cur_track(), 3);
}

#[test]
fn test_current_track_past_lead_out() {
    let (mut drive, mut hooks) = drive_with_disc();
    seek(&mut drive, &mut hooks, 11, 0, 0);

    let response = query(&mut drive, &mut hooks, 2, 0);

    assert_eq!(response.minute, 0x0A02);
    assert_eq!(drive.cur_track(), PAST_LAST_TRACK);
}

#[test]
fn test_disc_length() {
    let (mut drive, mut hooks) = drive_with_disc();

    let response = query(&mut drive, &mut hooks, 3, 0);

    assert_eq!(response.status, 0x0403);
    assert_eq!(response.minute, 0x0100);
    assert_eq!(response.second, 0);
    assert_eq!(response.frame, 0);
}

#[test]
fn test_first_last_track() {
    let (mut drive, mut hooks) = drive_with_disc();

    let response = query(&mut drive, &mut hooks, 4, 0);

    assert_eq!(response.status, 0x0404);
    assert_eq!(response.minute, 0x0001);
    assert_eq!(response.second, 0x0003);
    assert_eq!(response.frame, 0);
}

#[test]
fn test_track_start_audio() {
    let (mut drive, mut hooks) = drive_with_disc();

    let response = query(&mut drive, &mut hooks, 5, 2);

    assert_eq!(response.status, 0x0405);
    assert_eq!(response.minute, 0x0003);
    assert_eq!(response.second, 0);
    assert_eq!(response.frame, 0);
    assert_eq!(response.ext, 2);
}

#[test]
fn test_track_start_data_flag() {
    let (mut drive, mut hooks) = drive_with_disc();

    let response = query(&mut drive, &mut hooks, 5, 1);

    assert_eq!(response.minute, 0x0000);
    assert_eq!(response.second, 0x0002);
    assert_eq!(response.frame, 0x0800);
    assert_eq!(response.ext, 1);
}

#[test]
fn test_track_start_clamps_track() {
    let (mut drive, mut hooks) = drive_with_disc();

    let response = query(&mut drive, &mut hooks, 5, 0);
    assert_eq!(response.ext, 1);
    assert_eq!(response.frame, 0x0800);

    let response = query(&mut drive, &mut hooks, 5, 45);
    assert_eq!(response.ext, 3);
    assert_eq!(response.minute, 0x0006);
    assert_eq!(response.second, 0x0300);
}

#[test]
fn test_invalid_sub_opcode_answers_status() {
    let (mut drive, mut hooks) = drive_with_disc();
    seek(&mut drive, &mut hooks, 3, 0, 0);
    send(&mut drive, &mut hooks, 0x0, [0; 8]);
    drive.tick(&mut hooks);
    let session = drive.session().clone();

    let response = query(&mut drive, &mut hooks, 7, 0);

    assert_eq!(response.status, 0x040F);
    assert_eq!(drive.session().status, session.status);
    assert_eq!(drive.cur_lba(), session.cur_lba);
}

#[test]
fn test_toc_without_disc() {
    let (mut drive, mut hooks) = empty_drive();

    let response = query(&mut drive, &mut hooks, 4, 0);

    assert_eq!(drive.status(), DriveStatus::NoDisc);
    assert_eq!(response.status, 0x0004);
    assert_eq!(response.minute, 0x0001);
    assert_eq!(response.second, 0x0000);
}

#[test]
fn test_toc_with_tray_open() {
    let (mut drive, mut hooks) = drive_with_disc();
    open_tray(&mut drive, &mut hooks);

    let response = query(&mut drive, &mut hooks, 3, 0);

    assert_eq!(response.status, 0x0500);
    assert_eq!((response.minute, response.second, response.frame), (0, 0, 0));
}
