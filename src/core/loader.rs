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

//! TOC sheet loading
//!
//! Disc image formats are handled by the frontend. For tooling and tests the
//! drive can instead be fed a TOC sheet: a TOML file listing track start
//! times and the lead-out.
//!
//! # TOC Sheet Format
//!
//! ```toml
//! lead_out = "12:34:56"
//!
//! [[track]]
//! start = "00:02:00"      # track 1, data
//!
//! [[track]]
//! start = "03:10:20"      # track 2, audio
//! title = "Opening"
//! ```
//!
//! Timecodes are decimal `MM:SS:FF`.
//!
//! # Example
//!
//! ```
//! use mcdrive::core::loader::TocSheet;
//!
//! let toc = TocSheet::parse(r#"
//! lead_out = "10:00:00"
//! [[track]]
//! start = "00:02:00"
//! [[track]]
//! start = "04:00:00"
//! "#).unwrap();
//!
//! assert_eq!(toc.last_track(), 2);
//! ```

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use super::cdd::{DriveHooks, Msf, Toc, FRAMES_PER_SECOND};
use super::error::CddError;

/// One track entry of a TOC sheet
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrackEntry {
    /// Start timecode (`MM:SS:FF`)
    pub start: String,

    /// Optional label, for humans only
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
}

/// TOML description of a disc's Table of Contents
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TocSheet {
    /// Lead-out timecode (`MM:SS:FF`)
    pub lead_out: String,

    /// Tracks in disc order
    #[serde(rename = "track", default)]
    pub tracks: Vec<TrackEntry>,
}

impl TocSheet {
    /// Parse a TOC sheet and build its [`Toc`]
    pub fn parse(text: &str) -> Result<Toc, CddError> {
        let sheet: TocSheet =
            toml::from_str(text).map_err(|e| CddError::DiscLoadError(e.to_string()))?;
        sheet.to_toc()
    }

    /// Load a TOC sheet from a file
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Toc, CddError> {
        let text = std::fs::read_to_string(path.as_ref())?;
        Self::parse(&text)
    }

    /// Validate the sheet and build its [`Toc`]
    ///
    /// Tracks must be in ascending order and end before the lead-out.
    pub fn to_toc(&self) -> Result<Toc, CddError> {
        if self.tracks.is_empty() {
            return Err(CddError::NoTracks);
        }
        if self.tracks.len() > 99 {
            return Err(CddError::DiscLoadError(format!(
                "Too many tracks: {}",
                self.tracks.len()
            )));
        }

        let starts = self
            .tracks
            .iter()
            .map(|track| parse_msf(&track.start))
            .collect::<Result<Vec<_>, _>>()?;
        let lead_out = parse_msf(&self.lead_out)?;

        let mut previous = i32::MIN;
        for (index, start) in starts.iter().chain(std::iter::once(&lead_out)).enumerate() {
            let lba = start.to_lba();
            if lba <= previous {
                return Err(CddError::DiscLoadError(format!(
                    "Entry {} at {} is not after the previous track",
                    index + 1,
                    start
                )));
            }
            previous = lba;
        }

        Ok(Toc::new(starts, lead_out))
    }
}

/// Parse a decimal `MM:SS:FF` timecode
///
/// # Example
///
/// ```
/// use mcdrive::core::cdd::Msf;
/// use mcdrive::core::loader::parse_msf;
///
/// assert_eq!(parse_msf("03:10:20").unwrap(), Msf::new(3, 10, 20));
/// assert!(parse_msf("03:60:00").is_err());
/// ```
pub fn parse_msf(text: &str) -> Result<Msf, CddError> {
    let parts: Vec<&str> = text.trim().split(':').collect();
    if parts.len() != 3 {
        return Err(CddError::InvalidTimecode(text.to_string()));
    }

    let field = |part: &str| {
        part.parse::<u8>()
            .map_err(|_| CddError::InvalidTimecode(text.to_string()))
    };

    let msf = Msf::new(field(parts[0])?, field(parts[1])?, field(parts[2])?);
    if msf.minute > 99 || msf.second >= 60 || msf.frame as i32 >= FRAMES_PER_SECOND {
        return Err(CddError::InvalidTimecode(text.to_string()));
    }

    Ok(msf)
}

/// Disc collaborator backed by TOC sheets
///
/// Loads sheets on insert and records what the drive asks of it. The
/// decoder accepts every data sector, one at a time.
#[derive(Debug, Default)]
pub struct SheetDisc {
    /// Sheet currently loaded
    pub loaded: Option<PathBuf>,
    /// Data sector headers handed to the decoder
    pub decoded_headers: Vec<[u8; 4]>,
    /// Audio ticks (zeroed headers) seen by the decoder
    pub audio_ticks: u64,
    /// CD-DA playback starts
    pub audio_starts: u32,
    /// Interrupt levels raised, in order
    pub interrupts: Vec<u8>,
    /// Tray open / close notifications
    pub tray_opens: u32,
    pub tray_closes: u32,
}

impl SheetDisc {
    pub fn new() -> Self {
        Self::default()
    }
}

impl DriveHooks for SheetDisc {
    fn load_disc(&mut self, path: &Path) -> Result<Toc, CddError> {
        let toc = TocSheet::load(path)?;
        self.loaded = Some(path.to_path_buf());
        Ok(toc)
    }

    fn unload_disc(&mut self) {
        if let Some(path) = self.loaded.take() {
            log::debug!("Unloaded TOC sheet {}", path.display());
        }
    }

    fn decode_sector(&mut self, header: [u8; 4]) -> i32 {
        if header == [0; 4] {
            self.audio_ticks += 1;
        } else {
            self.decoded_headers.push(header);
        }
        1
    }

    fn start_audio_playback(&mut self) {
        self.audio_starts += 1;
    }

    fn raise_interrupt(&mut self, level: u8) {
        self.interrupts.push(level);
    }

    fn on_tray_open(&mut self) {
        self.tray_opens += 1;
    }

    fn on_tray_close(&mut self) {
        self.tray_closes += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::Builder;

    const SHEET: &str = r#"
lead_out = "20:00:00"

[[track]]
start = "00:02:00"

[[track]]
start = "05:00:00"
title = "Stage 1"

[[track]]
start = "09:30:10"
"#;

    #[test]
    fn test_sheet_parsing() {
        let toc = TocSheet::parse(SHEET).unwrap();
        assert_eq!(toc.last_track(), 3);
        assert_eq!(toc.track_to_msf(2), Msf::new(5, 0, 0));
        assert_eq!(toc.track_to_msf(3), Msf::new(9, 30, 10));
        assert_eq!(toc.lead_out(), Msf::new(20, 0, 0));
    }

    #[test]
    fn test_sheet_without_tracks() {
        let result = TocSheet::parse("lead_out = \"01:00:00\"");
        assert!(matches!(result, Err(CddError::NoTracks)));
    }

    #[test]
    fn test_sheet_out_of_order() {
        let sheet = r#"
lead_out = "20:00:00"
[[track]]
start = "05:00:00"
[[track]]
start = "04:00:00"
"#;
        assert!(matches!(
            TocSheet::parse(sheet),
            Err(CddError::DiscLoadError(_))
        ));
    }

    #[test]
    fn test_sheet_lead_out_before_last_track() {
        let sheet = r#"
lead_out = "01:00:00"
[[track]]
start = "00:02:00"
[[track]]
start = "02:00:00"
"#;
        assert!(TocSheet::parse(sheet).is_err());
    }

    #[test]
    fn test_sheet_bad_toml() {
        assert!(matches!(
            TocSheet::parse("lead_out = "),
            Err(CddError::DiscLoadError(_))
        ));
    }

    #[test]
    fn test_parse_msf_rejects_garbage() {
        assert!(parse_msf("1:2").is_err());
        assert!(parse_msf("aa:00:00").is_err());
        assert!(parse_msf("00:00:75").is_err());
        assert!(parse_msf("100:00:00").is_err());
        assert_eq!(parse_msf(" 00:02:00 ").unwrap(), Msf::new(0, 2, 0));
    }

    #[test]
    fn test_load_from_file() {
        let mut file = Builder::new().suffix(".toml").tempfile().unwrap();
        file.write_all(SHEET.as_bytes()).unwrap();

        let mut disc = SheetDisc::new();
        let toc = disc.load_disc(file.path()).unwrap();
        assert_eq!(toc.last_track(), 3);
        assert_eq!(disc.loaded.as_deref(), Some(file.path()));

        disc.unload_disc();
        assert!(disc.loaded.is_none());
    }

    #[test]
    fn test_load_missing_file() {
        let mut disc = SheetDisc::new();
        let result = disc.load_disc(Path::new("/nonexistent/disc.toml"));
        assert!(matches!(result, Err(CddError::IoError(_))));
        assert!(disc.loaded.is_none());
    }
}
