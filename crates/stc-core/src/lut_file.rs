//! Text LUT file parsers for the calibration overrides.
//!
//! # Channel LUT format (gamma / inverse gamma)
//!
//! ```text
//! entries:1024
//! 0,4,8,12, ... (1024 red values), ... (1024 green values), ... (1024 blue values)
//! ```
//!
//! The header declares the per-channel entry count `N`. The remaining tokens
//! are comma separated (line breaks are treated as separators too) and are
//! consumed as three sequential runs of `N` values: red, then green, then blue.
//! Tokens past the third run are ignored.
//!
//! # Gamut LUT format
//!
//! ```text
//! 0,0,0
//! 0,0,255
//! ...
//! ```
//!
//! Exactly `capacity` lines of `r,g,b`, one output entry per line, in table
//! order. Lines past `capacity` are ignored.
//!
//! Both parsers build their result in fresh buffers, so a failed parse never
//! exposes a partially filled table.

use std::fs::File;
use std::io::{BufRead, BufReader, Read};
use std::path::Path;

use bytemuck::{Pod, Zeroable};
use serde::{Deserialize, Serialize};

use crate::error::EngineError;

/// Entries per axis of the hardware gamut grid.
pub const GAMUT_GRID_SIZE: usize = 17;
/// Fixed entry count of the gamut LUT (17³).
pub const GAMUT_LUT_ENTRIES: usize = GAMUT_GRID_SIZE * GAMUT_GRID_SIZE * GAMUT_GRID_SIZE;

/// Errors produced while parsing a LUT file.
#[derive(Debug, thiserror::Error)]
pub enum LutParseError {
    #[error("missing or invalid entry count in header {0:?}")]
    InvalidEntryCount(String),

    #[error("{channel} run is short: expected {expected} values, found {found}")]
    ShortRun {
        channel: &'static str,
        expected: usize,
        found: usize,
    },

    #[error("invalid integer token {token:?}")]
    InvalidToken { token: String },

    #[error("gamut file is short: expected {expected} lines, found {found}")]
    ShortFile { expected: usize, found: usize },

    #[error("malformed gamut entry on line {line}: {reason}")]
    MalformedLine { line: usize, reason: &'static str },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Three equal-length per-channel tables parsed from a channel LUT file.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ChannelLut {
    pub red: Vec<u32>,
    pub green: Vec<u32>,
    pub blue: Vec<u32>,
}

impl ChannelLut {
    /// Per-channel entry count.
    pub fn len(&self) -> usize {
        self.red.len()
    }

    pub fn is_empty(&self) -> bool {
        self.red.is_empty()
    }
}

/// One output entry of the 3D gamut LUT.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Pod, Zeroable, Serialize, Deserialize)]
pub struct GamutEntry {
    pub r: u32,
    pub g: u32,
    pub b: u32,
}

/// Open and parse a channel LUT file.
pub fn read_channel_lut(path: &Path) -> Result<ChannelLut, EngineError> {
    let file = open(path)?;
    Ok(parse_channel_lut(BufReader::new(file))?)
}

/// Open and parse a gamut LUT file holding exactly `capacity` entries.
pub fn read_gamut_lut(path: &Path, capacity: usize) -> Result<Vec<GamutEntry>, EngineError> {
    let file = open(path)?;
    Ok(parse_gamut_lut(BufReader::new(file), capacity)?)
}

fn open(path: &Path) -> Result<File, EngineError> {
    File::open(path).map_err(|e| {
        tracing::error!("Failed to open LUT file {}: {e}", path.display());
        EngineError::FileNotFound(path.to_path_buf())
    })
}

/// Parse the channel LUT format from a reader.
pub fn parse_channel_lut<R: BufRead>(mut reader: R) -> Result<ChannelLut, LutParseError> {
    let mut header = String::new();
    reader.read_line(&mut header)?;
    let header = header.trim_end();
    tracing::debug!("Channel LUT header: {header}");

    let entries = header
        .split_once(':')
        .and_then(|(_, count)| count.trim().parse::<usize>().ok())
        .filter(|&n| n > 0)
        .ok_or_else(|| LutParseError::InvalidEntryCount(header.to_string()))?;

    let mut body = String::new();
    reader.read_to_string(&mut body)?;
    let mut tokens = body
        .split(|c: char| c == ',' || c.is_whitespace())
        .filter(|t| !t.is_empty());

    let red = take_run(&mut tokens, entries, "red")?;
    let green = take_run(&mut tokens, entries, "green")?;
    let blue = take_run(&mut tokens, entries, "blue")?;

    Ok(ChannelLut { red, green, blue })
}

fn take_run<'a>(
    tokens: &mut impl Iterator<Item = &'a str>,
    expected: usize,
    channel: &'static str,
) -> Result<Vec<u32>, LutParseError> {
    // The count comes from the file header; grow with the tokens actually read.
    let mut run = Vec::new();
    for token in tokens.by_ref().take(expected) {
        run.push(parse_token(token)?);
    }
    if run.len() != expected {
        return Err(LutParseError::ShortRun {
            channel,
            expected,
            found: run.len(),
        });
    }
    Ok(run)
}

fn parse_token(token: &str) -> Result<u32, LutParseError> {
    token
        .trim()
        .parse()
        .map_err(|_| LutParseError::InvalidToken {
            token: token.to_string(),
        })
}

/// Parse the gamut LUT format from a reader.
pub fn parse_gamut_lut<R: BufRead>(
    reader: R,
    capacity: usize,
) -> Result<Vec<GamutEntry>, LutParseError> {
    let mut entries = Vec::with_capacity(capacity);
    let mut lines = reader.lines();

    for index in 0..capacity {
        let line_no = index + 1;
        let Some(line) = lines.next() else {
            return Err(LutParseError::ShortFile {
                expected: capacity,
                found: index,
            });
        };
        let line = line?;
        let line = line.trim();
        if line.is_empty() {
            return Err(LutParseError::MalformedLine {
                line: line_no,
                reason: "empty line",
            });
        }

        let mut parts = line.splitn(3, ',');
        let (Some(r), Some(g), Some(b)) = (parts.next(), parts.next(), parts.next()) else {
            return Err(LutParseError::MalformedLine {
                line: line_no,
                reason: "expected three comma-separated values",
            });
        };

        entries.push(GamutEntry {
            r: parse_token(r)?,
            g: parse_token(g)?,
            b: parse_token(b)?,
        });
    }

    Ok(entries)
}
