/*
    LogFox
    https://github.com/dbalsom/logfox

    Copyright 2024-2025 Daniel Balsom

    Permission is hereby granted, free of charge, to any person obtaining a
    copy of this software and associated documentation files (the “Software”),
    to deal in the Software without restriction, including without limitation
    the rights to use, copy, modify, merge, publish, distribute, sublicense,
    and/or sell copies of the Software, and to permit persons to whom the
    Software is furnished to do so, subject to the following conditions:

    The above copyright notice and this permission notice shall be included in
    all copies or substantial portions of the Software.

    THE SOFTWARE IS PROVIDED “AS IS”, WITHOUT WARRANTY OF ANY KIND, EXPRESS OR
    IMPLIED, INCLUDING BUT NOT LIMITED TO THE WARRANTIES OF MERCHANTABILITY,
    FITNESS FOR A PARTICULAR PURPOSE AND NONINFRINGEMENT. IN NO EVENT SHALL THE
    AUTHORS OR COPYRIGHT HOLDERS BE LIABLE FOR ANY CLAIM, DAMAGES OR OTHER
    LIABILITY, WHETHER IN AN ACTION OF CONTRACT, TORT OR OTHERWISE, ARISING
    FROM, OUT OF OR IN CONNECTION WITH THE SOFTWARE OR THE USE OR OTHER
    DEALINGS IN THE SOFTWARE.

    --------------------------------------------------------------------------
*/

//! LogFox reads the two record-oriented binary formats used for well-log
//! data in petrophysics: RP66 (also known as DLIS) and its tape-era
//! predecessor LIS-79.
//!
//! Both formats layer structured metadata and streaming frame data over a
//! physical-record transport. LogFox exposes:
//!
//! - a layered byte-stream stack composing optional tape-image and RP66
//!   visible-record framings over a raw source ([`stream`]),
//! - record framers that reassemble logical records from segment or
//!   physical-record chains ([`dlis::records`], [`lis::device`]),
//! - typed decoders for RP66 object sets and LIS data-format
//!   specifications, and a frame packer that materializes implicit records
//!   into tabular rows ([`dlis::object_set`], [`lis::dfsr`],
//!   [`lis::frames`]).

pub mod dlis;
pub mod errors;
pub mod io;
pub mod lis;
pub mod stream;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum WellLogError {
    #[error("An IO error occurred reading the well log: {0}")]
    IoError(String),
    #[error("Unexpected end of stream")]
    Eof,
    #[error("Declared data extends past the end of the file: {0}")]
    Truncation(String),
    #[error("Pattern not found within the search window: {0}")]
    NotFound(String),
    #[error("Partial match suggests the file is corrupted: {0}")]
    Inconsistent(String),
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),
    #[error("Record contents could not be parsed: {0}")]
    Parse(String),
}

impl From<std::io::Error> for WellLogError {
    fn from(err: std::io::Error) -> Self {
        match err.kind() {
            std::io::ErrorKind::UnexpectedEof => WellLogError::Eof,
            _ => WellLogError::IoError(err.to_string()),
        }
    }
}

impl From<binrw::Error> for WellLogError {
    fn from(err: binrw::Error) -> Self {
        match err {
            binrw::Error::Io(io_err) => WellLogError::from(io_err),
            other => WellLogError::Parse(other.to_string()),
        }
    }
}

pub use errors::{escape_level, set_escape_level, ParseIssue, Severity};
pub use stream::{Stream, StreamLayer};
