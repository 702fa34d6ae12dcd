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

//! LIS-79 support: physical-record framing over a device with tape-era
//! padding conventions, the data-format-specification record that declares
//! per-channel frame layouts, and the packer that turns implicit records
//! into tabular rows.

pub mod codecs;
pub mod device;
pub mod dfsr;
pub mod frames;
pub mod types;

pub use device::{open, open_source, LisDevice, LisRecord, RecordIndex, RecordInfo};
pub use dfsr::{dfs_fmtstr, parse_dfsr, Dfsr, EntryBlock, SpecBlock};
pub use frames::{read_fdata, FrameData};
pub use types::{EntryType, LisReprc, LisValue, RecordType};
