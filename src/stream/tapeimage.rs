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

    src/stream/tapeimage.rs

    Tape-image (TIF) framing. A tape image prefixes every block of data
    with a 12-byte little-endian header (kind, previous, next), where the
    previous/next fields are offsets of the neighboring headers. Kind 1 is
    a tape mark, which terminates the logical stream.
*/

use binrw::{binrw, BinRead};

use super::StreamLayer;
use crate::{io::Cursor, WellLogError};

pub const TAPE_HEADER_SIZE: usize = 12;
pub const TAPE_RECORD_DATA: u32 = 0;
pub const TAPE_RECORD_MARK: u32 = 1;

#[derive(Debug)]
#[binrw]
#[brw(little)]
pub struct TapeImageHeader {
    pub kind: u32,
    pub prev: u32,
    pub next: u32,
}

/// One tape record discovered so far: where its payload starts in the
/// logical and physical domains, and how long it is.
#[derive(Copy, Clone, Debug)]
struct TapeMarker {
    ltell: u64,
    ptell: u64,
    len: u64,
}

pub struct TapeImageLayer {
    inner: Box<dyn StreamLayer>,
    /// Physical offset of the first header. The prev/next fields in tape
    /// image headers are relative to this origin.
    base: u64,
    markers: Vec<TapeMarker>,
    /// True once a tape mark or end-of-data has been seen; the marker
    /// table then covers the entire logical stream.
    exhausted: bool,
    pos: u64,
    at_eof: bool,
}

impl TapeImageLayer {
    pub fn open(inner: Box<dyn StreamLayer>) -> Result<TapeImageLayer, WellLogError> {
        let base = inner.tell();
        let mut layer = TapeImageLayer {
            inner,
            base,
            markers: Vec::new(),
            exhausted: false,
            pos: 0,
            at_eof: false,
        };

        if layer.read_header()?.is_none() && layer.markers.is_empty() {
            return Err(WellLogError::Eof);
        }
        Ok(layer)
    }

    /// Read the next framing header and append its marker. Returns `None`
    /// once a tape mark or the physical end of data is reached.
    fn read_header(&mut self) -> Result<Option<TapeMarker>, WellLogError> {
        if self.exhausted {
            return Ok(None);
        }

        let phys = match self.markers.last() {
            Some(m) => m.ptell + m.len,
            None => self.base,
        };

        self.inner.seek(phys)?;
        let mut buf = [0u8; TAPE_HEADER_SIZE];
        let nread = self.inner.read(&mut buf)?;
        if nread == 0 {
            self.exhausted = true;
            return Ok(None);
        }
        if nread < TAPE_HEADER_SIZE {
            return Err(WellLogError::Truncation(format!(
                "tape image header cut short at physical offset {}",
                phys
            )));
        }

        let header = TapeImageHeader::read(&mut Cursor::new(&buf))?;
        log::trace!(
            "tapeimage: header at {:#x}: kind {} prev {} next {}",
            phys,
            header.kind,
            header.prev,
            header.next
        );

        match header.kind {
            TAPE_RECORD_MARK => {
                self.exhausted = true;
                return Ok(None);
            }
            TAPE_RECORD_DATA => {}
            other => {
                return Err(WellLogError::Inconsistent(format!(
                    "unknown tape image record kind {} at physical offset {}",
                    other, phys
                )));
            }
        }

        let payload_start = phys + TAPE_HEADER_SIZE as u64;
        let payload_end = self.base + header.next as u64;
        if payload_end < payload_start {
            return Err(WellLogError::Inconsistent(format!(
                "tape image record at physical offset {} ends before its own header",
                phys
            )));
        }

        let ltell = self.markers.last().map(|m| m.ltell + m.len).unwrap_or(0);
        let marker = TapeMarker {
            ltell,
            ptell: payload_start,
            len: payload_end - payload_start,
        };
        self.markers.push(marker);
        Ok(Some(marker))
    }

    /// Find the marker whose payload contains logical offset `pos`,
    /// extending the marker table as needed. `None` means `pos` is at or
    /// beyond the logical end of the stream.
    fn marker_for(&mut self, pos: u64) -> Result<Option<TapeMarker>, WellLogError> {
        loop {
            if let Some(marker) = self
                .markers
                .iter()
                .rev()
                .find(|m| m.ltell <= pos && pos < m.ltell + m.len)
            {
                return Ok(Some(*marker));
            }
            if self.read_header()?.is_none() {
                return Ok(None);
            }
        }
    }
}

impl StreamLayer for TapeImageLayer {
    fn read(&mut self, buf: &mut [u8]) -> Result<usize, WellLogError> {
        let mut total = 0;
        while total < buf.len() {
            let marker = match self.marker_for(self.pos)? {
                Some(m) => m,
                None => {
                    self.at_eof = true;
                    break;
                }
            };

            let within = self.pos - marker.ltell;
            let avail = (marker.len - within) as usize;
            let want = (buf.len() - total).min(avail);

            self.inner.seek(marker.ptell + within)?;
            let nread = self.inner.read(&mut buf[total..total + want])?;
            if nread < want {
                return Err(WellLogError::Truncation(format!(
                    "tape image record at physical offset {} cut short",
                    marker.ptell
                )));
            }

            self.pos += nread as u64;
            total += nread;
        }
        Ok(total)
    }

    fn seek(&mut self, offset: u64) -> Result<(), WellLogError> {
        self.pos = offset;
        self.at_eof = false;
        Ok(())
    }

    fn tell(&self) -> u64 {
        self.pos
    }

    fn eof(&self) -> bool {
        self.at_eof
    }

    fn peek_inner(&self) -> Option<&dyn StreamLayer> {
        Some(self.inner.as_ref())
    }
}
