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

    src/stream/rp66.rs

    RP66 visible-record framing. On disk an RP66 file is a sequence of
    visible records, each introduced by a 4-byte envelope: a big-endian
    length (which includes the envelope itself) followed by the bytes
    0xFF 0x01. The logical-record stream is the concatenation of the
    visible-record payloads.
*/

use binrw::{binrw, BinRead};

use super::StreamLayer;
use crate::{io::Cursor, WellLogError};

pub const VISIBLE_HEADER_SIZE: usize = 4;
pub const VISIBLE_MAGIC: u8 = 0xFF;
pub const VISIBLE_VERSION: u8 = 0x01;

#[derive(Debug)]
#[binrw]
#[brw(big)]
pub struct VisibleRecordHeader {
    pub length: u16,
    pub magic: u8,
    pub version: u8,
}

#[derive(Copy, Clone, Debug)]
struct VisibleMarker {
    ltell: u64,
    ptell: u64,
    len: u64,
}

pub struct VisibleRecordLayer {
    inner: Box<dyn StreamLayer>,
    markers: Vec<VisibleMarker>,
    exhausted: bool,
    pos: u64,
    at_eof: bool,
}

impl VisibleRecordLayer {
    pub fn open(inner: Box<dyn StreamLayer>) -> Result<VisibleRecordLayer, WellLogError> {
        let mut layer = VisibleRecordLayer {
            inner,
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

    fn read_header(&mut self) -> Result<Option<VisibleMarker>, WellLogError> {
        if self.exhausted {
            return Ok(None);
        }

        let phys = match self.markers.last() {
            Some(m) => m.ptell + m.len,
            None => self.inner.tell(),
        };

        self.inner.seek(phys)?;
        let mut buf = [0u8; VISIBLE_HEADER_SIZE];
        let nread = self.inner.read(&mut buf)?;
        if nread == 0 {
            self.exhausted = true;
            return Ok(None);
        }
        if nread < VISIBLE_HEADER_SIZE {
            return Err(WellLogError::Truncation(format!(
                "visible record envelope cut short at physical offset {}",
                phys
            )));
        }

        let header = VisibleRecordHeader::read(&mut Cursor::new(&buf))?;
        if header.magic != VISIBLE_MAGIC || header.version != VISIBLE_VERSION {
            return Err(WellLogError::Inconsistent(format!(
                "expected visible record envelope pattern [0xFF 0x01] at physical offset {}, \
                 was [{:#04X} {:#04X}]",
                phys, header.magic, header.version
            )));
        }
        if (header.length as usize) < VISIBLE_HEADER_SIZE {
            return Err(WellLogError::Inconsistent(format!(
                "visible record length {} at physical offset {} is shorter than its envelope",
                header.length, phys
            )));
        }

        log::trace!("rp66: visible record at {:#x}, length {}", phys, header.length);

        let ltell = self.markers.last().map(|m| m.ltell + m.len).unwrap_or(0);
        let marker = VisibleMarker {
            ltell,
            ptell: phys + VISIBLE_HEADER_SIZE as u64,
            len: (header.length as usize - VISIBLE_HEADER_SIZE) as u64,
        };
        self.markers.push(marker);
        Ok(Some(marker))
    }

    fn marker_for(&mut self, pos: u64) -> Result<Option<VisibleMarker>, WellLogError> {
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

impl StreamLayer for VisibleRecordLayer {
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
                    "visible record at physical offset {} cut short",
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
