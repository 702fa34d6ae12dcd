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

    src/stream/mod.rs

    The layered byte-stream stack. Well-log files are frequently wrapped in
    one or two transport framings left over from their tape days: a
    tape-image envelope, and (for RP66) the visible-record envelope. Each
    framing is a StreamLayer that owns the layer beneath it and exposes the
    concatenated payload bytes as a contiguous logical stream.
*/

pub mod rp66;
pub mod tapeimage;

use std::{fs::File, path::Path};

use crate::{
    io::{ReadSeek, SeekFrom},
    WellLogError,
};

/// One layer of the stream stack.
///
/// `read`, `seek` and `tell` operate in the logical coordinate system of
/// this layer: the concatenation of its payload bytes, with any framing
/// headers stripped. `peek_inner` walks one level down; the leaf layer
/// returns `None`, which is how callers detect they have reached the
/// physical domain.
pub trait StreamLayer {
    fn read(&mut self, buf: &mut [u8]) -> Result<usize, WellLogError>;
    fn seek(&mut self, offset: u64) -> Result<(), WellLogError>;
    fn tell(&self) -> u64;
    fn eof(&self) -> bool;
    fn peek_inner(&self) -> Option<&dyn StreamLayer>;
}

/// The leaf of every stack: a raw byte source with no framing. Logical and
/// physical coordinates coincide here.
struct RawLayer {
    source: Box<dyn ReadSeek>,
    pos: u64,
    at_eof: bool,
}

impl StreamLayer for RawLayer {
    fn read(&mut self, buf: &mut [u8]) -> Result<usize, WellLogError> {
        let mut total = 0;
        while total < buf.len() {
            match self.source.read(&mut buf[total..]) {
                Ok(0) => {
                    self.at_eof = true;
                    break;
                }
                Ok(n) => total += n,
                Err(e) if e.kind() == std::io::ErrorKind::Interrupted => continue,
                Err(e) => return Err(e.into()),
            }
        }
        self.pos += total as u64;
        Ok(total)
    }

    fn seek(&mut self, offset: u64) -> Result<(), WellLogError> {
        self.source.seek(SeekFrom::Start(offset))?;
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
        None
    }
}

/// An owned stream stack. Seeks and tells on the `l`-prefixed methods are
/// in the logical domain of the outermost layer; `ptell` walks down to the
/// leaf and reports the physical position.
pub struct Stream {
    layer: Box<dyn StreamLayer>,
}

impl Stream {
    /// Open a file as the leaf of a new stack, positioned at `offset`.
    pub fn open(path: impl AsRef<Path>, offset: u64) -> Result<Stream, WellLogError> {
        let path = path.as_ref();
        let file = File::open(path).map_err(|e| {
            WellLogError::IoError(format!("unable to open file for path {}: {}", path.display(), e))
        })?;
        Stream::from_source(Box::new(file), offset)
    }

    /// Build a stack over any in-memory or on-disk byte source.
    pub fn from_source(source: Box<dyn ReadSeek>, offset: u64) -> Result<Stream, WellLogError> {
        let mut layer = RawLayer {
            source,
            pos: 0,
            at_eof: false,
        };
        layer.seek(offset)?;
        Ok(Stream {
            layer: Box::new(layer),
        })
    }

    /// Push a tape-image framing layer on top of the stack. Fails with
    /// [`WellLogError::Eof`] if the stream is positioned at end-of-data.
    pub fn wrap_tapeimage(self) -> Result<Stream, WellLogError> {
        let layer = tapeimage::TapeImageLayer::open(self.layer)?;
        Ok(Stream {
            layer: Box::new(layer),
        })
    }

    /// Push an RP66 visible-record framing layer on top of the stack.
    pub fn wrap_rp66(self) -> Result<Stream, WellLogError> {
        let layer = rp66::VisibleRecordLayer::open(self.layer)?;
        Ok(Stream {
            layer: Box::new(layer),
        })
    }

    pub fn read(&mut self, buf: &mut [u8]) -> Result<usize, WellLogError> {
        self.layer.read(buf)
    }

    /// Seek in the logical domain of the outermost layer.
    pub fn lseek(&mut self, offset: u64) -> Result<(), WellLogError> {
        self.layer.seek(offset)
    }

    /// The tell reported by the outermost layer.
    pub fn ltell(&self) -> u64 {
        self.layer.tell()
    }

    /// The physical tell at the leaf, obtained by walking the stack down
    /// until a layer reports no inner layer.
    pub fn ptell(&self) -> u64 {
        let mut cur: &dyn StreamLayer = self.layer.as_ref();
        while let Some(inner) = cur.peek_inner() {
            cur = inner;
        }
        cur.tell()
    }

    pub fn eof(&self) -> bool {
        self.layer.eof()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::io::Cursor;

    #[test]
    fn raw_stream_reads_from_offset() {
        let mut stream = Stream::from_source(Box::new(Cursor::new(vec![0, 1, 2, 3, 4, 5])), 2).unwrap();
        let mut buf = [0u8; 2];
        assert_eq!(stream.read(&mut buf).unwrap(), 2);
        assert_eq!(buf, [2, 3]);
        assert_eq!(stream.ltell(), 4);
        assert_eq!(stream.ptell(), 4);
    }

    #[test]
    fn raw_stream_short_read_at_end_sets_eof() {
        let mut stream = Stream::from_source(Box::new(Cursor::new(vec![7, 8])), 0).unwrap();
        let mut buf = [0u8; 4];
        assert_eq!(stream.read(&mut buf).unwrap(), 2);
        assert!(stream.eof());

        // A seek clears the eof condition.
        stream.lseek(0).unwrap();
        assert!(!stream.eof());
    }
}
