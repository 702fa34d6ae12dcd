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

    src/lis/device.rs

    The LIS-79 io device: physical-record framing over a byte stream that
    may contain arbitrary inter-record padding, the one-shot record index,
    and reassembly of logical records from physical-record chains.

    LIS allows a physical record to be padded with null or space characters
    to guarantee a minimum record size, without declaring how many pad
    bytes are present. The reader leans on one key assumption: the next
    physical record header after a pad run starts at a physical tell that
    is a multiple of the header size (4).
*/

use std::path::Path;

use binrw::{binrw, BinRead};
use bitflags::bitflags;

use super::types::RecordType;
use crate::{
    errors::{log_issues, ParseIssue, Severity},
    io::{Cursor, ReadSeek},
    stream::Stream,
    WellLogError,
};

pub const PRH_SIZE: usize = 4;
pub const LRH_SIZE: usize = 2;

bitflags! {
    /// The 16-bit attribute word of a physical record header.
    #[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash)]
    #[rustfmt::skip]
    pub struct PrAttributes: u16 {
        #[doc = "A 2-byte record number trails the body"]
        const RECORD_NUMBER  = 1 << 14;
        #[doc = "A 2-byte file number trails the body"]
        const FILE_NUMBER    = 1 << 13;
        #[doc = "A 2-byte checksum trails the body"]
        const CHECKSUM       = 1 << 12;
        #[doc = "A predecessor physical record exists"]
        const PREDECESSOR    = 1 << 9;
        #[doc = "A successor physical record exists"]
        const SUCCESSOR      = 1 << 8;
        #[doc = "A parity error was detected when the record was written"]
        const PARITY_ERROR   = 1 << 6;
        #[doc = "A checksum error was detected when the record was written"]
        const CHECKSUM_ERROR = 1 << 5;
    }
}

#[derive(Copy, Clone, Debug)]
#[binrw]
#[brw(big)]
pub struct PhysicalHeader {
    pub length: u16,
    pub attributes: u16,
}

impl PhysicalHeader {
    pub fn attrs(&self) -> PrAttributes {
        PrAttributes::from_bits_retain(self.attributes)
    }
}

/// The logical record header carried by the first physical record of a
/// chain. The second byte is undefined by the standard.
#[derive(Copy, Clone, Debug)]
pub struct LogicalHeader {
    pub rec_type: u8,
    pub attributes: u8,
}

/// True when the buffer is a run of pad bytes: all equal, and either null
/// or space. An empty buffer contains no pad bytes.
pub fn is_padbytes(xs: &[u8]) -> bool {
    const PADBYTE_NULL: u8 = 0x00;
    const PADBYTE_SPACE: u8 = 0x20;

    match xs.first() {
        Some(&first) if first == PADBYTE_NULL || first == PADBYTE_SPACE => {
            xs.iter().all(|&b| b == first)
        }
        _ => false,
    }
}

/// Index entry for one logical record: where it starts in the logical
/// domain, its headers, and the total size of its physical-record chain.
#[derive(Clone, Debug)]
pub struct RecordInfo {
    pub ltell: u64,
    pub prh: PhysicalHeader,
    pub lrh: LogicalHeader,
    pub size: u64,
}

impl RecordInfo {
    pub fn record_type(&self) -> Option<RecordType> {
        RecordType::from_repr(self.lrh.rec_type)
    }
}

/// A reassembled logical record: the payload bytes with all physical
/// headers and trailers stripped.
#[derive(Clone, Debug)]
pub struct LisRecord {
    pub info: RecordInfo,
    pub data: Vec<u8>,
}

/// The record index: every logical record of the file in file order,
/// partitioned into explicit (metadata) and implicit (frame data) sets.
#[derive(Debug, Default)]
pub struct RecordIndex {
    explicits: Vec<RecordInfo>,
    implicits: Vec<RecordInfo>,
}

impl RecordIndex {
    pub fn size(&self) -> usize {
        self.explicits.len() + self.implicits.len()
    }

    pub fn explicits(&self) -> &[RecordInfo] {
        &self.explicits
    }

    pub fn implicits(&self) -> &[RecordInfo] {
        &self.implicits
    }

    /// The implicit records belonging to the data format spec at
    /// `dfsr_tell`: those after it and before the next format spec.
    pub fn implicits_of(&self, dfsr_tell: u64) -> Result<&[RecordInfo], WellLogError> {
        let pos = self
            .explicits
            .iter()
            .position(|info| info.ltell == dfsr_tell)
            .ok_or_else(|| {
                WellLogError::InvalidArgument(format!(
                    "Could not find a data format spec record at tell {}",
                    dfsr_tell
                ))
            })?;

        let next_dfsr = self.explicits[pos + 1..]
            .iter()
            .find(|info| info.record_type() == Some(RecordType::DataFormatSpec))
            .map(|info| info.ltell);

        let begin = self.implicits.partition_point(|info| info.ltell <= dfsr_tell);
        let end = match next_dfsr {
            Some(tell) => self.implicits.partition_point(|info| info.ltell <= tell),
            None => self.implicits.len(),
        };

        Ok(&self.implicits[begin..end])
    }
}

/// A LIS io device: a stream stack plus the state needed to frame physical
/// records on it. Stateful and single-threaded; its tells move with every
/// read.
pub struct LisDevice {
    stream: Stream,
    /// Outer tell of the device's logical zero.
    lzero: u64,
    /// Physical tell at open.
    pzero: u64,
    plength: u64,
    is_truncated: bool,
    truncation_msg: String,
    is_indexed: bool,
}

/// Open a LIS file, optionally applying tape-image framing. The device is
/// probed to reject handles opened at or past end-of-data, then rewound to
/// its logical zero.
pub fn open(
    path: impl AsRef<Path>,
    offset: u64,
    tapeimage: bool,
) -> Result<LisDevice, WellLogError> {
    let stream = Stream::open(path, offset)?;
    LisDevice::from_stream(stream, tapeimage, offset)
}

/// As [`open`], over any in-memory or on-disk byte source.
pub fn open_source(
    source: Box<dyn ReadSeek>,
    offset: u64,
    tapeimage: bool,
) -> Result<LisDevice, WellLogError> {
    let stream = Stream::from_source(source, offset)?;
    LisDevice::from_stream(stream, tapeimage, offset)
}

impl LisDevice {
    fn from_stream(
        mut stream: Stream,
        tapeimage: bool,
        offset: u64,
    ) -> Result<LisDevice, WellLogError> {
        if tapeimage {
            stream = stream.wrap_tapeimage()?;
        }

        let lzero = stream.ltell();
        let pzero = stream.ptell();

        let mut device = LisDevice {
            stream,
            lzero,
            pzero,
            plength: 0,
            is_truncated: false,
            truncation_msg: String::new(),
            is_indexed: false,
        };

        // Probe one byte to verify the device is not opened at end-of-data.
        let mut probe = [0u8; 1];
        match device.stream.read(&mut probe) {
            Ok(0) => {
                return Err(WellLogError::Eof);
            }
            Ok(_) => {}
            Err(_) => {
                return Err(WellLogError::IoError(format!(
                    "open: cannot open device at ptell {}",
                    offset
                )));
            }
        }

        device.seek(0)?;
        Ok(device)
    }

    /// Physical tell at open.
    pub fn poffset(&self) -> u64 {
        self.pzero
    }

    /// Physical size of the indexed portion of the device.
    pub fn psize(&self) -> Result<u64, WellLogError> {
        if !self.is_indexed {
            return Err(WellLogError::InvalidArgument(
                "filesize unknown before file is indexed".to_string(),
            ));
        }
        if self.is_truncated {
            return Err(WellLogError::Truncation(format!(
                "filesize unknown, file is truncated ({})",
                self.truncation_msg
            )));
        }
        Ok(self.plength)
    }

    pub fn truncated(&self) -> Result<bool, WellLogError> {
        if !self.is_indexed {
            return Err(WellLogError::InvalidArgument(
                "cannot tell if un-indexed file is truncated".to_string(),
            ));
        }
        Ok(self.is_truncated)
    }

    pub fn indexed(&self) -> bool {
        self.is_indexed
    }

    /// Seek in the device's logical domain; zero is the position the
    /// device was opened at.
    pub fn seek(&mut self, offset: u64) -> Result<(), WellLogError> {
        self.stream.lseek(self.lzero + offset)
    }

    pub fn ltell(&self) -> u64 {
        self.stream.ltell() - self.lzero
    }

    pub fn ptell(&self) -> u64 {
        self.stream.ptell()
    }

    pub fn read(&mut self, buf: &mut [u8]) -> Result<usize, WellLogError> {
        self.stream.read(buf)
    }

    pub fn eof(&self) -> bool {
        self.stream.eof()
    }

    /// Classify a short header read. Running out of data on a pad run (or
    /// on nothing at all) is a clean end-of-file; running out anywhere
    /// else means the file was cut mid-record.
    fn header_error(&self, prefix: &[u8], nread: usize) -> WellLogError {
        if self.stream.eof() && (nread == 0 || is_padbytes(prefix)) {
            WellLogError::Eof
        } else if self.stream.eof() {
            WellLogError::Truncation("read_physical_header: unexpected end-of-file".to_string())
        } else {
            WellLogError::IoError("read_physical_header: unable to read from file".to_string())
        }
    }

    /// Find and read the next physical record header, skipping any pad
    /// run. When the first two bytes of the initial read are pad bytes we
    /// are in pad land: realign the read buffer to a 4-byte physical tell
    /// (the pad run may begin at an unaligned tell), then scan a header at
    /// a time until a non-pad header or end-of-data.
    pub fn read_physical_header(&mut self) -> Result<PhysicalHeader, WellLogError> {
        let mut buf = [0u8; PRH_SIZE];

        let nread = self.stream.read(&mut buf)?;
        if nread < PRH_SIZE {
            return Err(self.header_error(&buf[..nread], nread));
        }

        if is_padbytes(&buf[..2]) {
            let alignment = (self.ptell() % PRH_SIZE as u64) as usize;

            if alignment != 0 {
                let padbytes = PRH_SIZE - alignment;
                let mut tmp = [0u8; PRH_SIZE];
                tmp[..alignment].copy_from_slice(&buf[padbytes..]);

                let nread = self.stream.read(&mut tmp[alignment..])?;
                if nread < padbytes {
                    return Err(self.header_error(&tmp[..alignment + nread], nread));
                }
                buf = tmp;
            }

            while is_padbytes(&buf) {
                let nread = self.stream.read(&mut buf)?;
                if nread < PRH_SIZE {
                    return Err(self.header_error(&buf[..nread], nread));
                }
            }
        }

        let head = PhysicalHeader::read(&mut Cursor::new(&buf))?;

        // The first physical record of a chain must also fit a logical
        // record header, so its minimum length is 6; continuations only
        // need to fit their own header.
        let mvl = if head.attrs().contains(PrAttributes::PREDECESSOR) {
            PRH_SIZE
        } else {
            PRH_SIZE + LRH_SIZE
        };

        if (head.length as usize) < mvl {
            return Err(WellLogError::Parse(format!(
                "read_physical_header: Too short record length (was {} bytes) (ptell = {})",
                head.length,
                self.ptell()
            )));
        }

        Ok(head)
    }

    pub fn read_logical_header(&mut self) -> Result<LogicalHeader, WellLogError> {
        let mut buf = [0u8; LRH_SIZE];
        let nread = self.stream.read(&mut buf)?;

        if nread == 0 && self.stream.eof() {
            return Err(WellLogError::Eof);
        }
        if nread < LRH_SIZE {
            return Err(WellLogError::IoError(
                "read_logical_header: could not read full header from disk".to_string(),
            ));
        }

        Ok(LogicalHeader {
            rec_type: buf[0],
            attributes: buf[1],
        })
    }

    /// Index one logical record starting at the current position: read its
    /// headers, validate the record type, walk the successor chain, and
    /// probe the final byte to catch truncation. Hitting end-of-data while
    /// looking for the *next* record is the one valid termination of a
    /// logical file, so a clean Eof from the first header read propagates
    /// as Eof; everything after that is Truncation.
    pub fn index_record(&mut self) -> Result<RecordInfo, WellLogError> {
        let prh = self.read_physical_header()?;
        // Record the logical tell after the header read so it is correct
        // regardless of any pad bytes that were skipped.
        let ltell = self.ltell() - PRH_SIZE as u64;

        let mut length = prh.length as u64;

        let lrh = match self.read_logical_header() {
            Ok(lrh) => lrh,
            Err(e @ (WellLogError::Eof | WellLogError::IoError(_))) => {
                return Err(WellLogError::Truncation(format!("index_record: {}", e)));
            }
            Err(e) => return Err(e),
        };

        if RecordType::from_repr(lrh.rec_type).is_none() {
            // There is no way of telling a bogus type from a zeroed-out
            // header here; fully zeroed records are caught by the pad scan.
            let tell = self.ptell() - LRH_SIZE as u64;
            return Err(WellLogError::Parse(format!(
                "index_record: Found invalid record type ({}) when reading header at ptell ({})",
                lrh.rec_type, tell
            )));
        }

        let mut cur = prh;
        loop {
            if !cur.attrs().contains(PrAttributes::SUCCESSOR) {
                // Probe the last declared byte before committing the entry.
                self.seek(ltell + length - 1)?;
                let mut probe = [0u8; 1];
                let nread = self.read(&mut probe)?;
                if nread < 1 || self.eof() {
                    return Err(WellLogError::Truncation(
                        "index_record: physical record truncated".to_string(),
                    ));
                }
                break;
            }

            self.seek(ltell + length)?;
            match self.read_physical_header() {
                Ok(next) => {
                    length += next.length as u64;
                    cur = next;
                }
                Err(WellLogError::Eof) => {
                    return Err(WellLogError::Truncation(
                        "index_record: Missing next PRH".to_string(),
                    ));
                }
                Err(e) => return Err(e),
            }
        }

        Ok(RecordInfo {
            ltell,
            prh,
            lrh,
            size: length,
        })
    }

    /// Scan the whole device once, indexing records until end-of-data. Any
    /// non-EOF failure marks the device truncated and ends the scan
    /// cleanly; the already-indexed portion stays usable.
    pub fn index_records(&mut self) -> RecordIndex {
        let mut explicits = Vec::new();
        let mut implicits = Vec::new();

        if let Err(e) = self.seek(0) {
            self.is_truncated = true;
            self.truncation_msg = e.to_string();
        } else {
            loop {
                let info = match self.index_record() {
                    Ok(info) => info,
                    Err(WellLogError::Eof) => break,
                    Err(e) => {
                        self.is_truncated = true;
                        self.truncation_msg = e.to_string();
                        let issue =
                            ParseIssue::new(Severity::Error, e.to_string(), "", "Stopped the scan");
                        log_issues(&[issue], "index_records: error on indexing the device");
                        break;
                    }
                };

                match info.record_type() {
                    Some(RecordType::NormalData) | Some(RecordType::AlternateData) => {
                        implicits.push(info);
                    }
                    _ => explicits.push(info),
                }
            }
        }

        self.plength = self.ptell() - self.pzero;
        self.is_indexed = true;

        RecordIndex {
            explicits,
            implicits,
        }
    }

    /// Reassemble the payload of an indexed record, concatenating across
    /// its physical-record chain. The logical record header is only
    /// present in the first physical record; declared trailers are
    /// skipped on every one.
    pub fn read_record(&mut self, info: &RecordInfo) -> Result<LisRecord, WellLogError> {
        let mut rec = LisRecord {
            info: info.clone(),
            data: Vec::new(),
        };

        self.seek(rec.info.ltell)?;

        loop {
            let prh = self.read_physical_header()?;
            let attrs = prh.attrs();

            let mut trailer = 0u64;
            if attrs.contains(PrAttributes::RECORD_NUMBER) {
                trailer += 2;
            }
            if attrs.contains(PrAttributes::FILE_NUMBER) {
                trailer += 2;
            }
            if attrs.contains(PrAttributes::CHECKSUM) {
                trailer += 2;
            }

            let mut toread = (prh.length as u64)
                .checked_sub(PRH_SIZE as u64 + trailer)
                .ok_or_else(|| {
                    WellLogError::Parse(format!(
                        "read_record: physical record length {} too short for its trailers",
                        prh.length
                    ))
                })?;

            if !attrs.contains(PrAttributes::PREDECESSOR) {
                self.seek(self.ltell() + LRH_SIZE as u64)?;
                toread = toread.checked_sub(LRH_SIZE as u64).ok_or_else(|| {
                    WellLogError::Parse(format!(
                        "read_record: physical record length {} too short for a logical header",
                        prh.length
                    ))
                })?;
            }

            let prev = rec.data.len();
            rec.data.resize(prev + toread as usize, 0);

            let nread = self.stream.read(&mut rec.data[prev..])?;
            if (nread as u64) < toread {
                return Err(WellLogError::Truncation(
                    "read_record: record truncated".to_string(),
                ));
            }

            if trailer > 0 {
                self.seek(self.ltell() + trailer)?;
            }

            if !attrs.contains(PrAttributes::SUCCESSOR) {
                break;
            }
        }

        Ok(rec)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn padbytes_recognizes_null_and_space_runs() {
        assert!(is_padbytes(&[0x00, 0x00, 0x00, 0x00]));
        assert!(is_padbytes(&[0x20, 0x20]));
        assert!(!is_padbytes(&[0x00, 0x20]));
        assert!(!is_padbytes(&[0x00, 0x01]));
        assert!(!is_padbytes(&[0x41, 0x41]));
        assert!(!is_padbytes(&[]));
    }

    #[test]
    fn physical_header_minimum_lengths() {
        // 6 is required when the record must carry a logical header
        let head = PhysicalHeader {
            length: 6,
            attributes: 0,
        };
        assert!(!head.attrs().contains(PrAttributes::PREDECESSOR));

        let cont = PhysicalHeader {
            length: 4,
            attributes: PrAttributes::PREDECESSOR.bits(),
        };
        assert!(cont.attrs().contains(PrAttributes::PREDECESSOR));
    }
}
