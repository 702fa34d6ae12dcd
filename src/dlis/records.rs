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

    src/dlis/records.rs

    RP66 logical-record framing: prologue searches (storage unit label,
    visible record envelope, tape mark), reassembly of logical records from
    logical-record-segment chains, and the one-shot index scan that
    partitions a logical file into explicit and implicit records.
*/

use std::collections::BTreeMap;

use binrw::{binrw, BinRead};
use bitflags::bitflags;

use super::{codecs, types::Ident};
use crate::{
    errors::{log_issues, report, ParseIssue, Severity},
    io::Cursor,
    stream::{
        tapeimage::{TapeImageHeader, TAPE_HEADER_SIZE, TAPE_RECORD_DATA, TAPE_RECORD_MARK},
        Stream,
    },
    WellLogError,
};

pub const LRSH_SIZE: usize = 4;
pub const SUL_SIZE: usize = 80;

/// Both the storage-unit-label and visible-record searches scan this many
/// bytes from their starting offset.
const SEARCH_WINDOW: usize = 200;

bitflags! {
    /// The attribute byte of a logical record segment header.
    #[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash)]
    #[rustfmt::skip]
    pub struct SegmentAttributes: u8 {
        #[doc = "Segment belongs to an explicitly formatted logical record"]
        const EXPLICIT          = 0b1000_0000;
        #[doc = "A predecessor segment exists"]
        const PREDECESSOR       = 0b0100_0000;
        #[doc = "A successor segment exists"]
        const SUCCESSOR         = 0b0010_0000;
        #[doc = "Segment body is encrypted"]
        const ENCRYPTED         = 0b0001_0000;
        #[doc = "An encryption packet precedes the body"]
        const ENCRYPTION_PACKET = 0b0000_1000;
        #[doc = "A 2-byte checksum trails the body"]
        const CHECKSUM          = 0b0000_0100;
        #[doc = "A 2-byte trailing length trails the body"]
        const TRAILING_LENGTH   = 0b0000_0010;
        #[doc = "Pad bytes trail the body"]
        const PADDING           = 0b0000_0001;
    }
}

#[derive(Debug)]
#[binrw]
#[brw(big)]
pub struct SegmentHeader {
    pub length: u16,
    pub attributes: u8,
    pub rec_type: u8,
}

/// A reassembled logical record. The attributes retain only the bits that
/// describe the record as a whole (explicit formatting and encryption); the
/// remaining segment-attribute bits only describe how individual segments
/// were read.
#[derive(Clone, Debug, Default)]
pub struct Record {
    pub rec_type: u8,
    pub attributes: SegmentAttributes,
    /// False when the segments of this record disagreed on type or carried
    /// continuation flags inconsistent with their position in the chain.
    pub consistent: bool,
    pub data: Vec<u8>,
}

impl Record {
    pub fn is_explicit(&self) -> bool {
        self.attributes.contains(SegmentAttributes::EXPLICIT)
    }

    pub fn is_encrypted(&self) -> bool {
        self.attributes.contains(SegmentAttributes::ENCRYPTED)
    }
}

/// Interior segments must carry both continuation flags, the first only
/// successor, the last only predecessor. Skipped for the final segment's
/// successor bit when the chain was cut short by a byte cap.
fn attr_consistent(attributes: &[u8], complete: bool) -> bool {
    let last = attributes.len() - 1;
    attributes.iter().enumerate().all(|(i, &raw)| {
        let attrs = SegmentAttributes::from_bits_retain(raw);
        let pred_ok = attrs.contains(SegmentAttributes::PREDECESSOR) == (i > 0);
        let succ_ok = if i < last {
            attrs.contains(SegmentAttributes::SUCCESSOR)
        } else {
            !complete || !attrs.contains(SegmentAttributes::SUCCESSOR)
        };
        pred_ok && succ_ok
    })
}

fn type_consistent(types: &[u8]) -> bool {
    types.windows(2).all(|w| w[0] == w[1])
}

/// Strip the segment trailer off the tail of `data`. Trailing-length and
/// checksum each occupy two bytes; the pad count is carried in the last
/// pad byte. A pad count that exceeds the segment payload by exactly one
/// LRSH drops the whole segment (observed in the wild on encrypted
/// records); any other overrun fails the extraction.
fn trim_segment(
    attrs: SegmentAttributes,
    segment_len: usize,
    data: &mut Vec<u8>,
) -> Result<(), WellLogError> {
    let mut trim = 0usize;
    if attrs.contains(SegmentAttributes::TRAILING_LENGTH) {
        trim += 2;
    }
    if attrs.contains(SegmentAttributes::CHECKSUM) {
        trim += 2;
    }
    if attrs.contains(SegmentAttributes::PADDING) {
        let idx = data.len().checked_sub(trim + 1).ok_or_else(|| {
            WellLogError::Parse("segment too short to carry its declared trailers".to_string())
        })?;
        trim += data[idx] as usize;
    }

    if trim <= segment_len {
        data.truncate(data.len() - trim);
        return Ok(());
    }

    if trim - segment_len != LRSH_SIZE {
        return Err(WellLogError::Parse(format!(
            "bad segment trim: padbytes (which is {}) >= segment length (which is {})",
            trim, segment_len
        )));
    }

    let issue = ParseIssue::new(
        Severity::Info,
        "padbytes size = logical record segment length",
        "2.2.2.1 Logical Record Segment Header (LRSH): Pad Count is a single byte... that \
         contains a count of Pad Bytes present in the LRST",
        "skip the record altogether",
    );
    report(&[issue], "extract: bad padbytes")?;

    data.truncate(data.len() - segment_len);
    Ok(())
}

/// Reassemble the logical record whose first segment starts at the given
/// logical offset.
pub fn extract(stream: &mut Stream, tell: u64) -> Result<Record, WellLogError> {
    let mut rec = Record {
        consistent: true,
        ..Record::default()
    };
    rec.data.reserve(8192);
    extract_capped(stream, tell, u64::MAX, &mut rec)?;
    Ok(rec)
}

/// Reassemble at most `bytes` payload bytes of a logical record into an
/// existing record buffer. When the cap cuts a segment short the partial
/// read is only permitted for segments without padding, checksum or
/// trailing-length trailers, since those are anchored to the segment end.
pub fn extract_capped(
    stream: &mut Stream,
    tell: u64,
    bytes: u64,
    rec: &mut Record,
) -> Result<(), WellLogError> {
    let mut attributes: Vec<u8> = Vec::new();
    let mut types: Vec<u8> = Vec::new();

    rec.data.clear();
    stream.lseek(tell)?;

    loop {
        let mut header = [0u8; LRSH_SIZE];
        let nread = stream.read(&mut header)?;
        if nread < LRSH_SIZE {
            return Err(WellLogError::Truncation(
                "extract: unable to read segment header, file truncated".to_string(),
            ));
        }

        let lrsh = SegmentHeader::read(&mut Cursor::new(&header))?;
        if (lrsh.length as usize) < LRSH_SIZE {
            return Err(WellLogError::Parse(format!(
                "extract: segment length {} shorter than its header",
                lrsh.length
            )));
        }
        let len = (lrsh.length as usize - LRSH_SIZE) as u64;
        let attrs = SegmentAttributes::from_bits_retain(lrsh.attributes);

        attributes.push(lrsh.attributes);
        types.push(lrsh.rec_type);

        let prevsize = rec.data.len() as u64;
        let remaining = bytes.saturating_sub(prevsize);

        // If the remaining byte cap is smaller than the full segment we
        // can get away with a partial read as long as nothing is anchored
        // to the segment end.
        let mut to_read = len;
        if !attrs.intersects(
            SegmentAttributes::PADDING | SegmentAttributes::TRAILING_LENGTH | SegmentAttributes::CHECKSUM,
        ) && remaining < len
        {
            to_read = remaining;
        }

        rec.data.resize((prevsize + to_read) as usize, 0);
        let nread = stream.read(&mut rec.data[prevsize as usize..])?;
        if (nread as u64) < to_read {
            return Err(WellLogError::Truncation(
                "extract: unable to read segment, file truncated".to_string(),
            ));
        }

        trim_segment(attrs, len as usize, &mut rec.data)?;

        let has_successor = attrs.contains(SegmentAttributes::SUCCESSOR);
        let bytes_left = bytes.saturating_sub(rec.data.len() as u64);
        if has_successor && bytes_left > 0 {
            continue;
        }

        rec.attributes = SegmentAttributes::from_bits_retain(attributes[0])
            & (SegmentAttributes::EXPLICIT | SegmentAttributes::ENCRYPTED);
        rec.rec_type = types[0];
        rec.consistent = attr_consistent(&attributes, !has_successor) && type_consistent(&types);

        if rec.data.len() as u64 > bytes {
            rec.data.truncate(bytes as usize);
        }
        return Ok(());
    }
}

/// The product of the one-shot index scan: logical offsets of every
/// logical record, partitioned by its explicit bit. Records whose segment
/// chain could not be completed land in `broken`.
#[derive(Debug, Default)]
pub struct StreamOffsets {
    pub explicits: Vec<u64>,
    pub implicits: Vec<u64>,
    pub broken: Vec<u64>,
}

/// Scan the logical file start-to-end, classifying each logical record by
/// the explicit bit of its head segment. The first record of a logical
/// file is expected to be a FILE-HEADER (explicit, type 0); running into a
/// subsequent FILE-HEADER ends the scan just before it. Scan errors
/// terminate cleanly and leave the already-indexed portion usable.
pub fn find_offsets(stream: &mut Stream) -> Result<StreamOffsets, WellLogError> {
    let mut ofs = StreamOffsets::default();

    let mut lr_offset: u64 = 0;
    let mut lrs_offset: u64 = 0;
    let mut has_successor = false;

    fn handle(problem: &str) {
        let issue = ParseIssue::new(Severity::Error, problem, "", "Stopped file processing");
        log_issues(&[issue], "find_offsets: error on file load");
    }

    stream.lseek(lrs_offset)?;

    loop {
        let mut header = [0u8; LRSH_SIZE];
        let nread = match stream.read(&mut header) {
            Ok(n) => n,
            Err(e) => {
                handle(&e.to_string());
                break;
            }
        };

        if nread < LRSH_SIZE {
            if has_successor {
                handle("File is over, but last logical record segment expects successor");
                ofs.broken.push(lr_offset);
            }
            break;
        }

        let lrsh = match SegmentHeader::read(&mut Cursor::new(&header)) {
            Ok(h) => h,
            Err(e) => {
                handle(&e.to_string());
                break;
            }
        };

        if (lrsh.length as usize) < LRSH_SIZE {
            handle(&format!(
                "Too short logical record. Length can't be less than 4, but was {}",
                lrsh.length
            ));
            ofs.broken.push(lr_offset);
            break;
        }

        let attrs = SegmentAttributes::from_bits_retain(lrsh.attributes);
        let is_explicit = attrs.contains(SegmentAttributes::EXPLICIT);

        if !attrs.contains(SegmentAttributes::PREDECESSOR)
            && is_explicit
            && lrsh.rec_type == 0
            && !ofs.explicits.is_empty()
        {
            // A FILE-HEADER that is not the first logical record starts the
            // next logical file; wrap up just before it.
            if has_successor {
                handle("File is over, but last logical record segment expects successor");
                ofs.broken.push(lr_offset);
            }
            stream.lseek(lrs_offset)?;
            break;
        }

        has_successor = attrs.contains(SegmentAttributes::SUCCESSOR);
        lrs_offset += lrsh.length as u64;

        // Probe the last declared byte of the segment to catch truncation
        // before committing the offset.
        if stream.lseek(lrs_offset - 1).is_err() {
            handle("find_offsets: file truncated");
            ofs.broken.push(lr_offset);
            break;
        }
        let mut probe = [0u8; 1];
        let truncated = match stream.read(&mut probe) {
            Ok(n) => n < 1,
            Err(_) => true,
        };
        if truncated {
            handle("find_offsets: file truncated");
            ofs.broken.push(lr_offset);
            break;
        }

        if !has_successor {
            if is_explicit {
                ofs.explicits.push(lr_offset);
            } else {
                ofs.implicits.push(lr_offset);
            }
            lr_offset = lrs_offset;
        }
    }

    Ok(ofs)
}

/// An obname is at most 262 bytes on disk: a 4-byte origin, the copy
/// number, and a 256-byte length-prefixed identifier.
const OBNAME_SIZE_MAX: u64 = 262;

/// Group the frame-data records among `tells` by the FRAME they belong to.
/// Only the leading obname of each record is decoded; encrypted and empty
/// records are skipped, and per-record parse errors are logged and skipped
/// so one bad record does not hide the rest.
pub fn find_fdata(
    stream: &mut Stream,
    tells: &[u64],
) -> Result<BTreeMap<Ident, Vec<u64>>, WellLogError> {
    let mut frames: BTreeMap<Ident, Vec<u64>> = BTreeMap::new();

    let mut rec = Record::default();
    rec.data.reserve(OBNAME_SIZE_MAX as usize);

    for &tell in tells {
        let fingerprint = (|| -> Result<Option<Ident>, WellLogError> {
            extract_capped(stream, tell, OBNAME_SIZE_MAX, &mut rec)?;
            if rec.is_encrypted() || rec.rec_type != 0 || rec.data.is_empty() {
                return Ok(None);
            }

            let (name, _) = codecs::obname(&rec.data)?;
            Ok(Some(name.fingerprint("FRAME")?))
        })();

        match fingerprint {
            Ok(Some(fp)) => frames.entry(fp).or_default().push(tell),
            Ok(None) => {}
            Err(e) => {
                let issue = ParseIssue::new(Severity::Error, e.to_string(), "", "Skipped the record");
                log_issues(&[issue], "find_fdata: error on processing the record");
            }
        }
    }

    Ok(frames)
}

/// The 80-byte prologue of an RP66 storage unit.
#[derive(Debug)]
#[binrw]
#[brw(big)]
pub struct StorageUnitLabel {
    pub sequence_number: [u8; 4],
    pub dlis_version: [u8; 5],
    pub structure: [u8; 6],
    pub max_record_length: [u8; 5],
    pub storage_set_id: [u8; 60],
}

impl StorageUnitLabel {
    pub fn read_from(stream: &mut Stream, offset: u64) -> Result<StorageUnitLabel, WellLogError> {
        stream.lseek(offset)?;
        let mut buffer = [0u8; SUL_SIZE];
        let nread = stream.read(&mut buffer)?;
        if nread < SUL_SIZE {
            return Err(WellLogError::Truncation(
                "unable to read full storage unit label".to_string(),
            ));
        }
        Ok(StorageUnitLabel::read(&mut Cursor::new(&buffer))?)
    }

    fn ascii_number(field: &[u8]) -> Option<u32> {
        let text = std::str::from_utf8(field).ok()?;
        text.trim_start().parse().ok()
    }

    pub fn sequence(&self) -> Option<u32> {
        Self::ascii_number(&self.sequence_number)
    }

    pub fn maximum_record_length(&self) -> Option<u32> {
        Self::ascii_number(&self.max_record_length)
    }

    pub fn is_record_storage(&self) -> bool {
        &self.structure == b"RECORD"
    }

    pub fn storage_set(&self) -> String {
        String::from_utf8_lossy(&self.storage_set_id).trim_end().to_string()
    }
}

/// Scan the first 200 bytes for the storage unit label. The label is
/// located by its RECORD structure field, which sits 9 bytes in, after the
/// sequence number and the "V1.xx" version field.
pub fn find_sul(stream: &mut Stream) -> Result<u64, WellLogError> {
    let mut buffer = [0u8; SEARCH_WINDOW];
    stream.lseek(0)?;
    let nread = stream.read(&mut buffer)?;
    let window = &buffer[..nread];

    let pos = match window.windows(6).position(|w| w == b"RECORD") {
        Some(p) => p,
        None => {
            return Err(WellLogError::NotFound(format!(
                "searched {} bytes, but could not find storage label",
                nread
            )));
        }
    };

    if pos < 9 {
        return Err(WellLogError::Inconsistent(
            "found something that could be parts of a storage unit label, file may be corrupted"
                .to_string(),
        ));
    }

    let offset = pos - 9;
    let version = &window[offset + 4..offset + 9];
    if &version[..3] != b"V1." || !version[3].is_ascii_digit() || !version[4].is_ascii_digit() {
        return Err(WellLogError::Inconsistent(
            "storage label version field is not intact, file may be corrupted".to_string(),
        ));
    }

    Ok(offset as u64)
}

/// Search a 200-byte window starting at `from` for the visible record
/// envelope pattern [0xFF 0x01], preceded by its 16-bit length field.
pub fn find_vrl(stream: &mut Stream, from: u64) -> Result<u64, WellLogError> {
    let mut buffer = [0u8; SEARCH_WINDOW];
    stream.lseek(from)?;
    let nread = stream.read(&mut buffer)?;
    let window = &buffer[..nread];

    for i in 2..window.len().saturating_sub(1) {
        if window[i] == 0xFF && window[i + 1] == 0x01 {
            let length = u16::from_be_bytes([window[i - 2], window[i - 1]]);
            if (length as usize) < LRSH_SIZE {
                return Err(WellLogError::Inconsistent(
                    "found [0xFF 0x01] but len field not intact, file may be corrupted".to_string(),
                ));
            }
            return Ok(from + i as u64 - 2);
        }
    }

    Err(WellLogError::NotFound(format!(
        "searched {} bytes, but could not find visible record envelope pattern [0xFF 0x01]",
        nread
    )))
}

/// Check whether the file opens with a tape-image header: a data or mark
/// record with no predecessor whose next-header offset lands past its own
/// header and inside the search window. An arbitrary first 12 bytes can
/// easily satisfy the kind and predecessor checks alone, so the bound on
/// `next` is what keeps corrupted non-tape files out.
pub fn has_tapemark(stream: &mut Stream) -> Result<bool, WellLogError> {
    stream.lseek(0)?;
    let mut buffer = [0u8; TAPE_HEADER_SIZE];
    let nread = stream.read(&mut buffer)?;
    if nread < TAPE_HEADER_SIZE {
        return Err(WellLogError::Truncation(
            "unable to read full tape mark header".to_string(),
        ));
    }

    let header = TapeImageHeader::read(&mut Cursor::new(&buffer))?;
    let next = header.next as usize;
    Ok((header.kind == TAPE_RECORD_DATA || header.kind == TAPE_RECORD_MARK)
        && header.prev == 0
        && (TAPE_HEADER_SIZE..=SEARCH_WINDOW).contains(&next))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn trim_removes_declared_trailers() {
        // 6 payload bytes, then a pad run of 3 (count byte is the last pad
        // byte), a checksum and a trailing length.
        let attrs = SegmentAttributes::PADDING
            | SegmentAttributes::CHECKSUM
            | SegmentAttributes::TRAILING_LENGTH;
        let mut data = vec![1, 2, 3, 4, 5, 6, 0, 0, 3, 0xAA, 0xBB, 0x00, 0x10];
        trim_segment(attrs, data.len(), &mut data).unwrap();
        assert_eq!(data, vec![1, 2, 3, 4, 5, 6]);
    }

    #[test]
    fn trim_with_pad_count_equal_to_segment_drops_it() {
        // pad count claims the whole segment including its header
        let seg_len = 4;
        let attrs = SegmentAttributes::PADDING;
        let mut data = vec![0, 0, 0, 8];
        trim_segment(attrs, seg_len, &mut data).unwrap();
        assert!(data.is_empty());
    }

    #[test]
    fn trim_with_oversized_pad_count_fails() {
        let attrs = SegmentAttributes::PADDING;
        let mut data = vec![0, 0, 0, 200];
        assert!(trim_segment(attrs, data.len(), &mut data).is_err());
    }

    #[test]
    fn segment_chain_flag_expectations() {
        let pred = SegmentAttributes::PREDECESSOR.bits();
        let succ = SegmentAttributes::SUCCESSOR.bits();
        let both = pred | succ;

        assert!(attr_consistent(&[0], true));
        assert!(attr_consistent(&[succ, both, pred], true));
        assert!(!attr_consistent(&[succ, pred, pred], true));
        assert!(!attr_consistent(&[both, pred], true));
        // a trailing successor is fine when the chain was cut by a cap
        assert!(attr_consistent(&[succ, both], false));
    }
}
