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

    src/lis/dfsr.rs

    The data format specification record (DFSR): a sequence of entry
    blocks terminated by entry type 0, followed by fixed-layout spec
    blocks, one per channel. A DFSR compiles into a compact per-channel
    format string consumed by the frame packer.
*/

use super::{
    codecs,
    device::{LisRecord, RecordInfo},
    frames,
    types::{EntryType, LisReprc, LisValue},
};
use crate::WellLogError;

/// The three fixed bytes of an entry block: type, size, representation
/// code. The value of `size` bytes follows.
pub const ENTRY_BLOCK_FIXED_SIZE: usize = 3;

pub const SPEC_BLOCK0_SIZE: usize = 40;
pub const SPEC_BLOCK1_SIZE: usize = 44;

#[derive(Clone, Debug)]
pub struct EntryBlock {
    pub etype: u8,
    pub size: u8,
    pub reprc: u8,
    /// Absent when the block declares a zero-size value.
    pub value: Option<LisValue>,
}

impl EntryBlock {
    pub fn entry_type(&self) -> Option<EntryType> {
        EntryType::from_repr(self.etype)
    }
}

/// One channel declaration. The same field layout is shared by both spec
/// block subtypes; subtype 1 blocks only carry a wider reserved tail.
#[derive(Clone, Debug)]
pub struct SpecBlock {
    pub mnemonic: String,
    pub service_id: String,
    pub service_order_nr: String,
    pub units: String,
    pub filenr: i16,
    /// Reserved size of one sample stack of this channel within a frame.
    pub ssize: i16,
    pub samples: u8,
    pub reprc: u8,
}

/// A parsed DFSR: its index entry, the entry blocks, and the per-channel
/// spec blocks.
#[derive(Debug)]
pub struct Dfsr {
    pub info: RecordInfo,
    pub entries: Vec<EntryBlock>,
    pub specs: Vec<SpecBlock>,
    /// Spec-block subtype declared by entry type 2, when present.
    pub subtype: u8,
}

/// Read one entry block. The value is decoded with the block's own
/// representation code and sized by its size byte.
pub fn read_entry_block(xs: &[u8]) -> Result<(EntryBlock, &[u8]), WellLogError> {
    if xs.len() < ENTRY_BLOCK_FIXED_SIZE {
        return Err(WellLogError::Truncation(format!(
            "entry block: {} bytes left in record, expected at least {} more",
            xs.len(),
            ENTRY_BLOCK_FIXED_SIZE
        )));
    }

    let etype = xs[0];
    let size = xs[1];
    let reprc = xs[2];
    let xs = &xs[ENTRY_BLOCK_FIXED_SIZE..];

    if xs.len() < size as usize {
        return Err(WellLogError::Truncation(format!(
            "entry block: {} bytes left in record, expected at least {} more",
            xs.len(),
            size
        )));
    }

    let value = if size > 0 {
        let (value, _) = codecs::decode_value(reprc, size as usize, xs)?;
        Some(value)
    } else {
        None
    };

    Ok((
        EntryBlock {
            etype,
            size,
            reprc,
            value,
        },
        &xs[size as usize..],
    ))
}

fn read_spec_fields(xs: &[u8], block_size: usize) -> Result<SpecBlock, WellLogError> {
    if xs.len() < block_size {
        return Err(WellLogError::Truncation(format!(
            "spec block: {} bytes left in record, expected at least {} more",
            xs.len(),
            block_size
        )));
    }

    let (mnemonic, xs) = codecs::string(xs, 4)?;
    let (service_id, xs) = codecs::string(xs, 6)?;
    let (service_order_nr, xs) = codecs::string(xs, 8)?;
    let (units, xs) = codecs::string(xs, 4)?;
    let xs = &xs[4..]; // API codes
    let (filenr, xs) = codecs::i16(xs)?;
    let (ssize, xs) = codecs::i16(xs)?;
    let xs = &xs[2..]; // padding
    let xs = &xs[1..]; // process level
    let (samples, xs) = codecs::byte(xs)?;
    let (reprc, _) = codecs::byte(xs)?;
    // the remainder of the block is a pad byte and process indicators

    Ok(SpecBlock {
        mnemonic,
        service_id,
        service_order_nr,
        units,
        filenr,
        ssize,
        samples,
        reprc,
    })
}

pub fn read_spec_block0(xs: &[u8]) -> Result<(SpecBlock, &[u8]), WellLogError> {
    let spec = read_spec_fields(xs, SPEC_BLOCK0_SIZE)?;
    Ok((spec, &xs[SPEC_BLOCK0_SIZE..]))
}

pub fn read_spec_block1(xs: &[u8]) -> Result<(SpecBlock, &[u8]), WellLogError> {
    let spec = read_spec_fields(xs, SPEC_BLOCK1_SIZE)?;
    Ok((spec, &xs[SPEC_BLOCK1_SIZE..]))
}

/// Parse a DFSR record body: entry blocks to the terminator, spec blocks
/// to the end of the record.
///
/// Entry type 2 declares the spec-block subtype. The subtype is decoded
/// and recorded, but block parsing always uses the 40-byte subtype-0
/// layout; a nonzero declaration is logged. Subtype-1 blocks can still be
/// read directly with [`read_spec_block1`].
pub fn parse_dfsr(rec: &LisRecord) -> Result<Dfsr, WellLogError> {
    let mut entries: Vec<EntryBlock> = Vec::new();
    let mut subtype: u8 = 0;

    let mut xs = rec.data.as_slice();

    loop {
        let (entry, rest) = read_entry_block(xs)?;
        xs = rest;

        let done = entry.entry_type() == Some(EntryType::Terminator);

        if entry.entry_type() == Some(EntryType::SpecBlockSubtype) {
            if let Some(declared) = entry.value.as_ref().and_then(LisValue::as_i32) {
                subtype = declared as u8;
            }
        }

        entries.push(entry);
        if done {
            break;
        }
    }

    if subtype != 0 {
        log::warn!(
            "parse_dfsr: record at tell {} declares spec block subtype {}; parsing as subtype 0",
            rec.info.ltell,
            subtype
        );
    }

    let mut specs = Vec::new();
    while !xs.is_empty() {
        let (spec, rest) = read_spec_block0(xs)?;
        specs.push(spec);
        xs = rest;
    }

    Ok(Dfsr {
        info: rec.info.clone(),
        entries,
        specs,
        subtype,
    })
}

/// Compile a DFSR's spec blocks into a per-channel format string: one
/// character per frame entry, drawn from the packer's character table.
/// Variable-length channel types cannot appear in frames, and a channel
/// size must divide evenly into entries of its representation code.
pub fn dfs_fmtstr(dfs: &Dfsr) -> Result<String, WellLogError> {
    let mut fmt = String::new();

    for spec in &dfs.specs {
        let (f, s) = match LisReprc::from_repr(spec.reprc) {
            Some(LisReprc::I8) => (frames::FMT_I8, 1),
            Some(LisReprc::I16) => (frames::FMT_I16, 2),
            Some(LisReprc::I32) => (frames::FMT_I32, 4),
            Some(LisReprc::F16) => (frames::FMT_F16, 2),
            Some(LisReprc::F32) => (frames::FMT_F32, 4),
            Some(LisReprc::F32Low) => (frames::FMT_F32LOW, 4),
            Some(LisReprc::F32Fix) => (frames::FMT_F32FIX, 4),
            Some(LisReprc::Byte) => (frames::FMT_BYTE, 1),
            // string and mask are variable length, and neither the DFSR
            // nor the implicit records have a way of sizing them per frame
            Some(LisReprc::String) | Some(LisReprc::Mask) | None => {
                return Err(WellLogError::Parse(format!(
                    "dfs_fmtstr: Cannot create formatstring. Invalid repcode ({}) in channel ({})",
                    spec.reprc, spec.mnemonic
                )));
            }
        };

        let size = spec.ssize as i32;
        if size < 0 || size % s != 0 {
            return Err(WellLogError::Parse(format!(
                "dfs_fmtstr: Cannot compute an integral number of entries from size ({}) / \
                 repcode ({}) for channel {}",
                size, spec.reprc, spec.mnemonic
            )));
        }

        let entries = (size / s) as usize;
        fmt.extend(std::iter::repeat(f).take(entries));
    }

    Ok(fmt)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn entry_block_with_value() {
        // type 4 (up/down flag), one i8 byte
        let bytes = [4, 1, 56, 0x01, 0xEE];
        let (entry, rest) = read_entry_block(&bytes).unwrap();
        assert_eq!(entry.entry_type(), Some(EntryType::UpDownFlag));
        assert_eq!(entry.value, Some(LisValue::I8(1)));
        assert_eq!(rest, &[0xEE]);
    }

    #[test]
    fn terminator_entry_has_no_value() {
        let bytes = [0, 0, 56];
        let (entry, rest) = read_entry_block(&bytes).unwrap();
        assert_eq!(entry.entry_type(), Some(EntryType::Terminator));
        assert_eq!(entry.value, None);
        assert!(rest.is_empty());
    }

    #[test]
    fn entry_block_too_short() {
        assert!(read_entry_block(&[4, 1]).is_err());
        assert!(read_entry_block(&[4, 2, 56, 0x01]).is_err());
    }

    fn spec_block_bytes(mnemonic: &[u8; 4], ssize: i16, samples: u8, reprc: u8) -> Vec<u8> {
        let mut buf = Vec::new();
        buf.extend_from_slice(mnemonic);
        buf.extend_from_slice(b"SRVC  ");
        buf.extend_from_slice(b"ORDER123");
        buf.extend_from_slice(b"M   ");
        buf.extend_from_slice(&[0; 4]); // API codes
        buf.extend_from_slice(&1i16.to_be_bytes()); // file number
        buf.extend_from_slice(&ssize.to_be_bytes());
        buf.extend_from_slice(&[0; 2]); // padding
        buf.push(0); // process level
        buf.push(samples);
        buf.push(reprc);
        buf.extend_from_slice(&[0; 5]); // pad byte + process indicators
        assert_eq!(buf.len(), SPEC_BLOCK0_SIZE);
        buf
    }

    #[test]
    fn spec_block_fields() {
        let bytes = spec_block_bytes(b"GR  ", 4, 1, 68);
        let (spec, rest) = read_spec_block0(&bytes).unwrap();
        assert!(rest.is_empty());
        assert_eq!(spec.mnemonic, "GR  ");
        assert_eq!(spec.service_id, "SRVC  ");
        assert_eq!(spec.service_order_nr, "ORDER123");
        assert_eq!(spec.units, "M   ");
        assert_eq!(spec.filenr, 1);
        assert_eq!(spec.ssize, 4);
        assert_eq!(spec.samples, 1);
        assert_eq!(spec.reprc, 68);
    }

    #[test]
    fn subtype_one_blocks_are_four_bytes_longer() {
        let mut bytes = spec_block_bytes(b"SP  ", 2, 1, 79);
        bytes.extend_from_slice(&[0; 4]);
        let (spec, rest) = read_spec_block1(&bytes).unwrap();
        assert!(rest.is_empty());
        assert_eq!(spec.mnemonic, "SP  ");
        assert_eq!(spec.reprc, 79);
    }
}
