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

    src/lis/frames.rs

    The frame packer. A format string compiled from a DFSR describes one
    frame of multi-channel samples; the packer reads successive implicit
    records and packs frame after frame into a contiguous row buffer of
    native-endian values, growing by doubling and shrinking to fit at the
    end. Row count per record is never assumed: frames are discovered by
    consuming the record payload until it is exhausted.
*/

use super::{
    codecs,
    device::{LisDevice, RecordIndex, RecordInfo},
};
use crate::WellLogError;

pub const FMT_I8: char = 's';
pub const FMT_I16: char = 'i';
pub const FMT_I32: char = 'l';
pub const FMT_F16: char = 'e';
pub const FMT_F32: char = 'f';
pub const FMT_F32LOW: char = 'r';
pub const FMT_F32FIX: char = 'p';
pub const FMT_BYTE: char = 'b';
pub const FMT_STRING: char = 'a';
pub const FMT_MASK: char = 'm';

/// Source and destination byte widths of one format character. The
/// variable-length string and mask types cannot appear in frames.
fn char_sizes(c: char) -> Result<(usize, usize), WellLogError> {
    match c {
        FMT_I8 => Ok((1, 1)),
        FMT_I16 => Ok((2, 2)),
        FMT_I32 => Ok((4, 4)),
        FMT_F16 => Ok((2, 4)),
        FMT_F32 => Ok((4, 4)),
        FMT_F32LOW => Ok((4, 4)),
        FMT_F32FIX => Ok((4, 4)),
        FMT_BYTE => Ok((1, 1)),
        other => Err(WellLogError::InvalidArgument(format!(
            "invalid format character '{}' in frame format string",
            other
        ))),
    }
}

/// The per-frame source (on-disk) and destination (native) sizes of a
/// format string.
pub fn frame_sizes(fmt: &str) -> Result<(usize, usize), WellLogError> {
    let mut src = 0;
    let mut dst = 0;
    for c in fmt.chars() {
        let (s, d) = char_sizes(c)?;
        src += s;
        dst += d;
    }
    Ok((src, dst))
}

/// Pack one frame from `src` into `dst`, decoding each channel value and
/// writing it natively aligned. `dst` must hold at least the format's
/// destination frame size. Returns the bytes consumed and written.
pub fn pack_frame(fmt: &str, src: &[u8], dst: &mut [u8]) -> Result<(usize, usize), WellLogError> {
    let mut xs = src;
    let mut written = 0;

    for c in fmt.chars() {
        match c {
            FMT_I8 => {
                let (v, rest) = codecs::i8(xs)?;
                dst[written] = v as u8;
                written += 1;
                xs = rest;
            }
            FMT_I16 => {
                let (v, rest) = codecs::i16(xs)?;
                dst[written..written + 2].copy_from_slice(&v.to_ne_bytes());
                written += 2;
                xs = rest;
            }
            FMT_I32 => {
                let (v, rest) = codecs::i32(xs)?;
                dst[written..written + 4].copy_from_slice(&v.to_ne_bytes());
                written += 4;
                xs = rest;
            }
            FMT_F16 => {
                let (v, rest) = codecs::f16(xs)?;
                dst[written..written + 4].copy_from_slice(&v.to_ne_bytes());
                written += 4;
                xs = rest;
            }
            FMT_F32 => {
                let (v, rest) = codecs::f32(xs)?;
                dst[written..written + 4].copy_from_slice(&v.to_ne_bytes());
                written += 4;
                xs = rest;
            }
            FMT_F32LOW => {
                let (v, rest) = codecs::f32low(xs)?;
                dst[written..written + 4].copy_from_slice(&v.to_ne_bytes());
                written += 4;
                xs = rest;
            }
            FMT_F32FIX => {
                let (v, rest) = codecs::f32fix(xs)?;
                dst[written..written + 4].copy_from_slice(&v.to_ne_bytes());
                written += 4;
                xs = rest;
            }
            FMT_BYTE => {
                let (v, rest) = codecs::byte(xs)?;
                dst[written] = v;
                written += 1;
                xs = rest;
            }
            other => {
                return Err(WellLogError::InvalidArgument(format!(
                    "invalid format character '{}' in frame format string",
                    other
                )));
            }
        }
    }

    Ok((src.len() - xs.len(), written))
}

/// Frame data materialized from the implicit records of one DFSR: a
/// row-major buffer of native-endian values, `itemsize` bytes per row.
#[derive(Debug)]
pub struct FrameData {
    pub data: Vec<u8>,
    pub frames: usize,
    pub itemsize: usize,
}

impl FrameData {
    pub fn row(&self, index: usize) -> &[u8] {
        &self.data[index * self.itemsize..(index + 1) * self.itemsize]
    }
}

/// Read every frame belonging to the given DFSR into a contiguous row
/// buffer. The buffer starts sized to one frame per implicit record and
/// doubles whenever a record turns out to hold more than one frame; it is
/// shrunk to the discovered frame count at the end.
pub fn read_fdata(
    fmt: &str,
    device: &mut LisDevice,
    index: &RecordIndex,
    recinfo: &RecordInfo,
) -> Result<FrameData, WellLogError> {
    let (src_size, dst_size) = frame_sizes(fmt)?;
    if src_size == 0 {
        return Err(WellLogError::InvalidArgument(
            "empty frame format string".to_string(),
        ));
    }

    let implicits: Vec<RecordInfo> = index.implicits_of(recinfo.ltell)?.to_vec();

    let mut allocated = implicits.len();
    let mut data = vec![0u8; allocated * dst_size];
    let mut frames = 0usize;

    for head in &implicits {
        let record = device.read_record(head)?;

        let mut ptr = 0usize;
        let end = record.data.len();

        while ptr < end {
            if frames == allocated {
                allocated = (allocated * 2).max(1);
                data.resize(allocated * dst_size, 0);
            }

            if ptr + src_size > end {
                return Err(WellLogError::Parse(
                    "corrupted record: format would read past end".to_string(),
                ));
            }

            let row = &mut data[frames * dst_size..(frames + 1) * dst_size];
            pack_frame(fmt, &record.data[ptr..], row)?;

            ptr += src_size;
            frames += 1;
        }
    }

    if frames < allocated {
        data.truncate(frames * dst_size);
    }

    Ok(FrameData {
        data,
        frames,
        itemsize: dst_size,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn frame_sizes_for_mixed_channels() {
        // a float and an i16 channel
        let (src, dst) = frame_sizes("fi").unwrap();
        assert_eq!(src, 6);
        assert_eq!(dst, 6);

        // f16 widens from 2 source bytes to a native f32
        let (src, dst) = frame_sizes("es").unwrap();
        assert_eq!(src, 3);
        assert_eq!(dst, 5);
    }

    #[test]
    fn frame_sizes_reject_variable_length_types() {
        assert!(frame_sizes("fa").is_err());
        assert!(frame_sizes("m").is_err());
        assert!(frame_sizes("x").is_err());
    }

    #[test]
    fn pack_one_frame() {
        // LIS f32 1.0 followed by i16 -2
        let src = [0x40, 0xC0, 0x00, 0x00, 0xFF, 0xFE];
        let mut dst = [0u8; 6];
        let (consumed, written) = pack_frame("fi", &src, &mut dst).unwrap();
        assert_eq!(consumed, 6);
        assert_eq!(written, 6);

        let f = f32::from_ne_bytes(dst[0..4].try_into().unwrap());
        let i = i16::from_ne_bytes(dst[4..6].try_into().unwrap());
        assert_eq!(f, 1.0);
        assert_eq!(i, -2);
    }

    #[test]
    fn pack_frame_is_stable_per_format() {
        // source/destination skip ratio is a property of the format alone
        let (src_a, dst_a) = frame_sizes("eeb").unwrap();
        let (src_b, dst_b) = frame_sizes("eeb").unwrap();
        assert_eq!((src_a, dst_a), (src_b, dst_b));
    }
}
