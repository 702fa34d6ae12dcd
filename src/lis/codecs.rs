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

    src/lis/codecs.rs

    Byte-level codecs for the LIS-79 primitives. Same calling convention as
    the RP66 codecs: slice in, value plus remaining slice out. The string
    and mask types do not carry their own length; it comes from the
    surrounding structure.
*/

use super::types::{LisReprc, LisValue};
use crate::{dlis::codecs::DecodeResult, WellLogError};

fn take(xs: &[u8], n: usize) -> Result<(&[u8], &[u8]), WellLogError> {
    if xs.len() < n {
        return Err(WellLogError::Truncation(format!(
            "codec needed {} bytes, had {}",
            n,
            xs.len()
        )));
    }
    Ok(xs.split_at(n))
}

pub fn i8(xs: &[u8]) -> DecodeResult<i8> {
    let (head, rest) = take(xs, 1)?;
    Ok((head[0] as i8, rest))
}

pub fn i16(xs: &[u8]) -> DecodeResult<i16> {
    let (head, rest) = take(xs, 2)?;
    Ok((i16::from_be_bytes([head[0], head[1]]), rest))
}

pub fn i32(xs: &[u8]) -> DecodeResult<i32> {
    let (head, rest) = take(xs, 4)?;
    Ok((i32::from_be_bytes([head[0], head[1], head[2], head[3]]), rest))
}

pub fn byte(xs: &[u8]) -> DecodeResult<u8> {
    let (head, rest) = take(xs, 1)?;
    Ok((head[0], rest))
}

/// 16-bit floating point. The bit layout is identical to the RP66 fshort:
/// sign, 11-bit two's-complement mantissa in bits 4-14, 4-bit exponent.
pub fn f16(xs: &[u8]) -> DecodeResult<f32> {
    crate::dlis::codecs::fshort(xs)
}

/// 32-bit floating point: sign, 8-bit excess-128 exponent, 23-bit
/// two's-complement fraction over 2^23.
pub fn f32(xs: &[u8]) -> DecodeResult<f32> {
    let (head, rest) = take(xs, 4)?;
    let v = u32::from_be_bytes([head[0], head[1], head[2], head[3]]);

    let sign_bit = v & 0x8000_0000;
    let exp_bits = (v & 0x7F80_0000) >> 23;
    let mut frac_bits = v & 0x007F_FFFF;
    if sign_bit != 0 {
        frac_bits = (!frac_bits & 0x007F_FFFF) + 1;
    }

    let sign = if sign_bit != 0 { -1.0f32 } else { 1.0f32 };
    let exponent = exp_bits as f32 - 128.0;
    let fraction = frac_bits as f32 / 0x0080_0000 as f32;

    Ok((sign * fraction * exponent.exp2(), rest))
}

/// 32-bit low resolution floating point: a signed excess-15 exponent
/// halfword followed by a signed mantissa halfword.
pub fn f32low(xs: &[u8]) -> DecodeResult<f32> {
    let (exponent, xs) = i16(xs)?;
    let (mantissa, rest) = i16(xs)?;

    Ok((mantissa as f32 * (exponent as f32 - 15.0).exp2(), rest))
}

/// 32-bit fixed point: two's complement with the binary point in the
/// middle, so the value is the raw integer over 2^16.
pub fn f32fix(xs: &[u8]) -> DecodeResult<f32> {
    let (v, rest) = i32(xs)?;
    Ok((v as f32 / 65536.0, rest))
}

/// Alphanumeric. The length is not encoded in the type; it is implied by
/// the standard or stated by another value in the file.
pub fn string(xs: &[u8], len: usize) -> DecodeResult<String> {
    let (head, rest) = take(xs, len)?;
    Ok((String::from_utf8_lossy(head).into_owned(), rest))
}

/// Bitmask, externally sized like [`string`].
pub fn mask(xs: &[u8], len: usize) -> DecodeResult<Vec<u8>> {
    let (head, rest) = take(xs, len)?;
    Ok((head.to_vec(), rest))
}

/// Decode one value of the given representation code. `size` is only
/// consulted for the externally-sized string and mask codes.
pub fn decode_value(reprc: u8, size: usize, xs: &[u8]) -> DecodeResult<LisValue> {
    let code = LisReprc::from_repr(reprc).ok_or_else(|| {
        WellLogError::Parse(format!(
            "unable to interpret value: unknown representation code {}",
            reprc
        ))
    })?;

    Ok(match code {
        LisReprc::I8 => {
            let (v, rest) = i8(xs)?;
            (LisValue::I8(v), rest)
        }
        LisReprc::I16 => {
            let (v, rest) = i16(xs)?;
            (LisValue::I16(v), rest)
        }
        LisReprc::I32 => {
            let (v, rest) = i32(xs)?;
            (LisValue::I32(v), rest)
        }
        LisReprc::F16 => {
            let (v, rest) = f16(xs)?;
            (LisValue::F16(v), rest)
        }
        LisReprc::F32 => {
            let (v, rest) = f32(xs)?;
            (LisValue::F32(v), rest)
        }
        LisReprc::F32Low => {
            let (v, rest) = f32low(xs)?;
            (LisValue::F32Low(v), rest)
        }
        LisReprc::F32Fix => {
            let (v, rest) = f32fix(xs)?;
            (LisValue::F32Fix(v), rest)
        }
        LisReprc::String => {
            let (v, rest) = string(xs, size)?;
            (LisValue::String(v), rest)
        }
        LisReprc::Byte => {
            let (v, rest) = byte(xs)?;
            (LisValue::Byte(v), rest)
        }
        LisReprc::Mask => {
            let (v, rest) = mask(xs, size)?;
            (LisValue::Mask(v), rest)
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn f16_matches_the_fshort_layout() {
        let (v, _) = f16(&[0x4C, 0x88]).unwrap();
        assert_eq!(v, 153.0);
        let (v, _) = f16(&[0x80, 0x00]).unwrap();
        assert_eq!(v, -1.0);
        let (v, _) = f16(&[0x00, 0x00]).unwrap();
        assert_eq!(v, 0.0);
    }

    #[test]
    fn f32_positive_and_negative() {
        // fraction 0x400000 (= 0.5) with exponent 129 is 1.0
        let (v, _) = f32(&[0x40, 0xC0, 0x00, 0x00]).unwrap();
        assert_eq!(v, 1.0);
        // sign bit set, two's-complemented fraction of the same magnitude
        let (v, _) = f32(&[0xC0, 0xC0, 0x00, 0x00]).unwrap();
        assert_eq!(v, -1.0);
        let (v, _) = f32(&[0x00, 0x00, 0x00, 0x00]).unwrap();
        assert_eq!(v, 0.0);
    }

    #[test]
    fn f32low_applies_the_exponent_bias() {
        // exponent 15 cancels the bias, so the value is the raw mantissa
        let (v, _) = f32low(&[0x00, 0x0F, 0x00, 0x2A]).unwrap();
        assert_eq!(v, 42.0);
        // exponent 14 halves it
        let (v, _) = f32low(&[0x00, 0x0E, 0x00, 0x2A]).unwrap();
        assert_eq!(v, 21.0);
        // negative mantissa
        let (v, _) = f32low(&[0x00, 0x0F, 0xFF, 0xD6]).unwrap();
        assert_eq!(v, -42.0);
    }

    #[test]
    fn f32fix_divides_by_two_to_the_sixteen() {
        let (v, _) = f32fix(&[0x00, 0x01, 0x80, 0x00]).unwrap();
        assert_eq!(v, 1.5);
        let (v, _) = f32fix(&[0xFF, 0xFF, 0x00, 0x00]).unwrap();
        assert_eq!(v, -1.0);
    }

    #[test]
    fn string_and_mask_take_external_lengths() {
        let (s, rest) = string(b"GR  DATA", 4).unwrap();
        assert_eq!(s, "GR  ");
        assert_eq!(rest, b"DATA");

        let (m, rest) = mask(&[0xAA, 0x55, 0x01], 2).unwrap();
        assert_eq!(m, vec![0xAA, 0x55]);
        assert_eq!(rest, &[0x01]);
    }

    #[test]
    fn decode_value_rejects_unknown_codes() {
        assert!(decode_value(57, 0, &[0x00]).is_err());
    }
}
