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

    src/dlis/codecs.rs

    Pure byte-level codecs for every RP66 primitive representation code.
    Decoders take a slice and return the value together with the remaining
    bytes; a too-short slice is a Truncation error. Encoders append the
    on-disk form to a buffer and exist for every code needed to synthesize
    records (round-trip coverage lives in the tests).

    All multi-byte integers and IEEE floats are big-endian on disk. VAX
    floats use the VAX word-swapped layout and IBM floats the hex-base-16
    layout; both decode to IEEE bit patterns.
*/

use super::types::{
    AttRef, Dtime, Ident, ObName, ObjRef, Origin, RepresentationCode, Units, ValueVector, YEAR_ZERO,
};
use crate::WellLogError;

pub type DecodeResult<'a, T> = Result<(T, &'a [u8]), WellLogError>;

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

pub fn sshort(xs: &[u8]) -> DecodeResult<i8> {
    let (head, rest) = take(xs, 1)?;
    Ok((head[0] as i8, rest))
}

pub fn snorm(xs: &[u8]) -> DecodeResult<i16> {
    let (head, rest) = take(xs, 2)?;
    Ok((i16::from_be_bytes([head[0], head[1]]), rest))
}

pub fn slong(xs: &[u8]) -> DecodeResult<i32> {
    let (head, rest) = take(xs, 4)?;
    Ok((i32::from_be_bytes([head[0], head[1], head[2], head[3]]), rest))
}

pub fn ushort(xs: &[u8]) -> DecodeResult<u8> {
    let (head, rest) = take(xs, 1)?;
    Ok((head[0], rest))
}

pub fn unorm(xs: &[u8]) -> DecodeResult<u16> {
    let (head, rest) = take(xs, 2)?;
    Ok((u16::from_be_bytes([head[0], head[1]]), rest))
}

pub fn ulong(xs: &[u8]) -> DecodeResult<u32> {
    let (head, rest) = take(xs, 4)?;
    Ok((u32::from_be_bytes([head[0], head[1], head[2], head[3]]), rest))
}

pub fn fsingl(xs: &[u8]) -> DecodeResult<f32> {
    let (v, rest) = ulong(xs)?;
    Ok((f32::from_bits(v), rest))
}

pub fn fdoubl(xs: &[u8]) -> DecodeResult<f64> {
    let (head, rest) = take(xs, 8)?;
    let mut raw = [0u8; 8];
    raw.copy_from_slice(head);
    Ok((f64::from_bits(u64::from_be_bytes(raw)), rest))
}

/// Low precision floating point: 1 sign bit, an 11-bit mantissa in bits
/// 4-14 and a 4-bit exponent in bits 0-3. Negative values two's-complement
/// the mantissa. Value = sign * (mantissa / 2048) * 2^exponent.
pub fn fshort(xs: &[u8]) -> DecodeResult<f32> {
    let (v, rest) = unorm(xs)?;

    let sign_bit = v & 0x8000;
    let exp_bits = v & 0x000F;
    let mut frac_bits = (v & 0xFFF0) >> 4;
    if sign_bit != 0 {
        frac_bits = (!frac_bits & 0x0FFF) + 1;
    }

    let sign = if sign_bit != 0 { -1.0f32 } else { 1.0f32 };
    let fractional = frac_bits as f32 / 0x0800 as f32;

    Ok((sign * fractional * (exp_bits as f32).exp2(), rest))
}

/// IBM single precision: a hex-base-16 characteristic and 24-bit fraction,
/// converted to an IEEE bit pattern by a table-driven normalization of the
/// top two mantissa bits. Overflow clamps to the IEEE max, underflow
/// flushes to zero.
pub fn isingl(xs: &[u8]) -> DecodeResult<f32> {
    const IEEEMAX: u32 = 0x7FFF_FFFF;
    const IEMAXIB: u32 = 0x611F_FFFF;
    const IEMINIB: u32 = 0x2120_0000;

    const IT: [u32; 8] = [
        0x2180_0000, 0x2140_0000, 0x2100_0000, 0x2100_0000, 0x20C0_0000, 0x20C0_0000, 0x20C0_0000,
        0x20C0_0000,
    ];
    const MT: [u32; 8] = [8, 4, 2, 2, 1, 1, 1, 1];

    let (u, rest) = ulong(xs)?;

    let mut manthi = u & 0x00FF_FFFF;
    let ix = (manthi >> 21) as usize;
    let iexp = (u & 0x7F00_0000).wrapping_sub(IT[ix]) << 1;
    manthi = manthi.wrapping_mul(MT[ix]).wrapping_add(iexp);
    let inabs = u & 0x7FFF_FFFF;
    if inabs > IEMAXIB {
        manthi = IEEEMAX;
    }
    manthi |= u & 0x8000_0000;
    let out = if inabs < IEMINIB { 0 } else { manthi };

    Ok((f32::from_bits(out), rest))
}

/// VAX single precision: word-swapped on disk, hidden mantissa bit before
/// the point (0.1m rather than IEEE's 1.m), exponent biased by -128. An
/// exponent of zero means zero when positive and an undefined value (NaN)
/// when negative; there is no denormalized form.
pub fn vsingl(xs: &[u8]) -> DecodeResult<f32> {
    let (x, rest) = take(xs, 4)?;

    let v = (x[1] as u32) << 24 | (x[0] as u32) << 16 | (x[3] as u32) << 8 | (x[2] as u32);

    let sign_bit = v & 0x8000_0000;
    let frac_bits = v & 0x007F_FFFF;
    let exp_bits = (v & 0x7F80_0000) >> 23;

    let sign = if sign_bit != 0 { -1.0f32 } else { 1.0f32 };
    let exponent = exp_bits as f32 - 128.0;
    let significand = (frac_bits | 0x0080_0000) as f32 / (2.0f32).powi(24);

    let out = if exp_bits != 0 {
        sign * significand * exponent.exp2()
    } else if sign_bit == 0 {
        0.0
    } else {
        f32::NAN
    };

    Ok((out, rest))
}

pub fn fsing1(xs: &[u8]) -> DecodeResult<(f32, f32)> {
    let (v, xs) = fsingl(xs)?;
    let (a, xs) = fsingl(xs)?;
    Ok(((v, a), xs))
}

pub fn fsing2(xs: &[u8]) -> DecodeResult<(f32, f32, f32)> {
    let (v, xs) = fsingl(xs)?;
    let (a, xs) = fsingl(xs)?;
    let (b, xs) = fsingl(xs)?;
    Ok(((v, a, b), xs))
}

pub fn csingl(xs: &[u8]) -> DecodeResult<(f32, f32)> {
    let (re, xs) = fsingl(xs)?;
    let (im, xs) = fsingl(xs)?;
    Ok(((re, im), xs))
}

pub fn fdoub1(xs: &[u8]) -> DecodeResult<(f64, f64)> {
    let (v, xs) = fdoubl(xs)?;
    let (a, xs) = fdoubl(xs)?;
    Ok(((v, a), xs))
}

pub fn fdoub2(xs: &[u8]) -> DecodeResult<(f64, f64, f64)> {
    let (v, xs) = fdoubl(xs)?;
    let (a, xs) = fdoubl(xs)?;
    let (b, xs) = fdoubl(xs)?;
    Ok(((v, a, b), xs))
}

pub fn cdoubl(xs: &[u8]) -> DecodeResult<(f64, f64)> {
    let (re, xs) = fdoubl(xs)?;
    let (im, xs) = fdoubl(xs)?;
    Ok(((re, im), xs))
}

/// Variable-length unsigned integer. The top two bits of the first byte
/// select the width: 0x -> 1 byte, 10 -> 2 bytes, 11 -> 4 bytes. The
/// length-encoding bits are blanked out of the value, so the result always
/// fits a 32-bit signed integer.
pub fn uvari(xs: &[u8]) -> DecodeResult<i32> {
    let (head, _) = take(xs, 1)?;

    match head[0] & 0xC0 {
        0xC0 => {
            let (v, rest) = ulong(xs)?;
            Ok(((v & 0x3FFF_FFFF) as i32, rest))
        }
        0x80 => {
            let (v, rest) = unorm(xs)?;
            Ok(((v & 0x3FFF) as i32, rest))
        }
        _ => {
            let (v, rest) = ushort(xs)?;
            Ok((v as i32, rest))
        }
    }
}

fn short_string(xs: &[u8]) -> DecodeResult<String> {
    let (len, xs) = ushort(xs)?;
    let (body, rest) = take(xs, len as usize)?;
    Ok((String::from_utf8_lossy(body).into_owned(), rest))
}

/// A length-prefixed identifier of at most 255 bytes. Not null-terminated
/// on disk; the decoded value carries its own length.
pub fn ident(xs: &[u8]) -> DecodeResult<Ident> {
    let (s, rest) = short_string(xs)?;
    Ok((Ident(s), rest))
}

pub fn units(xs: &[u8]) -> DecodeResult<Units> {
    let (s, rest) = short_string(xs)?;
    Ok((Units(s), rest))
}

/// A uvari-length-prefixed ASCII string, up to 2^30 bytes.
pub fn ascii(xs: &[u8]) -> DecodeResult<String> {
    let (len, xs) = uvari(xs)?;
    let (body, rest) = take(xs, len as usize)?;
    Ok((String::from_utf8_lossy(body).into_owned(), rest))
}

/// 8-byte date and time. The timezone lives in the upper nibble of the
/// second byte, the month in the lower; the year is offset from 1900.
pub fn dtime(xs: &[u8]) -> DecodeResult<Dtime> {
    let (head, xs) = take(xs, 6)?;
    let (ms, rest) = unorm(xs)?;

    Ok((
        Dtime {
            year: head[0] as i32 + YEAR_ZERO,
            tz: (head[1] & 0xF0) >> 4,
            month: head[1] & 0x0F,
            day: head[2],
            hour: head[3],
            minute: head[4],
            second: head[5],
            millisecond: ms,
        },
        rest,
    ))
}

pub fn origin(xs: &[u8]) -> DecodeResult<Origin> {
    let (v, rest) = uvari(xs)?;
    Ok((Origin(v), rest))
}

pub fn obname(xs: &[u8]) -> DecodeResult<ObName> {
    let (orig, xs) = origin(xs)?;
    let (copy, xs) = ushort(xs)?;
    let (id, rest) = ident(xs)?;
    Ok((ObName { origin: orig, copy, id }, rest))
}

pub fn objref(xs: &[u8]) -> DecodeResult<ObjRef> {
    let (kind, xs) = ident(xs)?;
    let (name, rest) = obname(xs)?;
    Ok((ObjRef { kind, name }, rest))
}

pub fn attref(xs: &[u8]) -> DecodeResult<AttRef> {
    let (kind, xs) = ident(xs)?;
    let (name, xs) = obname(xs)?;
    let (label, rest) = ident(xs)?;
    Ok((AttRef { kind, name, label }, rest))
}

pub fn status(xs: &[u8]) -> DecodeResult<bool> {
    let (v, rest) = ushort(xs)?;
    Ok((v != 0, rest))
}

/// Decode `count` values of the given representation code into a tagged
/// vector. A count of zero produces an empty vector of the right tag, not
/// Absent; explicit absence is a framing-level concern.
pub fn decode_values(
    reprc: RepresentationCode,
    count: usize,
    xs: &[u8],
) -> DecodeResult<ValueVector> {
    fn extract<'a, T>(
        count: usize,
        xs: &'a [u8],
        f: impl Fn(&'a [u8]) -> DecodeResult<'a, T>,
    ) -> DecodeResult<'a, Vec<T>> {
        let mut values = Vec::with_capacity(count);
        let mut cur = xs;
        for _ in 0..count {
            let (v, rest) = f(cur)?;
            values.push(v);
            cur = rest;
        }
        Ok((values, cur))
    }

    use RepresentationCode as Rc;
    let (value, rest) = match reprc {
        Rc::FShort => {
            let (v, rest) = extract(count, xs, fshort)?;
            (ValueVector::FShort(v), rest)
        }
        Rc::FSingl => {
            let (v, rest) = extract(count, xs, fsingl)?;
            (ValueVector::FSingl(v), rest)
        }
        Rc::FSing1 => {
            let (v, rest) = extract(count, xs, fsing1)?;
            (ValueVector::FSing1(v), rest)
        }
        Rc::FSing2 => {
            let (v, rest) = extract(count, xs, fsing2)?;
            (ValueVector::FSing2(v), rest)
        }
        Rc::ISingl => {
            let (v, rest) = extract(count, xs, isingl)?;
            (ValueVector::ISingl(v), rest)
        }
        Rc::VSingl => {
            let (v, rest) = extract(count, xs, vsingl)?;
            (ValueVector::VSingl(v), rest)
        }
        Rc::FDoubl => {
            let (v, rest) = extract(count, xs, fdoubl)?;
            (ValueVector::FDoubl(v), rest)
        }
        Rc::FDoub1 => {
            let (v, rest) = extract(count, xs, fdoub1)?;
            (ValueVector::FDoub1(v), rest)
        }
        Rc::FDoub2 => {
            let (v, rest) = extract(count, xs, fdoub2)?;
            (ValueVector::FDoub2(v), rest)
        }
        Rc::CSingl => {
            let (v, rest) = extract(count, xs, csingl)?;
            (ValueVector::CSingl(v), rest)
        }
        Rc::CDoubl => {
            let (v, rest) = extract(count, xs, cdoubl)?;
            (ValueVector::CDoubl(v), rest)
        }
        Rc::SShort => {
            let (v, rest) = extract(count, xs, sshort)?;
            (ValueVector::SShort(v), rest)
        }
        Rc::SNorm => {
            let (v, rest) = extract(count, xs, snorm)?;
            (ValueVector::SNorm(v), rest)
        }
        Rc::SLong => {
            let (v, rest) = extract(count, xs, slong)?;
            (ValueVector::SLong(v), rest)
        }
        Rc::UShort => {
            let (v, rest) = extract(count, xs, ushort)?;
            (ValueVector::UShort(v), rest)
        }
        Rc::UNorm => {
            let (v, rest) = extract(count, xs, unorm)?;
            (ValueVector::UNorm(v), rest)
        }
        Rc::ULong => {
            let (v, rest) = extract(count, xs, ulong)?;
            (ValueVector::ULong(v), rest)
        }
        Rc::UVari => {
            let (v, rest) = extract(count, xs, uvari)?;
            (ValueVector::UVari(v), rest)
        }
        Rc::Ident => {
            let (v, rest) = extract(count, xs, ident)?;
            (ValueVector::Ident(v), rest)
        }
        Rc::Ascii => {
            let (v, rest) = extract(count, xs, ascii)?;
            (ValueVector::Ascii(v), rest)
        }
        Rc::Dtime => {
            let (v, rest) = extract(count, xs, dtime)?;
            (ValueVector::Dtime(v), rest)
        }
        Rc::Origin => {
            let (v, rest) = extract(count, xs, origin)?;
            (ValueVector::Origin(v), rest)
        }
        Rc::ObName => {
            let (v, rest) = extract(count, xs, obname)?;
            (ValueVector::ObName(v), rest)
        }
        Rc::ObjRef => {
            let (v, rest) = extract(count, xs, objref)?;
            (ValueVector::ObjRef(v), rest)
        }
        Rc::AttRef => {
            let (v, rest) = extract(count, xs, attref)?;
            (ValueVector::AttRef(v), rest)
        }
        Rc::Status => {
            let (v, rest) = extract(count, xs, status)?;
            (ValueVector::Status(v), rest)
        }
        Rc::Units => {
            let (v, rest) = extract(count, xs, units)?;
            (ValueVector::Units(v), rest)
        }
        Rc::Undef => {
            return Err(WellLogError::Parse(
                "unable to interpret attribute: unknown representation code".to_string(),
            ));
        }
    };
    Ok((value, rest))
}

/*
 * Encoders. They share their decoder's name with a `_to` suffix and append
 * the on-disk form to the buffer.
 */

pub fn sshort_to(buf: &mut Vec<u8>, x: i8) {
    buf.push(x as u8);
}

pub fn snorm_to(buf: &mut Vec<u8>, x: i16) {
    buf.extend_from_slice(&x.to_be_bytes());
}

pub fn slong_to(buf: &mut Vec<u8>, x: i32) {
    buf.extend_from_slice(&x.to_be_bytes());
}

pub fn ushort_to(buf: &mut Vec<u8>, x: u8) {
    buf.push(x);
}

pub fn unorm_to(buf: &mut Vec<u8>, x: u16) {
    buf.extend_from_slice(&x.to_be_bytes());
}

pub fn ulong_to(buf: &mut Vec<u8>, x: u32) {
    buf.extend_from_slice(&x.to_be_bytes());
}

pub fn fsingl_to(buf: &mut Vec<u8>, x: f32) {
    ulong_to(buf, x.to_bits());
}

pub fn fdoubl_to(buf: &mut Vec<u8>, x: f64) {
    buf.extend_from_slice(&x.to_bits().to_be_bytes());
}

pub fn fshort_to(buf: &mut Vec<u8>, x: f32) {
    // Scale down by powers of two until the mantissa fits its signed
    // 12-bit field.
    let mut exp: u16 = 0;
    let mut m = x * 2048.0;
    while exp < 15 && !(-2048.0..=2047.0).contains(&m) {
        exp += 1;
        m /= 2.0;
    }
    let m = (m.round() as i32).clamp(-2048, 2047) as i16;

    let v = ((m as u16) << 4) | (exp & 0x000F);
    unorm_to(buf, v);
}

pub fn isingl_to(buf: &mut Vec<u8>, x: f32) {
    const IT: [u32; 4] = [0x2120_0000, 0x2140_0000, 0x2180_0000, 0x2210_0000];
    const MT: [u32; 4] = [2, 4, 8, 1];

    let u = x.to_bits();

    let ix = ((u & 0x0180_0000) >> 23) as usize;
    let iexp = ((u & 0x7E00_0000) >> 1).wrapping_add(IT[ix]);
    let mut manthi = MT[ix].wrapping_mul(u & 0x007F_FFFF) >> 3;
    manthi = manthi.wrapping_add(iexp) | (u & 0x8000_0000);
    let out = if u & 0x7FFF_FFFF != 0 { manthi } else { 0 };

    ulong_to(buf, out);
}

pub fn vsingl_to(buf: &mut Vec<u8>, x: f32) {
    let u = x.to_bits();

    let sign_bit = u & 0x8000_0000;
    let mut exp_bits = (u & 0x7F80_0000) >> 23;
    let frac_bits = u & 0x007F_FFFF;

    if exp_bits == 0 {
        buf.extend_from_slice(&[0, 0, 0, 0]);
        return;
    }

    exp_bits = (exp_bits + 2) << 23;
    let v = sign_bit | exp_bits | frac_bits;

    let z = (v & 0x00FF_0000) << 8 | (v & 0xFF00_0000) >> 8 | (v & 0x0000_00FF) << 8 | (v & 0x0000_FF00) >> 8;
    ulong_to(buf, z);
}

pub fn fsing1_to(buf: &mut Vec<u8>, v: f32, a: f32) {
    fsingl_to(buf, v);
    fsingl_to(buf, a);
}

pub fn fsing2_to(buf: &mut Vec<u8>, v: f32, a: f32, b: f32) {
    fsingl_to(buf, v);
    fsingl_to(buf, a);
    fsingl_to(buf, b);
}

pub fn csingl_to(buf: &mut Vec<u8>, re: f32, im: f32) {
    fsingl_to(buf, re);
    fsingl_to(buf, im);
}

pub fn fdoub1_to(buf: &mut Vec<u8>, v: f64, a: f64) {
    fdoubl_to(buf, v);
    fdoubl_to(buf, a);
}

pub fn fdoub2_to(buf: &mut Vec<u8>, v: f64, a: f64, b: f64) {
    fdoubl_to(buf, v);
    fdoubl_to(buf, a);
    fdoubl_to(buf, b);
}

pub fn cdoubl_to(buf: &mut Vec<u8>, re: f64, im: f64) {
    fdoubl_to(buf, re);
    fdoubl_to(buf, im);
}

/// Encode a uvari. `width` is the minimum encoded width (1, 2 or 4); the
/// value is promoted to a wider form when it does not fit.
pub fn uvari_to(buf: &mut Vec<u8>, x: i32, width: usize) {
    if x <= 0x7F && width <= 1 {
        buf.push(x as u8);
        return;
    }

    if x <= 0x3FFF && width <= 2 {
        unorm_to(buf, (x as u16) | 0x8000);
        return;
    }

    ulong_to(buf, (x as u32) | 0xC000_0000);
}

pub fn ident_to(buf: &mut Vec<u8>, s: &str) {
    ushort_to(buf, s.len() as u8);
    buf.extend_from_slice(s.as_bytes());
}

pub fn units_to(buf: &mut Vec<u8>, s: &str) {
    ident_to(buf, s);
}

pub fn ascii_to(buf: &mut Vec<u8>, s: &str, width: usize) {
    uvari_to(buf, s.len() as i32, width);
    buf.extend_from_slice(s.as_bytes());
}

pub fn origin_to(buf: &mut Vec<u8>, x: i32) {
    uvari_to(buf, x, 4);
}

pub fn status_to(buf: &mut Vec<u8>, x: bool) {
    ushort_to(buf, x as u8);
}

pub fn dtime_to(buf: &mut Vec<u8>, dt: &Dtime) {
    buf.push((dt.year - YEAR_ZERO) as u8);
    buf.push((dt.tz << 4) | (dt.month & 0x0F));
    buf.push(dt.day);
    buf.push(dt.hour);
    buf.push(dt.minute);
    buf.push(dt.second);
    unorm_to(buf, dt.millisecond);
}

pub fn obname_to(buf: &mut Vec<u8>, name: &ObName) {
    origin_to(buf, name.origin.0);
    ushort_to(buf, name.copy);
    ident_to(buf, &name.id.0);
}

pub fn objref_to(buf: &mut Vec<u8>, objref: &ObjRef) {
    ident_to(buf, &objref.kind.0);
    obname_to(buf, &objref.name);
}

pub fn attref_to(buf: &mut Vec<u8>, attref: &AttRef) {
    ident_to(buf, &attref.kind.0);
    obname_to(buf, &attref.name);
    ident_to(buf, &attref.label.0);
}
