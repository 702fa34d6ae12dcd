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

    tests/common/mod.rs

    Support routines for building well-log byte streams in memory.
*/
#![allow(dead_code)]

use logfox::{dlis::records::SegmentAttributes, lis::device::PrAttributes, stream::Stream};
use std::io::Cursor;

pub fn init() {
    match env_logger::builder().is_test(true).try_init() {
        Ok(_) => {
            log::debug!("Logger initialized.");
        }
        Err(_) => {}
    }
}

pub fn stream_over(bytes: Vec<u8>) -> Stream {
    Stream::from_source(Box::new(Cursor::new(bytes)), 0).unwrap()
}

/// One RP66 logical record segment. The total length includes the 4-byte
/// header; `body` must already contain any trailers the attributes declare.
pub fn segment(attrs: SegmentAttributes, rec_type: u8, body: &[u8]) -> Vec<u8> {
    let mut out = Vec::new();
    out.extend_from_slice(&((body.len() + 4) as u16).to_be_bytes());
    out.push(attrs.bits());
    out.push(rec_type);
    out.extend_from_slice(body);
    out
}

/// One RP66 visible record wrapping the given payload.
pub fn visible_record(payload: &[u8]) -> Vec<u8> {
    let mut out = Vec::new();
    out.extend_from_slice(&((payload.len() + 4) as u16).to_be_bytes());
    out.push(0xFF);
    out.push(0x01);
    out.extend_from_slice(payload);
    out
}

/// A tape image wrapping the given payloads, one data record each,
/// terminated by a tape mark.
pub fn tape_image(payloads: &[&[u8]]) -> Vec<u8> {
    let mut out = Vec::new();
    let mut prev = 0u32;

    for payload in payloads {
        let here = out.len() as u32;
        let next = here + 12 + payload.len() as u32;
        out.extend_from_slice(&0u32.to_le_bytes());
        out.extend_from_slice(&prev.to_le_bytes());
        out.extend_from_slice(&next.to_le_bytes());
        out.extend_from_slice(payload);
        prev = here;
    }

    let here = out.len() as u32;
    out.extend_from_slice(&1u32.to_le_bytes());
    out.extend_from_slice(&prev.to_le_bytes());
    out.extend_from_slice(&(here + 12).to_le_bytes());

    out
}

/// One LIS physical record. The logical record header goes only into the
/// first physical record of a chain; the trailer bytes must match the
/// attribute flags.
pub fn physical_record(
    attrs: PrAttributes,
    lrh: Option<(u8, u8)>,
    payload: &[u8],
    trailer: &[u8],
) -> Vec<u8> {
    let lrh_len = if lrh.is_some() { 2 } else { 0 };
    let length = 4 + lrh_len + payload.len() + trailer.len();

    let mut out = Vec::new();
    out.extend_from_slice(&(length as u16).to_be_bytes());
    out.extend_from_slice(&attrs.bits().to_be_bytes());
    if let Some((rec_type, lrh_attrs)) = lrh {
        out.push(rec_type);
        out.push(lrh_attrs);
    }
    out.extend_from_slice(payload);
    out.extend_from_slice(trailer);
    out
}

/// A 40-byte LIS spec block (subtype 0) declaring one channel.
pub fn spec_block(mnemonic: &str, ssize: i16, samples: u8, reprc: u8) -> Vec<u8> {
    assert_eq!(mnemonic.len(), 4);

    let mut out = Vec::new();
    out.extend_from_slice(mnemonic.as_bytes());
    out.extend_from_slice(b"SRVC  ");
    out.extend_from_slice(b"ORDER001");
    out.extend_from_slice(b"M   ");
    out.extend_from_slice(&[0; 4]); // API codes
    out.extend_from_slice(&1i16.to_be_bytes()); // file number
    out.extend_from_slice(&ssize.to_be_bytes());
    out.extend_from_slice(&[0; 2]); // padding
    out.push(0); // process level
    out.push(samples);
    out.push(reprc);
    out.extend_from_slice(&[0; 5]); // pad byte + process indicators
    assert_eq!(out.len(), 40);
    out
}

/// A LIS 32-bit float: sign, excess-128 exponent, two's-complement
/// 23-bit fraction.
pub fn lis_f32_bytes(x: f32) -> [u8; 4] {
    if x == 0.0 {
        return [0, 0, 0, 0];
    }

    let negative = x < 0.0;
    let mut magnitude = x.abs();

    // normalize the fraction into [0.5, 1)
    let mut exponent: i32 = 128;
    while magnitude >= 1.0 {
        magnitude /= 2.0;
        exponent += 1;
    }
    while magnitude < 0.5 {
        magnitude *= 2.0;
        exponent -= 1;
    }

    let mut frac = (magnitude * (1 << 23) as f32).round() as u32 & 0x007F_FFFF;
    let mut v = (exponent as u32) << 23;
    if negative {
        frac = frac.wrapping_neg() & 0x007F_FFFF;
        v |= 0x8000_0000;
    }
    v |= frac;
    v.to_be_bytes()
}

#[test]
fn lis_f32_bytes_agree_with_the_decoder() {
    for x in [1.0f32, -1.0, 0.0, 2.5, -118.625] {
        let bytes = lis_f32_bytes(x);
        let (v, _) = logfox::lis::codecs::f32(&bytes).unwrap();
        assert_eq!(v, x, "{:?}", bytes);
    }
}
