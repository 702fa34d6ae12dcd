mod common;

use common::*;
use logfox::{stream::Stream, WellLogError};
use std::io::Cursor;

#[test]
fn tapeimage_concatenates_record_payloads() {
    init();

    let image = tape_image(&[b"hello ", b"world"]);
    let stream = stream_over(image);
    let mut stream = stream.wrap_tapeimage().unwrap();

    let mut buf = [0u8; 16];
    let nread = stream.read(&mut buf).unwrap();
    assert_eq!(nread, 11);
    assert_eq!(&buf[..nread], b"hello world");
    assert!(stream.eof());
}

#[test]
fn tapeimage_logical_and_physical_tells() {
    init();

    let image = tape_image(&[b"abcd", b"efgh"]);
    let mut stream = stream_over(image).wrap_tapeimage().unwrap();

    let mut buf = [0u8; 6];
    stream.read(&mut buf).unwrap();
    assert_eq!(&buf, b"abcdef");
    assert_eq!(stream.ltell(), 6);
    // 12-byte header, 4 payload bytes, a second header, 2 more payload
    // bytes: the leaf sits at 12 + 4 + 12 + 2
    assert_eq!(stream.ptell(), 30);

    // seeks are logical
    stream.lseek(4).unwrap();
    let mut buf = [0u8; 4];
    stream.read(&mut buf).unwrap();
    assert_eq!(&buf, b"efgh");
}

#[test]
fn tapeimage_rejects_wrapping_at_end_of_data() {
    init();

    let image = tape_image(&[b"data"]);
    let len = image.len() as u64;
    let stream = Stream::from_source(Box::new(Cursor::new(image)), len).unwrap();
    match stream.wrap_tapeimage() {
        Err(WellLogError::Eof) => {}
        other => panic!("expected Eof, got {:?}", other.err()),
    }
}

#[test]
fn tapeimage_truncated_record_is_an_error() {
    init();

    let mut image = tape_image(&[b"abcdefgh"]);
    image.truncate(12 + 4); // cut inside the first record's payload
    let mut stream = stream_over(image).wrap_tapeimage().unwrap();

    let mut buf = [0u8; 8];
    match stream.read(&mut buf) {
        Err(WellLogError::Truncation(_)) => {}
        other => panic!("expected Truncation, got {:?}", other),
    }
}

#[test]
fn visible_records_concatenate() {
    init();

    let mut image = visible_record(b"one ");
    image.extend_from_slice(&visible_record(b"two"));
    let mut stream = stream_over(image).wrap_rp66().unwrap();

    let mut buf = [0u8; 16];
    let nread = stream.read(&mut buf).unwrap();
    assert_eq!(&buf[..nread], b"one two");
    assert!(stream.eof());
}

#[test]
fn visible_record_envelope_is_validated() {
    init();

    let mut image = visible_record(b"ok");
    image.extend_from_slice(&[0x00, 0x08, 0xFE, 0x01, 0, 0, 0, 0]);
    let mut stream = stream_over(image).wrap_rp66().unwrap();

    let mut buf = [0u8; 10];
    match stream.read(&mut buf) {
        Err(WellLogError::Inconsistent(_)) => {}
        other => panic!("expected Inconsistent, got {:?}", other),
    }
}

#[test]
fn visible_records_over_tapeimage() {
    init();

    // the full RP66 stack: tape image framing outside, visible records
    // inside
    let mut inner = visible_record(b"abc");
    inner.extend_from_slice(&visible_record(b"def"));
    let image = tape_image(&[&inner]);

    let stream = stream_over(image).wrap_tapeimage().unwrap();
    let mut stream = stream.wrap_rp66().unwrap();

    let mut buf = [0u8; 8];
    let nread = stream.read(&mut buf).unwrap();
    assert_eq!(&buf[..nread], b"abcdef");

    stream.lseek(3).unwrap();
    let mut buf = [0u8; 3];
    stream.read(&mut buf).unwrap();
    assert_eq!(&buf, b"def");
}

#[test]
fn seek_past_end_reads_nothing() {
    init();

    let image = tape_image(&[b"abcd"]);
    let mut stream = stream_over(image).wrap_tapeimage().unwrap();

    stream.lseek(100).unwrap();
    let mut buf = [0u8; 4];
    assert_eq!(stream.read(&mut buf).unwrap(), 0);
    assert!(stream.eof());
}
