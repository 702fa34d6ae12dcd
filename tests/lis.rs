mod common;

use common::*;
use logfox::{
    lis::{
        device::{open_source, PrAttributes, RecordIndex},
        dfsr::{dfs_fmtstr, parse_dfsr},
        frames::{frame_sizes, read_fdata},
        types::RecordType,
        LisDevice,
    },
    WellLogError,
};
use std::io::Cursor;

fn lis_device(image: Vec<u8>, tapeimage: bool) -> LisDevice {
    open_source(Box::new(Cursor::new(image)), 0, tapeimage).unwrap()
}

fn index_of(device: &mut LisDevice) -> RecordIndex {
    device.index_records()
}

#[test]
fn indexer_finds_consecutive_records() {
    init();

    let mut image = physical_record(PrAttributes::empty(), Some((0, 0)), &[1, 2, 3, 4], &[]);
    image.extend_from_slice(&physical_record(
        PrAttributes::empty(),
        Some((0, 0)),
        &[5, 6],
        &[],
    ));

    let mut device = lis_device(image, false);
    let index = index_of(&mut device);

    assert_eq!(index.size(), 2);
    assert_eq!(index.implicits().len(), 2);
    assert_eq!(index.implicits()[0].ltell, 0);
    assert_eq!(index.implicits()[1].ltell, 10);
    assert!(!device.truncated().unwrap());
    assert_eq!(device.psize().unwrap(), 18);
}

#[test]
fn indexer_skips_padding_on_four_byte_alignment() {
    init();

    // First record ends at 10, then ten bytes of null padding. The next
    // header must begin at a 4-aligned tell, so the indexer resumes at 20
    // rather than at the start of the pad run.
    let mut image = physical_record(PrAttributes::empty(), Some((0, 0)), &[1, 2, 3, 4], &[]);
    image.extend_from_slice(&[0x00; 10]);
    image.extend_from_slice(&physical_record(
        PrAttributes::empty(),
        Some((0, 0)),
        &[5, 6],
        &[],
    ));

    let mut device = lis_device(image, false);
    let index = index_of(&mut device);

    assert_eq!(index.implicits().len(), 2);
    assert_eq!(index.implicits()[0].ltell, 0);
    assert_eq!(index.implicits()[1].ltell, 20);
    assert!(!device.truncated().unwrap());
}

#[test]
fn indexer_accepts_space_padding_to_end_of_data() {
    init();

    let mut image = physical_record(PrAttributes::empty(), Some((0, 0)), &[1, 2, 3, 4], &[]);
    image.extend_from_slice(&[0x20; 8]);

    let mut device = lis_device(image, false);
    let index = index_of(&mut device);

    assert_eq!(index.size(), 1);
    assert!(!device.truncated().unwrap());
}

#[test]
fn indexer_rejects_unknown_record_types() {
    init();

    // 7 is not a LIS record type
    let image = physical_record(PrAttributes::empty(), Some((7, 0)), &[1, 2], &[]);

    let mut device = lis_device(image, false);
    let index = index_of(&mut device);

    assert_eq!(index.size(), 0);
    assert!(device.truncated().unwrap());
}

#[test]
fn indexer_marks_truncation_and_keeps_the_prefix() {
    init();

    let mut image = physical_record(PrAttributes::empty(), Some((0, 0)), &[1, 2, 3, 4], &[]);
    image.extend_from_slice(&physical_record(
        PrAttributes::empty(),
        Some((0, 0)),
        &[5, 6, 7, 8],
        &[],
    ));
    image.truncate(17); // cut inside the second record

    let mut device = lis_device(image, false);
    let index = index_of(&mut device);

    assert_eq!(index.size(), 1);
    assert_eq!(index.implicits()[0].ltell, 0);
    assert!(device.truncated().unwrap());
    assert!(matches!(device.psize(), Err(WellLogError::Truncation(_))));
}

#[test]
fn read_record_concatenates_physical_records_and_skips_trailers() {
    init();

    // A wellsite-data record split over two physical records; the first
    // carries a record-number trailer.
    let mut image = physical_record(
        PrAttributes::SUCCESSOR | PrAttributes::RECORD_NUMBER,
        Some((34, 0)),
        b"ABCD",
        &[0x00, 0x01],
    );
    image.extend_from_slice(&physical_record(PrAttributes::PREDECESSOR, None, b"EFG", &[]));

    let mut device = lis_device(image, false);
    let index = index_of(&mut device);

    assert_eq!(index.explicits().len(), 1);
    let info = &index.explicits()[0];
    assert_eq!(info.record_type(), Some(RecordType::WellsiteData));
    assert_eq!(info.size, 19);

    let rec = device.read_record(info).unwrap();
    assert_eq!(rec.data, b"ABCDEFG");
}

#[test]
fn open_rejects_a_device_at_end_of_data() {
    init();

    match open_source(Box::new(Cursor::new(Vec::new())), 0, false) {
        Err(WellLogError::Eof) => {}
        other => panic!("expected Eof, got {:?}", other.err()),
    }

    let image = physical_record(PrAttributes::empty(), Some((0, 0)), &[1, 2], &[]);
    let len = image.len() as u64;
    match open_source(Box::new(Cursor::new(image)), len, false) {
        Err(WellLogError::Eof) => {}
        other => panic!("expected Eof, got {:?}", other.err()),
    }
}

#[test]
fn device_reads_through_tapeimage_framing() {
    init();

    let inner = physical_record(PrAttributes::empty(), Some((34, 0)), b"wellsite", &[]);
    let image = tape_image(&[&inner]);

    let mut device = open_source(Box::new(Cursor::new(image)), 0, true).unwrap();
    let index = device.index_records();

    assert_eq!(index.explicits().len(), 1);
    let rec = device.read_record(&index.explicits()[0]).unwrap();
    assert_eq!(rec.data, b"wellsite");
}

/// A DFSR record body: an up/down entry, the terminator entry, then one
/// spec block per channel.
fn dfsr_body(channels: &[(&str, i16, u8)]) -> Vec<u8> {
    let mut body = Vec::new();
    body.extend_from_slice(&[4, 1, 56, 0x01]); // direction entry, i8
    body.extend_from_slice(&[0, 0, 56]); // terminator
    for (mnemonic, ssize, reprc) in channels {
        body.extend_from_slice(&spec_block(mnemonic, *ssize, 1, *reprc));
    }
    body
}

#[test]
fn dfsr_compiles_to_a_format_string() {
    init();

    let image = physical_record(
        PrAttributes::empty(),
        Some((64, 0)),
        &dfsr_body(&[("GR  ", 4, 68), ("SP  ", 2, 79)]),
        &[],
    );

    let mut device = lis_device(image, false);
    let index = index_of(&mut device);
    assert_eq!(index.explicits().len(), 1);

    let rec = device.read_record(&index.explicits()[0]).unwrap();
    let dfsr = parse_dfsr(&rec).unwrap();

    assert_eq!(dfsr.entries.len(), 2);
    assert_eq!(dfsr.specs.len(), 2);
    assert_eq!(dfsr.specs[0].mnemonic, "GR  ");
    assert_eq!(dfsr.subtype, 0);

    let fmt = dfs_fmtstr(&dfsr).unwrap();
    assert_eq!(fmt, "fi");
    assert_eq!(frame_sizes(&fmt).unwrap(), (6, 6));
}

#[test]
fn dfsr_rejects_unpackable_channels() {
    init();

    // a 3-byte channel cannot hold an integral number of i16 entries
    let image = physical_record(
        PrAttributes::empty(),
        Some((64, 0)),
        &dfsr_body(&[("BAD ", 3, 79)]),
        &[],
    );

    let mut device = lis_device(image, false);
    let index = index_of(&mut device);
    let rec = device.read_record(&index.explicits()[0]).unwrap();
    let dfsr = parse_dfsr(&rec).unwrap();

    match dfs_fmtstr(&dfsr) {
        Err(WellLogError::Parse(msg)) => assert!(msg.contains("BAD")),
        other => panic!("expected Parse, got {:?}", other.err()),
    }
}

fn frame(value: f32, count: i16) -> Vec<u8> {
    let mut out = Vec::new();
    out.extend_from_slice(&lis_f32_bytes(value));
    out.extend_from_slice(&count.to_be_bytes());
    out
}

#[test]
fn read_fdata_packs_frames_across_records() {
    init();

    let mut image = physical_record(
        PrAttributes::empty(),
        Some((64, 0)),
        &dfsr_body(&[("GR  ", 4, 68), ("SP  ", 2, 79)]),
        &[],
    );

    // two implicit records, two frames each
    let mut payload = frame(1.0, 1);
    payload.extend_from_slice(&frame(2.5, -2));
    image.extend_from_slice(&physical_record(
        PrAttributes::empty(),
        Some((0, 0)),
        &payload,
        &[],
    ));

    let mut payload = frame(3.0, 3);
    payload.extend_from_slice(&frame(0.5, 4));
    image.extend_from_slice(&physical_record(
        PrAttributes::empty(),
        Some((0, 0)),
        &payload,
        &[],
    ));

    let mut device = lis_device(image, false);
    let index = index_of(&mut device);

    let dfsr_info = index.explicits()[0].clone();
    let rec = device.read_record(&dfsr_info).unwrap();
    let dfsr = parse_dfsr(&rec).unwrap();
    let fmt = dfs_fmtstr(&dfsr).unwrap();

    let fdata = read_fdata(&fmt, &mut device, &index, &dfsr_info).unwrap();
    assert_eq!(fdata.frames, 4);
    assert_eq!(fdata.itemsize, 6);
    assert_eq!(fdata.data.len(), 24);

    let expected = [(1.0f32, 1i16), (2.5, -2), (3.0, 3), (0.5, 4)];
    for (i, (value, count)) in expected.iter().enumerate() {
        let row = fdata.row(i);
        let v = f32::from_ne_bytes(row[0..4].try_into().unwrap());
        let c = i16::from_ne_bytes(row[4..6].try_into().unwrap());
        assert_eq!(v, *value, "frame {}", i);
        assert_eq!(c, *count, "frame {}", i);
    }
}

#[test]
fn read_fdata_detects_format_overrun() {
    init();

    let mut image = physical_record(
        PrAttributes::empty(),
        Some((64, 0)),
        &dfsr_body(&[("GR  ", 4, 68), ("SP  ", 2, 79)]),
        &[],
    );

    // 7 payload bytes cannot hold an integral number of 6-byte frames
    let mut payload = frame(1.0, 1);
    payload.push(0xFF);
    image.extend_from_slice(&physical_record(
        PrAttributes::empty(),
        Some((0, 0)),
        &payload,
        &[],
    ));

    let mut device = lis_device(image, false);
    let index = index_of(&mut device);

    let dfsr_info = index.explicits()[0].clone();
    let rec = device.read_record(&dfsr_info).unwrap();
    let fmt = dfs_fmtstr(&parse_dfsr(&rec).unwrap()).unwrap();

    match read_fdata(&fmt, &mut device, &index, &dfsr_info) {
        Err(WellLogError::Parse(msg)) => assert!(msg.contains("past end")),
        other => panic!("expected Parse, got {:?}", other.err()),
    }
}

#[test]
fn implicits_belong_to_the_preceding_format_spec() {
    init();

    let dfsr = |mnemonic| {
        physical_record(
            PrAttributes::empty(),
            Some((64, 0)),
            &dfsr_body(&[(mnemonic, 2, 79)]),
            &[],
        )
    };
    let data = |payload: &[u8]| physical_record(PrAttributes::empty(), Some((0, 0)), payload, &[]);

    let mut image = Vec::new();
    image.extend_from_slice(&dfsr("AAA "));
    let first_dfsr = 0u64;
    image.extend_from_slice(&data(&[0, 1]));
    image.extend_from_slice(&data(&[0, 2]));
    let second_dfsr = image.len() as u64;
    image.extend_from_slice(&dfsr("BBB "));
    image.extend_from_slice(&data(&[0, 3]));

    let mut device = lis_device(image, false);
    let index = index_of(&mut device);

    assert_eq!(index.explicits().len(), 2);
    assert_eq!(index.implicits().len(), 3);

    let first = index.implicits_of(first_dfsr).unwrap();
    assert_eq!(first.len(), 2);

    let second = index.implicits_of(second_dfsr).unwrap();
    assert_eq!(second.len(), 1);

    assert!(index.implicits_of(999).is_err());
}
