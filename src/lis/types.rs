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

    src/lis/types.rs

    LIS-79 types: representation codes, the logical record type catalogue,
    entry-block types, and the value sum decoded from entry blocks.
*/

use strum::FromRepr;

/// LIS-79 representation codes. Discriminants are the on-disk values.
#[repr(u8)]
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, FromRepr)]
pub enum LisReprc {
    /// 8-bit two's complement integer
    I8 = 56,
    /// 16-bit two's complement integer
    I16 = 79,
    /// 32-bit two's complement integer
    I32 = 73,
    /// 16-bit floating point
    F16 = 49,
    /// 32-bit floating point
    F32 = 68,
    /// 32-bit low resolution floating point
    F32Low = 50,
    /// 32-bit fixed point, binary point in the middle
    F32Fix = 70,
    /// Alphanumeric, externally sized
    String = 65,
    /// Byte format
    Byte = 66,
    /// Variable-length bitmask, externally sized
    Mask = 77,
}

impl LisReprc {
    /// On-disk size of one value, or `None` for the externally-sized
    /// string and mask codes.
    pub const fn fixed_size(self) -> Option<usize> {
        match self {
            LisReprc::I8 => Some(1),
            LisReprc::I16 => Some(2),
            LisReprc::I32 => Some(4),
            LisReprc::F16 => Some(2),
            LisReprc::F32 => Some(4),
            LisReprc::F32Low => Some(4),
            LisReprc::F32Fix => Some(4),
            LisReprc::Byte => Some(1),
            LisReprc::String | LisReprc::Mask => None,
        }
    }
}

/// A decoded LIS value, tagged by its representation code.
#[derive(Clone, Debug, PartialEq)]
pub enum LisValue {
    I8(i8),
    I16(i16),
    I32(i32),
    F16(f32),
    F32(f32),
    F32Low(f32),
    F32Fix(f32),
    String(String),
    Byte(u8),
    Mask(Vec<u8>),
}

impl LisValue {
    /// The value as an integer, when it has an integral representation.
    pub fn as_i32(&self) -> Option<i32> {
        match self {
            LisValue::I8(v) => Some(*v as i32),
            LisValue::I16(v) => Some(*v as i32),
            LisValue::I32(v) => Some(*v),
            LisValue::Byte(v) => Some(*v as i32),
            _ => None,
        }
    }
}

/// The logical record types of LIS-79. A header whose type byte is not in
/// this catalogue is treated as evidence of a corrupted or misaligned
/// file.
#[repr(u8)]
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, FromRepr)]
pub enum RecordType {
    NormalData = 0,
    AlternateData = 1,
    JobIdentification = 32,
    WellsiteData = 34,
    ToolStringInfo = 39,
    EncryptedTableDump = 42,
    TableDump = 47,
    DataFormatSpec = 64,
    DataDescriptor = 65,
    Tu10SoftwareBoot = 95,
    BootstrapLoader = 96,
    CpKernelLoader = 97,
    ProgramFileHeader = 100,
    ProgramOverlayHeader = 101,
    ProgramOverlayLoad = 102,
    Picture = 85,
    Image = 86,
    FileHeader = 128,
    FileTrailer = 129,
    TapeHeader = 130,
    TapeTrailer = 131,
    ReelHeader = 132,
    ReelTrailer = 133,
    LogicalEof = 137,
    LogicalBot = 138,
    LogicalEot = 139,
    LogicalEom = 141,
    OperatorCommandInputs = 224,
    OperatorResponseInputs = 225,
    SystemOutputs = 227,
    FlicComment = 232,
    BlankRecord = 234,
}

/// Entry-block types in a data format specification record. Entry 0
/// terminates the entry list; entry 2 declares the spec-block subtype.
#[repr(u8)]
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, FromRepr)]
pub enum EntryType {
    Terminator = 0,
    DataRecordType = 1,
    SpecBlockSubtype = 2,
    FrameSize = 3,
    UpDownFlag = 4,
    DepthScaleUnits = 5,
    ReferencePoint = 6,
    ReferencePointUnits = 7,
    FrameSpacing = 8,
    FrameSpacingUnits = 9,
    Undefined = 10,
    MaxFramesPerRecord = 11,
    AbsentValue = 12,
    DepthRecordingMode = 13,
    DepthUnits = 14,
    DepthReprc = 15,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reprc_discriminants_are_on_disk_codes() {
        assert_eq!(LisReprc::from_repr(56), Some(LisReprc::I8));
        assert_eq!(LisReprc::from_repr(49), Some(LisReprc::F16));
        assert_eq!(LisReprc::from_repr(68), Some(LisReprc::F32));
        assert_eq!(LisReprc::from_repr(77), Some(LisReprc::Mask));
        assert_eq!(LisReprc::from_repr(57), None);
    }

    #[test]
    fn record_types_cover_data_and_format_spec() {
        assert_eq!(RecordType::from_repr(0), Some(RecordType::NormalData));
        assert_eq!(RecordType::from_repr(1), Some(RecordType::AlternateData));
        assert_eq!(RecordType::from_repr(64), Some(RecordType::DataFormatSpec));
        assert_eq!(RecordType::from_repr(2), None);
        assert_eq!(RecordType::from_repr(255), None);
    }
}
