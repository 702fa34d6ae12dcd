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

    src/dlis/types.rs

    The RP66 type system: representation codes, the strong typedefs that
    distinguish semantically different values sharing an underlying
    representation (origin vs. uvari, ident vs. units), and the tagged
    value-vector sum that attribute values decode into.
*/

use std::fmt::{self, Display, Formatter};

use strum::FromRepr;

use crate::WellLogError;

/// The representation codes of RP66 Appendix B. The numeric discriminants
/// are the on-disk code values.
#[repr(u8)]
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash, FromRepr)]
pub enum RepresentationCode {
    /// Low precision floating point
    FShort = 1,
    /// IEEE single precision floating point
    FSingl = 2,
    /// Validated single precision floating point
    FSing1 = 3,
    /// Two-way validated single precision floating point
    FSing2 = 4,
    /// IBM single precision floating point
    ISingl = 5,
    /// VAX single precision floating point
    VSingl = 6,
    /// IEEE double precision floating point
    FDoubl = 7,
    /// Validated double precision floating point
    FDoub1 = 8,
    /// Two-way validated double precision floating point
    FDoub2 = 9,
    /// Single precision complex
    CSingl = 10,
    /// Double precision complex
    CDoubl = 11,
    /// Short signed integer
    SShort = 12,
    /// Normal signed integer
    SNorm = 13,
    /// Long signed integer
    SLong = 14,
    /// Short unsigned integer
    UShort = 15,
    /// Normal unsigned integer
    UNorm = 16,
    /// Long unsigned integer
    ULong = 17,
    /// Variable-length unsigned integer
    UVari = 18,
    /// Variable-length identifier
    #[default]
    Ident = 19,
    /// Variable-length ASCII character string
    Ascii = 20,
    /// Date and time
    Dtime = 21,
    /// Origin reference
    Origin = 22,
    /// Object name
    ObName = 23,
    /// Object reference
    ObjRef = 24,
    /// Attribute reference
    AttRef = 25,
    /// Boolean status
    Status = 26,
    /// Units expression
    Units = 27,
    /// Undefined value
    Undef = 66,
}

impl RepresentationCode {
    /// Interpret an on-disk code byte. Values outside the defined range
    /// map to [`RepresentationCode::Undef`].
    pub fn from_byte(value: u8) -> RepresentationCode {
        match value {
            1..=27 => RepresentationCode::from_repr(value).unwrap_or(RepresentationCode::Undef),
            _ => RepresentationCode::Undef,
        }
    }

    /// The on-disk size of one value of this code, or `None` for
    /// variable-length codes (and for [`RepresentationCode::Undef`]).
    pub const fn fixed_size(self) -> Option<usize> {
        use RepresentationCode::*;
        match self {
            FShort => Some(2),
            FSingl => Some(4),
            FSing1 => Some(8),
            FSing2 => Some(12),
            ISingl => Some(4),
            VSingl => Some(4),
            FDoubl => Some(8),
            FDoub1 => Some(16),
            FDoub2 => Some(24),
            CSingl => Some(8),
            CDoubl => Some(16),
            SShort => Some(1),
            SNorm => Some(2),
            SLong => Some(4),
            UShort => Some(1),
            UNorm => Some(2),
            ULong => Some(4),
            Dtime => Some(8),
            Status => Some(1),
            UVari | Ident | Ascii | Origin | ObName | ObjRef | AttRef | Units | Undef => None,
        }
    }
}

/// Timezone values carried in the high nibble of a dtime's second byte.
pub const TZ_LOCAL_STANDARD: u8 = 0;
pub const TZ_LOCAL_DST: u8 = 1;
pub const TZ_GMT: u8 = 2;

/// Years in a dtime are stored as an offset from 1900.
pub const YEAR_ZERO: i32 = 1900;

/// A variable-length identifier string, at most 255 bytes on disk.
#[derive(Clone, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Ident(pub String);

impl Display for Ident {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for Ident {
    fn from(s: &str) -> Ident {
        Ident(s.to_string())
    }
}

/// A units expression. Shares the on-disk shape of [`Ident`] but is a
/// distinct type so codec dispatch stays unambiguous.
#[derive(Clone, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Units(pub String);

impl Display for Units {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for Units {
    fn from(s: &str) -> Units {
        Units(s.to_string())
    }
}

/// An origin reference. On disk this is a uvari, but it names the logical
/// file a piece of data originated from rather than a plain count.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Origin(pub i32);

impl Display for Origin {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A date-time value. The year is absolute (already offset from 1900).
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash)]
pub struct Dtime {
    pub year: i32,
    pub tz: u8,
    pub month: u8,
    pub day: u8,
    pub hour: u8,
    pub minute: u8,
    pub second: u8,
    pub millisecond: u16,
}

/// An object name: the triple that identifies an object within a logical
/// file.
#[derive(Clone, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ObName {
    pub origin: Origin,
    pub copy: u8,
    pub id: Ident,
}

impl ObName {
    pub fn new(origin: i32, copy: u8, id: impl Into<String>) -> ObName {
        ObName {
            origin: Origin(origin),
            copy,
            id: Ident(id.into()),
        }
    }

    /// A stable printable key for this name under the given object type.
    pub fn fingerprint(&self, object_type: &str) -> Result<Ident, WellLogError> {
        object_fingerprint(object_type, self)
    }
}

impl Display for ObName {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        write!(f, "({}, {}, {})", self.origin, self.copy, self.id)
    }
}

/// A reference to an object in another object set: its set type plus name.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash)]
pub struct ObjRef {
    pub kind: Ident,
    pub name: ObName,
}

impl ObjRef {
    pub fn fingerprint(&self) -> Result<Ident, WellLogError> {
        self.name.fingerprint(&self.kind.0)
    }
}

/// A reference to a single attribute of an object in another object set.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash)]
pub struct AttRef {
    pub kind: Ident,
    pub name: ObName,
    pub label: Ident,
}

fn escape_segment(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for &b in s.as_bytes() {
        match b {
            b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'-' | b'.' | b'_' | b'~' => out.push(b as char),
            _ => out.push_str(&format!("%{:02X}", b)),
        }
    }
    out
}

/// Derive the stable printable fingerprint for an object name + type. The
/// type and identifier segments are URL-escaped so the result is printable
/// and unambiguous regardless of the bytes in the source strings.
pub fn object_fingerprint(object_type: &str, name: &ObName) -> Result<Ident, WellLogError> {
    if object_type.is_empty() {
        return Err(WellLogError::InvalidArgument(
            "object fingerprint requires a non-empty type".to_string(),
        ));
    }

    Ok(Ident(format!(
        "{}-{}.{}.{}",
        escape_segment(object_type),
        name.copy,
        name.origin.0,
        escape_segment(&name.id.0),
    )))
}

macro_rules! each_vector {
    ($value:expr, $vec:ident => $body:expr, absent => $absent:expr) => {
        match $value {
            ValueVector::Absent => $absent,
            ValueVector::FShort($vec) => $body,
            ValueVector::FSingl($vec) => $body,
            ValueVector::FSing1($vec) => $body,
            ValueVector::FSing2($vec) => $body,
            ValueVector::ISingl($vec) => $body,
            ValueVector::VSingl($vec) => $body,
            ValueVector::FDoubl($vec) => $body,
            ValueVector::FDoub1($vec) => $body,
            ValueVector::FDoub2($vec) => $body,
            ValueVector::CSingl($vec) => $body,
            ValueVector::CDoubl($vec) => $body,
            ValueVector::SShort($vec) => $body,
            ValueVector::SNorm($vec) => $body,
            ValueVector::SLong($vec) => $body,
            ValueVector::UShort($vec) => $body,
            ValueVector::UNorm($vec) => $body,
            ValueVector::ULong($vec) => $body,
            ValueVector::UVari($vec) => $body,
            ValueVector::Ident($vec) => $body,
            ValueVector::Ascii($vec) => $body,
            ValueVector::Dtime($vec) => $body,
            ValueVector::Origin($vec) => $body,
            ValueVector::ObName($vec) => $body,
            ValueVector::ObjRef($vec) => $body,
            ValueVector::AttRef($vec) => $body,
            ValueVector::Status($vec) => $body,
            ValueVector::Units($vec) => $body,
        }
    };
}

/// The value of an attribute: a homogeneous vector tagged by its
/// representation code, or [`ValueVector::Absent`] when the value has been
/// explicitly unset. Absent is distinct from a template default that was
/// simply never overridden.
#[derive(Clone, Debug, Default, PartialEq)]
pub enum ValueVector {
    #[default]
    Absent,
    FShort(Vec<f32>),
    FSingl(Vec<f32>),
    FSing1(Vec<(f32, f32)>),
    FSing2(Vec<(f32, f32, f32)>),
    ISingl(Vec<f32>),
    VSingl(Vec<f32>),
    FDoubl(Vec<f64>),
    FDoub1(Vec<(f64, f64)>),
    FDoub2(Vec<(f64, f64, f64)>),
    CSingl(Vec<(f32, f32)>),
    CDoubl(Vec<(f64, f64)>),
    SShort(Vec<i8>),
    SNorm(Vec<i16>),
    SLong(Vec<i32>),
    UShort(Vec<u8>),
    UNorm(Vec<u16>),
    ULong(Vec<u32>),
    UVari(Vec<i32>),
    Ident(Vec<Ident>),
    Ascii(Vec<String>),
    Dtime(Vec<Dtime>),
    Origin(Vec<Origin>),
    ObName(Vec<ObName>),
    ObjRef(Vec<ObjRef>),
    AttRef(Vec<AttRef>),
    Status(Vec<bool>),
    Units(Vec<Units>),
}

impl ValueVector {
    pub fn is_absent(&self) -> bool {
        matches!(self, ValueVector::Absent)
    }

    /// The number of elements, with Absent counting as zero.
    pub fn len(&self) -> usize {
        each_vector!(self, v => v.len(), absent => 0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn truncate(&mut self, n: usize) {
        each_vector!(self, v => v.truncate(n), absent => ())
    }

    /// A vector of `count` default-initialized elements of the given code,
    /// or `None` when the code has no value interpretation.
    pub fn defaulted(reprc: RepresentationCode, count: usize) -> Option<ValueVector> {
        use RepresentationCode as Rc;
        let value = match reprc {
            Rc::FShort => ValueVector::FShort(vec![0.0; count]),
            Rc::FSingl => ValueVector::FSingl(vec![0.0; count]),
            Rc::FSing1 => ValueVector::FSing1(vec![(0.0, 0.0); count]),
            Rc::FSing2 => ValueVector::FSing2(vec![(0.0, 0.0, 0.0); count]),
            Rc::ISingl => ValueVector::ISingl(vec![0.0; count]),
            Rc::VSingl => ValueVector::VSingl(vec![0.0; count]),
            Rc::FDoubl => ValueVector::FDoubl(vec![0.0; count]),
            Rc::FDoub1 => ValueVector::FDoub1(vec![(0.0, 0.0); count]),
            Rc::FDoub2 => ValueVector::FDoub2(vec![(0.0, 0.0, 0.0); count]),
            Rc::CSingl => ValueVector::CSingl(vec![(0.0, 0.0); count]),
            Rc::CDoubl => ValueVector::CDoubl(vec![(0.0, 0.0); count]),
            Rc::SShort => ValueVector::SShort(vec![0; count]),
            Rc::SNorm => ValueVector::SNorm(vec![0; count]),
            Rc::SLong => ValueVector::SLong(vec![0; count]),
            Rc::UShort => ValueVector::UShort(vec![0; count]),
            Rc::UNorm => ValueVector::UNorm(vec![0; count]),
            Rc::ULong => ValueVector::ULong(vec![0; count]),
            Rc::UVari => ValueVector::UVari(vec![0; count]),
            Rc::Ident => ValueVector::Ident(vec![Ident::default(); count]),
            Rc::Ascii => ValueVector::Ascii(vec![String::new(); count]),
            Rc::Dtime => ValueVector::Dtime(vec![Dtime::default(); count]),
            Rc::Origin => ValueVector::Origin(vec![Origin::default(); count]),
            Rc::ObName => ValueVector::ObName(vec![ObName::default(); count]),
            Rc::ObjRef => ValueVector::ObjRef(vec![ObjRef::default(); count]),
            Rc::AttRef => ValueVector::AttRef(vec![AttRef::default(); count]),
            Rc::Status => ValueVector::Status(vec![false; count]),
            Rc::Units => ValueVector::Units(vec![Units::default(); count]),
            Rc::Undef => return None,
        };
        Some(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reprc_from_byte_maps_out_of_range_to_undef() {
        assert_eq!(RepresentationCode::from_byte(0), RepresentationCode::Undef);
        assert_eq!(RepresentationCode::from_byte(1), RepresentationCode::FShort);
        assert_eq!(RepresentationCode::from_byte(27), RepresentationCode::Units);
        assert_eq!(RepresentationCode::from_byte(28), RepresentationCode::Undef);
        assert_eq!(RepresentationCode::from_byte(66), RepresentationCode::Undef);
    }

    #[test]
    fn fixed_sizes_match_on_disk_layouts() {
        assert_eq!(RepresentationCode::FShort.fixed_size(), Some(2));
        assert_eq!(RepresentationCode::FDoub2.fixed_size(), Some(24));
        assert_eq!(RepresentationCode::Dtime.fixed_size(), Some(8));
        assert_eq!(RepresentationCode::UVari.fixed_size(), None);
        assert_eq!(RepresentationCode::Ident.fixed_size(), None);
    }

    #[test]
    fn fingerprint_escapes_type_and_id() {
        let name = ObName::new(2, 0, "800T");
        let fp = name.fingerprint("FRAME").unwrap();
        assert_eq!(fp.0, "FRAME-0.2.800T");

        let odd = ObName::new(1, 3, "A B");
        let fp = odd.fingerprint("CHANNEL").unwrap();
        assert_eq!(fp.0, "CHANNEL-3.1.A%20B");
    }

    #[test]
    fn fingerprint_rejects_empty_type() {
        let name = ObName::new(0, 0, "X");
        assert!(name.fingerprint("").is_err());
    }

    #[test]
    fn defaulted_vectors_have_requested_length() {
        let v = ValueVector::defaulted(RepresentationCode::FSingl, 3).unwrap();
        assert_eq!(v.len(), 3);
        let v = ValueVector::defaulted(RepresentationCode::ObName, 2).unwrap();
        assert_eq!(v.len(), 2);
        assert!(ValueVector::defaulted(RepresentationCode::Undef, 1).is_none());
    }

    #[test]
    fn absent_is_distinct_from_empty() {
        let absent = ValueVector::Absent;
        let empty = ValueVector::UShort(Vec::new());
        assert_ne!(absent, empty);
        assert_eq!(absent.len(), 0);
        assert_eq!(empty.len(), 0);
    }
}
