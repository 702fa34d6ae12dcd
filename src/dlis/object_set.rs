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

    src/dlis/object_set.rs

    The RP66 object-set model carried by explicitly formatted logical
    records. A record body is a stream of components: a set descriptor,
    a template of attribute components, then objects, each overlaying the
    template with per-object attribute overrides. Parsing is forgiving:
    diagnostics accumulate on attributes, objects and the set, and only
    structural failures interrupt a parse.
*/

use super::{
    codecs,
    records::Record,
    types::{Ident, ObName, RepresentationCode, Units, ValueVector},
};
use crate::{
    errors::{max_severity, report, ParseIssue, Severity},
    WellLogError,
};

/// The role carried in the top three bits of a component descriptor.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum ComponentRole {
    AbsentAttribute,
    Attribute,
    InvariantAttribute,
    Object,
    Reserved,
    RedundantSet,
    ReplacementSet,
    Set,
}

impl ComponentRole {
    pub fn from_descriptor(descriptor: u8) -> ComponentRole {
        match descriptor >> 5 {
            0 => ComponentRole::AbsentAttribute,
            1 => ComponentRole::Attribute,
            2 => ComponentRole::InvariantAttribute,
            3 => ComponentRole::Object,
            4 => ComponentRole::Reserved,
            5 => ComponentRole::RedundantSet,
            6 => ComponentRole::ReplacementSet,
            _ => ComponentRole::Set,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            ComponentRole::AbsentAttribute => "ABSATR",
            ComponentRole::Attribute => "ATTRIB",
            ComponentRole::InvariantAttribute => "INVATR",
            ComponentRole::Object => "OBJECT",
            ComponentRole::Reserved => "reserved",
            ComponentRole::RedundantSet => "RDSET",
            ComponentRole::ReplacementSet => "RSET",
            ComponentRole::Set => "SET",
        }
    }
}

struct SetDescriptor {
    role: ComponentRole,
    has_type: bool,
    has_name: bool,
}

fn parse_set_descriptor(descriptor: u8) -> Result<SetDescriptor, WellLogError> {
    let role = ComponentRole::from_descriptor(descriptor);
    match role {
        ComponentRole::Set | ComponentRole::ReplacementSet | ComponentRole::RedundantSet => {}
        other => {
            return Err(WellLogError::Parse(format!(
                "error parsing object set descriptor: expected SET, RSET or RDSET, was {} ({:08b})",
                other.name(),
                descriptor
            )));
        }
    }

    Ok(SetDescriptor {
        role,
        has_type: descriptor & 0x10 != 0,
        has_name: descriptor & 0x08 != 0,
    })
}

/// Presence flags of an attribute component. The field flags are only
/// meaningful when neither `object` nor `absent` is set.
#[derive(Default)]
struct AttributeDescriptor {
    label: bool,
    count: bool,
    reprc: bool,
    units: bool,
    value: bool,
    object: bool,
    absent: bool,
    invariant: bool,
}

fn parse_attribute_descriptor(descriptor: u8) -> Result<AttributeDescriptor, WellLogError> {
    let mut flags = AttributeDescriptor::default();

    let role = ComponentRole::from_descriptor(descriptor);
    match role {
        ComponentRole::AbsentAttribute => {
            flags.absent = true;
            return Ok(flags);
        }
        ComponentRole::Object => {
            flags.object = true;
            return Ok(flags);
        }
        ComponentRole::InvariantAttribute => flags.invariant = true,
        ComponentRole::Attribute => {}
        other => {
            return Err(WellLogError::Parse(format!(
                "error parsing attribute descriptor: expected ATTRIB, INVATR, ABSATR or OBJECT, \
                 was {} ({:08b})",
                other.name(),
                descriptor
            )));
        }
    }

    flags.label = descriptor & 0x10 != 0;
    flags.count = descriptor & 0x08 != 0;
    flags.reprc = descriptor & 0x04 != 0;
    flags.units = descriptor & 0x02 != 0;
    flags.value = descriptor & 0x01 != 0;

    Ok(flags)
}

struct ObjectDescriptor {
    has_name: bool,
}

fn parse_object_descriptor(descriptor: u8) -> Result<ObjectDescriptor, WellLogError> {
    let role = ComponentRole::from_descriptor(descriptor);
    if role != ComponentRole::Object {
        return Err(WellLogError::Parse(format!(
            "error parsing object descriptor: expected OBJECT, was {} ({:08b})",
            role.name(),
            descriptor
        )));
    }

    Ok(ObjectDescriptor {
        has_name: descriptor & 0x10 != 0,
    })
}

/// One attribute of an object or template: a label, an element count, the
/// representation code of the value, its units, and the value itself.
#[derive(Clone, Debug)]
pub struct Attribute {
    pub label: Ident,
    pub count: i32,
    pub reprc: RepresentationCode,
    pub units: Units,
    pub value: ValueVector,
    /// Carried forward from the template; invariant attributes are fixed
    /// for every object in the set.
    pub invariant: bool,
    pub issues: Vec<ParseIssue>,
}

impl Default for Attribute {
    fn default() -> Attribute {
        Attribute {
            label: Ident::default(),
            count: 1,
            reprc: RepresentationCode::Ident,
            units: Units::default(),
            value: ValueVector::Absent,
            invariant: false,
            issues: Vec::new(),
        }
    }
}

impl PartialEq for Attribute {
    fn eq(&self, other: &Attribute) -> bool {
        // invariant and accumulated issues don't participate in equality
        self.label == other.label
            && self.count == other.count
            && self.reprc == other.reprc
            && self.units == other.units
            && self.value == other.value
    }
}

/// A parsed object: one per-name copy of the template overlaid with the
/// object's own attribute components.
#[derive(Clone, Debug, Default)]
pub struct Object {
    pub kind: Ident,
    pub name: ObName,
    pub attributes: Vec<Attribute>,
    pub issues: Vec<ParseIssue>,
}

impl Object {
    /// Insert-or-update an attribute by label.
    pub fn set(&mut self, attr: Attribute) {
        match self.attributes.iter_mut().find(|x| x.label == attr.label) {
            Some(slot) => *slot = attr,
            None => self.attributes.push(attr),
        }
    }

    pub fn remove(&mut self, label: &Ident) {
        self.attributes.retain(|x| &x.label != label);
    }

    /// Linear lookup by label. Objects carry a handful of attributes, so
    /// no index is kept.
    pub fn at(&self, label: &str) -> Option<&Attribute> {
        self.attributes.iter().find(|x| x.label.0 == label)
    }

    pub fn len(&self) -> usize {
        self.attributes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.attributes.is_empty()
    }
}

impl PartialEq for Object {
    fn eq(&self, other: &Object) -> bool {
        self.name == other.name && self.attributes == other.attributes
    }
}

fn read_reprc<'a>(xs: &'a [u8], attr: &mut Attribute) -> Result<&'a [u8], WellLogError> {
    let (code, rest) = codecs::ushort(xs)?;

    if !(1..=27).contains(&code) {
        attr.issues.push(ParseIssue::new(
            Severity::Info,
            format!("Invalid representation code {}", code),
            "Appendix B: Representation Codes",
            "Continue. Postpone dealing with this until later",
        ));
        attr.reprc = RepresentationCode::Undef;
    } else {
        attr.reprc = RepresentationCode::from_byte(code);
    }
    Ok(rest)
}

fn elements<'a>(
    reprc: RepresentationCode,
    count: i32,
    xs: &'a [u8],
) -> Result<(ValueVector, &'a [u8]), WellLogError> {
    if count <= 0 {
        return Ok((ValueVector::Absent, xs));
    }
    codecs::decode_values(reprc, count as usize, xs)
}

/// Reconcile an object attribute that redefines its count without giving a
/// value. Shrinking the inherited default is tolerated; growing it is not,
/// and an absent default is replaced by a default-initialized vector of
/// the declared code.
fn patch_missing_value(attr: &mut Attribute) {
    let count = attr.count.max(0) as usize;

    if !attr.value.is_absent() {
        let size = attr.value.len();
        if size == count {
            return;
        }

        if size > count {
            attr.value.truncate(count);
            attr.issues.push(ParseIssue::new(
                Severity::Warning,
                format!(
                    "Default value is not overridden, but new count is. count (which is {}) < \
                     original count (which is {})",
                    count, size
                ),
                "3.2.2.1 Component Descriptor: The number of Elements that make up the Value is \
                 specified by the Count Characteristic.",
                "shrank default value to new count",
            ));
            return;
        }

        attr.issues.push(ParseIssue::new(
            Severity::Error,
            format!(
                "Default value is not overridden, but new count is. count (which is {}) > \
                 original count (which is {})",
                count, size
            ),
            "3.2.2.1 Component Descriptor: The number of Elements that make up the Value is \
             specified by the Count Characteristic.",
            "values is left as default. Continue processing",
        ));
        return;
    }

    match ValueVector::defaulted(attr.reprc, count) {
        Some(value) => attr.value = value,
        None => {
            attr.issues.push(ParseIssue::new(
                Severity::Error,
                "value is declared, but representation code is unknown, hence unable to interpret",
                "Appendix B: Representation Codes",
                "attribute value is left as default. Continue processing",
            ));
        }
    }
}

fn parse_set_component<'a>(
    data: &'a [u8],
    issues: &mut Vec<ParseIssue>,
) -> Result<(ComponentRole, Ident, Ident, &'a [u8]), WellLogError> {
    if data.is_empty() {
        return Err(WellLogError::Parse("eflr must be non-empty".to_string()));
    }

    let flags = parse_set_descriptor(data[0])?;
    let mut xs = &data[1..];

    if xs.is_empty() {
        return Err(WellLogError::Parse(
            "unexpected end-of-record after SET descriptor".to_string(),
        ));
    }

    match flags.role {
        ComponentRole::RedundantSet => {
            issues.push(ParseIssue::new(
                Severity::Info,
                "Redundant sets are not supported",
                "3.2.2.2 Component Usage: A Redundant Set is an identical copy of some Set \
                 written previously in the same Logical File",
                "Set will be processed as a usual one, which might lead to issues with \
                 duplicated objects",
            ));
        }
        ComponentRole::ReplacementSet => {
            issues.push(ParseIssue::new(
                Severity::Warning,
                "Replacement sets are not supported",
                "3.2.2.2 Component Usage: Attributes of the Replacement Set reflect all updates \
                 that may have been applied since the original Set was written",
                "Set will be processed as a usual one, which might lead to issues with \
                 duplicated objects and invalid information",
            ));
        }
        _ => {}
    }

    if !flags.has_type {
        issues.push(ParseIssue::new(
            Severity::Warning,
            "SET:type not set",
            "3.2.2.1 Component Descriptor: A Set's Type Characteristic must be non-null and \
             must always be explicitly present in the Set Component",
            "Assumed descriptor corrupted, attempt to read type anyway",
        ));
    }

    let (kind, rest) = codecs::ident(xs)?;
    xs = rest;

    let mut name = Ident::default();
    if flags.has_name {
        let (n, rest) = codecs::ident(xs)?;
        name = n;
        xs = rest;
    }

    Ok((flags.role, kind, name, xs))
}

/// Parse template attributes up to the first OBJECT descriptor. Present
/// fields are read in fixed order: label, count, representation code,
/// units, value.
fn parse_template<'a>(
    mut xs: &'a [u8],
    template: &mut Vec<Attribute>,
    issues: &mut Vec<ParseIssue>,
) -> Result<&'a [u8], WellLogError> {
    loop {
        if xs.is_empty() {
            return Err(WellLogError::Parse(
                "unexpected end-of-record in template".to_string(),
            ));
        }

        let flags = parse_attribute_descriptor(xs[0])?;
        if flags.object {
            return Ok(xs);
        }

        xs = &xs[1..];

        if flags.absent {
            issues.push(ParseIssue::new(
                Severity::Warning,
                "Absent Attribute in object template",
                "3.2.2.2 Component Usage: A Template consists of a collection of Attribute \
                 Components and/or Invariant Attribute Components, mixed in any fashion.",
                "Skipped",
            ));
            continue;
        }

        let mut attr = Attribute::default();

        if !flags.label {
            issues.push(ParseIssue::new(
                Severity::Warning,
                "Label not set in template",
                "3.2.2.2 Component Usage: All Components in the Template must have distinct, \
                 non-null Labels.",
                "Assumed descriptor corrupted, attempt to read label anyway",
            ));
        }

        let (label, rest) = codecs::ident(xs)?;
        attr.label = label;
        xs = rest;

        if flags.count {
            let (count, rest) = codecs::uvari(xs)?;
            attr.count = count;
            xs = rest;
        }
        if flags.reprc {
            xs = read_reprc(xs, &mut attr)?;
        }
        if flags.units {
            let (units, rest) = codecs::units(xs)?;
            attr.units = units;
            xs = rest;
        }
        if flags.value {
            let (value, rest) = elements(attr.reprc, attr.count, xs)?;
            attr.value = value;
            xs = rest;
        }
        attr.invariant = flags.invariant;

        template.push(attr);

        if xs.is_empty() {
            issues.push(ParseIssue::new(
                Severity::Debug,
                "Set contains no objects",
                "3.2.2.2 Component Usage: A Set consists of one or more Objects",
                "",
            ));
            return Ok(xs);
        }
    }
}

/// Parse objects to the end of the record. Each object starts from a copy
/// of the template defaults; its attribute components override slots in
/// template order. An absent-role component unsets the slot entirely.
fn parse_objects(
    mut xs: &[u8],
    template: &[Attribute],
    set_kind: &Ident,
    objects: &mut Vec<Object>,
) -> Result<(), WellLogError> {
    let mut default_object = Object::default();
    for attr in template {
        default_object.set(attr.clone());
    }

    while !xs.is_empty() {
        let object_flags = parse_object_descriptor(xs[0])?;
        xs = &xs[1..];

        let mut current = default_object.clone();
        current.kind = set_kind.clone();

        if !object_flags.has_name {
            current.issues.push(ParseIssue::new(
                Severity::Warning,
                "OBJECT:name was not set",
                "3.2.2.1 Component Descriptor: That is, every Object has a non-null Name",
                "Assumed descriptor corrupted, attempt to read name anyway",
            ));
        }

        let (name, rest) = codecs::obname(xs)?;
        current.name = name;
        xs = rest;

        for template_attr in template {
            if template_attr.invariant {
                continue;
            }
            if xs.is_empty() {
                break;
            }

            let flags = parse_attribute_descriptor(xs[0])?;
            if flags.object {
                // the next object starts here; leave the descriptor for
                // the outer loop
                break;
            }
            xs = &xs[1..];

            let mut attr = template_attr.clone();

            // absent means no meaning, so unset whatever the template had
            if flags.absent {
                current.remove(&attr.label);
                continue;
            }

            if flags.invariant {
                attr.issues.push(ParseIssue::new(
                    Severity::Warning,
                    "Invariant attribute in object attributes",
                    "3.2.2.2 Component Usage: Invariant Attribute Components, which may only \
                     appear in the Template [...]",
                    "ignored invariant bit, assumed that attribute followed",
                ));
            }

            if flags.label {
                attr.issues.push(ParseIssue::new(
                    Severity::Warning,
                    "Label bit set in object attribute",
                    "3.2.2.2 Component Usage: Attribute Components that follow Object Components \
                     must not have Attribute Labels",
                    "ignored label bit, assumed that label never followed",
                ));
            }

            if flags.count {
                let (count, rest) = codecs::uvari(xs)?;
                attr.count = count;
                xs = rest;
            }
            if flags.reprc {
                xs = read_reprc(xs, &mut attr)?;
            }
            if flags.units {
                let (units, rest) = codecs::units(xs)?;
                attr.units = units;
                xs = rest;
            }
            if flags.value {
                let (value, rest) = elements(attr.reprc, attr.count, xs)?;
                attr.value = value;
                xs = rest;
            }

            if attr.count == 0 {
                // A zero count makes the value explicitly undefined, even
                // if a default exists.
                attr.value = ValueVector::Absent;
            } else if !flags.value {
                if flags.reprc && attr.reprc != template_attr.reprc {
                    attr.issues.push(ParseIssue::new(
                        Severity::Warning,
                        format!(
                            "count ({}) isn't 0 and representation code ({:?}) changed, but \
                             value is not explicitly set",
                            attr.count, attr.reprc
                        ),
                        "-",
                        "setting default value for new representation code",
                    ));
                    attr.value = ValueVector::Absent;
                }
                patch_missing_value(&mut attr);
            }

            current.set(attr);
        }

        let severity = current
            .attributes
            .iter()
            .map(|attr| max_severity(&attr.issues))
            .max()
            .unwrap_or(Severity::Debug)
            .decrease();

        if severity >= Severity::Info {
            current.issues.push(ParseIssue::new(
                severity,
                "Problems occurred on processing object. Be careful when trusting retrieved data",
                "",
                "",
            ));
        }

        objects.push(current);
    }

    Ok(())
}

/// A parsed set component stream: descriptor, template and objects. The
/// object list is parsed lazily on first access so that encrypted or
/// never-touched sets cost nothing beyond the framing pass.
#[derive(Debug)]
pub struct ObjectSet {
    pub kind: Ident,
    pub name: Ident,
    pub role: ComponentRole,
    pub template: Vec<Attribute>,
    pub issues: Vec<ParseIssue>,
    objects: Vec<Object>,
    record: Record,
    parsed: bool,
}

impl ObjectSet {
    /// Wrap a logical record as an object set. The set descriptor is
    /// parsed eagerly so the set can be typed and filtered without paying
    /// for its objects.
    pub fn new(record: Record) -> Result<ObjectSet, WellLogError> {
        let mut set = ObjectSet {
            kind: Ident::default(),
            name: Ident::default(),
            role: ComponentRole::Set,
            template: Vec::new(),
            issues: Vec::new(),
            objects: Vec::new(),
            record,
            parsed: false,
        };

        let mut issues = Vec::new();
        match parse_set_component(&set.record.data, &mut issues) {
            Ok((role, kind, name, _)) => {
                set.role = role;
                set.kind = kind;
                set.name = name;
                set.issues.append(&mut issues);
            }
            Err(e) => {
                let issue = ParseIssue::new(
                    Severity::Error,
                    e.to_string(),
                    "",
                    "parsing set components interrupted",
                );
                report(&[issue], "object set creation: error on parsing types")?;
            }
        }

        Ok(set)
    }

    fn parse_body(
        data: &[u8],
        template: &mut Vec<Attribute>,
        kind: &Ident,
        objects: &mut Vec<Object>,
        issues: &mut Vec<ParseIssue>,
    ) -> Result<(), WellLogError> {
        // the set component was already consumed at construction; re-read
        // it here only to find where the template starts
        let mut scratch = Vec::new();
        let (_, _, _, xs) = parse_set_component(data, &mut scratch)?;
        let xs = parse_template(xs, template, issues)?;
        parse_objects(xs, template, kind, objects)
    }

    pub fn parse(&mut self) -> Result<(), WellLogError> {
        if self.parsed {
            return Ok(());
        }

        let data = std::mem::take(&mut self.record.data);
        let result = Self::parse_body(
            &data,
            &mut self.template,
            &self.kind,
            &mut self.objects,
            &mut self.issues,
        );
        self.record.data = data;

        // Once here the set counts as parsed even when interrupted; the
        // diagnostics stay on the set either way.
        self.parsed = true;

        if let Err(e) = result {
            let issue = ParseIssue::new(Severity::Error, e.to_string(), "", "parse interrupted");
            self.issues.push(issue.clone());
            let context = format!(
                "object set {} of type {} parse: error on parsing",
                self.name, self.kind
            );
            report(&[issue], &context)?;
        }

        let severity = self
            .objects
            .iter()
            .map(|obj| max_severity(&obj.issues))
            .max()
            .unwrap_or(Severity::Debug)
            .decrease();

        if severity >= Severity::Info {
            self.issues.push(ParseIssue::new(
                severity,
                "Problems occurred on processing object set. Be careful when trusting retrieved \
                 data",
                "",
                "",
            ));
        }

        Ok(())
    }

    /// The objects of this set, parsing on first use. Accumulated set
    /// diagnostics are routed through the escape machinery every time the
    /// objects are handed out.
    pub fn objects(&mut self) -> Result<&[Object], WellLogError> {
        self.parse()?;
        if !self.issues.is_empty() {
            let context = format!("Message from object set {} of type {}", self.name, self.kind);
            report(&self.issues, &context)?;
        }
        Ok(&self.objects)
    }
}

/// All object sets recovered from one logical file.
#[derive(Debug, Default)]
pub struct ObjectPool {
    pub sets: Vec<ObjectSet>,
}

impl ObjectPool {
    pub fn new(sets: Vec<ObjectSet>) -> ObjectPool {
        ObjectPool { sets }
    }

    pub fn types(&self) -> Vec<Ident> {
        self.sets.iter().map(|set| set.kind.clone()).collect()
    }

    /// Every object of the given set type, optionally narrowed to a
    /// specific object name. With a name filter, the issues of each
    /// matched object are reported individually.
    pub fn get(&mut self, kind: &str, name: Option<&str>) -> Result<Vec<Object>, WellLogError> {
        let mut out = Vec::new();

        for set in &mut self.sets {
            if set.kind.0 != kind {
                continue;
            }

            for obj in set.objects()? {
                if let Some(wanted) = name {
                    if obj.name.id.0 != wanted {
                        continue;
                    }
                    if !obj.issues.is_empty() {
                        let fp = obj.name.fingerprint(&obj.kind.0)?;
                        report(&obj.issues, &format!("Message from object {}", fp))?;
                    }
                }
                out.push(obj.clone());
            }
        }

        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn descriptor_roles() {
        assert_eq!(ComponentRole::from_descriptor(0b1110_0000), ComponentRole::Set);
        assert_eq!(ComponentRole::from_descriptor(0b1100_0000), ComponentRole::ReplacementSet);
        assert_eq!(ComponentRole::from_descriptor(0b1010_0000), ComponentRole::RedundantSet);
        assert_eq!(ComponentRole::from_descriptor(0b0110_0000), ComponentRole::Object);
        assert_eq!(ComponentRole::from_descriptor(0b0100_0000), ComponentRole::InvariantAttribute);
        assert_eq!(ComponentRole::from_descriptor(0b0010_0000), ComponentRole::Attribute);
        assert_eq!(ComponentRole::from_descriptor(0b0000_0000), ComponentRole::AbsentAttribute);
    }

    #[test]
    fn set_descriptor_requires_a_set_role() {
        assert!(parse_set_descriptor(0b0110_0000).is_err());
        let desc = parse_set_descriptor(0b1111_1000).unwrap();
        assert!(desc.has_type);
        assert!(desc.has_name);
    }

    #[test]
    fn attribute_descriptor_field_flags() {
        let flags = parse_attribute_descriptor(0b0011_1111).unwrap();
        assert!(flags.label && flags.count && flags.reprc && flags.units && flags.value);
        assert!(!flags.invariant && !flags.object && !flags.absent);

        let flags = parse_attribute_descriptor(0b0101_0000).unwrap();
        assert!(flags.invariant && flags.label);

        let flags = parse_attribute_descriptor(0b0000_0000).unwrap();
        assert!(flags.absent);

        assert!(parse_attribute_descriptor(0b1110_0000).is_err());
    }

    #[test]
    fn patch_shrinks_oversized_defaults() {
        let mut attr = Attribute {
            count: 2,
            reprc: RepresentationCode::UShort,
            value: ValueVector::UShort(vec![1, 2, 3, 4]),
            ..Attribute::default()
        };
        patch_missing_value(&mut attr);
        assert_eq!(attr.value, ValueVector::UShort(vec![1, 2]));
        assert_eq!(max_severity(&attr.issues), Severity::Warning);
    }

    #[test]
    fn patch_keeps_defaults_when_count_grows() {
        let mut attr = Attribute {
            count: 4,
            reprc: RepresentationCode::UShort,
            value: ValueVector::UShort(vec![1, 2]),
            ..Attribute::default()
        };
        patch_missing_value(&mut attr);
        assert_eq!(attr.value, ValueVector::UShort(vec![1, 2]));
        assert_eq!(max_severity(&attr.issues), Severity::Error);
    }

    #[test]
    fn patch_initializes_absent_values() {
        let mut attr = Attribute {
            count: 3,
            reprc: RepresentationCode::FSingl,
            value: ValueVector::Absent,
            ..Attribute::default()
        };
        patch_missing_value(&mut attr);
        assert_eq!(attr.value, ValueVector::FSingl(vec![0.0, 0.0, 0.0]));
        assert!(attr.issues.is_empty());
    }

    #[test]
    fn object_set_and_remove_by_label() {
        let mut obj = Object::default();
        obj.set(Attribute {
            label: Ident::from("DIMENSION"),
            ..Attribute::default()
        });
        obj.set(Attribute {
            label: Ident::from("UNITS"),
            ..Attribute::default()
        });
        assert_eq!(obj.len(), 2);

        obj.set(Attribute {
            label: Ident::from("UNITS"),
            count: 9,
            ..Attribute::default()
        });
        assert_eq!(obj.len(), 2);
        assert_eq!(obj.at("UNITS").unwrap().count, 9);

        obj.remove(&Ident::from("DIMENSION"));
        assert_eq!(obj.len(), 1);
        assert!(obj.at("DIMENSION").is_none());
    }
}
