//! Declarative field descriptors and the generic read/write drivers.
//!
//! Every document entity lists its fields once as a static table of
//! [`FieldDescriptor`]s. [`read_object`] walks that table against an
//! [`XmlNode`], decodes what it finds into a [`FieldSet`], and hands the set
//! to the entity's [`XmlObject::from_fields`]. [`write_object`] runs the
//! same table in reverse over what [`XmlObject::to_fields`] recorded.

use std::collections::HashMap;

use crate::error::{Result, UrdfError};
use crate::geometry::{UrdfGeometry, read_geometry, write_geometry};
use crate::registry::{TypeDef, TypeRegistry};
use crate::transmission::{UrdfTransmission, read_transmission, write_transmission};
use crate::value::{Primitive, PrimitiveValue, Value};
use crate::xml::XmlNode;

/// Where a field lives relative to its owning element.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    /// An attribute of the owning element.
    Attribute,
    /// A single child element.
    Element,
    /// Zero or more child elements with the same tag, kept in order.
    Aggregate,
}

/// How a field value is encoded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueType {
    /// A primitive in an attribute or in element text.
    Primitive(Primitive),
    /// A type registered by name in the [`TypeRegistry`].
    Alias(&'static str),
    /// A nested entity decoded by its own [`XmlObject`] implementation.
    Object,
    /// An element kept verbatim.
    Raw,
}

/// Declaration of one field of an entity.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldDescriptor {
    /// Attribute key or child tag.
    pub name: &'static str,
    /// Attribute, element or aggregate.
    pub kind: FieldKind,
    /// Value encoding.
    pub value_type: ValueType,
    /// Whether the field must be present.
    pub required: bool,
    /// Literal used when an optional primitive field is absent.
    pub default: Option<&'static str>,
}

impl FieldDescriptor {
    /// A required attribute.
    pub const fn attribute(name: &'static str, primitive: Primitive) -> Self {
        Self {
            name,
            kind: FieldKind::Attribute,
            value_type: ValueType::Primitive(primitive),
            required: true,
            default: None,
        }
    }

    /// An optional attribute without a default.
    pub const fn optional_attribute(name: &'static str, primitive: Primitive) -> Self {
        Self {
            required: false,
            ..Self::attribute(name, primitive)
        }
    }

    /// An optional attribute that takes `default` when absent.
    pub const fn attribute_or(
        name: &'static str,
        primitive: Primitive,
        default: &'static str,
    ) -> Self {
        Self {
            required: false,
            default: Some(default),
            ..Self::attribute(name, primitive)
        }
    }

    /// A required child element.
    pub const fn element(name: &'static str, value_type: ValueType) -> Self {
        Self {
            name,
            kind: FieldKind::Element,
            value_type,
            required: true,
            default: None,
        }
    }

    /// An optional child element.
    pub const fn optional_element(name: &'static str, value_type: ValueType) -> Self {
        Self {
            required: false,
            ..Self::element(name, value_type)
        }
    }

    /// A repeated child element.
    pub const fn aggregate(name: &'static str, value_type: ValueType) -> Self {
        Self {
            name,
            kind: FieldKind::Aggregate,
            value_type,
            required: false,
            default: None,
        }
    }
}

/// A document entity with a descriptor table.
pub trait XmlObject: Sized {
    /// Tag used when the entity is written on its own.
    const TAG: &'static str;

    /// Field table, in write order.
    const FIELDS: &'static [FieldDescriptor];

    /// Build the entity from decoded fields.
    fn from_fields(fields: &mut FieldSet<'_>) -> Result<Self>;

    /// Record the entity's fields for writing.
    fn to_fields(&self, out: &mut FieldWriter<'_>) -> Result<()>;
}

/// A decoded field value.
#[derive(Debug)]
pub enum Decoded<'n> {
    /// A primitive value.
    Value(Value),
    /// A nested entity, decoded on demand by its owner.
    Node(&'n XmlNode),
    /// A resolved geometry.
    Geometry(UrdfGeometry),
    /// A resolved transmission.
    Transmission(UrdfTransmission),
    /// A verbatim element.
    Raw(XmlNode),
}

/// The decoded fields of one element.
#[derive(Debug)]
pub struct FieldSet<'n> {
    element: &'n str,
    registry: &'n TypeRegistry,
    values: HashMap<&'static str, Decoded<'n>>,
    aggregates: Vec<(&'static str, Decoded<'n>)>,
}

impl<'n> FieldSet<'n> {
    /// Tag of the element being decoded.
    pub fn element_name(&self) -> &'n str {
        self.element
    }

    /// Registry used for this decode.
    pub fn registry(&self) -> &'n TypeRegistry {
        self.registry
    }

    /// Take a required primitive field.
    pub fn value<T: PrimitiveValue>(&mut self, name: &'static str) -> Result<T> {
        self.optional_value(name)?
            .ok_or_else(|| UrdfError::missing_field(name, self.element))
    }

    /// Take an optional primitive field.
    pub fn optional_value<T: PrimitiveValue>(&mut self, name: &'static str) -> Result<Option<T>> {
        match self.values.remove(name) {
            None => Ok(None),
            Some(Decoded::Value(value)) => T::from_value(value)
                .map(Some)
                .ok_or_else(|| self.mismatch(name)),
            Some(_) => Err(self.mismatch(name)),
        }
    }

    /// Take and decode a required nested entity.
    pub fn object<T: XmlObject>(&mut self, name: &'static str) -> Result<T> {
        self.optional_object(name)?
            .ok_or_else(|| UrdfError::missing_field(name, self.element))
    }

    /// Take and decode an optional nested entity.
    pub fn optional_object<T: XmlObject>(&mut self, name: &'static str) -> Result<Option<T>> {
        match self.values.remove(name) {
            None => Ok(None),
            Some(Decoded::Node(node)) => read_object(node, self.registry).map(Some),
            Some(_) => Err(self.mismatch(name)),
        }
    }

    /// Take a required geometry field.
    pub fn geometry(&mut self, name: &'static str) -> Result<UrdfGeometry> {
        match self.values.remove(name) {
            None => Err(UrdfError::missing_field(name, self.element)),
            Some(Decoded::Geometry(geometry)) => Ok(geometry),
            Some(_) => Err(self.mismatch(name)),
        }
    }

    /// Take all aggregate children, in document order.
    pub fn take_aggregates(&mut self) -> Vec<(&'static str, Decoded<'n>)> {
        std::mem::take(&mut self.aggregates)
    }

    fn mismatch(&self, name: &'static str) -> UrdfError {
        UrdfError::invalid_element(
            self.element,
            format!("field {name} does not match its declared type"),
        )
    }
}

/// Decode an entity from an element.
///
/// # Errors
///
/// Returns an error if a required field is missing, a value fails to parse,
/// or the entity rejects the decoded fields.
pub fn read_object<T: XmlObject>(node: &XmlNode, registry: &TypeRegistry) -> Result<T> {
    let mut fields = read_fields(node, T::FIELDS, registry)?;
    T::from_fields(&mut fields)
}

/// Decode the fields of an element against a descriptor table.
///
/// # Errors
///
/// Returns an error if a required field is missing or a value fails to parse.
pub fn read_fields<'n>(
    node: &'n XmlNode,
    descriptors: &'static [FieldDescriptor],
    registry: &'n TypeRegistry,
) -> Result<FieldSet<'n>> {
    let mut values = HashMap::new();

    for field in descriptors {
        let decoded = match field.kind {
            FieldKind::Attribute => decode_attribute(node, field, registry)?,
            FieldKind::Element => {
                let mut matches = node.children_named(field.name);
                match matches.next() {
                    Some(child) => {
                        if matches.next().is_some() {
                            tracing::warn!(
                                element = %node.name,
                                child = field.name,
                                "repeated element, keeping the first"
                            );
                        }
                        Some(decode_element(child, field, registry)?)
                    }
                    None => default_value(node, field, registry)?,
                }
            }
            FieldKind::Aggregate => continue,
        };

        match decoded {
            Some(decoded) => {
                values.insert(field.name, decoded);
            }
            None if field.required => {
                return Err(UrdfError::missing_field(field.name, node.name.as_str()));
            }
            None => {}
        }
    }

    let mut aggregates = Vec::new();
    for child in &node.children {
        let aggregate = descriptors
            .iter()
            .find(|f| f.kind == FieldKind::Aggregate && f.name == child.name);
        match aggregate {
            Some(field) => aggregates.push((field.name, decode_element(child, field, registry)?)),
            None if !descriptors.iter().any(|f| f.name == child.name) => {
                tracing::debug!(
                    element = %node.name,
                    child = %child.name,
                    "ignoring unknown element"
                );
            }
            None => {}
        }
    }

    for (key, _) in &node.attributes {
        let declared = descriptors
            .iter()
            .any(|f| f.kind == FieldKind::Attribute && f.name == key.as_str());
        if !declared {
            tracing::debug!(element = %node.name, attribute = %key, "ignoring unknown attribute");
        }
    }

    Ok(FieldSet {
        element: node.name.as_str(),
        registry,
        values,
        aggregates,
    })
}

fn decode_attribute<'n>(
    node: &'n XmlNode,
    field: &FieldDescriptor,
    registry: &TypeRegistry,
) -> Result<Option<Decoded<'n>>> {
    match node.attribute(field.name) {
        Some(raw) => {
            let primitive = primitive_of(field, registry)?
                .ok_or_else(|| not_an_attribute(node.name.as_str(), field))?;
            primitive
                .parse(raw)
                .map(|v| Some(Decoded::Value(v)))
                .map_err(|message| {
                    UrdfError::invalid_attribute(field.name, node.name.as_str(), message)
                })
        }
        None => default_value(node, field, registry),
    }
}

fn decode_element<'n>(
    child: &'n XmlNode,
    field: &FieldDescriptor,
    registry: &TypeRegistry,
) -> Result<Decoded<'n>> {
    match field.value_type {
        ValueType::Primitive(primitive) => decode_text(child, primitive),
        ValueType::Object => Ok(Decoded::Node(child)),
        ValueType::Raw => Ok(Decoded::Raw(child.clone())),
        ValueType::Alias(name) => match registry.get(name)? {
            TypeDef::Text(primitive) => decode_text(child, primitive),
            TypeDef::SimpleElement { attribute, value } => {
                let raw = child
                    .attribute(attribute)
                    .ok_or_else(|| UrdfError::missing_field(attribute, child.name.as_str()))?;
                value.parse(raw).map(Decoded::Value).map_err(|message| {
                    UrdfError::invalid_attribute(attribute, child.name.as_str(), message)
                })
            }
            TypeDef::Geometry => read_geometry(child, registry).map(Decoded::Geometry),
            TypeDef::Transmission => {
                read_transmission(child, registry).map(Decoded::Transmission)
            }
        },
    }
}

fn decode_text(child: &XmlNode, primitive: Primitive) -> Result<Decoded<'_>> {
    primitive
        .parse(child.text().unwrap_or_default())
        .map(Decoded::Value)
        .map_err(|message| UrdfError::invalid_element(child.name.as_str(), message))
}

fn default_value<'n>(
    node: &XmlNode,
    field: &FieldDescriptor,
    registry: &TypeRegistry,
) -> Result<Option<Decoded<'n>>> {
    let Some(default) = field.default else {
        return Ok(None);
    };
    let primitive =
        primitive_of(field, registry)?.ok_or_else(|| not_an_attribute(node.name.as_str(), field))?;
    primitive
        .parse(default)
        .map(|v| Some(Decoded::Value(v)))
        .map_err(|message| UrdfError::invalid_attribute(field.name, node.name.as_str(), message))
}

/// Primitive carried by a field, if it is a plain value.
fn primitive_of(field: &FieldDescriptor, registry: &TypeRegistry) -> Result<Option<Primitive>> {
    Ok(match field.value_type {
        ValueType::Primitive(primitive) => Some(primitive),
        ValueType::Alias(name) => match registry.get(name)? {
            TypeDef::Text(primitive) => Some(primitive),
            TypeDef::SimpleElement { value, .. } => Some(value),
            TypeDef::Geometry | TypeDef::Transmission => None,
        },
        ValueType::Object | ValueType::Raw => None,
    })
}

fn not_an_attribute(element: &str, field: &FieldDescriptor) -> UrdfError {
    UrdfError::invalid_element(
        element,
        format!("field {} cannot hold a plain value", field.name),
    )
}

/// A field recorded for writing.
#[derive(Debug)]
enum Encoded {
    Value(Value),
    Node(XmlNode),
}

/// Collects an entity's fields for [`write_object`].
#[derive(Debug)]
pub struct FieldWriter<'r> {
    element: String,
    registry: &'r TypeRegistry,
    entries: Vec<(&'static str, Encoded)>,
}

impl<'r> FieldWriter<'r> {
    fn new(element: &str, registry: &'r TypeRegistry) -> Self {
        Self {
            element: element.to_string(),
            registry,
            entries: Vec::new(),
        }
    }

    /// Record a primitive field.
    pub fn value<T: PrimitiveValue>(&mut self, name: &'static str, value: T) {
        self.entries.push((name, Encoded::Value(value.into_value())));
    }

    /// Record a primitive field if present.
    pub fn optional_value<T: PrimitiveValue>(&mut self, name: &'static str, value: Option<T>) {
        if let Some(value) = value {
            self.value(name, value);
        }
    }

    /// Record a nested entity.
    pub fn object<T: XmlObject>(&mut self, name: &'static str, object: &T) -> Result<()> {
        let node = write_object(object, name, self.registry)?;
        self.entries.push((name, Encoded::Node(node)));
        Ok(())
    }

    /// Record a nested entity if present.
    pub fn optional_object<T: XmlObject>(
        &mut self,
        name: &'static str,
        object: Option<&T>,
    ) -> Result<()> {
        match object {
            Some(object) => self.object(name, object),
            None => Ok(()),
        }
    }

    /// Record a geometry field.
    pub fn geometry(&mut self, name: &'static str, geometry: &UrdfGeometry) -> Result<()> {
        let node = write_geometry(geometry, name, self.registry)?;
        self.entries.push((name, Encoded::Node(node)));
        Ok(())
    }

    /// Record a transmission field.
    pub fn transmission(
        &mut self,
        name: &'static str,
        transmission: &UrdfTransmission,
    ) -> Result<()> {
        let node = write_transmission(transmission, name, self.registry)?;
        self.entries.push((name, Encoded::Node(node)));
        Ok(())
    }

    /// Record a verbatim element.
    pub fn raw(&mut self, name: &'static str, node: &XmlNode) {
        self.entries.push((name, Encoded::Node(node.clone())));
    }
}

/// Encode an entity as an element with the given tag.
///
/// # Errors
///
/// Returns an error if a required field was not recorded, a field was
/// recorded that the table does not declare, or a value does not fit its
/// declared encoding.
pub fn write_object<T: XmlObject>(
    object: &T,
    tag: &str,
    registry: &TypeRegistry,
) -> Result<XmlNode> {
    let mut out = FieldWriter::new(tag, registry);
    object.to_fields(&mut out)?;

    let mut node = XmlNode::new(tag);
    let mut entries = out.entries;

    for field in T::FIELDS {
        let (matching, rest): (Vec<_>, Vec<_>) =
            entries.into_iter().partition(|(name, _)| *name == field.name);
        entries = rest;

        if matching.is_empty() && field.required && field.default.is_none() {
            return Err(UrdfError::missing_field(field.name, tag));
        }

        for (_, encoded) in matching {
            match (field.kind, encoded) {
                (FieldKind::Attribute, Encoded::Value(value)) => {
                    node.set_attribute(field.name, value.to_xml_text());
                }
                (FieldKind::Attribute, Encoded::Node(_)) => {
                    return Err(not_an_attribute(tag, field));
                }
                (FieldKind::Element | FieldKind::Aggregate, encoded) => {
                    node.children.push(encode_element(field, encoded, registry, tag)?);
                }
            }
        }
    }

    if let Some((name, _)) = entries.first() {
        return Err(UrdfError::UndeclaredField {
            field: *name,
            element: out.element,
        });
    }

    Ok(node)
}

fn encode_element(
    field: &FieldDescriptor,
    encoded: Encoded,
    registry: &TypeRegistry,
    owner: &str,
) -> Result<XmlNode> {
    let value = match encoded {
        Encoded::Node(mut node) => {
            node.name = field.name.to_string();
            return Ok(node);
        }
        Encoded::Value(value) => value,
    };

    let text = value.to_xml_text();
    match field.value_type {
        ValueType::Primitive(_) => Ok(XmlNode::new(field.name).with_text(text)),
        ValueType::Alias(name) => match registry.get(name)? {
            TypeDef::Text(_) => Ok(XmlNode::new(field.name).with_text(text)),
            TypeDef::SimpleElement { attribute, .. } => {
                Ok(XmlNode::new(field.name).with_attribute(attribute, text))
            }
            TypeDef::Geometry | TypeDef::Transmission => Err(not_an_attribute(owner, field)),
        },
        ValueType::Object | ValueType::Raw => Err(not_an_attribute(owner, field)),
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use crate::xml::parse_document;
    use nalgebra::Vector3;

    /// Small entity covering every descriptor shape.
    #[derive(Debug, Clone, PartialEq)]
    struct Probe {
        name: String,
        gain: f64,
        offset: Option<Vector3<f64>>,
        parent: String,
        note: Option<String>,
        tags: Vec<String>,
    }

    impl XmlObject for Probe {
        const TAG: &'static str = "probe";
        const FIELDS: &'static [FieldDescriptor] = &[
            FieldDescriptor::attribute("name", Primitive::Text),
            FieldDescriptor::attribute_or("gain", Primitive::Float, "1.5"),
            FieldDescriptor::optional_element("offset", ValueType::Alias("element_xyz")),
            FieldDescriptor::element("parent", ValueType::Alias("element_link")),
            FieldDescriptor::optional_element("note", ValueType::Primitive(Primitive::Text)),
            FieldDescriptor::aggregate("tag", ValueType::Alias("element_name")),
        ];

        fn from_fields(fields: &mut FieldSet<'_>) -> Result<Self> {
            let mut probe = Self {
                name: fields.value("name")?,
                gain: fields.value("gain")?,
                offset: fields.optional_value("offset")?,
                parent: fields.value("parent")?,
                note: fields.optional_value("note")?,
                tags: Vec::new(),
            };
            for (_, decoded) in fields.take_aggregates() {
                match decoded {
                    Decoded::Value(Value::Text(tag)) => probe.tags.push(tag),
                    other => panic!("unexpected aggregate {other:?}"),
                }
            }
            Ok(probe)
        }

        fn to_fields(&self, out: &mut FieldWriter<'_>) -> Result<()> {
            out.value("name", self.name.clone());
            out.value("gain", self.gain);
            out.optional_value("offset", self.offset);
            out.value("parent", self.parent.clone());
            out.optional_value("note", self.note.clone());
            for tag in &self.tags {
                out.value("tag", tag.clone());
            }
            Ok(())
        }
    }

    fn read(xml: &str) -> Result<Probe> {
        let node = parse_document(xml).expect("well-formed");
        read_object(&node, &TypeRegistry::urdf())
    }

    #[test]
    fn test_reads_all_descriptor_kinds() {
        let probe = read(
            r#"
            <probe name="p" gain="2">
                <offset xyz="1 2 3"/>
                <tag name="a"/>
                <parent link="base"/>
                <note>hello</note>
                <tag name="b"/>
            </probe>
        "#,
        )
        .expect("should decode");

        assert_eq!(probe.name, "p");
        assert_eq!(probe.gain, 2.0);
        assert_eq!(probe.offset, Some(Vector3::new(1.0, 2.0, 3.0)));
        assert_eq!(probe.parent, "base");
        assert_eq!(probe.note.as_deref(), Some("hello"));
        assert_eq!(probe.tags, vec!["a", "b"]);
    }

    #[test]
    fn test_default_applies_when_absent() {
        let probe = read(r#"<probe name="p"><parent link="base"/></probe>"#).expect("decode");
        assert_eq!(probe.gain, 1.5);
        assert!(probe.offset.is_none());
        assert!(probe.tags.is_empty());
    }

    #[test]
    fn test_missing_required_attribute() {
        let err = read(r#"<probe><parent link="base"/></probe>"#).unwrap_err();
        assert!(matches!(
            err,
            UrdfError::MissingRequiredField { field: "name", .. }
        ));
    }

    #[test]
    fn test_missing_required_element() {
        let err = read(r#"<probe name="p"/>"#).unwrap_err();
        assert!(matches!(
            err,
            UrdfError::MissingRequiredField { field: "parent", .. }
        ));
    }

    #[test]
    fn test_simple_element_missing_its_attribute() {
        let err = read(r#"<probe name="p"><parent/></probe>"#).unwrap_err();
        assert!(matches!(
            err,
            UrdfError::MissingRequiredField { field: "link", .. }
        ));
    }

    #[test]
    fn test_malformed_attribute_value() {
        let err = read(r#"<probe name="p" gain="lots"><parent link="b"/></probe>"#).unwrap_err();
        assert!(matches!(
            err,
            UrdfError::InvalidAttribute { attribute: "gain", .. }
        ));
    }

    #[test]
    fn test_unknown_content_is_ignored() {
        let probe = read(r#"<probe name="p" color="red"><parent link="b"/><extra/></probe>"#)
            .expect("unknown content is tolerated");
        assert_eq!(probe.parent, "b");
    }

    #[test]
    fn test_write_is_inverse_of_read() {
        let registry = TypeRegistry::urdf();
        let probe = Probe {
            name: "p".into(),
            gain: 0.25,
            offset: None,
            parent: "base".into(),
            note: Some("n".into()),
            tags: vec!["x".into(), "y".into()],
        };

        let node = write_object(&probe, Probe::TAG, &registry).expect("should write");
        assert_eq!(node.attribute("gain"), Some("0.25"));
        assert_eq!(
            node.child("parent").and_then(|p| p.attribute("link")),
            Some("base")
        );
        assert_eq!(node.children_named("tag").count(), 2);

        let back: Probe = read_object(&node, &registry).expect("should read back");
        assert_eq!(back, probe);
    }

    #[test]
    fn test_unknown_alias() {
        #[derive(Debug)]
        struct Broken;

        impl XmlObject for Broken {
            const TAG: &'static str = "broken";
            const FIELDS: &'static [FieldDescriptor] =
                &[FieldDescriptor::element("x", ValueType::Alias("no_such_type"))];

            fn from_fields(_fields: &mut FieldSet<'_>) -> Result<Self> {
                Ok(Self)
            }

            fn to_fields(&self, _out: &mut FieldWriter<'_>) -> Result<()> {
                Ok(())
            }
        }

        let node = parse_document("<broken><x/></broken>").expect("well-formed");
        let result: Result<Broken> = read_object(&node, &TypeRegistry::urdf());
        assert!(matches!(result, Err(UrdfError::UnknownType(_))));
    }
}
