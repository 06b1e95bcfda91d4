//! Transmission elements.
//!
//! Two layouts share the `<transmission>` tag. The current one names its
//! type in a `<type>` child and describes the actuator in a nested element:
//!
//! ```xml
//! <transmission name="t1">
//!   <type>transmission_interface/SimpleTransmission</type>
//!   <joint name="shoulder"/>
//!   <actuator name="motor1">
//!     <hardwareInterface>EffortJointInterface</hardwareInterface>
//!     <mechanicalReduction>50</mechanicalReduction>
//!   </actuator>
//! </transmission>
//! ```
//!
//! The legacy PR2 layout carries the type as an attribute and the reduction
//! directly under the transmission:
//!
//! ```xml
//! <transmission name="t1" type="pr2_mechanism_model/SimpleTransmission">
//!   <joint name="shoulder"/>
//!   <actuator name="motor1"/>
//!   <mechanicalReduction>50</mechanicalReduction>
//! </transmission>
//! ```
//!
//! Nothing in the document says which one is used, so the layouts are
//! tried in turn with [`speculate`].

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::dispatch::{Candidate, speculate};
use crate::error::Result;
use crate::registry::TypeRegistry;
use crate::schema::{
    FieldDescriptor, FieldSet, FieldWriter, ValueType, XmlObject, read_object, write_object,
};
use crate::value::Primitive;
use crate::xml::XmlNode;

/// Actuator of a current-format transmission.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct UrdfActuator {
    /// Actuator name.
    pub name: String,
    /// Hardware interface, e.g. `EffortJointInterface`.
    pub hardware_interface: String,
    /// Gear ratio between actuator and joint.
    pub mechanical_reduction: Option<f64>,
}

impl XmlObject for UrdfActuator {
    const TAG: &'static str = "actuator";
    const FIELDS: &'static [FieldDescriptor] = &[
        FieldDescriptor::attribute("name", Primitive::Text),
        FieldDescriptor::element("hardwareInterface", ValueType::Primitive(Primitive::Text)),
        FieldDescriptor::optional_element(
            "mechanicalReduction",
            ValueType::Primitive(Primitive::Float),
        ),
    ];

    fn from_fields(fields: &mut FieldSet<'_>) -> Result<Self> {
        Ok(Self {
            name: fields.value("name")?,
            hardware_interface: fields.value("hardwareInterface")?,
            mechanical_reduction: fields.optional_value("mechanicalReduction")?,
        })
    }

    fn to_fields(&self, out: &mut FieldWriter<'_>) -> Result<()> {
        out.value("name", self.name.clone());
        out.value("hardwareInterface", self.hardware_interface.clone());
        out.optional_value("mechanicalReduction", self.mechanical_reduction);
        Ok(())
    }
}

/// Current-format transmission.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct UrdfSimpleTransmission {
    /// Transmission name.
    pub name: String,
    /// Transmission type from the `<type>` child.
    pub transmission_type: String,
    /// Driven joint.
    pub joint: String,
    /// Driving actuator.
    pub actuator: UrdfActuator,
}

impl XmlObject for UrdfSimpleTransmission {
    const TAG: &'static str = "transmission";
    const FIELDS: &'static [FieldDescriptor] = &[
        FieldDescriptor::attribute("name", Primitive::Text),
        FieldDescriptor::element("type", ValueType::Primitive(Primitive::Text)),
        FieldDescriptor::element("joint", ValueType::Alias("element_name")),
        FieldDescriptor::element("actuator", ValueType::Object),
    ];

    fn from_fields(fields: &mut FieldSet<'_>) -> Result<Self> {
        Ok(Self {
            name: fields.value("name")?,
            transmission_type: fields.value("type")?,
            joint: fields.value("joint")?,
            actuator: fields.object("actuator")?,
        })
    }

    fn to_fields(&self, out: &mut FieldWriter<'_>) -> Result<()> {
        out.value("name", self.name.clone());
        out.value("type", self.transmission_type.clone());
        out.value("joint", self.joint.clone());
        out.object("actuator", &self.actuator)
    }
}

/// Legacy PR2-format transmission.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct UrdfPr2Transmission {
    /// Transmission name.
    pub name: String,
    /// Transmission type from the `type` attribute.
    pub transmission_type: String,
    /// Driven joint.
    pub joint: String,
    /// Driving actuator name.
    pub actuator: String,
    /// Gear ratio between actuator and joint.
    pub mechanical_reduction: f64,
}

impl XmlObject for UrdfPr2Transmission {
    const TAG: &'static str = "transmission";
    const FIELDS: &'static [FieldDescriptor] = &[
        FieldDescriptor::attribute("name", Primitive::Text),
        FieldDescriptor::attribute("type", Primitive::Text),
        FieldDescriptor::element("joint", ValueType::Alias("element_name")),
        FieldDescriptor::element("actuator", ValueType::Alias("element_name")),
        FieldDescriptor::element("mechanicalReduction", ValueType::Primitive(Primitive::Float)),
    ];

    fn from_fields(fields: &mut FieldSet<'_>) -> Result<Self> {
        Ok(Self {
            name: fields.value("name")?,
            transmission_type: fields.value("type")?,
            joint: fields.value("joint")?,
            actuator: fields.value("actuator")?,
            mechanical_reduction: fields.value("mechanicalReduction")?,
        })
    }

    fn to_fields(&self, out: &mut FieldWriter<'_>) -> Result<()> {
        out.value("name", self.name.clone());
        out.value("type", self.transmission_type.clone());
        out.value("joint", self.joint.clone());
        out.value("actuator", self.actuator.clone());
        out.value("mechanicalReduction", self.mechanical_reduction);
        Ok(())
    }
}

/// A transmission in either supported layout.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum UrdfTransmission {
    /// Current layout.
    Simple(UrdfSimpleTransmission),
    /// Legacy PR2 layout.
    Pr2(UrdfPr2Transmission),
}

impl UrdfTransmission {
    /// Transmission name.
    pub fn name(&self) -> &str {
        match self {
            Self::Simple(t) => &t.name,
            Self::Pr2(t) => &t.name,
        }
    }

    /// Name of the driven joint.
    pub fn joint(&self) -> &str {
        match self {
            Self::Simple(t) => &t.joint,
            Self::Pr2(t) => &t.joint,
        }
    }

    /// Name of the driving actuator.
    pub fn actuator(&self) -> &str {
        match self {
            Self::Simple(t) => &t.actuator.name,
            Self::Pr2(t) => &t.actuator,
        }
    }
}

fn read_simple(node: &XmlNode, registry: &TypeRegistry) -> Result<UrdfTransmission> {
    read_object(node, registry).map(UrdfTransmission::Simple)
}

fn read_pr2(node: &XmlNode, registry: &TypeRegistry) -> Result<UrdfTransmission> {
    read_object(node, registry).map(UrdfTransmission::Pr2)
}

/// Transmission layouts, in the order they are tried.
pub const TRANSMISSION_CANDIDATES: [Candidate<UrdfTransmission>; 2] = [
    Candidate {
        name: "transmission",
        read: read_simple,
    },
    Candidate {
        name: "pr2_transmission",
        read: read_pr2,
    },
];

/// Decode a `<transmission>` element in whichever layout it follows.
///
/// # Errors
///
/// Returns [`crate::UrdfError::NoMatchingSchema`] if neither layout fits.
pub fn read_transmission(node: &XmlNode, registry: &TypeRegistry) -> Result<UrdfTransmission> {
    speculate(node, registry, &TRANSMISSION_CANDIDATES)
}

/// Write a transmission in the layout it was read with.
///
/// # Errors
///
/// Returns an error if a field cannot be written.
pub fn write_transmission(
    transmission: &UrdfTransmission,
    tag: &str,
    registry: &TypeRegistry,
) -> Result<XmlNode> {
    match transmission {
        UrdfTransmission::Simple(t) => write_object(t, tag, registry),
        UrdfTransmission::Pr2(t) => write_object(t, tag, registry),
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use crate::error::UrdfError;
    use crate::xml::parse_document;

    const CURRENT: &str = r#"
        <transmission name="t1">
            <type>transmission_interface/SimpleTransmission</type>
            <joint name="shoulder"/>
            <actuator name="motor1">
                <hardwareInterface>EffortJointInterface</hardwareInterface>
                <mechanicalReduction>50</mechanicalReduction>
            </actuator>
        </transmission>
    "#;

    const LEGACY: &str = r#"
        <transmission name="t1" type="pr2_mechanism_model/SimpleTransmission">
            <joint name="shoulder"/>
            <actuator name="motor1"/>
            <mechanicalReduction>50</mechanicalReduction>
        </transmission>
    "#;

    fn read(xml: &str) -> Result<UrdfTransmission> {
        let node = parse_document(xml).expect("well-formed");
        read_transmission(&node, &TypeRegistry::urdf())
    }

    #[test]
    fn test_current_layout() {
        match read(CURRENT).expect("should decode") {
            UrdfTransmission::Simple(t) => {
                assert_eq!(t.transmission_type, "transmission_interface/SimpleTransmission");
                assert_eq!(t.joint, "shoulder");
                assert_eq!(t.actuator.hardware_interface, "EffortJointInterface");
                assert_eq!(t.actuator.mechanical_reduction, Some(50.0));
            }
            other => panic!("expected current layout, got {other:?}"),
        }
    }

    #[test]
    fn test_legacy_layout() {
        let transmission = read(LEGACY).expect("should decode");
        assert_eq!(
            transmission,
            UrdfTransmission::Pr2(UrdfPr2Transmission {
                name: "t1".into(),
                transmission_type: "pr2_mechanism_model/SimpleTransmission".into(),
                joint: "shoulder".into(),
                actuator: "motor1".into(),
                mechanical_reduction: 50.0,
            })
        );
        assert_eq!(transmission.actuator(), "motor1");
    }

    #[test]
    fn test_neither_layout() {
        let err = read(r#"<transmission name="t"><joint name="j"/></transmission>"#).unwrap_err();
        assert!(matches!(err, UrdfError::NoMatchingSchema { .. }));
    }

    #[test]
    fn test_written_layout_reads_back_as_same_variant() {
        let registry = TypeRegistry::urdf();
        for xml in [CURRENT, LEGACY] {
            let transmission = read(xml).expect("decode");
            let node = write_transmission(&transmission, "transmission", &registry).expect("write");
            assert_eq!(read_transmission(&node, &registry).expect("re-read"), transmission);
        }
    }
}
