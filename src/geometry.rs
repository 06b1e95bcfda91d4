//! Geometry shapes and `<geometry>` variant resolution.

use nalgebra::Vector3;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::error::{Result, UrdfError};
use crate::registry::TypeRegistry;
use crate::schema::{
    FieldDescriptor, FieldSet, FieldWriter, ValueType, XmlObject, read_object, write_object,
};
use crate::value::Primitive;
use crate::xml::XmlNode;

/// Box with size (x, y, z) in meters.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct UrdfBox {
    /// Size in x, y, z dimensions.
    pub size: Vector3<f64>,
}

/// Cylinder along the local z axis.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct UrdfCylinder {
    /// Cylinder radius in meters.
    pub radius: f64,
    /// Cylinder length in meters.
    pub length: f64,
}

/// Sphere centred on the origin.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct UrdfSphere {
    /// Sphere radius in meters.
    pub radius: f64,
}

/// Mesh file reference.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct UrdfMesh {
    /// Mesh URI, possibly `package://` relative.
    pub filename: String,
    /// Optional per-axis scale.
    pub scale: Option<Vector3<f64>>,
}

impl XmlObject for UrdfBox {
    const TAG: &'static str = "box";
    const FIELDS: &'static [FieldDescriptor] =
        &[FieldDescriptor::attribute("size", Primitive::Vector3)];

    fn from_fields(fields: &mut FieldSet<'_>) -> Result<Self> {
        Ok(Self {
            size: fields.value("size")?,
        })
    }

    fn to_fields(&self, out: &mut FieldWriter<'_>) -> Result<()> {
        out.value("size", self.size);
        Ok(())
    }
}

impl XmlObject for UrdfCylinder {
    const TAG: &'static str = "cylinder";
    const FIELDS: &'static [FieldDescriptor] = &[
        FieldDescriptor::attribute("radius", Primitive::Float),
        FieldDescriptor::attribute("length", Primitive::Float),
    ];

    fn from_fields(fields: &mut FieldSet<'_>) -> Result<Self> {
        Ok(Self {
            radius: fields.value("radius")?,
            length: fields.value("length")?,
        })
    }

    fn to_fields(&self, out: &mut FieldWriter<'_>) -> Result<()> {
        out.value("radius", self.radius);
        out.value("length", self.length);
        Ok(())
    }
}

impl XmlObject for UrdfSphere {
    const TAG: &'static str = "sphere";
    const FIELDS: &'static [FieldDescriptor] =
        &[FieldDescriptor::attribute("radius", Primitive::Float)];

    fn from_fields(fields: &mut FieldSet<'_>) -> Result<Self> {
        Ok(Self {
            radius: fields.value("radius")?,
        })
    }

    fn to_fields(&self, out: &mut FieldWriter<'_>) -> Result<()> {
        out.value("radius", self.radius);
        Ok(())
    }
}

impl XmlObject for UrdfMesh {
    const TAG: &'static str = "mesh";
    const FIELDS: &'static [FieldDescriptor] = &[
        FieldDescriptor::attribute("filename", Primitive::Text),
        FieldDescriptor::optional_attribute("scale", Primitive::Vector3),
    ];

    fn from_fields(fields: &mut FieldSet<'_>) -> Result<Self> {
        Ok(Self {
            filename: fields.value("filename")?,
            scale: fields.optional_value("scale")?,
        })
    }

    fn to_fields(&self, out: &mut FieldWriter<'_>) -> Result<()> {
        out.value("filename", self.filename.clone());
        out.optional_value("scale", self.scale);
        Ok(())
    }
}

/// Geometry shape from a `<geometry>` element.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum UrdfGeometry {
    /// `<box>`
    Box(UrdfBox),
    /// `<cylinder>`
    Cylinder(UrdfCylinder),
    /// `<sphere>`
    Sphere(UrdfSphere),
    /// `<mesh>`
    Mesh(UrdfMesh),
}

impl UrdfGeometry {
    /// Create a box geometry.
    #[must_use]
    pub fn box_shape(x: f64, y: f64, z: f64) -> Self {
        Self::Box(UrdfBox {
            size: Vector3::new(x, y, z),
        })
    }

    /// Create a cylinder geometry.
    #[must_use]
    pub fn cylinder(radius: f64, length: f64) -> Self {
        Self::Cylinder(UrdfCylinder { radius, length })
    }

    /// Create a sphere geometry.
    #[must_use]
    pub fn sphere(radius: f64) -> Self {
        Self::Sphere(UrdfSphere { radius })
    }

    /// Create a mesh geometry.
    #[must_use]
    pub fn mesh(filename: impl Into<String>, scale: Option<Vector3<f64>>) -> Self {
        Self::Mesh(UrdfMesh {
            filename: filename.into(),
            scale,
        })
    }

    /// Which shape this is.
    #[must_use]
    pub fn kind(&self) -> GeometryKind {
        match self {
            Self::Box(_) => GeometryKind::Box,
            Self::Cylinder(_) => GeometryKind::Cylinder,
            Self::Sphere(_) => GeometryKind::Sphere,
            Self::Mesh(_) => GeometryKind::Mesh,
        }
    }
}

/// The closed set of shape tags.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GeometryKind {
    /// `box`
    Box,
    /// `cylinder`
    Cylinder,
    /// `sphere`
    Sphere,
    /// `mesh`
    Mesh,
}

impl GeometryKind {
    /// All shape kinds.
    pub const ALL: [Self; 4] = [Self::Box, Self::Cylinder, Self::Sphere, Self::Mesh];

    /// Look up a shape by its tag.
    pub fn from_tag(tag: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|kind| kind.tag() == tag)
    }

    /// The tag a shape is written under.
    #[must_use]
    pub fn tag(self) -> &'static str {
        match self {
            Self::Box => UrdfBox::TAG,
            Self::Cylinder => UrdfCylinder::TAG,
            Self::Sphere => UrdfSphere::TAG,
            Self::Mesh => UrdfMesh::TAG,
        }
    }

    fn read(self, node: &XmlNode, registry: &TypeRegistry) -> Result<UrdfGeometry> {
        match self {
            Self::Box => read_object(node, registry).map(UrdfGeometry::Box),
            Self::Cylinder => read_object(node, registry).map(UrdfGeometry::Cylinder),
            Self::Sphere => read_object(node, registry).map(UrdfGeometry::Sphere),
            Self::Mesh => read_object(node, registry).map(UrdfGeometry::Mesh),
        }
    }
}

/// Resolve the single shape held by a `<geometry>` element.
///
/// # Errors
///
/// Returns [`UrdfError::MissingGeometry`] for an empty element,
/// [`UrdfError::AmbiguousGeometry`] when more than one child is present, and
/// [`UrdfError::UnknownElement`] for a tag that is not a shape.
pub fn read_geometry(node: &XmlNode, registry: &TypeRegistry) -> Result<UrdfGeometry> {
    match node.children.as_slice() {
        [] => Err(UrdfError::MissingGeometry {
            context: node.name.clone(),
        }),
        [shape] => {
            let kind =
                GeometryKind::from_tag(&shape.name).ok_or_else(|| UrdfError::UnknownElement {
                    element: shape.name.clone(),
                    context: node.name.clone(),
                })?;
            kind.read(shape, registry)
        }
        shapes => Err(UrdfError::AmbiguousGeometry {
            context: node.name.clone(),
            found: shapes.iter().map(|s| s.name.clone()).collect(),
        }),
    }
}

/// Write a geometry as a `tag` element wrapping its shape.
///
/// # Errors
///
/// Returns an error if the shape cannot be written.
pub fn write_geometry(
    geometry: &UrdfGeometry,
    tag: &str,
    registry: &TypeRegistry,
) -> Result<XmlNode> {
    let name = geometry.kind().tag();
    let shape = match geometry {
        UrdfGeometry::Box(shape) => write_object(shape, name, registry)?,
        UrdfGeometry::Cylinder(shape) => write_object(shape, name, registry)?,
        UrdfGeometry::Sphere(shape) => write_object(shape, name, registry)?,
        UrdfGeometry::Mesh(shape) => write_object(shape, name, registry)?,
    };
    Ok(XmlNode::new(tag).with_child(shape))
}

/// Descriptor for a required `<geometry>` child.
pub(crate) const GEOMETRY_FIELD: FieldDescriptor =
    FieldDescriptor::element("geometry", ValueType::Alias("geometric"));
