//! Document entity types.
//!
//! Each type mirrors one URDF element and carries the descriptor table used
//! to read and write it. Optional elements are `Option`s and keep their
//! absence through a round trip.

use std::fmt;
use std::str::FromStr;

use nalgebra::{Isometry3, Matrix3, Translation3, UnitQuaternion, Vector3, Vector4};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::error::{Result, UrdfError};
use crate::geometry::{GEOMETRY_FIELD, UrdfGeometry};
use crate::schema::{FieldDescriptor, FieldSet, FieldWriter, ValueType, XmlObject};
use crate::value::Primitive;

/// Safe axis normalization with Z fallback for zero-length vectors.
#[inline]
fn safe_normalize_axis(v: Vector3<f64>) -> Vector3<f64> {
    let n = v.norm();
    if n > 1e-10 { v / n } else { Vector3::z() }
}

const ORIGIN_FIELD: FieldDescriptor =
    FieldDescriptor::optional_element("origin", ValueType::Object);

// ============================================================================
// Origin (Pose)
// ============================================================================

/// Pose from an `<origin>` element.
///
/// Either component may be omitted, but not both.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct UrdfPose {
    /// Position (xyz) in meters.
    pub xyz: Option<Vector3<f64>>,
    /// Rotation as roll-pitch-yaw (rpy) in radians.
    pub rpy: Option<Vector3<f64>>,
}

impl UrdfPose {
    /// Create from position and rpy.
    #[must_use]
    pub fn new(xyz: Vector3<f64>, rpy: Vector3<f64>) -> Self {
        Self {
            xyz: Some(xyz),
            rpy: Some(rpy),
        }
    }

    /// Create a pure translation.
    #[must_use]
    pub fn from_xyz(x: f64, y: f64, z: f64) -> Self {
        Self {
            xyz: Some(Vector3::new(x, y, z)),
            rpy: None,
        }
    }

    /// Create a pure rotation.
    #[must_use]
    pub fn from_rpy(roll: f64, pitch: f64, yaw: f64) -> Self {
        Self {
            xyz: None,
            rpy: Some(Vector3::new(roll, pitch, yaw)),
        }
    }

    /// Translation, zero when omitted.
    #[must_use]
    pub fn translation(&self) -> Vector3<f64> {
        self.xyz.unwrap_or_else(Vector3::zeros)
    }

    /// Convert rpy to quaternion.
    ///
    /// URDF uses fixed-axis XYZ (roll about X, then pitch about Y, then yaw about Z).
    #[must_use]
    pub fn rotation(&self) -> UnitQuaternion<f64> {
        self.rpy.map_or_else(UnitQuaternion::identity, |rpy| {
            UnitQuaternion::from_euler_angles(rpy.x, rpy.y, rpy.z)
        })
    }

    /// Rigid transform of the pose.
    #[must_use]
    pub fn isometry(&self) -> Isometry3<f64> {
        Isometry3::from_parts(Translation3::from(self.translation()), self.rotation())
    }

    /// Whether translation and rotation angle are both within `tolerance` of zero.
    #[must_use]
    pub fn is_identity(&self, tolerance: f64) -> bool {
        self.translation().norm() <= tolerance && self.rotation().angle() <= tolerance
    }
}

impl XmlObject for UrdfPose {
    const TAG: &'static str = "origin";
    const FIELDS: &'static [FieldDescriptor] = &[
        FieldDescriptor::optional_attribute("xyz", Primitive::Vector3),
        FieldDescriptor::optional_attribute("rpy", Primitive::Vector3),
    ];

    fn from_fields(fields: &mut FieldSet<'_>) -> Result<Self> {
        let pose = Self {
            xyz: fields.optional_value("xyz")?,
            rpy: fields.optional_value("rpy")?,
        };
        if pose.xyz.is_none() && pose.rpy.is_none() {
            return Err(UrdfError::invalid_element(
                fields.element_name(),
                "pose needs at least one of xyz or rpy",
            ));
        }
        Ok(pose)
    }

    fn to_fields(&self, out: &mut FieldWriter<'_>) -> Result<()> {
        if self.xyz.is_none() && self.rpy.is_none() {
            return Err(UrdfError::invalid_element(
                Self::TAG,
                "pose needs at least one of xyz or rpy",
            ));
        }
        out.optional_value("xyz", self.xyz);
        out.optional_value("rpy", self.rpy);
        Ok(())
    }
}

// ============================================================================
// Materials
// ============================================================================

/// Colour from a `<color rgba="..."/>` element.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct UrdfColor {
    /// Red, green, blue, alpha in `[0, 1]`.
    pub rgba: Vector4<f64>,
}

impl UrdfColor {
    /// Create a colour from its components.
    #[must_use]
    pub fn new(r: f64, g: f64, b: f64, a: f64) -> Self {
        Self {
            rgba: Vector4::new(r, g, b, a),
        }
    }
}

impl XmlObject for UrdfColor {
    const TAG: &'static str = "color";
    const FIELDS: &'static [FieldDescriptor] =
        &[FieldDescriptor::attribute("rgba", Primitive::Rgba)];

    fn from_fields(fields: &mut FieldSet<'_>) -> Result<Self> {
        Ok(Self {
            rgba: fields.value("rgba")?,
        })
    }

    fn to_fields(&self, out: &mut FieldWriter<'_>) -> Result<()> {
        out.value("rgba", self.rgba);
        Ok(())
    }
}

/// Texture image reference.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct UrdfTexture {
    /// Image URI.
    pub filename: String,
}

impl XmlObject for UrdfTexture {
    const TAG: &'static str = "texture";
    const FIELDS: &'static [FieldDescriptor] =
        &[FieldDescriptor::attribute("filename", Primitive::Text)];

    fn from_fields(fields: &mut FieldSet<'_>) -> Result<Self> {
        Ok(Self {
            filename: fields.value("filename")?,
        })
    }

    fn to_fields(&self, out: &mut FieldWriter<'_>) -> Result<()> {
        out.value("filename", self.filename.clone());
        Ok(())
    }
}

/// Material from a `<material>` element.
///
/// Inside a visual, a material with neither colour nor texture refers to a
/// robot-level material of the same name.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct UrdfMaterial {
    /// Material name.
    pub name: String,
    /// Flat colour.
    pub color: Option<UrdfColor>,
    /// Texture image.
    pub texture: Option<UrdfTexture>,
}

impl UrdfMaterial {
    /// A material that only names another one.
    #[must_use]
    pub fn reference(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            color: None,
            texture: None,
        }
    }

    /// Set the colour.
    #[must_use]
    pub fn with_color(mut self, color: UrdfColor) -> Self {
        self.color = Some(color);
        self
    }

    /// Whether a colour or texture is defined.
    #[must_use]
    pub fn has_appearance(&self) -> bool {
        self.color.is_some() || self.texture.is_some()
    }
}

impl XmlObject for UrdfMaterial {
    const TAG: &'static str = "material";
    const FIELDS: &'static [FieldDescriptor] = &[
        FieldDescriptor::attribute("name", Primitive::Text),
        FieldDescriptor::optional_element("color", ValueType::Object),
        FieldDescriptor::optional_element("texture", ValueType::Object),
    ];

    fn from_fields(fields: &mut FieldSet<'_>) -> Result<Self> {
        Ok(Self {
            name: fields.value("name")?,
            color: fields.optional_object("color")?,
            texture: fields.optional_object("texture")?,
        })
    }

    fn to_fields(&self, out: &mut FieldWriter<'_>) -> Result<()> {
        out.value("name", self.name.clone());
        out.optional_object("color", self.color.as_ref())?;
        out.optional_object("texture", self.texture.as_ref())
    }
}

// ============================================================================
// Visual and Collision
// ============================================================================

/// Visual properties from `<visual>` element.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct UrdfVisual {
    /// Optional name.
    pub name: Option<String>,
    /// Origin relative to link frame.
    pub origin: Option<UrdfPose>,
    /// Geometry shape.
    pub geometry: UrdfGeometry,
    /// Inline material or reference to a robot-level one.
    pub material: Option<UrdfMaterial>,
}

impl UrdfVisual {
    /// Create an unnamed visual at the link origin.
    #[must_use]
    pub fn new(geometry: UrdfGeometry) -> Self {
        Self {
            name: None,
            origin: None,
            geometry,
            material: None,
        }
    }

    /// Set the material.
    #[must_use]
    pub fn with_material(mut self, material: UrdfMaterial) -> Self {
        self.material = Some(material);
        self
    }

    fn from_collision(collision: &UrdfCollision) -> Self {
        Self {
            name: collision.name.clone(),
            origin: collision.origin,
            geometry: collision.geometry.clone(),
            material: None,
        }
    }
}

impl XmlObject for UrdfVisual {
    const TAG: &'static str = "visual";
    const FIELDS: &'static [FieldDescriptor] = &[
        FieldDescriptor::optional_attribute("name", Primitive::Text),
        ORIGIN_FIELD,
        GEOMETRY_FIELD,
        FieldDescriptor::optional_element("material", ValueType::Object),
    ];

    fn from_fields(fields: &mut FieldSet<'_>) -> Result<Self> {
        Ok(Self {
            name: fields.optional_value("name")?,
            origin: fields.optional_object("origin")?,
            geometry: fields.geometry("geometry")?,
            material: fields.optional_object("material")?,
        })
    }

    fn to_fields(&self, out: &mut FieldWriter<'_>) -> Result<()> {
        out.optional_value("name", self.name.clone());
        out.optional_object("origin", self.origin.as_ref())?;
        out.geometry("geometry", &self.geometry)?;
        out.optional_object("material", self.material.as_ref())
    }
}

/// Collision properties from `<collision>` element.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct UrdfCollision {
    /// Optional name.
    pub name: Option<String>,
    /// Origin relative to link frame.
    pub origin: Option<UrdfPose>,
    /// Geometry shape.
    pub geometry: UrdfGeometry,
}

impl UrdfCollision {
    /// Create an unnamed collision shape at the link origin.
    #[must_use]
    pub fn new(geometry: UrdfGeometry) -> Self {
        Self {
            name: None,
            origin: None,
            geometry,
        }
    }

    fn from_visual(visual: &UrdfVisual) -> Self {
        Self {
            name: visual.name.clone(),
            origin: visual.origin,
            geometry: visual.geometry.clone(),
        }
    }
}

impl XmlObject for UrdfCollision {
    const TAG: &'static str = "collision";
    const FIELDS: &'static [FieldDescriptor] = &[
        FieldDescriptor::optional_attribute("name", Primitive::Text),
        ORIGIN_FIELD,
        GEOMETRY_FIELD,
    ];

    fn from_fields(fields: &mut FieldSet<'_>) -> Result<Self> {
        Ok(Self {
            name: fields.optional_value("name")?,
            origin: fields.optional_object("origin")?,
            geometry: fields.geometry("geometry")?,
        })
    }

    fn to_fields(&self, out: &mut FieldWriter<'_>) -> Result<()> {
        out.optional_value("name", self.name.clone());
        out.optional_object("origin", self.origin.as_ref())?;
        out.geometry("geometry", &self.geometry)
    }
}

// ============================================================================
// Inertial Properties
// ============================================================================

/// Inertia tensor from URDF.
///
/// URDF specifies the upper-triangular elements of the symmetric inertia tensor.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct UrdfInertia {
    /// Moment of inertia about X axis.
    pub ixx: f64,
    /// Product of inertia XY.
    pub ixy: f64,
    /// Product of inertia XZ.
    pub ixz: f64,
    /// Moment of inertia about Y axis.
    pub iyy: f64,
    /// Product of inertia YZ.
    pub iyz: f64,
    /// Moment of inertia about Z axis.
    pub izz: f64,
}

impl UrdfInertia {
    /// Create a diagonal inertia tensor.
    #[must_use]
    pub fn diagonal(ixx: f64, iyy: f64, izz: f64) -> Self {
        Self {
            ixx,
            ixy: 0.0,
            ixz: 0.0,
            iyy,
            iyz: 0.0,
            izz,
        }
    }

    /// Convert to a 3x3 matrix.
    #[must_use]
    pub fn to_matrix(&self) -> Matrix3<f64> {
        Matrix3::new(
            self.ixx, self.ixy, self.ixz, self.ixy, self.iyy, self.iyz, self.ixz, self.iyz,
            self.izz,
        )
    }
}

impl XmlObject for UrdfInertia {
    const TAG: &'static str = "inertia";
    const FIELDS: &'static [FieldDescriptor] = &[
        FieldDescriptor::attribute("ixx", Primitive::Float),
        FieldDescriptor::attribute("ixy", Primitive::Float),
        FieldDescriptor::attribute("ixz", Primitive::Float),
        FieldDescriptor::attribute("iyy", Primitive::Float),
        FieldDescriptor::attribute("iyz", Primitive::Float),
        FieldDescriptor::attribute("izz", Primitive::Float),
    ];

    fn from_fields(fields: &mut FieldSet<'_>) -> Result<Self> {
        Ok(Self {
            ixx: fields.value("ixx")?,
            ixy: fields.value("ixy")?,
            ixz: fields.value("ixz")?,
            iyy: fields.value("iyy")?,
            iyz: fields.value("iyz")?,
            izz: fields.value("izz")?,
        })
    }

    fn to_fields(&self, out: &mut FieldWriter<'_>) -> Result<()> {
        out.value("ixx", self.ixx);
        out.value("ixy", self.ixy);
        out.value("ixz", self.ixz);
        out.value("iyy", self.iyy);
        out.value("iyz", self.iyz);
        out.value("izz", self.izz);
        Ok(())
    }
}

/// Inertial properties from `<inertial>` element.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct UrdfInertial {
    /// Origin of the inertial frame relative to link frame.
    pub origin: Option<UrdfPose>,
    /// Mass in kg, from `<mass value="..."/>`.
    pub mass: f64,
    /// Inertia tensor.
    pub inertia: Option<UrdfInertia>,
}

impl UrdfInertial {
    /// Create inertial properties with given mass only.
    #[must_use]
    pub fn with_mass(mass: f64) -> Self {
        Self {
            origin: None,
            mass,
            inertia: None,
        }
    }
}

impl XmlObject for UrdfInertial {
    const TAG: &'static str = "inertial";
    const FIELDS: &'static [FieldDescriptor] = &[
        ORIGIN_FIELD,
        FieldDescriptor::element("mass", ValueType::Alias("element_value")),
        FieldDescriptor::optional_element("inertia", ValueType::Object),
    ];

    fn from_fields(fields: &mut FieldSet<'_>) -> Result<Self> {
        Ok(Self {
            origin: fields.optional_object("origin")?,
            mass: fields.value("mass")?,
            inertia: fields.optional_object("inertia")?,
        })
    }

    fn to_fields(&self, out: &mut FieldWriter<'_>) -> Result<()> {
        out.optional_object("origin", self.origin.as_ref())?;
        out.value("mass", self.mass);
        out.optional_object("inertia", self.inertia.as_ref())
    }
}

// ============================================================================
// Link
// ============================================================================

/// A link (rigid body) from `<link>` element.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct UrdfLink {
    /// Link name (required, must be unique).
    pub name: String,
    /// Link frame offset.
    pub origin: Option<UrdfPose>,
    /// Inertial properties (optional for massless/fixed links).
    pub inertial: Option<UrdfInertial>,
    /// Visual geometry.
    pub visual: Option<UrdfVisual>,
    /// Collision geometry.
    pub collision: Option<UrdfCollision>,
}

impl UrdfLink {
    /// Create a new link with just a name.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            origin: None,
            inertial: None,
            visual: None,
            collision: None,
        }
    }

    /// Set inertial properties.
    #[must_use]
    pub fn with_inertial(mut self, inertial: UrdfInertial) -> Self {
        self.inertial = Some(inertial);
        self
    }

    /// Set the visual geometry.
    #[must_use]
    pub fn with_visual(mut self, visual: UrdfVisual) -> Self {
        self.visual = Some(visual);
        self
    }

    /// Set the collision geometry.
    #[must_use]
    pub fn with_collision(mut self, collision: UrdfCollision) -> Self {
        self.collision = Some(collision);
        self
    }

    /// Check if this is a massless/fixed link.
    #[must_use]
    pub fn is_massless(&self) -> bool {
        self.inertial.is_none()
    }

    /// Copy the visual to the collision slot or the other way round when
    /// only one of them is set.
    pub fn mirror_geometry(&mut self) {
        if self.collision.is_none() {
            self.collision = self.visual.as_ref().map(UrdfCollision::from_visual);
        } else if self.visual.is_none() {
            self.visual = self.collision.as_ref().map(UrdfVisual::from_collision);
        }
    }
}

impl XmlObject for UrdfLink {
    const TAG: &'static str = "link";
    const FIELDS: &'static [FieldDescriptor] = &[
        FieldDescriptor::attribute("name", Primitive::Text),
        ORIGIN_FIELD,
        FieldDescriptor::optional_element("inertial", ValueType::Object),
        FieldDescriptor::optional_element("visual", ValueType::Object),
        FieldDescriptor::optional_element("collision", ValueType::Object),
    ];

    fn from_fields(fields: &mut FieldSet<'_>) -> Result<Self> {
        Ok(Self {
            name: fields.value("name")?,
            origin: fields.optional_object("origin")?,
            inertial: fields.optional_object("inertial")?,
            visual: fields.optional_object("visual")?,
            collision: fields.optional_object("collision")?,
        })
    }

    fn to_fields(&self, out: &mut FieldWriter<'_>) -> Result<()> {
        out.value("name", self.name.clone());
        out.optional_object("origin", self.origin.as_ref())?;
        out.optional_object("inertial", self.inertial.as_ref())?;
        out.optional_object("visual", self.visual.as_ref())?;
        out.optional_object("collision", self.collision.as_ref())
    }
}

// ============================================================================
// Joint
// ============================================================================

/// Joint type from URDF.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum UrdfJointType {
    /// Placeholder type with no motion.
    Unknown,
    /// Revolute joint with limits.
    Revolute,
    /// Continuous (unlimited revolute) joint.
    Continuous,
    /// Prismatic (sliding) joint.
    Prismatic,
    /// Floating (6-DOF) joint.
    Floating,
    /// Planar (2D translation + rotation) joint.
    Planar,
    /// Fixed (welded) joint.
    Fixed,
}

impl UrdfJointType {
    /// All joint types.
    pub const ALL: [Self; 7] = [
        Self::Unknown,
        Self::Revolute,
        Self::Continuous,
        Self::Prismatic,
        Self::Floating,
        Self::Planar,
        Self::Fixed,
    ];

    /// The `type` attribute value.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Unknown => "unknown",
            Self::Revolute => "revolute",
            Self::Continuous => "continuous",
            Self::Prismatic => "prismatic",
            Self::Floating => "floating",
            Self::Planar => "planar",
            Self::Fixed => "fixed",
        }
    }

    /// Get degrees of freedom for this joint type.
    #[must_use]
    pub fn dof(self) -> usize {
        match self {
            Self::Unknown | Self::Fixed => 0,
            Self::Revolute | Self::Continuous | Self::Prismatic => 1,
            Self::Planar => 3,
            Self::Floating => 6,
        }
    }
}

impl FromStr for UrdfJointType {
    type Err = UrdfError;

    fn from_str(s: &str) -> Result<Self> {
        Self::ALL
            .into_iter()
            .find(|t| t.as_str() == s)
            .ok_or_else(|| UrdfError::InvalidJointType(s.to_string()))
    }
}

impl fmt::Display for UrdfJointType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Joint limits from `<limit>` element.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct UrdfJointLimit {
    /// Maximum effort (N or Nm).
    pub effort: f64,
    /// Lower position limit (rad or m).
    pub lower: f64,
    /// Upper position limit (rad or m).
    pub upper: f64,
    /// Maximum velocity (rad/s or m/s).
    pub velocity: f64,
}

impl UrdfJointLimit {
    /// Create symmetric limits.
    #[must_use]
    pub fn symmetric(limit: f64, effort: f64, velocity: f64) -> Self {
        Self {
            effort,
            lower: -limit,
            upper: limit,
            velocity,
        }
    }
}

impl XmlObject for UrdfJointLimit {
    const TAG: &'static str = "limit";
    const FIELDS: &'static [FieldDescriptor] = &[
        FieldDescriptor::attribute("effort", Primitive::Float),
        FieldDescriptor::attribute_or("lower", Primitive::Float, "0"),
        FieldDescriptor::attribute_or("upper", Primitive::Float, "0"),
        FieldDescriptor::attribute("velocity", Primitive::Float),
    ];

    fn from_fields(fields: &mut FieldSet<'_>) -> Result<Self> {
        Ok(Self {
            effort: fields.value("effort")?,
            lower: fields.value("lower")?,
            upper: fields.value("upper")?,
            velocity: fields.value("velocity")?,
        })
    }

    fn to_fields(&self, out: &mut FieldWriter<'_>) -> Result<()> {
        out.value("effort", self.effort);
        out.value("lower", self.lower);
        out.value("upper", self.upper);
        out.value("velocity", self.velocity);
        Ok(())
    }
}

/// Joint dynamics from `<dynamics>` element.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct UrdfJointDynamics {
    /// Viscous damping coefficient.
    pub damping: Option<f64>,
    /// Static friction (Coulomb).
    pub friction: Option<f64>,
}

impl XmlObject for UrdfJointDynamics {
    const TAG: &'static str = "dynamics";
    const FIELDS: &'static [FieldDescriptor] = &[
        FieldDescriptor::optional_attribute("damping", Primitive::Float),
        FieldDescriptor::optional_attribute("friction", Primitive::Float),
    ];

    fn from_fields(fields: &mut FieldSet<'_>) -> Result<Self> {
        Ok(Self {
            damping: fields.optional_value("damping")?,
            friction: fields.optional_value("friction")?,
        })
    }

    fn to_fields(&self, out: &mut FieldWriter<'_>) -> Result<()> {
        out.optional_value("damping", self.damping);
        out.optional_value("friction", self.friction);
        Ok(())
    }
}

/// Soft limits from `<safety_controller>`.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct UrdfSafetyController {
    /// Velocity gain.
    pub k_velocity: f64,
    /// Position gain.
    pub k_position: f64,
    /// Soft lower position bound.
    pub soft_lower_limit: f64,
    /// Soft upper position bound.
    pub soft_upper_limit: f64,
}

impl XmlObject for UrdfSafetyController {
    const TAG: &'static str = "safety_controller";
    const FIELDS: &'static [FieldDescriptor] = &[
        FieldDescriptor::attribute("k_velocity", Primitive::Float),
        FieldDescriptor::attribute_or("k_position", Primitive::Float, "0"),
        FieldDescriptor::attribute_or("soft_lower_limit", Primitive::Float, "0"),
        FieldDescriptor::attribute_or("soft_upper_limit", Primitive::Float, "0"),
    ];

    fn from_fields(fields: &mut FieldSet<'_>) -> Result<Self> {
        Ok(Self {
            k_velocity: fields.value("k_velocity")?,
            k_position: fields.value("k_position")?,
            soft_lower_limit: fields.value("soft_lower_limit")?,
            soft_upper_limit: fields.value("soft_upper_limit")?,
        })
    }

    fn to_fields(&self, out: &mut FieldWriter<'_>) -> Result<()> {
        out.value("k_velocity", self.k_velocity);
        out.value("k_position", self.k_position);
        out.value("soft_lower_limit", self.soft_lower_limit);
        out.value("soft_upper_limit", self.soft_upper_limit);
        Ok(())
    }
}

/// Reference edges from `<calibration>`.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct UrdfJointCalibration {
    /// Position of the rising edge.
    pub rising: Option<f64>,
    /// Position of the falling edge.
    pub falling: Option<f64>,
}

impl XmlObject for UrdfJointCalibration {
    const TAG: &'static str = "calibration";
    const FIELDS: &'static [FieldDescriptor] = &[
        FieldDescriptor::optional_attribute("rising", Primitive::Float),
        FieldDescriptor::optional_attribute("falling", Primitive::Float),
    ];

    fn from_fields(fields: &mut FieldSet<'_>) -> Result<Self> {
        Ok(Self {
            rising: fields.optional_value("rising")?,
            falling: fields.optional_value("falling")?,
        })
    }

    fn to_fields(&self, out: &mut FieldWriter<'_>) -> Result<()> {
        out.optional_value("rising", self.rising);
        out.optional_value("falling", self.falling);
        Ok(())
    }
}

/// Coupling to another joint from `<mimic>`.
///
/// Position is `multiplier * other + offset`.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct UrdfJointMimic {
    /// Joint being followed.
    pub joint: String,
    /// Scale factor.
    pub multiplier: Option<f64>,
    /// Position offset.
    pub offset: Option<f64>,
}

impl XmlObject for UrdfJointMimic {
    const TAG: &'static str = "mimic";
    const FIELDS: &'static [FieldDescriptor] = &[
        FieldDescriptor::attribute("joint", Primitive::Text),
        FieldDescriptor::optional_attribute("multiplier", Primitive::Float),
        FieldDescriptor::optional_attribute("offset", Primitive::Float),
    ];

    fn from_fields(fields: &mut FieldSet<'_>) -> Result<Self> {
        Ok(Self {
            joint: fields.value("joint")?,
            multiplier: fields.optional_value("multiplier")?,
            offset: fields.optional_value("offset")?,
        })
    }

    fn to_fields(&self, out: &mut FieldWriter<'_>) -> Result<()> {
        out.value("joint", self.joint.clone());
        out.optional_value("multiplier", self.multiplier);
        out.optional_value("offset", self.offset);
        Ok(())
    }
}

/// A joint connecting two links.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct UrdfJoint {
    /// Joint name (required, must be unique).
    pub name: String,
    /// Joint type.
    pub joint_type: UrdfJointType,
    /// Parent link name.
    pub parent: String,
    /// Child link name.
    pub child: String,
    /// Origin of joint frame relative to parent link frame.
    pub origin: Option<UrdfPose>,
    /// Joint axis in joint frame.
    pub axis: Option<Vector3<f64>>,
    /// Joint limits.
    pub limit: Option<UrdfJointLimit>,
    /// Joint dynamics.
    pub dynamics: Option<UrdfJointDynamics>,
    /// Safety controller.
    pub safety_controller: Option<UrdfSafetyController>,
    /// Calibration edges.
    pub calibration: Option<UrdfJointCalibration>,
    /// Mimic coupling.
    pub mimic: Option<UrdfJointMimic>,
}

impl UrdfJoint {
    /// Create a new joint.
    #[must_use]
    pub fn new(
        name: impl Into<String>,
        joint_type: UrdfJointType,
        parent: impl Into<String>,
        child: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            joint_type,
            parent: parent.into(),
            child: child.into(),
            origin: None,
            axis: None,
            limit: None,
            dynamics: None,
            safety_controller: None,
            calibration: None,
            mimic: None,
        }
    }

    /// Set the joint origin.
    #[must_use]
    pub fn with_origin(mut self, origin: UrdfPose) -> Self {
        self.origin = Some(origin);
        self
    }

    /// Set the joint axis.
    #[must_use]
    pub fn with_axis(mut self, axis: Vector3<f64>) -> Self {
        self.axis = Some(safe_normalize_axis(axis));
        self
    }

    /// Set the joint limits.
    #[must_use]
    pub fn with_limit(mut self, limit: UrdfJointLimit) -> Self {
        self.limit = Some(limit);
        self
    }

    /// Set the joint dynamics.
    #[must_use]
    pub fn with_dynamics(mut self, dynamics: UrdfJointDynamics) -> Self {
        self.dynamics = Some(dynamics);
        self
    }

    /// Set the mimic coupling.
    #[must_use]
    pub fn with_mimic(mut self, mimic: UrdfJointMimic) -> Self {
        self.mimic = Some(mimic);
        self
    }

    /// Axis, defaulting to +z when omitted.
    #[must_use]
    pub fn axis_or_default(&self) -> Vector3<f64> {
        self.axis.unwrap_or_else(Vector3::z)
    }

    /// Whether the joint places its child exactly on the parent frame.
    #[must_use]
    pub fn is_identity(&self, tolerance: f64) -> bool {
        self.origin.is_none_or(|origin| origin.is_identity(tolerance))
    }
}

impl XmlObject for UrdfJoint {
    const TAG: &'static str = "joint";
    const FIELDS: &'static [FieldDescriptor] = &[
        FieldDescriptor::attribute("name", Primitive::Text),
        FieldDescriptor::attribute("type", Primitive::Text),
        ORIGIN_FIELD,
        FieldDescriptor::optional_element("axis", ValueType::Alias("element_xyz")),
        FieldDescriptor::element("parent", ValueType::Alias("element_link")),
        FieldDescriptor::element("child", ValueType::Alias("element_link")),
        FieldDescriptor::optional_element("limit", ValueType::Object),
        FieldDescriptor::optional_element("dynamics", ValueType::Object),
        FieldDescriptor::optional_element("safety_controller", ValueType::Object),
        FieldDescriptor::optional_element("calibration", ValueType::Object),
        FieldDescriptor::optional_element("mimic", ValueType::Object),
    ];

    fn from_fields(fields: &mut FieldSet<'_>) -> Result<Self> {
        let joint_type: String = fields.value("type")?;
        Ok(Self {
            name: fields.value("name")?,
            joint_type: joint_type.parse()?,
            parent: fields.value("parent")?,
            child: fields.value("child")?,
            origin: fields.optional_object("origin")?,
            axis: fields.optional_value("axis")?,
            limit: fields.optional_object("limit")?,
            dynamics: fields.optional_object("dynamics")?,
            safety_controller: fields.optional_object("safety_controller")?,
            calibration: fields.optional_object("calibration")?,
            mimic: fields.optional_object("mimic")?,
        })
    }

    fn to_fields(&self, out: &mut FieldWriter<'_>) -> Result<()> {
        out.value("name", self.name.clone());
        out.value("type", self.joint_type.as_str().to_string());
        out.optional_object("origin", self.origin.as_ref())?;
        out.optional_value("axis", self.axis);
        out.value("parent", self.parent.clone());
        out.value("child", self.child.clone());
        out.optional_object("limit", self.limit.as_ref())?;
        out.optional_object("dynamics", self.dynamics.as_ref())?;
        out.optional_object("safety_controller", self.safety_controller.as_ref())?;
        out.optional_object("calibration", self.calibration.as_ref())?;
        out.optional_object("mimic", self.mimic.as_ref())
    }
}
