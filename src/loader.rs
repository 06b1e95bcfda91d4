//! Loading URDF documents from files and strings, and writing them back.

use std::fs;
use std::path::Path;

use crate::error::{Result, UrdfError};
use crate::kinematics::{BuildStep, DEFAULT_IDENTITY_TOLERANCE};
use crate::registry::TypeRegistry;
use crate::robot::UrdfRobot;
use crate::scene::{SceneBuilder, build_scene_with_tolerance};
use crate::schema::{XmlObject, read_object, write_object};
use crate::xml::{parse_document, write_document};

/// URDF loader with configuration options.
#[derive(Debug, Clone)]
pub struct UrdfLoader {
    /// Type registry used to decode aliased fields (default: URDF dialect).
    pub registry: TypeRegistry,
    /// Copy a link's visual into an empty collision slot and vice versa
    /// (default: false).
    pub mirror_geometry: bool,
    /// Tolerance below which a joint origin counts as the identity
    /// (default: 1e-9).
    pub identity_tolerance: f64,
}

impl Default for UrdfLoader {
    fn default() -> Self {
        Self {
            registry: TypeRegistry::urdf(),
            mirror_geometry: false,
            identity_tolerance: DEFAULT_IDENTITY_TOLERANCE,
        }
    }
}

impl UrdfLoader {
    /// Create a new loader with default settings.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Use a different type registry.
    #[must_use]
    pub fn with_registry(mut self, registry: TypeRegistry) -> Self {
        self.registry = registry;
        self
    }

    /// Set whether single-sided link geometry is mirrored.
    #[must_use]
    pub fn with_mirror_geometry(mut self, mirror: bool) -> Self {
        self.mirror_geometry = mirror;
        self
    }

    /// Set the identity tolerance used for merge flags.
    #[must_use]
    pub fn with_identity_tolerance(mut self, tolerance: f64) -> Self {
        self.identity_tolerance = tolerance;
        self
    }

    /// Load URDF from a file path.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn load_file(&self, path: impl AsRef<Path>) -> Result<UrdfRobot> {
        let content = fs::read_to_string(path)?;
        self.load_str(&content)
    }

    /// Load URDF from a string.
    ///
    /// # Errors
    ///
    /// Returns an error if the XML is malformed, the root element is not
    /// `<robot>`, or any element fails to decode.
    pub fn load_str(&self, xml: &str) -> Result<UrdfRobot> {
        let mut robot = parse_with_registry(xml, &self.registry)?;
        if self.mirror_geometry {
            robot.mirror_geometry();
        }
        Ok(robot)
    }

    /// Serialize a robot to URDF XML.
    ///
    /// # Errors
    ///
    /// Returns an error if a field cannot be written.
    pub fn to_string(&self, robot: &UrdfRobot) -> Result<String> {
        let node = write_object(robot, UrdfRobot::TAG, &self.registry)?;
        write_document(&node)
    }

    /// Build order using this loader's identity tolerance.
    ///
    /// # Errors
    ///
    /// See [`UrdfRobot::build_order_with_tolerance`].
    pub fn build_order(&self, robot: &UrdfRobot) -> Result<Vec<BuildStep>> {
        robot.build_order_with_tolerance(self.identity_tolerance)
    }

    /// Drive a scene builder using this loader's identity tolerance.
    ///
    /// # Errors
    ///
    /// Returns the first topology error or builder error.
    pub fn build_scene<B: SceneBuilder>(
        &self,
        robot: &UrdfRobot,
        builder: &mut B,
    ) -> std::result::Result<Vec<BuildStep>, B::Error> {
        build_scene_with_tolerance(robot, builder, self.identity_tolerance)
    }
}

fn parse_with_registry(xml: &str, registry: &TypeRegistry) -> Result<UrdfRobot> {
    let root = parse_document(xml)?;
    if root.name != UrdfRobot::TAG {
        return Err(UrdfError::UnknownElement {
            element: root.name,
            context: "document root".to_string(),
        });
    }
    read_object(&root, registry)
}

/// Parse a URDF string with the default registry and no post-processing.
///
/// # Errors
///
/// Returns an error if the XML is malformed or any element fails to decode.
pub fn parse_urdf_str(xml: &str) -> Result<UrdfRobot> {
    parse_with_registry(xml, &TypeRegistry::urdf())
}

/// Load a URDF file with default settings.
///
/// # Errors
///
/// Returns an error if the file cannot be read or parsed.
pub fn load_urdf_file(path: impl AsRef<Path>) -> Result<UrdfRobot> {
    UrdfLoader::new().load_file(path)
}

/// Load a URDF string with default settings.
///
/// # Errors
///
/// Returns an error if parsing fails.
pub fn load_urdf_str(xml: &str) -> Result<UrdfRobot> {
    UrdfLoader::new().load_str(xml)
}

/// Serialize a robot with default settings.
///
/// # Errors
///
/// Returns an error if a field cannot be written.
pub fn write_urdf_string(robot: &UrdfRobot) -> Result<String> {
    UrdfLoader::new().to_string(robot)
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use std::io::Write;

    const TWO_LINK: &str = r#"<?xml version="1.0"?>
<robot name="two_link">
    <link name="base">
        <collision>
            <geometry><box size="0.2 0.2 0.1"/></geometry>
        </collision>
    </link>
    <link name="arm">
        <visual>
            <geometry><cylinder radius="0.02" length="0.4"/></geometry>
        </visual>
    </link>
    <joint name="shoulder" type="revolute">
        <parent link="base"/>
        <child link="arm"/>
        <limit effort="5" velocity="1" lower="-1" upper="1"/>
    </joint>
</robot>
"#;

    #[test]
    fn test_load_file() {
        let mut file = tempfile::NamedTempFile::new().expect("Failed to create temp file");
        file.write_all(TWO_LINK.as_bytes()).unwrap();

        let robot = load_urdf_file(file.path()).expect("should load");
        assert_eq!(robot.name(), Some("two_link"));
        assert_eq!(robot.get_root().expect("root"), "base");
    }

    #[test]
    fn test_missing_file_is_io_error() {
        let dir = tempfile::tempdir().expect("Failed to create temp dir");
        let err = load_urdf_file(dir.path().join("nope.urdf")).unwrap_err();
        assert!(matches!(err, UrdfError::Io(_)));
    }

    #[test]
    fn test_malformed_xml() {
        let err = load_urdf_str("<robot><link name='a'></robot>").unwrap_err();
        assert!(matches!(err, UrdfError::XmlParse(_)));
    }

    #[test]
    fn test_root_must_be_robot() {
        let err = load_urdf_str(r#"<model name="x"/>"#).unwrap_err();
        assert!(matches!(err, UrdfError::UnknownElement { element, .. } if element == "model"));
    }

    #[test]
    fn test_mirror_geometry_option() {
        let plain = load_urdf_str(TWO_LINK).expect("load");
        assert!(plain.link("base").and_then(|l| l.visual.as_ref()).is_none());

        let mirrored = UrdfLoader::new()
            .with_mirror_geometry(true)
            .load_str(TWO_LINK)
            .expect("load");
        assert!(mirrored.link("base").and_then(|l| l.visual.as_ref()).is_some());
        assert!(mirrored.link("arm").and_then(|l| l.collision.as_ref()).is_some());
    }

    #[test]
    fn test_write_then_parse() {
        let robot = parse_urdf_str(TWO_LINK).expect("parse");
        let xml = write_urdf_string(&robot).expect("write");
        assert!(xml.starts_with("<?xml"));
        assert!(xml.contains(r#"<robot name="two_link">"#));
        assert_eq!(parse_urdf_str(&xml).expect("reparse"), robot);
    }

    #[test]
    fn test_loader_tolerance() {
        let xml = r#"
            <robot name="t">
                <link name="a"/><link name="b"/>
                <joint name="j" type="fixed">
                    <origin xyz="0 0 0.001"/>
                    <parent link="a"/><child link="b"/>
                </joint>
            </robot>
        "#;
        let robot = load_urdf_str(xml).expect("load");
        assert!(!UrdfLoader::new().build_order(&robot).expect("order")[0].merge_into_parent);

        let coarse = UrdfLoader::new().with_identity_tolerance(0.01);
        assert!(coarse.build_order(&robot).expect("order")[0].merge_into_parent);
    }
}
