//! The robot document and its link/joint indices.
//!
//! Links, joints, materials and transmissions are kept in declaration order.
//! Name indices and the parent/child maps are updated as each entity is
//! added, so structural errors such as a duplicated link name or a link
//! claimed by two joints surface while the document is read. Topology errors
//! (no root, several roots, loops) are only reported by the queries that need
//! a tree.

use std::collections::{HashMap, HashSet};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::error::{Result, UrdfError, UrdfWarning};
use crate::schema::{
    Decoded, FieldDescriptor, FieldSet, FieldWriter, ValueType, XmlObject, read_object,
};
use crate::transmission::UrdfTransmission;
use crate::types::{UrdfJoint, UrdfJointType, UrdfLink, UrdfMaterial};
use crate::value::Primitive;
use crate::xml::XmlNode;

/// The joint attaching a link to its parent.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct ParentRef {
    /// Joint name.
    pub joint: String,
    /// Parent link name.
    pub parent: String,
}

/// A joint leading from a link to one of its children.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct ChildRef {
    /// Joint name.
    pub joint: String,
    /// Child link name.
    pub child: String,
}

/// What [`UrdfRobot::get_chain`] includes in its result.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChainFilter {
    /// Include joint names.
    pub joints: bool,
    /// Include link names.
    pub links: bool,
    /// Include fixed joints (only relevant when `joints` is set).
    pub fixed: bool,
}

impl Default for ChainFilter {
    fn default() -> Self {
        Self {
            joints: true,
            links: true,
            fixed: true,
        }
    }
}

impl ChainFilter {
    /// Links only.
    #[must_use]
    pub fn links_only() -> Self {
        Self {
            joints: false,
            ..Self::default()
        }
    }

    /// Movable joints only.
    #[must_use]
    pub fn movable_joints() -> Self {
        Self {
            joints: true,
            links: false,
            fixed: false,
        }
    }
}

/// A complete URDF robot model.
#[derive(Debug, Clone, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct UrdfRobot {
    name: Option<String>,
    links: Vec<UrdfLink>,
    joints: Vec<UrdfJoint>,
    materials: Vec<UrdfMaterial>,
    transmissions: Vec<UrdfTransmission>,
    extensions: Vec<XmlNode>,
    link_map: HashMap<String, usize>,
    joint_map: HashMap<String, usize>,
    material_map: HashMap<String, usize>,
    parent_map: HashMap<String, ParentRef>,
    child_map: HashMap<String, Vec<ChildRef>>,
    #[cfg_attr(feature = "serde", serde(skip))]
    warnings: Vec<UrdfWarning>,
}

impl UrdfRobot {
    /// Create an empty robot with a name.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
            ..Self::default()
        }
    }

    /// Add a link.
    ///
    /// # Errors
    ///
    /// Returns [`UrdfError::DuplicateName`] if a link with the same name exists.
    pub fn add_link(&mut self, link: UrdfLink) -> Result<()> {
        if self.link_map.contains_key(&link.name) {
            return Err(UrdfError::duplicate_name("link", link.name));
        }
        self.link_map.insert(link.name.clone(), self.links.len());
        self.links.push(link);
        Ok(())
    }

    /// Add a joint and record it in the parent and child maps.
    ///
    /// The linked links need not be declared yet; see [`UrdfRobot::validate`].
    ///
    /// # Errors
    ///
    /// Returns [`UrdfError::DuplicateName`] if a joint with the same name
    /// exists, or [`UrdfError::DuplicateChild`] if the child link already has
    /// a parent joint.
    pub fn add_joint(&mut self, joint: UrdfJoint) -> Result<()> {
        if self.joint_map.contains_key(&joint.name) {
            return Err(UrdfError::duplicate_name("joint", joint.name));
        }
        if let Some(existing) = self.parent_map.get(&joint.child) {
            return Err(UrdfError::DuplicateChild {
                child: joint.child,
                existing: existing.joint.clone(),
                joint: joint.name,
            });
        }

        self.parent_map.insert(
            joint.child.clone(),
            ParentRef {
                joint: joint.name.clone(),
                parent: joint.parent.clone(),
            },
        );
        self.child_map
            .entry(joint.parent.clone())
            .or_default()
            .push(ChildRef {
                joint: joint.name.clone(),
                child: joint.child.clone(),
            });
        self.joint_map.insert(joint.name.clone(), self.joints.len());
        self.joints.push(joint);
        Ok(())
    }

    /// Add a robot-level material.
    ///
    /// A repeated name keeps the first definition for lookups.
    pub fn add_material(&mut self, material: UrdfMaterial) {
        if self.material_map.contains_key(&material.name) {
            tracing::debug!(material = %material.name, "material declared again");
        } else {
            self.material_map
                .insert(material.name.clone(), self.materials.len());
        }
        self.materials.push(material);
    }

    /// Add a transmission.
    pub fn add_transmission(&mut self, transmission: UrdfTransmission) {
        self.transmissions.push(transmission);
    }

    /// Keep a vendor extension element verbatim.
    pub fn add_extension(&mut self, node: XmlNode) {
        self.extensions.push(node);
    }

    /// Robot name.
    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    /// Links in declaration order.
    pub fn links(&self) -> &[UrdfLink] {
        &self.links
    }

    /// Joints in declaration order.
    pub fn joints(&self) -> &[UrdfJoint] {
        &self.joints
    }

    /// Robot-level materials in declaration order.
    pub fn materials(&self) -> &[UrdfMaterial] {
        &self.materials
    }

    /// Transmissions in declaration order.
    pub fn transmissions(&self) -> &[UrdfTransmission] {
        &self.transmissions
    }

    /// Vendor extension elements (`<gazebo>`), verbatim.
    pub fn extensions(&self) -> &[XmlNode] {
        &self.extensions
    }

    /// Non-fatal issues found while reading the document.
    pub fn warnings(&self) -> &[UrdfWarning] {
        &self.warnings
    }

    /// Look up a link by name.
    pub fn link(&self, name: &str) -> Option<&UrdfLink> {
        self.link_map.get(name).map(|&i| &self.links[i])
    }

    /// Look up a joint by name.
    pub fn joint(&self, name: &str) -> Option<&UrdfJoint> {
        self.joint_map.get(name).map(|&i| &self.joints[i])
    }

    /// Look up a robot-level material by name.
    pub fn material(&self, name: &str) -> Option<&UrdfMaterial> {
        self.material_map.get(name).map(|&i| &self.materials[i])
    }

    /// Link name to position in [`UrdfRobot::links`].
    pub fn link_map(&self) -> &HashMap<String, usize> {
        &self.link_map
    }

    /// Joint name to position in [`UrdfRobot::joints`].
    pub fn joint_map(&self) -> &HashMap<String, usize> {
        &self.joint_map
    }

    /// Child link name to the joint and link above it.
    pub fn parent_map(&self) -> &HashMap<String, ParentRef> {
        &self.parent_map
    }

    /// Parent link name to its child joints, in declaration order.
    pub fn child_map(&self) -> &HashMap<String, Vec<ChildRef>> {
        &self.child_map
    }

    /// The joint and link above `link`, if any.
    pub fn parent_of(&self, link: &str) -> Option<&ParentRef> {
        self.parent_map.get(link)
    }

    /// Joints leading out of `link`, in declaration order.
    pub fn children_of(&self, link: &str) -> &[ChildRef] {
        self.child_map
            .get(link)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    /// Find the unique link without a parent joint.
    ///
    /// # Errors
    ///
    /// Returns [`UrdfError::MultipleRoots`] listing every parentless link in
    /// declaration order, or [`UrdfError::NoRoot`] if there are none.
    pub fn get_root(&self) -> Result<&str> {
        let roots: Vec<&str> = self
            .links
            .iter()
            .map(|link| link.name.as_str())
            .filter(|name| !self.parent_map.contains_key(*name))
            .collect();

        match roots.as_slice() {
            [] => Err(UrdfError::NoRoot),
            [root] => Ok(*root),
            _ => Err(UrdfError::MultipleRoots(
                roots.iter().map(|s| (*s).to_string()).collect(),
            )),
        }
    }

    /// Names along the chain from `root` down to `tip`, root first.
    ///
    /// Links and joints alternate when both are included.
    ///
    /// # Errors
    ///
    /// Returns [`UrdfError::UndefinedLink`] if either end is not a link,
    /// [`UrdfError::UnreachableRoot`] if `tip` does not descend from `root`,
    /// and [`UrdfError::KinematicLoop`] if the walk up from `tip` revisits a
    /// link.
    pub fn get_chain(&self, root: &str, tip: &str, filter: ChainFilter) -> Result<Vec<String>> {
        for end in [root, tip] {
            if !self.link_map.contains_key(end) {
                return Err(UrdfError::undefined_link(end, "chain request"));
            }
        }

        let mut chain = Vec::new();
        if filter.links {
            chain.push(tip.to_string());
        }

        let mut visited = HashSet::from([tip]);
        let mut link = tip;
        while link != root {
            let Some(up) = self.parent_map.get(link) else {
                return Err(UrdfError::UnreachableRoot {
                    root: root.to_string(),
                    tip: tip.to_string(),
                });
            };

            if filter.joints {
                let fixed = self
                    .joint(&up.joint)
                    .is_some_and(|j| j.joint_type == UrdfJointType::Fixed);
                if filter.fixed || !fixed {
                    chain.push(up.joint.clone());
                }
            }
            if filter.links {
                chain.push(up.parent.clone());
            }

            if !visited.insert(up.parent.as_str()) {
                return Err(UrdfError::KinematicLoop(format!(
                    "link {} reached twice walking up from {tip}",
                    up.parent
                )));
            }
            link = up.parent.as_str();
        }

        chain.reverse();
        Ok(chain)
    }

    /// Check cross references and that the links form a rooted tree.
    ///
    /// # Errors
    ///
    /// Returns [`UrdfError::UndefinedLink`] for a joint naming an undeclared
    /// link, then any error from [`UrdfRobot::get_root`].
    pub fn validate(&self) -> Result<()> {
        self.check_references()?;
        self.get_root().map(|_| ())
    }

    pub(crate) fn check_references(&self) -> Result<()> {
        for joint in &self.joints {
            for link in [&joint.parent, &joint.child] {
                if !self.link_map.contains_key(link) {
                    return Err(UrdfError::undefined_link(
                        link.as_str(),
                        format!("joint {}", joint.name),
                    ));
                }
            }
        }
        Ok(())
    }

    pub(crate) fn mirror_geometry(&mut self) {
        for link in &mut self.links {
            link.mirror_geometry();
        }
    }

    /// Record materials with neither colour nor texture.
    ///
    /// A visual material without appearance is fine when it names a
    /// robot-level material.
    fn collect_warnings(&mut self) {
        let mut warnings = Vec::new();

        for material in &self.materials {
            if !material.has_appearance() {
                warnings.push(UrdfWarning::MaterialWithoutAppearance {
                    name: material.name.clone(),
                    context: "robot".to_string(),
                });
            }
        }

        for link in &self.links {
            let Some(material) = link.visual.as_ref().and_then(|v| v.material.as_ref()) else {
                continue;
            };
            if !material.has_appearance() && !self.material_map.contains_key(&material.name) {
                warnings.push(UrdfWarning::MaterialWithoutAppearance {
                    name: material.name.clone(),
                    context: format!("visual of link {}", link.name),
                });
            }
        }

        for warning in &warnings {
            tracing::warn!("{warning}");
        }
        self.warnings = warnings;
    }
}

impl XmlObject for UrdfRobot {
    const TAG: &'static str = "robot";
    const FIELDS: &'static [FieldDescriptor] = &[
        FieldDescriptor::optional_attribute("name", Primitive::Text),
        FieldDescriptor::aggregate("material", ValueType::Object),
        FieldDescriptor::aggregate("link", ValueType::Object),
        FieldDescriptor::aggregate("joint", ValueType::Object),
        FieldDescriptor::aggregate("transmission", ValueType::Alias("transmission")),
        FieldDescriptor::aggregate("gazebo", ValueType::Raw),
    ];

    fn from_fields(fields: &mut FieldSet<'_>) -> Result<Self> {
        let mut robot = Self {
            name: fields.optional_value("name")?,
            ..Self::default()
        };
        let registry = fields.registry();

        for (tag, decoded) in fields.take_aggregates() {
            match (tag, decoded) {
                ("link", Decoded::Node(node)) => robot.add_link(read_object(node, registry)?)?,
                ("joint", Decoded::Node(node)) => robot.add_joint(read_object(node, registry)?)?,
                ("material", Decoded::Node(node)) => {
                    robot.add_material(read_object(node, registry)?);
                }
                ("transmission", Decoded::Transmission(t)) => robot.add_transmission(t),
                ("gazebo", Decoded::Raw(node)) => robot.add_extension(node),
                (tag, other) => {
                    return Err(UrdfError::invalid_element(
                        fields.element_name(),
                        format!("unexpected value for {tag}: {other:?}"),
                    ));
                }
            }
        }

        robot.collect_warnings();
        Ok(robot)
    }

    fn to_fields(&self, out: &mut FieldWriter<'_>) -> Result<()> {
        out.optional_value("name", self.name.clone());
        for material in &self.materials {
            out.object("material", material)?;
        }
        for link in &self.links {
            out.object("link", link)?;
        }
        for joint in &self.joints {
            out.object("joint", joint)?;
        }
        for transmission in &self.transmissions {
            out.transmission("transmission", transmission)?;
        }
        for extension in &self.extensions {
            out.raw("gazebo", extension);
        }
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use crate::geometry::UrdfGeometry;
    use crate::registry::TypeRegistry;
    use crate::types::{UrdfColor, UrdfVisual};
    use crate::xml::parse_document;

    fn read(xml: &str) -> Result<UrdfRobot> {
        let node = parse_document(xml).expect("well-formed");
        read_object(&node, &TypeRegistry::urdf())
    }

    fn revolute(name: &str, parent: &str, child: &str) -> UrdfJoint {
        UrdfJoint::new(name, UrdfJointType::Revolute, parent, child)
    }

    /// base -> shoulder -> elbow -> wrist, plus base -> camera (fixed).
    fn arm() -> UrdfRobot {
        let mut robot = UrdfRobot::new("arm");
        for name in ["base", "shoulder", "elbow", "wrist", "camera"] {
            robot.add_link(UrdfLink::new(name)).unwrap();
        }
        robot.add_joint(revolute("j1", "base", "shoulder")).unwrap();
        robot.add_joint(revolute("j2", "shoulder", "elbow")).unwrap();
        robot
            .add_joint(UrdfJoint::new("j3", UrdfJointType::Fixed, "elbow", "wrist"))
            .unwrap();
        robot
            .add_joint(UrdfJoint::new("cam", UrdfJointType::Fixed, "base", "camera"))
            .unwrap();
        robot
    }

    #[test]
    fn test_indices() {
        let robot = arm();
        assert_eq!(robot.link_map()["elbow"], 2);
        assert_eq!(robot.joint_map()["cam"], 3);
        assert_eq!(
            robot.parent_of("elbow"),
            Some(&ParentRef {
                joint: "j2".into(),
                parent: "shoulder".into()
            })
        );
        let children: Vec<&str> = robot
            .children_of("base")
            .iter()
            .map(|c| c.child.as_str())
            .collect();
        assert_eq!(children, vec!["shoulder", "camera"]);
        assert!(robot.children_of("wrist").is_empty());
        assert_eq!(robot.link("wrist").map(|l| l.name.as_str()), Some("wrist"));
        assert!(robot.joint("nope").is_none());
    }

    #[test]
    fn test_duplicate_link() {
        let mut robot = arm();
        let err = robot.add_link(UrdfLink::new("base")).unwrap_err();
        assert!(matches!(err, UrdfError::DuplicateName { kind: "link", .. }));
        assert_eq!(robot.links().len(), 5);
    }

    #[test]
    fn test_duplicate_joint() {
        let mut robot = arm();
        let err = robot.add_joint(revolute("j1", "wrist", "x")).unwrap_err();
        assert!(matches!(err, UrdfError::DuplicateName { kind: "joint", .. }));
    }

    #[test]
    fn test_duplicate_child() {
        let mut robot = arm();
        match robot.add_joint(revolute("j9", "base", "elbow")) {
            Err(UrdfError::DuplicateChild {
                child,
                existing,
                joint,
            }) => {
                assert_eq!(child, "elbow");
                assert_eq!(existing, "j2");
                assert_eq!(joint, "j9");
            }
            other => panic!("expected duplicate child, got {other:?}"),
        }
        assert_eq!(robot.joints().len(), 4);
        assert_eq!(robot.children_of("base").len(), 2);
    }

    #[test]
    fn test_get_root() {
        assert_eq!(arm().get_root().expect("root"), "base");
    }

    #[test]
    fn test_multiple_roots() {
        let mut robot = UrdfRobot::new("pair");
        robot.add_link(UrdfLink::new("a")).unwrap();
        robot.add_link(UrdfLink::new("b")).unwrap();
        match robot.get_root() {
            Err(UrdfError::MultipleRoots(roots)) => assert_eq!(roots, vec!["a", "b"]),
            other => panic!("expected multiple roots, got {other:?}"),
        }
    }

    #[test]
    fn test_no_root() {
        assert!(matches!(
            UrdfRobot::default().get_root(),
            Err(UrdfError::NoRoot)
        ));

        let mut ring = UrdfRobot::new("ring");
        ring.add_link(UrdfLink::new("a")).unwrap();
        ring.add_link(UrdfLink::new("b")).unwrap();
        ring.add_joint(revolute("ab", "a", "b")).unwrap();
        ring.add_joint(revolute("ba", "b", "a")).unwrap();
        assert!(matches!(ring.get_root(), Err(UrdfError::NoRoot)));
    }

    #[test]
    fn test_chain_full() {
        let chain = arm()
            .get_chain("base", "wrist", ChainFilter::default())
            .expect("chain");
        assert_eq!(
            chain,
            vec!["base", "j1", "shoulder", "j2", "elbow", "j3", "wrist"]
        );
    }

    #[test]
    fn test_chain_filters() {
        let robot = arm();
        assert_eq!(
            robot
                .get_chain("base", "wrist", ChainFilter::links_only())
                .expect("chain"),
            vec!["base", "shoulder", "elbow", "wrist"]
        );
        assert_eq!(
            robot
                .get_chain("base", "wrist", ChainFilter::movable_joints())
                .expect("chain"),
            vec!["j1", "j2"]
        );
        assert_eq!(
            robot
                .get_chain("shoulder", "elbow", ChainFilter::default())
                .expect("sub-chain"),
            vec!["shoulder", "j2", "elbow"]
        );
        assert_eq!(
            robot
                .get_chain("base", "base", ChainFilter::default())
                .expect("trivial"),
            vec!["base"]
        );
    }

    #[test]
    fn test_chain_unreachable() {
        let err = arm()
            .get_chain("camera", "wrist", ChainFilter::default())
            .unwrap_err();
        assert!(matches!(err, UrdfError::UnreachableRoot { .. }));
    }

    #[test]
    fn test_chain_undefined_tip() {
        let err = arm()
            .get_chain("base", "gripper", ChainFilter::default())
            .unwrap_err();
        assert!(matches!(err, UrdfError::UndefinedLink { .. }));
    }

    #[test]
    fn test_chain_detects_loop() {
        let mut robot = UrdfRobot::new("loop");
        for name in ["root", "a", "b"] {
            robot.add_link(UrdfLink::new(name)).unwrap();
        }
        robot.add_joint(revolute("ab", "a", "b")).unwrap();
        robot.add_joint(revolute("ba", "b", "a")).unwrap();

        assert_eq!(robot.get_root().expect("root"), "root");
        let err = robot
            .get_chain("root", "b", ChainFilter::default())
            .unwrap_err();
        assert!(matches!(err, UrdfError::KinematicLoop(_)));
    }

    #[test]
    fn test_validate() {
        assert!(arm().validate().is_ok());

        let mut robot = arm();
        robot.add_joint(revolute("dangling", "wrist", "gripper")).unwrap();
        match robot.validate() {
            Err(UrdfError::UndefinedLink { link_name, context }) => {
                assert_eq!(link_name, "gripper");
                assert_eq!(context, "joint dangling");
            }
            other => panic!("expected undefined link, got {other:?}"),
        }
    }

    #[test]
    fn test_parse_interleaved_document() {
        let robot = read(
            r#"
            <robot name="bot">
                <link name="base"/>
                <joint name="j" type="continuous">
                    <parent link="base"/>
                    <child link="wheel"/>
                </joint>
                <material name="black"><color rgba="0 0 0 1"/></material>
                <link name="wheel">
                    <visual>
                        <geometry><cylinder radius="0.1" length="0.05"/></geometry>
                        <material name="black"/>
                    </visual>
                </link>
                <gazebo reference="wheel"><mu1>0.9</mu1></gazebo>
            </robot>
        "#,
        )
        .expect("robot");

        assert_eq!(robot.name(), Some("bot"));
        assert_eq!(robot.links().len(), 2);
        assert_eq!(robot.links()[1].name, "wheel");
        assert_eq!(robot.get_root().expect("root"), "base");
        assert!(robot.material("black").is_some());
        assert_eq!(robot.extensions().len(), 1);
        assert_eq!(robot.extensions()[0].attribute("reference"), Some("wheel"));
        assert!(robot.warnings().is_empty());
    }

    #[test]
    fn test_parse_duplicate_child_aborts() {
        let err = read(
            r#"
            <robot name="bad">
                <link name="a"/><link name="b"/><link name="c"/>
                <joint name="j1" type="fixed"><parent link="a"/><child link="c"/></joint>
                <joint name="j2" type="fixed"><parent link="b"/><child link="c"/></joint>
            </robot>
        "#,
        )
        .unwrap_err();
        assert!(matches!(err, UrdfError::DuplicateChild { .. }));
    }

    #[test]
    fn test_multiple_roots_parse_lazily() {
        let robot = read(r#"<robot name="two"><link name="a"/><link name="b"/></robot>"#)
            .expect("parsing succeeds");
        assert!(matches!(robot.get_root(), Err(UrdfError::MultipleRoots(_))));
    }

    #[test]
    fn test_material_warnings() {
        let robot = read(
            r#"
            <robot name="w">
                <material name="plain"/>
                <link name="a">
                    <visual>
                        <geometry><sphere radius="1"/></geometry>
                        <material name="missing"/>
                    </visual>
                </link>
                <link name="b">
                    <visual>
                        <geometry><sphere radius="1"/></geometry>
                        <material name="plain"/>
                    </visual>
                </link>
            </robot>
        "#,
        )
        .expect("warnings are not fatal");

        assert_eq!(
            robot.warnings(),
            &[
                UrdfWarning::MaterialWithoutAppearance {
                    name: "plain".into(),
                    context: "robot".into(),
                },
                UrdfWarning::MaterialWithoutAppearance {
                    name: "missing".into(),
                    context: "visual of link a".into(),
                },
            ]
        );
    }

    #[test]
    fn test_add_material_keeps_first() {
        let mut robot = UrdfRobot::new("m");
        robot.add_material(
            UrdfMaterial::reference("red").with_color(UrdfColor::new(1.0, 0.0, 0.0, 1.0)),
        );
        robot.add_material(UrdfMaterial::reference("red"));
        assert_eq!(robot.materials().len(), 2);
        assert!(robot.material("red").expect("red").has_appearance());
    }

    #[test]
    fn test_mirror_geometry_applies_to_every_link() {
        let mut robot = UrdfRobot::new("m");
        robot
            .add_link(UrdfLink::new("a").with_visual(UrdfVisual::new(UrdfGeometry::sphere(1.0))))
            .unwrap();
        robot.add_link(UrdfLink::new("b")).unwrap();
        robot.mirror_geometry();
        assert!(robot.link("a").and_then(|l| l.collision.as_ref()).is_some());
        assert!(robot.link("b").and_then(|l| l.collision.as_ref()).is_none());
    }
}
