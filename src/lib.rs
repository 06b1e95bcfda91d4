//! URDF robot description model, serializer and kinematic tree resolver.
//!
//! This crate parses [URDF](http://wiki.ros.org/urdf) (Unified Robot Description Format)
//! documents into a queryable [`UrdfRobot`], writes the model back to XML, and
//! resolves the link/joint graph into a rooted tree that can drive a scene or
//! armature builder.
//!
//! # Features
//!
//! - Parse URDF XML from files or strings, write it back
//! - Declarative field tables drive both directions for every element
//! - Tag-driven geometry variants and speculative transmission formats
//! - Link/joint indices built while reading (`link_map`, `joint_map`,
//!   `parent_map`, `child_map`)
//! - Root lookup, root-to-tip chains and breadth-first build order, with loop
//!   detection
//! - Mesh path resolution for `package://` URIs
//!
//! # Example
//!
//! ```
//! use sim_urdf_model::{ChainFilter, load_urdf_str};
//!
//! let urdf = r#"
//!     <robot name="simple">
//!         <link name="base_link"/>
//!         <link name="arm"/>
//!         <joint name="shoulder" type="revolute">
//!             <origin xyz="0 0 0.1"/>
//!             <parent link="base_link"/>
//!             <child link="arm"/>
//!             <limit effort="10" velocity="1"/>
//!         </joint>
//!     </robot>
//! "#;
//!
//! let robot = load_urdf_str(urdf).expect("should parse");
//! assert_eq!(robot.name(), Some("simple"));
//! assert_eq!(robot.get_root().expect("one root"), "base_link");
//!
//! let chain = robot
//!     .get_chain("base_link", "arm", ChainFilter::default())
//!     .expect("arm descends from base");
//! assert_eq!(chain, ["base_link", "shoulder", "arm"]);
//!
//! let order = robot.build_order().expect("tree");
//! assert_eq!(order[0].child, "arm");
//! assert!(!order[0].merge_into_parent);
//! ```
//!
//! # Supported URDF Elements
//!
//! ## Links
//!
//! - `<link name="...">` with optional `<origin>`, `<inertial>`, `<visual>`
//!   and `<collision>` (one of each; repeats keep the first)
//! - `<material>` with `<color rgba="..."/>` (3 or 4 components) or
//!   `<texture filename="..."/>`, inline or at robot level
//!
//! ## Joints
//!
//! - `<joint name="..." type="...">`
//! - Types: `unknown`, `revolute`, `continuous`, `prismatic`, `floating`,
//!   `planar`, `fixed`
//! - `<parent>`, `<child>`, `<origin>`, `<axis>`, `<limit>`, `<dynamics>`,
//!   `<safety_controller>`, `<calibration>`, `<mimic>`
//!
//! ## Geometry
//!
//! - `<box size="x y z"/>`
//! - `<sphere radius="r"/>`
//! - `<cylinder radius="r" length="l"/>`
//! - `<mesh filename="..." scale="x y z"/>`
//!
//! ## Other
//!
//! - `<transmission>` in the current layout or the legacy PR2 layout
//! - `<gazebo>` extensions are kept verbatim
//!
//! # Limitations
//!
//! - XML comments and formatting are not preserved on write
//! - Leading and trailing whitespace of element text is trimmed on read and
//!   on write
//! - Namespace-qualified tags are treated as plain names

#![doc(html_root_url = "https://docs.rs/sim-urdf-model/0.7.0")]
#![deny(clippy::unwrap_used, clippy::expect_used)]
#![warn(missing_docs)]
#![allow(
    clippy::missing_const_for_fn,
    clippy::module_name_repetitions,
    clippy::similar_names,
    clippy::must_use_candidate,
    clippy::missing_errors_doc,
    clippy::missing_panics_doc,
    clippy::redundant_closure_for_method_calls,
    clippy::items_after_statements,
    clippy::needless_pass_by_value,
    clippy::map_unwrap_or,
    clippy::option_if_let_else
)]

mod dispatch;
mod error;
mod geometry;
mod kinematics;
mod loader;
mod registry;
mod robot;
mod scene;
mod schema;
mod transmission;
mod types;
mod value;
mod xml;

// Re-export main types
pub use dispatch::{Candidate, CandidateFn, speculate};
pub use error::{Result, UrdfError, UrdfWarning};
pub use geometry::{
    GeometryKind, UrdfBox, UrdfCylinder, UrdfGeometry, UrdfMesh, UrdfSphere, read_geometry,
    write_geometry,
};
pub use kinematics::{BuildStep, DEFAULT_IDENTITY_TOLERANCE};
pub use loader::{UrdfLoader, load_urdf_file, load_urdf_str, parse_urdf_str, write_urdf_string};
pub use registry::{TypeDef, TypeRegistry, URDF_NAMESPACE};
pub use robot::{ChainFilter, ChildRef, ParentRef, UrdfRobot};
pub use scene::{
    MeshReference, MeshRole, PACKAGE_PATH_VAR, PackageResolver, PathResolver, SceneBuilder,
    build_scene, build_scene_with_tolerance, resolve_meshes,
};
pub use schema::{
    Decoded, FieldDescriptor, FieldKind, FieldSet, FieldWriter, ValueType, XmlObject, read_fields,
    read_object, write_object,
};
pub use transmission::{
    TRANSMISSION_CANDIDATES, UrdfActuator, UrdfPr2Transmission, UrdfSimpleTransmission,
    UrdfTransmission, read_transmission, write_transmission,
};
pub use types::{
    UrdfCollision, UrdfColor, UrdfInertia, UrdfInertial, UrdfJoint, UrdfJointCalibration,
    UrdfJointDynamics, UrdfJointLimit, UrdfJointMimic, UrdfJointType, UrdfLink, UrdfMaterial,
    UrdfPose, UrdfSafetyController, UrdfTexture, UrdfVisual,
};
pub use value::{Primitive, PrimitiveValue, Value};
pub use xml::{XmlNode, parse_document, write_document};
