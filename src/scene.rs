//! Interfaces to the consumers of a resolved model.
//!
//! A [`PathResolver`] turns mesh URIs into filesystem paths, and a
//! [`SceneBuilder`] receives the root link followed by one call per joint in
//! build order. Neither does any parsing; they only read the model.

use std::env;
use std::path::{Path, PathBuf};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::error::UrdfError;
use crate::geometry::UrdfGeometry;
use crate::kinematics::{BuildStep, DEFAULT_IDENTITY_TOLERANCE};
use crate::robot::UrdfRobot;
use crate::types::{UrdfJoint, UrdfLink};

/// Environment variable listing package search roots.
pub const PACKAGE_PATH_VAR: &str = "ROS_PACKAGE_PATH";

// ============================================================================
// Mesh paths
// ============================================================================

/// Maps a mesh URI to a path on disk.
pub trait PathResolver {
    /// Resolve `uri`, or `None` if it cannot be resolved.
    fn resolve(&self, uri: &str) -> Option<PathBuf>;
}

impl<F> PathResolver for F
where
    F: Fn(&str) -> Option<PathBuf>,
{
    fn resolve(&self, uri: &str) -> Option<PathBuf> {
        self(uri)
    }
}

/// Resolves `package://name/rest` against a list of package roots.
///
/// A root either contains the package as a subdirectory or is the package
/// directory itself. `file://` URIs and plain paths map to themselves.
#[derive(Debug, Clone, Default)]
pub struct PackageResolver {
    roots: Vec<PathBuf>,
}

impl PackageResolver {
    /// Create a resolver with no package roots.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Resolver with the roots listed in `ROS_PACKAGE_PATH`.
    #[must_use]
    pub fn from_env() -> Self {
        let roots = env::var_os(PACKAGE_PATH_VAR)
            .map(|paths| env::split_paths(&paths).collect())
            .unwrap_or_default();
        Self { roots }
    }

    /// Add a package root.
    #[must_use]
    pub fn with_root(mut self, root: impl Into<PathBuf>) -> Self {
        self.roots.push(root.into());
        self
    }

    /// Package roots, in search order.
    pub fn roots(&self) -> &[PathBuf] {
        &self.roots
    }

    /// Directory of a package, if any root holds it.
    pub fn find_package(&self, package: &str) -> Option<PathBuf> {
        self.roots.iter().find_map(|root| {
            if root.file_name().is_some_and(|name| name == package) && root.is_dir() {
                return Some(root.clone());
            }
            let candidate = root.join(package);
            candidate.is_dir().then_some(candidate)
        })
    }
}

impl PathResolver for PackageResolver {
    fn resolve(&self, uri: &str) -> Option<PathBuf> {
        if let Some(rest) = uri.strip_prefix("package://") {
            let (package, relative) = rest.split_once('/')?;
            self.find_package(package).map(|dir| dir.join(relative))
        } else if let Some(path) = uri.strip_prefix("file://") {
            Some(PathBuf::from(path))
        } else if uri.contains("://") {
            None
        } else {
            Some(Path::new(uri).to_path_buf())
        }
    }
}

/// Which geometry slot of a link a mesh comes from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum MeshRole {
    /// `<visual>`
    Visual,
    /// `<collision>`
    Collision,
}

/// A mesh referenced by the model.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct MeshReference {
    /// Owning link.
    pub link: String,
    /// Visual or collision.
    pub role: MeshRole,
    /// URI as written in the document.
    pub uri: String,
    /// Resolved path, `None` when the resolver gave up.
    pub path: Option<PathBuf>,
}

/// List every mesh in the model with its resolved path, in link order.
pub fn resolve_meshes(robot: &UrdfRobot, resolver: &impl PathResolver) -> Vec<MeshReference> {
    let mut meshes = Vec::new();

    for link in robot.links() {
        let slots = [
            (MeshRole::Visual, link.visual.as_ref().map(|v| &v.geometry)),
            (MeshRole::Collision, link.collision.as_ref().map(|c| &c.geometry)),
        ];
        for (role, geometry) in slots {
            let Some(UrdfGeometry::Mesh(mesh)) = geometry else {
                continue;
            };
            let path = resolver.resolve(&mesh.filename);
            if path.is_none() {
                tracing::warn!(
                    link = %link.name,
                    uri = %mesh.filename,
                    "cannot resolve mesh path"
                );
            }
            meshes.push(MeshReference {
                link: link.name.clone(),
                role,
                uri: mesh.filename.clone(),
                path,
            });
        }
    }

    meshes
}

// ============================================================================
// Scene construction
// ============================================================================

/// Receives a model in build order.
pub trait SceneBuilder {
    /// Builder error; model errors convert into it.
    type Error: From<UrdfError>;

    /// Create the root link.
    fn add_root(&mut self, link: &UrdfLink) -> Result<(), Self::Error>;

    /// Create `child` under an already created parent, attached by `joint`.
    fn add_step(
        &mut self,
        step: &BuildStep,
        joint: &UrdfJoint,
        child: &UrdfLink,
    ) -> Result<(), Self::Error>;
}

/// Drive `builder` over the model with the default identity tolerance.
///
/// # Errors
///
/// Returns the first topology error or builder error.
pub fn build_scene<B: SceneBuilder>(
    robot: &UrdfRobot,
    builder: &mut B,
) -> Result<Vec<BuildStep>, B::Error> {
    build_scene_with_tolerance(robot, builder, DEFAULT_IDENTITY_TOLERANCE)
}

/// Drive `builder` over the model: the root first, then one step per joint.
///
/// Returns the steps that were sent. Nothing is sent if the model is not a
/// valid tree.
///
/// # Errors
///
/// Returns the first topology error or builder error.
pub fn build_scene_with_tolerance<B: SceneBuilder>(
    robot: &UrdfRobot,
    builder: &mut B,
    tolerance: f64,
) -> Result<Vec<BuildStep>, B::Error> {
    let steps = robot.build_order_with_tolerance(tolerance)?;
    let root = robot.get_root()?;
    let root_link = robot
        .link(root)
        .ok_or_else(|| UrdfError::undefined_link(root, "scene root"))?;

    builder.add_root(root_link)?;
    for step in &steps {
        let joint = robot.joint(&step.joint).ok_or_else(|| {
            UrdfError::invalid_element("robot", format!("no joint {}", step.joint))
        })?;
        let child = robot.link(&step.child).ok_or_else(|| {
            UrdfError::undefined_link(step.child.as_str(), format!("joint {}", step.joint))
        })?;
        builder.add_step(step, joint, child)?;
    }

    Ok(steps)
}
