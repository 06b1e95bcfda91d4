//! Top-down build order over the kinematic tree.

use std::collections::{HashSet, VecDeque};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::error::{Result, UrdfError};
use crate::robot::UrdfRobot;

/// Tolerance used by [`UrdfRobot::build_order`] to decide whether a joint
/// origin is the identity.
pub const DEFAULT_IDENTITY_TOLERANCE: f64 = 1e-9;

/// One joint to instantiate, emitted after its parent link.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct BuildStep {
    /// Joint name.
    pub joint: String,
    /// Parent link, already emitted.
    pub parent: String,
    /// Child link introduced by this step.
    pub child: String,
    /// The joint origin is the identity, so the child frame coincides with
    /// the parent frame. A scene builder may fold the child into its parent
    /// instead of creating an articulation point.
    pub merge_into_parent: bool,
}

impl UrdfRobot {
    /// Build order with the default identity tolerance.
    ///
    /// # Errors
    ///
    /// See [`UrdfRobot::build_order_with_tolerance`].
    pub fn build_order(&self) -> Result<Vec<BuildStep>> {
        self.build_order_with_tolerance(DEFAULT_IDENTITY_TOLERANCE)
    }

    /// Walk the tree breadth-first from the root and list every joint so
    /// that each parent link is emitted before its children.
    ///
    /// Siblings keep declaration order. A joint is flagged for merging when
    /// its origin translation and rotation angle are both within `tolerance`
    /// of zero.
    ///
    /// # Errors
    ///
    /// Returns [`UrdfError::UndefinedLink`] for a joint naming an undeclared
    /// link, any error from [`UrdfRobot::get_root`], and
    /// [`UrdfError::KinematicLoop`] when some links cannot be reached from the
    /// root.
    pub fn build_order_with_tolerance(&self, tolerance: f64) -> Result<Vec<BuildStep>> {
        self.check_references()?;
        let root = self.get_root()?;

        let mut steps = Vec::with_capacity(self.joints().len());
        let mut reached = HashSet::from([root]);
        let mut queue = VecDeque::from([root]);

        while let Some(link) = queue.pop_front() {
            for edge in self.children_of(link) {
                let joint = self.joint(&edge.joint).ok_or_else(|| {
                    UrdfError::invalid_element(
                        "robot",
                        format!("joint {} is not indexed", edge.joint),
                    )
                })?;

                steps.push(BuildStep {
                    joint: edge.joint.clone(),
                    parent: link.to_string(),
                    child: edge.child.clone(),
                    merge_into_parent: joint.is_identity(tolerance),
                });
                reached.insert(edge.child.as_str());

                if !self.children_of(&edge.child).is_empty() {
                    queue.push_back(&edge.child);
                }
            }
        }

        let unreached: Vec<&str> = self
            .links()
            .iter()
            .map(|l| l.name.as_str())
            .filter(|name| !reached.contains(name))
            .collect();
        if !unreached.is_empty() {
            return Err(UrdfError::KinematicLoop(format!(
                "links not reachable from root {root}: {}",
                unreached.join(", ")
            )));
        }

        Ok(steps)
    }
}
