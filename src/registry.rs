//! Named type definitions for document dialects.
//!
//! Field descriptors can refer to a type by name instead of spelling out
//! how it is encoded. Names are registered inside a namespace so that two
//! dialects can each define, say, `pose` without colliding. A registry is
//! built per dialect and handed to the parser explicitly.

use std::collections::HashMap;

use crate::error::{Result, UrdfError};
use crate::value::Primitive;

/// Namespace of the URDF dialect.
pub const URDF_NAMESPACE: &str = "urdf";

/// How a registered type is encoded in XML.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TypeDef {
    /// The value is the text content of the element.
    Text(Primitive),
    /// The value lives in a single attribute of the element, as in
    /// `<parent link="base"/>`.
    SimpleElement {
        /// Attribute carrying the value.
        attribute: &'static str,
        /// Type of the value.
        value: Primitive,
    },
    /// A geometry element holding exactly one shape.
    Geometry,
    /// A transmission in one of several historical formats.
    Transmission,
}

/// Registry of named types, scoped by namespace.
#[derive(Debug, Clone, Default)]
pub struct TypeRegistry {
    types: HashMap<String, TypeDef>,
    scopes: Vec<String>,
    dialect: Option<String>,
}

impl TypeRegistry {
    /// Create an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry for the URDF dialect.
    #[must_use]
    pub fn urdf() -> Self {
        let mut registry = Self::new();
        registry.register_urdf();
        registry.set_dialect(URDF_NAMESPACE);
        registry
    }

    fn register_urdf(&mut self) {
        const URDF_TYPES: [(&str, TypeDef); 6] = [
            (
                "element_link",
                TypeDef::SimpleElement {
                    attribute: "link",
                    value: Primitive::Text,
                },
            ),
            (
                "element_xyz",
                TypeDef::SimpleElement {
                    attribute: "xyz",
                    value: Primitive::Vector3,
                },
            ),
            (
                "element_name",
                TypeDef::SimpleElement {
                    attribute: "name",
                    value: Primitive::Text,
                },
            ),
            (
                "element_value",
                TypeDef::SimpleElement {
                    attribute: "value",
                    value: Primitive::Float,
                },
            ),
            ("geometric", TypeDef::Geometry),
            ("transmission", TypeDef::Transmission),
        ];

        self.start_namespace(URDF_NAMESPACE);
        for (name, def) in URDF_TYPES {
            let key = self.qualify(name);
            self.types.insert(key, def);
        }
        self.end_namespace();
    }

    /// Enter a namespace; subsequent registrations are qualified with it.
    pub fn start_namespace(&mut self, namespace: impl Into<String>) {
        self.scopes.push(namespace.into());
    }

    /// Leave the innermost namespace, returning its name.
    pub fn end_namespace(&mut self) -> Option<String> {
        self.scopes.pop()
    }

    /// Set the namespace consulted first by [`TypeRegistry::get`].
    pub fn set_dialect(&mut self, namespace: impl Into<String>) {
        self.dialect = Some(namespace.into());
    }

    /// The namespace consulted first by lookups.
    pub fn dialect(&self) -> Option<&str> {
        self.dialect.as_deref()
    }

    /// Register a type under the current namespace.
    ///
    /// # Errors
    ///
    /// Returns [`UrdfError::DuplicateName`] if the qualified name is taken.
    pub fn add_type(&mut self, name: &str, def: TypeDef) -> Result<()> {
        let key = self.qualify(name);
        if self.types.contains_key(&key) {
            return Err(UrdfError::duplicate_name("type", key));
        }
        self.types.insert(key, def);
        Ok(())
    }

    /// Resolve a type name, trying the dialect namespace before the bare name.
    ///
    /// # Errors
    ///
    /// Returns [`UrdfError::UnknownType`] if the name is not registered.
    pub fn get(&self, name: &str) -> Result<TypeDef> {
        self.dialect
            .as_deref()
            .and_then(|ns| self.get_in(ns, name))
            .or_else(|| self.types.get(name).copied())
            .ok_or_else(|| UrdfError::UnknownType(name.to_string()))
    }

    /// Resolve a type name inside a specific namespace.
    pub fn get_in(&self, namespace: &str, name: &str) -> Option<TypeDef> {
        self.types.get(&format!("{namespace}.{name}")).copied()
    }

    fn qualify(&self, name: &str) -> String {
        if self.scopes.is_empty() {
            name.to_string()
        } else {
            format!("{}.{name}", self.scopes.join("."))
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    #[test]
    fn test_urdf_registry_resolves_aliases() {
        let registry = TypeRegistry::urdf();
        assert_eq!(registry.dialect(), Some("urdf"));
        assert_eq!(
            registry.get("element_link").expect("registered"),
            TypeDef::SimpleElement {
                attribute: "link",
                value: Primitive::Text
            }
        );
        assert_eq!(
            registry.get("geometric").expect("registered"),
            TypeDef::Geometry
        );
        assert!(matches!(
            registry.get("nope"),
            Err(UrdfError::UnknownType(_))
        ));
    }

    #[test]
    fn test_namespaces_do_not_collide() {
        let mut registry = TypeRegistry::urdf();
        registry.start_namespace("sdf");
        registry
            .add_type(
                "element_xyz",
                TypeDef::SimpleElement {
                    attribute: "pos",
                    value: Primitive::Vector3,
                },
            )
            .expect("different namespace");
        assert_eq!(registry.end_namespace().as_deref(), Some("sdf"));

        match registry.get_in("sdf", "element_xyz") {
            Some(TypeDef::SimpleElement { attribute, .. }) => assert_eq!(attribute, "pos"),
            other => panic!("unexpected {other:?}"),
        }
        match registry.get("element_xyz").expect("urdf dialect") {
            TypeDef::SimpleElement { attribute, .. } => assert_eq!(attribute, "xyz"),
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn test_urdf_types_live_in_urdf_namespace() {
        let mut registry = TypeRegistry::urdf();
        for name in [
            "element_link",
            "element_xyz",
            "element_name",
            "element_value",
            "geometric",
            "transmission",
        ] {
            assert!(registry.get_in(URDF_NAMESPACE, name).is_some(), "{name}");
        }

        registry.start_namespace(URDF_NAMESPACE);
        let result = registry.add_type("transmission", TypeDef::Transmission);
        assert!(matches!(result, Err(UrdfError::DuplicateName { .. })));
    }

    #[test]
    fn test_duplicate_in_same_namespace() {
        let mut registry = TypeRegistry::new();
        registry.start_namespace("urdf");
        let result = registry.add_type("geometric", TypeDef::Geometry);
        assert!(result.is_ok());
        let result = registry.add_type("geometric", TypeDef::Geometry);
        assert!(matches!(result, Err(UrdfError::DuplicateName { .. })));
    }

    #[test]
    fn test_bare_names_are_global() {
        let mut registry = TypeRegistry::new();
        registry
            .add_type("label", TypeDef::Text(Primitive::Text))
            .expect("fresh");
        assert_eq!(
            registry.get("label").expect("global"),
            TypeDef::Text(Primitive::Text)
        );
    }
}
