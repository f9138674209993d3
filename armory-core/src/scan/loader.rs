//! Unit resolution.
//!
//! Resolution of a qualified unit name to something instantiable is the one
//! place dynamic loading could hide, so it lives behind the narrow
//! [`UnitLoader`] seam. The standard implementation is
//! [`StaticUnitLoader`]: an explicit table populated at startup by the host
//! build's registration manifest. Business logic never inspects units
//! directly.

use std::collections::HashMap;
use std::sync::Arc;

use anyhow::Result;
use thiserror::Error;

use super::extension::Extension;

type ExtensionFactory = Arc<dyn Fn() -> Result<Box<dyn Extension>> + Send + Sync>;

/// What the loader knows about one compiled unit.
#[derive(Clone)]
pub struct UnitSpec {
    marker: bool,
    factory: Option<ExtensionFactory>,
}

impl UnitSpec {
    /// An extension unit with a zero-argument constructor.
    pub fn extension<F>(factory: F) -> Self
    where
        F: Fn() -> Result<Box<dyn Extension>> + Send + Sync + 'static,
    {
        Self {
            marker: true,
            factory: Some(Arc::new(factory)),
        }
    }

    /// An extension unit that lacks a zero-argument constructor and can
    /// therefore never be auto-instantiated.
    pub fn extension_without_constructor() -> Self {
        Self {
            marker: true,
            factory: None,
        }
    }

    /// A unit that does not satisfy the extension marker contract.
    pub fn support() -> Self {
        Self {
            marker: false,
            factory: None,
        }
    }

    /// Whether the unit satisfies the extension marker contract.
    pub fn is_extension(&self) -> bool {
        self.marker
    }

    pub fn factory(&self) -> Option<&ExtensionFactory> {
        self.factory.as_ref()
    }
}

impl std::fmt::Debug for UnitSpec {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UnitSpec")
            .field("marker", &self.marker)
            .field("constructible", &self.factory.is_some())
            .finish()
    }
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum LoadError {
    #[error("unit {0:?} is not linked into this host build")]
    Unresolved(String),
}

/// Resolves qualified unit names. Implementations must be deterministic for
/// the duration of one scan.
pub trait UnitLoader {
    fn load(&self, qualified_name: &str) -> Result<&UnitSpec, LoadError>;
}

/// Registration-table loader. Populated once during startup, read-only
/// afterwards.
#[derive(Debug, Default)]
pub struct StaticUnitLoader {
    units: HashMap<String, UnitSpec>,
}

impl StaticUnitLoader {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a unit under its fully-qualified name. Later registrations
    /// replace earlier ones; manifests are expected not to repeat names.
    pub fn register(&mut self, qualified_name: impl Into<String>, spec: UnitSpec) -> &mut Self {
        self.units.insert(qualified_name.into(), spec);
        self
    }

    pub fn len(&self) -> usize {
        self.units.len()
    }

    pub fn is_empty(&self) -> bool {
        self.units.is_empty()
    }
}

impl UnitLoader for StaticUnitLoader {
    fn load(&self, qualified_name: &str) -> Result<&UnitSpec, LoadError> {
        self.units
            .get(qualified_name)
            .ok_or_else(|| LoadError::Unresolved(qualified_name.to_string()))
    }
}
