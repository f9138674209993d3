//! Runtime extension discovery.
//!
//! A bundle is a packaged collection of compiled-unit entries addressable by
//! path-like names. The scanner walks the entries, filters candidates
//! against the [`Extension`] marker contract, instantiates them, and
//! registers each under its unique keyword, tolerating individual failures
//! without aborting the whole scan.
//!
//! Unit resolution itself sits behind the narrow [`UnitLoader`] seam; the
//! standard implementation is an explicit registration table populated at
//! startup, not reflective loading.

pub mod archive;
pub mod extension;
pub mod loader;
pub mod scanner;

pub use archive::{BundleArchive, DirArchive, MemoryArchive, UNIT_SUFFIX};
pub use extension::{Extension, ExtensionDescriptor, ExtensionRegistry};
pub use loader::{LoadError, StaticUnitLoader, UnitLoader, UnitSpec};
pub use scanner::{scan, DiagnosticKind, ScanDiagnostic, ScanError, ScanResult, MARKER_ENTRY};
