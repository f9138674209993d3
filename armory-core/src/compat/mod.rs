//! Version-adaptive capability dispatch.
//!
//! The host platform changes its internal APIs release to release. Each
//! capability this crate must satisfy regardless of host version is a trait;
//! concrete implementations are registered per version tag in a
//! [`registry::CapabilityTable`] and selected once at startup from the probed
//! [`version::VersionTag`]. Adding support for a new host release is an
//! additive registration, never a change to call sites.

pub mod equip;
pub mod error;
pub mod region;
pub mod registry;
pub mod version;

pub use equip::EquipmentCompat;
pub use error::CompatError;
pub use region::RegionCompat;
pub use registry::CapabilityTable;
pub use version::{probe, HostInfo, VersionTag};
