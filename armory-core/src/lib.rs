pub mod compat;
pub mod host;
pub mod mechanics;
pub mod scan;
pub mod settings;
pub mod slots;

// Public library API - if you are using armory as a library, I will aim to
// keep these types more stable (but everything is public so go nuts).
pub use compat::equip::{EquipmentCompat, ItemSnapshot};
pub use compat::region::{FlagBridge, FlagEngine, FlagKind, FlagValue, RegionCompat};
pub use compat::registry::CapabilityTable;
pub use compat::version::{probe, HostInfo, VersionTag};
pub use compat::CompatError;
pub use host::{Host, HostBootstrap};
pub use scan::{
    scan, BundleArchive, DirArchive, Extension, ExtensionRegistry, MemoryArchive, ScanResult,
    StaticUnitLoader, UnitSpec,
};
pub use settings::{Settings, UnknownFlagPolicy};
pub use slots::SlotArray;
