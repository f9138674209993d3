//! Startup orchestration.
//!
//! Initialization is single-threaded and runs once on the host's main
//! thread: probe the version, populate and seal the capability tables,
//! resolve the process-lifetime adapters, then scan the extension bundle.
//! Nothing else consults the registries until bootstrap returns, so no
//! locking is needed during this phase; afterwards everything handed out is
//! read-only and freely shareable.
//!
//! A capability without a valid binding for the detected version is fatal:
//! bootstrap refuses to complete rather than run with a missing adapter.

use std::sync::Arc;

use anyhow::{Context, Result};
use tracing::info;

use crate::compat::equip::{self, EquipmentCompat};
use crate::compat::region::{self, FlagEngine, RegionCompat};
use crate::compat::version::{probe, HostInfo, VersionTag};
use crate::mechanics;
use crate::scan::{scan, BundleArchive, ExtensionRegistry, ScanResult, StaticUnitLoader};
use crate::settings::Settings;

/// Fully initialized host core. Everything here is safe to share across
/// worker threads.
pub struct Host {
    pub version: VersionTag,
    pub equipment: Arc<dyn EquipmentCompat>,
    pub region: Arc<dyn RegionCompat>,
    pub extensions: ExtensionRegistry,
    /// The full scan outcome, kept so operators can inspect diagnostics.
    pub scan_report: ScanResult,
}

/// Builder for the one-shot startup sequence.
pub struct HostBootstrap {
    settings: Settings,
    host_info: HostInfo,
    engine: Arc<dyn FlagEngine>,
    units: StaticUnitLoader,
}

impl HostBootstrap {
    pub fn new(settings: Settings, host_info: HostInfo, engine: Arc<dyn FlagEngine>) -> Self {
        Self {
            settings,
            host_info,
            engine,
            units: mechanics::builtin_units(),
        }
    }

    /// Replaces the unit manifest, for host builds that link additional
    /// units beyond the built-in mechanics.
    pub fn with_units(mut self, units: StaticUnitLoader) -> Self {
        self.units = units;
        self
    }

    /// Runs the startup sequence against `archive`.
    pub fn bootstrap(self, archive: &dyn BundleArchive) -> Result<Host> {
        let version = match &self.settings.compat.version_override {
            Some(raw) => raw
                .parse()
                .with_context(|| format!("invalid version override {raw:?}"))?,
            None => probe(&self.host_info)?,
        };
        info!(%version, brand = %self.host_info.brand, "host version detected");

        let mut equipment_table = equip::builtin_table()?;
        equipment_table.seal();
        let equipment = equipment_table.resolve(version)?;
        info!(adapter = equipment.target(), "equipment capability bound");

        let mut region_table =
            region::builtin_table(self.engine.clone(), self.settings.flags.unknown_flag)?;
        region_table.seal();
        let region = region_table.resolve(version)?;
        if !region.is_installed() {
            info!("no external flag engine installed; region flags are inert");
        }

        let scan_report = scan(archive, &self.units, &self.settings.scanner.excluded_names)?;
        let extensions = ExtensionRegistry::from_scan(&scan_report);

        Ok(Host {
            version,
            equipment,
            region,
            extensions,
            scan_report,
        })
    }
}
