//! The bundle scanner.
//!
//! One pass over a bundle's entries produces the extensions to register plus
//! a diagnostic for every entry that was skipped for cause. A single bad
//! entry never aborts the scan; only failure to read the archive itself
//! does.

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;

use serde::Serialize;
use thiserror::Error;
use tracing::{debug, info, warn};

use super::archive::{BundleArchive, UNIT_SUFFIX};
use super::extension::ExtensionDescriptor;
use super::loader::UnitLoader;

/// Entry defining the extension marker contract itself. It can never
/// register as an extension.
pub const MARKER_ENTRY: &str = "armory/scan/Extension.unit";

/// Archive-level failure: the bundle could not be read at all.
#[derive(Debug, Error)]
pub enum ScanError {
    #[error("bundle archive {path:?} could not be read")]
    Aborted {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Reason an entry was skipped. All per-entry, all recoverable.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "reason", rename_all = "snake_case")]
pub enum DiagnosticKind {
    /// The unit could not be resolved (unlinked dependency, stale entry).
    LoadFailure { detail: String },
    /// The unit satisfies the marker contract but has no zero-argument
    /// constructor.
    MissingConstructor,
    /// The unit's constructor returned an error.
    InstantiationFailure { detail: String },
    /// The constructed instance reported no usable keyword.
    InvalidExtension,
    /// Another unit already owns this keyword; the first registration wins.
    DuplicateKeyword { keyword: String, first_owner: String },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ScanDiagnostic {
    /// Qualified name of the unit the diagnostic is about.
    pub unit: String,
    #[serde(flatten)]
    pub kind: DiagnosticKind,
}

/// Ordered extensions plus the per-entry diagnostic log. Never contains two
/// descriptors with the same keyword.
#[derive(Debug, Default)]
pub struct ScanResult {
    pub extensions: Vec<ExtensionDescriptor>,
    pub diagnostics: Vec<ScanDiagnostic>,
}

impl ScanResult {
    pub fn keywords(&self) -> Vec<&str> {
        self.extensions.iter().map(|d| d.keyword.as_str()).collect()
    }

    fn diagnose(&mut self, unit: &str, kind: DiagnosticKind) {
        self.diagnostics.push(ScanDiagnostic {
            unit: unit.to_string(),
            kind,
        });
    }
}

/// Scans `archive` for extension units.
///
/// Per entry: non-unit entries and the marker contract's own entry are
/// skipped; units whose simple name matches `excluded_names`
/// (case-insensitively) are skipped silently; units that do not satisfy the
/// marker contract are skipped without diagnostic; everything else that
/// fails produces a diagnostic and the scan continues. Duplicate keywords
/// keep the first registration, in archive enumeration order.
pub fn scan(
    archive: &dyn BundleArchive,
    loader: &dyn UnitLoader,
    excluded_names: &[String],
) -> Result<ScanResult, ScanError> {
    let entries = archive.entries()?;

    let mut result = ScanResult::default();
    // keyword -> qualified name of the first owner
    let mut owners: HashMap<String, String> = HashMap::new();

    for entry in &entries {
        if !entry.ends_with(UNIT_SUFFIX) || entry == MARKER_ENTRY {
            continue;
        }

        let qualified = qualified_name(entry);

        let spec = match loader.load(&qualified) {
            Ok(spec) => spec,
            Err(e) => {
                debug!(unit = %qualified, error = %e, "unit failed to load, skipping");
                result.diagnose(
                    &qualified,
                    DiagnosticKind::LoadFailure {
                        detail: e.to_string(),
                    },
                );
                continue;
            }
        };

        let simple = simple_name(&qualified);
        if excluded_names.iter().any(|n| n.eq_ignore_ascii_case(simple)) {
            debug!(unit = %qualified, "unit is denylisted, skipping");
            continue;
        }

        if !spec.is_extension() {
            continue;
        }

        let Some(factory) = spec.factory() else {
            warn!(
                unit = %qualified,
                "extension unit has no zero-argument constructor; add one to make it discoverable"
            );
            result.diagnose(&qualified, DiagnosticKind::MissingConstructor);
            continue;
        };

        let instance = match factory() {
            Ok(instance) => instance,
            Err(e) => {
                warn!(unit = %qualified, error = %e, "extension construction failed");
                result.diagnose(
                    &qualified,
                    DiagnosticKind::InstantiationFailure {
                        detail: e.to_string(),
                    },
                );
                continue;
            }
        };

        let keyword = instance.keyword().to_string();
        if keyword.is_empty() {
            warn!(unit = %qualified, "extension reported no keyword");
            result.diagnose(&qualified, DiagnosticKind::InvalidExtension);
            continue;
        }

        if let Some(first_owner) = owners.get(&keyword) {
            warn!(
                keyword = %keyword,
                first_owner = %first_owner,
                rejected = %qualified,
                "duplicate extension keyword; keeping the first registration"
            );
            let first_owner = first_owner.clone();
            result.diagnose(
                &qualified,
                DiagnosticKind::DuplicateKeyword {
                    keyword,
                    first_owner,
                },
            );
            continue;
        }

        debug!(keyword = %keyword, unit = %qualified, "discovered extension");
        owners.insert(keyword.clone(), qualified.clone());
        result.extensions.push(ExtensionDescriptor {
            keyword,
            instance: Arc::from(instance),
        });
    }

    info!(
        extensions = result.extensions.len(),
        diagnostics = result.diagnostics.len(),
        "bundle scan complete"
    );
    Ok(result)
}

/// `armory/mechanics/Explosion.unit` -> `armory.mechanics.Explosion`
fn qualified_name(entry: &str) -> String {
    entry
        .strip_suffix(UNIT_SUFFIX)
        .unwrap_or(entry)
        .replace('/', ".")
}

fn simple_name(qualified: &str) -> &str {
    qualified.rsplit('.').next().unwrap_or(qualified)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scan::archive::MemoryArchive;
    use crate::scan::extension::{Extension, ExtensionRegistry};
    use crate::scan::loader::{StaticUnitLoader, UnitSpec};
    use anyhow::anyhow;

    struct Keyed(&'static str);
    impl Extension for Keyed {
        fn keyword(&self) -> &str {
            self.0
        }
    }

    fn keyed(keyword: &'static str) -> UnitSpec {
        UnitSpec::extension(move || Ok(Box::new(Keyed(keyword))))
    }

    fn no_excludes() -> Vec<String> {
        Vec::new()
    }

    #[test]
    fn end_to_end_duplicate_and_non_extension() {
        // Three entries: an extension keyed "alpha", a second unit claiming
        // "alpha", and a unit that is not an extension at all.
        let archive = MemoryArchive::new([
            "armory/mechanics/Alpha.unit",
            "armory/mechanics/AlphaClone.unit",
            "armory/util/Geometry.unit",
        ]);
        let mut loader = StaticUnitLoader::new();
        loader.register("armory.mechanics.Alpha", keyed("alpha"));
        loader.register("armory.mechanics.AlphaClone", keyed("alpha"));
        loader.register("armory.util.Geometry", UnitSpec::support());

        let result = scan(&archive, &loader, &no_excludes()).unwrap();

        assert_eq!(result.keywords(), vec!["alpha"]);
        assert_eq!(result.diagnostics.len(), 1);
        assert_eq!(
            result.diagnostics[0],
            ScanDiagnostic {
                unit: "armory.mechanics.AlphaClone".to_string(),
                kind: DiagnosticKind::DuplicateKeyword {
                    keyword: "alpha".to_string(),
                    first_owner: "armory.mechanics.Alpha".to_string(),
                },
            }
        );
    }

    #[test]
    fn first_registration_wins_in_archive_order() {
        let archive = MemoryArchive::new(["b/Second.unit", "a/First.unit"]);
        let mut loader = StaticUnitLoader::new();
        loader.register("b.Second", keyed("shared"));
        loader.register("a.First", keyed("shared"));

        let result = scan(&archive, &loader, &no_excludes()).unwrap();

        // Archive enumeration order decides, not name order.
        assert_eq!(result.extensions.len(), 1);
        assert_eq!(
            result.extensions[0].instance.keyword(),
            "shared"
        );
        assert!(matches!(
            &result.diagnostics[0].kind,
            DiagnosticKind::DuplicateKeyword { first_owner, .. } if first_owner == "b.Second"
        ));
    }

    #[test]
    fn non_unit_entries_and_marker_entry_are_skipped() {
        let archive = MemoryArchive::new([
            "bundle.toml",
            "armory/scan/Extension.unit",
            "armory/mechanics/Alpha.unit",
        ]);
        let mut loader = StaticUnitLoader::new();
        loader.register("armory.mechanics.Alpha", keyed("alpha"));

        let result = scan(&archive, &loader, &no_excludes()).unwrap();

        assert_eq!(result.keywords(), vec!["alpha"]);
        assert!(result.diagnostics.is_empty());
    }

    #[test]
    fn load_failure_is_diagnosed_and_scan_continues() {
        let archive = MemoryArchive::new(["gone/Stale.unit", "a/Alpha.unit"]);
        let mut loader = StaticUnitLoader::new();
        loader.register("a.Alpha", keyed("alpha"));

        let result = scan(&archive, &loader, &no_excludes()).unwrap();

        assert_eq!(result.keywords(), vec!["alpha"]);
        assert!(matches!(
            &result.diagnostics[0].kind,
            DiagnosticKind::LoadFailure { .. }
        ));
    }

    #[test]
    fn denylisted_simple_name_is_skipped_silently() {
        let archive = MemoryArchive::new(["armory/mechanics/DefaultMechanics.unit"]);
        let mut loader = StaticUnitLoader::new();
        loader.register("armory.mechanics.DefaultMechanics", keyed("default"));

        let excluded = vec!["defaultmechanics".to_string()];
        let result = scan(&archive, &loader, &excluded).unwrap();

        assert!(result.extensions.is_empty());
        assert!(result.diagnostics.is_empty());
    }

    #[test]
    fn missing_constructor_is_diagnosed() {
        let archive = MemoryArchive::new(["a/NoCtor.unit"]);
        let mut loader = StaticUnitLoader::new();
        loader.register("a.NoCtor", UnitSpec::extension_without_constructor());

        let result = scan(&archive, &loader, &no_excludes()).unwrap();

        assert!(result.extensions.is_empty());
        assert_eq!(
            result.diagnostics[0].kind,
            DiagnosticKind::MissingConstructor
        );
    }

    #[test]
    fn failing_constructor_is_diagnosed() {
        let archive = MemoryArchive::new(["a/Broken.unit"]);
        let mut loader = StaticUnitLoader::new();
        loader.register(
            "a.Broken",
            UnitSpec::extension(|| Err(anyhow!("config table missing"))),
        );

        let result = scan(&archive, &loader, &no_excludes()).unwrap();

        assert!(result.extensions.is_empty());
        assert!(matches!(
            &result.diagnostics[0].kind,
            DiagnosticKind::InstantiationFailure { detail } if detail.contains("config table")
        ));
    }

    #[test]
    fn empty_keyword_is_invalid() {
        let archive = MemoryArchive::new(["a/Anon.unit"]);
        let mut loader = StaticUnitLoader::new();
        loader.register("a.Anon", keyed(""));

        let result = scan(&archive, &loader, &no_excludes()).unwrap();

        assert!(result.extensions.is_empty());
        assert_eq!(result.diagnostics[0].kind, DiagnosticKind::InvalidExtension);
    }

    #[test]
    fn mixed_bundle_counts_add_up() {
        // 3 valid (one pair shares a keyword), 3 invalid for distinct causes.
        let archive = MemoryArchive::new([
            "a/One.unit",
            "a/Two.unit",
            "a/TwoClone.unit",
            "a/Unlinked.unit",
            "a/NoCtor.unit",
            "a/Broken.unit",
        ]);
        let mut loader = StaticUnitLoader::new();
        loader.register("a.One", keyed("one"));
        loader.register("a.Two", keyed("two"));
        loader.register("a.TwoClone", keyed("two"));
        loader.register("a.NoCtor", UnitSpec::extension_without_constructor());
        loader.register("a.Broken", UnitSpec::extension(|| Err(anyhow!("boom"))));

        let result = scan(&archive, &loader, &no_excludes()).unwrap();

        assert_eq!(result.keywords(), vec!["one", "two"]);
        assert_eq!(result.diagnostics.len(), 4);
    }

    #[test]
    fn aborted_archive_is_a_top_level_error() {
        struct Broken;
        impl BundleArchive for Broken {
            fn entries(&self) -> Result<Vec<String>, ScanError> {
                Err(ScanError::Aborted {
                    path: "bundle".into(),
                    source: std::io::Error::other("disk pulled"),
                })
            }
        }

        let loader = StaticUnitLoader::new();
        let err = scan(&Broken, &loader, &no_excludes()).unwrap_err();
        assert!(matches!(err, ScanError::Aborted { .. }));
    }

    #[test]
    fn diagnostics_serialize_with_a_reason_tag() {
        let diagnostic = ScanDiagnostic {
            unit: "a.TwoClone".to_string(),
            kind: DiagnosticKind::DuplicateKeyword {
                keyword: "two".to_string(),
                first_owner: "a.Two".to_string(),
            },
        };

        let json = serde_json::to_value(&diagnostic).unwrap();
        assert_eq!(json["unit"], "a.TwoClone");
        assert_eq!(json["reason"], "duplicate_keyword");
        assert_eq!(json["first_owner"], "a.Two");
    }

    #[test]
    fn registry_indexes_scan_result_by_keyword() {
        let archive = MemoryArchive::new(["a/One.unit", "a/Two.unit"]);
        let mut loader = StaticUnitLoader::new();
        loader.register("a.One", keyed("one"));
        loader.register("a.Two", keyed("two"));

        let result = scan(&archive, &loader, &no_excludes()).unwrap();
        let registry = ExtensionRegistry::from_scan(&result);

        assert_eq!(registry.len(), 2);
        assert!(registry.contains("one"));
        assert_eq!(registry.get("two").unwrap().keyword(), "two");
        assert!(registry.get("three").is_none());
    }
}
