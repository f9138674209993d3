//! Built-in mechanics extensions and the registration manifest for the
//! units compiled into this host build.
//!
//! The scanner resolves bundle entries against this manifest. Third-party
//! bundles extend the manifest through [`builtin_units`]'s returned loader
//! before the startup scan runs.

use crate::scan::{Extension, StaticUnitLoader, UnitSpec};

/// Explosion mechanic configuration hook.
#[derive(Debug, Default)]
pub struct Explosion;

impl Extension for Explosion {
    fn keyword(&self) -> &str {
        "explosion"
    }
}

/// Projectile mechanic configuration hook.
#[derive(Debug, Default)]
pub struct Projectile;

impl Extension for Projectile {
    fn keyword(&self) -> &str {
        "projectile"
    }
}

/// Melee mechanic configuration hook.
#[derive(Debug, Default)]
pub struct Melee;

impl Extension for Melee {
    fn keyword(&self) -> &str {
        "melee"
    }
}

/// Template implementation kept for documentation purposes. Ships in the
/// bundle but is denylisted by simple name so it is never auto-registered.
#[derive(Debug, Default)]
pub struct DefaultMechanics;

impl Extension for DefaultMechanics {
    fn keyword(&self) -> &str {
        "default"
    }
}

fn unit<E: Extension + Default + 'static>() -> UnitSpec {
    UnitSpec::extension(|| Ok(Box::new(E::default())))
}

/// The registration manifest for this build's compiled units.
pub fn builtin_units() -> StaticUnitLoader {
    let mut loader = StaticUnitLoader::new();
    loader
        .register("armory.mechanics.Explosion", unit::<Explosion>())
        .register("armory.mechanics.Projectile", unit::<Projectile>())
        .register("armory.mechanics.Melee", unit::<Melee>())
        .register("armory.mechanics.DefaultMechanics", unit::<DefaultMechanics>())
        .register("armory.util.Geometry", UnitSpec::support());
    loader
}

/// Entry names matching [`builtin_units`], for generating a default bundle.
pub fn builtin_entries() -> Vec<&'static str> {
    vec![
        "armory/mechanics/Explosion.unit",
        "armory/mechanics/Projectile.unit",
        "armory/mechanics/Melee.unit",
        "armory/mechanics/DefaultMechanics.unit",
        "armory/util/Geometry.unit",
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scan::{scan, MemoryArchive};

    #[test]
    fn builtin_bundle_scans_clean() {
        let archive = MemoryArchive::new(builtin_entries());
        let result = scan(&archive, &builtin_units(), &[]).unwrap();

        assert_eq!(
            result.keywords(),
            vec!["explosion", "projectile", "melee", "default"]
        );
        assert!(result.diagnostics.is_empty());
    }

    #[test]
    fn default_mechanics_is_denylistable() {
        let archive = MemoryArchive::new(builtin_entries());
        let excluded = vec!["DefaultMechanics".to_string()];
        let result = scan(&archive, &builtin_units(), &excluded).unwrap();

        assert!(!result.keywords().contains(&"default"));
        assert!(result.diagnostics.is_empty());
    }
}
