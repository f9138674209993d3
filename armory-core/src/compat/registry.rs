//! Capability binding tables.
//!
//! One table per capability maps version tags to implementation factories.
//! Registration happens during single-threaded startup; after [`seal`] the
//! table is read-only and safe to consult from any thread. Implementations
//! are expensive to construct and stateless after construction, so the table
//! caches every resolution for the process lifetime.
//!
//! [`seal`]: CapabilityTable::seal

use std::collections::BTreeMap;
use std::sync::{Arc, Mutex};

use tracing::debug;

use super::error::CompatError;
use super::version::VersionTag;

type Factory<C> = Box<dyn Fn() -> Arc<C> + Send + Sync>;

/// Strategy table for one capability: `(VersionTag -> factory)` behind the
/// capability's trait object. Adding a host version is a one-line
/// registration, not a new inheritance branch.
pub struct CapabilityTable<C: ?Sized> {
    capability: &'static str,
    bindings: BTreeMap<VersionTag, Factory<C>>,
    cache: Mutex<BTreeMap<VersionTag, Arc<C>>>,
    sealed: bool,
}

impl<C: ?Sized> CapabilityTable<C> {
    pub fn new(capability: &'static str) -> Self {
        Self {
            capability,
            bindings: BTreeMap::new(),
            cache: Mutex::new(BTreeMap::new()),
            sealed: false,
        }
    }

    /// The capability name this table dispatches, used in errors and logs.
    pub fn capability(&self) -> &'static str {
        self.capability
    }

    /// Adds a binding for `tag`. At most one binding may exist per tag;
    /// registering a duplicate is rejected unless done through
    /// [`register_or_replace`](Self::register_or_replace).
    pub fn register(
        &mut self,
        tag: VersionTag,
        factory: impl Fn() -> Arc<C> + Send + Sync + 'static,
    ) -> Result<(), CompatError> {
        self.check_open()?;
        if self.bindings.contains_key(&tag) {
            return Err(CompatError::DuplicateBinding {
                capability: self.capability,
                tag,
            });
        }
        debug!(capability = self.capability, %tag, "registered capability binding");
        self.bindings.insert(tag, Box::new(factory));
        Ok(())
    }

    /// Adds a binding for `tag`, replacing any existing one. Still rejected
    /// once the table is sealed.
    pub fn register_or_replace(
        &mut self,
        tag: VersionTag,
        factory: impl Fn() -> Arc<C> + Send + Sync + 'static,
    ) -> Result<(), CompatError> {
        self.check_open()?;
        debug!(capability = self.capability, %tag, "registered capability binding (replace)");
        self.bindings.insert(tag, Box::new(factory));
        Ok(())
    }

    /// Closes the table to further registration. Startup must seal every
    /// table before other threads are allowed to resolve from it.
    pub fn seal(&mut self) {
        self.sealed = true;
    }

    pub fn is_sealed(&self) -> bool {
        self.sealed
    }

    /// Tags with an explicit binding, in ascending order.
    pub fn supported_tags(&self) -> Vec<VersionTag> {
        self.bindings.keys().copied().collect()
    }

    /// Returns the implementation live for `tag`.
    ///
    /// Exact-match lookup first, then fallback to the nearest binding at or
    /// below `tag`: host APIs are backward-compatible within a tag family,
    /// so an older adapter serves newer hosts until a dedicated one is
    /// registered. Fails with [`CompatError::UnsupportedVersion`] when no
    /// binding exists at or below `tag`.
    ///
    /// Resolution is cached per tag; repeated calls return the same instance.
    pub fn resolve(&self, tag: VersionTag) -> Result<Arc<C>, CompatError> {
        // The lock is held across construction so concurrent first
        // resolutions for one tag cannot each mint their own instance.
        let mut cache = self.cache.lock().unwrap();
        if let Some(hit) = cache.get(&tag) {
            return Ok(hit.clone());
        }

        let (bound, factory) =
            self.bindings
                .range(..=tag)
                .next_back()
                .ok_or(CompatError::UnsupportedVersion {
                    capability: self.capability,
                    tag,
                })?;

        let instance = factory();
        debug!(
            capability = self.capability,
            requested = %tag,
            bound = %bound,
            "resolved capability implementation"
        );
        cache.insert(tag, instance.clone());
        Ok(instance)
    }

    fn check_open(&self) -> Result<(), CompatError> {
        if self.sealed {
            return Err(CompatError::RegistrySealed {
                capability: self.capability,
            });
        }
        Ok(())
    }
}

impl<C: ?Sized> std::fmt::Debug for CapabilityTable<C> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CapabilityTable")
            .field("capability", &self.capability)
            .field("bindings", &self.supported_tags())
            .field("sealed", &self.sealed)
            .finish()
    }
}
