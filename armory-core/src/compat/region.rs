//! Region-protection flag bridge.
//!
//! The external flag engine owns the authoritative flag registry and answers
//! region queries; this adapter registers the flags the mechanics need and
//! keeps a typed local lookup table. The engine is an opaque collaborator
//! with its own lifecycle, so callers must consult
//! [`RegionCompat::is_installed`] before attempting any flag operation.

use std::collections::BTreeMap;
use std::sync::{Arc, Mutex, RwLock};

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, error, warn};

use super::error::CompatError;
use super::registry::CapabilityTable;
use super::version::VersionTag;
use crate::settings::UnknownFlagPolicy;

/// Kind of a typed flag understood by the external engine. A flag name maps
/// to exactly one kind for the lifetime of the adapter.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Serialize,
    Deserialize,
    strum::Display,
    strum::EnumString,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum FlagKind {
    Integer,
    State,
    Double,
    String,
}

/// Value returned by an engine query.
#[derive(Debug, Clone, PartialEq)]
pub enum FlagValue {
    Integer(i64),
    State(bool),
    Double(f64),
    String(String),
}

impl FlagValue {
    pub fn kind(&self) -> FlagKind {
        match self {
            FlagValue::Integer(_) => FlagKind::Integer,
            FlagValue::State(_) => FlagKind::State,
            FlagValue::Double(_) => FlagKind::Double,
            FlagValue::String(_) => FlagKind::String,
        }
    }
}

/// Opaque handle to a flag inside the external engine's registry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct FlagHandle(pub u64);

/// A world position a flag query applies to.
#[derive(Debug, Clone, PartialEq)]
pub struct Position {
    pub world: String,
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl Position {
    pub fn new(world: impl Into<String>, x: f64, y: f64, z: f64) -> Self {
        Self {
            world: world.into(),
            x,
            y,
            z,
        }
    }
}

#[derive(Debug, Error)]
pub enum FlagError {
    #[error("flag {name:?} is already registered as {existing}, not {requested}")]
    IncompatibleFlagType {
        name: String,
        existing: FlagKind,
        requested: FlagKind,
    },
}

/// Outcome of handing a flag definition to the external engine.
#[derive(Debug, Clone, Copy)]
pub enum FlagRegistration {
    /// The engine accepted the new flag.
    Created(FlagHandle),
    /// Another plugin already registered this name; the engine reports the
    /// existing flag and its kind.
    Conflict {
        existing: FlagHandle,
        kind: FlagKind,
    },
}

/// Boundary to the external region-protection engine.
pub trait FlagEngine: Send + Sync {
    fn is_installed(&self) -> bool;

    fn register(&self, name: &str, kind: FlagKind) -> FlagRegistration;

    /// Region query for a state flag at `position`, optionally on behalf of
    /// a named actor.
    fn test_state(&self, position: &Position, actor: Option<&str>, handle: FlagHandle) -> bool;

    /// Region query for any flag kind. `None` when no region at `position`
    /// sets the flag.
    fn query(&self, position: &Position, handle: FlagHandle) -> Option<FlagValue>;
}

/// Capability contract for the flag bridge. Safe for concurrent reads after
/// startup registration completes.
pub trait RegionCompat: Send + Sync {
    fn is_installed(&self) -> bool;

    fn register_flag(&self, name: &str, kind: FlagKind) -> Result<(), FlagError>;

    /// Tests a state flag at `position`. Unknown or non-state flags resolve
    /// through the configured [`UnknownFlagPolicy`].
    fn test_flag(&self, position: &Position, actor: Option<&str>, name: &str) -> bool;

    /// Queries a flag's value at `position`. Unknown flags yield `None`.
    fn get_value(&self, position: &Position, name: &str) -> Option<FlagValue>;

    /// Kind the adapter has locally registered for `name`, if any.
    fn registered_kind(&self, name: &str) -> Option<FlagKind>;
}

#[derive(Debug, Clone, Copy)]
struct RegisteredFlag {
    handle: FlagHandle,
    kind: FlagKind,
}

/// Flag-bridge adapter over an installed [`FlagEngine`].
pub struct FlagBridge {
    engine: Arc<dyn FlagEngine>,
    policy: UnknownFlagPolicy,
    flags: RwLock<BTreeMap<String, RegisteredFlag>>,
}

impl FlagBridge {
    pub fn new(engine: Arc<dyn FlagEngine>, policy: UnknownFlagPolicy) -> Self {
        Self {
            engine,
            policy,
            flags: RwLock::new(BTreeMap::new()),
        }
    }

    fn known_flags(&self) -> String {
        self.flags
            .read()
            .unwrap()
            .keys()
            .cloned()
            .collect::<Vec<_>>()
            .join(", ")
    }

    fn unknown(&self, name: &str, detail: &str) -> bool {
        warn!(
            flag = name,
            known = %self.known_flags(),
            policy = ?self.policy,
            "{detail}; applying unknown-flag policy"
        );
        self.policy.allows()
    }
}

impl RegionCompat for FlagBridge {
    fn is_installed(&self) -> bool {
        self.engine.is_installed()
    }

    fn register_flag(&self, name: &str, kind: FlagKind) -> Result<(), FlagError> {
        match self.engine.register(name, kind) {
            FlagRegistration::Created(handle) => {
                debug!(flag = name, %kind, "registered flag with engine");
                self.flags
                    .write()
                    .unwrap()
                    .insert(name.to_string(), RegisteredFlag { handle, kind });
                Ok(())
            }
            FlagRegistration::Conflict {
                existing,
                kind: existing_kind,
            } if existing_kind == kind => {
                // Idempotent join: another plugin got there first with a
                // compatible definition, so adopt its flag object.
                warn!(
                    flag = name,
                    %kind,
                    "flag already registered elsewhere; adopting the existing definition. \
                     This may cause compatibility issues"
                );
                self.flags.write().unwrap().insert(
                    name.to_string(),
                    RegisteredFlag {
                        handle: existing,
                        kind,
                    },
                );
                Ok(())
            }
            FlagRegistration::Conflict {
                kind: existing_kind,
                ..
            } => {
                // The name stays out of the local table: adopting a flag of
                // the wrong kind would leave lookups lying about its type.
                error!(
                    flag = name,
                    existing = %existing_kind,
                    requested = %kind,
                    "flag is already registered with an incompatible kind"
                );
                Err(FlagError::IncompatibleFlagType {
                    name: name.to_string(),
                    existing: existing_kind,
                    requested: kind,
                })
            }
        }
    }

    fn test_flag(&self, position: &Position, actor: Option<&str>, name: &str) -> bool {
        let flag = match self.flags.read().unwrap().get(name).copied() {
            Some(flag) => flag,
            None => return self.unknown(name, "flag does not exist"),
        };

        if flag.kind != FlagKind::State {
            return self.unknown(name, "flag is not a state flag");
        }

        self.engine.test_state(position, actor, flag.handle)
    }

    fn get_value(&self, position: &Position, name: &str) -> Option<FlagValue> {
        let flag = match self.flags.read().unwrap().get(name).copied() {
            Some(flag) => flag,
            None => {
                warn!(
                    flag = name,
                    known = %self.known_flags(),
                    "flag does not exist; no value to query"
                );
                return None;
            }
        };

        self.engine.query(position, flag.handle)
    }

    fn registered_kind(&self, name: &str) -> Option<FlagKind> {
        self.flags.read().unwrap().get(name).map(|f| f.kind)
    }
}

/// Binding table for the region capability. One bridge serves every
/// supported host release; newer hosts resolve to it by fallback until the
/// engine changes its API enough to need a dedicated adapter.
pub fn builtin_table(
    engine: Arc<dyn FlagEngine>,
    policy: UnknownFlagPolicy,
) -> Result<CapabilityTable<dyn RegionCompat>, CompatError> {
    let mut table: CapabilityTable<dyn RegionCompat> = CapabilityTable::new("region");
    table.register(VersionTag::new(1, 13, 0), move || {
        Arc::new(FlagBridge::new(engine.clone(), policy))
    })?;
    Ok(table)
}

/// In-memory flag engine used when no external engine is installed and by
/// tests that need a deterministic collaborator.
#[derive(Default)]
pub struct LocalFlagEngine {
    inner: Mutex<LocalEngineState>,
}

#[derive(Default)]
struct LocalEngineState {
    next_handle: u64,
    flags: BTreeMap<String, (FlagHandle, FlagKind)>,
    values: BTreeMap<(String, FlagHandle), FlagValue>,
}

impl LocalFlagEngine {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seeds a flag value for every query in `world`.
    pub fn set_world_value(&self, world: impl Into<String>, handle: FlagHandle, value: FlagValue) {
        self.inner
            .lock()
            .unwrap()
            .values
            .insert((world.into(), handle), value);
    }

    /// Pre-registers a flag as if a foreign plugin owned it.
    pub fn preregister(&self, name: impl Into<String>, kind: FlagKind) -> FlagHandle {
        let mut inner = self.inner.lock().unwrap();
        inner.next_handle += 1;
        let handle = FlagHandle(inner.next_handle);
        inner.flags.insert(name.into(), (handle, kind));
        handle
    }
}

impl FlagEngine for LocalFlagEngine {
    fn is_installed(&self) -> bool {
        true
    }

    fn register(&self, name: &str, kind: FlagKind) -> FlagRegistration {
        let mut inner = self.inner.lock().unwrap();
        if let Some(&(existing, existing_kind)) = inner.flags.get(name) {
            return FlagRegistration::Conflict {
                existing,
                kind: existing_kind,
            };
        }
        inner.next_handle += 1;
        let handle = FlagHandle(inner.next_handle);
        inner.flags.insert(name.to_string(), (handle, kind));
        FlagRegistration::Created(handle)
    }

    fn test_state(&self, position: &Position, _actor: Option<&str>, handle: FlagHandle) -> bool {
        matches!(
            self.query(position, handle),
            Some(FlagValue::State(true))
        )
    }

    fn query(&self, position: &Position, handle: FlagHandle) -> Option<FlagValue> {
        self.inner
            .lock()
            .unwrap()
            .values
            .get(&(position.world.clone(), handle))
            .cloned()
    }
}
