use thiserror::Error;

use super::version::VersionTag;

#[derive(Debug, Error)]
pub enum CompatError {
    #[error("unsupported host: cannot derive a version tag from {reported:?}")]
    UnsupportedHost { reported: String },

    #[error("no {capability} implementation registered at or below host version {tag}")]
    UnsupportedVersion {
        capability: &'static str,
        tag: VersionTag,
    },

    #[error("{capability} already has a binding for version {tag}")]
    DuplicateBinding {
        capability: &'static str,
        tag: VersionTag,
    },

    #[error("{capability} registry is sealed; registration happens only during startup")]
    RegistrySealed { capability: &'static str },
}
