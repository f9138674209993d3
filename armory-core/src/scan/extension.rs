//! The extension marker contract and the registry built from a scan.

use std::collections::BTreeMap;
use std::sync::Arc;

/// Marker contract for discoverable extensions.
///
/// This is the sole ABI the scanner depends on: a stable, non-empty
/// [`keyword`](Extension::keyword) plus a zero-argument constructor
/// registered with the unit loader.
pub trait Extension: Send + Sync {
    /// Stable registration keyword, unique across a scan result.
    fn keyword(&self) -> &str;
}

/// A discovered extension: its keyword and the singleton instance.
#[derive(Clone)]
pub struct ExtensionDescriptor {
    pub keyword: String,
    pub instance: Arc<dyn Extension>,
}

impl std::fmt::Debug for ExtensionDescriptor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ExtensionDescriptor")
            .field("keyword", &self.keyword)
            .finish()
    }
}

/// Keyword-indexed view over a scan result; the registry the rest of the
/// system consults.
#[derive(Default)]
pub struct ExtensionRegistry {
    extensions: BTreeMap<String, Arc<dyn Extension>>,
}

impl std::fmt::Debug for ExtensionRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_set().entries(self.extensions.keys()).finish()
    }
}

impl ExtensionRegistry {
    pub fn from_scan(result: &super::scanner::ScanResult) -> Self {
        let mut extensions = BTreeMap::new();
        for descriptor in &result.extensions {
            extensions.insert(descriptor.keyword.clone(), descriptor.instance.clone());
        }
        Self { extensions }
    }

    pub fn get(&self, keyword: &str) -> Option<&Arc<dyn Extension>> {
        self.extensions.get(keyword)
    }

    pub fn contains(&self, keyword: &str) -> bool {
        self.extensions.contains_key(keyword)
    }

    pub fn keywords(&self) -> impl Iterator<Item = &str> {
        self.extensions.keys().map(|k| k.as_str())
    }

    pub fn len(&self) -> usize {
        self.extensions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.extensions.is_empty()
    }
}
