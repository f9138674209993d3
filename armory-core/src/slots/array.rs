//! Equivalence slot container.
//!
//! A `SlotArray` wraps a fixed-length sequence of mutable slots. Replacing a
//! slot's value compares old against new and, only when they differ under the
//! container's equivalence function, invokes the registered observer before
//! the new value is committed. Hosts re-assert unchanged values at high
//! frequency, so no-op replacements must stay silent.

use anyhow::Result;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SlotError {
    #[error("slot index {index} out of range for container of length {len}")]
    IndexOutOfRange { index: usize, len: usize },

    #[error("slot observer rejected transition at index {index}")]
    Observer {
        index: usize,
        #[source]
        source: anyhow::Error,
    },
}

type Equivalence<V> = Box<dyn Fn(&V, &V) -> bool + Send>;
type Observer<V> = Box<dyn FnMut(&V, &V, usize) -> Result<()> + Send>;

/// Fixed-length sequence of slots of `V` with transition observation.
///
/// The observer runs synchronously on the caller's thread, before the commit.
/// An observer error aborts the commit and propagates to the `set` caller.
/// Callers must serialize `set` calls per container (single-writer).
pub struct SlotArray<V> {
    slots: Vec<V>,
    equivalent: Equivalence<V>,
    observer: Option<Observer<V>>,
}

impl<V> SlotArray<V> {
    /// Creates a container of `len` slots, all holding `initial`, using `V`'s
    /// `PartialEq` as the equivalence function.
    pub fn new(len: usize, initial: V) -> Self
    where
        V: Clone + PartialEq + Send + 'static,
    {
        Self::with_equivalence(len, initial, |a, b| a == b)
    }

    /// Creates a container with a caller-supplied structural equivalence
    /// function. Host versions disagree about which item fields participate
    /// in identity, so the equivalence is pluggable.
    pub fn with_equivalence(
        len: usize,
        initial: V,
        equivalent: impl Fn(&V, &V) -> bool + Send + 'static,
    ) -> Self
    where
        V: Clone,
    {
        Self {
            slots: vec![initial; len],
            equivalent: Box::new(equivalent),
            observer: None,
        }
    }

    /// Registers the transition observer, replacing any previous one.
    ///
    /// The observer receives `(old, new, index)` and may return an error to
    /// abort the pending commit. It must hold only a non-owning reference
    /// back to its adapter.
    pub fn observe(&mut self, observer: impl FnMut(&V, &V, usize) -> Result<()> + Send + 'static) {
        self.observer = Some(Box::new(observer));
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&V> {
        self.slots.get(index)
    }

    /// Replaces the value at `index`, returning the previous value.
    ///
    /// If the new value is not equivalent to the current one, the observer
    /// fires exactly once before the commit; equivalent replacements commit
    /// silently. An out-of-range index leaves the container unmodified.
    pub fn set(&mut self, index: usize, value: V) -> Result<V, SlotError> {
        let len = self.slots.len();
        let Some(current) = self.slots.get(index) else {
            return Err(SlotError::IndexOutOfRange { index, len });
        };

        if !(self.equivalent)(current, &value) {
            if let Some(observer) = self.observer.as_mut() {
                observer(current, &value, index)
                    .map_err(|source| SlotError::Observer { index, source })?;
            }
        }

        Ok(std::mem::replace(&mut self.slots[index], value))
    }
}

impl<V: std::fmt::Debug> std::fmt::Debug for SlotArray<V> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SlotArray")
            .field("slots", &self.slots)
            .field("observed", &self.observer.is_some())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::anyhow;
    use std::sync::{Arc, Mutex};

    fn recording_array() -> (SlotArray<i32>, Arc<Mutex<Vec<(i32, i32, usize)>>>) {
        let events = Arc::new(Mutex::new(Vec::new()));
        let sink = events.clone();
        let mut array = SlotArray::new(4, 0);
        array.observe(move |old, new, index| {
            sink.lock().unwrap().push((*old, *new, index));
            Ok(())
        });
        (array, events)
    }

    #[test]
    fn changing_set_fires_observer_once_with_old_new_index() {
        let (mut array, events) = recording_array();

        let old = array.set(2, 7).unwrap();

        assert_eq!(old, 0);
        assert_eq!(array.get(2), Some(&7));
        assert_eq!(events.lock().unwrap().as_slice(), &[(0, 7, 2)]);
    }

    #[test]
    fn equivalent_set_commits_silently() {
        let (mut array, events) = recording_array();

        array.set(1, 0).unwrap();
        array.set(1, 0).unwrap();

        assert!(events.lock().unwrap().is_empty());
    }

    #[test]
    fn repeated_reassertion_only_reports_real_transitions() {
        let (mut array, events) = recording_array();

        // A host re-asserting the same value every tick.
        for _ in 0..100 {
            array.set(0, 5).unwrap();
        }

        assert_eq!(events.lock().unwrap().len(), 1);
    }

    #[test]
    fn out_of_range_set_errors_and_leaves_container_unmodified() {
        let (mut array, events) = recording_array();

        let err = array.set(4, 9).unwrap_err();

        assert!(matches!(err, SlotError::IndexOutOfRange { index: 4, len: 4 }));
        assert!(events.lock().unwrap().is_empty());
        assert!((0..4).all(|i| array.get(i) == Some(&0)));
    }

    #[test]
    fn observer_error_aborts_commit() {
        let mut array = SlotArray::new(2, 0);
        array.observe(|_, _, _| Err(anyhow!("related entity not ready")));

        let err = array.set(0, 3).unwrap_err();

        assert!(matches!(err, SlotError::Observer { index: 0, .. }));
        assert_eq!(array.get(0), Some(&0));
    }

    #[test]
    fn custom_equivalence_controls_observation() {
        let fired = Arc::new(Mutex::new(0u32));
        let sink = fired.clone();
        // Only the hundreds digit is identity; lower digits are noise.
        let mut array = SlotArray::with_equivalence(1, 100, |a: &i32, b: &i32| a / 100 == b / 100);
        array.observe(move |_, _, _| {
            *sink.lock().unwrap() += 1;
            Ok(())
        });

        array.set(0, 150).unwrap();
        assert_eq!(*fired.lock().unwrap(), 0);

        array.set(0, 250).unwrap();
        assert_eq!(*fired.lock().unwrap(), 1);
    }

    #[test]
    fn set_returns_previous_value() {
        let mut array = SlotArray::new(1, 1);
        assert_eq!(array.set(0, 2).unwrap(), 1);
        assert_eq!(array.set(0, 3).unwrap(), 2);
    }
}
