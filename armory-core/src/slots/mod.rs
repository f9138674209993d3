//! Fixed-size slot containers that report logical value transitions.

pub mod array;

pub use array::{SlotArray, SlotError};
