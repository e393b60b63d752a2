//! Core shared types for rfi.
//!
//! This crate is intentionally small: text offsets, keyword/variable name
//! normalization, and the versioned [`ItemList`] collection used by the suite
//! model.

mod item_list;
mod name;
mod text;

pub use item_list::{ItemList, ItemListSnapshot, Named};
pub use name::{normalize_name, same_name};
pub use text::{byte_to_char_offset, char_to_byte_offset, LineIndex};
pub use text_size::{TextRange, TextSize};
