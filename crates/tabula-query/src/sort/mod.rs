//! Null-aware ordering of fetched rows

mod normalizer;

#[cfg(test)]
mod tests;

pub use normalizer::{SortKey, compare_values, is_empty_value, normalize_rows};
