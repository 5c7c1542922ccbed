//! Ordered, name-keyed container with positional element-wise maps.
//!
//! Purpose
//! -------
//! Provide [`Structured<T>`], the generic collection behind every named
//! tensor bundle in the crate (solver points and deltas, experience batches,
//! trace snapshots). Entries keep their insertion order, and every
//! multi-operand operation walks the operands position by position after
//! checking that their key sequences are identical.
//!
//! Key behaviors
//! -------------
//! - Construction from `(name, value)` pairs rejects duplicate names.
//! - [`Structured::map`], [`Structured::try_map`] and
//!   [`Structured::map_with_names`] transform every entry.
//! - [`Structured::zip_map`] (two operands) and [`Structured::zip_map_all`]
//!   (one or more co-indexed operands) fail fast with
//!   [`OptError::StructureMismatch`] when key sequences differ.
//!
//! Invariants & assumptions
//! ------------------------
//! - Names are unique; `names.len() == values.len()` at all times.
//! - Maps never add, drop or reorder keys, so a point and the deltas derived
//!   from it always stay co-indexed.
//!
//! Testing notes
//! -------------
//! - Unit tests cover duplicate rejection, order preservation, and
//!   mismatch detection for the zip operations.
use crate::optimization::errors::{OptError, OptResult};

/// Ordered mapping `name -> value` with positional element-wise operations.
#[derive(Debug, Clone, PartialEq)]
pub struct Structured<T> {
    names: Vec<String>,
    values: Vec<T>,
}

impl<T> Default for Structured<T> {
    fn default() -> Self {
        Self { names: Vec::new(), values: Vec::new() }
    }
}

impl<T> Structured<T> {
    /// Empty collection.
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a collection from `(name, value)` pairs, keeping their order.
    ///
    /// # Errors
    /// - [`OptError::DuplicateName`] if a name appears more than once.
    pub fn from_pairs<I, S>(pairs: I) -> OptResult<Self>
    where
        I: IntoIterator<Item = (S, T)>,
        S: Into<String>,
    {
        let mut out = Self::new();
        for (name, value) in pairs {
            out.insert(name, value)?;
        }
        Ok(out)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn names(&self) -> &[String] {
        &self.names
    }

    pub fn values(&self) -> &[T] {
        &self.values
    }

    pub fn contains(&self, name: &str) -> bool {
        self.position(name).is_some()
    }

    pub fn get(&self, name: &str) -> Option<&T> {
        self.position(name).map(|index| &self.values[index])
    }

    pub fn get_mut(&mut self, name: &str) -> Option<&mut T> {
        self.position(name).map(move |index| &mut self.values[index])
    }

    /// Look up `name`, failing with [`OptError::MissingName`] when absent.
    pub fn require(&self, name: &str) -> OptResult<&T> {
        self.get(name).ok_or_else(|| OptError::MissingName { name: name.to_string() })
    }

    /// Append a new entry at the end of the collection.
    ///
    /// # Errors
    /// - [`OptError::DuplicateName`] if `name` is already present.
    pub fn insert(&mut self, name: impl Into<String>, value: T) -> OptResult<()> {
        let name = name.into();
        if self.contains(&name) {
            return Err(OptError::DuplicateName { name });
        }
        self.names.push(name);
        self.values.push(value);
        Ok(())
    }

    /// Remove an entry, preserving the order of the remaining ones.
    pub fn remove(&mut self, name: &str) -> Option<T> {
        let index = self.position(name)?;
        self.names.remove(index);
        Some(self.values.remove(index))
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &T)> {
        self.names.iter().map(String::as_str).zip(self.values.iter())
    }

    pub fn into_pairs(self) -> impl Iterator<Item = (String, T)> {
        self.names.into_iter().zip(self.values)
    }

    /// `true` if both collections hold the same names in the same order.
    pub fn same_keys<U>(&self, other: &Structured<U>) -> bool {
        self.names == other.names
    }

    /// Fail with [`OptError::StructureMismatch`] unless `other` is co-indexed
    /// with `self`.
    pub fn check_keys<U>(&self, other: &Structured<U>) -> OptResult<()> {
        if self.same_keys(other) {
            Ok(())
        } else {
            Err(OptError::StructureMismatch {
                expected: self.names.clone(),
                found: other.names.clone(),
            })
        }
    }

    pub fn map<U, F>(&self, mut f: F) -> Structured<U>
    where
        F: FnMut(&T) -> U,
    {
        Structured { names: self.names.clone(), values: self.values.iter().map(&mut f).collect() }
    }

    pub fn map_with_names<U, F>(&self, mut f: F) -> Structured<U>
    where
        F: FnMut(&str, &T) -> U,
    {
        let values = self.iter().map(|(name, value)| f(name, value)).collect();
        Structured { names: self.names.clone(), values }
    }

    /// Fallible map; stops at the first error.
    pub fn try_map<U, E, F>(&self, mut f: F) -> Result<Structured<U>, E>
    where
        F: FnMut(&str, &T) -> Result<U, E>,
    {
        let values =
            self.iter().map(|(name, value)| f(name, value)).collect::<Result<Vec<_>, E>>()?;
        Ok(Structured { names: self.names.clone(), values })
    }

    /// Combine two co-indexed collections entry by entry.
    ///
    /// # Errors
    /// - [`OptError::StructureMismatch`] if the key sequences differ.
    pub fn zip_map<U, V, F>(&self, other: &Structured<U>, mut f: F) -> OptResult<Structured<V>>
    where
        F: FnMut(&T, &U) -> V,
    {
        self.check_keys(other)?;
        let values = self.values.iter().zip(other.values.iter()).map(|(a, b)| f(a, b)).collect();
        Ok(Structured { names: self.names.clone(), values })
    }

    /// Combine `self` with one or more co-indexed collections. The closure
    /// receives the entries of `self` followed by those of `others`, in order.
    ///
    /// # Errors
    /// - [`OptError::StructureMismatch`] for the first operand whose key
    ///   sequence differs from `self`.
    pub fn zip_map_all<V, F>(&self, others: &[&Structured<T>], mut f: F) -> OptResult<Structured<V>>
    where
        F: FnMut(&[&T]) -> V,
    {
        for other in others {
            self.check_keys(other)?;
        }
        let mut operands: Vec<&T> = Vec::with_capacity(others.len() + 1);
        let values = (0..self.len())
            .map(|index| {
                operands.clear();
                operands.push(&self.values[index]);
                operands.extend(others.iter().map(|other| &other.values[index]));
                f(&operands)
            })
            .collect();
        Ok(Structured { names: self.names.clone(), values })
    }

    fn position(&self, name: &str) -> Option<usize> {
        self.names.iter().position(|candidate| candidate == name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // -------------------------------------------------------------------------
    // Scope
    // -----
    // These tests cover:
    // - Construction (order preservation, duplicate rejection).
    // - Key checks performed by `zip_map` / `zip_map_all`.
    // - Removal semantics used by the experience pipeline.
    //
    // Tensor arithmetic lives in `structured::tensor` and is tested there.
    // -------------------------------------------------------------------------

    fn pairs() -> Structured<i32> {
        Structured::from_pairs([("b", 2), ("a", 1), ("c", 3)]).expect("unique names")
    }

    #[test]
    // Purpose
    // -------
    // Insertion order is the iteration order, independent of name sorting.
    fn from_pairs_preserves_insertion_order() {
        let value = pairs();

        let names: Vec<&str> = value.iter().map(|(name, _)| name).collect();

        assert_eq!(names, vec!["b", "a", "c"]);
        assert_eq!(value.get("a"), Some(&1));
    }

    #[test]
    // Purpose
    // -------
    // Keys are fixed and unique, so a repeated name is rejected.
    fn from_pairs_rejects_duplicates() {
        let result = Structured::from_pairs([("x", 1), ("x", 2)]);

        assert_eq!(result, Err(OptError::DuplicateName { name: "x".to_string() }));
    }

    #[test]
    // Purpose
    // -------
    // `zip_map` applies the closure positionally across matching keys.
    fn zip_map_combines_positionally() {
        let left = pairs();
        let right = pairs().map(|v| v * 10);

        let sum = left.zip_map(&right, |a, b| a + b).expect("keys match");

        assert_eq!(sum.values(), &[22, 11, 33]);
    }

    #[test]
    // Purpose
    // -------
    // Collections with the same names in a different order are not
    // co-indexed and must be rejected.
    //
    // Given
    // -----
    // - `{b, a, c}` and `{a, b, c}`.
    //
    // Expect
    // ------
    // - `StructureMismatch` naming both key sequences.
    fn zip_map_rejects_reordered_keys() {
        let left = pairs();
        let right = Structured::from_pairs([("a", 1), ("b", 2), ("c", 3)]).expect("unique");

        let result = left.zip_map(&right, |a, b| a + b);

        assert!(matches!(result, Err(OptError::StructureMismatch { .. })));
    }

    #[test]
    // Purpose
    // -------
    // `zip_map_all` hands the closure one entry per operand, `self` first.
    fn zip_map_all_passes_operands_in_order() {
        let first = pairs();
        let second = pairs().map(|v| v * 10);
        let third = pairs().map(|v| v * 100);

        let stacked =
            first.zip_map_all(&[&second, &third], |xs| xs.iter().map(|x| **x).collect::<Vec<_>>());

        let stacked = stacked.expect("keys match");
        assert_eq!(stacked.get("a"), Some(&vec![1, 10, 100]));
    }

    #[test]
    // Purpose
    // -------
    // A single mismatching operand among several fails the whole call.
    fn zip_map_all_rejects_any_mismatching_operand() {
        let first = pairs();
        let second = pairs();
        let short = Structured::from_pairs([("b", 2), ("a", 1)]).expect("unique");

        let result = first.zip_map_all(&[&second, &short], |xs| xs.len());

        assert!(matches!(result, Err(OptError::StructureMismatch { .. })));
    }

    #[test]
    // Purpose
    // -------
    // Removing an entry keeps the relative order of the others.
    fn remove_keeps_remaining_order() {
        let mut value = pairs();

        let removed = value.remove("a");

        assert_eq!(removed, Some(1));
        assert_eq!(value.names(), &["b".to_string(), "c".to_string()]);
        assert_eq!(value.remove("a"), None);
    }

    #[test]
    // Purpose
    // -------
    // `try_map` surfaces the first failure.
    fn try_map_stops_at_first_error() {
        let value = pairs();

        let result: Result<Structured<i32>, String> = value.try_map(|name, v| {
            if name == "a" {
                Err(format!("bad {name}"))
            } else {
                Ok(*v)
            }
        });

        assert_eq!(result, Err("bad a".to_string()));
    }
}
