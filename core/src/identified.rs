//! Ordered collections addressable by element id.
//!
//! [`IdentifiedVec`] keeps elements in a user-visible order and maintains an
//! id → index table beside them, so features can route actions to "the
//! element with this id" without scanning, and can never hold two elements
//! with the same id.

use serde::de::{Deserialize, Deserializer};
use serde::ser::{Serialize, Serializer};
use std::collections::HashMap;
use std::fmt::Debug;
use std::hash::Hash;

/// A type with a stable identity.
///
/// The id returned must not change for the lifetime of the value.
pub trait Identifiable {
    /// The identifier type
    type Id: Clone + Eq + Hash + Debug;

    /// This element's id
    fn id(&self) -> Self::Id;
}

/// An ordered sequence of [`Identifiable`] elements with unique ids.
///
/// # Example
///
/// ```
/// use tally_core::identified::{Identifiable, IdentifiedVec};
///
/// #[derive(Clone, Debug, PartialEq)]
/// struct Item {
///     id: u32,
///     done: bool,
/// }
///
/// impl Identifiable for Item {
///     type Id = u32;
///     fn id(&self) -> u32 {
///         self.id
///     }
/// }
///
/// let mut items: IdentifiedVec<Item> = vec![
///     Item { id: 1, done: true },
///     Item { id: 2, done: false },
/// ]
/// .into_iter()
/// .collect();
///
/// assert!(!items.push(Item { id: 2, done: true })); // duplicate id rejected
///
/// items.stable_partition(|item| item.done);
/// assert_eq!(items.ids(), vec![2, 1]);
/// ```
#[derive(Clone)]
pub struct IdentifiedVec<T: Identifiable> {
    elements: Vec<T>,
    index: HashMap<T::Id, usize>,
}

impl<T: Identifiable> IdentifiedVec<T> {
    /// Create an empty collection
    #[must_use]
    pub fn new() -> Self {
        Self {
            elements: Vec::new(),
            index: HashMap::new(),
        }
    }

    /// Number of elements
    #[must_use]
    pub fn len(&self) -> usize {
        self.elements.len()
    }

    /// Whether the collection is empty
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }

    /// Iterate in order
    pub fn iter(&self) -> std::slice::Iter<'_, T> {
        self.elements.iter()
    }

    /// The elements as an ordered slice
    #[must_use]
    pub fn as_slice(&self) -> &[T] {
        &self.elements
    }

    /// The ids, in order
    #[must_use]
    pub fn ids(&self) -> Vec<T::Id> {
        self.elements.iter().map(Identifiable::id).collect()
    }

    /// Whether an element with `id` is present
    #[must_use]
    pub fn contains(&self, id: &T::Id) -> bool {
        self.index.contains_key(id)
    }

    /// Position of the element with `id`
    #[must_use]
    pub fn position(&self, id: &T::Id) -> Option<usize> {
        self.index.get(id).copied()
    }

    /// The element with `id`
    #[must_use]
    pub fn get(&self, id: &T::Id) -> Option<&T> {
        self.position(id).map(|i| &self.elements[i])
    }

    /// Mutate the element with `id` in place
    ///
    /// Returns `None` if no such element exists. The closure must not change
    /// the element's id.
    pub fn update<R>(&mut self, id: &T::Id, f: impl FnOnce(&mut T) -> R) -> Option<R> {
        let i = self.position(id)?;
        let result = f(&mut self.elements[i]);
        debug_assert_eq!(&self.elements[i].id(), id, "update changed an element's id");
        Some(result)
    }

    /// Insert `element` at `index`
    ///
    /// Returns `false` and leaves the collection untouched if the id is
    /// already present.
    ///
    /// # Panics
    ///
    /// Panics if `index > len`.
    pub fn insert(&mut self, index: usize, element: T) -> bool {
        if self.contains(&element.id()) {
            return false;
        }
        self.elements.insert(index, element);
        self.reindex_from(index);
        true
    }

    /// Append `element`; returns `false` if the id is already present
    pub fn push(&mut self, element: T) -> bool {
        let index = self.elements.len();
        self.insert(index, element)
    }

    /// Remove and return the element with `id`
    pub fn remove(&mut self, id: &T::Id) -> Option<T> {
        let i = self.index.remove(id)?;
        let element = self.elements.remove(i);
        self.reindex_from(i);
        Some(element)
    }

    /// Reorder so every element for which `to_back` is `false` precedes every
    /// element for which it is `true`
    ///
    /// Relative order within each group is preserved.
    pub fn stable_partition(&mut self, mut to_back: impl FnMut(&T) -> bool) {
        let (mut front, back): (Vec<T>, Vec<T>) = std::mem::take(&mut self.elements)
            .into_iter()
            .partition(|element| !to_back(element));
        front.extend(back);
        self.elements = front;
        self.reindex_from(0);
    }

    fn reindex_from(&mut self, start: usize) {
        for (i, element) in self.elements.iter().enumerate().skip(start) {
            self.index.insert(element.id(), i);
        }
    }
}

impl<T: Identifiable> Default for IdentifiedVec<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Identifiable + Debug> Debug for IdentifiedVec<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_list().entries(&self.elements).finish()
    }
}

impl<T: Identifiable + PartialEq> PartialEq for IdentifiedVec<T> {
    fn eq(&self, other: &Self) -> bool {
        self.elements == other.elements
    }
}

impl<T: Identifiable + Eq> Eq for IdentifiedVec<T> {}

/// Collects elements in order, skipping any whose id was already seen.
impl<T: Identifiable> FromIterator<T> for IdentifiedVec<T> {
    fn from_iter<I: IntoIterator<Item = T>>(iter: I) -> Self {
        let mut collection = Self::new();
        for element in iter {
            collection.push(element);
        }
        collection
    }
}

impl<T: Identifiable> IntoIterator for IdentifiedVec<T> {
    type Item = T;
    type IntoIter = std::vec::IntoIter<T>;

    fn into_iter(self) -> Self::IntoIter {
        self.elements.into_iter()
    }
}

impl<'a, T: Identifiable> IntoIterator for &'a IdentifiedVec<T> {
    type Item = &'a T;
    type IntoIter = std::slice::Iter<'a, T>;

    fn into_iter(self) -> Self::IntoIter {
        self.elements.iter()
    }
}

impl<T: Identifiable> std::ops::Index<usize> for IdentifiedVec<T> {
    type Output = T;

    fn index(&self, index: usize) -> &T {
        &self.elements[index]
    }
}

impl<T: Identifiable + Serialize> Serialize for IdentifiedVec<T> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_seq(&self.elements)
    }
}

impl<'de, T: Identifiable + Deserialize<'de>> Deserialize<'de> for IdentifiedVec<T> {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let elements = Vec::<T>::deserialize(deserializer)?;
        let mut collection = Self::new();
        for element in elements {
            let id = element.id();
            if !collection.push(element) {
                return Err(serde::de::Error::custom(format!("duplicate id {id:?}")));
            }
        }
        Ok(collection)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[derive(Clone, Debug, PartialEq, Eq)]
    struct Item {
        id: u32,
        flag: bool,
    }

    impl Identifiable for Item {
        type Id = u32;

        fn id(&self) -> u32 {
            self.id
        }
    }

    fn items(flags: &[bool]) -> IdentifiedVec<Item> {
        flags
            .iter()
            .enumerate()
            .map(|(i, &flag)| Item {
                id: u32::try_from(i).unwrap_or(u32::MAX),
                flag,
            })
            .collect()
    }

    #[test]
    fn test_insert_rejects_duplicate_id() {
        let mut collection = items(&[false, false]);

        assert!(!collection.insert(0, Item { id: 1, flag: true }));
        assert_eq!(collection.len(), 2);
        assert_eq!(collection.get(&1), Some(&Item { id: 1, flag: false }));
    }

    #[test]
    fn test_insert_at_front_reindexes() {
        let mut collection = items(&[false, false]);

        assert!(collection.insert(0, Item { id: 7, flag: false }));

        assert_eq!(collection.ids(), vec![7, 0, 1]);
        assert_eq!(collection.position(&7), Some(0));
        assert_eq!(collection.position(&0), Some(1));
        assert_eq!(collection.position(&1), Some(2));
    }

    #[test]
    fn test_remove_reindexes() {
        let mut collection = items(&[false, false, false]);

        let removed = collection.remove(&0);

        assert_eq!(removed.map(|i| i.id), Some(0));
        assert_eq!(collection.position(&1), Some(0));
        assert_eq!(collection.position(&2), Some(1));
        assert!(collection.remove(&0).is_none());
    }

    #[test]
    fn test_update_missing_id() {
        let mut collection = items(&[false]);
        assert!(collection.update(&9, |item| item.flag = true).is_none());
        assert_eq!(collection.update(&0, |item| {
            item.flag = true;
            item.flag
        }), Some(true));
    }

    #[test]
    fn test_from_iter_skips_duplicates() {
        let collection: IdentifiedVec<Item> = vec![
            Item { id: 1, flag: false },
            Item { id: 1, flag: true },
            Item { id: 2, flag: true },
        ]
        .into_iter()
        .collect();

        assert_eq!(collection.ids(), vec![1, 2]);
        assert!(!collection[0].flag);
    }

    proptest! {
        #[test]
        fn prop_stable_partition_preserves_group_order(flags in prop::collection::vec(any::<bool>(), 0..40)) {
            let mut collection = items(&flags);
            collection.stable_partition(|item| item.flag);

            let ids = collection.ids();
            let expected_front: Vec<u32> = collection.iter().filter(|i| !i.flag).map(|i| i.id).collect();
            let expected_back: Vec<u32> = collection.iter().filter(|i| i.flag).map(|i| i.id).collect();

            // Every unflagged element precedes every flagged one
            let split = expected_front.len();
            prop_assert_eq!(&ids[..split], &expected_front[..]);
            prop_assert_eq!(&ids[split..], &expected_back[..]);

            // Within each group ids stay ascending (insertion order)
            prop_assert!(expected_front.windows(2).all(|w| w[0] < w[1]));
            prop_assert!(expected_back.windows(2).all(|w| w[0] < w[1]));

            // Index stays consistent
            for (i, id) in ids.iter().enumerate() {
                prop_assert_eq!(collection.position(id), Some(i));
            }
        }
    }
}
