use std::collections::{btree_map, hash_map, linked_list, vec_deque, BTreeMap, HashMap, LinkedList, VecDeque};
use std::slice;

use crate::options::{MapKind, SequenceKind};

/// Sequence member whose concrete collection is picked at decode time from
/// [`SequenceKind`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Seq<E> {
    Vec(Vec<E>),
    Deque(VecDeque<E>),
    Linked(LinkedList<E>),
}

impl<E> Default for Seq<E> {
    fn default() -> Self {
        Seq::Vec(Vec::new())
    }
}

impl<E> Seq<E> {
    pub fn with_kind(kind: SequenceKind) -> Self {
        match kind {
            SequenceKind::Vec => Seq::Vec(Vec::new()),
            SequenceKind::Deque => Seq::Deque(VecDeque::new()),
            SequenceKind::Linked => Seq::Linked(LinkedList::new()),
        }
    }

    pub fn kind(&self) -> SequenceKind {
        match self {
            Seq::Vec(_) => SequenceKind::Vec,
            Seq::Deque(_) => SequenceKind::Deque,
            Seq::Linked(_) => SequenceKind::Linked,
        }
    }

    pub fn len(&self) -> usize {
        match self {
            Seq::Vec(items) => items.len(),
            Seq::Deque(items) => items.len(),
            Seq::Linked(items) => items.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn push(&mut self, item: E) {
        match self {
            Seq::Vec(items) => items.push(item),
            Seq::Deque(items) => items.push_back(item),
            Seq::Linked(items) => items.push_back(item),
        }
    }

    /// Items in document order.
    pub fn iter(&self) -> SeqIter<'_, E> {
        match self {
            Seq::Vec(items) => SeqIter::Vec(items.iter()),
            Seq::Deque(items) => SeqIter::Deque(items.iter()),
            Seq::Linked(items) => SeqIter::Linked(items.iter()),
        }
    }

    pub fn into_vec(self) -> Vec<E> {
        match self {
            Seq::Vec(items) => items,
            Seq::Deque(items) => items.into(),
            Seq::Linked(items) => items.into_iter().collect(),
        }
    }
}

impl<E> Extend<E> for Seq<E> {
    fn extend<I: IntoIterator<Item = E>>(&mut self, iter: I) {
        match self {
            Seq::Vec(items) => items.extend(iter),
            Seq::Deque(items) => items.extend(iter),
            Seq::Linked(items) => items.extend(iter),
        }
    }
}

impl<'a, E> IntoIterator for &'a Seq<E> {
    type Item = &'a E;
    type IntoIter = SeqIter<'a, E>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

pub enum SeqIter<'a, E> {
    Vec(slice::Iter<'a, E>),
    Deque(vec_deque::Iter<'a, E>),
    Linked(linked_list::Iter<'a, E>),
}

impl<'a, E> Iterator for SeqIter<'a, E> {
    type Item = &'a E;

    fn next(&mut self) -> Option<Self::Item> {
        match self {
            SeqIter::Vec(iter) => iter.next(),
            SeqIter::Deque(iter) => iter.next(),
            SeqIter::Linked(iter) => iter.next(),
        }
    }
}

/// String-keyed map member whose concrete map is picked at decode time from
/// [`MapKind`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Dict<V> {
    Hash(HashMap<String, V>),
    BTree(BTreeMap<String, V>),
}

impl<V> Default for Dict<V> {
    fn default() -> Self {
        Dict::Hash(HashMap::new())
    }
}

impl<V> Dict<V> {
    pub fn with_kind(kind: MapKind) -> Self {
        match kind {
            MapKind::Hash => Dict::Hash(HashMap::new()),
            MapKind::BTree => Dict::BTree(BTreeMap::new()),
        }
    }

    pub fn kind(&self) -> MapKind {
        match self {
            Dict::Hash(_) => MapKind::Hash,
            Dict::BTree(_) => MapKind::BTree,
        }
    }

    pub fn len(&self) -> usize {
        match self {
            Dict::Hash(entries) => entries.len(),
            Dict::BTree(entries) => entries.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn get(&self, key: &str) -> Option<&V> {
        match self {
            Dict::Hash(entries) => entries.get(key),
            Dict::BTree(entries) => entries.get(key),
        }
    }

    /// Later duplicates of a key replace earlier ones.
    pub fn insert(&mut self, key: String, value: V) -> Option<V> {
        match self {
            Dict::Hash(entries) => entries.insert(key, value),
            Dict::BTree(entries) => entries.insert(key, value),
        }
    }

    /// Entries in the map's own iteration order; sorted for `BTree`.
    pub fn iter(&self) -> DictIter<'_, V> {
        match self {
            Dict::Hash(entries) => DictIter::Hash(entries.iter()),
            Dict::BTree(entries) => DictIter::BTree(entries.iter()),
        }
    }
}

impl<V> Extend<(String, V)> for Dict<V> {
    fn extend<I: IntoIterator<Item = (String, V)>>(&mut self, iter: I) {
        match self {
            Dict::Hash(entries) => entries.extend(iter),
            Dict::BTree(entries) => entries.extend(iter),
        }
    }
}

impl<'a, V> IntoIterator for &'a Dict<V> {
    type Item = (&'a String, &'a V);
    type IntoIter = DictIter<'a, V>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

pub enum DictIter<'a, V> {
    Hash(hash_map::Iter<'a, String, V>),
    BTree(btree_map::Iter<'a, String, V>),
}

impl<'a, V> Iterator for DictIter<'a, V> {
    type Item = (&'a String, &'a V);

    fn next(&mut self) -> Option<Self::Item> {
        match self {
            DictIter::Hash(iter) => iter.next(),
            DictIter::BTree(iter) => iter.next(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[rstest::rstest]
    #[case(SequenceKind::Vec)]
    #[case(SequenceKind::Deque)]
    #[case(SequenceKind::Linked)]
    fn test_seq_keeps_order(#[case] kind: SequenceKind) {
        let mut seq = Seq::with_kind(kind);
        seq.push("New");
        seq.extend(["Open", "Close"]);
        assert_eq!(seq.kind(), kind);
        assert_eq!(seq.len(), 3);
        assert_eq!(seq.iter().copied().collect::<Vec<_>>(), ["New", "Open", "Close"]);
        assert_eq!(seq.into_vec(), vec!["New", "Open", "Close"]);
    }

    #[rstest::rstest]
    fn test_dict_btree_iterates_sorted() {
        let mut dict = Dict::with_kind(MapKind::BTree);
        dict.extend([("b".to_string(), 2), ("a".to_string(), 1)]);
        assert_eq!(dict.insert("b".to_string(), 3), Some(2));
        let keys: Vec<_> = dict.iter().map(|(key, _)| key.as_str()).collect();
        assert_eq!(keys, ["a", "b"]);
        assert_eq!(dict.get("b"), Some(&3));
        assert!(Dict::<i32>::default().is_empty());
    }
}
