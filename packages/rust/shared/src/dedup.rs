//! Ordered, capped de-duplication.
//!
//! Used for concept lists, best practices, and resource links, both when
//! normalizing a single extraction and when merging many into a guide.

use std::collections::HashSet;

/// An insertion-ordered set with a size limit.
///
/// Items are keyed by a caller-supplied string; the first item seen for a
/// key wins and later duplicates are ignored. Once `limit` items are held,
/// further inserts are rejected.
#[derive(Debug, Clone)]
pub struct CappedSet<T> {
    seen: HashSet<String>,
    items: Vec<T>,
    limit: usize,
}

impl<T> CappedSet<T> {
    pub fn new(limit: usize) -> Self {
        Self {
            seen: HashSet::new(),
            items: Vec::new(),
            limit,
        }
    }

    /// Insert `item` under `key`. Returns `true` if it was kept.
    ///
    /// Blank keys are never kept.
    pub fn insert(&mut self, key: &str, item: T) -> bool {
        if self.is_full() || key.trim().is_empty() {
            return false;
        }
        if !self.seen.insert(key.to_string()) {
            return false;
        }
        self.items.push(item);
        true
    }

    pub fn is_full(&self) -> bool {
        self.items.len() >= self.limit
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn into_vec(self) -> Vec<T> {
        self.items
    }
}

/// De-duplicate `items` by `key`, keeping first-seen order, capped at `limit`.
pub fn dedup_by_key<T, I, F>(items: I, limit: usize, key: F) -> Vec<T>
where
    I: IntoIterator<Item = T>,
    F: Fn(&T) -> String,
{
    let mut set = CappedSet::new(limit);
    for item in items {
        if set.is_full() {
            break;
        }
        let k = key(&item);
        set.insert(&k, item);
    }
    set.into_vec()
}

/// Case-insensitive string de-duplication with trimming.
pub fn dedup_strings<I>(items: I, limit: usize) -> Vec<String>
where
    I: IntoIterator<Item = String>,
{
    dedup_by_key(
        items.into_iter().map(|s| s.trim().to_string()),
        limit,
        |s| s.to_lowercase(),
    )
}
