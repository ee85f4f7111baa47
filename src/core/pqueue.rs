//! Indexed binary heap with a key-to-slot side map.
//!
//! A plain heap of pairs is not enough for Dijkstra and Prim: both need to
//! lower the priority of an element that is already enqueued. The side map
//! locates the element's slot by key so an update is a sift from that slot,
//! O(log n) total.

use std::collections::HashMap;
use std::hash::Hash;

struct Entry<K, V, P> {
    key: K,
    value: V,
    priority: P,
}

/// A keyed priority queue over an indexed binary heap.
///
/// The ordering is supplied at construction: `less(a, b)` returns whether
/// `a` sorts before `b`, so `|a, b| a < b` yields a min-queue. Pushing an
/// existing key updates its value and priority in place. Ties are broken
/// arbitrarily.
pub struct PriorityQueue<K, V, P> {
    heap: Vec<Entry<K, V, P>>,
    slots: HashMap<K, usize>,
    less: Box<dyn Fn(&P, &P) -> bool + Send>,
}

impl<K, V, P> PriorityQueue<K, V, P>
where
    K: Eq + Hash + Clone,
{
    pub fn new(less: impl Fn(&P, &P) -> bool + Send + 'static) -> Self {
        Self {
            heap: Vec::new(),
            slots: HashMap::new(),
            less: Box::new(less),
        }
    }

    pub fn len(&self) -> usize {
        self.heap.len()
    }

    pub fn is_empty(&self) -> bool {
        self.heap.is_empty()
    }

    /// Inserts `key`, or updates its value and priority if already present.
    pub fn push(&mut self, key: K, value: V, priority: P) {
        if let Some(&i) = self.slots.get(&key) {
            self.heap[i].value = value;
            self.heap[i].priority = priority;
            self.sift(i);
            return;
        }
        let i = self.heap.len();
        self.heap.push(Entry {
            key: key.clone(),
            value,
            priority,
        });
        self.slots.insert(key, i);
        self.sift_up(i);
    }

    /// Changes the priority of `key` if present; no-op otherwise.
    pub fn update(&mut self, key: &K, priority: P) {
        if let Some(&i) = self.slots.get(key) {
            self.heap[i].priority = priority;
            self.sift(i);
        }
    }

    /// Removes and returns the minimum-priority element, or `None` when empty.
    pub fn pop(&mut self) -> Option<(K, V, P)> {
        if self.heap.is_empty() {
            return None;
        }
        let last = self.heap.len() - 1;
        self.swap(0, last);
        let entry = match self.heap.pop() {
            Some(e) => e,
            None => return None,
        };
        self.slots.remove(&entry.key);
        if !self.heap.is_empty() {
            self.sift_down(0);
        }
        Some((entry.key, entry.value, entry.priority))
    }

    /// Returns the current priority of `key`, if enqueued.
    pub fn priority(&self, key: &K) -> Option<&P> {
        self.slots.get(key).map(|&i| &self.heap[i].priority)
    }

    pub fn contains(&self, key: &K) -> bool {
        self.slots.contains_key(key)
    }

    fn swap(&mut self, i: usize, j: usize) {
        self.heap.swap(i, j);
        self.slots.insert(self.heap[i].key.clone(), i);
        self.slots.insert(self.heap[j].key.clone(), j);
    }

    fn sift(&mut self, i: usize) {
        self.sift_up(i);
        self.sift_down(i);
    }

    fn sift_up(&mut self, mut i: usize) {
        while i > 0 {
            let parent = (i - 1) / 2;
            if !(self.less)(&self.heap[i].priority, &self.heap[parent].priority) {
                return;
            }
            self.swap(i, parent);
            i = parent;
        }
    }

    fn sift_down(&mut self, mut i: usize) {
        loop {
            let (l, r) = (2 * i + 1, 2 * i + 2);
            let mut min = i;
            if l < self.heap.len() && (self.less)(&self.heap[l].priority, &self.heap[min].priority)
            {
                min = l;
            }
            if r < self.heap.len() && (self.less)(&self.heap[r].priority, &self.heap[min].priority)
            {
                min = r;
            }
            if min == i {
                return;
            }
            self.swap(i, min);
            i = min;
        }
    }
}
