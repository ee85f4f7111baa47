//! Key bounds and deterministic edge-key synthesis.

use std::fmt::Debug;
use std::hash::Hash;

/// Bound alias for vertex and edge keys: any hashable, comparable,
/// cloneable value works (strings, integers, tuples of those, ...).
pub trait Key: Eq + Hash + Clone + Debug + Send + Sync + 'static {}

impl<T: Eq + Hash + Clone + Debug + Send + Sync + 'static> Key for T {}

/// Synthesis of an edge key from its endpoints when the caller omits one.
///
/// Candidates are derived deterministically from the endpoint keys and a
/// nonce; the graph retries with increasing nonces until the candidate does
/// not collide with an existing edge key, so generated keys are unique
/// within a graph without relying on randomness.
pub trait SynthesizeKey: Sized {
    /// Produce the `nonce`-th candidate key for an edge `head -> tail`.
    fn synthesize(head: &Self, tail: &Self, nonce: u64) -> Self;
}

impl SynthesizeKey for String {
    fn synthesize(head: &Self, tail: &Self, nonce: u64) -> Self {
        if nonce == 0 {
            format!("{head}-{tail}")
        } else {
            format!("{head}-{tail}#{nonce}")
        }
    }
}

macro_rules! impl_synthesize_int {
    ($($t:ty),* $(,)?) => {$(
        impl SynthesizeKey for $t {
            fn synthesize(head: &Self, tail: &Self, nonce: u64) -> Self {
                let mut buf = [0u8; 40];
                let (h, t) = (head.to_le_bytes(), tail.to_le_bytes());
                buf[..h.len()].copy_from_slice(&h);
                buf[16..16 + t.len()].copy_from_slice(&t);
                buf[32..].copy_from_slice(&nonce.to_le_bytes());
                seahash::hash(&buf) as $t
            }
        }
    )*};
}

impl_synthesize_int!(i8, i16, i32, i64, isize, u8, u16, u32, u64, usize);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn string_keys_are_readable() {
        let a = "a".to_string();
        let b = "b".to_string();
        assert_eq!(String::synthesize(&a, &b, 0), "a-b");
        assert_eq!(String::synthesize(&a, &b, 2), "a-b#2");
    }

    #[test]
    fn integer_keys_are_deterministic() {
        let k1 = i64::synthesize(&3, &7, 0);
        let k2 = i64::synthesize(&3, &7, 0);
        assert_eq!(k1, k2);
        assert_ne!(k1, i64::synthesize(&3, &7, 1));
        assert_ne!(k1, i64::synthesize(&7, &3, 0));
    }
}
