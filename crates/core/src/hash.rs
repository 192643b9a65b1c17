//! Hash codes matching [`equal`](crate::equal::equal)
//!
//! Strings and lists use a polynomial rolling hash (multiplier 31, seed 1),
//! with the empty string and the empty list hashing to 0. Integers hash to
//! their value, characters to their code point and symbols to their
//! identity word. All arithmetic wraps.

use std::hash::{Hash, Hasher};

use crate::value::{Tag, Value};

const HASH_PRIME: u64 = 31;

/// Compute the hash code of a value
pub fn hash(value: &Value) -> u64 {
    match value.tag() {
        Tag::Int => value.as_integer() as u64,
        Tag::Char => u64::from(value.as_character()),
        Tag::Symbol => value.identity(),
        Tag::String => hash_bytes(value.string_bytes()),
        Tag::List => hash_list(value),
    }
}

fn hash_bytes(bytes: &[u8]) -> u64 {
    if bytes.is_empty() {
        return 0;
    }
    bytes.iter().fold(1u64, |acc, &b| {
        acc.wrapping_mul(HASH_PRIME).wrapping_add(u64::from(b))
    })
}

fn mix(acc: u64, code: u64) -> u64 {
    acc.wrapping_mul(HASH_PRIME).wrapping_add(code)
}

fn hash_list(list: &Value) -> u64 {
    if list.is_nil() {
        return 0;
    }

    // One frame per open list: remaining elements and the running hash
    let mut frames = vec![(list.iter(), 1u64)];
    while let Some((iter, acc)) = frames.last_mut() {
        match iter.next() {
            Some(elt) if elt.is_pair() => frames.push((elt.iter(), 1)),
            Some(elt) => *acc = mix(*acc, hash(elt)),
            None => {
                let done = *acc;
                frames.pop();
                match frames.last_mut() {
                    Some((_, parent)) => *parent = mix(*parent, done),
                    None => return done,
                }
            }
        }
    }
    0
}

impl Hash for Value {
    fn hash<H: Hasher>(&self, state: &mut H) {
        state.write_u64(hash(self));
    }
}
