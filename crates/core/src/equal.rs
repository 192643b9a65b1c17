//! Structural equality over values
//!
//! - Identical words are always equal.
//! - Integers, characters and symbols are equal only when identical. Integers
//!   and characters are packed into the word, so identity is value equality
//!   for them; symbols stay identity-compared.
//! - Strings are equal when their bytes are.
//! - Lists are equal when they have the same length and pairwise-equal
//!   elements. Spines are walked iteratively and nested lists go on a
//!   worklist, so neither length nor depth grows the call stack.

use crate::value::{Tag, Value};

/// Compare two values for equality
pub fn equal(a: &Value, b: &Value) -> bool {
    if a.ptr_eq(b) {
        return true;
    }

    let tag = a.tag();
    if tag != b.tag() {
        return false;
    }

    match tag {
        Tag::Int | Tag::Char | Tag::Symbol => false,
        Tag::String => a.string_bytes() == b.string_bytes(),
        Tag::List => equal_lists(a, b),
    }
}

fn equal_lists<'v>(a: &'v Value, b: &'v Value) -> bool {
    let mut pending = vec![(a, b)];
    while let Some((mut a, mut b)) = pending.pop() {
        loop {
            // Shared tails (including both Nil) end the walk early
            if a.ptr_eq(b) {
                break;
            }
            if a.is_nil() || b.is_nil() {
                return false;
            }
            let (x, y) = (a.first(), b.first());
            if x.is_pair() && y.is_pair() {
                pending.push((x, y));
            } else if !equal(x, y) {
                return false;
            }
            a = a.rest();
            b = b.rest();
        }
    }
    true
}

impl PartialEq for Value {
    fn eq(&self, other: &Value) -> bool {
        equal(self, other)
    }
}

impl Eq for Value {}
