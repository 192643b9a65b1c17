//! Tagged Value Representation
//!
//! Every Sky value is a single 64-bit word. The two least-significant bits
//! are an inline type tag, so integers and characters never touch the heap.
//!
//! ## Word Layout
//!
//! ```text
//! ┌───────────────────────────────────────────────────────────┬──────┐
//! │                  payload (62 bits)                        │ tag  │
//! └───────────────────────────────────────────────────────────┴──────┘
//!
//! tag 00: heap pointer to a HeapCell (the all-zero word is Nil)
//! tag 01: integer, signed payload (MOST_NEGATIVE_INT..=MOST_POSITIVE_INT)
//! tag 10: character, unsigned payload
//! tag 11: reserved, never produced
//! ```
//!
//! ## Heap Cells
//!
//! Strings, symbols and pairs live in `Rc<HeapCell>` allocations. The word
//! stores the pointer returned by `Rc::into_raw`; cell alignment keeps the
//! two tag bits clear. Cloning a `Value` bumps the strong count and dropping
//! it releases one, so shared sub-lists are freed exactly once.
//!
//! The Rc in the marker field makes `Value` `!Send` and `!Sync`: values may
//! only be used on the thread that created them.

use std::fmt;
use std::marker::PhantomData;
use std::rc::Rc;

use crate::memory_stats::LiveToken;

// =============================================================================
// Constants
// =============================================================================

/// Number of low bits used for the inline tag
const TAG_BITS: u32 = 2;

/// Mask selecting the inline tag
const TAG_MASK: u64 = 0b11;

/// Inline tag for heap pointers (and Nil)
const TAG_HEAP: u64 = 0b00;

/// Inline tag for integers
const TAG_INT: u64 = 0b01;

/// Inline tag for characters
const TAG_CHAR: u64 = 0b10;

/// The Nil word: a heap-tagged null pointer
const NIL_BITS: u64 = 0;

/// Largest integer that fits in the 62-bit payload: 2^61 - 1
pub const MOST_POSITIVE_INT: i64 = i64::MAX >> TAG_BITS;

/// Smallest integer that fits in the 62-bit payload: -2^61
pub const MOST_NEGATIVE_INT: i64 = i64::MIN >> TAG_BITS;

// =============================================================================
// Type Tags
// =============================================================================

/// The variant of a [`Value`], as reported by [`Value::tag`].
///
/// Nil reports [`Tag::List`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Tag {
    Int,
    Char,
    String,
    Symbol,
    List,
}

// =============================================================================
// Heap-Allocated Data
// =============================================================================

pub(crate) enum Object {
    /// Immutable byte string with explicit length
    String(Box<[u8]>),
    /// Symbol wrapping its name (always a string value)
    Symbol(Value),
    /// Pair of first and rest (rest is always a list)
    Pair(Value, Value),
}

pub(crate) struct HeapCell {
    object: Object,
    _live: LiveToken,
}

// The pointer tag must stay clear of the cell address
const _: () = assert!(
    std::mem::align_of::<HeapCell>() > TAG_MASK as usize,
    "HeapCell alignment must leave the two tag bits free"
);

// =============================================================================
// Value
// =============================================================================

/// A Sky value: integer, character, string, symbol, pair or Nil.
#[repr(transparent)]
pub struct Value {
    bits: u64,
    _marker: PhantomData<Rc<HeapCell>>,
}

// Compile-time assertion for the word size
const _: () = assert!(std::mem::size_of::<Value>() == 8, "Value must be one word");

impl Value {
    /// The empty list
    pub const NIL: Value = Value::from_bits(NIL_BITS);

    #[inline(always)]
    const fn from_bits(bits: u64) -> Self {
        Value {
            bits,
            _marker: PhantomData,
        }
    }

    fn alloc(object: Object) -> Self {
        let cell = Rc::new(HeapCell {
            object,
            _live: LiveToken::new(),
        });
        let bits = Rc::into_raw(cell) as usize as u64;
        debug_assert_eq!(bits & TAG_MASK, TAG_HEAP, "misaligned heap cell");
        Value::from_bits(bits)
    }

    #[inline(always)]
    fn is_heap(&self) -> bool {
        self.bits & TAG_MASK == TAG_HEAP && self.bits != NIL_BITS
    }

    #[inline]
    fn object(&self) -> Option<&Object> {
        if !self.is_heap() {
            return None;
        }
        // Safety: heap words only come from `alloc`, and `self` owns a strong
        // count, so the cell outlives this borrow.
        Some(unsafe { &(*(self.bits as usize as *const HeapCell)).object })
    }

    /// Move this value's strong count into an `Rc`, leaving Nil behind.
    fn take_cell(&mut self) -> Option<Rc<HeapCell>> {
        if !self.is_heap() {
            return None;
        }
        let ptr = self.bits as usize as *const HeapCell;
        self.bits = NIL_BITS;
        // Safety: the word came from `Rc::into_raw` and carried one strong
        // count, which now belongs to the returned Rc.
        Some(unsafe { Rc::from_raw(ptr) })
    }

    // =========================================================================
    // Construction
    // =========================================================================

    /// Check whether `value` fits in an integer word
    #[inline]
    pub fn integer_in_range(value: i64) -> bool {
        (MOST_NEGATIVE_INT..=MOST_POSITIVE_INT).contains(&value)
    }

    /// Create an integer.
    ///
    /// # Panics
    ///
    /// Panics if `value` is outside `MOST_NEGATIVE_INT..=MOST_POSITIVE_INT`.
    pub fn integer(value: i64) -> Self {
        assert!(
            Value::integer_in_range(value),
            "integer {} outside {}..={}",
            value,
            MOST_NEGATIVE_INT,
            MOST_POSITIVE_INT
        );
        Value::from_bits(((value as u64) << TAG_BITS) | TAG_INT)
    }

    /// Create a character
    pub fn character(value: u32) -> Self {
        Value::from_bits((u64::from(value) << TAG_BITS) | TAG_CHAR)
    }

    /// Create a string by copying `bytes`
    pub fn string(bytes: &[u8]) -> Self {
        Value::string_from_vec(bytes.to_vec())
    }

    /// Create a string that takes ownership of `bytes`
    pub fn string_from_vec(bytes: Vec<u8>) -> Self {
        debug_assert!(bytes.len() < isize::MAX as usize);
        Value::alloc(Object::String(bytes.into_boxed_slice()))
    }

    /// Create a symbol named by the string value `name`.
    ///
    /// # Panics
    ///
    /// Panics if `name` is not a string.
    pub fn symbol(name: Value) -> Self {
        assert!(name.is_string(), "symbol name must be a string, got {}", name);
        Value::alloc(Object::Symbol(name))
    }

    /// Create a symbol from raw name bytes
    pub fn symbol_from_bytes(name: &[u8]) -> Self {
        Value::symbol(Value::string(name))
    }

    /// Create a symbol from text
    pub fn symbol_from_str(name: &str) -> Self {
        Value::symbol_from_bytes(name.as_bytes())
    }

    /// Create a pair. `rest` is shared, not copied.
    ///
    /// # Panics
    ///
    /// Panics if `rest` is not a list (Nil or a pair).
    pub fn cons(first: Value, rest: Value) -> Self {
        assert!(rest.is_list(), "cons: rest must be a list, got {}", rest);
        Value::alloc(Object::Pair(first, rest))
    }

    /// Build a proper list from `items`, in order
    pub fn list(items: impl IntoIterator<Item = Value>) -> Self {
        let items: Vec<Value> = items.into_iter().collect();
        items
            .into_iter()
            .rev()
            .fold(Value::NIL, |rest, first| Value::cons(first, rest))
    }

    // =========================================================================
    // Type Checking
    // =========================================================================

    /// Get the variant of this value. Nil is a [`Tag::List`].
    pub fn tag(&self) -> Tag {
        match self.bits & TAG_MASK {
            TAG_INT => Tag::Int,
            TAG_CHAR => Tag::Char,
            TAG_HEAP => match self.object() {
                None => Tag::List,
                Some(Object::String(_)) => Tag::String,
                Some(Object::Symbol(_)) => Tag::Symbol,
                Some(Object::Pair(..)) => Tag::List,
            },
            _ => unreachable!("reserved tag in value word {:#x}", self.bits),
        }
    }

    #[inline(always)]
    pub fn is_nil(&self) -> bool {
        self.bits == NIL_BITS
    }

    #[inline(always)]
    pub fn is_integer(&self) -> bool {
        self.bits & TAG_MASK == TAG_INT
    }

    #[inline(always)]
    pub fn is_character(&self) -> bool {
        self.bits & TAG_MASK == TAG_CHAR
    }

    pub fn is_string(&self) -> bool {
        matches!(self.object(), Some(Object::String(_)))
    }

    pub fn is_symbol(&self) -> bool {
        matches!(self.object(), Some(Object::Symbol(_)))
    }

    pub fn is_pair(&self) -> bool {
        matches!(self.object(), Some(Object::Pair(..)))
    }

    /// Nil or a pair
    pub fn is_list(&self) -> bool {
        self.is_nil() || self.is_pair()
    }

    // =========================================================================
    // Accessors
    //
    // All accessors panic when called on the wrong variant; check `tag` first.
    // =========================================================================

    pub fn as_integer(&self) -> i64 {
        assert!(self.is_integer(), "{} is not an integer", self);
        (self.bits as i64) >> TAG_BITS
    }

    pub fn as_character(&self) -> u32 {
        assert!(self.is_character(), "{} is not a character", self);
        (self.bits >> TAG_BITS) as u32
    }

    /// The bytes of a string
    pub fn string_bytes(&self) -> &[u8] {
        match self.object() {
            Some(Object::String(bytes)) => bytes,
            _ => panic!("{} is not a string", self),
        }
    }

    pub fn string_len(&self) -> usize {
        self.string_bytes().len()
    }

    /// The byte at `index` of a string
    pub fn string_ref(&self, index: usize) -> u8 {
        self.string_bytes()[index]
    }

    /// The name of a symbol (a string value)
    pub fn symbol_name(&self) -> &Value {
        match self.object() {
            Some(Object::Symbol(name)) => name,
            _ => panic!("{} is not a symbol", self),
        }
    }

    pub fn first(&self) -> &Value {
        match self.object() {
            Some(Object::Pair(first, _)) => first,
            _ => panic!("{} is not a pair", self),
        }
    }

    pub fn rest(&self) -> &Value {
        match self.object() {
            Some(Object::Pair(_, rest)) => rest,
            _ => panic!("{} is not a pair", self),
        }
    }

    /// Iterate over the elements of a list
    pub fn iter(&self) -> ListIter<'_> {
        assert!(self.is_list(), "{} is not a list", self);
        ListIter { rest: self }
    }

    // =========================================================================
    // Identity
    // =========================================================================

    /// True if both values are the same word (same object, or same immediate)
    #[inline(always)]
    pub fn ptr_eq(&self, other: &Value) -> bool {
        self.bits == other.bits
    }

    /// The raw word, usable as an identity key
    #[inline(always)]
    pub fn identity(&self) -> u64 {
        self.bits
    }
}

impl Default for Value {
    fn default() -> Self {
        Value::NIL
    }
}

impl Clone for Value {
    #[inline]
    fn clone(&self) -> Self {
        if self.is_heap() {
            // Safety: see `object`; the new Value owns the added count.
            unsafe { Rc::increment_strong_count(self.bits as usize as *const HeapCell) };
        }
        Value::from_bits(self.bits)
    }
}

impl Drop for Value {
    fn drop(&mut self) {
        // Cells losing their last handle hand their children to this loop
        // instead of dropping them in place, so neither long spines nor deep
        // nesting recurse.
        let mut next = self.take_cell();
        let mut pending = Vec::new();
        while let Some(cell) = next.take().or_else(|| pending.pop()) {
            let Ok(HeapCell { object, .. }) = Rc::try_unwrap(cell) else {
                continue;
            };
            match object {
                Object::Pair(mut first, mut rest) => {
                    pending.extend(rest.take_cell());
                    next = first.take_cell();
                }
                Object::Symbol(mut name) => next = name.take_cell(),
                Object::String(_) => {}
            }
        }
    }
}

impl fmt::Debug for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(self, f)
    }
}

impl FromIterator<Value> for Value {
    fn from_iter<I: IntoIterator<Item = Value>>(iter: I) -> Self {
        Value::list(iter)
    }
}

impl<'a> IntoIterator for &'a Value {
    type Item = &'a Value;
    type IntoIter = ListIter<'a>;

    fn into_iter(self) -> ListIter<'a> {
        self.iter()
    }
}

/// Iterator over the elements of a list, see [`Value::iter`]
#[derive(Clone)]
pub struct ListIter<'a> {
    rest: &'a Value,
}

impl<'a> Iterator for ListIter<'a> {
    type Item = &'a Value;

    fn next(&mut self) -> Option<&'a Value> {
        let rest: &'a Value = self.rest;
        match rest.object() {
            Some(Object::Pair(first, rest)) => {
                self.rest = rest;
                Some(first)
            }
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory_stats::heap_stats;

    #[test]
    fn test_constructors_and_accessors() {
        let integer = Value::integer(100);
        assert_eq!(integer.tag(), Tag::Int);
        assert_eq!(integer.as_integer(), 100);

        let character = Value::character('a' as u32);
        assert_eq!(character.tag(), Tag::Char);
        assert_eq!(character.as_character(), 'a' as u32);

        let string = Value::string(b"stuff");
        assert_eq!(string.tag(), Tag::String);
        assert_eq!(string.string_len(), 5);
        assert_eq!(string.string_bytes(), b"stuff");
        assert_eq!(string.string_ref(1), b't');

        let symbol = Value::symbol_from_str("stuff");
        assert_eq!(symbol.tag(), Tag::Symbol);
        assert_eq!(symbol.symbol_name().string_bytes(), b"stuff");

        let list = Value::cons(integer.clone(), Value::NIL);
        let list = Value::cons(character.clone(), list);
        assert_eq!(list.tag(), Tag::List);
        assert_eq!(list.first().as_character(), 'a' as u32);
        assert_eq!(list.rest().first().as_integer(), 100);
        assert!(list.rest().rest().is_nil());
    }

    #[test]
    fn test_value_is_one_word() {
        assert_eq!(std::mem::size_of::<Value>(), 8);
        assert_eq!(std::mem::size_of::<Option<Value>>(), 16);
    }

    #[test]
    fn test_nil_is_a_list() {
        assert_eq!(Value::NIL.tag(), Tag::List);
        assert!(Value::NIL.is_nil());
        assert!(Value::NIL.is_list());
        assert!(!Value::NIL.is_pair());
        assert!(Value::default().is_nil());
    }

    #[test]
    fn test_integer_bounds() {
        assert_eq!(MOST_POSITIVE_INT, (1i64 << 61) - 1);
        assert_eq!(MOST_NEGATIVE_INT, -(1i64 << 61));

        assert_eq!(Value::integer(MOST_POSITIVE_INT).as_integer(), MOST_POSITIVE_INT);
        assert_eq!(Value::integer(MOST_NEGATIVE_INT).as_integer(), MOST_NEGATIVE_INT);
        assert_eq!(Value::integer(-1).as_integer(), -1);
        assert_eq!(Value::integer(0).as_integer(), 0);

        assert!(!Value::integer_in_range(MOST_POSITIVE_INT + 1));
        assert!(!Value::integer_in_range(MOST_NEGATIVE_INT - 1));
    }

    #[test]
    #[should_panic(expected = "outside")]
    fn test_integer_out_of_range_panics() {
        Value::integer(MOST_POSITIVE_INT + 1);
    }

    #[test]
    fn test_character_range() {
        assert_eq!(Value::character(0).as_character(), 0);
        assert_eq!(Value::character(0xFF).as_character(), 0xFF);
        assert_eq!(Value::character(0x10FFFF).as_character(), 0x10FFFF);
        assert_eq!(Value::character(u32::MAX).as_character(), u32::MAX);
    }

    #[test]
    #[should_panic(expected = "rest must be a list")]
    fn test_cons_rejects_integer_rest() {
        Value::cons(Value::integer(1), Value::integer(2));
    }

    #[test]
    #[should_panic(expected = "rest must be a list")]
    fn test_cons_rejects_string_rest() {
        Value::cons(Value::integer(1), Value::string(b"tail"));
    }

    #[test]
    #[should_panic(expected = "rest must be a list")]
    fn test_cons_rejects_symbol_rest() {
        Value::cons(Value::NIL, Value::symbol_from_str("tail"));
    }

    #[test]
    #[should_panic(expected = "symbol name must be a string")]
    fn test_symbol_requires_string_name() {
        Value::symbol(Value::integer(7));
    }

    #[test]
    #[should_panic(expected = "is not a pair")]
    fn test_first_of_nil_panics() {
        Value::NIL.first();
    }

    #[test]
    #[should_panic(expected = "is not an integer")]
    fn test_wrong_accessor_panics() {
        Value::character('x' as u32).as_integer();
    }

    #[test]
    fn test_list_and_iter() {
        let list = Value::list((1..=4).map(Value::integer));
        let items: Vec<i64> = list.iter().map(Value::as_integer).collect();
        assert_eq!(items, vec![1, 2, 3, 4]);

        let collected: Value = vec![Value::integer(9)].into_iter().collect();
        assert_eq!(collected.first().as_integer(), 9);
        assert!(collected.rest().is_nil());

        assert_eq!(Value::list(Vec::new()).iter().count(), 0);
    }

    #[test]
    fn test_cons_shares_structure() {
        let tail = Value::list([Value::integer(2), Value::integer(3)]);
        let a = Value::cons(Value::integer(1), tail.clone());
        let b = Value::cons(Value::integer(0), tail.clone());
        assert!(a.rest().ptr_eq(&tail));
        assert!(b.rest().ptr_eq(&tail));
    }

    #[test]
    fn test_immediates_are_identical_words() {
        assert!(Value::integer(42).ptr_eq(&Value::integer(42)));
        assert!(Value::character(65).ptr_eq(&Value::character(65)));
        assert!(!Value::integer(65).ptr_eq(&Value::character(65)));
        assert!(!Value::string(b"a").ptr_eq(&Value::string(b"a")));
    }

    #[test]
    fn test_heap_cells_are_reclaimed() {
        let before = heap_stats().live;
        {
            let shared = Value::list([Value::string(b"x"), Value::symbol_from_str("y")]);
            let a = Value::cons(Value::integer(1), shared.clone());
            let b = Value::cons(Value::integer(2), shared);
            assert!(heap_stats().live > before);
            drop(a);
            assert_eq!(b.rest().first().string_bytes(), b"x");
        }
        assert_eq!(heap_stats().live, before);
    }

    #[test]
    fn test_dropping_long_list_does_not_overflow() {
        let before = heap_stats().live;
        let mut list = Value::NIL;
        for i in 0..1_000_000 {
            list = Value::cons(Value::integer(i), list);
        }
        drop(list);
        assert_eq!(heap_stats().live, before);
    }

    #[test]
    fn test_dropping_deeply_nested_list_does_not_overflow() {
        let before = heap_stats().live;
        let mut nested = Value::string(b"core");
        for _ in 0..1_000_000 {
            nested = Value::cons(nested, Value::NIL);
        }
        drop(nested);
        assert_eq!(heap_stats().live, before);
    }
}
