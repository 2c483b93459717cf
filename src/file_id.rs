//! File ID generation
//!
//! Every managed file lives at a path built from one component per
//! directory record on its branch:
//!
//! ```text
//! <root>/PT000000/ST000000/SE000000/IM000000
//!        └─prefix─┘└index┘
//!          2 chars  6 chars, zero padded
//! ```
//!
//! A component is at most 8 characters of `[A-Z0-9_]`. The index is
//! written in decimal until the File-set grows past the decimal capacity,
//! after which the whole set switches to base 36 (`0-9A-Z`).

use std::fmt;

use crate::error::{FileSetError, Result};

/// Maximum characters in one File ID component
pub const MAX_COMPONENT_LEN: usize = 8;

/// Maximum number of components in a File ID
pub const MAX_DEPTH: usize = 8;

/// Prefix length assumed when sizing the alphabet for a File-set
pub const STANDARD_PREFIX_LEN: usize = 2;

const DIGITS: &[u8; 36] = b"0123456789ABCDEFGHIJKLMNOPQRSTUVWXYZ";

/// Numeral alphabet used for the index part of a component
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Alphabet {
    /// `0-9`
    #[default]
    Numeric,
    /// `0-9A-Z`
    Alphanumeric,
}

impl Alphabet {
    pub fn radix(self) -> u64 {
        match self {
            Alphabet::Numeric => 10,
            Alphabet::Alphanumeric => 36,
        }
    }

    /// Number of distinct indices available after a prefix of `prefix_len`
    pub fn capacity(self, prefix_len: usize) -> u64 {
        let width = MAX_COMPONENT_LEN.saturating_sub(prefix_len) as u32;
        self.radix().saturating_pow(width)
    }

    /// Smallest alphabet able to address `count` instances
    pub fn for_count(count: usize) -> Result<Self> {
        let count = count as u64;
        let ceiling = Alphabet::Alphanumeric.capacity(STANDARD_PREFIX_LEN);
        if count > ceiling {
            return Err(FileSetError::Capacity(format!(
                "{} instances exceed the maximum of {} a File-set can address",
                count, ceiling
            )));
        }
        if count > Alphabet::Numeric.capacity(STANDARD_PREFIX_LEN) {
            Ok(Alphabet::Alphanumeric)
        } else {
            Ok(Alphabet::Numeric)
        }
    }
}

impl fmt::Display for Alphabet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Alphabet::Numeric => f.write_str("numeric"),
            Alphabet::Alphanumeric => f.write_str("alphanumeric"),
        }
    }
}

/// Build one component: `prefix` followed by `index` zero padded to fill
/// the remaining characters
pub fn component(prefix: &str, index: u64, alphabet: Alphabet) -> Result<String> {
    if prefix.len() >= MAX_COMPONENT_LEN {
        return Err(FileSetError::Validation(format!(
            "the File ID prefix '{}' must be at most {} characters",
            prefix,
            MAX_COMPONENT_LEN - 1
        )));
    }

    let capacity = alphabet.capacity(prefix.len());
    if index >= capacity {
        return Err(FileSetError::Capacity(format!(
            "index {} does not fit in a {} component after prefix '{}'",
            index, alphabet, prefix
        )));
    }

    let width = MAX_COMPONENT_LEN - prefix.len();
    let radix = alphabet.radix();
    let mut digits = vec![b'0'; width];
    let mut value = index;
    for slot in digits.iter_mut().rev() {
        *slot = DIGITS[(value % radix) as usize];
        value /= radix;
    }

    let mut out = String::with_capacity(MAX_COMPONENT_LEN);
    out.push_str(prefix);
    out.extend(digits.into_iter().map(char::from));
    Ok(out)
}

/// Iterator over consecutive components for one prefix
///
/// Stops once the alphabet is exhausted.
#[derive(Debug, Clone)]
pub struct FileIdGenerator {
    prefix: String,
    alphabet: Alphabet,
    next: u64,
    end: u64,
}

impl FileIdGenerator {
    pub fn new(prefix: impl Into<String>, alphabet: Alphabet) -> Result<Self> {
        let prefix = prefix.into();
        if prefix.len() >= MAX_COMPONENT_LEN {
            return Err(FileSetError::Validation(format!(
                "the File ID prefix '{}' must be at most {} characters",
                prefix,
                MAX_COMPONENT_LEN - 1
            )));
        }
        let end = alphabet.capacity(prefix.len());
        Ok(Self {
            prefix,
            alphabet,
            next: 0,
            end,
        })
    }

    /// Skip ahead so the first component has index `start`
    pub fn starting_at(mut self, start: u64) -> Self {
        self.next = start.min(self.end);
        self
    }
}

impl Iterator for FileIdGenerator {
    type Item = String;

    fn next(&mut self) -> Option<Self::Item> {
        if self.next >= self.end {
            return None;
        }
        let index = self.next;
        self.next += 1;
        component(&self.prefix, index, self.alphabet).ok()
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let left = usize::try_from(self.end - self.next).unwrap_or(usize::MAX);
        (left, Some(left))
    }
}

/// A single component is 1 to 8 characters of `[A-Z0-9_]`
pub fn is_conformant_component(component: &str) -> bool {
    !component.is_empty()
        && component.len() <= MAX_COMPONENT_LEN
        && component
            .bytes()
            .all(|b| b.is_ascii_uppercase() || b.is_ascii_digit() || b == b'_')
}

/// A File ID is 1 to 8 conformant components
pub fn is_conformant_file_id<S: AsRef<str>>(components: &[S]) -> bool {
    !components.is_empty()
        && components.len() <= MAX_DEPTH
        && components
            .iter()
            .all(|c| is_conformant_component(c.as_ref()))
}

/// A stored component that can be joined onto the root without leaving it
///
/// Looser than conformance: existing File-sets written by other tools may
/// use lower case or longer names, which are read as-is.
pub fn is_safe_component(component: &str) -> bool {
    !component.is_empty()
        && component != "."
        && component != ".."
        && !component.contains(['/', '\\'])
        && !component.contains('\0')
}
