//! Resource identifiers using string interning
//!
//! Every shape in a diagram is addressed by its resource id (for example
//! `sid-6C1D1E53`). This module provides the [`Id`] type, which interns those
//! strings so ids are `Copy` and compare in constant time.

use std::{
    fmt,
    sync::{Mutex, OnceLock, PoisonError},
};

use string_interner::{DefaultStringInterner, DefaultSymbol};

/// Global string interner for resource ids.
///
/// # Thread Safety
///
/// This uses `Mutex` for thread-safe access to the string interner. A
/// poisoned lock is recovered since the interner is append-only.
static INTERNER: OnceLock<Mutex<DefaultStringInterner>> = OnceLock::new();

fn with_interner<R>(f: impl FnOnce(&mut DefaultStringInterner) -> R) -> R {
    let mut interner = INTERNER
        .get_or_init(|| Mutex::new(DefaultStringInterner::new()))
        .lock()
        .unwrap_or_else(PoisonError::into_inner);
    f(&mut interner)
}

/// Interned resource identifier of a shape.
///
/// # Examples
///
/// ```
/// use swimlane_core::identifier::Id;
///
/// let task = Id::new("sid-task-1");
/// let same: Id = "sid-task-1".into();
/// assert_eq!(task, same);
/// assert_eq!(task, "sid-task-1");
///
/// let generated = Id::generated("lane", 3);
/// assert_eq!(generated, "lane-3");
/// ```
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct Id(DefaultSymbol);

impl Id {
    /// Creates an `Id` from a resource id string.
    pub fn new(name: &str) -> Self {
        Self(with_interner(|interner| interner.get_or_intern(name)))
    }

    /// Creates an id of the form `{prefix}-{idx}`, for shapes created by the
    /// editor rather than loaded from a document.
    pub fn generated(prefix: &str, idx: usize) -> Self {
        Self::new(&format!("{prefix}-{idx}"))
    }

    fn resolve(self) -> String {
        with_interner(|interner| interner.resolve(self.0).unwrap_or_default().to_owned())
    }
}

impl fmt::Display for Id {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.resolve())
    }
}

impl fmt::Debug for Id {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Id({:?})", self.resolve())
    }
}

impl std::str::FromStr for Id {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self::new(s))
    }
}

impl From<&str> for Id {
    fn from(name: &str) -> Self {
        Self::new(name)
    }
}

impl PartialEq<str> for Id {
    /// Allows direct comparison with string slices: `id == "string"`
    fn eq(&self, other: &str) -> bool {
        with_interner(|interner| interner.resolve(self.0) == Some(other))
    }
}

impl PartialEq<&str> for Id {
    fn eq(&self, other: &&str) -> bool {
        self == *other
    }
}
