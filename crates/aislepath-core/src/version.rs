//! Layout versioning.
//!
//! Every mutation of a [`Layout`](crate::Layout) bumps its version. Grids and
//! path maps remember the version they were built from, so a query against
//! outdated maps can be detected instead of silently answered.

use std::fmt;

/// Monotonically increasing layout revision.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct LayoutVersion(pub u64);

impl LayoutVersion {
    /// Version of a freshly created layout.
    pub const INITIAL: Self = Self(0);

    #[inline]
    pub const fn get(self) -> u64 {
        self.0
    }

    #[inline]
    fn next(self) -> Self {
        Self(self.0.wrapping_add(1))
    }
}

impl fmt::Display for LayoutVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "v{}", self.0)
    }
}

/// Holds the current [`LayoutVersion`] and hands out new ones on mutation.
#[derive(Debug, Clone, Default)]
pub struct VersionTracker {
    current: LayoutVersion,
}

impl VersionTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// The version of the layout as it is now.
    #[inline]
    pub fn current(&self) -> LayoutVersion {
        self.current
    }

    /// Record a mutation. Returns the new version.
    pub fn bump(&mut self) -> LayoutVersion {
        self.current = self.current.next();
        log::trace!("layout version bumped to {}", self.current);
        self.current
    }

    /// Whether something stamped with `stamp` still describes the layout.
    #[inline]
    pub fn is_current(&self, stamp: LayoutVersion) -> bool {
        stamp == self.current
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn starts_at_initial() {
        let t = VersionTracker::new();
        assert_eq!(t.current(), LayoutVersion::INITIAL);
        assert!(t.is_current(LayoutVersion::INITIAL));
    }

    #[test]
    fn bump_strictly_increases() {
        let mut t = VersionTracker::new();
        let mut last = t.current();
        for _ in 0..5 {
            let v = t.bump();
            assert!(v > last);
            assert_eq!(v, t.current());
            last = v;
        }
        assert!(!t.is_current(LayoutVersion::INITIAL));
    }
}
