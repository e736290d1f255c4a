use std::fmt;
use std::ops::Bound;

use super::game_version::MinecraftVersion;

/// An interval of game versions used as a resolver registry key.
///
/// Each end is inclusive, exclusive or unbounded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VersionRange {
    lower: Bound<MinecraftVersion>,
    upper: Bound<MinecraftVersion>,
}

impl VersionRange {
    pub fn new(lower: Bound<MinecraftVersion>, upper: Bound<MinecraftVersion>) -> Self {
        Self { lower, upper }
    }

    /// `[start, end)`
    pub fn half_open(start: MinecraftVersion, end: MinecraftVersion) -> Self {
        Self::new(Bound::Included(start), Bound::Excluded(end))
    }

    /// `[start, end]`
    pub fn closed(start: MinecraftVersion, end: MinecraftVersion) -> Self {
        Self::new(Bound::Included(start), Bound::Included(end))
    }

    /// `[start, ∞)`
    pub fn at_least(start: MinecraftVersion) -> Self {
        Self::new(Bound::Included(start), Bound::Unbounded)
    }

    pub fn contains(&self, version: &MinecraftVersion) -> bool {
        let above_lower = match &self.lower {
            Bound::Included(l) => version >= l,
            Bound::Excluded(l) => version > l,
            Bound::Unbounded => true,
        };
        let below_upper = match &self.upper {
            Bound::Included(u) => version <= u,
            Bound::Excluded(u) => version < u,
            Bound::Unbounded => true,
        };
        above_lower && below_upper
    }

    /// True when some version satisfies both ranges.
    pub fn overlaps(&self, other: &VersionRange) -> bool {
        let lower = tighter_lower(&self.lower, &other.lower);
        let upper = tighter_upper(&self.upper, &other.upper);

        match (lower, upper) {
            (Bound::Unbounded, _) | (_, Bound::Unbounded) => true,
            (Bound::Included(l), Bound::Included(u)) => l <= u,
            (Bound::Included(l), Bound::Excluded(u))
            | (Bound::Excluded(l), Bound::Included(u))
            | (Bound::Excluded(l), Bound::Excluded(u)) => l < u,
        }
    }
}

fn tighter_lower<'a>(
    a: &'a Bound<MinecraftVersion>,
    b: &'a Bound<MinecraftVersion>,
) -> &'a Bound<MinecraftVersion> {
    match (a, b) {
        (Bound::Unbounded, other) | (other, Bound::Unbounded) => other,
        (Bound::Included(x) | Bound::Excluded(x), Bound::Included(y) | Bound::Excluded(y)) => {
            if x > y {
                a
            } else if y > x {
                b
            } else if matches!(a, Bound::Excluded(_)) {
                a
            } else {
                b
            }
        }
    }
}

fn tighter_upper<'a>(
    a: &'a Bound<MinecraftVersion>,
    b: &'a Bound<MinecraftVersion>,
) -> &'a Bound<MinecraftVersion> {
    match (a, b) {
        (Bound::Unbounded, other) | (other, Bound::Unbounded) => other,
        (Bound::Included(x) | Bound::Excluded(x), Bound::Included(y) | Bound::Excluded(y)) => {
            if x < y {
                a
            } else if y < x {
                b
            } else if matches!(a, Bound::Excluded(_)) {
                a
            } else {
                b
            }
        }
    }
}

impl fmt::Display for VersionRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.lower {
            Bound::Included(v) => write!(f, "[{}", v)?,
            Bound::Excluded(v) => write!(f, "({}", v)?,
            Bound::Unbounded => write!(f, "(-∞")?,
        }
        write!(f, ", ")?;
        match &self.upper {
            Bound::Included(v) => write!(f, "{}]", v),
            Bound::Excluded(v) => write!(f, "{})", v),
            Bound::Unbounded => write!(f, "∞)"),
        }
    }
}
