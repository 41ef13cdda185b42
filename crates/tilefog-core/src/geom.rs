//! Geometry primitives: [`Point`], [`Range`] and the Manhattan-distance
//! iterators used for diamond-shaped vision.

use std::fmt;

// ---------------------------------------------------------------------------
// Point
// ---------------------------------------------------------------------------

/// A 2D tile coordinate. X grows right (east), Y grows down (south).
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Point {
    pub x: i32,
    pub y: i32,
}

impl Point {
    /// Origin (0, 0).
    pub const ZERO: Self = Self { x: 0, y: 0 };

    /// Create a new point.
    #[inline]
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    /// The point (dx, dy) away.
    #[inline]
    pub const fn shift(self, dx: i32, dy: i32) -> Self {
        Self {
            x: self.x + dx,
            y: self.y + dy,
        }
    }

    /// Manhattan (taxicab) distance to `other`.
    #[inline]
    pub fn distance(self, other: Point) -> i32 {
        (self.x - other.x).abs() + (self.y - other.y).abs()
    }

    /// The four cardinal neighbours (up, right, down, left).
    #[inline]
    pub fn neighbors_4(self) -> [Point; 4] {
        [
            Self::new(self.x, self.y - 1),
            Self::new(self.x + 1, self.y),
            Self::new(self.x, self.y + 1),
            Self::new(self.x - 1, self.y),
        ]
    }

    /// All eight neighbours (cardinal + diagonal).
    #[inline]
    pub fn neighbors_8(self) -> [Point; 8] {
        [
            Self::new(self.x, self.y - 1),
            Self::new(self.x + 1, self.y - 1),
            Self::new(self.x + 1, self.y),
            Self::new(self.x + 1, self.y + 1),
            Self::new(self.x, self.y + 1),
            Self::new(self.x - 1, self.y + 1),
            Self::new(self.x - 1, self.y),
            Self::new(self.x - 1, self.y - 1),
        ]
    }

    /// Every point whose Manhattan distance to `self` is at most `radius`.
    ///
    /// Points are yielded column by column, west to east. A negative radius
    /// yields nothing.
    #[inline]
    pub fn diamond(self, radius: i32) -> Diamond {
        Diamond {
            center: self,
            radius,
            dx: -radius,
            dy: 0,
        }
    }

    /// Every point at Manhattan distance exactly `dist` from `self`.
    ///
    /// A distance of zero yields `self` alone.
    #[inline]
    pub fn ring(self, dist: i32) -> Ring {
        Ring {
            center: self,
            dist,
            dx: -dist,
            lower: false,
        }
    }
}

impl fmt::Display for Point {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.x, self.y)
    }
}

// ---------------------------------------------------------------------------
// Range
// ---------------------------------------------------------------------------

/// A half-open rectangle \[min, max). `min` is inclusive, `max` is exclusive.
///
/// All empty ranges are considered equal.
#[derive(Copy, Clone, Debug, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Range {
    pub min: Point,
    pub max: Point,
}

impl PartialEq for Range {
    fn eq(&self, other: &Self) -> bool {
        (self.min == other.min && self.max == other.max) || (self.is_empty() && other.is_empty())
    }
}

impl Eq for Range {}

impl Range {
    /// Range spanning two corners, in either order.
    #[inline]
    pub fn new(x0: i32, y0: i32, x1: i32, y1: i32) -> Self {
        Self {
            min: Point::new(x0.min(x1), y0.min(y1)),
            max: Point::new(x0.max(x1), y0.max(y1)),
        }
    }

    /// Width and height as a `Point`.
    #[inline]
    pub fn size(self) -> Point {
        Point::new(self.max.x - self.min.x, self.max.y - self.min.y)
    }

    /// Width of the range.
    #[inline]
    pub fn width(self) -> i32 {
        self.max.x - self.min.x
    }

    /// Height of the range.
    #[inline]
    pub fn height(self) -> i32 {
        self.max.y - self.min.y
    }

    /// Move the `min` corner by (dx0, dy0) and the `max` corner by
    /// (dx1, dy1). Collapses to the empty range if the corners cross.
    #[inline]
    pub fn shift(self, dx0: i32, dy0: i32, dx1: i32, dy1: i32) -> Self {
        let r = Self {
            min: self.min.shift(dx0, dy0),
            max: self.max.shift(dx1, dy1),
        };
        if r.is_empty() { Self::default() } else { r }
    }

    /// Grow the range by `margin` tiles on every side.
    #[inline]
    pub fn grow(self, margin: i32) -> Self {
        self.shift(-margin, -margin, margin, margin)
    }

    /// Total number of cells in the range.
    #[inline]
    pub fn len(self) -> usize {
        if self.is_empty() {
            return 0;
        }
        (self.width() as usize) * (self.height() as usize)
    }

    /// Whether the range has zero or negative area.
    #[inline]
    pub fn is_empty(self) -> bool {
        self.min.x >= self.max.x || self.min.y >= self.max.y
    }

    /// Whether `p` is inside the half-open range.
    #[inline]
    pub fn contains(self, p: Point) -> bool {
        p.x >= self.min.x && p.x < self.max.x && p.y >= self.min.y && p.y < self.max.y
    }

    /// The overlap of two ranges, or the empty range.
    #[inline]
    pub fn intersect(self, other: Range) -> Self {
        let r = Self {
            min: Point::new(self.min.x.max(other.min.x), self.min.y.max(other.min.y)),
            max: Point::new(self.max.x.min(other.max.x), self.max.y.min(other.max.y)),
        };
        if r.is_empty() { Self::default() } else { r }
    }

    /// Row-major iterator over every point in the range.
    #[inline]
    pub fn iter(self) -> RangeIter {
        RangeIter {
            range: self,
            cur: self.min,
        }
    }
}

impl IntoIterator for Range {
    type Item = Point;
    type IntoIter = RangeIter;
    #[inline]
    fn into_iter(self) -> RangeIter {
        self.iter()
    }
}

impl fmt::Display for Range {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}-{})", self.min, self.max)
    }
}

// ---------------------------------------------------------------------------
// Iterators
// ---------------------------------------------------------------------------

/// Row-major iterator over the points in a [`Range`].
#[derive(Clone, Debug)]
pub struct RangeIter {
    range: Range,
    cur: Point,
}

impl Iterator for RangeIter {
    type Item = Point;

    #[inline]
    fn next(&mut self) -> Option<Point> {
        if self.cur.y >= self.range.max.y || self.range.is_empty() {
            return None;
        }
        let p = self.cur;
        self.cur.x += 1;
        if self.cur.x >= self.range.max.x {
            self.cur.x = self.range.min.x;
            self.cur.y += 1;
        }
        Some(p)
    }

    #[inline]
    fn size_hint(&self) -> (usize, Option<usize>) {
        if self.range.is_empty() || self.cur.y >= self.range.max.y {
            return (0, Some(0));
        }
        let w = self.range.width() as usize;
        let remaining_in_row = (self.range.max.x - self.cur.x) as usize;
        let remaining_rows = (self.range.max.y - self.cur.y - 1) as usize;
        let total = remaining_in_row + remaining_rows * w;
        (total, Some(total))
    }
}

impl ExactSizeIterator for RangeIter {}

/// Iterator over a filled Manhattan diamond, see [`Point::diamond`].
#[derive(Clone, Debug)]
pub struct Diamond {
    center: Point,
    radius: i32,
    dx: i32,
    dy: i32,
}

impl Iterator for Diamond {
    type Item = Point;

    fn next(&mut self) -> Option<Point> {
        if self.radius < 0 || self.dx > self.radius {
            return None;
        }
        let p = self.center.shift(self.dx, self.dy);
        let span = self.radius - self.dx.abs();
        if self.dy < span {
            self.dy += 1;
        } else {
            self.dx += 1;
            self.dy = -(self.radius - self.dx.abs());
        }
        Some(p)
    }
}

/// Iterator over a hollow Manhattan ring, see [`Point::ring`].
#[derive(Clone, Debug)]
pub struct Ring {
    center: Point,
    dist: i32,
    dx: i32,
    /// Whether the southern twin of the current column is due.
    lower: bool,
}

impl Iterator for Ring {
    type Item = Point;

    fn next(&mut self) -> Option<Point> {
        if self.dist < 0 || self.dx > self.dist {
            return None;
        }
        let dy = self.dist - self.dx.abs();
        let p = if self.lower {
            self.center.shift(self.dx, dy)
        } else {
            self.center.shift(self.dx, -dy)
        };
        if dy != 0 && !self.lower {
            self.lower = true;
        } else {
            self.lower = false;
            self.dx += 1;
        }
        Some(p)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn manhattan_distance() {
        let a = Point::new(1, 2);
        let b = Point::new(3, -4);
        assert_eq!(a.distance(b), 8);
        assert_eq!(b.distance(a), 8);
        assert_eq!(a.distance(a), 0);
        assert!(a.neighbors_8().iter().all(|n| (1..=2).contains(&n.distance(a))));
    }

    #[test]
    fn range_basics() {
        let r = Range::new(0, 0, 3, 2);
        assert_eq!(r.size(), Point::new(3, 2));
        assert!(!r.is_empty());
        assert!(r.contains(Point::new(0, 0)));
        assert!(r.contains(Point::new(2, 1)));
        assert!(!r.contains(Point::new(3, 0)));
        assert!(!r.contains(Point::new(0, 2)));
    }

    #[test]
    fn range_auto_canonicalize() {
        let r = Range::new(3, 2, 0, 0);
        assert_eq!(r.min, Point::new(0, 0));
        assert_eq!(r.max, Point::new(3, 2));
    }

    #[test]
    fn range_iter_count() {
        let r = Range::new(0, 0, 3, 2);
        let pts: Vec<_> = r.iter().collect();
        assert_eq!(pts.len(), 6);
        assert_eq!(pts[0], Point::new(0, 0));
        assert_eq!(pts[5], Point::new(2, 1));
        assert_eq!(r.iter().len(), 6);
    }

    #[test]
    fn range_intersect_no_overlap_returns_empty() {
        let a = Range::new(0, 0, 2, 2);
        let b = Range::new(5, 5, 7, 7);
        let c = a.intersect(b);
        assert!(c.is_empty());
        assert_eq!(c, Range::default());
    }

    #[test]
    fn range_grow_then_clip() {
        let map = Range::new(0, 0, 10, 10);
        let view = Range::new(0, 2, 4, 6).grow(1);
        assert_eq!(view, Range::new(-1, 1, 5, 7));
        assert_eq!(view.intersect(map), Range::new(0, 1, 5, 7));
    }

    #[test]
    fn diamond_matches_distance_predicate() {
        let c = Point::new(5, 5);
        for r in 0..=9 {
            let pts: Vec<_> = c.diamond(r).collect();
            let set: HashSet<_> = pts.iter().copied().collect();
            assert_eq!(pts.len(), set.len(), "no duplicates at radius {r}");
            // 2r(r+1)+1 tiles in a filled diamond.
            assert_eq!(pts.len() as i32, 2 * r * (r + 1) + 1);
            for p in Range::new(-10, -10, 21, 21) {
                assert_eq!(set.contains(&p), p.distance(c) <= r, "{p} at radius {r}");
            }
        }
    }

    #[test]
    fn diamond_negative_radius_is_empty() {
        assert_eq!(Point::ZERO.diamond(-1).count(), 0);
    }

    #[test]
    fn ring_is_exact_distance() {
        let c = Point::new(-3, 7);
        assert_eq!(c.ring(0).collect::<Vec<_>>(), vec![c]);
        for d in 1..=11 {
            let pts: Vec<_> = c.ring(d).collect();
            let set: HashSet<_> = pts.iter().copied().collect();
            assert_eq!(pts.len(), set.len());
            assert_eq!(pts.len() as i32, 4 * d);
            assert!(pts.iter().all(|p| p.distance(c) == d));
        }
    }
}
