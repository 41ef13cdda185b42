//! A typed, map-sized 2D store.
//!
//! [`Grid<T>`] holds one value per tile of a `width × height` map. Unlike a
//! shared view buffer, a grid is exclusively owned by whoever tracks that
//! plane; callers that only read take `&Grid<T>`.

use crate::geom::{Point, Range};

/// A 2D grid of `T` values indexed by [`Point`].
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(try_from = "RawGrid<T>"))]
pub struct Grid<T> {
    cells: Vec<T>,
    width: i32,
    height: i32,
}

/// Unchecked serialized form of a [`Grid`].
#[cfg(feature = "serde")]
#[derive(serde::Deserialize)]
struct RawGrid<T> {
    cells: Vec<T>,
    width: i32,
    height: i32,
}

#[cfg(feature = "serde")]
impl<T> TryFrom<RawGrid<T>> for Grid<T> {
    type Error = String;

    fn try_from(raw: RawGrid<T>) -> Result<Self, String> {
        let RawGrid {
            cells,
            width,
            height,
        } = raw;
        if width < 0 || height < 0 {
            return Err(format!("negative grid size {width}x{height}"));
        }
        let expected = (width as usize) * (height as usize);
        if cells.len() != expected {
            return Err(format!(
                "grid {width}x{height} needs {expected} cells, found {}",
                cells.len()
            ));
        }
        Ok(Self {
            cells,
            width,
            height,
        })
    }
}

impl<T: Copy + Default> Grid<T> {
    /// Create a new grid filled with `T::default()`.
    ///
    /// Negative dimensions are treated as zero.
    pub fn new(width: i32, height: i32) -> Self {
        Self::filled(width, height, T::default())
    }
}

impl<T: Copy> Grid<T> {
    /// Create a new grid with every cell set to `value`.
    pub fn filled(width: i32, height: i32, value: T) -> Self {
        let width = width.max(0);
        let height = height.max(0);
        Self {
            cells: vec![value; (width as usize) * (height as usize)],
            width,
            height,
        }
    }

    #[inline]
    fn index(&self, p: Point) -> Option<usize> {
        if p.x >= 0 && p.y >= 0 && p.x < self.width && p.y < self.height {
            Some((p.y * self.width + p.x) as usize)
        } else {
            None
        }
    }

    /// The bounding range `[0, 0) - (width, height)`.
    #[inline]
    pub fn bounds(&self) -> Range {
        Range::new(0, 0, self.width, self.height)
    }

    /// Returns the size as a Point (width = x, height = y).
    #[inline]
    pub fn size(&self) -> Point {
        Point::new(self.width, self.height)
    }

    /// Width in tiles.
    #[inline]
    pub fn width(&self) -> i32 {
        self.width
    }

    /// Height in tiles.
    #[inline]
    pub fn height(&self) -> i32 {
        self.height
    }

    /// Whether `p` lies on the grid.
    #[inline]
    pub fn contains(&self, p: Point) -> bool {
        self.index(p).is_some()
    }

    /// Get the value at `p`, or `None` if out of bounds.
    #[inline]
    pub fn at(&self, p: Point) -> Option<T> {
        self.index(p).map(|i| self.cells[i])
    }

    /// Mutable access to the value at `p`, or `None` if out of bounds.
    #[inline]
    pub fn at_mut(&mut self, p: Point) -> Option<&mut T> {
        let i = self.index(p)?;
        Some(&mut self.cells[i])
    }

    /// Set the value at `p`. Returns `false` (and does nothing) if `p` is out
    /// of bounds.
    #[inline]
    pub fn set(&mut self, p: Point, value: T) -> bool {
        match self.index(p) {
            Some(i) => {
                self.cells[i] = value;
                true
            }
            None => false,
        }
    }

    /// Fill the entire grid with `value`.
    pub fn fill(&mut self, value: T) {
        self.cells.fill(value);
    }

    /// Apply a transformation to every cell.
    pub fn map_cells(&mut self, mut f: impl FnMut(Point, T) -> T) {
        for (i, c) in self.cells.iter_mut().enumerate() {
            let p = Point::new(i as i32 % self.width, i as i32 / self.width);
            *c = f(p, *c);
        }
    }

    /// Count how many cells satisfy a predicate.
    pub fn count_fn(&self, mut f: impl FnMut(T) -> bool) -> usize {
        self.cells.iter().filter(|&&c| f(c)).count()
    }

    /// Iterate over `(Point, T)` pairs in row-major order.
    pub fn iter(&self) -> impl Iterator<Item = (Point, T)> + '_ {
        let w = self.width;
        self.cells
            .iter()
            .enumerate()
            .map(move |(i, &c)| (Point::new(i as i32 % w, i as i32 / w), c))
    }
}
