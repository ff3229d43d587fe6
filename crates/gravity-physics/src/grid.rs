//! Dense row-major 2D storage
//!
//! Element `(i, j)` lives at `j * width + i`; `i` runs along x, `j` along z.

use std::ops::{Index, IndexMut};

#[derive(Debug, Clone, PartialEq)]
pub struct Grid<T> {
    width: usize,
    height: usize,
    data: Vec<T>,
}

impl<T: Clone + Default> Grid<T> {
    /// Grid filled with `T::default()`
    pub fn new(width: usize, height: usize) -> Self {
        Self::filled(width, height, T::default())
    }
}

impl<T: Clone> Grid<T> {
    pub fn filled(width: usize, height: usize, value: T) -> Self {
        Self {
            width,
            height,
            data: vec![value; width * height],
        }
    }
}

impl<T> Grid<T> {
    /// Wrap existing row-major data. Returns `None` when the length does not
    /// match `width * height`.
    pub fn from_vec(width: usize, height: usize, data: Vec<T>) -> Option<Self> {
        (data.len() == width * height).then_some(Self { width, height, data })
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn same_shape<U>(&self, other: &Grid<U>) -> bool {
        self.width == other.width && self.height == other.height
    }

    #[inline]
    fn offset(&self, i: usize, j: usize) -> usize {
        j * self.width + i
    }

    pub fn get(&self, i: usize, j: usize) -> Option<&T> {
        if i < self.width && j < self.height {
            self.data.get(self.offset(i, j))
        } else {
            None
        }
    }

    pub fn get_mut(&mut self, i: usize, j: usize) -> Option<&mut T> {
        if i < self.width && j < self.height {
            let idx = self.offset(i, j);
            self.data.get_mut(idx)
        } else {
            None
        }
    }

    pub fn as_slice(&self) -> &[T] {
        &self.data
    }

    pub fn as_mut_slice(&mut self) -> &mut [T] {
        &mut self.data
    }

    pub fn into_vec(self) -> Vec<T> {
        self.data
    }

    /// Row `j` (constant z)
    pub fn row(&self, j: usize) -> &[T] {
        let start = j * self.width;
        &self.data[start..start + self.width]
    }

    pub fn row_mut(&mut self, j: usize) -> &mut [T] {
        let start = j * self.width;
        &mut self.data[start..start + self.width]
    }

    /// Copy of column `i` (constant x)
    pub fn column(&self, i: usize) -> Vec<T>
    where
        T: Clone,
    {
        (0..self.height).map(|j| self[(i, j)].clone()).collect()
    }

    pub fn set_column(&mut self, i: usize, values: &[T])
    where
        T: Clone,
    {
        for (j, v) in values.iter().enumerate().take(self.height) {
            self[(i, j)] = v.clone();
        }
    }

    pub fn map<U, F: FnMut(&T) -> U>(&self, f: F) -> Grid<U> {
        Grid {
            width: self.width,
            height: self.height,
            data: self.data.iter().map(f).collect(),
        }
    }

    /// Iterate `(i, j, value)` in storage order
    pub fn indexed(&self) -> impl Iterator<Item = (usize, usize, &T)> {
        let w = self.width.max(1);
        self.data.iter().enumerate().map(move |(k, v)| (k % w, k / w, v))
    }
}

impl Grid<f64> {
    pub fn sum(&self) -> f64 {
        self.data.iter().sum()
    }

    pub fn max_abs(&self) -> f64 {
        self.data.iter().fold(0.0, |m, v| m.max(v.abs()))
    }
}

impl<T> Index<(usize, usize)> for Grid<T> {
    type Output = T;

    fn index(&self, (i, j): (usize, usize)) -> &T {
        &self.data[self.offset(i, j)]
    }
}

impl<T> IndexMut<(usize, usize)> for Grid<T> {
    fn index_mut(&mut self, (i, j): (usize, usize)) -> &mut T {
        let idx = self.offset(i, j);
        &mut self.data[idx]
    }
}
