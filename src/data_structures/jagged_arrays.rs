use std::convert::From;
use std::ops::{Index, IndexMut};

/// A 2-dimensional table stored contiguously in memory and indexed manually.
/// Serves to replace Vec<Vec<T>> in cases when inner Vec's might have different lengths,
/// e.g. one message per directed edge, each sized to the domain of its variable endpoint.
#[derive(Debug, Clone, PartialEq)]
pub struct JaggedArray2<T> {
    index_shift: Vec<usize>,
    data: Vec<T>,
}

impl<T> JaggedArray2<T> {
    pub fn new() -> Self {
        JaggedArray2 {
            index_shift: vec![0; 1],
            data: Vec::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.index_shift.len() - 1
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn inner_len(&self, index: usize) -> usize {
        assert!(index < self.len());
        self.index_shift[index + 1] - self.index_shift[index]
    }

    fn internal_index(&self, index: [usize; 2]) -> usize {
        assert!(index[0] < self.len());
        assert!(index[1] < self.index_shift[index[0] + 1] - self.index_shift[index[0]]);
        self.index_shift[index[0]] + index[1]
    }

    pub fn get(&self, index: [usize; 2]) -> &T {
        &self.data[self.internal_index(index)]
    }

    pub fn get_mut(&mut self, index: [usize; 2]) -> &mut T {
        let idx = self.internal_index(index);
        &mut self.data[idx]
    }

    // Returns the inner array at the given outer index as a slice
    pub fn row(&self, index: usize) -> &[T] {
        assert!(index < self.len());
        &self.data[self.index_shift[index]..self.index_shift[index + 1]]
    }

    pub fn row_mut(&mut self, index: usize) -> &mut [T] {
        assert!(index < self.len());
        &mut self.data[self.index_shift[index]..self.index_shift[index + 1]]
    }
}

impl<T: Clone> JaggedArray2<T> {
    // Overwrites a whole inner array, lengths must match
    pub fn set_row(&mut self, index: usize, values: &[T]) {
        self.row_mut(index).clone_from_slice(values);
    }
}

impl<T> Default for JaggedArray2<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Index<[usize; 2]> for JaggedArray2<T> {
    type Output = T;

    fn index(&self, index: [usize; 2]) -> &Self::Output {
        self.get(index)
    }
}

impl<T> IndexMut<[usize; 2]> for JaggedArray2<T> {
    fn index_mut(&mut self, index: [usize; 2]) -> &mut T {
        self.get_mut(index)
    }
}

impl<T> From<Vec<Vec<T>>> for JaggedArray2<T> {
    fn from(value: Vec<Vec<T>>) -> Self {
        // precompute index shifts
        let mut index_shift = Vec::with_capacity(value.len() + 1);
        index_shift.push(0);
        for i in 0..value.len() {
            index_shift.push(index_shift[i] + value[i].len());
        }

        // flatten data
        let data = value.into_iter().flatten().collect();

        JaggedArray2 { index_shift, data }
    }
}
