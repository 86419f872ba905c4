use std::mem;

use ndarray::Array2;

use crate::data_structures::jagged_arrays::JaggedArray2;

// Two generations of messages: a sweep reads only `current` and writes only `next`,
// then `exchange()` makes the freshly computed messages current
#[derive(Debug, Clone, PartialEq)]
pub struct MessageBuffers<T> {
    current: T,
    next: T,
}

impl<T: Clone> MessageBuffers<T> {
    // Creates both generations from the same initial messages
    pub fn new(initial: T) -> Self {
        MessageBuffers {
            next: initial.clone(),
            current: initial,
        }
    }
}

impl<T> MessageBuffers<T> {
    pub fn current(&self) -> &T {
        &self.current
    }

    pub fn next_mut(&mut self) -> &mut T {
        &mut self.next
    }

    // Applies the same update to both generations (used for clamped messages)
    pub fn update_both(&mut self, mut update: impl FnMut(&mut T)) {
        update(&mut self.current);
        update(&mut self.next);
    }

    pub fn exchange(&mut self) {
        mem::swap(&mut self.current, &mut self.next);
    }
}

// Probability-vector messages, one row per directed edge
pub type DiscreteMessages = JaggedArray2<f64>;

// Scalar Gaussian messages as dense (sender, receiver) matrices
#[derive(Debug, Clone, PartialEq)]
pub struct GaussianMessages {
    pub mean: Array2<f64>,
    pub precision: Array2<f64>,
}

impl GaussianMessages {
    // Non-informative messages: zero mean and zero precision everywhere
    pub fn zeros(num_nodes: usize) -> Self {
        GaussianMessages {
            mean: Array2::zeros((num_nodes, num_nodes)),
            precision: Array2::zeros((num_nodes, num_nodes)),
        }
    }

    pub fn get(&self, sender: usize, receiver: usize) -> (f64, f64) {
        (
            self.mean[[sender, receiver]],
            self.precision[[sender, receiver]],
        )
    }

    pub fn set(&mut self, sender: usize, receiver: usize, message: (f64, f64)) {
        self.mean[[sender, receiver]] = message.0;
        self.precision[[sender, receiver]] = message.1;
    }
}
