use std::{fmt::Display, ops::Index};

// Observed values indexed by node id, `None` = node is not clamped
#[derive(Debug, Clone, PartialEq)]
pub struct Evidence<T> {
    observed: Vec<Option<T>>,
}

impl<T: Clone> Evidence<T> {
    // Creates evidence with every node unclamped
    pub fn new(num_nodes: usize) -> Self {
        Evidence {
            observed: vec![None; num_nodes],
        }
    }
}

impl<T> Evidence<T> {
    pub fn set(&mut self, node: usize, value: T) {
        self.observed[node] = Some(value);
    }

    pub fn get(&self, node: usize) -> Option<&T> {
        self.observed[node].as_ref()
    }

    pub fn is_clamped(&self, node: usize) -> bool {
        self.observed[node].is_some()
    }

    // Returns the number of clamped nodes
    pub fn num_clamped(&self) -> usize {
        self.observed.iter().filter(|value| value.is_some()).count()
    }

    // Returns an iterator over (node, observed value) pairs
    pub fn iter(&self) -> impl Iterator<Item = (usize, &T)> {
        self.observed
            .iter()
            .enumerate()
            .filter_map(|(node, value)| value.as_ref().map(|value| (node, value)))
    }
}

impl<T> Index<usize> for Evidence<T> {
    type Output = Option<T>;

    fn index(&self, index: usize) -> &Self::Output {
        &self.observed[index]
    }
}

impl<T: Display> Display for Evidence<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{:?}",
            self.iter()
                .map(|(node, value)| format!("{}={}", node, value))
                .collect::<Vec<_>>()
        )
    }
}
