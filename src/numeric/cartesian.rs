// Enumerates every combination with one element taken from each array,
// the first array varies slowest (odometer order)
// An empty list of arrays yields a single empty combination
pub fn cartesian_product<T: Clone>(arrays: &[Vec<T>]) -> Vec<Vec<T>> {
    if arrays.iter().any(|array| array.is_empty()) {
        return Vec::new();
    }

    let total = arrays.iter().map(|array| array.len()).product::<usize>();
    let mut combinations = Vec::with_capacity(total);
    let mut positions = vec![0; arrays.len()];

    loop {
        combinations.push(
            positions
                .iter()
                .zip(arrays.iter())
                .map(|(&position, array)| array[position].clone())
                .collect(),
        );

        // "Advance" the last position, "carry over" into earlier ones
        let mut index = arrays.len();
        loop {
            if index == 0 {
                return combinations;
            }
            index -= 1;
            if positions[index] + 1 < arrays[index].len() {
                positions[index] += 1;
                break;
            }
            positions[index] = 0;
        }
    }
}

// All assignments of the given domains, i.e. the product of 0..domain_size ranges
pub fn assignments(domain_sizes: &[usize]) -> Vec<Vec<usize>> {
    let ranges: Vec<Vec<usize>> = domain_sizes.iter().map(|&size| (0..size).collect()).collect();
    cartesian_product(&ranges)
}
