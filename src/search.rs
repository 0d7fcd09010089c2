//! Searching sorted coordinate arrays
use num_traits::Float;

/// The index at which `q` would be inserted to keep `array` sorted
pub fn binsearch<T: Float>(array: &[T], q: T) -> usize {
    match array.binary_search_by(|x| x.partial_cmp(&q).unwrap_or(std::cmp::Ordering::Less)) {
        Ok(i) => i,
        Err(i) => i,
    }
}

/// The index of the value in `array` closest to `target_val`.
///
/// `array` must be sorted and non-empty.
pub fn nearest<T: Float>(array: &[T], target_val: T) -> usize {
    let n = array.len() - 1;
    if target_val >= array[n] {
        return n;
    } else if target_val <= array[0] {
        return 0;
    }
    let i = binsearch(array, target_val);
    if (array[i] - target_val).abs() < (target_val - array[i - 1]).abs() {
        i
    } else {
        i - 1
    }
}

/// The index of the value closest to `target_val` within `array[lo..=hi]`
pub fn nearest_in<T: Float>(array: &[T], target_val: T, lo: usize, hi: usize) -> usize {
    lo + nearest(&array[lo..=hi], target_val)
}

/// The half-open index range of values in `array` within `[lo, hi]`
pub fn find_between<T: Float>(array: &[T], lo: T, hi: T) -> (usize, usize) {
    let start = binsearch(array, lo);
    let mut end = binsearch(array, hi);
    while end < array.len() && array[end] <= hi {
        end += 1;
    }
    (start, end.max(start))
}

#[cfg(test)]
mod test {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(0.9, 0)]
    #[case(1.4, 0)]
    #[case(1.6, 1)]
    #[case(2.0, 1)]
    #[case(3.7, 3)]
    #[case(10.0, 3)]
    fn test_nearest(#[case] q: f64, #[case] expected: usize) {
        let xs = [1.0, 2.0, 3.0, 4.0];
        assert_eq!(nearest(&xs, q), expected);
    }

    #[test]
    fn test_nearest_in() {
        let xs = [1.0, 2.0, 3.0, 4.0, 5.0];
        assert_eq!(nearest_in(&xs, 1.0, 2, 4), 2);
        assert_eq!(nearest_in(&xs, 4.2, 1, 3), 3);
    }

    #[test]
    fn test_find_between() {
        let xs = [1.0, 2.0, 3.0, 4.0, 5.0];
        assert_eq!(find_between(&xs, 2.0, 4.0), (1, 4));
        assert_eq!(find_between(&xs, 2.5, 3.5), (2, 3));
        assert_eq!(find_between(&xs, 6.0, 7.0), (5, 5));
    }
}
