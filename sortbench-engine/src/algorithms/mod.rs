//! The in-process algorithm registry. Per spec.md §1, per-algorithm
//! internals (quicksort pivot strategies, radix passes, etc.) are out of
//! scope beyond the abstract contract "sorts an array of a given element
//! type stably or unstably, in place" — so these are straightforward
//! textbook implementations, not tuned production sorts.

use std::cmp::Ordering;

fn cmp<T: PartialOrd>(a: &T, b: &T) -> Ordering {
    a.partial_cmp(b).unwrap_or(Ordering::Equal)
}

pub fn std_sort<T: PartialOrd + Clone>(data: &mut [T]) {
    data.sort_by(cmp);
}

pub fn std_sort_unstable<T: PartialOrd>(data: &mut [T]) {
    data.sort_unstable_by(cmp);
}

pub fn insertion_sort<T: PartialOrd>(data: &mut [T]) {
    for i in 1..data.len() {
        let mut j = i;
        while j > 0 && cmp(&data[j - 1], &data[j]) == Ordering::Greater {
            data.swap(j - 1, j);
            j -= 1;
        }
    }
}

pub fn bubble_sort<T: PartialOrd>(data: &mut [T]) {
    let n = data.len();
    for i in 0..n {
        let mut swapped = false;
        for j in 0..n.saturating_sub(i + 1) {
            if cmp(&data[j], &data[j + 1]) == Ordering::Greater {
                data.swap(j, j + 1);
                swapped = true;
            }
        }
        if !swapped {
            break;
        }
    }
}

pub fn heap_sort<T: PartialOrd>(data: &mut [T]) {
    let n = data.len();
    if n < 2 {
        return;
    }
    for start in (0..n / 2).rev() {
        sift_down(data, start, n);
    }
    for end in (1..n).rev() {
        data.swap(0, end);
        sift_down(data, 0, end);
    }
}

fn sift_down<T: PartialOrd>(data: &mut [T], mut root: usize, end: usize) {
    loop {
        let mut child = 2 * root + 1;
        if child >= end {
            break;
        }
        if child + 1 < end && cmp(&data[child], &data[child + 1]) == Ordering::Less {
            child += 1;
        }
        if cmp(&data[root], &data[child]) == Ordering::Less {
            data.swap(root, child);
            root = child;
        } else {
            break;
        }
    }
}

pub fn quick_sort<T: PartialOrd>(data: &mut [T]) {
    let len = data.len();
    if len < 2 {
        return;
    }
    quick_sort_range(data, 0, len - 1);
}

fn quick_sort_range<T: PartialOrd>(data: &mut [T], lo: usize, hi: usize) {
    if lo >= hi {
        return;
    }
    let pivot = partition(data, lo, hi);
    if pivot > lo {
        quick_sort_range(data, lo, pivot - 1);
    }
    quick_sort_range(data, pivot + 1, hi);
}

fn partition<T: PartialOrd>(data: &mut [T], lo: usize, hi: usize) -> usize {
    let mid = lo + (hi - lo) / 2;
    data.swap(mid, hi);
    let mut store = lo;
    for i in lo..hi {
        if cmp(&data[i], &data[hi]) == Ordering::Less {
            data.swap(i, store);
            store += 1;
        }
    }
    data.swap(store, hi);
    store
}

/// The algorithm names built into the engine, independent of element type.
/// `std_sort` is stable (`slice::sort_by`); the rest are unstable or simply
/// not guaranteed stable by this implementation.
pub const BUILTIN_ALGORITHMS: &[(&str, bool)] = &[
    ("std_sort", true),
    ("std_sort_unstable", false),
    ("insertion_sort", true),
    ("bubble_sort", true),
    ("heap_sort", false),
    ("quick_sort", false),
];

/// Runs the named built-in algorithm in place. Returns `false` if `name`
/// isn't a built-in (the caller — per spec.md §4.1 — treats an unknown name
/// as "produce no row" rather than an error, unless strict mode is set).
pub fn run_builtin<T: PartialOrd + Clone>(name: &str, data: &mut [T]) -> bool {
    match name {
        "std_sort" => std_sort(data),
        "std_sort_unstable" => std_sort_unstable(data),
        "insertion_sort" => insertion_sort(data),
        "bubble_sort" => bubble_sort(data),
        "heap_sort" => heap_sort(data),
        "quick_sort" => quick_sort(data),
        _ => return false,
    }
    true
}

#[cfg(test)]
mod tests {
    use super::*;

    fn check<F: Fn(&mut [i32])>(f: F) {
        let mut v = vec![5, 3, 8, 1, 9, 2, 7, 4, 6, 0];
        let mut expected = v.clone();
        expected.sort();
        f(&mut v);
        assert_eq!(v, expected);
    }

    #[test]
    fn std_sort_sorts() {
        check(std_sort);
    }

    #[test]
    fn insertion_sort_sorts() {
        check(insertion_sort);
    }

    #[test]
    fn bubble_sort_sorts() {
        check(bubble_sort);
    }

    #[test]
    fn heap_sort_sorts() {
        check(heap_sort);
    }

    #[test]
    fn quick_sort_sorts() {
        check(quick_sort);
    }

    #[test]
    fn handles_empty_and_singleton() {
        let mut empty: Vec<i32> = vec![];
        quick_sort(&mut empty);
        assert!(empty.is_empty());

        let mut one = vec![42];
        heap_sort(&mut one);
        assert_eq!(one, vec![42]);
    }

    #[test]
    fn sorts_strings() {
        let mut v = vec!["banana".to_string(), "apple".to_string(), "cherry".to_string()];
        std_sort(&mut v);
        assert_eq!(v, vec!["apple", "banana", "cherry"]);
    }
}
