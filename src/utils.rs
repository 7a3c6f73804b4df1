use std::cmp::Ordering;

use rand::{self, Rng};

/// three-way partition around `data[pivot_index]`.
///
/// returns `(lt, gt)`: `data[..lt] < pivot`, `data[lt..gt] == pivot`, `data[gt..] > pivot`
fn partition(data: &mut [f64], pivot_index: usize) -> (usize, usize) {
    let pivot = data[pivot_index];

    let mut lt = 0;
    let mut cursor = 0;
    let mut gt = data.len();
    while cursor < gt {
        match data[cursor].total_cmp(&pivot) {
            Ordering::Less => {
                data.swap(cursor, lt);
                lt += 1;
                cursor += 1;
            }
            Ordering::Greater => {
                gt -= 1;
                data.swap(cursor, gt);
            }
            Ordering::Equal => cursor += 1,
        }
    }

    (lt, gt)
}

/// value that would sit at index `n` if `data` were sorted ascending.
///
/// `data` is reordered in place. random pivots keep sorted and reversed inputs linear,
/// the equal band keeps duplicate-heavy inputs linear.
pub fn select_nth(data: &mut [f64], n: usize) -> f64 {
    assert!(
        n < data.len(),
        "select_nth: rank {} out of range for {} values",
        n,
        data.len()
    );

    // active range is data[left..right]
    let mut left = 0;
    let mut right = data.len();
    let mut rng = rand::rng();

    loop {
        if right - left == 1 {
            return data[left];
        }

        let pivot_index = rng.random_range(left..right);
        let (lt, gt) = partition(&mut data[left..right], pivot_index - left);
        let (lt, gt) = (lt + left, gt + left);

        if n < lt {
            right = lt;
        } else if n >= gt {
            left = gt;
        } else {
            return data[n];
        }
    }
}

/// median of an odd-length buffer. the buffer is consumed
pub fn select_median(data: &mut [f64]) -> f64 {
    assert!(
        data.len() % 2 == 1,
        "select_median: expected an odd number of values, got {}",
        data.len()
    );
    let mid = data.len() / 2;
    select_nth(data, mid)
}
