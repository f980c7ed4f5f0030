//! Sequence similarity between normalized titles.
//!
//! Ratcliff/Obershelp matching: find the longest common substring, then
//! recurse on the unmatched pieces to its left and right. The ratio is
//! `2 * matched / (len(a) + len(b))`, measured in characters.

/// Similarity ratio in `[0, 1]`.
///
/// Two empty strings are identical and score `1.0`.
///
/// # Examples
/// ```
/// use regcorpus::matching::similarity_ratio;
///
/// assert_eq!(similarity_ratio("abcd", "abcd"), 1.0);
/// assert_eq!(similarity_ratio("abcd", "wxyz"), 0.0);
/// assert_eq!(similarity_ratio("abcd", "abxy"), 0.5);
/// ```
#[must_use]
pub fn similarity_ratio(a: &str, b: &str) -> f64 {
    let a: Vec<char> = a.chars().collect();
    let b: Vec<char> = b.chars().collect();
    let total = a.len() + b.len();
    if total == 0 {
        return 1.0;
    }
    2.0 * matching_chars(&a, &b) as f64 / total as f64
}

/// Upper bound of [`similarity_ratio`] given only the two lengths.
///
/// Lets callers skip the quadratic computation when even a perfect
/// overlap could not reach their threshold.
#[must_use]
pub fn ratio_upper_bound(len_a: usize, len_b: usize) -> f64 {
    let total = len_a + len_b;
    if total == 0 {
        return 1.0;
    }
    2.0 * len_a.min(len_b) as f64 / total as f64
}

fn matching_chars(a: &[char], b: &[char]) -> usize {
    if a.is_empty() || b.is_empty() {
        return 0;
    }
    let (i, j, k) = longest_common_run(a, b);
    if k == 0 {
        return 0;
    }
    k + matching_chars(&a[..i], &b[..j]) + matching_chars(&a[i + k..], &b[j + k..])
}

/// Longest common substring as `(start_a, start_b, len)`.
///
/// Ties resolve to the earliest start in `a`, then the earliest in `b`.
fn longest_common_run(a: &[char], b: &[char]) -> (usize, usize, usize) {
    let mut best = (0, 0, 0);
    let mut prev = vec![0usize; b.len() + 1];
    let mut row = vec![0usize; b.len() + 1];

    for (i, ca) in a.iter().enumerate() {
        for (j, cb) in b.iter().enumerate() {
            row[j + 1] = if ca == cb { prev[j] + 1 } else { 0 };
            let k = row[j + 1];
            if k > best.2 {
                best = (i + 1 - k, j + 1 - k, k);
            }
        }
        std::mem::swap(&mut prev, &mut row);
    }

    best
}
