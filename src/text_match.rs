use std::sync::LazyLock;

use regex::Regex;

static HEADING_PREFIX_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[0-9]+(?:\.[0-9]+)*\s+").expect("hardcoded heading prefix regex is valid")
});

/// Lowercases and collapses every whitespace run to a single space.
#[must_use]
pub fn fold_whitespace(text: &str) -> String {
    text.split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
}

/// Lookup form of a topic title: `"2.3 Data Collection"` becomes `"data collection"`.
#[must_use]
pub fn normalize_key(title: &str) -> String {
    let trimmed = title.trim();
    let stripped = HEADING_PREFIX_RE.replace(trimmed, "");
    fold_whitespace(&stripped)
}

/// Similarity of two strings in `[0, 1]`: twice the number of matched
/// characters over the total length of both.
///
/// Matches are found Ratcliff/Obershelp style: take the longest common run,
/// then recurse on the pieces to its left and right. Two empty strings are
/// identical.
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn similarity_ratio(left: &str, right: &str) -> f64 {
    let left = left.chars().collect::<Vec<_>>();
    let right = right.chars().collect::<Vec<_>>();
    let total = left.len() + right.len();
    if total == 0 {
        return 1.0;
    }

    let matched = matched_characters(&left, &right);
    2.0 * matched as f64 / total as f64
}

#[derive(Debug, Clone, Copy)]
struct Window {
    left_lo: usize,
    left_hi: usize,
    right_lo: usize,
    right_hi: usize,
}

fn matched_characters(left: &[char], right: &[char]) -> usize {
    let mut matched = 0;
    let mut pending = vec![Window {
        left_lo: 0,
        left_hi: left.len(),
        right_lo: 0,
        right_hi: right.len(),
    }];

    while let Some(window) = pending.pop() {
        let (i, j, size) = longest_common_run(left, right, window);
        if size == 0 {
            continue;
        }
        matched += size;
        if window.left_lo < i && window.right_lo < j {
            pending.push(Window {
                left_lo: window.left_lo,
                left_hi: i,
                right_lo: window.right_lo,
                right_hi: j,
            });
        }
        if i + size < window.left_hi && j + size < window.right_hi {
            pending.push(Window {
                left_lo: i + size,
                left_hi: window.left_hi,
                right_lo: j + size,
                right_hi: window.right_hi,
            });
        }
    }

    matched
}

/// Longest run of equal characters inside `window`, as `(left_start, right_start, len)`.
/// Ties go to the run that starts earliest in `left`, then in `right`.
fn longest_common_run(left: &[char], right: &[char], window: Window) -> (usize, usize, usize) {
    let width = window.right_hi - window.right_lo;
    let mut best = (window.left_lo, window.right_lo, 0);
    let mut previous = vec![0_usize; width + 1];
    let mut current = vec![0_usize; width + 1];

    for i in window.left_lo..window.left_hi {
        for offset in 0..width {
            let j = window.right_lo + offset;
            current[offset + 1] = if left[i] == right[j] {
                let run = previous[offset] + 1;
                if run > best.2 {
                    best = (i + 1 - run, j + 1 - run, run);
                }
                run
            } else {
                0
            };
        }
        std::mem::swap(&mut previous, &mut current);
    }

    best
}

/// Highest-scoring candidate at or above `cutoff`; the greatest key wins ties.
pub fn best_match<'a, I>(query: &str, candidates: I, cutoff: f64) -> Option<(&'a str, f64)>
where
    I: IntoIterator<Item = &'a str>,
{
    closest_candidate(query, candidates).filter(|(_, score)| *score >= cutoff)
}

/// Highest-scoring candidate regardless of any cutoff.
///
/// Candidates are ranked by `(score, key)`, so equal scores go to the
/// lexicographically greatest key.
pub fn closest_candidate<'a, I>(query: &str, candidates: I) -> Option<(&'a str, f64)>
where
    I: IntoIterator<Item = &'a str>,
{
    let mut best: Option<(&str, f64)> = None;
    for candidate in candidates {
        let score = similarity_ratio(query, candidate);
        let better = best.is_none_or(|(best_key, best_score)| {
            score
                .total_cmp(&best_score)
                .then_with(|| candidate.cmp(best_key))
                .is_gt()
        });
        if better {
            best = Some((candidate, score));
        }
    }
    best
}
