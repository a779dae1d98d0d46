use crate::error::{PathError, PathResult};
use crate::path::{Path, SEGMENT_LIMIT};

/// Midpoint strictly between `lo` and `hi`, if one exists
pub(crate) fn midpoint(lo: u64, hi: u64) -> Option<u64> {
    if hi > lo && hi - lo >= 2 {
        Some(lo + (hi - lo) / 2)
    } else {
        None
    }
}

/// Allocate a path that sorts strictly between `left` and `right`.
///
/// The inputs are expected to be adjacent in document order (nothing
/// allocated sorts between them); under that precondition the result
/// collides with no existing path, and every path outside `(left, right)`
/// keeps its order relative to the result.
///
/// - Siblings: the numeric gap of the last segment is halved.
/// - `left` an ancestor of `right`: the result is a child of `left` placed
///   before `right`'s branch.
/// - Collapsed gap at the divergence segment: the search recurses along
///   `left`'s deeper segments, placing the result after them.
///
/// Returns `GapExhausted` when nothing fits; callers rebalance.
pub fn between(left: &Path, right: &Path) -> PathResult<Path> {
    if left >= right {
        return Err(PathError::Unordered {
            left: left.clone(),
            right: right.clone(),
        });
    }

    let lo = left.segments();
    let hi = right.segments();
    let shared = lo.iter().zip(hi).take_while(|(a, b)| a == b).count();

    if shared == lo.len() {
        // left is an ancestor of right; anything below left's first slot before
        // right's branch works.
        let upper = hi[shared];
        if upper >= 1 {
            return left.with_segment(upper / 2);
        }
        return Err(exhausted(left, right));
    }

    if let Some(mid) = midpoint(lo[shared], hi[shared]) {
        return Path::from_segments(prefix_with(&lo[..shared], mid));
    }

    for depth in shared + 1..lo.len() {
        if let Some(mid) = midpoint(lo[depth], SEGMENT_LIMIT) {
            return Path::from_segments(prefix_with(&lo[..depth], mid));
        }
    }

    Err(exhausted(left, right))
}

fn prefix_with(prefix: &[u64], last: u64) -> Vec<u64> {
    let mut segments = Vec::with_capacity(prefix.len() + 1);
    segments.extend_from_slice(prefix);
    segments.push(last);
    segments
}

fn exhausted(left: &Path, right: &Path) -> PathError {
    PathError::GapExhausted {
        left: left.clone(),
        right: right.clone(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn p(s: &str) -> Path {
        s.parse().unwrap()
    }

    #[test]
    fn test_between_siblings_halves_gap() {
        let a = Path::root().child(0).unwrap();
        let b = Path::root().child(1).unwrap();
        let mid = between(&a, &b).unwrap();

        assert!(a < mid && mid < b);
        assert_eq!(mid.depth(), 1);
        assert_eq!(mid.last_segment(), Some(0x1800_0000));
    }

    #[test]
    fn test_between_ancestor_and_first_child() {
        let parent = p("10");
        let first = p("10.20");
        let placed = between(&parent, &first).unwrap();

        assert_eq!(placed, p("10.10"));
        assert!(parent < placed && placed < first);
    }

    #[test]
    fn test_between_recurses_into_left_subtree() {
        let left = p("10.5");
        let right = p("11");
        let placed = between(&left, &right).unwrap();

        assert!(left < placed && placed < right);
        assert_eq!(placed.depth(), 2);
    }

    #[test]
    fn test_between_reports_exhaustion() {
        assert!(matches!(
            between(&p("10"), &p("11")),
            Err(PathError::GapExhausted { .. })
        ));
        assert!(matches!(
            between(&p("10"), &p("10.0")),
            Err(PathError::GapExhausted { .. })
        ));
    }

    #[test]
    fn test_between_rejects_unordered_input() {
        assert!(matches!(
            between(&p("20"), &p("10")),
            Err(PathError::Unordered { .. })
        ));
        assert!(matches!(
            between(&p("10"), &p("10")),
            Err(PathError::Unordered { .. })
        ));
    }

    #[test]
    fn test_repeated_insertion_keeps_order() {
        let low = Path::root().child(0).unwrap();
        let mut high = Path::root().child(1).unwrap();

        // Keep inserting just above `low`; the gap halves each time.
        for _ in 0..20 {
            let next = between(&low, &high).unwrap();
            assert!(low < next && next < high);
            assert!(low.to_string() < next.to_string());
            assert!(next.to_string() < high.to_string());
            high = next;
        }
    }
}
