//! # Version Ordering
//!
//! The constraint and requirement mergers never interpret version strings
//! themselves. They ask a [`VersionComparator`] to order two of them, so the
//! surrounding system can plug in whatever version scheme its packages use.
//!
//! Two comparators ship with the crate:
//!
//! - [`SegmentedVersion`] (the default): splits on `.`, `-` and `_`, compares
//!   numeric segments numerically and everything else lexicographically.
//!   Missing trailing segments count as `0`, so `12` == `12.0` == `12.0.0`.
//! - [`SemverComparator`]: strict semantic versioning via the `semver` crate,
//!   falling back to segmented ordering when either side is not valid semver.

use semver::Version;
use std::cmp::Ordering;

/// Orders two version strings.
///
/// Implementations must be a total order over the strings they are given and
/// must be pure: the mergers rely on the same pair always comparing the same
/// way to keep resolution deterministic.
pub trait VersionComparator: Send + Sync {
    fn compare(&self, a: &str, b: &str) -> Ordering;
}

/// Default comparator for dotted version strings such as `12.0`, `2.0.1`
/// or `1.26.0rc1`.
#[derive(Debug, Clone, Copy, Default)]
pub struct SegmentedVersion;

impl VersionComparator for SegmentedVersion {
    fn compare(&self, a: &str, b: &str) -> Ordering {
        compare_segmented(a, b)
    }
}

/// Comparator backed by `semver::Version` ordering.
#[derive(Debug, Clone, Copy, Default)]
pub struct SemverComparator;

impl VersionComparator for SemverComparator {
    fn compare(&self, a: &str, b: &str) -> Ordering {
        match (Version::parse(a), Version::parse(b)) {
            (Ok(left), Ok(right)) => left.cmp(&right),
            _ => compare_segmented(a, b),
        }
    }
}

fn compare_segmented(a: &str, b: &str) -> Ordering {
    let left = segments(a);
    let right = segments(b);
    let len = left.len().max(right.len());

    for index in 0..len {
        let l = left.get(index).copied().unwrap_or("0");
        let r = right.get(index).copied().unwrap_or("0");
        let ordering = match (is_numeric(l), is_numeric(r)) {
            (true, true) => compare_digits(l, r),
            // A numeric segment sorts after a textual one (1.0 > 1.0rc)
            (true, false) => Ordering::Greater,
            (false, true) => Ordering::Less,
            (false, false) => l.cmp(r),
        };
        if ordering != Ordering::Equal {
            return ordering;
        }
    }
    Ordering::Equal
}

fn is_numeric(segment: &str) -> bool {
    !segment.is_empty() && segment.bytes().all(|b| b.is_ascii_digit())
}

/// Orders two digit strings of any length by numeric value.
fn compare_digits(a: &str, b: &str) -> Ordering {
    let a = a.trim_start_matches('0');
    let b = b.trim_start_matches('0');
    a.len().cmp(&b.len()).then_with(|| a.cmp(b))
}

fn segments(version: &str) -> Vec<&str> {
    version
        .trim()
        .split(['.', '-', '_'])
        .filter(|s| !s.is_empty())
        .collect()
}

/// Computes the exclusive upper bound for a prefix match such as `1.26.*`.
///
/// The last numeric segment of the prefix is incremented: `1.26` becomes
/// `1.27`. Returns `None` when the last segment is not numeric or cannot be
/// incremented.
pub fn bump_prefix(prefix: &str) -> Option<String> {
    let mut parts: Vec<String> = prefix.split('.').map(str::to_string).collect();
    let last = parts.last_mut()?;
    let value: u64 = last.parse().ok()?;
    *last = value.checked_add(1)?.to_string();
    Some(parts.join("."))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_segmented_numeric_ordering() {
        let cmp = SegmentedVersion;
        assert_eq!(cmp.compare("1.10", "1.9"), Ordering::Greater);
        assert_eq!(cmp.compare("11.8", "12.0"), Ordering::Less);
        assert_eq!(cmp.compare("2.17", "2.17"), Ordering::Equal);
    }

    #[test]
    fn test_segmented_missing_segments_are_zero() {
        let cmp = SegmentedVersion;
        assert_eq!(cmp.compare("12", "12.0.0"), Ordering::Equal);
        assert_eq!(cmp.compare("12.0.1", "12"), Ordering::Greater);
    }

    #[test]
    fn test_segmented_prerelease_sorts_before_release() {
        let cmp = SegmentedVersion;
        assert_eq!(cmp.compare("1.0.rc1", "1.0.0"), Ordering::Less);
    }

    #[test]
    fn test_semver_comparator() {
        let cmp = SemverComparator;
        assert_eq!(cmp.compare("1.2.3", "1.10.0"), Ordering::Less);
        assert_eq!(cmp.compare("1.0.0-alpha", "1.0.0"), Ordering::Less);
    }

    #[test]
    fn test_semver_comparator_falls_back_for_partial_versions() {
        let cmp = SemverComparator;
        assert_eq!(cmp.compare("12.0", "11.8.1"), Ordering::Greater);
    }

    #[test]
    fn test_bump_prefix() {
        assert_eq!(bump_prefix("1.26"), Some("1.27".to_string()));
        assert_eq!(bump_prefix("3"), Some("4".to_string()));
        assert_eq!(bump_prefix("1.x"), None);
    }

    #[test]
    fn test_bump_prefix_at_u64_max() {
        assert_eq!(bump_prefix("18446744073709551615"), None);
        assert_eq!(
            bump_prefix("1.18446744073709551614"),
            Some("1.18446744073709551615".to_string())
        );
    }

    #[test]
    fn test_segmented_orders_segments_wider_than_u64() {
        let cmp = SegmentedVersion;
        assert_eq!(cmp.compare("99999999999999999999", "1"), Ordering::Greater);
        assert_eq!(
            cmp.compare("1.99999999999999999999", "1.100000000000000000000"),
            Ordering::Less
        );
        assert_eq!(
            cmp.compare("2.00099999999999999999999", "2.99999999999999999999"),
            Ordering::Equal
        );
        assert_eq!(cmp.compare("1.99999999999999999999", "1.0rc"), Ordering::Greater);
    }

    #[test]
    fn test_segmented_ignores_leading_zeros() {
        let cmp = SegmentedVersion;
        assert_eq!(cmp.compare("1.01", "1.1"), Ordering::Equal);
        assert_eq!(cmp.compare("1.010", "1.9"), Ordering::Greater);
    }
}
