//! Hierarchical requirement numbering.
//!
//! Requirement numbers are dotted-digit strings ("1", "1.2", "1.2.3"); the
//! empty string is a valid "unassigned" state that always sorts last. The
//! string is the persisted and user-editable form; [`segments`] is the
//! decoded form used for structural operations.
//!
//! Every function here is total: malformed input degrades gracefully
//! (depth 0, sorts last, not a child) instead of erroring, so that bad
//! user input never breaks numbering-dependent views.

use std::cmp::Ordering;

/// Returns true if `s` is a well-formed requirement number.
///
/// The empty string is valid (unassigned); otherwise every dot-separated
/// segment must be non-empty and contain only ASCII digits.
pub fn is_valid(s: &str) -> bool {
    if s.is_empty() {
        return true;
    }
    s.split('.')
        .all(|seg| !seg.is_empty() && seg.bytes().all(|b| b.is_ascii_digit()))
}

/// Parses a requirement number into its integer segments.
///
/// Returns an empty vec for the empty string or invalid input.
pub fn segments(s: &str) -> Vec<u64> {
    if s.is_empty() || !is_valid(s) {
        return Vec::new();
    }
    s.split('.')
        .map(|seg| seg.parse().unwrap_or(0))
        .collect()
}

/// Nesting depth: number of dots. The empty string and malformed input
/// both have depth 0.
pub fn depth(s: &str) -> usize {
    if !is_valid(s) {
        return 0;
    }
    s.matches('.').count()
}

/// Natural numeric comparison, segment by segment.
///
/// Missing trailing segments compare as 0, so "1" sorts before "1.1".
/// The empty (unassigned) string sorts after any non-empty number, and
/// two empty strings are equal. This is the canonical display order.
pub fn compare(a: &str, b: &str) -> Ordering {
    match (a.is_empty(), b.is_empty()) {
        (true, true) => return Ordering::Equal,
        (true, false) => return Ordering::Greater,
        (false, true) => return Ordering::Less,
        (false, false) => {}
    }

    let left = segments(a);
    let right = segments(b);
    let len = left.len().max(right.len());
    for i in 0..len {
        let l = left.get(i).copied().unwrap_or(0);
        let r = right.get(i).copied().unwrap_or(0);
        match l.cmp(&r) {
            Ordering::Equal => continue,
            other => return other,
        }
    }
    Ordering::Equal
}

/// Suggests the next sibling number: increments the last segment.
/// An empty `prev` suggests "1".
pub fn suggest_next(prev: &str) -> String {
    let mut segs = segments(prev);
    match segs.last_mut() {
        Some(last) => {
            *last += 1;
            join(&segs)
        }
        None => "1".to_string(),
    }
}

/// Indents under `prev`, becoming its first child ("2" -> "2.1").
/// An empty `prev` has nothing to nest under and falls back to "1".
///
/// Note that indent and [`outdent`] are deliberately not inverse:
/// indent always creates a first child, outdent always advances to the
/// next sibling of the stripped parent.
pub fn indent(prev: &str) -> String {
    if prev.is_empty() {
        "1".to_string()
    } else {
        format!("{prev}.1")
    }
}

/// Outdents one level: drops the last segment and increments the new
/// last one ("1.2.1" -> "1.3"). A single-segment number cannot go any
/// shallower, so outdent at depth 0 returns the input unchanged.
pub fn outdent(current: &str) -> String {
    let mut segs = segments(current);
    if segs.len() < 2 {
        return current.to_string();
    }
    segs.pop();
    if let Some(last) = segs.last_mut() {
        *last += 1;
    }
    join(&segs)
}

/// Returns the parent number (all but the last segment), or the empty
/// string for a top-level or empty number.
pub fn parent_of(s: &str) -> String {
    match s.rfind('.') {
        Some(idx) => s[..idx].to_string(),
        None => String::new(),
    }
}

/// Returns true if `child` is a descendant of `parent` (direct or
/// transitive). A number is never a child of itself or of the empty string.
pub fn is_child_of(child: &str, parent: &str) -> bool {
    if parent.is_empty() {
        return false;
    }
    child.len() > parent.len() + 1 && child.starts_with(parent) && child.as_bytes()[parent.len()] == b'.'
}

fn join(segs: &[u64]) -> String {
    segs.iter()
        .map(|n| n.to_string())
        .collect::<Vec<_>>()
        .join(".")
}
