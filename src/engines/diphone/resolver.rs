//! Diphone lookup with substitution.
//!
//! A requested pair is looked up in order: exact, with the left phoneme
//! replaced by a perceptually close one, with the right one replaced, with
//! both replaced. When none of these transitions was recorded, the left
//! half of some recording of the first phoneme is stitched to the right
//! half of some recording of the second one.

use super::inventory::{DiphoneInventory, DiphoneKey, DiphoneRecord};
use super::model::DiphoneError;

/// Phonemes close enough to stand in for each other.
static REPLACEMENTS: &[(&str, &str)] = &[("E", "e"), ("e", "E"), ("w", "o")];

pub fn replacement(label: &str) -> Option<&'static str> {
    REPLACEMENTS
        .iter()
        .find(|(from, _)| *from == label)
        .map(|(_, to)| *to)
}

/// Outcome of a diphone lookup.
#[derive(Debug, Clone, PartialEq)]
pub enum Resolution {
    /// The requested transition was recorded.
    Exact(DiphoneRecord),
    /// A transition with one or both phonemes substituted was recorded.
    Replaced { key: DiphoneKey, record: DiphoneRecord },
    /// Two unrelated phoneme halves; must be spliced, not cut in one piece.
    Disjoint(DiphoneRecord),
    NotFound,
}

impl Resolution {
    pub fn record(&self) -> Option<&DiphoneRecord> {
        match self {
            Resolution::Exact(record)
            | Resolution::Replaced { record, .. }
            | Resolution::Disjoint(record) => Some(record),
            Resolution::NotFound => None,
        }
    }
}

pub fn lookup(inventory: &DiphoneInventory, left: &str, right: &str) -> Resolution {
    if let Some(record) = inventory.get(left, right) {
        return Resolution::Exact(*record);
    }

    let left_rep = replacement(left);
    let right_rep = replacement(right);
    let candidates = [
        left_rep.map(|l| (l, right)),
        right_rep.map(|r| (left, r)),
        left_rep.zip(right_rep),
    ];
    for (l, r) in candidates.into_iter().flatten() {
        if let Some(record) = inventory.get(l, r) {
            return Resolution::Replaced {
                key: DiphoneKey::new(l, r),
                record: *record,
            };
        }
    }

    match disjoint(inventory, left, right) {
        Some(record) => Resolution::Disjoint(record),
        None => Resolution::NotFound,
    }
}

/// Stitch the first recorded left half of `left` to the first recorded
/// right half of `right`, in key order.
pub fn disjoint(inventory: &DiphoneInventory, left: &str, right: &str) -> Option<DiphoneRecord> {
    let mut head = None;
    let mut tail = None;
    for (key, record) in inventory.iter() {
        if head.is_none() && key.left == left {
            head = Some((record.seg_start, record.boundary_left));
        }
        if tail.is_none() && key.right == right {
            tail = Some((record.boundary_right, record.seg_end));
        }
        if head.is_some() && tail.is_some() {
            break;
        }
    }

    let ((seg_start, boundary_left), (boundary_right, seg_end)) = (head?, tail?);
    Some(DiphoneRecord {
        seg_start,
        boundary_left,
        boundary_right,
        seg_end,
    })
}

/// The best available record for a pair.
pub fn resolve(
    inventory: &DiphoneInventory,
    left: &str,
    right: &str,
) -> Result<DiphoneRecord, DiphoneError> {
    lookup(inventory, left, right)
        .record()
        .copied()
        .ok_or_else(|| DiphoneError::DiphoneResolution {
            left: left.to_string(),
            right: right.to_string(),
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(a: f64, b: f64, c: f64, d: f64) -> DiphoneRecord {
        DiphoneRecord {
            seg_start: a,
            boundary_left: b,
            boundary_right: c,
            seg_end: d,
        }
    }

    fn inventory(entries: &[(&str, &str, DiphoneRecord)]) -> DiphoneInventory {
        DiphoneInventory::from_records(
            entries
                .iter()
                .map(|(l, r, rec)| (DiphoneKey::new(*l, *r), *rec)),
        )
    }

    #[test]
    fn exact_match_wins_over_replacement() {
        let exact = record(0.0, 0.1, 0.1, 0.2);
        let substitute = record(1.0, 1.1, 1.1, 1.2);
        let inv = inventory(&[("E", "b", exact), ("e", "b", substitute)]);
        assert_eq!(lookup(&inv, "E", "b"), Resolution::Exact(exact));
        assert_eq!(resolve(&inv, "E", "b").unwrap(), exact);
    }

    #[test]
    fn replacement_order() {
        let left = record(0.0, 0.1, 0.1, 0.2);
        let right = record(1.0, 1.1, 1.1, 1.2);
        let both = record(2.0, 2.1, 2.1, 2.2);
        let inv = inventory(&[("e", "w", left), ("E", "o", right), ("e", "o", both)]);

        // (rep(E), w) = (e, w) comes first
        assert_eq!(
            lookup(&inv, "E", "w"),
            Resolution::Replaced {
                key: DiphoneKey::new("e", "w"),
                record: left
            }
        );

        let inv = inventory(&[("E", "o", right), ("e", "o", both)]);
        assert_eq!(lookup(&inv, "E", "w").record(), Some(&right));

        let inv = inventory(&[("e", "o", both)]);
        assert_eq!(lookup(&inv, "E", "w").record(), Some(&both));
    }

    #[test]
    fn missing_replacement_yields_no_candidate() {
        let inv = inventory(&[("a", "b", record(0.0, 0.1, 0.1, 0.2))]);
        assert_eq!(replacement("a"), None);
        assert_eq!(lookup(&inv, "x", "y"), Resolution::NotFound);
    }

    #[test]
    fn disjoint_only_after_direct_lookups() {
        let pa = record(0.0, 0.1, 0.1, 0.2);
        let ta = record(0.5, 0.6, 0.6, 0.75);
        let bo = record(1.0, 1.1, 1.1, 1.3);
        let inv = inventory(&[("p", "a", pa), ("t", "a", ta), ("b", "o", bo)]);

        match lookup(&inv, "p", "o") {
            Resolution::Disjoint(rec) => {
                assert_eq!(rec, record(0.0, 0.1, 1.1, 1.3));
                assert!(!rec.is_joined());
            }
            other => panic!("expected a disjoint record, got {other:?}"),
        }

        // Present pairs never reach the disjoint scan.
        assert_eq!(lookup(&inv, "t", "a"), Resolution::Exact(ta));
    }

    #[test]
    fn disjoint_uses_key_order() {
        let inv = inventory(&[
            ("a", "z", record(3.0, 3.1, 3.1, 3.2)),
            ("a", "m", record(2.0, 2.1, 2.1, 2.2)),
            ("k", "o", record(5.0, 5.1, 5.1, 5.2)),
            ("c", "o", record(4.0, 4.1, 4.1, 4.2)),
        ]);
        let rec = disjoint(&inv, "a", "o").unwrap();
        assert_eq!(rec, record(2.0, 2.1, 4.1, 4.2));
    }

    #[test]
    fn resolution_fails_without_halves() {
        let inv = inventory(&[("p", "a", record(0.0, 0.1, 0.1, 0.2))]);
        // left half exists, right half does not
        assert!(matches!(
            resolve(&inv, "p", "u"),
            Err(DiphoneError::DiphoneResolution { left, right }) if left == "p" && right == "u"
        ));
        assert_eq!(lookup(&inv, "u", "a"), Resolution::NotFound);
    }
}
