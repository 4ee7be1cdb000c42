use std::collections::BTreeMap;
use std::fmt;

use serde::Serialize;

use crate::textgrid::Interval;

/// An ordered phoneme pair.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct DiphoneKey {
    pub left: String,
    pub right: String,
}

impl DiphoneKey {
    pub fn new(left: impl Into<String>, right: impl Into<String>) -> Self {
        Self {
            left: left.into(),
            right: right.into(),
        }
    }
}

impl fmt::Display for DiphoneKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.left, self.right)
    }
}

/// Four instants in the reference recording:
/// `seg_start <= boundary_left <= boundary_right <= seg_end`.
///
/// A record cut from two adjoining reference intervals has
/// `boundary_left == boundary_right`; a record stitched from two unrelated
/// phoneme instances does not.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct DiphoneRecord {
    pub seg_start: f64,
    pub boundary_left: f64,
    pub boundary_right: f64,
    pub seg_end: f64,
}

impl DiphoneRecord {
    pub fn is_joined(&self) -> bool {
        self.boundary_left == self.boundary_right
    }

    pub fn is_ordered(&self) -> bool {
        self.seg_start <= self.boundary_left
            && self.boundary_left <= self.boundary_right
            && self.boundary_right <= self.seg_end
    }

    /// Middle of the left phoneme.
    pub fn left_middle(&self) -> f64 {
        (self.seg_start + self.boundary_left) / 2.0
    }

    /// Middle of the right phoneme.
    pub fn right_middle(&self) -> f64 {
        (self.boundary_right + self.seg_end) / 2.0
    }
}

/// Every phoneme transition recorded in a reference voice.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DiphoneInventory {
    diphones: BTreeMap<DiphoneKey, DiphoneRecord>,
}

impl DiphoneInventory {
    /// Index each transition between two inner intervals of the
    /// segmentation. The first and last intervals are edge filler and never
    /// take part; a repeated transition keeps its last occurrence.
    pub fn build(segmentation: &[Interval]) -> Self {
        let mut diphones = BTreeMap::new();
        let inner = match segmentation.len() {
            0..=2 => &[][..],
            n => &segmentation[1..n - 1],
        };

        for pair in inner.windows(2) {
            let (first, second) = (&pair[0], &pair[1]);
            let record = DiphoneRecord {
                seg_start: first.start,
                boundary_left: first.end,
                boundary_right: first.end,
                seg_end: second.end,
            };
            if !record.is_ordered() {
                log::warn!(
                    "Skipping malformed transition {}-{} ({:.3}..{:.3}..{:.3})",
                    first.label,
                    second.label,
                    record.seg_start,
                    record.boundary_left,
                    record.seg_end
                );
                continue;
            }
            diphones.insert(DiphoneKey::new(&first.label, &second.label), record);
        }

        Self { diphones }
    }

    pub fn from_records(records: impl IntoIterator<Item = (DiphoneKey, DiphoneRecord)>) -> Self {
        Self {
            diphones: records.into_iter().collect(),
        }
    }

    pub fn get(&self, left: &str, right: &str) -> Option<&DiphoneRecord> {
        self.diphones.get(&DiphoneKey::new(left, right))
    }

    pub fn contains(&self, left: &str, right: &str) -> bool {
        self.get(left, right).is_some()
    }

    /// Records in key order.
    pub fn iter(&self) -> impl Iterator<Item = (&DiphoneKey, &DiphoneRecord)> {
        self.diphones.iter()
    }

    pub fn len(&self) -> usize {
        self.diphones.len()
    }

    pub fn is_empty(&self) -> bool {
        self.diphones.is_empty()
    }
}
