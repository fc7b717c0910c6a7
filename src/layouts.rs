use crate::matrix::DistanceMatrix;
use serde::{Deserialize, Serialize};
use strum_macros::{Display, EnumIter, EnumString};

/// Tile group sizes of the 26-slot pad: one six-tile group followed by four
/// five-tile groups.
pub const TILE_GROUPS: [usize; 5] = [6, 5, 5, 5, 5];

pub const SAME_GROUP_COST: f64 = 1.0;
pub const CROSS_GROUP_COST: f64 = 2.0;

#[derive(
    Debug, Clone, Copy, EnumIter, EnumString, Display, PartialEq, Eq, Hash, Serialize, Deserialize,
)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum KnownLayout {
    /// 26 tiles in groups of 6/5/5/5/5. Moving within a group costs 1,
    /// switching group costs 2.
    TileGroups,
    /// Slots on a line, cost `|i - j|`. Works for any size.
    Line,
}

impl KnownLayout {
    /// Native slot count, `None` when the layout scales to any size.
    pub fn slot_count(&self) -> Option<usize> {
        match self {
            Self::TileGroups => Some(TILE_GROUPS.iter().sum()),
            Self::Line => None,
        }
    }

    pub fn distance_matrix(&self, n: usize) -> DistanceMatrix {
        match self {
            Self::TileGroups => tile_group_distances(&TILE_GROUPS),
            Self::Line => DistanceMatrix::from_fn(n, |i, j| i.abs_diff(j) as f64),
        }
    }

    /// Ranges of slot indices forming the visual groups used by reports.
    pub fn groups(&self, n: usize) -> Vec<std::ops::Range<usize>> {
        match self {
            Self::TileGroups => group_ranges(&TILE_GROUPS),
            Self::Line => vec![0..n],
        }
    }
}

pub fn group_ranges(sizes: &[usize]) -> Vec<std::ops::Range<usize>> {
    let mut start = 0;
    sizes
        .iter()
        .map(|&len| {
            let r = start..start + len;
            start += len;
            r
        })
        .collect()
}

/// Block distance matrix: `SAME_GROUP_COST` inside a group (diagonal
/// included), `CROSS_GROUP_COST` everywhere else.
pub fn tile_group_distances(sizes: &[usize]) -> DistanceMatrix {
    let n: usize = sizes.iter().sum();
    let mut group_of = Vec::with_capacity(n);
    for (g, &len) in sizes.iter().enumerate() {
        group_of.extend(std::iter::repeat(g).take(len));
    }

    DistanceMatrix::from_fn(n, |i, j| {
        if group_of[i] == group_of[j] {
            SAME_GROUP_COST
        } else {
            CROSS_GROUP_COST
        }
    })
}
