// Bracket shape without a bracket tree.
// Seeds inside a region are grouped at three granularities: the round-of-64
// pair, the 4-seed pod that meets in the Sweet Sixteen and the 8-seed half
// that meets in the Elite Eight. Two seeds sharing a group at some level meet
// before that level's round, so at most one of them may advance past it.
// Every region is assumed to use the same standard draw below.
// Regions themselves pair up into two halves that only meet in the Final Four.

use serde::Serialize;
use std::fmt;

use crate::error::{ConfigError, UnmappedSeed};

/// Round-of-64 matchups in bracket order.
pub const ROUND64_PAIRS: [[u8; 2]; 8] = [
    [1, 16],
    [8, 9],
    [5, 12],
    [4, 13],
    [6, 11],
    [3, 14],
    [7, 10],
    [2, 15],
];

/// Groups of four that meet in the Sweet Sixteen.
pub const PODS: [[u8; 4]; 4] = [
    [1, 16, 8, 9],
    [5, 12, 4, 13],
    [6, 11, 3, 14],
    [7, 10, 2, 15],
];

/// Groups of eight that meet in the Elite Eight.
pub const HALVES: [[u8; 8]; 2] = [[1, 16, 8, 9, 5, 12, 4, 13], [6, 11, 3, 14, 7, 10, 2, 15]];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub enum Granularity {
    Round64Pair,
    Pod4,
    Half8,
}

impl Granularity {
    pub const ALL: [Granularity; 3] = [Granularity::Round64Pair, Granularity::Pod4, Granularity::Half8];

    /// Number of distinct groups a region splits into at this level
    pub fn groups(self) -> usize {
        match self {
            Granularity::Round64Pair => ROUND64_PAIRS.len(),
            Granularity::Pod4 => PODS.len(),
            Granularity::Half8 => HALVES.len(),
        }
    }
}

impl fmt::Display for Granularity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Granularity::Round64Pair => "Round64Pair",
            Granularity::Pod4 => "Pod4",
            Granularity::Half8 => "Half8",
        };
        f.write_str(name)
    }
}

/// A seed's group at one granularity, e.g. Pod4 #2.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SeedSlot {
    pub granularity: Granularity,
    pub index: u8,
}

impl fmt::Display for SeedSlot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} #{}", self.granularity, self.index)
    }
}

fn group_of<const N: usize>(groups: &[[u8; N]], seed: u8) -> Option<u8> {
    groups
        .iter()
        .position(|group| group.contains(&seed))
        .map(|i| i as u8)
}

/// Look up which group `seed` falls in at `granularity`.
pub fn slot(seed: u8, granularity: Granularity) -> Result<SeedSlot, UnmappedSeed> {
    let index = match granularity {
        Granularity::Round64Pair => group_of(&ROUND64_PAIRS, seed),
        Granularity::Pod4 => group_of(&PODS, seed),
        Granularity::Half8 => group_of(&HALVES, seed),
    };
    index
        .map(|index| SeedSlot { granularity, index })
        .ok_or(UnmappedSeed(seed))
}

/// The two fixed pairs of regions whose winners meet in the national semifinals.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegionHalves {
    halves: [[String; 2]; 2],
}

impl RegionHalves {
    /// Requires four distinct, non-empty region labels.
    pub fn new(halves: [[String; 2]; 2]) -> Result<Self, ConfigError> {
        let labels: Vec<&str> = halves.iter().flatten().map(|s| s.as_str()).collect();
        if labels.iter().any(|l| l.trim().is_empty()) {
            return Err(ConfigError::Invalid("region labels must not be empty".to_string()));
        }
        for (i, label) in labels.iter().enumerate() {
            if labels[..i].contains(label) {
                return Err(ConfigError::Invalid(format!(
                    "region '{}' appears in more than one slot",
                    label
                )));
            }
        }
        Ok(RegionHalves { halves })
    }

    pub fn contains(&self, region: &str) -> bool {
        self.half_of(region).is_some()
    }

    /// Which half (0 or 1) a region belongs to
    pub fn half_of(&self, region: &str) -> Option<usize> {
        self.halves
            .iter()
            .position(|half| half.iter().any(|r| r == region))
    }

    pub fn are_opposed(&self, a: &str, b: &str) -> bool {
        matches!((self.half_of(a), self.half_of(b)), (Some(x), Some(y)) if x != y)
    }
}

impl Default for RegionHalves {
    fn default() -> Self {
        RegionHalves {
            halves: [
                ["South".to_string(), "East".to_string()],
                ["Midwest".to_string(), "West".to_string()],
            ],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_every_seed_has_one_slot_per_level() {
        for seed in 1..=16u8 {
            for granularity in Granularity::ALL {
                let s = slot(seed, granularity).unwrap();
                assert!((s.index as usize) < granularity.groups());
            }
        }
    }

    #[test]
    fn test_levels_coarsen_each_other() {
        // Seeds sharing a pair share a pod; seeds sharing a pod share a half.
        for a in 1..=16u8 {
            for b in 1..=16u8 {
                let group = |seed, g| slot(seed, g).unwrap().index;
                if group(a, Granularity::Round64Pair) == group(b, Granularity::Round64Pair) {
                    assert_eq!(
                        group(a, Granularity::Pod4),
                        group(b, Granularity::Pod4),
                        "seeds {} and {}",
                        a,
                        b
                    );
                }
                if group(a, Granularity::Pod4) == group(b, Granularity::Pod4) {
                    assert_eq!(
                        group(a, Granularity::Half8),
                        group(b, Granularity::Half8),
                        "seeds {} and {}",
                        a,
                        b
                    );
                }
            }
        }
    }

    #[test]
    fn test_standard_draw() {
        assert_eq!(slot(1, Granularity::Round64Pair), slot(16, Granularity::Round64Pair));
        assert_ne!(slot(1, Granularity::Round64Pair), slot(8, Granularity::Round64Pair));
        assert_eq!(slot(1, Granularity::Pod4), slot(9, Granularity::Pod4));
        assert_eq!(slot(4, Granularity::Pod4), slot(12, Granularity::Pod4));
        assert_ne!(slot(4, Granularity::Pod4), slot(3, Granularity::Pod4));
        assert_eq!(slot(2, Granularity::Half8), slot(6, Granularity::Half8));
        assert_ne!(slot(1, Granularity::Half8), slot(2, Granularity::Half8));
        // Group sizes
        for granularity in Granularity::ALL {
            for index in 0..granularity.groups() as u8 {
                let members = (1..=16u8)
                    .filter(|&s| slot(s, granularity).unwrap().index == index)
                    .count();
                assert_eq!(members, 16 / granularity.groups());
            }
        }
    }

    #[test]
    fn test_lookup_is_stable() {
        for seed in 1..=16u8 {
            for granularity in Granularity::ALL {
                let first = slot(seed, granularity).unwrap();
                for _ in 0..10 {
                    assert_eq!(slot(seed, granularity).unwrap(), first);
                }
            }
        }
    }

    #[test]
    fn test_unmapped_seed() {
        assert_eq!(slot(0, Granularity::Pod4), Err(UnmappedSeed(0)));
        assert_eq!(slot(17, Granularity::Half8), Err(UnmappedSeed(17)));
        assert_eq!(slot(17, Granularity::Round64Pair), Err(UnmappedSeed(17)));
    }

    #[test]
    fn test_region_halves() {
        let halves = RegionHalves::default();
        assert_eq!(halves.half_of("South"), Some(0));
        assert_eq!(halves.half_of("West"), Some(1));
        assert_eq!(halves.half_of("North"), None);
        assert!(halves.are_opposed("East", "Midwest"));
        assert!(!halves.are_opposed("East", "South"));
        assert!(!halves.are_opposed("East", "North"));
        assert!(halves.contains("Midwest"));
        assert!(!halves.contains("North"));
    }

    #[test]
    fn test_region_halves_rejects_duplicates() {
        let halves = [
            ["A".to_string(), "B".to_string()],
            ["C".to_string(), "A".to_string()],
        ];
        assert!(RegionHalves::new(halves).is_err());
        let empty = [
            ["A".to_string(), " ".to_string()],
            ["C".to_string(), "D".to_string()],
        ];
        assert!(RegionHalves::new(empty).is_err());
    }
}
