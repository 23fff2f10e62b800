//! Memory — unit-aware sizes and before/after region snapshots.
//!
//! Sizes are held as whole bytes. Fractional inputs such as `112.5M` are
//! rounded to the nearest byte once, at parse time.

use std::fmt;

use serde::{Deserialize, Serialize};

use super::units::Decimal;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Memory {
    bytes: u64,
}

impl Memory {
    pub const ZERO: Memory = Memory { bytes: 0 };

    pub const fn from_bytes(bytes: u64) -> Self {
        Self { bytes }
    }

    pub const fn from_kilobytes(kilobytes: u64) -> Self {
        Self { bytes: kilobytes * 1024 }
    }

    /// Parse `"1234K"`, `"112.0M"`, `"0.0B"`, `"16172 K"` or `"1,5G"`.
    pub fn parse(text: &str) -> Option<Self> {
        let text = text.trim();
        let unit = text.chars().last()?;
        let multiplier: u64 = match unit.to_ascii_uppercase() {
            'B' => 1,
            'K' => 1024,
            'M' => 1024 * 1024,
            'G' => 1024 * 1024 * 1024,
            _ => return None,
        };
        let number = &text[..text.len() - unit.len_utf8()];
        Decimal::parse(number)?.scaled(multiplier).map(Self::from_bytes)
    }

    pub fn bytes(&self) -> u64 {
        self.bytes
    }

    pub fn checked_add(self, other: Memory) -> Option<Memory> {
        self.bytes.checked_add(other.bytes).map(Self::from_bytes)
    }

    pub fn checked_sub(self, other: Memory) -> Option<Memory> {
        self.bytes.checked_sub(other.bytes).map(Self::from_bytes)
    }

    /// Signed `self - earlier` in bytes.
    pub fn delta_from(self, earlier: Memory) -> i128 {
        i128::from(self.bytes) - i128::from(earlier.bytes)
    }
}

impl fmt::Display for Memory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.bytes % 1024 == 0 {
            write!(f, "{}K", self.bytes / 1024)
        } else {
            write!(f, "{}B", self.bytes)
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Region {
    Young,
    Old,
    /// Whole heap, young plus old
    Combined,
    /// Metaspace or PermGen
    ClassSpace,
}

impl Region {
    pub fn as_str(&self) -> &'static str {
        match self {
            Region::Young => "young",
            Region::Old => "old",
            Region::Combined => "combined",
            Region::ClassSpace => "class_space",
        }
    }
}

/// Data-quality findings attached to an event rather than raised as errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(tag = "anomaly", rename_all = "snake_case")]
pub enum Anomaly {
    /// Occupancy reported above the region's capacity
    OccupancyExceedsCapacity { region: Region },
    /// Derived old-generation occupancy went down during a young-only collection
    OldShrankDuringYoung,
    /// Young/combined figures that cannot both be right (young above combined)
    InconsistentRegions { region: Region },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct RegionSnapshot {
    pub region: Region,
    pub before: Memory,
    pub after: Memory,
    /// Capacity after the collection
    pub capacity: Memory,
    /// Capacity before the collection, when the log prints both
    pub capacity_before: Option<Memory>,
}

impl RegionSnapshot {
    pub fn new(region: Region, before: Memory, after: Memory, capacity: Memory) -> Self {
        Self {
            region,
            before,
            after,
            capacity,
            capacity_before: None,
        }
    }

    /// Point-in-time occupancy (CMS initial mark, remark).
    pub fn occupancy(region: Region, used: Memory, capacity: Memory) -> Self {
        Self::new(region, used, used, capacity)
    }

    pub fn with_capacity_before(mut self, capacity_before: Memory) -> Self {
        self.capacity_before = Some(capacity_before);
        self
    }

    /// Parse a `before->after(capacity)` triple.
    pub fn parse(region: Region, before: &str, after: &str, capacity: &str) -> Option<Self> {
        Some(Self::new(
            region,
            Memory::parse(before)?,
            Memory::parse(after)?,
            Memory::parse(capacity)?,
        ))
    }

    /// Signed `after - before` in bytes.
    pub fn delta(&self) -> i128 {
        self.after.delta_from(self.before)
    }

    pub fn reclaimed(&self) -> Memory {
        self.before.checked_sub(self.after).unwrap_or(Memory::ZERO)
    }

    pub fn anomalies(&self) -> Vec<Anomaly> {
        let before_capacity = self.capacity_before.unwrap_or(self.capacity);
        if self.after > self.capacity || self.before > before_capacity.max(self.capacity) {
            vec![Anomaly::OccupancyExceedsCapacity { region: self.region }]
        } else {
            Vec::new()
        }
    }

    /// Component-wise `self - other`, used to derive old from combined and young.
    pub fn minus(&self, region: Region, other: &RegionSnapshot) -> Option<RegionSnapshot> {
        Some(RegionSnapshot {
            region,
            before: self.before.checked_sub(other.before)?,
            after: self.after.checked_sub(other.after)?,
            capacity: self.capacity.checked_sub(other.capacity)?,
            capacity_before: match (self.capacity_before, other.capacity_before) {
                (Some(a), Some(b)) => a.checked_sub(b),
                _ => None,
            },
        })
    }

    /// Component-wise sum, used for G1 eden plus survivors.
    pub fn plus(&self, region: Region, other: &RegionSnapshot) -> Option<RegionSnapshot> {
        Some(RegionSnapshot {
            region,
            before: self.before.checked_add(other.before)?,
            after: self.after.checked_add(other.after)?,
            capacity: self.capacity.checked_add(other.capacity)?,
            capacity_before: match (self.capacity_before, other.capacity_before) {
                (Some(a), Some(b)) => a.checked_add(b),
                _ => None,
            },
        })
    }
}
