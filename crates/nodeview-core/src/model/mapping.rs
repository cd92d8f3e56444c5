//! Position mapping through document changes.
//!
//! Every step records which range of the old document it replaced, so any
//! position taken before the step can be carried forward. A position that sat
//! strictly inside a replaced range no longer points at anything that survived
//! and is reported as deleted.

/// Which side a position sticks to when content is inserted exactly at it
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Assoc {
    Before,
    After,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MapResult {
    pub pos: usize,
    pub deleted: bool,
}

/// One replaced range: `old_size` positions starting at `start` became `new_size`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReplacedRange {
    pub start: usize,
    pub old_size: usize,
    pub new_size: usize,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StepMap {
    ranges: Vec<ReplacedRange>,
}

impl StepMap {
    /// A map that leaves every position in place
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn replace(start: usize, old_size: usize, new_size: usize) -> Self {
        Self {
            ranges: vec![ReplacedRange {
                start,
                old_size,
                new_size,
            }],
        }
    }

    pub fn ranges(&self) -> &[ReplacedRange] {
        &self.ranges
    }

    pub fn map_result(&self, pos: usize, assoc: Assoc) -> MapResult {
        let mut diff: isize = 0;
        for range in &self.ranges {
            if range.start > pos {
                break;
            }
            let end = range.start + range.old_size;
            if pos <= end {
                let base = shift(range.start, diff);
                let before = MapResult {
                    pos: base,
                    deleted: false,
                };
                let after = MapResult {
                    pos: base + range.new_size,
                    deleted: false,
                };
                return match (range.old_size, assoc) {
                    (0, Assoc::Before) => before,
                    (0, Assoc::After) => after,
                    _ if pos == range.start => before,
                    _ if pos == end => after,
                    (_, Assoc::Before) => MapResult {
                        deleted: true,
                        ..before
                    },
                    (_, Assoc::After) => MapResult {
                        deleted: true,
                        ..after
                    },
                };
            }
            diff += range.new_size as isize - range.old_size as isize;
        }
        MapResult {
            pos: shift(pos, diff),
            deleted: false,
        }
    }

    pub fn map(&self, pos: usize, assoc: Assoc) -> usize {
        self.map_result(pos, assoc).pos
    }
}

fn shift(pos: usize, diff: isize) -> usize {
    pos.saturating_add_signed(diff)
}

/// Sequence of step maps, applied in order
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Mapping {
    maps: Vec<StepMap>,
}

impl Mapping {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn append(&mut self, map: StepMap) {
        self.maps.push(map);
    }

    pub fn maps(&self) -> &[StepMap] {
        &self.maps
    }

    pub fn is_identity(&self) -> bool {
        self.maps.iter().all(|map| map.ranges.is_empty())
    }

    /// Map through every step; deleted if any step deleted the position
    pub fn map_result(&self, pos: usize, assoc: Assoc) -> MapResult {
        self.maps.iter().fold(
            MapResult {
                pos,
                deleted: false,
            },
            |acc, map| {
                let next = map.map_result(acc.pos, assoc);
                MapResult {
                    pos: next.pos,
                    deleted: acc.deleted || next.deleted,
                }
            },
        )
    }

    pub fn map(&self, pos: usize, assoc: Assoc) -> usize {
        self.map_result(pos, assoc).pos
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case::before_range(3, Assoc::After, 3, false)]
    #[case::range_start(10, Assoc::After, 10, false)]
    #[case::range_end(14, Assoc::Before, 12, false)]
    #[case::inside_before(12, Assoc::Before, 10, true)]
    #[case::inside_after(12, Assoc::After, 12, true)]
    #[case::after_range(20, Assoc::After, 18, false)]
    fn test_deletion_mapping(
        #[case] pos: usize,
        #[case] assoc: Assoc,
        #[case] expected: usize,
        #[case] deleted: bool,
    ) {
        // 4 positions at 10 replaced by 2
        let map = StepMap::replace(10, 4, 2);

        assert_eq!(map.map_result(pos, assoc), MapResult { pos: expected, deleted });
    }

    #[rstest]
    #[case(Assoc::Before, 5)]
    #[case(Assoc::After, 8)]
    fn test_insertion_uses_assoc(#[case] assoc: Assoc, #[case] expected: usize) {
        let map = StepMap::replace(5, 0, 3);

        assert_eq!(map.map(5, assoc), expected);
        assert_eq!(map.map(9, assoc), 12);
    }

    #[test]
    fn test_mapping_composes_and_remembers_deletion() {
        let mut mapping = Mapping::new();
        mapping.append(StepMap::replace(0, 0, 5));
        mapping.append(StepMap::replace(10, 6, 0));

        assert_eq!(mapping.map(2, Assoc::After), 7);
        assert_eq!(
            mapping.map_result(8, Assoc::After),
            MapResult {
                pos: 10,
                deleted: true
            }
        );
        assert_eq!(mapping.map(20, Assoc::After), 19);
    }

    #[test]
    fn test_empty_mapping_is_identity() {
        let mut mapping = Mapping::new();
        mapping.append(StepMap::empty());

        assert!(mapping.is_identity());
        assert_eq!(mapping.map(42, Assoc::Before), 42);
    }
}
