//! Order in which candidate neighbours are tried

use std::fmt;
use std::str::FromStr;

use contour_common::Error;
use contour_core::Rect;
use serde::{Deserialize, Serialize};

/// Tie-break policy for the candidate list of a growing contour
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum JoiningOrder {
    /// Whatever order the rectangle index returns
    #[default]
    Unordered,
    /// Ascending contour index
    Natural,
    /// Ascending bounding-box height, ties by ascending index
    SmallFirst,
    /// Descending bounding-box height, ties by descending index
    LargeFirst,
}

impl JoiningOrder {
    pub const ALL: [JoiningOrder; 4] = [
        JoiningOrder::Unordered,
        JoiningOrder::Natural,
        JoiningOrder::SmallFirst,
        JoiningOrder::LargeFirst,
    ];

    pub fn name(self) -> &'static str {
        match self {
            JoiningOrder::Unordered => "unordered",
            JoiningOrder::Natural => "natural",
            JoiningOrder::SmallFirst => "small-first",
            JoiningOrder::LargeFirst => "large-first",
        }
    }

    pub(crate) fn sort_indexes(self, indexes: &mut [usize], rects: &[Rect]) {
        let height = |i: usize| rects[i].max_y as i64 - rects[i].min_y as i64;
        match self {
            JoiningOrder::Unordered => {}
            JoiningOrder::Natural => indexes.sort_unstable(),
            JoiningOrder::SmallFirst => indexes.sort_unstable_by_key(|&i| (height(i), i)),
            JoiningOrder::LargeFirst => {
                indexes.sort_unstable_by(|&a, &b| (height(b), b).cmp(&(height(a), a)))
            }
        }
    }
}

impl fmt::Display for JoiningOrder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for JoiningOrder {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        JoiningOrder::ALL
            .into_iter()
            .find(|order| order.name() == s)
            .ok_or_else(|| {
                Error::invalid(format!(
                    "unknown joining order '{s}'; expected one of: unordered, natural, \
                     small-first, large-first"
                ))
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rects() -> Vec<Rect> {
        vec![
            Rect::new(0, 1, 0, 5),
            Rect::new(0, 1, 0, 2),
            Rect::new(0, 1, 0, 5),
            Rect::new(0, 1, 3, 4),
        ]
    }

    #[test]
    fn test_small_first() {
        let mut indexes = [0, 1, 2, 3];
        JoiningOrder::SmallFirst.sort_indexes(&mut indexes, &rects());
        assert_eq!(indexes, [3, 1, 0, 2]);
    }

    #[test]
    fn test_large_first() {
        let mut indexes = [0, 1, 2, 3];
        JoiningOrder::LargeFirst.sort_indexes(&mut indexes, &rects());
        assert_eq!(indexes, [2, 0, 1, 3]);
    }

    #[test]
    fn test_natural_and_unordered() {
        let mut indexes = [3, 0, 2, 1];
        JoiningOrder::Unordered.sort_indexes(&mut indexes, &rects());
        assert_eq!(indexes, [3, 0, 2, 1]);
        JoiningOrder::Natural.sort_indexes(&mut indexes, &rects());
        assert_eq!(indexes, [0, 1, 2, 3]);
    }

    #[test]
    fn test_names() {
        for order in JoiningOrder::ALL {
            assert_eq!(order.name().parse::<JoiningOrder>().unwrap(), order);
        }
        assert!("largest".parse::<JoiningOrder>().is_err());
        assert_eq!(
            serde_json::to_string(&JoiningOrder::SmallFirst).unwrap(),
            "\"small-first\""
        );
    }
}
