//! Layout resolution: pane coordinates to split operations.
//!
//! A tab starts with a single pane. [`resolve`] works out which splits turn
//! that pane into the requested grid:
//!
//! 1. Column heads: each column after the first is a vertical split of the
//!    previous column's head.
//! 2. Rows: within a column, each row after the first is a horizontal split
//!    of the previous row's head.
//! 3. Sub-columns: within a row, each sub pane after the first is a vertical
//!    split of the previous sub pane.
//!
//! The head of a group is its lowest coordinate, so gaps (`1/1` and `3/1`
//! without `2/1`) just mean fewer splits.
//!
//! # Example
//!
//! ```
//! use termis::resolver::{resolve, Direction};
//! use termis::position::Coordinate;
//!
//! let panes = ["1/1/1", "1/2/1", "1/2/2", "2/1/1"]
//!     .map(|p| p.parse::<Coordinate>().unwrap());
//! let plan = resolve("dev", &panes).unwrap();
//!
//! let directions: Vec<Direction> = plan.splits.iter().map(|s| s.direction).collect();
//! assert_eq!(directions, [Direction::Vertical, Direction::Horizontal, Direction::Vertical]);
//! assert_eq!(plan.panes().count(), 4);
//! ```

use crate::error::{Result, TermisError};
use crate::position::Coordinate;
use std::fmt;

/// How a pane is divided.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    /// Divider runs top to bottom; the new pane appears to the right.
    Vertical,
    /// Divider runs left to right; the new pane appears below.
    Horizontal,
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Direction::Vertical => f.write_str("vertically"),
            Direction::Horizontal => f.write_str("horizontally"),
        }
    }
}

/// Split `parent` in `direction`; the new pane takes position `child`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Split {
    pub parent: Coordinate,
    pub child: Coordinate,
    pub direction: Direction,
}

impl fmt::Display for Split {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "split {} {} -> {}", self.parent, self.direction, self.child)
    }
}

/// Resolved layout for one tab.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LayoutPlan {
    /// Coordinate occupying the tab's initial pane. `None` for an empty tab.
    pub initial: Option<Coordinate>,
    /// Splits in execution order. Every parent exists before it is split.
    pub splits: Vec<Split>,
}

impl LayoutPlan {
    /// All coordinates the plan materializes, in creation order.
    pub fn panes(&self) -> impl Iterator<Item = Coordinate> + '_ {
        self.initial
            .into_iter()
            .chain(self.splits.iter().map(|s| s.child))
    }

    pub fn is_empty(&self) -> bool {
        self.initial.is_none()
    }
}

/// Resolve the split sequence for the panes of tab `tab`.
///
/// The result depends only on the set of coordinates, never on their order.
///
/// # Errors
///
/// Returns [`TermisError::DuplicatePosition`] if a coordinate appears twice.
pub fn resolve(tab: &str, positions: &[Coordinate]) -> Result<LayoutPlan> {
    let mut sorted = positions.to_vec();
    sorted.sort();

    if let Some(dup) = sorted.windows(2).find(|w| w[0] == w[1]) {
        return Err(TermisError::DuplicatePosition {
            tab: tab.to_string(),
            position: dup[0],
        });
    }

    let Some(&initial) = sorted.first() else {
        return Ok(LayoutPlan::default());
    };

    let columns: Vec<&[Coordinate]> = sorted.chunk_by(|a, b| a.column == b.column).collect();
    let mut splits = Vec::with_capacity(sorted.len() - 1);

    for pair in columns.windows(2) {
        splits.push(Split {
            parent: pair[0][0],
            child: pair[1][0],
            direction: Direction::Vertical,
        });
    }

    for column in &columns {
        let rows: Vec<&[Coordinate]> = column.chunk_by(|a, b| a.row == b.row).collect();
        for pair in rows.windows(2) {
            splits.push(Split {
                parent: pair[0][0],
                child: pair[1][0],
                direction: Direction::Horizontal,
            });
        }
    }

    for column in &columns {
        for row in column.chunk_by(|a, b| a.row == b.row) {
            for pair in row.windows(2) {
                splits.push(Split {
                    parent: pair[0],
                    child: pair[1],
                    direction: Direction::Vertical,
                });
            }
        }
    }

    Ok(LayoutPlan {
        initial: Some(initial),
        splits,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn coords(specs: &[&str]) -> Vec<Coordinate> {
        specs.iter().map(|s| s.parse().unwrap()).collect()
    }

    /// Axis-aligned rectangle on a unit canvas.
    #[derive(Debug, Clone, Copy)]
    struct Rect {
        x: f64,
        y: f64,
        w: f64,
        h: f64,
    }

    /// Replay a plan against a single full-size pane.
    fn simulate(plan: &LayoutPlan) -> HashMap<Coordinate, Rect> {
        let mut canvas = HashMap::new();
        if let Some(initial) = plan.initial {
            canvas.insert(
                initial,
                Rect {
                    x: 0.0,
                    y: 0.0,
                    w: 1.0,
                    h: 1.0,
                },
            );
        }
        for split in &plan.splits {
            let parent = canvas[&split.parent];
            let (kept, created) = match split.direction {
                Direction::Vertical => {
                    let half = parent.w / 2.0;
                    (
                        Rect { w: half, ..parent },
                        Rect {
                            x: parent.x + half,
                            w: half,
                            ..parent
                        },
                    )
                }
                Direction::Horizontal => {
                    let half = parent.h / 2.0;
                    (
                        Rect { h: half, ..parent },
                        Rect {
                            y: parent.y + half,
                            h: half,
                            ..parent
                        },
                    )
                }
            };
            canvas.insert(split.parent, kept);
            assert!(
                canvas.insert(split.child, created).is_none(),
                "pane {} created twice",
                split.child
            );
        }
        canvas
    }

    fn assert_grid_adjacency(canvas: &HashMap<Coordinate, Rect>) {
        for (a, ra) in canvas {
            for (b, rb) in canvas {
                if a.column < b.column {
                    assert!(ra.x + ra.w <= rb.x + 1e-9, "{} should be left of {}", a, b);
                } else if a.column == b.column && a.row < b.row {
                    assert!(ra.y + ra.h <= rb.y + 1e-9, "{} should be above {}", a, b);
                } else if a.column == b.column && a.row == b.row && a.sub_column < b.sub_column {
                    assert!(ra.x + ra.w <= rb.x + 1e-9, "{} should be left of {}", a, b);
                    assert_eq!(ra.y, rb.y, "{} and {} should share a row", a, b);
                }
            }
        }
    }

    #[test]
    fn test_reference_layout() {
        let plan = resolve("dev", &coords(&["1/1/1", "1/2/1", "1/2/2", "2/1/1"])).unwrap();
        assert_eq!(plan.initial, Some(Coordinate::ORIGIN));
        assert_eq!(
            plan.splits,
            vec![
                Split {
                    parent: Coordinate::new(1, 1, 1),
                    child: Coordinate::new(2, 1, 1),
                    direction: Direction::Vertical,
                },
                Split {
                    parent: Coordinate::new(1, 1, 1),
                    child: Coordinate::new(1, 2, 1),
                    direction: Direction::Horizontal,
                },
                Split {
                    parent: Coordinate::new(1, 2, 1),
                    child: Coordinate::new(1, 2, 2),
                    direction: Direction::Vertical,
                },
            ]
        );
    }

    #[test]
    fn test_single_pane_needs_no_splits() {
        let plan = resolve("solo", &coords(&["1/1"])).unwrap();
        assert_eq!(plan.initial, Some(Coordinate::ORIGIN));
        assert!(plan.splits.is_empty());
    }

    #[test]
    fn test_empty_tab() {
        let plan = resolve("empty", &[]).unwrap();
        assert!(plan.is_empty());
        assert_eq!(plan.panes().count(), 0);
    }

    #[test]
    fn test_order_independent() {
        let specs = ["1/1", "1/2", "2/1", "2/2/1", "2/2/2", "2/2/3", "3/1", "3/3"];
        let forward = resolve("t", &coords(&specs)).unwrap();

        let mut reversed = specs;
        reversed.reverse();
        assert_eq!(resolve("t", &coords(&reversed)).unwrap(), forward);

        let shuffled = ["2/2/3", "1/2", "3/3", "2/1", "1/1", "2/2/1", "3/1", "2/2/2"];
        assert_eq!(resolve("t", &coords(&shuffled)).unwrap(), forward);
    }

    #[test]
    fn test_duplicate_position_rejected() {
        match resolve("api", &coords(&["1/1", "2/1", "1/1/1"])) {
            Err(TermisError::DuplicatePosition { tab, position }) => {
                assert_eq!(tab, "api");
                assert_eq!(position, Coordinate::ORIGIN);
            }
            other => panic!("expected DuplicatePosition, got {:?}", other),
        }
    }

    #[test]
    fn test_gaps_are_accepted() {
        let plan = resolve("gappy", &coords(&["1/1", "3/1", "3/4/2"])).unwrap();
        assert_eq!(plan.splits.len(), 2);
        assert_eq!(plan.splits[0].child, Coordinate::new(3, 1, 1));
        assert_eq!(plan.splits[1].parent, Coordinate::new(3, 1, 1));
        assert_eq!(plan.splits[1].child, Coordinate::new(3, 4, 2));
        assert_eq!(plan.splits[1].direction, Direction::Horizontal);
    }

    #[test]
    fn test_missing_origin_uses_lowest_coordinate() {
        let plan = resolve("t", &coords(&["2/1", "2/2"])).unwrap();
        assert_eq!(plan.initial, Some(Coordinate::new(2, 1, 1)));
        assert_eq!(plan.splits.len(), 1);
    }

    #[test]
    fn test_replay_yields_one_pane_per_coordinate() {
        let cases: &[&[&str]] = &[
            &["1/1/1", "1/2/1", "1/2/2", "2/1/1"],
            &["1/1", "2/1", "3/1", "4/1"],
            &["1/1", "1/2", "1/3"],
            &["1/1/1", "1/1/2", "1/1/3", "2/1", "2/2", "2/3/1", "2/3/2"],
            &["1/1", "1/3/2", "4/2", "4/5/1", "4/5/7"],
        ];
        for case in cases {
            let input = coords(case);
            let plan = resolve("t", &input).unwrap();
            assert_eq!(plan.splits.len(), input.len() - 1);

            let canvas = simulate(&plan);
            assert_eq!(canvas.len(), input.len());
            for c in &input {
                assert!(canvas.contains_key(c), "missing pane {}", c);
            }
            assert_grid_adjacency(&canvas);
        }
    }

    #[test]
    fn test_split_display() {
        let plan = resolve("t", &coords(&["1/1", "1/2"])).unwrap();
        assert_eq!(plan.splits[0].to_string(), "split 1/1/1 horizontally -> 1/2/1");
    }
}
