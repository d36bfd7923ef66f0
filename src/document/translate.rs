//! Host <-> region-local coordinate translation.
//!
//! A region's local space starts at its first content byte: local line 0 is
//! the host line holding that byte. Only the origin line carries a column
//! shift, every later line maps column-for-column. All functions here are
//! pure, so repeated round trips never drift.

use tower_lsp::lsp_types::{Position, Range};

/// Host position of a region's first content byte.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct RegionOrigin {
    pub line: u32,
    pub character: u32,
}

/// How the lines of a backend result range are brought back to host space.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TargetLine {
    /// Shift every line by the origin line. Used for collection results
    /// (diagnostics, symbols, colors) whose items sit on unrelated lines.
    Delta,
    /// Force both ends onto the line of the host position that was queried.
    /// Used for single-position results (hover, completion edits).
    Pin(Position),
}

impl RegionOrigin {
    pub fn new(line: u32, character: u32) -> Self {
        Self { line, character }
    }

    /// Translate a host position into local space, or `None` when the
    /// position lies before the region.
    pub fn to_local(&self, host: Position) -> Option<Position> {
        if host.line < self.line {
            return None;
        }
        if host.line == self.line {
            let character = host.character.checked_sub(self.character)?;
            return Some(Position::new(0, character));
        }
        Some(Position::new(host.line - self.line, host.character))
    }

    pub fn to_host(&self, local: Position) -> Position {
        let character = if local.line == 0 {
            local.character + self.character
        } else {
            local.character
        };
        Position::new(local.line + self.line, character)
    }

    pub fn range_to_local(&self, host: Range) -> Option<Range> {
        Some(Range::new(self.to_local(host.start)?, self.to_local(host.end)?))
    }

    /// Translate a backend range back to host space under the given policy.
    pub fn range_to_host(&self, local: Range, target: TargetLine) -> Range {
        match target {
            TargetLine::Delta => Range::new(self.to_host(local.start), self.to_host(local.end)),
            TargetLine::Pin(query) => {
                let shift = if query.line == self.line {
                    self.character
                } else {
                    0
                };
                Range::new(
                    Position::new(query.line, local.start.character + shift),
                    Position::new(query.line, local.end.character + shift),
                )
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trip_never_drifts() {
        for start in 0..6u32 {
            let origin = RegionOrigin::new(start, 7);
            for line in start..start + 10 {
                let host = Position::new(line, 12);
                let mut pos = host;
                for _ in 0..5 {
                    pos = origin.to_host(origin.to_local(pos).unwrap());
                }
                assert_eq!(pos, host);
            }
        }
    }

    #[test]
    fn origin_line_shifts_columns() {
        let origin = RegionOrigin::new(3, 7);
        assert_eq!(origin.to_local(Position::new(3, 16)), Some(Position::new(0, 9)));
        assert_eq!(origin.to_local(Position::new(5, 2)), Some(Position::new(2, 2)));
        assert_eq!(origin.to_host(Position::new(1, 4)), Position::new(4, 4));
    }

    #[test]
    fn positions_before_region_do_not_translate() {
        let origin = RegionOrigin::new(3, 7);
        assert_eq!(origin.to_local(Position::new(2, 40)), None);
        assert_eq!(origin.to_local(Position::new(3, 6)), None);
    }

    #[test]
    fn delta_policy_shifts_lines() {
        let origin = RegionOrigin::new(3, 0);
        let local = Range::new(Position::new(1, 2), Position::new(2, 1));
        let host = origin.range_to_host(local, TargetLine::Delta);
        assert_eq!(host, Range::new(Position::new(4, 2), Position::new(5, 1)));
    }

    #[test]
    fn pin_policy_uses_query_line() {
        let origin = RegionOrigin::new(3, 0);
        let local = Range::new(Position::new(2, 4), Position::new(2, 6));
        let host = origin.range_to_host(local, TargetLine::Pin(Position::new(5, 6)));
        assert_eq!(host, Range::new(Position::new(5, 4), Position::new(5, 6)));
    }

    #[test]
    fn pin_policy_on_origin_line_shifts_columns() {
        let origin = RegionOrigin::new(3, 7);
        let local = Range::new(Position::new(0, 7), Position::new(0, 9));
        let host = origin.range_to_host(local, TargetLine::Pin(Position::new(3, 16)));
        assert_eq!(host, Range::new(Position::new(3, 14), Position::new(3, 16)));
    }
}
