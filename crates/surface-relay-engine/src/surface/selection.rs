//! Selection mapping between raw surface offsets and line/column positions.
//!
//! Offsets are counted in UTF-16 code units, the unit DOM selection APIs
//! report. Lines and columns are both 1-based. Positions are recomputed from
//! the full text on every query; field-sized texts make that cheap enough
//! that no line index is kept.

use std::fmt;
use std::str::FromStr;

use crate::host::{Host, Surface};
use crate::surface::{SurfaceKind, TrackedSurface};

const NEWLINE: u16 = b'\n' as u16;

/// A 1-based line/column coordinate
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Position {
    line: usize,
    column: usize,
}

impl Position {
    /// The position of offset 0 in any text
    pub const START: Position = Position { line: 1, column: 1 };

    /// Returns `None` unless both coordinates are at least 1.
    pub fn new(line: usize, column: usize) -> Option<Self> {
        (line >= 1 && column >= 1).then_some(Self { line, column })
    }

    pub fn line(&self) -> usize {
        self.line
    }

    pub fn column(&self) -> usize {
        self.column
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.line, self.column)
    }
}

/// Anchor is where the selection started, cursor is the active end.
/// The two are reversed relative to document order for backward selections.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SelectionRange {
    pub anchor: Position,
    pub cursor: Position,
}

impl SelectionRange {
    pub fn is_collapsed(&self) -> bool {
        self.anchor == self.cursor
    }
}

/// Value of a field's `selectionDirection` attribute
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SelectionDirection {
    Forward,
    Backward,
    /// `none` or anything unrecognized
    Unknown,
}

impl FromStr for SelectionDirection {
    type Err = std::convert::Infallible;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        Ok(match value {
            "forward" => SelectionDirection::Forward,
            "backward" => SelectionDirection::Backward,
            _ => SelectionDirection::Unknown,
        })
    }
}

/// Native selection of a plain field: `start <= end` in document order
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NativeSelection {
    pub start: usize,
    pub end: usize,
    pub direction: SelectionDirection,
}

impl NativeSelection {
    pub fn new(start: usize, end: usize, direction: SelectionDirection) -> Self {
        Self {
            start,
            end,
            direction,
        }
    }

    /// `(anchor, cursor)` offsets, or `None` when the direction is unknown.
    pub fn anchor_cursor(&self) -> Option<(usize, usize)> {
        match self.direction {
            SelectionDirection::Forward => Some((self.start, self.end)),
            SelectionDirection::Backward => Some((self.end, self.start)),
            SelectionDirection::Unknown => None,
        }
    }
}

/// Position of the raw `offset` within `text`.
///
/// Equivalent to slicing the text up to `offset`, splitting on `\n`, and
/// taking the piece count as the line and the last piece's length + 1 as the
/// column. Offsets past the end clamp to the end.
pub fn position_at(text: &str, offset: usize) -> Position {
    let mut position = Position::START;
    for unit in text.encode_utf16().take(offset) {
        if unit == NEWLINE {
            position.line += 1;
            position.column = 1;
        } else {
            position.column += 1;
        }
    }
    position
}

/// Raw offset of `position` within `text`.
///
/// Returns `None` if the line does not exist or the column lies past the end
/// of that line. The column just after a line's last character is valid.
pub fn offset_at(text: &str, position: Position) -> Option<usize> {
    let mut line = 1;
    let mut line_start = 0;
    let mut offset = 0;
    let mut units = text.encode_utf16();

    while line < position.line {
        match units.next() {
            Some(NEWLINE) => {
                line += 1;
                offset += 1;
                line_start = offset;
            }
            Some(_) => offset += 1,
            None => return None,
        }
    }

    let line_len = units.take_while(|&unit| unit != NEWLINE).count();
    let column_offset = position.column - 1;
    (column_offset <= line_len).then_some(line_start + column_offset)
}

/// Raw `(anchor, cursor)` offsets of the surface's current selection.
///
/// Plain fields with a known direction use their native offsets. Everything
/// else falls back to the document selection, or `(0, 0)` without one.
pub fn selection_offsets<H: Host>(host: &H, surface: &TrackedSurface<H::Surface>) -> (usize, usize) {
    let native = match surface.kind() {
        SurfaceKind::PlainField => surface
            .element()
            .native_selection()
            .and_then(|selection| selection.anchor_cursor()),
        SurfaceKind::ContentEditable => None,
    };
    native
        .or_else(|| host.selection_offsets())
        .unwrap_or((0, 0))
}

/// Full current text of a surface.
///
/// Content-editable regions have no canonical value, so their contents are
/// selected and the selection is stringified. This replaces the document
/// selection.
pub fn read_text<H: Host>(host: &H, surface: &TrackedSurface<H::Surface>) -> String {
    let element = surface.element();
    match surface.kind() {
        SurfaceKind::ContentEditable => match host.select_contents(surface) {
            Ok(()) => host
                .selected_text()
                .or_else(|| element.text_content())
                .unwrap_or_default(),
            Err(err) => {
                log::warn!("Could not select surface contents, reading text content: {err}");
                element.text_content().unwrap_or_default()
            }
        },
        SurfaceKind::PlainField => element
            .value()
            .or_else(|| element.text_content())
            .unwrap_or_default(),
    }
}

/// Text and selection captured together.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SurfaceSnapshot {
    pub text: String,
    pub selection: SelectionRange,
}

/// Capture the surface's text and selection.
///
/// Offsets are read before the text because reading a content-editable
/// region moves the document selection.
pub fn snapshot<H: Host>(host: &H, surface: &TrackedSurface<H::Surface>) -> SurfaceSnapshot {
    let (anchor_offset, cursor_offset) = selection_offsets(host, surface);
    let text = read_text(host, surface);
    let selection = SelectionRange {
        anchor: position_at(&text, anchor_offset),
        cursor: position_at(&text, cursor_offset),
    };
    SurfaceSnapshot { text, selection }
}

/// Selection range of the surface in line/column coordinates.
pub fn selection_range<H: Host>(host: &H, surface: &TrackedSurface<H::Surface>) -> SelectionRange {
    snapshot(host, surface).selection
}
