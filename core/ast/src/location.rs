use std::fmt::{self, Display, Formatter};

/// A source span, retained on every node so diagnostics can render a
/// caret under the offending text.
#[derive(Clone, PartialEq, Eq, Debug, Default, Hash)]
pub struct Location {
    pub offset_start: u32,
    pub offset_end: u32,
    pub start_line: u32,
    pub start_column: u32,
    pub end_line: u32,
    pub end_column: u32,
}

impl Location {
    #[must_use]
    pub fn new(
        offset_start: u32,
        offset_end: u32,
        start_line: u32,
        start_column: u32,
        end_line: u32,
        end_column: u32,
    ) -> Self {
        Self {
            offset_start,
            offset_end,
            start_line,
            start_column,
            end_line,
            end_column,
        }
    }

    /// A placeholder location for synthetic nodes (prelude shims, etc.)
    /// that do not correspond to user-written text.
    #[must_use]
    pub fn synthetic() -> Self {
        Self::default()
    }
}

impl Display for Location {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        write!(f, "{}:{}", self.start_line, self.start_column)
    }
}
