//! Cursor pagination and sort direction.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Opaque server-issued pagination cursor.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize, ts_rs::TS)]
#[ts(export)]
#[serde(transparent)]
pub struct Cursor(#[ts(type = "string")] pub String);

impl fmt::Display for Cursor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for Cursor {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

/// Pagination state returned alongside every page.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize, ts_rs::TS)]
#[ts(export)]
pub struct PageInfo {
    /// Cursor of the last item in the page; `None` for an empty page.
    pub end_cursor: Option<Cursor>,
    /// Whether the server holds more items after `end_cursor`.
    pub has_next_page: bool,
}

impl PageInfo {
    /// The cursor to request the next page with, if there is one.
    pub fn next_cursor(&self) -> Option<&Cursor> {
        if self.has_next_page {
            self.end_cursor.as_ref()
        } else {
            None
        }
    }
}

/// Ordering by creation time.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize, ts_rs::TS)]
#[ts(export)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Direction {
    Asc,
    #[default]
    Desc,
}

impl Direction {
    /// The opposite direction.
    pub fn toggled(self) -> Self {
        match self {
            Self::Asc => Self::Desc,
            Self::Desc => Self::Asc,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_next_cursor_requires_next_page() {
        let info = PageInfo {
            end_cursor: Some(Cursor::from("abc")),
            has_next_page: false,
        };
        assert!(info.next_cursor().is_none());

        let info = PageInfo {
            has_next_page: true,
            ..info
        };
        assert_eq!(info.next_cursor(), Some(&Cursor::from("abc")));
    }

    #[test]
    fn test_direction_toggle_and_wire_name() {
        assert_eq!(Direction::default(), Direction::Desc);
        assert_eq!(Direction::Desc.toggled(), Direction::Asc);
        assert_eq!(
            serde_json::to_string(&Direction::Asc).expect("serialize"),
            "\"ASC\""
        );
    }
}
