use serde::Serialize;

/// Attachments sharing one local calendar day.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DateSection<T> {
    /// Four-digit local year, used for the sticky year header.
    pub year: String,
    /// Local midnight of the day, epoch milliseconds.
    pub day_ts: i64,
    /// Items of that day, newest first.
    pub items: Vec<T>,
    /// True only for the latest day of its year.
    pub is_first_of_year: bool,
}

impl<T> DateSection<T> {
    /// Number of items in the section.
    #[must_use]
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Returns true if the section holds no items.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

/// One virtualized grid row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Row<T> {
    /// Recycling key, unique per row content.
    pub key: String,
    /// At most `chunk_size` items.
    pub items: Vec<T>,
}
