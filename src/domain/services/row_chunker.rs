//! Fixed-size grid rows with content-addressed keys.

use std::borrow::Cow;
use std::num::NonZeroUsize;

use crate::domain::entities::{Attachment, Row};

/// Items that contribute a stable identity to row keys.
pub trait RowKeyed {
    /// Identity of the item inside a row key.
    fn row_key(&self) -> Cow<'_, str>;
}

impl RowKeyed for Attachment {
    fn row_key(&self) -> Cow<'_, str> {
        match self.id() {
            Some(id) => Cow::Borrowed(id),
            None => Cow::Owned(self.key().to_string()),
        }
    }
}

impl RowKeyed for String {
    fn row_key(&self) -> Cow<'_, str> {
        Cow::Borrowed(self)
    }
}

impl RowKeyed for &str {
    fn row_key(&self) -> Cow<'_, str> {
        Cow::Borrowed(self)
    }
}

macro_rules! impl_row_keyed_for_int {
    ($($ty:ty),*) => {
        $(impl RowKeyed for $ty {
            fn row_key(&self) -> Cow<'_, str> {
                Cow::Owned(self.to_string())
            }
        })*
    };
}

impl_row_keyed_for_int!(u32, u64, usize, i32, i64);

/// Splits `list` into rows of at most `chunk_size` items.
///
/// Keys read `{seed}_row_{index}_{ids joined by '_'}`. A zero chunk size is
/// treated as one.
#[must_use]
pub fn chunk_into_rows<T>(list: &[T], chunk_size: usize, seed: &str) -> Vec<Row<T>>
where
    T: RowKeyed + Clone,
{
    let size = NonZeroUsize::new(chunk_size).unwrap_or(NonZeroUsize::MIN);
    list.chunks(size.get())
        .enumerate()
        .map(|(index, chunk)| {
            let ids: Vec<Cow<'_, str>> = chunk.iter().map(RowKeyed::row_key).collect();
            Row {
                key: format!("{seed}_row_{index}_{}", ids.join("_")),
                items: chunk.to_vec(),
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;

    #[test]
    fn test_five_items_in_rows_of_three() {
        let rows = chunk_into_rows(&[1_u32, 2, 3, 4, 5], 3, "s");

        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].items, [1, 2, 3]);
        assert_eq!(rows[0].key, "s_row_0_1_2_3");
        assert_eq!(rows[1].items, [4, 5]);
        assert!(rows[1].key.starts_with("s_row_1_"));
    }

    #[test_case(0, 1 ; "empty")]
    #[test_case(1, 1 ; "single")]
    #[test_case(7, 2 ; "uneven")]
    #[test_case(9, 3 ; "exact")]
    #[test_case(10, 4 ; "wide")]
    fn test_flatten_is_lossless(len: u32, chunk_size: usize) {
        let list: Vec<u32> = (0..len).collect();

        let rows = chunk_into_rows(&list, chunk_size, "seed");
        let flat: Vec<u32> = rows.iter().flat_map(|r| r.items.iter().copied()).collect();

        assert_eq!(flat, list);
        assert!(rows.iter().all(|r| r.items.len() <= chunk_size.max(1)));
    }

    #[test]
    fn test_keys_change_with_content() {
        let before = chunk_into_rows(&["a", "b", "c", "d"], 2, "day");
        let after = chunk_into_rows(&["x", "a", "b", "c", "d"], 2, "day");

        assert_ne!(before[0].key, after[0].key);
        assert_ne!(before[1].key, after[1].key);
    }

    #[test]
    fn test_zero_chunk_size_is_one() {
        let rows = chunk_into_rows(&[1_u32, 2], 0, "s");
        assert_eq!(rows.len(), 2);
    }
}
