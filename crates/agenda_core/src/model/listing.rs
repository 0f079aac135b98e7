//! List envelope shared by contact and appointment queries.

/// Outcome of a list or search query.
///
/// `NoRecords` means the underlying collection is empty; `NoMatches` means
/// records exist but the filter removed all of them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Listing<T> {
    NoRecords,
    NoMatches,
    Found(Vec<T>),
}

impl<T> Listing<T> {
    /// Builds a listing from the full collection size and the filtered items.
    pub fn from_filtered(total: usize, items: Vec<T>) -> Self {
        if total == 0 {
            Self::NoRecords
        } else if items.is_empty() {
            Self::NoMatches
        } else {
            Self::Found(items)
        }
    }

    /// Returns the found items, or an empty slice for the empty markers.
    pub fn items(&self) -> &[T] {
        match self {
            Self::Found(items) => items,
            Self::NoRecords | Self::NoMatches => &[],
        }
    }

    pub fn into_items(self) -> Vec<T> {
        match self {
            Self::Found(items) => items,
            Self::NoRecords | Self::NoMatches => Vec::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::Listing;

    #[test]
    fn empty_collection_is_no_records() {
        assert_eq!(Listing::<u8>::from_filtered(0, Vec::new()), Listing::NoRecords);
    }

    #[test]
    fn filtered_out_collection_is_no_matches() {
        assert_eq!(Listing::<u8>::from_filtered(3, Vec::new()), Listing::NoMatches);
    }

    #[test]
    fn found_items_are_exposed() {
        let listing = Listing::from_filtered(3, vec![1, 2]);
        assert_eq!(listing.items(), &[1, 2]);
        assert_eq!(listing.into_items(), vec![1, 2]);
    }
}
