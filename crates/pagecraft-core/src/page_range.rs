//! Page range grammar
//!
//! Parses user text like `"1-3, 5, 8-10"` or `"all"` into a sorted, deduplicated
//! list of 1-based page numbers bounded by the document's page count.

use crate::error::PageRangeError;
use serde::Serialize;
use std::collections::BTreeSet;

/// Validated set of 1-based page numbers, strictly increasing and never empty.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PageRange {
    pages: Vec<u32>,
}

impl PageRange {
    /// Parse `text` against a document with `max_page` pages.
    pub fn parse(text: &str, max_page: u32) -> Result<Self, PageRangeError> {
        let input = text.trim();
        if input.is_empty() {
            return Err(PageRangeError::Empty);
        }

        let mut pages = BTreeSet::new();

        for token in input.split(',') {
            let token = token.trim();
            if token.is_empty() {
                return Err(PageRangeError::Syntax("empty entry between commas".into()));
            }

            if token.eq_ignore_ascii_case("all") {
                if max_page == 0 {
                    return Err(PageRangeError::Empty);
                }
                pages.extend(1..=max_page);
                continue;
            }

            if let Some((start, end)) = token.split_once('-') {
                let start = parse_page_number(start)?;
                let end = parse_page_number(end)?;

                if start > end {
                    return Err(PageRangeError::Syntax(format!(
                        "Start {} > end {}",
                        start, end
                    )));
                }
                check_bounds(start, max_page)?;
                check_bounds(end, max_page)?;

                // Bounds are checked, so both fit in u32.
                pages.extend(start as u32..=end as u32);
            } else {
                let page = parse_page_number(token)?;
                check_bounds(page, max_page)?;
                pages.insert(page as u32);
            }
        }

        Ok(Self {
            pages: pages.into_iter().collect(),
        })
    }

    /// Every page of a document with `max_page` pages.
    pub fn all(max_page: u32) -> Result<Self, PageRangeError> {
        if max_page == 0 {
            return Err(PageRangeError::Empty);
        }
        Ok(Self {
            pages: (1..=max_page).collect(),
        })
    }

    pub fn pages(&self) -> &[u32] {
        &self.pages
    }

    pub fn len(&self) -> usize {
        self.pages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pages.is_empty()
    }

    pub fn contains(&self, page: u32) -> bool {
        self.pages.binary_search(&page).is_ok()
    }

    pub fn first(&self) -> u32 {
        self.pages[0]
    }

    /// The same pages as 0-based indices.
    pub fn zero_based(&self) -> impl Iterator<Item = usize> + '_ {
        self.pages.iter().map(|&p| (p - 1) as usize)
    }

    pub fn into_vec(self) -> Vec<u32> {
        self.pages
    }
}

impl<'a> IntoIterator for &'a PageRange {
    type Item = &'a u32;
    type IntoIter = std::slice::Iter<'a, u32>;

    fn into_iter(self) -> Self::IntoIter {
        self.pages.iter()
    }
}

fn parse_page_number(raw: &str) -> Result<u64, PageRangeError> {
    let raw = raw.trim();
    if raw.is_empty() || !raw.bytes().all(|b| b.is_ascii_digit()) {
        return Err(PageRangeError::Syntax(format!("Invalid page: {:?}", raw)));
    }
    raw.parse::<u64>()
        .map_err(|_| PageRangeError::Syntax(format!("Invalid page: {:?}", raw)))
}

fn check_bounds(page: u64, max_page: u32) -> Result<(), PageRangeError> {
    if page == 0 || page > u64::from(max_page) {
        return Err(PageRangeError::OutOfRange { page, max_page });
    }
    Ok(())
}


#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    fn token(max: u32) -> impl Strategy<Value = String> {
        prop_oneof![
            (1..=max).prop_map(|p| p.to_string()),
            (1..=max, 1..=max).prop_map(|(a, b)| {
                let (lo, hi) = if a <= b { (a, b) } else { (b, a) };
                format!("{} - {}", lo, hi)
            }),
        ]
    }

    proptest! {
        /// Valid input always yields a strictly increasing list within bounds.
        #[test]
        fn parsed_pages_strictly_increasing(
            tokens in proptest::collection::vec(token(40), 1..8),
        ) {
            let text = tokens.join(",");
            let range = PageRange::parse(&text, 40).unwrap();
            let pages = range.pages();
            prop_assert!(!pages.is_empty());
            prop_assert!(pages.windows(2).all(|w| w[0] < w[1]));
            prop_assert!(pages.iter().all(|&p| (1..=40).contains(&p)));
        }

        /// Token order never changes the result.
        #[test]
        fn token_order_is_irrelevant(
            tokens in proptest::collection::vec(token(25), 1..6),
        ) {
            let forward = PageRange::parse(&tokens.join(","), 25).unwrap();
            let mut reversed = tokens.clone();
            reversed.reverse();
            let backward = PageRange::parse(&reversed.join(","), 25).unwrap();
            prop_assert_eq!(forward, backward);
        }
    }
}
