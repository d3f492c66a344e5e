use serde::{Deserialize, Serialize};

use crate::error::DomainError;

pub const DEFAULT_PAGE_SIZE: u64 = 10;
pub const MAX_PAGE_SIZE: u64 = 100;

/// A 1-based page request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    pub page: u64,
    pub page_size: u64,
}

impl PageRequest {
    pub fn new(page: u64, page_size: u64) -> Result<Self, DomainError> {
        let mut errors = Vec::new();
        if page == 0 {
            errors.push("Page numbers start at 1".to_string());
        }
        if page_size == 0 || page_size > MAX_PAGE_SIZE {
            errors.push(format!("Page size must be between 1 and {MAX_PAGE_SIZE}"));
        }
        if !errors.is_empty() {
            return Err(DomainError::Validation(errors));
        }
        // Offsets must fit a signed BIGINT.
        match (page - 1).checked_mul(page_size) {
            Some(offset) if offset <= i64::MAX as u64 => Ok(Self { page, page_size }),
            _ => Err(DomainError::Validation(vec![
                "Page number is too large".to_string(),
            ])),
        }
    }

    /// Number of rows to skip.
    pub fn offset(&self) -> u64 {
        (self.page - 1) * self.page_size
    }
}

impl Default for PageRequest {
    fn default() -> Self {
        Self {
            page: 1,
            page_size: DEFAULT_PAGE_SIZE,
        }
    }
}

/// One page of results with the totals needed to render a pager.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub total_count: u64,
    pub total_pages: u64,
    pub current_page: u64,
    pub page_size: u64,
}

impl<T> Page<T> {
    pub fn new(items: Vec<T>, total_count: u64, request: PageRequest) -> Self {
        Self {
            items,
            total_count,
            total_pages: total_count.div_ceil(request.page_size),
            current_page: request.page,
            page_size: request.page_size,
        }
    }

    pub fn map<U>(self, f: impl FnMut(T) -> U) -> Page<U> {
        Page {
            items: self.items.into_iter().map(f).collect(),
            total_count: self.total_count,
            total_pages: self.total_pages,
            current_page: self.current_page,
            page_size: self.page_size,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn total_pages_rounds_up() {
        let request = PageRequest::new(1, 10).unwrap();
        assert_eq!(Page::<u8>::new(vec![], 25, request).total_pages, 3);
        assert_eq!(Page::<u8>::new(vec![], 30, request).total_pages, 3);
        assert_eq!(Page::<u8>::new(vec![], 0, request).total_pages, 0);
    }

    #[test]
    fn offset_is_one_based() {
        assert_eq!(PageRequest::new(3, 10).unwrap().offset(), 20);
    }

    #[test]
    fn huge_page_is_rejected_instead_of_overflowing() {
        assert!(matches!(
            PageRequest::new(u64::MAX, 100),
            Err(DomainError::Validation(errors)) if errors == ["Page number is too large"]
        ));
        assert!(PageRequest::new(u64::MAX, 1).is_err());
    }

    #[test]
    fn zero_page_and_size_are_rejected() {
        assert!(matches!(
            PageRequest::new(0, 0),
            Err(DomainError::Validation(errors)) if errors.len() == 2
        ));
    }
}
