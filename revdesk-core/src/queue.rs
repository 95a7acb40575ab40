//! Ordered queue of reviews awaiting adjudication, with a focus cursor.

use crate::error::{ReviewError, ReviewResult};
use crate::types::Review;

/// Reviews in submission order plus the index of the focused one.
///
/// The cursor always satisfies `cursor < len()` while the queue is non-empty and
/// is `0` when it is empty. Removing a review keeps the same logical item focused
/// where possible.
#[derive(Debug, Clone, Default)]
pub struct ReviewQueue {
    items: Vec<Review>,
    cursor: usize,
}

impl ReviewQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a queue from `reviews`, focused on the first one.
    ///
    /// # Errors
    ///
    /// Returns `ReviewError::DuplicateReview` if two reviews share an id.
    pub fn from_reviews(reviews: Vec<Review>) -> ReviewResult<Self> {
        let mut queue = Self::new();
        for review in reviews {
            queue.push(review)?;
        }
        Ok(queue)
    }

    /// Appends `review` to the back of the queue. The cursor does not move.
    ///
    /// # Errors
    ///
    /// Returns `ReviewError::DuplicateReview` if a review with the same id is queued.
    pub fn push(&mut self, review: Review) -> ReviewResult<()> {
        if self.position(review.id()).is_some() {
            return Err(ReviewError::DuplicateReview(review.id().to_owned()));
        }
        self.items.push(review);
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    /// The focused review, or `None` when the queue is empty.
    pub fn current(&self) -> Option<&Review> {
        self.items.get(self.cursor)
    }

    /// Moves focus to the next review. No-op on the last one.
    pub fn next(&mut self) {
        if self.cursor + 1 < self.items.len() {
            self.cursor += 1;
        }
    }

    /// Moves focus to the previous review. No-op on the first one.
    pub fn previous(&mut self) {
        self.cursor = self.cursor.saturating_sub(1);
    }

    /// Focuses the review with `id`. Returns `false` (cursor untouched) if absent.
    pub fn focus(&mut self, id: &str) -> bool {
        match self.position(id) {
            Some(idx) => {
                self.cursor = idx;
                true
            }
            None => false,
        }
    }

    /// Removes the review with `id` and re-clamps the cursor.
    ///
    /// Removing an item before the cursor shifts the cursor down so the same review
    /// stays focused. Removing the focused item leaves the cursor on the same index,
    /// which now holds the following review, or the new last review if the removed
    /// one was last.
    pub fn remove(&mut self, id: &str) -> Option<Review> {
        let idx = self.position(id)?;
        let removed = self.items.remove(idx);
        if idx < self.cursor {
            self.cursor -= 1;
        }
        self.cursor = self.cursor.min(self.items.len().saturating_sub(1));
        Some(removed)
    }

    pub fn get(&self, id: &str) -> Option<&Review> {
        self.items.iter().find(|r| r.id() == id)
    }

    pub fn position(&self, id: &str) -> Option<usize> {
        self.items.iter().position(|r| r.id() == id)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Review> {
        self.items.iter()
    }
}
