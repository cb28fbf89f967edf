use serde::{Deserialize, Serialize};
use std::fmt;

/// Text scraped from one review node. Identity is the trimmed text itself.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Review(String);

impl Review {
    /// Returns `None` when nothing is left after trimming.
    pub fn new(raw: &str) -> Option<Self> {
        let text = raw.trim();
        if text.is_empty() {
            None
        } else {
            Some(Self(text.to_string()))
        }
    }

    pub fn text(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Review {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PushOutcome {
    Added,
    Duplicate,
    Blank,
    Full,
}

/// Reviews in discovery order, capped and free of exact duplicates.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReviewSet {
    capacity: usize,
    reviews: Vec<Review>,
}

impl ReviewSet {
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            capacity,
            reviews: Vec::with_capacity(capacity.min(128)),
        }
    }

    pub fn empty() -> Self {
        Self::with_capacity(0)
    }

    pub fn len(&self) -> usize {
        self.reviews.len()
    }

    pub fn is_empty(&self) -> bool {
        self.reviews.is_empty()
    }

    pub fn is_full(&self) -> bool {
        self.reviews.len() >= self.capacity
    }

    // Linear scan; sets stay small.
    pub fn contains(&self, text: &str) -> bool {
        self.reviews.iter().any(|r| r.text() == text)
    }

    pub fn push_raw(&mut self, raw: &str) -> PushOutcome {
        match Review::new(raw) {
            Some(review) => self.push(review),
            None => PushOutcome::Blank,
        }
    }

    pub fn push(&mut self, review: Review) -> PushOutcome {
        if self.is_full() {
            return PushOutcome::Full;
        }
        if self.contains(review.text()) {
            return PushOutcome::Duplicate;
        }
        self.reviews.push(review);
        PushOutcome::Added
    }

    /// Adds candidates in order until the cap is hit. Returns how many were new.
    pub fn extend_from_texts<I, S>(&mut self, texts: I) -> usize
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut added = 0;
        for text in texts {
            match self.push_raw(text.as_ref()) {
                PushOutcome::Added => added += 1,
                PushOutcome::Full => break,
                PushOutcome::Duplicate | PushOutcome::Blank => {}
            }
        }
        added
    }

    pub fn truncate(&mut self, len: usize) {
        self.reviews.truncate(len);
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Review> {
        self.reviews.iter()
    }

    pub fn texts(&self) -> Vec<String> {
        self.reviews.iter().map(|r| r.text().to_string()).collect()
    }

    pub fn preview(&self, n: usize) -> &[Review] {
        &self.reviews[..n.min(self.reviews.len())]
    }

    /// All review texts joined by a single space.
    pub fn joined(&self) -> String {
        self.reviews
            .iter()
            .map(Review::text)
            .collect::<Vec<_>>()
            .join(" ")
    }
}

impl<'a> IntoIterator for &'a ReviewSet {
    type Item = &'a Review;
    type IntoIter = std::slice::Iter<'a, Review>;

    fn into_iter(self) -> Self::IntoIter {
        self.reviews.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_review_trims_and_rejects_blank() {
        assert_eq!(Review::new("  배송 빨라요 \n").unwrap().text(), "배송 빨라요");
        assert!(Review::new("   \t").is_none());
    }

    #[test]
    fn test_dedup_is_exact_match() {
        let mut set = ReviewSet::with_capacity(10);
        assert_eq!(set.push_raw("좋아요"), PushOutcome::Added);
        assert_eq!(set.push_raw(" 좋아요 "), PushOutcome::Duplicate);
        assert_eq!(set.push_raw("좋아요!"), PushOutcome::Added);
        assert_eq!(set.push_raw(""), PushOutcome::Blank);
        assert_eq!(set.len(), 2);
    }

    #[test]
    fn test_cap_is_never_exceeded() {
        let mut set = ReviewSet::with_capacity(3);
        let added = set.extend_from_texts(["a", "b", "a", "c", "d", "e"]);
        assert_eq!(added, 3);
        assert_eq!(set.texts(), vec!["a", "b", "c"]);
        assert!(set.is_full());
        assert_eq!(set.push_raw("z"), PushOutcome::Full);
    }

    #[test]
    fn test_joined_and_preview() {
        let mut set = ReviewSet::with_capacity(5);
        set.extend_from_texts(["first", "second", "third"]);
        assert_eq!(set.joined(), "first second third");
        assert_eq!(set.preview(2).len(), 2);
        assert_eq!(set.preview(10).len(), 3);
        assert_eq!(ReviewSet::empty().joined(), "");
    }
}
