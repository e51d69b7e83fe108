//! In-memory study queue.

/// Ordered card ids for one study session, with a current-position pointer.
///
/// Built once at session start (new cards first, then due cards) and owned
/// by the session manager; never persisted. Weakly-recalled cards are
/// re-inserted at a bounded offset ahead of the pointer so the learner sees
/// them again before the session ends.
#[derive(Debug, Clone)]
pub struct StudyQueue {
    cards: Vec<i64>,
    position: usize,
}

impl StudyQueue {
    pub fn new(cards: Vec<i64>) -> Self {
        Self { cards, position: 0 }
    }

    /// The card currently being shown, if any remain.
    pub fn current(&self) -> Option<i64> {
        self.cards.get(self.position).copied()
    }

    /// Move past the current card.
    pub fn advance(&mut self) {
        if self.position < self.cards.len() {
            self.position += 1;
        }
    }

    /// Re-insert the current card `offset` positions ahead (or at the end
    /// of the queue if fewer remain). The pointer does not move.
    pub fn requeue_current(&mut self, offset: usize) {
        if let Some(card_id) = self.current() {
            let insert_at = (self.position + offset).min(self.cards.len());
            self.cards.insert(insert_at, card_id);
        }
    }

    /// Whether every queued card (including re-queues) has been passed.
    pub fn is_exhausted(&self) -> bool {
        self.position >= self.cards.len()
    }

    /// Cards still ahead of the pointer, current card included.
    pub fn remaining(&self) -> usize {
        self.cards.len() - self.position
    }

    /// Ids still ahead of the pointer, in presentation order. Re-queued
    /// cards appear once per pending showing.
    pub fn remaining_ids(&self) -> &[i64] {
        &self.cards[self.position..]
    }

    /// Total entries ever queued, re-queues included.
    pub fn len(&self) -> usize {
        self.cards.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cards.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_walk_through_queue() {
        let mut queue = StudyQueue::new(vec![1, 2, 3]);
        assert_eq!(queue.current(), Some(1));
        assert_eq!(queue.remaining(), 3);

        queue.advance();
        assert_eq!(queue.current(), Some(2));
        queue.advance();
        queue.advance();
        assert!(queue.is_exhausted());
        assert_eq!(queue.current(), None);
    }

    #[test]
    fn test_requeue_reappears_at_offset() {
        let mut queue = StudyQueue::new((1..=15).collect());

        // Fail the first card: it should come back 10 positions ahead.
        queue.requeue_current(10);
        queue.advance();

        let mut seen_again_at = None;
        for step in 1.. {
            match queue.current() {
                Some(1) => {
                    seen_again_at = Some(step);
                    break;
                }
                Some(_) => queue.advance(),
                None => break,
            }
        }
        assert_eq!(seen_again_at, Some(10));
    }

    #[test]
    fn test_requeue_clamps_to_end() {
        let mut queue = StudyQueue::new(vec![7, 8]);
        queue.requeue_current(10);
        queue.advance();

        assert_eq!(queue.current(), Some(8));
        queue.advance();
        // The failed card reappears at the end, before exhaustion.
        assert_eq!(queue.current(), Some(7));
        queue.advance();
        assert!(queue.is_exhausted());
    }

    #[test]
    fn test_advance_past_end_is_noop() {
        let mut queue = StudyQueue::new(vec![1]);
        queue.advance();
        queue.advance();
        assert!(queue.is_exhausted());
        assert_eq!(queue.remaining(), 0);
    }
}
