//! Pagination state machine.
//!
//! The listings index exposes no authoritative "last page" signal, so the
//! walker infers exhaustion from repeated empty result pages and carries a
//! hard page cap as a liveness guarantee.

/// Hard upper bound on result pages per run, applied regardless of the
/// empty-page heuristic.
pub const MAX_PAGES: u32 = 1000;

/// Consecutive empty result pages treated as the end of the listing set.
pub const EMPTY_PAGE_LIMIT: u32 = 3;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WalkState {
    /// More result pages remain to be fetched.
    Active,
    /// Terminal: the listing set is exhausted (or the page cap was hit).
    Exhausted,
}

/// Tracks the current result page and the empty-page streak.
#[derive(Debug)]
pub struct PageWalker {
    page: u32,
    consecutive_empty: u32,
    empty_page_limit: u32,
    max_pages: u32,
    state: WalkState,
}

impl Default for PageWalker {
    fn default() -> Self {
        Self::new(EMPTY_PAGE_LIMIT, MAX_PAGES)
    }
}

impl PageWalker {
    #[must_use]
    pub fn new(empty_page_limit: u32, max_pages: u32) -> Self {
        Self {
            page: 1,
            consecutive_empty: 0,
            empty_page_limit: empty_page_limit.max(1),
            max_pages: max_pages.max(1),
            state: WalkState::Active,
        }
    }

    /// Page number to fetch next.
    #[must_use]
    pub fn current_page(&self) -> u32 {
        self.page
    }

    #[must_use]
    pub fn is_exhausted(&self) -> bool {
        self.state == WalkState::Exhausted
    }

    /// Feed the URL count discovered on the current page and transition.
    pub fn advance(&mut self, urls_found: usize) -> WalkState {
        if self.state == WalkState::Exhausted {
            return WalkState::Exhausted;
        }

        if urls_found == 0 {
            self.consecutive_empty += 1;
            if self.consecutive_empty >= self.empty_page_limit {
                self.state = WalkState::Exhausted;
                return WalkState::Exhausted;
            }
        } else {
            self.consecutive_empty = 0;
        }

        if self.page >= self.max_pages {
            self.state = WalkState::Exhausted;
            return WalkState::Exhausted;
        }

        self.page += 1;
        WalkState::Active
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn three_consecutive_empty_pages_exhaust() {
        let mut walker = PageWalker::default();
        assert_eq!(walker.advance(0), WalkState::Active);
        assert_eq!(walker.advance(0), WalkState::Active);
        assert_eq!(walker.advance(0), WalkState::Exhausted);
        assert!(walker.is_exhausted());
        // Terminal well before the hard cap.
        assert!(walker.current_page() < MAX_PAGES);
    }

    #[test]
    fn non_empty_page_resets_the_streak() {
        let mut walker = PageWalker::default();
        walker.advance(0);
        walker.advance(0);
        assert_eq!(walker.advance(12), WalkState::Active);
        walker.advance(0);
        walker.advance(0);
        assert_eq!(walker.advance(0), WalkState::Exhausted);
    }

    #[test]
    fn page_number_increments_while_active() {
        let mut walker = PageWalker::default();
        assert_eq!(walker.current_page(), 1);
        walker.advance(30);
        assert_eq!(walker.current_page(), 2);
        walker.advance(0);
        assert_eq!(walker.current_page(), 3);
    }

    #[test]
    fn hard_cap_halts_even_with_results_on_every_page() {
        let mut walker = PageWalker::new(3, 5);
        for _ in 0..4 {
            assert_eq!(walker.advance(10), WalkState::Active);
        }
        assert_eq!(walker.current_page(), 5);
        assert_eq!(walker.advance(10), WalkState::Exhausted);
        assert!(walker.is_exhausted());
    }

    #[test]
    fn advance_after_exhaustion_stays_terminal() {
        let mut walker = PageWalker::new(1, 100);
        assert_eq!(walker.advance(0), WalkState::Exhausted);
        assert_eq!(walker.advance(50), WalkState::Exhausted);
    }
}
