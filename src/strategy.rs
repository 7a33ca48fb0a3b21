//! Strategy chain - cascading extraction methods with early stop
//!
//! A [`Strategy`] is one way of finding candidates in a document, built on one
//! assumption about the document's shape (embedded JSON, classed markup,
//! links, bare text). A [`StrategyChain`] runs them most-structured-first and
//! stops as soon as it has collected enough unique records.

use serde::Serialize;

use crate::dedup::Deduplicator;
use crate::document::Document;
use crate::error::Result;
use crate::window::Neighbours;

/// Something a strategy found that may become a record
pub trait Candidate {
    /// Normalized key; two candidates with the same key are one record
    fn dedup_key(&self) -> String;

    /// Whether the candidate passes validation
    fn is_valid(&self) -> bool;

    /// Byte offset in the document, when the candidate has one
    fn offset(&self) -> Option<usize> {
        None
    }
}

/// One extraction method over the whole document
pub trait Strategy {
    type Output: Candidate;

    /// Stable identifier, used in logs and as the candidate's provenance tag
    fn name(&self) -> &'static str;

    /// Find candidates. An error or an empty list only skips this strategy.
    fn attempt(&self, doc: &Document<'_>) -> Result<Vec<Self::Output>>;
}

/// What one chain run produced
#[derive(Debug, Clone, PartialEq)]
pub struct StrategyResult<R> {
    pub records: Vec<R>,
    /// Every strategy ran; false when the chain stopped at its target
    pub exhausted: bool,
}

impl<R> Default for StrategyResult<R> {
    fn default() -> Self {
        Self {
            records: Vec::new(),
            exhausted: true,
        }
    }
}

/// Ordered strategies sharing one candidate type
pub struct StrategyChain<'a, C> {
    label: &'static str,
    strategies: Vec<Box<dyn Strategy<Output = C> + 'a>>,
}

impl<'a, C: Candidate> StrategyChain<'a, C> {
    /// Empty chain; `label` names the chain in logs
    pub fn new(label: &'static str) -> Self {
        Self {
            label,
            strategies: Vec::new(),
        }
    }

    /// Append a strategy at the lowest priority so far
    pub fn with(mut self, strategy: impl Strategy<Output = C> + 'a) -> Self {
        self.strategies.push(Box::new(strategy));
        self
    }

    pub fn len(&self) -> usize {
        self.strategies.len()
    }

    pub fn is_empty(&self) -> bool {
        self.strategies.is_empty()
    }

    /// Strategy names in priority order
    pub fn names(&self) -> Vec<&'static str> {
        self.strategies.iter().map(|s| s.name()).collect()
    }

    /// Run strategies in order until `target` records exist (0 = no limit).
    ///
    /// Each surviving candidate goes to `assemble` together with the offsets
    /// of the candidates its strategy found just before and after it, so the
    /// caller can keep one record's context out of its neighbours'.
    pub fn run<R>(
        &self,
        doc: &Document<'_>,
        target: usize,
        mut assemble: impl FnMut(C, Neighbours) -> R,
    ) -> StrategyResult<R> {
        let mut dedup = Deduplicator::new();
        let mut records = Vec::new();

        for (index, strategy) in self.strategies.iter().enumerate() {
            let candidates = match strategy.attempt(doc) {
                Ok(candidates) => candidates,
                Err(e) => {
                    tracing::debug!(chain = self.label, strategy = strategy.name(), error = %e, "strategy failed");
                    continue;
                }
            };

            let yielded = candidates.len();
            let mut offsets: Vec<usize> = candidates.iter().filter_map(Candidate::offset).collect();
            offsets.sort_unstable();

            let mut accepted = 0;
            let mut truncated = false;
            for candidate in candidates {
                if target > 0 && records.len() >= target {
                    truncated = true;
                    break;
                }
                if !candidate.is_valid() {
                    continue;
                }
                let key = candidate.dedup_key();
                if !dedup.add(&key) {
                    continue;
                }
                tracing::trace!(chain = self.label, strategy = strategy.name(), key = %key, "candidate accepted");

                let neighbours = match candidate.offset() {
                    Some(offset) => Neighbours::new(
                        previous_before(&offsets, offset),
                        next_after(&offsets, offset),
                    ),
                    None => Neighbours::default(),
                };
                records.push(assemble(candidate, neighbours));
                accepted += 1;
            }

            tracing::debug!(
                chain = self.label,
                strategy = strategy.name(),
                yielded,
                accepted,
                "strategy finished"
            );

            if target > 0 && records.len() >= target {
                let exhausted = !truncated && index + 1 == self.strategies.len();
                return StrategyResult { records, exhausted };
            }
        }

        StrategyResult {
            records,
            exhausted: true,
        }
    }
}

/// Smallest offset strictly greater than `offset`
fn next_after(sorted: &[usize], offset: usize) -> Option<usize> {
    let index = sorted.partition_point(|&o| o <= offset);
    sorted.get(index).copied()
}

/// Largest offset strictly smaller than `offset`
fn previous_before(sorted: &[usize], offset: usize) -> Option<usize> {
    let index = sorted.partition_point(|&o| o < offset);
    index.checked_sub(1).map(|i| sorted[i])
}

/// Caller-facing page of records: the records, a count, and where the next
/// page starts
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Page<T> {
    pub records: Vec<T>,
    pub total_found: usize,
    pub next_cursor: Option<usize>,
    pub exhausted: bool,
}

impl<T> Page<T> {
    /// Wrap a chain result for a document that starts at `cursor`
    pub fn from_result(result: StrategyResult<T>, cursor: usize) -> Self {
        let total_found = result.records.len();
        Self {
            records: result.records,
            total_found,
            next_cursor: next_cursor(cursor, total_found),
            exhausted: result.exhausted,
        }
    }

    /// The valid empty page (empty document, nothing matched)
    pub fn empty() -> Self {
        Self {
            records: Vec::new(),
            total_found: 0,
            next_cursor: None,
            exhausted: true,
        }
    }
}

/// Continuation cursor after returning `returned` records from `cursor`
pub fn next_cursor(cursor: usize, returned: usize) -> Option<usize> {
    (returned > 0).then(|| cursor + returned)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ExtractionConfig;
    use crate::error::GleanError;
    use std::cell::Cell;

    #[derive(Debug, Clone, PartialEq)]
    struct Name(&'static str, usize);

    impl Candidate for Name {
        fn dedup_key(&self) -> String {
            self.0.to_lowercase()
        }
        fn is_valid(&self) -> bool {
            !self.0.is_empty()
        }
        fn offset(&self) -> Option<usize> {
            Some(self.1)
        }
    }

    struct Fixed {
        name: &'static str,
        names: Vec<Name>,
        calls: Cell<usize>,
    }

    impl Fixed {
        fn new(name: &'static str, names: &[&'static str]) -> Self {
            Self {
                name,
                names: names.iter().enumerate().map(|(i, n)| Name(n, i * 10)).collect(),
                calls: Cell::new(0),
            }
        }
    }

    impl Strategy for &Fixed {
        type Output = Name;
        fn name(&self) -> &'static str {
            self.name
        }
        fn attempt(&self, _doc: &Document<'_>) -> Result<Vec<Name>> {
            self.calls.set(self.calls.get() + 1);
            Ok(self.names.clone())
        }
    }

    struct Broken;

    impl Strategy for Broken {
        type Output = Name;
        fn name(&self) -> &'static str {
            "broken"
        }
        fn attempt(&self, _doc: &Document<'_>) -> Result<Vec<Name>> {
            Err(GleanError::Selector("div[".into()))
        }
    }

    fn run(chain: &StrategyChain<'_, Name>, target: usize) -> StrategyResult<&'static str> {
        let config = ExtractionConfig::default();
        let doc = Document::from_markup("<p></p>", &config);
        chain.run(&doc, target, |c, _| c.0)
    }

    #[test]
    fn test_chain_dedups_across_strategies() {
        let first = Fixed::new("first", &["Joe's Pizza", "Luigi's"]);
        let second = Fixed::new("second", &["JOE'S PIZZA", "Mario's"]);
        let chain = StrategyChain::new("test").with(&first).with(&second);

        let result = run(&chain, 0);
        assert_eq!(result.records, vec!["Joe's Pizza", "Luigi's", "Mario's"]);
        assert!(result.exhausted);
    }

    #[test]
    fn test_chain_stops_at_target() {
        let first = Fixed::new("first", &["A1", "B2", "C3"]);
        let second = Fixed::new("second", &["D4"]);
        let chain = StrategyChain::new("test").with(&first).with(&second);

        let result = run(&chain, 2);
        assert_eq!(result.records, vec!["A1", "B2"]);
        assert!(!result.exhausted);
        assert_eq!(second.calls.get(), 0);
    }

    #[test]
    fn test_chain_skips_failing_and_invalid() {
        let good = Fixed::new("good", &["", "Cafe"]);
        let chain = StrategyChain::new("test").with(Broken).with(&good);
        let result = run(&chain, 0);
        assert_eq!(result.records, vec!["Cafe"]);
        assert_eq!(chain.names(), vec!["broken", "good"]);
    }

    #[test]
    fn test_chain_passes_neighbour_offsets() {
        let first = Fixed::new("first", &["A1", "B2", "C3"]);
        let chain = StrategyChain::new("test").with(&first);
        let config = ExtractionConfig::default();
        let doc = Document::from_markup("", &config);
        let result = chain.run(&doc, 0, |c, around| (c.1, around.previous, around.next));
        assert_eq!(
            result.records,
            vec![(0, None, Some(10)), (10, Some(0), Some(20)), (20, Some(10), None)]
        );
    }

    #[test]
    fn test_target_inside_last_strategy_is_not_exhausted() {
        let only = Fixed::new("only", &["A1", "B2", "C3"]);
        let chain = StrategyChain::new("test").with(&only);

        let result = run(&chain, 2);
        assert_eq!(result.records, vec!["A1", "B2"]);
        assert!(!result.exhausted);

        let result = run(&chain, 3);
        assert_eq!(result.records.len(), 3);
        assert!(result.exhausted);
    }

    #[test]
    fn test_empty_chain_is_exhausted() {
        let chain: StrategyChain<'_, Name> = StrategyChain::new("empty");
        let result = run(&chain, 5);
        assert!(result.records.is_empty());
        assert!(result.exhausted);
    }

    #[test]
    fn test_page_cursor() {
        let page = Page::from_result(
            StrategyResult {
                records: vec![1, 2, 3],
                exhausted: false,
            },
            20,
        );
        assert_eq!(page.total_found, 3);
        assert_eq!(page.next_cursor, Some(23));

        let empty: Page<u8> = Page::from_result(StrategyResult::default(), 20);
        assert_eq!(empty.next_cursor, None);
        assert_eq!(Page::<u8>::empty(), empty);
    }
}
