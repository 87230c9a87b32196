//! Sequence sets.

use super::SeqNum;

/// A set of message sequence numbers in IMAP `sequence-set` syntax.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SequenceSet {
    /// One message.
    Single(SeqNum),
    /// Inclusive range.
    Range(SeqNum, SeqNum),
    /// Comma-separated union.
    Set(Vec<Self>),
}

impl SequenceSet {
    /// Creates a single-message set.
    #[must_use]
    pub fn single(n: u32) -> Option<Self> {
        SeqNum::new(n).map(Self::Single)
    }

    /// Creates an inclusive range.
    #[must_use]
    pub fn range(start: u32, end: u32) -> Option<Self> {
        Some(Self::Range(SeqNum::new(start)?, SeqNum::new(end)?))
    }

    /// Builds the shortest set covering `seqs`.
    ///
    /// Input order and duplicates do not matter; consecutive numbers collapse
    /// into ranges, so `[9, 1, 2, 3, 7, 10]` becomes `1:3,7,9:10`. Returns
    /// `None` for an empty input since IMAP has no empty sequence set.
    #[must_use]
    pub fn compact(seqs: impl IntoIterator<Item = SeqNum>) -> Option<Self> {
        let mut sorted: Vec<SeqNum> = seqs.into_iter().collect();
        sorted.sort_unstable();
        sorted.dedup();

        let mut parts = Vec::new();
        let mut iter = sorted.into_iter();
        let first = iter.next()?;
        let (mut start, mut end) = (first, first);
        for seq in iter {
            if seq.get() == end.get() + 1 {
                end = seq;
            } else {
                parts.push(Self::span(start, end));
                start = seq;
                end = seq;
            }
        }
        parts.push(Self::span(start, end));

        if parts.len() == 1 {
            parts.pop()
        } else {
            Some(Self::Set(parts))
        }
    }

    /// Returns true if `seq` falls inside the set.
    #[must_use]
    pub fn contains(&self, seq: SeqNum) -> bool {
        match self {
            Self::Single(n) => *n == seq,
            Self::Range(start, end) => {
                let (lo, hi) = if start <= end { (start, end) } else { (end, start) };
                (*lo..=*hi).contains(&seq)
            }
            Self::Set(items) => items.iter().any(|item| item.contains(seq)),
        }
    }

    fn span(start: SeqNum, end: SeqNum) -> Self {
        if start == end {
            Self::Single(start)
        } else {
            Self::Range(start, end)
        }
    }
}

impl std::fmt::Display for SequenceSet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Single(n) => write!(f, "{n}"),
            Self::Range(start, end) => write!(f, "{start}:{end}"),
            Self::Set(items) => {
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        f.write_str(",")?;
                    }
                    write!(f, "{item}")?;
                }
                Ok(())
            }
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn seqs(ns: &[u32]) -> Vec<SeqNum> {
        ns.iter().map(|&n| SeqNum::new(n).unwrap()).collect()
    }

    #[test]
    fn single_and_range() {
        assert_eq!(SequenceSet::single(42).unwrap().to_string(), "42");
        assert_eq!(SequenceSet::range(1, 100).unwrap().to_string(), "1:100");
        assert!(SequenceSet::single(0).is_none());
        assert!(SequenceSet::range(0, 3).is_none());
    }

    #[test]
    fn compact_empty_is_none() {
        assert!(SequenceSet::compact(Vec::new()).is_none());
    }

    #[test]
    fn compact_single() {
        assert_eq!(SequenceSet::compact(seqs(&[5])), SequenceSet::single(5));
    }

    #[test]
    fn compact_groups_runs() {
        let set = SequenceSet::compact(seqs(&[1, 2, 3, 7, 9, 10, 11, 12])).unwrap();
        assert_eq!(set.to_string(), "1:3,7,9:12");
    }

    #[test]
    fn compact_sorts_and_dedups() {
        let set = SequenceSet::compact(seqs(&[9, 3, 1, 2, 3, 10])).unwrap();
        assert_eq!(set.to_string(), "1:3,9:10");
    }

    #[test]
    fn compact_handles_max() {
        let set = SequenceSet::compact(seqs(&[u32::MAX - 1, u32::MAX])).unwrap();
        assert_eq!(set.to_string(), format!("{}:{}", u32::MAX - 1, u32::MAX));
    }

    #[test]
    fn contains_walks_every_part() {
        let set = SequenceSet::compact(seqs(&[1, 2, 3, 7])).unwrap();
        assert!(set.contains(SeqNum::new(2).unwrap()));
        assert!(set.contains(SeqNum::new(7).unwrap()));
        assert!(!set.contains(SeqNum::new(4).unwrap()));

        let reversed = SequenceSet::range(9, 5).unwrap();
        assert!(reversed.contains(SeqNum::new(6).unwrap()));
    }

    fn expand(set: &SequenceSet, out: &mut Vec<u32>) {
        match set {
            SequenceSet::Single(n) => out.push(n.get()),
            SequenceSet::Range(a, b) => out.extend(a.get()..=b.get()),
            SequenceSet::Set(items) => items.iter().for_each(|i| expand(i, out)),
        }
    }

    proptest! {
        #[test]
        fn compact_covers_exactly_the_input(ns in proptest::collection::vec(1u32..500, 1..60)) {
            let set = SequenceSet::compact(seqs(&ns)).unwrap();
            let mut covered = Vec::new();
            expand(&set, &mut covered);

            let mut expected = ns.clone();
            expected.sort_unstable();
            expected.dedup();
            prop_assert_eq!(covered, expected);
        }
    }
}
