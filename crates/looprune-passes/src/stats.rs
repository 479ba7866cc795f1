//! Optimization statistics.

use std::collections::BTreeMap;
use std::fmt;

use derive_more::Display;

/// Events a pass can report.
#[derive(Clone, Copy, Debug, Display, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum CompilationStat {
    /// A loop with no observable effect was deleted.
    #[display("RemoveUnusedLoops")]
    RemoveUnusedLoops,
    /// An instruction with an unused result was deleted.
    #[display("DeadInstructionRemoved")]
    DeadInstructionRemoved,
}

/// Receiver for statistics. Passes take it optionally; results never
/// depend on whether one is attached.
pub trait StatsSink {
    fn record(&mut self, stat: CompilationStat);
}

/// Counts each statistic.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CompilationStats {
    counts: BTreeMap<CompilationStat, usize>,
}

impl CompilationStats {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, stat: CompilationStat) -> usize {
        self.counts.get(&stat).copied().unwrap_or(0)
    }

    /// Record `count` occurrences at once.
    pub fn add(&mut self, stat: CompilationStat, count: usize) {
        if count > 0 {
            *self.counts.entry(stat).or_default() += count;
        }
    }

    pub fn is_empty(&self) -> bool {
        self.counts.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (CompilationStat, usize)> + '_ {
        self.counts.iter().map(|(&stat, &count)| (stat, count))
    }
}

impl StatsSink for CompilationStats {
    fn record(&mut self, stat: CompilationStat) {
        self.add(stat, 1);
    }
}

impl fmt::Display for CompilationStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (stat, count) in self.iter() {
            writeln!(f, "{stat}: {count}")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn counts_and_display() {
        let mut stats = CompilationStats::new();
        assert!(stats.is_empty());

        stats.record(CompilationStat::RemoveUnusedLoops);
        stats.record(CompilationStat::RemoveUnusedLoops);
        stats.add(CompilationStat::DeadInstructionRemoved, 3);
        stats.add(CompilationStat::DeadInstructionRemoved, 0);

        assert_eq!(stats.get(CompilationStat::RemoveUnusedLoops), 2);
        assert_eq!(stats.get(CompilationStat::DeadInstructionRemoved), 3);
        assert_eq!(
            stats.to_string(),
            "RemoveUnusedLoops: 2\nDeadInstructionRemoved: 3\n"
        );
    }
}
