use crate::error::{invalid, QapResult};
use std::collections::HashMap;
use std::fs::File;
use std::io::Read;
use std::path::Path;
use tracing::{debug, info};

/// Source of sequence frequencies used to build the flow matrix.
pub trait FrequencyOracle {
    fn frequency(&self, key: &str) -> f64;
}

impl<F: Fn(&str) -> f64> FrequencyOracle for F {
    fn frequency(&self, key: &str) -> f64 {
        self(key)
    }
}

/// Raw n-gram counts with a `1 / N` estimate for keys never observed.
#[derive(Debug, Clone, Default)]
pub struct BigramTable {
    counts: HashMap<String, u64>,
    total: f64,
}

impl BigramTable {
    pub fn from_pairs<I, S>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (S, u64)>,
        S: Into<String>,
    {
        let mut counts: HashMap<String, u64> = HashMap::new();
        for (key, count) in pairs {
            *counts.entry(key.into()).or_insert(0) += count;
        }
        let total = counts.values().map(|&c| c as f64).sum();
        Self { counts, total }
    }

    /// Reads `key<TAB>count` lines. Repeated keys accumulate; malformed rows
    /// are skipped.
    pub fn from_reader<R: Read>(reader: R) -> QapResult<Self> {
        let mut rdr = csv::ReaderBuilder::new()
            .delimiter(b'\t')
            .has_headers(false)
            .flexible(true)
            .quoting(false)
            .from_reader(reader);

        let mut pairs = Vec::new();
        let mut skipped = 0usize;

        for record in rdr.records() {
            let record = record?;
            if record.len() < 2 {
                skipped += 1;
                continue;
            }
            match record[1].trim().parse::<u64>() {
                Ok(count) if !record[0].is_empty() => pairs.push((record[0].to_string(), count)),
                _ => skipped += 1,
            }
        }

        if skipped > 0 {
            debug!("Skipped {} malformed n-gram rows", skipped);
        }

        let table = Self::from_pairs(pairs);
        if table.total <= 0.0 {
            return invalid("n-gram table is empty or sums to zero");
        }
        Ok(table)
    }

    pub fn load_from_file<P: AsRef<Path>>(path: P) -> QapResult<Self> {
        let path = path.as_ref();
        let table = Self::from_reader(File::open(path)?)?;
        info!(
            "Loaded {} n-grams ({:.3e} total) from {}",
            table.len(),
            table.total,
            path.display()
        );
        Ok(table)
    }

    pub fn len(&self) -> usize {
        self.counts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.counts.is_empty()
    }

    pub fn total(&self) -> f64 {
        self.total
    }
}

impl FrequencyOracle for BigramTable {
    fn frequency(&self, key: &str) -> f64 {
        match self.counts.get(key) {
            Some(&count) => count as f64,
            None if self.total > 0.0 => 1.0 / self.total,
            None => 0.0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn test_counts_accumulate() {
        let data = "th\t100\nhe\t50\nth\t25\n";
        let table = BigramTable::from_reader(Cursor::new(data)).unwrap();
        assert_eq!(table.len(), 2);
        assert_eq!(table.frequency("th"), 125.0);
        assert_eq!(table.total(), 175.0);
    }

    #[test]
    fn test_missing_key_estimate() {
        let table = BigramTable::from_pairs([("ab", 3u64), ("ba", 1u64)]);
        assert_eq!(table.frequency("zz"), 0.25);
    }

    #[test]
    fn test_malformed_rows_skipped() {
        let data = "ab\t10\nbroken\nba\tNaN\ncd\t 5 \n";
        let table = BigramTable::from_reader(Cursor::new(data)).unwrap();
        assert_eq!(table.len(), 2);
        assert_eq!(table.frequency("cd"), 5.0);
    }

    #[test]
    fn test_empty_table_rejected() {
        assert!(BigramTable::from_reader(Cursor::new("")).is_err());
    }

    #[test]
    fn test_closure_oracle() {
        let oracle = |k: &str| k.len() as f64;
        assert_eq!(oracle.frequency("abc"), 3.0);
    }
}
