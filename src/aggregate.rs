use std::{
    collections::HashMap,
    io::BufRead,
    path::Path,
    sync::atomic::{AtomicBool, Ordering},
};

use crate::{
    error::{Error, Result},
    parser::LogParser,
};

/// Durations of one URL, in log order
#[derive(Debug, Clone, PartialEq)]
pub struct UrlBucket {
    pub url: String,
    pub durations: Vec<f64>,
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct ParseTally {
    pub total: u64,
    pub parsed: u64,
}

impl ParseTally {
    /// Share of lines that did not yield an entry. An empty log has ratio 0.
    pub fn failure_ratio(&self) -> f64 {
        if self.total == 0 {
            return 0.0;
        }
        1.0 - self.parsed as f64 / self.total as f64
    }

    /// True when the failed share is strictly above `percent`. Compared in
    /// integers so a ratio equal to the threshold never counts.
    pub fn exceeds(&self, percent: u8) -> bool {
        let failed = self.total.saturating_sub(self.parsed);
        failed * 100 > u64::from(percent) * self.total
    }
}

/// Everything one pass over the log produces
#[derive(Debug, Default)]
pub struct Aggregation {
    /// Buckets in order of first appearance
    pub buckets: Vec<UrlBucket>,
    pub tally: ParseTally,
}

#[derive(Default)]
struct Aggregator {
    index: HashMap<String, usize>,
    buckets: Vec<UrlBucket>,
    tally: ParseTally,
}

impl Aggregator {
    fn push(&mut self, url: String, duration: f64) {
        match self.index.get(&url) {
            Some(&i) => self.buckets[i].durations.push(duration),
            None => {
                self.index.insert(url.clone(), self.buckets.len());
                self.buckets.push(UrlBucket {
                    url,
                    durations: vec![duration],
                });
            }
        }
    }

    fn finish(self) -> Aggregation {
        Aggregation {
            buckets: self.buckets,
            tally: self.tally,
        }
    }
}

/// Group request times by URL over every line of `reader`.
///
/// `source` only names the log in errors. Lines are decoded lossily so stray
/// bytes in a line cost that line, not the run. The `interrupted` flag is
/// polled once per line.
pub fn aggregate_lines<R, P>(
    mut reader: R,
    source: &Path,
    parser: &P,
    interrupted: &AtomicBool,
) -> Result<Aggregation>
where
    R: BufRead,
    P: LogParser + ?Sized,
{
    let mut aggregator = Aggregator::default();
    let mut buf = Vec::new();
    loop {
        if interrupted.load(Ordering::Relaxed) {
            return Err(Error::Interrupted);
        }
        buf.clear();
        let n = reader
            .read_until(b'\n', &mut buf)
            .map_err(|e| Error::io(source, e))?;
        if n == 0 {
            break;
        }
        aggregator.tally.total += 1;
        let line = String::from_utf8_lossy(&buf);
        if let Some(entry) = parser.parse(line.trim_end_matches(['\n', '\r'])) {
            aggregator.tally.parsed += 1;
            aggregator.push(entry.url, entry.duration);
        }
    }
    Ok(aggregator.finish())
}
