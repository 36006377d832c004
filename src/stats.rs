use serde::{Serialize, Serializer};

use crate::aggregate::UrlBucket;

/// One row of the report
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UrlStats {
    pub url: String,
    pub count: u64,
    #[serde(serialize_with = "round3")]
    pub count_perc: f64,
    #[serde(serialize_with = "round3")]
    pub time_sum: f64,
    #[serde(serialize_with = "round3")]
    pub time_perc: f64,
    #[serde(serialize_with = "round3")]
    pub time_avg: f64,
    #[serde(serialize_with = "round3")]
    pub time_max: f64,
    #[serde(serialize_with = "round3")]
    pub time_med: f64,
}

fn round3<S: Serializer>(value: &f64, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_f64((value * 1000.0).round() / 1000.0)
}

/// Whole-log totals used as percentage denominators
#[derive(Debug, Default, Clone, Copy, PartialEq)]
pub struct Totals {
    pub count: u64,
    pub time: f64,
}

fn usable(durations: &[f64]) -> impl Iterator<Item = f64> + '_ {
    durations.iter().copied().filter(|d| d.is_finite())
}

fn percent(part: f64, whole: f64) -> f64 {
    if whole == 0.0 {
        0.0
    } else {
        part / whole * 100.0
    }
}

/// Lower-middle element of the sorted values: index `n / 2`
fn median(sorted: &[f64]) -> f64 {
    if sorted.is_empty() {
        return 0.0;
    }
    sorted[sorted.len() / 2]
}

pub fn totals(buckets: &[UrlBucket]) -> Totals {
    buckets
        .iter()
        .flat_map(|b| usable(&b.durations))
        .fold(Totals::default(), |acc, d| Totals {
            count: acc.count + 1,
            time: acc.time + d,
        })
}

fn url_stats(bucket: &UrlBucket, totals: &Totals) -> UrlStats {
    let mut times: Vec<f64> = usable(&bucket.durations).collect();
    if times.len() != bucket.durations.len() {
        tracing::debug!(
            "{}: excluded {} non-finite durations",
            bucket.url,
            bucket.durations.len() - times.len()
        );
    }
    times.sort_by(f64::total_cmp);

    let count = times.len() as u64;
    let time_sum: f64 = times.iter().sum();
    let time_avg = if count == 0 {
        0.0
    } else {
        time_sum / count as f64
    };
    UrlStats {
        url: bucket.url.clone(),
        count,
        count_perc: percent(count as f64, totals.count as f64),
        time_sum,
        time_perc: percent(time_sum, totals.time),
        time_avg,
        time_max: times.last().copied().unwrap_or(0.0),
        time_med: median(&times),
    }
}

/// Compute per-URL statistics ranked by total time, longest first.
///
/// Ties keep bucket order. At most `limit` rows are returned.
pub fn compute(buckets: &[UrlBucket], limit: usize) -> Vec<UrlStats> {
    let totals = totals(buckets);
    let mut stats: Vec<UrlStats> = buckets.iter().map(|b| url_stats(b, &totals)).collect();
    stats.sort_by(|a, b| b.time_sum.total_cmp(&a.time_sum));
    stats.truncate(limit);

    tracing::debug!(
        "Computed statistics: {} URLs, {} requests, {:.3}s total",
        buckets.len(),
        totals.count,
        totals.time
    );
    stats
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_log::test;

    fn bucket(url: &str, durations: &[f64]) -> UrlBucket {
        UrlBucket {
            url: url.to_string(),
            durations: durations.to_vec(),
        }
    }

    #[test]
    fn test_median_lower_middle() {
        let stats = compute(&[bucket("/odd", &[5.0, 1.0, 4.0, 2.0, 3.0])], 10);
        assert_eq!(stats[0].time_med, 3.0);

        let stats = compute(&[bucket("/odd", &[1.1, 2.2, 3.3, 4.4, 5.5])], 10);
        assert_eq!(stats[0].time_med, 3.3);

        // even length takes index n / 2 of the sorted list
        let stats = compute(&[bucket("/even", &[4.0, 1.0, 3.0, 2.0])], 10);
        assert_eq!(stats[0].time_med, 3.0);
    }

    #[test]
    fn test_ranking_by_time_sum() {
        let buckets = [
            bucket("A", &[2.0, 3.0]),
            bucket("B", &[10.0]),
            bucket("C", &[0.5, 0.25, 0.25]),
        ];
        let stats = compute(&buckets, 10);
        let urls: Vec<_> = stats.iter().map(|s| s.url.as_str()).collect();
        assert_eq!(urls, vec!["B", "A", "C"]);
    }

    #[test]
    fn test_ties_keep_encounter_order() {
        let buckets = [
            bucket("first", &[1.0]),
            bucket("big", &[9.0]),
            bucket("second", &[1.0]),
        ];
        let stats = compute(&buckets, 10);
        let urls: Vec<_> = stats.iter().map(|s| s.url.as_str()).collect();
        assert_eq!(urls, vec!["big", "first", "second"]);
    }

    #[test]
    fn test_fields_and_totals_invariant() {
        let buckets = [
            bucket("/a", &[0.1, 0.2, 0.3]),
            bucket("/b", &[1.0]),
            bucket("/c", &[0.05, 0.15]),
        ];
        let stats = compute(&buckets, 10);

        let b = &stats[0];
        assert_eq!(b.url, "/b");
        assert_eq!(b.count, 1);
        assert!((b.count_perc - 100.0 / 6.0).abs() < 1e-9);
        assert!((b.time_perc - 100.0 / 1.8).abs() < 1e-9);

        let a = &stats[1];
        assert_eq!(a.count, 3);
        assert!((a.time_sum - 0.6).abs() < 1e-9);
        assert!((a.time_avg - 0.2).abs() < 1e-9);
        assert_eq!(a.time_max, 0.3);
        assert_eq!(a.time_med, 0.2);

        let total_count: u64 = stats.iter().map(|s| s.count).sum();
        let total_time: f64 = stats.iter().map(|s| s.time_sum).sum();
        assert_eq!(total_count, 6);
        assert!((total_time - 1.8).abs() < 1e-9);
        let perc: f64 = stats.iter().map(|s| s.time_perc).sum();
        assert!((perc - 100.0).abs() < 1e-9);
    }

    #[test]
    fn test_truncate_to_limit() {
        let buckets = [bucket("/a", &[1.0]), bucket("/b", &[2.0]), bucket("/c", &[3.0])];
        assert_eq!(compute(&buckets, 2).len(), 2);
        assert_eq!(compute(&buckets, 100).len(), 3);
        assert!(compute(&buckets, 0).is_empty());
    }

    #[test]
    fn test_degenerate_denominators() {
        assert!(compute(&[], 10).is_empty());

        let stats = compute(&[bucket("/zero", &[0.0, 0.0])], 10);
        assert_eq!(stats[0].count, 2);
        assert_eq!(stats[0].time_perc, 0.0);
        assert_eq!(stats[0].count_perc, 100.0);
    }

    #[test]
    fn test_bad_values_excluded_bucket_kept() {
        let buckets = [
            bucket("/mixed", &[1.0, f64::NAN, 3.0]),
            bucket("/broken", &[f64::INFINITY]),
        ];
        let stats = compute(&buckets, 10);
        assert_eq!(stats.len(), 2);
        assert_eq!(stats[0].url, "/mixed");
        assert_eq!(stats[0].count, 2);
        assert_eq!(stats[0].time_sum, 4.0);
        assert_eq!(stats[0].time_max, 3.0);

        let broken = &stats[1];
        assert_eq!(broken.count, 0);
        assert_eq!(broken.time_sum, 0.0);
        assert_eq!(broken.time_avg, 0.0);
        assert_eq!(broken.time_med, 0.0);
    }

    #[test]
    fn test_json_rounding() {
        let stats = compute(&[bucket("/a", &[0.1234, 0.2])], 10);
        let json = serde_json::to_value(&stats[0]).unwrap();
        assert_eq!(json["time_sum"], serde_json::json!(0.323));
        assert_eq!(json["time_max"], serde_json::json!(0.2));
        assert_eq!(json["count"], serde_json::json!(2));
        assert_eq!(json["url"], serde_json::json!("/a"));
    }
}
