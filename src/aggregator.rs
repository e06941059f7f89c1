//! Per-endpoint aggregation
//!
//! Folds canonical requests into one [`EndpointAggregate`] per endpoint and
//! projects them into [`EndpointStats`] sorted by endpoint name.
//!
//! Status code counts keep first-encountered order so that "most common status"
//! ties resolve to the code seen first. With the `parallel` feature, contiguous
//! chunks are folded on the rayon pool and merged in chunk order, which keeps
//! the same first-encountered order as the sequential fold.

use crate::models::{round_to, CanonicalRequest, EndpointStats};
use std::collections::{BTreeMap, HashMap};

#[cfg(feature = "parallel")]
use rayon::prelude::*;

#[cfg(feature = "parallel")]
const PARALLEL_CHUNK_SIZE: usize = 4096;

/// Insertion-ordered frequency counter
#[derive(Debug, Clone)]
pub struct OrderedCounter<K> {
    entries: Vec<(K, usize)>,
    index: HashMap<K, usize>,
}

impl<K> Default for OrderedCounter<K> {
    fn default() -> Self {
        Self {
            entries: Vec::new(),
            index: HashMap::new(),
        }
    }
}

impl<K: PartialEq> PartialEq for OrderedCounter<K> {
    fn eq(&self, other: &Self) -> bool {
        self.entries == other.entries
    }
}

impl<K> OrderedCounter<K>
where
    K: Clone + Eq + std::hash::Hash,
{
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, key: K, count: usize) {
        match self.index.get(&key) {
            Some(&slot) => self.entries[slot].1 += count,
            None => {
                self.index.insert(key.clone(), self.entries.len());
                self.entries.push((key, count));
            }
        }
    }

    pub fn increment(&mut self, key: K) {
        self.add(key, 1);
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Entries by descending count; equal counts keep first-encountered order
    pub fn most_common(&self, n: usize) -> Vec<(K, usize)> {
        let mut ranked = self.entries.clone();
        ranked.sort_by(|a, b| b.1.cmp(&a.1));
        ranked.truncate(n);
        ranked
    }

    /// Fold another counter in, appending keys this one has not seen yet
    pub fn merge(&mut self, other: OrderedCounter<K>) {
        for (key, count) in other.entries {
            self.add(key, count);
        }
    }
}

/// Running statistics for a single endpoint
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EndpointAggregate {
    pub count: usize,
    pub sum_response_time_ms: u128,
    pub slowest_ms: Option<u64>,
    pub fastest_ms: Option<u64>,
    pub error_count: usize,
    pub status_counts: OrderedCounter<u64>,
}

impl EndpointAggregate {
    pub fn record(&mut self, request: &CanonicalRequest) {
        let rt = request.response_time_ms;
        self.count += 1;
        self.sum_response_time_ms += u128::from(rt);
        self.slowest_ms = Some(self.slowest_ms.map_or(rt, |s| s.max(rt)));
        self.fastest_ms = Some(self.fastest_ms.map_or(rt, |f| f.min(rt)));
        if request.is_error() {
            self.error_count += 1;
        }
        self.status_counts.increment(request.status_code);
    }

    /// Merge an aggregate built from later input into this one
    pub fn merge(&mut self, other: EndpointAggregate) {
        self.count += other.count;
        self.sum_response_time_ms += other.sum_response_time_ms;
        self.slowest_ms = match (self.slowest_ms, other.slowest_ms) {
            (Some(a), Some(b)) => Some(a.max(b)),
            (a, b) => a.or(b),
        };
        self.fastest_ms = match (self.fastest_ms, other.fastest_ms) {
            (Some(a), Some(b)) => Some(a.min(b)),
            (a, b) => a.or(b),
        };
        self.error_count += other.error_count;
        self.status_counts.merge(other.status_counts);
    }

    pub fn average_response_time_ms(&self) -> f64 {
        if self.count == 0 {
            return 0.0;
        }
        self.sum_response_time_ms as f64 / self.count as f64
    }

    pub fn most_common_status(&self) -> Option<u64> {
        self.status_counts.most_common(1).first().map(|(code, _)| *code)
    }

    fn into_stats(self, endpoint: String) -> EndpointStats {
        EndpointStats {
            endpoint,
            request_count: self.count,
            avg_response_time_ms: round_to(self.average_response_time_ms(), 3),
            slowest_request_ms: self.slowest_ms.unwrap_or(0),
            fastest_request_ms: self.fastest_ms.unwrap_or(0),
            error_count: self.error_count,
            most_common_status: self.most_common_status(),
        }
    }
}

fn fold(requests: &[CanonicalRequest]) -> BTreeMap<String, EndpointAggregate> {
    let mut by_endpoint: BTreeMap<String, EndpointAggregate> = BTreeMap::new();
    for request in requests {
        match by_endpoint.get_mut(&request.endpoint) {
            Some(aggregate) => aggregate.record(request),
            None => {
                let mut aggregate = EndpointAggregate::default();
                aggregate.record(request);
                by_endpoint.insert(request.endpoint.clone(), aggregate);
            }
        }
    }
    by_endpoint
}

/// Group requests by endpoint
#[cfg(not(feature = "parallel"))]
pub fn aggregate(requests: &[CanonicalRequest]) -> BTreeMap<String, EndpointAggregate> {
    fold(requests)
}

/// Group requests by endpoint, folding chunks in parallel
#[cfg(feature = "parallel")]
pub fn aggregate(requests: &[CanonicalRequest]) -> BTreeMap<String, EndpointAggregate> {
    let partials: Vec<_> = requests.par_chunks(PARALLEL_CHUNK_SIZE).map(fold).collect();

    // Sequential reduce in chunk order keeps first-encountered status order
    let mut merged: BTreeMap<String, EndpointAggregate> = BTreeMap::new();
    for partial in partials {
        for (endpoint, aggregate) in partial {
            merged.entry(endpoint).or_default().merge(aggregate);
        }
    }
    merged
}

/// Per-endpoint statistics sorted by endpoint name
pub fn endpoint_stats(requests: &[CanonicalRequest]) -> Vec<EndpointStats> {
    aggregate(requests)
        .into_iter()
        .map(|(endpoint, aggregate)| aggregate.into_stats(endpoint))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    fn request(endpoint: &str, rt: u64, status: u64) -> CanonicalRequest {
        CanonicalRequest {
            timestamp: Utc.with_ymd_and_hms(2025, 1, 15, 10, 0, 0).unwrap(),
            endpoint: endpoint.to_string(),
            method: "GET".to_string(),
            response_time_ms: rt,
            status_code: status,
            user_id: "u1".to_string(),
            request_size_bytes: 100,
            response_size_bytes: 100,
        }
    }

    #[test]
    fn test_endpoint_stats_sorted_and_computed() {
        let requests = vec![
            request("/b", 100, 200),
            request("/a", 300, 500),
            request("/b", 200, 404),
            request("/a", 100, 200),
            request("/a", 101, 500),
        ];
        let stats = endpoint_stats(&requests);
        assert_eq!(stats.len(), 2);
        assert_eq!(stats[0].endpoint, "/a");
        assert_eq!(stats[0].request_count, 3);
        assert_eq!(stats[0].avg_response_time_ms, 167.0);
        assert_eq!(stats[0].slowest_request_ms, 300);
        assert_eq!(stats[0].fastest_request_ms, 100);
        assert_eq!(stats[0].error_count, 2);
        assert_eq!(stats[0].most_common_status, Some(500));

        assert_eq!(stats[1].endpoint, "/b");
        assert_eq!(stats[1].avg_response_time_ms, 150.0);
        assert_eq!(stats[1].error_count, 1);
    }

    #[test]
    fn test_most_common_status_tie_uses_first_seen() {
        let requests = vec![
            request("/a", 1, 503),
            request("/a", 1, 200),
            request("/a", 1, 200),
            request("/a", 1, 503),
        ];
        let stats = endpoint_stats(&requests);
        assert_eq!(stats[0].most_common_status, Some(503));
    }

    #[test]
    fn test_average_rounded_to_three_places() {
        let requests = vec![request("/a", 1, 200), request("/a", 1, 200), request("/a", 2, 200)];
        let stats = endpoint_stats(&requests);
        assert_eq!(stats[0].avg_response_time_ms, 1.333);
    }

    #[test]
    fn test_merge_matches_sequential_fold() {
        let requests: Vec<_> = (0..50)
            .map(|i| request(if i % 3 == 0 { "/x" } else { "/y" }, i, 200 + (i % 4) * 100))
            .collect();
        let whole = fold(&requests);

        let mut merged = fold(&requests[..17]);
        for (endpoint, aggregate) in fold(&requests[17..]) {
            merged.entry(endpoint).or_default().merge(aggregate);
        }
        assert_eq!(merged, whole);
    }

    #[test]
    fn test_ordered_counter_most_common() {
        let mut counter = OrderedCounter::new();
        for key in ["b", "a", "c", "a", "b"] {
            counter.increment(key);
        }
        assert_eq!(counter.len(), 3);
        assert_eq!(counter.most_common(2), vec![("b", 2), ("a", 2)]);
    }
}
