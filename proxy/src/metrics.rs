//! Prometheus metrics for the proxy.
//!
//! [`ProxyMetrics`] owns a dedicated [`Registry`] that the `/metrics`
//! endpoint encodes into the Prometheus text exposition format.

use prometheus::{
    register_histogram_with_registry, register_int_counter_vec_with_registry,
    register_int_counter_with_registry, Encoder, Histogram, HistogramOpts, IntCounter,
    IntCounterVec, Opts, Registry, TextEncoder,
};

use crate::error::ProxyError;

pub struct ProxyMetrics {
    pub registry: Registry,

    // ── Counters ────────────────────────────────────────────────────────
    /// Requests received, labelled by endpoint.
    pub requests: IntCounterVec,
    /// Votes whose transaction was mined.
    pub votes_accepted: IntCounter,
    /// Votes rejected by the node or the contract.
    pub votes_failed: IntCounter,
    /// Failed contract reads while listing candidates.
    pub read_failures: IntCounter,

    // ── Histograms ──────────────────────────────────────────────────────
    /// Time to read the full candidate list, in seconds.
    pub candidates_latency_seconds: Histogram,
}

impl ProxyMetrics {
    pub fn new() -> Result<Self, prometheus::Error> {
        let registry = Registry::new();

        let requests = register_int_counter_vec_with_registry!(
            Opts::new("ballot_proxy_requests_total", "HTTP requests by endpoint"),
            &["endpoint"],
            registry
        )?;

        let votes_accepted = register_int_counter_with_registry!(
            Opts::new("ballot_proxy_votes_accepted_total", "Votes mined successfully"),
            registry
        )?;

        let votes_failed = register_int_counter_with_registry!(
            Opts::new("ballot_proxy_votes_failed_total", "Votes that failed or reverted"),
            registry
        )?;

        let read_failures = register_int_counter_with_registry!(
            Opts::new(
                "ballot_proxy_read_failures_total",
                "Contract reads that failed while listing candidates"
            ),
            registry
        )?;

        let candidates_latency_seconds = register_histogram_with_registry!(
            HistogramOpts::new(
                "ballot_proxy_candidates_latency_seconds",
                "Time to read the candidate list from the contract"
            )
            .buckets(prometheus::exponential_buckets(0.01, 2.0, 12)?),
            registry
        )?;

        Ok(Self {
            registry,
            requests,
            votes_accepted,
            votes_failed,
            read_failures,
            candidates_latency_seconds,
        })
    }

    pub fn record_request(&self, endpoint: &str) {
        self.requests.with_label_values(&[endpoint]).inc();
    }

    /// Encode every registered metric in the text exposition format.
    pub fn encode(&self) -> Result<String, ProxyError> {
        let mut buf = Vec::new();
        TextEncoder::new()
            .encode(&self.registry.gather(), &mut buf)
            .map_err(|e| ProxyError::Metrics(e.to_string()))?;
        String::from_utf8(buf).map_err(|e| ProxyError::Metrics(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn counters_appear_in_encoding() {
        let metrics = ProxyMetrics::new().unwrap();
        metrics.record_request("candidates");
        metrics.votes_accepted.inc();
        let text = metrics.encode().unwrap();
        assert!(text.contains("ballot_proxy_requests_total{endpoint=\"candidates\"} 1"));
        assert!(text.contains("ballot_proxy_votes_accepted_total 1"));
    }

    #[test]
    fn registries_are_independent() {
        let a = ProxyMetrics::new().unwrap();
        let b = ProxyMetrics::new().unwrap();
        a.votes_failed.inc();
        assert_eq!(b.votes_failed.get(), 0);
    }
}
