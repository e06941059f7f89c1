//! Cost estimation
//!
//! Three-part cost model applied per request:
//! - a flat per-request rate
//! - a per-millisecond execution rate on the response time
//! - a memory bracket cost keyed on the response size
//!
//! Totals are summed per request in input order, then rounded to 6 decimals.

use crate::config::{CostConfig, SeverityThresholds};
use crate::models::{round_to, CanonicalRequest, CostAnalysis, CostBreakdown, EndpointCost, EndpointStats};
use std::collections::BTreeMap;

pub struct CostEstimator<'a> {
    model: &'a CostConfig,
    response_time_thresholds: &'a SeverityThresholds,
}

impl<'a> CostEstimator<'a> {
    pub fn new(model: &'a CostConfig, response_time_thresholds: &'a SeverityThresholds) -> Self {
        Self {
            model,
            response_time_thresholds,
        }
    }

    /// Bracket cost for a response size; sizes outside every bracket cost nothing
    pub fn memory_cost(&self, response_size_bytes: u64) -> f64 {
        self.model
            .memory_brackets
            .iter()
            .find(|bracket| bracket.contains(response_size_bytes))
            .map_or(0.0, |bracket| bracket.cost_usd)
    }

    pub fn execution_cost(&self, response_time_ms: u64) -> f64 {
        response_time_ms as f64 * self.model.per_ms_execution_usd
    }

    /// Full cost of a single request
    pub fn request_cost(&self, request: &CanonicalRequest) -> f64 {
        self.model.per_request_usd
            + self.execution_cost(request.response_time_ms)
            + self.memory_cost(request.response_size_bytes)
    }

    pub fn estimate(&self, requests: &[CanonicalRequest], endpoint_stats: &[EndpointStats]) -> CostAnalysis {
        let request_costs = requests.len() as f64 * self.model.per_request_usd;
        let execution_costs: f64 = requests
            .iter()
            .map(|r| self.execution_cost(r.response_time_ms))
            .sum();
        let memory_costs: f64 = requests
            .iter()
            .map(|r| self.memory_cost(r.response_size_bytes))
            .sum();

        let mut by_endpoint: BTreeMap<&str, (usize, f64)> = BTreeMap::new();
        for request in requests {
            let entry = by_endpoint.entry(request.endpoint.as_str()).or_insert((0, 0.0));
            entry.0 += 1;
            entry.1 += self.request_cost(request);
        }

        let cost_by_endpoint = by_endpoint
            .into_iter()
            .map(|(endpoint, (count, total))| EndpointCost {
                endpoint: endpoint.to_string(),
                total_cost: round_to(total, 6),
                cost_per_request: round_to(total / count as f64, 6),
            })
            .collect();

        CostAnalysis {
            total_cost_usd: round_to(request_costs + execution_costs + memory_costs, 6),
            cost_breakdown: CostBreakdown {
                request_costs: round_to(request_costs, 6),
                execution_costs: round_to(execution_costs, 6),
                memory_costs: round_to(memory_costs, 6),
            },
            cost_by_endpoint,
            optimization_potential_usd: round_to(self.optimization_potential(endpoint_stats), 6),
        }
    }

    /// Execution cost saved if every slow endpoint ran at the medium threshold
    pub fn optimization_potential(&self, endpoint_stats: &[EndpointStats]) -> f64 {
        let target_ms = self.response_time_thresholds.medium;
        endpoint_stats
            .iter()
            .filter(|stats| stats.avg_response_time_ms > target_ms)
            .map(|stats| {
                (stats.avg_response_time_ms - target_ms)
                    * self.model.per_ms_execution_usd
                    * stats.request_count as f64
            })
            .sum()
    }
}

pub fn estimate_cost(
    requests: &[CanonicalRequest],
    endpoint_stats: &[EndpointStats],
    model: &CostConfig,
    response_time_thresholds: &SeverityThresholds,
) -> CostAnalysis {
    CostEstimator::new(model, response_time_thresholds).estimate(requests, endpoint_stats)
}
