// This file is part of RadarStore.
//
// Copyright (C) 2025 Matheus Cardoso <varvedb@matheus.sbs>
//
// This Source Code Form is subject to the terms of the Mozilla Public License
// v. 2.0. If a copy of the MPL was not distributed with this file, You can
// obtain one at http://mozilla.org/MPL/2.0/.

use prometheus::{Histogram, HistogramOpts, IntCounterVec, Opts, Registry};

/// Prometheus metrics for RadarStore.
///
/// # Metrics
/// - `radar_sequence_allocations_total{kind}`: values issued per kind.
/// - `radar_entities_persisted_total{kind}`: entities stored under an allocated key.
/// - `radar_sequence_allocate_duration_seconds`: latency of single allocations.
#[derive(Debug, Clone)]
pub struct StoreMetrics {
    pub allocations: IntCounterVec,
    pub entities_persisted: IntCounterVec,
    pub allocate_latency: Histogram,
}

impl StoreMetrics {
    pub fn new(registry: &Registry) -> Result<Self, prometheus::Error> {
        let allocations = IntCounterVec::new(
            Opts::new(
                "radar_sequence_allocations_total",
                "Total number of sequence values issued",
            ),
            &["kind"],
        )?;
        let entities_persisted = IntCounterVec::new(
            Opts::new(
                "radar_entities_persisted_total",
                "Total number of entities stored under an allocated key",
            ),
            &["kind"],
        )?;
        let allocate_latency = Histogram::with_opts(HistogramOpts::new(
            "radar_sequence_allocate_duration_seconds",
            "Duration of sequence allocations",
        ))?;

        registry.register(Box::new(allocations.clone()))?;
        registry.register(Box::new(entities_persisted.clone()))?;
        registry.register(Box::new(allocate_latency.clone()))?;

        Ok(Self {
            allocations,
            entities_persisted,
            allocate_latency,
        })
    }
}
