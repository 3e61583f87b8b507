use crate::asset::Asset;
use std::collections::{HashMap, VecDeque};

/// A fixed-capacity sliding window of `f64` samples, oldest first.
///
/// Grounded in the teacher's `MarketDataBuffer` rolling-window idea
/// (`gb-types::strategy`), but kept to the single numeric domain the spec
/// calls for: raw `f64`, not `Decimal`, since these are statistical inputs
/// (indicators) rather than money.
#[derive(Debug, Clone)]
pub struct PriceSeries {
    capacity: usize,
    values: VecDeque<f64>,
}

impl PriceSeries {
    pub fn new(capacity: usize) -> Self {
        assert!(capacity > 0, "PriceSeries capacity must be positive");
        Self {
            capacity,
            values: VecDeque::with_capacity(capacity),
        }
    }

    pub fn add(&mut self, value: f64) {
        if self.values.len() == self.capacity {
            self.values.pop_front();
        }
        self.values.push_back(value);
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// True once the window holds `capacity` samples.
    pub fn filled(&self) -> bool {
        self.values.len() == self.capacity
    }

    /// Values oldest-first, the insertion order.
    pub fn values(&self) -> Vec<f64> {
        self.values.iter().copied().collect()
    }

    pub fn last(&self) -> Option<f64> {
        self.values.back().copied()
    }

    pub fn mean(&self) -> Option<f64> {
        if self.values.is_empty() {
            return None;
        }
        Some(self.values.iter().sum::<f64>() / self.values.len() as f64)
    }

    pub fn std_dev(&self) -> Option<f64> {
        if self.values.len() < 2 {
            return None;
        }
        let mean = self.mean()?;
        let variance = self.values.iter().map(|v| (v - mean).powi(2)).sum::<f64>()
            / (self.values.len() - 1) as f64;
        Some(variance.sqrt())
    }
}

/// The five parallel OHLCV windows for a single asset.
#[derive(Debug, Clone)]
pub struct PriceBarSeries {
    pub open: PriceSeries,
    pub high: PriceSeries,
    pub low: PriceSeries,
    pub close: PriceSeries,
    pub volume: PriceSeries,
}

impl PriceBarSeries {
    pub fn new(capacity: usize) -> Self {
        Self {
            open: PriceSeries::new(capacity),
            high: PriceSeries::new(capacity),
            low: PriceSeries::new(capacity),
            close: PriceSeries::new(capacity),
            volume: PriceSeries::new(capacity),
        }
    }

    pub fn add(&mut self, open: f64, high: f64, low: f64, close: f64, volume: f64) {
        self.open.add(open);
        self.high.add(high);
        self.low.add(low);
        self.close.add(close);
        self.volume.add(volume);
    }

    pub fn filled(&self) -> bool {
        self.close.filled()
    }
}

/// Per-asset [`PriceBarSeries`] buffers, created lazily on first observation.
#[derive(Debug, Clone, Default)]
pub struct MultiAssetPriceBarSeries {
    capacity: usize,
    series: HashMap<Asset, PriceBarSeries>,
}

impl MultiAssetPriceBarSeries {
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity,
            series: HashMap::new(),
        }
    }

    pub fn add(&mut self, asset: Asset, open: f64, high: f64, low: f64, close: f64, volume: f64) {
        let capacity = self.capacity;
        self.series
            .entry(asset)
            .or_insert_with(|| PriceBarSeries::new(capacity))
            .add(open, high, low, close, volume);
    }

    pub fn get(&self, asset: &Asset) -> Option<&PriceBarSeries> {
        self.series.get(asset)
    }

    pub fn assets(&self) -> impl Iterator<Item = &Asset> {
        self.series.keys()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::currency::Currency;

    #[test]
    fn series_evicts_oldest_once_full() {
        let mut series = PriceSeries::new(3);
        series.add(1.0);
        series.add(2.0);
        series.add(3.0);
        assert!(series.filled());
        series.add(4.0);
        assert_eq!(series.values(), vec![2.0, 3.0, 4.0]);
    }

    #[test]
    fn not_filled_until_capacity_reached() {
        let mut series = PriceSeries::new(5);
        series.add(1.0);
        assert!(!series.filled());
    }

    #[test]
    fn multi_asset_series_are_independent() {
        let mut multi = MultiAssetPriceBarSeries::new(2);
        let a = Asset::stock("AAPL", Currency::usd());
        let b = Asset::stock("MSFT", Currency::usd());
        multi.add(a.clone(), 1.0, 1.0, 1.0, 1.0, 1.0);
        assert!(multi.get(&a).is_some());
        assert!(multi.get(&b).is_none());
    }
}
