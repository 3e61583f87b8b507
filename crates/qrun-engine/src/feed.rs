use crate::channel::{EventChannel, TimeFrame};
use async_trait::async_trait;
use qrun_types::{Action, Asset, Event, QrResult};
use std::collections::BTreeMap;
use tracing::info;

/// A source of market [`Event`]s. Implementations push their events onto an
/// [`EventChannel`] until exhausted or the channel is closed by the
/// consumer. The same trait serves both historic playback and a live feed —
/// only how `play` sources events differs.
#[async_trait]
pub trait Feed: Send + Sync {
    /// The time span this feed covers, if known up front.
    fn timeframe(&self) -> Option<TimeFrame>;

    /// The assets this feed will emit events for, if known up front.
    fn assets(&self) -> Vec<Asset>;

    /// Plays every event onto `channel`, respecting backpressure, then
    /// returns. Does not close the channel — the caller owns that decision,
    /// since several feeds may share one channel.
    async fn play(&self, channel: &EventChannel) -> QrResult<()>;
}

/// An in-memory feed that replays a fixed, time-ordered set of events.
///
/// Grounded in `gb-engine::MarketSimulator`'s `BTreeMap<DateTime<Utc>,
/// Vec<TimestampedEvent>>` timeline structure: events are grouped by
/// timestamp so that all actions sharing an instant are delivered together
/// as one [`Event`].
#[derive(Debug, Clone, Default)]
pub struct HistoricFeed {
    timeline: BTreeMap<chrono::DateTime<chrono::Utc>, Vec<Action>>,
    assets: Vec<Asset>,
}

impl HistoricFeed {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, time: chrono::DateTime<chrono::Utc>, action: Action) {
        if let Some(asset) = action.asset() {
            if !self.assets.iter().any(|a| a == asset) {
                self.assets.push(asset.clone());
            }
        }
        self.timeline.entry(time).or_default().push(action);
    }

    pub fn len(&self) -> usize {
        self.timeline.len()
    }

    pub fn is_empty(&self) -> bool {
        self.timeline.is_empty()
    }

    /// Splits this feed into two, dividing the timeline at `at`: events
    /// strictly before go to the first, the rest to the second. Useful for
    /// in-sample/out-of-sample backtests over one data set.
    pub fn split(&self, at: chrono::DateTime<chrono::Utc>) -> (HistoricFeed, HistoricFeed) {
        let mut before = HistoricFeed::new();
        let mut after = HistoricFeed::new();
        for (&time, actions) in &self.timeline {
            let target = if time < at { &mut before } else { &mut after };
            for action in actions {
                target.add(time, action.clone());
            }
        }
        (before, after)
    }
}

#[async_trait]
impl Feed for HistoricFeed {
    fn timeframe(&self) -> Option<TimeFrame> {
        let first = *self.timeline.keys().next()?;
        let last = *self.timeline.keys().next_back()?;
        Some(TimeFrame::new(first, last + chrono::Duration::nanoseconds(1)))
    }

    fn assets(&self) -> Vec<Asset> {
        self.assets.clone()
    }

    async fn play(&self, channel: &EventChannel) -> QrResult<()> {
        info!(events = self.timeline.len(), "historic feed starting playback");
        for (&time, actions) in &self.timeline {
            if channel.is_closed() {
                break;
            }
            let event = Event::new(time, actions.clone());
            channel.send(event).await?;
        }
        info!("historic feed finished playback");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use qrun_types::Currency;

    fn bar(asset: Asset, close: f64) -> Action {
        Action::PriceBar {
            asset,
            open: close,
            high: close,
            low: close,
            close,
            volume: 1.0,
            timespan: None,
        }
    }

    #[tokio::test]
    async fn historic_feed_plays_events_in_time_order() {
        let asset = Asset::stock("AAPL", Currency::usd());
        let mut feed = HistoricFeed::new();
        let t1 = chrono::DateTime::from_timestamp(1, 0).unwrap();
        let t2 = chrono::DateTime::from_timestamp(2, 0).unwrap();
        feed.add(t2, bar(asset.clone(), 11.0));
        feed.add(t1, bar(asset.clone(), 10.0));

        let channel = EventChannel::new(4);
        feed.play(&channel).await.unwrap();

        let first = channel.receive().await.unwrap();
        let second = channel.receive().await.unwrap();
        assert_eq!(first.time, t1);
        assert_eq!(second.time, t2);
    }

    #[test]
    fn split_divides_timeline_at_boundary() {
        let asset = Asset::stock("AAPL", Currency::usd());
        let mut feed = HistoricFeed::new();
        let t1 = chrono::DateTime::from_timestamp(1, 0).unwrap();
        let t2 = chrono::DateTime::from_timestamp(2, 0).unwrap();
        let t3 = chrono::DateTime::from_timestamp(3, 0).unwrap();
        feed.add(t1, bar(asset.clone(), 1.0));
        feed.add(t2, bar(asset.clone(), 2.0));
        feed.add(t3, bar(asset.clone(), 3.0));

        let (before, after) = feed.split(t2);
        assert_eq!(before.len(), 1);
        assert_eq!(after.len(), 2);
    }
}
