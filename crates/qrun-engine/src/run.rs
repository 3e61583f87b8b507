//! The run loop (§4.7/§5): wires a [`Feed`] producer, an [`EventChannel`],
//! a [`Strategy`], a [`SimBroker`] and a [`Journal`] together into one
//! cooperative, single-consumer loop.
//!
//! Grounded in `gb-engine::simulator::MarketSimulator`'s producer/consumer
//! split for the event-ordered timeline, adapted to the channel-mediated,
//! task-spawned shape `tokio::spawn` gives a cooperative scheduler.

use crate::broker::SimBroker;
use crate::channel::EventChannel;
use crate::feed::Feed;
use qrun_types::{ChannelError, Account, QrError, QrResult, Strategy, StrategyContext};
use qrun_journal::Journal;
use std::sync::Arc;
use tracing::{error, info, warn};

/// Runs one strategy/broker pair against one feed to completion, per the run
/// loop pseudocode in §4.7. Returns the final account snapshot (the
/// initial deposit's snapshot if the feed produced no events).
pub async fn run(
    feed: Arc<dyn Feed>,
    capacity: usize,
    mut strategy: Box<dyn Strategy>,
    mut broker: SimBroker,
    mut journal: Box<dyn Journal>,
) -> QrResult<Account> {
    let channel = match feed.timeframe() {
        Some(tf) => EventChannel::bounded(capacity, tf),
        None => EventChannel::new(capacity),
    };

    let producer_channel = channel.clone();
    let producer_feed = Arc::clone(&feed);
    let producer = tokio::spawn(async move {
        let result = producer_feed.play(&producer_channel).await;
        producer_channel.close();
        result
    });

    let mut last_account = broker.snapshot();

    let consumer_result = drive(&channel, &mut strategy, &mut broker, journal.as_mut(), &mut last_account).await;

    if consumer_result.is_err() {
        warn!("run loop consumer failed, cancelling producer");
        channel.close();
    }
    producer.abort();
    match producer.await {
        Ok(Ok(())) => {}
        Ok(Err(err)) => error!(%err, "feed producer returned an error"),
        Err(join_err) if join_err.is_cancelled() => {}
        Err(join_err) => error!(%join_err, "feed producer task panicked"),
    }

    consumer_result?;
    Ok(last_account)
}

async fn drive(
    channel: &EventChannel,
    strategy: &mut Box<dyn Strategy>,
    broker: &mut SimBroker,
    journal: &mut dyn Journal,
    last_account: &mut Account,
) -> QrResult<()> {
    loop {
        let event = match channel.receive().await {
            Ok(event) => event,
            Err(QrError::Channel(ChannelError::Exhausted)) => {
                info!("event channel exhausted, run loop finished");
                return Ok(());
            }
            Err(err) => return Err(err),
        };

        let context = StrategyContext::new(last_account.clone());
        let orders = strategy.generate(&event, &context);
        let account = broker.place(orders.clone(), &event)?;
        journal.track(&event, &account, &orders);
        *last_account = account;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::buying_power::CashAccount;
    use crate::fee::NoFee;
    use crate::feed::HistoricFeed;
    use crate::pricing::NoCost;
    use chrono::{DateTime, Utc};
    use qrun_journal::ReturnJournal;
    use qrun_types::{Action, Amount, Asset, Currency, FixedExchangeRates, Order, OrderType};
    use rust_decimal_macros::dec;

    struct BuyOnceStrategy {
        asset: Asset,
        bought: bool,
    }

    impl Strategy for BuyOnceStrategy {
        fn generate(&mut self, _event: &qrun_types::Event, _context: &StrategyContext) -> Vec<Order> {
            if self.bought {
                return Vec::new();
            }
            self.bought = true;
            vec![Order::new(1, self.asset.clone(), dec!(10), OrderType::Market)]
        }

        fn reset(&mut self) {
            self.bought = false;
        }
    }

    fn asset() -> Asset {
        Asset::stock("AAPL", Currency::usd())
    }

    fn bar(time: DateTime<Utc>, close: f64) -> (DateTime<Utc>, Action) {
        (
            time,
            Action::PriceBar {
                asset: asset(),
                open: close,
                high: close,
                low: close,
                close,
                volume: 10.0,
                timespan: None,
            },
        )
    }

    #[tokio::test]
    async fn run_loop_drives_strategy_and_broker_to_a_final_snapshot() {
        let mut feed = HistoricFeed::new();
        for t in 0..5 {
            let (time, action) = bar(DateTime::from_timestamp(t, 0).unwrap(), 100.0 + t as f64);
            feed.add(time, action);
        }

        let broker = SimBroker::new(
            Amount::new(Currency::usd(), dec!(10_000)),
            Box::new(CashAccount::default()),
            Box::new(NoCost),
            Box::new(NoFee),
            Box::new(FixedExchangeRates::new(Currency::usd())),
            Utc::now(),
        );
        let strategy = Box::new(BuyOnceStrategy { asset: asset(), bought: false });
        let journal = Box::new(ReturnJournal::new(dec!(10_000)));

        let account = run(Arc::new(feed), 16, strategy, broker, journal).await.unwrap();
        assert_eq!(account.position(&asset()).unwrap().size, dec!(10));
        assert!(account.trades.len() == 1);
    }
}
