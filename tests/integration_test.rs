//! Integration tests for the full bar-to-fill pipeline.
//!
//! Tests cover:
//! - Wave scenario through `Engine::run` with the simulated broker
//! - Position changes only on confirmed fills
//! - Failed orders (rejected, margin) leave the position untouched
//! - Determinism: replaying the same bars gives identical output
//! - Long random walks never ENTER while LONG or EXIT while FLAT
//! - Malformed bars are skipped and reported; CSV errors end the run

mod common;

use approx::assert_relative_eq;
use common::*;
use ichitrader::adapters::csv_adapter::{CsvBarSource, VecBarSource};
use ichitrader::adapters::sim_broker::{BrokerConfig, SimulatedBroker};
use ichitrader::domain::engine::{BacktestResult, Engine};
use ichitrader::domain::error::IchitraderError;
use ichitrader::domain::execution_log::EventKind;
use ichitrader::domain::order::{OrderSide, OrderStatus};
use ichitrader::domain::position::{Position, PositionSide};
use ichitrader::domain::strategy::Decision;

fn run_with(bars: Vec<OhlcvBar>, broker: &mut SimulatedBroker) -> BacktestResult {
    let mut source = VecBarSource::new(bars);
    Engine::new(FAST_PARAMS).run(&mut source, broker).unwrap()
}

mod wave_scenario {
    use super::*;

    #[test]
    fn enters_on_breakout_and_exits_at_cloud_top() {
        let mut broker = SimulatedBroker::new(BrokerConfig::default());
        let result = run_with(wave_bars(), &mut broker);

        assert_eq!(result.signals.len(), 38);
        let decisions: Vec<_> = result.decisions().collect();
        assert_eq!(
            decisions,
            vec![(ts(14), Decision::Enter), (ts(26), Decision::Exit)]
        );

        let fills: Vec<_> = result.execution_log.fills().collect();
        assert_eq!(fills.len(), 2);
        assert_eq!(fills[0].0.side, OrderSide::Buy);
        assert_eq!(fills[0].0.timestamp, ts(15));
        assert_relative_eq!(fills[0].1.price, 94.0);
        assert_eq!(fills[1].0.side, OrderSide::Sell);
        assert_eq!(fills[1].0.timestamp, ts(27));
        assert_relative_eq!(fills[1].1.price, 114.0);

        assert_eq!(result.position, Position::Flat);
        assert_relative_eq!(broker.cash(), 10_020.0, epsilon = 1e-9);
        assert_eq!(result.last_close, Some(92.0));
    }

    #[test]
    fn cloud_values_at_entry_bar() {
        let mut broker = SimulatedBroker::new(BrokerConfig::default());
        let result = run_with(wave_bars(), &mut broker);

        let entry = &result.signals[14];
        assert_eq!(entry.tenkan, Some(92.0));
        assert_eq!(entry.kijun, Some(91.0));
        assert_eq!(entry.span_a, Some(91.5));
        assert_eq!(entry.span_b, Some(91.0));
        assert_eq!(entry.chikou, Some(89.0));
        assert_eq!(entry.close, 94.0);
    }

    #[test]
    fn position_follows_fills_not_decisions() {
        let mut broker = SimulatedBroker::new(BrokerConfig::default());
        let result = run_with(wave_bars(), &mut broker);

        // Decision bar: still flat until the broker fills next bar.
        assert_eq!(result.signals[14].position, PositionSide::Flat);
        assert_eq!(result.signals[15].position, PositionSide::Long);
        assert_eq!(result.signals[26].position, PositionSide::Long);
        assert_eq!(result.signals[27].position, PositionSide::Flat);
    }

    #[test]
    fn warmup_bars_have_no_cloud() {
        let mut broker = SimulatedBroker::new(BrokerConfig::default());
        let result = run_with(wave_bars(), &mut broker);

        for s in &result.signals[..7] {
            assert!(s.span_b.is_none());
            assert!(s.decision.is_none());
        }
        assert!(result.signals[7].span_b.is_some());
        assert!(result.signals[..4].iter().all(|s| s.chikou.is_none()));
        assert_eq!(result.signals[4].chikou, Some(99.0));
    }

    #[test]
    fn execution_log_order() {
        let mut broker = SimulatedBroker::new(BrokerConfig::default());
        let result = run_with(wave_bars(), &mut broker);

        let labels: Vec<_> = result
            .execution_log
            .events()
            .iter()
            .map(|e| (e.order_id.0, e.kind.label()))
            .collect();
        assert_eq!(
            labels,
            vec![
                (1, "SUBMITTED"),
                (1, "ACCEPTED"),
                (1, "FILLED"),
                (2, "SUBMITTED"),
                (2, "ACCEPTED"),
                (2, "FILLED"),
            ]
        );
    }

    #[test]
    fn commission_is_charged_on_both_legs() {
        let mut broker = SimulatedBroker::new(BrokerConfig {
            commission_pct: 0.1,
            ..Default::default()
        });
        let result = run_with(wave_bars(), &mut broker);

        assert_relative_eq!(
            result.execution_log.total_commission(),
            0.094 + 0.114,
            epsilon = 1e-9
        );
        assert_relative_eq!(
            broker.cash(),
            10_000.0 - 94.094 + 113.886,
            epsilon = 1e-9
        );
    }
}

mod failed_orders {
    use super::*;

    #[test]
    fn rejected_entry_keeps_position_flat() {
        let mut broker = SimulatedBroker::new(BrokerConfig::default());
        broker.reject_next();
        let result = run_with(wave_bars(), &mut broker);

        assert_eq!(result.execution_log.fills().count(), 0);
        let failures: Vec<_> = result.execution_log.failures().collect();
        assert_eq!(failures.len(), 1);
        assert_eq!(failures[0].kind, EventKind::Failed(OrderStatus::Rejected));
        assert!(result.signals.iter().all(|s| s.position == PositionSide::Flat));
        assert_relative_eq!(broker.cash(), 10_000.0);
    }

    #[test]
    fn margin_when_cash_is_short() {
        let mut broker = SimulatedBroker::new(BrokerConfig {
            cash: 50.0,
            ..Default::default()
        });
        let result = run_with(wave_bars(), &mut broker);

        let failures: Vec<_> = result.execution_log.failures().collect();
        assert_eq!(failures.len(), 1);
        assert_eq!(failures[0].kind, EventKind::Failed(OrderStatus::Margin));
        assert_eq!(result.position, Position::Flat);
    }

    #[test]
    fn strategy_may_signal_again_after_failure() {
        // Second wave re-enters once the rejected order has freed the slot.
        let mut broker = SimulatedBroker::new(BrokerConfig::default());
        broker.reject_next();
        let mut closes = wave_closes();
        closes.extend(wave_closes());
        let result = run_with(bars_from_closes(&closes), &mut broker);

        assert_eq!(result.execution_log.failures().count(), 1);
        assert_eq!(result.execution_log.fills().count(), 4);
        assert_eq!(result.position, Position::Flat);
    }
}

mod determinism {
    use super::*;

    #[test]
    fn replay_gives_identical_output() {
        let bars = generate_bars(400, 100.0, 42);

        let mut first = SimulatedBroker::new(BrokerConfig::default());
        let a = run_with(bars.clone(), &mut first);
        let mut second = SimulatedBroker::new(BrokerConfig::default());
        let b = run_with(bars, &mut second);

        assert_eq!(a.signals, b.signals);
        assert_eq!(a.execution_log, b.execution_log);
        assert_eq!(a.position, b.position);
        assert_eq!(first.cash(), second.cash());
    }

    #[test]
    fn csv_and_memory_sources_agree() {
        let bars = generate_bars(200, 100.0, 7);
        let csv = bars_to_csv(&bars);

        let mut broker = SimulatedBroker::new(BrokerConfig::default());
        let from_memory = run_with(bars, &mut broker);

        let mut source = CsvBarSource::from_reader(csv.as_bytes()).unwrap();
        let mut broker = SimulatedBroker::new(BrokerConfig::default());
        let from_csv = Engine::new(FAST_PARAMS)
            .run(&mut source, &mut broker)
            .unwrap();

        assert_eq!(from_memory.signals, from_csv.signals);
    }
}

mod state_machine_invariants {
    use super::*;

    fn check_walk(seed: u64) {
        let bars = generate_bars(600, 100.0, seed);
        let mut broker = SimulatedBroker::new(BrokerConfig::default());
        let result = run_with(bars, &mut broker);

        let mut held = PositionSide::Flat;
        let mut previous_decision = None;
        for s in &result.signals {
            match s.decision {
                Some(Decision::Enter) => assert_eq!(held, PositionSide::Flat),
                Some(Decision::Exit) => assert_eq!(held, PositionSide::Long),
                None => {}
            }
            if let Some(d) = s.decision {
                assert_ne!(previous_decision, Some(d), "decisions must alternate");
                previous_decision = Some(d);
            }
            held = s.position;
        }

        // Every fill flips the position; a final open position means one
        // more buy than sell.
        let buys = result
            .execution_log
            .fills()
            .filter(|(e, _)| e.side == OrderSide::Buy)
            .count();
        let sells = result.execution_log.fills().count() - buys;
        match result.position {
            Position::Long { .. } => assert_eq!(buys, sells + 1),
            Position::Flat => assert_eq!(buys, sells),
        }
    }

    #[test]
    fn never_enter_while_long_or_exit_while_flat() {
        for seed in [1, 2, 3, 99, 12345] {
            check_walk(seed);
        }
    }
}

mod bad_input {
    use super::*;

    #[test]
    fn duplicate_timestamp_is_skipped_and_run_completes() {
        let mut bars = wave_bars();
        bars[30].timestamp = bars[29].timestamp;
        let mut broker = SimulatedBroker::new(BrokerConfig::default());
        let result = run_with(bars, &mut broker);

        assert_eq!(result.signals.len(), 37);
        assert_eq!(result.skipped.len(), 1);
        assert_eq!(result.skipped[0].position, 30);
        assert!(result.skipped[0].reason.contains("does not follow"));

        // The trade finished before the bad bar, so it is unaffected.
        assert_eq!(result.execution_log.fills().count(), 2);
        assert_relative_eq!(broker.cash(), 10_020.0, epsilon = 1e-9);
    }

    #[test]
    fn high_below_low_is_skipped() {
        let mut bars = wave_bars();
        bars[3].high = bars[3].low - 5.0;
        let mut broker = SimulatedBroker::new(BrokerConfig::default());
        let result = run_with(bars, &mut broker);

        assert_eq!(result.signals.len(), 37);
        assert_eq!(result.skipped.len(), 1);
        assert_eq!(result.skipped[0].position, 3);
        assert!(result.signals.iter().all(|s| s.timestamp != ts(3)));
    }

    #[test]
    fn unparseable_csv_row_is_skipped() {
        let bars = wave_bars();
        let mut csv = bars_to_csv(&bars[..5]);
        csv.push_str("2024-01-01 05:00:00,1,2,0,oops,10\n");
        csv.push_str(bars_to_csv(&bars[5..10]).lines().skip(1).collect::<Vec<_>>().join("\n").as_str());
        csv.push('\n');
        let mut source = CsvBarSource::from_reader(csv.as_bytes()).unwrap();
        let mut broker = SimulatedBroker::new(BrokerConfig::default());

        let result = Engine::new(FAST_PARAMS)
            .run(&mut source, &mut broker)
            .unwrap();
        assert_eq!(result.signals.len(), 10);
        assert_eq!(result.skipped.len(), 1);
        assert_eq!(result.skipped[0].position, 5);
        assert!(result.skipped[0].reason.contains("close"));
    }

    #[test]
    fn csv_error_still_ends_the_run() {
        let mut csv = bars_to_csv(&wave_bars()[..3]);
        csv.push_str("2024-01-01 03:00:00,1,2\n");
        let mut source = CsvBarSource::from_reader(csv.as_bytes()).unwrap();
        let mut broker = SimulatedBroker::new(BrokerConfig::default());

        let err = Engine::new(FAST_PARAMS)
            .run(&mut source, &mut broker)
            .unwrap_err();
        assert!(matches!(err, IchitraderError::Data { .. }));
    }
}
