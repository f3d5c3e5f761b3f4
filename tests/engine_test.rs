//! End-to-end evaluations against in-memory candle data.

mod common;

use common::*;
use serde_json::json;
use std::sync::Arc;
use wraith::services::{EngineConfig, Preset, TtlCandleCache};
use wraith::{Diagnostics, Direction, SignalResult, Timeframe};

#[tokio::test]
async fn test_trending_long_is_accepted() {
    let engine = engine(long_setup());
    let result = engine.evaluate_at("btc", NOW).await;

    let entry = result.as_entry().expect("expected an entry signal");
    assert_eq!(entry.direction, Direction::Long);
    assert_eq!(entry.coin, "BTC");
    assert_eq!(entry.close_5, 100.0);
    assert_eq!(entry.last_candle_t_5m, NOW);
    assert_eq!(entry.score, 100.0);
    assert_eq!(entry.strength, 8.0);
    assert_eq!(entry.sl_price_pct, 0.02);
    assert_eq!(entry.weak_adx15, None);
    assert!(entry.adx15.unwrap() > 18.0);
}

#[tokio::test]
async fn test_falling_market_is_short() {
    let result = engine(short_setup()).evaluate_at("ETH", NOW).await;

    let entry = result.as_entry().expect("expected a short entry");
    assert_eq!(entry.direction, Direction::Short);
    assert_eq!(entry.coin, "ETH");
    assert_eq!(entry.close_5, 100.0);
    assert_eq!(entry.score, 100.0);
    assert_eq!(entry.strength, 8.0);
    assert_eq!(entry.sl_price_pct, 0.02);
    assert_eq!(entry.weak_adx15, None);

    let json = serde_json::to_value(&result).unwrap();
    assert_eq!(json["signal"], true);
    assert_eq!(json["direction"], "short");
}

#[tokio::test]
async fn test_stale_5m_candles() {
    let source = long_setup().with(
        Timeframe::FiveMinutes,
        &shift(&rebound_5m(0.2, None), -20 * 60_000),
    );
    let result = engine(source).evaluate_at("BTC", NOW).await;

    assert_eq!(result.reason().as_deref(), Some("STALE_CANDLES"));
    match &result.as_rejection().unwrap().diag {
        Some(Diagnostics::Stale { series }) => {
            let five = series
                .iter()
                .find(|e| e.timeframe == Timeframe::FiveMinutes)
                .unwrap();
            assert!(five.stale);
            assert_eq!(five.age_seconds, 1200.0);
            assert!(series
                .iter()
                .filter(|e| e.timeframe != Timeframe::FiveMinutes)
                .all(|e| !e.stale));
        }
        other => panic!("expected stale diagnostics, got {:?}", other),
    }
}

#[tokio::test]
async fn test_ranging_market_has_no_trend() {
    let source = long_setup().with(Timeframe::OneHour, &ranging_1h(260));
    let result = engine(source).evaluate_at("BTC", NOW).await;
    assert_eq!(result.reason().as_deref(), Some("NO_TREND_1H"));
}

#[tokio::test]
async fn test_broken_structure_is_rejected() {
    let mut hourly = trending_1h(260);
    let reference_low = hourly[251].l;
    hourly[259].l = reference_low - 1.0;
    let source = long_setup().with(Timeframe::OneHour, &hourly);

    let result = engine(source).evaluate_at("BTC", NOW).await;
    assert_eq!(result.reason().as_deref(), Some("NO_STRUCTURE_1H_NO_HL"));
}

#[tokio::test]
async fn test_overextended_rebound_is_late() {
    let source = long_setup().with(Timeframe::FiveMinutes, &rebound_5m(0.2, Some(101.89)));
    let result = engine(source).evaluate_at("BTC", NOW).await;

    assert_eq!(result.reason().as_deref(), Some("TIMING_5M_DEEP_REBOUND"));
    match &result.as_rejection().unwrap().diag {
        Some(Diagnostics::Timing(diag)) => {
            assert!((diag.rebound.unwrap() - 0.95).abs() < 1e-9);
        }
        other => panic!("expected timing diagnostics, got {:?}", other),
    }
}

#[tokio::test]
async fn test_short_5m_history() {
    let source = long_setup().with(Timeframe::FiveMinutes, &rebound_5m(0.2, None)[50..]);
    let result = engine(source).evaluate_at("BTC", NOW).await;
    assert_eq!(result.reason().as_deref(), Some("5M_TOO_SHORT"));
}

#[tokio::test]
async fn test_missing_15m_degrades_score() {
    let source = long_setup().failing(Timeframe::FifteenMinutes);
    let result = engine(source).evaluate_at("BTC", NOW).await;

    let entry = result.as_entry().expect("15m failure should not reject");
    assert_eq!(entry.weak_adx15, Some(true));
    assert_eq!(entry.adx15, None);
    assert_eq!(entry.adx15_min, Some(18.0));
    assert_eq!(entry.score, 96.0);
    assert!((entry.strength - 7.43).abs() < 1e-9);
    assert_eq!(entry.sl_price_pct, 0.02);
}

#[tokio::test]
async fn test_required_timeframe_failures() {
    let result = engine(long_setup().failing(Timeframe::OneHour))
        .evaluate_at("BTC", NOW)
        .await;
    assert_eq!(result.reason().as_deref(), Some("API_FAIL"));

    let source = long_setup().with_raw(Timeframe::FiveMinutes, json!([]));
    let result = engine(source).evaluate_at("BTC", NOW).await;
    assert_eq!(result.reason().as_deref(), Some("EMPTY"));

    let source = long_setup().with_raw(Timeframe::OneHour, json!({"error": "rate limited"}));
    let result = engine(source).evaluate_at("BTC", NOW).await;
    assert_eq!(result.reason().as_deref(), Some("API_FAIL"));
}

#[tokio::test]
async fn test_unparseable_candles() {
    let source = long_setup().with_raw(
        Timeframe::OneHour,
        json!([{"t": NOW, "o": "n/a", "h": "n/a", "l": "n/a", "c": "n/a"}]),
    );
    let result = engine(source).evaluate_at("BTC", NOW).await;
    assert_eq!(result.reason().as_deref(), Some("NO_CANDLES"));

    let mut hourly = trending_1h(260);
    hourly[259].c = 0.0;
    let source = long_setup().with(Timeframe::OneHour, &hourly);
    let result = engine(source).evaluate_at("BTC", NOW).await;
    assert_eq!(result.reason().as_deref(), Some("BAD_CANDLES_PARSE"));
}

#[tokio::test]
async fn test_extreme_timestamps_never_pass_as_fresh() {
    // Not representable as epoch millis: the record is dropped.
    let source = long_setup().with_raw(
        Timeframe::OneHour,
        json!([{"t": -1e30, "o": 1, "h": 2, "l": 0.5, "c": 1.5, "v": 1}]),
    );
    let result = engine(source).evaluate_at("BTC", NOW).await;
    assert_eq!(result.reason().as_deref(), Some("NO_CANDLES"));

    // Representable, but the age overflows.
    let source = long_setup().with_raw(
        Timeframe::OneHour,
        json!([{"t": i64::MIN, "o": 1, "h": 2, "l": 0.5, "c": 1.5, "v": 1}]),
    );
    let result = engine(source).evaluate_at("BTC", NOW).await;
    assert_eq!(result.reason().as_deref(), Some("STALE_CANDLES"));
}

#[tokio::test]
async fn test_bad_symbol_skips_fetch() {
    let engine = engine(long_setup());
    let result = engine.evaluate_at("  ", NOW).await;
    assert_eq!(result.reason().as_deref(), Some("BAD_SYMBOL"));

    let result = engine.evaluate_at("BTC$", NOW).await;
    assert_eq!(result.reason().as_deref(), Some("BAD_SYMBOL"));
    assert_eq!(engine.fetcher().source().calls(), 0);
}

#[tokio::test]
async fn test_symbol_normalized_before_fetch() {
    let engine = engine(long_setup());
    let result = engine.evaluate_at("eth-perp", NOW).await;
    assert_eq!(result.coin(), "ETH");

    let log = engine.fetcher().source().log();
    assert_eq!(log.len(), 3);
    assert!(log.iter().all(|call| call.coin == "ETH" && call.end_time == NOW));
}

#[tokio::test]
async fn test_each_gate_rejects_alone() {
    let base = engine(long_setup()).evaluate_at("BTC", NOW).await;
    assert!(base.is_signal());

    let trend_only = long_setup().with(Timeframe::OneHour, &ranging_1h(260));
    let mut broken = trending_1h(260);
    broken[259].l = broken[251].l - 1.0;
    let structure_only = long_setup().with(Timeframe::OneHour, &broken);
    let timing_only = long_setup().with(Timeframe::FiveMinutes, &rebound_5m(0.2, Some(101.89)));

    for (source, prefix) in [
        (trend_only, "NO_TREND_1H"),
        (structure_only, "NO_STRUCTURE_1H_"),
        (timing_only, "TIMING_5M_"),
    ] {
        let result = engine(source).evaluate_at("BTC", NOW).await;
        assert!(!result.is_signal());
        assert!(result.reason().unwrap().starts_with(prefix));
    }
}

#[tokio::test]
async fn test_cache_avoids_refetch() {
    let cache = Arc::new(TtlCandleCache::new());
    let engine = engine_with(long_setup(), cache.clone(), EngineConfig::default());

    let first = engine.evaluate_at("BTC", NOW).await;
    let second = engine.evaluate_at("btc", NOW).await;

    assert_eq!(first, second);
    assert_eq!(engine.fetcher().source().calls(), 3);
    assert_eq!(cache.len(), 3);
}

#[tokio::test]
async fn test_concurrent_evaluations() {
    let cache = Arc::new(TtlCandleCache::new());
    let engine = engine_with(long_setup(), cache, EngineConfig::default());

    let (btc, eth, sol) = tokio::join!(
        engine.evaluate_at("BTC", NOW),
        engine.evaluate_at("ETH", NOW),
        engine.evaluate_at("BTC", NOW),
    );
    assert!(btc.is_signal() && eth.is_signal() && sol.is_signal());
    assert_eq!(btc, sol);
}

#[tokio::test]
async fn test_conservative_preset_tightens_timing() {
    // 0.75 rebound: inside the default band, above the conservative ceiling.
    let fixture = rebound_5m(0.2, Some(97.9 + 0.75 * 4.2));
    let source = || long_setup().with(Timeframe::FiveMinutes, &fixture);

    let result = engine(source()).evaluate_at("BTC", NOW).await;
    assert_ne!(result.reason().as_deref(), Some("TIMING_5M_DEEP_REBOUND"));

    let conservative = EngineConfig::preset(Preset::Conservative);
    let result = engine_with(source(), Arc::new(wraith::services::NoCache), conservative)
        .evaluate_at("BTC", NOW)
        .await;
    assert_eq!(result.reason().as_deref(), Some("TIMING_5M_DEEP_REBOUND"));
}

#[tokio::test]
async fn test_result_json_shape() {
    let result = engine(long_setup()).evaluate_at("BTC", NOW).await;
    let json = serde_json::to_value(&result).unwrap();
    assert_eq!(json["signal"], true);
    assert_eq!(json["direction"], "long");
    assert_eq!(json["coin"], "BTC");
    assert_eq!(json["last_candle_t_5m"], NOW);
    assert!(json.get("reason").is_none());

    let rejected = SignalResult::reject("BTC", wraith::RejectReason::NoTrend1h, None);
    let json = serde_json::to_value(&rejected).unwrap();
    assert_eq!(json, json!({"signal": false, "reason": "NO_TREND_1H", "coin": "BTC"}));
}
