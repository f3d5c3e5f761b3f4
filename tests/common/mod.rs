//! Shared fixtures: an in-memory candle source and synthetic series.

#![allow(dead_code)]

use serde_json::{json, Value};
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use wraith::services::{CandleCache, CandleFetcher, EngineConfig, NoCache, SignalEngine};
use wraith::sources::CandleSource;
use wraith::{AppError, Candle, Timeframe};

pub const NOW: i64 = 1_700_000_000_000;
pub const HOUR: i64 = 3_600_000;
pub const QUARTER: i64 = 900_000;
pub const FIVE_MIN: i64 = 300_000;

/// One recorded `candle_snapshot` call.
#[derive(Debug, Clone, PartialEq)]
pub struct SnapshotCall {
    pub coin: String,
    pub interval: Timeframe,
    pub start_time: i64,
    pub end_time: i64,
}

/// Candle source serving canned payloads per timeframe.
#[derive(Default)]
pub struct MockSource {
    payloads: HashMap<Timeframe, Value>,
    failing: HashSet<Timeframe>,
    calls: AtomicUsize,
    log: Mutex<Vec<SnapshotCall>>,
}

impl MockSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, timeframe: Timeframe, candles: &[Candle]) -> Self {
        self.payloads.insert(timeframe, to_payload(candles));
        self
    }

    pub fn with_raw(mut self, timeframe: Timeframe, payload: Value) -> Self {
        self.payloads.insert(timeframe, payload);
        self
    }

    pub fn failing(mut self, timeframe: Timeframe) -> Self {
        self.failing.insert(timeframe);
        self
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn log(&self) -> Vec<SnapshotCall> {
        self.log.lock().unwrap().clone()
    }
}

impl CandleSource for MockSource {
    async fn candle_snapshot(
        &self,
        coin: &str,
        interval: Timeframe,
        start_time: i64,
        end_time: i64,
    ) -> wraith::Result<Value> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.log.lock().unwrap().push(SnapshotCall {
            coin: coin.to_string(),
            interval,
            start_time,
            end_time,
        });
        if self.failing.contains(&interval) {
            return Err(AppError::ExternalApi("connection reset".to_string()));
        }
        Ok(self.payloads.get(&interval).cloned().unwrap_or_else(|| json!([])))
    }
}

/// Encode candles the way the exchange does: prices as strings.
pub fn to_payload(candles: &[Candle]) -> Value {
    Value::Array(
        candles
            .iter()
            .map(|c| {
                json!({
                    "t": c.t,
                    "T": c.t + 1,
                    "s": "BTC",
                    "o": c.o.to_string(),
                    "h": c.h.to_string(),
                    "l": c.l.to_string(),
                    "c": c.c.to_string(),
                    "v": c.v.to_string(),
                    "n": 10
                })
            })
            .collect(),
    )
}

fn stamp(candles: &mut [Candle], step: i64, last_t: i64) {
    let n = candles.len() as i64;
    for (i, candle) in candles.iter_mut().enumerate() {
        candle.t = last_t - (n - 1 - i as i64) * step;
    }
}

/// Steady 1h climb: close 500 + i, ADX near 100, close ~15% over EMA200.
pub fn trending_1h(count: usize) -> Vec<Candle> {
    let mut candles: Vec<Candle> = (0..count)
        .map(|i| {
            let c = 500.0 + i as f64;
            Candle { t: 0, o: c - 0.5, h: c + 1.0, l: c - 1.5, c, v: 100.0 }
        })
        .collect();
    stamp(&mut candles, HOUR, NOW);
    candles
}

/// 1h chop around 100; ADX stays under 5.
pub fn ranging_1h(count: usize) -> Vec<Candle> {
    let mut candles: Vec<Candle> = (0..count)
        .map(|i| {
            let c = if i % 2 == 0 { 101.0 } else { 99.0 };
            Candle { t: 0, o: c, h: c + 0.5, l: c - 0.5, c, v: 100.0 }
        })
        .collect();
    stamp(&mut candles, HOUR, NOW);
    candles
}

pub fn trending_15m(count: usize) -> Vec<Candle> {
    let mut candles: Vec<Candle> = (0..count)
        .map(|i| {
            let c = 700.0 + 0.25 * i as f64;
            Candle { t: 0, o: c, h: c + 0.5, l: c - 0.5, c, v: 50.0 }
        })
        .collect();
    stamp(&mut candles, QUARTER, NOW);
    candles
}

fn from_closes(closes: &[f64], step: i64, last_t: i64) -> Vec<Candle> {
    let mut prev = closes[0];
    let mut candles: Vec<Candle> = closes
        .iter()
        .map(|&c| {
            let o = prev;
            prev = c;
            Candle { t: 0, o, h: o.max(c) + 0.1, l: o.min(c) - 0.1, c, v: 10.0 }
        })
        .collect();
    stamp(&mut candles, step, last_t);
    candles
}

/// 5m pullback from 102 to 98 and a recovery climbing `step` per bar.
/// The impulse runs 102.1 -> 97.9; with `step = 0.2` the close is 100.0,
/// a 50% rebound.
pub fn rebound_5m(step: f64, last_close: Option<f64>) -> Vec<Candle> {
    let mut closes = vec![102.0; 50];
    closes.extend((50..60).map(|k| 102.0 - 0.4 * (k - 49) as f64));
    closes.extend((60..70).map(|k| 98.0 + step * (k - 59) as f64));
    if let Some(close) = last_close {
        if let Some(last) = closes.last_mut() {
            *last = close;
        }
    }
    from_closes(&closes, FIVE_MIN, NOW)
}

pub fn shift(candles: &[Candle], by_ms: i64) -> Vec<Candle> {
    candles.iter().map(|c| Candle { t: c.t + by_ms, ..*c }).collect()
}

/// Reflect prices around `pivot`: an uptrend becomes the matching downtrend.
pub fn mirror(candles: &[Candle], pivot: f64) -> Vec<Candle> {
    candles
        .iter()
        .map(|c| Candle {
            t: c.t,
            o: 2.0 * pivot - c.o,
            h: 2.0 * pivot - c.l,
            l: 2.0 * pivot - c.h,
            c: 2.0 * pivot - c.c,
            v: c.v,
        })
        .collect()
}

/// Source with a clean long setup on every timeframe.
pub fn long_setup() -> MockSource {
    MockSource::new()
        .with(Timeframe::OneHour, &trending_1h(260))
        .with(Timeframe::FifteenMinutes, &trending_15m(260))
        .with(Timeframe::FiveMinutes, &rebound_5m(0.2, None))
}

/// Mirror image of [`long_setup`]: falling 1h and 15m, 5m bounce fading.
pub fn short_setup() -> MockSource {
    MockSource::new()
        .with(Timeframe::OneHour, &mirror(&trending_1h(260), 1000.0))
        .with(Timeframe::FifteenMinutes, &mirror(&trending_15m(260), 1000.0))
        .with(Timeframe::FiveMinutes, &mirror(&rebound_5m(0.2, None), 100.0))
}

pub fn engine(source: MockSource) -> SignalEngine<MockSource> {
    engine_with(source, Arc::new(NoCache), EngineConfig::default())
}

pub fn engine_with(
    source: MockSource,
    cache: Arc<dyn CandleCache>,
    config: EngineConfig,
) -> SignalEngine<MockSource> {
    let fetcher = CandleFetcher::new(source, cache, Duration::from_secs(5));
    SignalEngine::new(fetcher, config)
}
