pub mod cache;
pub mod candles;
pub mod risk;
pub mod signals;

pub use cache::{Cache, CandleCache, NoCache, TtlCandleCache};
pub use candles::{is_stale, is_stale_at, normalize_symbol, CandleFetcher};
pub use risk::{validate_trade_conditions, RiskConfig};
pub use signals::{EngineConfig, Preset, SignalEngine};
