// =============================================================================
// Quantum Signal Engine — composite directional analysis over OHLCV series
// =============================================================================
//
// A pure, synchronous analysis core: it receives a validated price series
// plus a configuration and returns one `AnalysisResult`. It performs no I/O,
// holds no state between calls, and leaves persistence, scheduling and order
// routing to its callers. Independent series may be analyzed concurrently;
// the Hurst recursion within one series is inherently sequential.

pub mod aggregator;
pub mod chaos;
pub mod config;
pub mod engine;
pub mod error;
pub mod fractal;
pub mod metrics;
pub mod patterns;
pub mod predictor;
pub mod preprocess;
pub mod technical;
pub mod types;
pub mod volatility;

pub use aggregator::SignalComponents;
pub use config::{ConfigRegistry, EngineConfig};
pub use engine::{AnalysisResult, Engine, EngineInfo, QuantumEngine};
pub use error::{EngineError, Result};
pub use metrics::PerformanceMetrics;
pub use predictor::{DirectionalForecast, DirectionalPredictor, ThresholdRulePredictor};
pub use technical::{TechnicalEngine, TechnicalSnapshot};
pub use types::{
    CandlestickPattern, EngineKind, MarketRegime, PriceBar, PriceSeries, RiskLevel, Signal,
    MINIMUM_REQUIRED_POINTS,
};
