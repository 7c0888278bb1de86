// =============================================================================
// Analysis Engines — pipeline orchestration and the shared result contract
// =============================================================================
//
// `QuantumEngine` wires the full chain:
//
//   preprocess -> adaptive Hurst -> {trend split, particle filter,
//   semivariance} -> chaos thresholds -> directional predictor ->
//   pattern detector -> aggregator -> AnalysisResult
//
// The engine validates its configuration once at construction and holds no
// mutable state afterwards; a single instance can serve any number of calls,
// and independent series may be analyzed concurrently. The only per-call
// randomness (particle draws) flows through an explicit generator, so
// `analyze_seeded` reproduces a result bit for bit.
//
// `Engine` is the tagged dispatch over the available engine kinds.

use chrono::{DateTime, Utc};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use tracing::debug;
use uuid::Uuid;

use crate::aggregator::{
    aggregate, assess_risk, classify_regime, AggregationInputs, SignalComponents,
};
use crate::chaos::modulate_threshold;
use crate::config::EngineConfig;
use crate::error::Result;
use crate::fractal::{estimate_adaptive_hurst, split_by_trend};
use crate::patterns::detect_pattern;
use crate::predictor::{DirectionalPredictor, FeatureWindow, ThresholdRulePredictor};
use crate::preprocess::preprocess;
use crate::technical::{TechnicalEngine, TechnicalSnapshot};
use crate::types::{
    CandlestickPattern, EngineKind, MarketRegime, PriceSeries, RiskLevel, Signal,
    MINIMUM_REQUIRED_POINTS,
};
use crate::volatility::{realized_semivariance, volatility_entropy, ParticleFilter};

// =============================================================================
// Result contract
// =============================================================================

/// Complete output of one analysis call.
///
/// Ownership transfers entirely to the caller; the engine keeps no reference.
/// Snapshot fields are the last value of the corresponding intermediate
/// series, `None` when that value is undefined. Fields only the quantum
/// pipeline produces are `None` on results from other engine kinds.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalysisResult {
    pub analysis_id: Uuid,
    pub timestamp: DateTime<Utc>,
    pub engine_kind: EngineKind,

    // --- Intermediate-series snapshots --------------------------------------
    pub last_log_return: Option<f64>,
    pub rolling_volatility: Option<f64>,
    pub rolling_entropy: Option<f64>,
    pub hurst_exponent: Option<f64>,
    pub hurst_uptrend: Option<f64>,
    pub hurst_downtrend: Option<f64>,
    pub particle_volatility: Option<f64>,
    pub upside_semivariance: Option<f64>,
    pub downside_semivariance: Option<f64>,
    pub dynamic_hurst_threshold: Option<f64>,

    // --- Directional forecast ------------------------------------------------
    pub directional_signal: Signal,
    pub directional_confidence: f64,
    /// Probability assigned to [buy, sell, hold].
    pub action_probabilities: [f64; 3],

    // --- Candlestick geometry ------------------------------------------------
    pub candlestick_pattern: CandlestickPattern,
    pub pattern_confidence: f64,

    // --- Final arbitration ---------------------------------------------------
    pub final_signal: Signal,
    pub signal_confidence: f64,
    pub signal_components: Option<SignalComponents>,

    // --- Whole-series metrics ------------------------------------------------
    pub volatility_entropy: Option<f64>,
    pub fractal_dimension: Option<f64>,
    pub chaos_state: Option<f64>,
    pub market_regime: MarketRegime,
    pub risk_level: RiskLevel,

    /// Indicator snapshot, present on technical-engine results only.
    pub technical: Option<TechnicalSnapshot>,
}

/// Engine metadata for callers tracking which engine produced a prediction.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct EngineInfo {
    pub name: &'static str,
    pub version: &'static str,
    pub kind: EngineKind,
    pub required_data_points: usize,
}

/// Last value of a series as an optional snapshot.
pub(crate) fn snapshot(series: &[f64]) -> Option<f64> {
    series.last().copied().filter(|v| v.is_finite())
}

// =============================================================================
// QuantumEngine
// =============================================================================

/// The fractal / particle-filter / chaos pipeline.
pub struct QuantumEngine {
    config: EngineConfig,
    predictor: Box<dyn DirectionalPredictor>,
}

impl QuantumEngine {
    /// Build an engine, validating the configuration once. The default
    /// directional policy is the threshold rule predictor.
    pub fn new(config: EngineConfig) -> Result<Self> {
        config.validate()?;
        let predictor: Box<dyn DirectionalPredictor> =
            Box::new(ThresholdRulePredictor::new(config.hurst_threshold));
        Ok(Self { config, predictor })
    }

    /// Swap the directional policy (e.g. for a learned model).
    pub fn with_predictor(mut self, predictor: Box<dyn DirectionalPredictor>) -> Self {
        self.predictor = predictor;
        self
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn info(&self) -> EngineInfo {
        EngineInfo {
            name: "Quantum-Charged Engine",
            version: "2.0",
            kind: EngineKind::Quantum,
            required_data_points: MINIMUM_REQUIRED_POINTS,
        }
    }

    /// Analyze with OS-seeded randomness.
    pub fn analyze(&self, series: &PriceSeries) -> Result<AnalysisResult> {
        self.analyze_with_rng(series, &mut StdRng::from_entropy())
    }

    /// Analyze with a fixed seed; identical inputs and seed reproduce the
    /// result exactly.
    pub fn analyze_seeded(&self, series: &PriceSeries, seed: u64) -> Result<AnalysisResult> {
        self.analyze_with_rng(series, &mut StdRng::seed_from_u64(seed))
    }

    /// Analyze with a caller-supplied generator.
    pub fn analyze_with_rng<R: Rng + ?Sized>(
        &self,
        series: &PriceSeries,
        rng: &mut R,
    ) -> Result<AnalysisResult> {
        let processed = preprocess(series)?;

        let fractal =
            estimate_adaptive_hurst(&processed.closes, &processed.log_returns, &self.config);
        let split = split_by_trend(
            &fractal.hurst,
            &processed.log_returns,
            self.config.base_window_size,
        );

        let filter = ParticleFilter::new(self.config.particle_count);
        let particle_vol = filter.run(&processed.log_returns, rng);
        let semivariance = realized_semivariance(&processed.log_returns);

        let chaos = modulate_threshold(&fractal.hurst, &processed.log_returns, &self.config);

        let features = FeatureWindow::from_series(
            &fractal.hurst,
            &split.hurst_up,
            &split.hurst_down,
            &particle_vol,
            &processed.log_returns,
        );
        let forecast = self.predictor.predict(&features);

        let pattern = detect_pattern(series.bars());

        let decision = aggregate(&AggregationInputs {
            hurst: &fractal.hurst,
            hurst_up: &split.hurst_up,
            hurst_down: &split.hurst_down,
            particle_volatility: &particle_vol,
            dynamic_thresholds: &chaos.thresholds,
            upside_semivariance: &semivariance.upside,
            downside_semivariance: &semivariance.downside,
            predictor_signal: forecast.signal,
            hurst_threshold: self.config.hurst_threshold,
            volatility_quantile: self.config.volatility_quantile,
        });

        let market_regime = classify_regime(&fractal.hurst, &particle_vol);
        let risk_level = assess_risk(&particle_vol, &fractal.hurst);

        let hurst_last = snapshot(&fractal.hurst);

        let result = AnalysisResult {
            analysis_id: Uuid::new_v4(),
            timestamp: Utc::now(),
            engine_kind: EngineKind::Quantum,
            last_log_return: snapshot(&processed.log_returns),
            rolling_volatility: snapshot(&fractal.rolling_volatility),
            rolling_entropy: snapshot(&fractal.entropy),
            hurst_exponent: hurst_last,
            hurst_uptrend: snapshot(&split.hurst_up),
            hurst_downtrend: snapshot(&split.hurst_down),
            particle_volatility: snapshot(&particle_vol),
            upside_semivariance: snapshot(&semivariance.upside),
            downside_semivariance: snapshot(&semivariance.downside),
            dynamic_hurst_threshold: snapshot(&chaos.thresholds),
            directional_signal: forecast.signal,
            directional_confidence: forecast.confidence,
            action_probabilities: forecast.action_probabilities,
            candlestick_pattern: pattern.pattern,
            pattern_confidence: pattern.confidence,
            final_signal: decision.signal,
            signal_confidence: decision.confidence,
            signal_components: Some(decision.components),
            volatility_entropy: Some(volatility_entropy(&processed.log_returns)),
            fractal_dimension: hurst_last.map(|h| 2.0 - h),
            chaos_state: Some(chaos.final_state),
            market_regime,
            risk_level,
            technical: None,
        };

        debug!(
            signal = %result.final_signal,
            confidence = format!("{:.2}", result.signal_confidence),
            regime = %result.market_regime,
            risk = %result.risk_level,
            pattern = %result.candlestick_pattern,
            "quantum analysis complete"
        );

        Ok(result)
    }
}

// =============================================================================
// Engine dispatch
// =============================================================================

/// Tagged set of available engines, dispatched by the caller.
pub enum Engine {
    Quantum(QuantumEngine),
    Technical(TechnicalEngine),
}

impl Engine {
    pub fn analyze(&self, series: &PriceSeries) -> Result<AnalysisResult> {
        match self {
            Self::Quantum(engine) => engine.analyze(series),
            Self::Technical(engine) => engine.analyze(series),
        }
    }

    pub fn info(&self) -> EngineInfo {
        match self {
            Self::Quantum(engine) => engine.info(),
            Self::Technical(engine) => engine.info(),
        }
    }
}

// =============================================================================
// End-to-end tests
// =============================================================================
#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::PriceBar;

    fn bar(i: usize, open: f64, high: f64, low: f64, close: f64) -> PriceBar {
        PriceBar {
            timestamp: i as i64 * 60_000,
            open,
            high,
            low,
            close,
            volume: 10.0,
        }
    }

    fn flat_series(n: usize) -> PriceSeries {
        let bars: Vec<PriceBar> = (0..n).map(|i| bar(i, 100.0, 100.0, 100.0, 100.0)).collect();
        PriceSeries::try_new(bars).unwrap()
    }

    /// Monotonically rising closes with a wobble big enough to leave real
    /// detrending residuals at this price scale.
    fn trending_series(n: usize) -> PriceSeries {
        let bars: Vec<PriceBar> = (0..n)
            .map(|i| {
                let close = 10_000.0 + 40.0 * i as f64 + 25.0 * (0.9 * i as f64).sin();
                bar(i, close - 10.0, close + 30.0, close - 30.0, close)
            })
            .collect();
        PriceSeries::try_new(bars).unwrap()
    }

    fn morning_star_series() -> PriceSeries {
        let mut bars: Vec<PriceBar> = (0..57).map(|i| bar(i, 100.0, 101.0, 99.0, 100.0)).collect();
        bars.push(bar(57, 105.0, 106.0, 99.0, 100.0)); // bearish
        bars.push(bar(58, 100.0, 101.5, 98.5, 100.05)); // doji
        bars.push(bar(59, 100.0, 106.0, 99.5, 105.0)); // bullish
        PriceSeries::try_new(bars).unwrap()
    }

    #[test]
    fn config_boundary_gates_engine_construction() {
        let mut config = EngineConfig::default();
        config.particle_count = 49;
        assert!(QuantumEngine::new(config.clone()).is_err());
        config.particle_count = 50;
        assert!(QuantumEngine::new(config).is_ok());
    }

    #[test]
    fn flat_series_reads_as_distressed_sell() {
        // A constant price leaves the Hurst series undefined (zero
        // fluctuation) while the particle state stays at its unit
        // initialization scale, which trips the elevated-volatility rules.
        let engine = QuantumEngine::new(EngineConfig::default()).unwrap();
        let result = engine.analyze_seeded(&flat_series(60), 42).unwrap();

        assert_eq!(result.hurst_exponent, None);
        assert_eq!(result.fractal_dimension, None);
        assert_eq!(result.hurst_uptrend, None);
        assert_eq!(result.hurst_downtrend, None);

        let vol = result.particle_volatility.expect("filter should run");
        assert!((0.5..1.5).contains(&vol), "got {vol}");

        // Dynamic threshold never left the base value.
        let threshold = result.dynamic_hurst_threshold.unwrap();
        assert!((threshold - 0.65).abs() < 1e-12);

        assert_eq!(result.candlestick_pattern, CandlestickPattern::None);
        assert_eq!(result.directional_signal, Signal::Sell);

        let components = result.signal_components.unwrap();
        assert!(components.buy_score < 3);
        assert_eq!(components.sell_score, 2);
        assert_eq!(result.final_signal, Signal::Sell);
        assert!((result.signal_confidence - 0.8).abs() < 1e-12);

        assert_eq!(result.market_regime, MarketRegime::HighVolatility);
        assert_eq!(result.risk_level, RiskLevel::High);
    }

    #[test]
    fn monotonic_uptrend_triggers_buy() {
        let engine = QuantumEngine::new(EngineConfig::default()).unwrap();
        let result = engine.analyze_seeded(&trending_series(60), 7).unwrap();

        let hurst = result.hurst_exponent.expect("hurst should be defined");
        assert!(hurst > 0.65, "got {hurst}");
        assert!(result.hurst_uptrend.is_some());
        assert_eq!(result.hurst_downtrend, None);

        let components = result.signal_components.unwrap();
        assert!(components.hurst_above_threshold);
        assert!(components.uptrend_dominant);
        assert!(components.upside_semivariance_dominant);
        assert!(components.buy_score >= 3);

        assert_eq!(result.final_signal, Signal::Buy);
        assert!((result.signal_confidence - 0.95).abs() < 1e-12);

        // Fractal dimension mirrors the Hurst snapshot.
        let fd = result.fractal_dimension.unwrap();
        assert!((fd - (2.0 - hurst)).abs() < 1e-12);
    }

    #[test]
    fn morning_star_detected_end_to_end() {
        let engine = QuantumEngine::new(EngineConfig::default()).unwrap();
        let result = engine.analyze_seeded(&morning_star_series(), 11).unwrap();
        assert_eq!(result.candlestick_pattern, CandlestickPattern::MorningStar);
        assert!((result.pattern_confidence - 0.8).abs() < 1e-12);
    }

    #[test]
    fn seeded_analysis_is_reproducible() {
        let engine = QuantumEngine::new(EngineConfig::default()).unwrap();
        let series = trending_series(80);

        let a = engine.analyze_seeded(&series, 123).unwrap();
        let b = engine.analyze_seeded(&series, 123).unwrap();

        assert_eq!(a.particle_volatility, b.particle_volatility);
        assert_eq!(a.final_signal, b.final_signal);
        assert_eq!(a.signal_confidence, b.signal_confidence);
        assert_eq!(a.chaos_state, b.chaos_state);
        assert_eq!(a.hurst_exponent, b.hurst_exponent);
    }

    #[test]
    fn result_serializes_and_deserializes() {
        let engine = QuantumEngine::new(EngineConfig::default()).unwrap();
        let result = engine.analyze_seeded(&trending_series(60), 5).unwrap();

        let json = serde_json::to_string(&result).unwrap();
        let back: AnalysisResult = serde_json::from_str(&json).unwrap();
        assert_eq!(back.final_signal, result.final_signal);
        assert_eq!(back.engine_kind, EngineKind::Quantum);
        assert_eq!(back.analysis_id, result.analysis_id);
    }

    #[test]
    fn engine_dispatch_covers_both_kinds() {
        let series = trending_series(80);

        let quantum = Engine::Quantum(QuantumEngine::new(EngineConfig::default()).unwrap());
        let result = quantum.analyze(&series).unwrap();
        assert_eq!(result.engine_kind, EngineKind::Quantum);
        assert!(result.technical.is_none());
        assert_eq!(quantum.info().kind, EngineKind::Quantum);
        assert_eq!(quantum.info().required_data_points, 50);

        let technical = Engine::Technical(TechnicalEngine::new());
        let result = technical.analyze(&series).unwrap();
        assert_eq!(result.engine_kind, EngineKind::Technical);
        assert!(result.technical.is_some());
        assert_eq!(result.hurst_exponent, None);
        assert_eq!(result.signal_components, None);
        assert_eq!(technical.info().kind, EngineKind::Technical);
    }

    #[test]
    fn custom_predictor_is_honored() {
        struct AlwaysBuy;
        impl DirectionalPredictor for AlwaysBuy {
            fn predict(&self, _: &FeatureWindow) -> crate::predictor::DirectionalForecast {
                crate::predictor::DirectionalForecast {
                    signal: Signal::Buy,
                    confidence: 0.99,
                    action_probabilities: [0.99, 0.005, 0.005],
                }
            }
        }

        let engine = QuantumEngine::new(EngineConfig::default())
            .unwrap()
            .with_predictor(Box::new(AlwaysBuy));
        let result = engine.analyze_seeded(&flat_series(60), 1).unwrap();
        assert_eq!(result.directional_signal, Signal::Buy);
        assert!((result.directional_confidence - 0.99).abs() < 1e-12);
        assert!(result.signal_components.unwrap().predictor_buy);
    }
}
