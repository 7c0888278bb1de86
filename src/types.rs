// =============================================================================
// Shared types used across the quantum signal engine
// =============================================================================

use serde::{Deserialize, Serialize};

use crate::error::EngineError;

/// Minimum number of bars required for a valid analysis.
pub const MINIMUM_REQUIRED_POINTS: usize = 50;

// =============================================================================
// Price data
// =============================================================================

/// A single OHLCV bar.
///
/// Fields may arrive as NaN from upstream data gaps; the preprocessor repairs
/// interior gaps by forward-fill then backward-fill before any estimator runs.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct PriceBar {
    /// Bar open time, epoch milliseconds.
    pub timestamp: i64,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: f64,
}

impl PriceBar {
    /// Absolute distance between open and close.
    pub fn body(&self) -> f64 {
        (self.close - self.open).abs()
    }

    /// Full high-low range of the bar.
    pub fn range(&self) -> f64 {
        self.high - self.low
    }

    pub fn is_bullish(&self) -> bool {
        self.close > self.open
    }

    pub fn is_bearish(&self) -> bool {
        self.close < self.open
    }

    /// A doji has a body smaller than 10% of its high-low range.
    pub fn is_doji(&self) -> bool {
        let range = self.range();
        range > 0.0 && self.body() < 0.1 * range
    }
}

/// Validated, immutable input series for one analysis call.
///
/// Construction enforces the input contract up front: minimum length,
/// strictly increasing timestamps (which also rules out duplicates), and
/// positive closes wherever the close is defined. NaN closes are tolerated
/// here and repaired by the preprocessor.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PriceSeries {
    bars: Vec<PriceBar>,
}

impl PriceSeries {
    pub fn try_new(bars: Vec<PriceBar>) -> Result<Self, EngineError> {
        if bars.len() < MINIMUM_REQUIRED_POINTS {
            return Err(EngineError::InsufficientData {
                required: MINIMUM_REQUIRED_POINTS,
                actual: bars.len(),
            });
        }

        for pair in bars.windows(2) {
            if pair[1].timestamp <= pair[0].timestamp {
                return Err(EngineError::InvalidSeries {
                    reason: format!(
                        "timestamps not strictly increasing ({} then {})",
                        pair[0].timestamp, pair[1].timestamp
                    ),
                });
            }
        }

        if let Some(bar) = bars.iter().find(|b| b.close.is_finite() && b.close <= 0.0) {
            return Err(EngineError::InvalidSeries {
                reason: format!(
                    "non-positive close {} at timestamp {}",
                    bar.close, bar.timestamp
                ),
            });
        }

        Ok(Self { bars })
    }

    pub fn bars(&self) -> &[PriceBar] {
        &self.bars
    }

    pub fn len(&self) -> usize {
        self.bars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bars.is_empty()
    }

    pub fn opens(&self) -> Vec<f64> {
        self.bars.iter().map(|b| b.open).collect()
    }

    pub fn highs(&self) -> Vec<f64> {
        self.bars.iter().map(|b| b.high).collect()
    }

    pub fn lows(&self) -> Vec<f64> {
        self.bars.iter().map(|b| b.low).collect()
    }

    pub fn closes(&self) -> Vec<f64> {
        self.bars.iter().map(|b| b.close).collect()
    }

    pub fn volumes(&self) -> Vec<f64> {
        self.bars.iter().map(|b| b.volume).collect()
    }
}

// =============================================================================
// Signal taxonomy
// =============================================================================

/// Directional trading signal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Signal {
    Buy,
    Sell,
    Hold,
}

impl std::fmt::Display for Signal {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Buy => write!(f, "BUY"),
            Self::Sell => write!(f, "SELL"),
            Self::Hold => write!(f, "HOLD"),
        }
    }
}

/// Three-bar candlestick pattern classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CandlestickPattern {
    ThreeWhiteSoldiers,
    ThreeBlackCrows,
    MorningStar,
    EveningStar,
    None,
}

impl std::fmt::Display for CandlestickPattern {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::ThreeWhiteSoldiers => write!(f, "THREE_WHITE_SOLDIERS"),
            Self::ThreeBlackCrows => write!(f, "THREE_BLACK_CROWS"),
            Self::MorningStar => write!(f, "MORNING_STAR"),
            Self::EveningStar => write!(f, "EVENING_STAR"),
            Self::None => write!(f, "NONE"),
        }
    }
}

/// Market regime classification from the final aggregation step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MarketRegime {
    /// Persistent trend with calm volatility.
    TrendingLowVol,
    /// Anti-persistent chop with elevated volatility.
    MeanRevertingHighVol,
    /// Volatility above the absolute ceiling, regardless of persistence.
    HighVolatility,
    Normal,
}

impl std::fmt::Display for MarketRegime {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::TrendingLowVol => write!(f, "TRENDING_LOW_VOL"),
            Self::MeanRevertingHighVol => write!(f, "MEAN_REVERTING_HIGH_VOL"),
            Self::HighVolatility => write!(f, "HIGH_VOLATILITY"),
            Self::Normal => write!(f, "NORMAL"),
        }
    }
}

/// Coarse risk classification shipped with every analysis.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum RiskLevel {
    Low,
    Medium,
    High,
}

impl std::fmt::Display for RiskLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Low => write!(f, "LOW"),
            Self::Medium => write!(f, "MEDIUM"),
            Self::High => write!(f, "HIGH"),
        }
    }
}

/// Which engine variant produced a result.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum EngineKind {
    Quantum,
    Technical,
}

impl std::fmt::Display for EngineKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Quantum => write!(f, "QUANTUM"),
            Self::Technical => write!(f, "TECHNICAL"),
        }
    }
}
