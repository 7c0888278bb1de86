// =============================================================================
// Candlestick Pattern Detector — three-bar geometry classifier
// =============================================================================
//
// Evaluates the last three bars in fixed priority order and returns the first
// match with confidence 0.8:
//
//   1. Three White Soldiers — closes and highs strictly increasing
//   2. Three Black Crows    — closes and lows strictly decreasing
//   3. Morning Star         — bearish, doji, bullish
//   4. Evening Star         — bullish, doji, bearish
//
// Fewer than three bars always classifies as NONE with confidence 0.

use tracing::trace;

use crate::types::{CandlestickPattern, PriceBar};

/// Confidence assigned to any matched pattern.
const PATTERN_CONFIDENCE: f64 = 0.8;

/// Pattern classification plus its confidence.
#[derive(Debug, Clone, Copy)]
pub struct PatternMatch {
    pub pattern: CandlestickPattern,
    pub confidence: f64,
}

impl PatternMatch {
    fn none() -> Self {
        Self {
            pattern: CandlestickPattern::None,
            confidence: 0.0,
        }
    }
}

/// Classify the trailing three bars of the series.
pub fn detect_pattern(bars: &[PriceBar]) -> PatternMatch {
    if bars.len() < 3 {
        return PatternMatch::none();
    }

    let window = &bars[bars.len() - 3..];
    let (first, second, third) = (&window[0], &window[1], &window[2]);

    let pattern = if is_three_white_soldiers(first, second, third) {
        CandlestickPattern::ThreeWhiteSoldiers
    } else if is_three_black_crows(first, second, third) {
        CandlestickPattern::ThreeBlackCrows
    } else if is_morning_star(first, second, third) {
        CandlestickPattern::MorningStar
    } else if is_evening_star(first, second, third) {
        CandlestickPattern::EveningStar
    } else {
        return PatternMatch::none();
    };

    trace!(pattern = %pattern, "candlestick pattern matched");
    PatternMatch {
        pattern,
        confidence: PATTERN_CONFIDENCE,
    }
}

fn is_three_white_soldiers(first: &PriceBar, second: &PriceBar, third: &PriceBar) -> bool {
    first.close < second.close
        && second.close < third.close
        && first.high < second.high
        && second.high < third.high
}

fn is_three_black_crows(first: &PriceBar, second: &PriceBar, third: &PriceBar) -> bool {
    first.close > second.close
        && second.close > third.close
        && first.low > second.low
        && second.low > third.low
}

fn is_morning_star(first: &PriceBar, second: &PriceBar, third: &PriceBar) -> bool {
    first.is_bearish() && second.is_doji() && third.is_bullish()
}

fn is_evening_star(first: &PriceBar, second: &PriceBar, third: &PriceBar) -> bool {
    first.is_bullish() && second.is_doji() && third.is_bearish()
}

// =============================================================================
// Unit Tests
// =============================================================================
#[cfg(test)]
mod tests {
    use super::*;

    fn bar(open: f64, high: f64, low: f64, close: f64) -> PriceBar {
        PriceBar {
            timestamp: 0,
            open,
            high,
            low,
            close,
            volume: 1.0,
        }
    }

    #[test]
    fn fewer_than_three_bars_is_none() {
        let result = detect_pattern(&[]);
        assert_eq!(result.pattern, CandlestickPattern::None);
        assert!(result.confidence.abs() < f64::EPSILON);

        let two = vec![bar(1.0, 2.0, 0.5, 1.5), bar(1.5, 2.5, 1.0, 2.0)];
        assert_eq!(detect_pattern(&two).pattern, CandlestickPattern::None);
    }

    #[test]
    fn three_white_soldiers_detected() {
        let bars = vec![
            bar(100.0, 105.0, 99.0, 104.0),
            bar(104.0, 109.0, 103.0, 108.0),
            bar(108.0, 113.0, 107.0, 112.0),
        ];
        let result = detect_pattern(&bars);
        assert_eq!(result.pattern, CandlestickPattern::ThreeWhiteSoldiers);
        assert!((result.confidence - 0.8).abs() < f64::EPSILON);
    }

    #[test]
    fn three_black_crows_detected() {
        let bars = vec![
            bar(112.0, 113.0, 107.0, 108.0),
            bar(108.0, 109.0, 103.0, 104.0),
            bar(104.0, 105.0, 99.0, 100.0),
        ];
        let result = detect_pattern(&bars);
        assert_eq!(result.pattern, CandlestickPattern::ThreeBlackCrows);
    }

    #[test]
    fn morning_star_detected() {
        let bars = vec![
            // Bearish bar.
            bar(105.0, 106.0, 99.0, 100.0),
            // Doji: tiny body inside a real range.
            bar(100.0, 101.5, 98.5, 100.05),
            // Bullish bar.
            bar(100.0, 106.0, 99.5, 105.0),
        ];
        let result = detect_pattern(&bars);
        assert_eq!(result.pattern, CandlestickPattern::MorningStar);
        assert!((result.confidence - 0.8).abs() < f64::EPSILON);
    }

    #[test]
    fn evening_star_detected() {
        let bars = vec![
            bar(100.0, 106.0, 99.5, 105.0),
            bar(105.0, 106.5, 103.5, 105.05),
            bar(105.0, 106.0, 99.0, 100.0),
        ];
        let result = detect_pattern(&bars);
        assert_eq!(result.pattern, CandlestickPattern::EveningStar);
    }

    #[test]
    fn soldiers_take_priority_over_morning_star() {
        // Bearish bar, doji, bullish bar — a valid morning star — but the
        // closes and highs also rise strictly, so the soldiers test fires
        // first.
        let bars = vec![
            bar(106.0, 107.0, 99.0, 100.5),
            bar(100.9, 107.5, 98.0, 101.0),
            bar(101.0, 108.0, 100.0, 107.0),
        ];
        let result = detect_pattern(&bars);
        assert_eq!(result.pattern, CandlestickPattern::ThreeWhiteSoldiers);
    }

    #[test]
    fn flat_bars_are_none() {
        let bars = vec![
            bar(100.0, 100.0, 100.0, 100.0),
            bar(100.0, 100.0, 100.0, 100.0),
            bar(100.0, 100.0, 100.0, 100.0),
        ];
        assert_eq!(detect_pattern(&bars).pattern, CandlestickPattern::None);
    }

    #[test]
    fn only_the_last_three_bars_matter() {
        // Noise ahead of a clean morning star must not affect detection.
        let mut bars = vec![
            bar(100.0, 101.0, 99.0, 100.5),
            bar(100.5, 102.0, 100.0, 101.0),
        ];
        bars.push(bar(105.0, 106.0, 99.0, 100.0));
        bars.push(bar(100.0, 101.5, 98.5, 100.05));
        bars.push(bar(100.0, 106.0, 99.5, 105.0));
        assert_eq!(detect_pattern(&bars).pattern, CandlestickPattern::MorningStar);
    }
}
