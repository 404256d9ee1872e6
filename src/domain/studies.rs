//! Study overlays published alongside the candle prefix.

use serde::Serialize;

use crate::domain::bar::Bar;
use crate::domain::error::ReplayError;
use crate::domain::indicator::{
    bollinger, calculate_bollinger, calculate_macd, calculate_rsi, macd, rsi, BollingerBands,
    IndicatorPoint, MacdSeries, StudyKind,
};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StudyParams {
    pub rsi_period: usize,
    pub bollinger_period: usize,
    pub bollinger_stddev: f64,
    pub macd_fast: usize,
    pub macd_slow: usize,
    pub macd_signal: usize,
}

impl Default for StudyParams {
    fn default() -> Self {
        Self {
            rsi_period: rsi::DEFAULT_PERIOD,
            bollinger_period: bollinger::DEFAULT_PERIOD,
            bollinger_stddev: bollinger::DEFAULT_STDDEV_MULT,
            macd_fast: macd::DEFAULT_FAST,
            macd_slow: macd::DEFAULT_SLOW,
            macd_signal: macd::DEFAULT_SIGNAL,
        }
    }
}

impl StudyParams {
    pub fn validate(&self) -> Result<(), ReplayError> {
        let periods = [
            ("rsi_period", self.rsi_period),
            ("bollinger_period", self.bollinger_period),
            ("macd_fast", self.macd_fast),
            ("macd_slow", self.macd_slow),
            ("macd_signal", self.macd_signal),
        ];
        for (name, period) in periods {
            if period == 0 {
                return Err(ReplayError::invalid(name, "must be at least 1"));
            }
        }
        if !(self.bollinger_stddev.is_finite() && self.bollinger_stddev > 0.0) {
            return Err(ReplayError::invalid(
                "bollinger_stddev",
                "must be a positive number",
            ));
        }
        if self.macd_fast >= self.macd_slow {
            return Err(ReplayError::invalid(
                "macd_fast",
                "must be shorter than macd_slow",
            ));
        }
        Ok(())
    }
}

/// Which overlays are switched on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct StudySet {
    pub rsi: bool,
    pub bollinger: bool,
    pub macd: bool,
}

impl Default for StudySet {
    fn default() -> Self {
        Self {
            rsi: true,
            bollinger: true,
            macd: true,
        }
    }
}

impl StudySet {
    pub fn is_enabled(&self, kind: StudyKind) -> bool {
        match kind {
            StudyKind::Rsi => self.rsi,
            StudyKind::Bollinger => self.bollinger,
            StudyKind::Macd => self.macd,
        }
    }

    pub fn set(&mut self, kind: StudyKind, enabled: bool) {
        match kind {
            StudyKind::Rsi => self.rsi = enabled,
            StudyKind::Bollinger => self.bollinger = enabled,
            StudyKind::Macd => self.macd = enabled,
        }
    }
}

/// Published series. A disabled or warming-up study is empty.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct StudyOutput {
    pub rsi: Vec<IndicatorPoint>,
    pub bollinger: BollingerBands,
    pub macd: MacdSeries,
}

impl StudyOutput {
    pub fn compute(prefix: &[Bar], params: &StudyParams, set: &StudySet) -> Self {
        let mut output = StudyOutput::default();
        for kind in StudyKind::ALL {
            if set.is_enabled(kind) {
                output.recompute(kind, prefix, params);
            }
        }
        output
    }

    pub fn recompute(&mut self, kind: StudyKind, prefix: &[Bar], params: &StudyParams) {
        match kind {
            StudyKind::Rsi => self.rsi = calculate_rsi(prefix, params.rsi_period),
            StudyKind::Bollinger => {
                self.bollinger =
                    calculate_bollinger(prefix, params.bollinger_period, params.bollinger_stddev)
            }
            StudyKind::Macd => {
                self.macd = calculate_macd(
                    prefix,
                    params.macd_fast,
                    params.macd_slow,
                    params.macd_signal,
                )
            }
        }
    }

    pub fn clear(&mut self, kind: StudyKind) {
        match kind {
            StudyKind::Rsi => self.rsi.clear(),
            StudyKind::Bollinger => self.bollinger = BollingerBands::default(),
            StudyKind::Macd => self.macd = MacdSeries::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bars(count: usize) -> Vec<Bar> {
        (0..count)
            .map(|i| {
                let close = 100.0 + (i as f64 * 0.7).sin() * 5.0;
                Bar {
                    time: i as i64 * 60,
                    open: close,
                    high: close + 1.0,
                    low: close - 1.0,
                    close,
                }
            })
            .collect()
    }

    #[test]
    fn default_params() {
        let p = StudyParams::default();
        assert_eq!(p.rsi_period, 14);
        assert_eq!(p.bollinger_period, 20);
        assert_eq!(p.bollinger_stddev, 2.0);
        assert_eq!((p.macd_fast, p.macd_slow, p.macd_signal), (12, 26, 9));
        assert!(p.validate().is_ok());
    }

    #[test]
    fn params_reject_zero_period() {
        let p = StudyParams {
            rsi_period: 0,
            ..StudyParams::default()
        };
        assert!(matches!(
            p.validate(),
            Err(ReplayError::InvalidParameter { name, .. }) if name == "rsi_period"
        ));
    }

    #[test]
    fn params_reject_inverted_macd() {
        let p = StudyParams {
            macd_fast: 26,
            macd_slow: 12,
            ..StudyParams::default()
        };
        assert!(p.validate().is_err());
    }

    #[test]
    fn compute_respects_toggles() {
        let set = StudySet {
            rsi: true,
            bollinger: false,
            macd: true,
        };
        let out = StudyOutput::compute(&bars(60), &StudyParams::default(), &set);
        assert_eq!(out.rsi.len(), 60 - 14 - 1);
        assert!(out.bollinger.is_empty());
        assert!(!out.macd.is_empty());
    }

    #[test]
    fn clear_empties_one_study() {
        let data = bars(60);
        let mut out = StudyOutput::compute(&data, &StudyParams::default(), &StudySet::default());
        out.clear(StudyKind::Macd);
        assert!(out.macd.is_empty());
        assert!(out.macd.histogram.is_empty());
        assert!(!out.rsi.is_empty());
        assert!(!out.bollinger.is_empty());
    }

    #[test]
    fn set_toggles_single_flag() {
        let mut set = StudySet::default();
        set.set(StudyKind::Bollinger, false);
        assert!(!set.is_enabled(StudyKind::Bollinger));
        assert!(set.is_enabled(StudyKind::Rsi));
        assert!(set.is_enabled(StudyKind::Macd));
    }
}
