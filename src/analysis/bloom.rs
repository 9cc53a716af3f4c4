use std::fmt;

/// NDVI value a step must strictly exceed to count as bloom.
pub const BLOOM_THRESHOLD: f64 = 0.65;

/// Outcome of scanning an NDVI series for the first threshold crossing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PredictionResult {
    /// The crossing happens at this 1-based step.
    Bloom { steps: usize },
    NoBloom,
}

impl PredictionResult {
    pub fn is_bloom(&self) -> bool {
        matches!(self, PredictionResult::Bloom { .. })
    }
}

impl fmt::Display for PredictionResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PredictionResult::Bloom { steps } => write!(f, "bloom predicted in {steps} steps"),
            PredictionResult::NoBloom => write!(f, "no bloom predicted"),
        }
    }
}

/// First step whose NDVI is strictly above [`BLOOM_THRESHOLD`].
pub fn predict(series: &[f64]) -> PredictionResult {
    match series.iter().position(|&v| v > BLOOM_THRESHOLD) {
        Some(i) => PredictionResult::Bloom { steps: i + 1 },
        None => PredictionResult::NoBloom,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_series_has_no_bloom() {
        assert_eq!(predict(&[]), PredictionResult::NoBloom);
        assert_eq!(predict(&[]).to_string(), "no bloom predicted");
    }

    #[test]
    fn series_below_threshold_has_no_bloom() {
        assert_eq!(predict(&[0.1, 0.2, 0.3]).to_string(), "no bloom predicted");
    }

    #[test]
    fn reports_first_crossing_one_based() {
        assert_eq!(predict(&[0.1, 0.7, 0.9]).to_string(), "bloom predicted in 2 steps");
        assert_eq!(predict(&[0.66, 0.1]).to_string(), "bloom predicted in 1 steps");
    }

    #[test]
    fn threshold_is_strict() {
        assert_eq!(predict(&[0.65, 0.65]), PredictionResult::NoBloom);
        assert_eq!(predict(&[0.65, 0.6500001]), PredictionResult::Bloom { steps: 2 });
    }

    #[test]
    fn later_dips_do_not_matter() {
        let series = [0.2, 0.3, 0.4, 0.8, 0.1, 0.9, 0.0, 0.5];
        assert_eq!(predict(&series), PredictionResult::Bloom { steps: 4 });
        assert!(predict(&series).is_bloom());
    }

    #[test]
    fn agrees_with_first_index_rule() {
        let series: Vec<f64> = (0..40).map(|i| ((i * 37) % 100) as f64 / 100.0).collect();
        for len in 0..=series.len() {
            let s = &series[..len];
            let expected = match s.iter().position(|&v| v > 0.65) {
                Some(i) => format!("bloom predicted in {} steps", i + 1),
                None => "no bloom predicted".to_string(),
            };
            assert_eq!(predict(s).to_string(), expected);
        }
    }
}
