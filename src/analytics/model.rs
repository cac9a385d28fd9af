//! Fixed-coefficient discriminant model and score classification.

use serde::{Deserialize, Serialize};

/// Coefficients of the linear discriminant.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ModelParameters {
    pub intercept: f64,
    /// Weight of `current / baseline` creatinine
    pub creatinine_ratio: f64,
    pub urea: f64,
    pub lactate: f64,
    /// Weight of the mean urine output rate (ml/h/kg)
    pub urine_rate: f64,
}

impl Default for ModelParameters {
    fn default() -> Self {
        ModelParameters {
            intercept: -4.7023,
            creatinine_ratio: 1.7247,
            urea: 0.0351,
            lactate: 0.6647,
            urine_rate: -0.4413,
        }
    }
}

/// Operands of one discriminant evaluation. Any `None` suppresses the score.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct DiscriminantInputs {
    pub current_creatinine: Option<f64>,
    pub first_creatinine: Option<f64>,
    pub current_urea: Option<f64>,
    pub current_lactate: Option<f64>,
    pub mean_urine_rate: Option<f64>,
}

impl std::fmt::Display for DiscriminantInputs {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "creatinine={:?}, first_creatinine={:?}, urea={:?}, lactate={:?}, urine_rate={:?}",
            self.current_creatinine,
            self.first_creatinine,
            self.current_urea,
            self.current_lactate,
            self.mean_urine_rate
        )
    }
}

impl ModelParameters {
    /// Evaluates the discriminant.
    ///
    /// A zero baseline creatinine yields an infinite score, which is returned
    /// as is; classification is left to [`OutlierBand`].
    pub fn discriminant(&self, inputs: &DiscriminantInputs) -> Option<f64> {
        let current_creatinine = inputs.current_creatinine?;
        let first_creatinine = inputs.first_creatinine?;
        let urea = inputs.current_urea?;
        let lactate = inputs.current_lactate?;
        let urine_rate = inputs.mean_urine_rate?;

        Some(
            self.intercept
                + self.creatinine_ratio * (current_creatinine / first_creatinine)
                + self.urea * urea
                + self.lactate * lactate
                + self.urine_rate * urine_rate,
        )
    }
}

/// Plausibility band for finite scores.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct OutlierBand {
    pub low: f64,
    pub high: f64,
}

impl Default for OutlierBand {
    fn default() -> Self {
        OutlierBand {
            low: -20.0,
            high: 50.0,
        }
    }
}

/// Numeric quality of a computed score.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScoreQuality {
    Normal,
    /// Infinite or NaN, e.g. from a zero baseline
    NonFinite,
    /// Finite but outside the outlier band
    Outlier,
}

impl ScoreQuality {
    pub fn is_anomalous(&self) -> bool {
        !matches!(self, ScoreQuality::Normal)
    }
}

impl OutlierBand {
    pub fn classify(&self, score: f64) -> ScoreQuality {
        if !score.is_finite() {
            ScoreQuality::NonFinite
        } else if score < self.low || score > self.high {
            ScoreQuality::Outlier
        } else {
            ScoreQuality::Normal
        }
    }
}

/// What to do with anomalous scores.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum AnomalyPolicy {
    /// Log and keep the score
    #[default]
    Retain,
    /// Log and drop the score, as if the window had no data
    Discard,
}

/// Model parameters, outlier band and anomaly policy bundled for scoring.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RiskModel {
    pub parameters: ModelParameters,
    pub band: OutlierBand,
    pub policy: AnomalyPolicy,
}

impl RiskModel {
    pub fn new(parameters: ModelParameters, band: OutlierBand, policy: AnomalyPolicy) -> Self {
        RiskModel {
            parameters,
            band,
            policy,
        }
    }

    /// Scores and classifies one window.
    pub fn assess(&self, inputs: &DiscriminantInputs) -> Option<(f64, ScoreQuality)> {
        let score = self.parameters.discriminant(inputs)?;
        Some((score, self.band.classify(score)))
    }

    /// Whether a score of the given quality ends up in the output.
    pub fn admits(&self, quality: ScoreQuality) -> bool {
        self.policy == AnomalyPolicy::Retain || !quality.is_anomalous()
    }
}

impl Default for RiskModel {
    fn default() -> Self {
        RiskModel::new(
            ModelParameters::default(),
            OutlierBand::default(),
            AnomalyPolicy::default(),
        )
    }
}
