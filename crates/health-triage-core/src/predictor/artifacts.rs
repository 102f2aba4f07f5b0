//! File-backed predictor artifacts
//!
//! A model directory holds three JSON documents:
//!
//! - `scaler.json`: per-feature standardization (`(x - mean) / scale`)
//! - `classifier.json`: a classifier over the scaled features, tagged by `kind`
//! - `label_encoder.json`: class index to label mapping
//!
//! Shapes are checked once at load time. Anything that fails there is a
//! [`TriageError::ModelUnavailable`]; anything that fails during inference is
//! a [`TriageError::PredictionFailure`].

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::Path;

use super::{ConditionLabel, ConditionPredictor};
use crate::error::{Result, TriageError};
use crate::vitals::{VitalSigns, FEATURE_COUNT, FEATURE_NAMES};

pub const SCALER_FILE: &str = "scaler.json";
pub const CLASSIFIER_FILE: &str = "classifier.json";
pub const LABEL_ENCODER_FILE: &str = "label_encoder.json";

type Features = [f64; FEATURE_COUNT];

/// Pre-fitted standardization transform
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct StandardScaler {
    pub mean: Features,
    pub scale: Features,
}

impl StandardScaler {
    fn validate(&self) -> Result<()> {
        for (i, (mean, scale)) in self.mean.iter().zip(self.scale.iter()).enumerate() {
            if !mean.is_finite() {
                return Err(TriageError::model_unavailable(format!(
                    "scaler mean for '{}' is not finite",
                    FEATURE_NAMES[i]
                )));
            }
            if !scale.is_finite() || *scale == 0.0 {
                return Err(TriageError::model_unavailable(format!(
                    "scaler scale for '{}' must be finite and non-zero",
                    FEATURE_NAMES[i]
                )));
            }
        }
        Ok(())
    }

    pub fn transform(&self, features: &Features) -> Features {
        let mut scaled = [0.0; FEATURE_COUNT];
        for (i, value) in features.iter().enumerate() {
            scaled[i] = (value - self.mean[i]) / self.scale[i];
        }
        scaled
    }
}

/// Pre-trained classifier over scaled features
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Classifier {
    /// One weight vector per class; the highest score wins
    Linear {
        coefficients: Vec<Features>,
        intercepts: Vec<f64>,
    },
    /// One centroid per class; the closest centroid wins
    NearestCentroid { centroids: Vec<Features> },
}

impl Classifier {
    pub fn class_count(&self) -> usize {
        match self {
            Classifier::Linear { coefficients, .. } => coefficients.len(),
            Classifier::NearestCentroid { centroids } => centroids.len(),
        }
    }

    fn validate(&self) -> Result<()> {
        if self.class_count() == 0 {
            return Err(TriageError::model_unavailable("classifier has no classes"));
        }

        let finite = |rows: &[Features]| rows.iter().flatten().all(|v| v.is_finite());
        match self {
            Classifier::Linear {
                coefficients,
                intercepts,
            } => {
                if intercepts.len() != coefficients.len() {
                    return Err(TriageError::model_unavailable(format!(
                        "classifier has {} coefficient rows but {} intercepts",
                        coefficients.len(),
                        intercepts.len()
                    )));
                }
                if !finite(coefficients) || !intercepts.iter().all(|v| v.is_finite()) {
                    return Err(TriageError::model_unavailable(
                        "classifier weights must be finite",
                    ));
                }
            }
            Classifier::NearestCentroid { centroids } => {
                if !finite(centroids) {
                    return Err(TriageError::model_unavailable(
                        "classifier centroids must be finite",
                    ));
                }
            }
        }
        Ok(())
    }

    /// Class index for a scaled feature vector. Ties go to the lowest index.
    pub fn predict_index(&self, scaled: &Features) -> Result<usize> {
        let scores: Vec<f64> = match self {
            Classifier::Linear {
                coefficients,
                intercepts,
            } => coefficients
                .iter()
                .zip(intercepts)
                .map(|(weights, intercept)| dot(weights, scaled) + intercept)
                .collect(),
            // negate so that the closest centroid has the highest score
            Classifier::NearestCentroid { centroids } => centroids
                .iter()
                .map(|centroid| -squared_distance(centroid, scaled))
                .collect(),
        };

        let mut best: Option<(usize, f64)> = None;
        for (index, score) in scores.into_iter().enumerate() {
            if !score.is_finite() {
                return Err(TriageError::prediction_failure(format!(
                    "score for class {} is not finite",
                    index
                )));
            }
            match best {
                Some((_, top)) if score <= top => {}
                _ => best = Some((index, score)),
            }
        }

        best.map(|(index, _)| index)
            .ok_or_else(|| TriageError::prediction_failure("classifier produced no scores"))
    }
}

fn dot(a: &Features, b: &Features) -> f64 {
    a.iter().zip(b).map(|(x, y)| x * y).sum()
}

fn squared_distance(a: &Features, b: &Features) -> f64 {
    a.iter().zip(b).map(|(x, y)| (x - y) * (x - y)).sum()
}

/// Class index to label decoder
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LabelEncoder {
    pub classes: Vec<String>,
}

impl LabelEncoder {
    fn validate(&self) -> Result<()> {
        let mut seen = HashSet::new();
        for class in &self.classes {
            if class.trim().is_empty() {
                return Err(TriageError::model_unavailable("label encoder has an empty class name"));
            }
            if !seen.insert(class.as_str()) {
                return Err(TriageError::model_unavailable(format!(
                    "label encoder lists '{}' more than once",
                    class
                )));
            }
        }
        Ok(())
    }

    pub fn decode(&self, index: usize) -> Result<ConditionLabel> {
        self.classes
            .get(index)
            .map(|label| ConditionLabel::new(label.clone()))
            .ok_or_else(|| {
                TriageError::prediction_failure(format!(
                    "class index {} is outside the {} known labels",
                    index,
                    self.classes.len()
                ))
            })
    }
}

/// Predictor assembled from a scaler, a classifier and a label encoder
#[derive(Debug, Clone)]
pub struct ArtifactPredictor {
    scaler: StandardScaler,
    classifier: Classifier,
    encoder: LabelEncoder,
}

impl ArtifactPredictor {
    /// Assemble a predictor, checking that the three artifacts agree
    pub fn new(
        scaler: StandardScaler,
        classifier: Classifier,
        encoder: LabelEncoder,
    ) -> Result<Self> {
        scaler.validate()?;
        classifier.validate()?;
        encoder.validate()?;

        if classifier.class_count() != encoder.classes.len() {
            return Err(TriageError::model_unavailable(format!(
                "classifier predicts {} classes but the label encoder knows {}",
                classifier.class_count(),
                encoder.classes.len()
            )));
        }

        Ok(Self {
            scaler,
            classifier,
            encoder,
        })
    }

    /// Load the three artifacts from a model directory
    pub fn load(dir: impl AsRef<Path>) -> Result<Self> {
        let dir = dir.as_ref();
        let scaler: StandardScaler = read_artifact(dir, SCALER_FILE)?;
        let classifier: Classifier = read_artifact(dir, CLASSIFIER_FILE)?;
        let encoder: LabelEncoder = read_artifact(dir, LABEL_ENCODER_FILE)?;

        let predictor = Self::new(scaler, classifier, encoder)?;
        tracing::info!(
            model_dir = %dir.display(),
            classes = ?predictor.encoder.classes,
            "Loaded predictor artifacts"
        );
        Ok(predictor)
    }
}

fn read_artifact<T: DeserializeOwned>(dir: &Path, file: &str) -> Result<T> {
    let path = dir.join(file);
    let content = std::fs::read_to_string(&path).map_err(|e| {
        TriageError::model_unavailable(format!("failed to read '{}': {}", path.display(), e))
    })?;
    serde_json::from_str(&content).map_err(|e| {
        TriageError::model_unavailable(format!("failed to parse '{}': {}", path.display(), e))
    })
}

impl ConditionPredictor for ArtifactPredictor {
    fn name(&self) -> &str {
        match self.classifier {
            Classifier::Linear { .. } => "linear",
            Classifier::NearestCentroid { .. } => "nearest_centroid",
        }
    }

    fn classes(&self) -> Vec<String> {
        self.encoder.classes.clone()
    }

    fn predict(&self, vitals: &VitalSigns) -> Result<ConditionLabel> {
        let features = vitals.feature_vector();
        if let Some(i) = features.iter().position(|v| !v.is_finite()) {
            return Err(TriageError::prediction_failure(format!(
                "feature '{}' is not finite",
                FEATURE_NAMES[i]
            )));
        }

        let scaled = self.scaler.transform(&features);
        let index = self.classifier.predict_index(&scaled)?;
        self.encoder.decode(index)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scaler() -> StandardScaler {
        StandardScaler {
            mean: [40.0, 25.0, 120.0, 80.0, 75.0, 100.0],
            scale: [15.0, 5.0, 15.0, 10.0, 12.0, 25.0],
        }
    }

    fn linear() -> Classifier {
        Classifier::Linear {
            coefficients: vec![[0.0; 6], [0.2, 0.5, 0.8, 0.6, 0.4, 0.7]],
            intercepts: vec![0.0, -1.0],
        }
    }

    fn encoder() -> LabelEncoder {
        LabelEncoder {
            classes: vec!["Healthy".to_string(), "At Risk".to_string()],
        }
    }

    #[test]
    fn test_scaler_transform() {
        let scaled = scaler().transform(&[55.0, 30.0, 135.0, 90.0, 87.0, 125.0]);
        assert_eq!(scaled, [1.0; 6]);
    }

    #[test]
    fn test_linear_prediction() {
        let predictor = ArtifactPredictor::new(scaler(), linear(), encoder()).unwrap();

        let at_risk = VitalSigns::new(45, 32.0, 150, 95, 110, 140);
        assert_eq!(predictor.predict(&at_risk).unwrap().as_str(), "At Risk");

        let healthy = VitalSigns::new(30, 22.0, 120, 80, 70, 90);
        assert_eq!(predictor.predict(&healthy).unwrap().as_str(), "Healthy");
    }

    #[test]
    fn test_nearest_centroid_prediction() {
        let classifier = Classifier::NearestCentroid {
            centroids: vec![[0.0; 6], [2.0; 6]],
        };
        let predictor = ArtifactPredictor::new(scaler(), classifier, encoder()).unwrap();

        let vitals = VitalSigns::new(45, 32.0, 150, 95, 110, 140);
        assert_eq!(predictor.predict(&vitals).unwrap().as_str(), "At Risk");
        assert_eq!(predictor.name(), "nearest_centroid");
    }

    #[test]
    fn test_ties_resolve_to_lowest_index() {
        let classifier = Classifier::Linear {
            coefficients: vec![[0.0; 6], [0.0; 6]],
            intercepts: vec![1.0, 1.0],
        };
        assert_eq!(classifier.predict_index(&[0.0; 6]).unwrap(), 0);
    }

    #[test]
    fn test_zero_scale_rejected() {
        let mut bad = scaler();
        bad.scale[3] = 0.0;
        let err = ArtifactPredictor::new(bad, linear(), encoder()).unwrap_err();
        assert!(matches!(err, TriageError::ModelUnavailable(msg) if msg.contains("diastolicbp")));
    }

    #[test]
    fn test_class_count_mismatch_rejected() {
        let encoder = LabelEncoder {
            classes: vec!["Healthy".to_string()],
        };
        let err = ArtifactPredictor::new(scaler(), linear(), encoder).unwrap_err();
        assert!(matches!(err, TriageError::ModelUnavailable(_)));
    }

    #[test]
    fn test_intercept_mismatch_rejected() {
        let classifier = Classifier::Linear {
            coefficients: vec![[0.0; 6], [1.0; 6]],
            intercepts: vec![0.0],
        };
        assert!(ArtifactPredictor::new(scaler(), classifier, encoder()).is_err());
    }

    #[test]
    fn test_duplicate_labels_rejected() {
        let encoder = LabelEncoder {
            classes: vec!["Healthy".to_string(), "Healthy".to_string()],
        };
        assert!(ArtifactPredictor::new(scaler(), linear(), encoder).is_err());
    }

    #[test]
    fn test_non_finite_feature_is_prediction_failure() {
        let predictor = ArtifactPredictor::new(scaler(), linear(), encoder()).unwrap();
        let vitals = VitalSigns {
            bmi: f64::NAN,
            ..VitalSigns::new(30, 22.0, 120, 80, 70, 90)
        };
        assert!(matches!(
            predictor.predict(&vitals),
            Err(TriageError::PredictionFailure(_))
        ));
    }

    #[test]
    fn test_overflowing_score_is_prediction_failure() {
        let classifier = Classifier::Linear {
            coefficients: vec![[0.0; 6], [f64::MAX; 6]],
            intercepts: vec![0.0, 0.0],
        };
        let predictor = ArtifactPredictor::new(scaler(), classifier, encoder()).unwrap();
        let vitals = VitalSigns::new(1000, 900.0, 1000, 1000, 1000, 1000);
        assert!(matches!(
            predictor.predict(&vitals),
            Err(TriageError::PredictionFailure(_))
        ));
    }

    #[test]
    fn test_decode_out_of_range() {
        assert!(matches!(
            encoder().decode(7),
            Err(TriageError::PredictionFailure(_))
        ));
    }

    #[test]
    fn test_classifier_json_shape() {
        let classifier: Classifier = serde_json::from_str(
            r#"{"kind":"linear","coefficients":[[1,0,0,0,0,0]],"intercepts":[0.5]}"#,
        )
        .unwrap();
        assert_eq!(classifier.class_count(), 1);

        let short_row = serde_json::from_str::<Classifier>(
            r#"{"kind":"linear","coefficients":[[1,0,0]],"intercepts":[0.5]}"#,
        );
        assert!(short_row.is_err());
    }
}
