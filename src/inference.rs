use serde::{Deserialize, Serialize};
use std::{collections::HashMap, fs, path::Path};
use tracing::{debug, info};

use crate::{
    error::AppError,
    types::{FeatureRecord, FeatureValue, FEATURE_COUNT},
};

pub const PHISHING_THRESHOLD: f64 = 0.60;

pub const UNKNOWN_CATEGORY: f64 = -1.0;

const LEAF: i64 = -1;

fn read_json<T: serde::de::DeserializeOwned>(path: &Path) -> Result<T, AppError> {
    let content = fs::read_to_string(path)
        .map_err(|e| AppError::ModelLoad(format!("failed to read {}: {}", path.display(), e)))?;
    serde_json::from_str(&content)
        .map_err(|e| AppError::ModelLoad(format!("failed to parse {}: {}", path.display(), e)))
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct TldEncoderFile {
    classes: Vec<String>,
}

#[derive(Debug, Clone)]
pub struct TldEncoder {
    index: HashMap<String, usize>,
}

impl TldEncoder {
    pub fn new(classes: Vec<String>) -> Self {
        let index = classes
            .into_iter()
            .enumerate()
            .map(|(i, class)| (class, i))
            .collect();
        Self { index }
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, AppError> {
        let file: TldEncoderFile = read_json(path.as_ref())?;
        Ok(Self::new(file.classes))
    }

    pub fn encode(&self, tld: &str) -> f64 {
        self.index
            .get(tld)
            .map_or(UNKNOWN_CATEGORY, |i| *i as f64)
    }

    pub fn class_count(&self) -> usize {
        self.index.len()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StandardScaler {
    pub mean: Vec<f64>,
    pub scale: Vec<f64>,
}

impl StandardScaler {
    pub fn load(path: impl AsRef<Path>) -> Result<Self, AppError> {
        let scaler: StandardScaler = read_json(path.as_ref())?;
        scaler.validate()?;
        Ok(scaler)
    }

    fn validate(&self) -> Result<(), AppError> {
        if self.mean.len() != FEATURE_COUNT || self.scale.len() != FEATURE_COUNT {
            return Err(AppError::ModelLoad(format!(
                "scaler expects {} columns, got mean={} scale={}",
                FEATURE_COUNT,
                self.mean.len(),
                self.scale.len()
            )));
        }
        Ok(())
    }

    pub fn transform(&self, row: &[f64; FEATURE_COUNT]) -> [f64; FEATURE_COUNT] {
        std::array::from_fn(|i| {
            let scale = if self.scale[i] == 0.0 { 1.0 } else { self.scale[i] };
            (row[i] - self.mean[i]) / scale
        })
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DecisionTree {
    pub children_left: Vec<i64>,
    pub children_right: Vec<i64>,
    pub feature: Vec<i64>,
    pub threshold: Vec<f64>,
    pub value: Vec<Vec<f64>>,
}

impl DecisionTree {
    fn validate(&self, n_classes: usize) -> Result<(), AppError> {
        let nodes = self.children_left.len();
        if nodes == 0
            || self.children_right.len() != nodes
            || self.feature.len() != nodes
            || self.threshold.len() != nodes
            || self.value.len() != nodes
        {
            return Err(AppError::ModelLoad("tree node arrays differ in length".to_string()));
        }

        for node in 0..nodes {
            let (left, right) = (self.children_left[node], self.children_right[node]);
            if left == LEAF {
                if self.value[node].len() != n_classes {
                    return Err(AppError::ModelLoad(format!(
                        "leaf {} has {} class weights, expected {}",
                        node,
                        self.value[node].len(),
                        n_classes
                    )));
                }
                continue;
            }
            let in_range = |child: i64| child > node as i64 && (child as usize) < nodes;
            if !in_range(left) || !in_range(right) {
                return Err(AppError::ModelLoad(format!("node {} has invalid children", node)));
            }
            let feature = self.feature[node];
            if feature < 0 || feature as usize >= FEATURE_COUNT {
                return Err(AppError::ModelLoad(format!(
                    "node {} splits on unknown feature {}",
                    node, feature
                )));
            }
        }
        Ok(())
    }

    // Children have larger indices than their parent (checked on load).
    fn leaf_distribution(&self, row: &[f64; FEATURE_COUNT]) -> Vec<f64> {
        let mut node = 0usize;
        while self.children_left[node] != LEAF {
            let feature = self.feature[node] as usize;
            node = if row[feature] <= self.threshold[node] {
                self.children_left[node] as usize
            } else {
                self.children_right[node] as usize
            };
        }

        let weights = &self.value[node];
        let total: f64 = weights.iter().sum();
        if total > 0.0 {
            weights.iter().map(|w| w / total).collect()
        } else {
            vec![0.0; weights.len()]
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ForestClassifier {
    pub n_classes: usize,
    // Training labels use 0 for phishing.
    #[serde(default)]
    pub phishing_class_index: usize,
    pub trees: Vec<DecisionTree>,
}

impl ForestClassifier {
    pub fn load(path: impl AsRef<Path>) -> Result<Self, AppError> {
        let forest: ForestClassifier = read_json(path.as_ref())?;
        forest.validate()?;
        Ok(forest)
    }

    fn validate(&self) -> Result<(), AppError> {
        if self.trees.is_empty() {
            return Err(AppError::ModelLoad("classifier has no trees".to_string()));
        }
        if self.phishing_class_index >= self.n_classes {
            return Err(AppError::ModelLoad(format!(
                "phishing class index {} out of range for {} classes",
                self.phishing_class_index, self.n_classes
            )));
        }
        for tree in &self.trees {
            tree.validate(self.n_classes)?;
        }
        Ok(())
    }

    pub fn predict_proba(&self, row: &[f64; FEATURE_COUNT]) -> Vec<f64> {
        let mut sums = vec![0.0; self.n_classes];
        for tree in &self.trees {
            for (sum, p) in sums.iter_mut().zip(tree.leaf_distribution(row)) {
                *sum += p;
            }
        }
        let trees = self.trees.len() as f64;
        sums.into_iter().map(|s| s / trees).collect()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Prediction {
    pub probability: f64,
    pub is_phishing: bool,
}

#[derive(Debug, Clone)]
pub struct PhishingModel {
    encoder: TldEncoder,
    scaler: StandardScaler,
    classifier: ForestClassifier,
}

impl PhishingModel {
    pub fn new(encoder: TldEncoder, scaler: StandardScaler, classifier: ForestClassifier) -> Result<Self, AppError> {
        scaler.validate()?;
        classifier.validate()?;
        Ok(Self {
            encoder,
            scaler,
            classifier,
        })
    }

    pub fn load(
        model_path: impl AsRef<Path>,
        encoder_path: impl AsRef<Path>,
        scaler_path: impl AsRef<Path>,
    ) -> Result<Self, AppError> {
        let classifier = ForestClassifier::load(model_path)?;
        let encoder = TldEncoder::load(encoder_path)?;
        let scaler = StandardScaler::load(scaler_path)?;
        info!(
            "Model loaded: {} trees, {} classes, {} known TLDs",
            classifier.trees.len(),
            classifier.n_classes,
            encoder.class_count()
        );
        Self::new(encoder, scaler, classifier)
    }

    pub fn encode(&self, record: &FeatureRecord) -> [f64; FEATURE_COUNT] {
        let entries = record.entries();
        std::array::from_fn(|i| match entries[i].1 {
            FeatureValue::Category(tld) => self.encoder.encode(tld),
            FeatureValue::Number(value) => value,
        })
    }

    pub fn predict(&self, record: &FeatureRecord) -> Prediction {
        let row = self.scaler.transform(&self.encode(record));
        let probabilities = self.classifier.predict_proba(&row);
        let probability = probabilities[self.classifier.phishing_class_index];
        debug!("Class probabilities: {:?}", probabilities);

        Prediction {
            probability,
            is_phishing: probability > PHISHING_THRESHOLD,
        }
    }
}
