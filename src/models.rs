use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Low,
    Medium,
    High,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DiseaseType {
    Disease,
    Healthy,
}

impl DiseaseType {
    /// Anything whose label mentions "healthy" (any case) is the healthy class.
    pub fn from_label(label: &str) -> Self {
        if label.to_lowercase().contains("healthy") {
            Self::Healthy
        } else {
            Self::Disease
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiseaseClass {
    pub index: usize,
    pub label: String,
    pub severity: Severity,
    pub disease_type: DiseaseType,
}

/// Fixed class table, built once at startup and shared read-only.
#[derive(Debug, Clone)]
pub struct ClassCatalog {
    classes: Vec<DiseaseClass>,
}

impl ClassCatalog {
    /// Labels are indexed in order. Labels without a severity entry fall back
    /// to `Severity::Medium`.
    pub fn new<L, S>(labels: L, severities: &HashMap<String, Severity>) -> Self
    where
        L: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let classes = labels
            .into_iter()
            .enumerate()
            .map(|(index, label)| {
                let label = label.into();
                DiseaseClass {
                    index,
                    severity: severities.get(&label).copied().unwrap_or(Severity::Medium),
                    disease_type: DiseaseType::from_label(&label),
                    label,
                }
            })
            .collect();
        Self { classes }
    }

    /// The six PlantVillage bean classes.
    pub fn plant_village() -> Self {
        let severities: HashMap<String, Severity> = [
            ("Bean_healthy", Severity::Low),
            ("Bean_angular_leaf_spot", Severity::Medium),
            ("Bean_bacterial_blight", Severity::High),
            ("Bean_bean_rust", Severity::Medium),
            ("Bean_common_bacterial_blight", Severity::High),
            ("Bean_web_blight", Severity::Medium),
        ]
        .into_iter()
        .map(|(label, severity)| (label.to_string(), severity))
        .collect();

        Self::new(
            [
                "Bean_angular_leaf_spot",
                "Bean_bacterial_blight",
                "Bean_bean_rust",
                "Bean_common_bacterial_blight",
                "Bean_healthy",
                "Bean_web_blight",
            ],
            &severities,
        )
    }

    pub fn len(&self) -> usize {
        self.classes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.classes.is_empty()
    }

    pub fn classes(&self) -> &[DiseaseClass] {
        &self.classes
    }

    pub fn get(&self, index: usize) -> Option<&DiseaseClass> {
        self.classes.get(index)
    }

    pub fn labels_by_index(&self) -> BTreeMap<usize, String> {
        self.classes
            .iter()
            .map(|class| (class.index, class.label.clone()))
            .collect()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Prediction {
    #[serde(rename = "class")]
    pub label: String,
    pub confidence: f64,
    pub severity: Severity,
    pub disease_type: DiseaseType,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageSize {
    pub width: u32,
    pub height: u32,
}

/// Ranked output for one image, before timing is attached.
#[derive(Debug, Clone, PartialEq)]
pub struct Analysis {
    pub predictions: Vec<Prediction>,
    pub top_prediction: Prediction,
    pub image_size: ImageSize,
}

#[derive(Debug, Serialize)]
pub struct AnalyzeResponse {
    pub success: bool,
    pub predictions: Vec<Prediction>,
    pub top_prediction: Prediction,
    pub processing_time: f64,
    pub image_size: ImageSize,
}

impl AnalyzeResponse {
    pub fn new(analysis: Analysis, processing_time: f64) -> Self {
        Self {
            success: true,
            predictions: analysis.predictions,
            top_prediction: analysis.top_prediction,
            processing_time,
            image_size: analysis.image_size,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub service: String,
    pub version: String,
    pub model_classes: usize,
}

#[derive(Debug, Serialize)]
pub struct ModelInfoResponse {
    pub model_type: String,
    pub classes: BTreeMap<usize, String>,
    pub total_classes: usize,
    pub input_size: [u32; 2],
    pub framework: String,
    pub description: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plant_village_table() {
        let catalog = ClassCatalog::plant_village();
        assert_eq!(catalog.len(), 6);

        let healthy = catalog.get(4).unwrap();
        assert_eq!(healthy.label, "Bean_healthy");
        assert_eq!(healthy.severity, Severity::Low);
        assert_eq!(healthy.disease_type, DiseaseType::Healthy);

        let blight = catalog.get(1).unwrap();
        assert_eq!(blight.severity, Severity::High);
        assert_eq!(blight.disease_type, DiseaseType::Disease);

        let healthy_count = catalog
            .classes()
            .iter()
            .filter(|c| c.disease_type == DiseaseType::Healthy)
            .count();
        assert_eq!(healthy_count, 1);
    }

    #[test]
    fn unmapped_label_defaults_to_medium() {
        let catalog = ClassCatalog::new(["Leaf_mosaic"], &HashMap::new());
        assert_eq!(catalog.get(0).unwrap().severity, Severity::Medium);
    }

    #[test]
    fn healthy_match_ignores_case() {
        assert_eq!(DiseaseType::from_label("HEALTHY_leaf"), DiseaseType::Healthy);
        assert_eq!(DiseaseType::from_label("Bean_rust"), DiseaseType::Disease);
    }

    #[test]
    fn prediction_wire_format() {
        let prediction = Prediction {
            label: "Bean_bean_rust".to_string(),
            confidence: 0.5,
            severity: Severity::Medium,
            disease_type: DiseaseType::Disease,
        };
        let json = serde_json::to_value(&prediction).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "class": "Bean_bean_rust",
                "confidence": 0.5,
                "severity": "medium",
                "disease_type": "disease"
            })
        );
    }

    #[test]
    fn class_keys_serialize_as_strings() {
        let json = serde_json::to_value(ClassCatalog::plant_village().labels_by_index()).unwrap();
        assert_eq!(json["0"], "Bean_angular_leaf_spot");
        assert_eq!(json["5"], "Bean_web_blight");
    }
}
