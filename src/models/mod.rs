use serde::{Deserialize, Serialize};

/// kcal per gram of protein or carbohydrate
pub const KCAL_PER_GRAM_PROTEIN: f64 = 4.0;
pub const KCAL_PER_GRAM_CARBS: f64 = 4.0;
/// kcal per gram of fat
pub const KCAL_PER_GRAM_FAT: f64 = 9.0;

/// Image handed over by the caller for one analysis call.
#[derive(Debug, Clone)]
pub struct AnalysisRequest {
    bytes: Vec<u8>,
    media_type: String,
    file_name: String,
}

impl AnalysisRequest {
    pub fn new(bytes: Vec<u8>, media_type: impl Into<String>, file_name: impl Into<String>) -> Self {
        Self {
            bytes,
            media_type: media_type.into(),
            file_name: file_name.into(),
        }
    }

    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn media_type(&self) -> &str {
        &self.media_type
    }

    pub fn file_name(&self) -> &str {
        &self.file_name
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    /// Only `image/*` uploads are accepted by the front-ends.
    pub fn is_image(&self) -> bool {
        self.media_type.starts_with("image/")
    }
}

/// Image media type for a file name, `None` when the extension is not a known image.
pub fn media_type_for(file_name: &str) -> Option<&'static str> {
    let lower = file_name.to_lowercase();
    if lower.ends_with(".png") {
        Some("image/png")
    } else if lower.ends_with(".jpg") || lower.ends_with(".jpeg") {
        Some("image/jpeg")
    } else if lower.ends_with(".webp") {
        Some("image/webp")
    } else if lower.ends_with(".gif") {
        Some("image/gif")
    } else {
        None
    }
}

/// Fallback for bytes of unknown type; never passes `is_image()`.
pub const UNKNOWN_MEDIA_TYPE: &str = "application/octet-stream";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FoodItem {
    pub name: String,
    pub quantity: String, // serbest metin, örn: "150g"
    pub calories: f64,
    pub protein: f64,
    pub carbs: f64,
    pub fat: f64,
}

impl FoodItem {
    /// Energy implied by the macros alone, independent of `calories`.
    pub fn macro_calories(&self) -> f64 {
        self.protein * KCAL_PER_GRAM_PROTEIN
            + self.carbs * KCAL_PER_GRAM_CARBS
            + self.fat * KCAL_PER_GRAM_FAT
    }

    fn has_negative_field(&self) -> bool {
        [self.calories, self.protein, self.carbs, self.fat]
            .iter()
            .any(|v| *v < 0.0)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NutritionTotal {
    pub calories: f64,
    pub protein: f64,
    pub carbs: f64,
    pub fat: f64,
}

/// Percent of total calories contributed by each macro.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct MacroBreakdown {
    pub protein_pct: f64,
    pub carbs_pct: f64,
    pub fat_pct: f64,
}

impl NutritionTotal {
    pub fn from_items(items: &[FoodItem]) -> Self {
        items.iter().fold(Self::default(), |acc, item| Self {
            calories: acc.calories + item.calories,
            protein: acc.protein + item.protein,
            carbs: acc.carbs + item.carbs,
            fat: acc.fat + item.fat,
        })
    }

    /// Shares are relative to the reported `calories`, so they need not add up to 100.
    pub fn macro_breakdown(&self) -> MacroBreakdown {
        if self.calories <= 0.0 {
            return MacroBreakdown {
                protein_pct: 0.0,
                carbs_pct: 0.0,
                fat_pct: 0.0,
            };
        }

        MacroBreakdown {
            protein_pct: self.protein * KCAL_PER_GRAM_PROTEIN / self.calories * 100.0,
            carbs_pct: self.carbs * KCAL_PER_GRAM_CARBS / self.calories * 100.0,
            fat_pct: self.fat * KCAL_PER_GRAM_FAT / self.calories * 100.0,
        }
    }

    fn has_negative_field(&self) -> bool {
        [self.calories, self.protein, self.carbs, self.fat]
            .iter()
            .any(|v| *v < 0.0)
    }
}

/// Nutrition payload found inside the webhook's `output` envelope.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisResult {
    pub status: String,
    /// Detection order as reported by the remote side.
    pub food: Vec<FoodItem>,
    pub total: NutritionTotal,
}

impl AnalysisResult {
    /// All food items and the total must carry non-negative numbers.
    pub fn is_well_formed(&self) -> bool {
        !self.total.has_negative_field() && !self.food.iter().any(FoodItem::has_negative_field)
    }
}

/// Per-call switch between live analysis and the canned sample data.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ClientConfiguration {
    pub use_offline_fallback: bool,
}

impl ClientConfiguration {
    pub fn live() -> Self {
        Self {
            use_offline_fallback: false,
        }
    }

    pub fn offline() -> Self {
        Self {
            use_offline_fallback: true,
        }
    }
}
