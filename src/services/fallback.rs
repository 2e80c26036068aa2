use std::time::Duration;

use crate::models::{AnalysisResult, FoodItem, NutritionTotal};

/// Delay applied before handing out sample data so the loading state stays visible.
pub const DEFAULT_FALLBACK_DELAY: Duration = Duration::from_millis(2000);

fn food(name: &str, quantity: &str, calories: f64, protein: f64, carbs: f64, fat: f64) -> FoodItem {
    FoodItem {
        name: name.to_string(),
        quantity: quantity.to_string(),
        calories,
        protein,
        carbs,
        fat,
    }
}

/// Fixed sample analysis returned in offline mode or when every attempt failed.
pub fn canned_result() -> AnalysisResult {
    AnalysisResult {
        status: "success".to_string(),
        food: vec![
            food("Grilled Chicken Breast", "150g", 248.0, 46.0, 0.0, 5.3),
            food("Cherry Tomatoes", "100g", 18.0, 0.9, 3.9, 0.2),
            food("Mixed Vegetables", "120g", 45.0, 2.1, 8.5, 0.3),
        ],
        // Rounded by hand; not recomputed from the items.
        total: NutritionTotal {
            calories: 311.0,
            protein: 49.0,
            carbs: 12.4,
            fat: 5.8,
        },
    }
}

/// Wait `delay`, then return the canned result.
pub async fn delayed_canned_result(delay: Duration) -> AnalysisResult {
    if !delay.is_zero() {
        tokio::time::sleep(delay).await;
    }
    canned_result()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_canned_result_is_fixed() {
        let result = canned_result();
        assert_eq!(result, canned_result());
        assert_eq!(result.status, "success");

        let names: Vec<&str> = result.food.iter().map(|f| f.name.as_str()).collect();
        assert_eq!(names, vec!["Grilled Chicken Breast", "Cherry Tomatoes", "Mixed Vegetables"]);

        assert_eq!(
            result.total,
            NutritionTotal {
                calories: 311.0,
                protein: 49.0,
                carbs: 12.4,
                fat: 5.8
            }
        );
    }

    #[test]
    fn test_canned_total_matches_items() {
        let result = canned_result();
        let summed = NutritionTotal::from_items(&result.food);

        assert!((summed.calories - result.total.calories).abs() < 1e-9);
        assert!((summed.protein - result.total.protein).abs() < 1e-9);
        assert!((summed.carbs - result.total.carbs).abs() < 1e-9);
        assert!((summed.fat - result.total.fat).abs() < 0.01);
    }

    #[tokio::test]
    async fn test_delayed_canned_result_waits() {
        let start = std::time::Instant::now();
        let result = delayed_canned_result(Duration::from_millis(50)).await;
        assert!(start.elapsed() >= Duration::from_millis(50));
        assert_eq!(result, canned_result());
    }
}
