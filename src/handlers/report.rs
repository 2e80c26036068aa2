use crate::models::AnalysisResult;

struct ProgressBar {
    bar: String,
    percentage: i32,
}

fn create_progress_bar(percentage: f64) -> ProgressBar {
    let percentage = percentage.clamp(0.0, 100.0).round() as i32;
    let filled = (percentage / 10) as usize; // 10 basamak
    let empty = 10 - filled;

    let bar = format!("{}{}", "█".repeat(filled), "░".repeat(empty));

    ProgressBar { bar, percentage }
}

/// Plain-text rendering of an analysis: total, macro shares, detected foods.
pub fn format_meal_report(result: &AnalysisResult) -> String {
    let total = &result.total;
    let breakdown = total.macro_breakdown();

    let macros = [
        ("Protein", total.protein, breakdown.protein_pct),
        ("Carbs", total.carbs, breakdown.carbs_pct),
        ("Fat", total.fat, breakdown.fat_pct),
    ];

    let mut report = format!(
        "🍽️ Total Nutrition\n\
         🔥 {:.0} kcal\n\n",
        total.calories
    );

    for (name, grams, pct) in macros {
        let bar = create_progress_bar(pct);
        report.push_str(&format!(
            "{:<8} {} {:.1}g ({}%)\n",
            name, bar.bar, grams, bar.percentage
        ));
    }

    report.push_str(&format!("\n🥗 Detected Foods ({} items)\n", result.food.len()));
    if result.food.is_empty() {
        report.push_str("  (none)\n");
    }
    for item in &result.food {
        report.push_str(&format!(
            "  • {} ({}) - {:.0} kcal | P {:.1}g C {:.1}g F {:.1}g | macros {:.0} kcal\n",
            item.name,
            item.quantity,
            item.calories,
            item.protein,
            item.carbs,
            item.fat,
            item.macro_calories()
        ));
    }

    report.trim_end().to_string()
}
