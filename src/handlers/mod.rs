pub mod report;

pub use report::format_meal_report;
