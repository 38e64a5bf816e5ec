use serde::Serialize;

/// A log joined with its food. Nutrition is `null` when the food is no
/// longer in the catalog. Times are RFC 3339 in the display offset.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LogEntry {
    pub user_log_id: String,
    pub user_id: String,
    pub food_id: String,
    pub image_url: String,
    pub name: Option<String>,
    pub gula: Option<f64>,
    pub karbohidrat: Option<f64>,
    pub lemak: Option<f64>,
    pub protein: Option<f64>,
    pub created_at: String,
    pub updated_at: String,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LogView {
    pub user_log_id: String,
    pub user_id: String,
    pub food_id: String,
    pub image_url: String,
    pub created_at: String,
    pub updated_at: String,
}

/// Grams eaten on `date`. Logs whose food could not be resolved are left
/// out of the totals and their food ids listed in `skippedFoodIds`.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DailyNutrition {
    pub date: String,
    pub gula: f64,
    pub karbohidrat: f64,
    pub protein: f64,
    pub lemak: f64,
    pub log_count: usize,
    pub skipped_food_ids: Vec<String>,
}
