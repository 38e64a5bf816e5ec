use serde::Serialize;
use serde_json::Value;

use super::repo_types::Food;
use crate::classifier::Prediction;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FoodView {
    pub food_id: String,
    pub name: String,
    pub gula: f64,
    pub karbohidrat: f64,
    pub protein: f64,
    pub lemak: f64,
}

impl From<Food> for FoodView {
    fn from(f: Food) -> Self {
        Self {
            food_id: f.food_id,
            name: f.name,
            gula: f.gula,
            karbohidrat: f.karbohidrat,
            protein: f.protein,
            lemak: f.lemak,
        }
    }
}

/// A classifier guess joined with the catalog entry for its label.
#[derive(Debug, Serialize)]
pub struct PredictedFood {
    #[serde(flatten)]
    pub prediction: Prediction,
    #[serde(flatten)]
    pub nutrition: Value,
}
