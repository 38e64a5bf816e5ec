//! Catalog rows as exported by the labelling pipeline.

use serde::Deserialize;
use serde_json::{json, Value};

#[derive(Debug, Clone, Deserialize)]
pub struct CatalogEntry {
    pub image_name: String,
    pub glucose: f64,
    pub karbohidrat: f64,
    pub protein: f64,
    pub lemak: f64,
}

impl CatalogEntry {
    /// Food creation payload; the display name is the label with dashes as
    /// spaces.
    pub fn to_food_data(&self) -> Value {
        json!({
            "foodId": self.image_name,
            "name": self.image_name.replace('-', " "),
            "gula": self.glucose,
            "karbohidrat": self.karbohidrat,
            "protein": self.protein,
            "lemak": self.lemak,
        })
    }
}

pub fn parse_catalog(raw: &str) -> serde_json::Result<Vec<CatalogEntry>> {
    serde_json::from_str(raw)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn maps_catalog_rows_to_food_payloads() {
        let rows = parse_catalog(
            r#"[{"image_name":"Indomie-Goreng-72g","glucose":7,"karbohidrat":54,"protein":8,"lemak":17}]"#,
        )
        .unwrap();
        let data = rows[0].to_food_data();
        assert_eq!(data["foodId"], "Indomie-Goreng-72g");
        assert_eq!(data["name"], "Indomie Goreng 72g");
        assert_eq!(data["gula"], 7.0);
    }
}
