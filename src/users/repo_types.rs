use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use crate::entity::Entity;
use crate::store::timestamp;
use crate::validation::{FieldKind, FieldSpec};

pub const GENDERS: &[&str] = &["male", "female"];
pub const WAIST_SIZES: &[&str] = &["kecil", "sedang", "besar"];
pub const ACTIVITY_LEVELS: &[&str] = &["rendah", "sedang", "tinggi"];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Gender {
    Male,
    Female,
}

/// Waist circumference class.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WaistSize {
    Kecil,
    Sedang,
    Besar,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ActivityLevel {
    Rendah,
    Sedang,
    Tinggi,
}

/// Fields accepted at signup, in validation order.
pub const CREATE_SCHEMA: &[FieldSpec] = &[
    FieldSpec::required("name", FieldKind::String),
    FieldSpec::required("email", FieldKind::Email),
    FieldSpec::required("password", FieldKind::String),
    FieldSpec::required("gender", FieldKind::Enum(GENDERS)),
    FieldSpec::optional("umur", FieldKind::Number),
    FieldSpec::optional("berat", FieldKind::Number),
    FieldSpec::optional("tinggi", FieldKind::Number),
    FieldSpec::optional("lingkarPinggang", FieldKind::Enum(WAIST_SIZES)),
    FieldSpec::optional("tekananDarahTinggi", FieldKind::Boolean),
    FieldSpec::optional("gulaDarahTinggi", FieldKind::Boolean),
    FieldSpec::optional("riwayatDiabetes", FieldKind::Boolean),
    FieldSpec::optional("tingkatAktivitas", FieldKind::Enum(ACTIVITY_LEVELS)),
    FieldSpec::optional("konsumsiBuah", FieldKind::Boolean),
    FieldSpec::optional("kaloriHarian", FieldKind::Number),
    FieldSpec::optional("karbohidratHarian", FieldKind::Number),
    FieldSpec::optional("lemakHarian", FieldKind::Number),
    FieldSpec::optional("proteinHarian", FieldKind::Number),
    FieldSpec::optional("gulaHarian", FieldKind::Number),
];

/// Fields `User::update` may touch. `isPremium`, `userId` and the
/// timestamps are not on it.
pub const UPDATE_FIELDS: &[FieldSpec] = CREATE_SCHEMA;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub user_id: String,
    pub name: String,
    pub email: String,
    /// Argon2 PHC string, never the plaintext.
    pub password: String,
    pub gender: Gender,
    #[serde(default)]
    pub umur: Option<f64>,
    #[serde(default)]
    pub berat: Option<f64>,
    #[serde(default)]
    pub tinggi: Option<f64>,
    #[serde(default)]
    pub lingkar_pinggang: Option<WaistSize>,
    #[serde(default)]
    pub tekanan_darah_tinggi: Option<bool>,
    #[serde(default)]
    pub gula_darah_tinggi: Option<bool>,
    #[serde(default)]
    pub riwayat_diabetes: Option<bool>,
    #[serde(default)]
    pub tingkat_aktivitas: Option<ActivityLevel>,
    #[serde(default)]
    pub konsumsi_buah: Option<bool>,
    #[serde(default)]
    pub kalori_harian: Option<f64>,
    #[serde(default)]
    pub karbohidrat_harian: Option<f64>,
    #[serde(default)]
    pub lemak_harian: Option<f64>,
    #[serde(default)]
    pub protein_harian: Option<f64>,
    #[serde(default)]
    pub gula_harian: Option<f64>,
    #[serde(default)]
    pub is_premium: bool,
    #[serde(with = "timestamp")]
    pub created_at: OffsetDateTime,
    #[serde(with = "timestamp")]
    pub updated_at: OffsetDateTime,
}

impl Entity for User {
    const COLLECTION: &'static str = "users";
    const KEY_FIELD: &'static str = "userId";
    const LABEL: &'static str = "user";

    fn key(&self) -> &str {
        &self.user_id
    }
}
