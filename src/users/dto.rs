use serde::Serialize;
use time::OffsetDateTime;

use super::repo_types::{ActivityLevel, Gender, User, WaistSize};
use crate::store::timestamp;

/// A user as clients see it: everything except the password hash.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PublicUser {
    pub user_id: String,
    pub name: String,
    pub email: String,
    pub gender: Gender,
    pub umur: Option<f64>,
    pub berat: Option<f64>,
    pub tinggi: Option<f64>,
    pub lingkar_pinggang: Option<WaistSize>,
    pub tekanan_darah_tinggi: Option<bool>,
    pub gula_darah_tinggi: Option<bool>,
    pub riwayat_diabetes: Option<bool>,
    pub tingkat_aktivitas: Option<ActivityLevel>,
    pub konsumsi_buah: Option<bool>,
    pub kalori_harian: Option<f64>,
    pub karbohidrat_harian: Option<f64>,
    pub lemak_harian: Option<f64>,
    pub protein_harian: Option<f64>,
    pub gula_harian: Option<f64>,
    pub is_premium: bool,
    #[serde(with = "timestamp")]
    pub created_at: OffsetDateTime,
    #[serde(with = "timestamp")]
    pub updated_at: OffsetDateTime,
}

impl From<User> for PublicUser {
    fn from(u: User) -> Self {
        Self {
            user_id: u.user_id,
            name: u.name,
            email: u.email,
            gender: u.gender,
            umur: u.umur,
            berat: u.berat,
            tinggi: u.tinggi,
            lingkar_pinggang: u.lingkar_pinggang,
            tekanan_darah_tinggi: u.tekanan_darah_tinggi,
            gula_darah_tinggi: u.gula_darah_tinggi,
            riwayat_diabetes: u.riwayat_diabetes,
            tingkat_aktivitas: u.tingkat_aktivitas,
            konsumsi_buah: u.konsumsi_buah,
            kalori_harian: u.kalori_harian,
            karbohidrat_harian: u.karbohidrat_harian,
            lemak_harian: u.lemak_harian,
            protein_harian: u.protein_harian,
            gula_harian: u.gula_harian,
            is_premium: u.is_premium,
            created_at: u.created_at,
            updated_at: u.updated_at,
        }
    }
}
