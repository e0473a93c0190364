use chrono::{ NaiveDate, NaiveDateTime };
use serde::{ Deserialize, Deserializer };
use serde_json::Value;

use super::chat::parse_timestamp;

/// One row of `GET /detalleventa/listar`.
#[derive(Clone, Debug, Default, PartialEq, Deserialize)]
pub struct SaleDetail {
    #[serde(default)]
    pub id: Option<i64>,
    #[serde(default, deserialize_with = "text_or_number")]
    pub cod_pro: Option<String>,
    #[serde(default, deserialize_with = "text_or_number")]
    pub nompro: Option<String>,
    #[serde(default, deserialize_with = "text_or_number")]
    pub cantidad: Option<String>,
    #[serde(default, deserialize_with = "text_or_number")]
    pub precio: Option<String>,
    #[serde(rename = "satisfactionScore", default, deserialize_with = "text_or_number")]
    pub satisfaction_score: Option<String>,
    #[serde(default, deserialize_with = "text_or_number")]
    pub fecha: Option<String>,
}

/// Keeps strings as-is and numbers in their JSON spelling; anything else is absent.
fn text_or_number<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
    where D: Deserializer<'de>
{
    Ok(match Value::deserialize(deserializer)? {
        Value::String(s) => Some(s),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    })
}

impl SaleDetail {
    /// Sort key; rows without a readable date compare lowest.
    pub fn sold_at(&self) -> Option<NaiveDateTime> {
        let raw = self.fecha.as_deref()?.trim();
        parse_timestamp(raw).or_else(|| {
            NaiveDate::parse_from_str(raw, "%Y-%m-%d")
                .ok()
                .and_then(|d| d.and_hms_opt(0, 0, 0))
        })
    }

    /// Substring match over product code, name, quantity, satisfaction score
    /// and price, ignoring the fields' case. `needle` is expected lowercased.
    pub fn matches(&self, needle: &str) -> bool {
        [&self.cod_pro, &self.nompro, &self.cantidad, &self.satisfaction_score, &self.precio]
            .into_iter()
            .flatten()
            .any(|field| field.to_lowercase().contains(needle))
    }
}
