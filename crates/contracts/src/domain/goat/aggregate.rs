use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use uuid::Uuid;

// ============================================================================
// ID Type
// ============================================================================
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct GoatId(pub Uuid);

impl GoatId {
    pub fn new(value: Uuid) -> Self {
        Self(value)
    }

    pub fn new_v4() -> Self {
        Self(Uuid::new_v4())
    }

    pub fn value(&self) -> Uuid {
        self.0
    }

    pub fn as_string(&self) -> String {
        self.0.to_string()
    }

    pub fn parse(s: &str) -> Result<Self, String> {
        Uuid::parse_str(s)
            .map(GoatId::new)
            .map_err(|e| format!("Invalid UUID: {}", e))
    }
}

// ============================================================================
// Field bounds
// ============================================================================
pub const NAME_MAX_LEN: usize = 100;
pub const BREED_MAX_LEN: usize = 80;
pub const TEMPERAMENT_MAX_LEN: usize = 60;
pub const AGE_YEARS_MAX: f64 = 25.0;
pub const WEIGHT_LBS_MAX: f64 = 500.0;
pub const PRICE_USD_MAX: f64 = 100_000.0;

// ============================================================================
// Aggregate Root
// ============================================================================
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Goat {
    pub id: GoatId,
    pub name: String,
    pub breed: String,
    pub age_years: f64,
    pub weight_lbs: f64,
    pub price_usd: f64,
    pub temperament: String,
    /// Embedded image as a data URL, e.g. "data:image/jpeg;base64,...".
    #[serde(default)]
    pub image_data_url: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[serde(default)]
    pub version: i32,
}

impl Goat {
    #[allow(clippy::too_many_arguments)]
    pub fn new_for_insert(
        name: String,
        breed: String,
        age_years: f64,
        weight_lbs: f64,
        price_usd: f64,
        temperament: String,
        image_data_url: String,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: GoatId::new_v4(),
            name: name.trim().to_string(),
            breed: breed.trim().to_string(),
            age_years,
            weight_lbs,
            price_usd,
            temperament: temperament.trim().to_string(),
            image_data_url,
            created_at: now,
            updated_at: now,
            version: 0,
        }
    }

    /// Apply only the fields present in the patch. Absent fields are left
    /// untouched; text fields are trimmed on the way in.
    pub fn apply_patch(&mut self, dto: &GoatDto) {
        if let Some(name) = &dto.name {
            self.name = name.trim().to_string();
        }
        if let Some(breed) = &dto.breed {
            self.breed = breed.trim().to_string();
        }
        if let Some(temperament) = &dto.temperament {
            self.temperament = temperament.trim().to_string();
        }
        if let Some(image) = &dto.image_data_url {
            self.image_data_url = image.trim().to_string();
        }
        if let Some(age) = dto.age_years {
            self.age_years = age;
        }
        if let Some(weight) = dto.weight_lbs {
            self.weight_lbs = weight;
        }
        if let Some(price) = dto.price_usd {
            self.price_usd = price;
        }
    }

    pub fn validate(&self) -> Result<(), String> {
        if self.name.is_empty() {
            return Err("name is required".into());
        }
        if self.name.chars().count() > NAME_MAX_LEN {
            return Err(format!("name must be at most {} characters", NAME_MAX_LEN));
        }
        if self.breed.is_empty() {
            return Err("breed is required".into());
        }
        if self.breed.chars().count() > BREED_MAX_LEN {
            return Err(format!("breed must be at most {} characters", BREED_MAX_LEN));
        }
        if self.temperament.is_empty() {
            return Err("temperament is required".into());
        }
        if self.temperament.chars().count() > TEMPERAMENT_MAX_LEN {
            return Err(format!(
                "temperament must be at most {} characters",
                TEMPERAMENT_MAX_LEN
            ));
        }
        check_range("ageYears", self.age_years, AGE_YEARS_MAX)?;
        check_range("weightLbs", self.weight_lbs, WEIGHT_LBS_MAX)?;
        check_range("priceUsd", self.price_usd, PRICE_USD_MAX)?;
        Ok(())
    }

    pub fn before_write(&mut self) {
        self.updated_at = Utc::now();
        self.version += 1;
    }
}

fn check_range(field: &str, value: f64, max: f64) -> Result<(), String> {
    if !value.is_finite() || value < 0.0 || value > max {
        return Err(format!("{} must be between 0 and {}", field, max));
    }
    Ok(())
}

// ============================================================================
// DTO
// ============================================================================
/// Incoming payload for create (POST) and partial update (PATCH). Every
/// field is optional; create decides which ones are required. Numeric
/// fields accept JSON numbers or numeric strings; anything else is dropped
/// rather than rejected, so a malformed number can never reach the store.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GoatDto {
    pub name: Option<String>,
    pub breed: Option<String>,
    #[serde(default, deserialize_with = "lenient_number")]
    pub age_years: Option<f64>,
    #[serde(default, deserialize_with = "lenient_number")]
    pub weight_lbs: Option<f64>,
    #[serde(default, deserialize_with = "lenient_number")]
    pub price_usd: Option<f64>,
    pub temperament: Option<String>,
    pub image_data_url: Option<String>,
}

fn lenient_number<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    let parsed = match value {
        Some(Value::Number(n)) => n.as_f64(),
        Some(Value::String(s)) => s.trim().parse::<f64>().ok(),
        _ => None,
    };
    Ok(parsed.filter(|n| n.is_finite()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn sample() -> Goat {
        Goat::new_for_insert(
            "Clementine".into(),
            "Nigerian Dwarf".into(),
            3.0,
            55.0,
            420.0,
            "curious".into(),
            String::new(),
        )
    }

    #[test]
    fn new_for_insert_trims_and_stamps() {
        let goat = Goat::new_for_insert(
            "  Billy  ".into(),
            " Alpine ".into(),
            2.0,
            140.0,
            300.0,
            " stubborn ".into(),
            String::new(),
        );
        assert_eq!(goat.name, "Billy");
        assert_eq!(goat.breed, "Alpine");
        assert_eq!(goat.temperament, "stubborn");
        assert_eq!(goat.created_at, goat.updated_at);
        assert_eq!(goat.version, 0);
        assert!(goat.validate().is_ok());
    }

    #[test]
    fn validate_rejects_out_of_bounds_numbers() {
        let mut goat = sample();
        goat.age_years = -1.0;
        assert!(goat.validate().is_err());

        let mut goat = sample();
        goat.age_years = 26.0;
        assert!(goat.validate().is_err());

        let mut goat = sample();
        goat.weight_lbs = 500.5;
        assert!(goat.validate().is_err());

        let mut goat = sample();
        goat.price_usd = f64::NAN;
        assert!(goat.validate().is_err());
    }

    #[test]
    fn validate_rejects_missing_or_oversized_text() {
        let mut goat = sample();
        goat.name = String::new();
        assert!(goat.validate().is_err());

        let mut goat = sample();
        goat.breed = "x".repeat(BREED_MAX_LEN + 1);
        assert!(goat.validate().is_err());

        let mut goat = sample();
        goat.temperament = "x".repeat(TEMPERAMENT_MAX_LEN);
        assert!(goat.validate().is_ok());
    }

    #[test]
    fn apply_patch_touches_only_present_fields() {
        let mut goat = sample();
        let created = goat.created_at;
        goat.apply_patch(&GoatDto {
            price_usd: Some(500.0),
            ..Default::default()
        });
        assert_eq!(goat.price_usd, 500.0);
        assert_eq!(goat.name, "Clementine");
        assert_eq!(goat.age_years, 3.0);
        assert_eq!(goat.created_at, created);
    }

    #[test]
    fn dto_accepts_numbers_and_numeric_strings() {
        let dto: GoatDto =
            serde_json::from_value(json!({"ageYears": 4, "weightLbs": "120.5"})).unwrap();
        assert_eq!(dto.age_years, Some(4.0));
        assert_eq!(dto.weight_lbs, Some(120.5));
    }

    #[test]
    fn dto_drops_unparseable_numbers() {
        let dto: GoatDto = serde_json::from_value(json!({
            "ageYears": "old",
            "weightLbs": null,
            "priceUsd": {"$gt": ""}
        }))
        .unwrap();
        assert_eq!(dto.age_years, None);
        assert_eq!(dto.weight_lbs, None);
        assert_eq!(dto.price_usd, None);
    }

    #[test]
    fn goat_serializes_in_camel_case() {
        let value = serde_json::to_value(sample()).unwrap();
        assert!(value.get("ageYears").is_some());
        assert!(value.get("weightLbs").is_some());
        assert!(value.get("priceUsd").is_some());
        assert!(value.get("imageDataUrl").is_some());
        assert!(value.get("createdAt").is_some());
        assert!(value.get("updatedAt").is_some());
    }
}
