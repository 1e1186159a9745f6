use contracts::domain::goat::aggregate::{Goat, GoatDto, GoatId};
use sea_orm::DatabaseConnection;
use serde::Serialize;
use serde_json::Value;

use super::query::{self, ListParams, SelectField};
use super::repository;
use crate::error::AppError;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ListPage {
    pub items: Vec<Value>,
    pub total: u64,
    pub page: u64,
    pub limit: u64,
    pub total_pages: u64,
}

/// Filtered, sorted, paginated listing. One query for the page, one count
/// under the same filter. An empty result is a success with total 0.
pub async fn list(db: &DatabaseConnection, params: &ListParams) -> Result<ListPage, AppError> {
    let filter = query::build_filter(params);
    let sort = query::build_sort(params);
    let select = query::build_select(params);
    let page = query::build_page(params);

    let (records, total) = repository::list(db, &filter, &sort, &page).await?;
    let items = records
        .into_iter()
        .map(|goat| project(goat, select.as_deref()))
        .collect();
    let total_pages = (total + page.limit - 1) / page.limit;

    Ok(ListPage {
        items,
        total,
        page: page.page,
        limit: page.limit,
        total_pages,
    })
}

pub async fn get(db: &DatabaseConnection, id: &str) -> Result<Goat, AppError> {
    let goat_id = parse_id(id)?;
    repository::get_by_id(db, goat_id.value())
        .await?
        .ok_or(AppError::NotFound)
}

pub async fn create(db: &DatabaseConnection, dto: GoatDto) -> Result<Goat, AppError> {
    let age_years = require_number(dto.age_years, "ageYears")?;
    let weight_lbs = require_number(dto.weight_lbs, "weightLbs")?;
    let price_usd = require_number(dto.price_usd, "priceUsd")?;

    let goat = Goat::new_for_insert(
        dto.name.unwrap_or_default(),
        dto.breed.unwrap_or_default(),
        age_years,
        weight_lbs,
        price_usd,
        dto.temperament.unwrap_or_default(),
        dto.image_data_url
            .map(|s| s.trim().to_string())
            .unwrap_or_default(),
    );
    goat.validate().map_err(AppError::Validation)?;

    repository::insert(db, &goat).await?;
    Ok(goat)
}

/// Partial update: only the fields present in the payload change. The DTO
/// deserializer has already dropped unparseable numerics, so they simply
/// never enter the update set.
pub async fn update(db: &DatabaseConnection, id: &str, dto: GoatDto) -> Result<Goat, AppError> {
    let goat_id = parse_id(id)?;
    let mut goat = repository::get_by_id(db, goat_id.value())
        .await?
        .ok_or(AppError::NotFound)?;

    goat.apply_patch(&dto);
    goat.validate().map_err(AppError::Validation)?;
    goat.before_write();

    repository::update(db, &goat).await?;
    Ok(goat)
}

pub async fn remove(db: &DatabaseConnection, id: &str) -> Result<(), AppError> {
    let goat_id = parse_id(id)?;
    if repository::delete_by_id(db, goat_id.value()).await? {
        Ok(())
    } else {
        Err(AppError::NotFound)
    }
}

// A malformed identifier can never resolve to a record, so it reads as
// NotFound rather than echoing attacker-controlled input back as an error.
fn parse_id(id: &str) -> Result<GoatId, AppError> {
    GoatId::parse(id).map_err(|_| AppError::NotFound)
}

fn require_number(value: Option<f64>, field: &str) -> Result<f64, AppError> {
    value.ok_or_else(|| AppError::Validation(format!("{} is required", field)))
}

fn project(goat: Goat, select: Option<&[SelectField]>) -> Value {
    let mut value = serde_json::to_value(&goat).unwrap_or(Value::Null);
    if let (Some(fields), Some(map)) = (select, value.as_object_mut()) {
        map.retain(|key, _| fields.iter().any(|f| f.json_key() == key));
    }
    value
}
