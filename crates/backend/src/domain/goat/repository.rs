use chrono::{DateTime, Utc};
use contracts::domain::goat::aggregate::{Goat, GoatId};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use sea_orm::entity::prelude::*;
use sea_orm::sea_query::{Expr, Func, LikeExpr};
use sea_orm::{
    ColumnTrait, Condition, DatabaseConnection, DbErr, EntityTrait, PaginatorTrait, QueryFilter,
    QueryOrder, QuerySelect, Select, Set,
};

use super::query::{GoatFilter, NumRange, PageSpec, SortField, SortKey, TextMatch};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "goats")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    pub name: String,
    pub breed: String,
    pub age_years: f64,
    pub weight_lbs: f64,
    pub price_usd: f64,
    pub temperament: String,
    pub image_data_url: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub version: i32,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

// A row whose id does not parse is corrupt; surface it as a store error
// rather than handing out a record with a fabricated id.
fn into_goat(m: Model) -> Result<Goat, DbErr> {
    let uuid = Uuid::parse_str(&m.id)
        .map_err(|e| DbErr::Custom(format!("malformed id in goats row: {}", e)))?;
    Ok(Goat {
        id: GoatId::new(uuid),
        name: m.name,
        breed: m.breed,
        age_years: m.age_years,
        weight_lbs: m.weight_lbs,
        price_usd: m.price_usd,
        temperament: m.temperament,
        image_data_url: m.image_data_url,
        created_at: m.created_at,
        updated_at: m.updated_at,
        version: m.version,
    })
}

/// Translate the store-agnostic filter into one sea-orm condition. Every
/// user-supplied value travels as a bound parameter; LIKE metacharacters in
/// substring needles are escaped so the input always matches literally.
fn filter_condition(filter: &GoatFilter) -> Condition {
    let mut cond = Condition::all();
    if let Some(m) = &filter.name {
        cond = cond.add(text_match_expr(Column::Name, m));
    }
    if let Some(m) = &filter.breed {
        cond = cond.add(text_match_expr(Column::Breed, m));
    }
    if let Some(m) = &filter.temperament {
        cond = cond.add(text_match_expr(Column::Temperament, m));
    }
    cond = add_range(cond, Column::AgeYears, &filter.age);
    cond = add_range(cond, Column::WeightLbs, &filter.weight);
    cond = add_range(cond, Column::PriceUsd, &filter.price);
    cond
}

fn text_match_expr(column: Column, m: &TextMatch) -> sea_orm::sea_query::SimpleExpr {
    match m {
        TextMatch::Exact(value) => column.eq(value.clone()),
        TextMatch::Contains(value) => {
            let needle = escape_like(&value.to_lowercase());
            Expr::expr(Func::lower(Expr::col(column)))
                .like(LikeExpr::new(format!("%{}%", needle)).escape('\\'))
        }
    }
}

fn escape_like(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        if matches!(c, '%' | '_' | '\\') {
            out.push('\\');
        }
        out.push(c);
    }
    out
}

fn add_range(mut cond: Condition, column: Column, range: &NumRange) -> Condition {
    if let Some(min) = range.min {
        cond = cond.add(column.gte(min));
    }
    if let Some(max) = range.max {
        cond = cond.add(column.lte(max));
    }
    cond
}

fn apply_sort(mut query: Select<Entity>, keys: &[SortKey]) -> Select<Entity> {
    for key in keys {
        let column = match key.field {
            SortField::CreatedAt => Column::CreatedAt,
            SortField::UpdatedAt => Column::UpdatedAt,
            SortField::PriceUsd => Column::PriceUsd,
            SortField::AgeYears => Column::AgeYears,
            SortField::WeightLbs => Column::WeightLbs,
            SortField::Name => Column::Name,
            SortField::Breed => Column::Breed,
            SortField::Temperament => Column::Temperament,
        };
        query = if key.descending {
            query.order_by_desc(column)
        } else {
            query.order_by_asc(column)
        };
    }
    query
}

/// One page of records plus the total count under the same filter. The
/// count ignores sort and pagination.
pub async fn list(
    db: &DatabaseConnection,
    filter: &GoatFilter,
    sort: &[SortKey],
    page: &PageSpec,
) -> Result<(Vec<Goat>, u64), DbErr> {
    let cond = filter_condition(filter);

    let total = Entity::find().filter(cond.clone()).count(db).await?;

    let query = apply_sort(Entity::find().filter(cond), sort)
        .offset(page.offset())
        .limit(page.limit);
    let items = query
        .all(db)
        .await?
        .into_iter()
        .map(into_goat)
        .collect::<Result<Vec<_>, _>>()?;

    Ok((items, total))
}

pub async fn get_by_id(db: &DatabaseConnection, id: Uuid) -> Result<Option<Goat>, DbErr> {
    let result = Entity::find_by_id(id.to_string()).one(db).await?;
    result.map(into_goat).transpose()
}

pub async fn insert(db: &DatabaseConnection, goat: &Goat) -> Result<(), DbErr> {
    to_active(goat).insert(db).await?;
    Ok(())
}

pub async fn update(db: &DatabaseConnection, goat: &Goat) -> Result<(), DbErr> {
    let mut active = to_active(goat);
    // createdAt is immutable after insert.
    active.created_at = sea_orm::ActiveValue::NotSet;
    active.update(db).await?;
    Ok(())
}

pub async fn delete_by_id(db: &DatabaseConnection, id: Uuid) -> Result<bool, DbErr> {
    let result = Entity::delete_by_id(id.to_string()).exec(db).await?;
    Ok(result.rows_affected > 0)
}

fn to_active(goat: &Goat) -> ActiveModel {
    ActiveModel {
        id: Set(goat.id.as_string()),
        name: Set(goat.name.clone()),
        breed: Set(goat.breed.clone()),
        age_years: Set(goat.age_years),
        weight_lbs: Set(goat.weight_lbs),
        price_usd: Set(goat.price_usd),
        temperament: Set(goat.temperament.clone()),
        image_data_url: Set(goat.image_data_url.clone()),
        created_at: Set(goat.created_at),
        updated_at: Set(goat.updated_at),
        version: Set(goat.version),
    }
}
