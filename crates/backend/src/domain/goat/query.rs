use serde::Deserialize;

pub const DEFAULT_LIMIT: u64 = 50;
pub const MAX_LIMIT: u64 = 100;

/// Raw, untrusted query parameters for GET /api/goats. Everything is an
/// optional string so that malformed input can never fail extraction; the
/// build functions below decide what survives. Unknown parameters are
/// ignored by serde.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListParams {
    pub name: Option<String>,
    pub breed: Option<String>,
    pub temperament: Option<String>,
    pub eq_name: Option<String>,
    pub eq_breed: Option<String>,
    pub eq_temperament: Option<String>,
    pub min_age: Option<String>,
    pub max_age: Option<String>,
    pub min_weight: Option<String>,
    pub max_weight: Option<String>,
    pub min_price: Option<String>,
    pub max_price: Option<String>,
    pub sort: Option<String>,
    pub select: Option<String>,
    pub page: Option<String>,
    pub limit: Option<String>,
}

/// A match condition on one text field. `Contains` is case-insensitive
/// substring; `Exact` is a literal equality check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TextMatch {
    Contains(String),
    Exact(String),
}

/// Closed range on one numeric field; either bound may be absent.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct NumRange {
    pub min: Option<f64>,
    pub max: Option<f64>,
}

impl NumRange {
    pub fn is_empty(&self) -> bool {
        self.min.is_none() && self.max.is_none()
    }
}

/// Store-agnostic filter artifact. All fields absent means "match
/// everything".
#[derive(Debug, Clone, Default, PartialEq)]
pub struct GoatFilter {
    pub name: Option<TextMatch>,
    pub breed: Option<TextMatch>,
    pub temperament: Option<TextMatch>,
    pub age: NumRange,
    pub weight: NumRange,
    pub price: NumRange,
}

impl GoatFilter {
    pub fn is_empty(&self) -> bool {
        self.name.is_none()
            && self.breed.is_none()
            && self.temperament.is_none()
            && self.age.is_empty()
            && self.weight.is_empty()
            && self.price.is_empty()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortField {
    CreatedAt,
    UpdatedAt,
    PriceUsd,
    AgeYears,
    WeightLbs,
    Name,
    Breed,
    Temperament,
}

impl SortField {
    fn from_token(token: &str) -> Option<Self> {
        match token {
            "createdAt" => Some(Self::CreatedAt),
            "updatedAt" => Some(Self::UpdatedAt),
            "priceUsd" => Some(Self::PriceUsd),
            "ageYears" => Some(Self::AgeYears),
            "weightLbs" => Some(Self::WeightLbs),
            "name" => Some(Self::Name),
            "breed" => Some(Self::Breed),
            "temperament" => Some(Self::Temperament),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SortKey {
    pub field: SortField,
    pub descending: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SelectField {
    Id,
    Name,
    Breed,
    AgeYears,
    WeightLbs,
    PriceUsd,
    Temperament,
    ImageDataUrl,
    CreatedAt,
    UpdatedAt,
    Version,
}

impl SelectField {
    fn from_token(token: &str) -> Option<Self> {
        match token {
            "id" => Some(Self::Id),
            "name" => Some(Self::Name),
            "breed" => Some(Self::Breed),
            "ageYears" => Some(Self::AgeYears),
            "weightLbs" => Some(Self::WeightLbs),
            "priceUsd" => Some(Self::PriceUsd),
            "temperament" => Some(Self::Temperament),
            "imageDataUrl" => Some(Self::ImageDataUrl),
            "createdAt" => Some(Self::CreatedAt),
            "updatedAt" => Some(Self::UpdatedAt),
            "version" => Some(Self::Version),
            _ => None,
        }
    }

    pub fn json_key(&self) -> &'static str {
        match self {
            Self::Id => "id",
            Self::Name => "name",
            Self::Breed => "breed",
            Self::AgeYears => "ageYears",
            Self::WeightLbs => "weightLbs",
            Self::PriceUsd => "priceUsd",
            Self::Temperament => "temperament",
            Self::ImageDataUrl => "imageDataUrl",
            Self::CreatedAt => "createdAt",
            Self::UpdatedAt => "updatedAt",
            Self::Version => "version",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageSpec {
    pub page: u64,
    pub limit: u64,
}

impl PageSpec {
    // Saturating: page is attacker-controlled and may be astronomically
    // large; an offset past the end of the table just yields an empty page.
    pub fn offset(&self) -> u64 {
        self.page.saturating_sub(1).saturating_mul(self.limit)
    }
}

/// Build the filter artifact. Every branch fails closed: an unrecognized or
/// unparseable value is dropped, never forwarded into the query.
pub fn build_filter(params: &ListParams) -> GoatFilter {
    GoatFilter {
        name: text_match(&params.name, &params.eq_name),
        breed: text_match(&params.breed, &params.eq_breed),
        temperament: text_match(&params.temperament, &params.eq_temperament),
        age: num_range(&params.min_age, &params.max_age),
        weight: num_range(&params.min_weight, &params.max_weight),
        price: num_range(&params.min_price, &params.max_price),
    }
}

// The exact-match parameter wins over the substring one for the same field.
fn text_match(contains: &Option<String>, exact: &Option<String>) -> Option<TextMatch> {
    if let Some(value) = exact {
        return Some(TextMatch::Exact(value.clone()));
    }
    match contains {
        Some(value) if !value.is_empty() => Some(TextMatch::Contains(value.clone())),
        _ => None,
    }
}

fn num_range(min: &Option<String>, max: &Option<String>) -> NumRange {
    NumRange {
        min: min.as_deref().and_then(parse_finite),
        max: max.as_deref().and_then(parse_finite),
    }
}

fn parse_finite(s: &str) -> Option<f64> {
    s.trim().parse::<f64>().ok().filter(|n| n.is_finite())
}

/// Build the sort-key list from the comma-separated `sort` parameter.
/// Tokens outside the allow-list are dropped; if nothing survives the
/// default is descending `createdAt`. Token order is preserved so the first
/// surviving key is the primary sort.
pub fn build_sort(params: &ListParams) -> Vec<SortKey> {
    let mut keys = Vec::new();
    if let Some(sort) = &params.sort {
        for token in sort.split(',') {
            let token = token.trim();
            let (name, descending) = match token.strip_prefix('-') {
                Some(rest) => (rest, true),
                None => (token, false),
            };
            if let Some(field) = SortField::from_token(name) {
                keys.push(SortKey { field, descending });
            }
        }
    }
    if keys.is_empty() {
        keys.push(SortKey {
            field: SortField::CreatedAt,
            descending: true,
        });
    }
    keys
}

/// Build the projection from the comma-separated `select` parameter.
/// `None` means no projection (all fields).
pub fn build_select(params: &ListParams) -> Option<Vec<SelectField>> {
    let select = params.select.as_ref()?;
    let fields: Vec<SelectField> = select
        .split(',')
        .filter_map(|token| SelectField::from_token(token.trim()))
        .collect();
    if fields.is_empty() {
        None
    } else {
        Some(fields)
    }
}

/// Page defaults to 1 and is floored at 1; limit defaults to 50 and is
/// clamped to [1, 100].
pub fn build_page(params: &ListParams) -> PageSpec {
    let page = parse_int(&params.page).unwrap_or(1).max(1) as u64;
    let limit = parse_int(&params.limit)
        .unwrap_or(DEFAULT_LIMIT as i64)
        .clamp(1, MAX_LIMIT as i64) as u64;
    PageSpec { page, limit }
}

fn parse_int(value: &Option<String>) -> Option<i64> {
    let n = value.as_deref().and_then(parse_finite)?;
    Some(n.trunc() as i64)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn params() -> ListParams {
        ListParams::default()
    }

    #[test]
    fn empty_params_build_empty_filter() {
        let filter = build_filter(&params());
        assert!(filter.is_empty());
    }

    #[test]
    fn substring_params_become_contains_matches() {
        let filter = build_filter(&ListParams {
            name: Some("bil".into()),
            breed: Some(String::new()),
            ..params()
        });
        assert_eq!(filter.name, Some(TextMatch::Contains("bil".into())));
        assert_eq!(filter.breed, None);
    }

    #[test]
    fn exact_param_overrides_substring() {
        let filter = build_filter(&ListParams {
            name: Some("bil".into()),
            eq_name: Some("Billy".into()),
            ..params()
        });
        assert_eq!(filter.name, Some(TextMatch::Exact("Billy".into())));
    }

    #[test]
    fn numeric_ranges_parse_both_bounds() {
        let filter = build_filter(&ListParams {
            min_price: Some("100".into()),
            max_price: Some("200.5".into()),
            min_age: Some("2".into()),
            ..params()
        });
        assert_eq!(filter.price.min, Some(100.0));
        assert_eq!(filter.price.max, Some(200.5));
        assert_eq!(filter.age.min, Some(2.0));
        assert_eq!(filter.age.max, None);
    }

    #[test]
    fn unparseable_numerics_are_ignored() {
        let filter = build_filter(&ListParams {
            min_price: Some("cheap".into()),
            max_price: Some("NaN".into()),
            min_weight: Some("inf".into()),
            max_weight: Some(String::new()),
            ..params()
        });
        assert!(filter.price.is_empty());
        assert!(filter.weight.is_empty());
    }

    #[test]
    fn sort_keeps_token_order_and_direction() {
        let keys = build_sort(&ListParams {
            sort: Some("-priceUsd,name".into()),
            ..params()
        });
        assert_eq!(
            keys,
            vec![
                SortKey {
                    field: SortField::PriceUsd,
                    descending: true
                },
                SortKey {
                    field: SortField::Name,
                    descending: false
                },
            ]
        );
    }

    #[test]
    fn sort_drops_unknown_tokens() {
        let keys = build_sort(&ListParams {
            sort: Some("bogusField,-ageYears,id".into()),
            ..params()
        });
        assert_eq!(
            keys,
            vec![SortKey {
                field: SortField::AgeYears,
                descending: true
            }]
        );
    }

    #[test]
    fn sort_defaults_to_created_at_desc() {
        let expected = vec![SortKey {
            field: SortField::CreatedAt,
            descending: true,
        }];
        assert_eq!(build_sort(&params()), expected);
        assert_eq!(
            build_sort(&ListParams {
                sort: Some("bogusField".into()),
                ..params()
            }),
            expected
        );
        assert_eq!(
            build_sort(&ListParams {
                sort: Some(String::new()),
                ..params()
            }),
            expected
        );
    }

    #[test]
    fn select_filters_against_allow_list() {
        let fields = build_select(&ListParams {
            select: Some("name,priceUsd,password,version".into()),
            ..params()
        });
        assert_eq!(
            fields,
            Some(vec![
                SelectField::Name,
                SelectField::PriceUsd,
                SelectField::Version
            ])
        );
    }

    #[test]
    fn select_with_no_valid_tokens_means_all_fields() {
        assert_eq!(build_select(&params()), None);
        assert_eq!(
            build_select(&ListParams {
                select: Some("secret,__proto__".into()),
                ..params()
            }),
            None
        );
    }

    #[test]
    fn page_and_limit_are_coerced_and_clamped() {
        let page = build_page(&params());
        assert_eq!(page, PageSpec { page: 1, limit: 50 });

        let page = build_page(&ListParams {
            page: Some("2".into()),
            limit: Some("10".into()),
            ..params()
        });
        assert_eq!(page, PageSpec { page: 2, limit: 10 });
        assert_eq!(page.offset(), 10);

        let page = build_page(&ListParams {
            page: Some("-3".into()),
            limit: Some("10000".into()),
            ..params()
        });
        assert_eq!(
            page,
            PageSpec {
                page: 1,
                limit: MAX_LIMIT
            }
        );

        let page = build_page(&ListParams {
            page: Some("two".into()),
            limit: Some("0".into()),
            ..params()
        });
        assert_eq!(page, PageSpec { page: 1, limit: 1 });
    }

    #[test]
    fn extreme_page_values_never_overflow_the_offset() {
        let page = build_page(&ListParams {
            page: Some("9223372036854775807".into()),
            limit: Some("100".into()),
            ..params()
        });
        assert_eq!(page.limit, 100);
        assert_eq!(page.offset(), u64::MAX);

        let page = build_page(&ListParams {
            page: Some("9e99".into()),
            limit: Some("100".into()),
            ..params()
        });
        assert_eq!(page.offset(), u64::MAX);
    }
}
