use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Closed set of body styles the listings index knows about
#[derive(Debug, Clone, Copy, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum BodyType {
    Sedan,
    Suv,
    Ute,
    Hatch,
    Coupe,
    Sports,
    Performance,
    Unique,
}

impl BodyType {
    pub const ALL: [BodyType; 8] = [
        BodyType::Sedan,
        BodyType::Suv,
        BodyType::Ute,
        BodyType::Hatch,
        BodyType::Coupe,
        BodyType::Sports,
        BodyType::Performance,
        BodyType::Unique,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            BodyType::Sedan => "sedan",
            BodyType::Suv => "suv",
            BodyType::Ute => "ute",
            BodyType::Hatch => "hatch",
            BodyType::Coupe => "coupe",
            BodyType::Sports => "sports",
            BodyType::Performance => "performance",
            BodyType::Unique => "unique",
        }
    }

    /// Match a body type case-insensitively, `None` for anything outside the set
    pub fn parse(raw: &str) -> Option<Self> {
        let raw = raw.trim();
        Self::ALL
            .into_iter()
            .find(|b| b.as_str().eq_ignore_ascii_case(raw))
    }
}

/// Sparse set of search constraints extracted from a free-text query.
///
/// Every field is optional; `None` means "no constraint on that dimension".
#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct CarFilters {
    /// Manufacturer, e.g. "Toyota"
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub make: Option<String>,
    /// Model name, e.g. "Corolla"
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_price: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_price: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_year: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_year: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub body_type: Option<BodyType>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_mileage: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_mileage: Option<f64>,
    /// Suburb, city or region
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
}

impl CarFilters {
    /// Wire names of every recognised filter key
    pub const FIELDS: [&'static str; 10] = [
        "make",
        "model",
        "minPrice",
        "maxPrice",
        "minYear",
        "maxYear",
        "bodyType",
        "minMileage",
        "maxMileage",
        "location",
    ];

    pub fn is_empty(&self) -> bool {
        self == &Self::default()
    }

    /// Present fields as `(key, value)` pairs ready to merge into a listings query string
    pub fn to_query_pairs(&self) -> Vec<(&'static str, String)> {
        let mut pairs = Vec::new();

        if let Some(make) = &self.make {
            pairs.push(("make", make.clone()));
        }
        if let Some(model) = &self.model {
            pairs.push(("model", model.clone()));
        }
        if let Some(v) = self.min_price {
            pairs.push(("minPrice", format_number(v)));
        }
        if let Some(v) = self.max_price {
            pairs.push(("maxPrice", format_number(v)));
        }
        if let Some(v) = self.min_year {
            pairs.push(("minYear", v.to_string()));
        }
        if let Some(v) = self.max_year {
            pairs.push(("maxYear", v.to_string()));
        }
        if let Some(body) = self.body_type {
            pairs.push(("bodyType", body.as_str().to_string()));
        }
        if let Some(v) = self.min_mileage {
            pairs.push(("minMileage", format_number(v)));
        }
        if let Some(v) = self.max_mileage {
            pairs.push(("maxMileage", format_number(v)));
        }
        if let Some(location) = &self.location {
            pairs.push(("location", location.clone()));
        }

        pairs
    }
}

// 40000.0 renders as "40000", 12.5 stays "12.5"
fn format_number(v: f64) -> String {
    if v.fract() == 0.0 && v.abs() < 1e15 {
        format!("{}", v as i64)
    } else {
        v.to_string()
    }
}

/// Output of a single interpretation: filters plus a line to show the user
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct SearchResult {
    pub filters: CarFilters,
    pub message: String,
}

impl SearchResult {
    /// The soft-fail value: no narrowing, nothing to display
    pub fn empty() -> Self {
        Self::default()
    }
}
