use chrono::{Datelike, Utc};
use serde::Deserialize;
use serde_json::Value;
use tracing::debug;
use validator::{Validate, ValidationError, ValidationErrors};

use crate::models::{BodyType, CarFilters};

/// Filters as the model sent them, after lenient per-field coercion.
///
/// Unrecognised keys never make it past deserialization. Value rules are the
/// `validate` attributes; a field that breaks one is dropped, not reported.
#[derive(Debug, Default, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
#[validate(schema(function = "check_ranges"))]
pub(crate) struct ModelFilters {
    #[serde(default, deserialize_with = "lenient::text")]
    make: Option<String>,
    #[serde(default, deserialize_with = "lenient::text")]
    model: Option<String>,
    #[serde(default, deserialize_with = "lenient::number")]
    #[validate(range(min = 0.0))]
    min_price: Option<f64>,
    #[serde(default, deserialize_with = "lenient::number")]
    #[validate(range(min = 0.0))]
    max_price: Option<f64>,
    #[serde(default, deserialize_with = "lenient::whole_number")]
    #[validate(range(min = 1886))]
    min_year: Option<i32>,
    #[serde(default, deserialize_with = "lenient::whole_number")]
    #[validate(range(min = 1886))]
    max_year: Option<i32>,
    #[serde(default, deserialize_with = "lenient::body_type")]
    body_type: Option<BodyType>,
    #[serde(default, deserialize_with = "lenient::number")]
    #[validate(range(min = 0.0))]
    min_mileage: Option<f64>,
    #[serde(default, deserialize_with = "lenient::number")]
    #[validate(range(min = 0.0))]
    max_mileage: Option<f64>,
    #[serde(default, deserialize_with = "lenient::text")]
    location: Option<String>,
    /// Latest model year accepted, next year's models included
    #[serde(skip)]
    year_ceiling: i32,
}

// Model years past the ceiling, then inverted min/max pairs. Offending fields
// are named in the error params so the caller can drop exactly those.
fn check_ranges(filters: &ModelFilters) -> Result<(), ValidationError> {
    let mut offending: Vec<&'static str> = Vec::new();

    let min_year = filters.min_year.filter(|y| *y <= filters.year_ceiling);
    let max_year = filters.max_year.filter(|y| *y <= filters.year_ceiling);
    if filters.min_year.is_some() && min_year.is_none() {
        offending.push("minYear");
    }
    if filters.max_year.is_some() && max_year.is_none() {
        offending.push("maxYear");
    }

    if inverted(filters.min_price, filters.max_price) {
        offending.extend(["minPrice", "maxPrice"]);
    }
    if inverted(min_year, max_year) {
        offending.extend(["minYear", "maxYear"]);
    }
    if inverted(filters.min_mileage, filters.max_mileage) {
        offending.extend(["minMileage", "maxMileage"]);
    }

    if offending.is_empty() {
        return Ok(());
    }

    let mut err = ValidationError::new("range");
    for field in offending {
        err.add_param(field.into(), &true);
    }
    Err(err)
}

// An inverted range can never match, so neither end is kept
fn inverted<T: PartialOrd>(min: Option<T>, max: Option<T>) -> bool {
    matches!((min, max), (Some(lo), Some(hi)) if lo > hi)
}

impl ModelFilters {
    fn from_value(raw: &Value, year_ceiling: i32) -> Self {
        let mut filters = if raw.is_object() {
            serde_json::from_value::<ModelFilters>(raw.clone()).unwrap_or_default()
        } else {
            if !raw.is_null() {
                debug!("filters is not an object, ignoring");
            }
            ModelFilters::default()
        };
        filters.year_ceiling = year_ceiling;
        filters
    }

    /// Validate until clean. Range checks only run once field errors are gone,
    /// so an invalid bound never takes a valid one down with it.
    fn into_valid(mut self) -> CarFilters {
        for _ in 0..3 {
            match self.validate() {
                Ok(()) => break,
                Err(errors) => self.drop_invalid(&errors),
            }
        }
        self.into()
    }

    fn drop_invalid(&mut self, errors: &ValidationErrors) {
        for (field, errs) in errors.field_errors() {
            let field: &str = &field;
            if field == "__all__" {
                for err in errs.iter() {
                    for key in err.params.keys() {
                        self.drop_field(key);
                    }
                }
            } else {
                self.drop_field(field);
            }
        }
    }

    fn drop_field(&mut self, key: &str) {
        let normalized: String = key.chars().filter(|c| *c != '_').collect();
        debug!(field = key, "Dropping invalid filter value");

        match normalized.to_ascii_lowercase().as_str() {
            "minprice" => self.min_price = None,
            "maxprice" => self.max_price = None,
            "minyear" => self.min_year = None,
            "maxyear" => self.max_year = None,
            "minmileage" => self.min_mileage = None,
            "maxmileage" => self.max_mileage = None,
            _ => {}
        }
    }
}

impl From<ModelFilters> for CarFilters {
    fn from(f: ModelFilters) -> Self {
        CarFilters {
            make: f.make,
            model: f.model,
            min_price: f.min_price,
            max_price: f.max_price,
            min_year: f.min_year,
            max_year: f.max_year,
            body_type: f.body_type,
            min_mileage: f.min_mileage,
            max_mileage: f.max_mileage,
            location: f.location,
        }
    }
}

/// Turn the model's untrusted `filters` value into a valid `CarFilters`.
///
/// Field-level recovery only: bad fields are dropped, never reported as errors.
pub fn validate_filters(raw: &Value) -> CarFilters {
    validate_filters_at(raw, Utc::now().year())
}

pub(crate) fn validate_filters_at(raw: &Value, current_year: i32) -> CarFilters {
    if let Some(map) = raw.as_object() {
        for key in map.keys() {
            if !CarFilters::FIELDS.contains(&key.as_str()) {
                debug!(key = %key, "Dropping unrecognised filter key");
            }
        }
    }

    ModelFilters::from_value(raw, current_year + 1).into_valid()
}

/// A usable `message`, or `None` when missing, blank or not a string
pub fn validate_message(raw: Option<&Value>) -> Option<String> {
    raw.and_then(Value::as_str)
        .map(str::trim)
        .filter(|m| !m.is_empty())
        .map(str::to_string)
}

/// Deserializers that never fail: a value that cannot be coerced becomes `None`.
mod lenient {
    use serde::{Deserialize, Deserializer};
    use serde_json::Value;

    use crate::models::BodyType;

    pub fn number<'de, D: Deserializer<'de>>(d: D) -> Result<Option<f64>, D::Error> {
        Ok(coerce_number(&Value::deserialize(d)?))
    }

    pub fn whole_number<'de, D: Deserializer<'de>>(d: D) -> Result<Option<i32>, D::Error> {
        Ok(coerce_number(&Value::deserialize(d)?)
            .filter(|n| n.fract() == 0.0)
            .filter(|n| *n >= i32::MIN as f64 && *n <= i32::MAX as f64)
            .map(|n| n as i32))
    }

    pub fn text<'de, D: Deserializer<'de>>(d: D) -> Result<Option<String>, D::Error> {
        Ok(Value::deserialize(d)?
            .as_str()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string))
    }

    pub fn body_type<'de, D: Deserializer<'de>>(d: D) -> Result<Option<BodyType>, D::Error> {
        Ok(Value::deserialize(d)?.as_str().and_then(BodyType::parse))
    }

    /// Numbers as-is, numeric strings after dropping `$`, `,` and `_`
    fn coerce_number(value: &Value) -> Option<f64> {
        let n = match value {
            Value::Number(n) => n.as_f64(),
            Value::String(s) => {
                let cleaned: String = s
                    .trim()
                    .chars()
                    .filter(|c| !matches!(c, '$' | ',' | '_'))
                    .collect();
                cleaned.trim().parse::<f64>().ok()
            }
            _ => None,
        };
        // -0.0 + 0.0 == +0.0
        n.filter(|n| n.is_finite()).map(|n| n + 0.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    const YEAR: i32 = 2026;

    #[test]
    fn test_valid_filters_pass_through() {
        let filters = validate_filters_at(
            &json!({
                "make": "Toyota",
                "model": "RAV4",
                "minPrice": 10000,
                "maxPrice": 40000,
                "minYear": 2018,
                "maxYear": 2024,
                "bodyType": "suv",
                "minMileage": 0,
                "maxMileage": 80000.5,
                "location": "Brisbane"
            }),
            YEAR,
        );

        assert_eq!(
            filters,
            CarFilters {
                make: Some("Toyota".into()),
                model: Some("RAV4".into()),
                min_price: Some(10000.0),
                max_price: Some(40000.0),
                min_year: Some(2018),
                max_year: Some(2024),
                body_type: Some(BodyType::Suv),
                min_mileage: Some(0.0),
                max_mileage: Some(80000.5),
                location: Some("Brisbane".into()),
            }
        );
    }

    #[test]
    fn test_unknown_keys_never_survive() {
        let junk_keys = [
            "colour", "color", "Make", "max_price", "maxprice", "bodytype", "__proto__",
            "filters", "message", "", "minPrice ", "fuel",
        ];

        for key in junk_keys {
            let mut raw = serde_json::Map::new();
            raw.insert(key.to_string(), json!("white"));
            raw.insert("make".to_string(), json!("Honda"));

            let filters = validate_filters_at(&Value::Object(raw), YEAR);
            let out = serde_json::to_value(&filters).unwrap();
            let keys: Vec<&String> = out.as_object().unwrap().keys().collect();

            assert_eq!(keys, vec!["make"], "key {key:?} leaked through");
        }
    }

    #[test]
    fn test_body_type_outside_enum_is_dropped() {
        let bad_values = [
            json!("truck"),
            json!("van"),
            json!("SUV-ish"),
            json!(3),
            json!(null),
            json!(["suv"]),
        ];
        for bad in bad_values {
            let filters = validate_filters_at(&json!({ "bodyType": bad }), YEAR);
            assert_eq!(filters.body_type, None);
        }

        let filters = validate_filters_at(&json!({ "bodyType": "Coupe" }), YEAR);
        assert_eq!(filters.body_type, Some(BodyType::Coupe));
    }

    #[test]
    fn test_invalid_numbers_are_dropped() {
        let bad_values = [
            json!(-1),
            json!(-0.5),
            json!("abc"),
            json!("NaN"),
            json!("inf"),
            json!(true),
            json!({}),
            json!([1]),
        ];
        for bad in bad_values {
            let filters = validate_filters_at(
                &json!({
                    "minPrice": bad.clone(),
                    "maxPrice": bad.clone(),
                    "minMileage": bad.clone(),
                    "maxMileage": bad
                }),
                YEAR,
            );
            assert!(filters.is_empty(), "{filters:?}");
        }
    }

    #[test]
    fn test_negative_zero_is_normalized() {
        let filters = validate_filters_at(&json!({ "minPrice": -0.0, "minMileage": "-0" }), YEAR);
        assert_eq!(filters.min_price, Some(0.0));
        assert!(filters.min_price.unwrap().is_sign_positive());
        assert!(filters.min_mileage.unwrap().is_sign_positive());

        let json = serde_json::to_string(&filters).unwrap();
        assert!(!json.contains("-0"), "{json}");
    }

    #[test]
    fn test_numeric_strings_are_coerced() {
        let filters = validate_filters_at(
            &json!({ "maxPrice": "$40,000", "minMileage": " 5_000 ", "minYear": "2019" }),
            YEAR,
        );
        assert_eq!(filters.max_price, Some(40000.0));
        assert_eq!(filters.min_mileage, Some(5000.0));
        assert_eq!(filters.min_year, Some(2019));
    }

    #[test]
    fn test_implausible_years_are_dropped() {
        let filters = validate_filters_at(&json!({ "minYear": 1700, "maxYear": 2030 }), YEAR);
        assert_eq!(filters.min_year, None);
        assert_eq!(filters.max_year, None);

        let filters = validate_filters_at(&json!({ "minYear": 2015.5, "maxYear": 2027 }), YEAR);
        assert_eq!(filters.min_year, None);
        assert_eq!(filters.max_year, Some(2027));
    }

    #[test]
    fn test_inverted_ranges_drop_both_ends() {
        let filters = validate_filters_at(
            &json!({
                "minPrice": 50000, "maxPrice": 10000,
                "minYear": 2022, "maxYear": 2010,
                "minMileage": 90000, "maxMileage": 1000,
                "make": "Ford"
            }),
            YEAR,
        );

        assert_eq!(
            filters,
            CarFilters {
                make: Some("Ford".into()),
                ..Default::default()
            }
        );
    }

    #[test]
    fn test_equal_bounds_and_single_bounds_are_kept() {
        let filters = validate_filters_at(
            &json!({ "minPrice": 20000, "maxPrice": 20000, "maxYear": 2020 }),
            YEAR,
        );
        assert_eq!(filters.min_price, Some(20000.0));
        assert_eq!(filters.max_price, Some(20000.0));
        assert_eq!(filters.max_year, Some(2020));
    }

    #[test]
    fn test_range_check_runs_after_field_checks() {
        // the invalid min is discarded first, so the max stands alone
        let filters = validate_filters_at(&json!({ "minPrice": -5, "maxPrice": 30000 }), YEAR);
        assert_eq!(filters.min_price, None);
        assert_eq!(filters.max_price, Some(30000.0));

        let filters = validate_filters_at(&json!({ "minYear": 2010, "maxYear": 1700 }), YEAR);
        assert_eq!(filters.min_year, Some(2010));
        assert_eq!(filters.max_year, None);

        let filters = validate_filters_at(&json!({ "minYear": 2031, "maxYear": 2020 }), YEAR);
        assert_eq!(filters.min_year, None);
        assert_eq!(filters.max_year, Some(2020));
    }

    #[test]
    fn test_validator_rules_are_declared_on_the_struct() {
        let filters = ModelFilters {
            min_price: Some(-1.0),
            min_year: Some(1700),
            year_ceiling: YEAR + 1,
            ..Default::default()
        };
        let errors = filters.validate().unwrap_err();
        let fields: Vec<String> = errors
            .field_errors()
            .keys()
            .map(|k| k.to_string())
            .collect();
        assert_eq!(fields.len(), 2, "{fields:?}");

        let inverted = ModelFilters {
            min_mileage: Some(5000.0),
            max_mileage: Some(10.0),
            year_ceiling: YEAR + 1,
            ..Default::default()
        };
        assert!(inverted.validate().is_err());
    }

    #[test]
    fn test_text_fields() {
        let filters = validate_filters_at(
            &json!({ "make": "  Mazda ", "model": "", "location": 42 }),
            YEAR,
        );
        assert_eq!(filters.make.as_deref(), Some("Mazda"));
        assert_eq!(filters.model, None);
        assert_eq!(filters.location, None);
    }

    #[test]
    fn test_non_object_filters() {
        assert!(validate_filters_at(&json!("suv"), YEAR).is_empty());
        assert!(validate_filters_at(&json!([{"make": "Kia"}]), YEAR).is_empty());
        assert!(validate_filters_at(&Value::Null, YEAR).is_empty());
    }

    #[test]
    fn test_validate_message() {
        assert_eq!(
            validate_message(Some(&json!(" Looking for SUVs. "))).as_deref(),
            Some("Looking for SUVs.")
        );
        assert_eq!(validate_message(Some(&json!(""))), None);
        assert_eq!(validate_message(Some(&json!(7))), None);
        assert_eq!(validate_message(None), None);
    }
}
