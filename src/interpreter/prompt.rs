use chrono::{Datelike, Utc};
use schemars::schema_for;

use crate::models::{BodyType, CarFilters};

/// Build the fixed system instruction describing the filter schema and reply shape.
pub fn system_prompt() -> String {
    let body_types = BodyType::ALL
        .iter()
        .map(|b| format!("\"{}\"", b.as_str()))
        .collect::<Vec<_>>()
        .join(", ");

    let schema = serde_json::to_string_pretty(&schema_for!(CarFilters)).unwrap_or_default();

    format!(
        r#"You convert a shopper's free-text car search into structured filters
for a car marketplace.
The current year is {year}.

Respond with a single JSON object and nothing else, shaped exactly like:
{{"filters": {{ ... }}, "message": "..."}}

"filters" may only contain these keys, each optional.
Leave a key out when the text does not constrain it:
- make (string): manufacturer, e.g. "Toyota"
- model (string): model name, e.g. "Corolla"
- minPrice, maxPrice (number): price in dollars, no currency symbols or separators
- minYear, maxYear (integer): model year
- bodyType (string): one of {body_types}
- minMileage, maxMileage (number): odometer reading in kilometres
- location (string): suburb, city or region

JSON Schema for "filters":
{schema}

"message" is one short, friendly sentence telling the shopper what you are searching for.
If nothing in the text maps to a filter, return "filters": {{}} with a generic message."#,
        year = Utc::now().year(),
        body_types = body_types,
        schema = schema,
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_prompt_enumerates_every_field() {
        let prompt = system_prompt();
        for field in CarFilters::FIELDS {
            assert!(prompt.contains(field), "prompt is missing {field}");
        }
    }

    #[test]
    fn test_prompt_lists_closed_body_types() {
        let prompt = system_prompt();
        for body in BodyType::ALL {
            assert!(prompt.contains(&format!("\"{}\"", body.as_str())));
        }
        assert!(prompt.contains("\"filters\""));
        assert!(prompt.contains("\"message\""));
    }
}
