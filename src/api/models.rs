use chrono::{NaiveDate, NaiveDateTime};
use serde::{de, Deserialize, Deserializer, Serialize};
use std::fmt;

const DATE_FORMAT: &str = "%Y-%m-%d";
const DATETIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Sort order of the returned lifelogs.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    Asc,
    #[default]
    Desc,
}

impl Direction {
    pub fn as_str(&self) -> &'static str {
        match self {
            Direction::Asc => "asc",
            Direction::Desc => "desc",
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Filters for `GET /v1/lifelogs`. Absent fields are never sent.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct LifelogQuery {
    /// IANA timezone used to interpret `date`, `start` and `end`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timezone: Option<String>,
    /// Day to list, `YYYY-MM-DD`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub date: Option<String>,
    /// Lower bound, `YYYY-MM-DD` or `YYYY-MM-DD HH:MM:SS`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub start: Option<String>,
    /// Upper bound, same formats as `start`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub end: Option<String>,
    /// Opaque pagination cursor from a previous response, passed through verbatim.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cursor: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub direction: Option<Direction>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub include_markdown: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub include_headings: Option<bool>,
    /// Page size. Integral floats such as `5.0` are accepted.
    #[serde(
        default,
        deserialize_with = "deserialize_limit",
        skip_serializing_if = "Option::is_none"
    )]
    pub limit: Option<u32>,
}

impl LifelogQuery {
    /// Fill the default-bearing fields left unset by the caller.
    pub fn with_defaults(mut self) -> Self {
        self.direction.get_or_insert(Direction::default());
        self.include_markdown.get_or_insert(true);
        self.include_headings.get_or_insert(true);
        self
    }

    /// Semantic checks the JSON schema cannot express. Returns every problem found.
    pub fn validate(&self) -> Result<(), Vec<String>> {
        let mut problems = Vec::new();

        if let Some(date) = &self.date {
            if NaiveDate::parse_from_str(date, DATE_FORMAT).is_err() {
                problems.push(format!("date: '{}' is not a YYYY-MM-DD date", date));
            }
        }

        let start = self.start.as_deref().map(|s| ("start", s, parse_bound(s)));
        let end = self.end.as_deref().map(|s| ("end", s, parse_bound(s)));

        for (field, raw, parsed) in start.iter().chain(end.iter()) {
            if parsed.is_none() {
                problems.push(format!(
                    "{}: '{}' is not YYYY-MM-DD or YYYY-MM-DD HH:MM:SS",
                    field, raw
                ));
            }
        }

        if let (Some((_, _, Some(start))), Some((_, _, Some(end)))) = (&start, &end) {
            if start > end {
                problems.push("start: must not be after end".to_string());
            }
        }

        if self.limit == Some(0) {
            problems.push("limit: must be at least 1".to_string());
        }

        if problems.is_empty() {
            Ok(())
        } else {
            Err(problems)
        }
    }

    /// Query parameters for every present field, in a stable order.
    pub fn to_query_pairs(&self) -> Vec<(&'static str, String)> {
        let mut pairs = Vec::new();

        let strings = [
            ("timezone", &self.timezone),
            ("date", &self.date),
            ("start", &self.start),
            ("end", &self.end),
            ("cursor", &self.cursor),
        ];
        for (name, value) in strings {
            if let Some(value) = value {
                pairs.push((name, value.clone()));
            }
        }

        if let Some(direction) = self.direction {
            pairs.push(("direction", direction.to_string()));
        }
        if let Some(include_markdown) = self.include_markdown {
            pairs.push(("includeMarkdown", include_markdown.to_string()));
        }
        if let Some(include_headings) = self.include_headings {
            pairs.push(("includeHeadings", include_headings.to_string()));
        }
        if let Some(limit) = self.limit {
            pairs.push(("limit", limit.to_string()));
        }

        pairs
    }
}

fn deserialize_limit<'de, D>(deserializer: D) -> Result<Option<u32>, D::Error>
where
    D: Deserializer<'de>,
{
    let Some(value) = Option::<f64>::deserialize(deserializer)? else {
        return Ok(None);
    };

    if value.fract() != 0.0 || value < 1.0 || value > f64::from(u32::MAX) {
        return Err(de::Error::custom(format!(
            "limit must be a whole number between 1 and {}, got {}",
            u32::MAX,
            value
        )));
    }

    Ok(Some(value as u32))
}

fn parse_bound(value: &str) -> Option<NaiveDateTime> {
    NaiveDateTime::parse_from_str(value, DATETIME_FORMAT)
        .ok()
        .or_else(|| {
            NaiveDate::parse_from_str(value, DATE_FORMAT)
                .ok()
                .and_then(|date| date.and_hms_opt(0, 0, 0))
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn names(query: &LifelogQuery) -> Vec<&'static str> {
        query.to_query_pairs().into_iter().map(|(name, _)| name).collect()
    }

    #[test]
    fn test_only_present_fields_are_serialized() {
        let query = LifelogQuery {
            date: Some("2025-03-01".to_string()),
            limit: Some(5),
            ..Default::default()
        };

        assert_eq!(
            query.to_query_pairs(),
            vec![("date", "2025-03-01".to_string()), ("limit", "5".to_string())]
        );
    }

    #[test]
    fn test_empty_query_has_no_pairs() {
        assert!(LifelogQuery::default().to_query_pairs().is_empty());
    }

    #[test]
    fn test_defaults_fill_only_default_bearing_fields() {
        let query = LifelogQuery::default().with_defaults();

        assert_eq!(
            names(&query),
            vec!["direction", "includeMarkdown", "includeHeadings"]
        );
        assert_eq!(query.direction, Some(Direction::Desc));
        assert_eq!(query.include_markdown, Some(true));
        assert_eq!(query.include_headings, Some(true));
    }

    #[test]
    fn test_defaults_do_not_override_explicit_values() {
        let query = LifelogQuery {
            direction: Some(Direction::Asc),
            include_markdown: Some(false),
            ..Default::default()
        }
        .with_defaults();

        let pairs = query.to_query_pairs();
        assert!(pairs.contains(&("direction", "asc".to_string())));
        assert!(pairs.contains(&("includeMarkdown", "false".to_string())));
        assert!(pairs.contains(&("includeHeadings", "true".to_string())));
    }

    #[test]
    fn test_null_fields_deserialize_as_absent() {
        let query: LifelogQuery =
            serde_json::from_value(json!({ "cursor": null, "timezone": "Europe/Paris" })).unwrap();

        assert_eq!(names(&query), vec!["timezone"]);
    }

    #[test]
    fn test_integral_float_limit_is_accepted() {
        let query: LifelogQuery = serde_json::from_value(json!({ "limit": 5.0 })).unwrap();
        assert_eq!(query.limit, Some(5));

        let query: LifelogQuery = serde_json::from_value(json!({ "limit": 7 })).unwrap();
        assert_eq!(query.to_query_pairs(), vec![("limit", "7".to_string())]);
    }

    #[test]
    fn test_fractional_or_non_positive_limit_is_rejected() {
        for limit in [json!(2.5), json!(0), json!(-3)] {
            let result = serde_json::from_value::<LifelogQuery>(json!({ "limit": limit }));
            assert!(result.is_err(), "limit {} should be rejected", limit);
        }
    }

    #[test]
    fn test_unknown_field_is_rejected() {
        let result = serde_json::from_value::<LifelogQuery>(json!({ "page": 2 }));
        assert!(result.is_err());
    }

    #[test]
    fn test_invalid_direction_is_rejected() {
        let result = serde_json::from_value::<LifelogQuery>(json!({ "direction": "sideways" }));
        assert!(result.is_err());
    }

    #[test]
    fn test_validate_accepts_date_and_datetime_bounds() {
        let query = LifelogQuery {
            start: Some("2025-03-01".to_string()),
            end: Some("2025-03-01 18:30:00".to_string()),
            ..Default::default()
        };
        assert!(query.validate().is_ok());
    }

    #[test]
    fn test_validate_reports_every_problem() {
        let query = LifelogQuery {
            date: Some("03/01/2025".to_string()),
            start: Some("2025-03-02".to_string()),
            end: Some("2025-03-01".to_string()),
            limit: Some(0),
            ..Default::default()
        };

        let problems = query.validate().unwrap_err();
        assert_eq!(problems.len(), 3);
        assert!(problems[0].starts_with("date:"));
        assert!(problems.iter().any(|p| p.contains("after end")));
        assert!(problems.iter().any(|p| p.starts_with("limit:")));
    }
}
