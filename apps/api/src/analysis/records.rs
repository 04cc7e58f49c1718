//! Records produced by the two LLM stages.
//!
//! The model's JSON is kept verbatim: missing or extra fields pass through to
//! storage untouched. Accessors read the known fields leniently and never fail.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Normalized resume fields from the extraction stage.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StructuredRecord(Value);

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExperienceEntry {
    pub title: Option<String>,
    pub company: Option<String>,
    pub dates: Option<String>,
    pub description: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EducationEntry {
    pub degree: Option<String>,
    pub institution: Option<String>,
    pub year: Option<String>,
}

impl StructuredRecord {
    pub fn from_value(value: Value) -> Self {
        Self(value)
    }

    pub fn as_value(&self) -> &Value {
        &self.0
    }

    pub fn name(&self) -> Option<&str> {
        non_blank_str(&self.0, "name")
    }

    pub fn email(&self) -> Option<&str> {
        non_blank_str(&self.0, "email")
    }

    pub fn phone(&self) -> Option<&str> {
        non_blank_str(&self.0, "phone")
    }

    pub fn location(&self) -> Option<&str> {
        non_blank_str(&self.0, "location")
    }

    pub fn summary(&self) -> Option<&str> {
        non_blank_str(&self.0, "summary")
    }

    pub fn core_skills(&self) -> Vec<&str> {
        str_list(&self.0, "core_skills")
    }

    pub fn soft_skills(&self) -> Vec<&str> {
        str_list(&self.0, "soft_skills")
    }

    /// Experience entries that have the expected object shape; others are skipped.
    pub fn experience(&self) -> Vec<ExperienceEntry> {
        object_list(&self.0, "experience")
    }

    pub fn education(&self) -> Vec<EducationEntry> {
        object_list(&self.0, "education")
    }
}

/// Qualitative review from the analysis stage.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AnalysisRecord(Value);

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UpskillSuggestion {
    #[serde(alias = "name")]
    pub skill: String,
    #[serde(default, alias = "explanation", alias = "reason")]
    pub rationale: String,
}

impl AnalysisRecord {
    pub fn from_value(value: Value) -> Self {
        Self(value)
    }

    pub fn as_value(&self) -> &Value {
        &self.0
    }

    /// The 1–10 rating. Fractional and numeric-string ratings are rounded;
    /// anything outside 1–10 reads as `None`.
    pub fn resume_rating(&self) -> Option<u8> {
        let raw = self.0.get("resume_rating")?;
        let rating = match raw {
            Value::Number(n) => n.as_f64()?,
            Value::String(s) => s.trim().parse::<f64>().ok()?,
            _ => return None,
        };
        let rounded = rating.round();
        (1.0..=10.0).contains(&rounded).then_some(rounded as u8)
    }

    pub fn improvement_areas(&self) -> Option<&str> {
        non_blank_str(&self.0, "improvement_areas")
    }

    /// Suggestions in model order. Bare strings are read as a skill with no rationale.
    pub fn upskill_suggestions(&self) -> Vec<UpskillSuggestion> {
        let Some(items) = self.0.get("upskill_suggestions").and_then(Value::as_array) else {
            return Vec::new();
        };
        items
            .iter()
            .filter_map(|item| match item {
                Value::String(skill) => Some(UpskillSuggestion {
                    skill: skill.clone(),
                    rationale: String::new(),
                }),
                other => serde_json::from_value(other.clone()).ok(),
            })
            .collect()
    }
}

fn non_blank_str<'a>(value: &'a Value, key: &str) -> Option<&'a str> {
    value
        .get(key)
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|s| !s.is_empty())
}

fn str_list<'a>(value: &'a Value, key: &str) -> Vec<&'a str> {
    value
        .get(key)
        .and_then(Value::as_array)
        .map(|arr| arr.iter().filter_map(Value::as_str).collect())
        .unwrap_or_default()
}

fn object_list<T: serde::de::DeserializeOwned>(value: &Value, key: &str) -> Vec<T> {
    value
        .get(key)
        .and_then(Value::as_array)
        .map(|arr| {
            arr.iter()
                .filter(|item| item.is_object())
                .filter_map(|item| serde_json::from_value(item.clone()).ok())
                .collect()
        })
        .unwrap_or_default()
}
