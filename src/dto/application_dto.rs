use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use crate::models::application::{Education, WorkExperience};
use crate::storage::{ApplicationPage, ApplicationStats, PageInfo};

/// Fully typed intake payload, assembled from the multipart form and
/// validated once before it reaches the storage layer.
#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct ApplicationDraft {
    #[validate(length(min = 1))]
    pub first_name: String,
    #[validate(length(min = 1))]
    pub last_name: String,
    #[validate(email(message = "البريد الإلكتروني غير صحيح"))]
    pub email: String,
    #[validate(length(min = 1))]
    pub phone: String,
    pub address: Option<String>,
    pub city: Option<String>,
    pub state: Option<String>,
    pub zip_code: Option<String>,
    #[validate(length(min = 1))]
    pub nationality: String,
    pub date_of_birth: Option<NaiveDate>,
    pub gender: Option<String>,
    pub marital_status: Option<String>,
    #[validate(length(min = 1))]
    pub national_id: String,

    #[validate(length(min = 1))]
    pub position: String,
    pub department: Option<String>,
    pub salary_expectation: Option<String>,
    pub available_start_date: Option<NaiveDate>,
    pub employment_type: Option<String>,

    pub cover_letter: Option<String>,
    pub linkedin_url: Option<String>,
    pub portfolio_url: Option<String>,
    pub referral_source: Option<String>,

    #[validate(length(min = 1))]
    pub work_authorization: String,
    pub background_check: bool,
    pub drug_test: bool,

    #[serde(default)]
    pub work_experience: Vec<WorkExperienceEntry>,
    #[serde(default)]
    pub education: Vec<EducationEntry>,
    #[serde(default)]
    pub skills: Vec<String>,
}

impl ApplicationDraft {
    /// The required-field set of the intake contract. Returns the names of
    /// the fields that are missing or blank.
    pub fn missing_required_fields(&self) -> Vec<&'static str> {
        let mut missing = Vec::new();
        let required: [(&'static str, &str); 8] = [
            ("firstName", &self.first_name),
            ("lastName", &self.last_name),
            ("email", &self.email),
            ("phone", &self.phone),
            ("position", &self.position),
            ("nationality", &self.nationality),
            ("nationalId", &self.national_id),
            ("workAuthorization", &self.work_authorization),
        ];
        for (name, value) in required {
            if value.trim().is_empty() {
                missing.push(name);
            }
        }
        missing
    }
}

/// One row of the JSON-encoded `workExperience` form field.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkExperienceEntry {
    #[serde(default)]
    pub company: String,
    #[serde(default)]
    pub position: String,
    #[serde(default, deserialize_with = "flexible_date")]
    pub start_date: Option<NaiveDate>,
    #[serde(default, deserialize_with = "flexible_date")]
    pub end_date: Option<NaiveDate>,
    #[serde(default)]
    pub current: bool,
    pub description: Option<String>,
}

impl From<WorkExperienceEntry> for WorkExperience {
    fn from(entry: WorkExperienceEntry) -> Self {
        WorkExperience {
            company: entry.company,
            position: entry.position,
            start_date: entry.start_date,
            end_date: entry.end_date,
            current: entry.current,
            description: entry.description,
        }
    }
}

/// One row of the JSON-encoded `education` form field.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EducationEntry {
    #[serde(default)]
    pub institution: String,
    #[serde(default)]
    pub degree: String,
    pub field: Option<String>,
    #[serde(default, deserialize_with = "year_from_string_or_number")]
    pub graduation_year: Option<i32>,
    #[serde(default, deserialize_with = "string_from_string_or_number")]
    pub gpa: Option<String>,
}

impl From<EducationEntry> for Education {
    fn from(entry: EducationEntry) -> Self {
        Education {
            institution: entry.institution,
            degree: entry.degree,
            field: entry.field,
            graduation_year: entry.graduation_year,
            gpa: entry.gpa,
        }
    }
}

// The form serializes dates as either full dates or year-month values, and
// numbers sometimes arrive as strings. These deserializers absorb both.

fn flexible_date<'de, D>(deserializer: D) -> Result<Option<NaiveDate>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let opt: Option<String> = Option::deserialize(deserializer)?;
    Ok(opt.as_deref().and_then(parse_flexible_date))
}

pub fn parse_flexible_date(raw: &str) -> Option<NaiveDate> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return None;
    }
    NaiveDate::parse_from_str(trimmed, "%Y-%m-%d")
        .or_else(|_| NaiveDate::parse_from_str(&format!("{}-01", trimmed), "%Y-%m-%d"))
        .ok()
}

fn year_from_string_or_number<'de, D>(deserializer: D) -> Result<Option<i32>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let opt: Option<serde_json::Value> = Option::deserialize(deserializer)?;
    Ok(opt.and_then(|v| match v {
        serde_json::Value::Number(n) => n.as_i64().map(|y| y as i32),
        serde_json::Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }))
}

fn string_from_string_or_number<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let opt: Option<serde_json::Value> = Option::deserialize(deserializer)?;
    Ok(opt.and_then(|v| match v {
        serde_json::Value::Number(n) => Some(n.to_string()),
        serde_json::Value::String(s) => {
            let trimmed = s.trim();
            if trimmed.is_empty() {
                None
            } else {
                Some(trimmed.to_string())
            }
        }
        _ => None,
    }))
}

#[derive(Debug, Deserialize)]
pub struct ApplicationListQuery {
    pub status: Option<String>,
    pub position: Option<String>,
    pub page: Option<i64>,
    pub cursor: Option<String>,
    pub limit: Option<i64>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ApplicationListResponse {
    pub items: Vec<crate::models::application::ApplicationSummary>,
    pub page_info: PageInfo,
}

impl From<ApplicationPage> for ApplicationListResponse {
    fn from(page: ApplicationPage) -> Self {
        Self {
            items: page.items,
            page_info: page.page_info,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct StatusUpdatePayload {
    pub status: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmitResponse {
    pub success: bool,
    pub message: String,
    pub application_id: Uuid,
}

#[derive(Debug, Serialize)]
pub struct AckResponse {
    pub success: bool,
    pub message: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ApplicationStatsResponse {
    pub total: i64,
    pub counts_by_status: Vec<crate::storage::StatusCount>,
    pub counts_by_position: Vec<crate::storage::PositionCount>,
    pub monthly: Vec<crate::storage::MonthlyCount>,
    pub recent_items: Vec<crate::models::application::ApplicationSummary>,
}

impl From<ApplicationStats> for ApplicationStatsResponse {
    fn from(stats: ApplicationStats) -> Self {
        Self {
            total: stats.total,
            counts_by_status: stats.by_status,
            counts_by_position: stats.by_position,
            monthly: stats.monthly,
            recent_items: stats.recent,
        }
    }
}
