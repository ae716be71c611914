use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Review state of an application. The wire values form a closed set; any
/// other string is rejected at the boundary with `InvalidStatus`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ApplicationStatus {
    Pending,
    Reviewing,
    Interview,
    Accepted,
    Rejected,
}

impl ApplicationStatus {
    pub const ALL: [ApplicationStatus; 5] = [
        ApplicationStatus::Pending,
        ApplicationStatus::Reviewing,
        ApplicationStatus::Interview,
        ApplicationStatus::Accepted,
        ApplicationStatus::Rejected,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ApplicationStatus::Pending => "pending",
            ApplicationStatus::Reviewing => "reviewing",
            ApplicationStatus::Interview => "interview",
            ApplicationStatus::Accepted => "accepted",
            ApplicationStatus::Rejected => "rejected",
        }
    }
}

impl std::fmt::Display for ApplicationStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for ApplicationStatus {
    type Err = crate::error::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(ApplicationStatus::Pending),
            "reviewing" => Ok(ApplicationStatus::Reviewing),
            "interview" => Ok(ApplicationStatus::Interview),
            "accepted" => Ok(ApplicationStatus::Accepted),
            "rejected" => Ok(ApplicationStatus::Rejected),
            other => Err(crate::error::Error::InvalidStatus(other.to_string())),
        }
    }
}

/// Uploaded document URLs, keyed by the form part they arrived under.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApplicationFiles {
    pub resume: Option<String>,
    pub cover_letter: Option<String>,
    pub portfolio: Option<String>,
    pub id_photo: Option<String>,
    pub national_id_copy: Option<String>,
}

impl ApplicationFiles {
    /// (slot name, url) pairs for every populated slot, in form order.
    pub fn entries(&self) -> Vec<(&'static str, &str)> {
        [
            ("resume", &self.resume),
            ("coverLetter", &self.cover_letter),
            ("portfolio", &self.portfolio),
            ("idPhoto", &self.id_photo),
            ("nationalIdCopy", &self.national_id_copy),
        ]
        .into_iter()
        .filter_map(|(slot, url)| url.as_deref().map(|u| (slot, u)))
        .collect()
    }

    pub fn set(&mut self, slot: &str, url: String) {
        match slot {
            "resume" => self.resume = Some(url),
            "coverLetter" => self.cover_letter = Some(url),
            "portfolio" => self.portfolio = Some(url),
            "idPhoto" => self.id_photo = Some(url),
            "nationalIdCopy" => self.national_id_copy = Some(url),
            _ => {}
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkExperience {
    pub company: String,
    pub position: String,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub current: bool,
    pub description: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Education {
    pub institution: String,
    pub degree: String,
    pub field: Option<String>,
    pub graduation_year: Option<i32>,
    pub gpa: Option<String>,
}

/// One candidate submission, including the owned nested collections and the
/// uploaded-file map.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Application {
    pub id: Uuid,

    // Personal information
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub phone: String,
    pub address: Option<String>,
    pub city: Option<String>,
    pub state: Option<String>,
    pub zip_code: Option<String>,
    pub nationality: String,
    pub date_of_birth: Option<NaiveDate>,
    pub gender: Option<String>,
    pub marital_status: Option<String>,
    pub national_id: String,

    // Position information
    pub position: String,
    pub department: Option<String>,
    pub salary_expectation: Option<String>,
    pub available_start_date: Option<NaiveDate>,
    pub employment_type: Option<String>,

    // Additional information
    pub cover_letter: Option<String>,
    pub linkedin_url: Option<String>,
    pub portfolio_url: Option<String>,
    pub referral_source: Option<String>,

    // Legal information
    pub work_authorization: String,
    pub background_check: bool,
    pub drug_test: bool,

    pub work_experience: Vec<WorkExperience>,
    pub education: Vec<Education>,
    pub skills: Vec<String>,
    pub files: ApplicationFiles,

    pub status: ApplicationStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// The projection returned by list and stats endpoints.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApplicationSummary {
    pub id: Uuid,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub phone: String,
    pub position: String,
    pub department: Option<String>,
    pub nationality: String,
    pub status: ApplicationStatus,
    pub created_at: DateTime<Utc>,
}

impl From<&Application> for ApplicationSummary {
    fn from(app: &Application) -> Self {
        Self {
            id: app.id,
            first_name: app.first_name.clone(),
            last_name: app.last_name.clone(),
            email: app.email.clone(),
            phone: app.phone.clone(),
            position: app.position.clone(),
            department: app.department.clone(),
            nationality: app.nationality.clone(),
            status: app.status,
            created_at: app.created_at,
        }
    }
}
