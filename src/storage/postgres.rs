use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use sqlx::{FromRow, PgPool};
use uuid::Uuid;

use crate::dto::application_dto::ApplicationDraft;
use crate::error::{Error, Result};
use crate::models::application::{
    Application, ApplicationFiles, ApplicationStatus, ApplicationSummary, Education,
    WorkExperience,
};

use super::{
    ApplicationFilter, ApplicationPage, ApplicationStats, ApplicationStore, MonthlyCount,
    PageInfo, PageRequest, PositionCount, StatusCount,
};

/// Relational backend. Email uniqueness is enforced by the
/// `applications(email)` unique index; the conflict maps to
/// `DuplicateEmail`.
#[derive(Clone)]
pub struct PostgresStore {
    pool: PgPool,
}

impl PostgresStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(FromRow)]
struct ApplicationRow {
    id: Uuid,
    first_name: String,
    last_name: String,
    email: String,
    phone: String,
    address: Option<String>,
    city: Option<String>,
    state: Option<String>,
    zip_code: Option<String>,
    nationality: String,
    date_of_birth: Option<NaiveDate>,
    gender: Option<String>,
    marital_status: Option<String>,
    national_id: String,
    position: String,
    department: Option<String>,
    salary_expectation: Option<String>,
    available_start_date: Option<NaiveDate>,
    employment_type: Option<String>,
    cover_letter: Option<String>,
    linkedin_url: Option<String>,
    portfolio_url: Option<String>,
    referral_source: Option<String>,
    work_authorization: String,
    background_check: bool,
    drug_test: bool,
    status: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

#[derive(FromRow)]
struct SummaryRow {
    id: Uuid,
    first_name: String,
    last_name: String,
    email: String,
    phone: String,
    position: String,
    department: Option<String>,
    nationality: String,
    status: String,
    created_at: DateTime<Utc>,
}

#[derive(FromRow)]
struct WorkExperienceRow {
    company: String,
    position: String,
    start_date: Option<NaiveDate>,
    end_date: Option<NaiveDate>,
    is_current: bool,
    description: Option<String>,
}

#[derive(FromRow)]
struct EducationRow {
    institution: String,
    degree: String,
    field: Option<String>,
    graduation_year: Option<i32>,
    gpa: Option<String>,
}

const SUMMARY_COLUMNS: &str =
    "id, first_name, last_name, email, phone, position, department, nationality, status, created_at";

fn parse_status(raw: &str) -> Result<ApplicationStatus> {
    raw.parse()
        .map_err(|_| Error::Internal(format!("unexpected status value in storage: {}", raw)))
}

fn summary_from_row(row: SummaryRow) -> Result<ApplicationSummary> {
    Ok(ApplicationSummary {
        id: row.id,
        first_name: row.first_name,
        last_name: row.last_name,
        email: row.email,
        phone: row.phone,
        position: row.position,
        department: row.department,
        nationality: row.nationality,
        status: parse_status(&row.status)?,
        created_at: row.created_at,
    })
}

fn is_unique_violation(err: &sqlx::Error) -> bool {
    matches!(err, sqlx::Error::Database(db) if db.code().as_deref() == Some("23505"))
}

#[async_trait]
impl ApplicationStore for PostgresStore {
    async fn create(&self, draft: ApplicationDraft, files: ApplicationFiles) -> Result<Uuid> {
        // Fast path for the friendly error; the unique index below stays
        // authoritative under concurrent submissions.
        let existing: Option<(Uuid,)> =
            sqlx::query_as("SELECT id FROM applications WHERE email = $1")
                .bind(&draft.email)
                .fetch_optional(&self.pool)
                .await?;
        if existing.is_some() {
            return Err(Error::DuplicateEmail);
        }

        let mut tx = self.pool.begin().await?;

        let inserted: std::result::Result<(Uuid,), sqlx::Error> = sqlx::query_as(
            r#"
            INSERT INTO applications (
                first_name, last_name, email, phone, address, city, state, zip_code,
                nationality, date_of_birth, gender, marital_status, national_id,
                position, department, salary_expectation, available_start_date, employment_type,
                cover_letter, linkedin_url, portfolio_url, referral_source,
                work_authorization, background_check, drug_test, status
            ) VALUES (
                $1, $2, $3, $4, $5, $6, $7, $8,
                $9, $10, $11, $12, $13,
                $14, $15, $16, $17, $18,
                $19, $20, $21, $22,
                $23, $24, $25, 'pending'
            )
            RETURNING id
            "#,
        )
        .bind(&draft.first_name)
        .bind(&draft.last_name)
        .bind(&draft.email)
        .bind(&draft.phone)
        .bind(&draft.address)
        .bind(&draft.city)
        .bind(&draft.state)
        .bind(&draft.zip_code)
        .bind(&draft.nationality)
        .bind(draft.date_of_birth)
        .bind(&draft.gender)
        .bind(&draft.marital_status)
        .bind(&draft.national_id)
        .bind(&draft.position)
        .bind(&draft.department)
        .bind(&draft.salary_expectation)
        .bind(draft.available_start_date)
        .bind(&draft.employment_type)
        .bind(&draft.cover_letter)
        .bind(&draft.linkedin_url)
        .bind(&draft.portfolio_url)
        .bind(&draft.referral_source)
        .bind(&draft.work_authorization)
        .bind(draft.background_check)
        .bind(draft.drug_test)
        .fetch_one(&mut *tx)
        .await;

        let (id,) = match inserted {
            Ok(row) => row,
            Err(err) if is_unique_violation(&err) => return Err(Error::DuplicateEmail),
            Err(err) => return Err(err.into()),
        };

        for exp in &draft.work_experience {
            sqlx::query(
                r#"
                INSERT INTO work_experience (
                    application_id, company, position, start_date, end_date, is_current, description
                ) VALUES ($1, $2, $3, $4, $5, $6, $7)
                "#,
            )
            .bind(id)
            .bind(&exp.company)
            .bind(&exp.position)
            .bind(exp.start_date)
            .bind(exp.end_date)
            .bind(exp.current)
            .bind(&exp.description)
            .execute(&mut *tx)
            .await?;
        }

        for edu in &draft.education {
            sqlx::query(
                r#"
                INSERT INTO education (
                    application_id, institution, degree, field, graduation_year, gpa
                ) VALUES ($1, $2, $3, $4, $5, $6)
                "#,
            )
            .bind(id)
            .bind(&edu.institution)
            .bind(&edu.degree)
            .bind(&edu.field)
            .bind(edu.graduation_year)
            .bind(&edu.gpa)
            .execute(&mut *tx)
            .await?;
        }

        for skill in &draft.skills {
            sqlx::query("INSERT INTO skills (application_id, skill_name) VALUES ($1, $2)")
                .bind(id)
                .bind(skill)
                .execute(&mut *tx)
                .await?;
        }

        for (file_type, url) in files.entries() {
            sqlx::query(
                "INSERT INTO application_files (application_id, file_type, file_url) VALUES ($1, $2, $3)",
            )
            .bind(id)
            .bind(file_type)
            .bind(url)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;
        Ok(id)
    }

    async fn get(&self, id: Uuid) -> Result<Application> {
        let row: ApplicationRow = sqlx::query_as(
            r#"
            SELECT id, first_name, last_name, email, phone, address, city, state, zip_code,
                   nationality, date_of_birth, gender, marital_status, national_id,
                   position, department, salary_expectation, available_start_date, employment_type,
                   cover_letter, linkedin_url, portfolio_url, referral_source,
                   work_authorization, background_check, drug_test, status, created_at, updated_at
            FROM applications
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| Error::NotFound("الطلب غير موجود".to_string()))?;

        let experience: Vec<WorkExperienceRow> = sqlx::query_as(
            r#"
            SELECT company, position, start_date, end_date, is_current, description
            FROM work_experience
            WHERE application_id = $1
            ORDER BY start_date DESC
            "#,
        )
        .bind(id)
        .fetch_all(&self.pool)
        .await?;

        let education: Vec<EducationRow> = sqlx::query_as(
            r#"
            SELECT institution, degree, field, graduation_year, gpa
            FROM education
            WHERE application_id = $1
            ORDER BY graduation_year DESC
            "#,
        )
        .bind(id)
        .fetch_all(&self.pool)
        .await?;

        let skills: Vec<(String,)> = sqlx::query_as(
            "SELECT skill_name FROM skills WHERE application_id = $1 ORDER BY skill_name",
        )
        .bind(id)
        .fetch_all(&self.pool)
        .await?;

        let file_rows: Vec<(String, String)> = sqlx::query_as(
            "SELECT file_type, file_url FROM application_files WHERE application_id = $1 ORDER BY created_at",
        )
        .bind(id)
        .fetch_all(&self.pool)
        .await?;

        let mut files = ApplicationFiles::default();
        for (file_type, url) in file_rows {
            files.set(&file_type, url);
        }

        Ok(Application {
            id: row.id,
            first_name: row.first_name,
            last_name: row.last_name,
            email: row.email,
            phone: row.phone,
            address: row.address,
            city: row.city,
            state: row.state,
            zip_code: row.zip_code,
            nationality: row.nationality,
            date_of_birth: row.date_of_birth,
            gender: row.gender,
            marital_status: row.marital_status,
            national_id: row.national_id,
            position: row.position,
            department: row.department,
            salary_expectation: row.salary_expectation,
            available_start_date: row.available_start_date,
            employment_type: row.employment_type,
            cover_letter: row.cover_letter,
            linkedin_url: row.linkedin_url,
            portfolio_url: row.portfolio_url,
            referral_source: row.referral_source,
            work_authorization: row.work_authorization,
            background_check: row.background_check,
            drug_test: row.drug_test,
            work_experience: experience
                .into_iter()
                .map(|e| WorkExperience {
                    company: e.company,
                    position: e.position,
                    start_date: e.start_date,
                    end_date: e.end_date,
                    current: e.is_current,
                    description: e.description,
                })
                .collect(),
            education: education
                .into_iter()
                .map(|e| Education {
                    institution: e.institution,
                    degree: e.degree,
                    field: e.field,
                    graduation_year: e.graduation_year,
                    gpa: e.gpa,
                })
                .collect(),
            skills: skills.into_iter().map(|(s,)| s).collect(),
            files,
            status: parse_status(&row.status)?,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }

    async fn update_status(&self, id: Uuid, status: ApplicationStatus) -> Result<()> {
        let result = sqlx::query(
            "UPDATE applications SET status = $1, updated_at = NOW() WHERE id = $2",
        )
        .bind(status.as_str())
        .bind(id)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(Error::NotFound("الطلب غير موجود".to_string()));
        }
        Ok(())
    }

    async fn delete(&self, id: Uuid) -> Result<()> {
        // Owned rows go with the parent via ON DELETE CASCADE.
        let result = sqlx::query("DELETE FROM applications WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(Error::NotFound("الطلب غير موجود".to_string()));
        }
        Ok(())
    }

    async fn list(&self, filter: ApplicationFilter, page: PageRequest) -> Result<ApplicationPage> {
        let offset = (page.page - 1) * page.limit;

        let mut filters = Vec::new();
        let mut args: Vec<String> = Vec::new();

        if let Some(status) = filter.status {
            filters.push(format!("status = ${}", args.len() + 1));
            args.push(status.as_str().to_string());
        }
        if let Some(position) = filter.position {
            filters.push(format!("position ILIKE ${}", args.len() + 1));
            args.push(format!("%{}%", position));
        }

        let where_clause = if filters.is_empty() {
            "".to_string()
        } else {
            format!("WHERE {}", filters.join(" AND "))
        };

        let items_query = format!(
            "SELECT {} FROM applications {} ORDER BY created_at DESC LIMIT ${} OFFSET ${}",
            SUMMARY_COLUMNS,
            where_clause,
            args.len() + 1,
            args.len() + 2
        );
        let total_query = format!("SELECT COUNT(*) FROM applications {}", where_clause);

        let mut items_statement = sqlx::query_as::<_, SummaryRow>(&items_query);
        for value in &args {
            items_statement = items_statement.bind(value);
        }
        items_statement = items_statement.bind(page.limit).bind(offset);
        let rows = items_statement.fetch_all(&self.pool).await?;

        let mut total_statement = sqlx::query_scalar::<_, i64>(&total_query);
        for value in &args {
            total_statement = total_statement.bind(value);
        }
        let total = total_statement.fetch_one(&self.pool).await?;

        let items = rows
            .into_iter()
            .map(summary_from_row)
            .collect::<Result<Vec<_>>>()?;
        let total_pages = ((total as f64) / (page.limit as f64)).ceil() as i64;

        Ok(ApplicationPage {
            items,
            page_info: PageInfo::Offset {
                page: page.page,
                per_page: page.limit,
                total,
                total_pages,
            },
        })
    }

    async fn stats(&self) -> Result<ApplicationStats> {
        let total: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM applications")
            .fetch_one(&self.pool)
            .await?;

        let status_rows: Vec<(String, i64)> = sqlx::query_as(
            "SELECT status, COUNT(*) FROM applications GROUP BY status ORDER BY COUNT(*) DESC",
        )
        .fetch_all(&self.pool)
        .await?;
        let by_status = status_rows
            .into_iter()
            .map(|(status, count)| {
                Ok(StatusCount {
                    status: parse_status(&status)?,
                    count,
                })
            })
            .collect::<Result<Vec<_>>>()?;

        let position_rows: Vec<(String, i64)> = sqlx::query_as(
            "SELECT position, COUNT(*) FROM applications GROUP BY position ORDER BY COUNT(*) DESC LIMIT 10",
        )
        .fetch_all(&self.pool)
        .await?;
        let by_position = position_rows
            .into_iter()
            .map(|(position, count)| PositionCount { position, count })
            .collect();

        let monthly_rows: Vec<(String, i64)> = sqlx::query_as(
            r#"
            SELECT TO_CHAR(DATE_TRUNC('month', created_at), 'YYYY-MM') AS month, COUNT(*)
            FROM applications
            WHERE created_at >= NOW() - INTERVAL '12 months'
            GROUP BY 1
            ORDER BY 1 DESC
            "#,
        )
        .fetch_all(&self.pool)
        .await?;
        let monthly = monthly_rows
            .into_iter()
            .map(|(month, count)| MonthlyCount { month, count })
            .collect();

        let recent_rows: Vec<SummaryRow> = sqlx::query_as(&format!(
            "SELECT {} FROM applications ORDER BY created_at DESC LIMIT 5",
            SUMMARY_COLUMNS
        ))
        .fetch_all(&self.pool)
        .await?;
        let recent = recent_rows
            .into_iter()
            .map(summary_from_row)
            .collect::<Result<Vec<_>>>()?;

        Ok(ApplicationStats {
            total,
            by_status,
            by_position,
            monthly,
            recent,
        })
    }
}
