use axum::{
    extract::{Multipart, Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use serde::Serialize;
use uuid::Uuid;
use validator::Validate;

use crate::dto::application_dto::{
    parse_flexible_date, AckResponse, ApplicationDraft, ApplicationListQuery,
    ApplicationListResponse, ApplicationStatsResponse, EducationEntry, StatusUpdatePayload,
    SubmitResponse, WorkExperienceEntry,
};
use crate::error::{Error, Result};
use crate::models::application::{Application, ApplicationFiles, ApplicationStatus};
use crate::storage::{ApplicationFilter, PageRequest};
use crate::AppState;

#[derive(Debug, Serialize)]
pub struct ApplicationResponse {
    pub application: Application,
}

/// File parts of the intake form. Only the image slots go to the image
/// host; document slots are accepted but not forwarded anywhere yet.
const FILE_SLOTS: [&str; 5] = ["resume", "coverLetter", "portfolio", "idPhoto", "nationalIdCopy"];
const IMAGE_SLOTS: [&str; 2] = ["idPhoto", "nationalIdCopy"];

struct Attachment {
    slot: &'static str,
    content_type: Option<String>,
    data: bytes::Bytes,
}

fn non_empty(value: String) -> Option<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}

#[utoipa::path(
    post,
    path = "/api/applications",
    responses(
        (status = 201, description = "Application submitted", body = Json<SubmitResponse>),
        (status = 400, description = "Missing field, invalid file, or duplicate email"),
        (status = 500, description = "Upload or storage failure")
    )
)]
#[axum::debug_handler]
pub async fn submit_application(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<impl IntoResponse> {
    tracing::info!("Application submission received");

    let mut draft = ApplicationDraft::default();
    let mut attachments: Vec<Attachment> = Vec::new();

    while let Some(field) = multipart.next_field().await? {
        let field_name = field.name().unwrap_or_default().to_string();

        if let Some(slot) = FILE_SLOTS.iter().copied().find(|s| *s == field_name) {
            let content_type = field.content_type().map(|ct| ct.to_string());
            let data = field.bytes().await.map_err(|e| {
                tracing::error!("Failed to read file part {}: {}", slot, e);
                Error::BadRequest("تعذر قراءة الملف المرفق".to_string())
            })?;
            if !data.is_empty() {
                attachments.push(Attachment {
                    slot,
                    content_type,
                    data,
                });
            }
            continue;
        }

        match field_name.as_str() {
            "firstName" => draft.first_name = field.text().await.unwrap_or_default(),
            "lastName" => draft.last_name = field.text().await.unwrap_or_default(),
            "email" => draft.email = field.text().await.unwrap_or_default(),
            "phone" => draft.phone = field.text().await.unwrap_or_default(),
            "address" => draft.address = non_empty(field.text().await.unwrap_or_default()),
            "city" => draft.city = non_empty(field.text().await.unwrap_or_default()),
            "state" => draft.state = non_empty(field.text().await.unwrap_or_default()),
            "zipCode" => draft.zip_code = non_empty(field.text().await.unwrap_or_default()),
            "nationality" => draft.nationality = field.text().await.unwrap_or_default(),
            "dateOfBirth" => {
                draft.date_of_birth =
                    parse_flexible_date(&field.text().await.unwrap_or_default());
            }
            "gender" => draft.gender = non_empty(field.text().await.unwrap_or_default()),
            "maritalStatus" => {
                draft.marital_status = non_empty(field.text().await.unwrap_or_default())
            }
            "nationalId" => draft.national_id = field.text().await.unwrap_or_default(),
            "position" => draft.position = field.text().await.unwrap_or_default(),
            "department" => draft.department = non_empty(field.text().await.unwrap_or_default()),
            "salaryExpectation" => {
                draft.salary_expectation = non_empty(field.text().await.unwrap_or_default())
            }
            "availableStartDate" => {
                draft.available_start_date =
                    parse_flexible_date(&field.text().await.unwrap_or_default());
            }
            "employmentType" => {
                draft.employment_type = non_empty(field.text().await.unwrap_or_default())
            }
            "coverLetter" => draft.cover_letter = non_empty(field.text().await.unwrap_or_default()),
            "linkedinUrl" => draft.linkedin_url = non_empty(field.text().await.unwrap_or_default()),
            "portfolioUrl" => {
                draft.portfolio_url = non_empty(field.text().await.unwrap_or_default())
            }
            "referralSource" => {
                draft.referral_source = non_empty(field.text().await.unwrap_or_default())
            }
            "workAuthorization" => {
                draft.work_authorization = field.text().await.unwrap_or_default()
            }
            "backgroundCheck" => {
                draft.background_check = field.text().await.unwrap_or_default() == "true"
            }
            "drugTest" => draft.drug_test = field.text().await.unwrap_or_default() == "true",
            "workExperience" => {
                let raw = field.text().await.unwrap_or_default();
                match serde_json::from_str::<Vec<WorkExperienceEntry>>(&raw) {
                    Ok(entries) => {
                        draft.work_experience = entries
                            .into_iter()
                            .filter(|e| !e.company.is_empty() && !e.position.is_empty())
                            .collect();
                    }
                    Err(e) => tracing::warn!("Ignoring malformed workExperience field: {}", e),
                }
            }
            "education" => {
                let raw = field.text().await.unwrap_or_default();
                match serde_json::from_str::<Vec<EducationEntry>>(&raw) {
                    Ok(entries) => {
                        draft.education = entries
                            .into_iter()
                            .filter(|e| !e.institution.is_empty() && !e.degree.is_empty())
                            .collect();
                    }
                    Err(e) => tracing::warn!("Ignoring malformed education field: {}", e),
                }
            }
            "skills" => {
                let raw = field.text().await.unwrap_or_default();
                match serde_json::from_str::<Vec<String>>(&raw) {
                    Ok(entries) => {
                        draft.skills = entries
                            .into_iter()
                            .filter_map(non_empty)
                            .collect();
                    }
                    Err(e) => tracing::warn!("Ignoring malformed skills field: {}", e),
                }
            }
            _ => {}
        }
    }

    let missing = draft.missing_required_fields();
    if !missing.is_empty() {
        tracing::warn!(fields = ?missing, "submission rejected, required fields missing");
        return Err(Error::BadRequest("الحقول المطلوبة مفقودة".to_string()));
    }
    draft.validate()?;

    // Images go up before anything is persisted, so an upload failure
    // cannot leave a half-filled application behind.
    let mut files = ApplicationFiles::default();
    for attachment in &attachments {
        if !IMAGE_SLOTS.contains(&attachment.slot) {
            tracing::debug!("Skipping non-image attachment: {}", attachment.slot);
            continue;
        }

        if let Err(message) = state
            .images
            .validate_image(attachment.content_type.as_deref(), attachment.data.len())
        {
            return Err(Error::BadRequest(format!("{}: {}", attachment.slot, message)));
        }

        let hosted = state
            .images
            .upload(&attachment.data, Some(0))
            .await
            .map_err(|e| {
                tracing::error!("Upload of {} failed: {}", attachment.slot, e);
                Error::UploadFailed(attachment.slot.to_string())
            })?;
        files.set(attachment.slot, hosted.url);
    }

    let application_id = state.store.create(draft.clone(), files).await?;
    tracing::info!(id = %application_id, email = %draft.email, "application created");

    // Mail delivery never blocks or fails the submission response.
    let mailer = state.mailer.clone();
    let hr_email = state.config.hr_email.clone();
    tokio::spawn(async move {
        mailer.notify_submission(&draft, &hr_email).await;
    });

    Ok((
        StatusCode::CREATED,
        Json(SubmitResponse {
            success: true,
            message: "تم إرسال طلب التوظيف بنجاح".to_string(),
            application_id,
        }),
    ))
}

#[utoipa::path(
    get,
    path = "/api/applications",
    params(
        ("status" = Option<String>, Query, description = "Filter by review status"),
        ("position" = Option<String>, Query, description = "Filter by position substring"),
        ("page" = Option<i64>, Query, description = "Page number (offset backend)"),
        ("cursor" = Option<String>, Query, description = "Last item token (cursor backend)"),
        ("limit" = Option<i64>, Query, description = "Page size")
    ),
    responses(
        (status = 200, description = "Filtered application page", body = Json<ApplicationListResponse>),
        (status = 400, description = "Unknown status value")
    )
)]
#[axum::debug_handler]
pub async fn list_applications(
    State(state): State<AppState>,
    Query(query): Query<ApplicationListQuery>,
) -> Result<impl IntoResponse> {
    let status: Option<ApplicationStatus> = match query.status.as_deref().filter(|s| !s.is_empty())
    {
        Some(raw) => Some(raw.parse()?),
        None => None,
    };

    let filter = ApplicationFilter {
        status,
        position: query.position.filter(|p| !p.trim().is_empty()),
    };
    let page = PageRequest::new(query.page, query.cursor, query.limit);

    let result = state.store.list(filter, page).await?;
    Ok(Json(ApplicationListResponse::from(result)))
}

#[utoipa::path(
    get,
    path = "/api/applications/stats",
    responses(
        (status = 200, description = "Collection-wide aggregates", body = Json<ApplicationStatsResponse>)
    )
)]
#[axum::debug_handler]
pub async fn application_stats(State(state): State<AppState>) -> Result<impl IntoResponse> {
    let stats = state.store.stats().await?;
    Ok(Json(ApplicationStatsResponse::from(stats)))
}

#[utoipa::path(
    get,
    path = "/api/applications/{id}",
    params(("id" = Uuid, Path, description = "Application ID")),
    responses(
        (status = 200, description = "Full application record", body = Json<ApplicationResponse>),
        (status = 404, description = "Application not found")
    )
)]
#[axum::debug_handler]
pub async fn get_application(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse> {
    let application = state.store.get(id).await?;
    Ok(Json(ApplicationResponse { application }))
}

#[utoipa::path(
    patch,
    path = "/api/applications/{id}",
    params(("id" = Uuid, Path, description = "Application ID")),
    request_body = StatusUpdatePayload,
    responses(
        (status = 200, description = "Status updated", body = Json<AckResponse>),
        (status = 400, description = "Invalid status value"),
        (status = 404, description = "Application not found")
    )
)]
#[axum::debug_handler]
pub async fn update_application_status(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<StatusUpdatePayload>,
) -> Result<impl IntoResponse> {
    let status: ApplicationStatus = payload.status.parse()?;
    state.store.update_status(id, status).await?;

    Ok(Json(AckResponse {
        success: true,
        message: "تم تحديث حالة الطلب بنجاح".to_string(),
    }))
}

#[utoipa::path(
    delete,
    path = "/api/applications/{id}",
    params(("id" = Uuid, Path, description = "Application ID")),
    responses(
        (status = 200, description = "Application deleted", body = Json<AckResponse>),
        (status = 404, description = "Application not found")
    )
)]
#[axum::debug_handler]
pub async fn delete_application(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse> {
    state.store.delete(id).await?;

    Ok(Json(AckResponse {
        success: true,
        message: "تم حذف الطلب بنجاح".to_string(),
    }))
}
