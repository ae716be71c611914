use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{Datelike, Utc};
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::dto::application_dto::ApplicationDraft;
use crate::error::{Error, Result};
use crate::models::application::{
    Application, ApplicationFiles, ApplicationStatus, ApplicationSummary,
};

use super::{
    ApplicationFilter, ApplicationPage, ApplicationStats, ApplicationStore, MonthlyCount,
    PageInfo, PageRequest, PositionCount, StatusCount,
};

/// Document backend: denormalized application documents held in process,
/// insertion-ordered. Listing walks newest-first with an opaque
/// last-item cursor, the way a document store pages.
///
/// The email check and the insert run under one write lock, so duplicate
/// submissions cannot race past each other.
#[derive(Clone, Default)]
pub struct MemoryStore {
    documents: Arc<RwLock<Vec<Application>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

fn matches_filter(app: &Application, filter: &ApplicationFilter) -> bool {
    if let Some(status) = filter.status {
        if app.status != status {
            return false;
        }
    }
    if let Some(ref position) = filter.position {
        if !app
            .position
            .to_lowercase()
            .contains(&position.to_lowercase())
        {
            return false;
        }
    }
    true
}

#[async_trait]
impl ApplicationStore for MemoryStore {
    async fn create(&self, draft: ApplicationDraft, files: ApplicationFiles) -> Result<Uuid> {
        let mut documents = self.documents.write().await;

        if documents
            .iter()
            .any(|app| app.email.eq_ignore_ascii_case(&draft.email))
        {
            return Err(Error::DuplicateEmail);
        }

        let id = Uuid::new_v4();
        let now = Utc::now();
        documents.push(Application {
            id,
            first_name: draft.first_name,
            last_name: draft.last_name,
            email: draft.email,
            phone: draft.phone,
            address: draft.address,
            city: draft.city,
            state: draft.state,
            zip_code: draft.zip_code,
            nationality: draft.nationality,
            date_of_birth: draft.date_of_birth,
            gender: draft.gender,
            marital_status: draft.marital_status,
            national_id: draft.national_id,
            position: draft.position,
            department: draft.department,
            salary_expectation: draft.salary_expectation,
            available_start_date: draft.available_start_date,
            employment_type: draft.employment_type,
            cover_letter: draft.cover_letter,
            linkedin_url: draft.linkedin_url,
            portfolio_url: draft.portfolio_url,
            referral_source: draft.referral_source,
            work_authorization: draft.work_authorization,
            background_check: draft.background_check,
            drug_test: draft.drug_test,
            work_experience: draft.work_experience.into_iter().map(Into::into).collect(),
            education: draft.education.into_iter().map(Into::into).collect(),
            skills: draft.skills,
            files,
            status: ApplicationStatus::Pending,
            created_at: now,
            updated_at: now,
        });

        Ok(id)
    }

    async fn get(&self, id: Uuid) -> Result<Application> {
        let documents = self.documents.read().await;
        documents
            .iter()
            .find(|app| app.id == id)
            .cloned()
            .ok_or_else(|| Error::NotFound("الطلب غير موجود".to_string()))
    }

    async fn update_status(&self, id: Uuid, status: ApplicationStatus) -> Result<()> {
        let mut documents = self.documents.write().await;
        let app = documents
            .iter_mut()
            .find(|app| app.id == id)
            .ok_or_else(|| Error::NotFound("الطلب غير موجود".to_string()))?;

        app.status = status;
        app.updated_at = Utc::now();
        Ok(())
    }

    async fn delete(&self, id: Uuid) -> Result<()> {
        let mut documents = self.documents.write().await;
        let index = documents
            .iter()
            .position(|app| app.id == id)
            .ok_or_else(|| Error::NotFound("الطلب غير موجود".to_string()))?;

        documents.remove(index);
        Ok(())
    }

    async fn list(&self, filter: ApplicationFilter, page: PageRequest) -> Result<ApplicationPage> {
        let documents = self.documents.read().await;

        // Insertion order is creation order, so newest-first is a reverse walk.
        let mut matching = documents
            .iter()
            .rev()
            .filter(|app| matches_filter(app, &filter));

        if let Some(ref cursor) = page.cursor {
            let cursor_id: Uuid = cursor
                .parse()
                .map_err(|_| Error::BadRequest("مؤشر الصفحة غير صحيح".to_string()))?;
            // Skip everything up to and including the cursor document.
            for app in matching.by_ref() {
                if app.id == cursor_id {
                    break;
                }
            }
        }

        let items: Vec<ApplicationSummary> = matching
            .take(page.limit as usize)
            .map(ApplicationSummary::from)
            .collect();

        let has_more = items.len() as i64 == page.limit;
        let next_cursor = if has_more {
            items.last().map(|item| item.id.to_string())
        } else {
            None
        };

        Ok(ApplicationPage {
            items,
            page_info: PageInfo::Cursor {
                next_cursor,
                has_more,
            },
        })
    }

    async fn stats(&self) -> Result<ApplicationStats> {
        let documents = self.documents.read().await;

        let mut status_counts: HashMap<ApplicationStatus, i64> = HashMap::new();
        let mut position_counts: HashMap<String, i64> = HashMap::new();
        let mut monthly_counts: HashMap<String, i64> = HashMap::new();
        let horizon = Utc::now() - chrono::Duration::days(365);

        for app in documents.iter() {
            *status_counts.entry(app.status).or_insert(0) += 1;
            *position_counts.entry(app.position.clone()).or_insert(0) += 1;
            if app.created_at >= horizon {
                let month = format!("{:04}-{:02}", app.created_at.year(), app.created_at.month());
                *monthly_counts.entry(month).or_insert(0) += 1;
            }
        }

        let mut by_status: Vec<StatusCount> = status_counts
            .into_iter()
            .map(|(status, count)| StatusCount { status, count })
            .collect();
        by_status.sort_by(|a, b| b.count.cmp(&a.count));

        let mut by_position: Vec<PositionCount> = position_counts
            .into_iter()
            .map(|(position, count)| PositionCount { position, count })
            .collect();
        by_position.sort_by(|a, b| b.count.cmp(&a.count));
        by_position.truncate(10);

        let mut monthly: Vec<MonthlyCount> = monthly_counts
            .into_iter()
            .map(|(month, count)| MonthlyCount { month, count })
            .collect();
        monthly.sort_by(|a, b| b.month.cmp(&a.month));

        let recent: Vec<ApplicationSummary> = documents
            .iter()
            .rev()
            .take(5)
            .map(ApplicationSummary::from)
            .collect();

        Ok(ApplicationStats {
            total: documents.len() as i64,
            by_status,
            by_position,
            monthly,
            recent,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn draft(email: &str, position: &str) -> ApplicationDraft {
        ApplicationDraft {
            first_name: "Sara".to_string(),
            last_name: "Ahmed".to_string(),
            email: email.to_string(),
            phone: "+966500000000".to_string(),
            nationality: "Saudi".to_string(),
            national_id: "1234567890".to_string(),
            position: position.to_string(),
            work_authorization: "citizen".to_string(),
            ..Default::default()
        }
    }

    async fn seed(store: &MemoryStore, count: usize, position: &str) -> Vec<Uuid> {
        let mut ids = Vec::new();
        for i in 0..count {
            let id = store
                .create(
                    draft(&format!("{}_{}@example.com", position, i), position),
                    ApplicationFiles::default(),
                )
                .await
                .expect("create");
            ids.push(id);
        }
        ids
    }

    #[tokio::test]
    async fn create_assigns_pending_and_matching_timestamps() {
        let store = MemoryStore::new();
        let id = store
            .create(draft("sara@example.com", "Engineer"), ApplicationFiles::default())
            .await
            .expect("create");

        let app = store.get(id).await.expect("get");
        assert_eq!(app.status, ApplicationStatus::Pending);
        assert_eq!(app.created_at, app.updated_at);
        assert_eq!(app.email, "sara@example.com");
    }

    #[tokio::test]
    async fn duplicate_email_is_rejected_without_inserting() {
        let store = MemoryStore::new();
        store
            .create(draft("sara@example.com", "Engineer"), ApplicationFiles::default())
            .await
            .expect("first create");

        let err = store
            .create(draft("sara@example.com", "Designer"), ApplicationFiles::default())
            .await
            .expect_err("duplicate must fail");
        assert!(matches!(err, Error::DuplicateEmail));

        let stats = store.stats().await.expect("stats");
        assert_eq!(stats.total, 1);
    }

    #[tokio::test]
    async fn every_status_is_reachable_and_bumps_updated_at() {
        let store = MemoryStore::new();
        let id = store
            .create(draft("sara@example.com", "Engineer"), ApplicationFiles::default())
            .await
            .expect("create");

        let original = store.get(id).await.expect("get");
        let mut last_updated = original.updated_at;
        for status in ApplicationStatus::ALL {
            tokio::time::sleep(Duration::from_millis(2)).await;
            store.update_status(id, status).await.expect("update");
            let app = store.get(id).await.expect("get");
            assert_eq!(app.status, status);
            assert!(app.updated_at > last_updated);
            assert_eq!(app.created_at, original.created_at);
            last_updated = app.updated_at;
        }
    }

    #[tokio::test]
    async fn delete_then_get_is_not_found() {
        let store = MemoryStore::new();
        let id = store
            .create(draft("sara@example.com", "Engineer"), ApplicationFiles::default())
            .await
            .expect("create");

        store.delete(id).await.expect("delete");
        assert!(matches!(store.get(id).await, Err(Error::NotFound(_))));
        assert!(matches!(store.delete(id).await, Err(Error::NotFound(_))));
    }

    #[tokio::test]
    async fn status_filter_returns_only_matching_newest_first() {
        let store = MemoryStore::new();
        let ids = seed(&store, 4, "Engineer").await;
        store
            .update_status(ids[1], ApplicationStatus::Interview)
            .await
            .expect("update");
        store
            .update_status(ids[3], ApplicationStatus::Interview)
            .await
            .expect("update");

        let page = store
            .list(
                ApplicationFilter {
                    status: Some(ApplicationStatus::Interview),
                    position: None,
                },
                PageRequest::new(None, None, Some(10)),
            )
            .await
            .expect("list");

        assert_eq!(page.items.len(), 2);
        assert!(page
            .items
            .iter()
            .all(|item| item.status == ApplicationStatus::Interview));
        // Newest first: ids[3] was created after ids[1].
        assert_eq!(page.items[0].id, ids[3]);
        assert_eq!(page.items[1].id, ids[1]);
    }

    #[tokio::test]
    async fn position_filter_matches_substring_case_insensitively() {
        let store = MemoryStore::new();
        seed(&store, 3, "Software Engineer").await;
        seed(&store, 2, "Accountant").await;

        let page = store
            .list(
                ApplicationFilter {
                    status: None,
                    position: Some("engineer".to_string()),
                },
                PageRequest::new(None, None, Some(10)),
            )
            .await
            .expect("list");

        assert_eq!(page.items.len(), 3);
    }

    #[tokio::test]
    async fn cursor_pagination_walks_the_whole_collection() {
        let store = MemoryStore::new();
        let ids = seed(&store, 12, "Engineer").await;

        let mut seen = Vec::new();
        let mut cursor = None;
        loop {
            let page = store
                .list(
                    ApplicationFilter::default(),
                    PageRequest::new(None, cursor.clone(), Some(5)),
                )
                .await
                .expect("list");
            seen.extend(page.items.iter().map(|item| item.id));

            match page.page_info {
                PageInfo::Cursor {
                    next_cursor,
                    has_more,
                } => {
                    if !has_more {
                        assert!(page.items.len() < 5);
                        break;
                    }
                    assert_eq!(page.items.len(), 5);
                    cursor = next_cursor;
                }
                PageInfo::Offset { .. } => panic!("document store pages by cursor"),
            }
        }

        assert_eq!(seen.len(), 12);
        // Reverse creation order, no duplicates.
        let expected: Vec<Uuid> = ids.into_iter().rev().collect();
        assert_eq!(seen, expected);
    }

    #[tokio::test]
    async fn stats_totals_are_consistent() {
        let store = MemoryStore::new();
        let ids = seed(&store, 7, "Engineer").await;
        store
            .update_status(ids[0], ApplicationStatus::Accepted)
            .await
            .expect("update");
        store
            .update_status(ids[1], ApplicationStatus::Rejected)
            .await
            .expect("update");

        let stats = store.stats().await.expect("stats");
        assert_eq!(stats.total, 7);
        assert_eq!(
            stats.by_status.iter().map(|entry| entry.count).sum::<i64>(),
            stats.total
        );
        assert_eq!(stats.recent.len(), 5);
        // Newest first.
        assert_eq!(stats.recent[0].id, ids[6]);
        assert_eq!(stats.by_position[0].position, "Engineer");
        assert_eq!(stats.by_position[0].count, 7);
    }
}
