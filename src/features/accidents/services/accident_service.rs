use std::collections::HashSet;
use std::sync::Arc;

use tracing::{info, warn};

use crate::core::error::{AppError, Result};
use crate::features::accidents::models::{Accident, AccidentStatus, AccidentType, Rule};
use crate::features::accidents::repositories::{
    AccidentRepository, AccidentTypeRepository, RuleRepository,
};
use crate::features::files::dtos::FileUpload;
use crate::features::files::services::FileStore;
use crate::features::users::repositories::UserRepository;

/// What happened to a file the accident stopped referencing.
///
/// File storage and accident storage share no transaction. Once the accident
/// row is written the operation counts as done, and a failed file delete is
/// reported here instead of failing the call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FileCleanup {
    /// There was no previous file
    NotRequired,
    Done,
    /// The file is orphaned and must be removed out of band
    Pending { file_id: i32, reason: String },
}

impl FileCleanup {
    pub fn is_pending(&self) -> bool {
        matches!(self, FileCleanup::Pending { .. })
    }
}

/// Persisted accident plus the outcome of releasing its previous photo
#[derive(Debug, Clone)]
pub struct SavedAccident {
    pub accident: Accident,
    pub cleanup: FileCleanup,
}

/// Assembles, validates and persists accidents.
///
/// Sole writer of `user`, `accident_type`, `rules`, `file_id` and the initial
/// `status`; callers never set these directly.
pub struct AccidentService {
    accidents: Arc<dyn AccidentRepository>,
    accident_types: Arc<dyn AccidentTypeRepository>,
    rules: Arc<dyn RuleRepository>,
    users: Arc<dyn UserRepository>,
    files: Arc<dyn FileStore>,
}

impl AccidentService {
    pub fn new(
        accidents: Arc<dyn AccidentRepository>,
        accident_types: Arc<dyn AccidentTypeRepository>,
        rules: Arc<dyn RuleRepository>,
        users: Arc<dyn UserRepository>,
        files: Arc<dyn FileStore>,
    ) -> Self {
        Self {
            accidents,
            accident_types,
            rules,
            users,
            files,
        }
    }

    /// All accidents, ascending by id
    pub async fn find_all(&self) -> Result<Vec<Accident>> {
        let mut accidents = self.accidents.find_all().await?;
        accidents.sort_by_key(|a| a.id);
        Ok(accidents)
    }

    /// Store the photo, bind it, then insert the accident.
    ///
    /// A failed insert leaves the stored photo orphaned; nothing is rolled back.
    pub async fn create(&self, mut accident: Accident, image: FileUpload) -> Result<Accident> {
        if let Some(file_id) = accident.file_id {
            return Err(AppError::InvalidArgument(format!(
                "A new accident must not reference a file, got file id {}",
                file_id
            )));
        }

        let file = self.files.save(image).await?;
        accident.file_id = Some(file.id);

        let saved = self.accidents.save(accident).await.inspect_err(|e| {
            warn!("Accident insert failed, photo {} is orphaned: {}", file.id, e);
        })?;

        info!("Created accident: id={}, file_id={}", saved.id, file.id);
        Ok(saved)
    }

    /// Store the new photo, save the accident, and only then drop the old photo.
    ///
    /// The accident never points at a deleted file. A failed delete of the
    /// old photo is returned as `FileCleanup::Pending`.
    pub async fn update(&self, mut accident: Accident, image: FileUpload) -> Result<SavedAccident> {
        let old_file_id = accident.file_id;

        let file = self.files.save(image).await?;
        accident.file_id = Some(file.id);

        let saved = self.accidents.save(accident).await.inspect_err(|e| {
            warn!("Accident update failed, photo {} is orphaned: {}", file.id, e);
        })?;

        let cleanup = match old_file_id {
            Some(old) => self.release_file(saved.id, old).await,
            None => FileCleanup::NotRequired,
        };

        info!(
            "Updated accident: id={}, file_id={}, previous_file_id={:?}",
            saved.id, file.id, old_file_id
        );

        Ok(SavedAccident {
            accident: saved,
            cleanup,
        })
    }

    /// Resolve reporter, type and rules, then create (id 0) or update.
    ///
    /// All lookups finish before anything is written, so a missing type or
    /// rule leaves file and accident storage untouched.
    pub async fn create_or_update_accident(
        &self,
        username: &str,
        mut accident: Accident,
        rule_ids: &[String],
        image: FileUpload,
    ) -> Result<SavedAccident> {
        let user = self
            .users
            .find_by_username(username)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("User '{}' not found", username)))?;

        let type_id = accident.accident_type.id;
        let accident_type = self.find_accident_type_by_id(type_id).await?;
        let rules = self.find_rules_by_ids(rule_ids).await?;

        accident.user = Some(user);
        accident.accident_type = accident_type;
        accident.rules = rules;

        if accident.is_new() {
            accident.status = AccidentStatus::New;
            let created = self.create(accident, image).await?;
            Ok(SavedAccident {
                accident: created,
                cleanup: FileCleanup::NotRequired,
            })
        } else {
            self.update(accident, image).await
        }
    }

    pub async fn find_by_id(&self, id: i32) -> Result<Accident> {
        self.accidents
            .find_by_id(id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Accident with id = {} not found", id)))
    }

    /// Non-throwing lookup; `None` when the accident does not exist
    pub async fn find_accident_by_id(&self, id: i32) -> Result<Option<Accident>> {
        self.accidents.find_accident_by_id(id).await
    }

    /// Move the accident to `status`; no transition is forbidden here
    pub async fn change_status(&self, id: i32, status: AccidentStatus) -> Result<Accident> {
        let mut accident = self.find_by_id(id).await?;
        let previous = accident.status;
        accident.status = status;

        let saved = self.accidents.save(accident).await?;
        info!("Accident {} status changed: {} -> {}", id, previous, status);
        Ok(saved)
    }

    /// Delete the row first, then its photo.
    ///
    /// A failed photo delete after the row is gone is returned as
    /// `FileCleanup::Pending` rather than an error.
    pub async fn delete_by_id(&self, id: i32) -> Result<FileCleanup> {
        let accident = self.find_by_id(id).await?;
        self.accidents.delete_by_id(id).await?;

        let cleanup = match accident.file_id {
            Some(file_id) => self.release_file(id, file_id).await,
            None => FileCleanup::NotRequired,
        };

        info!("Deleted accident: id={}, file_id={:?}", id, accident.file_id);
        Ok(cleanup)
    }

    async fn release_file(&self, accident_id: i32, file_id: i32) -> FileCleanup {
        match self.files.delete_by_id(file_id).await {
            Ok(()) => FileCleanup::Done,
            Err(e) => {
                warn!(
                    "Accident {} saved but photo {} could not be deleted: {}",
                    accident_id, file_id, e
                );
                FileCleanup::Pending {
                    file_id,
                    reason: e.to_string(),
                }
            }
        }
    }

    // -------------------------------------------------------------------------
    // Accident types
    // -------------------------------------------------------------------------

    pub async fn find_all_accident_types(&self) -> Result<Vec<AccidentType>> {
        self.accident_types.find_all().await
    }

    pub async fn find_accident_type_by_id(&self, id: i32) -> Result<AccidentType> {
        self.accident_types
            .find_by_id(id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Accident type with id = {} not found", id)))
    }

    pub async fn create_accident_type(&self, name: &str) -> Result<AccidentType> {
        let created = self
            .accident_types
            .save(AccidentType::new(0, name))
            .await?;
        info!("Created accident type: id={}, name={}", created.id, created.name);
        Ok(created)
    }

    /// Fails with `Conflict` while accidents still use the type
    pub async fn delete_accident_type_by_id(&self, id: i32) -> Result<()> {
        self.find_accident_type_by_id(id).await?;
        self.accident_types.delete_by_id(id).await?;
        info!("Deleted accident type: id={}", id);
        Ok(())
    }

    // -------------------------------------------------------------------------
    // Rules
    // -------------------------------------------------------------------------

    pub async fn find_all_accident_rules(&self) -> Result<Vec<Rule>> {
        self.rules.find_all().await
    }

    pub async fn find_rule_by_id(&self, id: i32) -> Result<Rule> {
        self.rules
            .find_by_id(id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Rule with id = {} not found", id)))
    }

    /// Resolve string-encoded rule ids in order; duplicates collapse
    pub async fn find_rules_by_ids(&self, ids: &[String]) -> Result<HashSet<Rule>> {
        let mut rules = HashSet::with_capacity(ids.len());
        for raw in ids {
            let id = parse_rule_id(raw)?;
            rules.insert(self.find_rule_by_id(id).await?);
        }
        Ok(rules)
    }

    pub async fn create_rule(&self, name: &str) -> Result<Rule> {
        let created = self.rules.save(Rule::new(0, name)).await?;
        info!("Created rule: id={}, name={}", created.id, created.name);
        Ok(created)
    }

    /// Fails with `Conflict` while accidents still cite the rule
    pub async fn delete_rule_by_id(&self, id: i32) -> Result<()> {
        self.find_rule_by_id(id).await?;
        self.rules.delete_by_id(id).await?;
        info!("Deleted rule: id={}", id);
        Ok(())
    }
}

fn parse_rule_id(raw: &str) -> Result<i32> {
    raw.parse::<i32>()
        .map_err(|e| AppError::InvalidArgument(format!("Invalid rule id '{}': {}", raw, e)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::features::users::models::User;
    use crate::shared::test_helpers::{png_upload, TestStores};

    fn ids(values: &[&str]) -> Vec<String> {
        values.iter().map(|v| v.to_string()).collect()
    }

    #[tokio::test]
    async fn test_find_all_sorted_by_id_for_any_insertion_order() {
        let stores = TestStores::seeded();
        for id in [42, 3, 17, 1] {
            stores.accidents.insert(stores.persisted_accident(id, Some(100 + id)));
        }

        let ids: Vec<i32> = stores
            .service()
            .find_all()
            .await
            .unwrap()
            .iter()
            .map(|a| a.id)
            .collect();

        assert_eq!(ids, vec![1, 3, 17, 42]);
    }

    #[tokio::test]
    async fn test_find_all_on_empty_store() {
        let stores = TestStores::seeded();
        assert!(stores.service().find_all().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_create_assigns_status_user_type_rules_and_file() {
        let stores = TestStores::seeded();
        let service = stores.service();
        let mut accident = Accident::draft("Crash", "Two cars collided", "Main St 1", 5);
        accident.status = AccidentStatus::Resolved;

        let saved = service
            .create_or_update_accident("alice", accident, &ids(&["7", "9"]), png_upload())
            .await
            .unwrap();

        let accident = saved.accident;
        assert!(accident.id > 0);
        assert_eq!(accident.status, AccidentStatus::New);
        assert_eq!(accident.accident_type.id, 5);
        assert_eq!(accident.accident_type.name, "Vehicle and cyclist");
        assert_eq!(
            accident.rules,
            [Rule::new(7, ""), Rule::new(9, "")].into_iter().collect()
        );
        assert_eq!(accident.user.as_ref().map(|u| u.username.as_str()), Some("alice"));

        let file_id = accident.file_id.expect("file bound");
        assert!(stores.files.contains(file_id));
        assert_eq!(saved.cleanup, FileCleanup::NotRequired);
        assert_eq!(stores.accidents.get(accident.id).unwrap().file_id, Some(file_id));
    }

    #[tokio::test]
    async fn test_update_keeps_supplied_status() {
        let stores = TestStores::seeded();
        let mut existing = stores.persisted_accident(42, None);
        existing.status = AccidentStatus::Accepted;
        stores.accidents.insert(existing.clone());

        let saved = stores
            .service()
            .create_or_update_accident("alice", existing, &[], png_upload())
            .await
            .unwrap();

        assert_eq!(saved.accident.status, AccidentStatus::Accepted);
        assert_eq!(saved.cleanup, FileCleanup::NotRequired);
    }

    #[tokio::test]
    async fn test_update_replaces_photo_and_deletes_old_one() {
        let stores = TestStores::seeded();
        let old_file = stores.files.preload();
        let existing = stores.persisted_accident(42, Some(old_file));
        stores.accidents.insert(existing.clone());

        let saved = stores
            .service()
            .create_or_update_accident("alice", existing, &ids(&["7"]), png_upload())
            .await
            .unwrap();

        let new_file = saved.accident.file_id.unwrap();
        assert_ne!(new_file, old_file);
        assert!(stores.files.contains(new_file));
        assert!(!stores.files.contains(old_file));
        assert_eq!(saved.cleanup, FileCleanup::Done);
        assert_eq!(stores.accidents.get(42).unwrap().file_id, Some(new_file));
    }

    #[tokio::test]
    async fn test_update_with_failing_old_file_delete_still_references_new_file() {
        let stores = TestStores::seeded();
        let old_file = stores.files.preload();
        let existing = stores.persisted_accident(42, Some(old_file));
        stores.accidents.insert(existing.clone());
        stores.files.fail_deletes();

        let saved = stores
            .service()
            .update(existing, png_upload())
            .await
            .unwrap();

        let new_file = saved.accident.file_id.unwrap();
        assert_eq!(stores.accidents.get(42).unwrap().file_id, Some(new_file));
        assert!(stores.files.contains(new_file));
        assert!(matches!(
            saved.cleanup,
            FileCleanup::Pending { file_id, .. } if file_id == old_file
        ));
    }

    #[tokio::test]
    async fn test_update_of_missing_accident_fails_and_keeps_old_file() {
        let stores = TestStores::seeded();
        let old_file = stores.files.preload();
        let ghost = stores.persisted_accident(404, Some(old_file));

        let err = stores
            .service()
            .update(ghost, png_upload())
            .await
            .unwrap_err();

        assert!(matches!(err, AppError::NotFound(_)));
        assert!(stores.files.contains(old_file));
        assert_eq!(stores.files.delete_calls(), 0);
    }

    #[tokio::test]
    async fn test_unknown_type_fails_before_any_write() {
        let stores = TestStores::seeded();
        let accident = Accident::draft("Crash", "text", "addr", 999);

        let err = stores
            .service()
            .create_or_update_accident("alice", accident, &ids(&["7"]), png_upload())
            .await
            .unwrap_err();

        assert!(matches!(err, AppError::NotFound(ref msg) if msg.contains("999")));
        assert_eq!(stores.files.save_calls(), 0);
        assert_eq!(stores.accidents.save_calls(), 0);
    }

    #[tokio::test]
    async fn test_unknown_rule_fails_naming_it_before_any_write() {
        let stores = TestStores::seeded();
        let accident = Accident::draft("Crash", "text", "addr", 5);

        let err = stores
            .service()
            .create_or_update_accident("alice", accident, &ids(&["7", "77", "9"]), png_upload())
            .await
            .unwrap_err();

        assert!(matches!(err, AppError::NotFound(ref msg) if msg.contains("77")));
        assert_eq!(stores.files.save_calls(), 0);
        assert_eq!(stores.accidents.save_calls(), 0);
    }

    #[tokio::test]
    async fn test_non_numeric_rule_id_is_invalid_argument() {
        let stores = TestStores::seeded();
        let accident = Accident::draft("Crash", "text", "addr", 5);

        let err = stores
            .service()
            .create_or_update_accident("alice", accident, &ids(&["7", "seven"]), png_upload())
            .await
            .unwrap_err();

        assert!(matches!(err, AppError::InvalidArgument(ref msg) if msg.contains("seven")));
        assert_eq!(stores.files.save_calls(), 0);
    }

    #[tokio::test]
    async fn test_unknown_user_is_not_found() {
        let stores = TestStores::seeded();
        let accident = Accident::draft("Crash", "text", "addr", 5);

        let err = stores
            .service()
            .create_or_update_accident("mallory", accident, &[], png_upload())
            .await
            .unwrap_err();

        assert!(matches!(err, AppError::NotFound(ref msg) if msg.contains("mallory")));
        assert_eq!(stores.files.save_calls(), 0);
    }

    #[tokio::test]
    async fn test_update_reassigns_reporter_to_caller() {
        let stores = TestStores::seeded();
        let mut existing = stores.persisted_accident(8, None);
        existing.user = Some(User {
            id: 99,
            username: "someone-else".to_string(),
            enabled: true,
        });
        stores.accidents.insert(existing.clone());

        let saved = stores
            .service()
            .create_or_update_accident("alice", existing, &[], png_upload())
            .await
            .unwrap();

        assert_eq!(saved.accident.user.unwrap().username, "alice");
    }

    #[tokio::test]
    async fn test_create_rejects_accident_already_bound_to_file() {
        let stores = TestStores::seeded();
        let mut accident = Accident::draft("Crash", "text", "addr", 5);
        accident.file_id = Some(3);

        let err = stores
            .service()
            .create(accident, png_upload())
            .await
            .unwrap_err();

        assert!(matches!(err, AppError::InvalidArgument(_)));
        assert_eq!(stores.files.save_calls(), 0);
    }

    #[tokio::test]
    async fn test_find_by_id_and_find_accident_by_id_differ_on_absence() {
        let stores = TestStores::seeded();
        let service = stores.service();

        let err = service.find_by_id(12).await.unwrap_err();
        assert!(matches!(err, AppError::NotFound(ref msg) if msg.contains("12")));
        assert!(service.find_accident_by_id(12).await.unwrap().is_none());

        stores.accidents.insert(stores.persisted_accident(12, None));
        assert_eq!(service.find_by_id(12).await.unwrap().id, 12);
        assert!(service.find_accident_by_id(12).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_delete_missing_accident_touches_nothing() {
        let stores = TestStores::seeded();

        let err = stores.service().delete_by_id(5).await.unwrap_err();

        assert!(matches!(err, AppError::NotFound(ref msg) if msg.contains('5')));
        assert_eq!(stores.accidents.delete_calls(), 0);
        assert_eq!(stores.files.delete_calls(), 0);
    }

    #[tokio::test]
    async fn test_delete_removes_row_and_file() {
        let stores = TestStores::seeded();
        let file_id = stores.files.preload();
        stores.accidents.insert(stores.persisted_accident(42, Some(file_id)));

        let cleanup = stores.service().delete_by_id(42).await.unwrap();

        assert_eq!(cleanup, FileCleanup::Done);
        assert!(stores.accidents.get(42).is_none());
        assert!(!stores.files.contains(file_id));
    }

    #[tokio::test]
    async fn test_delete_with_failing_file_delete_reports_pending() {
        let stores = TestStores::seeded();
        let file_id = stores.files.preload();
        stores.accidents.insert(stores.persisted_accident(42, Some(file_id)));
        stores.files.fail_deletes();

        let cleanup = stores.service().delete_by_id(42).await.unwrap();

        assert!(cleanup.is_pending());
        assert!(stores.accidents.get(42).is_none());
    }

    #[tokio::test]
    async fn test_change_status_persists_without_touching_files() {
        let stores = TestStores::seeded();
        stores.accidents.insert(stores.persisted_accident(4, Some(1)));

        let accident = stores
            .service()
            .change_status(4, AccidentStatus::Rejected)
            .await
            .unwrap();

        assert_eq!(accident.status, AccidentStatus::Rejected);
        assert_eq!(stores.accidents.get(4).unwrap().status, AccidentStatus::Rejected);
        assert_eq!(stores.files.save_calls(), 0);
        assert_eq!(stores.files.delete_calls(), 0);
    }

    #[tokio::test]
    async fn test_find_rules_by_ids_collapses_duplicates() {
        let stores = TestStores::seeded();

        let rules = stores
            .service()
            .find_rules_by_ids(&ids(&["7", "9", "7"]))
            .await
            .unwrap();

        assert_eq!(rules.len(), 2);
    }

    #[tokio::test]
    async fn test_catalog_lookups() {
        let stores = TestStores::seeded();
        let service = stores.service();

        assert_eq!(service.find_all_accident_types().await.unwrap().len(), 3);
        assert_eq!(service.find_all_accident_rules().await.unwrap().len(), 3);
        assert_eq!(service.find_rule_by_id(9).await.unwrap().name, "Article 12.9");

        let err = service.find_rule_by_id(1000).await.unwrap_err();
        assert!(matches!(err, AppError::NotFound(ref msg) if msg.contains("1000")));
    }

    #[tokio::test]
    async fn test_create_and_delete_catalog_entries() {
        let stores = TestStores::seeded();
        let service = stores.service();

        let accident_type = service.create_accident_type("Rollover").await.unwrap();
        assert!(accident_type.id > 0);
        service
            .delete_accident_type_by_id(accident_type.id)
            .await
            .unwrap();
        assert!(matches!(
            service.delete_accident_type_by_id(accident_type.id).await,
            Err(AppError::NotFound(_))
        ));

        let rule = service.create_rule("Article 14.2").await.unwrap();
        service.delete_rule_by_id(rule.id).await.unwrap();
        assert!(matches!(
            service.find_rule_by_id(rule.id).await,
            Err(AppError::NotFound(_))
        ));
    }
}
