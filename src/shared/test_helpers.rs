//! In-memory stores and auth injection shared by unit and handler tests

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, AtomicI32, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use axum::{extract::Request, middleware::Next, Router};
use chrono::Utc;

use crate::core::error::{AppError, Result};
use crate::features::accidents::models::{Accident, AccidentType, Rule};
use crate::features::accidents::repositories::{
    AccidentRepository, AccidentTypeRepository, RuleRepository,
};
use crate::features::accidents::services::AccidentService;
use crate::features::auth::model::AuthenticatedUser;
use crate::features::files::dtos::FileUpload;
use crate::features::files::models::File;
use crate::features::files::services::FileStore;
use crate::features::users::models::User;
use crate::features::users::repositories::UserRepository;
use crate::shared::constants::{ROLE_INSPECTOR, ROLE_SUPER_ADMIN};

// -----------------------------------------------------------------------------
// Principals
// -----------------------------------------------------------------------------

pub fn create_user(username: &str, roles: &[&str]) -> AuthenticatedUser {
    AuthenticatedUser {
        sub: format!("sub-{}", username),
        username: username.to_string(),
        roles: roles.iter().map(|r| r.to_string()).collect(),
    }
}

pub fn create_reporter() -> AuthenticatedUser {
    create_user("alice", &[])
}

pub fn create_inspector() -> AuthenticatedUser {
    create_user("ivan", &[ROLE_INSPECTOR])
}

pub fn create_super_admin_user() -> AuthenticatedUser {
    create_user("root", &[ROLE_SUPER_ADMIN])
}

/// Stand-in for the JWT middleware: every request carries `user`
pub fn with_user(router: Router, user: AuthenticatedUser) -> Router {
    router.layer(axum::middleware::from_fn(
        move |mut request: Request, next: Next| {
            let user = user.clone();
            async move {
                request.extensions_mut().insert(user);
                next.run(request).await
            }
        },
    ))
}

pub fn png_upload() -> FileUpload {
    FileUpload {
        original_filename: "crash.png".to_string(),
        content_type: "image/png".to_string(),
        data: vec![0x89, b'P', b'N', b'G'],
    }
}

// -----------------------------------------------------------------------------
// Users
// -----------------------------------------------------------------------------

#[derive(Default)]
pub struct InMemoryUserRepository {
    users: Mutex<Vec<User>>,
}

impl InMemoryUserRepository {
    pub fn with_users(usernames: &[&str]) -> Self {
        let users = usernames
            .iter()
            .enumerate()
            .map(|(i, name)| User {
                id: i as i32 + 1,
                username: name.to_string(),
                enabled: true,
            })
            .collect();
        Self {
            users: Mutex::new(users),
        }
    }

    pub fn len(&self) -> usize {
        self.users.lock().unwrap().len()
    }
}

#[async_trait]
impl UserRepository for InMemoryUserRepository {
    async fn find_by_username(&self, username: &str) -> Result<Option<User>> {
        Ok(self
            .users
            .lock()
            .unwrap()
            .iter()
            .find(|u| u.username == username)
            .cloned())
    }

    async fn save(&self, mut user: User) -> Result<User> {
        let mut users = self.users.lock().unwrap();
        if let Some(existing) = users.iter().find(|u| u.username == user.username) {
            return Ok(existing.clone());
        }
        user.id = users.len() as i32 + 1;
        users.push(user.clone());
        Ok(user)
    }
}

// -----------------------------------------------------------------------------
// Catalogs
// -----------------------------------------------------------------------------

/// Id-keyed catalog shared by the type and rule fakes
struct Catalog {
    entries: Mutex<BTreeMap<i32, String>>,
}

impl Catalog {
    fn new(entries: &[(i32, &str)]) -> Self {
        Self {
            entries: Mutex::new(
                entries
                    .iter()
                    .map(|(id, name)| (*id, name.to_string()))
                    .collect(),
            ),
        }
    }

    fn all(&self) -> Vec<(i32, String)> {
        self.entries
            .lock()
            .unwrap()
            .iter()
            .map(|(id, name)| (*id, name.clone()))
            .collect()
    }

    fn get(&self, id: i32) -> Option<String> {
        self.entries.lock().unwrap().get(&id).cloned()
    }

    fn save(&self, id: i32, name: &str, what: &str) -> Result<i32> {
        let mut entries = self.entries.lock().unwrap();
        let id = if id == 0 {
            entries.keys().next_back().copied().unwrap_or(0) + 1
        } else if entries.contains_key(&id) {
            id
        } else {
            return Err(AppError::NotFound(format!("{} with id = {} not found", what, id)));
        };
        entries.insert(id, name.to_string());
        Ok(id)
    }

    fn delete(&self, id: i32) {
        self.entries.lock().unwrap().remove(&id);
    }
}

pub struct InMemoryAccidentTypeRepository(Catalog);

impl InMemoryAccidentTypeRepository {
    pub fn new(entries: &[(i32, &str)]) -> Self {
        Self(Catalog::new(entries))
    }
}

#[async_trait]
impl AccidentTypeRepository for InMemoryAccidentTypeRepository {
    async fn find_all(&self) -> Result<Vec<AccidentType>> {
        Ok(self
            .0
            .all()
            .into_iter()
            .map(|(id, name)| AccidentType::new(id, name))
            .collect())
    }

    async fn find_by_id(&self, id: i32) -> Result<Option<AccidentType>> {
        Ok(self.0.get(id).map(|name| AccidentType::new(id, name)))
    }

    async fn save(&self, accident_type: AccidentType) -> Result<AccidentType> {
        let id = self
            .0
            .save(accident_type.id, &accident_type.name, "Accident type")?;
        Ok(AccidentType::new(id, accident_type.name))
    }

    async fn delete_by_id(&self, id: i32) -> Result<()> {
        self.0.delete(id);
        Ok(())
    }
}

pub struct InMemoryRuleRepository(Catalog);

impl InMemoryRuleRepository {
    pub fn new(entries: &[(i32, &str)]) -> Self {
        Self(Catalog::new(entries))
    }
}

#[async_trait]
impl RuleRepository for InMemoryRuleRepository {
    async fn find_all(&self) -> Result<Vec<Rule>> {
        Ok(self
            .0
            .all()
            .into_iter()
            .map(|(id, name)| Rule::new(id, name))
            .collect())
    }

    async fn find_by_id(&self, id: i32) -> Result<Option<Rule>> {
        Ok(self.0.get(id).map(|name| Rule::new(id, name)))
    }

    async fn save(&self, rule: Rule) -> Result<Rule> {
        let id = self.0.save(rule.id, &rule.name, "Rule")?;
        Ok(Rule::new(id, rule.name))
    }

    async fn delete_by_id(&self, id: i32) -> Result<()> {
        self.0.delete(id);
        Ok(())
    }
}

// -----------------------------------------------------------------------------
// Accidents
// -----------------------------------------------------------------------------

/// Keeps accidents in insertion order so sorting is left to the service
#[derive(Default)]
pub struct InMemoryAccidentRepository {
    accidents: Mutex<Vec<Accident>>,
    next_id: AtomicI32,
    saves: AtomicUsize,
    deletes: AtomicUsize,
}

impl InMemoryAccidentRepository {
    /// Seed a persisted accident without counting it as a save
    pub fn insert(&self, accident: Accident) {
        self.next_id.fetch_max(accident.id, Ordering::SeqCst);
        self.accidents.lock().unwrap().push(accident);
    }

    pub fn get(&self, id: i32) -> Option<Accident> {
        self.accidents
            .lock()
            .unwrap()
            .iter()
            .find(|a| a.id == id)
            .cloned()
    }

    pub fn save_calls(&self) -> usize {
        self.saves.load(Ordering::SeqCst)
    }

    pub fn delete_calls(&self) -> usize {
        self.deletes.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl AccidentRepository for InMemoryAccidentRepository {
    async fn find_all(&self) -> Result<Vec<Accident>> {
        Ok(self.accidents.lock().unwrap().clone())
    }

    async fn find_by_id(&self, id: i32) -> Result<Option<Accident>> {
        Ok(self.get(id))
    }

    async fn find_accident_by_id(&self, id: i32) -> Result<Option<Accident>> {
        Ok(self.get(id))
    }

    async fn save(&self, mut accident: Accident) -> Result<Accident> {
        self.saves.fetch_add(1, Ordering::SeqCst);
        let mut accidents = self.accidents.lock().unwrap();

        if accident.is_new() {
            accident.id = self.next_id.fetch_add(1, Ordering::SeqCst) + 1;
            accident.created_at = Utc::now();
            accidents.push(accident.clone());
            return Ok(accident);
        }

        let slot = accidents
            .iter_mut()
            .find(|a| a.id == accident.id)
            .ok_or_else(|| {
                AppError::NotFound(format!("Accident with id = {} not found", accident.id))
            })?;
        *slot = accident.clone();
        Ok(accident)
    }

    async fn delete_by_id(&self, id: i32) -> Result<()> {
        self.deletes.fetch_add(1, Ordering::SeqCst);
        self.accidents.lock().unwrap().retain(|a| a.id != id);
        Ok(())
    }
}

// -----------------------------------------------------------------------------
// Files
// -----------------------------------------------------------------------------

#[derive(Default)]
pub struct InMemoryFileStore {
    files: Mutex<BTreeMap<i32, File>>,
    next_id: AtomicI32,
    fail_deletes: AtomicBool,
    saves: AtomicUsize,
    deletes: AtomicUsize,
}

impl InMemoryFileStore {
    fn store(&self, upload: &FileUpload) -> File {
        let id = self.next_id.fetch_add(1, Ordering::SeqCst) + 1;
        let file = File {
            id,
            file_key: format!("accidents/test-{}.png", id),
            original_filename: upload.original_filename.clone(),
            content_type: upload.content_type.clone(),
            file_size: upload.data.len() as i64,
            created_at: Utc::now(),
        };
        self.files.lock().unwrap().insert(id, file.clone());
        file
    }

    /// Store a file out of band, as if left by an earlier upload
    pub fn preload(&self) -> i32 {
        self.store(&png_upload()).id
    }

    /// Every later delete fails with a storage error
    pub fn fail_deletes(&self) {
        self.fail_deletes.store(true, Ordering::SeqCst);
    }

    pub fn contains(&self, id: i32) -> bool {
        self.files.lock().unwrap().contains_key(&id)
    }

    pub fn save_calls(&self) -> usize {
        self.saves.load(Ordering::SeqCst)
    }

    pub fn delete_calls(&self) -> usize {
        self.deletes.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl FileStore for InMemoryFileStore {
    async fn save(&self, upload: FileUpload) -> Result<File> {
        self.saves.fetch_add(1, Ordering::SeqCst);
        Ok(self.store(&upload))
    }

    async fn delete_by_id(&self, id: i32) -> Result<()> {
        self.deletes.fetch_add(1, Ordering::SeqCst);
        if self.fail_deletes.load(Ordering::SeqCst) {
            return Err(AppError::Storage("object store unavailable".to_string()));
        }
        self.files
            .lock()
            .unwrap()
            .remove(&id)
            .map(|_| ())
            .ok_or_else(|| AppError::NotFound(format!("File with id = {} not found", id)))
    }
}

// -----------------------------------------------------------------------------
// Wiring
// -----------------------------------------------------------------------------

/// All ports of `AccidentService`, kept so tests can inspect them afterwards
pub struct TestStores {
    pub accidents: Arc<InMemoryAccidentRepository>,
    pub accident_types: Arc<InMemoryAccidentTypeRepository>,
    pub rules: Arc<InMemoryRuleRepository>,
    pub users: Arc<InMemoryUserRepository>,
    pub files: Arc<InMemoryFileStore>,
}

impl TestStores {
    /// Types 1, 2, 5; rules 7, 9, 11; users alice, ivan, root; no accidents
    pub fn seeded() -> Self {
        Self {
            accidents: Arc::new(InMemoryAccidentRepository::default()),
            accident_types: Arc::new(InMemoryAccidentTypeRepository::new(&[
                (1, "Vehicle collision"),
                (2, "Pedestrian hit"),
                (5, "Vehicle and cyclist"),
            ])),
            rules: Arc::new(InMemoryRuleRepository::new(&[
                (7, "Article 7.1"),
                (9, "Article 12.9"),
                (11, "Article 13.1"),
            ])),
            users: Arc::new(InMemoryUserRepository::with_users(&["alice", "ivan", "root"])),
            files: Arc::new(InMemoryFileStore::default()),
        }
    }

    pub fn service(&self) -> AccidentService {
        AccidentService::new(
            self.accidents.clone(),
            self.accident_types.clone(),
            self.rules.clone(),
            self.users.clone(),
            self.files.clone(),
        )
    }

    /// Accident of type 5 reported by alice, as the repository would return it
    pub fn persisted_accident(&self, id: i32, file_id: Option<i32>) -> Accident {
        let mut accident = Accident::draft(
            format!("Accident {}", id),
            "Rear-end collision at the crossing",
            "Main St 1",
            5,
        );
        accident.id = id;
        accident.accident_type = AccidentType::new(5, "Vehicle and cyclist");
        accident.user = Some(User {
            id: 1,
            username: "alice".to_string(),
            enabled: true,
        });
        accident.file_id = file_id;
        accident
    }
}
