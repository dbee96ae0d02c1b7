//! In-memory port implementations shared by the use case tests.

use std::collections::{BTreeSet, HashMap, VecDeque};
use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::application::ports::lifecycle_alerts::{LifecycleAlert, LifecycleAlerts};
use crate::application::ports::role_repository::RoleRepository;
use crate::application::ports::score_gateway::{ScoreGateway, ScoreGatewayError};
use crate::application::ports::score_sync_queue::{PendingScoreSync, ScoreOp, ScoreSyncQueue};
use crate::application::ports::title_repository::TitleRepository;
use crate::application::ports::user_repository::{
    ProfileChanges, UserCredential, UserRepository, UserStoreError,
};
use crate::application::services::credentials;
use crate::application::services::score_sync::{ScoreRetryPolicy, ScoreSync};
use crate::domain::users::user::{NewUser, Page, Role, Title, User};

pub fn user_role() -> Role {
    Role {
        id: 1,
        name: "USER".into(),
    }
}

pub fn admin_role() -> Role {
    Role {
        id: 2,
        name: "ADMIN".into(),
    }
}

pub fn unavailable() -> ScoreGatewayError {
    ScoreGatewayError::Unavailable(anyhow::anyhow!("connection refused"))
}

#[derive(Debug, Clone)]
struct StoredUser {
    user: User,
    password_hash: String,
}

pub struct InMemoryUsers {
    rows: Mutex<HashMap<Uuid, StoredUser>>,
    catalog: Vec<Role>,
    fail_create: AtomicBool,
    fail_delete: AtomicBool,
    lose_email_race: AtomicBool,
}

impl InMemoryUsers {
    pub fn new(catalog: Vec<Role>) -> Self {
        Self {
            rows: Mutex::new(HashMap::new()),
            catalog,
            fail_create: AtomicBool::new(false),
            fail_delete: AtomicBool::new(false),
            lose_email_race: AtomicBool::new(false),
        }
    }

    pub fn fail_create(&self) {
        self.fail_create.store(true, Ordering::SeqCst);
    }

    pub fn fail_delete(&self) {
        self.fail_delete.store(true, Ordering::SeqCst);
    }

    /// Makes the next insert hit the unique index even though the
    /// existence pre-check passed.
    pub fn lose_email_race(&self) {
        self.lose_email_race.store(true, Ordering::SeqCst);
    }

    pub fn get(&self, id: Uuid) -> Option<User> {
        self.rows.lock().unwrap().get(&id).map(|s| s.user.clone())
    }

    pub fn password_hash(&self, id: Uuid) -> Option<String> {
        self.rows
            .lock()
            .unwrap()
            .get(&id)
            .map(|s| s.password_hash.clone())
    }

    pub fn len(&self) -> usize {
        self.rows.lock().unwrap().len()
    }

    fn roles_for(&self, ids: &[i64]) -> BTreeSet<Role> {
        self.catalog
            .iter()
            .filter(|r| ids.contains(&r.id))
            .cloned()
            .collect()
    }

    fn update<F: FnOnce(&mut User)>(&self, id: Uuid, f: F) -> bool {
        let mut rows = self.rows.lock().unwrap();
        match rows.get_mut(&id) {
            Some(stored) => {
                f(&mut stored.user);
                true
            }
            None => false,
        }
    }
}

#[async_trait]
impl UserRepository for InMemoryUsers {
    async fn create_user(&self, new: &NewUser) -> Result<User, UserStoreError> {
        if self.lose_email_race.swap(false, Ordering::SeqCst) {
            return Err(UserStoreError::EmailTaken(new.email.clone()));
        }
        if self.fail_create.load(Ordering::SeqCst) {
            return Err(UserStoreError::Backend(anyhow::anyhow!("disk full")));
        }
        let mut rows = self.rows.lock().unwrap();
        if rows.values().any(|s| s.user.email == new.email) {
            return Err(UserStoreError::EmailTaken(new.email.clone()));
        }
        let user = User {
            id: Uuid::new_v4(),
            email: new.email.clone(),
            first_name: new.first_name.clone(),
            last_name: new.last_name.clone(),
            phone: new.phone.clone(),
            frozen: false,
            manager_id: new.manager_id,
            title_id: new.title_id,
            roles: self.roles_for(&new.role_ids),
        };
        rows.insert(
            user.id,
            StoredUser {
                user: user.clone(),
                password_hash: new.password_hash.clone(),
            },
        );
        Ok(user)
    }

    async fn find_by_id(&self, id: Uuid) -> anyhow::Result<Option<User>> {
        Ok(self.get(id))
    }

    async fn find_by_email(&self, email: &str) -> anyhow::Result<Option<User>> {
        Ok(self
            .rows
            .lock()
            .unwrap()
            .values()
            .find(|s| s.user.email == email)
            .map(|s| s.user.clone()))
    }

    async fn find_credential_by_email(
        &self,
        email: &str,
    ) -> anyhow::Result<Option<UserCredential>> {
        Ok(self
            .rows
            .lock()
            .unwrap()
            .values()
            .find(|s| s.user.email == email)
            .map(|s| UserCredential {
                user: s.user.clone(),
                password_hash: s.password_hash.clone(),
            }))
    }

    async fn exists_by_email(&self, email: &str) -> anyhow::Result<bool> {
        Ok(self.find_by_email(email).await?.is_some())
    }

    async fn list_page(&self, page: u32, size: u32) -> anyhow::Result<Page<User>> {
        let mut all: Vec<User> = self
            .rows
            .lock()
            .unwrap()
            .values()
            .map(|s| s.user.clone())
            .collect();
        all.sort_by(|a, b| {
            (&a.last_name, &a.first_name, a.id).cmp(&(&b.last_name, &b.first_name, b.id))
        });
        let total = all.len() as i64;
        let items = all
            .into_iter()
            .skip(page as usize * size as usize)
            .take(size as usize)
            .collect();
        Ok(Page {
            items,
            page,
            size,
            total,
        })
    }

    async fn list_managed_by(&self, manager_id: Uuid) -> anyhow::Result<Vec<User>> {
        Ok(self
            .rows
            .lock()
            .unwrap()
            .values()
            .filter(|s| s.user.manager_id == Some(manager_id))
            .map(|s| s.user.clone())
            .collect())
    }

    async fn save_profile(
        &self,
        id: Uuid,
        changes: &ProfileChanges,
    ) -> Result<User, UserStoreError> {
        let mut rows = self.rows.lock().unwrap();
        if rows
            .values()
            .any(|s| s.user.id != id && s.user.email == changes.email)
        {
            return Err(UserStoreError::EmailTaken(changes.email.clone()));
        }
        let stored = rows
            .get_mut(&id)
            .ok_or_else(|| UserStoreError::Backend(anyhow::anyhow!("no row for {id}")))?;
        stored.user.email = changes.email.clone();
        stored.user.first_name = changes.first_name.clone();
        stored.user.last_name = changes.last_name.clone();
        stored.user.phone = changes.phone.clone();
        stored.user.manager_id = changes.manager_id;
        stored.user.title_id = changes.title_id;
        Ok(stored.user.clone())
    }

    async fn set_frozen(&self, id: Uuid, frozen: bool) -> anyhow::Result<bool> {
        Ok(self.update(id, |u| u.frozen = frozen))
    }

    async fn set_password_hash(&self, id: Uuid, password_hash: &str) -> anyhow::Result<bool> {
        let mut rows = self.rows.lock().unwrap();
        Ok(match rows.get_mut(&id) {
            Some(stored) => {
                stored.password_hash = password_hash.to_string();
                true
            }
            None => false,
        })
    }

    async fn set_manager(&self, id: Uuid, manager_id: Uuid) -> anyhow::Result<bool> {
        Ok(self.update(id, |u| u.manager_id = Some(manager_id)))
    }

    async fn set_title(&self, id: Uuid, title_id: Uuid) -> anyhow::Result<bool> {
        Ok(self.update(id, |u| u.title_id = Some(title_id)))
    }

    async fn add_role(&self, id: Uuid, role_id: i64) -> anyhow::Result<()> {
        let roles = self.roles_for(&[role_id]);
        self.update(id, |u| u.roles.extend(roles));
        Ok(())
    }

    async fn delete_user(&self, id: Uuid) -> anyhow::Result<bool> {
        if self.fail_delete.load(Ordering::SeqCst) {
            anyhow::bail!("connection reset while deleting");
        }
        Ok(self.rows.lock().unwrap().remove(&id).is_some())
    }
}

pub struct InMemoryRoles {
    roles: Vec<Role>,
}

impl InMemoryRoles {
    pub fn new(roles: Vec<Role>) -> Self {
        Self { roles }
    }
}

#[async_trait]
impl RoleRepository for InMemoryRoles {
    async fn find_by_name(&self, name: &str) -> anyhow::Result<Option<Role>> {
        Ok(self.roles.iter().find(|r| r.name == name).cloned())
    }

    async fn find_by_id(&self, id: i64) -> anyhow::Result<Option<Role>> {
        Ok(self.roles.iter().find(|r| r.id == id).cloned())
    }
}

#[derive(Default)]
pub struct InMemoryTitles {
    titles: Mutex<Vec<Title>>,
}

impl InMemoryTitles {
    pub fn add(&self, name: &str) -> Title {
        let title = Title {
            id: Uuid::new_v4(),
            name: name.into(),
        };
        self.titles.lock().unwrap().push(title.clone());
        title
    }
}

#[async_trait]
impl TitleRepository for InMemoryTitles {
    async fn find_by_id(&self, id: Uuid) -> anyhow::Result<Option<Title>> {
        Ok(self
            .titles
            .lock()
            .unwrap()
            .iter()
            .find(|t| t.id == id)
            .cloned())
    }
}

/// Gateway that records every call and fails according to queued errors.
#[derive(Default)]
pub struct ScriptedGateway {
    calls: Mutex<Vec<(ScoreOp, Uuid)>>,
    init_failures: Mutex<VecDeque<ScoreGatewayError>>,
    remove_failures: Mutex<VecDeque<ScoreGatewayError>>,
}

impl ScriptedGateway {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn fail_initialize_with(&self, err: ScoreGatewayError) {
        self.init_failures.lock().unwrap().push_back(err);
    }

    pub fn fail_remove_with(&self, err: ScoreGatewayError) {
        self.remove_failures.lock().unwrap().push_back(err);
    }

    pub fn calls(&self) -> Vec<(ScoreOp, Uuid)> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl ScoreGateway for ScriptedGateway {
    async fn initialize_score(&self, user_id: Uuid) -> Result<(), ScoreGatewayError> {
        self.calls
            .lock()
            .unwrap()
            .push((ScoreOp::Initialize, user_id));
        match self.init_failures.lock().unwrap().pop_front() {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }

    async fn remove_score(&self, user_id: Uuid) -> Result<(), ScoreGatewayError> {
        self.calls.lock().unwrap().push((ScoreOp::Remove, user_id));
        match self.remove_failures.lock().unwrap().pop_front() {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }
}

#[derive(Debug, Clone)]
pub struct DeadLetter {
    pub item: PendingScoreSync,
    pub error: String,
}

#[derive(Default)]
pub struct RecordingQueue {
    items: Mutex<Vec<(PendingScoreSync, DateTime<Utc>)>>,
    dead: Mutex<Vec<DeadLetter>>,
    fail_enqueue: AtomicBool,
}

impl RecordingQueue {
    pub fn fail_enqueue(&self) {
        self.fail_enqueue.store(true, Ordering::SeqCst);
    }

    pub fn items(&self) -> Vec<PendingScoreSync> {
        self.items
            .lock()
            .unwrap()
            .iter()
            .map(|(item, _)| item.clone())
            .collect()
    }

    pub fn due_at(&self, id: Uuid) -> Option<DateTime<Utc>> {
        self.items
            .lock()
            .unwrap()
            .iter()
            .find(|(item, _)| item.id == id)
            .map(|(_, due)| *due)
    }

    pub fn make_all_due(&self) {
        let now = Utc::now();
        for (_, due) in self.items.lock().unwrap().iter_mut() {
            *due = now;
        }
    }

    pub fn dead_letters(&self) -> Vec<DeadLetter> {
        self.dead.lock().unwrap().clone()
    }
}

#[async_trait]
impl ScoreSyncQueue for RecordingQueue {
    async fn enqueue(
        &self,
        user_id: Uuid,
        op: ScoreOp,
        error: &str,
        next_attempt_at: DateTime<Utc>,
    ) -> anyhow::Result<()> {
        if self.fail_enqueue.load(Ordering::SeqCst) {
            anyhow::bail!("queue table unavailable");
        }
        let item = PendingScoreSync {
            id: Uuid::new_v4(),
            user_id,
            op,
            attempts: 1,
            last_error: Some(error.to_string()),
        };
        self.items.lock().unwrap().push((item, next_attempt_at));
        Ok(())
    }

    async fn claim_due(
        &self,
        limit: i64,
        lease_until: DateTime<Utc>,
    ) -> anyhow::Result<Vec<PendingScoreSync>> {
        let now = Utc::now();
        let mut claimed = Vec::new();
        for (item, due) in self.items.lock().unwrap().iter_mut() {
            if claimed.len() as i64 >= limit {
                break;
            }
            if *due <= now {
                *due = lease_until;
                claimed.push(item.clone());
            }
        }
        Ok(claimed)
    }

    async fn complete(&self, id: Uuid) -> anyhow::Result<()> {
        self.items.lock().unwrap().retain(|(item, _)| item.id != id);
        Ok(())
    }

    async fn reschedule(
        &self,
        id: Uuid,
        attempts: u32,
        next_attempt_at: DateTime<Utc>,
        error: &str,
    ) -> anyhow::Result<()> {
        for (item, due) in self.items.lock().unwrap().iter_mut() {
            if item.id == id {
                item.attempts = attempts;
                item.last_error = Some(error.to_string());
                *due = next_attempt_at;
            }
        }
        Ok(())
    }

    async fn dead_letter(&self, id: Uuid, attempts: u32, error: &str) -> anyhow::Result<()> {
        let mut items = self.items.lock().unwrap();
        if let Some(pos) = items.iter().position(|(item, _)| item.id == id) {
            let (mut item, _) = items.remove(pos);
            item.attempts = attempts;
            self.dead.lock().unwrap().push(DeadLetter {
                item,
                error: error.to_string(),
            });
        }
        Ok(())
    }

    async fn discard_for_user(&self, user_id: Uuid, op: ScoreOp) -> anyhow::Result<u64> {
        let mut items = self.items.lock().unwrap();
        let before = items.len();
        items.retain(|(item, _)| !(item.user_id == user_id && item.op == op));
        Ok((before - items.len()) as u64)
    }
}

#[derive(Default)]
pub struct RecordingAlerts {
    raised: Mutex<Vec<LifecycleAlert>>,
}

impl RecordingAlerts {
    pub fn raised(&self) -> Vec<LifecycleAlert> {
        self.raised.lock().unwrap().clone()
    }
}

#[async_trait]
impl LifecycleAlerts for RecordingAlerts {
    async fn raise(&self, alert: &LifecycleAlert) -> anyhow::Result<()> {
        self.raised.lock().unwrap().push(alert.clone());
        Ok(())
    }
}

/// All ports wired together, with `USER` and `ADMIN` roles available.
pub struct Fixture {
    pub users: InMemoryUsers,
    pub roles: InMemoryRoles,
    pub titles: InMemoryTitles,
    pub gateway: ScriptedGateway,
    pub queue: RecordingQueue,
    pub alerts: RecordingAlerts,
    pub retry: ScoreRetryPolicy,
}

impl Fixture {
    pub fn new() -> Self {
        let catalog = vec![user_role(), admin_role()];
        Self {
            users: InMemoryUsers::new(catalog.clone()),
            roles: InMemoryRoles::new(catalog),
            titles: InMemoryTitles::default(),
            gateway: ScriptedGateway::new(),
            queue: RecordingQueue::default(),
            alerts: RecordingAlerts::default(),
            retry: ScoreRetryPolicy::default(),
        }
    }

    pub fn score_sync(&self) -> ScoreSync<'_> {
        ScoreSync {
            gateway: &self.gateway,
            queue: &self.queue,
            alerts: &self.alerts,
            retry: &self.retry,
        }
    }

    /// Inserts a user directly, bypassing the lifecycle coordinator.
    pub async fn seed_user(&self, email: &str, first: &str, last: &str) -> User {
        let new = NewUser {
            email: email.into(),
            first_name: first.into(),
            last_name: last.into(),
            password_hash: credentials::hash_password("password").unwrap(),
            phone: None,
            manager_id: None,
            title_id: None,
            role_ids: vec![user_role().id],
        };
        self.users.create_user(&new).await.unwrap()
    }
}
