use std::collections::BTreeSet;

use uuid::Uuid;

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Role {
    pub id: i64,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Title {
    pub id: Uuid,
    pub name: String,
}

/// Caller-facing view of a user record. The password hash never leaves
/// the repository layer through this type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct User {
    pub id: Uuid,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub phone: Option<String>,
    pub frozen: bool,
    pub manager_id: Option<Uuid>,
    pub title_id: Option<Uuid>,
    pub roles: BTreeSet<Role>,
}

impl User {
    pub fn has_role(&self, name: &str) -> bool {
        self.roles.iter().any(|r| r.name == name)
    }
}

/// Everything needed to insert a user row. `password_hash` is already a PHC
/// string at this point.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub password_hash: String,
    pub phone: Option<String>,
    pub manager_id: Option<Uuid>,
    pub title_id: Option<Uuid>,
    pub role_ids: Vec<i64>,
}

#[derive(Debug, Clone)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub page: u32,
    pub size: u32,
    pub total: i64,
}

impl<T> Page<T> {
    pub fn total_pages(&self) -> i64 {
        if self.size == 0 {
            return 0;
        }
        let size = i64::from(self.size);
        (self.total + size - 1) / size
    }
}
