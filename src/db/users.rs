use super::Database;
use crate::auth::models::{NewUser, User, UserRole, UserUpdate};
use crate::auth::password::PasswordHasher;
use crate::auth::user_store::{DuplicateKey, UserStore};
use anyhow::{Context, Result};
use chrono::Utc;
use rusqlite::{params, ErrorCode, OptionalExtension, Row};
use tracing::{info, warn};

const USER_COLUMNS: &str = "id, username, email, password, role, first_name, last_name, phone,
     is_active, created_at, last_login";

const DEFAULT_ADMIN_USERNAME: &str = "admin";
const DEFAULT_ADMIN_PASSWORD: &str = "admin123";

fn user_from_row(row: &Row<'_>) -> rusqlite::Result<User> {
    let role: String = row.get(4)?;
    Ok(User {
        id: row.get(0)?,
        username: row.get(1)?,
        email: row.get(2)?,
        password: row.get(3)?,
        role: UserRole::parse(&role).unwrap_or(UserRole::Customer),
        first_name: row.get(5)?,
        last_name: row.get(6)?,
        phone: row.get(7)?,
        is_active: row.get(8)?,
        created_at: row.get(9)?,
        last_login: row.get(10)?,
    })
}

impl Database {
    fn find_user(&self, column: &str, value: &str) -> Result<Option<User>> {
        let conn = self.conn();
        conn.query_row(
            &format!("SELECT {USER_COLUMNS} FROM users WHERE {column} = ?1"),
            params![value],
            user_from_row,
        )
        .optional()
        .with_context(|| format!("Failed to look up user by {}", column))
    }

    /// Includes deactivated accounts
    pub fn find_user_by_username(&self, username: &str) -> Result<Option<User>> {
        self.find_user("username", username)
    }

    /// Includes deactivated accounts
    pub fn find_user_by_email(&self, email: &str) -> Result<Option<User>> {
        self.find_user("email", email)
    }

    pub fn get_user(&self, id: i64) -> Result<Option<User>> {
        let conn = self.conn();
        conn.query_row(
            &format!("SELECT {USER_COLUMNS} FROM users WHERE id = ?1 AND is_active = 1"),
            params![id],
            user_from_row,
        )
        .optional()
        .context("Failed to load user")
    }

    pub fn list_active_users(&self) -> Result<Vec<User>> {
        let conn = self.conn();
        let mut stmt = conn.prepare(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE is_active = 1 ORDER BY id"
        ))?;

        let users = stmt
            .query_map([], user_from_row)?
            .collect::<rusqlite::Result<Vec<_>>>()
            .context("Failed to list users")?;

        Ok(users)
    }

    pub fn insert_user(&self, user: &NewUser) -> Result<User> {
        let created_at = Utc::now();
        let conn = self.conn();
        conn.execute(
            "INSERT INTO users (username, email, password, role, first_name, last_name, phone,
                                is_active, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, 1, ?8)",
            params![
                user.username,
                user.email,
                user.password_hash,
                user.role.as_str(),
                user.first_name,
                user.last_name,
                user.phone,
                created_at,
            ],
        )
        .map_err(|e| match e.sqlite_error_code() {
            Some(ErrorCode::ConstraintViolation) => anyhow::Error::new(DuplicateKey),
            _ => anyhow::Error::new(e).context("Failed to insert user"),
        })?;

        Ok(User {
            id: conn.last_insert_rowid(),
            username: user.username.clone(),
            email: user.email.clone(),
            password: user.password_hash.clone(),
            role: user.role,
            first_name: user.first_name.clone(),
            last_name: user.last_name.clone(),
            phone: user.phone.clone(),
            is_active: true,
            created_at,
            last_login: None,
        })
    }

    pub fn update_user_profile(&self, id: i64, update: &UserUpdate) -> Result<bool> {
        let conn = self.conn();
        let changed = conn
            .execute(
                "UPDATE users SET email = COALESCE(?1, email),
                                  first_name = COALESCE(?2, first_name),
                                  last_name = COALESCE(?3, last_name),
                                  phone = COALESCE(?4, phone),
                                  role = COALESCE(?5, role)
                 WHERE id = ?6 AND is_active = 1",
                params![
                    update.email.as_deref().map(str::trim),
                    update.first_name,
                    update.last_name,
                    update.phone,
                    update.role.map(|r| r.as_str()),
                    id,
                ],
            )
            .context("Failed to update user")?;
        Ok(changed > 0)
    }

    pub fn touch_last_login(&self, id: i64) -> Result<()> {
        let conn = self.conn();
        conn.execute(
            "UPDATE users SET last_login = ?1 WHERE id = ?2",
            params![Utc::now(), id],
        )
        .context("Failed to record last login")?;
        Ok(())
    }

    /// Soft delete
    pub fn deactivate_user(&self, id: i64) -> Result<bool> {
        let conn = self.conn();
        let changed = conn
            .execute(
                "UPDATE users SET is_active = 0 WHERE id = ?1 AND is_active = 1",
                params![id],
            )
            .context("Failed to deactivate user")?;
        Ok(changed > 0)
    }

    pub fn count_active_users(&self) -> Result<i64> {
        let conn = self.conn();
        conn.query_row("SELECT COUNT(*) FROM users WHERE is_active = 1", [], |row| {
            row.get(0)
        })
        .context("Failed to count users")
    }

    /// Create the `admin` account when no ADMIN user exists. Returns true when one was created.
    pub fn seed_default_admin(&self, hasher: &dyn PasswordHasher) -> Result<bool> {
        let admins: i64 = self
            .conn()
            .query_row(
                "SELECT COUNT(*) FROM users WHERE role = 'ADMIN'",
                [],
                |row| row.get(0),
            )
            .context("Failed to check for admin users")?;

        if admins > 0 || self.find_user_by_username(DEFAULT_ADMIN_USERNAME)?.is_some() {
            return Ok(false);
        }

        let admin = NewUser {
            username: DEFAULT_ADMIN_USERNAME.to_string(),
            email: "admin@hotel.local".to_string(),
            password_hash: hasher.hash(DEFAULT_ADMIN_PASSWORD)?,
            role: UserRole::Admin,
            first_name: Some("System".to_string()),
            last_name: Some("Administrator".to_string()),
            phone: None,
        };
        self.insert_user(&admin)?;

        info!("🔐 Default admin user created (username: admin, password: admin123)");
        warn!("⚠️  CHANGE DEFAULT PASSWORD IN PRODUCTION!");
        Ok(true)
    }
}

impl UserStore for Database {
    fn find_by_username(&self, username: &str) -> Result<Option<User>> {
        self.find_user_by_username(username)
    }

    fn find_by_email(&self, email: &str) -> Result<Option<User>> {
        self.find_user_by_email(email)
    }

    fn insert(&self, user: NewUser) -> Result<User> {
        self.insert_user(&user)
    }

    fn update_last_login(&self, user_id: i64) -> Result<()> {
        self.touch_last_login(user_id)
    }
}
