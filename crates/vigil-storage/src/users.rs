use rusqlite::{Connection, OptionalExtension, Row, params};
use uuid::Uuid;

use vigil_core::enums::Role;
use vigil_core::models::user::User;
use vigil_core::pagination::{Page, PageParams};

use crate::codec;
use crate::error::StorageError;

const COLUMNS: &str = "id, username, email, password_hash, first_name, last_name, role, \
                       is_active, is_verified, created_at, updated_at, last_login";

fn from_row(row: &Row<'_>) -> rusqlite::Result<User> {
    Ok(User {
        id: codec::uuid(row, "id")?,
        username: row.get("username")?,
        email: row.get("email")?,
        password_hash: row.get("password_hash")?,
        first_name: row.get("first_name")?,
        last_name: row.get("last_name")?,
        role: codec::text_enum(row, "role")?,
        is_active: row.get("is_active")?,
        is_verified: row.get("is_verified")?,
        created_at: codec::ts(row, "created_at")?,
        updated_at: codec::ts(row, "updated_at")?,
        last_login: codec::opt_ts(row, "last_login")?,
    })
}

pub fn insert(conn: &Connection, user: &User) -> Result<(), StorageError> {
    conn.execute(
        &format!("INSERT INTO users ({COLUMNS}) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12)"),
        params![
            user.id.to_string(),
            user.username,
            user.email,
            user.password_hash,
            user.first_name,
            user.last_name,
            user.role.as_str(),
            user.is_active,
            user.is_verified,
            codec::ts_to_sql(user.created_at),
            codec::ts_to_sql(user.updated_at),
            codec::opt_ts_to_sql(user.last_login),
        ],
    )?;
    Ok(())
}

pub fn get(conn: &Connection, id: Uuid) -> Result<User, StorageError> {
    conn.query_row(
        &format!("SELECT {COLUMNS} FROM users WHERE id = ?1"),
        params![id.to_string()],
        from_row,
    )
    .optional()?
    .ok_or_else(|| StorageError::not_found("user", id))
}

pub fn get_by_username(conn: &Connection, username: &str) -> Result<Option<User>, StorageError> {
    Ok(conn
        .query_row(
            &format!("SELECT {COLUMNS} FROM users WHERE username = ?1"),
            params![username],
            from_row,
        )
        .optional()?)
}

pub fn count(conn: &Connection) -> Result<u64, StorageError> {
    let n: i64 = conn.query_row("SELECT COUNT(*) FROM users", [], |row| row.get(0))?;
    Ok(n as u64)
}

pub fn list(conn: &Connection, page: &PageParams) -> Result<Page<User>, StorageError> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {COLUMNS} FROM users ORDER BY username LIMIT ?1 OFFSET ?2"
    ))?;
    let users = stmt
        .query_map(params![page.limit(), page.offset()], from_row)?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(Page::new(users, page, count(conn)?))
}

pub fn update_role(
    conn: &Connection,
    id: Uuid,
    role: Role,
    now: jiff::Timestamp,
) -> Result<User, StorageError> {
    let changed = conn.execute(
        "UPDATE users SET role = ?1, updated_at = ?2 WHERE id = ?3",
        params![role.as_str(), codec::ts_to_sql(now), id.to_string()],
    )?;
    if changed == 0 {
        return Err(StorageError::not_found("user", id));
    }
    get(conn, id)
}

pub fn set_active(
    conn: &Connection,
    id: Uuid,
    active: bool,
    now: jiff::Timestamp,
) -> Result<User, StorageError> {
    let changed = conn.execute(
        "UPDATE users SET is_active = ?1, updated_at = ?2 WHERE id = ?3",
        params![active, codec::ts_to_sql(now), id.to_string()],
    )?;
    if changed == 0 {
        return Err(StorageError::not_found("user", id));
    }
    get(conn, id)
}

pub fn touch_last_login(conn: &Connection, id: Uuid, at: jiff::Timestamp) -> Result<(), StorageError> {
    let changed = conn.execute(
        "UPDATE users SET last_login = ?1 WHERE id = ?2",
        params![codec::ts_to_sql(at), id.to_string()],
    )?;
    if changed == 0 {
        return Err(StorageError::not_found("user", id));
    }
    Ok(())
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::db::open_memory_connection;

    pub(crate) fn sample_user(username: &str, role: Role) -> User {
        let now = vigil_core::clock::now();
        User {
            id: Uuid::new_v4(),
            username: username.to_string(),
            email: format!("{username}@example.org"),
            password_hash: "pbkdf2-sha256$1$c2FsdA$aGFzaA".to_string(),
            first_name: None,
            last_name: None,
            role,
            is_active: true,
            is_verified: false,
            created_at: now,
            updated_at: now,
            last_login: None,
        }
    }

    #[test]
    fn insert_and_fetch() {
        let conn = open_memory_connection().unwrap();
        let user = sample_user("rn.jones", Role::Clinician);
        insert(&conn, &user).unwrap();

        assert_eq!(get(&conn, user.id).unwrap(), user);
        assert_eq!(get_by_username(&conn, "rn.jones").unwrap(), Some(user));
        assert_eq!(get_by_username(&conn, "nobody").unwrap(), None);
    }

    #[test]
    fn duplicate_username_is_conflict() {
        let conn = open_memory_connection().unwrap();
        insert(&conn, &sample_user("dup", Role::Viewer)).unwrap();
        let mut again = sample_user("dup", Role::Viewer);
        again.email = "other@example.org".to_string();
        let err = insert(&conn, &again).unwrap_err();
        assert!(matches!(err, StorageError::Conflict(_)), "{err:?}");
    }

    #[test]
    fn role_and_active_updates() {
        let conn = open_memory_connection().unwrap();
        let user = sample_user("promote.me", Role::Viewer);
        insert(&conn, &user).unwrap();

        let now = vigil_core::clock::now();
        let updated = update_role(&conn, user.id, Role::Clinician, now).unwrap();
        assert_eq!(updated.role, Role::Clinician);

        let disabled = set_active(&conn, user.id, false, now).unwrap();
        assert!(!disabled.is_active);

        let missing = set_active(&conn, Uuid::new_v4(), false, now).unwrap_err();
        assert!(matches!(missing, StorageError::NotFound { entity: "user", .. }));
    }

    #[test]
    fn list_is_paged_and_ordered() {
        let conn = open_memory_connection().unwrap();
        for name in ["carol", "alice", "bob"] {
            insert(&conn, &sample_user(name, Role::Viewer)).unwrap();
        }
        let page = list(&conn, &PageParams::new(1, 2)).unwrap();
        assert_eq!(page.total, 3);
        assert_eq!(page.pages, 2);
        let names: Vec<_> = page.items.iter().map(|u| u.username.as_str()).collect();
        assert_eq!(names, ["alice", "bob"]);
    }

    #[test]
    fn last_login_recorded() {
        let conn = open_memory_connection().unwrap();
        let user = sample_user("login", Role::Viewer);
        insert(&conn, &user).unwrap();
        let at = vigil_core::clock::now();
        touch_last_login(&conn, user.id, at).unwrap();
        assert_eq!(get(&conn, user.id).unwrap().last_login, Some(at));
    }
}
