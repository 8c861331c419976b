//! User CRUD operations.

use chrono::Utc;
use rusqlite::Connection;
use vl_core::{Error, Result, User, UserId};

use crate::models::{FromRow, USER_COLS};

/// Create a new user and return it.
pub fn create_user(conn: &Connection, name: &str, email: &str) -> Result<User> {
    let user = User {
        id: UserId::new(),
        name: name.to_string(),
        email: email.to_string(),
        created_at: Utc::now(),
    };

    conn.execute(
        "INSERT INTO users (id, name, email, created_at) VALUES (?1, ?2, ?3, ?4)",
        rusqlite::params![
            user.id.to_string(),
            name,
            email,
            user.created_at.to_rfc3339()
        ],
    )
    .map_err(|e| {
        if e.to_string().contains("UNIQUE constraint failed") {
            Error::Conflict(format!("Email '{email}' already registered"))
        } else {
            Error::database(e.to_string())
        }
    })?;

    Ok(user)
}

/// Get a user by primary key.
pub fn get_user_by_id(conn: &Connection, id: UserId) -> Result<Option<User>> {
    let q = format!("SELECT {USER_COLS} FROM users WHERE id = ?1");
    let result = conn.query_row(&q, [id.to_string()], User::from_row);
    match result {
        Ok(u) => Ok(Some(u)),
        Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
        Err(e) => Err(Error::database(e.to_string())),
    }
}

/// Get a user by email address.
pub fn get_user_by_email(conn: &Connection, email: &str) -> Result<Option<User>> {
    let q = format!("SELECT {USER_COLS} FROM users WHERE email = ?1");
    let result = conn.query_row(&q, [email], User::from_row);
    match result {
        Ok(u) => Ok(Some(u)),
        Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
        Err(e) => Err(Error::database(e.to_string())),
    }
}

/// List all users ordered by name.
pub fn list_users(conn: &Connection) -> Result<Vec<User>> {
    let q = format!("SELECT {USER_COLS} FROM users ORDER BY name ASC");
    let mut stmt = conn.prepare(&q).map_err(|e| Error::database(e.to_string()))?;
    let rows = stmt
        .query_map([], User::from_row)
        .map_err(|e| Error::database(e.to_string()))?
        .collect::<std::result::Result<Vec<_>, _>>()
        .map_err(|e| Error::database(e.to_string()))?;
    Ok(rows)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pool::init_memory_pool;

    #[test]
    fn create_and_get() {
        let pool = init_memory_pool().unwrap();
        let conn = pool.get().unwrap();

        let user = create_user(&conn, "Ada", "ada@example.com").unwrap();
        let by_id = get_user_by_id(&conn, user.id).unwrap().unwrap();
        assert_eq!(by_id.name, "Ada");
        assert_eq!(by_id.email, "ada@example.com");

        let by_email = get_user_by_email(&conn, "ada@example.com").unwrap().unwrap();
        assert_eq!(by_email.id, user.id);
    }

    #[test]
    fn duplicate_email_conflicts() {
        let pool = init_memory_pool().unwrap();
        let conn = pool.get().unwrap();

        create_user(&conn, "Ada", "ada@example.com").unwrap();
        let err = create_user(&conn, "Other", "ada@example.com").unwrap_err();
        assert!(matches!(err, Error::Conflict(_)));
    }

    #[test]
    fn missing_user_is_none() {
        let pool = init_memory_pool().unwrap();
        let conn = pool.get().unwrap();
        assert!(get_user_by_id(&conn, UserId::new()).unwrap().is_none());
    }

    #[test]
    fn list_sorted_by_name() {
        let pool = init_memory_pool().unwrap();
        let conn = pool.get().unwrap();

        create_user(&conn, "Zed", "z@example.com").unwrap();
        create_user(&conn, "Amy", "a@example.com").unwrap();
        let names: Vec<String> = list_users(&conn).unwrap().into_iter().map(|u| u.name).collect();
        assert_eq!(names, vec!["Amy", "Zed"]);
    }
}
