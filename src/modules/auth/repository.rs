use bookshop_authz::Role;
use sqlx::SqliteConnection;

use super::models::UserRecord;

pub struct NewUser<'a> {
    pub email: &'a str,
    pub password_hash: &'a str,
    pub first_name: &'a str,
    pub last_name: &'a str,
    pub shipping_address: Option<&'a str>,
}

pub async fn find_by_email(
    conn: &mut SqliteConnection,
    email: &str,
) -> Result<Option<UserRecord>, sqlx::Error> {
    sqlx::query_as(
        "SELECT id, email, password_hash, first_name, last_name, shipping_address
         FROM users WHERE email = ?1",
    )
    .bind(email)
    .fetch_optional(conn)
    .await
}

pub async fn insert(conn: &mut SqliteConnection, user: &NewUser<'_>) -> Result<i64, sqlx::Error> {
    let (id,): (i64,) = sqlx::query_as(
        "INSERT INTO users (email, password_hash, first_name, last_name, shipping_address)
         VALUES (?1, ?2, ?3, ?4, ?5)
         RETURNING id",
    )
    .bind(user.email)
    .bind(user.password_hash)
    .bind(user.first_name)
    .bind(user.last_name)
    .bind(user.shipping_address)
    .fetch_one(conn)
    .await?;
    Ok(id)
}

pub async fn add_role(
    conn: &mut SqliteConnection,
    user_id: i64,
    role: Role,
) -> Result<(), sqlx::Error> {
    sqlx::query("INSERT OR IGNORE INTO user_roles (user_id, role) VALUES (?1, ?2)")
        .bind(user_id)
        .bind(role.as_str())
        .execute(conn)
        .await?;
    Ok(())
}

/// Roles of a user; unknown role names in storage are skipped.
pub async fn roles_of(conn: &mut SqliteConnection, user_id: i64) -> Result<Vec<Role>, sqlx::Error> {
    let rows: Vec<(String,)> =
        sqlx::query_as("SELECT role FROM user_roles WHERE user_id = ?1 ORDER BY role DESC")
            .bind(user_id)
            .fetch_all(conn)
            .await?;

    Ok(rows
        .into_iter()
        .filter_map(|(name,)| Role::parse(&name))
        .collect())
}
