use serde::Serialize;
use sqlx::{FromRow, SqlitePool};
use time::OffsetDateTime;
use uuid::Uuid;

/// User record. The password hash never serializes.
#[derive(Debug, Clone, Serialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    #[serde(skip_serializing)]
    pub password_hash: String,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

pub async fn create(
    db: &SqlitePool,
    name: &str,
    email: &str,
    password_hash: &str,
) -> sqlx::Result<User> {
    let user = User {
        id: Uuid::new_v4(),
        name: name.to_string(),
        email: email.to_string(),
        password_hash: password_hash.to_string(),
        created_at: OffsetDateTime::now_utc(),
    };

    sqlx::query(
        r#"
        INSERT INTO users (id, name, email, password_hash, created_at)
        VALUES (?, ?, ?, ?, ?)
        "#,
    )
    .bind(user.id)
    .bind(&user.name)
    .bind(&user.email)
    .bind(&user.password_hash)
    .bind(user.created_at)
    .execute(db)
    .await?;

    Ok(user)
}

pub async fn find_by_email(db: &SqlitePool, email: &str) -> sqlx::Result<Option<User>> {
    sqlx::query_as::<_, User>(
        r#"
        SELECT id, name, email, password_hash, created_at
        FROM users
        WHERE email = ?
        "#,
    )
    .bind(email)
    .fetch_optional(db)
    .await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ApiError;
    use sqlx::sqlite::SqlitePoolOptions;

    async fn test_db() -> SqlitePool {
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect("sqlite::memory:")
            .await
            .expect("open in-memory database");
        sqlx::migrate!("./migrations")
            .run(&pool)
            .await
            .expect("run migrations");
        pool
    }

    #[tokio::test]
    async fn create_and_find_by_email() {
        let db = test_db().await;

        let created = create(&db, "John Doe", "john.doe@example.com", "phc-hash")
            .await
            .expect("create user");

        let found = find_by_email(&db, "john.doe@example.com")
            .await
            .expect("query")
            .expect("user exists");
        assert_eq!(found.id, created.id);
        assert_eq!(found.name, "John Doe");
        assert_eq!(found.password_hash, "phc-hash");
    }

    #[tokio::test]
    async fn find_by_email_returns_none_for_unknown_email() {
        let db = test_db().await;
        let found = find_by_email(&db, "nobody@example.com").await.expect("query");
        assert!(found.is_none());
    }

    #[tokio::test]
    async fn duplicate_email_is_a_conflict_and_keeps_the_first_user() {
        let db = test_db().await;

        let first = create(&db, "John Doe", "john.doe@example.com", "hash-one")
            .await
            .expect("first create");

        let err = create(&db, "Jane Doe", "john.doe@example.com", "hash-two")
            .await
            .expect_err("second create must fail");
        assert!(matches!(ApiError::from(err), ApiError::Conflict(_)));

        let found = find_by_email(&db, "john.doe@example.com")
            .await
            .expect("query")
            .expect("first user still there");
        assert_eq!(found.id, first.id);
        assert_eq!(found.name, "John Doe");
    }

    #[test]
    fn serialized_user_never_contains_the_hash() {
        let user = User {
            id: Uuid::new_v4(),
            name: "John Doe".into(),
            email: "john.doe@example.com".into(),
            password_hash: "phc-secret".into(),
            created_at: OffsetDateTime::now_utc(),
        };
        let json = serde_json::to_string(&user).expect("serialize");
        assert!(!json.contains("phc-secret"));
        assert!(!json.contains("password"));
        assert!(json.contains("createdAt"));
    }
}
