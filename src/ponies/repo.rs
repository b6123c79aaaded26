use serde::Serialize;
use sqlx::{FromRow, SqlitePool};
use time::OffsetDateTime;
use uuid::Uuid;

/// Catalog record as stored and as returned in full projections.
#[derive(Debug, Clone, PartialEq, Serialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Pony {
    pub id: Uuid,
    pub name: String,
    pub element: String,
    pub personality: String,
    pub talent: String,
    pub summary: String,
    pub image_url: String,
    pub is_favorite: bool,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

/// Validated fields for a new record; id, favorite flag and timestamp are
/// generated at insert.
#[derive(Debug, Clone)]
pub struct NewPony {
    pub name: String,
    pub element: String,
    pub personality: String,
    pub talent: String,
    pub summary: String,
    pub image_url: String,
}

pub async fn create(db: &SqlitePool, fields: NewPony) -> sqlx::Result<Pony> {
    let pony = Pony {
        id: Uuid::new_v4(),
        name: fields.name,
        element: fields.element,
        personality: fields.personality,
        talent: fields.talent,
        summary: fields.summary,
        image_url: fields.image_url,
        is_favorite: false,
        created_at: OffsetDateTime::now_utc(),
    };

    sqlx::query(
        r#"
        INSERT INTO ponies (id, name, element, personality, talent, summary,
                            image_url, is_favorite, created_at)
        VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(pony.id)
    .bind(&pony.name)
    .bind(&pony.element)
    .bind(&pony.personality)
    .bind(&pony.talent)
    .bind(&pony.summary)
    .bind(&pony.image_url)
    .bind(pony.is_favorite)
    .bind(pony.created_at)
    .execute(db)
    .await?;

    Ok(pony)
}

pub async fn list(db: &SqlitePool) -> sqlx::Result<Vec<Pony>> {
    sqlx::query_as::<_, Pony>(
        r#"
        SELECT id, name, element, personality, talent, summary,
               image_url, is_favorite, created_at
        FROM ponies
        ORDER BY name ASC
        "#,
    )
    .fetch_all(db)
    .await
}

pub async fn find_by_id(db: &SqlitePool, id: Uuid) -> sqlx::Result<Option<Pony>> {
    sqlx::query_as::<_, Pony>(
        r#"
        SELECT id, name, element, personality, talent, summary,
               image_url, is_favorite, created_at
        FROM ponies
        WHERE id = ?
        "#,
    )
    .bind(id)
    .fetch_optional(db)
    .await
}

/// Persist every mutable column of an already-loaded record.
pub async fn save(db: &SqlitePool, pony: &Pony) -> sqlx::Result<()> {
    sqlx::query(
        r#"
        UPDATE ponies
        SET name = ?, element = ?, personality = ?, talent = ?,
            summary = ?, image_url = ?, is_favorite = ?
        WHERE id = ?
        "#,
    )
    .bind(&pony.name)
    .bind(&pony.element)
    .bind(&pony.personality)
    .bind(&pony.talent)
    .bind(&pony.summary)
    .bind(&pony.image_url)
    .bind(pony.is_favorite)
    .bind(pony.id)
    .execute(db)
    .await?;
    Ok(())
}

/// Returns the number of deleted rows (0 for an unknown id).
pub async fn delete(db: &SqlitePool, id: Uuid) -> sqlx::Result<u64> {
    let result = sqlx::query("DELETE FROM ponies WHERE id = ?")
        .bind(id)
        .execute(db)
        .await?;
    Ok(result.rows_affected())
}

#[cfg(test)]
mod tests {
    use super::*;
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

    fn sample(name: &str) -> NewPony {
        NewPony {
            name: name.to_string(),
            element: "Loyalty".to_string(),
            personality: "Brave and loyal".to_string(),
            talent: "Flying at supersonic speeds".to_string(),
            summary: format!("{name} is a pony."),
            image_url: format!("http://localhost:3000/uploads/{name}.png"),
        }
    }

    #[tokio::test]
    async fn create_then_find_by_id_roundtrips() {
        let db = test_db().await;

        let created = create(&db, sample("Rainbow Dash")).await.expect("create");
        assert!(!created.is_favorite);

        let found = find_by_id(&db, created.id)
            .await
            .expect("query")
            .expect("record exists");
        assert_eq!(found, created);
    }

    #[tokio::test]
    async fn consecutive_creations_never_share_an_id() {
        let db = test_db().await;
        let first = create(&db, sample("Derpy")).await.expect("create");
        let second = create(&db, sample("Derpy")).await.expect("create");
        assert_ne!(first.id, second.id);
    }

    #[tokio::test]
    async fn list_orders_by_name_ascending() {
        let db = test_db().await;
        for name in ["Rarity", "Applejack", "Pinkie Pie"] {
            create(&db, sample(name)).await.expect("create");
        }

        let names: Vec<String> = list(&db)
            .await
            .expect("list")
            .into_iter()
            .map(|p| p.name)
            .collect();
        assert_eq!(names, vec!["Applejack", "Pinkie Pie", "Rarity"]);
    }

    #[tokio::test]
    async fn save_persists_changed_fields() {
        let db = test_db().await;
        let mut pony = create(&db, sample("Fluttershy")).await.expect("create");

        pony.element = "Kindness".to_string();
        pony.is_favorite = true;
        save(&db, &pony).await.expect("save");

        let reloaded = find_by_id(&db, pony.id)
            .await
            .expect("query")
            .expect("record exists");
        assert_eq!(reloaded.element, "Kindness");
        assert!(reloaded.is_favorite);
        assert_eq!(reloaded.name, "Fluttershy");
    }

    #[tokio::test]
    async fn delete_then_find_returns_none() {
        let db = test_db().await;
        let pony = create(&db, sample("Applejack")).await.expect("create");

        assert_eq!(delete(&db, pony.id).await.expect("delete"), 1);
        assert!(find_by_id(&db, pony.id).await.expect("query").is_none());
    }

    #[tokio::test]
    async fn delete_of_unknown_id_touches_no_rows() {
        let db = test_db().await;
        assert_eq!(delete(&db, Uuid::new_v4()).await.expect("delete"), 0);
    }

    #[test]
    fn serialized_pony_uses_camel_case_keys() {
        let pony = Pony {
            id: Uuid::new_v4(),
            name: "Rarity".into(),
            element: "Generosity".into(),
            personality: "Dramatic".into(),
            talent: "Gem finding".into(),
            summary: "A unicorn.".into(),
            image_url: "http://localhost:3000/uploads/rarity.png".into(),
            is_favorite: true,
            created_at: OffsetDateTime::now_utc(),
        };
        let json = serde_json::to_value(&pony).expect("serialize");
        assert!(json.get("imageUrl").is_some());
        assert!(json.get("isFavorite").is_some());
        assert!(json.get("createdAt").is_some());
        assert!(json.get("image_url").is_none());
    }
}
