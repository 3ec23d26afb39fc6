//! Postgres store tests. Need a reachable database named by
//! `FOLIO_DATABASE_URL`; run with `--features db-tests`.

#![cfg(feature = "db-tests")]

use folio_api::{ApiResult, DbClient, DbConfig, PgArticleStore, PgUserStore};
use folio_core::{FolioError, StorageError};
use folio_storage::{Store, UserStore};
use folio_test_utils::fixtures;

async fn test_db() -> ApiResult<DbClient> {
    let config = DbConfig::from_env().map_err(FolioError::from)?;
    let db = DbClient::from_config(&config)?;
    db.ensure_schema().await?;
    Ok(db)
}

/// Emails unique per run so tests can share one database.
fn unique_email(prefix: &str) -> String {
    format!(
        "{}-{}@example.com",
        prefix,
        chrono::Utc::now().timestamp_nanos_opt().unwrap_or_default()
    )
}

#[tokio::test]
async fn user_crud_and_soft_delete() -> ApiResult<()> {
    let users = PgUserStore::new(test_db().await?);
    let email = unique_email("crud");

    let created = users.create(fixtures::new_user("Ada", &email)).await?;
    assert_eq!(users.find_by_email(&email).await?.map(|u| u.id), Some(created.id));

    let renamed = users
        .update(
            created.id,
            folio_core::UserUpdate {
                name: Some("Ada Lovelace".to_string()),
                email: None,
            },
        )
        .await?;
    assert_eq!(renamed.name, "Ada Lovelace");
    assert_eq!(renamed.email, email);
    assert!(renamed.updated_at >= created.updated_at);

    users.delete(created.id).await?;
    assert!(users.find_by_id(created.id).await?.is_none());
    assert!(users.find_by_email(&email).await?.is_none());

    let err = users.delete(created.id).await.unwrap_err();
    assert!(matches!(err, FolioError::Storage(StorageError::NotFound { .. })));
    Ok(())
}

#[tokio::test]
async fn duplicate_live_email_is_rejected() -> ApiResult<()> {
    let users = PgUserStore::new(test_db().await?);
    let email = unique_email("dup");

    let first = users.create(fixtures::new_user("Ada", &email)).await?;
    let err = users
        .create(fixtures::new_user("Imposter", &email))
        .await
        .unwrap_err();
    assert!(matches!(err, FolioError::Storage(StorageError::Duplicate { .. })));

    // Once the first account is soft-deleted the address is free again.
    users.delete(first.id).await?;
    users.create(fixtures::new_user("Ada again", &email)).await?;
    Ok(())
}

#[tokio::test]
async fn article_list_hides_deleted_rows() -> ApiResult<()> {
    let articles = PgArticleStore::new(test_db().await?);
    let email = unique_email("articles");

    let kept = articles.create(fixtures::new_article(&email, "kept")).await?;
    let dropped = articles
        .create(fixtures::new_article(&email, "dropped"))
        .await?;
    articles.delete(dropped.id).await?;

    let ids: Vec<_> = articles.list().await?.into_iter().map(|a| a.id).collect();
    assert!(ids.contains(&kept.id));
    assert!(!ids.contains(&dropped.id));

    let updated = articles
        .update(kept.id, fixtures::title_update("renamed"))
        .await?;
    assert_eq!(updated.title, "renamed");
    assert_eq!(updated.content, kept.content);
    Ok(())
}
