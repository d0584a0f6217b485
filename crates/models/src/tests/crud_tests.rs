use crate::{customer, history, user};
use crate::errors::ModelError;
use super::setup_test_db;
use anyhow::Result;
use chrono::Utc;
use sea_orm::EntityTrait;
use uuid::Uuid;

fn unique_email() -> String {
    format!("crud_{}@example.com", Uuid::new_v4())
}

#[tokio::test]
async fn test_user_insert_and_lookup() -> Result<()> {
    let Some(db) = setup_test_db().await else { return Ok(()) };

    let email = unique_email();
    let created = user::insert(&db, Uuid::new_v4(), &email, "$argon2id$v=19$fake").await?;
    assert_eq!(created.token, None);

    let by_email = user::find_by_email(&db, &email).await?.expect("user by email");
    assert_eq!(by_email.id, created.id);
    let by_id = user::find_by_id(&db, created.id).await?.expect("user by id");
    assert_eq!(by_id.email, email);

    user::Entity::delete_by_id(created.id).exec(&db).await?;
    Ok(())
}

#[tokio::test]
async fn test_duplicate_email_is_conflict() -> Result<()> {
    let Some(db) = setup_test_db().await else { return Ok(()) };

    let email = unique_email();
    let first = user::insert(&db, Uuid::new_v4(), &email, "hash").await?;
    let err = user::insert(&db, Uuid::new_v4(), &email, "hash").await.unwrap_err();
    assert!(matches!(err, ModelError::Conflict(_)), "got {err:?}");

    user::Entity::delete_by_id(first.id).exec(&db).await?;
    Ok(())
}

#[tokio::test]
async fn test_set_token_round_trip() -> Result<()> {
    let Some(db) = setup_test_db().await else { return Ok(()) };

    let u = user::insert(&db, Uuid::new_v4(), &unique_email(), "hash").await?;
    let logged_in = user::set_token(&db, u.id, Some("tok".into())).await?;
    assert_eq!(logged_in.token.as_deref(), Some("tok"));
    let logged_out = user::set_token(&db, u.id, None).await?;
    assert_eq!(logged_out.token, None);

    let missing = user::set_token(&db, Uuid::new_v4(), None).await.unwrap_err();
    assert!(matches!(missing, ModelError::NotFound(_)));

    user::Entity::delete_by_id(u.id).exec(&db).await?;
    Ok(())
}

#[tokio::test]
async fn test_customer_and_history_chain() -> Result<()> {
    let Some(db) = setup_test_db().await else { return Ok(()) };

    let u = user::insert(&db, Uuid::new_v4(), &unique_email(), "hash").await?;
    let c = customer::insert(&db, Uuid::new_v4(), u.id, "Ada", "Lovelace").await?;
    let found = customer::find_by_user_id(&db, u.id).await?.expect("customer");
    assert_eq!(found.id, c.id);

    history::record(&db, Uuid::new_v4(), c.id, "User logged in", Utc::now().into()).await?;
    history::record(&db, Uuid::new_v4(), c.id, "User logged in", Utc::now().into()).await?;
    let entries = history::list_by_customer(&db, c.id).await?;
    assert_eq!(entries.len(), 2);
    assert!(entries[0].date >= entries[1].date);

    let blank = history::record(&db, Uuid::new_v4(), c.id, "  ", Utc::now().into()).await.unwrap_err();
    assert!(matches!(blank, ModelError::Validation(_)));

    // cascades to customer and history
    user::Entity::delete_by_id(u.id).exec(&db).await?;
    assert!(customer::find_by_user_id(&db, u.id).await?.is_none());
    assert!(history::list_by_customer(&db, c.id).await?.is_empty());
    Ok(())
}
