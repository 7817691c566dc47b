//! Integration tests for `BaseDao` against an in-memory SQLite database.

mod common;

use common::{new_user, test_pool, HASH};
use std::error::Error as _;
use userbase_core::{ErrorKind, Pagination, User, UserStatus, UserbaseError};
use userbase_repository::{
    BaseDao, Changes, DaoTransaction, FetchOptions, Filter, SortOrder, UserScope,
};

async fn dao() -> BaseDao<User> {
    BaseDao::new(test_pool().await.inner().clone())
}

async fn seed(dao: &BaseDao<User>, count: usize) -> Vec<User> {
    let users: Vec<_> = (1..=count)
        .map(|i| new_user("User", &format!("Number{i}"), &format!("user{i}@example.com")))
        .collect();
    dao.bulk_create(&users).await.unwrap()
}

// =============================================================================
// create / fetch
// =============================================================================

#[tokio::test]
async fn test_create_returns_default_scope() {
    let dao = dao().await;

    let user = dao
        .create(&new_user("Ada", "Lovelace", "ada@example.com"))
        .await
        .unwrap();

    assert_eq!(user.id.into_inner(), 1);
    assert_eq!(user.email.as_str(), "ada@example.com");
    assert_eq!(user.status, UserStatus::Active);
    assert!(user.is_customer);
    assert!(user.password.is_none());
    assert!(user.deleted_at.is_none());
    assert_eq!(user.created_at, user.updated_at);
}

#[tokio::test]
async fn test_create_without_returning_reads_back() {
    let dao = dao().await.without_returning();

    let user = dao
        .create(&new_user("Ada", "Lovelace", "ada@example.com"))
        .await
        .unwrap();

    assert_eq!(user.display_name(), "Ada Lovelace");
    assert!(user.password.is_none());
}

#[tokio::test]
async fn test_password_only_read_through_its_scope() {
    let dao = dao().await;
    dao.create(&new_user("Ada", "Lovelace", "ada@example.com"))
        .await
        .unwrap();
    let filter = Filter::new().with("email", "ada@example.com");

    let default = dao.fetch_one(&filter, &FetchOptions::new()).await.unwrap().unwrap();
    assert!(default.password.is_none());

    let with_password = dao
        .fetch_one(&filter, &FetchOptions::new().scope(UserScope::WithPassword))
        .await
        .unwrap()
        .unwrap();
    assert_eq!(with_password.password.unwrap().as_str(), HASH);
}

#[tokio::test]
async fn test_single_key_filter_matches_exactly() {
    let dao = dao().await;
    seed(&dao, 3).await;

    let found = dao
        .fetch_all(&Filter::new().with("email", "user2@example.com"), &FetchOptions::new())
        .await
        .unwrap();
    assert_eq!(found.len(), 1);
    assert_eq!(found.data[0].last_name, "Number2");

    let none = dao
        .fetch_one(&Filter::new().with("email", "nobody@example.com"), &FetchOptions::new())
        .await
        .unwrap();
    assert!(none.is_none());
}

#[tokio::test]
async fn test_null_filter_matches_missing_values() {
    let dao = dao().await;
    dao.create(&new_user("Ada", "Lovelace", "ada@example.com").with_phone("+1 555 0100"))
        .await
        .unwrap();
    dao.create(&new_user("Grace", "Hopper", "grace@example.com"))
        .await
        .unwrap();

    let found = dao
        .fetch_all(&Filter::new().with("phone", None::<String>), &FetchOptions::new())
        .await
        .unwrap();
    assert_eq!(found.len(), 1);
    assert_eq!(found.data[0].first_name, "Grace");
}

#[tokio::test]
async fn test_association_filter_joins_referrer() {
    let dao = dao().await;
    let referrer = dao
        .create(&new_user("Ada", "Lovelace", "ada@example.com"))
        .await
        .unwrap();
    dao.create(&new_user("Grace", "Hopper", "grace@example.com").referred_by(referrer.id))
        .await
        .unwrap();
    dao.create(&new_user("Alan", "Turing", "alan@example.com"))
        .await
        .unwrap();

    let filter = Filter::new().with("referrer.email", "ada@example.com");
    let referred = dao.fetch_all(&filter, &FetchOptions::new()).await.unwrap();
    assert_eq!(referred.len(), 1);
    assert_eq!(referred.data[0].first_name, "Grace");
    assert_eq!(referred.data[0].referrer_id, Some(referrer.id));

    // A soft-deleted referrer no longer joins.
    dao.delete(&Filter::new().with("id", referrer.id)).await.unwrap();
    let referred = dao.fetch_all(&filter, &FetchOptions::new()).await.unwrap();
    assert!(referred.is_empty());
}

#[tokio::test]
async fn test_invalid_filter_is_reported() {
    let dao = dao().await;

    for filter in [
        Filter::new().with("nickname", "ada"),
        Filter::new().with("referrer.referrer.email", "ada@example.com"),
        Filter::new().with("sponsor.email", "ada@example.com"),
    ] {
        let err = dao.fetch_all(&filter, &FetchOptions::new()).await.unwrap_err();
        assert!(matches!(err, UserbaseError::InvalidFilter(_)), "{err}");
        assert_eq!(err.kind(), ErrorKind::Validation);
    }
}

// =============================================================================
// pagination / ordering
// =============================================================================

#[tokio::test]
async fn test_fetch_all_paginates() {
    let dao = dao().await;
    seed(&dao, 25).await;

    let page = dao
        .fetch_all(&Filter::new(), &FetchOptions::new().limit(10).page(2))
        .await
        .unwrap();

    assert_eq!(page.len(), 10);
    assert_eq!(page.data[0].id.into_inner(), 11);
    assert_eq!(page.data[9].id.into_inner(), 20);
    assert_eq!(
        page.pagination,
        Some(Pagination {
            limit: 10,
            page: 2,
            pages: 3,
            rows: 25
        })
    );

    let last = dao
        .fetch_all(&Filter::new(), &FetchOptions::new().limit(10).page(3))
        .await
        .unwrap();
    assert_eq!(last.len(), 5);
    assert!(!last.pagination.unwrap().has_next());
}

#[tokio::test]
async fn test_limit_without_page_has_no_pagination() {
    let dao = dao().await;
    seed(&dao, 5).await;

    let limited = dao
        .fetch_all(&Filter::new(), &FetchOptions::new().limit(2))
        .await
        .unwrap();
    assert_eq!(limited.len(), 2);
    assert!(limited.pagination.is_none());

    let page_only = dao
        .fetch_all(&Filter::new(), &FetchOptions::new().page(2))
        .await
        .unwrap();
    assert_eq!(page_only.len(), 5);
    assert!(page_only.pagination.is_none());
}

#[tokio::test]
async fn test_zero_page_or_limit_is_rejected() {
    let dao = dao().await;

    let err = dao
        .fetch_all(&Filter::new(), &FetchOptions::new().limit(10).page(0))
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Validation);

    let err = dao
        .fetch_all(&Filter::new(), &FetchOptions::new().limit(0))
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Validation);
}

#[tokio::test]
async fn test_pagination_counts_distinct_rows_across_joins() {
    let dao = dao().await;
    let referrer = dao
        .create(&new_user("Ada", "Lovelace", "ada@example.com"))
        .await
        .unwrap();
    for i in 0..3 {
        dao.create(
            &new_user("Friend", "Of Ada", &format!("friend{i}@example.com")).referred_by(referrer.id),
        )
        .await
        .unwrap();
    }

    let page = dao
        .fetch_all(
            &Filter::new().with("referrer.email", "ada@example.com"),
            &FetchOptions::new().paginate(userbase_core::PageRequest::new(1, 2)),
        )
        .await
        .unwrap();
    assert_eq!(page.len(), 2);
    assert_eq!(page.pagination.unwrap().rows, 3);
}

#[tokio::test]
async fn test_order_keys() {
    let dao = dao().await;
    dao.create(&new_user("Bea", "Smith", "bea@example.com")).await.unwrap();
    dao.create(&new_user("Abe", "Smith", "abe@example.com")).await.unwrap();
    dao.create(&new_user("Cal", "Jones", "cal@example.com")).await.unwrap();

    let users = dao
        .fetch_all(
            &Filter::new(),
            &FetchOptions::new().order_by("first_name", SortOrder::Desc),
        )
        .await
        .unwrap();
    let names: Vec<_> = users.into_iter().map(|u| u.first_name).collect();
    assert_eq!(names, vec!["Cal", "Bea", "Abe"]);
}

#[tokio::test]
async fn test_active_scope() {
    let dao = dao().await;
    seed(&dao, 3).await;
    dao.update(
        &Changes::new().set("status", UserStatus::Suspended),
        &Filter::new().with("email", "user1@example.com"),
    )
    .await
    .unwrap();

    let active = dao
        .fetch_all(&Filter::new(), &FetchOptions::new().scope(UserScope::Active))
        .await
        .unwrap();
    assert_eq!(active.len(), 2);
    assert!(active.data.iter().all(User::is_active));
}

// =============================================================================
// aggregates
// =============================================================================

#[tokio::test]
async fn test_count_and_count_col() {
    let dao = dao().await;
    dao.create(&new_user("Bea", "Smith", "bea@example.com")).await.unwrap();
    dao.create(&new_user("Abe", "Smith", "abe@example.com")).await.unwrap();
    dao.create(&new_user("Cal", "Jones", "cal@example.com")).await.unwrap();

    assert_eq!(dao.count(&Filter::new()).await.unwrap(), 3);
    assert_eq!(
        dao.count(&Filter::new().with("last_name", "Smith")).await.unwrap(),
        2
    );
    assert_eq!(dao.count_col("last_name", &Filter::new()).await.unwrap(), 2);
    assert!(dao.count_col("nickname", &Filter::new()).await.is_err());
}

#[tokio::test]
async fn test_sum() {
    let dao = dao().await;
    let referrer = dao
        .create(&new_user("Ada", "Lovelace", "ada@example.com"))
        .await
        .unwrap();
    dao.create(&new_user("Grace", "Hopper", "grace@example.com").referred_by(referrer.id))
        .await
        .unwrap();
    dao.create(&new_user("Alan", "Turing", "alan@example.com").referred_by(referrer.id))
        .await
        .unwrap();

    let total = dao.sum("referrer_id", &Filter::new()).await.unwrap();
    assert!((total - 2.0).abs() < f64::EPSILON);

    let none = dao
        .sum("referrer_id", &Filter::new().with("email", "nobody@example.com"))
        .await
        .unwrap();
    assert!(none.abs() < f64::EPSILON);
}

#[tokio::test]
async fn test_exist() {
    let dao = dao().await;
    seed(&dao, 1).await;

    assert!(dao
        .exist(&Filter::new().with("email", "user1@example.com"))
        .await
        .unwrap());
    assert!(!dao
        .exist(&Filter::new().with("email", "user2@example.com"))
        .await
        .unwrap());
}

// =============================================================================
// update
// =============================================================================

#[tokio::test]
async fn test_update_returns_first_updated_record() {
    let dao = dao().await;
    seed(&dao, 3).await;

    let updated = dao
        .update(
            &Changes::new().set("last_name", "Renamed"),
            &Filter::new().with("first_name", "User"),
        )
        .await
        .unwrap()
        .unwrap();

    assert_eq!(updated.id.into_inner(), 1);
    assert_eq!(updated.last_name, "Renamed");
    assert!(updated.updated_at >= updated.created_at);
    assert_eq!(
        dao.count(&Filter::new().with("last_name", "Renamed")).await.unwrap(),
        3
    );
}

#[tokio::test]
async fn test_update_without_returning_refetches() {
    let dao = dao().await.without_returning();
    seed(&dao, 1).await;

    let updated = dao
        .update(
            &Changes::new().set("gender", "female"),
            &Filter::new().with("email", "user1@example.com"),
        )
        .await
        .unwrap()
        .unwrap();
    assert_eq!(updated.gender.as_deref(), Some("female"));
}

#[tokio::test]
async fn test_update_without_match_is_none() {
    let dao = dao().await;

    let updated = dao
        .update(
            &Changes::new().set("gender", "female"),
            &Filter::new().with("email", "nobody@example.com"),
        )
        .await
        .unwrap();
    assert!(updated.is_none());
}

#[tokio::test]
async fn test_update_rejects_computed_fields() {
    let dao = dao().await;
    seed(&dao, 1).await;

    for field in ["display_name", "shortName", "protected_email"] {
        let err = dao
            .update(&Changes::new().set(field, "x"), &Filter::new())
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::ImmutableField, "{field}");
    }
}

#[tokio::test]
async fn test_update_rejects_plaintext_password() {
    let dao = dao().await;
    seed(&dao, 1).await;

    let err = dao
        .update(&Changes::new().set("password", "hunter22"), &Filter::new())
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Validation);
}

async fn stored_column(dao: &BaseDao<User>, column: &str) -> Vec<Option<String>> {
    sqlx::query_scalar(&format!("SELECT \"{column}\" FROM \"users\" ORDER BY \"id\""))
        .fetch_all(dao.pool())
        .await
        .unwrap()
}

#[tokio::test]
async fn test_update_stores_canonical_email_and_phone() {
    let dao = dao().await;
    seed(&dao, 1).await;

    let updated = dao
        .update(
            &Changes::new()
                .set("email", "  New.Address@Example.COM ")
                .set("phone", "+44 20 7946 0958"),
            &Filter::new().with("id", 1_i64),
        )
        .await
        .unwrap()
        .unwrap();

    assert_eq!(updated.email.as_str(), "new.address@example.com");
    assert_eq!(stored_column(&dao, "email").await, vec![Some("new.address@example.com".to_string())]);
    assert_eq!(stored_column(&dao, "phone").await, vec![Some("+442079460958".to_string())]);
}

#[tokio::test]
async fn test_update_to_taken_email_in_other_case_conflicts() {
    let dao = dao().await;
    dao.create(&new_user("Ada", "Lovelace", "ada@example.com"))
        .await
        .unwrap();
    let bob = dao
        .create(&new_user("Bob", "Babbage", "bob@example.com"))
        .await
        .unwrap();

    let err = dao
        .update(
            &Changes::new().set("email", "  ADA@Example.com "),
            &Filter::new().with("id", bob.id.into_inner()),
        )
        .await
        .unwrap_err();

    assert!(err.is_unique_violation_on("email"));
    assert_eq!(
        stored_column(&dao, "email").await,
        vec![Some("ada@example.com".to_string()), Some("bob@example.com".to_string())]
    );
}

#[tokio::test]
async fn test_phone_formatting_variants_share_the_unique_index() {
    let dao = dao().await;
    dao.create(&new_user("Ada", "Lovelace", "ada@example.com").with_phone("+44 20 7946 0958"))
        .await
        .unwrap();

    let err = dao
        .create(&new_user("Bob", "Babbage", "bob@example.com").with_phone("+442079460958"))
        .await
        .unwrap_err();

    assert!(err.is_unique_violation_on("phone"));
}

// =============================================================================
// delete
// =============================================================================

#[tokio::test]
async fn test_soft_delete() {
    let dao = dao().await;
    seed(&dao, 4).await;
    let filter = Filter::new().with("last_name", "Number2");
    dao.update(&Changes::new().set("last_name", "Number2"), &Filter::new().with("id", 3))
        .await
        .unwrap();

    assert_eq!(dao.delete(&filter).await.unwrap(), 2);
    assert_eq!(dao.delete(&filter).await.unwrap(), 0);

    assert_eq!(dao.count(&Filter::new()).await.unwrap(), 2);
    assert!(dao.fetch_one(&filter, &FetchOptions::new()).await.unwrap().is_none());

    let deleted = dao
        .fetch_all(&filter, &FetchOptions::new().with_deleted())
        .await
        .unwrap();
    assert_eq!(deleted.len(), 2);
    assert!(deleted.data.iter().all(User::is_deleted));
}

#[tokio::test]
async fn test_email_is_reusable_after_soft_delete() {
    let dao = dao().await;
    let first = dao
        .create(&new_user("Ada", "Lovelace", "ada@example.com"))
        .await
        .unwrap();
    dao.delete(&Filter::new().with("id", first.id)).await.unwrap();

    let second = dao
        .create(&new_user("Ada", "Byron", "ada@example.com"))
        .await
        .unwrap();
    assert_ne!(first.id, second.id);
}

// =============================================================================
// errors
// =============================================================================

#[tokio::test]
async fn test_duplicate_email_is_a_constraint_error() {
    let dao = dao().await;
    dao.create(&new_user("Ada", "Lovelace", "ada@example.com"))
        .await
        .unwrap();

    let err = dao
        .create(&new_user("Ada", "Byron", "ada@example.com"))
        .await
        .unwrap_err();

    assert!(matches!(err, UserbaseError::Constraint { operation: "create", .. }));
    assert_eq!(err.kind(), ErrorKind::Conflict);
    assert_eq!(err.status_code(), 409);
    assert!(err.is_unique_violation_on("email"));
    assert!(!err.is_unique_violation_on("phone"));

    let source = err.source().expect("driver error is kept");
    assert!(source.downcast_ref::<sqlx::Error>().is_some());
}

#[tokio::test]
async fn test_unknown_referrer_violates_foreign_key() {
    let dao = dao().await;

    let err = dao
        .create(
            &new_user("Ada", "Lovelace", "ada@example.com")
                .referred_by(userbase_core::UserId::new(42)),
        )
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Conflict);
}

// =============================================================================
// bulk_create
// =============================================================================

#[tokio::test]
async fn test_bulk_create_empty_is_noop() {
    let dao = dao().await;
    assert!(dao.bulk_create(&[]).await.unwrap().is_empty());
    assert_eq!(dao.count(&Filter::new()).await.unwrap(), 0);
}

#[tokio::test]
async fn test_bulk_create_is_ordered_and_atomic() {
    let dao = dao().await;

    let created = seed(&dao, 3).await;
    let ids: Vec<i64> = created.iter().map(|u| u.id.into_inner()).collect();
    assert_eq!(ids, vec![1, 2, 3]);

    let err = dao
        .bulk_create(&[
            new_user("New", "One", "new@example.com"),
            new_user("Dup", "Two", "user1@example.com"),
        ])
        .await
        .unwrap_err();
    assert!(err.is_unique_violation_on("email"));
    assert_eq!(dao.count(&Filter::new()).await.unwrap(), 3);
}

#[tokio::test]
async fn test_bulk_create_without_returning() {
    let dao = dao().await.without_returning();

    let created = seed(&dao, 2).await;
    assert_eq!(created.len(), 2);
    assert_eq!(created[1].email.as_str(), "user2@example.com");
}

// =============================================================================
// transactions
// =============================================================================

#[tokio::test]
async fn test_failed_sequence_rolls_back_everything() {
    let dao = dao().await;
    let tx = dao.get_transaction().await.unwrap();
    let bound = dao.use_transaction(&tx);

    bound
        .create(&new_user("Ada", "Lovelace", "ada@example.com"))
        .await
        .unwrap();
    bound
        .create(&new_user("Grace", "Hopper", "grace@example.com"))
        .await
        .unwrap();
    let err = bound
        .create(&new_user("Ada", "Again", "ada@example.com"))
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Conflict);

    bound.rollback_transaction().await.unwrap();
    assert!(!tx.is_active().await);

    assert_eq!(dao.count(&Filter::new()).await.unwrap(), 0);
}

#[tokio::test]
async fn test_committed_sequence_is_visible() {
    let dao = dao().await;
    let tx = DaoTransaction::begin(dao.pool()).await.unwrap();
    let bound = dao.use_transaction(&tx);

    seed(&bound, 2).await;
    bound
        .update(&Changes::new().set("is_admin", true), &Filter::new().with("id", 1))
        .await
        .unwrap();
    assert_eq!(bound.count(&Filter::new()).await.unwrap(), 2);

    bound.commit_transaction().await.unwrap();

    assert_eq!(dao.count(&Filter::new()).await.unwrap(), 2);
    assert_eq!(dao.count(&Filter::new().with("is_admin", true)).await.unwrap(), 1);
}

#[tokio::test]
async fn test_bulk_create_in_bound_transaction_rolls_back() {
    let dao = dao().await;
    let tx = dao.get_transaction().await.unwrap();
    let bound = dao.use_transaction(&tx);

    seed(&bound, 3).await;
    bound.rollback_transaction().await.unwrap();

    assert_eq!(dao.count(&Filter::new()).await.unwrap(), 0);
}

#[tokio::test]
async fn test_finalized_transaction_cannot_be_reused() {
    let dao = dao().await;
    let tx = dao.get_transaction().await.unwrap();
    let bound = dao.use_transaction(&tx);
    bound.commit_transaction().await.unwrap();

    let err = bound
        .create(&new_user("Ada", "Lovelace", "ada@example.com"))
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Internal);
    assert!(bound.commit_transaction().await.is_err());
}

#[tokio::test]
async fn test_transaction_helpers_on_unbound_dao() {
    let dao = dao().await;

    dao.commit_transaction().await.unwrap();
    dao.rollback_transaction().await.unwrap();
    assert!(dao.transaction().is_none());

    let tx = dao.get_transaction().await.unwrap();
    let bound = dao.use_transaction(&tx);
    let same = bound.get_transaction().await.unwrap();
    assert!(same.same_as(&tx));
    tx.rollback().await.unwrap();
}
