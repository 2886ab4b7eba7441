//! Bounded, scoped connection acquisition.

mod common;

use std::time::Duration;

use awesome_orm::{FindAll, Model};
use common::{new_user, setup, User};
use futures::future::join_all;

#[tokio::test]
async fn acquire_waits_when_pool_is_exhausted() {
    let t = setup(2).await;

    let first = t.db.acquire().await.unwrap();
    let second = t.db.acquire().await.unwrap();
    assert_eq!(t.db.size(), 2);

    let blocked = tokio::time::timeout(Duration::from_millis(200), t.db.acquire()).await;
    assert!(blocked.is_err(), "third acquire should wait while two are out");

    drop(first);
    let third = tokio::time::timeout(Duration::from_secs(5), t.db.acquire())
        .await
        .expect("released connection becomes available")
        .unwrap();

    drop(second);
    drop(third);
    assert!(t.db.size() <= 2);
}

#[tokio::test]
async fn more_operations_than_maxsize_all_complete() {
    let t = setup(2).await;
    for name in ["p1", "p2", "p3"] {
        new_user(name).save(&t.db).await.unwrap();
    }

    let db = &t.db;
    let lookups = (0..12).map(|_| async move {
        let users = User::find_all(db, FindAll::new()).await?;
        assert!(db.size() <= db.max_size());
        Ok::<_, awesome_orm::OrmError>(users.len())
    });

    let results = join_all(lookups).await;
    assert_eq!(results.len(), 12);
    for result in results {
        assert_eq!(result.unwrap(), 3);
    }
    assert!(t.db.size() <= 2);
}

#[tokio::test]
async fn cancelled_holder_releases_connection() {
    let t = setup(1).await;

    let db = t.db.clone();
    let holder = tokio::spawn(async move {
        let _conn = db.acquire().await.unwrap();
        tokio::time::sleep(Duration::from_secs(3600)).await;
    });

    // let the holder check the only connection out
    tokio::time::sleep(Duration::from_millis(50)).await;
    assert!(tokio::time::timeout(Duration::from_millis(100), t.db.acquire())
        .await
        .is_err());

    holder.abort();
    let _ = holder.await;

    let conn = tokio::time::timeout(Duration::from_secs(5), t.db.acquire())
        .await
        .expect("connection returned after cancellation")
        .unwrap();
    drop(conn);

    // and a normal operation still goes through
    assert!(User::find(&t.db, "missing").await.unwrap().is_none());
}

#[tokio::test]
async fn cancelled_acquire_does_not_leak() {
    let t = setup(1).await;

    for _ in 0..3 {
        let held = t.db.acquire().await.unwrap();
        let waiting = tokio::time::timeout(Duration::from_millis(20), t.db.acquire()).await;
        assert!(waiting.is_err());
        drop(held);
    }

    let users = User::find_all(&t.db, FindAll::new()).await.unwrap();
    assert!(users.is_empty());
}
