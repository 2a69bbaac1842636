//! Nested-transaction (savepoint) semantics through the executor.
//!
//! Statements issued in the enclosing transaction before a nested scope
//! begins must survive a rollback of that scope, and the enclosing
//! transaction must still commit afterward.
//!
//! Run with: cargo test --test savepoint_tests

use keyseek::{Client, DbError, PoolConfig, Result, SelectQuery, Transaction, Value};

async fn client_with_table() -> Client {
    let client = Client::open(PoolConfig::new()).unwrap();
    client
        .execute(|tx: &mut Transaction<'_>| tx.create_table("t", vec!["id".into()]))
        .await
        .unwrap();
    client
}

async fn ids(client: &Client) -> Vec<i64> {
    client
        .query(|tx: &mut Transaction<'_>| tx.select(&SelectQuery::from("t")))
        .await
        .unwrap()
        .iter()
        .map(|row| row[0].as_i64().unwrap())
        .collect()
}

#[tokio::test]
async fn test_nested_rollback_preserves_enclosing_statements() {
    let client = client_with_table().await;

    client
        .execute(|tx: &mut Transaction<'_>| {
            tx.insert("t", vec![Value::Integer(1)])?;
            tx.execute_nested(|nested| {
                nested.insert("t", vec![Value::Integer(2)])?;
                nested.rollback();
                Ok(())
            })?;
            // The enclosing transaction keeps going after the nested revert.
            tx.insert("t", vec![Value::Integer(3)])?;
            Ok(())
        })
        .await
        .unwrap();

    assert_eq!(ids(&client).await, vec![1, 3]);
}

#[tokio::test]
async fn test_nested_failure_reverts_only_its_scope() {
    let client = client_with_table().await;

    client
        .execute(|tx: &mut Transaction<'_>| {
            tx.insert("t", vec![Value::Integer(1)])?;
            let nested: Result<()> = tx.execute_nested(|nested| {
                nested.insert("t", vec![Value::Integer(2)])?;
                Err(DbError::Execution("nested scope failed".into()))
            });
            assert!(nested.is_err());
            Ok(())
        })
        .await
        .unwrap();

    assert_eq!(ids(&client).await, vec![1]);
}

#[tokio::test]
async fn test_nested_success_is_kept_by_commit() {
    let client = client_with_table().await;

    client
        .execute(|tx: &mut Transaction<'_>| {
            tx.insert("t", vec![Value::Integer(1)])?;
            tx.execute_nested(|nested| nested.insert("t", vec![Value::Integer(2)]))?;
            Ok(())
        })
        .await
        .unwrap();

    assert_eq!(ids(&client).await, vec![1, 2]);
}

#[tokio::test]
async fn test_sibling_scopes_are_independent() {
    let client = client_with_table().await;

    client
        .execute(|tx: &mut Transaction<'_>| {
            tx.execute_nested(|nested| nested.insert("t", vec![Value::Integer(1)]))?;
            tx.execute_nested(|nested| {
                nested.insert("t", vec![Value::Integer(2)])?;
                nested.rollback();
                Ok(())
            })?;
            tx.execute_nested(|nested| nested.insert("t", vec![Value::Integer(3)]))?;
            Ok(())
        })
        .await
        .unwrap();

    assert_eq!(ids(&client).await, vec![1, 3]);
}

#[tokio::test]
async fn test_inner_rollback_spares_outer_scope() {
    let client = client_with_table().await;

    client
        .execute(|tx: &mut Transaction<'_>| {
            tx.insert("t", vec![Value::Integer(1)])?;
            tx.execute_nested(|outer| {
                outer.insert("t", vec![Value::Integer(2)])?;
                outer.execute_nested(|inner| {
                    inner.insert("t", vec![Value::Integer(3)])?;
                    inner.rollback();
                    Ok(())
                })?;
                outer.insert("t", vec![Value::Integer(4)])?;
                Ok(())
            })?;
            Ok(())
        })
        .await
        .unwrap();

    assert_eq!(ids(&client).await, vec![1, 2, 4]);
}

#[tokio::test]
async fn test_enclosing_rollback_discards_released_savepoints() {
    let client = client_with_table().await;

    let result = client
        .execute(|tx: &mut Transaction<'_>| {
            tx.execute_nested(|nested| nested.insert("t", vec![Value::Integer(1)]))?;
            tx.rollback();
            Ok(())
        })
        .await;
    assert!(result.is_ok());

    assert_eq!(ids(&client).await, Vec::<i64>::new());
}

#[tokio::test]
async fn test_nested_reads_see_enclosing_writes() {
    let client = client_with_table().await;

    client
        .execute(|tx: &mut Transaction<'_>| {
            tx.insert("t", vec![Value::Integer(1)])?;
            let seen = tx.execute_nested(|nested| {
                nested.select(&SelectQuery::from("t")).map(|rows| rows.len())
            })?;
            assert_eq!(seen, 1);
            Ok(())
        })
        .await
        .unwrap();
}
