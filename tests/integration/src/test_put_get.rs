//! Put, get and delete round trips through the in-memory store.

#[cfg(test)]
mod tests {
    use dynaql_core::{Condition, DecodeMode, Error};
    use dynaql_model::{OperationKind, ReturnValues, TypeDescriptor, Value};

    use crate::{MemoryRunner, shop_table};

    fn alice() -> Value {
        Value::from(serde_json::json!({
            "pk": "USER#alice",
            "sk": "PROFILE",
            "name": "Alice",
            "email": "alice@example.com",
            "visits": 3,
            "joined": "2024-03-01T08:30:00Z",
            "roles": ["admin", "ops"],
            "address": {"city": "Berlin"},
            "nickname": null
        }))
    }

    fn alice_key() -> Value {
        [("pk", "USER#alice"), ("sk", "PROFILE")].into_iter().collect()
    }

    #[tokio::test]
    async fn test_should_put_and_get_item() {
        let table = shop_table(DecodeMode::Strict);
        let runner = MemoryRunner::new();

        table.put("users").item(alice()).execute(&runner).await.unwrap();
        assert_eq!(runner.len(), 1);

        let user = table
            .get("users")
            .key(alice_key())
            .execute_and_decode(&runner)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(user.get("name"), Some(&Value::from("Alice")));
        assert_eq!(user.get("visits"), Some(&Value::from(3)));
        assert_eq!(
            user.get("roles"),
            Some(&Value::from(vec!["admin", "ops"]))
        );
        assert_eq!(user.get("nickname"), Some(&Value::Null));
        assert!(user.get("history").is_none());
        assert!(matches!(user.get("joined"), Some(Value::Date(_))));
        assert_eq!(
            user.get("address").and_then(|a| a.get("city")),
            Some(&Value::from("Berlin"))
        );
    }

    #[tokio::test]
    async fn test_should_send_normalized_dates_and_sets() {
        let table = shop_table(DecodeMode::Strict);
        let runner = MemoryRunner::new();
        table.put("users").item(alice()).execute(&runner).await.unwrap();

        let operations = runner.operations();
        let dynaql_model::OperationDef::PutItem(put) = &operations[0] else {
            panic!("expected a put");
        };
        assert_eq!(put.table_name, "shop");
        assert_eq!(
            put.item["joined"],
            TypeDescriptor::S("2024-03-01T08:30:00.000Z".to_owned())
        );
        assert_eq!(
            put.item["roles"],
            TypeDescriptor::Ss(vec!["admin".to_owned(), "ops".to_owned()])
        );
        assert_eq!(put.item["nickname"], TypeDescriptor::Null);
    }

    #[tokio::test]
    async fn test_should_reject_second_put_when_guarded() {
        let table = shop_table(DecodeMode::Strict);
        let runner = MemoryRunner::new();
        let guarded = table.put("users").item(alice()).throw_if_exists();

        guarded.execute(&runner).await.unwrap();
        let err = guarded.execute(&runner).await.unwrap_err();
        assert!(matches!(err, Error::Transport(_)));
        assert!(err.to_string().contains("conditional check failed"));
    }

    #[tokio::test]
    async fn test_should_delete_and_return_old_item() {
        let table = shop_table(DecodeMode::Strict);
        let runner = MemoryRunner::new();
        table.put("users").item(alice()).execute(&runner).await.unwrap();

        let old = table
            .delete("users")
            .key(alice_key())
            .condition(Condition::exists("pk"))
            .return_values(ReturnValues::AllOld)
            .execute_and_decode(&runner)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(old.get("email"), Some(&Value::from("alice@example.com")));
        assert!(runner.is_empty());

        let missing = table
            .get("users")
            .key(alice_key())
            .execute_and_decode(&runner)
            .await
            .unwrap();
        assert!(missing.is_none());

        let kinds: Vec<OperationKind> = runner.operations().iter().map(|op| op.kind()).collect();
        assert_eq!(
            kinds,
            [OperationKind::PutItem, OperationKind::DeleteItem, OperationKind::GetItem]
        );
    }

    #[tokio::test]
    async fn test_should_reject_invalid_items_before_sending() {
        let table = shop_table(DecodeMode::Strict);
        let runner = MemoryRunner::new();

        let mut item = alice();
        if let Value::Map(entries) = &mut item {
            entries.insert("visits".to_owned(), Value::from("many"));
        }
        let err = table.put("users").item(item).execute(&runner).await.unwrap_err();
        assert!(matches!(err, Error::ShapeMismatch { ref path, .. } if path == "visits"));
        assert!(runner.operations().is_empty());
    }
}
