//! Update expressions applied by the in-memory store.

#[cfg(test)]
mod tests {
    use dynaql_core::{Condition, DecodeMode, Error};
    use dynaql_model::{ReturnValues, Value};

    use crate::{MemoryRunner, shop_table};

    fn bob() -> Value {
        Value::from(serde_json::json!({
            "pk": "USER#bob",
            "sk": "PROFILE",
            "name": "Bob",
            "email": "bob@example.com",
            "visits": 10,
            "joined": "2023-11-20T00:00:00Z",
            "history": ["signup"],
            "nickname": "bobby"
        }))
    }

    fn bob_key() -> Value {
        [("pk", "USER#bob"), ("sk", "PROFILE")].into_iter().collect()
    }

    #[tokio::test]
    async fn test_should_apply_set_increment_append_and_remove() {
        let table = shop_table(DecodeMode::Strict);
        let runner = MemoryRunner::new();
        table.put("users").item(bob()).execute(&runner).await.unwrap();

        let updated = table
            .update("users")
            .key(bob_key())
            .set("name", "Robert")
            .increment("visits", 5)
            .append_list("history", ["renamed"])
            .remove("nickname")
            .condition(Condition::gt("visits", 1))
            .return_values(ReturnValues::AllNew)
            .execute_and_decode(&runner)
            .await
            .unwrap()
            .unwrap();

        assert_eq!(updated.get("name"), Some(&Value::from("Robert")));
        assert_eq!(updated.get("visits"), Some(&Value::from(15)));
        assert_eq!(
            updated.get("history"),
            Some(&Value::from(vec!["signup", "renamed"]))
        );
        assert!(updated.get("nickname").is_none());
    }

    #[tokio::test]
    async fn test_should_decrement_from_a_branched_builder() {
        let table = shop_table(DecodeMode::Strict);
        let runner = MemoryRunner::new();
        table.put("users").item(bob()).execute(&runner).await.unwrap();

        let base = table.update("users").key(bob_key());
        base.clone().decrement("visits", 4).execute(&runner).await.unwrap();
        base.set("email", "rob@example.com").execute(&runner).await.unwrap();

        let user = table
            .get("users")
            .key(bob_key())
            .execute_and_decode(&runner)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(user.get("visits"), Some(&Value::from(6)));
        assert_eq!(user.get("email"), Some(&Value::from("rob@example.com")));
    }

    #[tokio::test]
    async fn test_should_refuse_invalid_updates_before_sending() {
        let table = shop_table(DecodeMode::Strict);
        let runner = MemoryRunner::new();

        let err = table
            .update("users")
            .key(bob_key())
            .increment("name", 1)
            .execute(&runner)
            .await
            .unwrap_err();
        assert!(matches!(err, Error::InvalidUpdate { .. }));

        let err = table
            .update("users")
            .key(bob_key())
            .remove("email")
            .execute(&runner)
            .await
            .unwrap_err();
        assert!(matches!(err, Error::InvalidUpdate { .. }));

        let err = table
            .update("users")
            .key(bob_key())
            .set("visits", "lots")
            .execute(&runner)
            .await
            .unwrap_err();
        assert!(matches!(err, Error::ShapeMismatch { .. }));

        assert!(runner.operations().is_empty());
    }
}
