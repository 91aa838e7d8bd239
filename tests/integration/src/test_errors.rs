//! Transport failures and decode modes.

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use dynaql_core::{DecodeMode, Error, Runner};
    use dynaql_model::{Item, OperationDef, RawResponse, TypeDescriptor, Value};

    use crate::{UnreachableRunner, shop_table};

    /// Returns a stored item carrying an attribute the schema does not know.
    struct DriftedRunner;

    #[async_trait::async_trait]
    impl Runner for DriftedRunner {
        async fn run(&self, _operation: &OperationDef) -> anyhow::Result<RawResponse> {
            let item: Item = [
                ("pk", TypeDescriptor::S("USER#erin".to_owned())),
                ("sk", TypeDescriptor::S("PROFILE".to_owned())),
                ("name", TypeDescriptor::S("Erin".to_owned())),
                ("legacy_flag", TypeDescriptor::Bool(true)),
            ]
            .into_iter()
            .map(|(k, v)| (k.to_owned(), v))
            .collect();
            Ok(RawResponse {
                item: Some(item),
                ..Default::default()
            })
        }
    }

    fn erin_key() -> Value {
        [("pk", "USER#erin"), ("sk", "PROFILE")].into_iter().collect()
    }

    #[tokio::test]
    async fn test_should_surface_transport_errors() {
        let table = shop_table(DecodeMode::Strict);
        let runner: Arc<dyn Runner> = Arc::new(UnreachableRunner);

        let err = table
            .get("users")
            .key(erin_key())
            .execute(&runner)
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Transport(_)));
        assert!(err.to_string().contains("connection refused"));
    }

    #[tokio::test]
    async fn test_should_reject_undeclared_attributes_in_strict_mode() {
        let table = shop_table(DecodeMode::Strict);
        let err = table
            .get("users")
            .key(erin_key())
            .execute_and_decode(&DriftedRunner)
            .await
            .unwrap_err();
        assert!(matches!(err, Error::PathNotFound { ref path } if path == "legacy_flag"));
    }

    #[tokio::test]
    async fn test_should_skip_undeclared_attributes_in_lenient_mode() {
        let table = shop_table(DecodeMode::Lenient);
        let user = table
            .get("users")
            .key(erin_key())
            .execute_and_decode(&DriftedRunner)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(user.get("name"), Some(&Value::from("Erin")));
        assert!(user.get("legacy_flag").is_none());
    }
}
