//! Queries and scans over a table holding several entities.

#[cfg(test)]
mod tests {
    use dynaql_core::{Condition, DecodeMode, Operator, Table};
    use dynaql_model::{OperationDef, Value};

    use crate::{MemoryRunner, shop_table};

    async fn seeded() -> (Table, MemoryRunner) {
        let table = shop_table(DecodeMode::Strict);
        let runner = MemoryRunner::new();
        let user = Value::from(serde_json::json!({
            "pk": "USER#carol",
            "sk": "PROFILE",
            "name": "Carol",
            "email": "carol@example.com",
            "visits": 1,
            "joined": "2022-01-01T00:00:00Z"
        }));
        table.put("users").item(user).execute(&runner).await.unwrap();

        for (sk, total) in [("ORDER#001", 20), ("ORDER#002", 45), ("ORDER#003", 80)] {
            let order = Value::from(serde_json::json!({
                "pk": "USER#carol",
                "sk": sk,
                "total": total,
                "items": [{"sku": "A-1", "qty": 2}]
            }));
            table.put("orders").item(order).execute(&runner).await.unwrap();
        }

        let other = Value::from(serde_json::json!({
            "pk": "USER#dave",
            "sk": "ORDER#001",
            "total": 5,
            "items": []
        }));
        table.put("orders").item(other).execute(&runner).await.unwrap();
        (table, runner)
    }

    #[tokio::test]
    async fn test_should_query_one_partition_across_entities() {
        let (table, runner) = seeded().await;

        let items = table
            .query()
            .key_condition(Condition::eq("pk", "USER#carol"))
            .execute_and_decode(&runner)
            .await
            .unwrap();
        assert_eq!(items.len(), 4);
        assert_eq!(items[0].get("total"), Some(&Value::from(20)));
        assert_eq!(items[3].get("name"), Some(&Value::from("Carol")));
    }

    #[tokio::test]
    async fn test_should_page_in_reverse_order() {
        let (table, runner) = seeded().await;

        let response = table
            .query()
            .key_condition(Condition::and([
                Condition::eq("pk", "USER#carol"),
                Condition::begins_with("sk", "ORDER#"),
            ]))
            .filter(Condition::size("items", Operator::Ge, 1))
            .scan_index_forward(false)
            .limit(2)
            .execute(&runner)
            .await
            .unwrap();
        assert_eq!(response.count, Some(2));
        assert!(response.last_evaluated_key.is_some());
        assert_eq!(
            response.items[0]["sk"].as_s(),
            Some("PROFILE"),
            "descending order starts from the largest sort key"
        );

        let OperationDef::Query(sent) = &runner.operations()[5] else {
            panic!("expected a query");
        };
        assert_eq!(
            sent.key_condition_expression,
            "(#pk_0 = :pk_0 AND begins_with(#sk_1, :sk_1))"
        );
        assert_eq!(sent.filter_expression.as_deref(), Some("size(#items_2) >= :items_2"));
    }

    #[tokio::test]
    async fn test_should_scan_with_projection() {
        let (table, runner) = seeded().await;

        let response = table
            .scan()
            .filter(Condition::between("total", 10, 50))
            .projection(["pk", "sk", "total"])
            .execute(&runner)
            .await
            .unwrap();
        assert_eq!(response.count, Some(5));

        let OperationDef::Scan(sent) = runner.operations().pop().unwrap() else {
            panic!("expected a scan");
        };
        assert_eq!(
            sent.filter_expression.as_deref(),
            Some("#total_0 BETWEEN :total_0_v0 AND :total_0_v1")
        );
        assert_eq!(sent.projection_expression.as_deref(), Some("#pk, #sk, #total"));
    }

    #[tokio::test]
    async fn test_should_compile_index_query_against_index_schema() {
        let table = shop_table(DecodeMode::Strict);
        let op = table
            .query()
            .index("by_email")
            .key_condition(Condition::eq("email", "carol@example.com"))
            .projection(["pk", "name"])
            .build()
            .unwrap();
        let OperationDef::Query(query) = op else {
            panic!("expected a query");
        };
        assert_eq!(query.index_name.as_deref(), Some("by_email"));
        assert_eq!(query.key_condition_expression, "#email_0 = :email_0");

        let err = table
            .query()
            .index("by_email")
            .key_condition(Condition::eq("pk", "USER#carol"))
            .build()
            .unwrap_err();
        assert!(matches!(err, dynaql_core::Error::InvalidCondition { .. }));
    }
}
