use crate::schema::recreate;
use fluentdb::{Database, Model, Value, WhereOpt};
use indoc::indoc;

#[derive(Model, Default, Debug, Clone, PartialEq)]
#[model(table = "order_items")]
pub struct OrderItem {
    #[model(type = "primary")]
    pub order_id: i64,
    #[model(type = "primary")]
    pub product_id: i64,
    pub quantity: i32,
}

fn item(order_id: i64, product_id: i64, quantity: i32) -> OrderItem {
    OrderItem {
        order_id,
        product_id,
        quantity,
    }
}

pub async fn orders(db: &Database) {
    let ddl = indoc! {"
        CREATE TABLE order_items (
            order_id BIGINT NOT NULL,
            product_id BIGINT NOT NULL,
            quantity INTEGER NOT NULL,
            PRIMARY KEY (order_id, product_id)
        )
    "};
    recreate(db, "order_items", ddl, ddl).await;

    let mut items = vec![item(1, 1, 2), item(1, 2, 1), item(2, 1, 4)];
    let created = db
        .model()
        .create_batch(&mut items)
        .await
        .expect("Failed to create the order items");
    assert_eq!(created, 3);
    assert_eq!(items[1], item(1, 2, 1));

    // Both key columns are part of the WHERE
    let affected = db
        .model()
        .delete(&item(1, 2, 0))
        .await
        .expect("Failed to delete one order item");
    assert_eq!(affected, 1);
    let mut found: Vec<OrderItem> = Vec::new();
    let total = db
        .model()
        .r#where("order_id", WhereOpt::Eq, 1_i64)
        .find(&mut found)
        .await
        .expect("Failed to find the items of order 1");
    assert_eq!(total, 1);
    assert_eq!(found, vec![item(1, 1, 2)]);

    let affected = db
        .model()
        .update(&mut item(1, 1, 5))
        .await
        .expect("Failed to update the quantity");
    assert_eq!(affected, 1);
    let mut read = item(1, 1, 0);
    db.model()
        .first(&mut read)
        .await
        .expect("Failed to read the item back");
    assert_eq!(read.quantity, 5);

    // A failing row does not stop the batch
    let mut batch = vec![item(1, 1, 9), item(3, 1, 1)];
    let error = crate::silent_logs! {
        db.model()
            .create_batch(&mut batch)
            .await
            .expect_err("The duplicate key must fail")
    };
    let message = format!("{:#}", error);
    assert!(message.contains("1 of 2 rows"), "{}", message);
    assert_eq!(
        db.model()
            .count::<OrderItem>()
            .await
            .expect("Failed to count"),
        3
    );

    // Partial key
    let affected = db
        .model()
        .delete(&OrderItem {
            order_id: 2,
            ..Default::default()
        })
        .await
        .expect("Failed to delete order 2");
    assert_eq!(affected, 1);
    let affected = db
        .model()
        .delete_by_key(&OrderItem::default(), Value::list([1_i64, 3]))
        .await
        .expect("Failed to delete orders 1 and 3");
    assert_eq!(affected, 2);
    assert_eq!(
        db.model()
            .count::<OrderItem>()
            .await
            .expect("Failed to count"),
        0
    );
}
