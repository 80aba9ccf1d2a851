mod common;

#[cfg(test)]
mod tests {
    use crate::common::database;
    use fluentdb::{
        Dialect, GetOne, Model, OrderByDir, Value, WhereOpt, is_missing_where, is_not_found,
    };
    use std::collections::BTreeMap;

    #[derive(Model, Default, Debug, Clone, PartialEq)]
    #[model(table = "users")]
    struct User {
        #[model(type = "serial,primary")]
        id: i64,
        name: String,
        age: i32,
        email: Option<String>,
    }

    #[derive(Model, Default, Debug, Clone, PartialEq)]
    #[model(table = "order_items")]
    struct OrderItem {
        #[model(type = "primary")]
        order_id: i64,
        #[model(type = "primary")]
        product_id: i64,
        quantity: i32,
    }

    fn kite() -> User {
        User {
            name: "Kite".into(),
            age: 42,
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn create_reads_back_the_key() {
        let (db, recorder) = database(Dialect::Postgres);
        recorder.push_result(&["id"], vec![vec![Value::Int64(Some(7))]]);
        let mut user = kite();
        db.model().create(&mut user).await.unwrap();
        assert_eq!(user.id, 7);
        let statement = recorder.last();
        assert_eq!(
            statement.sql,
            r#"INSERT INTO "users" ("name", "age", "email") VALUES ($1, $2, $3) RETURNING "id""#
        );
        assert_eq!(
            statement.values,
            vec![
                Value::Varchar(Some("Kite".into())),
                Value::Int32(Some(42)),
                Value::Varchar(None),
            ]
        );

        let (db, recorder) = database(Dialect::MySql);
        let mut users = vec![kite(), kite()];
        let created = db.model().create_batch(&mut users).await.unwrap();
        assert_eq!(created, 2);
        assert_eq!(users[0].id, 1);
        assert_eq!(users[1].id, 2);
        assert_eq!(
            recorder.sql()[0],
            "INSERT INTO `users` (`name`, `age`, `email`) VALUES (?, ?, ?)"
        );
    }

    #[tokio::test]
    async fn composite_key_is_the_where() {
        let (db, recorder) = database(Dialect::Postgres);
        let item = OrderItem {
            order_id: 1,
            product_id: 2,
            ..Default::default()
        };
        db.model().delete(&item).await.unwrap();
        let statement = recorder.last();
        assert_eq!(
            statement.sql,
            r#"DELETE FROM "order_items" WHERE "order_id" = $1 AND "product_id" = $2"#
        );
        assert_eq!(
            statement.values,
            vec![Value::Int64(Some(1)), Value::Int64(Some(2))]
        );
        let mut item = OrderItem {
            order_id: 1,
            product_id: 2,
            quantity: 5,
        };
        db.model().update(&mut item).await.unwrap();
        assert_eq!(
            recorder.last().sql,
            r#"UPDATE "order_items" SET "quantity" = $1 WHERE "order_id" = $2 AND "product_id" = $3"#
        );
        // No key is generated, the insert is not followed by a read
        db.model().create(&mut item).await.unwrap();
        assert_eq!(
            recorder.last().sql,
            r#"INSERT INTO "order_items" ("order_id", "product_id", "quantity") VALUES ($1, $2, $3)"#
        );
    }

    #[tokio::test]
    async fn no_where_no_statement() {
        let (db, recorder) = database(Dialect::Postgres);
        let error = db.model().delete(&User::default()).await.unwrap_err();
        assert!(is_missing_where(&error));
        let error = db.model().update(&mut kite()).await.unwrap_err();
        assert!(is_missing_where(&error));
        db.model()
            .delete_by_key(&OrderItem::default(), Value::list([3_i64, 4]))
            .await
            .unwrap();
        assert_eq!(
            recorder.last().sql,
            r#"DELETE FROM "order_items" WHERE "order_id" IN ($1, $2)"#
        );
        recorder.clear();
        let error = db.model().delete(&OrderItem::default()).await.unwrap_err();
        assert!(is_missing_where(&error));
        assert!(recorder.sql().is_empty());

        // A chained condition is enough
        db.model()
            .r#where("age", WhereOpt::Lesser, 18)
            .delete(&User::default())
            .await
            .unwrap();
        assert_eq!(recorder.last().sql, r#"DELETE FROM "users" WHERE "age" < $1"#);
    }

    #[tokio::test]
    async fn update_columns() {
        let (db, recorder) = database(Dialect::Postgres);
        let mut user = User {
            id: 3,
            ..kite()
        };
        db.model().update(&mut user).await.unwrap();
        assert_eq!(
            recorder.last().sql,
            r#"UPDATE "users" SET "name" = $1, "age" = $2, "email" = $3 WHERE "id" = $4"#
        );
        db.model()
            .omit(["email"])
            .r#where("age", WhereOpt::GrEq, 40)
            .update(&mut user)
            .await
            .unwrap();
        assert_eq!(
            recorder.last().sql,
            r#"UPDATE "users" SET "name" = $1, "age" = $2 WHERE "id" = $3 AND "age" >= $4"#
        );
        let affected = db
            .model()
            .select(["age"])
            .update(&mut user)
            .await
            .unwrap();
        assert_eq!(affected, 1);
        assert_eq!(
            recorder.last().sql,
            r#"UPDATE "users" SET "age" = $1 WHERE "id" = $2"#
        );
        let error = db
            .model()
            .omit(["name", "age", "email"])
            .update(&mut user)
            .await
            .unwrap_err();
        assert!(error.to_string().contains("no column to update"));
    }

    #[tokio::test]
    async fn keyed_writes() {
        let (db, recorder) = database(Dialect::MySql);
        let mut user = User::default();
        let fields = BTreeMap::from([
            ("name".to_string(), Value::from("Kite")),
            ("age".to_string(), Value::Int64(Some(42))),
            ("email".to_string(), Value::Null),
        ]);
        db.model().create_keyed(&mut user, fields).await.unwrap();
        assert_eq!(user.name, "Kite");
        assert_eq!(user.age, 42);
        assert_eq!(user.id, 1);
        let fields = BTreeMap::from([("nickname".to_string(), Value::from("K"))]);
        assert!(db.model().update_keyed(&mut user, fields).await.is_err());
        assert_eq!(recorder.sql().len(), 1);
    }

    #[tokio::test]
    async fn single_reads() {
        let (db, recorder) = database(Dialect::Postgres);
        recorder.push_result(
            &["id", "name", "age", "email"],
            vec![vec![
                Value::Int64(Some(3)),
                Value::Varchar(Some("Kite".into())),
                Value::Int32(Some(42)),
                Value::Varchar(None),
            ]],
        );
        let mut user = User {
            id: 3,
            ..Default::default()
        };
        db.model().first(&mut user).await.unwrap();
        assert_eq!(
            recorder.last().sql,
            r#"SELECT * FROM "users" WHERE "id" = $1 ORDER BY "id" ASC LIMIT $2"#
        );
        assert_eq!(user, User { id: 3, ..kite() });

        let mut user = User {
            name: "Kite".into(),
            ..Default::default()
        };
        let error = db.model().last(&mut user).await.unwrap_err();
        assert!(is_not_found(&error));
        assert_eq!(
            recorder.last().sql,
            r#"SELECT * FROM "users" WHERE "name" = $1 ORDER BY "id" DESC LIMIT $2"#
        );

        let error = db
            .model()
            .get(&mut User::default(), GetOne::Take)
            .await
            .unwrap_err();
        assert!(is_not_found(&error));
        assert!(recorder.last().sql.contains("ORDER BY"));

        // Pagination applies to single reads as well
        let _ = db.model().limit(1, 5).first(&mut User::default()).await;
        assert_eq!(
            recorder.last().sql,
            r#"SELECT * FROM "users" ORDER BY "id" ASC LIMIT $1 OFFSET $2"#
        );
        assert_eq!(
            recorder.last().values,
            vec![Value::UInt64(Some(1)), Value::UInt64(Some(5))]
        );
    }

    #[tokio::test]
    async fn find_counts_without_pagination() {
        let (db, recorder) = database(Dialect::Postgres);
        recorder.push_result(
            &["id", "name", "age", "email"],
            vec![
                vec![
                    Value::Int64(Some(1)),
                    Value::Varchar(Some("a".into())),
                    Value::Int32(Some(30)),
                    Value::Varchar(None),
                ],
                vec![
                    Value::Int64(Some(2)),
                    Value::Varchar(Some("b".into())),
                    Value::Int32(Some(31)),
                    Value::Varchar(Some("b@example.com".into())),
                ],
            ],
        );
        recorder.push_result(&["total"], vec![vec![Value::Int64(Some(12))]]);
        let mut users = Vec::new();
        let total = db
            .model()
            .r#where("age", WhereOpt::Greater, 20)
            .order_by("age", OrderByDir::Desc)
            .limit(2, 4)
            .find::<User>(&mut users)
            .await
            .unwrap();
        assert_eq!(total, 12);
        assert_eq!(users.len(), 2);
        assert_eq!(users[1].email.as_deref(), Some("b@example.com"));
        let sql = recorder.sql();
        assert_eq!(
            sql[0],
            r#"SELECT * FROM "users" WHERE "age" > $1 ORDER BY "age" DESC LIMIT $2 OFFSET $3"#
        );
        assert_eq!(
            sql[1],
            r#"SELECT COUNT(*) AS "total" FROM (SELECT * FROM "users" WHERE "age" > $1 ORDER BY "age" DESC) AS "_result_out_""#
        );

        // FETCH wins over LIMIT
        recorder.clear();
        db.model()
            .limit(2, 0)
            .fetch(4, 3)
            .find::<User>(&mut users)
            .await
            .unwrap();
        assert_eq!(
            recorder.sql()[0],
            r#"SELECT * FROM "users" LIMIT $1 OFFSET $2"#
        );
        assert_eq!(
            recorder.statements.lock()[0].values,
            vec![Value::UInt64(Some(3)), Value::UInt64(Some(4))]
        );
        assert!(users.is_empty());
    }

    #[tokio::test]
    async fn terminal_calls_reset() {
        let (db, recorder) = database(Dialect::MySql);
        let mut builder = db.model();
        let mut users = Vec::new();
        builder
            .r#where("age", WhereOpt::Eq, 42)
            .select(["name"])
            .find::<User>(&mut users)
            .await
            .unwrap();
        builder.find::<User>(&mut users).await.unwrap();
        let sql = recorder.sql();
        assert_eq!(sql[0], "SELECT `name` FROM `users` WHERE `age` = ?");
        assert_eq!(sql[2], "SELECT * FROM `users`");
        builder.reset().reset();
        builder.count::<User>().await.unwrap();
        assert_eq!(
            recorder.last().sql,
            "SELECT COUNT(*) AS `total` FROM (SELECT * FROM `users`) AS `_result_out_`"
        );
    }

    #[tokio::test]
    async fn model_filters_only_non_zero_fields() {
        let (db, recorder) = database(Dialect::Postgres);
        let mut users = Vec::new();
        db.model()
            .model(&User::default())
            .find::<User>(&mut users)
            .await
            .unwrap();
        assert_eq!(recorder.sql()[0], r#"SELECT * FROM "users""#);
        recorder.clear();
        db.model()
            .model(&User {
                age: 42,
                // Present, even if empty
                email: Some(String::new()),
                ..Default::default()
            })
            .r#where("name", WhereOpt::Like, "K%")
            .find::<User>(&mut users)
            .await
            .unwrap();
        assert_eq!(
            recorder.sql()[0],
            r#"SELECT * FROM "users" WHERE "name" LIKE $1 AND ("age" = $2 AND "email" = $3)"#
        );
    }

    #[tokio::test]
    async fn when_appends_flat() {
        let (db, recorder) = database(Dialect::Postgres);
        let mut users = Vec::new();
        db.model()
            .r#where("age", WhereOpt::Greater, 18)
            .when(true, |w| {
                w.where_or("name", WhereOpt::Eq, "Kite");
            })
            .when(false, |w| {
                w.r#where("email", WhereOpt::Null, fluentdb::Operand::None);
            })
            .find::<User>(&mut users)
            .await
            .unwrap();
        assert_eq!(
            recorder.sql()[0],
            r#"SELECT * FROM "users" WHERE "age" > $1 OR "name" = $2"#
        );
    }

    #[tokio::test]
    async fn raw_statements() {
        let (db, recorder) = database(Dialect::Postgres);
        recorder.push_result(&["id"], vec![vec![Value::Int64(Some(9))]]);
        let mut user = kite();
        db.model()
            .raw(
                "INSERT INTO users (name, age) VALUES ($1, $2);",
                vec![Value::from("Kite"), Value::Int32(Some(42))],
            )
            .create(&mut user)
            .await
            .unwrap();
        assert_eq!(user.id, 9);
        assert_eq!(
            recorder.last().sql,
            "INSERT INTO users (name, age) VALUES ($1, $2) RETURNING id"
        );
        let affected = db
            .model()
            .raw("UPDATE users SET age = age + 1", Vec::new())
            .exec()
            .await
            .unwrap();
        assert_eq!(affected, 1);
        assert!(db.model().exec().await.is_err());
    }

    #[tokio::test]
    async fn transaction_wraps_statements() {
        let (db, recorder) = database(Dialect::MySql);
        let mut builder = db.model();
        builder.begin().await.unwrap();
        assert!(builder.begin().await.is_err());
        builder.create(&mut kite()).await.unwrap();
        assert!(builder.in_transaction());
        builder.commit().await.unwrap();
        assert!(!builder.in_transaction());
        builder.begin().await.unwrap();
        builder
            .delete(&User {
                id: 1,
                ..Default::default()
            })
            .await
            .unwrap();
        builder.rollback().await.unwrap();
        builder.rollback().await.unwrap();
        let sql = recorder.sql();
        assert_eq!(sql.len(), 6);
        assert_eq!(sql[0], "BEGIN");
        assert!(sql[1].starts_with("INSERT INTO `users`"));
        assert_eq!(sql[2], "COMMIT");
        assert_eq!(sql[3], "BEGIN");
        assert_eq!(sql[4], "DELETE FROM `users` WHERE `id` = ?");
        assert_eq!(sql[5], "ROLLBACK");
    }

    #[tokio::test]
    async fn joins_and_groups() {
        let (db, recorder) = database(Dialect::Postgres);
        let mut users = Vec::new();
        db.model()
            .select(["users.name", "COUNT(posts.id) AS posts"])
            .join(
                fluentdb::JoinType::Left,
                "posts p",
                fluentdb::Condition::new("p.user_id", WhereOpt::Eq, fluentdb::col("users.id")),
            )
            .group_by(["users.name"])
            .having("COUNT(posts.id)", WhereOpt::Greater, 2)
            .find::<User>(&mut users)
            .await
            .unwrap();
        assert_eq!(
            recorder.sql()[0],
            r#"SELECT "users"."name", COUNT(posts.id) AS posts FROM "users" LEFT JOIN "posts" AS "p" ON "p"."user_id" = "users"."id" GROUP BY "users"."name" HAVING (COUNT(posts.id)) > $1"#
        );
    }
}
