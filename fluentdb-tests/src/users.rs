use crate::schema::{arg, recreate};
use fluentdb::{Database, Model, OrderByDir, Value, WhereOpt, is_missing_where, is_not_found};
use indoc::indoc;

#[derive(Model, Default, Debug, Clone, PartialEq)]
#[model(table = "users")]
pub struct User {
    #[model(type = "serial,primary")]
    pub id: i64,
    #[model(type = "varchar(255)")]
    pub name: String,
    pub age: i32,
    pub email: Option<String>,
}

pub async fn users(db: &Database) {
    recreate(
        db,
        "users",
        indoc! {"
            CREATE TABLE users (
                id BIGSERIAL PRIMARY KEY,
                name VARCHAR(255) NOT NULL,
                age INTEGER NOT NULL,
                email VARCHAR(255)
            )
        "},
        indoc! {"
            CREATE TABLE users (
                id BIGINT AUTO_INCREMENT PRIMARY KEY,
                name VARCHAR(255) NOT NULL,
                age INTEGER NOT NULL,
                email VARCHAR(255)
            )
        "},
    )
    .await;

    // Insert then filtered read
    let mut kite = User {
        name: "Kite".into(),
        age: 42,
        ..Default::default()
    };
    db.model()
        .create(&mut kite)
        .await
        .expect("Failed to create Kite");
    assert!(kite.id > 0);
    let mut found: Vec<User> = Vec::new();
    let total = db
        .model()
        .r#where("age", WhereOpt::Eq, 42)
        .find(&mut found)
        .await
        .expect("Failed to find age 42");
    assert_eq!(total, 1);
    assert_eq!(found, vec![kite.clone()]);
    let total = db
        .model()
        .r#where("age", WhereOpt::Eq, 43)
        .find(&mut found)
        .await
        .expect("Finding nothing is not an error");
    assert_eq!(total, 0);
    assert!(found.is_empty());

    // Read back by primary key
    let mut read = User {
        id: kite.id,
        ..Default::default()
    };
    db.model()
        .first(&mut read)
        .await
        .expect("Failed to read Kite back");
    assert_eq!(read, kite);

    // Batch
    let mut batch: Vec<User> = (20..30)
        .map(|age| User {
            name: format!("user {age}"),
            age,
            email: (age % 2 == 0).then(|| format!("user{age}@example.com")),
            ..Default::default()
        })
        .collect();
    let created = db
        .model()
        .create_batch(&mut batch)
        .await
        .expect("Failed to create the batch");
    assert_eq!(created, 10);
    assert!(batch.iter().all(|u| u.id > kite.id));

    // Pagination and count
    let matching = db
        .model()
        .r#where("age", WhereOpt::Between, Value::list([20, 29]))
        .count::<User>()
        .await
        .expect("Failed to count");
    assert_eq!(matching, 10);
    for offset in 0..=matching {
        let mut page: Vec<User> = Vec::new();
        let total = db
            .model()
            .r#where("age", WhereOpt::Between, Value::list([20, 29]))
            .order_by("age", OrderByDir::Asc)
            .limit(3, offset)
            .find(&mut page)
            .await
            .expect("Failed to read a page");
        assert_eq!(total, matching);
        assert!(page.len() <= 3);
        assert_eq!(page.len() as u64, 3.min(matching - offset));
        if let Some(first) = page.first() {
            assert_eq!(first.age as u64, 20 + offset);
        }
    }
    let mut page: Vec<User> = Vec::new();
    db.model()
        .limit(2, 0)
        .fetch(4, 3)
        .order_by("id", OrderByDir::Asc)
        .find(&mut page)
        .await
        .expect("Failed to fetch");
    assert_eq!(page.len(), 3);
    assert_eq!(page[0].id, batch[3].id);

    // Zero values never filter
    let everyone = db.model().count::<User>().await.expect("Failed to count");
    assert_eq!(everyone, 11);
    let total = db
        .model()
        .model(&User::default())
        .find(&mut found)
        .await
        .expect("Failed to find with an empty model");
    assert_eq!(total, everyone);
    let total = db
        .model()
        .model(&User {
            name: "user 25".into(),
            ..Default::default()
        })
        .find(&mut found)
        .await
        .expect("Failed to find with a model filter");
    assert_eq!(total, 1);
    assert_eq!(found[0].age, 25);

    // The builder forgets everything after a terminal call
    let mut builder = db.model();
    let mut first: Vec<User> = Vec::new();
    let mut second: Vec<User> = Vec::new();
    builder
        .r#where("age", WhereOpt::Eq, 42)
        .find(&mut first)
        .await
        .expect("Failed the filtered find");
    builder
        .find(&mut second)
        .await
        .expect("Failed the unfiltered find");
    assert_eq!(first.len(), 1);
    assert_eq!(second.len() as u64, everyone);

    // Groups
    let total = db
        .model()
        .r#where("email", WhereOpt::NotNull, Value::Null)
        .where_group(|group| {
            group
                .r#where("age", WhereOpt::Lesser, 22)
                .where_or("age", WhereOpt::Greater, 27);
        })
        .find(&mut found)
        .await
        .expect("Failed the grouped find");
    assert_eq!(total, 2);
    assert!(found.iter().all(|u| u.age == 20 || u.age == 28));
    let total = db
        .model()
        .r#where("age", WhereOpt::In, Value::list([21, 23, 99]))
        .when(false, |w| {
            w.r#where("age", WhereOpt::Eq, 21);
        })
        .find(&mut found)
        .await
        .expect("Failed the IN find");
    assert_eq!(total, 2);

    // Select and omit
    let mut partial = User::default();
    db.model()
        .select(["id", "name"])
        .r#where("id", WhereOpt::Eq, kite.id)
        .first(&mut partial)
        .await
        .expect("Failed the partial read");
    assert_eq!(partial.name, "Kite");
    assert_eq!(partial.age, 0);
    let mut partial: Vec<User> = Vec::new();
    db.model()
        .omit(["email"])
        .r#where("age", WhereOpt::Eq, 20)
        .find(&mut partial)
        .await
        .expect("Failed the read without email");
    assert_eq!(partial.len(), 1);
    assert_eq!(partial[0].email, None);

    // First and last
    let mut user = User::default();
    db.model()
        .first(&mut user)
        .await
        .expect("Failed to read the first user");
    assert_eq!(user, kite);
    let mut user = User::default();
    db.model()
        .last(&mut user)
        .await
        .expect("Failed to read the last user");
    assert_eq!(user.id, batch[9].id);
    let mut user = User::default();
    db.model()
        .take(&mut user)
        .await
        .expect("Failed to take a user");
    assert!(user.id > 0);
    let mut missing = User {
        id: batch[9].id + 1000,
        ..Default::default()
    };
    let error = db
        .model()
        .first(&mut missing)
        .await
        .expect_err("There is no such user");
    assert!(is_not_found(&error));

    // Raw
    let mut adults: Vec<User> = Vec::new();
    let total = db
        .model()
        .raw(
            format!("SELECT * FROM users WHERE age >= {}", arg(db, 1)),
            vec![Value::Int32(Some(28))],
        )
        .find(&mut adults)
        .await
        .expect("Failed the raw find");
    assert_eq!(total, 3);
    assert_eq!(adults.len(), 3);

    // Update
    kite.age = 43;
    kite.email = Some("kite@example.com".into());
    let affected = db
        .model()
        .update(&mut kite)
        .await
        .expect("Failed to update Kite");
    assert_eq!(affected, 1);
    let mut read = User {
        id: kite.id,
        ..Default::default()
    };
    db.model()
        .first(&mut read)
        .await
        .expect("Failed to read Kite back");
    assert_eq!(read, kite);
    let affected = db
        .model()
        .r#where("age", WhereOpt::Between, Value::list([28, 29]))
        .omit(["name", "email"])
        .update(&mut User {
            age: 30,
            ..Default::default()
        })
        .await
        .expect("Failed the conditional update");
    assert_eq!(affected, 2);

    // Nothing is touched without a WHERE
    let error = db
        .model()
        .update(&mut User {
            name: "everyone".into(),
            ..Default::default()
        })
        .await
        .expect_err("Update without a key must fail");
    assert!(is_missing_where(&error));
    let error = db
        .model()
        .delete(&User::default())
        .await
        .expect_err("Delete without a key must fail");
    assert!(is_missing_where(&error));
    assert_eq!(
        db.model().count::<User>().await.expect("Failed to count"),
        everyone
    );

    // Delete
    let affected = db
        .model()
        .delete_by_key(&User::default(), Value::list([batch[0].id, batch[1].id]))
        .await
        .expect("Failed to delete by key");
    assert_eq!(affected, 2);
    let affected = db
        .model()
        .delete(&kite)
        .await
        .expect("Failed to delete Kite");
    assert_eq!(affected, 1);
    let mut gone = User {
        id: kite.id,
        ..Default::default()
    };
    assert!(is_not_found(
        &db.model()
            .first(&mut gone)
            .await
            .expect_err("Kite was deleted")
    ));
    assert_eq!(
        db.model().count::<User>().await.expect("Failed to count"),
        everyone - 3
    );
}
