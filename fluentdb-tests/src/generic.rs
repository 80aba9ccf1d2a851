use crate::schema::recreate;
use fluentdb::{
    Condition, Database, Model, OrderByDir, Value, WhereOpt,
    generic::{
        AcceptedOrders, Filter, find_models, get_model, get_model_by, get_model_by_id,
        get_model_filtered, get_model_where_eq, list_models, process_order_by,
    },
    is_not_found, null,
};
use indoc::indoc;
use std::collections::BTreeMap;

#[derive(Model, Default, Debug, Clone, PartialEq)]
#[model(table = "products")]
pub struct Product {
    #[model(type = "serial,primary")]
    pub id: i64,
    pub name: String,
    pub price: i64,
    pub category: String,
    pub note: Option<String>,
}

fn product(name: &str, price: i64, category: &str, note: Option<&str>) -> Product {
    Product {
        name: name.into(),
        price,
        category: category.into(),
        note: null::string_nil(note.map(Into::into)),
        ..Default::default()
    }
}

fn names(products: &[Product]) -> Vec<&str> {
    products.iter().map(|p| p.name.as_str()).collect()
}

pub async fn generic(db: &Database) {
    recreate(
        db,
        "products",
        indoc! {"
            CREATE TABLE products (
                id BIGSERIAL PRIMARY KEY,
                name VARCHAR(255) NOT NULL,
                price BIGINT NOT NULL,
                category VARCHAR(255) NOT NULL,
                note VARCHAR(255)
            )
        "},
        indoc! {"
            CREATE TABLE products (
                id BIGINT AUTO_INCREMENT PRIMARY KEY,
                name VARCHAR(255) NOT NULL,
                price BIGINT NOT NULL,
                category VARCHAR(255) NOT NULL,
                note VARCHAR(255)
            )
        "},
    )
    .await;
    let mut products = vec![
        product("pen", 3, "office", None),
        product("desk", 150, "office", Some("heavy")),
        product("apple", 1, "food", None),
        product("bread", 2, "food", Some("fresh")),
        product("lamp", 40, "office", None),
    ];
    db.model()
        .create_batch(&mut products)
        .await
        .expect("Failed to create the products");

    // Single reads
    let pen: Product = get_model_by_id(db, products[0].id)
        .await
        .expect("Failed to get the pen by id");
    assert_eq!(pen, products[0]);
    let desk: Product = get_model_by(db, "name", "desk")
        .await
        .expect("Failed to get the desk by name");
    assert_eq!(desk.price, 150);
    assert_eq!(desk.note.as_deref(), Some("heavy"));
    let food: Product = get_model_where_eq(db, "category", "food")
        .await
        .expect("Failed to get some food");
    assert_eq!(food.name, "apple");
    let expensive: Product = get_model(db, [Condition::new("price", WhereOpt::Greater, 100_i64)])
        .await
        .expect("Failed to get an expensive product");
    assert_eq!(expensive.name, "desk");
    let error = get_model::<Product>(db, [Condition::new("price", WhereOpt::Greater, 1000_i64)])
        .await
        .expect_err("Nothing costs that much");
    assert!(is_not_found(&error));
    let plain: Product = get_model(
        db,
        [
            Condition::new("note", WhereOpt::Null, null::string_any(None)),
            Condition::new("category", WhereOpt::Eq, "food"),
        ],
    )
    .await
    .expect("Failed to get food without a note");
    assert_eq!(plain.name, "apple");

    // Pages
    let office = || [Condition::new("category", WhereOpt::Eq, "office")];
    let (page, total) = find_models::<Product>(db, 1, 2, "price", OrderByDir::Desc, office())
        .await
        .expect("Failed to read the first page");
    assert_eq!(total, 3);
    assert_eq!(names(&page), ["desk", "lamp"]);
    let (page, total) = find_models::<Product>(db, 2, 2, "price", OrderByDir::Desc, office())
        .await
        .expect("Failed to read the second page");
    assert_eq!(total, 3);
    assert_eq!(names(&page), ["pen"]);
    let (page, _) = find_models::<Product>(db, 0, 2, "price", OrderByDir::Desc, office())
        .await
        .expect("Failed to read page zero");
    assert_eq!(names(&page), ["desk", "lamp"]);
    let result = crate::silent_logs! {
        find_models::<Product>(db, 1, 2, "no_such_column", OrderByDir::Asc, office()).await
    };
    assert!(result.is_err());

    // Filtered
    let filters = [Filter::from([(
        "name".to_string(),
        Value::from("bread"),
    )])];
    let (page, total) = list_models::<Product>(db, 1, 10, "category", "food", &filters)
        .await
        .expect("Failed to list the food");
    assert_eq!(total, 1);
    assert_eq!(page[0].note, null::string("fresh"));
    let (page, total) = list_models::<Product>(db, 1, 10, "category", "food", &[])
        .await
        .expect("Failed to list the food");
    assert_eq!(total, 2);
    assert_eq!(page.len(), 2);
    let unknown = [Filter::from([("no_such_column".to_string(), Value::from(1_i64))])];
    let result = crate::silent_logs! {
        list_models::<Product>(db, 1, 10, "category", "food", &unknown).await
    };
    assert!(result.is_err());
    let mut lamp = Product::default();
    get_model_filtered(
        db,
        &mut lamp,
        "category",
        "office",
        &[Filter::from([("price".to_string(), Value::from(40_i64))])],
    )
    .await
    .expect("Failed to get the lamp");
    assert_eq!(lamp.name, "lamp");

    // Caller chosen order
    let mut sorted = Vec::new();
    let mut builder = db.model();
    process_order_by(
        &mut builder,
        "-price",
        AcceptedOrders::List(&["price", "name"]),
        None,
    );
    builder
        .find(&mut sorted)
        .await
        .expect("Failed the sorted find");
    assert_eq!(names(&sorted), ["desk", "lamp", "pen", "bread", "apple"]);
    let public: BTreeMap<String, String> = [("cost".to_string(), "price".to_string())].into();
    process_order_by(&mut builder, "cost", AcceptedOrders::Map(&public), None);
    builder
        .find(&mut sorted)
        .await
        .expect("Failed the mapped sort");
    assert_eq!(names(&sorted), ["apple", "bread", "pen", "lamp", "desk"]);
    process_order_by(
        &mut builder,
        "-secret",
        AcceptedOrders::List(&["price"]),
        Some(("name", OrderByDir::Asc)),
    );
    builder
        .find(&mut sorted)
        .await
        .expect("Failed the default sort");
    assert_eq!(names(&sorted), ["apple", "bread", "desk", "lamp", "pen"]);
}
