use crate::schema::recreate;
use fluentdb::{
    Database, Model,
    generic::{create_model, delete_model, update_model},
    is_missing_where, is_not_found,
};
use indoc::indoc;

#[derive(Model, Default, Debug, Clone, PartialEq)]
#[model(table = "accounts")]
pub struct Account {
    #[model(type = "serial,primary")]
    pub id: i64,
    pub owner: String,
    pub balance: i64,
}

async fn exists(db: &Database, id: i64) -> bool {
    let mut account = Account {
        id,
        ..Default::default()
    };
    match db.model().first(&mut account).await {
        Ok(()) => true,
        Err(e) if is_not_found(&e) => false,
        Err(e) => panic!("Failed to read account {id}: {e:#}"),
    }
}

pub async fn transaction(db: &Database) {
    recreate(
        db,
        "accounts",
        indoc! {"
            CREATE TABLE accounts (
                id BIGSERIAL PRIMARY KEY,
                owner VARCHAR(255) NOT NULL,
                balance BIGINT NOT NULL
            )
        "},
        indoc! {"
            CREATE TABLE accounts (
                id BIGINT AUTO_INCREMENT PRIMARY KEY,
                owner VARCHAR(255) NOT NULL,
                balance BIGINT NOT NULL
            )
        "},
    )
    .await;

    // Rollback
    let mut builder = db.model();
    assert!(!builder.in_transaction());
    builder.begin().await.expect("Failed to begin");
    assert!(builder.in_transaction());
    let mut ghost = Account {
        owner: "ghost".into(),
        balance: 10,
        ..Default::default()
    };
    builder
        .create(&mut ghost)
        .await
        .expect("Failed to create in the transaction");
    assert!(ghost.id > 0);
    assert!(builder.in_transaction(), "A terminal call keeps the transaction");
    let mut seen = Account {
        id: ghost.id,
        ..Default::default()
    };
    builder
        .first(&mut seen)
        .await
        .expect("The transaction sees its own rows");
    assert_eq!(seen, ghost);
    builder.rollback().await.expect("Failed to rollback");
    assert!(!builder.in_transaction());
    assert!(!exists(db, ghost.id).await);

    // Commit
    builder.begin().await.expect("Failed to begin");
    let mut saver = Account {
        owner: "saver".into(),
        balance: 100,
        ..Default::default()
    };
    builder
        .create(&mut saver)
        .await
        .expect("Failed to create in the transaction");
    builder.commit().await.expect("Failed to commit");
    assert!(exists(db, saver.id).await);

    // One transaction per builder
    builder.begin().await.expect("Failed to begin");
    assert!(builder.begin().await.is_err());
    builder.rollback().await.expect("Failed to rollback");
    builder.commit().await.expect("Commit without a transaction is a no-op");

    // Self contained writes
    let mut spender = Account {
        owner: "spender".into(),
        balance: 50,
        ..Default::default()
    };
    create_model(db, &mut spender)
        .await
        .expect("Failed to create the spender");
    assert!(exists(db, spender.id).await);
    spender.balance = 20;
    let affected = update_model(db, &mut spender)
        .await
        .expect("Failed to update the spender");
    assert_eq!(affected, 1);
    let mut read = Account {
        id: spender.id,
        ..Default::default()
    };
    db.model()
        .first(&mut read)
        .await
        .expect("Failed to read the spender");
    assert_eq!(read.balance, 20);
    let error = update_model(
        db,
        &mut Account {
            balance: 0,
            owner: "nobody".into(),
            ..Default::default()
        },
    )
    .await
    .expect_err("An update without a key must fail");
    assert!(is_missing_where(&error));
    let affected = delete_model(db, &spender)
        .await
        .expect("Failed to delete the spender");
    assert_eq!(affected, 1);
    assert!(!exists(db, spender.id).await);
    assert!(exists(db, saver.id).await);
}
