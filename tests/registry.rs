mod common;

#[cfg(test)]
mod tests {
    use crate::common::RecordingDriver;
    use fluentdb::{Config, Dialect, Model, instance, load, loaded, register_driver, try_load};

    #[derive(Model, Default, Clone)]
    struct Setting {
        #[model(type = "varchar(64), primary")]
        key: String,
        value: String,
    }

    #[tokio::test]
    async fn load_registered_driver() {
        let error = try_load(Config::default()).await.unwrap_err();
        assert!(format!("{:#}", error).contains("register_driver"));
        assert!(loaded().is_err());
        assert!(instance().is_err());

        register_driver(RecordingDriver(Dialect::MySql));
        let db = load(Config {
            debug: true,
            ..Default::default()
        })
        .await;
        assert!(db.config().debug);
        assert_eq!(db.connection().dialect(), Dialect::MySql);
        assert_eq!(loaded().unwrap().config(), db.config());
        let affected = instance()
            .unwrap()
            .update(&mut Setting {
                key: "theme".into(),
                value: "dark".into(),
            })
            .await
            .unwrap();
        assert_eq!(affected, 1);
        db.close().await.unwrap();
    }
}
