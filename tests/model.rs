#[cfg(test)]
mod tests {
    use fluentdb::{
        Action, ColumnRef, DbError, MAX_RELATION_DEPTH, MetaData, Model, PrimaryKeyType, RowLabeled,
        RowNames, Value,
    };

    #[derive(Model, Default, Debug, Clone, PartialEq)]
    struct OrderLine {
        #[model(type = "serial,primary")]
        id: i64,
        #[model(name = "qty")]
        quantity: u32,
        #[model(ref = "Order", cascade = "delete")]
        order_id: i64,
        #[model(ref = "Product", ref_column = "code")]
        product_code: String,
        #[model(skip)]
        cached_total: f64,
    }

    #[derive(Model, Default, Debug, Clone)]
    struct Named {
        #[model(table = "aliases")]
        _meta: MetaData,
        #[model(type = "varchar(64), primary")]
        alias: String,
    }

    #[derive(Model, Default, Debug, Clone)]
    #[model(table = "nodes")]
    struct Node {
        #[model(type = "serial,primary")]
        id: i64,
        #[model(rel = "Node")]
        children: Vec<Node>,
    }

    #[test]
    fn column_defs() {
        assert_eq!(OrderLine::table_name(), "order_line");
        let defs = OrderLine::column_defs();
        let names: Vec<_> = defs.iter().map(|v| v.name).collect();
        assert_eq!(names, ["id", "qty", "order_id", "product_code"]);
        assert_eq!(defs[0].column_type, "SERIAL PRIMARY KEY ");
        assert_eq!(defs[0].primary_key, PrimaryKeyType::PrimaryKey);
        assert!(defs[0].serial);
        assert_eq!(defs[1].key, "quantity");
        assert_eq!(
            defs[2].references,
            Some(ColumnRef {
                name: "id",
                table: "order",
            })
        );
        assert_eq!(defs[2].on_delete, Some(Action::Cascade));
        assert_eq!(defs[2].on_update, None);
        assert_eq!(
            defs[3].references,
            Some(ColumnRef {
                name: "code",
                table: "product",
            })
        );
        assert_eq!(OrderLine::primary_defs().len(), 1);
        assert!(OrderLine::column_def("qty").is_some());
        assert!(OrderLine::column_def("quantity").is_some());
        assert!(OrderLine::column_def("cached_total").is_none());

        assert_eq!(Named::table_name(), "aliases");
        assert_eq!(Named::column_defs().len(), 1);
        assert_eq!(Named::column_defs()[0].column_type, "VARCHAR(64) PRIMARY KEY ");
    }

    #[test]
    fn describe_values() {
        let line = OrderLine {
            quantity: 3,
            order_id: 8,
            ..Default::default()
        };
        let table = line.describe().unwrap();
        assert_eq!(table.name, "order_line");
        assert_eq!(table.primaries, [0]);
        assert_eq!(table.primary_serial, Some(0));
        assert!(table.has_data);
        let id = &table.columns[0];
        assert!(!id.has_value);
        assert_eq!(id.value, Value::Int64(None));
        let qty = table.column("qty").unwrap();
        assert_eq!(qty.value, Value::UInt32(Some(3)));
        assert!(!qty.is_not_data());
        // Foreign keys are not data
        assert!(table.column("order_id").unwrap().is_not_data());
        assert!(!OrderLine::default().describe().unwrap().has_data);
    }

    #[test]
    fn relations_stop_at_depth() {
        fn chain(depth: usize) -> Node {
            let mut node = Node {
                id: depth as i64 + 1,
                ..Default::default()
            };
            if depth > 0 {
                node.children.push(chain(depth - 1));
            }
            node
        }
        let table = chain(10).describe().unwrap();
        let mut levels = 0;
        let mut current = &table;
        while let Some(child) = current.relations.first() {
            levels += 1;
            current = child;
        }
        assert_eq!(levels, MAX_RELATION_DEPTH);
        assert_eq!(table.sql_columns().count(), 1);
        assert_eq!(
            table.columns.iter().filter(|c| c.def.is_relation()).count(),
            1
        );
        assert!(chain(10).describe_nested(0).unwrap().relations.is_empty());
    }

    #[test]
    fn assign_fields() {
        let mut line = OrderLine::default();
        line.set_field("qty", Value::Int64(Some(4))).unwrap();
        assert_eq!(line.quantity, 4);
        line.set_field("quantity", Value::Varchar(Some("5".into())))
            .unwrap();
        assert_eq!(line.quantity, 5);
        let error = line.set_field("cached_total", Value::Float64(Some(1.0)));
        assert!(matches!(
            error.unwrap_err().downcast_ref::<DbError>(),
            Some(DbError::InvalidModel(..))
        ));
        let error = line
            .set_field("qty", Value::Varchar(Some("many".into())))
            .unwrap_err();
        assert!(matches!(
            error.downcast_ref::<DbError>(),
            Some(DbError::UnsupportedFieldType { field, .. }) if field == "qty"
        ));
        let error = line.set_field("qty", Value::Int64(Some(-1))).unwrap_err();
        assert!(error.downcast_ref::<DbError>().is_some());
    }

    #[test]
    fn from_row_ignores_unknown_labels() {
        let labels: RowNames = ["id", "qty", "extra"].map(String::from).into();
        let row = RowLabeled::new(
            labels,
            [
                Value::Int64(Some(2)),
                Value::Int32(Some(6)),
                Value::Varchar(Some("ignored".into())),
            ]
            .into(),
        );
        let line = OrderLine::from_row(row).unwrap();
        assert_eq!(
            line,
            OrderLine {
                id: 2,
                quantity: 6,
                ..Default::default()
            }
        );
    }
}
