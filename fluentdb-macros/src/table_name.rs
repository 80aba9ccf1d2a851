use syn::{ItemStruct, LitStr, parse::ParseBuffer};

/// `#[model(table = "...")]` on the struct itself.
pub(crate) fn table_name(item: &ItemStruct) -> Option<String> {
    let mut result = None;
    for attr in item.attrs.iter().filter(|v| v.meta.path().is_ident("model")) {
        let Ok(list) = attr.meta.require_list() else {
            panic!("Error while parsing `model`, use it like: `#[model(table = \"my_table\")]`");
        };
        let _ = list.parse_nested_meta(|arg| {
            if !arg.path.is_ident("table") {
                panic!("Only `table` can be given to `model` on a struct");
            }
            let Ok(v) = arg.value().and_then(ParseBuffer::parse::<LitStr>) else {
                panic!("Error while parsing `table`, use it like: `#[model(table = \"my_table\")]`");
            };
            result = Some(v.value());
            Ok(())
        });
    }
    result
}
