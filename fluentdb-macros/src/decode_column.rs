use fluentdb_core::{Action, PrimaryKeyType, to_snake_case};
use proc_macro2::TokenStream;
use quote::{ToTokens, quote};
use syn::{Field, Ident, LitStr, Type, parse::ParseBuffer};

#[derive(Debug)]
pub(crate) struct ColumnMetadata {
    pub(crate) ident: Ident,
    pub(crate) name: String,
    pub(crate) column_type: String,
    pub(crate) primary: bool,
    pub(crate) primary_key: PrimaryKeyType,
    pub(crate) serial: bool,
    /// (table, column)
    pub(crate) references: Option<(String, String)>,
    pub(crate) on_delete: Option<Action>,
    pub(crate) on_update: Option<Action>,
    pub(crate) relation: Option<String>,
}

impl ColumnMetadata {
    pub(crate) fn encode_def(&self) -> TokenStream {
        let key = self.ident.to_string();
        let name = &self.name;
        let column_type = &self.column_type;
        let primary_key = self.primary_key;
        let serial = self.serial;
        let references = match &self.references {
            Some((table, column)) => quote! {
                Some(::fluentdb::ColumnRef { name: #column, table: #table })
            },
            None => quote!(None),
        };
        let action = |v: Option<Action>| match v {
            Some(v) => quote!(Some(#v)),
            None => quote!(None),
        };
        let on_delete = action(self.on_delete);
        let on_update = action(self.on_update);
        let relation = match &self.relation {
            Some(v) => quote!(Some(#v)),
            None => quote!(None),
        };
        quote! {
            ::fluentdb::ColumnDef {
                key: #key,
                name: #name,
                column_type: #column_type,
                primary_key: #primary_key,
                serial: #serial,
                references: #references,
                on_delete: #on_delete,
                on_update: #on_update,
                relation: #relation,
            }
        }
    }
}

/// What a field of the derived struct turns into.
pub(crate) enum Decoded {
    Column(ColumnMetadata),
    /// `MetaData` marker, may carry the table name.
    Meta(Option<String>),
    Skip,
}

/// Declared type tokens: upper cased and space terminated, `primary` becomes `PRIMARY KEY`.
pub(crate) fn column_type(declared: &str) -> (String, bool, bool) {
    let mut result = String::new();
    let (mut primary, mut serial) = (false, false);
    for token in declared.split(',').map(str::trim).filter(|v| !v.is_empty()) {
        match token.to_ascii_lowercase().as_str() {
            "primary" => {
                primary = true;
                result.push_str("PRIMARY KEY");
            }
            "serial" => {
                serial = true;
                result.push_str("SERIAL");
            }
            _ => result.push_str(&token.to_uppercase()),
        }
        result.push(' ');
    }
    (result, primary, serial)
}

/// Referenced column of a foreign key named `column`: `user_id` points to `id`.
pub(crate) fn referenced_column(column: &str) -> String {
    match column.split_once('_') {
        Some((_, rest)) if !rest.is_empty() => rest.to_string(),
        _ => "id".to_string(),
    }
}

fn is_meta_data(ty: &Type) -> bool {
    matches!(ty, Type::Path(path) if path.path.segments.last().is_some_and(|v| v.ident == "MetaData"))
}

fn string_arg(arg: &syn::meta::ParseNestedMeta, name: &str) -> String {
    let Ok(v) = arg.value().and_then(ParseBuffer::parse::<LitStr>) else {
        panic!("Error while parsing `{name}`, use it like: `#[model({name} = \"...\")]`");
    };
    v.value()
}

pub(crate) fn decode_column(field: &Field) -> Decoded {
    let ident = field
        .ident
        .clone()
        .expect("Model fields are expected to have a name");
    let meta = is_meta_data(&field.ty);
    let mut table = None;
    let mut skip = false;
    let mut declared = String::new();
    let mut name = None;
    let mut reference = None;
    let mut reference_column = None;
    let mut cascade = String::new();
    let mut relation = None;
    for attr in &field.attrs {
        if !attr.meta.path().is_ident("model") {
            continue;
        }
        let Ok(list) = attr.meta.require_list() else {
            panic!("Error while parsing `model`, use it like: `#[model(attribute = value, ...)]`");
        };
        let _ = list.parse_nested_meta(|arg| {
            if arg.path.is_ident("table") {
                table = Some(string_arg(&arg, "table"));
            } else if arg.path.is_ident("type") {
                declared = string_arg(&arg, "type");
            } else if arg.path.is_ident("name") {
                name = Some(string_arg(&arg, "name"));
            } else if arg.path.is_ident("ref") {
                reference = Some(to_snake_case(&string_arg(&arg, "ref")));
            } else if arg.path.is_ident("ref_column") {
                reference_column = Some(string_arg(&arg, "ref_column"));
            } else if arg.path.is_ident("cascade") {
                cascade = string_arg(&arg, "cascade");
            } else if arg.path.is_ident("rel") {
                relation = Some(string_arg(&arg, "rel"));
            } else if arg.path.is_ident("skip") {
                let Err(..) = arg.value() else {
                    panic!("Error while parsing `skip`, use it like: `#[model(skip)]`");
                };
                skip = true;
            } else {
                panic!(
                    "Unknown attribute `{}` inside model macro",
                    arg.path.to_token_stream()
                );
            }
            Ok(())
        });
    }
    if meta {
        return Decoded::Meta(table);
    }
    if table.is_some() {
        panic!("`table` belongs on the struct or on a `MetaData` field, not on `{ident}`");
    }
    if skip {
        return Decoded::Skip;
    }
    let name = name.unwrap_or_else(|| to_snake_case(&ident.to_string()));
    let (column_type, primary, serial) = column_type(&declared);
    let references = reference.map(|table| {
        let column = reference_column.unwrap_or_else(|| referenced_column(&name));
        (table, column)
    });
    let (mut on_delete, mut on_update) = (None, None);
    for token in cascade.split(',').map(str::trim).filter(|v| !v.is_empty()) {
        if token.eq_ignore_ascii_case("delete") {
            on_delete = Some(Action::Cascade);
        } else {
            on_update = Some(Action::Cascade);
        }
    }
    Decoded::Column(ColumnMetadata {
        ident,
        name,
        column_type,
        primary,
        primary_key: PrimaryKeyType::None,
        serial,
        references,
        on_delete,
        on_update,
        relation,
    })
}
