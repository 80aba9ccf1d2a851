mod decode_column;
mod table_name;

use decode_column::{Decoded, decode_column};
use fluentdb_core::PrimaryKeyType;
use proc_macro::TokenStream;
use quote::quote;
use syn::{ItemStruct, parse_macro_input};
use table_name::table_name;

/// Maps a struct with named fields to a table.
///
/// ```ignore
/// #[derive(Model, Default, Clone)]
/// #[model(table = "users")]
/// struct User {
///     #[model(type = "serial,primary")]
///     id: i64,
///     #[model(type = "varchar(255)")]
///     name: String,
///     age: i32,
///     #[model(rel = "Post")]
///     posts: Vec<Post>,
/// }
/// ```
#[proc_macro_derive(Model, attributes(model))]
pub fn derive_model(input: TokenStream) -> TokenStream {
    let item: ItemStruct = parse_macro_input!(input as ItemStruct);
    let name = &item.ident;
    let mut meta_table = None;
    let mut columns = Vec::new();
    for field in &item.fields {
        match decode_column(field) {
            Decoded::Column(column) => columns.push(column),
            Decoded::Meta(table) => meta_table = meta_table.or(table),
            Decoded::Skip => {}
        }
    }
    let table_name = table_name(&item).or(meta_table).unwrap_or_else(|| {
        fluentdb_core::to_snake_case(&name.to_string())
    });
    let primaries = columns.iter().filter(|c| c.primary).count();
    for column in columns.iter_mut().filter(|c| c.primary) {
        column.primary_key = if primaries == 1 {
            PrimaryKeyType::PrimaryKey
        } else {
            PrimaryKeyType::PartOfPrimaryKey
        };
    }
    if let Some(column) = columns.iter().find(|c| c.relation.is_some() && c.primary) {
        panic!("Relation `{}` cannot be part of the primary key", column.ident);
    }
    let defs_len = columns.len();
    let defs = columns.iter().map(|c| c.encode_def());
    let describe = columns.iter().enumerate().map(|(i, c)| {
        let ident = &c.ident;
        if c.relation.is_some() {
            quote! {
                table.push(::fluentdb::Column::relation(&defs[#i]));
                if depth > 0 {
                    ::fluentdb::Relation::describe_relation(
                        &self.#ident,
                        depth - 1,
                        &mut table.relations,
                    )?;
                }
            }
        } else {
            quote! {
                let (value, is_zero) = ::fluentdb::field_value(&self.#ident);
                table.push(::fluentdb::Column::new(&defs[#i], value, is_zero));
            }
        }
    });
    let assign = columns.iter().filter(|c| c.relation.is_none()).map(|c| {
        let ident = &c.ident;
        let key = ident.to_string();
        let column = &c.name;
        let pattern = if key == *column {
            quote!(#key)
        } else {
            quote!(#key | #column)
        };
        quote! {
            #pattern => {
                self.#ident = ::fluentdb::AsValue::try_from_value(value)
                    .map_err(|e| ::fluentdb::unsupported_field(#table_name, field, e))?;
                Ok(())
            }
        }
    });
    quote! {
        impl ::fluentdb::Model for #name {
            fn table_name() -> &'static str {
                #table_name
            }

            fn column_defs() -> &'static [::fluentdb::ColumnDef] {
                static DEFS: [::fluentdb::ColumnDef; #defs_len] = [#(#defs),*];
                &DEFS
            }

            fn describe_nested(&self, depth: usize) -> ::fluentdb::Result<::fluentdb::Table> {
                let defs = <Self as ::fluentdb::Model>::column_defs();
                let mut table = ::fluentdb::Table::new(#table_name);
                #(#describe)*
                table.finish()
            }

            fn set_field(
                &mut self,
                field: &str,
                value: ::fluentdb::Value,
            ) -> ::fluentdb::Result<()> {
                match field {
                    #(#assign)*
                    _ => Err(::fluentdb::DbError::InvalidModel(format!(
                        "`{}` has no field `{}`",
                        #table_name, field
                    ))
                    .into()),
                }
            }
        }

        impl ::fluentdb::Relation for #name {
            fn describe_relation(
                &self,
                depth: usize,
                out: &mut Vec<::fluentdb::Table>,
            ) -> ::fluentdb::Result<()> {
                out.push(::fluentdb::Model::describe_nested(self, depth)?);
                Ok(())
            }
        }
    }
    .into()
}
