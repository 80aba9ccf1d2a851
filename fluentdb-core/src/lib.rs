mod as_value;
mod builder;
mod column;
mod condition;
mod config;
mod database;
mod driver;
mod error;
pub mod generic;
mod join;
pub mod null;
mod query;
mod read;
mod render;
mod table;
mod util;
mod value;
mod write;

pub use ::anyhow::Context;
pub use as_value::*;
pub use builder::{DBModel, GetOne};
pub use column::*;
pub use condition::*;
pub use config::*;
pub use database::*;
pub use driver::*;
pub use error::*;
pub use join::*;
pub use query::*;
pub use render::*;
pub use table::*;
pub use util::*;
pub use value::*;
pub use write::*;
pub use ::sea_query;

pub type Result<T> = anyhow::Result<T>;
pub type Error = anyhow::Error;
