pub use fluentdb_core::*;
pub use fluentdb_macros::Model;
