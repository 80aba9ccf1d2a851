mod connection;
mod driver;
mod transaction;
mod util;
mod value_holder;

pub use connection::*;
pub use driver::*;
pub use transaction::*;
