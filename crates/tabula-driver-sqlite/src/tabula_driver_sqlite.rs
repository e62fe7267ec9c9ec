//! SQLite database driver implementation

mod connection;
mod driver;
mod schema;

pub use connection::{SqliteConnection, SqliteOpenOptions};
pub use driver::SqliteDriver;
