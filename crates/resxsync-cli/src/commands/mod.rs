pub mod export;
pub mod init;
pub mod languages;
pub mod lookup;
pub mod schema;
pub mod sync;
