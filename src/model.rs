pub mod fs;
pub mod store;
