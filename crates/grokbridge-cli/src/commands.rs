pub mod bridge;
pub mod tools;
pub mod version;
