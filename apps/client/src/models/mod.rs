pub mod resume;
pub mod suggestion;
pub mod user;
pub mod version;
