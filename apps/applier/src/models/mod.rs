pub mod application;
pub mod deserializers;
pub mod profile;
