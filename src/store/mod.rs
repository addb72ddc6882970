pub mod files;
pub mod index;
