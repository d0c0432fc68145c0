pub mod repository;
pub mod student;
