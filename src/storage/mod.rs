pub mod disk;
pub mod table;
