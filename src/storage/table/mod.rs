mod directory;
mod table_file;

pub use directory::*;
pub use table_file::*;
