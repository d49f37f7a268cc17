mod disk;

pub use disk::{Storage, export_file_name, parse_import};
