pub mod file_size;
pub mod file_type;

pub use file_size::FileSizeUtils;
pub use file_type::FileCategory;
