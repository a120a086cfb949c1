//! Builtin tool catalog

mod file_info;
mod find_by_name;
mod grep;
mod list_dir;
mod read_file;

pub use file_info::FileInfoTool;
pub use find_by_name::FindByNameTool;
pub use grep::GrepTool;
pub use list_dir::ListDirTool;
pub use read_file::ReadFileTool;
