pub mod extensions;
pub mod paths;

pub use extensions::has_valid_extension;
pub use paths::{
    basename, dirname, extract_file_name, extract_full_path, file_stem, is_output_relative, join,
};
