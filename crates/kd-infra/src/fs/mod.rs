mod app_data_dir;
mod atomic;

pub use app_data_dir::app_data_dir;
pub use atomic::{read_json, write_json_atomic};
