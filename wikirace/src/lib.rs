pub mod handlers;

// Re-export commonly used handler functions for convenience
pub use handlers::{
    exit_code, init_database, open_database, parse_format, render, resolve_db_path, run_search,
};
