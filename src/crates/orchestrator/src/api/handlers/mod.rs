//! API request handlers
//!
//! Provides handler functions for all API endpoints organized by resource.

pub mod billing;
pub mod chat;
pub mod health;
pub mod sandboxes;

pub use billing::{balance, credit_summary, stripe_webhook};
pub use chat::chat_stream;
pub use health::{health, health_detailed};
pub use sandboxes::{
    connect, create, create_directory, delete, download_to_presigned_url, expose_port, info,
    pause, read_file, run_cmd, schedule_timeout, status, upload_file, upload_file_from_url,
    urls, write_file,
};
