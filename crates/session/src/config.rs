use std::path::PathBuf;

pub const DEFAULT_API_URL: &str = "http://localhost:3000";
pub const DEFAULT_SESSION_FILE: &str = ".parley-session.json";

#[derive(Debug, Clone)]
pub struct ShellConfig {
    pub api_url: String,
    pub session_file: PathBuf,
}
