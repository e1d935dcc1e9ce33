//env
pub const DATABASE_URL_NOT_SET: &str = "DATABASE_URL not set!";
pub const OPENAI_API_KEY_NOT_SET: &str = "OPENAI_API_KEY not set!";

//db
pub const DATABASE_CONNECTION_FAILED: &str = "Failed to connect to database";
pub const DATABASE_CLOSE_FAILED: &str = "Failed to close database connection";
pub const SCHEMA_BOOTSTRAP_FAILED: &str = "Failed to bootstrap embedding schema";

//server
pub const SERVER_BIND_FAILED: &str = "Failed to bind HTTP listener";
pub const SERVER_FAILED: &str = "HTTP server error";
