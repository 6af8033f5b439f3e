pub const APP_NAME: &str = "preflight";

/// Prefix for environment variables that override connection endpoints.
pub const ENV_PREFIX: &str = "PREFLIGHT";

pub const SEED_DATABASE: &str = "example_db";
pub const SEED_COLLECTION: &str = "example_collection";
pub const SEED_DOCUMENT_KEY: &str = "test_doc";
pub const SEED_NAME: &str = "test_name";
pub const SEED_TABLE: &str = "example_table";

pub const SEED_CACHE_KEY: &str = "example_key";
pub const SEED_CACHE_VALUE: &str = "example_value";
pub const SANITY_CACHE_KEY: &str = "sanity_check_key";
pub const SANITY_CACHE_VALUE: &str = "sanity_check_value";
