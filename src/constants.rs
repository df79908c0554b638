/// Fixed names shared by the importer: input file, filter targets, remote table
/// and the places credentials are looked up.

// Input
pub const INPUT_FILE: &str = "ppp_150k_plus.csv";

// Row filter: Minnesota child day care services
pub const TARGET_STATE: &str = "MN";
pub const TARGET_NAICS_CODE: &str = "624410";

// Remote table
pub const LOANS_TABLE: &str = "ppp_loans";
pub const CONFLICT_COLUMN: &str = "loan_number";
pub const DEFAULT_BATCH_SIZE: usize = 50;
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 30;

// Supabase project the importer targets when nothing else is configured
pub const DEFAULT_SUPABASE_URL: &str = "https://powsedjqwgniermriadb.supabase.co";

// Credential lookup
pub const SERVICE_KEY_ENV: &str = "SUPABASE_SERVICE_KEY";
pub const SUPABASE_URL_ENV: &str = "SUPABASE_URL";
pub const LOCAL_ENV_FILE: &str = ".env.local";
pub const LOCAL_SERVICE_KEY_NAME: &str = "SUPABASE_SERVICE_ROLE_KEY";
pub const LOCAL_URL_NAME: &str = "NEXT_PUBLIC_SUPABASE_URL";

// Optional TOML overrides
pub const CONFIG_FILE: &str = "ppp_import.toml";
