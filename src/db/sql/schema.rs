/// Database table definitions and schemas
pub const CONFIG_TABLE: &str = "config";
pub const USERS_TABLE: &str = "users";
pub const CATEGORIES_TABLE: &str = "categories";
pub const FLOWS_TABLE: &str = "flows";
pub const PROMPTS_TABLE: &str = "prompts";
pub const VOICE_CHANNELS_TABLE: &str = "voice_channels";
pub const AGENTS_TABLE: &str = "agents";
