pub mod agent;
pub mod backup;
pub mod category;
pub mod config;
pub mod error;
mod export;
pub mod flow;
mod import;
pub mod main_store;
pub mod prompt;
pub mod snapshot;
mod sql;
mod types;
pub mod user;
pub mod voice_channel;

pub use agent::{Agent, AgentPatch, NewAgent};
pub use backup::{BackupConfig, DbBackup};
pub use category::{Category, CategoryPatch, NewCategory};
pub use error::StoreError;
pub use flow::{Flow, FlowPatch, NewFlow};
pub use main_store::MainStore;
pub use prompt::{NewPrompt, Prompt, PromptPatch};
pub use snapshot::{
    Collection, CollectionSelection, ExportData, ExportDocument, ImportOptions, ImportReport,
};
pub use types::Config;
pub use user::User;
pub use voice_channel::{NewVoiceChannel, VoiceChannel, VoiceChannelPatch};
