//! Infrastructure layer: document store clients, query building, the commands
//! repository and configuration.

pub mod commands_index;
pub mod config;
pub mod indexer;

mod integration_tests;

pub use commands_index::{
    CommandsIndex, CommandsIndexError, CommandsIndexPaths, CreateCommandResponse,
    COMMANDS_INDEX, COMMAND_MANAGER_PLUGIN_URL,
};
pub use config::{ConfigError, IndexerConfig};
pub use indexer::{HttpIndexerClient, InMemoryIndexerClient, IndexerClient, IndexerError};
