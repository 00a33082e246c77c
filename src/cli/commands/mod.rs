mod config;
mod details;
mod genres;
mod interactive;
mod search;
mod top;

pub use config::{cmd_config_init, cmd_config_show};
pub use details::cmd_details;
pub use genres::cmd_genres;
pub use interactive::cmd_interactive;
pub use search::cmd_search;
pub use top::cmd_top;
