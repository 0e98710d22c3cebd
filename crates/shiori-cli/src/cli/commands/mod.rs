mod account;
mod catalog;
mod config;
mod friends;
mod list;

pub use account::{
    cmd_contact, cmd_delete_account, cmd_edit_profile, cmd_login, cmd_logout, cmd_profile,
    cmd_register,
};
pub use catalog::{cmd_anime, cmd_catalog};
pub use config::cmd_config;
pub use friends::cmd_friends;
pub use list::{cmd_add, cmd_favorite, cmd_list, cmd_note, cmd_remove, cmd_set_status, cmd_stats};
