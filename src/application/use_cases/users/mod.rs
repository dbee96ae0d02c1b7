pub mod assign;
pub mod authenticate;
pub mod deprovision;
pub mod error;
pub mod freeze;
pub mod get_user;
pub mod list_users;
pub mod provision;
pub mod reset_password;
pub mod update_user;
