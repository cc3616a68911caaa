pub mod config;
pub mod navigation;
pub mod notifications;
pub mod sso_client;
pub mod sso_settings;
pub mod storage_list;
