pub mod sso_settings;
pub mod storage;
