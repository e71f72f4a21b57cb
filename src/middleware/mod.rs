pub mod auth;
pub mod cookies;
pub mod flash;

pub use auth::{end_session, start_session, Principal};
pub use flash::{redirect_with_cookies, redirect_with_notice, Flash, Level, Notice, FLASH_COOKIE};
