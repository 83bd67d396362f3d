pub mod character;
pub mod message;
pub mod session;
pub mod theme;
