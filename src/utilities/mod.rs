pub mod enums;
pub mod helpers;
