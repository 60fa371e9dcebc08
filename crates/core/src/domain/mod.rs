pub mod board;
pub mod record;
