pub mod battle;
pub mod board;
pub mod player;
