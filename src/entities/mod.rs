pub mod container;
pub mod depot;
pub mod inbox;
pub mod inventory;
pub mod item;
pub mod player;
