pub mod browse;
pub mod cylinder;
pub mod decay;
pub mod events;
pub mod item_types;
pub mod money;
pub mod position;
pub mod return_value;
pub mod search;
pub mod state;
pub mod tile;
pub mod transfer;
pub mod transform;

#[cfg(test)]
pub(crate) mod test_support;
