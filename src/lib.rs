mod config;
pub mod entities;
pub mod game;
pub mod telemetry;
pub mod world;

pub use config::{AppConfig, ConfigError, GameConfig};
pub use entities::item::{Item, ItemId, ItemTypeId};
pub use entities::player::PlayerId;
pub use game::{GameError, GameHandle};
pub use world::cylinder::{Cylinder, CylinderFlags, CylinderId, SlotIndex};
pub use world::events::{MoveContext, MoveEvents, Notification};
pub use world::item_types::ItemTypeIndex;
pub use world::position::Position;
pub use world::return_value::ReturnValue;
pub use world::state::WorldState;
pub use world::transfer::{MoveItemRequest, MoveItemResult};

use std::io::BufRead;

pub fn run(args: &[String]) -> Result<(), String> {
    let config = AppConfig::from_args(args)?;
    telemetry::logging::init(&config.root)?;

    let items_path = config.items_path();
    let item_types = ItemTypeIndex::load(&items_path).map_err(|err| load_failed("item types", err))?;
    let mut game_config =
        GameConfig::load(&config.config_path).map_err(|err| load_failed("game config", err))?;
    if let Some(interval) = config.decay_interval_override {
        game_config.decay_interval_ms = interval;
    }

    telemetry::logging::log_game(&format!(
        "loaded {} item types, {} currencies",
        item_types.len(),
        item_types.currency().len()
    ));
    println!("tibia-items: data check");
    println!("- root: {}", config.root.display());
    println!("- item types: {}", item_types.len());
    println!("- currencies: {}", item_types.currency().len());
    println!("- max depot items: {}", game_config.max_depot_items);
    println!(
        "- decay: {}ms x {} buckets",
        game_config.decay_interval_ms, game_config.decay_buckets
    );
    if config.check_only {
        return Ok(());
    }

    let handle = GameHandle::spawn(WorldState::new(game_config, item_types));
    println!("tibia-items: game thread running (commands: status, quit)");
    let stdin = std::io::stdin();
    for line in stdin.lock().lines() {
        let line = line.map_err(|err| format!("stdin read failed: {}", err))?;
        match line.trim() {
            "" => {}
            "status" => {
                let (items, queued) = handle
                    .execute(|world| (world.item_count(), world.decay_queued()))
                    .map_err(|err| err.to_string())?;
                println!("tibia-items: {} items, {} decaying", items, queued);
            }
            "quit" => break,
            other => println!("tibia-items: unknown command '{}'", other),
        }
    }

    let world = handle.shutdown().map_err(|err| err.to_string())?;
    telemetry::logging::log_game(&format!("shutdown with {} items", world.item_count()));
    println!("tibia-items: shutdown");
    Ok(())
}

fn load_failed(what: &str, err: ConfigError) -> String {
    let message = format!("{}: {}", what, err);
    telemetry::logging::log_error(&message);
    message
}
