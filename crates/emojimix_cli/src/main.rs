//! CLI smoke entry point.
//!
//! # Responsibility
//! - Provide a minimal executable to verify `emojimix_core` linkage.
//! - Demo the add-random grid flow against an in-memory database.

use emojimix_core::db::open_db_in_memory;
use emojimix_core::{EmojiMixFactory, EmojiMixStore, GridController};

fn main() {
    println!("emojimix_core ping={}", emojimix_core::ping());
    println!("emojimix_core version={}", emojimix_core::core_version());

    if let Err(err) = run_demo() {
        eprintln!("demo failed: {err}");
        std::process::exit(1);
    }
}

fn run_demo() -> Result<(), Box<dyn std::error::Error>> {
    let conn = open_db_in_memory()?;
    let store = EmojiMixStore::new(conn);
    let mut controller = GridController::new(store, EmojiMixFactory::new());
    controller.load()?;

    for _ in 0..4 {
        let batch = controller.add_random()?;
        println!("grid ops: {:?}", batch.ops);
    }

    for record in controller.visible() {
        println!(
            "{}  {}",
            record.mix.emojis,
            record.mix.background_color.hex_string()
        );
    }

    Ok(())
}
