pub mod ai;
pub mod combat;
pub mod components;
pub mod events;
pub mod intent;
pub mod map;
pub mod movement;
pub mod progression;
pub mod rank;
pub mod snapshot;
pub mod spawn;
pub mod stats;
