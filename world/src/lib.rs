#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Authoritative obstacle state for Snake Hazards.
//!
//! Obstacles carry an atomic lifetime that decays independently of their
//! position, so the lifetime path and the movement path never block one
//! another. The [`Population`] owns every live obstacle, [`SpawnSchedule`]
//! paces random spawns against the difficulty curve and [`Spawner`] rolls
//! seeded candidates. [`ObstacleManager`] composes the three for
//! single-threaded use; the concurrent manager reuses the same parts.

mod lifetime;
mod manager;
mod obstacle;
mod population;
mod schedule;
mod spawner;

pub use lifetime::{Lifetime, EXPIRY_EPSILON};
pub use manager::{ManagerConfig, ObstacleManager};
pub use obstacle::{MovingObstacle, Obstacle, StaticObstacle};
pub use population::Population;
pub use schedule::SpawnSchedule;
pub use snake_hazards_system_movement::Heading;
pub use spawner::{Spawner, STATIC_SPAWN_PROBABILITY};
