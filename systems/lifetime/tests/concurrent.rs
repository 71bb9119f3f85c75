use std::{
    thread,
    time::{Duration, Instant},
};

use snake_hazards_core::{CellCoord, GridSize, MovementPattern};
use snake_hazards_system_lifetime::{ConcurrentObstacleManager, LifetimeWorkerConfig};
use snake_hazards_world::ManagerConfig;

fn fast_manager(grid: GridSize, decay_ms: u64, sweep_ms: u64) -> ConcurrentObstacleManager {
    let worker_config = LifetimeWorkerConfig::new(
        Duration::from_millis(decay_ms),
        Duration::from_millis(sweep_ms),
        Duration::from_millis(20),
    )
    .expect("valid worker config");
    ConcurrentObstacleManager::with_config(grid, ManagerConfig::new(17), worker_config)
}

fn wait_until(timeout: Duration, mut condition: impl FnMut() -> bool) -> bool {
    let deadline = Instant::now() + timeout;
    while Instant::now() < deadline {
        if condition() {
            return true;
        }
        thread::sleep(Duration::from_millis(5));
    }
    condition()
}

#[test]
fn start_and_stop_are_idempotent() {
    let mut manager = ConcurrentObstacleManager::new(GridSize::new(8, 8), 1);
    assert!(!manager.is_lifetime_thread_running());

    manager.start_lifetime_thread().expect("worker starts");
    manager.start_lifetime_thread().expect("second start is a no-op");
    assert!(manager.is_lifetime_thread_running());

    manager.stop_lifetime_thread();
    manager.stop_lifetime_thread();
    assert!(!manager.is_lifetime_thread_running());

    manager.start_lifetime_thread().expect("worker restarts");
    assert!(manager.is_lifetime_thread_running());
}

#[test]
fn dropping_running_manager_joins_worker_promptly() {
    let mut manager = ConcurrentObstacleManager::new(GridSize::new(8, 8), 2);
    manager.start_lifetime_thread().expect("worker starts");
    let started = Instant::now();
    drop(manager);
    assert!(
        started.elapsed() < Duration::from_secs(2),
        "shutdown waited for a full worker cycle"
    );
}

#[test]
fn worker_decays_lifetimes_in_background() {
    let mut manager = fast_manager(GridSize::new(10, 10), 10, 60_000);
    assert!(manager.add_fixed_obstacle_with_lifetime(CellCoord::new(3, 3), 0.2));
    assert!(manager.add_fixed_obstacle_with_lifetime(CellCoord::new(4, 4), 600.0));
    manager.start_lifetime_thread().expect("worker starts");

    assert!(
        wait_until(Duration::from_secs(5), || manager.expired_obstacle_count() == 1),
        "short-lived obstacle never expired"
    );
    assert_eq!(manager.obstacle_count_safe(), 2, "expired obstacles linger until swept");
    assert!(manager.check_collision_with_point(CellCoord::new(3, 3)));

    manager.stop_lifetime_thread();
    assert!(manager.lifetime_stats().decay_cycles > 0);
    assert_eq!(manager.cleanup_expired(), 1);
    assert_eq!(manager.obstacle_count_safe(), 1);
}

#[test]
fn worker_sweeps_expired_obstacles() {
    let mut manager = fast_manager(GridSize::new(10, 10), 5, 40);
    for column in 0..5 {
        assert!(manager.add_fixed_obstacle_with_lifetime(CellCoord::new(column, 0), 0.05));
    }
    assert!(manager.add_moving_obstacle_with_lifetime(
        CellCoord::new(5, 5),
        MovementPattern::Circular,
        600.0
    ));
    manager.start_lifetime_thread().expect("worker starts");

    assert!(
        wait_until(Duration::from_secs(5), || manager.obstacle_count_safe() == 1),
        "worker never swept expired obstacles"
    );
    manager.stop_lifetime_thread();

    let stats = manager.lifetime_stats();
    assert!(stats.sweeps_completed >= 1);
    assert_eq!(stats.obstacles_swept, 5);
    assert_eq!(manager.moving_obstacle_count_safe(), 1);
}

#[test]
fn concurrent_queries_survive_worker_cycles() {
    let grid = GridSize::new(24, 24);
    let mut manager = fast_manager(grid, 2, 10);
    let patterns = MovementPattern::ALL;
    for index in 0..120u32 {
        let cell = CellCoord::new(index % 24, index / 24);
        let lifetime = 0.05 + (index % 10) as f32 * 0.05;
        if index % 2 == 0 {
            assert!(manager.add_fixed_obstacle_with_lifetime(cell, lifetime));
        } else {
            let pattern = patterns[index as usize % patterns.len()];
            assert!(manager.add_moving_obstacle_with_lifetime(cell, pattern, lifetime));
        }
    }
    let initial = manager.obstacle_count_safe();
    assert_eq!(initial, 120);

    manager.start_lifetime_thread().expect("worker starts");
    let deadline = Instant::now() + Duration::from_millis(800);
    let mut previous = initial;
    let mut probe = 0u32;
    while Instant::now() < deadline {
        manager.update_obstacle_movement();
        let cell = CellCoord::new(probe % 24, (probe / 24) % 24);
        let _ = manager.check_collision_with_point(cell);
        probe = probe.wrapping_add(1);

        let count = manager.obstacle_count_safe();
        assert!(count <= previous, "population grew from {previous} to {count}");
        previous = count;

        for snapshot in manager.snapshots().iter() {
            assert!(grid.contains(snapshot.cell));
            assert!(snapshot.remaining_lifetime >= 0.0);
        }
    }
    manager.stop_lifetime_thread();
    assert!(manager.lifetime_stats().decay_cycles > 0);

    manager.update_obstacle_lifetimes(Duration::from_secs(1));
    assert_eq!(manager.expired_obstacle_count(), manager.obstacle_count_safe());
    let _ = manager.cleanup_expired();
    assert_eq!(manager.obstacle_count_safe(), 0);
}

#[test]
fn async_cleanup_reports_removed_count() {
    let mut manager = ConcurrentObstacleManager::new(GridSize::new(6, 6), 3);
    assert!(manager.add_fixed_obstacle_with_lifetime(CellCoord::new(0, 0), 0.5));
    assert!(manager.add_fixed_obstacle_with_lifetime(CellCoord::new(1, 0), 0.5));
    assert!(manager.add_fixed_obstacle_with_lifetime(CellCoord::new(2, 0), 5.0));
    manager.update_obstacle_lifetimes(Duration::from_secs(1));

    let task = manager.cleanup_expired_async();
    assert_eq!(task.wait(), 2);
    assert_eq!(manager.obstacle_count_safe(), 1);

    let again = manager.cleanup_expired_async();
    assert_eq!(again.wait(), 0);
}

#[test]
fn discarded_sweep_handle_still_completes() {
    let mut manager = ConcurrentObstacleManager::new(GridSize::new(6, 6), 4);
    assert!(manager.add_fixed_obstacle_with_lifetime(CellCoord::new(3, 3), 0.0));
    drop(manager.cleanup_expired_async());
    assert_eq!(manager.obstacle_count_safe(), 0);
}

#[test]
fn spawning_and_difficulty_match_single_threaded_rules() {
    let mut manager = ConcurrentObstacleManager::new(GridSize::new(2, 2), 5);
    for _ in 0..500 {
        let _ = manager.spawn_random_obstacle();
        assert!(manager.obstacle_count_safe() <= 4);
    }
    assert_eq!(manager.obstacle_count_safe(), 4);
    assert_eq!(
        manager.fixed_obstacle_count_safe() + manager.moving_obstacle_count_safe(),
        4
    );

    manager.set_difficulty_level(2);
    assert!((manager.spawn_rate() - 0.5).abs() < 1e-6);
    assert!((manager.moving_obstacle_speed() - 0.07).abs() < 1e-6);
    assert!(!manager.is_valid_food_position(CellCoord::new(1, 1)));

    manager.clear_all_obstacles();
    assert!(manager.is_valid_food_position(CellCoord::new(1, 1)));
    assert!(manager.should_spawn_obstacle(Duration::from_secs(2)));
}
