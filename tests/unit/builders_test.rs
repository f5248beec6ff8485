//! Tests for pool builders

use prometheus_thread_pool::builders::{build_pool, build_pool_from_env, build_pool_from_json};
use prometheus_thread_pool::config::pool::{
    ENV_LOW_PRIORITY_THREAD_COUNT, ENV_STACK_SIZE, ENV_THREAD_COUNT, ENV_THREAD_NAME_PREFIX,
};
use prometheus_thread_pool::config::ThreadPoolConfig;
use prometheus_thread_pool::core::{PoolError, TaskPriority};

#[test]
fn test_build_pool_from_config() {
    let cfg = ThreadPoolConfig::new()
        .with_thread_count(2)
        .with_low_priority_thread_count(1);
    let pool = build_pool(&cfg).unwrap();
    assert_eq!(pool.thread_count(TaskPriority::Normal), 2);
    assert_eq!(pool.thread_count(TaskPriority::Low), 1);

    let mut task = pool.spawn(|| "built");
    assert_eq!(task.get().unwrap(), "built");
}

#[test]
fn test_build_pool_from_json() {
    let pool = build_pool_from_json(r#"{ "thread_count": 1, "low_priority_thread_count": 0 }"#)
        .unwrap();
    assert_eq!(pool.thread_count(TaskPriority::Low), 0);

    let err = build_pool_from_json(r#"{ "thread_name_prefix": "" }"#).unwrap_err();
    assert!(matches!(err, PoolError::InvalidConfig(_)));
}

// The only test in this binary that touches TASK_POOL_* variables.
#[test]
fn test_build_pool_from_env() {
    std::env::set_var(ENV_THREAD_COUNT, "2");
    std::env::set_var(ENV_LOW_PRIORITY_THREAD_COUNT, "0");
    std::env::set_var(ENV_THREAD_NAME_PREFIX, "env-pool");
    std::env::remove_var(ENV_STACK_SIZE);

    let pool = build_pool_from_env().unwrap();
    assert_eq!(pool.thread_count(TaskPriority::Normal), 2);
    assert_eq!(pool.thread_count(TaskPriority::Low), 0);
    assert_eq!(pool.config().thread_name_prefix, "env-pool");
    drop(pool);

    std::env::set_var(ENV_THREAD_COUNT, "many");
    let err = build_pool_from_env().unwrap_err();
    assert!(format!("{err:#}").contains(ENV_THREAD_COUNT));

    std::env::set_var(ENV_THREAD_COUNT, "1");
    std::env::set_var(ENV_STACK_SIZE, "128");
    assert!(ThreadPoolConfig::from_env().is_err());

    for name in [
        ENV_THREAD_COUNT,
        ENV_LOW_PRIORITY_THREAD_COUNT,
        ENV_THREAD_NAME_PREFIX,
        ENV_STACK_SIZE,
    ] {
        std::env::remove_var(name);
    }
}
