mod common;

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread;
use std::time::{Duration, Instant};

use weft::combinator;
use weft::pool::{Pool, PoolBuilder};
use weft::{Error, Manager, Status};

#[test]
fn test_result_settles_only_inside_drive() {
    common::init_tracing();

    let manager = Manager::new();
    let pool = Pool::new(1).unwrap();
    let ran = Arc::new(AtomicBool::new(false));

    let flag = ran.clone();
    let mut answer = pool.post(&manager, move || {
        flag.store(true, Ordering::SeqCst);
        42u32
    });

    while !ran.load(Ordering::SeqCst) {
        thread::yield_now();
    }

    // The worker is done, but the driver has not collected the result.
    assert_eq!(answer.status(), Status::Pending);

    while answer.status() == Status::Pending {
        manager.drive();
        thread::yield_now();
    }

    assert_eq!(answer.try_take(), Some(Ok(42)));
}

#[test]
fn test_jobs_run_in_parallel() {
    let manager = Manager::new();
    let pool = PoolBuilder::new().threads(4).build().unwrap();
    assert_eq!(pool.threads(), 4);

    let start = Instant::now();

    let jobs = (0..10u64).map(|i| {
        pool.post(&manager, move || {
            thread::sleep(Duration::from_millis(100));
            i
        })
    });
    let jobs: Vec<_> = jobs.collect();

    let results = manager.run_until(combinator::all(&manager, jobs)).unwrap();
    let elapsed = start.elapsed();

    assert_eq!(results, (0..10).collect::<Vec<_>>());

    // Ten 100ms jobs on four workers need three rounds.
    assert!(elapsed >= Duration::from_millis(290), "{elapsed:?}");
    assert!(elapsed < Duration::from_millis(900), "{elapsed:?}");
}

#[test]
fn test_panicking_job_rejects() {
    let manager = Manager::new();
    let pool = Pool::new(2).unwrap();

    let failed = pool.post(&manager, || -> u32 { panic!("worker exploded") });

    assert_eq!(
        manager.run_until(failed),
        Err(Error::Panicked("worker exploded".to_string()))
    );

    // The worker survives the panic.
    let fine = pool.post(&manager, || 1u8);
    assert_eq!(manager.run_until(fine), Ok(1));
}

#[test]
fn test_closed_pool_rejects_on_next_drive() {
    let manager = Manager::new();
    let pool = Pool::new(1).unwrap();

    pool.shutdown();
    assert!(pool.is_closed());

    let late = pool.post(&manager, || "never runs");
    assert_eq!(late.status(), Status::Pending);

    manager.drive();
    assert_eq!(late.get_err(), Some(Error::PoolClosed));
}

#[test]
fn test_task_awaits_a_pool_job() {
    let manager = Manager::new();
    let pool = Arc::new(Pool::new(2).unwrap());

    let inner = manager.clone();
    let workers = pool.clone();
    let outcome = manager.block_on(async move {
        let a = workers.post(&inner, || 20u32);
        let b = workers.post(&inner, || 22u32);

        Ok::<_, Error>(a.await? + b.await?)
    });

    assert_eq!(outcome, Ok(Ok(42)));
}

#[test]
fn test_workers_carry_the_configured_name() {
    let manager = Manager::new();
    let pool = PoolBuilder::new()
        .threads(1)
        .thread_name("resolver")
        .build()
        .unwrap();

    let name = pool.post(&manager, || thread::current().name().map(str::to_string));

    assert_eq!(manager.run_until(name), Ok(Some("resolver-0".to_string())));
}

#[test]
#[should_panic(expected = "threads must be > 0")]
fn test_zero_threads_is_rejected() {
    let _ = PoolBuilder::new().threads(0);
}
