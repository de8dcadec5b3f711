mod common;

use std::cell::Cell;
use std::rc::Rc;
use std::time::Duration;

use weft::{Error, Fiber, Manager, Status, TaskState};

use common::manual_manager;

struct DropFlag(Rc<Cell<bool>>);

impl Drop for DropFlag {
    fn drop(&mut self) {
        self.0.set(true);
    }
}

#[test]
fn test_fiber_waits_on_a_future() {
    let manager = Manager::new();
    let (future, promise) = manager.make_future::<u32>();

    let handle = manager
        .spawn_stackful_now(move |fiber: &mut Fiber<'_>| fiber.wait(future).map(|v| v * 2))
        .unwrap();

    assert_eq!(handle.state(), TaskState::Suspended);

    promise.resolve(21);
    manager.drive();

    assert!(handle.is_finished());
    assert_eq!(handle.into_result().try_take(), Some(Ok(Ok(42))));
}

#[test]
fn test_fiber_yields_to_other_tasks() {
    let manager = Manager::new();
    let steps = Rc::new(Cell::new(0));

    let counter = steps.clone();
    let handle = manager
        .spawn_stackful_now(move |fiber: &mut Fiber<'_>| {
            for _ in 0..3 {
                counter.set(counter.get() + 1);
                fiber.yield_now();
            }
        })
        .unwrap();

    assert_eq!(steps.get(), 1);

    manager.drive();
    assert_eq!(steps.get(), 2);

    manager.drive();
    manager.drive();
    assert_eq!(steps.get(), 3);
    assert!(handle.is_finished());
}

#[test]
fn test_fiber_sleeps_on_the_manager_clock() {
    let (manager, clock) = manual_manager();

    let sleeper = manager.clone();
    let handle = manager
        .spawn_stackful_now(move |fiber: &mut Fiber<'_>| {
            fiber.sleep(&sleeper, Duration::from_secs(5))
        })
        .unwrap();

    clock.advance(Duration::from_secs(4));
    manager.drive();
    assert!(!handle.is_finished());

    clock.advance(Duration::from_secs(1));
    manager.drive();
    assert!(handle.is_finished());

    let mut result = handle.into_result();
    assert_eq!(result.try_take(), Some(Ok(Ok(()))));
}

#[test]
fn test_fiber_panic_rejects_its_handle() {
    common::init_tracing();
    let manager = Manager::new();
    let (future, promise) = manager.make_future::<()>();

    let handle = manager
        .spawn_stackful_now(move |fiber: &mut Fiber<'_>| {
            let _ = fiber.wait(future);

            if true {
                panic!("fiber gave up");
            }
        })
        .unwrap();

    promise.resolve(());
    manager.drive();

    assert_eq!(
        manager.run_until(handle.into_result()),
        Err(Error::Panicked("fiber gave up".to_string()))
    );
    assert_eq!(manager.task_count(), 0);
}

#[test]
fn test_dropping_the_handle_unwinds_the_fiber() {
    let manager = Manager::new();
    let dropped = Rc::new(Cell::new(false));
    let (future, _promise) = manager.make_future::<()>();

    let flag = DropFlag(dropped.clone());
    let handle = manager
        .spawn_stackful_now(move |fiber: &mut Fiber<'_>| {
            let _flag = flag;
            let _ = fiber.wait(future);
        })
        .unwrap();

    assert!(!dropped.get());
    assert_eq!(manager.task_count(), 1);

    drop(handle);

    assert!(dropped.get());
    assert_eq!(manager.task_count(), 0);
}

#[test]
fn test_stackful_later_starts_on_drive() {
    let manager = Manager::new();
    let started = Rc::new(Cell::new(false));

    let flag = started.clone();
    let handle = manager
        .spawn_stackful_later(move |_: &mut Fiber<'_>| flag.set(true))
        .unwrap();

    assert!(!started.get());
    assert_eq!(handle.state(), TaskState::Runnable);

    manager.drive();
    assert!(started.get());
    assert!(handle.is_finished());
}

#[test]
fn test_fiber_waits_on_a_stackless_task() {
    let manager = Manager::new();
    let (future, promise) = manager.make_future::<&'static str>();

    let child = manager.spawn_now(async move { future.await.map(str::len) });

    let parent = manager
        .spawn_stackful_now(move |fiber: &mut Fiber<'_>| {
            let length = fiber.wait(child)??;
            Ok::<_, Error>(length + 1)
        })
        .unwrap();

    promise.resolve_later("four");

    let result = parent.into_result();
    assert_eq!(result.status(), Status::Pending);

    assert_eq!(manager.run_until(result), Ok(Ok(5)));
}

#[weft::test(stack_size = 0x2000)]
async fn test_stackful_task_inside_a_weft_test(manager: Manager) {
    let (future, promise) = manager.make_future::<u64>();

    let handle = manager
        .spawn_stackful_now(move |fiber: &mut Fiber<'_>| {
            // Recursion deep enough to need more than a few pages.
            fn sum(n: u64) -> u64 {
                let pad = [n; 16];
                if n == 0 { 0 } else { pad[0] + sum(n - 1) }
            }

            fiber.wait(future).map(|base| base + sum(100))
        })
        .unwrap();

    promise.resolve_later(1);

    assert_eq!(handle.await, Ok(Ok(5051)));
}
