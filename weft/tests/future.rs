mod common;

use weft::{Error, Future, Manager, Status};

#[test]
fn test_resolve_is_visible_immediately() {
    let manager = Manager::new();
    let (mut future, promise) = manager.make_future::<u32>();

    assert_eq!(future.status(), Status::Pending);
    assert!(promise.has_reader());

    promise.resolve(3);

    assert_eq!(future.status(), Status::Fulfilled);
    assert_eq!(future.get_err(), None);
    assert_eq!(future.try_take(), Some(Ok(3)));
    assert_eq!(future.status(), Status::Empty);
}

#[test]
fn test_reject_exposes_the_error() {
    let manager = Manager::new();
    let (future, promise) = manager.make_future::<String>();

    promise.reject(Error::rejected(404, "not found"));

    let err = future.get_err().expect("future was rejected");
    assert_eq!(err.code(), Some(404));
    assert_eq!(err.to_string(), "rejected with code 404: not found");
    assert_eq!(future.status(), Status::Rejected);
}

#[test]
fn test_resolve_later_waits_for_the_next_epoch() {
    let manager = Manager::new();
    let (mut future, promise) = manager.make_future::<&'static str>();

    promise.resolve_later("done");
    assert_eq!(future.status(), Status::Pending);

    manager.drive();
    assert_eq!(future.try_take(), Some(Ok("done")));
}

#[test]
fn test_reject_later_waits_for_the_next_epoch() {
    let manager = Manager::new();
    let (future, promise) = manager.make_future::<()>();

    promise.reject_later((7, "later"));
    assert!(!future.is_settled());

    manager.drive();
    assert_eq!(future.get_err(), Some(Error::rejected(7, "later")));
}

#[test]
fn test_resolve_later_without_manager_settles_now() {
    let manager = Manager::new();
    let (mut future, promise) = manager.make_future::<u8>();

    drop(manager);
    promise.resolve_later(1);

    assert_eq!(future.try_take(), Some(Ok(1)));
}

#[test]
fn test_dropped_promise_breaks_the_future() {
    let manager = Manager::new();
    let (mut future, promise) = manager.make_future::<u8>();

    drop(promise);

    assert_eq!(future.try_take(), Some(Err(Error::BrokenPromise)));
}

#[test]
fn test_promise_sees_its_reader_go_away() {
    let manager = Manager::new();
    let (future, promise) = manager.make_future::<u8>();

    drop(future);

    assert!(!promise.has_reader());
    promise.resolve(1);
}

#[test]
fn test_settled_future_is_awaited_without_suspending() {
    let manager = Manager::new();

    let handle = manager.spawn_now(async {
        let a = Future::ready(2).await?;
        let b = Future::<u32>::rejected("nope").await.unwrap_or(5);
        Ok::<_, Error>(a + b)
    });

    assert!(handle.is_finished());
    assert_eq!(manager.run_until(handle.into_result()), Ok(Ok(7)));
}

#[test]
fn test_waiter_is_resumed_with_the_rejection() {
    let manager = Manager::new();
    let (future, promise) = manager.make_future::<u32>();

    let handle = manager.spawn_now(async move { future.await });
    promise.reject_later("gone");

    assert_eq!(
        manager.run_until(handle.into_result()),
        Ok(Err(Error::rejected(-1, "gone")))
    );
}

#[test]
#[should_panic(expected = "unsettled future")]
fn test_get_err_on_pending_future_panics() {
    let manager = Manager::new();
    let (future, _promise) = manager.make_future::<()>();

    let _ = future.get_err();
}

#[test]
#[should_panic(expected = "outcome was consumed")]
fn test_consuming_twice_panics() {
    let mut future = Future::ready(1);

    let _ = future.try_take();
    let _ = future.try_take();
}
