mod common;

use weft::combinator::{self, Winner};
use weft::{Error, Future, Manager, Status, all, all_settled, race};

#[test]
fn test_race_first_settlement_wins() {
    let manager = Manager::new();

    let (a, resolve_a) = manager.make_future::<u32>();
    let (b, resolve_b) = manager.make_future::<u32>();
    let (c, resolve_c) = manager.make_future::<u32>();

    let mut winner = combinator::race(&manager, vec![a, b, c]);
    assert_eq!(winner.status(), Status::Pending);

    resolve_b.resolve(20);
    assert_eq!(winner.status(), Status::Fulfilled);

    // Later settlements neither re-resolve nor disturb the reported winner.
    resolve_a.resolve(10);
    resolve_c.reject("late");

    assert_eq!(
        winner.try_take(),
        Some(Ok(Winner {
            index: 1,
            outcome: Ok(20)
        }))
    );
}

#[test]
fn test_race_prefers_construction_order_among_settled_children() {
    let manager = Manager::new();
    let (pending, _promise) = manager.make_future::<u32>();

    let mut winner = combinator::race(
        &manager,
        vec![pending, Future::ready(1), Future::ready(2)],
    );

    let winner = winner.try_take().unwrap().unwrap();
    assert_eq!(winner.index, 1);
    assert_eq!(winner.outcome, Ok(1));
}

#[test]
fn test_race_reports_a_rejected_winner() {
    let manager = Manager::new();
    let (slow, _promise) = manager.make_future::<u32>();

    let mut winner = combinator::race(&manager, vec![slow, Future::rejected((3, "fast failure"))]);

    let winner = winner.try_take().unwrap().unwrap();
    assert_eq!(winner.index, 1);
    assert_eq!(winner.outcome, Err(Error::rejected(3, "fast failure")));
}

#[test]
fn test_empty_race_is_broken() {
    let manager = Manager::new();

    let mut winner = combinator::race::<u32>(&manager, Vec::new());

    assert_eq!(winner.try_take(), Some(Err(Error::BrokenPromise)));
}

#[test]
fn test_all_keeps_input_order() {
    let manager = Manager::new();

    let (a, resolve_a) = manager.make_future::<&'static str>();
    let (b, resolve_b) = manager.make_future::<&'static str>();

    let mut joined = combinator::all(&manager, vec![a, b]);

    resolve_b.resolve("second");
    assert_eq!(joined.status(), Status::Pending);

    resolve_a.resolve("first");
    assert_eq!(joined.try_take(), Some(Ok(vec!["first", "second"])));
}

#[test]
fn test_all_short_circuits_on_first_rejection() {
    let manager = Manager::new();

    let (a, resolve_a) = manager.make_future::<u32>();
    let (b, resolve_b) = manager.make_future::<u32>();
    let (c, resolve_c) = manager.make_future::<u32>();

    let joined = combinator::all(&manager, vec![a, b, c]);

    resolve_b.reject((500, "b failed"));
    assert_eq!(joined.get_err(), Some(Error::rejected(500, "b failed")));

    // The remaining children are ignored, not cancelled.
    assert!(resolve_a.has_reader());
    resolve_a.resolve(1);
    resolve_c.reject("c failed too");

    assert_eq!(joined.get_err(), Some(Error::rejected(500, "b failed")));
}

#[test]
fn test_all_of_nothing_is_empty() {
    let manager = Manager::new();

    let mut joined = combinator::all::<u8>(&manager, Vec::new());

    assert_eq!(joined.try_take(), Some(Ok(Vec::new())));
}

#[test]
fn test_all_settled_waits_for_every_child() {
    let manager = Manager::new();

    let (a, resolve_a) = manager.make_future::<u32>();
    let (b, resolve_b) = manager.make_future::<u32>();
    let (c, resolve_c) = manager.make_future::<u32>();

    let mut settled = combinator::all_settled(&manager, vec![a, b, c]);

    resolve_a.reject("a failed");
    resolve_c.resolve(3);
    assert_eq!(settled.status(), Status::Pending);

    drop(resolve_b);

    let outcomes = settled.try_take().unwrap().unwrap();
    assert_eq!(outcomes.len(), 3);
    assert_eq!(
        outcomes,
        vec![
            Err(Error::rejected(-1, "a failed")),
            Err(Error::BrokenPromise),
            Ok(3)
        ]
    );
}

#[test]
fn test_combinator_is_awaited_by_a_task() {
    let manager = Manager::new();

    let (a, resolve_a) = manager.make_future::<u32>();
    let (b, resolve_b) = manager.make_future::<u32>();

    let inner = manager.clone();
    let handle = manager.spawn_now(async move {
        let values = combinator::all(&inner, vec![a, b]).await?;
        Ok::<_, Error>(values.iter().sum::<u32>())
    });

    resolve_a.resolve_later(1);
    resolve_b.resolve_later(2);

    assert_eq!(manager.run_until(handle.into_result()), Ok(Ok(3)));
}

#[test]
fn test_race_macro_mixes_types() {
    let manager = Manager::new();

    let (number, _keep) = manager.make_future::<u32>();
    let (text, send_text) = manager.make_future::<String>();

    let mut winner = race!(manager, number, text);
    assert_eq!(winner.status(), Status::Pending);

    send_text.resolve("hello".to_string());
    assert_eq!(winner.try_take(), Some(Ok(1)));
}

#[test]
fn test_all_macro_builds_a_tuple() {
    let manager = Manager::new();

    let (flag, send_flag) = manager.make_future::<bool>();

    let mut joined = all!(&manager, Future::ready(1u8), Future::ready("two"), flag);

    send_flag.resolve(true);
    assert_eq!(joined.try_take(), Some(Ok((1u8, "two", true))));
}

#[test]
fn test_all_macro_rejects_with_first_failure() {
    let manager = Manager::new();

    let (slow, _keep) = manager.make_future::<u8>();

    let joined = all!(manager, slow, Future::<String>::rejected("bad input"));

    assert_eq!(joined.get_err(), Some(Error::rejected(-1, "bad input")));
}

#[test]
fn test_all_settled_macro_never_rejects() {
    let manager = Manager::new();

    let mut settled = all_settled!(
        manager,
        Future::ready(1i32),
        Future::<()>::rejected(Error::TimedOut),
    );

    assert_eq!(
        settled.try_take(),
        Some(Ok((Ok(1i32), Err(Error::TimedOut))))
    );
}

#[test]
#[should_panic(expected = "outcome was consumed")]
fn test_consumed_future_cannot_join_a_race() {
    let manager = Manager::new();

    let mut taken = Future::ready(1u32);
    assert_eq!(taken.try_take(), Some(Ok(1)));

    let _ = combinator::race(&manager, vec![taken]);
}
