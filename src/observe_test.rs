use super::*;
use std::sync::atomic::{AtomicUsize, Ordering};

fn counter() -> (Arc<AtomicUsize>, impl Fn(&u32) + Send + Sync + 'static) {
    let count = Arc::new(AtomicUsize::new(0));
    let seen = Arc::clone(&count);
    (count, move |_: &u32| {
        seen.fetch_add(1, Ordering::SeqCst);
    })
}

// =============================================================================
// subscribe / notify
// =============================================================================

#[test]
fn notify_reaches_every_observer() {
    let observers = Observers::<u32>::new();
    let (a, observe_a) = counter();
    let (b, observe_b) = counter();
    let _sub_a = observers.subscribe(observe_a);
    let _sub_b = observers.subscribe(observe_b);

    observers.notify(&7);

    assert_eq!(a.load(Ordering::SeqCst), 1);
    assert_eq!(b.load(Ordering::SeqCst), 1);
}

#[test]
fn notify_runs_in_registration_order() {
    let observers = Observers::<u32>::new();
    let order = Arc::new(Mutex::new(Vec::new()));
    let first = Arc::clone(&order);
    let second = Arc::clone(&order);
    let _a = observers.subscribe(move |v| first.lock().unwrap().push(("first", *v)));
    let _b = observers.subscribe(move |v| second.lock().unwrap().push(("second", *v)));

    observers.notify(&3);

    assert_eq!(*order.lock().unwrap(), vec![("first", 3), ("second", 3)]);
}

#[test]
fn notify_without_observers_is_noop() {
    let observers = Observers::<u32>::new();
    observers.notify(&1);
}

// =============================================================================
// Subscription lifetime
// =============================================================================

#[test]
fn dropping_subscription_unregisters() {
    let observers = Observers::<u32>::new();
    let (count, observe) = counter();
    let sub = observers.subscribe(observe);
    observers.notify(&1);
    assert_eq!(count.load(Ordering::SeqCst), 1);

    drop(sub);
    observers.notify(&2);

    assert_eq!(count.load(Ordering::SeqCst), 1);
}

#[test]
fn unsubscribe_only_removes_its_own_entry() {
    let observers = Observers::<u32>::new();
    let (kept, observe_kept) = counter();
    let (removed, observe_removed) = counter();
    let _keep = observers.subscribe(observe_kept);
    let remove = observers.subscribe(observe_removed);

    remove.unsubscribe();
    observers.notify(&1);

    assert_eq!(kept.load(Ordering::SeqCst), 1);
    assert_eq!(removed.load(Ordering::SeqCst), 0);
}

#[test]
fn subscription_outliving_registry_is_harmless() {
    let observers = Observers::<u32>::new();
    let (_, observe) = counter();
    let sub = observers.subscribe(observe);
    drop(observers);
    drop(sub);
}

#[test]
fn subscription_debug_reports_active() {
    let observers = Observers::<u32>::new();
    let sub = observers.subscribe(|_| {});
    assert!(format!("{sub:?}").contains("active: true"));
}
