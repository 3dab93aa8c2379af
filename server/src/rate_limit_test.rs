use super::*;

const LIMIT: usize = 3;
const WINDOW: Duration = Duration::from_secs(10);

#[test]
fn allows_up_to_limit_then_rejects() {
    let rl = RateLimiter::new(LIMIT, WINDOW);
    let client = Uuid::new_v4();
    let now = Instant::now();

    for i in 0..LIMIT {
        assert!(rl.check_and_record_at(client, now).is_ok(), "message {i} should pass");
    }
    assert_eq!(
        rl.check_and_record_at(client, now),
        Err(RateLimitError { limit: LIMIT, window_secs: 10 })
    );
}

#[test]
fn window_expiry_allows_new_messages() {
    let rl = RateLimiter::new(LIMIT, WINDOW);
    let client = Uuid::new_v4();
    let start = Instant::now();

    for _ in 0..LIMIT {
        rl.check_and_record_at(client, start).expect("within limit");
    }
    assert!(rl.check_and_record_at(client, start).is_err());

    let after_window = start + WINDOW + Duration::from_millis(1);
    assert!(rl.check_and_record_at(client, after_window).is_ok());
}

#[test]
fn distinct_clients_do_not_interfere() {
    let rl = RateLimiter::new(1, WINDOW);
    let client_a = Uuid::new_v4();
    let client_b = Uuid::new_v4();
    let now = Instant::now();

    rl.check_and_record_at(client_a, now).expect("first message");
    assert!(rl.check_and_record_at(client_a, now).is_err());
    assert!(rl.check_and_record_at(client_b, now).is_ok());
}

#[test]
fn forget_clears_history() {
    let rl = RateLimiter::new(1, WINDOW);
    let client = Uuid::new_v4();
    rl.check_and_record(client).expect("first message");
    assert_eq!(rl.tracked_clients(), 1);

    rl.forget(client);
    assert_eq!(rl.tracked_clients(), 0);
    assert!(rl.check_and_record(client).is_ok());
}

#[test]
fn rate_limit_error_code() {
    let err = RateLimitError { limit: 1, window_secs: 1 };
    assert_eq!(err.error_code(), "E_RATE_LIMITED");
}
