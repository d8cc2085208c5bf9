//! Option parsing and normalisation tests

use rstest::rstest;
use std::time::Duration;

use waitfor::{Poller, WaitForError, WaitForOptions};

#[rstest]
#[case(r#"{ "timeout": 1000 }"#, 1000, false, 10)]
#[case(r#"{ "timeout": 1000, "silent": true }"#, 1000, true, 10)]
#[case(r#"{ "timeout": 2000, "frequency": 50 }"#, 2000, false, 50)]
#[case(r#"{ "timeout": 250, "silent": false, "frequency": 5 }"#, 250, false, 5)]
fn test_options_from_json(
    #[case] json: &str,
    #[case] timeout_ms: u64,
    #[case] silent: bool,
    #[case] frequency_ms: u64,
) {
    let options: WaitForOptions = serde_json::from_str(json).unwrap();

    assert_eq!(options.timeout, Duration::from_millis(timeout_ms));
    assert_eq!(options.silent, silent);
    assert_eq!(options.frequency, Duration::from_millis(frequency_ms));
}

#[test]
fn test_timeout_is_required() {
    let result: Result<WaitForOptions, _> = serde_json::from_str(r#"{ "silent": true }"#);
    assert!(result.is_err());
}

#[test]
fn test_options_serialize_as_millis() {
    let options = WaitForOptions::new(Duration::from_millis(1500)).with_frequency(Duration::from_millis(25));
    let value = serde_json::to_value(options).unwrap();

    assert_eq!(value["timeout"], 1500);
    assert_eq!(value["frequency"], 25);
    assert_eq!(value["silent"], false);
}

#[rstest]
#[case(WaitForOptions::new(Duration::ZERO), true)]
#[case(WaitForOptions::new(Duration::from_millis(1)), false)]
#[case(WaitForOptions::default().with_frequency(Duration::ZERO), false)]
fn test_poller_construction_validates(#[case] options: WaitForOptions, #[case] rejected: bool) {
    let result = Poller::<_, _, ()>::new(|| true, |_: ()| {}, options);

    match result {
        Err(WaitForError::Configuration(_)) => assert!(rejected),
        Err(other) => panic!("Unexpected error: {}", other),
        Ok(poller) => {
            assert!(!rejected);
            assert!(!poller.options().frequency.is_zero());
        }
    }
}
