use chrono::NaiveDate;
use rstest::rstest;
use sentiment_forecast::error::ForecastError;
use sentiment_forecast::horizon::{parse_target_date, Horizon};

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

#[test]
fn test_resolve_five_day_horizon() {
    let horizon = Horizon::resolve(date(2024, 1, 10), date(2024, 1, 15)).unwrap();

    assert_eq!(horizon.len(), 5);
    assert_eq!(horizon.first(), date(2024, 1, 11));
    assert_eq!(horizon.last(), date(2024, 1, 15));
    assert_eq!(
        horizon.dates(),
        &[
            date(2024, 1, 11),
            date(2024, 1, 12),
            date(2024, 1, 13),
            date(2024, 1, 14),
            date(2024, 1, 15),
        ]
    );
}

#[rstest]
#[case(date(2024, 1, 10), date(2024, 1, 10))]
#[case(date(2024, 1, 10), date(2024, 1, 9))]
#[case(date(2024, 1, 10), date(2023, 12, 31))]
fn test_resolve_rejects_non_future_dates(#[case] last: NaiveDate, #[case] target: NaiveDate) {
    let result = Horizon::resolve(last, target);

    match result {
        Err(ForecastError::NonFutureDate { target: t, last: l }) => {
            assert_eq!(t, target);
            assert_eq!(l, last);
        }
        other => panic!("expected NonFutureDate, got {:?}", other),
    }
}

#[test]
fn test_resolve_single_day_horizon() {
    let horizon = Horizon::resolve(date(2024, 1, 10), date(2024, 1, 11)).unwrap();

    assert_eq!(horizon.len(), 1);
    assert_eq!(horizon.first(), date(2024, 1, 11));
    assert_eq!(horizon.last(), date(2024, 1, 11));
}

#[test]
fn test_resolve_crosses_leap_day() {
    let horizon = Horizon::resolve(date(2024, 2, 27), date(2024, 3, 2)).unwrap();

    assert_eq!(horizon.len(), 4);
    assert_eq!(
        horizon.dates(),
        &[
            date(2024, 2, 28),
            date(2024, 2, 29),
            date(2024, 3, 1),
            date(2024, 3, 2),
        ]
    );
}

#[rstest]
#[case(date(2023, 12, 20), date(2024, 1, 20), 31)]
#[case(date(2024, 1, 10), date(2024, 4, 10), 91)]
#[case(date(2024, 1, 10), date(2025, 1, 10), 366)]
fn test_resolve_length_equals_day_difference(
    #[case] last: NaiveDate,
    #[case] target: NaiveDate,
    #[case] expected: usize,
) {
    let horizon = Horizon::resolve(last, target).unwrap();

    assert_eq!(horizon.len(), expected);
    assert_eq!(horizon.len() as i64, (target - last).num_days());
}

#[test]
fn test_resolve_dates_are_consecutive() {
    let horizon = Horizon::resolve(date(2024, 1, 1), date(2024, 3, 1)).unwrap();

    for pair in horizon.dates().windows(2) {
        assert_eq!((pair[1] - pair[0]).num_days(), 1);
    }
}

#[test]
fn test_parse_target_date() {
    assert_eq!(parse_target_date("2024-06-30").unwrap(), date(2024, 6, 30));
    assert_eq!(parse_target_date(" 2024-06-30 ").unwrap(), date(2024, 6, 30));
}

#[rstest]
#[case("tomorrow")]
#[case("2024-13-02")]
#[case("2024-02-30")]
#[case("30/06/2024")]
#[case("2024-06-30T00:00:00")]
#[case("")]
fn test_parse_target_date_rejects_malformed_input(#[case] raw: &str) {
    let result = parse_target_date(raw);

    match result {
        Err(ForecastError::MalformedDate { input, .. }) => assert_eq!(input, raw),
        other => panic!("expected MalformedDate, got {:?}", other),
    }
}
