use std::str::FromStr;

use bigdecimal::BigDecimal;
use chrono::TimeZone;

use crate::collaborators::{Base64SecurityProvider, FixedClock, SecurityProvider};
use crate::config::EngineConfig;
use crate::functions::{self, FunctionRegistry};
use crate::services::Services;
use crate::value::Value;

fn with_services<T>(f: impl FnOnce(&Services) -> T) -> T {
    let config = EngineConfig::default();
    let registry = FunctionRegistry::standard();
    let clock = FixedClock(chrono::Utc.with_ymd_and_hms(2024, 3, 15, 9, 30, 0).unwrap());
    let security = Base64SecurityProvider;
    let services = Services {
        config: &config,
        functions: &registry,
        http: None,
        clock: &clock,
        security: &security,
    };
    f(&services)
}

fn num(text: &str) -> Value {
    Value::Number(BigDecimal::from_str(text).unwrap())
}

#[test]
fn date_parsing_accepts_common_layouts() {
    for text in ["2024-03-15", "03/15/2024", "15-03-2024", "2024/03/15", "15 Mar 2024"] {
        let parsed = functions::datetime::parse_date(text);
        assert_eq!(
            parsed.map(|d| d.to_string()).as_deref(),
            Some("2024-03-15"),
            "layout {}",
            text
        );
    }
    assert!(functions::datetime::parse_date("not a date").is_none());
}

#[test]
fn dateadd_units_and_aliases() {
    with_services(|services| {
        let cases = [
            (("2024-01-31", "1", "days"), "2024-02-01"),
            (("2024-01-01", "2", "w"), "2024-01-15"),
            (("2024-01-31", "1", "month"), "2024-02-29"),
            (("2024-02-29", "1", "years"), "2025-02-28"),
        ];
        for ((date, amount, unit), expected) in cases {
            let result = functions::datetime::dateadd(
                &[Value::from(date), num(amount), Value::from(unit)],
                services,
            )
            .unwrap();
            assert_eq!(result, Value::from(expected), "{} + {} {}", date, amount, unit);
        }
    });
}

#[test]
fn datediff_whole_months_and_years() {
    with_services(|services| {
        let days = functions::datetime::datediff(
            &[Value::from("2024-01-01"), Value::from("2024-03-01")],
            services,
        )
        .unwrap();
        assert_eq!(days, num("60"));

        let months = functions::datetime::datediff(
            &[Value::from("2024-01-15"), Value::from("2024-03-14"), Value::from("months")],
            services,
        )
        .unwrap();
        assert_eq!(months, num("1"));

        let years = functions::datetime::datediff(
            &[Value::from("2000-06-01"), Value::from("2024-03-15"), Value::from("years")],
            services,
        )
        .unwrap();
        assert_eq!(years, num("23"));
    });
}

#[test]
fn clock_driven_functions_use_the_injected_clock() {
    with_services(|services| {
        assert_eq!(
            functions::datetime::today(&[], services).unwrap(),
            Value::from("2024-03-15")
        );
        assert_eq!(
            functions::datetime::time_hour(&[], services).unwrap(),
            num("9")
        );
        // 2024-03-15 is a Friday
        assert_eq!(
            functions::validation::is_business_day(&[], services).unwrap(),
            Value::Boolean(true)
        );
        assert_eq!(
            functions::validation::is_weekend(&[Value::from("2024-03-16")], services).unwrap(),
            Value::Boolean(true)
        );
    });
}

#[test]
fn validation_predicates() {
    with_services(|services| {
        let t = Value::Boolean(true);
        let f = Value::Boolean(false);

        assert_eq!(
            functions::validation::is_email(&[Value::from("a.b@lender.example.com")], services).unwrap(),
            t
        );
        assert_eq!(
            functions::validation::is_email(&[Value::from("not-an-email")], services).unwrap(),
            f
        );
        assert_eq!(
            functions::validation::is_phone(&[Value::from("+1 (555) 123-4567")], services).unwrap(),
            t
        );
        assert_eq!(
            functions::validation::is_ssn(&[Value::from("123-45-6789")], services).unwrap(),
            t
        );
        assert_eq!(
            functions::validation::is_credit_score(&[num("650")], services).unwrap(),
            t
        );
        assert_eq!(
            functions::validation::is_credit_score(&[num("851")], services).unwrap(),
            f
        );
        assert_eq!(
            functions::validation::is_account_number(&[Value::from("12345678")], services).unwrap(),
            t
        );
        assert_eq!(
            functions::validation::is_account_number(&[Value::from("1234567")], services).unwrap(),
            f
        );
        assert_eq!(
            functions::validation::length_equals(&[Value::from("abcd"), num("4")], services).unwrap(),
            t
        );
    });
}

#[test]
fn financial_null_on_zero_denominators() {
    with_services(|services| {
        assert_eq!(
            functions::financial::debt_to_income_ratio(&[num("100"), num("0")], services).unwrap(),
            Value::Null
        );
        assert_eq!(
            functions::financial::credit_utilization(&[num("100"), num("0")], services).unwrap(),
            Value::Null
        );
        assert_eq!(
            functions::financial::loan_payment(&[num("1000"), num("5"), num("0")], services).unwrap(),
            Value::Null
        );
        assert_eq!(
            functions::financial::payment_history_score(&[num("0"), num("0")], services).unwrap(),
            Value::Null
        );
    });
}

#[test]
fn zero_rate_loans_amortize_linearly() {
    with_services(|services| {
        assert_eq!(
            functions::financial::loan_payment(&[num("1200"), num("0"), num("12")], services).unwrap(),
            num("100.00")
        );
    });
}

#[test]
fn amortization_summary_shape() {
    with_services(|services| {
        let result =
            functions::financial::amortization(&[num("200000"), num("6"), num("360")], services)
                .unwrap();
        let Value::Map(summary) = result else { panic!("expected a map") };
        assert_eq!(summary.get("monthly_payment"), Some(&num("1199.10")));
        assert_eq!(summary.get("total_paid"), Some(&num("431676.00")));
        assert_eq!(summary.get("total_interest"), Some(&num("231676.00")));
    });
}

#[test]
fn payment_history_percentage() {
    with_services(|services| {
        assert_eq!(
            functions::financial::payment_history_score(&[num("23"), num("24")], services).unwrap(),
            num("95.83")
        );
    });
}

#[test]
fn string_functions() {
    with_services(|services| {
        assert_eq!(
            functions::string::substring(&[Value::from("creditScore"), num("0"), num("6")], services)
                .unwrap(),
            Value::from("credit")
        );
        assert_eq!(
            functions::string::substring(&[Value::from("abc"), num("1")], services).unwrap(),
            Value::from("bc")
        );
        assert_eq!(
            functions::string::replace(
                &[Value::from("a-b-c"), Value::from("-"), Value::from("_")],
                services
            )
            .unwrap(),
            Value::from("a_b_c")
        );
        assert_eq!(
            functions::string::trim(&[Value::from("  x  ")], services).unwrap(),
            Value::from("x")
        );
    });
}

#[test]
fn conversions_match_implicit_coercions() {
    with_services(|services| {
        assert_eq!(
            functions::convert::tonumber(&[Value::from("42.5")], services).unwrap(),
            num("42.5")
        );
        assert_eq!(
            functions::convert::tonumber(&[Value::from("nope")], services).unwrap(),
            Value::Null
        );
        assert_eq!(
            functions::convert::toboolean(&[num("0")], services).unwrap(),
            Value::Boolean(false)
        );
        assert_eq!(
            functions::convert::tostring(&[num("7")], services).unwrap(),
            Value::from("7")
        );
    });
}

#[test]
fn aggregates_over_lists() {
    with_services(|services| {
        let list = Value::List(vec![num("1"), num("2"), num("3"), num("4")]);
        assert_eq!(functions::aggregate::sum(&[list.clone()], services).unwrap(), num("10"));
        assert_eq!(functions::aggregate::avg(&[list.clone()], services).unwrap(), num("2.5"));
        assert_eq!(functions::aggregate::first(&[list.clone()], services).unwrap(), num("1"));
        assert_eq!(functions::aggregate::last(&[list.clone()], services).unwrap(), num("4"));
        assert_eq!(functions::aggregate::size(&[list], services).unwrap(), num("4"));
        assert_eq!(
            functions::aggregate::first(&[Value::List(Vec::new())], services).unwrap(),
            Value::Null
        );
    });
}

#[test]
fn security_round_trip_and_mask() {
    with_services(|services| {
        let cipher = functions::security::encrypt(&[Value::from("secret")], services).unwrap();
        assert_ne!(cipher, Value::from("secret"));
        assert_eq!(
            functions::security::decrypt(&[cipher], services).unwrap(),
            Value::from("secret")
        );
        assert_eq!(
            functions::security::mask_data(&[Value::from("123456789")], services).unwrap(),
            Value::from("*****6789")
        );
    });

    let provider = Base64SecurityProvider;
    assert_eq!(provider.mask("abc"), "***");
}
