use chrono::{NaiveDate, NaiveDateTime};
use fund_valuation_core::models::analytics::{FundValuation, PositionOutcome, PositionValuation};
use fund_valuation_core::models::fund::{EstimateStatus, FundMetadata, FundRecord, LiveEstimate};
use fund_valuation_core::models::holding::{ResolvedHoldings, WeightedHolding};
use fund_valuation_core::models::instrument::{is_basket_code, Exchange, Instrument};
use fund_valuation_core::models::portfolio::Position;
use fund_valuation_core::models::quote::Quote;
use fund_valuation_core::models::settlement::{MarketPhase, ReturnSource, SettlementDecision};

fn d(y: i32, m: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, day).unwrap()
}

fn inst(raw: &str) -> Instrument {
    Instrument::parse(raw).unwrap()
}

fn approx(a: f64, b: f64) -> bool {
    (a - b).abs() < 1e-9
}

// ═══════════════════════════════════════════════════════════════════
//  Exchange routing
// ═══════════════════════════════════════════════════════════════════

mod exchange {
    use super::*;

    #[test]
    fn shanghai_prefixes() {
        assert_eq!(Exchange::infer("600519"), Some(Exchange::Sh));
        assert_eq!(Exchange::infer("510300"), Some(Exchange::Sh));
        assert_eq!(Exchange::infer("113050"), Some(Exchange::Sh));
        assert_eq!(Exchange::infer("688981"), Some(Exchange::Sh));
    }

    #[test]
    fn shenzhen_prefixes() {
        assert_eq!(Exchange::infer("000858"), Some(Exchange::Sz));
        assert_eq!(Exchange::infer("300750"), Some(Exchange::Sz));
        assert_eq!(Exchange::infer("159915"), Some(Exchange::Sz));
        assert_eq!(Exchange::infer("123001"), Some(Exchange::Sz));
    }

    #[test]
    fn beijing_prefixes() {
        assert_eq!(Exchange::infer("830799"), Some(Exchange::Beijing));
        assert_eq!(Exchange::infer("430047"), Some(Exchange::Beijing));
        assert_eq!(Exchange::infer("920002"), Some(Exchange::Beijing));
    }

    #[test]
    fn hong_kong_is_five_alphanumerics() {
        assert_eq!(Exchange::infer("00700"), Some(Exchange::Hk));
        assert_eq!(Exchange::infer("09988"), Some(Exchange::Hk));
    }

    #[test]
    fn unroutable_codes() {
        assert_eq!(Exchange::infer(""), None);
        assert_eq!(Exchange::infer("AAPL"), None);
        assert_eq!(Exchange::infer("700000"), None);
        assert_eq!(Exchange::infer("6005190"), None);
        assert_eq!(Exchange::infer("60051a"), None);
    }

    #[test]
    fn prefixes_and_display() {
        assert_eq!(Exchange::Sh.prefix(), "sh");
        assert_eq!(Exchange::Sz.prefix(), "sz");
        assert_eq!(Exchange::Hk.prefix(), "hk");
        assert_eq!(Exchange::Beijing.prefix(), "bj");
        assert_eq!(Exchange::Beijing.to_string(), "BJ");
    }
}

// ═══════════════════════════════════════════════════════════════════
//  Instrument
// ═══════════════════════════════════════════════════════════════════

mod instrument {
    use super::*;

    #[test]
    fn parse_bare_code() {
        let i = inst("600519");
        assert_eq!(i.symbol, "600519");
        assert_eq!(i.exchange, Exchange::Sh);
        assert!(!i.is_basket);
        assert_eq!(i.quote_code(), "sh600519");
    }

    #[test]
    fn parse_prefixed_code() {
        let i = inst("sh600519");
        assert_eq!(i.symbol, "600519");
        assert_eq!(i.exchange, Exchange::Sh);

        let j = inst("SZ000858");
        assert_eq!(j.symbol, "000858");
        assert_eq!(j.exchange, Exchange::Sz);
        assert_eq!(j.quote_code(), "sz000858");
    }

    #[test]
    fn prefixed_and_bare_are_the_same_instrument() {
        assert_eq!(inst("sh600519"), inst("600519"));
        assert_eq!(inst(" hk00700 "), inst("00700"));
    }

    #[test]
    fn hong_kong_quote_code() {
        let i = inst("hk00700");
        assert_eq!(i.exchange, Exchange::Hk);
        assert_eq!(i.quote_code(), "hk00700");
        assert!(!i.is_basket);
    }

    #[test]
    fn baskets_are_classified() {
        assert!(inst("510300").is_basket);
        assert!(inst("159915").is_basket);
        assert!(inst("560010").is_basket);
        assert!(inst("588000").is_basket);
        assert!(inst("sh513100").is_basket);
    }

    #[test]
    fn equities_are_not_baskets() {
        assert!(!inst("000858").is_basket);
        assert!(!inst("150001").is_basket);
        assert!(!inst("600036").is_basket);
        assert!(!inst("830799").is_basket);
    }

    #[test]
    fn unparsable_tickers() {
        assert!(Instrument::parse("").is_none());
        assert!(Instrument::parse("sh").is_none());
        assert!(Instrument::parse("xx600519").is_none());
        assert!(Instrument::parse("TSLA").is_none());
    }

    #[test]
    fn basket_code_helper() {
        assert!(is_basket_code("159915"));
        assert!(!is_basket_code("15991"));
        assert!(!is_basket_code("600519"));
    }

    #[test]
    fn display_is_quote_code() {
        assert_eq!(inst("000858").to_string(), "sz000858");
    }
}

// ═══════════════════════════════════════════════════════════════════
//  Quote
// ═══════════════════════════════════════════════════════════════════

mod quote {
    use super::*;

    #[test]
    fn rising_price() {
        let q = Quote::new(inst("600519"), 102.0, 100.0);
        assert!(approx(q.change_percent(), 2.0));
    }

    #[test]
    fn falling_price() {
        let q = Quote::new(inst("000858"), 99.0, 100.0);
        assert!(approx(q.change_percent(), -1.0));
    }

    #[test]
    fn zero_previous_close_is_exactly_zero() {
        let q = Quote::new(inst("600519"), 12.0, 0.0);
        assert_eq!(q.change_percent(), 0.0);
    }

    #[test]
    fn negative_previous_close_is_exactly_zero() {
        let q = Quote::new(inst("600519"), 12.0, -3.0);
        assert_eq!(q.change_percent(), 0.0);
    }

    #[test]
    fn nan_inputs_never_leak() {
        let q = Quote::new(inst("600519"), f64::NAN, 10.0);
        assert_eq!(q.change_percent(), 0.0);
        let q = Quote::new(inst("600519"), 10.0, f64::NAN);
        assert_eq!(q.change_percent(), 0.0);
    }

    #[test]
    fn halted_price_uses_previous_close() {
        let q = Quote::new(inst("600519"), 0.0, 1500.0);
        assert_eq!(q.effective_price(), 1500.0);
        assert_eq!(q.change_percent(), 0.0);
    }

    #[test]
    fn flat_quote_is_zero_change() {
        let q = Quote::flat(inst("00700"));
        assert_eq!(q.change_percent(), 0.0);
        assert!(q.as_of.is_none());
    }

    #[test]
    fn with_as_of() {
        let ts = NaiveDateTime::parse_from_str("2025-01-06 10:15:00", "%Y-%m-%d %H:%M:%S").unwrap();
        let q = Quote::new(inst("600519"), 1.0, 1.0).with_as_of(ts);
        assert_eq!(q.as_of, Some(ts));
    }
}

// ═══════════════════════════════════════════════════════════════════
//  Holdings, estimates, records
// ═══════════════════════════════════════════════════════════════════

mod holdings {
    use super::*;

    #[test]
    fn total_weight_is_disclosed_sum() {
        let resolved = ResolvedHoldings {
            fund_id: "000001".into(),
            source_id: Some("000001".into()),
            path: vec!["000001".into()],
            holdings: vec![
                WeightedHolding::new(inst("600519"), 40.0),
                WeightedHolding::new(inst("000858"), 22.0),
            ],
        };
        assert!(approx(resolved.total_weight(), 62.0));
        assert!(!resolved.is_empty());
    }

    #[test]
    fn empty_resolution() {
        let resolved = ResolvedHoldings::empty("000001", vec!["000001".into()]);
        assert!(resolved.is_empty());
        assert_eq!(resolved.source_id, None);
        assert_eq!(resolved.total_weight(), 0.0);
    }
}

mod estimates {
    use super::*;

    #[test]
    fn no_data_is_distinct_from_zero_change() {
        let none = LiveEstimate::no_data();
        let flat = LiveEstimate {
            return_percent: 0.0,
            raw_return_percent: 0.0,
            factor: 0.92,
            status: EstimateStatus::Estimated,
            quoted: 3,
            fallbacks: 0,
        };
        assert_eq!(none.return_percent, flat.return_percent);
        assert!(!none.is_available());
        assert!(flat.is_available());
        assert_ne!(none, flat);
    }

    #[test]
    fn record_from_metadata() {
        let meta = FundMetadata {
            display_name: "Test Growth Mixed".into(),
            official_return_percent: 1.25,
            official_settlement_date: d(2025, 1, 3),
        };
        let record = FundRecord::new("005827", meta, LiveEstimate::no_data());
        assert_eq!(record.fund_id, "005827");
        assert_eq!(record.display_name, "Test Growth Mixed");
        assert_eq!(record.official_return_percent, 1.25);
        assert_eq!(record.official_settlement_date, d(2025, 1, 3));
        assert_eq!(record.live_estimate_return_percent(), 0.0);
    }
}

mod settlement_types {
    use super::*;

    #[test]
    fn phase_display() {
        assert_eq!(MarketPhase::PreOpen.to_string(), "PRE_OPEN");
        assert_eq!(MarketPhase::InSession.to_string(), "IN_SESSION");
        assert_eq!(MarketPhase::LunchBreak.to_string(), "LUNCH_BREAK");
        assert_eq!(MarketPhase::AfterClose.to_string(), "AFTER_CLOSE");
        assert_eq!(MarketPhase::WeekendSettled.to_string(), "WEEKEND_SETTLED");
    }

    #[test]
    fn source_display() {
        assert_eq!(ReturnSource::Official.to_string(), "OFFICIAL");
        assert_eq!(ReturnSource::Estimate.to_string(), "ESTIMATE");
    }
}

mod positions {
    use super::*;

    #[test]
    fn position_trims_fund_id() {
        let p = Position::new(" 005827 ", 1000.0);
        assert_eq!(p.fund_id, "005827");
        assert_eq!(p.held_amount, 1000.0);
    }

    #[test]
    fn unresolvable_has_no_profit_loss() {
        let pv = PositionValuation {
            position: Position::new("999999", 100.0),
            outcome: PositionOutcome::Unresolvable,
        };
        assert_eq!(pv.profit_loss(), None);
        assert!(!pv.is_resolved());
    }

    #[test]
    fn valued_position_exposes_profit_loss() {
        let meta = FundMetadata {
            display_name: "X".into(),
            official_return_percent: 1.0,
            official_settlement_date: d(2025, 1, 3),
        };
        let valuation = FundValuation {
            record: FundRecord::new("000001", meta, LiveEstimate::no_data()),
            holdings: ResolvedHoldings::empty("000001", vec![]),
            decision: SettlementDecision {
                authoritative_return_percent: 1.0,
                source_used: ReturnSource::Official,
                phase: MarketPhase::WeekendSettled,
                status_label: "closed".into(),
            },
        };
        assert_eq!(valuation.authoritative_return_percent(), 1.0);
        let pv = PositionValuation {
            position: Position::new("000001", 500.0),
            outcome: PositionOutcome::Valued {
                valuation: Box::new(valuation),
                profit_loss: 5.0,
            },
        };
        assert_eq!(pv.profit_loss(), Some(5.0));
        assert!(pv.is_resolved());
    }
}
