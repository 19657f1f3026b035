use chrono::{NaiveDate, NaiveDateTime, NaiveTime};

use crate::config::SessionConfig;
use crate::models::fund::{FundRecord, LiveEstimate};
use crate::models::settlement::{MarketPhase, ReturnSource, SettlementDecision};

/// Decides whether a fund's official NAV change or its live estimate is
/// authoritative at a given exchange-local moment.
///
/// Stateless: every call looks only at its inputs.
/// - weekend / holiday: official (the last settlement stands);
/// - settlement date is today: official (tonight's NAV is out);
/// - otherwise the official figure is stale: live estimate, labelled by the
///   session phase.
pub struct SettlementService {
    session: SessionConfig,
}

impl SettlementService {
    pub fn new(session: SessionConfig) -> Self {
        Self { session }
    }

    pub fn session(&self) -> &SessionConfig {
        &self.session
    }

    /// Session phase of a trading day at `time`, for a fund closing at `close`.
    pub fn phase_at(&self, time: NaiveTime, close: NaiveTime) -> MarketPhase {
        let s = &self.session;
        if time < s.open {
            MarketPhase::PreOpen
        } else if time < s.lunch_start {
            MarketPhase::InSession
        } else if time < s.lunch_end {
            MarketPhase::LunchBreak
        } else if time < close {
            MarketPhase::InSession
        } else {
            MarketPhase::AfterClose
        }
    }

    pub fn is_trading_day(&self, date: NaiveDate) -> bool {
        !SessionConfig::is_weekend(date) && !self.session.is_holiday(date)
    }

    /// Decide for a fund record at local time `now`.
    pub fn decide(&self, record: &FundRecord, now: NaiveDateTime) -> SettlementDecision {
        self.decide_parts(
            &record.display_name,
            record.official_return_percent,
            record.official_settlement_date,
            &record.live_estimate,
            now,
        )
    }

    pub fn decide_parts(
        &self,
        display_name: &str,
        official_return_percent: f64,
        official_settlement_date: NaiveDate,
        estimate: &LiveEstimate,
        now: NaiveDateTime,
    ) -> SettlementDecision {
        let today = now.date();

        if !self.is_trading_day(today) {
            let label = if SessionConfig::is_weekend(today) {
                format!("Market closed · settled NAV {official_settlement_date}")
            } else {
                format!("Market holiday · settled NAV {official_settlement_date}")
            };
            return SettlementDecision {
                authoritative_return_percent: official_return_percent,
                source_used: ReturnSource::Official,
                phase: MarketPhase::WeekendSettled,
                status_label: label,
            };
        }

        let close = self.session.close_for(display_name);
        let phase = self.phase_at(now.time(), close);

        // A date after today only happens with provider clock skew; it is settled.
        if official_settlement_date >= today {
            return SettlementDecision {
                authoritative_return_percent: official_return_percent,
                source_used: ReturnSource::Official,
                phase,
                status_label: "Today's NAV published".to_string(),
            };
        }

        let mut label = match phase {
            MarketPhase::PreOpen => "Pre-open · estimate".to_string(),
            MarketPhase::InSession => "In session · live estimate".to_string(),
            MarketPhase::LunchBreak => "Lunch break · estimate".to_string(),
            MarketPhase::AfterClose => "After close · awaiting NAV".to_string(),
            MarketPhase::WeekendSettled => "Market closed".to_string(),
        };
        if !estimate.is_available() {
            label.push_str(" (no estimate available)");
        }

        SettlementDecision {
            authoritative_return_percent: estimate.return_percent,
            source_used: ReturnSource::Estimate,
            phase,
            status_label: label,
        }
    }
}

impl Default for SettlementService {
    fn default() -> Self {
        Self::new(SessionConfig::default())
    }
}
