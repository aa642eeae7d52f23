//! Delinquency calculator.
//!
//! Pure calendar arithmetic: given a financed sale, its payment history and
//! "today", compute the due date and how many whole days late the sale is.
//! The business operates in a single fixed civil timezone, so every
//! comparison happens on local calendar dates; callers derive `today` once
//! at the boundary via [`local_today`] and pass it in. The calculator never
//! reads the clock, which keeps it deterministic and idempotent.

use chrono::{Days, Months, NaiveDate, Utc};
use chrono_tz::Tz;
use credilock_domain::constants::{
    DAILY_PERIOD_DAYS, FORTNIGHTLY_PERIOD_DAYS, WEEKLY_PERIOD_DAYS,
};
use credilock_domain::{Delinquency, FinancedSale, Payment, PaymentFrequency};

/// Today's date in the business civil calendar.
pub fn local_today(tz: Tz) -> NaiveDate {
    Utc::now().with_timezone(&tz).date_naive()
}

/// Compute delinquency for one sale.
///
/// The anchor is the most recent payment date, or the sale date when no
/// payment has been made yet. The due date is the anchor advanced by one
/// payment period; `days_late` is the whole-day distance from the due date
/// to `today`, floored at zero.
pub fn delinquency(sale: &FinancedSale, payments: &[Payment], today: NaiveDate) -> Delinquency {
    let anchor = payments.iter().map(|p| p.paid_at).max().unwrap_or(sale.sale_date);
    let due_date = advance_one_period(anchor, sale.frequency);
    let days_late = (today - due_date).num_days().max(0);

    Delinquency { days_late, due_date, is_overdue: days_late > 0 }
}

fn advance_one_period(anchor: NaiveDate, frequency: PaymentFrequency) -> NaiveDate {
    let add_days = |days: i64| anchor.checked_add_days(Days::new(days as u64));
    match frequency {
        PaymentFrequency::Daily => add_days(DAILY_PERIOD_DAYS),
        PaymentFrequency::Weekly => add_days(WEEKLY_PERIOD_DAYS),
        PaymentFrequency::Fortnightly => add_days(FORTNIGHTLY_PERIOD_DAYS),
        PaymentFrequency::Monthly => anchor.checked_add_months(Months::new(1)),
    }
    .unwrap_or(NaiveDate::MAX)
}
