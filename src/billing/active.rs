//! Active-window gating for partial-year clients

use crate::client::MONTHS_PER_YEAR;

/// Whether calendar `month` falls inside the client's billable window
///
/// The window is `active_months` consecutive months starting at the renewal
/// month and wrapping past December.
pub fn is_active(month: u32, renewal_month: u32, active_months: u32) -> bool {
    if active_months >= MONTHS_PER_YEAR {
        return true;
    }

    if month >= renewal_month {
        month < renewal_month + active_months
    } else {
        month + MONTHS_PER_YEAR - renewal_month < active_months
    }
}
