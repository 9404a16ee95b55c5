//! Appointment views shared by the dashboards, the patient's appointment
//! pages and the calendar: upcoming/history partitions, the month grid
//! with its inline cap, and day selection.

use chrono::{Datelike, Months, NaiveDate, NaiveDateTime};
use serde::Serialize;

use crate::models::{Incident, IncidentStatus, PatientSummary};

/// Entries shown inline per calendar day before "+N more".
pub const MAX_INLINE_ENTRIES: usize = 2;

/// Upcoming entries on the admin dashboard.
pub const DASHBOARD_UPCOMING_LIMIT: usize = 10;

/// Scheduled incidents at or after `now`, soonest first.
pub fn upcoming<'a, I>(incidents: I, now: NaiveDateTime) -> Vec<&'a Incident>
where
    I: IntoIterator<Item = &'a Incident>,
{
    let mut list: Vec<&Incident> = incidents
        .into_iter()
        .filter(|i| i.status == IncidentStatus::Scheduled && i.appointment_date >= now)
        .collect();
    list.sort_by_key(|i| i.appointment_date);
    list
}

/// `upcoming`, truncated to `limit` entries.
pub fn upcoming_limited<'a, I>(incidents: I, now: NaiveDateTime, limit: usize) -> Vec<&'a Incident>
where
    I: IntoIterator<Item = &'a Incident>,
{
    let mut list = upcoming(incidents, now);
    list.truncate(limit);
    list
}

/// Completed incidents plus anything dated before `now`, most recent first.
pub fn history<'a, I>(incidents: I, now: NaiveDateTime) -> Vec<&'a Incident>
where
    I: IntoIterator<Item = &'a Incident>,
{
    let mut list: Vec<&Incident> = incidents
        .into_iter()
        .filter(|i| i.status == IncidentStatus::Completed || i.appointment_date < now)
        .collect();
    list.sort_by(|a, b| b.appointment_date.cmp(&a.appointment_date));
    list
}

/// Counts for one patient's dashboard.
pub fn patient_summary<'a, I>(incidents: I, now: NaiveDateTime) -> PatientSummary
where
    I: IntoIterator<Item = &'a Incident>,
{
    let incidents: Vec<&Incident> = incidents.into_iter().collect();
    let completed: Vec<&&Incident> = incidents.iter().filter(|i| i.is_completed()).collect();
    PatientSummary {
        upcoming_appointments: upcoming(incidents.iter().copied(), now).len(),
        completed_treatments: completed.len(),
        total_spent: completed.iter().map(|i| i.cost_or_zero()).sum(),
    }
}

/// Every incident on the given calendar day, in store order, uncapped.
pub fn incidents_on(incidents: &[Incident], date: NaiveDate) -> Vec<&Incident> {
    incidents
        .iter()
        .filter(|i| i.appointment_date.date() == date)
        .collect()
}

// ═══════════════════════════════════════════
// Month navigation
// ═══════════════════════════════════════════

/// The month currently displayed by the calendar.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct MonthCursor {
    year: i32,
    month: u32,
}

impl MonthCursor {
    /// `None` when `month` is outside 1..=12 or the year is out of range.
    pub fn new(year: i32, month: u32) -> Option<Self> {
        NaiveDate::from_ymd_opt(year, month, 1).map(|_| Self { year, month })
    }

    pub fn containing(date: NaiveDate) -> Self {
        Self {
            year: date.year(),
            month: date.month(),
        }
    }

    pub fn year(&self) -> i32 {
        self.year
    }

    pub fn month(&self) -> u32 {
        self.month
    }

    pub fn first_day(&self) -> NaiveDate {
        NaiveDate::from_ymd_opt(self.year, self.month, 1).unwrap_or(NaiveDate::MIN)
    }

    pub fn next(&self) -> Self {
        self.shift(|d| d.checked_add_months(Months::new(1)))
    }

    pub fn previous(&self) -> Self {
        self.shift(|d| d.checked_sub_months(Months::new(1)))
    }

    pub fn days_in_month(&self) -> u32 {
        let first = self.first_day();
        match first.checked_add_months(Months::new(1)) {
            Some(next) => (next - first).num_days() as u32,
            None => 31,
        }
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        date.year() == self.year && date.month() == self.month
    }

    // Stays put at the edges of the representable calendar.
    fn shift(&self, f: impl Fn(NaiveDate) -> Option<NaiveDate>) -> Self {
        f(self.first_day()).map(Self::containing).unwrap_or(*self)
    }
}

// ═══════════════════════════════════════════
// Month grid
// ═══════════════════════════════════════════

/// One day of the month grid.
#[derive(Debug, Clone, Serialize)]
pub struct DayCell<'a> {
    pub date: NaiveDate,
    /// At most `MAX_INLINE_ENTRIES`, in store order.
    pub entries: Vec<&'a Incident>,
    /// Entries beyond the inline cap ("+N more").
    pub overflow: usize,
    pub is_today: bool,
    pub is_selected: bool,
}

impl DayCell<'_> {
    pub fn total(&self) -> usize {
        self.entries.len() + self.overflow
    }
}

/// Sunday-first month layout.
#[derive(Debug, Clone, Serialize)]
pub struct MonthGrid<'a> {
    pub cursor: MonthCursor,
    /// Empty cells before day 1.
    pub leading_blanks: usize,
    pub days: Vec<DayCell<'a>>,
}

impl<'a> MonthGrid<'a> {
    pub fn build(
        incidents: &'a [Incident],
        cursor: MonthCursor,
        today: NaiveDate,
        selected: Option<NaiveDate>,
    ) -> Self {
        let first = cursor.first_day();
        let mut days: Vec<DayCell<'a>> = first
            .iter_days()
            .take(cursor.days_in_month() as usize)
            .map(|date| DayCell {
                date,
                entries: Vec::new(),
                overflow: 0,
                is_today: date == today,
                is_selected: selected == Some(date),
            })
            .collect();

        for incident in incidents {
            let date = incident.appointment_date.date();
            if !cursor.contains(date) {
                continue;
            }
            let cell = &mut days[date.day0() as usize];
            if cell.entries.len() < MAX_INLINE_ENTRIES {
                cell.entries.push(incident);
            } else {
                cell.overflow += 1;
            }
        }

        Self {
            cursor,
            leading_blanks: first.weekday().num_days_from_sunday() as usize,
            days,
        }
    }

    pub fn day(&self, day_of_month: u32) -> Option<&DayCell<'a>> {
        self.days.get(day_of_month.checked_sub(1)? as usize)
    }

    /// Incidents falling in the displayed month.
    pub fn total_entries(&self) -> usize {
        self.days.iter().map(DayCell::total).sum()
    }
}
