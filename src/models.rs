use chrono::{Datelike, Duration, NaiveDate};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DonationStatus {
    Completed,
    Pending,
}

impl DonationStatus {
    /// Unknown statuses are treated as pending so they never count as income.
    pub fn parse(raw: &str) -> Self {
        if raw.trim().eq_ignore_ascii_case("completed") {
            DonationStatus::Completed
        } else {
            DonationStatus::Pending
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            DonationStatus::Completed => "completed",
            DonationStatus::Pending => "pending",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Donation {
    pub id: i64,
    pub amount: f64,
    pub date: Option<NaiveDate>,
    pub donor_name: Option<String>,
    pub is_anonymous: bool,
    pub status: DonationStatus,
    pub is_recurring: bool,
    pub campaign_id: Option<i64>,
}

impl Donation {
    pub fn is_completed(&self) -> bool {
        self.status == DonationStatus::Completed
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CatRef {
    pub id: i64,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Expense {
    pub id: i64,
    pub amount: f64,
    pub date: Option<NaiveDate>,
    pub category: Option<String>,
    pub description: String,
    pub vendor: Option<String>,
    pub payment_method: Option<String>,
    pub cat: Option<CatRef>,
    pub donation_id: Option<i64>,
}

/// Annual allocation for a named spending bucket, with spend to date.
#[derive(Debug, Clone, PartialEq)]
pub struct BudgetCategory {
    pub id: i64,
    pub name: String,
    pub allocated: f64,
    pub spent: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Campaign {
    pub id: i64,
    pub name: String,
    pub description: Option<String>,
    pub target: f64,
    pub raised: f64,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub category: Option<String>,
}

/// Inclusive calendar window.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateRange {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl DateRange {
    pub fn new(start: NaiveDate, end: NaiveDate) -> Self {
        if start <= end {
            Self { start, end }
        } else {
            Self { start: end, end: start }
        }
    }

    pub fn year(year: i32) -> Option<Self> {
        Some(Self {
            start: NaiveDate::from_ymd_opt(year, 1, 1)?,
            end: NaiveDate::from_ymd_opt(year, 12, 31)?,
        })
    }

    pub fn year_to_date(today: NaiveDate) -> Self {
        let start = NaiveDate::from_ymd_opt(today.year(), 1, 1).unwrap_or(today);
        Self { start, end: today }
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        self.start <= date && date <= self.end
    }

    pub fn len_days(&self) -> i64 {
        (self.end - self.start).num_days() + 1
    }

    /// The window of equal length ending the day before this one starts.
    /// `None` when that window would fall before the earliest representable date.
    pub fn previous(&self) -> Option<Self> {
        let end = self.start.checked_sub_signed(Duration::days(1))?;
        let start = end.checked_sub_signed(Duration::days(self.len_days() - 1))?;
        Some(Self { start, end })
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DonationFilter {
    pub status: Option<DonationStatus>,
    pub range: Option<DateRange>,
}

impl DonationFilter {
    pub fn completed() -> Self {
        Self {
            status: Some(DonationStatus::Completed),
            range: None,
        }
    }

    pub fn completed_in(range: DateRange) -> Self {
        Self {
            status: Some(DonationStatus::Completed),
            range: Some(range),
        }
    }

    pub fn matches(&self, donation: &Donation) -> bool {
        if let Some(status) = self.status {
            if donation.status != status {
                return false;
            }
        }
        match (self.range, donation.date) {
            (Some(range), Some(date)) => range.contains(date),
            (Some(_), None) => false,
            (None, _) => true,
        }
    }
}
