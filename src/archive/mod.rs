//! Archive groupings over the journal history.
//!
//! These are plain views of the newest-first history: a daily timeline,
//! weekly buckets, and a yearly month-by-month summary. Nothing here
//! modifies or reorders the history itself.

use chrono::Datelike;

use crate::reflection::Reflection;

/// Number of images shown per weekly bucket.
pub const WEEKLY_IMAGE_LIMIT: usize = 4;

/// Uppercase English month names, in calendar order.
pub const MONTH_NAMES: [&str; 12] = [
    "JANUARY",
    "FEBRUARY",
    "MARCH",
    "APRIL",
    "MAY",
    "JUNE",
    "JULY",
    "AUGUST",
    "SEPTEMBER",
    "OCTOBER",
    "NOVEMBER",
    "DECEMBER",
];

/// A verse string split into its text and reference.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Verse<'a> {
    pub text: &'a str,
    pub reference: Option<&'a str>,
}

impl<'a> Verse<'a> {
    /// Splits `"<text> (<reference>)"` at the first `" ("`.
    ///
    /// Strings without that separator are all text.
    pub fn parse(verse: &'a str) -> Self {
        match verse.split_once(" (") {
            Some((text, rest)) => {
                let reference = rest.split(" (").next().unwrap_or(rest);
                let reference = reference.strip_suffix(')').unwrap_or(reference);
                Self {
                    text,
                    reference: Some(reference),
                }
            }
            None => Self {
                text: verse,
                reference: None,
            },
        }
    }
}

/// One entry of the daily timeline.
#[derive(Debug, Clone, PartialEq)]
pub struct DailyEntry<'a> {
    pub reflection: &'a Reflection,
    /// Present only for illustrated entries that carry a verse.
    pub verse: Option<Verse<'a>>,
}

/// The daily timeline, newest first.
pub fn daily(history: &[Reflection]) -> Vec<DailyEntry<'_>> {
    history
        .iter()
        .map(|reflection| DailyEntry {
            reflection,
            verse: reflection
                .bible_verse
                .as_deref()
                .filter(|_| !reflection.image.is_empty())
                .map(Verse::parse),
        })
        .collect()
}

/// Reflections from one ISO week.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WeeklyBucket {
    pub year: i32,
    pub week: u32,
    pub count: usize,
    /// Up to [`WEEKLY_IMAGE_LIMIT`] images, newest first.
    pub images: Vec<String>,
}

/// Groups the history by ISO week, newest week first.
pub fn weekly(history: &[Reflection]) -> Vec<WeeklyBucket> {
    let mut buckets: Vec<WeeklyBucket> = Vec::new();

    for reflection in history {
        let iso = reflection.created_at.iso_week();
        let (year, week) = (iso.year(), iso.week());

        let index = match buckets.iter().position(|b| b.year == year && b.week == week) {
            Some(index) => index,
            None => {
                buckets.push(WeeklyBucket {
                    year,
                    week,
                    count: 0,
                    images: Vec::new(),
                });
                buckets.len() - 1
            }
        };

        let bucket = &mut buckets[index];
        bucket.count += 1;
        if !reflection.image.is_empty() && bucket.images.len() < WEEKLY_IMAGE_LIMIT {
            bucket.images.push(reflection.image.clone());
        }
    }

    buckets.sort_by(|a, b| (b.year, b.week).cmp(&(a.year, a.week)));
    buckets
}

/// One month of the yearly summary.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MonthSummary {
    pub name: &'static str,
    pub short_name: &'static str,
    pub count: usize,
    /// Newest illustrated entry of the month.
    pub hero_image: Option<String>,
}

/// Month-by-month summary of one year.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct YearlySummary {
    pub year: i32,
    pub total: usize,
    pub active_months: usize,
    pub months: Vec<MonthSummary>,
}

/// Summarizes the reflections created in `year`.
pub fn yearly(history: &[Reflection], year: i32) -> YearlySummary {
    let in_year: Vec<&Reflection> = history
        .iter()
        .filter(|r| r.created_at.year() == year)
        .collect();

    let months: Vec<MonthSummary> = MONTH_NAMES
        .iter()
        .map(|&name| {
            let in_month: Vec<&&Reflection> = in_year.iter().filter(|r| r.month == name).collect();
            MonthSummary {
                name,
                short_name: &name[..3],
                count: in_month.len(),
                hero_image: in_month
                    .iter()
                    .find(|r| !r.image.is_empty())
                    .map(|r| r.image.clone()),
            }
        })
        .collect();

    YearlySummary {
        year,
        total: in_year.len(),
        active_months: months.iter().filter(|m| m.count > 0).count(),
        months,
    }
}
