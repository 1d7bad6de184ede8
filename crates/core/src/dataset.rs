use crate::domain::price::PriceRecord;
use anyhow::bail;
use chrono::{Datelike, NaiveDate};

/// Frozen, date-ordered price history. Constructed once and only read afterwards.
#[derive(Debug, Clone, Default)]
pub struct Dataset {
    records: Vec<PriceRecord>,
}

impl Dataset {
    /// Sorts by date and rejects duplicate dates.
    pub fn new(mut records: Vec<PriceRecord>) -> anyhow::Result<Self> {
        records.sort_by_key(|r| r.date);

        if let Some(pair) = records.windows(2).find(|w| w[0].date == w[1].date) {
            bail!("duplicate record for date {}", pair[0].date);
        }

        Ok(Self { records })
    }

    /// All records dated within `year`, ascending. Empty when nothing matches.
    pub fn records_for_year(&self, year: i32) -> &[PriceRecord] {
        let (Some(start), Some(end)) = (
            NaiveDate::from_ymd_opt(year, 1, 1),
            NaiveDate::from_ymd_opt(year, 12, 31),
        ) else {
            return &[];
        };

        let lo = self.records.partition_point(|r| r.date < start);
        let hi = self.records.partition_point(|r| r.date <= end);
        &self.records[lo..hi]
    }

    pub fn records(&self) -> &[PriceRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn first_date(&self) -> Option<NaiveDate> {
        self.records.first().map(|r| r.date)
    }

    pub fn last_date(&self) -> Option<NaiveDate> {
        self.records.last().map(|r| r.date)
    }

    /// Distinct years present, ascending.
    pub fn years(&self) -> Vec<i32> {
        let mut out: Vec<i32> = Vec::new();
        for r in &self.records {
            let y = r.date.year();
            if out.last() != Some(&y) {
                out.push(y);
            }
        }
        out
    }
}
