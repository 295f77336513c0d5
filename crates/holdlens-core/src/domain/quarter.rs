use std::fmt::{Display, Formatter};
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use time::macros::format_description;
use time::{Date, Month, OffsetDateTime};

use crate::ValidationError;

/// Calendar reporting quarter, totally ordered by (year, quarter).
///
/// Displays as `Q4 2024`. Parsing also accepts `2024Q4` and `2024-Q4`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Quarter {
    year: i32,
    number: u8,
}

impl Quarter {
    pub fn new(year: i32, number: u8) -> Result<Self, ValidationError> {
        if !(1..=4).contains(&number) || !(1900..=9999).contains(&year) {
            return Err(ValidationError::InvalidQuarter {
                value: format!("Q{number} {year}"),
            });
        }
        Ok(Self { year, number })
    }

    pub fn parse(input: &str) -> Result<Self, ValidationError> {
        let invalid = || ValidationError::InvalidQuarter {
            value: input.to_owned(),
        };
        let compact: String = input
            .trim()
            .to_ascii_uppercase()
            .chars()
            .filter(|ch| !ch.is_whitespace() && *ch != '-')
            .collect();
        if !compact.is_ascii() {
            return Err(invalid());
        }

        let (year, number) = if let Some(rest) = compact.strip_prefix('Q') {
            // Q4 2024
            let (number, year) = rest.split_at(rest.len().min(1));
            (year, number)
        } else if let Some(position) = compact.find('Q') {
            // 2024Q4
            let (year, number) = compact.split_at(position);
            (year, &number[1..])
        } else {
            return Err(invalid());
        };

        if year.len() != 4 || number.len() != 1 {
            return Err(invalid());
        }
        let year = year.parse::<i32>().map_err(|_| invalid())?;
        let number = number.parse::<u8>().map_err(|_| invalid())?;
        Self::new(year, number).map_err(|_| invalid())
    }

    /// Quarter containing a calendar date.
    pub fn containing(date: Date) -> Self {
        let number = (u8::from(date.month()) - 1) / 3 + 1;
        Self {
            year: date.year(),
            number,
        }
    }

    /// Quarter of a filing report date (`YYYY-MM-DD`).
    pub fn from_report_date(input: &str) -> Result<Self, ValidationError> {
        let date = Date::parse(input.trim(), format_description!("[year]-[month]-[day]"))
            .map_err(|_| ValidationError::InvalidReportDate {
                value: input.to_owned(),
            })?;
        Ok(Self::containing(date))
    }

    /// Quarter containing today's UTC date.
    pub fn current() -> Self {
        Self::containing(OffsetDateTime::now_utc().date())
    }

    pub const fn year(self) -> i32 {
        self.year
    }

    pub const fn number(self) -> u8 {
        self.number
    }

    pub fn previous(self) -> Self {
        if self.number == 1 {
            Self {
                year: self.year - 1,
                number: 4,
            }
        } else {
            Self {
                year: self.year,
                number: self.number - 1,
            }
        }
    }

    pub fn next(self) -> Self {
        if self.number == 4 {
            Self {
                year: self.year + 1,
                number: 1,
            }
        } else {
            Self {
                year: self.year,
                number: self.number + 1,
            }
        }
    }

    /// `count` consecutive quarters ending at `self`, newest first.
    pub fn trailing(self, count: usize) -> Vec<Self> {
        let mut quarters = Vec::with_capacity(count);
        let mut cursor = self;
        for _ in 0..count {
            quarters.push(cursor);
            cursor = cursor.previous();
        }
        quarters
    }

    /// Last calendar day of the quarter.
    pub fn end_date(self) -> Date {
        let (month, day) = match self.number {
            1 => (Month::March, 31),
            2 => (Month::June, 30),
            3 => (Month::September, 30),
            _ => (Month::December, 31),
        };
        Date::from_calendar_date(self.year, month, day)
            .expect("quarter end must be a valid calendar date")
    }

    /// Rejects quarters that begin after `today`'s quarter.
    pub fn ensure_not_future(self, today: Date) -> Result<(), ValidationError> {
        if self > Self::containing(today) {
            return Err(ValidationError::FutureQuarter {
                quarter: self.to_string(),
            });
        }
        Ok(())
    }
}

impl Display for Quarter {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "Q{} {}", self.number, self.year)
    }
}

impl FromStr for Quarter {
    type Err = ValidationError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        Self::parse(value)
    }
}

impl TryFrom<String> for Quarter {
    type Error = ValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<Quarter> for String {
    fn from(value: Quarter) -> Self {
        value.to_string()
    }
}
