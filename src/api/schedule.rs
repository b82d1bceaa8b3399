use thiserror::Error;

use crate::core::ScheduledExpense;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ScheduleParseError {
    #[error("line {line}: expected `year,amount[,description]`, got {text:?}")]
    MissingField { line: usize, text: String },
    #[error("line {line}: invalid year {value:?}")]
    InvalidYear { line: usize, value: String },
    #[error("line {line}: invalid amount {value:?}")]
    InvalidAmount { line: usize, value: String },
}

/// Parses newline-separated `year,amount[,description]` entries. Blank lines
/// are skipped; the description keeps any further commas.
pub fn parse_schedule(text: &str) -> Result<Vec<ScheduledExpense>, ScheduleParseError> {
    text.lines()
        .enumerate()
        .filter(|(_, line)| !line.trim().is_empty())
        .map(|(idx, line)| parse_line(idx + 1, line))
        .collect()
}

/// Single-entry form used by the `--expense` flag.
pub fn parse_schedule_entry(text: &str) -> Result<ScheduledExpense, ScheduleParseError> {
    parse_line(1, text)
}

fn parse_line(line: usize, text: &str) -> Result<ScheduledExpense, ScheduleParseError> {
    let mut fields = text.splitn(3, ',').map(str::trim);
    let (Some(year), Some(amount)) = (fields.next(), fields.next()) else {
        return Err(ScheduleParseError::MissingField {
            line,
            text: text.to_string(),
        });
    };
    let description = fields.next().unwrap_or_default().to_string();

    let year = year
        .parse::<i32>()
        .map_err(|_| ScheduleParseError::InvalidYear {
            line,
            value: year.to_string(),
        })?;
    let amount = amount
        .parse::<f64>()
        .ok()
        .filter(|v| v.is_finite())
        .ok_or_else(|| ScheduleParseError::InvalidAmount {
            line,
            value: amount.to_string(),
        })?;

    Ok(ScheduledExpense {
        year,
        amount,
        description,
    })
}
