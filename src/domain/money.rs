use std::fmt;

/// Money is represented as signed integer cents to avoid floating-point
/// precision issues. 1 unit = 100 cents, so a balance of 150.00 = 15000.
pub type Cents = i64;

/// Format cents as a human-readable decimal string.
/// Example: 15000 -> "150.00", -1234 -> "-12.34"
pub fn format_cents(cents: Cents) -> String {
    let sign = if cents < 0 { "-" } else { "" };
    let abs = cents.abs();
    format!("{}{}.{:02}", sign, abs / 100, abs % 100)
}

/// Parse a signed decimal string into cents.
/// Example: "150.00" -> 15000, "-300" -> -30000, "12.5" -> 1250
///
/// Movement values carry their direction in the sign, so a leading `-` or
/// `+` is accepted. At most two decimal digits are allowed; anything finer
/// than a cent is rejected rather than truncated.
pub fn parse_cents(input: &str) -> Result<Cents, ParseCentsError> {
    let input = input.trim();
    let (negative, digits) = match input.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, input.strip_prefix('+').unwrap_or(input)),
    };

    if digits.is_empty() {
        return Err(ParseCentsError::InvalidFormat);
    }

    let mut parts = digits.splitn(2, '.');
    let units_str = parts.next().unwrap_or("");
    let decimal_str = parts.next();

    let units: i64 = if units_str.is_empty() {
        // ".50" is allowed as shorthand for "0.50"
        if decimal_str.is_none() {
            return Err(ParseCentsError::InvalidFormat);
        }
        0
    } else {
        units_str
            .parse()
            .map_err(|_| ParseCentsError::InvalidFormat)?
    };

    let decimal_cents: i64 = match decimal_str {
        None | Some("") => 0,
        Some(d) if d.len() == 1 => {
            d.parse::<i64>().map_err(|_| ParseCentsError::InvalidFormat)? * 10
        }
        Some(d) if d.len() == 2 => d.parse().map_err(|_| ParseCentsError::InvalidFormat)?,
        Some(_) => return Err(ParseCentsError::TooManyDecimals),
    };

    let cents = units * 100 + decimal_cents;
    Ok(if negative { -cents } else { cents })
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParseCentsError {
    InvalidFormat,
    TooManyDecimals,
}

impl fmt::Display for ParseCentsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParseCentsError::InvalidFormat => write!(f, "invalid money format"),
            ParseCentsError::TooManyDecimals => {
                write!(f, "amounts cannot be finer than a cent")
            }
        }
    }
}

impl std::error::Error for ParseCentsError {}
