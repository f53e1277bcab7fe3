//! Parsing of received serial lines into plottable values
//!
//! Each line is either a bare floating-point literal (plotted) or
//! arbitrary text (logged only). Parsing is a pure function of the
//! line; the caller decides what to do with each outcome. Garbage on
//! the wire is expected, so nothing here treats a bad line as an error.

/// Outcome of parsing one received line
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ParseOutcome {
    /// The line parsed as a finite number inside the accepted range
    Value(f64),
    /// The line was empty after trimming
    Empty,
    /// The line did not parse as a finite number
    Malformed,
    /// The line parsed but fell outside the accepted range
    OutOfRange(f64),
}

impl ParseOutcome {
    /// The parsed value, if the line produced one
    pub fn value(self) -> Option<f64> {
        match self {
            ParseOutcome::Value(v) => Some(v),
            _ => None,
        }
    }
}

/// Accepted value range for parsed samples
///
/// Defaults to the full representable range, so every finite value
/// passes unless limits are configured.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ValueBounds {
    pub min: f64,
    pub max: f64,
}

impl Default for ValueBounds {
    fn default() -> Self {
        Self {
            min: f64::MIN,
            max: f64::MAX,
        }
    }
}

impl ValueBounds {
    /// Create bounds with explicit limits
    pub fn new(min: f64, max: f64) -> Self {
        Self { min, max }
    }

    /// Check whether a value falls inside the limits (inclusive)
    pub fn accepts(&self, value: f64) -> bool {
        value >= self.min && value <= self.max
    }
}

/// Parse a single received line.
///
/// The line may still carry its terminator; leading and trailing
/// whitespace is ignored. Non-finite parses ("NaN", "inf") count as
/// malformed since they cannot be plotted.
pub fn parse_line(line: &str, bounds: &ValueBounds) -> ParseOutcome {
    let trimmed = line.trim();
    if trimmed.is_empty() {
        return ParseOutcome::Empty;
    }
    match trimmed.parse::<f64>() {
        Ok(value) if !value.is_finite() => ParseOutcome::Malformed,
        Ok(value) if bounds.accepts(value) => ParseOutcome::Value(value),
        Ok(value) => ParseOutcome::OutOfRange(value),
        Err(_) => ParseOutcome::Malformed,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_numeric_lines() {
        let bounds = ValueBounds::default();
        let cases = [
            ("  23.5\n", 23.5),
            ("42", 42.0),
            ("-17.25", -17.25),
            ("0", 0.0),
            ("1e3", 1000.0),
            ("\t3.75\r\n", 3.75),
        ];
        for (line, expected) in cases {
            match parse_line(line, &bounds) {
                ParseOutcome::Value(v) => assert_eq!(v, expected, "line {:?}", line),
                other => panic!("line {:?} parsed as {:?}", line, other),
            }
        }
    }

    #[test]
    fn test_parse_empty_lines() {
        let bounds = ValueBounds::default();
        for line in ["", "\n", "   ", "\r\n", "\t \t"] {
            assert_eq!(
                parse_line(line, &bounds),
                ParseOutcome::Empty,
                "line {:?}",
                line
            );
        }
    }

    #[test]
    fn test_parse_malformed_lines() {
        let bounds = ValueBounds::default();
        for line in ["N/A", "hello", "1.2.3", "--5", "12abc", "0x1F"] {
            assert_eq!(
                parse_line(line, &bounds),
                ParseOutcome::Malformed,
                "line {:?}",
                line
            );
        }
    }

    #[test]
    fn test_parse_non_finite_is_malformed() {
        let bounds = ValueBounds::default();
        for line in ["NaN", "inf", "-inf", "infinity"] {
            assert_eq!(
                parse_line(line, &bounds),
                ParseOutcome::Malformed,
                "line {:?}",
                line
            );
        }
    }

    #[test]
    fn test_bounds_reject_out_of_range() {
        let bounds = ValueBounds::new(0.0, 100.0);
        assert_eq!(parse_line("150", &bounds), ParseOutcome::OutOfRange(150.0));
        assert_eq!(parse_line("-1", &bounds), ParseOutcome::OutOfRange(-1.0));

        // Limits are inclusive
        assert_eq!(parse_line("0", &bounds), ParseOutcome::Value(0.0));
        assert_eq!(parse_line("100", &bounds), ParseOutcome::Value(100.0));
        assert_eq!(parse_line("55.5", &bounds), ParseOutcome::Value(55.5));
    }

    #[test]
    fn test_default_bounds_accept_extremes() {
        let bounds = ValueBounds::default();
        assert!(bounds.accepts(f64::MIN));
        assert!(bounds.accepts(f64::MAX));
        assert!(bounds.accepts(0.0));
        assert!(!bounds.accepts(f64::NAN));
    }

    #[test]
    fn test_outcome_value_helper() {
        assert_eq!(ParseOutcome::Value(1.5).value(), Some(1.5));
        assert_eq!(ParseOutcome::Empty.value(), None);
        assert_eq!(ParseOutcome::Malformed.value(), None);
        assert_eq!(ParseOutcome::OutOfRange(9.9).value(), None);
    }
}
