//! Parsing of Kubernetes-style quantity strings (`"4"`, `"500m"`, `"2Gi"`).
//!
//! Resource amounts in a cluster spec arrive as strings and the API server
//! schema cannot reject malformed ones. Parsing here is used for validation
//! before a spec is accepted; arithmetic on quantities is out of scope.

use std::{fmt::Display, num::ParseFloatError, str::FromStr};

use snafu::{ResultExt, Snafu, ensure};

#[derive(Debug, PartialEq, Snafu)]
pub enum ParseQuantityError {
    #[snafu(display("input is either empty or contains non-ascii characters"))]
    InvalidFormat,

    #[snafu(display("failed to parse floating point number"))]
    InvalidFloat { source: ParseFloatError },

    #[snafu(display("failed to parse suffix"))]
    InvalidSuffix { source: ParseSuffixError },
}

#[derive(Debug, PartialEq, Snafu)]
#[snafu(display("unknown quantity suffix {input:?}"))]
pub struct ParseSuffixError {
    input: String,
}

/// A parsed resource amount: a numeric value and an optional scale suffix.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Quantity {
    value: f64,
    suffix: Option<Suffix>,
}

impl FromStr for Quantity {
    type Err = ParseQuantityError;

    fn from_str(input: &str) -> Result<Self, Self::Err> {
        ensure!(!input.is_empty() && input.is_ascii(), InvalidFormatSnafu);

        if input == "0" {
            return Ok(Self {
                value: 0.0,
                suffix: None,
            });
        }

        match input.find(|c: char| c != '.' && !c.is_ascii_digit()) {
            Some(suffix_index) => {
                let (value, suffix) = input.split_at(suffix_index);
                let value = f64::from_str(value).context(InvalidFloatSnafu)?;
                let suffix = Suffix::from_str(suffix).context(InvalidSuffixSnafu)?;

                Ok(Self {
                    value,
                    suffix: Some(suffix),
                })
            }
            None => {
                let value = f64::from_str(input).context(InvalidFloatSnafu)?;

                Ok(Self {
                    value,
                    suffix: None,
                })
            }
        }
    }
}

impl Display for Quantity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.suffix {
            Some(suffix) => write!(f, "{value}{suffix}", value = self.value),
            None => write!(f, "{value}", value = self.value),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Suffix {
    BinaryMultiple(BinaryMultiple),
    DecimalMultiple(DecimalMultiple),
    DecimalExponent(f64),
}

impl FromStr for Suffix {
    type Err = ParseSuffixError;

    fn from_str(input: &str) -> Result<Self, Self::Err> {
        if let Ok(binary) = BinaryMultiple::from_str(input) {
            return Ok(Self::BinaryMultiple(binary));
        }

        if let Ok(decimal) = DecimalMultiple::from_str(input) {
            return Ok(Self::DecimalMultiple(decimal));
        }

        if input.starts_with(['e', 'E']) {
            if let Ok(exponent) = f64::from_str(&input[1..]) {
                return Ok(Self::DecimalExponent(exponent));
            }
        }

        ParseSuffixSnafu { input }.fail()
    }
}

impl Display for Suffix {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::BinaryMultiple(binary) => write!(f, "{binary}"),
            Self::DecimalMultiple(decimal) => write!(f, "{decimal}"),
            Self::DecimalExponent(exponent) => write!(f, "e{exponent}"),
        }
    }
}

/// Binary (power-of-two) scale suffixes.
#[derive(Clone, Copy, Debug, PartialEq, strum::Display, strum::EnumString)]
pub enum BinaryMultiple {
    #[strum(serialize = "Ki")]
    Kibi,
    #[strum(serialize = "Mi")]
    Mebi,
    #[strum(serialize = "Gi")]
    Gibi,
    #[strum(serialize = "Ti")]
    Tebi,
    #[strum(serialize = "Pi")]
    Pebi,
    #[strum(serialize = "Ei")]
    Exbi,
}

/// Decimal (power-of-ten) scale suffixes.
#[derive(Clone, Copy, Debug, PartialEq, strum::Display, strum::EnumString)]
pub enum DecimalMultiple {
    #[strum(serialize = "n")]
    Nano,
    #[strum(serialize = "u")]
    Micro,
    #[strum(serialize = "m")]
    Milli,
    #[strum(serialize = "k")]
    Kilo,
    #[strum(serialize = "M")]
    Mega,
    #[strum(serialize = "G")]
    Giga,
    #[strum(serialize = "T")]
    Tera,
    #[strum(serialize = "P")]
    Peta,
    #[strum(serialize = "E")]
    Exa,
}

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::*;

    #[rstest]
    #[case::zero("0")]
    #[case::plain("4")]
    #[case::fractional("1.5")]
    #[case::millicores("500m")]
    #[case::binary("2Gi")]
    #[case::decimal("100M")]
    #[case::exponent("1e3")]
    fn valid_quantities_parse(#[case] input: &str) {
        input.parse::<Quantity>().expect("quantity must parse");
    }

    #[rstest]
    #[case::empty("", ParseQuantityError::InvalidFormat)]
    #[case::non_ascii("1Gö", ParseQuantityError::InvalidFormat)]
    fn invalid_format_is_rejected(#[case] input: &str, #[case] expected: ParseQuantityError) {
        let err = input.parse::<Quantity>().expect_err("quantity must not parse");
        assert_eq!(err, expected);
    }

    #[rstest]
    #[case::unknown_suffix("4q")]
    #[case::embedded_space("10 elephants")]
    #[case::bare_exponent("1e")]
    fn invalid_suffixes_are_rejected(#[case] input: &str) {
        let err = input.parse::<Quantity>().expect_err("quantity must not parse");
        assert!(matches!(err, ParseQuantityError::InvalidSuffix { .. }));
    }

    #[test]
    fn display_round_trips() {
        let quantity = "1.5Gi".parse::<Quantity>().expect("quantity must parse");
        assert_eq!(quantity.to_string(), "1.5Gi");

        let quantity = "250m".parse::<Quantity>().expect("quantity must parse");
        assert_eq!(quantity.to_string(), "250m");
    }
}
