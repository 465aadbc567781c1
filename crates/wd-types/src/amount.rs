use thiserror::Error;

pub const SATS_PER_BTC: u64 = 100_000_000;
const AMOUNT_DECIMALS: usize = 8;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AmountError {
    #[error("amount is empty")]
    Empty,
    #[error("amount '{0}' is not a decimal number")]
    Malformed(String),
    #[error("amount '{0}' has more than 8 decimal places")]
    TooPrecise(String),
    #[error("amount '{0}' does not fit in satoshis")]
    Overflow(String),
}

/// Formats satoshis as a fixed 8-decimal BTC amount, e.g. `12_345` -> `"0.00012345"`.
pub fn satoshis_to_amount(sats: u64) -> String {
    format!("{}.{:08}", sats / SATS_PER_BTC, sats % SATS_PER_BTC)
}

/// Parses a non-negative decimal BTC amount into satoshis.
pub fn amount_to_satoshis(amount: &str) -> Result<u64, AmountError> {
    let amount = amount.trim();
    if amount.is_empty() {
        return Err(AmountError::Empty);
    }

    let (whole, fraction) = match amount.split_once('.') {
        Some((whole, fraction)) => (whole, fraction),
        None => (amount, ""),
    };

    let all_digits = |part: &str| part.bytes().all(|b| b.is_ascii_digit());
    if (whole.is_empty() && fraction.is_empty()) || !all_digits(whole) || !all_digits(fraction) {
        return Err(AmountError::Malformed(amount.to_owned()));
    }
    if fraction.len() > AMOUNT_DECIMALS {
        return Err(AmountError::TooPrecise(amount.to_owned()));
    }

    let whole_sats = if whole.is_empty() {
        0
    } else {
        whole
            .parse::<u64>()
            .ok()
            .and_then(|w| w.checked_mul(SATS_PER_BTC))
            .ok_or_else(|| AmountError::Overflow(amount.to_owned()))?
    };

    let fraction_sats = if fraction.is_empty() {
        0
    } else {
        let padded = format!("{fraction:0<width$}", width = AMOUNT_DECIMALS);
        padded
            .parse::<u64>()
            .map_err(|_| AmountError::Malformed(amount.to_owned()))?
    };

    whole_sats
        .checked_add(fraction_sats)
        .ok_or_else(|| AmountError::Overflow(amount.to_owned()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn formats_with_eight_decimals() {
        assert_eq!(satoshis_to_amount(0), "0.00000000");
        assert_eq!(satoshis_to_amount(12_345), "0.00012345");
        assert_eq!(satoshis_to_amount(250_000_000), "2.50000000");
    }

    #[test]
    fn parses_whole_and_fractional_amounts() {
        assert_eq!(amount_to_satoshis("1"), Ok(SATS_PER_BTC));
        assert_eq!(amount_to_satoshis("0.5"), Ok(50_000_000));
        assert_eq!(amount_to_satoshis(".00000001"), Ok(1));
        assert_eq!(amount_to_satoshis(" 2.00012345 "), Ok(200_012_345));
    }

    #[test]
    fn rejects_bad_amounts() {
        assert_eq!(amount_to_satoshis(""), Err(AmountError::Empty));
        assert!(matches!(amount_to_satoshis("-1"), Err(AmountError::Malformed(_))));
        assert!(matches!(amount_to_satoshis("1.2.3"), Err(AmountError::Malformed(_))));
        assert!(matches!(amount_to_satoshis("."), Err(AmountError::Malformed(_))));
        assert!(matches!(
            amount_to_satoshis("0.123456789"),
            Err(AmountError::TooPrecise(_))
        ));
        assert!(matches!(
            amount_to_satoshis("999999999999"),
            Err(AmountError::Overflow(_))
        ));
    }
}
