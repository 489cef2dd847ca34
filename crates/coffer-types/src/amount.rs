use crate::error::TypesError;
use std::fmt;
use std::str::FromStr;

/// Unsigned quantity of ledger tokens or native currency, in base units.
///
/// All arithmetic is checked; balances never wrap.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Amount(u128);

impl Amount {
    pub const ZERO: Self = Self(0);
    pub const MAX: Self = Self(u128::MAX);

    /// Base units per whole token (10^18)
    pub const UNIT: Self = Self(1_000_000_000_000_000_000);

    /// Number of fractional decimal digits in a whole token
    pub const DECIMALS: usize = 18;

    pub const fn new(base_units: u128) -> Self {
        Self(base_units)
    }

    pub const fn get(&self) -> u128 {
        self.0
    }

    /// Whole tokens scaled to base units
    pub const fn from_whole(tokens: u64) -> Self {
        Self(tokens as u128 * Self::UNIT.0)
    }

    pub fn checked_add(&self, rhs: &Self) -> Option<Self> {
        self.0.checked_add(rhs.0).map(Self)
    }

    pub fn checked_sub(&self, rhs: &Self) -> Option<Self> {
        self.0.checked_sub(rhs.0).map(Self)
    }

    pub fn saturating_add(&self, rhs: &Self) -> Self {
        Self(self.0.saturating_add(rhs.0))
    }

    pub fn saturating_sub(&self, rhs: &Self) -> Self {
        Self(self.0.saturating_sub(rhs.0))
    }

    pub fn is_zero(&self) -> bool {
        self.0 == 0
    }

    /// Split into whole tokens and the fractional remainder in base units
    pub fn split_units(&self) -> (u128, u128) {
        (self.0 / Self::UNIT.0, self.0 % Self::UNIT.0)
    }

    /// Parse `"<whole>.<frac>"` into base units
    fn from_fractional_str(whole: &str, frac: &str) -> Result<Self, TypesError> {
        if frac.len() > Self::DECIMALS {
            return Err(TypesError::InvalidAmountString(format!(
                "{}.{}: more than {} fractional digits",
                whole,
                frac,
                Self::DECIMALS
            )));
        }

        let whole = if whole.is_empty() {
            0
        } else {
            parse_digits(whole)?
        };
        let padded = format!("{:0<width$}", frac, width = Self::DECIMALS);
        let frac = parse_digits(&padded)?;

        whole
            .checked_mul(Self::UNIT.0)
            .and_then(|w| w.checked_add(frac))
            .map(Self)
            .ok_or(TypesError::AmountOverflow)
    }
}

fn parse_digits(s: &str) -> Result<u128, TypesError> {
    if s.is_empty() || !s.chars().all(|c| c.is_ascii_digit()) {
        return Err(TypesError::InvalidAmountString(s.to_string()));
    }
    s.parse::<u128>().map_err(|_| TypesError::AmountOverflow)
}

impl From<u64> for Amount {
    fn from(val: u64) -> Self {
        Self(val as u128)
    }
}

impl From<u128> for Amount {
    fn from(val: u128) -> Self {
        Self(val)
    }
}

impl From<Amount> for u128 {
    fn from(val: Amount) -> Self {
        val.0
    }
}

impl fmt::Display for Amount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl fmt::Debug for Amount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Amount({})", self.0)
    }
}

impl FromStr for Amount {
    type Err = TypesError;

    /// Plain digits are base units; a decimal point switches to whole tokens.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        match s.split_once('.') {
            Some((whole, frac)) => Self::from_fractional_str(whole, frac),
            None => parse_digits(s).map(Self),
        }
    }
}

impl std::iter::Sum for Amount {
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        iter.fold(Self::ZERO, |acc, x| acc.saturating_add(&x))
    }
}
