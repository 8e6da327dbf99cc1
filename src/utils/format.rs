/// Renders `amount` base units as a decimal with `decimals` fractional digits.
pub fn format_token_amount(amount: u128, decimals: u32) -> String {
	if decimals == 0 {
		return amount.to_string();
	}
	match 10u128.checked_pow(decimals) {
		Some(unit) => format!(
			"{}.{:0width$}",
			amount / unit,
			amount % unit,
			width = decimals as usize
		),
		None => format!("0.{:0>width$}", amount, width = decimals as usize),
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::transaction::MIDNIGHT_TOKEN_DECIMALS;

	#[test]
	fn formats_whole_and_fractional_parts() {
		assert_eq!(format_token_amount(1_500_000, MIDNIGHT_TOKEN_DECIMALS), "1.500000");
		assert_eq!(format_token_amount(42, MIDNIGHT_TOKEN_DECIMALS), "0.000042");
		assert_eq!(format_token_amount(u128::MAX, 0), u128::MAX.to_string());
	}
}
