//! Imbalance ledger.
//!
//! Maps each token type to how far it still is from its target. Entries keep
//! insertion order, which is what makes "the first unresolved imbalance"
//! deterministic. A token type without an entry has an imbalance of zero.

use crate::balancing::types::{BalancingError, TokenType};
use serde::{Deserialize, Serialize};

/// Insertion-ordered map from token type to a signed imbalance.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Imbalances {
	entries: Vec<(TokenType, i128)>,
}

/// Desired final imbalance per token type. Absent types target zero.
pub type TargetImbalances = Imbalances;

impl Imbalances {
	pub fn empty() -> Self {
		Self::default()
	}

	pub fn from_entry(token_type: TokenType, value: i128) -> Self {
		Self {
			entries: vec![(token_type, value)],
		}
	}

	/// Builds a ledger from `(type, value)` pairs, summing repeated types.
	pub fn from_entries<I>(entries: I) -> Result<Self, BalancingError>
	where
		I: IntoIterator<Item = (TokenType, i128)>,
	{
		let mut imbalances = Self::empty();
		for (token_type, value) in entries {
			imbalances.adjust(&token_type, value)?;
		}
		Ok(imbalances)
	}

	/// Imbalance of `token_type`, or zero when absent.
	pub fn get(&self, token_type: &TokenType) -> i128 {
		self.entries
			.iter()
			.find(|(t, _)| t == token_type)
			.map(|(_, v)| *v)
			.unwrap_or(0)
	}

	pub fn contains(&self, token_type: &TokenType) -> bool {
		self.entries.iter().any(|(t, _)| t == token_type)
	}

	/// Copy with an entry for every type in `token_types`.
	///
	/// Existing entries keep their value and position; missing types are
	/// appended as zero in the order given.
	pub fn ensure_zeros_for<'a, I>(&self, token_types: I) -> Self
	where
		I: IntoIterator<Item = &'a TokenType>,
	{
		let mut result = self.clone();
		for token_type in token_types {
			if !result.contains(token_type) {
				result.entries.push((token_type.clone(), 0));
			}
		}
		result
	}

	/// Union of both ledgers with values summed. Entries that sum to exactly
	/// zero are dropped.
	pub fn merge(&self, other: &Imbalances) -> Result<Self, BalancingError> {
		let mut merged = self.clone();
		for (token_type, value) in &other.entries {
			merged.adjust(token_type, *value)?;
		}
		merged.entries.retain(|(_, v)| *v != 0);
		Ok(merged)
	}

	pub fn iter(&self) -> impl Iterator<Item = (&TokenType, i128)> {
		self.entries.iter().map(|(t, v)| (t, *v))
	}

	pub fn token_types(&self) -> impl Iterator<Item = &TokenType> {
		self.entries.iter().map(|(t, _)| t)
	}

	pub fn len(&self) -> usize {
		self.entries.len()
	}

	pub fn is_empty(&self) -> bool {
		self.entries.is_empty()
	}

	/// Adds `delta` to the entry for `token_type`, creating it if needed.
	pub(crate) fn adjust(&mut self, token_type: &TokenType, delta: i128) -> Result<(), BalancingError> {
		match self.entries.iter_mut().find(|(t, _)| t == token_type) {
			Some((_, value)) => {
				*value = value.checked_add(delta).ok_or_else(|| {
					BalancingError::Other(format!("Imbalance overflow for token type {}", token_type))
				})?;
			}
			None => self.entries.push((token_type.clone(), delta)),
		}
		Ok(())
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	fn t(id: &str) -> TokenType {
		TokenType::new(id)
	}

	#[test]
	fn absent_token_reads_as_zero() {
		let imbalances = Imbalances::from_entry(t("GOLD"), 5);
		assert_eq!(imbalances.get(&t("GOLD")), 5);
		assert_eq!(imbalances.get(&t("SILVER")), 0);
		assert_eq!(Imbalances::empty().get(&t("GOLD")), 0);
	}

	#[test]
	fn from_entries_sums_repeated_types_in_first_seen_order() {
		let imbalances = Imbalances::from_entries([
			(t("GOLD"), 5),
			(t("NIGHT"), -3),
			(t("GOLD"), 7),
		])
		.unwrap();

		let entries: Vec<_> = imbalances.iter().map(|(t, v)| (t.clone(), v)).collect();
		assert_eq!(entries, vec![(t("GOLD"), 12), (t("NIGHT"), -3)]);
	}

	#[test]
	fn ensure_zeros_keeps_existing_values_and_appends_missing() {
		let imbalances = Imbalances::from_entries([(t("B"), 4), (t("A"), -1)]).unwrap();
		let extended = imbalances.ensure_zeros_for([t("A"), t("C"), t("D")].iter());

		let types: Vec<_> = extended.token_types().cloned().collect();
		assert_eq!(types, vec![t("B"), t("A"), t("C"), t("D")]);
		assert_eq!(extended.get(&t("B")), 4);
		assert_eq!(extended.get(&t("A")), -1);
		assert_eq!(extended.get(&t("C")), 0);
		assert!(extended.contains(&t("D")));
		// the source is untouched
		assert_eq!(imbalances.len(), 2);
	}

	#[test]
	fn merge_sums_and_drops_exact_zeros() {
		let a = Imbalances::from_entries([(t("GOLD"), 10), (t("NIGHT"), -4)]).unwrap();
		let b = Imbalances::from_entries([(t("NIGHT"), 4), (t("SILVER"), 2)]).unwrap();

		let merged = a.merge(&b).unwrap();
		assert!(!merged.contains(&t("NIGHT")));
		assert_eq!(merged.get(&t("GOLD")), 10);
		assert_eq!(merged.get(&t("SILVER")), 2);
		assert_eq!(merged.len(), 2);
	}

	#[test]
	fn merge_drops_zero_entries_already_present() {
		let a = Imbalances::empty().ensure_zeros_for([t("GOLD")].iter());
		let merged = a.merge(&Imbalances::empty()).unwrap();
		assert!(merged.is_empty());
	}

	#[test]
	fn overflow_is_reported_instead_of_wrapping() {
		let result = Imbalances::from_entries([(t("GOLD"), i128::MAX), (t("GOLD"), 1)]);
		assert!(matches!(result, Err(BalancingError::Other(_))));
	}
}
