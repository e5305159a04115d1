//! Placeholder reverse lookup.
//!
//! No directory or public-records source is queried. The entries are fixed
//! templates filled in from the number and exist so the report has
//! the shape a real lookup would produce. Consumers must not treat them as
//! facts about the subscriber.

pub const PLACEHOLDER_NOTICE: &str =
  "Synthetic placeholder data (no reverse lookup service is queried)";

/// `national` is the display form and may carry an extension; the profile
/// handle takes the last four digits of `significant` only.
pub fn placeholder_entries(national: &str, significant: &str) -> Vec<String> {
  let digits: Vec<char> = significant.chars().filter(|c| c.is_ascii_digit()).collect();
  let last4: String = digits[digits.len().saturating_sub(4)..].iter().collect();

  vec![
    format!("Possible business: {national} Services"),
    "Potential contact: John Doe (via public records)".to_string(),
    format!("Linked profile: user{last4}@example.com"),
  ]
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn returns_three_fixed_templates() {
    let out = placeholder_entries("0812-3456-7890", "81234567890");
    assert_eq!(
      out,
      vec![
        "Possible business: 0812-3456-7890 Services".to_string(),
        "Potential contact: John Doe (via public records)".to_string(),
        "Linked profile: user7890@example.com".to_string(),
      ]
    );
  }

  #[test]
  fn is_deterministic() {
    assert_eq!(
      placeholder_entries("(415) 555-2671", "4155552671"),
      placeholder_entries("(415) 555-2671", "4155552671")
    );
  }

  #[test]
  fn uses_last_four_digits_not_characters() {
    let out = placeholder_entries("020 7183 8750", "20 7183 8750");
    assert_eq!(out[2], "Linked profile: user8750@example.com");
  }

  #[test]
  fn short_numbers_use_what_is_there() {
    let out = placeholder_entries("12", "12");
    assert_eq!(out[2], "Linked profile: user12@example.com");
  }

  #[test]
  fn extension_digits_stay_out_of_the_handle() {
    let out = placeholder_entries("(415) 555-2671 ext. 123", "4155552671");
    assert_eq!(out[0], "Possible business: (415) 555-2671 ext. 123 Services");
    assert_eq!(out[2], "Linked profile: user2671@example.com");
  }
}
