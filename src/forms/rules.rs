//! Declarative validation rules for a single form field.

use std::collections::BTreeMap;

/// Current values of all fields in a form, keyed by field name.
pub type FieldValues = BTreeMap<String, String>;

type CustomRule = Box<dyn Fn(&str, &FieldValues) -> Option<String> + Send + Sync>;

/// Rule set for one field, evaluated in a fixed order:
/// required, minimum length, maximum length, email format, custom.
///
/// The first failing rule's message wins. The order is part of the
/// contract - it decides which single message the user sees when several
/// rules are violated at once, and a required failure short-circuits the
/// rest since an empty value cannot satisfy length or format checks.
#[derive(Default)]
pub struct FieldRules {
  required: Option<String>,
  min_length: Option<usize>,
  max_length: Option<usize>,
  email: bool,
  custom: Option<CustomRule>,
}

impl FieldRules {
  pub fn new() -> Self {
    Self::default()
  }

  /// Reject empty values with the default message.
  pub fn required(self) -> Self {
    self.required_with("This field is required")
  }

  /// Reject empty values with a custom message.
  pub fn required_with(mut self, message: impl Into<String>) -> Self {
    self.required = Some(message.into());
    self
  }

  /// Reject values shorter than `min` characters.
  pub fn min_length(mut self, min: usize) -> Self {
    self.min_length = Some(min);
    self
  }

  /// Reject values longer than `max` characters.
  pub fn max_length(mut self, max: usize) -> Self {
    self.max_length = Some(max);
    self
  }

  /// Reject values that do not look like an email address.
  pub fn email(mut self) -> Self {
    self.email = true;
    self
  }

  /// Add an arbitrary predicate receiving the field value and all current
  /// values, returning `Some(message)` on failure.
  pub fn custom<F>(mut self, rule: F) -> Self
  where
    F: Fn(&str, &FieldValues) -> Option<String> + Send + Sync + 'static,
  {
    self.custom = Some(Box::new(rule));
    self
  }

  /// Evaluate the pipeline against a value, returning the first failure.
  pub fn validate(&self, value: &str, all_values: &FieldValues) -> Option<String> {
    if let Some(message) = &self.required {
      if value.trim().is_empty() {
        return Some(message.clone());
      }
    }

    if let Some(min) = self.min_length {
      if value.chars().count() < min {
        return Some(format!("Must be at least {} characters", min));
      }
    }

    if let Some(max) = self.max_length {
      if value.chars().count() > max {
        return Some(format!("Must be at most {} characters", max));
      }
    }

    if self.email && !is_email(value) {
      return Some("Enter a valid email address".to_string());
    }

    if let Some(custom) = &self.custom {
      if let Some(message) = custom(value, all_values) {
        return Some(message);
      }
    }

    None
  }
}

/// Client-side shape check, not RFC parsing: one local part, an `@`, and
/// a domain with an interior dot, no whitespace anywhere.
fn is_email(value: &str) -> bool {
  if value.chars().any(char::is_whitespace) {
    return false;
  }

  let Some((local, domain)) = value.split_once('@') else {
    return false;
  };

  if local.is_empty() || domain.contains('@') {
    return false;
  }

  match domain.rfind('.') {
    Some(dot) => dot > 0 && dot < domain.len() - 1,
    None => false,
  }
}
