//! Form state: values, errors, and touched tracking.

use std::collections::{BTreeMap, BTreeSet};

use super::rules::{FieldRules, FieldValues};

/// State for one form: current values, computed errors, and which fields
/// the user has blurred at least once.
///
/// Errors are recomputed on every relevant event but a field's error is
/// only meant to be shown once that field is touched; `visible_error`
/// applies that gate for the caller.
pub struct FormState {
  initial: FieldValues,
  values: FieldValues,
  errors: BTreeMap<String, String>,
  touched: BTreeSet<String>,
  rules: BTreeMap<String, FieldRules>,
}

impl FormState {
  /// Create a form from initial values and per-field rule sets.
  pub fn new(initial: FieldValues, rules: BTreeMap<String, FieldRules>) -> Self {
    Self {
      values: initial.clone(),
      initial,
      errors: BTreeMap::new(),
      touched: BTreeSet::new(),
      rules,
    }
  }

  /// Record a changed value.
  ///
  /// Re-validates the field only if it is already touched, so the user
  /// gets real-time feedback after the first blur but not while still
  /// typing into a fresh field.
  pub fn handle_change(&mut self, field: &str, new_value: impl Into<String>) {
    self.values.insert(field.to_string(), new_value.into());
    if self.touched.contains(field) {
      self.validate_field(field);
    }
  }

  /// Mark a field as touched and validate it unconditionally.
  pub fn handle_blur(&mut self, field: &str) {
    self.touched.insert(field.to_string());
    self.validate_field(field);
  }

  /// Validate every ruled field against the current values, replacing
  /// the whole error map. Returns whether the form is valid.
  ///
  /// Does not mark anything touched; the caller decides how to surface
  /// errors after a failed submit attempt.
  pub fn validate_all(&mut self) -> bool {
    let mut errors = BTreeMap::new();
    for (field, rules) in &self.rules {
      let value = self.values.get(field).map(String::as_str).unwrap_or("");
      if let Some(message) = rules.validate(value, &self.values) {
        errors.insert(field.clone(), message);
      }
    }
    self.errors = errors;
    self.errors.is_empty()
  }

  /// Restore initial values and clear all errors and touched flags.
  pub fn reset(&mut self) {
    self.values = self.initial.clone();
    self.errors.clear();
    self.touched.clear();
  }

  /// Current value of a field, empty string if never set.
  pub fn value(&self, field: &str) -> &str {
    self.values.get(field).map(String::as_str).unwrap_or("")
  }

  /// All current values.
  pub fn values(&self) -> &FieldValues {
    &self.values
  }

  /// Current error for a field, whether or not it is touched.
  pub fn error(&self, field: &str) -> Option<&str> {
    self.errors.get(field).map(String::as_str)
  }

  /// Error for a field, gated on the field having been touched.
  pub fn visible_error(&self, field: &str) -> Option<&str> {
    if self.touched.contains(field) {
      self.error(field)
    } else {
      None
    }
  }

  /// Whether the user has blurred this field at least once.
  pub fn is_touched(&self, field: &str) -> bool {
    self.touched.contains(field)
  }

  fn validate_field(&mut self, field: &str) {
    let message = match self.rules.get(field) {
      Some(rules) => {
        let value = self.values.get(field).map(String::as_str).unwrap_or("");
        rules.validate(value, &self.values)
      }
      None => None,
    };

    match message {
      Some(message) => {
        self.errors.insert(field.to_string(), message);
      }
      None => {
        self.errors.remove(field);
      }
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  fn signup_form() -> FormState {
    let mut initial = FieldValues::new();
    initial.insert("name".to_string(), String::new());
    initial.insert("email".to_string(), String::new());

    let mut rules = BTreeMap::new();
    rules.insert(
      "name".to_string(),
      FieldRules::new().required_with("Name is required").min_length(2),
    );
    rules.insert(
      "email".to_string(),
      FieldRules::new().required_with("Email is required").email(),
    );

    FormState::new(initial, rules)
  }

  #[test]
  fn test_change_before_blur_surfaces_no_error() {
    let mut form = signup_form();

    form.handle_change("email", "not-an-email");
    assert!(form.error("email").is_none());
    assert!(form.visible_error("email").is_none());
  }

  #[test]
  fn test_blur_validates_and_unlocks_realtime_feedback() {
    let mut form = signup_form();

    form.handle_change("email", "not-an-email");
    form.handle_blur("email");
    assert_eq!(form.visible_error("email"), Some("Enter a valid email address"));

    // Touched now, so further changes re-validate immediately
    form.handle_change("email", "a@b.com");
    assert!(form.error("email").is_none());

    form.handle_change("email", "");
    assert_eq!(form.error("email"), Some("Email is required"));
  }

  #[test]
  fn test_blur_on_empty_required_field_reports_required() {
    let mut form = signup_form();
    form.handle_blur("email");
    // Required wins over the email-format check on empty input
    assert_eq!(form.error("email"), Some("Email is required"));
  }

  #[test]
  fn test_validate_all_reports_every_invalid_field() {
    let mut form = signup_form();

    assert!(!form.validate_all());
    assert_eq!(form.error("name"), Some("Name is required"));
    assert_eq!(form.error("email"), Some("Email is required"));

    // validate_all does not mark fields touched
    assert!(!form.is_touched("name"));
    assert!(form.visible_error("name").is_none());
  }

  #[test]
  fn test_validate_all_passes_when_everything_is_valid() {
    let mut form = signup_form();
    form.handle_change("name", "Ada");
    form.handle_change("email", "ada@school.edu");

    assert!(form.validate_all());
    assert!(form.error("name").is_none());
    assert!(form.error("email").is_none());
  }

  #[test]
  fn test_validate_all_replaces_stale_errors() {
    let mut form = signup_form();
    assert!(!form.validate_all());

    form.handle_change("name", "Ada");
    form.handle_change("email", "ada@school.edu");
    assert!(form.validate_all());
    assert!(form.error("name").is_none());
  }

  #[test]
  fn test_unruled_field_is_tracked_but_never_invalid() {
    let mut form = signup_form();
    form.handle_change("nickname", "addie");
    form.handle_blur("nickname");

    assert_eq!(form.value("nickname"), "addie");
    assert!(form.error("nickname").is_none());
  }

  #[test]
  fn test_reset_restores_initial_state() {
    let mut form = signup_form();
    form.handle_change("name", "Ada");
    form.handle_blur("name");
    form.validate_all();

    form.reset();
    assert_eq!(form.value("name"), "");
    assert!(form.error("name").is_none());
    assert!(form.error("email").is_none());
    assert!(!form.is_touched("name"));
  }

  #[test]
  fn test_cross_field_custom_rule() {
    let mut rules = BTreeMap::new();
    rules.insert("password".to_string(), FieldRules::new().required().min_length(8));
    rules.insert(
      "confirm".to_string(),
      FieldRules::new().required().custom(|value, all| {
        let password = all.get("password").map(String::as_str).unwrap_or("");
        if value != password {
          Some("Passwords do not match".to_string())
        } else {
          None
        }
      }),
    );

    let mut form = FormState::new(FieldValues::new(), rules);
    form.handle_change("password", "correct-horse");
    form.handle_change("confirm", "correct-mouse");

    assert!(!form.validate_all());
    assert_eq!(form.error("confirm"), Some("Passwords do not match"));

    form.handle_change("confirm", "correct-horse");
    assert!(form.validate_all());
  }
}
