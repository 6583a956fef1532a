//! Build variables and `${NAME}` substitution.

use std::collections::BTreeMap;

use crate::error::NotifierError;

const TOKEN_START: &str = "${";
const TOKEN_END: char = '}';

/// Variables visible to one resolution pass. Read-only once built.
#[derive(Debug, Clone, Default)]
pub struct Environment {
  vars: BTreeMap<String, String>,
}

impl Environment {
  /// Merge two layers; `overrides` wins on key collision.
  pub fn layered<B, O>(base: B, overrides: O) -> Self
  where
    B: IntoIterator<Item = (String, String)>,
    O: IntoIterator<Item = (String, String)>,
  {
    let mut vars: BTreeMap<String, String> = base.into_iter().collect();
    vars.extend(overrides);
    Self { vars }
  }

  pub fn get(&self, name: &str) -> Option<&str> {
    self.vars.get(name).map(String::as_str)
  }

  pub fn len(&self) -> usize {
    self.vars.len()
  }

  pub fn is_empty(&self) -> bool {
    self.vars.is_empty()
  }

  /// Replace every `${NAME}` token in `template`.
  ///
  /// Tokens are replaced left to right and substituted values are not
  /// rescanned. A single missing variable fails the whole template.
  pub fn resolve(&self, template: &str) -> Result<String, NotifierError> {
    let mut out = String::with_capacity(template.len());
    let mut rest = template;

    while let Some(start) = rest.find(TOKEN_START) {
      let after = &rest[start + TOKEN_START.len()..];
      let Some(end) = after.find(TOKEN_END) else {
        // Unterminated token: keep the remainder as literal text.
        break;
      };
      let name = &after[..end];
      let value = self
        .get(name)
        .ok_or_else(|| NotifierError::Unresolved(name.to_string()))?;

      out.push_str(&rest[..start]);
      out.push_str(value);
      rest = &after[end + 1..];
    }

    out.push_str(rest);
    Ok(out)
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use proptest::prelude::*;

  fn env(pairs: &[(&str, &str)]) -> Environment {
    Environment::layered(
      pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())),
      std::iter::empty(),
    )
  }

  #[test]
  fn overrides_win_on_collision() {
    let e = Environment::layered(
      vec![("BRANCH".to_string(), "env".to_string()), ("A".to_string(), "1".to_string())],
      vec![("BRANCH".to_string(), "param".to_string())],
    );
    assert_eq!(e.get("BRANCH"), Some("param"));
    assert_eq!(e.get("A"), Some("1"));
    assert_eq!(e.len(), 2);
  }

  #[test]
  fn replaces_tokens_inside_surrounding_text() {
    let e = env(&[("GIT_BRANCH", "feature/x"), ("N", "7")]);
    assert_eq!(e.resolve("origin/${GIT_BRANCH}#${N}").unwrap(), "origin/feature/x#7");
  }

  #[test]
  fn substituted_values_are_not_rescanned() {
    let e = env(&[("A", "${B}"), ("B", "never")]);
    assert_eq!(e.resolve("${A}").unwrap(), "${B}");
  }

  #[test]
  fn one_missing_token_fails_whole_template() {
    let e = env(&[("A", "a")]);
    let err = e.resolve("${A}-${MISSING}").unwrap_err();
    assert!(matches!(err, NotifierError::Unresolved(ref n) if n == "MISSING"));
  }

  #[test]
  fn empty_and_blank_templates_resolve_to_themselves() {
    let e = Environment::default();
    assert_eq!(e.resolve("").unwrap(), "");
    assert_eq!(e.resolve("   ").unwrap(), "   ");
  }

  #[test]
  fn unterminated_token_is_literal() {
    let e = env(&[("A", "a")]);
    assert_eq!(e.resolve("${A}-${B").unwrap(), "a-${B");
  }

  proptest! {
    #[test]
    fn templates_without_tokens_are_unchanged(template in "[^$]*") {
      let e = env(&[("A", "a")]);
      prop_assert_eq!(e.resolve(&template).unwrap(), template);
    }

    #[test]
    fn single_present_token_is_replaced(
      prefix in "[a-z /_-]{0,12}",
      suffix in "[a-z /_-]{0,12}",
      name in "[A-Z_]{1,10}",
      value in "[a-zA-Z0-9/._-]{0,16}",
    ) {
      let e = env(&[(name.as_str(), value.as_str())]);
      let template = format!("{}${{{}}}{}", prefix, name, suffix);
      prop_assert_eq!(e.resolve(&template).unwrap(), format!("{}{}{}", prefix, value, suffix));
    }

    #[test]
    fn absent_token_fails(name in "[A-Z_]{1,10}") {
      let e = env(&[("lowercase_only", "x")]);
      let template = format!("pre-${{{}}}", name);
      prop_assert!(e.resolve(&template).is_err());
    }
  }
}
