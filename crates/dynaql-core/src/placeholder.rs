//! Placeholder tokens and the tables that bind them.
//!
//! Name tokens (`#token`) stand for attribute names, value tokens (`:token`)
//! for encoded values. A token may be bound any number of times to the same
//! target; binding it to a different target is a conflict. Path names never
//! conflict: a segment whose token is taken by another segment gets the next
//! free `_<n>` variant instead.

use std::collections::BTreeMap;
use std::collections::btree_map::Entry;

use dynaql_model::{NamePlaceholders, TypeDescriptor, ValuePlaceholders};

use crate::error::{Error, Result};
use crate::path::{AttributePath, sanitize};

/// Expression text for a path plus the name bindings it needs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NamePlaceholder {
    /// `#a.#b.#c` form of the path.
    pub expression: String,
    /// `(token, raw segment)` pairs in path order.
    pub bindings: Vec<(String, String)>,
}

/// Name placeholder for `path`: one `#<segment><_suffix>` token per segment,
/// joined with `.`. An empty suffix adds nothing.
#[must_use]
pub fn name_placeholder(path: &AttributePath, suffix: &str) -> NamePlaceholder {
    let bindings: Vec<(String, String)> = path
        .segments()
        .map(|segment| {
            let mut token = sanitize(segment);
            if token.is_empty() {
                token.push('_');
            }
            (format!("#{token}{}", suffix_part(suffix)), segment.to_owned())
        })
        .collect();
    let expression = bindings
        .iter()
        .map(|(token, _)| token.as_str())
        .collect::<Vec<_>>()
        .join(".");
    NamePlaceholder {
        expression,
        bindings,
    }
}

/// Value placeholder for `path`: `:<flattened path><_suffix>`.
#[must_use]
pub fn value_placeholder(path: &AttributePath, suffix: &str) -> String {
    format!(":{}{}", path.value_token(), suffix_part(suffix))
}

fn suffix_part(suffix: &str) -> String {
    if suffix.is_empty() {
        String::new()
    } else {
        format!("_{suffix}")
    }
}

/// Name and value tables of one compiled expression or operation.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Placeholders {
    names: NamePlaceholders,
    values: ValuePlaceholders,
}

impl Placeholders {
    /// Empty tables.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Bind a name token.
    pub fn bind_name(&mut self, token: impl Into<String>, name: impl Into<String>) -> Result<()> {
        bind(&mut self.names, token.into(), name.into())
    }

    /// Bind a value token.
    pub fn bind_value(&mut self, token: impl Into<String>, value: TypeDescriptor) -> Result<()> {
        bind(&mut self.values, token.into(), value)
    }

    /// Bind the name tokens of `path` and return its expression form.
    ///
    /// Distinct segments that sanitize to the same token (`a-b` and `ab`,
    /// `[0]` and `0`) are told apart with a numeric tail: `#ab`, `#ab_1`.
    pub fn bind_path(&mut self, path: &AttributePath, suffix: &str) -> Result<String> {
        let placeholder = name_placeholder(path, suffix);
        let tokens = placeholder
            .bindings
            .into_iter()
            .map(|(token, segment)| {
                let token = self.free_name_token(token, &segment);
                self.bind_name(token.clone(), segment)?;
                Ok(token)
            })
            .collect::<Result<Vec<_>>>()?;
        Ok(tokens.join("."))
    }

    /// `token` itself when unbound or already bound to `segment`, else the
    /// first `token_<n>` that is.
    fn free_name_token(&self, token: String, segment: &str) -> String {
        let usable = |candidate: &str| {
            self.names
                .get(candidate)
                .is_none_or(|bound| bound == segment)
        };
        if usable(&token) {
            return token;
        }
        let mut n = 1;
        loop {
            let candidate = format!("{token}_{n}");
            if usable(&candidate) {
                return candidate;
            }
            n += 1;
        }
    }

    /// Union `other` into `self`. On conflict `self` is left unchanged.
    pub fn merge(&mut self, other: Placeholders) -> Result<()> {
        check_disjoint(&self.names, &other.names)?;
        check_disjoint(&self.values, &other.values)?;
        self.names.extend(other.names);
        self.values.extend(other.values);
        Ok(())
    }

    /// Name table.
    #[must_use]
    pub fn names(&self) -> &NamePlaceholders {
        &self.names
    }

    /// Value table.
    #[must_use]
    pub fn values(&self) -> &ValuePlaceholders {
        &self.values
    }

    /// Whether both tables are empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.names.is_empty() && self.values.is_empty()
    }

    /// Split into the two tables.
    #[must_use]
    pub fn into_parts(self) -> (NamePlaceholders, ValuePlaceholders) {
        (self.names, self.values)
    }
}

fn bind<V: PartialEq>(table: &mut BTreeMap<String, V>, token: String, target: V) -> Result<()> {
    match table.entry(token) {
        Entry::Occupied(entry) if *entry.get() == target => Ok(()),
        Entry::Occupied(entry) => Err(Error::PlaceholderConflict {
            token: entry.key().clone(),
        }),
        Entry::Vacant(entry) => {
            entry.insert(target);
            Ok(())
        }
    }
}

fn check_disjoint<V: PartialEq>(
    ours: &BTreeMap<String, V>,
    theirs: &BTreeMap<String, V>,
) -> Result<()> {
    for (token, target) in theirs {
        if ours.get(token).is_some_and(|existing| existing != target) {
            return Err(Error::PlaceholderConflict {
                token: token.clone(),
            });
        }
    }
    Ok(())
}
