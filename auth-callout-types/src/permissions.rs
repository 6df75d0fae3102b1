/*
 * Copyright 2025 Security Union LLC
 *
 * Licensed under either of
 *
 * * Apache License, Version 2.0
 *   (http://www.apache.org/licenses/LICENSE-2.0)
 * * MIT license
 *   (http://opensource.org/licenses/MIT)
 *
 * at your option.
 */

//! Publish/subscribe permission sets in the NATS user JWT layout.

use serde::{Deserialize, Serialize};

/// Allow/deny subject patterns for one direction (publish or subscribe).
///
/// The broker evaluates `deny` before `allow`. Empty lists are omitted from
/// the serialized form, matching what the NATS server emits.
#[derive(Debug, Serialize, Deserialize, Clone, Default, PartialEq, Eq)]
pub struct Permission {
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub allow: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub deny: Vec<String>,
}

impl Permission {
    pub fn allow<I, S>(subjects: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            allow: subjects.into_iter().map(Into::into).collect(),
            deny: Vec::new(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.allow.is_empty() && self.deny.is_empty()
    }

    /// Iterate over every pattern, allow entries first.
    pub fn patterns(&self) -> impl Iterator<Item = &str> {
        self.allow.iter().chain(self.deny.iter()).map(String::as_str)
    }
}

/// The authorization decision for one connection.
#[derive(Debug, Serialize, Deserialize, Clone, Default, PartialEq, Eq)]
pub struct PermissionSet {
    #[serde(rename = "pub", default)]
    pub publish: Permission,
    #[serde(rename = "sub", default)]
    pub subscribe: Permission,
}

impl PermissionSet {
    pub fn patterns(&self) -> impl Iterator<Item = &str> {
        self.publish.patterns().chain(self.subscribe.patterns())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_lists_are_omitted() {
        let set = PermissionSet {
            publish: Permission::default(),
            subscribe: Permission::allow(["round.*.g1"]),
        };
        let json = serde_json::to_value(&set).unwrap();
        assert_eq!(
            json,
            serde_json::json!({ "pub": {}, "sub": { "allow": ["round.*.g1"] } })
        );
    }

    #[test]
    fn patterns_walks_publish_then_subscribe() {
        let set = PermissionSet {
            publish: Permission {
                allow: vec!["a".into()],
                deny: vec!["b".into()],
            },
            subscribe: Permission::allow(["c"]),
        };
        assert_eq!(set.patterns().collect::<Vec<_>>(), ["a", "b", "c"]);
    }
}
