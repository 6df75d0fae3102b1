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

//! Role → subject permission policy.
//!
//! Subscribe scope widens from viewer to player/editor. Publish rights are
//! listed per role and never inherited: only editors may change rounds or
//! submit scores, players may only join or leave rounds.

use auth_callout_types::{Permission, PermissionSet, Role};

const VIEWER_SUBSCRIBE: &[&str] = &["round.*.{guild}", "leaderboard.*.{guild}", "guild.*.{guild}"];

const PLAYER_SUBSCRIBE: &[&str] = &["score.*.{user}", "user.*.{user}"];
const PLAYER_PUBLISH: &[&str] = &[
    "round.participant.join.{guild}",
    "round.participant.leave.{guild}",
];

const EDITOR_SUBSCRIBE: &[&str] = &["score.*.{guild}", "user.*.{user}"];
const EDITOR_PUBLISH: &[&str] = &[
    "round.create.{guild}",
    "round.update.{guild}",
    "round.delete.{guild}",
    "round.participant.*.{guild}",
    "score.submit.{guild}",
];

/// Build the permission set for a member of `guild_id`.
///
/// Pure and deterministic: the same inputs always yield the same lists in the
/// same order.
pub fn build_permissions(role: Role, guild_id: &str, subject_id: &str) -> PermissionSet {
    let (extra_subscribe, publish): (&[&str], &[&str]) = match role {
        Role::Viewer => (&[], &[]),
        Role::Player => (PLAYER_SUBSCRIBE, PLAYER_PUBLISH),
        Role::Editor => (EDITOR_SUBSCRIBE, EDITOR_PUBLISH),
    };

    let scope = |templates: &[&str]| -> Vec<String> {
        templates
            .iter()
            .map(|t| t.replace("{guild}", guild_id).replace("{user}", subject_id))
            .collect()
    };

    let mut subscribe = scope(VIEWER_SUBSCRIBE);
    subscribe.extend(scope(extra_subscribe));

    PermissionSet {
        publish: Permission::allow(scope(publish)),
        subscribe: Permission::allow(subscribe),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sorted(mut v: Vec<String>) -> Vec<String> {
        v.sort();
        v
    }

    #[test]
    fn viewer_can_only_watch_the_guild() {
        let set = build_permissions(Role::Viewer, "g1", "u1");
        assert_eq!(
            set.subscribe.allow,
            ["round.*.g1", "leaderboard.*.g1", "guild.*.g1"]
        );
        assert!(set.publish.is_empty());
        assert!(set.subscribe.deny.is_empty());
    }

    #[test]
    fn player_sees_own_scores_and_joins_rounds() {
        let set = build_permissions(Role::Player, "g1", "u1");
        assert_eq!(
            set.subscribe.allow,
            [
                "round.*.g1",
                "leaderboard.*.g1",
                "guild.*.g1",
                "score.*.u1",
                "user.*.u1"
            ]
        );
        assert_eq!(
            set.publish.allow,
            ["round.participant.join.g1", "round.participant.leave.g1"]
        );
    }

    #[test]
    fn editor_sees_guild_scores_and_manages_rounds() {
        let set = build_permissions(Role::Editor, "g1", "u1");
        assert_eq!(
            set.subscribe.allow,
            [
                "round.*.g1",
                "leaderboard.*.g1",
                "guild.*.g1",
                "score.*.g1",
                "user.*.u1"
            ]
        );
        assert_eq!(
            sorted(set.publish.allow),
            sorted(vec![
                "round.create.g1".to_string(),
                "round.update.g1".to_string(),
                "round.delete.g1".to_string(),
                "round.participant.*.g1".to_string(),
                "score.submit.g1".to_string(),
            ])
        );
    }

    #[test]
    fn player_cannot_submit_scores() {
        let set = build_permissions(Role::Player, "g1", "u1");
        assert!(!set.publish.allow.iter().any(|s| s.starts_with("score.")));
        assert!(!set.subscribe.allow.contains(&"score.*.g1".to_string()));
    }

    #[test]
    fn unknown_roles_get_exactly_the_viewer_set() {
        for raw in ["admin", "", "Editor", "superuser"] {
            for (guild, user) in [("g1", "u1"), ("guild-42", "user-7")] {
                assert_eq!(
                    build_permissions(Role::from_claim(raw), guild, user),
                    build_permissions(Role::Viewer, guild, user)
                );
            }
        }
    }

    #[test]
    fn every_pattern_is_scoped() {
        for role in [Role::Viewer, Role::Player, Role::Editor] {
            let set = build_permissions(role, "g1", "u1");
            for pattern in set.patterns() {
                assert!(!pattern.contains('{'), "{pattern} left a placeholder");
                assert!(
                    pattern.ends_with(".g1") || pattern.ends_with(".u1"),
                    "{pattern} is not scoped"
                );
            }
        }
    }

    #[test]
    fn different_guilds_never_share_guild_scoped_patterns() {
        for role in [Role::Viewer, Role::Player, Role::Editor] {
            let a = build_permissions(role, "g1", "u1");
            let b = build_permissions(role, "g2", "u2");
            for pattern in a.patterns() {
                assert!(
                    !b.patterns().any(|other| other == pattern),
                    "{role}: {pattern} leaks across guilds"
                );
            }
        }
    }

    #[test]
    fn build_is_idempotent() {
        for role in [Role::Viewer, Role::Player, Role::Editor] {
            assert_eq!(
                build_permissions(role, "g1", "u1"),
                build_permissions(role, "g1", "u1")
            );
        }
    }
}
