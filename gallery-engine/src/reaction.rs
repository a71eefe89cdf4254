//! Reaction vocabulary and the pure transition resolver.
//!
//! A viewer holds at most one reaction per image. Requesting the action
//! that is already active toggles it off; requesting the other action
//! switches, which takes two remote calls (retract the old, then apply
//! the new).

use serde::{Deserialize, Serialize};

/// The viewer's stance on one image. "No reaction" is `Option::None`,
/// never a stored variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Reaction {
    Like,
    Dislike,
}

/// What the viewer clicked. There is no "clear" action; clearing is
/// expressed by repeating the active reaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VoteAction {
    Like,
    Dislike,
}

/// One call against the remote counter service.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RemoteOp {
    Like,
    Unlike,
    Dislike,
    Undislike,
}

impl RemoteOp {
    /// Path segment used by the counter service for this operation.
    pub fn as_str(self) -> &'static str {
        match self {
            RemoteOp::Like => "like",
            RemoteOp::Unlike => "unlike",
            RemoteOp::Dislike => "dislike",
            RemoteOp::Undislike => "undislike",
        }
    }
}

impl std::fmt::Display for RemoteOp {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Everything one vote does, computed up front: the optimistic count
/// deltas, the reaction to store, and the ordered remote calls.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Transition {
    pub previous: Option<Reaction>,
    pub next: Option<Reaction>,
    pub likes_delta: i64,
    pub dislikes_delta: i64,
    /// Remote calls in issue order. At most two (retract, then apply).
    pub ops: Vec<RemoteOp>,
}

/// Resolve a vote intent against the viewer's current reaction.
///
/// | previous | requested | next    | likesΔ | dislikesΔ | ops              |
/// |----------|-----------|---------|--------|-----------|------------------|
/// | None     | Like      | Like    | +1     | 0         | like             |
/// | None     | Dislike   | Dislike | 0      | +1        | dislike          |
/// | Like     | Like      | None    | −1     | 0         | unlike           |
/// | Like     | Dislike   | Dislike | −1     | +1        | unlike, dislike  |
/// | Dislike  | Dislike   | None    | 0      | −1        | undislike        |
/// | Dislike  | Like      | Like    | +1     | −1        | undislike, like  |
pub fn resolve(previous: Option<Reaction>, requested: VoteAction) -> Transition {
    let requested = match requested {
        VoteAction::Like => Reaction::Like,
        VoteAction::Dislike => Reaction::Dislike,
    };
    // Same action again toggles off.
    let next = if previous == Some(requested) {
        None
    } else {
        Some(requested)
    };

    // Guard: a no-op transition issues no remote calls.
    if previous == next {
        return Transition {
            previous,
            next,
            likes_delta: 0,
            dislikes_delta: 0,
            ops: Vec::new(),
        };
    }

    let delta = |reaction: Reaction| -> i64 {
        let removed = i64::from(previous == Some(reaction));
        let added = i64::from(next == Some(reaction));
        added - removed
    };

    let mut ops = Vec::with_capacity(2);
    match previous {
        Some(Reaction::Like) => ops.push(RemoteOp::Unlike),
        Some(Reaction::Dislike) => ops.push(RemoteOp::Undislike),
        None => {}
    }
    match next {
        Some(Reaction::Like) => ops.push(RemoteOp::Like),
        Some(Reaction::Dislike) => ops.push(RemoteOp::Dislike),
        None => {}
    }

    Transition {
        previous,
        next,
        likes_delta: delta(Reaction::Like),
        dislikes_delta: delta(Reaction::Dislike),
        ops,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn check(
        previous: Option<Reaction>,
        requested: VoteAction,
        next: Option<Reaction>,
        likes_delta: i64,
        dislikes_delta: i64,
        ops: &[RemoteOp],
    ) {
        let t = resolve(previous, requested);
        assert_eq!(t.previous, previous);
        assert_eq!(t.next, next);
        assert_eq!(t.likes_delta, likes_delta);
        assert_eq!(t.dislikes_delta, dislikes_delta);
        assert_eq!(t.ops, ops);
    }

    #[test]
    fn test_fresh_like() {
        check(None, VoteAction::Like, Some(Reaction::Like), 1, 0, &[RemoteOp::Like]);
    }

    #[test]
    fn test_fresh_dislike() {
        check(
            None,
            VoteAction::Dislike,
            Some(Reaction::Dislike),
            0,
            1,
            &[RemoteOp::Dislike],
        );
    }

    #[test]
    fn test_like_toggles_off() {
        check(
            Some(Reaction::Like),
            VoteAction::Like,
            None,
            -1,
            0,
            &[RemoteOp::Unlike],
        );
    }

    #[test]
    fn test_dislike_toggles_off() {
        check(
            Some(Reaction::Dislike),
            VoteAction::Dislike,
            None,
            0,
            -1,
            &[RemoteOp::Undislike],
        );
    }

    #[test]
    fn test_like_switches_to_dislike() {
        // Retract first, then apply, in that order.
        check(
            Some(Reaction::Like),
            VoteAction::Dislike,
            Some(Reaction::Dislike),
            -1,
            1,
            &[RemoteOp::Unlike, RemoteOp::Dislike],
        );
    }

    #[test]
    fn test_dislike_switches_to_like() {
        check(
            Some(Reaction::Dislike),
            VoteAction::Like,
            Some(Reaction::Like),
            1,
            -1,
            &[RemoteOp::Undislike, RemoteOp::Like],
        );
    }

    #[test]
    fn test_reaction_wire_format_is_lowercase() {
        assert_eq!(serde_json::to_string(&Reaction::Like).unwrap(), "\"like\"");
        let r: Reaction = serde_json::from_str("\"dislike\"").unwrap();
        assert_eq!(r, Reaction::Dislike);
    }

    #[test]
    fn test_deltas_cancel_over_a_full_toggle() {
        for action in [VoteAction::Like, VoteAction::Dislike] {
            let on = resolve(None, action);
            let off = resolve(on.next, action);
            assert_eq!(on.likes_delta + off.likes_delta, 0);
            assert_eq!(on.dislikes_delta + off.dislikes_delta, 0);
            assert_eq!(off.next, None);
        }
    }
}
