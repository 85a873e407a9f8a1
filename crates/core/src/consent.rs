//! Share agreement state machine.
//!
//! A user is either [`SignState::Unsigned`] (including "no agreement row
//! yet") or [`SignState::Signed`]. A sign action names the target state;
//! asking for the state the user is already in is rejected rather than
//! accepted as a no-op.

use serde::Serialize;

/// Consent state of a single user.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SignState {
    #[default]
    Unsigned,
    Signed,
}

/// A sign action that targets the state the agreement is already in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("repeated sign operation: agreement is already {current:?}")]
pub struct RepeatSignOperation {
    pub current: SignState,
}

impl SignState {
    /// State for a stored agreement row, or `None` when the user has no row.
    pub fn from_stored(is_signed: Option<bool>) -> Self {
        match is_signed {
            Some(true) => SignState::Signed,
            Some(false) | None => SignState::Unsigned,
        }
    }

    pub fn is_signed(self) -> bool {
        matches!(self, SignState::Signed)
    }

    /// Apply a sign action, returning the new state.
    pub fn transition(self, wants_to_sign: bool) -> Result<SignState, RepeatSignOperation> {
        let target = if wants_to_sign {
            SignState::Signed
        } else {
            SignState::Unsigned
        };
        if target == self {
            return Err(RepeatSignOperation { current: self });
        }
        Ok(target)
    }
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;

    use super::*;

    #[test]
    fn missing_row_is_unsigned() {
        assert_eq!(SignState::from_stored(None), SignState::Unsigned);
        assert!(!SignState::from_stored(None).is_signed());
    }

    #[test]
    fn sign_then_cancel() {
        let signed = SignState::Unsigned.transition(true).unwrap();
        assert_eq!(signed, SignState::Signed);
        let cancelled = signed.transition(false).unwrap();
        assert_eq!(cancelled, SignState::Unsigned);
    }

    #[test]
    fn repeated_sign_is_rejected() {
        assert_matches!(
            SignState::Signed.transition(true),
            Err(RepeatSignOperation {
                current: SignState::Signed
            })
        );
    }

    #[test]
    fn cancel_without_agreement_is_rejected() {
        let state = SignState::from_stored(None);
        assert_matches!(
            state.transition(false),
            Err(RepeatSignOperation {
                current: SignState::Unsigned
            })
        );
    }
}
