//! Tagged outcomes for remote calls.
//!
//! The store reports most failures inside a 200-class body as an
//! `errormsg` field, and signals "you already created this" the same way
//! it signals real errors. Every response is classified exactly once,
//! here, into a variant; callers never inspect message text themselves.

use crate::error::{ProtocolError, ProtocolResult};
use serde::de::DeserializeOwned;

/// The outcome of a single remote call.
#[derive(Debug, Clone, PartialEq)]
pub enum CallOutcome<T> {
    /// The call succeeded and returned a payload.
    Ok(T),
    /// The store rejected the call as a duplicate; the raw message is kept
    /// for logging only.
    Conflict(String),
    /// The referenced record does not exist.
    NotFound,
    /// The store failed the call for any other reason.
    Fatal {
        /// HTTP status code of the response.
        status: u16,
        /// Server-provided detail, or a body excerpt.
        detail: String,
    },
}

impl<T> CallOutcome<T> {
    /// Maps the success payload, leaving other variants untouched.
    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> CallOutcome<U> {
        match self {
            CallOutcome::Ok(value) => CallOutcome::Ok(f(value)),
            CallOutcome::Conflict(msg) => CallOutcome::Conflict(msg),
            CallOutcome::NotFound => CallOutcome::NotFound,
            CallOutcome::Fatal { status, detail } => CallOutcome::Fatal { status, detail },
        }
    }

    /// Returns true for the conflict variant.
    #[must_use]
    pub fn is_conflict(&self) -> bool {
        matches!(self, CallOutcome::Conflict(_))
    }
}

/// Classifies a raw response into a [`CallOutcome`].
///
/// Duplicate detection happens only here. The `errormsg` field is probed
/// both at the envelope root and inside `data`; which level carries it
/// depends on the endpoint.
pub fn classify<T: DeserializeOwned>(status: u16, body: &str) -> ProtocolResult<CallOutcome<T>> {
    if status == 404 {
        return Ok(CallOutcome::NotFound);
    }
    if !matches!(status, 200 | 201 | 400) {
        return Ok(CallOutcome::Fatal {
            status,
            detail: excerpt(body),
        });
    }

    let value: serde_json::Value = serde_json::from_str(body)
        .map_err(|e| ProtocolError::malformed(format!("status {status}: {e}")))?;

    if let Some(msg) = error_message(&value) {
        return Ok(if is_duplicate_message(&msg) {
            CallOutcome::Conflict(msg)
        } else if is_missing_message(&msg) {
            CallOutcome::NotFound
        } else {
            CallOutcome::Fatal {
                status,
                detail: msg,
            }
        });
    }
    if status == 400 {
        return Ok(CallOutcome::Fatal {
            status,
            detail: excerpt(body),
        });
    }

    let data = value
        .get("data")
        .cloned()
        .ok_or_else(|| ProtocolError::malformed("response has no data field"))?;
    let payload: T = serde_json::from_value(data)
        .map_err(|e| ProtocolError::malformed(format!("data field did not decode: {e}")))?;
    Ok(CallOutcome::Ok(payload))
}

fn error_message(value: &serde_json::Value) -> Option<String> {
    let probe = |v: &serde_json::Value| {
        v.get("errormsg")
            .and_then(|m| m.as_str())
            .filter(|m| !m.trim().is_empty())
            .map(str::to_string)
    };
    probe(value).or_else(|| value.get("data").and_then(|d| probe(d)))
}

fn is_duplicate_message(message: &str) -> bool {
    message.to_lowercase().contains("already exists")
}

fn is_missing_message(message: &str) -> bool {
    let folded = message.to_lowercase();
    folded.contains("does not exist") || folded.contains("not found")
}

fn excerpt(body: &str) -> String {
    let trimmed = body.trim();
    if trimmed.len() > 200 {
        format!("{}...", &trimmed[..200])
    } else {
        trimmed.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, PartialEq, serde::Deserialize)]
    struct Payload {
        label: String,
    }

    #[test]
    fn ok_payload() {
        let outcome: CallOutcome<Payload> =
            classify(200, r#"{"data":{"label":"brain"}}"#).unwrap();
        assert_eq!(
            outcome,
            CallOutcome::Ok(Payload {
                label: "brain".into()
            })
        );
    }

    #[test]
    fn conflict_from_errormsg() {
        let outcome: CallOutcome<Payload> =
            classify(200, r#"{"data":{"errormsg":"Term Already Exists"}}"#).unwrap();
        assert_eq!(
            outcome,
            CallOutcome::Conflict("Term Already Exists".into())
        );

        // Same message at the envelope root.
        let outcome: CallOutcome<Payload> =
            classify(400, r#"{"errormsg":"label already exists"}"#).unwrap();
        assert!(outcome.is_conflict());
    }

    #[test]
    fn not_found_variants() {
        let outcome: CallOutcome<Payload> = classify(404, "").unwrap();
        assert_eq!(outcome, CallOutcome::NotFound);

        let outcome: CallOutcome<Payload> =
            classify(200, r#"{"errormsg":"term does not exist"}"#).unwrap();
        assert_eq!(outcome, CallOutcome::NotFound);
    }

    #[test]
    fn fatal_statuses() {
        let outcome: CallOutcome<Payload> = classify(500, "internal error").unwrap();
        assert!(matches!(outcome, CallOutcome::Fatal { status: 500, .. }));

        let outcome: CallOutcome<Payload> =
            classify(400, r#"{"data":null}"#).unwrap();
        assert!(matches!(outcome, CallOutcome::Fatal { status: 400, .. }));
    }

    #[test]
    fn malformed_body_is_an_error() {
        assert!(classify::<Payload>(200, "<html>oops</html>").is_err());
        assert!(classify::<Payload>(200, r#"{"nodata":1}"#).is_err());
    }

    #[test]
    fn outcome_map() {
        let outcome = CallOutcome::Ok(2u64).map(|n| n * 2);
        assert_eq!(outcome, CallOutcome::Ok(4u64));
        let outcome: CallOutcome<u64> = CallOutcome::<u64>::NotFound.map(|n| n);
        assert_eq!(outcome, CallOutcome::NotFound);
    }
}
