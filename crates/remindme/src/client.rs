//! Submitting side: validate the three CLI fields, then hand the payload to
//! the scheduling process.

use std::path::Path;

use remindme_core::{
    descriptor::{self, FIELD_SEPARATOR},
    Destination, ParseError,
};
use tokio::{io::AsyncWriteExt, net::UnixStream};

use crate::error::SubmitError;

/// Pre-flight check. Returns the wire payload if the scheduling process
/// would accept it; nothing is sent on error.
pub fn prepare(destination: &str, timespec: &str, message: &str) -> Result<String, SubmitError> {
    destination.parse::<Destination>()?;
    // A separator inside the timespec would shift the split on the other end.
    if timespec.contains(FIELD_SEPARATOR) {
        return Err(ParseError::InvalidFormat {
            destination: destination.to_string(),
            reason: format!("timespec must not contain '{FIELD_SEPARATOR}'"),
        }
        .into());
    }

    let payload = descriptor::join_fields(destination, timespec, message);
    descriptor::parse(&payload)?;
    Ok(payload)
}

/// Connect to `socket_path`, write `payload`, close.
pub async fn submit(socket_path: &Path, payload: &str) -> Result<(), SubmitError> {
    let transmission = |source| SubmitError::Transmission {
        path: socket_path.to_path_buf(),
        source,
    };
    let mut stream = UnixStream::connect(socket_path).await.map_err(transmission)?;
    stream
        .write_all(payload.as_bytes())
        .await
        .map_err(transmission)?;
    stream.shutdown().await.map_err(transmission)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn valid_fields_join_into_payload() {
        assert_eq!(
            prepare("in", "5m", "login to the meeting").unwrap(),
            "in|5m|login to the meeting"
        );
    }

    #[test]
    fn malformed_clock_time_rejected() {
        let err = prepare("at", "916", "call the handyman").unwrap_err();
        assert!(matches!(
            err,
            SubmitError::Validation(ParseError::InvalidFormat { .. })
        ));
        assert!(err.to_string().starts_with("error: "));
    }

    #[test]
    fn unknown_destination_rejected() {
        let err = prepare("by", "09:16", "x").unwrap_err();
        assert!(matches!(
            err,
            SubmitError::Validation(ParseError::UnknownDestination(ref d)) if d == "by"
        ));
    }

    #[test]
    fn separator_in_destination_is_unknown_destination() {
        let err = prepare("at|09:16", "x", "y").unwrap_err();
        assert!(matches!(
            err,
            SubmitError::Validation(ParseError::UnknownDestination(ref d)) if d == "at|09:16"
        ));
    }

    #[test]
    fn unsupported_unit_rejected() {
        let err = prepare("in", "30s", "x").unwrap_err();
        assert!(matches!(
            err,
            SubmitError::Validation(ParseError::UnsupportedUnit(_))
        ));
    }

    #[test]
    fn separator_in_timespec_rejected() {
        let err = prepare("in", "5m|later", "x").unwrap_err();
        assert!(matches!(
            err,
            SubmitError::Validation(ParseError::InvalidFormat { .. })
        ));
    }

    #[test]
    fn separator_in_message_kept() {
        assert_eq!(prepare("at", "10:00", "a|b").unwrap(), "at|10:00|a|b");
    }

    #[tokio::test]
    async fn unreachable_socket_is_transmission_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = submit(&dir.path().join("missing.sock"), "at|10:00|x")
            .await
            .unwrap_err();
        assert!(matches!(err, SubmitError::Transmission { .. }));
    }
}
