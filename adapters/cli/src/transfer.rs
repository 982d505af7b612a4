use std::{error::Error, fmt};

use base64::{engine::general_purpose::STANDARD_NO_PAD, Engine as _};
use duelforge_system_seed_search::SeedCertificate;

const TRANSFER_DOMAIN: &str = "duelforge";
const TRANSFER_VERSION: &str = "v1";

/// Identifier prefix emitted before the encoded certificate payload.
pub(crate) const TRANSFER_HEADER: &str = "duelforge:v1";
/// Delimiter used to separate the prefix, battle dimensions and payload.
const FIELD_DELIMITER: char = ':';

/// Encodes a certificate into a single-line string suitable for sharing.
///
/// The format is `duelforge:v1:<rounds>x<size>:<base64(json)>`, where the
/// dimensions segment makes the round count and matrix size visible without
/// decoding the payload.
#[must_use]
pub(crate) fn encode(certificate: &SeedCertificate) -> String {
    let json = serde_json::to_vec(certificate).expect("certificate serialization never fails");
    let payload = STANDARD_NO_PAD.encode(json);
    format!(
        "{TRANSFER_HEADER}:{}x{}:{payload}",
        certificate.battle_rounds(),
        certificate.rule().size()
    )
}

/// Decodes a certificate from its transfer-string representation.
pub(crate) fn decode(value: &str) -> Result<SeedCertificate, TransferError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(TransferError::EmptyPayload);
    }

    let mut parts = trimmed.split(FIELD_DELIMITER);
    let domain = parts.next().ok_or(TransferError::MissingPrefix)?;
    let version = parts.next().ok_or(TransferError::MissingVersion)?;
    let dimensions = parts.next().ok_or(TransferError::MissingDimensions)?;
    let payload = parts.next().ok_or(TransferError::MissingPayload)?;

    if domain != TRANSFER_DOMAIN {
        return Err(TransferError::InvalidPrefix(domain.to_owned()));
    }
    if version != TRANSFER_VERSION {
        return Err(TransferError::UnsupportedVersion(version.to_owned()));
    }

    let (rounds, size) = parse_dimensions(dimensions)?;
    let bytes = STANDARD_NO_PAD
        .decode(payload.as_bytes())
        .map_err(TransferError::InvalidEncoding)?;
    let certificate: SeedCertificate =
        serde_json::from_slice(&bytes).map_err(TransferError::InvalidPayload)?;

    if certificate.battle_rounds() != rounds || certificate.rule().size() != size as usize {
        return Err(TransferError::DimensionMismatch(dimensions.to_owned()));
    }

    Ok(certificate)
}

/// Errors that can occur while decoding certificate transfer strings.
#[derive(Debug)]
pub(crate) enum TransferError {
    /// The provided string was empty or contained only whitespace.
    EmptyPayload,
    /// The prefix segment was missing from the encoded certificate.
    MissingPrefix,
    /// The encoded certificate did not contain a version segment.
    MissingVersion,
    /// The encoded certificate did not include battle dimensions.
    MissingDimensions,
    /// The encoded certificate did not include the payload segment.
    MissingPayload,
    /// The encoded certificate used an unexpected prefix segment.
    InvalidPrefix(String),
    /// The encoded certificate used an unsupported version identifier.
    UnsupportedVersion(String),
    /// The battle dimensions could not be parsed from the encoded string.
    InvalidDimensions(String),
    /// The dimensions segment disagreed with the decoded payload.
    DimensionMismatch(String),
    /// The base64 payload could not be decoded.
    InvalidEncoding(base64::DecodeError),
    /// The decoded payload could not be deserialised.
    InvalidPayload(serde_json::Error),
}

impl fmt::Display for TransferError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::EmptyPayload => write!(f, "certificate string was empty"),
            Self::MissingPrefix => write!(f, "certificate string is missing the prefix"),
            Self::MissingVersion => write!(f, "certificate string is missing the version"),
            Self::MissingDimensions => {
                write!(f, "certificate string is missing the battle dimensions")
            }
            Self::MissingPayload => write!(f, "certificate string is missing the payload"),
            Self::InvalidPrefix(prefix) => {
                write!(f, "certificate prefix '{prefix}' is not supported")
            }
            Self::UnsupportedVersion(version) => {
                write!(f, "certificate version '{version}' is not supported")
            }
            Self::InvalidDimensions(dimensions) => {
                write!(f, "could not parse battle dimensions '{dimensions}'")
            }
            Self::DimensionMismatch(dimensions) => {
                write!(f, "dimensions '{dimensions}' disagree with the payload")
            }
            Self::InvalidEncoding(error) => {
                write!(f, "could not decode certificate payload: {error}")
            }
            Self::InvalidPayload(error) => {
                write!(f, "could not parse certificate payload: {error}")
            }
        }
    }
}

impl Error for TransferError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::InvalidEncoding(error) => Some(error),
            Self::InvalidPayload(error) => Some(error),
            _ => None,
        }
    }
}

fn parse_dimensions(dimensions: &str) -> Result<(u32, u32), TransferError> {
    let (rounds, size) = dimensions
        .split_once(['x', 'X'])
        .ok_or_else(|| TransferError::InvalidDimensions(dimensions.to_owned()))?;

    let rounds = rounds
        .trim()
        .parse::<u32>()
        .map_err(|_| TransferError::InvalidDimensions(dimensions.to_owned()))?;
    let size = size
        .trim()
        .parse::<u32>()
        .map_err(|_| TransferError::InvalidDimensions(dimensions.to_owned()))?;

    if rounds == 0 || size == 0 {
        return Err(TransferError::InvalidDimensions(dimensions.to_owned()));
    }

    Ok((rounds, size))
}
