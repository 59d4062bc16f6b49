//! Mapping from raw provider events to the canonical record shape.

use chrono::{DateTime, Utc};

use crate::error::ValidationError;
use crate::smartlead::{Campaign, RawEmailEvent};
use crate::types::BounceRecord;

/// Flattens one provider event into a `BounceRecord`.
///
/// Events missing `lead_email` or a parseable `sent_time` are rejected,
/// since both are needed for record identity and windowing. All other
/// missing fields fall back to defaults.
pub fn normalize(raw: &RawEmailEvent, campaign: &Campaign) -> Result<BounceRecord, ValidationError> {
    let email_address = raw
        .lead_email
        .as_deref()
        .filter(|s| !s.is_empty())
        .ok_or(ValidationError::MissingField("lead_email"))?
        .to_string();

    let sent_time = raw
        .sent_time
        .as_deref()
        .ok_or(ValidationError::MissingField("sent_time"))
        .and_then(parse_sent_time)?;

    Ok(BounceRecord {
        email_address,
        from_email: raw.from_email.clone().unwrap_or_default(),
        email_message: raw.email_message.clone().unwrap_or_default(),
        email_subject: raw.email_subject.clone().unwrap_or_default(),
        campaign_id: campaign.id,
        campaign_name: campaign.name.clone().unwrap_or_default(),
        email_status: raw
            .email_status
            .clone()
            .unwrap_or_else(|| "bounced".to_string()),
        sent_time,
        sequence_number: raw.sequence_number.unwrap_or(0),
    })
}

fn parse_sent_time(raw: &str) -> Result<DateTime<Utc>, ValidationError> {
    DateTime::parse_from_rfc3339(raw)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|_| ValidationError::InvalidTimestamp(raw.to_string()))
}
