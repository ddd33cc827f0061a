//! # Sentinel notification parser.
//!
//! Turns a raw notification (channel name + text payload) into an
//! [`EventMessage`]. Pure: no state, no I/O.
//!
//! ## Payload grammar (space-delimited)
//! ```text
//! tilt:            (empty)
//! +switch-master:  <master-name> <old-ip> <old-port> <new-ip> <new-port>
//! instance events: <instance-type> <name> <ip> <port> [@ <master-name> <master-ip> <master-port>]
//! ```
//!
//! ## Example
//! ```rust
//! use sentinelvisor::{EventMessage, InstanceDetails};
//!
//! let msg = EventMessage::parse("+switch-master", "shard1 10.0.0.1 6379 10.0.0.2 6379").unwrap();
//! assert_eq!(msg.target.ip, "10.0.0.1");
//! assert_eq!(msg.master.ip, "10.0.0.2");
//! ```

use crate::error::ParseError;

/// Channel announcing a completed failover.
pub const SWITCH_MASTER: &str = "+switch-master";
/// Channel announcing a failover aborted for lack of a promotable replica.
pub const FAILOVER_ABORT_NO_GOOD_SLAVE: &str = "-failover-abort-no-good-slave";
/// Channel announcing an instance is subjectively down.
pub const SDOWN: &str = "+sdown";
/// Channel announcing an instance is no longer subjectively down.
pub const SDOWN_CLEARED: &str = "-sdown";

/// Channel names routed to the tilt branch.
///
/// Sentinel publishes `+tilt` on entering tilt mode and `-tilt` on leaving it.
/// Earlier versions of this dispatch matched a different pair of literals,
/// one of them apparently a misspelled "tilt-start" token, so real tilt
/// notifications never took the tilt branch there. These are the names
/// Sentinel actually emits; kept as one list so the matched strings can be
/// checked and changed in isolation.
pub const TILT_KINDS: [&str; 2] = ["+tilt", "-tilt"];

/// Role reported for masters.
pub const ROLE_MASTER: &str = "master";

/// Location and role of one monitored instance.
///
/// A default (all-empty) value means "unknown / not applicable".
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InstanceDetails {
    pub role: String,
    pub name: String,
    pub ip: String,
    pub port: String,
}

impl InstanceDetails {
    fn new(role: &str, name: &str, ip: &str, port: &str) -> Self {
        Self {
            role: role.to_owned(),
            name: name.to_owned(),
            ip: ip.to_owned(),
            port: port.to_owned(),
        }
    }

    /// Returns `ip:port`.
    pub fn addr(&self) -> String {
        format!("{}:{}", self.ip, self.port)
    }

    /// True when nothing is known about the instance.
    pub fn is_unknown(&self) -> bool {
        *self == Self::default()
    }
}

/// Parsed Sentinel notification.
///
/// For self-referential events (a master reporting its own state)
/// `master == target`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EventMessage {
    /// Raw channel name, e.g. `+sdown`.
    pub kind: String,
    /// Instance the event is about.
    pub target: InstanceDetails,
    /// Master the target belongs to.
    pub master: InstanceDetails,
}

impl EventMessage {
    /// Parses a notification payload.
    ///
    /// The payload is split on single spaces; an empty payload has no fields.
    pub fn parse(kind: &str, payload: &str) -> Result<Self, ParseError> {
        let fields: Vec<&str> = if payload.is_empty() {
            Vec::new()
        } else {
            payload.split(' ').collect()
        };
        Self::from_fields(kind, &fields)
    }

    /// Builds a message from pre-split payload fields.
    pub fn from_fields(kind: &str, fields: &[&str]) -> Result<Self, ParseError> {
        let (target, master) = if TILT_KINDS.contains(&kind) {
            parse_tilt(fields)?
        } else if kind == SWITCH_MASTER {
            parse_switch_master(fields)?
        } else {
            parse_instance(fields)?
        };

        Ok(Self {
            kind: kind.to_owned(),
            target,
            master,
        })
    }

    /// True when the message describes a master switching address.
    pub fn is_switch_master(&self) -> bool {
        self.kind == SWITCH_MASTER
    }
}

fn parse_tilt(fields: &[&str]) -> Result<(InstanceDetails, InstanceDetails), ParseError> {
    if !fields.is_empty() {
        return Err(ParseError::TiltPayloadNotEmpty);
    }
    Ok((InstanceDetails::default(), InstanceDetails::default()))
}

fn parse_switch_master(fields: &[&str]) -> Result<(InstanceDetails, InstanceDetails), ParseError> {
    match fields {
        [] => Err(ParseError::EmptySwitchPayload),
        [name, old_ip, old_port, new_ip, new_port, ..] => Ok((
            InstanceDetails::new(ROLE_MASTER, name, old_ip, old_port),
            InstanceDetails::new(ROLE_MASTER, name, new_ip, new_port),
        )),
        _ => Err(ParseError::InvalidSwitchPayload {
            fields: fields.len(),
        }),
    }
}

fn parse_instance(fields: &[&str]) -> Result<(InstanceDetails, InstanceDetails), ParseError> {
    match fields {
        [] => Err(ParseError::EmptyInstancePayload),
        // Field 4 is the literal `@` separator.
        [role, name, ip, port, _, m_name, m_ip, m_port] => Ok((
            InstanceDetails::new(role, name, ip, port),
            InstanceDetails::new(ROLE_MASTER, m_name, m_ip, m_port),
        )),
        [role, name, ip, port, ..] => {
            let target = InstanceDetails::new(role, name, ip, port);
            Ok((target.clone(), target))
        }
        _ => Err(ParseError::InvalidInstancePayload {
            fields: fields.len(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn details(role: &str, name: &str, ip: &str, port: &str) -> InstanceDetails {
        InstanceDetails::new(role, name, ip, port)
    }

    #[test]
    fn switch_master_maps_old_and_new_address() {
        let msg = EventMessage::parse(SWITCH_MASTER, "shard1 10.0.0.1 6379 10.0.0.2 6379").unwrap();
        assert_eq!(msg.kind, "+switch-master");
        assert_eq!(msg.target, details("master", "shard1", "10.0.0.1", "6379"));
        assert_eq!(msg.master, details("master", "shard1", "10.0.0.2", "6379"));
        assert!(msg.is_switch_master());
    }

    #[test]
    fn switch_master_errors() {
        assert_eq!(
            EventMessage::parse(SWITCH_MASTER, "").unwrap_err(),
            ParseError::EmptySwitchPayload
        );
        assert_eq!(
            EventMessage::parse(SWITCH_MASTER, "shard1 10.0.0.1 6379 10.0.0.2").unwrap_err(),
            ParseError::InvalidSwitchPayload { fields: 4 }
        );
        assert_eq!(
            EventMessage::parse(SWITCH_MASTER, "").unwrap_err().to_string(),
            "empty payload for switch event"
        );
    }

    #[test]
    fn instance_event_with_master_suffix() {
        let msg =
            EventMessage::parse(SDOWN, "slave shard1 10.0.0.2 6379 @ shard1 10.0.0.1 6379").unwrap();
        assert_eq!(msg.target, details("slave", "shard1", "10.0.0.2", "6379"));
        assert_eq!(msg.master, details("master", "shard1", "10.0.0.1", "6379"));
    }

    #[test]
    fn instance_event_is_self_referential_without_suffix() {
        let msg = EventMessage::parse(SDOWN, "master shard1 10.0.0.1 6379").unwrap();
        let expected = details("master", "shard1", "10.0.0.1", "6379");
        assert_eq!(msg.target, expected);
        assert_eq!(msg.master, expected);
    }

    #[test]
    fn instance_event_with_unexpected_field_count_is_self_referential() {
        // Six fields: neither the bare form nor the `@` form.
        let msg = EventMessage::parse(SDOWN_CLEARED, "slave shard1 10.0.0.2 6379 @ shard1").unwrap();
        assert_eq!(msg.master, msg.target);
    }

    #[test]
    fn instance_event_errors() {
        assert_eq!(
            EventMessage::parse(SDOWN, "slave 10.0.0.2").unwrap_err(),
            ParseError::InvalidInstancePayload { fields: 2 }
        );
        assert_eq!(
            EventMessage::parse("+odown", "").unwrap_err(),
            ParseError::EmptyInstancePayload
        );
    }

    #[test]
    fn tilt_clears_both_instances() {
        for kind in TILT_KINDS {
            let msg = EventMessage::parse(kind, "").unwrap();
            assert_eq!(msg.kind, kind);
            assert!(msg.target.is_unknown());
            assert!(msg.master.is_unknown());
        }
    }

    #[test]
    fn tilt_rejects_payload() {
        assert_eq!(
            EventMessage::parse("+tilt", "anything").unwrap_err(),
            ParseError::TiltPayloadNotEmpty
        );
    }

    #[test]
    fn tilt_branch_matches_only_sentinel_tilt_channels() {
        assert_eq!(TILT_KINDS, ["+tilt", "-tilt"]);
        // Non-tilt spellings fall through to the instance grammar.
        for kind in ["tilt-start", "tilt-stop", "+tilt-start"] {
            assert_eq!(
                EventMessage::parse(kind, "").unwrap_err(),
                ParseError::EmptyInstancePayload
            );
        }
    }

    #[test]
    fn failover_abort_uses_instance_grammar() {
        let msg = EventMessage::parse(FAILOVER_ABORT_NO_GOOD_SLAVE, "master shard2 10.0.0.5 6380")
            .unwrap();
        assert_eq!(msg.target.name, "shard2");
        assert_eq!(msg.target.addr(), "10.0.0.5:6380");
    }
}
