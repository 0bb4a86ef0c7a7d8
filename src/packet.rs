use std::fmt;

use crate::error::NetError;

/// Width of the zero-padded destination address field on the wire.
pub const DST_ADDR_LEN: usize = 5;
/// Width of the protocol field on the wire.
pub const PROT_LEN: usize = 1;
/// Shortest possible wire string: padded address plus protocol character.
pub const MIN_WIRE_LEN: usize = DST_ADDR_LEN + PROT_LEN;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Protocol {
    Data,
    Control,
}

impl Protocol {
    fn wire_char(self) -> char {
        match self {
            Protocol::Data => '1',
            Protocol::Control => '2',
        }
    }

    fn from_wire(s: &str) -> Result<Self, NetError> {
        match s {
            "1" => Ok(Protocol::Data),
            "2" => Ok(Protocol::Control),
            other => Err(NetError::BadProtocol(other.to_string())),
        }
    }
}

impl fmt::Display for Protocol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Protocol::Data => write!(f, "data"),
            Protocol::Control => write!(f, "control"),
        }
    }
}

/// A network-layer packet.
///
/// The wire form is `pad5(dst_addr) || protocol char || payload`, with no
/// framing; one packet occupies one queue slot. The address is left-padded
/// with `'0'`, so addresses themselves must not begin with `'0'` or the
/// padding cannot be stripped unambiguously on decode.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NetworkPacket {
    pub dst_addr: String,
    pub protocol: Protocol,
    pub payload: String,
}

impl NetworkPacket {
    pub fn new(
        dst_addr: impl Into<String>,
        protocol: Protocol,
        payload: impl Into<String>,
    ) -> Self {
        Self {
            dst_addr: dst_addr.into(),
            protocol,
            payload: payload.into(),
        }
    }

    /// Encode for transmission over a link.
    pub fn to_wire(&self) -> String {
        format!(
            "{:0>width$}{}{}",
            self.dst_addr,
            self.protocol.wire_char(),
            self.payload,
            width = DST_ADDR_LEN
        )
    }

    /// Rebuild a packet from its wire form.
    pub fn from_wire(wire: &str) -> Result<Self, NetError> {
        let addr_field = wire
            .get(..DST_ADDR_LEN)
            .ok_or(NetError::Truncated(wire.len()))?;
        let prot_field = wire
            .get(DST_ADDR_LEN..MIN_WIRE_LEN)
            .ok_or(NetError::Truncated(wire.len()))?;

        let protocol = Protocol::from_wire(prot_field)?;
        let dst_addr = addr_field.trim_start_matches('0');
        let payload = &wire[MIN_WIRE_LEN..];

        Ok(Self::new(dst_addr, protocol, payload))
    }
}

impl fmt::Display for NetworkPacket {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_wire())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn encode_pads_address_and_maps_protocol() {
        let p = NetworkPacket::new("12", Protocol::Data, "HI");
        assert_eq!(p.to_wire(), "000121HI");

        let c = NetworkPacket::new("H0", Protocol::Control, "{}");
        assert_eq!(c.to_wire(), "000H02{}");
    }

    #[test]
    fn decode_strips_padding() {
        let p = NetworkPacket::from_wire("000121HI").unwrap();
        assert_eq!(p.dst_addr, "12");
        assert_eq!(p.protocol, Protocol::Data);
        assert_eq!(p.payload, "HI");
    }

    #[test]
    fn round_trip() {
        let p = NetworkPacket::new("H2", Protocol::Data, "MESSAGE_FROM_H1");
        assert_eq!(NetworkPacket::from_wire(&p.to_wire()).unwrap(), p);

        let c = NetworkPacket::new("H0", Protocol::Control, r#"{"RA":{"RA":0}}"#);
        assert_eq!(NetworkPacket::from_wire(&c.to_wire()).unwrap(), c);
    }

    #[test]
    fn decode_rejects_unknown_protocol() {
        let err = NetworkPacket::from_wire("000123HI").unwrap_err();
        assert!(matches!(err, NetError::BadProtocol(c) if c == "3"));
    }

    #[test]
    fn decode_rejects_short_input() {
        assert!(matches!(
            NetworkPacket::from_wire("0001"),
            Err(NetError::Truncated(4))
        ));
    }

    #[test]
    fn empty_payload_is_valid() {
        let p = NetworkPacket::from_wire("000H21").unwrap();
        assert_eq!(p.dst_addr, "H2");
        assert_eq!(p.payload, "");
    }
}
