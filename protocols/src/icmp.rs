use anyhow::Context;
use pnet::packet::Packet;
use pnet::packet::icmp::echo_reply::EchoReplyPacket;
use pnet::packet::icmp::echo_request::MutableEchoRequestPacket;
use pnet::packet::icmp::{self, IcmpCode, IcmpPacket, IcmpTypes};

pub const ICMP_ECHO_HDR_LEN: usize = 8;

/// Identifies one outstanding echo request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EchoId {
    pub identifier: u16,
    pub sequence: u16,
}

pub fn create_echo_request(id: EchoId, payload: &[u8]) -> anyhow::Result<Vec<u8>> {
    let mut buffer: Vec<u8> = vec![0u8; ICMP_ECHO_HDR_LEN + payload.len()];
    {
        let mut echo: MutableEchoRequestPacket =
            MutableEchoRequestPacket::new(&mut buffer).context("creating echo request")?;
        echo.set_icmp_type(IcmpTypes::EchoRequest);
        echo.set_icmp_code(IcmpCode(0));
        echo.set_identifier(id.identifier);
        echo.set_sequence_number(id.sequence);
        echo.set_payload(payload);
        echo.set_checksum(0);
    }

    let csum: u16 = {
        let view = IcmpPacket::new(&buffer).context("reading back echo request")?;
        icmp::checksum(&view)
    };
    let mut echo = MutableEchoRequestPacket::new(&mut buffer).context("creating echo request")?;
    echo.set_checksum(csum);

    Ok(buffer)
}

/// Returns the id of an echo reply, or `None` for any other ICMP message.
pub fn echo_reply_id(packet: &IcmpPacket) -> Option<EchoId> {
    if packet.get_icmp_type() != IcmpTypes::EchoReply {
        return None;
    }
    let reply = EchoReplyPacket::new(packet.packet())?;
    Some(EchoId {
        identifier: reply.get_identifier(),
        sequence: reply.get_sequence_number(),
    })
}
