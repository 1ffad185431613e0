//! HDLC-style framing of trace records.

use alloc::vec::Vec;

const FLAG: u8 = 0x7E;
const ESC: u8 = 0x7D;
const ESC_XOR: u8 = 0x20;

/// Encodes records as `seq | id | [timestamp] | payload | checksum | FLAG`
/// with byte stuffing, incrementing the sequence number per frame.
#[derive(Debug, Default)]
pub struct HdlcFramer {
    seq: u8,
}

impl HdlcFramer {
    pub const fn new() -> Self {
        Self { seq: 0 }
    }

    pub fn seq(&self) -> u8 {
        self.seq
    }

    pub fn encode(&mut self, record: u8, timestamp: Option<u32>, payload: &[u8]) -> Vec<u8> {
        self.seq = self.seq.wrapping_add(1);

        let mut frame = Vec::with_capacity(payload.len() + 8);
        let mut checksum: u8 = 0;

        let mut push = |frame: &mut Vec<u8>, byte: u8| {
            checksum = checksum.wrapping_add(byte);
            stuff(frame, byte);
        };

        push(&mut frame, self.seq);
        push(&mut frame, record);
        if let Some(ts) = timestamp {
            for byte in ts.to_le_bytes() {
                push(&mut frame, byte);
            }
        }
        for &byte in payload {
            push(&mut frame, byte);
        }

        stuff(&mut frame, !checksum);
        frame.push(FLAG);
        frame
    }
}

fn stuff(frame: &mut Vec<u8>, byte: u8) {
    if byte == FLAG || byte == ESC {
        frame.push(ESC);
        frame.push(byte ^ ESC_XOR);
    } else {
        frame.push(byte);
    }
}
