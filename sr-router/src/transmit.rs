use crossbeam::crossbeam_channel::{self, Receiver, Sender};
use sr_packets::EthernetFrame;
use tracing::warn;

/// Outbound side of the link layer. Transmission is fire-and-forget: the router never
/// waits on, or learns about, the fate of a frame once it is handed over.
pub trait Transmit: Send + Sync {
    fn transmit_frame(&self, frame: EthernetFrame, interface: &str);
}

/// A frame handed to the link layer, tagged with the interface it leaves from.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Transmission {
    pub interface: String,
    pub frame: EthernetFrame,
}

/// Transmit implementation that pushes every outbound frame onto a channel. Whatever
/// owns the receiver (a socket writer, a test) drains it.
#[derive(Clone)]
pub struct ChannelTransmitter {
    sender: Sender<Transmission>,
}

impl ChannelTransmitter {
    pub fn new() -> (Self, Receiver<Transmission>) {
        let (sender, receiver) = crossbeam_channel::unbounded();
        (ChannelTransmitter { sender }, receiver)
    }
}

impl Transmit for ChannelTransmitter {
    fn transmit_frame(&self, frame: EthernetFrame, interface: &str) {
        let transmission = Transmission {
            interface: interface.to_string(),
            frame,
        };
        if self.sender.send(transmission).is_err() {
            warn!(interface, "transmit channel closed, frame lost");
        }
    }
}
