#![allow(dead_code)]

use std::{cell::RefCell, convert::Infallible, rc::Rc};

use embedded_hal::{
    delay::DelayNs,
    digital::{ErrorType, InputPin, OutputPin},
};
use onewire_gpio::{Address, OneWireGpio, OneWireGpioBuilder};

const US: u64 = 1_000;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Phase {
    Idle,
    Command { value: u8, bits: u8 },
    ReadRom { bit: u8 },
    SearchId { bit: u8 },
    SearchComplement { bit: u8 },
    SearchDirection { bit: u8 },
    Match { bit: u8 },
    Selected,
}

/// A device that decodes master slots from pulse widths and answers them.
#[derive(Debug, Clone)]
pub struct Slave {
    pub rom: Address,
    pub mute_on_search: bool,
    phase: Phase,
}

impl Slave {
    pub fn new(rom: Address) -> Self {
        Self {
            rom,
            mute_on_search: false,
            phase: Phase::Idle,
        }
    }

    pub fn is_selected(&self) -> bool {
        self.phase == Phase::Selected
    }

    fn own(&self, bit: u8) -> bool {
        self.rom.bit(bit + 1)
    }

    fn on_reset(&mut self) {
        self.phase = Phase::Command { value: 0, bits: 0 };
    }

    /// The bit this slave drives in the current read slot, if it is talking.
    fn transmit(&mut self) -> Option<bool> {
        let (v, next) = match self.phase {
            Phase::ReadRom { bit } if bit == 63 => (self.own(bit), Phase::Selected),
            Phase::ReadRom { bit } => (self.own(bit), Phase::ReadRom { bit: bit + 1 }),
            Phase::SearchId { bit } => (self.own(bit), Phase::SearchComplement { bit }),
            Phase::SearchComplement { bit } => (!self.own(bit), Phase::SearchDirection { bit }),
            _ => return None,
        };
        self.phase = next;
        Some(v)
    }

    fn receive(&mut self, v: bool) {
        self.phase = match self.phase {
            Phase::Command { value, bits } => {
                let value = value | ((v as u8) << bits);
                if bits < 7 {
                    Phase::Command {
                        value,
                        bits: bits + 1,
                    }
                } else {
                    match value {
                        0x33 => Phase::ReadRom { bit: 0 },
                        0x55 => Phase::Match { bit: 0 },
                        0xcc => Phase::Selected,
                        0xf0 if !self.mute_on_search => Phase::SearchId { bit: 0 },
                        _ => Phase::Idle,
                    }
                }
            }
            Phase::SearchDirection { bit } | Phase::Match { bit } if v != self.own(bit) => {
                Phase::Idle
            }
            Phase::SearchDirection { bit } | Phase::Match { bit } if bit == 63 => {
                Phase::Selected
            }
            Phase::SearchDirection { bit } => Phase::SearchId { bit: bit + 1 },
            Phase::Match { bit } => Phase::Match { bit: bit + 1 },
            other => other,
        };
    }

    /// A slot shorter than 15 µs: write 1 or read. Returns whether the slave holds the line low.
    fn short_slot(&mut self) -> bool {
        match self.transmit() {
            Some(v) => !v,
            None => {
                self.receive(true);
                false
            }
        }
    }

    fn long_slot(&mut self) {
        if self.transmit().is_none() {
            self.receive(false);
        }
    }
}

/// Shared state of the open-drain line and the simulated clock.
#[derive(Debug, Default)]
pub struct Wire {
    pub now_ns: u64,
    pub slaves: Vec<Slave>,
    pub stuck_low: bool,
    pub resets: usize,
    master_low: bool,
    low_since: u64,
    holds: Vec<(u64, u64)>,
}

impl Wire {
    fn level(&self) -> bool {
        let now = self.now_ns;
        let held = self.holds.iter().any(|&(from, to)| from <= now && now < to);
        !(self.stuck_low || self.master_low || held)
    }

    fn fall(&mut self) {
        if !self.master_low {
            self.master_low = true;
            self.low_since = self.now_ns;
        }
    }

    fn rise(&mut self) {
        if !self.master_low {
            return;
        }
        self.master_low = false;
        let now = self.now_ns;
        let start = self.low_since;
        let width = now - start;
        self.holds.retain(|&(_, to)| to > now);
        if width >= 480 * US {
            self.resets += 1;
            self.slaves.iter_mut().for_each(Slave::on_reset);
            if !self.slaves.is_empty() {
                self.holds.push((now + 15 * US, now + 135 * US));
            }
        } else if width < 15 * US {
            let mut pulled = false;
            for s in self.slaves.iter_mut() {
                pulled |= s.short_slot();
            }
            if pulled {
                self.holds.push((start, start + 30 * US));
            }
        } else {
            self.slaves.iter_mut().for_each(Slave::long_slot);
        }
    }

    pub fn selected(&self) -> Vec<Address> {
        self.slaves
            .iter()
            .filter(|s| s.is_selected())
            .map(|s| s.rom)
            .collect()
    }
}

/// Open-drain pin on the simulated wire.
pub struct SimLine(pub Rc<RefCell<Wire>>);

impl ErrorType for SimLine {
    type Error = Infallible;
}

impl OutputPin for SimLine {
    fn set_low(&mut self) -> Result<(), Self::Error> {
        self.0.borrow_mut().fall();
        Ok(())
    }

    fn set_high(&mut self) -> Result<(), Self::Error> {
        self.0.borrow_mut().rise();
        Ok(())
    }
}

impl InputPin for SimLine {
    fn is_high(&mut self) -> Result<bool, Self::Error> {
        Ok(self.0.borrow().level())
    }

    fn is_low(&mut self) -> Result<bool, Self::Error> {
        Ok(!self.0.borrow().level())
    }
}

/// Delay that only advances the simulated clock.
pub struct SimClock(pub Rc<RefCell<Wire>>);

impl DelayNs for SimClock {
    fn delay_ns(&mut self, ns: u32) {
        self.0.borrow_mut().now_ns += ns as u64;
    }
}

pub type SimMaster = OneWireGpio<SimLine, SimClock>;

/// A master on a wire with the given slaves.
pub fn master(slaves: Vec<Slave>) -> (SimMaster, Rc<RefCell<Wire>>) {
    let wire = Rc::new(RefCell::new(Wire {
        slaves,
        ..Default::default()
    }));
    let bus = OneWireGpioBuilder::default()
        .build(SimLine(wire.clone()), SimClock(wire.clone()))
        .unwrap();
    (bus, wire)
}

pub fn slaves(roms: &[Address]) -> Vec<Slave> {
    roms.iter().copied().map(Slave::new).collect()
}

/// Valid address with the given family and serial number.
pub fn rom(family: u8, serial: u64) -> Address {
    let mut s = [0; 6];
    s.copy_from_slice(&serial.to_le_bytes()[..6]);
    Address::new(family, s)
}
