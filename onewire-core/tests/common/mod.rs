#![allow(dead_code)]

use core::convert::Infallible;

use onewire_core::{Address, OneWire, OneWireError, OneWireResult, Presence};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Step {
    Id,
    Complement,
    Direction,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    /// Waiting for the next reset.
    Idle,
    Command { value: u8, bits: u8 },
    ReadRom { bit: u8 },
    Search { bit: u8, step: Step },
    Match { bit: u8 },
    Selected,
}

/// A 1-Wire slave answering the ROM commands at bit level.
#[derive(Debug, Clone)]
pub struct Slave {
    pub rom: Address,
    /// Answers the conditional search.
    pub alarmed: bool,
    /// Answers the reset but never takes part in a search.
    pub mute_on_search: bool,
    /// Pulls every search read slot low.
    pub jams_search: bool,
    state: State,
}

impl Slave {
    pub fn new(rom: Address) -> Self {
        Self {
            rom,
            alarmed: false,
            mute_on_search: false,
            jams_search: false,
            state: State::Idle,
        }
    }

    pub fn alarmed(mut self) -> Self {
        self.alarmed = true;
        self
    }

    pub fn mute_on_search(mut self) -> Self {
        self.mute_on_search = true;
        self
    }

    pub fn jams_search(mut self) -> Self {
        self.jams_search = true;
        self
    }

    pub fn is_selected(&self) -> bool {
        self.state == State::Selected
    }

    fn own(&self, bit: u8) -> bool {
        self.rom.bit(bit + 1)
    }

    fn reset(&mut self) {
        self.state = State::Command { value: 0, bits: 0 };
    }

    /// Read slot: returns `Some(false)` when the slave pulls the line low.
    fn transmit(&mut self) -> Option<bool> {
        match self.state {
            State::ReadRom { bit } => {
                let v = self.own(bit);
                self.state = if bit == 63 {
                    State::Selected
                } else {
                    State::ReadRom { bit: bit + 1 }
                };
                Some(v)
            }
            State::Search {
                bit,
                step: Step::Id,
            } => {
                self.state = State::Search {
                    bit,
                    step: Step::Complement,
                };
                Some(self.own(bit) && !self.jams_search)
            }
            State::Search {
                bit,
                step: Step::Complement,
            } => {
                self.state = State::Search {
                    bit,
                    step: Step::Direction,
                };
                Some(!self.own(bit) && !self.jams_search)
            }
            _ => None,
        }
    }

    /// Write slot.
    fn receive(&mut self, v: bool) {
        match self.state {
            State::Command { value, bits } => {
                let value = value | ((v as u8) << bits);
                if bits < 7 {
                    self.state = State::Command {
                        value,
                        bits: bits + 1,
                    };
                } else {
                    self.dispatch(value);
                }
            }
            State::Search {
                bit,
                step: Step::Direction,
            } => {
                self.state = if v != self.own(bit) && !self.jams_search {
                    State::Idle
                } else if bit == 63 {
                    State::Selected
                } else {
                    State::Search {
                        bit: bit + 1,
                        step: Step::Id,
                    }
                };
            }
            State::Match { bit } => {
                self.state = if v != self.own(bit) {
                    State::Idle
                } else if bit == 63 {
                    State::Selected
                } else {
                    State::Match { bit: bit + 1 }
                };
            }
            _ => {}
        }
    }

    fn dispatch(&mut self, cmd: u8) {
        let search = State::Search {
            bit: 0,
            step: Step::Id,
        };
        self.state = match cmd {
            0x33 => State::ReadRom { bit: 0 },
            0x55 => State::Match { bit: 0 },
            0xcc => State::Selected,
            0xf0 if !self.mute_on_search => search,
            0xec if self.alarmed && !self.mute_on_search => search,
            _ => State::Idle,
        };
    }
}

/// Wired-AND bus of simulated slaves.
#[derive(Debug, Default)]
pub struct SimBus {
    pub slaves: Vec<Slave>,
    /// The line is held low permanently.
    pub stuck_low: bool,
    pub resets: usize,
    /// Reset number after which the next bit pair reads (1, 1).
    pub glitch_after_reset: Option<usize>,
    glitch_reads: u8,
}

impl SimBus {
    pub fn new(roms: &[Address]) -> Self {
        Self {
            slaves: roms.iter().copied().map(Slave::new).collect(),
            ..Default::default()
        }
    }

    pub fn with_slave(mut self, slave: Slave) -> Self {
        self.slaves.push(slave);
        self
    }

    pub fn selected(&self) -> Vec<Address> {
        self.slaves
            .iter()
            .filter(|s| s.is_selected())
            .map(|s| s.rom)
            .collect()
    }
}

impl OneWire for SimBus {
    type BusError = Infallible;

    fn reset(&mut self) -> OneWireResult<Presence, Self::BusError> {
        if self.stuck_low {
            return Err(OneWireError::BusTimeout);
        }
        self.resets += 1;
        if self.glitch_after_reset == Some(self.resets) {
            self.glitch_reads = 2;
        }
        self.slaves.iter_mut().for_each(Slave::reset);
        Ok(Presence::from(!self.slaves.is_empty()))
    }

    fn write_bit(&mut self, bit: bool) -> OneWireResult<(), Self::BusError> {
        self.slaves.iter_mut().for_each(|s| s.receive(bit));
        Ok(())
    }

    fn read_bit(&mut self) -> OneWireResult<bool, Self::BusError> {
        // every transmitting slave shifts out its bit, a single 0 pulls the line low
        let mut level = true;
        for s in self.slaves.iter_mut() {
            if s.transmit() == Some(false) {
                level = false;
            }
        }
        if self.glitch_reads > 0 {
            self.glitch_reads -= 1;
            return Ok(true);
        }
        Ok(level)
    }
}

/// Valid address with the given family and serial number.
pub fn rom(family: u8, serial: u64) -> Address {
    let mut s = [0; 6];
    s.copy_from_slice(&serial.to_le_bytes()[..6]);
    Address::new(family, s)
}
