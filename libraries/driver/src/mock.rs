//! Test doubles for the bus and delay seams.

use std::collections::VecDeque;
use std::thread::{self, ThreadId};

use embedded_hal::delay::DelayNs;
use hal::{Errno, I2cTransport, TransferStage};

use crate::baro::compensation::Calibration;

const ENXIO: i32 = 6;

/// One call made on the fake adapter
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Op {
    Select(u16),
    Write(Vec<u8>),
    Read(usize),
}

/// Failure to inject into the next call at a given stage
#[derive(Debug, Clone, Copy)]
pub enum FakeFault {
    Errno(i32),
    Short(usize),
}

/// Register-file model of a single device behind an i2c-dev style adapter.
///
/// Writing a one-byte buffer sets the register pointer; longer writes store
/// bytes starting at the pointer. Writing the BMP085 control register loads
/// the result registers with the configured raw temperature or pressure.
pub struct FakeTransport {
    device_address: u16,
    selected: Option<u16>,
    registers: [u8; 256],
    pointer: u8,
    raw_temperature: u16,
    raw_pressures: VecDeque<u32>,
    last_pressure: u32,
    fault: Option<(TransferStage, FakeFault)>,
    pending_read: Option<ThreadId>,
    splits: usize,
    ops: Vec<Op>,
}

impl FakeTransport {
    pub fn new(device_address: u8) -> Self {
        Self {
            device_address: u16::from(device_address),
            selected: None,
            registers: [0; 256],
            pointer: 0,
            raw_temperature: 0,
            raw_pressures: VecDeque::new(),
            last_pressure: 0,
            fault: None,
            pending_read: None,
            splits: 0,
            ops: Vec::new(),
        }
    }

    /// A BMP085 at 0x77 with the given calibration and raw readings
    pub fn bmp085(calibration: &Calibration, raw_temperature: u16, raw_pressure: u32) -> Self {
        let mut fake = Self::new(0x77);
        fake.set_register(0xD0, 0x55);
        let words = [
            calibration.ac1 as u16,
            calibration.ac2 as u16,
            calibration.ac3 as u16,
            calibration.ac4,
            calibration.ac5,
            calibration.ac6,
            calibration.b1 as u16,
            calibration.b2 as u16,
            calibration.mb as u16,
            calibration.mc as u16,
            calibration.md as u16,
        ];
        for (i, word) in words.iter().enumerate() {
            let [msb, lsb] = word.to_be_bytes();
            fake.set_register(0xAA + 2 * i as u8, msb);
            fake.set_register(0xAB + 2 * i as u8, lsb);
        }
        fake.raw_temperature = raw_temperature;
        fake.last_pressure = raw_pressure;
        fake
    }

    pub fn set_register(&mut self, register: u8, value: u8) {
        self.registers[register as usize] = value;
    }

    pub fn register(&self, register: u8) -> u8 {
        self.registers[register as usize]
    }

    pub fn set_raw_temperature(&mut self, raw: u16) {
        self.raw_temperature = raw;
    }

    /// Queue raw pressure readings; the last one repeats once the queue drains
    pub fn queue_raw_pressures(&mut self, raws: impl IntoIterator<Item = u32>) {
        self.raw_pressures.extend(raws);
    }

    pub fn fail_next(&mut self, stage: TransferStage, fault: FakeFault) {
        self.fault = Some((stage, fault));
    }

    pub fn ops(&self) -> &[Op] {
        &self.ops
    }

    pub fn clear_ops(&mut self) {
        self.ops.clear();
    }

    pub fn split_transactions(&self) -> usize {
        self.splits
    }

    fn take_fault(&mut self, stage: TransferStage) -> Option<FakeFault> {
        match self.fault {
            Some((at, fault)) if at == stage => {
                self.fault = None;
                Some(fault)
            }
            _ => None,
        }
    }

    fn convert(&mut self, command: u8) {
        if command == 0x2E {
            let [msb, lsb] = self.raw_temperature.to_be_bytes();
            self.registers[0xF6] = msb;
            self.registers[0xF7] = lsb;
        } else if command & 0x3F == 0x34 {
            let oss = u32::from(command >> 6);
            if let Some(raw) = self.raw_pressures.pop_front() {
                self.last_pressure = raw;
            }
            let [_, msb, lsb, xlsb] = (self.last_pressure << (8 - oss)).to_be_bytes();
            self.registers[0xF6] = msb;
            self.registers[0xF7] = lsb;
            self.registers[0xF8] = xlsb;
        }
    }
}

impl I2cTransport for FakeTransport {
    fn set_slave_address(&mut self, address: u16) -> Result<(), Errno> {
        self.ops.push(Op::Select(address));
        if let Some(FakeFault::Errno(code)) = self.take_fault(TransferStage::Select) {
            return Err(Errno(code));
        }
        self.selected = Some(address);
        Ok(())
    }

    fn write(&mut self, data: &[u8]) -> Result<usize, Errno> {
        self.ops.push(Op::Write(data.to_vec()));
        let stage = if data.len() == 1 {
            TransferStage::RegisterWrite
        } else {
            TransferStage::DataWrite
        };
        match self.take_fault(stage) {
            Some(FakeFault::Errno(code)) => return Err(Errno(code)),
            Some(FakeFault::Short(n)) => return Ok(n),
            None => {}
        }
        if self.selected != Some(self.device_address) {
            return Err(Errno(ENXIO));
        }
        let Some((&register, payload)) = data.split_first() else {
            return Ok(0);
        };
        self.pointer = register;
        if payload.is_empty() {
            self.pending_read = Some(thread::current().id());
        }
        for (offset, &byte) in payload.iter().enumerate() {
            let index = register.wrapping_add(offset as u8);
            self.registers[index as usize] = byte;
            if index == 0xF4 {
                self.convert(byte);
            }
        }
        Ok(data.len())
    }

    fn read(&mut self, buffer: &mut [u8]) -> Result<usize, Errno> {
        self.ops.push(Op::Read(buffer.len()));
        if let Some(owner) = self.pending_read.take() {
            if owner != thread::current().id() {
                self.splits += 1;
                panic!("register read issued by a different thread than its address write");
            }
        }
        let count = match self.take_fault(TransferStage::DataRead) {
            Some(FakeFault::Errno(code)) => return Err(Errno(code)),
            Some(FakeFault::Short(n)) => n.min(buffer.len()),
            None => buffer.len(),
        };
        if self.selected != Some(self.device_address) {
            return Err(Errno(ENXIO));
        }
        for (offset, byte) in buffer.iter_mut().take(count).enumerate() {
            *byte = self.registers[self.pointer.wrapping_add(offset as u8) as usize];
        }
        Ok(count)
    }
}

/// Delay that returns immediately and remembers what it was asked for
#[derive(Debug, Default)]
pub struct RecordingDelay {
    pub millis: Vec<u32>,
}

impl DelayNs for RecordingDelay {
    fn delay_ns(&mut self, _ns: u32) {}

    fn delay_ms(&mut self, ms: u32) {
        self.millis.push(ms);
    }
}
