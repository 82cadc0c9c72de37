//! Register transactions over a shared I2C adapter.
//!
//! One adapter handle (a `/dev/i2c-N` file on Linux) usually fronts several
//! devices, and several threads may drive those devices at once. The adapter
//! is therefore owned by a [`SharedBus`], a cloneable handle around a
//! re-entrant lock. Each device gets an [`I2cDevice`] bound to its address;
//! every call on it is one complete transaction:
//!
//! 1. take the bus lock
//! 2. select the device address
//! 3. write the register address (and payload, for writes)
//! 4. read the requested bytes
//! 5. release the lock, on success and on failure alike
//!
//! The lock covers a single transaction only. A measurement that issues a
//! command and later reads the result is two transactions, and other bus users
//! may run in between. A caller that needs the whole measurement to be atomic
//! holds [`SharedBus::lock`] around it; the lock is re-entrant, so the
//! device's own transactions still go through on the holding thread while
//! every other thread waits. [`SharedBus::lock_device`] does the same for an
//! ad-hoc register sequence on a [`LockedDevice`].
//!
//! The adapter itself sits in a `RefCell` under the lock and is borrowed only
//! for the length of one transfer. A transaction started while that borrow is
//! live on the same thread fails with [`BusError::Busy`].
//!
//! Failures are logged with the OS error code and returned as [`BusError`];
//! nothing is retried here.

use std::cell::{RefCell, RefMut};
use std::sync::Arc;

use hal::{BusError, Errno, I2cTransport, TransferStage};
use log::error;
use parking_lot::{ReentrantMutex, ReentrantMutexGuard};

/// Register-level access to one device
pub trait RegisterAccess {
    /// Read one byte from `register`
    fn read_byte(&mut self, register: u8) -> Result<u8, BusError>;

    /// Read two bytes starting at `register`, most-significant byte first
    fn read_word(&mut self, register: u8) -> Result<u16, BusError>;

    /// Write `value` to `register`
    fn write_byte(&mut self, register: u8, value: u8) -> Result<(), BusError>;
}

/// Held bus lock; `borrow_mut` on it reaches the raw adapter
pub type BusGuard<'a, T> = ReentrantMutexGuard<'a, RefCell<T>>;

/// Adapter handle shared by every device on one physical bus
pub struct SharedBus<T: I2cTransport> {
    transport: Arc<ReentrantMutex<RefCell<T>>>,
}

impl<T: I2cTransport> Clone for SharedBus<T> {
    fn clone(&self) -> Self {
        Self {
            transport: Arc::clone(&self.transport),
        }
    }
}

impl<T: I2cTransport> SharedBus<T> {
    /// Wrap an opened, configured adapter
    pub fn new(transport: T) -> Self {
        Self {
            transport: Arc::new(ReentrantMutex::new(RefCell::new(transport))),
        }
    }

    /// Handle for the device at `address`; each call on it locks the bus once
    pub fn device(&self, address: u8) -> I2cDevice<T> {
        I2cDevice {
            bus: self.clone(),
            address,
        }
    }

    /// Take the bus lock and keep it until the returned device is dropped
    pub fn lock_device(&self, address: u8) -> LockedDevice<'_, T> {
        LockedDevice {
            transport: self.lock(),
            address,
        }
    }

    /// Take the bus lock.
    ///
    /// Other threads block until the guard is dropped. The holding thread may
    /// keep using its devices, including a sensor driver mid-measurement.
    pub fn lock(&self) -> BusGuard<'_, T> {
        self.transport.lock()
    }
}

/// A device on a [`SharedBus`]; locks the bus per transaction
pub struct I2cDevice<T: I2cTransport> {
    bus: SharedBus<T>,
    address: u8,
}

impl<T: I2cTransport> I2cDevice<T> {
    /// 7-bit address of the device
    pub fn address(&self) -> u8 {
        self.address
    }

    /// The bus this device lives on
    pub fn bus(&self) -> &SharedBus<T> {
        &self.bus
    }
}

impl<T: I2cTransport> RegisterAccess for I2cDevice<T> {
    fn read_byte(&mut self, register: u8) -> Result<u8, BusError> {
        read_byte(&*self.bus.lock(), self.address, register)
    }

    fn read_word(&mut self, register: u8) -> Result<u16, BusError> {
        read_word(&*self.bus.lock(), self.address, register)
    }

    fn write_byte(&mut self, register: u8, value: u8) -> Result<(), BusError> {
        write_byte(&*self.bus.lock(), self.address, register, value)
    }
}

/// A device reached through a bus lock that is already held
pub struct LockedDevice<'a, T: I2cTransport> {
    transport: BusGuard<'a, T>,
    address: u8,
}

impl<T: I2cTransport> LockedDevice<'_, T> {
    /// 7-bit address of the device
    pub fn address(&self) -> u8 {
        self.address
    }
}

impl<T: I2cTransport> RegisterAccess for LockedDevice<'_, T> {
    fn read_byte(&mut self, register: u8) -> Result<u8, BusError> {
        read_byte(&*self.transport, self.address, register)
    }

    fn read_word(&mut self, register: u8) -> Result<u16, BusError> {
        read_word(&*self.transport, self.address, register)
    }

    fn write_byte(&mut self, register: u8, value: u8) -> Result<(), BusError> {
        write_byte(&*self.transport, self.address, register, value)
    }
}

fn read_byte<T: I2cTransport>(
    transport: &RefCell<T>,
    address: u8,
    register: u8,
) -> Result<u8, BusError> {
    let mut buffer = [0u8; 1];
    read_register(transport, address, register, &mut buffer)
        .inspect_err(|err| log_failure("read_byte", address, register, err))?;
    Ok(buffer[0])
}

fn read_word<T: I2cTransport>(
    transport: &RefCell<T>,
    address: u8,
    register: u8,
) -> Result<u16, BusError> {
    let mut buffer = [0u8; 2];
    read_register(transport, address, register, &mut buffer)
        .inspect_err(|err| log_failure("read_word", address, register, err))?;
    Ok(u16::from_be_bytes(buffer))
}

fn write_byte<T: I2cTransport>(
    transport: &RefCell<T>,
    address: u8,
    register: u8,
    value: u8,
) -> Result<(), BusError> {
    borrow(transport)
        .and_then(|mut transport| {
            select(&mut *transport, address)?;
            let written = transport.write(&[register, value]);
            expect_count(TransferStage::DataWrite, 2, written)
        })
        .inspect_err(|err| log_failure("write_byte", address, register, err))
}

fn read_register<T: I2cTransport>(
    transport: &RefCell<T>,
    address: u8,
    register: u8,
    buffer: &mut [u8],
) -> Result<(), BusError> {
    let mut transport = borrow(transport)?;
    select(&mut *transport, address)?;
    let written = transport.write(&[register]);
    expect_count(TransferStage::RegisterWrite, 1, written)?;
    let expected = buffer.len();
    let received = transport.read(buffer);
    expect_count(TransferStage::DataRead, expected, received)
}

fn borrow<T>(transport: &RefCell<T>) -> Result<RefMut<'_, T>, BusError> {
    transport.try_borrow_mut().map_err(|_| BusError::Busy)
}

fn select<T: I2cTransport>(transport: &mut T, address: u8) -> Result<(), BusError> {
    transport
        .set_slave_address(u16::from(address))
        .map_err(|errno| BusError::Os {
            stage: TransferStage::Select,
            errno,
        })
}

fn expect_count(
    stage: TransferStage,
    expected: usize,
    result: Result<usize, Errno>,
) -> Result<(), BusError> {
    match result {
        Ok(actual) if actual == expected => Ok(()),
        Ok(actual) => Err(BusError::ShortTransfer {
            stage,
            expected,
            actual,
        }),
        Err(errno) => Err(BusError::Os { stage, errno }),
    }
}

fn log_failure(op: &str, address: u8, register: u8, err: &BusError) {
    match err.errno() {
        Some(errno) => error!(
            "{op}: device 0x{address:02x} register 0x{register:02x}: {} failed: errno {errno}",
            err.stage()
        ),
        None => error!("{op}: device 0x{address:02x} register 0x{register:02x}: {err}"),
    }
}
