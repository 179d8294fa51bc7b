//! Modbus request translation.
//!
//! [`Operation::from_request`] validates function code and quantity before
//! anything touches memory; [`Operation::execute`] runs the validated
//! operation against a [`RegisterStore`] and maps memory errors onto
//! exception codes.

use plc_common::image::{Bank, MemoryError};
use tokio_modbus::{ExceptionCode, Request, Response};

use crate::store::RegisterStore;

/// 0x01 / 0x02 quantity limit.
pub const MAX_READ_BITS: u16 = 2000;
/// 0x03 / 0x04 / 0x17-read quantity limit.
pub const MAX_READ_WORDS: u16 = 125;
/// 0x0F quantity limit.
pub const MAX_WRITE_BITS: u16 = 1968;
/// 0x10 quantity limit.
pub const MAX_WRITE_WORDS: u16 = 123;
/// 0x17-write quantity limit.
pub const MAX_READ_WRITE_WORDS: u16 = 121;

/// Validated Modbus operation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Operation {
    /// 0x01, 0x02.
    ReadBits { bank: Bank, address: u16, count: u16 },
    /// 0x03, 0x04.
    ReadWords { bank: Bank, address: u16, count: u16 },
    /// 0x05.
    WriteCoil { address: u16, value: bool },
    /// 0x0F.
    WriteCoils { address: u16, values: Vec<bool> },
    /// 0x06.
    WriteRegister { address: u16, value: u16 },
    /// 0x10.
    WriteRegisters { address: u16, values: Vec<u16> },
    /// 0x16.
    MaskWrite { address: u16, and_mask: u16, or_mask: u16 },
    /// 0x17. The write is applied before the read.
    ReadWriteRegisters {
        read_address: u16,
        read_count: u16,
        write_address: u16,
        values: Vec<u16>,
    },
}

fn check_quantity(count: usize, max: u16) -> Result<u16, ExceptionCode> {
    match u16::try_from(count) {
        Ok(n) if (1..=max).contains(&n) => Ok(n),
        _ => Err(ExceptionCode::IllegalDataValue),
    }
}

impl Operation {
    /// Translate a decoded request.
    ///
    /// Unsupported function codes yield `IllegalFunction`; quantities outside
    /// the per-function limits yield `IllegalDataValue`.
    pub fn from_request(request: &Request<'_>) -> Result<Self, ExceptionCode> {
        let op = match request {
            Request::ReadCoils(address, count) => Self::ReadBits {
                bank: Bank::BinaryOutputs,
                address: *address,
                count: check_quantity(usize::from(*count), MAX_READ_BITS)?,
            },
            Request::ReadDiscreteInputs(address, count) => Self::ReadBits {
                bank: Bank::BinaryInputs,
                address: *address,
                count: check_quantity(usize::from(*count), MAX_READ_BITS)?,
            },
            Request::ReadHoldingRegisters(address, count) => Self::ReadWords {
                bank: Bank::IntegerOutputs,
                address: *address,
                count: check_quantity(usize::from(*count), MAX_READ_WORDS)?,
            },
            Request::ReadInputRegisters(address, count) => Self::ReadWords {
                bank: Bank::IntegerInputs,
                address: *address,
                count: check_quantity(usize::from(*count), MAX_READ_WORDS)?,
            },
            Request::WriteSingleCoil(address, value) => Self::WriteCoil {
                address: *address,
                value: *value,
            },
            Request::WriteMultipleCoils(address, values) => {
                check_quantity(values.len(), MAX_WRITE_BITS)?;
                Self::WriteCoils {
                    address: *address,
                    values: values.to_vec(),
                }
            }
            Request::WriteSingleRegister(address, value) => Self::WriteRegister {
                address: *address,
                value: *value,
            },
            Request::WriteMultipleRegisters(address, values) => {
                check_quantity(values.len(), MAX_WRITE_WORDS)?;
                Self::WriteRegisters {
                    address: *address,
                    values: values.to_vec(),
                }
            }
            Request::MaskWriteRegister(address, and_mask, or_mask) => Self::MaskWrite {
                address: *address,
                and_mask: *and_mask,
                or_mask: *or_mask,
            },
            Request::ReadWriteMultipleRegisters(
                read_address,
                read_count,
                write_address,
                values,
            ) => {
                check_quantity(values.len(), MAX_READ_WRITE_WORDS)?;
                Self::ReadWriteRegisters {
                    read_address: *read_address,
                    read_count: check_quantity(usize::from(*read_count), MAX_READ_WORDS)?,
                    write_address: *write_address,
                    values: values.to_vec(),
                }
            }
            _ => return Err(ExceptionCode::IllegalFunction),
        };
        Ok(op)
    }

    /// True for operations that modify memory.
    pub fn is_write(&self) -> bool {
        !matches!(self, Self::ReadBits { .. } | Self::ReadWords { .. })
    }

    /// Run against `store` and build the response PDU.
    pub fn execute(&self, store: &dyn RegisterStore) -> Result<Response, ExceptionCode> {
        let response = match self {
            Self::ReadBits {
                bank,
                address,
                count,
            } => {
                let bits = store.read_bits(*bank, usize::from(*address), usize::from(*count));
                match bank {
                    Bank::BinaryInputs => Response::ReadDiscreteInputs(bits.map_err(exception)?),
                    _ => Response::ReadCoils(bits.map_err(exception)?),
                }
            }
            Self::ReadWords {
                bank,
                address,
                count,
            } => {
                let words = store.read_words(*bank, usize::from(*address), usize::from(*count));
                match bank {
                    Bank::IntegerInputs => Response::ReadInputRegisters(words.map_err(exception)?),
                    _ => Response::ReadHoldingRegisters(words.map_err(exception)?),
                }
            }
            Self::WriteCoil { address, value } => {
                store
                    .write_bits(Bank::BinaryOutputs, usize::from(*address), &[*value])
                    .map_err(exception)?;
                Response::WriteSingleCoil(*address, *value)
            }
            Self::WriteCoils { address, values } => {
                store
                    .write_bits(Bank::BinaryOutputs, usize::from(*address), values)
                    .map_err(exception)?;
                Response::WriteMultipleCoils(*address, quantity(values.len()))
            }
            Self::WriteRegister { address, value } => {
                store
                    .write_words(Bank::IntegerOutputs, usize::from(*address), &[*value])
                    .map_err(exception)?;
                Response::WriteSingleRegister(*address, *value)
            }
            Self::WriteRegisters { address, values } => {
                store
                    .write_words(Bank::IntegerOutputs, usize::from(*address), values)
                    .map_err(exception)?;
                Response::WriteMultipleRegisters(*address, quantity(values.len()))
            }
            Self::MaskWrite {
                address,
                and_mask,
                or_mask,
            } => {
                store
                    .mask_write(usize::from(*address), *and_mask, *or_mask)
                    .map_err(exception)?;
                Response::MaskWriteRegister(*address, *and_mask, *or_mask)
            }
            Self::ReadWriteRegisters {
                read_address,
                read_count,
                write_address,
                values,
            } => {
                let words = store
                    .read_write_words(
                        usize::from(*read_address),
                        usize::from(*read_count),
                        usize::from(*write_address),
                        values,
                    )
                    .map_err(exception)?;
                Response::ReadWriteMultipleRegisters(words)
            }
        };
        Ok(response)
    }
}

/// Map a memory error to the Modbus exception reported to the client.
pub fn exception(err: MemoryError) -> ExceptionCode {
    match err {
        MemoryError::OutOfRange { .. } => ExceptionCode::IllegalDataAddress,
        MemoryError::KindMismatch { .. } | MemoryError::ShapeMismatch { .. } => {
            ExceptionCode::ServerDeviceFailure
        }
    }
}

#[inline]
fn quantity(len: usize) -> u16 {
    // Lengths were bounded by `check_quantity`.
    u16::try_from(len).unwrap_or(u16::MAX)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::borrow::Cow;
    use std::sync::Arc;

    use plc_common::image::ProcessImage;

    use crate::store::DirectStore;

    fn store() -> (Arc<ProcessImage>, DirectStore) {
        let image = Arc::new(ProcessImage::default());
        (Arc::clone(&image), DirectStore::new(image))
    }

    #[test]
    fn zero_quantity_is_illegal_data_value() {
        assert_eq!(
            Operation::from_request(&Request::ReadHoldingRegisters(0, 0)),
            Err(ExceptionCode::IllegalDataValue)
        );
        assert_eq!(
            Operation::from_request(&Request::ReadCoils(0, 0)),
            Err(ExceptionCode::IllegalDataValue)
        );
    }

    #[test]
    fn quantity_limits() {
        assert!(Operation::from_request(&Request::ReadCoils(0, 2000)).is_ok());
        assert_eq!(
            Operation::from_request(&Request::ReadCoils(0, 2001)),
            Err(ExceptionCode::IllegalDataValue)
        );
        assert!(Operation::from_request(&Request::ReadInputRegisters(0, 125)).is_ok());
        assert_eq!(
            Operation::from_request(&Request::ReadInputRegisters(0, 126)),
            Err(ExceptionCode::IllegalDataValue)
        );
        let words = vec![0u16; 124];
        assert_eq!(
            Operation::from_request(&Request::WriteMultipleRegisters(0, Cow::Owned(words))),
            Err(ExceptionCode::IllegalDataValue)
        );
    }

    #[test]
    fn unsupported_function_is_illegal_function() {
        assert_eq!(
            Operation::from_request(&Request::ReportServerId),
            Err(ExceptionCode::IllegalFunction)
        );
    }

    #[test]
    fn read_past_bank_is_illegal_data_address() {
        let (_image, store) = store();
        let op = Operation::from_request(&Request::ReadHoldingRegisters(60, 10)).unwrap();
        assert_eq!(op.execute(&store), Err(ExceptionCode::IllegalDataAddress));
    }

    #[test]
    fn write_single_register_echoes() {
        let (image, store) = store();
        let op = Operation::from_request(&Request::WriteSingleRegister(4, 850)).unwrap();
        assert!(op.is_write());
        assert_eq!(op.execute(&store), Ok(Response::WriteSingleRegister(4, 850)));
        assert_eq!(image.read_word(Bank::IntegerOutputs, 4).unwrap(), 850);
    }

    #[test]
    fn discrete_inputs_map_to_binary_inputs() {
        let (image, store) = store();
        image.write_bit(Bank::BinaryInputs, 1, true).unwrap();
        let op = Operation::from_request(&Request::ReadDiscreteInputs(0, 3)).unwrap();
        assert_eq!(
            op.execute(&store),
            Ok(Response::ReadDiscreteInputs(vec![false, true, false]))
        );
    }

    #[test]
    fn read_write_applies_write_first() {
        let (_image, store) = store();
        let op = Operation::from_request(&Request::ReadWriteMultipleRegisters(
            10,
            2,
            10,
            Cow::Owned(vec![7, 8]),
        ))
        .unwrap();
        assert_eq!(op.execute(&store), Ok(Response::ReadWriteMultipleRegisters(vec![7, 8])));
    }

    #[test]
    fn read_write_with_bad_read_range_writes_nothing() {
        let (image, store) = store();
        let op = Operation::from_request(&Request::ReadWriteMultipleRegisters(
            63,
            2,
            10,
            Cow::Owned(vec![7]),
        ))
        .unwrap();
        assert_eq!(op.execute(&store), Err(ExceptionCode::IllegalDataAddress));
        assert_eq!(image.read_word(Bank::IntegerOutputs, 10).unwrap(), 0);
    }

    #[test]
    fn read_write_read_back_is_never_torn_by_other_writers() {
        use std::sync::atomic::{AtomicBool, Ordering};
        use std::thread;

        let (image, store) = store();
        let done = Arc::new(AtomicBool::new(false));
        let writer = {
            let image = Arc::clone(&image);
            let done = Arc::clone(&done);
            thread::spawn(move || {
                let mut k: u16 = 0;
                while !done.load(Ordering::Relaxed) {
                    k = k.wrapping_add(1) % 1000;
                    image.write_words(Bank::IntegerOutputs, 10, &[k, k]).unwrap();
                }
            })
        };

        let op = Operation::from_request(&Request::ReadWriteMultipleRegisters(
            10,
            2,
            10,
            Cow::Owned(vec![7000, 7000]),
        ))
        .unwrap();
        for _ in 0..20_000 {
            assert_eq!(
                op.execute(&store),
                Ok(Response::ReadWriteMultipleRegisters(vec![7000, 7000]))
            );
        }
        done.store(true, Ordering::Relaxed);
        writer.join().unwrap();
    }
}
