//! Low-level VM script emission.

use super::parameter::ContractParameter;
use crate::crypto::AccountId;
use crate::error::ConsoleError;
use sha2::{Digest, Sha256};

/// Largest single item the VM accepts on its stack (1 MiB).
pub const MAX_ITEM_SIZE: usize = 1024 * 1024;

/// Largest array the VM will `PACK`.
pub const MAX_ARRAY_LENGTH: usize = 2048;

pub const CONTRACT_CALL_SYSCALL: &str = "System.Contract.Call";

/// Subset of VM opcodes the console emits.
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OpCode {
    PushInt8 = 0x00,
    PushInt16 = 0x01,
    PushInt32 = 0x02,
    PushInt64 = 0x03,
    PushInt128 = 0x04,
    PushT = 0x08,
    PushF = 0x09,
    PushNull = 0x0B,
    PushData1 = 0x0C,
    PushData2 = 0x0D,
    PushData4 = 0x0E,
    PushM1 = 0x0F,
    Push0 = 0x10,
    Syscall = 0x41,
    Pack = 0xC0,
}

/// Permissions granted to a called contract.
pub struct CallFlags;

impl CallFlags {
    pub const NONE: u8 = 0x00;
    pub const READ_STATES: u8 = 0x01;
    pub const WRITE_STATES: u8 = 0x02;
    pub const ALLOW_CALL: u8 = 0x04;
    pub const ALLOW_NOTIFY: u8 = 0x08;
    pub const ALL: u8 = 0x0F;
}

/// Interop service id: the first four bytes of SHA-256 over the service name.
pub fn interop_hash(name: &str) -> [u8; 4] {
    let digest = Sha256::digest(name.as_bytes());
    [digest[0], digest[1], digest[2], digest[3]]
}

#[derive(Debug, Default, Clone)]
pub struct ScriptBuilder {
    buf: Vec<u8>,
}

impl ScriptBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.buf.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }

    pub fn to_bytes(&self) -> Vec<u8> {
        self.buf.clone()
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.buf
    }

    pub fn emit(&mut self, op: OpCode) -> &mut Self {
        self.buf.push(op as u8);
        self
    }

    pub fn emit_syscall(&mut self, name: &str) -> &mut Self {
        self.buf.push(OpCode::Syscall as u8);
        self.buf.extend_from_slice(&interop_hash(name));
        self
    }

    pub fn emit_push_bool(&mut self, value: bool) -> &mut Self {
        self.emit(if value { OpCode::PushT } else { OpCode::PushF })
    }

    /// Pushes an integer using the shortest two's-complement encoding.
    pub fn emit_push_int(&mut self, value: i128) -> &mut Self {
        if (-1..=16).contains(&value) {
            self.buf.push((OpCode::Push0 as i128 + value) as u8);
            return self;
        }

        let (op, width) = if i8::try_from(value).is_ok() {
            (OpCode::PushInt8, 1)
        } else if i16::try_from(value).is_ok() {
            (OpCode::PushInt16, 2)
        } else if i32::try_from(value).is_ok() {
            (OpCode::PushInt32, 4)
        } else if i64::try_from(value).is_ok() {
            (OpCode::PushInt64, 8)
        } else {
            (OpCode::PushInt128, 16)
        };
        self.buf.push(op as u8);
        self.buf.extend_from_slice(&value.to_le_bytes()[..width]);
        self
    }

    pub fn emit_push_bytes(&mut self, data: &[u8]) -> Result<&mut Self, ConsoleError> {
        if data.len() > MAX_ITEM_SIZE {
            return Err(ConsoleError::Encoding(format!(
                "Item of {} bytes exceeds the maximum of {} bytes",
                data.len(),
                MAX_ITEM_SIZE
            )));
        }

        if let Ok(len) = u8::try_from(data.len()) {
            self.buf.push(OpCode::PushData1 as u8);
            self.buf.push(len);
        } else if let Ok(len) = u16::try_from(data.len()) {
            self.buf.push(OpCode::PushData2 as u8);
            self.buf.extend_from_slice(&len.to_le_bytes());
        } else {
            self.buf.push(OpCode::PushData4 as u8);
            self.buf.extend_from_slice(&(data.len() as u32).to_le_bytes());
        }
        self.buf.extend_from_slice(data);
        Ok(self)
    }

    pub fn emit_push_string(&mut self, value: &str) -> Result<&mut Self, ConsoleError> {
        self.emit_push_bytes(value.as_bytes())
    }

    pub fn emit_push_param(&mut self, param: &ContractParameter) -> Result<&mut Self, ConsoleError> {
        match param {
            ContractParameter::Any => {
                self.emit(OpCode::PushNull);
            }
            ContractParameter::Boolean(b) => {
                self.emit_push_bool(*b);
            }
            ContractParameter::Integer(i) => {
                self.emit_push_int(*i);
            }
            ContractParameter::ByteArray(bytes)
            | ContractParameter::PublicKey(bytes)
            | ContractParameter::Signature(bytes) => {
                self.emit_push_bytes(bytes)?;
            }
            ContractParameter::String(s) => {
                self.emit_push_string(s)?;
            }
            ContractParameter::Hash160(account) => {
                self.emit_push_bytes(account.as_bytes())?;
            }
            ContractParameter::Hash256(hash) => {
                self.emit_push_bytes(hash)?;
            }
            ContractParameter::Array(items) => {
                self.emit_pack(items)?;
            }
        }
        Ok(self)
    }

    /// Pushes `items` in reverse, then their count, then `PACK`.
    fn emit_pack(&mut self, items: &[ContractParameter]) -> Result<&mut Self, ConsoleError> {
        if items.len() > MAX_ARRAY_LENGTH {
            return Err(ConsoleError::Encoding(format!(
                "Array of {} items exceeds the maximum of {}",
                items.len(),
                MAX_ARRAY_LENGTH
            )));
        }
        for item in items.iter().rev() {
            self.emit_push_param(item)?;
        }
        self.emit_push_int(items.len() as i128);
        Ok(self.emit(OpCode::Pack))
    }

    /// Emits one contract method call:
    /// `<args reversed> <count> PACK <flags> <method> <target> SYSCALL System.Contract.Call`.
    pub fn emit_dynamic_call(
        &mut self,
        contract: &AccountId,
        method: &str,
        args: &[ContractParameter],
    ) -> Result<&mut Self, ConsoleError> {
        if method.is_empty() {
            return Err(ConsoleError::Encoding("Method name cannot be empty".to_string()));
        }
        self.emit_pack(args)?;
        self.emit_push_int(CallFlags::ALL as i128);
        self.emit_push_string(method)?;
        self.emit_push_bytes(contract.as_bytes())?;
        Ok(self.emit_syscall(CONTRACT_CALL_SYSCALL))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pushed(value: i128) -> Vec<u8> {
        let mut sb = ScriptBuilder::new();
        sb.emit_push_int(value);
        sb.into_bytes()
    }

    #[test]
    fn test_small_integers_use_single_opcode() {
        assert_eq!(pushed(-1), vec![OpCode::PushM1 as u8]);
        assert_eq!(pushed(0), vec![0x10]);
        assert_eq!(pushed(16), vec![0x20]);
    }

    #[test]
    fn test_integer_width_selection() {
        assert_eq!(pushed(17), vec![0x00, 0x11]);
        assert_eq!(pushed(-2), vec![0x00, 0xFE]);
        assert_eq!(pushed(128), vec![0x01, 0x80, 0x00]);
        assert_eq!(pushed(1000), vec![0x01, 0xE8, 0x03]);
        assert_eq!(pushed(100_000), vec![0x02, 0xA0, 0x86, 0x01, 0x00]);
        assert_eq!(pushed(i64::MAX as i128 + 1)[0], OpCode::PushInt128 as u8);
        assert_eq!(pushed(i64::MAX as i128 + 1).len(), 17);
    }

    #[test]
    fn test_push_data_prefixes() {
        let mut sb = ScriptBuilder::new();
        sb.emit_push_bytes(&[0xAA; 3]).unwrap();
        assert_eq!(sb.to_bytes(), vec![0x0C, 3, 0xAA, 0xAA, 0xAA]);

        let mut sb = ScriptBuilder::new();
        sb.emit_push_bytes(&vec![0u8; 300]).unwrap();
        assert_eq!(&sb.to_bytes()[..3], &[0x0D, 0x2C, 0x01]);

        let mut sb = ScriptBuilder::new();
        sb.emit_push_bytes(&vec![0u8; 70_000]).unwrap();
        assert_eq!(&sb.to_bytes()[..5], &[0x0E, 0x70, 0x11, 0x01, 0x00]);
    }

    #[test]
    fn test_oversized_item_rejected() {
        let mut sb = ScriptBuilder::new();
        let huge = "x".repeat(MAX_ITEM_SIZE + 1);
        let err = sb.emit_push_string(&huge).unwrap_err();
        assert!(matches!(err, ConsoleError::Encoding(_)));
        assert!(sb.is_empty());
    }

    #[test]
    fn test_nested_array_is_packed() {
        let mut sb = ScriptBuilder::new();
        sb.emit_push_param(&ContractParameter::Array(vec![
            ContractParameter::Integer(1),
            ContractParameter::Boolean(true),
        ]))
        .unwrap();
        // PUSHT, PUSH1, PUSH2, PACK
        assert_eq!(sb.into_bytes(), vec![0x08, 0x11, 0x12, 0xC0]);
    }

    #[test]
    fn test_empty_method_rejected() {
        let mut sb = ScriptBuilder::new();
        assert!(sb.emit_dynamic_call(&AccountId::default(), "", &[]).is_err());
    }
}
