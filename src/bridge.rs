//! Host-visible buffers.
//!
//! The host can only exchange data with the module through addresses in
//! its memory. Buffers handed out here stay alive until the host releases
//! them, and are looked up by address when the host passes them back.
//! Slots are reused; each reuse bumps the slot's generation so a stale
//! [`Handle`] never reaches the buffer that replaced it.

use std::cell::RefCell;
use std::collections::HashMap;

use log::debug;

thread_local! {
    /// Registry of live buffers for the calling thread.
    static REGISTRY: RefCell<Bridge> = RefCell::new(Bridge::new());
}

/// Run `f` with this thread's registry.
pub fn with<R>(f: impl FnOnce(&mut Bridge) -> R) -> R {
    REGISTRY.with(|bridge| f(&mut bridge.borrow_mut()))
}

/// Stable reference to one allocation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Handle {
    index: u32,
    generation: u32,
}

#[derive(Debug)]
struct Buffer {
    /// At least one byte, so every live buffer has its own address.
    bytes: Box<[u8]>,
    /// Requested size.
    len: usize,
}

impl Buffer {
    fn address(&self) -> usize {
        self.bytes.as_ptr() as usize
    }
}

#[derive(Debug)]
struct Slot {
    generation: u32,
    buffer: Option<Buffer>,
}

#[derive(Debug, Default)]
pub struct Bridge {
    slots: Vec<Slot>,
    vacant: Vec<u32>,
    by_address: HashMap<usize, Handle>,
}

impl Bridge {
    pub fn new() -> Self {
        Self::default()
    }

    /// Allocate a zeroed buffer of `size` bytes.
    pub fn allocate(&mut self, size: usize) -> Handle {
        let buffer = Buffer {
            bytes: vec![0u8; size.max(1)].into_boxed_slice(),
            len: size,
        };
        let address = buffer.address();
        let handle = match self.vacant.pop() {
            Some(index) => {
                let slot = &mut self.slots[index as usize];
                slot.buffer = Some(buffer);
                Handle {
                    index,
                    generation: slot.generation,
                }
            }
            None => {
                let index = u32::try_from(self.slots.len()).unwrap_or(u32::MAX);
                self.slots.push(Slot {
                    generation: 0,
                    buffer: Some(buffer),
                });
                Handle {
                    index,
                    generation: 0,
                }
            }
        };
        self.by_address.insert(address, handle);
        debug!("allocated {size} bytes at {address:#x} ({} live)", self.len());
        handle
    }

    /// Release a buffer. Returns false, and does nothing, if the handle is
    /// unknown or already released.
    pub fn free(&mut self, handle: Handle) -> bool {
        let Some(slot) = self.slots.get_mut(handle.index as usize) else {
            return false;
        };
        if slot.generation != handle.generation {
            return false;
        }
        let Some(buffer) = slot.buffer.take() else {
            return false;
        };
        slot.generation = slot.generation.wrapping_add(1);
        self.vacant.push(handle.index);
        self.by_address.remove(&buffer.address());
        debug!("released {} bytes at {:#x} ({} live)", buffer.len, buffer.address(), self.len());
        if self.is_empty() {
            debug!("every host buffer released");
        }
        true
    }

    /// Release the buffer starting at `address`, if there is one.
    pub fn free_address(&mut self, address: usize) -> bool {
        match self.resolve(address) {
            Some(handle) => self.free(handle),
            None => false,
        }
    }

    /// The live handle for a buffer starting at `address`.
    pub fn resolve(&self, address: usize) -> Option<Handle> {
        self.by_address.get(&address).copied()
    }

    fn buffer(&self, handle: Handle) -> Option<&Buffer> {
        let slot = self.slots.get(handle.index as usize)?;
        if slot.generation != handle.generation {
            return None;
        }
        slot.buffer.as_ref()
    }

    fn buffer_mut(&mut self, handle: Handle) -> Option<&mut Buffer> {
        let slot = self.slots.get_mut(handle.index as usize)?;
        if slot.generation != handle.generation {
            return None;
        }
        slot.buffer.as_mut()
    }

    /// Address of a live buffer.
    pub fn address(&self, handle: Handle) -> Option<usize> {
        self.buffer(handle).map(Buffer::address)
    }

    /// Pointer to a live buffer, for handing to the host.
    pub fn as_mut_ptr(&mut self, handle: Handle) -> Option<*mut u8> {
        self.buffer_mut(handle).map(|b| b.bytes.as_mut_ptr())
    }

    pub fn get(&self, handle: Handle) -> Option<&[u8]> {
        self.buffer(handle).map(|b| &b.bytes[..b.len])
    }

    pub fn get_mut(&mut self, handle: Handle) -> Option<&mut [u8]> {
        self.buffer_mut(handle).map(|b| &mut b.bytes[..b.len])
    }

    /// The first `len` bytes of the live buffer starting at `address`.
    pub fn read(&self, address: usize, len: usize) -> Option<&[u8]> {
        let handle = self.resolve(address)?;
        self.get(handle)?.get(..len)
    }

    /// Allocate a buffer holding a copy of `bytes`.
    pub fn store(&mut self, bytes: &[u8]) -> Handle {
        let handle = self.allocate(bytes.len());
        if let Some(buffer) = self.get_mut(handle) {
            buffer.copy_from_slice(bytes);
        }
        handle
    }

    /// Number of live buffers.
    pub fn len(&self) -> usize {
        self.by_address.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_address.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn allocate_is_zeroed_and_sized() {
        let mut bridge = Bridge::new();
        let handle = bridge.allocate(16);
        assert_eq!(bridge.get(handle).unwrap(), &[0u8; 16]);
        assert_eq!(bridge.len(), 1);
    }

    #[test]
    fn zero_size_buffers_have_distinct_addresses() {
        let mut bridge = Bridge::new();
        let a = bridge.allocate(0);
        let b = bridge.allocate(0);
        assert_ne!(bridge.address(a), bridge.address(b));
        assert_eq!(bridge.get(a).unwrap().len(), 0);
        assert_eq!(bridge.len(), 2);
    }

    #[test]
    fn free_is_idempotent() {
        let mut bridge = Bridge::new();
        let handle = bridge.allocate(8);
        assert!(bridge.free(handle));
        assert!(!bridge.free(handle));
        assert!(bridge.is_empty());
    }

    #[test]
    fn unknown_address_is_a_no_op() {
        let mut bridge = Bridge::new();
        bridge.allocate(4);
        assert!(!bridge.free_address(1));
        assert_eq!(bridge.len(), 1);
    }

    #[test]
    fn stale_handle_does_not_reach_reused_slot() {
        let mut bridge = Bridge::new();
        let old = bridge.allocate(4);
        bridge.free(old);
        let new = bridge.allocate(4);
        assert_eq!(new.index, old.index);
        assert!(bridge.get(old).is_none());
        assert!(!bridge.free(old));
        assert!(bridge.get(new).is_some());
    }

    #[test]
    fn free_by_address() {
        let mut bridge = Bridge::new();
        let handle = bridge.allocate(3);
        let address = bridge.address(handle).unwrap();
        assert_eq!(bridge.resolve(address), Some(handle));
        assert!(bridge.free_address(address));
        assert_eq!(bridge.resolve(address), None);
    }

    #[test]
    fn store_and_read() {
        let mut bridge = Bridge::new();
        let handle = bridge.store(b"echo hi");
        let address = bridge.address(handle).unwrap();
        assert_eq!(bridge.read(address, 4), Some(&b"echo"[..]));
        assert_eq!(bridge.read(address, 7), Some(&b"echo hi"[..]));
        assert_eq!(bridge.read(address, 8), None);
        assert_eq!(bridge.read(address + 1, 1), None);
    }

    #[test]
    fn thread_local_registry() {
        let handle = with(|b| b.allocate(2));
        assert!(with(|b| b.free(handle)));
        assert!(!with(|b| b.free(handle)));
    }
}
