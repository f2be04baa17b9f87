//! In-process simulated NAND chip
//!
//! Backs the two [`GpioPort`] halves with a small byte-level state machine
//! that answers the same latch sequences a real part would, by interpreting
//! the sequence of writes rather than any electrical timing. Used by the
//! integration test suite and by the protocol engine's own unit tests.

use std::cell::RefCell;
use std::rc::Rc;

use crate::domain::{ControlPin, IdRegister, NandGeometry, EXPECTED_ID};
use crate::error::Result;
use crate::infrastructure::gpio::traits::GpioPort;

struct VirtualNandCore {
    geometry: NandGeometry,
    memory: Vec<u8>,
    ctrl_shadow: u8,
    io_host_value: u8,
    io_driven_value: u8,
    last_command: Option<u8>,
    address_acc: Vec<u8>,
    output_buffer: Vec<u8>,
    output_cursor: usize,
    program_buffer: Vec<u8>,
    status: u8,
    force_fail: bool,
    id: [u8; 5],
}

impl VirtualNandCore {
    fn new(geometry: NandGeometry) -> Self {
        let total_bytes = geometry.page_size * geometry.total_pages as usize;
        Self {
            geometry,
            memory: vec![0xFF; total_bytes],
            ctrl_shadow: 0,
            io_host_value: 0xFF,
            io_driven_value: 0xFF,
            last_command: None,
            address_acc: Vec::new(),
            output_buffer: Vec::new(),
            output_cursor: 0,
            program_buffer: Vec::new(),
            status: 0,
            force_fail: false,
            id: EXPECTED_ID,
        }
    }

    fn on_ctrl_write(&mut self, new: u8) {
        let old = self.ctrl_shadow;
        let nwe_mask = ControlPin::NWe.mask();
        let nre_mask = ControlPin::NRe.mask();
        let cle_high = new & ControlPin::Cle.mask() != 0;
        let ale_high = new & ControlPin::Ale.mask() != 0;

        let nwe_rising = old & nwe_mask == 0 && new & nwe_mask != 0;
        let nre_falling = old & nre_mask != 0 && new & nre_mask == 0;

        if nwe_rising {
            let byte = self.io_host_value;
            if cle_high {
                self.on_command_latched(byte);
            } else if ale_high {
                self.address_acc.push(byte);
                self.maybe_complete_address();
            } else {
                self.program_buffer.push(byte);
            }
        }

        if nre_falling {
            let byte = self
                .output_buffer
                .get(self.output_cursor)
                .copied()
                .unwrap_or(0xFF);
            self.io_driven_value = byte;
            self.output_cursor += 1;
        }

        self.ctrl_shadow = new;
    }

    fn on_command_latched(&mut self, cmd: u8) {
        match cmd {
            0x90 => {
                self.last_command = Some(cmd);
                self.address_acc.clear();
            }
            0x00 | 0x80 | 0x60 => {
                self.last_command = Some(cmd);
                self.address_acc.clear();
                if cmd == 0x80 {
                    self.program_buffer.clear();
                }
            }
            0x30 => {
                let page = self.pending_page();
                self.output_buffer = self.read_page_bytes(page);
                self.output_cursor = 0;
            }
            0x10 => {
                let page = self.pending_page();
                self.commit_program(page);
            }
            0xD0 => {
                let block = self.pending_block();
                self.commit_erase(block);
            }
            0x70 => {
                self.output_buffer = vec![self.status];
                self.output_cursor = 0;
            }
            _ => {}
        }
    }

    fn maybe_complete_address(&mut self) {
        if self.last_command == Some(0x90) && self.address_acc.len() == 1 {
            self.output_buffer = self.id.to_vec();
            self.output_cursor = 0;
        }
    }

    fn pending_page(&self) -> u32 {
        let n = self.address_acc.len();
        let b = &self.address_acc[n - 3..n];
        b[0] as u32 | (b[1] as u32) << 8 | (b[2] as u32) << 16
    }

    fn pending_block(&self) -> u32 {
        self.geometry.block_of(self.pending_page())
    }

    fn read_page_bytes(&self, page: u32) -> Vec<u8> {
        let start = page as usize * self.geometry.page_size;
        self.memory[start..start + self.geometry.page_size].to_vec()
    }

    fn commit_program(&mut self, page: u32) {
        let start = page as usize * self.geometry.page_size;
        let len = self.geometry.page_size.min(self.program_buffer.len());
        self.memory[start..start + len].copy_from_slice(&self.program_buffer[..len]);
        self.status = if self.force_fail { 0x01 } else { 0x00 };
    }

    fn commit_erase(&mut self, block: u32) {
        let page_size = self.geometry.page_size;
        let start = block as usize * self.geometry.pages_per_block as usize * page_size;
        let len = self.geometry.pages_per_block as usize * page_size;
        self.memory[start..start + len].fill(0xFF);
        self.status = if self.force_fail { 0x01 } else { 0x00 };
    }
}

/// A virtual NAND chip exposing its two halves as [`GpioPort`] instances.
pub struct SimulatedNandChip {
    core: Rc<RefCell<VirtualNandCore>>,
}

impl SimulatedNandChip {
    pub fn new(geometry: NandGeometry) -> Self {
        Self {
            core: Rc::new(RefCell::new(VirtualNandCore::new(geometry))),
        }
    }

    /// Split into the (io_port, ctrl_port) pair a [`crate::infrastructure::flash_protocol::nand::NandSession`] expects.
    pub fn ports(&self) -> (SimulatedIoPort, SimulatedCtrlPort) {
        (
            SimulatedIoPort {
                core: self.core.clone(),
            },
            SimulatedCtrlPort {
                core: self.core.clone(),
            },
        )
    }

    pub fn reported_identity(&self) -> IdRegister {
        IdRegister(self.core.borrow().id)
    }

    pub fn set_identity(&self, id: [u8; 5]) {
        self.core.borrow_mut().id = id;
    }

    /// Force the next program/erase status read to report bit 0 set (failure).
    pub fn force_next_status_fail(&self, fail: bool) {
        self.core.borrow_mut().force_fail = fail;
    }

    pub fn page_bytes(&self, page: u32) -> Vec<u8> {
        self.core.borrow().read_page_bytes(page)
    }

    pub fn preload_page(&self, page: u32, data: &[u8]) {
        let core = &mut self.core.borrow_mut();
        let start = page as usize * core.geometry.page_size;
        core.memory[start..start + data.len()].copy_from_slice(data);
    }
}

pub struct SimulatedIoPort {
    core: Rc<RefCell<VirtualNandCore>>,
}

impl GpioPort for SimulatedIoPort {
    fn name(&self) -> &str {
        "simulated-io"
    }

    fn write_byte(&mut self, byte: u8) -> Result<()> {
        self.core.borrow_mut().io_host_value = byte;
        Ok(())
    }

    fn read_pins(&mut self) -> Result<u8> {
        Ok(self.core.borrow().io_driven_value)
    }

    fn set_direction_mask(&mut self, _mask: u8) -> Result<()> {
        Ok(())
    }
}

pub struct SimulatedCtrlPort {
    core: Rc<RefCell<VirtualNandCore>>,
}

impl GpioPort for SimulatedCtrlPort {
    fn name(&self) -> &str {
        "simulated-ctrl"
    }

    fn write_byte(&mut self, byte: u8) -> Result<()> {
        self.core.borrow_mut().on_ctrl_write(byte);
        Ok(())
    }

    fn read_pins(&mut self) -> Result<u8> {
        // RDY is chip-driven; this simulation never models erase/program
        // latency, so RDY always reads asserted.
        let shadow = self.core.borrow().ctrl_shadow;
        Ok(shadow | ControlPin::Rdy.mask())
    }

    fn set_direction_mask(&mut self, _mask: u8) -> Result<()> {
        Ok(())
    }
}
