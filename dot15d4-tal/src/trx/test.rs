//! An emulated transceiver for tests.
//!
//! The mock keeps a register file, follows the state register the way the
//! chip does for the commands the TAL issues, latches interrupt causes and
//! records everything observable on its pins in [`TrxEvent`]s.

use std::collections::VecDeque;
use std::marker::PhantomData;
use std::vec::Vec;

use super::*;

#[derive(Debug, PartialEq, Eq, Clone)]
pub enum TrxEvent {
    Command(TrxCommand),
    Reset(bool),
    SlpTr(bool),
    FrameWritten(Vec<u8>),
    FrameRead(usize),
    CcaRequest,
    EdRequest,
    FilterTuning,
    PllCalibration,
}

pub struct MockTransceiver<V: Variant = At86rf232> {
    pub regs: Vec<u8>,
    /// Emulated operating state.
    pub state: TrxStatus,
    pub events: Vec<TrxEvent>,
    /// Scripted CCA results, `true` for an idle channel. Idle when empty.
    pub cca_idle: VecDeque<bool>,
    /// Scripted completion codes of TX_ARET transactions. Success when empty.
    pub trac: VecDeque<TracStatus>,
    /// Scripted energy levels. Zero when empty.
    pub ed_levels: VecDeque<u8>,
    /// Content of the frame buffer as uploaded by the receiver.
    pub rx_buffer: Vec<u8>,
    /// Raise a frame buffer underrun on the next transmission.
    pub underrun: bool,
    /// Never report a PLL lock.
    pub pll_lock_fails: bool,
    /// Number of status reads reporting a busy state before settling.
    pub busy_reads: u32,
    /// Number of status reads reporting a transition after each command.
    pub transition_reads: u32,
    pub irq_enabled: bool,
    pub slp_tr: bool,
    pub elapsed_us: u64,
    irq_raw: u8,
    settling: u32,
    tx_triggered: bool,
    rnd: u8,
    _variant: PhantomData<V>,
}

impl<V: Variant> Default for MockTransceiver<V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<V: Variant> MockTransceiver<V> {
    pub fn new() -> Self {
        let mut regs = vec![0u8; 0x200];
        regs[V::register(Register::PartNum) as usize] = V::PART_NUM;
        Self {
            regs,
            state: TrxStatus::POn,
            events: Vec::new(),
            cca_idle: VecDeque::new(),
            trac: VecDeque::new(),
            ed_levels: VecDeque::new(),
            rx_buffer: Vec::new(),
            underrun: false,
            pll_lock_fails: false,
            busy_reads: 0,
            transition_reads: 0,
            irq_enabled: false,
            slp_tr: false,
            elapsed_us: 0,
            irq_raw: 0,
            settling: 0,
            tx_triggered: false,
            rnd: 0,
            _variant: PhantomData,
        }
    }

    pub fn reg(&self, register: Register) -> u8 {
        self.regs[V::register(register) as usize]
    }

    pub fn field(&self, field: Field) -> u8 {
        let sr = V::field(field);
        (self.regs[sr.address as usize] & sr.mask) >> sr.shift
    }

    /// Latch interrupt causes, as the chip does when an event happens.
    pub fn raise(&mut self, flags: IrqFlags) {
        self.irq_raw |= V::irq_to_raw(flags);
    }

    /// Put a received frame into the frame buffer and raise the end of
    /// reception. `psdu` holds the MPDU and FCS; LQI and ED are appended.
    pub fn receive(&mut self, psdu: &[u8], lqi: u8, ed: u8) {
        self.rx_buffer.clear();
        self.rx_buffer.push(psdu.len() as u8);
        self.rx_buffer.extend_from_slice(psdu);
        self.rx_buffer.push(lqi);
        self.rx_buffer.push(ed);
        self.raise(IrqFlags::TRX_END);
    }

    pub fn commands(&self) -> Vec<TrxCommand> {
        self.events
            .iter()
            .filter_map(|e| match e {
                TrxEvent::Command(c) => Some(*c),
                _ => None,
            })
            .collect()
    }

    pub fn count(&self, event: &TrxEvent) -> usize {
        self.events.iter().filter(|e| *e == event).count()
    }

    pub fn written_frames(&self) -> Vec<Vec<u8>> {
        self.events
            .iter()
            .filter_map(|e| match e {
                TrxEvent::FrameWritten(f) => Some(f.clone()),
                _ => None,
            })
            .collect()
    }

    fn is(&self, address: u16, register: Register) -> bool {
        address == V::register(register)
    }

    fn command(&mut self, command: TrxCommand) {
        self.events.push(TrxEvent::Command(command));

        if self.state == TrxStatus::Sleep {
            return;
        }

        let next = match command {
            TrxCommand::Nop | TrxCommand::Sleep => self.state,
            TrxCommand::TxStart => {
                if self.state == TrxStatus::TxAretOn {
                    self.tx_triggered = true;
                }
                self.state
            }
            TrxCommand::TrxOff | TrxCommand::ForceTrxOff => TrxStatus::TrxOff,
            TrxCommand::PllOn | TrxCommand::ForcePllOn => {
                if self.state == TrxStatus::TrxOff {
                    if self.pll_lock_fails {
                        return;
                    }
                    self.raise(IrqFlags::PLL_LOCK);
                }
                TrxStatus::PllOn
            }
            TrxCommand::RxOn => TrxStatus::RxOn,
            TrxCommand::RxAackOn => TrxStatus::RxAackOn,
            TrxCommand::TxAretOn => TrxStatus::TxAretOn,
        };

        self.state = next;
        self.settling = self.transition_reads;
    }

    fn status_register(&mut self) -> u8 {
        let address = V::register(Register::TrxStatus) as usize;
        let cca = self.regs[address] & 0xe0;

        let status = if self.settling > 0 {
            self.settling -= 1;
            TrxStatus::StateTransitionInProgress as u8
        } else if self.busy_reads > 0 {
            self.busy_reads -= 1;
            match self.state {
                TrxStatus::TxAretOn => TrxStatus::BusyTxAret as u8,
                TrxStatus::RxOn | TrxStatus::PllOn => TrxStatus::BusyRx as u8,
                _ => TrxStatus::BusyRxAack as u8,
            }
        } else {
            self.state as u8
        };

        cca | status
    }

    fn start_transmission(&mut self) {
        self.tx_triggered = false;
        if self.underrun {
            self.underrun = false;
            self.raise(IrqFlags::TRX_END | IrqFlags::TRX_UR);
            return;
        }

        let trac = self.trac.pop_front().unwrap_or(TracStatus::Success);
        let address = V::register(Register::TrxState) as usize;
        self.regs[address] = (self.regs[address] & 0x1f) | ((trac as u8) << 5);
        self.raise(IrqFlags::TRX_END);
    }
}

impl<V: Variant> Transceiver for MockTransceiver<V> {
    type Variant = V;

    fn read(&mut self, address: u16) -> u8 {
        if self.is(address, Register::TrxStatus) {
            return self.status_register();
        }

        if self.is(address, Register::IrqStatus) {
            return core::mem::take(&mut self.irq_raw);
        }

        if self.is(address, Register::PhyRssi) {
            self.rnd = self.rnd.wrapping_add(1);
            return (self.rnd & 0x03) << 5;
        }

        self.regs[address as usize]
    }

    fn write(&mut self, address: u16, value: u8) {
        let index = address as usize;

        if self.is(address, Register::TrxState) {
            self.regs[index] = (self.regs[index] & 0xe0) | (value & 0x1f);
            let command = match value & 0x1f {
                0x00 => TrxCommand::Nop,
                0x02 => TrxCommand::TxStart,
                0x03 => TrxCommand::ForceTrxOff,
                0x04 => TrxCommand::ForcePllOn,
                0x06 => TrxCommand::RxOn,
                0x08 => TrxCommand::TrxOff,
                0x09 => TrxCommand::PllOn,
                0x16 => TrxCommand::RxAackOn,
                0x19 => TrxCommand::TxAretOn,
                _ => TrxCommand::Sleep,
            };
            self.command(command);
            return;
        }

        if self.is(address, Register::PhyCcCca) && value & 0x80 != 0 {
            self.regs[index] = value & 0x7f;
            self.events.push(TrxEvent::CcaRequest);
            let idle = self.cca_idle.pop_front().unwrap_or(true);
            let status = V::register(Register::TrxStatus) as usize;
            self.regs[status] = 0x80 | if idle { 0x40 } else { 0x00 };
            self.raise(IrqFlags::CCA_ED_DONE);
            return;
        }

        if self.is(address, Register::PhyEdLevel) {
            self.events.push(TrxEvent::EdRequest);
            self.regs[index] = self.ed_levels.pop_front().unwrap_or(0);
            self.raise(IrqFlags::CCA_ED_DONE);
            return;
        }

        if self.is(address, Register::FtnCtrl) && value & 0x80 != 0 {
            self.events.push(TrxEvent::FilterTuning);
            self.regs[index] = value & 0x7f;
            return;
        }

        if self.is(address, Register::PllCf) && value & 0x80 != 0 {
            self.events.push(TrxEvent::PllCalibration);
            self.regs[index] = value & 0x7f;
            return;
        }

        self.regs[index] = value;
    }

    fn read_frame_buffer(&mut self, buffer: &mut [u8]) {
        self.events.push(TrxEvent::FrameRead(buffer.len()));
        for (dst, src) in buffer.iter_mut().zip(self.rx_buffer.iter()) {
            *dst = *src;
        }
    }

    fn write_frame_buffer(&mut self, frame: &[u8]) {
        self.events.push(TrxEvent::FrameWritten(frame.to_vec()));
        if self.tx_triggered {
            self.start_transmission();
        }
    }

    fn set_reset(&mut self, asserted: bool) {
        self.events.push(TrxEvent::Reset(asserted));
        if !asserted {
            self.state = TrxStatus::TrxOff;
            self.irq_raw = 0;
        }
    }

    fn set_slp_tr(&mut self, high: bool) {
        self.events.push(TrxEvent::SlpTr(high));
        let rising = high && !self.slp_tr;
        let falling = !high && self.slp_tr;
        self.slp_tr = high;

        match self.state {
            TrxStatus::TrxOff if rising => self.state = TrxStatus::Sleep,
            TrxStatus::Sleep if falling => {
                self.state = TrxStatus::TrxOff;
                self.raise(IrqFlags::AWAKE);
            }
            TrxStatus::TxAretOn if rising => self.tx_triggered = true,
            _ => (),
        }
    }

    fn irq_enable(&mut self) {
        self.irq_enabled = true;
    }

    fn irq_disable(&mut self) {
        self.irq_enabled = false;
    }

    fn irq_is_enabled(&self) -> bool {
        self.irq_enabled
    }

    fn irq_clear(&mut self) {}

    fn irq_pending(&mut self) -> bool {
        let mask = self.reg(Register::IrqMask);
        self.irq_raw & mask != 0
    }

    fn delay_us(&mut self, us: u32) {
        self.elapsed_us += us as u64;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn field_access_and_commands() {
        let mut trx = MockTransceiver::<At86rf232>::new();
        trx.set_reset(true);
        trx.set_reset(false);
        assert_eq!(trx.read_field(Field::TrxStatus), TrxStatus::TrxOff as u8);

        trx.write_field(Field::Channel, 15);
        trx.write_field(Field::CcaMode, 1);
        assert_eq!(trx.read_field(Field::Channel), 15);
        assert_eq!(trx.read_field(Field::CcaMode), 1);
        assert_eq!(trx.reg(Register::PhyCcCca), 0x2f);

        trx.write_irq_mask(IrqFlags::PLL_LOCK);
        trx.write_reg(Register::TrxState, TrxCommand::PllOn as u8);
        assert!(trx.irq_pending());
        assert_eq!(trx.read_irq(), IrqFlags::PLL_LOCK);
        assert!(!trx.irq_pending());
    }

    #[test]
    fn scripted_cca() {
        let mut trx = MockTransceiver::<AtmegaRfr2>::new();
        trx.cca_idle.push_back(false);
        trx.write_field(Field::CcaRequest, 1);
        assert_eq!(trx.read_field(Field::CcaDone), 1);
        assert_eq!(trx.read_field(Field::CcaStatus), 0);
        assert!(trx.read_irq().contains(IrqFlags::CCA_ED_DONE));
        assert_eq!(trx.count(&TrxEvent::CcaRequest), 1);
    }
}
