#![no_main]

//! Drive the TAL through its public entry points against a transceiver that
//! reports arbitrary states. Every wait is bounded, so the TAL has to return
//! (possibly with a fault) instead of hanging.
//!
//! Illegal transitions panic in builds with debug assertions: run with the
//! default release profile.

use arbitrary::Arbitrary;
use libfuzzer_sys::fuzz_target;
use rand::rngs::SmallRng;
use rand::SeedableRng;

use dot15d4_tal::buffer::StaticPool;
use dot15d4_tal::config::{CsmaEngine, TalConfig};
use dot15d4_tal::time::{Duration, Instant};
use dot15d4_tal::timer::TimerError;
use dot15d4_tal::trx::{At86rf232, IrqFlags, Register, Transceiver, TrxStatus, Variant};
use dot15d4_tal::*;

#[derive(Debug, Arbitrary)]
enum Op {
    RxEnable(bool),
    Transmit {
        mode: CsmaMode,
        allow_retries: bool,
        ack_request: bool,
    },
    EdStart(u8),
    Sleep,
    Wakeup,
    PibSet(PibAttribute),
    /// Latch raw interrupt causes.
    Interrupt(u8),
    /// Fill the frame buffer as the receiver does and signal its end.
    Receive(Vec<u8>),
    /// Status register reads that ignore the commanded state.
    Glitch(Vec<TrxStatus>),
    Expire(u8),
    Advance(Duration),
    Task,
}

#[derive(Debug, Arbitrary)]
struct Input {
    engine: CsmaEngine,
    start: Instant,
    seed: u64,
    ops: Vec<Op>,
}

struct Radio {
    regs: [u8; 0x200],
    state: TrxStatus,
    glitches: Vec<TrxStatus>,
    frame_buffer: Vec<u8>,
    irq_raw: u8,
    irq_enabled: bool,
    slp_tr: bool,
}

impl Radio {
    fn new() -> Self {
        let mut regs = [0u8; 0x200];
        regs[At86rf232::register(Register::PartNum) as usize] = At86rf232::PART_NUM;
        Self {
            regs,
            state: TrxStatus::POn,
            glitches: Vec::new(),
            frame_buffer: Vec::new(),
            irq_raw: 0,
            irq_enabled: false,
            slp_tr: false,
        }
    }

    fn is(address: u16, register: Register) -> bool {
        address == At86rf232::register(register)
    }
}

impl Transceiver for Radio {
    type Variant = At86rf232;

    fn read(&mut self, address: u16) -> u8 {
        if Self::is(address, Register::TrxStatus) {
            let status = self.glitches.pop().unwrap_or(self.state);
            return (self.regs[address as usize] & 0xe0) | status as u8;
        }

        if Self::is(address, Register::IrqStatus) {
            return core::mem::take(&mut self.irq_raw);
        }

        self.regs[address as usize]
    }

    fn write(&mut self, address: u16, value: u8) {
        if Self::is(address, Register::TrxState) && self.state != TrxStatus::Sleep {
            self.state = match value & 0x1f {
                0x03 | 0x08 => TrxStatus::TrxOff,
                0x04 | 0x09 => TrxStatus::PllOn,
                0x06 => TrxStatus::RxOn,
                0x16 => TrxStatus::RxAackOn,
                0x19 => TrxStatus::TxAretOn,
                _ => self.state,
            };
        }

        self.regs[address as usize] = value;
    }

    fn read_frame_buffer(&mut self, buffer: &mut [u8]) {
        for (dst, src) in buffer.iter_mut().zip(self.frame_buffer.iter()) {
            *dst = *src;
        }
    }

    fn write_frame_buffer(&mut self, _frame: &[u8]) {
        self.irq_raw |= At86rf232::irq_to_raw(IrqFlags::TRX_END);
    }

    fn set_reset(&mut self, asserted: bool) {
        if !asserted {
            self.state = TrxStatus::TrxOff;
            self.irq_raw = 0;
        }
    }

    fn set_slp_tr(&mut self, high: bool) {
        let rising = high && !self.slp_tr;
        let falling = !high && self.slp_tr;
        self.slp_tr = high;

        match self.state {
            TrxStatus::TrxOff if rising => self.state = TrxStatus::Sleep,
            TrxStatus::Sleep if falling => {
                self.state = TrxStatus::TrxOff;
                self.irq_raw |= At86rf232::irq_to_raw(IrqFlags::AWAKE);
            }
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
        self.irq_raw != 0
    }

    fn delay_us(&mut self, _us: u32) {}
}

struct Clock {
    now: Instant,
    running: Vec<(TimerId, Instant)>,
}

impl Timer for Clock {
    fn now(&self) -> Instant {
        self.now
    }

    fn start(&mut self, id: TimerId, timeout: Timeout) -> Result<(), TimerError> {
        if self.is_running(id) {
            return Err(TimerError::AlreadyRunning);
        }

        let at = match timeout {
            Timeout::Relative(duration) => self.now + duration,
            Timeout::Absolute(at) => at,
        };
        self.running.push((id, at));
        Ok(())
    }

    fn stop(&mut self, id: TimerId) {
        self.running.retain(|(running, _)| *running != id);
    }

    fn is_running(&self, id: TimerId) -> bool {
        self.running.iter().any(|(running, _)| *running == id)
    }
}

#[derive(Default)]
struct Upper {
    accepted: usize,
    done: usize,
}

impl UpperLayer for Upper {
    fn tx_done(&mut self, _status: TxStatus, _frame: TxFrame) {
        self.done += 1;
        assert!(self.done <= self.accepted, "more completions than transmissions");
    }

    fn rx_frame(&mut self, frame: RxFrame<'_>) {
        let _ = frame.psdu();
    }

    fn ed_done(&mut self, _level: u8) {}
}

fuzz_target!(|input: Input| {
    let config = TalConfig {
        csma_engine: input.engine,
        ..Default::default()
    };
    let clock = Clock {
        now: input.start,
        running: Vec::new(),
    };
    let mut tal: Tal<Radio, Clock, StaticPool<2, RX_BUFFER_SIZE>, SmallRng, Upper> = Tal::new(
        Radio::new(),
        clock,
        StaticPool::new(),
        SmallRng::seed_from_u64(input.seed),
        Upper::default(),
        config,
    );

    if tal.init().is_err() {
        return;
    }

    for op in input.ops {
        let _ = match op {
            Op::RxEnable(on) => tal.rx_enable(on),
            Op::Transmit {
                mode,
                allow_retries,
                ack_request,
            } => {
                let fc = if ack_request { 0x61 } else { 0x41 };
                let Some(frame) =
                    TxFrame::from_mpdu(&[fc, 0x88, 1, 0xcd, 0xab, 0xff, 0xff, 0x01, 0x00])
                else {
                    continue;
                };
                match tal.tx_frame(frame, mode, allow_retries) {
                    Ok(()) => {
                        tal.upper_mut().accepted += 1;
                        Ok(())
                    }
                    Err((error, _)) => Err(error),
                }
            }
            Op::EdStart(duration) => tal.ed_start(duration),
            Op::Sleep => tal.sleep(),
            Op::Wakeup => tal.wakeup(),
            Op::PibSet(attribute) => tal.pib_set(attribute),
            Op::Interrupt(raw) => {
                tal.trx_mut().irq_raw |= raw;
                tal.on_interrupt()
            }
            Op::Receive(frame_buffer) => {
                let radio = tal.trx_mut();
                radio.frame_buffer = frame_buffer;
                radio.irq_raw |= At86rf232::irq_to_raw(IrqFlags::TRX_END);
                tal.on_interrupt()
            }
            Op::Glitch(statuses) => {
                tal.trx_mut().glitches = statuses;
                Ok(())
            }
            Op::Expire(index) => {
                let id = TimerId::ALL[index as usize % TimerId::ALL.len()];
                let clock = tal.timer_mut();
                match clock.running.iter().position(|(running, _)| *running == id) {
                    Some(position) => {
                        let (_, at) = clock.running.remove(position);
                        clock.now = at;
                        tal.on_timer(id)
                    }
                    None => Ok(()),
                }
            }
            Op::Advance(duration) => {
                let clock = tal.timer_mut();
                clock.now = clock.now + duration;
                Ok(())
            }
            Op::Task => tal.task(),
        };
    }
});
