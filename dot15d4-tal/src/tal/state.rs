//! Transceiver state transitions.

use rand_core::RngCore;

use super::{fault, Tal};
use crate::buffer::BufferPool;
use crate::config::{PLL_LOCK_ATTEMPTS, POLL_ATTEMPTS};
use crate::constants::*;
use crate::error::{Error, Fault};
use crate::timer::Timer;
use crate::trx::{Field, IrqFlags, Register, Transceiver, TrxCommand, TrxStatus};
use crate::upper::UpperLayer;

/// Step of the busy-waits on an interrupt.
const IRQ_POLL_STEP_US: u32 = 10;

impl<T, TM, B, R, U> Tal<T, TM, B, R, U>
where
    T: Transceiver,
    TM: Timer,
    B: BufferPool,
    R: RngCore,
    U: UpperLayer,
{
    /// Request a transceiver state and return the state reached.
    ///
    /// The result is never `StateTransitionInProgress`. While the transceiver
    /// is busy with a frame, every command is deferred and the busy state is
    /// returned; callers that need the target state retry with
    /// [`Tal::wait_for_state`].
    pub(crate) fn set_trx_state(&mut self, command: TrxCommand) -> Result<TrxStatus, Error> {
        if self.trx_status == TrxStatus::Sleep {
            if command == TrxCommand::Sleep {
                return Ok(TrxStatus::Sleep);
            }

            self.leave_sleep()?;
            self.trx_status = TrxStatus::TrxOff;
            if matches!(command, TrxCommand::TrxOff | TrxCommand::ForceTrxOff) {
                return Ok(TrxStatus::TrxOff);
            }
        }

        if self.trx_status.is_busy() || command == TrxCommand::Nop {
            return self.poll_status();
        }

        let status = self.trx_status;
        match command {
            TrxCommand::Sleep => return self.enter_sleep(),
            TrxCommand::TrxOff | TrxCommand::ForceTrxOff => {
                if status != TrxStatus::TrxOff {
                    self.write_command(command);
                    self.trx.delay_us(1);
                }
            }
            TrxCommand::PllOn | TrxCommand::ForcePllOn => match status {
                TrxStatus::PllOn => (),
                TrxStatus::TrxOff => self.switch_pll_on()?,
                TrxStatus::RxOn | TrxStatus::RxAackOn | TrxStatus::TxAretOn => {
                    self.write_command(command)
                }
                _ => return Err(self.illegal_transition(status, command)),
            },
            TrxCommand::RxOn | TrxCommand::RxAackOn | TrxCommand::TxAretOn => {
                if status as u8 != command as u8 {
                    match status {
                        TrxStatus::TrxOff => {
                            self.switch_pll_on()?;
                            self.write_command(command);
                        }
                        TrxStatus::PllOn
                        | TrxStatus::RxOn
                        | TrxStatus::RxAackOn
                        | TrxStatus::TxAretOn => self.write_command(command),
                        _ => return Err(self.illegal_transition(status, command)),
                    }
                }
            }
            // Transmissions are started with SLP_TR.
            TrxCommand::Nop | TrxCommand::TxStart => {
                return Err(self.illegal_transition(status, command))
            }
        }

        self.poll_status()
    }

    /// Repeat `command` until the transceiver reaches `target`, waiting out
    /// a frame in progress.
    pub(crate) fn wait_for_state(
        &mut self,
        command: TrxCommand,
        target: TrxStatus,
    ) -> Result<(), Error> {
        for _ in 0..POLL_ATTEMPTS {
            if self.set_trx_state(command)? == target {
                return Ok(());
            }
            self.trx.delay_us(TRX_POLL_WAIT_TIME_US);
        }

        Err(fault(Fault::BusyTimeout))
    }

    /// Read the status register until it reports a state.
    pub(crate) fn poll_status(&mut self) -> Result<TrxStatus, Error> {
        for _ in 0..POLL_ATTEMPTS {
            let raw = self.trx.read_field(Field::TrxStatus);
            match TrxStatus::try_from(raw) {
                Ok(TrxStatus::StateTransitionInProgress) => self.trx.delay_us(1),
                Ok(status) => {
                    self.trx_status = status;
                    return Ok(status);
                }
                Err(code) => return Err(fault(Fault::UnknownStatus(code))),
            }
        }

        Err(fault(Fault::TransitionTimeout))
    }

    fn write_command(&mut self, command: TrxCommand) {
        trace!("trx command {:?}", command);
        self.trx.write_reg(Register::TrxState, command as u8);
    }

    fn illegal_transition(&self, status: TrxStatus, command: TrxCommand) -> Error {
        if cfg!(debug_assertions) {
            panic!("illegal transition from {:?} with {:?}", status, command);
        }
        fault(Fault::IllegalTransition { status, command })
    }

    /// TRX_OFF to PLL_ON, waiting for the PLL to lock. A lock that does not
    /// come in time is retried after toggling the PLL center frequency.
    fn switch_pll_on(&mut self) -> Result<(), Error> {
        let raw = self.trx.read_field(Field::TrxStatus);
        if raw != TrxStatus::TrxOff as u8 {
            let status =
                TrxStatus::try_from(raw).map_err(|code| fault(Fault::UnknownStatus(code)))?;
            return Err(self.illegal_transition(status, TrxCommand::PllOn));
        }

        self.trx.read_irq();
        let mask = self.trx.read_reg(Register::IrqMask);
        let irq_enabled = self.trx.irq_is_enabled();
        self.trx.write_irq_mask(IrqFlags::PLL_LOCK);
        self.trx.irq_disable();

        self.write_command(TrxCommand::PllOn);

        let mut locked = false;
        'attempts: for _ in 0..PLL_LOCK_ATTEMPTS {
            for _ in 0..PLL_LOCK_DURATION_MAX_US / IRQ_POLL_STEP_US {
                if self.trx.irq_pending() {
                    locked = true;
                    break 'attempts;
                }
                self.trx.delay_us(IRQ_POLL_STEP_US);
            }

            warn!("PLL did not lock, retuning");
            let cf = self.trx.read_reg(Register::PllCf);
            self.trx.write_reg(Register::PllCf, cf ^ 0x01);
        }

        self.trx.read_irq();
        self.trx.irq_clear();
        self.trx.write_reg(Register::IrqMask, mask);
        if irq_enabled {
            self.trx.irq_enable();
        }

        if locked {
            Ok(())
        } else {
            Err(fault(Fault::PllLockTimeout))
        }
    }

    fn enter_sleep(&mut self) -> Result<TrxStatus, Error> {
        self.write_command(TrxCommand::ForceTrxOff);
        self.trx.read_irq();
        self.trx.write_irq_mask(IrqFlags::AWAKE);
        self.trx.delay_us(TRX_OFF_TO_SLEEP_TIME_US);
        self.trx.set_slp_tr(true);
        self.trx_status = TrxStatus::Sleep;
        debug!("transceiver asleep");
        Ok(TrxStatus::Sleep)
    }

    /// Release SLP_TR and wait for the AWAKE interrupt. The interrupt is
    /// polled, so the host interrupt is enabled only for the handshake.
    fn leave_sleep(&mut self) -> Result<(), Error> {
        let irq_enabled = self.trx.irq_is_enabled();
        self.trx.irq_clear();
        self.trx.irq_enable();
        self.trx.set_slp_tr(false);

        let mut awake = false;
        for _ in 0..=SLEEP_TO_TRX_OFF_MAX_US / IRQ_POLL_STEP_US {
            if self.trx.irq_pending() {
                awake = true;
                break;
            }
            self.trx.delay_us(IRQ_POLL_STEP_US);
        }

        if !irq_enabled {
            self.trx.irq_disable();
        }
        self.trx.read_irq();
        self.trx.irq_clear();
        self.trx.write_irq_mask(IrqFlags::TRX_END);

        if !awake {
            return Err(fault(Fault::WakeupTimeout));
        }

        debug!("transceiver awake");
        Ok(())
    }
}
