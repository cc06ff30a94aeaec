use cortex_m::interrupt;
use cortex_m::register::primask;
use critical_section::{self, RawRestoreState};
use defmt_rtt as _;
use embassy_executor::Spawner;
use embassy_stm32 as hal;
use embassy_stm32::gpio::{Flex, Input, Level, Output, Pull, Speed};

use crate::io::{BlockingDelay, InputLines, OutputLines, SysTickTimer};
use sense_core::detect::Dispatcher;

mod sense_task;

critical_section::set_impl!(InterruptCriticalSection);

struct InterruptCriticalSection;

unsafe impl critical_section::Impl for InterruptCriticalSection {
    unsafe fn acquire() -> RawRestoreState {
        let primask = primask::read();
        interrupt::disable();
        primask.is_active()
    }

    unsafe fn release(restore_state: RawRestoreState) {
        if restore_state {
            unsafe {
                interrupt::enable();
            }
        }
    }
}

#[embassy_executor::main]
pub async fn main(spawner: Spawner) {
    let config = hal::Config::default();
    let hal::Peripherals {
        PA0,
        PA1,
        PA4,
        PA5,
        PB0,
        PB1,
        ..
    } = hal::init(config);

    // Buttons idle high through the pull-ups; the status line is driven by
    // the downstream device and idles low.
    let sampler = InputLines::new(
        Input::new(PA0, Pull::Up),
        Input::new(PA1, Pull::Up),
        Input::new(PB0, Pull::Down),
    );

    let driver = OutputLines::new(
        Flex::new(PA4),
        Output::new(PA5, Level::Low, Speed::Low),
        Flex::new(PB1),
    );

    let dispatcher = Dispatcher::new(SysTickTimer::new(), sampler, driver, BlockingDelay);

    spawner
        .spawn(sense_task::run(dispatcher))
        .expect("failed to spawn sense task");

    core::future::pending::<()>().await;
}
