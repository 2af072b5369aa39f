//! Power switching for the WifiBee.
//!
//! The session never toggles pins itself; it is handed a [`PowerControl`]
//! when it is built. Boards that hard-wire the module's supply use
//! [`AlwaysOn`].

use crate::clock::Clock;

/// Switches the module on and off.
pub trait PowerControl {
    /// Switch the module on.
    fn on(&mut self);

    /// Switch the module off.
    fn off(&mut self);

    /// Whether the module is on.
    fn is_on(&self) -> bool;
}

/// A GPIO line.
pub trait DigitalPin {
    /// Drive the pin high or low.
    fn set(&mut self, high: bool);

    /// Read the pin level.
    fn is_high(&self) -> bool;
}

/// No controller at all: the module is assumed to be on.
#[derive(Debug, Clone, Copy, Default)]
pub struct AlwaysOn;

impl PowerControl for AlwaysOn {
    fn on(&mut self) {}

    fn off(&mut self) {}

    fn is_on(&self) -> bool {
        true
    }
}

/// Settling time between enabling VCC and pulling the on/off line.
const VCC_SETTLE_MS: u32 = 2;

/// Bee socket power switching.
///
/// - `vcc`: switches the 3V3 supply, active high
/// - `onoff`: the DTR line, active low
/// - `status`: reads high while the module runs
///
/// Every pin is optional. Without a status pin the inverted on/off line is
/// read instead; with neither the module is assumed to be on.
pub struct GpioPowerControl<P, C> {
    vcc: Option<P>,
    onoff: Option<P>,
    status: Option<P>,
    clock: C,
}

impl<P: DigitalPin, C: Clock> GpioPowerControl<P, C> {
    /// Take ownership of the pins and drive them to the off state.
    pub fn new(vcc: Option<P>, onoff: Option<P>, status: Option<P>, clock: C) -> Self {
        let mut control = GpioPowerControl {
            vcc,
            onoff,
            status,
            clock,
        };
        control.off();
        control
    }

    /// Whether a status pin is wired.
    pub fn has_status_pin(&self) -> bool {
        self.status.is_some()
    }
}

impl<P: DigitalPin, C: Clock> PowerControl for GpioPowerControl<P, C> {
    fn on(&mut self) {
        if let Some(vcc) = self.vcc.as_mut() {
            vcc.set(true);
        }
        self.clock.delay_ms(VCC_SETTLE_MS);
        if let Some(onoff) = self.onoff.as_mut() {
            onoff.set(false);
        }
    }

    fn off(&mut self) {
        if let Some(vcc) = self.vcc.as_mut() {
            vcc.set(false);
        }
        if let Some(onoff) = self.onoff.as_mut() {
            onoff.set(true);
        }
    }

    fn is_on(&self) -> bool {
        if let Some(status) = self.status.as_ref() {
            return status.is_high();
        }
        if let Some(onoff) = self.onoff.as_ref() {
            return !onoff.is_high();
        }
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mock::FakeClock;
    use std::cell::Cell;
    use std::rc::Rc;

    #[derive(Clone, Default)]
    struct TestPin(Rc<Cell<bool>>);

    impl DigitalPin for TestPin {
        fn set(&mut self, high: bool) {
            self.0.set(high);
        }

        fn is_high(&self) -> bool {
            self.0.get()
        }
    }

    #[test]
    fn test_pin_pair_without_status() {
        let vcc = TestPin::default();
        let onoff = TestPin::default();
        let mut control = GpioPowerControl::new(
            Some(vcc.clone()),
            Some(onoff.clone()),
            None,
            FakeClock::new(0),
        );

        // Construction leaves the module off.
        assert!(!vcc.is_high());
        assert!(onoff.is_high());
        assert!(!control.is_on());

        control.on();
        assert!(vcc.is_high());
        assert!(!onoff.is_high());
        assert!(control.is_on());

        control.off();
        assert!(!control.is_on());
    }

    #[test]
    fn test_status_pin_wins() {
        let status = TestPin::default();
        let mut control = GpioPowerControl::new(
            None,
            Some(TestPin::default()),
            Some(status.clone()),
            FakeClock::new(0),
        );
        assert!(control.has_status_pin());

        control.on();
        assert!(!control.is_on());

        status.0.set(true);
        assert!(control.is_on());
    }

    #[test]
    fn test_on_waits_for_vcc() {
        let clock = FakeClock::new(100);
        let mut control =
            GpioPowerControl::new(Some(TestPin::default()), None, None, clock.clone());
        control.on();
        assert_eq!(clock.now(), 100 + VCC_SETTLE_MS);
    }

    #[test]
    fn test_no_pins_assumed_on() {
        let control: GpioPowerControl<TestPin, FakeClock> =
            GpioPowerControl::new(None, None, None, FakeClock::new(0));
        assert!(control.is_on());
        assert!(AlwaysOn.is_on());
    }
}
