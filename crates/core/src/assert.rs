//! Fatal contract-violation path.
//!
//! Every precondition the framework checks funnels into [`violation`]. The
//! installed [`ViolationHandler`] runs first; a board hook would reset or halt
//! there. If the handler returns, the violation becomes a panic, which release
//! builds compile to an abort.

use core::cell::Cell;
use core::fmt;

use critical_section::Mutex;

/// Location and identity of a failed precondition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Violation {
    pub module: &'static str,
    pub id: u16,
    pub condition: &'static str,
    pub file: &'static str,
    pub line: u32,
}

impl fmt::Display for Violation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "contract violation in {} (id {}): {} at {}:{}",
            self.module, self.id, self.condition, self.file, self.line
        )
    }
}

#[cfg(feature = "defmt")]
impl defmt::Format for Violation {
    fn format(&self, fmt: defmt::Formatter) {
        defmt::write!(fmt, "violation {=str}:{=u16}", self.module, self.id);
    }
}

/// Board-level `on_contract_violation` hook.
pub type ViolationHandler = fn(&Violation);

static HANDLER: Mutex<Cell<Option<ViolationHandler>>> = Mutex::new(Cell::new(None));

/// Installs the system-wide violation handler, returning the previous one.
pub fn set_violation_handler(handler: ViolationHandler) -> Option<ViolationHandler> {
    critical_section::with(|cs| HANDLER.borrow(cs).replace(Some(handler)))
}

/// Removes the installed violation handler.
pub fn clear_violation_handler() -> Option<ViolationHandler> {
    critical_section::with(|cs| HANDLER.borrow(cs).take())
}

/// Reports a contract violation and never returns.
#[cold]
#[inline(never)]
pub fn violation(
    module: &'static str,
    id: u16,
    condition: &'static str,
    file: &'static str,
    line: u32,
) -> ! {
    let violation = Violation {
        module,
        id,
        condition,
        file,
        line,
    };
    log::error!("{violation}");

    let handler = critical_section::with(|cs| HANDLER.borrow(cs).get());
    if let Some(handler) = handler {
        handler(&violation);
    }

    panic!("{violation}");
}

/// Checks a precondition, routing failures to [`violation`].
///
/// ```should_panic
/// rtk_core::require!(1 + 1 == 3, 100);
/// ```
#[macro_export]
macro_rules! require {
    ($cond:expr, $id:expr) => {
        if !($cond) {
            $crate::assert::violation(module_path!(), $id, stringify!($cond), file!(), line!())
        }
    };
}

/// Unconditional contract violation; evaluates to `!`.
#[macro_export]
macro_rules! fail {
    ($id:expr, $what:expr) => {
        $crate::assert::violation(module_path!(), $id, $what, file!(), line!())
    };
}

#[cfg(test)]
mod tests {
    #[test]
    fn passing_precondition_is_silent() {
        require!(2 > 1, 1);
    }

    #[test]
    #[should_panic(expected = "contract violation in rtk_core::assert::tests (id 7): 1 > 2")]
    fn failing_precondition_panics_with_location() {
        require!(1 > 2, 7);
    }

    #[test]
    #[should_panic(expected = "(id 9): queue corrupted")]
    fn fail_reports_description() {
        let _never: u8 = fail!(9, "queue corrupted");
    }
}
