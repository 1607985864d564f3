//! Recording indicators shared by the unit tests

use std::sync::{Arc, Mutex};

use super::{Indicator, IndicatorError, IndicatorFactory, IndicatorKind};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Call {
    Created,
    Muted,
    Unmuted,
    Teardown,
}

pub(crate) type CallLog = Arc<Mutex<Vec<(IndicatorKind, Call)>>>;

#[derive(Default, Clone)]
pub(crate) struct RecordingFactory {
    pub log: CallLog,
    pub fail_create: Option<IndicatorKind>,
    pub fail_update: Option<IndicatorKind>,
    pub fail_teardown: Option<IndicatorKind>,
}

impl RecordingFactory {
    pub fn calls(&self) -> Vec<(IndicatorKind, Call)> {
        self.log.lock().unwrap().clone()
    }

    pub fn count(&self, kind: IndicatorKind, call: Call) -> usize {
        self.calls().iter().filter(|c| **c == (kind, call)).count()
    }

    pub fn clear(&self) {
        self.log.lock().unwrap().clear();
    }
}

impl IndicatorFactory for RecordingFactory {
    fn create(&self, kind: IndicatorKind) -> Result<Box<dyn Indicator>, IndicatorError> {
        if self.fail_create == Some(kind) {
            return Err(IndicatorError::Unavailable(format!("no display for {kind}")));
        }
        self.log.lock().unwrap().push((kind, Call::Created));
        Ok(Box::new(RecordingIndicator {
            kind,
            log: Arc::clone(&self.log),
            fail_update: self.fail_update == Some(kind),
            fail_teardown: self.fail_teardown == Some(kind),
        }))
    }
}

struct RecordingIndicator {
    kind: IndicatorKind,
    log: CallLog,
    fail_update: bool,
    fail_teardown: bool,
}

impl RecordingIndicator {
    fn record(&self, call: Call) -> Result<(), IndicatorError> {
        if self.fail_update && call != Call::Teardown {
            return Err(IndicatorError::Unavailable("window server gone".into()));
        }
        if self.fail_teardown && call == Call::Teardown {
            return Err(IndicatorError::Teardown("window server gone".into()));
        }
        self.log.lock().unwrap().push((self.kind, call));
        Ok(())
    }
}

impl Indicator for RecordingIndicator {
    fn mark_muted(&mut self) -> Result<(), IndicatorError> {
        self.record(Call::Muted)
    }

    fn mark_unmuted(&mut self) -> Result<(), IndicatorError> {
        self.record(Call::Unmuted)
    }

    fn teardown(&mut self) -> Result<(), IndicatorError> {
        self.record(Call::Teardown)
    }
}
